//! In-memory repositories, used by tests and by `storage.backend = "memory"`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::direct_debit::{
  Client, ClientRepository, DebitError, DebitStatus, Invoice, InvoiceNumber, InvoiceRepository,
  PaymentMode, SepaProfile, SequenceType,
};

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
  invoices: RwLock<HashMap<Uuid, Invoice>>,
}

impl InMemoryInvoiceRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn insert(&self, invoice: Invoice) {
    self.invoices.write().await.insert(invoice.id, invoice);
  }

  pub async fn get(&self, id: Uuid) -> Option<Invoice> {
    self.invoices.read().await.get(&id).cloned()
  }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
  async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Invoice>, DebitError> {
    let invoices = self.invoices.read().await;
    Ok(ids.iter().filter_map(|id| invoices.get(id).cloned()).collect())
  }

  async fn find_by_payment_mode_and_status(
    &self,
    payment_mode: PaymentMode,
    status: DebitStatus,
  ) -> Result<Vec<Invoice>, DebitError> {
    let invoices = self.invoices.read().await;
    Ok(
      invoices
        .values()
        .filter(|i| i.payment_mode == payment_mode && i.status == status)
        .cloned()
        .collect(),
    )
  }

  async fn transition_statuses(
    &self,
    ids: &[Uuid],
    from: &[DebitStatus],
    to: DebitStatus,
    at: DateTime<Utc>,
  ) -> Result<Vec<Uuid>, DebitError> {
    let mut invoices = self.invoices.write().await;
    let mut changed = Vec::new();
    for id in ids {
      if let Some(invoice) = invoices.get_mut(id) {
        if invoice.is_direct_debit()
          && from.contains(&invoice.status)
          && invoice.apply_status(to, at)
        {
          changed.push(*id);
        }
      }
    }
    Ok(changed)
  }
}

#[derive(Default)]
pub struct InMemoryClientRepository {
  clients: RwLock<HashMap<Uuid, Client>>,
}

impl InMemoryClientRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn insert(&self, client: Client) {
    self.clients.write().await.insert(client.id, client);
  }

  pub async fn get(&self, id: Uuid) -> Option<Client> {
    self.clients.read().await.get(&id).cloned()
  }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
  async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Client>, DebitError> {
    let clients = self.clients.read().await;
    Ok(ids.iter().filter_map(|id| clients.get(id).cloned()).collect())
  }

  async fn advance_sequence_type(
    &self,
    ids: &[Uuid],
    from: SequenceType,
    to: SequenceType,
  ) -> Result<u64, DebitError> {
    let mut clients = self.clients.write().await;
    let mut count = 0;
    for id in ids {
      if let Some(client) = clients.get_mut(id) {
        if client.sepa.sequence_type == from {
          client.sepa.sequence_type = to;
          client.updated_at = Utc::now();
          count += 1;
        }
      }
    }
    Ok(count)
  }
}

/// Fills the repositories with a few invoices for `storage.backend = "memory"`.
pub async fn seed_demo_data(
  invoices: &InMemoryInvoiceRepository,
  clients: &InMemoryClientRepository,
  today: NaiveDate,
) -> Result<(), DebitError> {
  let complete = Client::new(
    "Boulangerie Dupré",
    SepaProfile {
      iban: Some("FR7630006000011234567890189".to_string()),
      bic: Some("AGRIFRPP".to_string()),
      mandate_reference: Some("RUM-DUPRE-001".to_string()),
      mandate_signed_on: NaiveDate::from_ymd_opt(2023, 9, 1),
      sequence_type: SequenceType::Frst,
    },
  );
  let recurring = Client::new(
    "Garage Müller & Fils",
    SepaProfile {
      iban: Some("DE89370400440532013000".to_string()),
      bic: Some("COBADEFFXXX".to_string()),
      mandate_reference: Some("RUM-MULLER-7".to_string()),
      mandate_signed_on: NaiveDate::from_ymd_opt(2022, 1, 15),
      sequence_type: SequenceType::Rcur,
    },
  );
  let incomplete = Client::new(
    "Café du Port",
    SepaProfile {
      iban: Some("FR1420041010050500013M02606".to_string()),
      mandate_reference: Some("RUM-PORT-3".to_string()),
      mandate_signed_on: NaiveDate::from_ymd_opt(2024, 2, 2),
      ..SepaProfile::default()
    },
  );

  let rows = [
    ("DEMO-001", &complete, Decimal::new(12000, 2)),
    ("DEMO-002", &recurring, Decimal::new(4590, 2)),
    ("DEMO-003", &incomplete, Decimal::new(8000, 2)),
  ];
  for (offset, (number, client, amount)) in rows.into_iter().enumerate() {
    let issued = today - Duration::days(20);
    let due = today + Duration::days(5 + offset as i64);
    invoices
      .insert(Invoice::new(
        client.id,
        InvoiceNumber::new(number.to_string())?,
        amount,
        issued,
        due,
        PaymentMode::DirectDebit,
      ))
      .await;
  }

  for client in [complete, recurring, incomplete] {
    clients.insert(client).await;
  }
  Ok(())
}
