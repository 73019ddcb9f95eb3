#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use debitdesk::domain::direct_debit::{
  Bic, Client, CreditorIdentifier, CreditorProfile, DirectDebitService,
  DirectDebitServiceDependencies, DirectDebitSettings, Iban, Invoice, InvoiceNumber, PaymentMode,
  SepaProfile, SequenceType,
};
use debitdesk::infrastructure::clock::FixedClock;
use debitdesk::infrastructure::persistence::{InMemoryClientRepository, InMemoryInvoiceRepository};
use debitdesk::infrastructure::sepa::Pain008Renderer;

/// Monday; two business days of lead time make 2024-06-12 the earliest date.
pub fn today() -> NaiveDate {
  date(2024, 6, 10)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct TestContext {
  pub invoices: Arc<InMemoryInvoiceRepository>,
  pub clients: Arc<InMemoryClientRepository>,
  pub service: Arc<DirectDebitService>,
}

impl TestContext {
  pub fn new() -> Self {
    let invoices = Arc::new(InMemoryInvoiceRepository::new());
    let clients = Arc::new(InMemoryClientRepository::new());
    let service = Arc::new(DirectDebitService::new(DirectDebitServiceDependencies {
      invoice_repo: invoices.clone(),
      client_repo: clients.clone(),
      renderer: Arc::new(Pain008Renderer::new()),
      clock: Arc::new(FixedClock::on(today())),
      creditor: creditor(),
      settings: DirectDebitSettings::default(),
    }));

    Self {
      invoices,
      clients,
      service,
    }
  }

  pub async fn add_client(&self, client: Client) -> Uuid {
    let id = client.id;
    self.clients.insert(client).await;
    id
  }

  pub async fn add_invoice(&self, client_id: Uuid, number: &str, amount: Decimal) -> Uuid {
    self
      .add(direct_debit_invoice(client_id, number, amount))
      .await
  }

  pub async fn add(&self, invoice: Invoice) -> Uuid {
    let id = invoice.id;
    self.invoices.insert(invoice).await;
    id
  }
}

pub fn creditor() -> CreditorProfile {
  CreditorProfile {
    name: "Atelier Léon".to_string(),
    identifier: CreditorIdentifier::new("FR72ZZZ123456").unwrap(),
    iban: Iban::new("FR7630006000011234567890189").unwrap(),
    bic: Bic::new("AGRIFRPP").unwrap(),
  }
}

pub fn complete_profile(sequence_type: SequenceType) -> SepaProfile {
  SepaProfile {
    iban: Some("DE89370400440532013000".to_string()),
    bic: Some("COBADEFFXXX".to_string()),
    mandate_reference: Some("RUM-2023-001".to_string()),
    mandate_signed_on: Some(date(2023, 3, 1)),
    sequence_type,
  }
}

pub fn complete_client(name: &str) -> Client {
  Client::new(name, complete_profile(SequenceType::Frst))
}

pub fn client_without_bic(name: &str) -> Client {
  Client::new(
    name,
    SepaProfile {
      bic: None,
      ..complete_profile(SequenceType::Frst)
    },
  )
}

pub fn direct_debit_invoice(client_id: Uuid, number: &str, amount: Decimal) -> Invoice {
  Invoice::new(
    client_id,
    InvoiceNumber::new(number.to_string()).unwrap(),
    amount,
    date(2024, 6, 1),
    date(2024, 6, 30),
    PaymentMode::DirectDebit,
  )
}
