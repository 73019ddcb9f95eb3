use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::calendar::CollectionCalendar;
use super::entities::{
  Client, CreditorProfile, DebitBatch, DebitCandidate, DebitTransaction, ExportBatch, Invoice,
  LocalInstrument, PaymentGroup,
};
use super::errors::{BatchRejection, DebitError, RejectionReason};
use super::ports::{Clock, ClientRepository, DebitFileRenderer, InvoiceRepository};
use super::sepa_text::{self, MAX_ID_LENGTH, MAX_NAME_LENGTH, MAX_REMITTANCE_LENGTH};
use super::value_objects::{
  Bic, DebitAmount, DebitStatus, Iban, MandateReference, PaymentMode, SequenceType, StatusAction,
};

/// Tunables of the export, taken from the `[sepa]` configuration section.
#[derive(Debug, Clone)]
pub struct DirectDebitSettings {
  pub calendar: CollectionCalendar,
  pub message_id_prefix: String,
  pub batch_booking: bool,
  pub local_instrument: LocalInstrument,
  pub remittance_prefix: String,
}

impl Default for DirectDebitSettings {
  fn default() -> Self {
    Self {
      calendar: CollectionCalendar::new(2),
      message_id_prefix: "DD".to_string(),
      batch_booking: true,
      local_instrument: LocalInstrument::Core,
      remittance_prefix: "Facture".to_string(),
    }
  }
}

pub struct DirectDebitServiceDependencies {
  pub invoice_repo: Arc<dyn InvoiceRepository>,
  pub client_repo: Arc<dyn ClientRepository>,
  pub renderer: Arc<dyn DebitFileRenderer>,
  pub clock: Arc<dyn Clock>,
  pub creditor: CreditorProfile,
  pub settings: DirectDebitSettings,
}

/// A rendered bank file, ready to be downloaded.
#[derive(Debug, Clone)]
pub struct DebitFile {
  pub file_name: String,
  pub content_type: &'static str,
  pub content: Vec<u8>,
  pub message_id: String,
  pub transaction_count: usize,
  pub control_sum: Decimal,
  pub invoice_ids: Vec<Uuid>,
}

/// Outcome of a status action, id by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChangeReport {
  pub updated: Vec<Uuid>,
  pub unchanged: Vec<Uuid>,
  pub skipped: Vec<(Uuid, DebitStatus)>,
}

pub struct DirectDebitService {
  invoice_repo: Arc<dyn InvoiceRepository>,
  client_repo: Arc<dyn ClientRepository>,
  renderer: Arc<dyn DebitFileRenderer>,
  clock: Arc<dyn Clock>,
  creditor: CreditorProfile,
  settings: DirectDebitSettings,
}

impl DirectDebitService {
  pub fn new(deps: DirectDebitServiceDependencies) -> Self {
    Self {
      invoice_repo: deps.invoice_repo,
      client_repo: deps.client_repo,
      renderer: deps.renderer,
      clock: deps.clock,
      creditor: deps.creditor,
      settings: deps.settings,
    }
  }

  pub fn creditor(&self) -> &CreditorProfile {
    &self.creditor
  }

  pub fn lead_days(&self) -> u32 {
    self.settings.calendar.lead_days()
  }

  pub fn earliest_collection_date(&self) -> NaiveDate {
    self
      .settings
      .calendar
      .earliest_collection_date(self.clock.today())
  }

  /// Direct debit invoices in `status`, each joined with its client (if any).
  pub async fn list_candidates(
    &self,
    status: DebitStatus,
  ) -> Result<Vec<DebitCandidate>, DebitError> {
    let mut invoices = self
      .invoice_repo
      .find_by_payment_mode_and_status(PaymentMode::DirectDebit, status)
      .await?;
    invoices.sort_by(|a, b| {
      a.due_date
        .cmp(&b.due_date)
        .then_with(|| a.invoice_number.value().cmp(b.invoice_number.value()))
    });

    let clients = self.load_clients(&invoices).await?;

    Ok(
      invoices
        .into_iter()
        .map(|invoice| {
          let client = clients.get(&invoice.client_id).cloned();
          DebitCandidate { invoice, client }
        })
        .collect(),
    )
  }

  /// Validates the whole request and assembles the batch. Any invalid invoice
  /// rejects the batch; unknown invoice ids are dropped.
  pub async fn prepare_batch(&self, request: &ExportBatch) -> Result<DebitBatch, DebitError> {
    let ids = unique_ids(&request.invoice_ids);

    let found = self.invoice_repo.find_by_ids(&ids).await?;
    let mut by_id: HashMap<Uuid, Invoice> = found.into_iter().map(|i| (i.id, i)).collect();
    let invoices: Vec<Invoice> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

    if invoices.is_empty() {
      return Err(DebitError::EmptyBatch);
    }

    let now = self.clock.now();
    let today = now.date_naive();
    let earliest = self.settings.calendar.earliest_collection_date(today);
    match request.requested_collection_date {
      Some(requested) if requested < earliest => {
        return Err(DebitError::CollectionDateTooEarly {
          requested,
          earliest,
        });
      }
      _ => {}
    }

    let clients = self.load_clients(&invoices).await?;

    let mut rejections = Vec::new();
    let mut grouped: BTreeMap<(NaiveDate, SequenceType), Vec<DebitTransaction>> = BTreeMap::new();

    for invoice in &invoices {
      let client = clients.get(&invoice.client_id);
      match self.build_transaction(invoice, client) {
        Ok((transaction, sequence_type)) => {
          let date = request.requested_collection_date.unwrap_or_else(|| {
            self
              .settings
              .calendar
              .default_collection_date(today, invoice.debit_date)
          });
          grouped
            .entry((date, sequence_type))
            .or_default()
            .push(transaction);
        }
        Err(reason) => rejections.push(BatchRejection {
          invoice_id: invoice.id,
          invoice_number: invoice.invoice_number.value().to_string(),
          reason,
        }),
      }
    }

    if !rejections.is_empty() {
      tracing::warn!(
        rejected = rejections.len(),
        requested = invoices.len(),
        "Direct debit batch rejected"
      );
      return Err(DebitError::BatchRejected { rejections });
    }

    let message_id = self.message_id(now.naive_utc());
    let groups = grouped
      .into_iter()
      .enumerate()
      .map(|(index, ((collection_date, sequence_type), transactions))| {
        let payment_info_id = format!("{}-{:03}", message_id, index + 1)
          .chars()
          .take(MAX_ID_LENGTH)
          .collect();
        PaymentGroup {
          payment_info_id,
          collection_date,
          sequence_type,
          transactions,
        }
      })
      .collect();

    Ok(DebitBatch {
      message_id,
      created_at: now.naive_utc(),
      creditor: self.creditor.clone(),
      batch_booking: self.settings.batch_booking,
      local_instrument: self.settings.local_instrument,
      groups,
    })
  }

  /// Builds and renders the bank file. Nothing is persisted: statuses only
  /// change through [`DirectDebitService::change_status`].
  pub async fn generate_file(&self, request: &ExportBatch) -> Result<DebitFile, DebitError> {
    let batch = self.prepare_batch(request).await?;
    let content = self.renderer.render(&batch)?;

    tracing::info!(
      message_id = %batch.message_id,
      transactions = batch.transaction_count(),
      control_sum = %batch.control_sum(),
      "Direct debit file generated"
    );

    Ok(DebitFile {
      file_name: batch.file_name(),
      content_type: self.renderer.content_type(),
      content,
      transaction_count: batch.transaction_count(),
      control_sum: batch.control_sum(),
      invoice_ids: batch.invoice_ids(),
      message_id: batch.message_id,
    })
  }

  /// Applies `action` to exactly the listed invoices that are in a legal
  /// source status. Invoices already in the target status are left alone.
  pub async fn change_status(
    &self,
    invoice_ids: &[Uuid],
    action: StatusAction,
  ) -> Result<StatusChangeReport, DebitError> {
    let target = action.target();
    let sources = DebitStatus::sources_of(target);

    let ids = unique_ids(invoice_ids);
    let invoices = self.invoice_repo.find_by_ids(&ids).await?;
    let movable: Vec<Uuid> = invoices
      .iter()
      .filter(|i| i.is_direct_debit() && sources.contains(&i.status))
      .map(|i| i.id)
      .collect();

    let updated = if movable.is_empty() {
      Vec::new()
    } else {
      self
        .invoice_repo
        .transition_statuses(&movable, &sources, target, self.clock.now())
        .await?
    };

    if action == StatusAction::MarkExported && !updated.is_empty() {
      let client_ids: Vec<Uuid> = invoices
        .iter()
        .filter(|i| updated.contains(&i.id))
        .map(|i| i.client_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
      let advanced = self
        .client_repo
        .advance_sequence_type(
          &client_ids,
          SequenceType::Frst,
          SequenceType::Frst.after_collection(),
        )
        .await?;
      if advanced > 0 {
        tracing::info!(clients = advanced, "First collection done, mandates now recurrent");
      }
    }

    let mut report = StatusChangeReport {
      updated: updated.clone(),
      ..Default::default()
    };
    for invoice in &invoices {
      if updated.contains(&invoice.id) {
        continue;
      }
      if invoice.is_direct_debit() && invoice.status == target {
        report.unchanged.push(invoice.id);
      } else {
        report.skipped.push((invoice.id, invoice.status));
      }
    }

    tracing::info!(
      action = action.as_str(),
      updated = report.updated.len(),
      unchanged = report.unchanged.len(),
      skipped = report.skipped.len(),
      "Direct debit status change applied"
    );

    Ok(report)
  }

  async fn load_clients(&self, invoices: &[Invoice]) -> Result<HashMap<Uuid, Client>, DebitError> {
    let client_ids: Vec<Uuid> = invoices
      .iter()
      .map(|i| i.client_id)
      .collect::<HashSet<_>>()
      .into_iter()
      .collect();

    if client_ids.is_empty() {
      return Ok(HashMap::new());
    }

    Ok(
      self
        .client_repo
        .find_by_ids(&client_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect(),
    )
  }

  fn build_transaction(
    &self,
    invoice: &Invoice,
    client: Option<&Client>,
  ) -> Result<(DebitTransaction, SequenceType), RejectionReason> {
    if !invoice.is_direct_debit() {
      return Err(RejectionReason::NotDirectDebit {
        payment_mode: invoice.payment_mode,
      });
    }
    if !invoice.status.is_collectable() {
      return Err(RejectionReason::NotCollectable {
        status: invoice.status,
      });
    }
    let amount = DebitAmount::new(invoice.amount).map_err(|e| RejectionReason::InvalidAmount {
      message: e.to_string(),
    })?;

    let client = client.ok_or(RejectionReason::UnknownClient {
      client_id: invoice.client_id,
    })?;

    let missing = client.sepa.missing_fields();
    if !missing.is_empty() {
      return Err(RejectionReason::MissingSepaFields { fields: missing });
    }

    let sepa = &client.sepa;
    let invalid = |e: super::value_objects::ValueObjectError| RejectionReason::InvalidSepaData {
      message: e.to_string(),
    };
    let debtor_iban = Iban::new(sepa.iban.clone().unwrap_or_default()).map_err(invalid)?;
    let debtor_bic = Bic::new(sepa.bic.clone().unwrap_or_default()).map_err(invalid)?;
    let mandate_reference =
      MandateReference::new(sepa.mandate_reference.clone().unwrap_or_default()).map_err(invalid)?;
    let mandate_signed_on = sepa
      .mandate_signed_on
      .ok_or(RejectionReason::MissingSepaFields {
        fields: client.sepa.missing_fields(),
      })?;

    let number = invoice.invoice_number.value();
    let end_to_end_id = sepa_text::sanitize_id(number);
    if end_to_end_id.is_empty() {
      return Err(RejectionReason::InvalidSepaData {
        message: format!(
          "invoice number '{}' has no characters usable as end-to-end id",
          number
        ),
      });
    }
    let debtor_name = sepa_text::sanitize(&client.name, MAX_NAME_LENGTH);
    if debtor_name.is_empty() {
      return Err(RejectionReason::InvalidSepaData {
        message: format!(
          "client name '{}' has no characters usable as debtor name",
          client.name
        ),
      });
    }

    let transaction = DebitTransaction {
      invoice_id: invoice.id,
      end_to_end_id,
      amount,
      debtor_name,
      debtor_iban,
      debtor_bic,
      mandate_reference,
      mandate_signed_on,
      remittance_info: sepa_text::sanitize(
        &format!("{} {}", self.settings.remittance_prefix, number),
        MAX_REMITTANCE_LENGTH,
      ),
    };

    Ok((transaction, sepa.sequence_type))
  }

  fn message_id(&self, created_at: NaiveDateTime) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let raw = format!(
      "{}{}-{}",
      self.settings.message_id_prefix,
      created_at.format("%Y%m%d%H%M%S"),
      &suffix[..8]
    );
    sepa_text::sanitize_id(&raw)
  }
}

/// Drops repeated ids, keeping the first occurrence.
fn unique_ids(ids: &[Uuid]) -> Vec<Uuid> {
  let mut seen = HashSet::new();
  ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
