use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::value_objects::{
  Bic, CreditorIdentifier, DebitAmount, DebitStatus, Iban, InvoiceNumber, MandateReference,
  PaymentMode, SequenceType,
};

/// The four client fields a mandate cannot be collected without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SepaField {
  Iban,
  Bic,
  MandateReference,
  MandateSignatureDate,
}

impl fmt::Display for SepaField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      SepaField::Iban => "IBAN",
      SepaField::Bic => "BIC",
      SepaField::MandateReference => "mandate reference",
      SepaField::MandateSignatureDate => "mandate signature date",
    })
  }
}

// SEPA mandate data held on a client, as entered by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SepaProfile {
  pub iban: Option<String>,
  pub bic: Option<String>,
  pub mandate_reference: Option<String>,
  pub mandate_signed_on: Option<NaiveDate>,
  pub sequence_type: SequenceType,
}

impl SepaProfile {
  pub fn missing_fields(&self) -> Vec<SepaField> {
    let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());

    let mut missing = Vec::new();
    if blank(&self.iban) {
      missing.push(SepaField::Iban);
    }
    if blank(&self.bic) {
      missing.push(SepaField::Bic);
    }
    if blank(&self.mandate_reference) {
      missing.push(SepaField::MandateReference);
    }
    if self.mandate_signed_on.is_none() {
      missing.push(SepaField::MandateSignatureDate);
    }
    missing
  }

  pub fn has_valid_sepa_info(&self) -> bool {
    self.missing_fields().is_empty()
  }
}

// Client - the debtor of a direct debit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
  pub id: Uuid,
  pub name: String,
  pub sepa: SepaProfile,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Client {
  pub fn new(name: impl Into<String>, sepa: SepaProfile) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      name: name.into(),
      sepa,
      created_at: now,
      updated_at: now,
    }
  }
}

// Invoice - only the fields the direct debit workflow reads or writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id: Uuid,
  pub client_id: Uuid,
  pub invoice_number: InvoiceNumber,
  pub amount: Decimal,
  pub issue_date: NaiveDate,
  pub due_date: NaiveDate,
  pub debit_date: Option<NaiveDate>,
  pub payment_mode: PaymentMode,
  pub status: DebitStatus,
  pub exported_at: Option<DateTime<Utc>>,
  pub paid_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Invoice {
  pub fn new(
    client_id: Uuid,
    invoice_number: InvoiceNumber,
    amount: Decimal,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    payment_mode: PaymentMode,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      client_id,
      invoice_number,
      amount,
      issue_date,
      due_date,
      debit_date: None,
      payment_mode,
      status: DebitStatus::Pending,
      exported_at: None,
      paid_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn with_debit_date(mut self, debit_date: NaiveDate) -> Self {
    self.debit_date = Some(debit_date);
    self
  }

  pub fn is_direct_debit(&self) -> bool {
    self.payment_mode == PaymentMode::DirectDebit
  }

  /// Applies a status change, stamping the matching timestamp.
  /// Returns `false` without touching the invoice when the move is not allowed.
  pub fn apply_status(&mut self, new_status: DebitStatus, at: DateTime<Utc>) -> bool {
    if !self.status.can_transition_to(new_status) {
      return false;
    }
    self.status = new_status;
    match new_status {
      DebitStatus::Exported => self.exported_at = Some(at),
      DebitStatus::Paid => self.paid_at = Some(at),
      DebitStatus::Pending | DebitStatus::Executed => {}
    }
    self.updated_at = at;
    true
  }
}

/// A row of the eligibility list: a direct debit invoice joined with its client.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitCandidate {
  pub invoice: Invoice,
  pub client: Option<Client>,
}

impl DebitCandidate {
  pub fn missing_fields(&self) -> Vec<SepaField> {
    match &self.client {
      Some(client) => client.sepa.missing_fields(),
      None => vec![
        SepaField::Iban,
        SepaField::Bic,
        SepaField::MandateReference,
        SepaField::MandateSignatureDate,
      ],
    }
  }

  /// Unknown clients are never eligible.
  pub fn has_valid_sepa_info(&self) -> bool {
    self
      .client
      .as_ref()
      .is_some_and(|c| c.sepa.has_valid_sepa_info())
  }
}

/// Creditor (the business itself) as declared to its bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditorProfile {
  pub name: String,
  pub identifier: CreditorIdentifier,
  pub iban: Iban,
  pub bic: Bic,
}

/// Operator request: which invoices to collect and, optionally, when.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportBatch {
  pub invoice_ids: Vec<Uuid>,
  pub requested_collection_date: Option<NaiveDate>,
}

/// One collection, fully validated and ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitTransaction {
  pub invoice_id: Uuid,
  pub end_to_end_id: String,
  pub amount: DebitAmount,
  pub debtor_name: String,
  pub debtor_iban: Iban,
  pub debtor_bic: Bic,
  pub mandate_reference: MandateReference,
  pub mandate_signed_on: NaiveDate,
  pub remittance_info: String,
}

/// Transactions sharing a collection date and a sequence type (one `PmtInf`).
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentGroup {
  pub payment_info_id: String,
  pub collection_date: NaiveDate,
  pub sequence_type: SequenceType,
  pub transactions: Vec<DebitTransaction>,
}

impl PaymentGroup {
  pub fn control_sum(&self) -> Decimal {
    self.transactions.iter().map(|t| t.amount.value()).sum()
  }
}

/// Everything a PAIN.008 message carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitBatch {
  pub message_id: String,
  pub created_at: NaiveDateTime,
  pub creditor: CreditorProfile,
  pub batch_booking: bool,
  pub local_instrument: LocalInstrument,
  pub groups: Vec<PaymentGroup>,
}

impl DebitBatch {
  pub fn transaction_count(&self) -> usize {
    self.groups.iter().map(|g| g.transactions.len()).sum()
  }

  pub fn control_sum(&self) -> Decimal {
    self.groups.iter().map(PaymentGroup::control_sum).sum()
  }

  pub fn invoice_ids(&self) -> Vec<Uuid> {
    self
      .groups
      .iter()
      .flat_map(|g| g.transactions.iter().map(|t| t.invoice_id))
      .collect()
  }

  /// `SEPA_DD_<date>.xml`, or `SEPA_DD_<first>_<last>.xml` across several dates.
  pub fn file_name(&self) -> String {
    let first = self.groups.iter().map(|g| g.collection_date).min();
    let last = self.groups.iter().map(|g| g.collection_date).max();
    match (first, last) {
      (Some(first), Some(last)) if first != last => format!(
        "SEPA_DD_{}_{}.xml",
        first.format("%Y%m%d"),
        last.format("%Y%m%d")
      ),
      (Some(date), _) => format!("SEPA_DD_{}.xml", date.format("%Y%m%d")),
      _ => format!("SEPA_DD_{}.xml", self.created_at.format("%Y%m%d")),
    }
  }
}

/// SEPA scheme the collections run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocalInstrument {
  #[default]
  Core,
  B2b,
}

impl LocalInstrument {
  pub fn as_str(&self) -> &'static str {
    match self {
      LocalInstrument::Core => "CORE",
      LocalInstrument::B2b => "B2B",
    }
  }
}
