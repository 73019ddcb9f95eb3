use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid invoice number: {0}")]
  InvalidInvoiceNumber(String),
  #[error("Invalid IBAN: {0}")]
  InvalidIban(String),
  #[error("Invalid BIC: {0}")]
  InvalidBic(String),
  #[error("Invalid mandate reference: {0}")]
  InvalidMandateReference(String),
  #[error("Invalid creditor identifier: {0}")]
  InvalidCreditorIdentifier(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Unknown direct debit status: {0}")]
  InvalidStatus(String),
  #[error("Unknown payment mode: {0}")]
  InvalidPaymentMode(String),
  #[error("Unknown sequence type: {0}")]
  InvalidSequenceType(String),
  #[error("Unknown status action: {0}")]
  InvalidAction(String),
}

lazy_static! {
  static ref BIC_PATTERN: Regex =
    Regex::new(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$").expect("valid BIC pattern");
  static ref MANDATE_REFERENCE_PATTERN: Regex =
    Regex::new(r"^[A-Za-z0-9+?/\-:().,']{1,35}$").expect("valid mandate reference pattern");
  static ref CREDITOR_ID_PATTERN: Regex =
    Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{3}[A-Z0-9]{1,28}$").expect("valid ICS pattern");
}

// Invoice Number - as issued by the billing module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 100 {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot exceed 100 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for InvoiceNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Direct debit status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebitStatus {
  Pending,
  Exported,
  Executed,
  Paid,
}

impl DebitStatus {
  pub const ALL: [DebitStatus; 4] = [
    DebitStatus::Pending,
    DebitStatus::Exported,
    DebitStatus::Executed,
    DebitStatus::Paid,
  ];

  pub fn can_transition_to(&self, new_status: DebitStatus) -> bool {
    match (self, new_status) {
      (DebitStatus::Pending, DebitStatus::Exported) => true,
      (DebitStatus::Exported, DebitStatus::Executed) => true,
      (DebitStatus::Exported, DebitStatus::Paid) => true,
      (DebitStatus::Executed, DebitStatus::Paid) => true,
      _ => false,
    }
  }

  /// Statuses from which `target` is reachable in one step.
  pub fn sources_of(target: DebitStatus) -> Vec<DebitStatus> {
    Self::ALL
      .into_iter()
      .filter(|s| s.can_transition_to(target))
      .collect()
  }

  /// Whether an invoice in this status may still appear in a PAIN.008 file.
  /// Exported invoices stay collectable for a repeated download.
  pub fn is_collectable(&self) -> bool {
    matches!(self, DebitStatus::Pending | DebitStatus::Exported)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DebitStatus::Pending => "pending",
      DebitStatus::Exported => "exported",
      DebitStatus::Executed => "executed",
      DebitStatus::Paid => "paid",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      DebitStatus::Pending => "À prélever",
      DebitStatus::Exported => "Exporté",
      DebitStatus::Executed => "Exécuté",
      DebitStatus::Paid => "Payé",
    }
  }
}

impl FromStr for DebitStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "pending" => Ok(DebitStatus::Pending),
      "exported" => Ok(DebitStatus::Exported),
      "executed" => Ok(DebitStatus::Executed),
      "paid" => Ok(DebitStatus::Paid),
      _ => Err(ValueObjectError::InvalidStatus(s.to_string())),
    }
  }
}

impl fmt::Display for DebitStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// How the client settles the invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
  DirectDebit,
  Transfer,
  Card,
  Check,
  Cash,
}

impl PaymentMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMode::DirectDebit => "direct_debit",
      PaymentMode::Transfer => "transfer",
      PaymentMode::Card => "card",
      PaymentMode::Check => "check",
      PaymentMode::Cash => "cash",
    }
  }
}

impl FromStr for PaymentMode {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "direct_debit" | "prelevement" => Ok(PaymentMode::DirectDebit),
      "transfer" | "virement" => Ok(PaymentMode::Transfer),
      "card" => Ok(PaymentMode::Card),
      "check" | "cheque" => Ok(PaymentMode::Check),
      "cash" => Ok(PaymentMode::Cash),
      _ => Err(ValueObjectError::InvalidPaymentMode(s.to_string())),
    }
  }
}

/// Position of a collection within the life of a mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SequenceType {
  Frst,
  Rcur,
  Ooff,
  Fnal,
}

impl SequenceType {
  pub fn as_str(&self) -> &'static str {
    match self {
      SequenceType::Frst => "FRST",
      SequenceType::Rcur => "RCUR",
      SequenceType::Ooff => "OOFF",
      SequenceType::Fnal => "FNAL",
    }
  }

  /// Sequence type to use for the next collection once this one was sent.
  pub fn after_collection(&self) -> SequenceType {
    match self {
      SequenceType::Frst => SequenceType::Rcur,
      other => *other,
    }
  }
}

impl Default for SequenceType {
  fn default() -> Self {
    SequenceType::Frst
  }
}

impl FromStr for SequenceType {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().as_str() {
      "FRST" => Ok(SequenceType::Frst),
      "RCUR" => Ok(SequenceType::Rcur),
      "OOFF" => Ok(SequenceType::Ooff),
      "FNAL" => Ok(SequenceType::Fnal),
      _ => Err(ValueObjectError::InvalidSequenceType(s.to_string())),
    }
  }
}

impl fmt::Display for SequenceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// Operator-triggered state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
  MarkExported,
  MarkExecuted,
  MarkPaid,
}

impl StatusAction {
  pub const ALL: [StatusAction; 3] = [
    StatusAction::MarkExported,
    StatusAction::MarkExecuted,
    StatusAction::MarkPaid,
  ];

  /// Actions an invoice in `status` can take.
  pub fn available_from(status: DebitStatus) -> Vec<StatusAction> {
    Self::ALL
      .into_iter()
      .filter(|a| status.can_transition_to(a.target()))
      .collect()
  }

  pub fn target(&self) -> DebitStatus {
    match self {
      StatusAction::MarkExported => DebitStatus::Exported,
      StatusAction::MarkExecuted => DebitStatus::Executed,
      StatusAction::MarkPaid => DebitStatus::Paid,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      StatusAction::MarkExported => "mark_exported",
      StatusAction::MarkExecuted => "mark_executed",
      StatusAction::MarkPaid => "mark_paid",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      StatusAction::MarkExported => "Marquer comme exporté",
      StatusAction::MarkExecuted => "Marquer comme exécuté",
      StatusAction::MarkPaid => "Marquer comme payé",
    }
  }
}

impl FromStr for StatusAction {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "mark_exported" => Ok(StatusAction::MarkExported),
      "mark_executed" => Ok(StatusAction::MarkExecuted),
      "mark_paid" => Ok(StatusAction::MarkPaid),
      _ => Err(ValueObjectError::InvalidAction(s.to_string())),
    }
  }
}

/// IBAN with mod-97 checksum validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iban(String);

impl Iban {
  const MIN_LENGTH: usize = 15;
  const MAX_LENGTH: usize = 34;

  pub fn new(iban: impl Into<String>) -> Result<Self, ValueObjectError> {
    let iban = iban
      .into()
      .chars()
      .filter(|c| !c.is_whitespace())
      .collect::<String>()
      .to_uppercase();

    if iban.len() < Self::MIN_LENGTH || iban.len() > Self::MAX_LENGTH {
      return Err(ValueObjectError::InvalidIban(format!(
        "length must be between {} and {} characters",
        Self::MIN_LENGTH,
        Self::MAX_LENGTH
      )));
    }

    if !Self::is_valid_format(&iban) {
      return Err(ValueObjectError::InvalidIban(
        "expected country code, check digits and alphanumeric account".to_string(),
      ));
    }

    if mod97(&format!("{}{}", &iban[4..], &iban[..4])) != 1 {
      return Err(ValueObjectError::InvalidIban("checksum mismatch".to_string()));
    }

    Ok(Self(iban))
  }

  fn is_valid_format(iban: &str) -> bool {
    let bytes = iban.as_bytes();
    bytes[..2].iter().all(u8::is_ascii_uppercase)
      && bytes[2..4].iter().all(u8::is_ascii_digit)
      && bytes[4..].iter().all(u8::is_ascii_alphanumeric)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn country_code(&self) -> &str {
    &self.0[..2]
  }

  /// Format IBAN with spaces every 4 characters for display
  pub fn formatted(&self) -> String {
    group_by_four(&self.0)
  }

  /// Display form hiding everything but the country code and last four characters.
  pub fn masked(&self) -> String {
    let len = self.0.len();
    let hidden = "*".repeat(len - 6);
    group_by_four(&format!("{}{}{}", &self.0[..2], hidden, &self.0[len - 4..]))
  }
}

impl fmt::Display for Iban {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Bank Identifier Code (8 or 11 characters)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bic(String);

impl Bic {
  pub fn new(bic: impl Into<String>) -> Result<Self, ValueObjectError> {
    let bic = bic
      .into()
      .chars()
      .filter(|c| !c.is_whitespace())
      .collect::<String>()
      .to_uppercase();

    if !BIC_PATTERN.is_match(&bic) {
      return Err(ValueObjectError::InvalidBic(format!(
        "'{}' is not an 8 or 11 character BIC",
        bic
      )));
    }

    Ok(Self(bic))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Bic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Unique mandate reference (RUM)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateReference(String);

impl MandateReference {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into().trim().to_string();

    if !MANDATE_REFERENCE_PATTERN.is_match(&value) {
      return Err(ValueObjectError::InvalidMandateReference(format!(
        "'{}' must be 1 to 35 characters from the SEPA character set, without spaces",
        value
      )));
    }

    Ok(Self(value))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// SEPA creditor identifier (ICS)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditorIdentifier(String);

impl CreditorIdentifier {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value
      .into()
      .chars()
      .filter(|c| !c.is_whitespace())
      .collect::<String>()
      .to_uppercase();

    if value.len() > 35 || !CREDITOR_ID_PATTERN.is_match(&value) {
      return Err(ValueObjectError::InvalidCreditorIdentifier(format!(
        "'{}' does not look like a SEPA creditor identifier",
        value
      )));
    }

    // Check digits cover the national identifier followed by the country code;
    // the creditor business code (positions 5-7) is excluded.
    let expected = 98 - mod97(&format!("{}{}00", &value[7..], &value[..2]));
    let actual: u32 = value[2..4].parse().unwrap_or(0);
    if expected != actual {
      return Err(ValueObjectError::InvalidCreditorIdentifier(format!(
        "check digits of '{}' should be {:02}",
        value, expected
      )));
    }

    Ok(Self(value))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CreditorIdentifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Amount of a single collection, in euros
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DebitAmount(Decimal);

impl DebitAmount {
  pub const CURRENCY: &'static str = "EUR";

  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value <= Decimal::ZERO {
      return Err(ValueObjectError::InvalidAmount(
        "Amount must be positive".to_string(),
      ));
    }
    if value.normalize().scale() > 2 {
      return Err(ValueObjectError::InvalidAmount(format!(
        "{} has more than 2 decimal places",
        value
      )));
    }
    if value > Decimal::new(99_999_999_999, 2) {
      return Err(ValueObjectError::InvalidAmount(format!(
        "{} exceeds the SEPA maximum of 999999999.99",
        value
      )));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

impl fmt::Display for DebitAmount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", format_amount(self.0))
  }
}

/// Always two decimals, as required for `InstdAmt` and `CtrlSum`.
pub fn format_amount(amount: Decimal) -> String {
  format!("{:.2}", amount.round_dp(2))
}

// mod 97 over an alphanumeric string, letters counting as A=10 .. Z=35
fn mod97(value: &str) -> u32 {
  value.chars().fold(0u32, |remainder, c| match c.to_digit(36) {
    Some(v) if v >= 10 => (remainder * 100 + v) % 97,
    Some(v) => (remainder * 10 + v) % 97,
    None => remainder,
  })
}

fn group_by_four(value: &str) -> String {
  value
    .chars()
    .enumerate()
    .fold(String::new(), |mut acc, (i, c)| {
      if i > 0 && i % 4 == 0 {
        acc.push(' ');
      }
      acc.push(c);
      acc
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_status_transitions() {
    assert!(DebitStatus::Pending.can_transition_to(DebitStatus::Exported));
    assert!(DebitStatus::Exported.can_transition_to(DebitStatus::Paid));
    assert!(DebitStatus::Exported.can_transition_to(DebitStatus::Executed));
    assert!(DebitStatus::Executed.can_transition_to(DebitStatus::Paid));
    assert!(!DebitStatus::Pending.can_transition_to(DebitStatus::Paid));
    assert!(!DebitStatus::Paid.can_transition_to(DebitStatus::Pending));
    assert!(!DebitStatus::Exported.can_transition_to(DebitStatus::Exported));
  }

  #[test]
  fn test_status_sources() {
    assert_eq!(
      DebitStatus::sources_of(DebitStatus::Exported),
      vec![DebitStatus::Pending]
    );
    assert_eq!(
      DebitStatus::sources_of(DebitStatus::Paid),
      vec![DebitStatus::Exported, DebitStatus::Executed]
    );
    assert!(DebitStatus::sources_of(DebitStatus::Pending).is_empty());
  }

  #[test]
  fn test_status_parsing() {
    assert_eq!(DebitStatus::from_str("Pending").unwrap(), DebitStatus::Pending);
    assert_eq!(DebitStatus::from_str("paid").unwrap(), DebitStatus::Paid);
    assert!(DebitStatus::from_str("draft").is_err());
  }

  #[test]
  fn test_action_targets() {
    assert_eq!(
      StatusAction::from_str("mark_exported").unwrap().target(),
      DebitStatus::Exported
    );
    assert_eq!(
      StatusAction::from_str("mark_paid").unwrap().target(),
      DebitStatus::Paid
    );
    assert!(StatusAction::from_str("mark_cancelled").is_err());

    assert_eq!(
      StatusAction::available_from(DebitStatus::Pending),
      vec![StatusAction::MarkExported]
    );
    assert_eq!(
      StatusAction::available_from(DebitStatus::Exported),
      vec![StatusAction::MarkExecuted, StatusAction::MarkPaid]
    );
    assert!(StatusAction::available_from(DebitStatus::Paid).is_empty());
  }

  #[test]
  fn test_sequence_type_after_collection() {
    assert_eq!(SequenceType::Frst.after_collection(), SequenceType::Rcur);
    assert_eq!(SequenceType::Rcur.after_collection(), SequenceType::Rcur);
    assert_eq!(SequenceType::Ooff.after_collection(), SequenceType::Ooff);
    assert_eq!(SequenceType::from_str("rcur").unwrap(), SequenceType::Rcur);
  }

  #[test]
  fn test_iban_validation() {
    let iban = Iban::new("fr76 3000 6000 0112 3456 7890 189").unwrap();
    assert_eq!(iban.as_str(), "FR7630006000011234567890189");
    assert_eq!(iban.country_code(), "FR");
    assert_eq!(iban.formatted(), "FR76 3000 6000 0112 3456 7890 189");
    assert_eq!(iban.masked(), "FR** **** **** **** **** ***0 189");

    assert!(Iban::new("DE89370400440532013000").is_ok());
    assert!(Iban::new("FR1420041010050500013M02606").is_ok());
    assert!(Iban::new("DE89370400440532013001").is_err());
    assert!(Iban::new("FR76").is_err());
    assert!(Iban::new("7630006000011234567890189FR").is_err());
  }

  #[test]
  fn test_bic_validation() {
    assert_eq!(Bic::new("agrifrpp").unwrap().as_str(), "AGRIFRPP");
    assert!(Bic::new("BNPAFRPPXXX").is_ok());
    assert!(Bic::new("BNPAFRPPXX").is_err());
    assert!(Bic::new("1NPAFRPP").is_err());
  }

  #[test]
  fn test_mandate_reference() {
    assert!(MandateReference::new("RUM-2024-0001").is_ok());
    assert!(MandateReference::new("").is_err());
    assert!(MandateReference::new("RUM 001").is_err());
    assert!(MandateReference::new("R".repeat(36)).is_err());
  }

  #[test]
  fn test_creditor_identifier() {
    assert!(CreditorIdentifier::new("FR72ZZZ123456").is_ok());
    assert!(CreditorIdentifier::new("DE98ZZZ09999999999").is_ok());
    assert!(CreditorIdentifier::new("FR73ZZZ123456").is_err());
    assert!(CreditorIdentifier::new("ZZZ123456").is_err());
  }

  #[test]
  fn test_debit_amount() {
    assert_eq!(DebitAmount::new(dec!(120)).unwrap().to_string(), "120.00");
    assert_eq!(DebitAmount::new(dec!(80.5)).unwrap().to_string(), "80.50");
    assert!(DebitAmount::new(dec!(10.500)).is_ok());
    assert!(DebitAmount::new(dec!(0)).is_err());
    assert!(DebitAmount::new(dec!(-5)).is_err());
    assert!(DebitAmount::new(dec!(1.005)).is_err());
    assert!(DebitAmount::new(dec!(1000000000)).is_err());
  }
}
