use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entities::{Client, DebitBatch, Invoice};
use super::errors::DebitError;
use super::value_objects::{DebitStatus, PaymentMode, SequenceType};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
  async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Invoice>, DebitError>;
  async fn find_by_payment_mode_and_status(
    &self,
    payment_mode: PaymentMode,
    status: DebitStatus,
  ) -> Result<Vec<Invoice>, DebitError>;
  /// Moves the listed direct debit invoices currently in one of `from` to `to`
  /// in a single statement. Returns the ids that actually changed.
  async fn transition_statuses(
    &self,
    ids: &[Uuid],
    from: &[DebitStatus],
    to: DebitStatus,
    at: DateTime<Utc>,
  ) -> Result<Vec<Uuid>, DebitError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
  async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Client>, DebitError>;
  /// Sets the sequence type of the listed clients whose mandate is currently `from`.
  async fn advance_sequence_type(
    &self,
    ids: &[Uuid],
    from: SequenceType,
    to: SequenceType,
  ) -> Result<u64, DebitError>;
}

/// Serialises a validated batch into the bank file format.
pub trait DebitFileRenderer: Send + Sync {
  fn content_type(&self) -> &'static str;
  fn render(&self, batch: &DebitBatch) -> Result<Vec<u8>, DebitError>;
}

/// Source of the current time, so collection dates can be pinned in tests.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  fn today(&self) -> chrono::NaiveDate {
    self.now().date_naive()
  }
}
