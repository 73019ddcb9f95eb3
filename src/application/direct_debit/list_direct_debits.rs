use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::direct_debit::{
  BatchSelection, DebitCandidate, DebitError, DebitStatus, DirectDebitService, SepaField,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListDirectDebitsCommand {
  pub status_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectDebitRowDto {
  pub id: Uuid,
  pub invoice_number: String,
  pub client_id: Uuid,
  pub client_name: Option<String>,
  #[serde(with = "rust_decimal::serde::float")]
  pub amount: Decimal,
  pub due_date: NaiveDate,
  pub debit_date: Option<NaiveDate>,
  pub status: String,
  pub status_label: String,
  pub has_valid_sepa_info: bool,
  pub missing_sepa_fields: Vec<SepaField>,
  pub mandate_reference: Option<String>,
  pub sequence_type: Option<String>,
}

impl From<&DebitCandidate> for DirectDebitRowDto {
  fn from(candidate: &DebitCandidate) -> Self {
    let invoice = &candidate.invoice;
    let client = candidate.client.as_ref();
    Self {
      id: invoice.id,
      invoice_number: invoice.invoice_number.value().to_string(),
      client_id: invoice.client_id,
      client_name: client.map(|c| c.name.clone()),
      amount: invoice.amount,
      due_date: invoice.due_date,
      debit_date: invoice.debit_date,
      status: invoice.status.as_str().to_string(),
      status_label: invoice.status.label().to_string(),
      has_valid_sepa_info: candidate.has_valid_sepa_info(),
      missing_sepa_fields: candidate.missing_fields(),
      mandate_reference: client.and_then(|c| c.sepa.mandate_reference.clone()),
      sequence_type: client.map(|c| c.sepa.sequence_type.as_str().to_string()),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDirectDebitsResponse {
  pub status: String,
  pub invoices: Vec<DirectDebitRowDto>,
  pub total: usize,
  #[serde(with = "rust_decimal::serde::float")]
  pub total_amount: Decimal,
  pub selectable_count: usize,
  #[serde(with = "rust_decimal::serde::float")]
  pub selectable_amount: Decimal,
  pub earliest_collection_date: NaiveDate,
}

pub struct ListDirectDebitsUseCase {
  direct_debit_service: Arc<DirectDebitService>,
}

impl ListDirectDebitsUseCase {
  pub fn new(direct_debit_service: Arc<DirectDebitService>) -> Self {
    Self {
      direct_debit_service,
    }
  }

  pub async fn execute(
    &self,
    command: ListDirectDebitsCommand,
  ) -> Result<ListDirectDebitsResponse, DebitError> {
    let status = Self::parse_status(command.status_filter.as_deref())?;

    let candidates = self.direct_debit_service.list_candidates(status).await?;
    Ok(Self::summarize(
      status,
      &candidates,
      self.direct_debit_service.earliest_collection_date(),
    ))
  }

  /// Empty selection over the invoices currently listed under `status`.
  pub async fn selection(&self, status: DebitStatus) -> Result<BatchSelection, DebitError> {
    let candidates = self.direct_debit_service.list_candidates(status).await?;
    Ok(BatchSelection::new(&candidates))
  }

  /// `pending` when the filter is absent or blank.
  pub fn parse_status(filter: Option<&str>) -> Result<DebitStatus, DebitError> {
    match filter.map(str::trim) {
      Some(s) if !s.is_empty() => Ok(DebitStatus::from_str(s)?),
      _ => Ok(DebitStatus::Pending),
    }
  }

  /// Candidates as rows plus totals.
  pub fn summarize(
    status: DebitStatus,
    candidates: &[DebitCandidate],
    earliest_collection_date: NaiveDate,
  ) -> ListDirectDebitsResponse {
    let invoices: Vec<DirectDebitRowDto> = candidates.iter().map(DirectDebitRowDto::from).collect();

    let total_amount = invoices.iter().map(|r| r.amount).sum();
    let selectable: Vec<&DirectDebitRowDto> =
      invoices.iter().filter(|r| r.has_valid_sepa_info).collect();
    let selectable_count = selectable.len();
    let selectable_amount = selectable.iter().map(|r| r.amount).sum();

    ListDirectDebitsResponse {
      status: status.as_str().to_string(),
      total: invoices.len(),
      total_amount,
      selectable_count,
      selectable_amount,
      earliest_collection_date,
      invoices,
    }
  }
}
