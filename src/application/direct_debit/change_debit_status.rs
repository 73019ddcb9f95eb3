use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::direct_debit::{DebitError, DirectDebitService, StatusAction};

#[derive(Debug, Deserialize)]
pub struct ChangeDebitStatusCommand {
  pub invoice_ids: Vec<Uuid>,
  pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedInvoiceDto {
  pub id: Uuid,
  pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ChangeDebitStatusResponse {
  pub action: String,
  pub updated: Vec<Uuid>,
  pub unchanged: Vec<Uuid>,
  pub skipped: Vec<SkippedInvoiceDto>,
}

pub struct ChangeDebitStatusUseCase {
  direct_debit_service: Arc<DirectDebitService>,
}

impl ChangeDebitStatusUseCase {
  pub fn new(direct_debit_service: Arc<DirectDebitService>) -> Self {
    Self {
      direct_debit_service,
    }
  }

  pub async fn execute(
    &self,
    command: ChangeDebitStatusCommand,
  ) -> Result<ChangeDebitStatusResponse, DebitError> {
    let action = StatusAction::from_str(&command.action)?;

    let report = self
      .direct_debit_service
      .change_status(&command.invoice_ids, action)
      .await?;

    Ok(ChangeDebitStatusResponse {
      action: action.as_str().to_string(),
      updated: report.updated,
      unchanged: report.unchanged,
      skipped: report
        .skipped
        .into_iter()
        .map(|(id, status)| SkippedInvoiceDto {
          id,
          status: status.as_str().to_string(),
        })
        .collect(),
    })
  }
}
