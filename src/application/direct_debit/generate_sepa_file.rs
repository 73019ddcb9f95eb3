use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::direct_debit::{DebitError, DebitFile, DirectDebitService, ExportBatch};

#[derive(Debug, Clone, Default)]
pub struct GenerateSepaFileCommand {
  pub invoice_ids: Vec<Uuid>,
  pub requested_collection_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct GenerateSepaFileResponse {
  pub file_name: String,
  pub content_type: &'static str,
  pub content: Vec<u8>,
  pub message_id: String,
  pub transaction_count: usize,
  pub control_sum: Decimal,
}

impl From<DebitFile> for GenerateSepaFileResponse {
  fn from(file: DebitFile) -> Self {
    Self {
      file_name: file.file_name,
      content_type: file.content_type,
      content: file.content,
      message_id: file.message_id,
      transaction_count: file.transaction_count,
      control_sum: file.control_sum,
    }
  }
}

pub struct GenerateSepaFileUseCase {
  direct_debit_service: Arc<DirectDebitService>,
}

impl GenerateSepaFileUseCase {
  pub fn new(direct_debit_service: Arc<DirectDebitService>) -> Self {
    Self {
      direct_debit_service,
    }
  }

  pub async fn execute(
    &self,
    command: GenerateSepaFileCommand,
  ) -> Result<GenerateSepaFileResponse, DebitError> {
    let request = ExportBatch {
      invoice_ids: command.invoice_ids,
      requested_collection_date: command.requested_collection_date,
    };

    let file = self.direct_debit_service.generate_file(&request).await?;
    Ok(file.into())
  }
}
