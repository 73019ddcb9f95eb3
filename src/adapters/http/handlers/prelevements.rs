use actix_web::{
  HttpResponse,
  http::header::{ContentDisposition, DispositionParam, DispositionType},
  web,
};
use std::sync::Arc;
use validator::Validate;

use crate::adapters::http::{
  dtos::{ChangeDebitStatusRequest, GenerateSepaFileRequest, ListDirectDebitsQuery},
  errors::ApiError,
};
use crate::application::direct_debit::{
  ChangeDebitStatusCommand, ChangeDebitStatusUseCase, GenerateSepaFileCommand,
  GenerateSepaFileResponse, GenerateSepaFileUseCase, GetCreditorProfileUseCase,
  ListDirectDebitsCommand, ListDirectDebitsUseCase,
};
use crate::domain::direct_debit::value_objects::format_amount;
use crate::domain::direct_debit::DebitError;
use crate::infrastructure::metrics;

pub const MESSAGE_ID_HEADER: &str = "X-Sepa-Message-Id";
pub const TRANSACTIONS_HEADER: &str = "X-Sepa-Transactions";
pub const CONTROL_SUM_HEADER: &str = "X-Sepa-Control-Sum";

/// Handler for listing direct debit invoices
///
/// GET /prelevements?status=pending
/// Response: ListDirectDebitsResponse (JSON)
pub async fn list_direct_debits_handler(
  query: web::Query<ListDirectDebitsQuery>,
  use_case: web::Data<Arc<ListDirectDebitsUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let command = ListDirectDebitsCommand {
    status_filter: query.into_inner().status,
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Handler for PAIN.008 generation
///
/// POST /prelevements/pain008
/// Body: GenerateSepaFileRequest (JSON)
/// Response: the XML file as an attachment
pub async fn generate_sepa_file_handler(
  request: web::Json<GenerateSepaFileRequest>,
  use_case: web::Data<Arc<GenerateSepaFileUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let command = GenerateSepaFileCommand {
    invoice_ids: request.invoice_ids,
    requested_collection_date: request.requested_collection_date,
  };

  let file = run_generation(&use_case, command).await?;
  Ok(file_download(file))
}

/// Runs the use case and keeps the export counters in step with the outcome.
pub(crate) async fn run_generation(
  use_case: &GenerateSepaFileUseCase,
  command: GenerateSepaFileCommand,
) -> Result<GenerateSepaFileResponse, ApiError> {
  match use_case.execute(command).await {
    Ok(file) => {
      metrics::FILES_GENERATED.inc();
      metrics::TRANSACTIONS_EXPORTED.inc_by(file.transaction_count as u64);
      Ok(file)
    }
    Err(e @ DebitError::BatchRejected { .. }) => {
      metrics::BATCHES_REJECTED.inc();
      Err(e.into())
    }
    Err(e) => Err(e.into()),
  }
}

/// Attachment response carrying the summary headers.
pub(crate) fn file_download(file: GenerateSepaFileResponse) -> HttpResponse {
  HttpResponse::Ok()
    .content_type(file.content_type)
    .insert_header(ContentDisposition {
      disposition: DispositionType::Attachment,
      parameters: vec![DispositionParam::Filename(file.file_name)],
    })
    .insert_header((MESSAGE_ID_HEADER, file.message_id))
    .insert_header((TRANSACTIONS_HEADER, file.transaction_count.to_string()))
    .insert_header((CONTROL_SUM_HEADER, format_amount(file.control_sum)))
    .body(file.content)
}

/// Handler for status actions
///
/// POST /prelevements
/// Body: ChangeDebitStatusRequest (JSON)
/// Response: ChangeDebitStatusResponse (JSON)
pub async fn change_debit_status_handler(
  request: web::Json<ChangeDebitStatusRequest>,
  use_case: web::Data<Arc<ChangeDebitStatusUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let command = ChangeDebitStatusCommand {
    invoice_ids: request.invoice_ids,
    action: request.action,
  };

  let response = use_case.execute(command).await?;
  metrics::STATUS_UPDATES
    .with_label_values(&[response.action.as_str()])
    .inc_by(response.updated.len() as u64);

  Ok(HttpResponse::Ok().json(response))
}

/// Handler for the creditor profile
///
/// GET /prelevements/creditor
pub async fn get_creditor_handler(
  use_case: web::Data<Arc<GetCreditorProfileUseCase>>,
) -> Result<HttpResponse, ApiError> {
  Ok(HttpResponse::Ok().json(use_case.execute()))
}
