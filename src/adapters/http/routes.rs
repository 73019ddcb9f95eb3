use actix_web::web;
use std::sync::Arc;

use crate::application::direct_debit::{
  ChangeDebitStatusUseCase, GenerateSepaFileUseCase, GetCreditorProfileUseCase,
  ListDirectDebitsUseCase,
};

use super::errors::ApiError;
use super::handlers::{prelevements, prelevements_web};
use super::templates::TemplateEngine;

/// Use cases behind the `/prelevements` endpoints
#[derive(Clone)]
pub struct PrelevementRouteDependencies {
  pub list_use_case: Arc<ListDirectDebitsUseCase>,
  pub generate_use_case: Arc<GenerateSepaFileUseCase>,
  pub change_status_use_case: Arc<ChangeDebitStatusUseCase>,
  pub creditor_use_case: Arc<GetCreditorProfileUseCase>,
}

/// Configure direct debit routes
///
/// Mounts the direct debit endpoints under the provided scope
/// (e.g., /prelevements).
///
/// # Routes
///
/// - GET / - List direct debit invoices (`?status=`)
/// - POST / - Apply a status action
/// - POST /pain008 - Download a PAIN.008 file
/// - GET /creditor - Configured creditor profile
/// - GET /board - Selection page
/// - POST /board/export - Download from the selection page
/// - POST /board/status - Status action from the selection page
///
/// # Example
///
/// ```no_run
/// use actix_web::{App, web};
/// # use debitdesk::adapters::http::{TemplateEngine, routes::*};
///
/// # fn example(deps: PrelevementRouteDependencies, templates: TemplateEngine) {
/// let app = App::new().service(
///   web::scope("/prelevements")
///     .configure(|cfg| configure_prelevement_routes(cfg, deps, templates)),
/// );
/// # }
/// ```
pub fn configure_prelevement_routes(
  cfg: &mut web::ServiceConfig,
  deps: PrelevementRouteDependencies,
  templates: TemplateEngine,
) {
  cfg
    .app_data(json_config())
    .app_data(query_config())
    .app_data(web::Data::new(templates))
    .app_data(web::Data::new(deps.list_use_case))
    .app_data(web::Data::new(deps.generate_use_case))
    .app_data(web::Data::new(deps.change_status_use_case))
    .app_data(web::Data::new(deps.creditor_use_case))
    .route("", web::get().to(prelevements::list_direct_debits_handler))
    .route("", web::post().to(prelevements::change_debit_status_handler))
    .route(
      "/pain008",
      web::post().to(prelevements::generate_sepa_file_handler),
    )
    .route("/creditor", web::get().to(prelevements::get_creditor_handler))
    .route("/board", web::get().to(prelevements_web::board_page))
    .route(
      "/board/export",
      web::post().to(prelevements_web::board_export_submit),
    )
    .route(
      "/board/status",
      web::post().to(prelevements_web::board_status_submit),
    );
}

/// Malformed JSON bodies answer with the usual error document
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .error_handler(|err, _req| ApiError::Validation(format!("Invalid request body: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
  web::QueryConfig::default()
    .error_handler(|err, _req| ApiError::Validation(format!("Invalid query: {}", err)).into())
}
