use actix_web::{HttpResponse, http::StatusCode, web};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::http::{
  dtos::ListDirectDebitsQuery, errors::ApiError, templates::TemplateEngine,
};
use crate::application::direct_debit::{
  ChangeDebitStatusCommand, ChangeDebitStatusUseCase, GenerateSepaFileCommand,
  GenerateSepaFileUseCase, ListDirectDebitsCommand, ListDirectDebitsUseCase,
};
use crate::domain::direct_debit::value_objects::format_amount;
use crate::domain::direct_debit::{BatchSelection, DebitStatus, StatusAction};
use crate::infrastructure::metrics;

use super::prelevements::{file_download, run_generation};

/// Fields posted by the board form.
#[derive(Debug, Default, PartialEq)]
pub struct BoardForm {
  pub status: Option<String>,
  pub invoice_ids: Vec<String>,
  pub collection_date: Option<String>,
  pub select_all: bool,
  pub action: Option<String>,
}

impl BoardForm {
  /// Parses an urlencoded body; `invoice_id` may repeat.
  pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
      .map_err(|e| ApiError::Validation(format!("Invalid form: {}", e)))?;

    let mut form = BoardForm::default();
    for (key, value) in pairs {
      match key.as_str() {
        "status" => form.status = Some(value),
        "invoice_id" => form.invoice_ids.push(value),
        "collection_date" if !value.trim().is_empty() => form.collection_date = Some(value),
        "select_all" => form.select_all = true,
        "action" => form.action = Some(value),
        _ => {}
      }
    }
    Ok(form)
  }

  fn collection_date(&self) -> Result<Option<NaiveDate>, ApiError> {
    self
      .collection_date
      .as_deref()
      .map(|d| {
        NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
          .map_err(|_| ApiError::Validation(format!("Invalid collection date: {}", d)))
      })
      .transpose()
  }

  /// Checked ids; malformed values are returned as the error message.
  fn invoice_ids(&self) -> Result<Vec<Uuid>, ApiError> {
    let mut ids = Vec::with_capacity(self.invoice_ids.len());
    let mut malformed = Vec::new();
    for raw in &self.invoice_ids {
      match Uuid::parse_str(raw) {
        Ok(id) => ids.push(id),
        Err(_) => malformed.push(raw.as_str()),
      }
    }
    if !malformed.is_empty() {
      return Err(ApiError::Validation(format!(
        "Invalid invoice ids: {}",
        malformed.join(", ")
      )));
    }
    Ok(ids)
  }

  /// Applies the form to `selection`. Returns the ids that were refused.
  fn apply(&self, selection: &mut BatchSelection) -> Result<Vec<String>, ApiError> {
    selection.set_collection_date(self.collection_date()?);
    if self.select_all {
      selection.select_all();
      return Ok(Vec::new());
    }

    let mut refused = Vec::new();
    for raw in &self.invoice_ids {
      match Uuid::parse_str(raw) {
        Ok(id) if selection.is_selected(id) || selection.toggle(id) => {}
        _ => refused.push(raw.clone()),
      }
    }
    Ok(refused)
  }
}

async fn render_board(
  templates: &TemplateEngine,
  use_case: &ListDirectDebitsUseCase,
  status: DebitStatus,
  notice: Option<&str>,
  errors: &[String],
  http_status: StatusCode,
) -> Result<HttpResponse, ApiError> {
  let listing = use_case
    .execute(ListDirectDebitsCommand {
      status_filter: Some(status.as_str().to_string()),
    })
    .await?;

  let statuses: Vec<(&str, &str)> = DebitStatus::ALL
    .iter()
    .map(|s| (s.as_str(), s.label()))
    .collect();

  let actions: Vec<(&str, &str)> = StatusAction::available_from(status)
    .iter()
    .map(|a| (a.as_str(), a.label()))
    .collect();

  let amounts: HashMap<String, String> = listing
    .invoices
    .iter()
    .map(|r| (r.id.to_string(), format_amount(r.amount)))
    .collect();

  let mut context = tera::Context::new();
  context.insert("listing", &listing);
  context.insert("amounts", &amounts);
  context.insert("total_amount", &format_amount(listing.total_amount));
  context.insert("selectable_amount", &format_amount(listing.selectable_amount));
  context.insert("status", status.as_str());
  context.insert("statuses", &statuses);
  context.insert("exportable", &status.is_collectable());
  context.insert("actions", &actions);
  context.insert("notice", &notice);
  context.insert("errors", errors);

  let html = templates
    .render("prelevements/board.html.tera", &context)
    .map_err(|e| ApiError::Internal(format!("Template error: {}", e)))?;

  Ok(
    HttpResponse::build(http_status)
      .content_type("text/html")
      .body(html),
  )
}

// GET /prelevements/board - Selection page
pub async fn board_page(
  query: web::Query<ListDirectDebitsQuery>,
  templates: web::Data<TemplateEngine>,
  list_use_case: web::Data<Arc<ListDirectDebitsUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let status = ListDirectDebitsUseCase::parse_status(query.status.as_deref())?;
  render_board(&templates, &list_use_case, status, None, &[], StatusCode::OK).await
}

// POST /prelevements/board/export - Download the file for the checked rows
pub async fn board_export_submit(
  body: web::Bytes,
  templates: web::Data<TemplateEngine>,
  list_use_case: web::Data<Arc<ListDirectDebitsUseCase>>,
  generate_use_case: web::Data<Arc<GenerateSepaFileUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let form = BoardForm::parse(&body)?;
  let status = ListDirectDebitsUseCase::parse_status(form.status.as_deref())?;

  let mut selection = list_use_case.selection(status).await?;
  let refused = match form.apply(&mut selection) {
    Ok(refused) => refused,
    Err(ApiError::Validation(msg)) => {
      return render_board(
        &templates,
        &list_use_case,
        status,
        None,
        &[msg],
        StatusCode::BAD_REQUEST,
      )
      .await;
    }
    Err(e) => return Err(e),
  };

  if !refused.is_empty() {
    tracing::warn!(refused = ?refused, "Board export with ineligible invoices");
    let msg = format!(
      "These invoices cannot be selected: {}",
      refused.join(", ")
    );
    return render_board(
      &templates,
      &list_use_case,
      status,
      None,
      &[msg],
      StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
  }

  let request = selection.into_request();
  let command = GenerateSepaFileCommand {
    invoice_ids: request.invoice_ids,
    requested_collection_date: request.requested_collection_date,
  };

  match run_generation(&generate_use_case, command).await {
    Ok(file) => Ok(file_download(file)),
    Err(ApiError::BatchRejected(rejections)) => {
      let errors: Vec<String> = rejections.iter().map(ToString::to_string).collect();
      render_board(
        &templates,
        &list_use_case,
        status,
        None,
        &errors,
        StatusCode::UNPROCESSABLE_ENTITY,
      )
      .await
    }
    Err(ApiError::Validation(msg)) => {
      render_board(
        &templates,
        &list_use_case,
        status,
        None,
        &[msg],
        StatusCode::BAD_REQUEST,
      )
      .await
    }
    Err(e) => Err(e),
  }
}

// POST /prelevements/board/status - Apply a status action to the checked rows
pub async fn board_status_submit(
  body: web::Bytes,
  templates: web::Data<TemplateEngine>,
  list_use_case: web::Data<Arc<ListDirectDebitsUseCase>>,
  change_status_use_case: web::Data<Arc<ChangeDebitStatusUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let form = BoardForm::parse(&body)?;
  let status = ListDirectDebitsUseCase::parse_status(form.status.as_deref())?;

  let command = form.invoice_ids().and_then(|invoice_ids| {
    if invoice_ids.is_empty() {
      return Err(ApiError::Validation(
        "Select at least one invoice".to_string(),
      ));
    }
    let action = form
      .action
      .clone()
      .ok_or_else(|| ApiError::Validation("Action is required".to_string()))?;
    Ok(ChangeDebitStatusCommand {
      invoice_ids,
      action,
    })
  });

  let outcome = match command {
    Ok(command) => change_status_use_case
      .execute(command)
      .await
      .map_err(ApiError::from),
    Err(e) => Err(e),
  };

  match outcome {
    Ok(response) => {
      metrics::STATUS_UPDATES
        .with_label_values(&[response.action.as_str()])
        .inc_by(response.updated.len() as u64);

      let notice = format!(
        "{} facture(s) mise(s) à jour, {} déjà à jour, {} ignorée(s)",
        response.updated.len(),
        response.unchanged.len(),
        response.skipped.len()
      );
      render_board(
        &templates,
        &list_use_case,
        status,
        Some(notice.as_str()),
        &[],
        StatusCode::OK,
      )
      .await
    }
    Err(ApiError::Validation(msg)) => {
      render_board(
        &templates,
        &list_use_case,
        status,
        None,
        &[msg],
        StatusCode::BAD_REQUEST,
      )
      .await
    }
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_repeated_invoice_ids() {
    let body = b"status=pending&invoice_id=a&invoice_id=b&collection_date=2024-06-15";
    let form = BoardForm::parse(body).unwrap();

    assert_eq!(form.status.as_deref(), Some("pending"));
    assert_eq!(form.invoice_ids, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(form.collection_date.as_deref(), Some("2024-06-15"));
    assert!(!form.select_all);
  }

  #[test]
  fn test_parse_action_and_malformed_ids() {
    let form = BoardForm::parse(b"status=exported&invoice_id=nope&action=mark_paid").unwrap();
    assert_eq!(form.action.as_deref(), Some("mark_paid"));
    assert!(matches!(form.invoice_ids(), Err(ApiError::Validation(_))));
  }

  #[test]
  fn test_blank_collection_date_is_ignored() {
    let form = BoardForm::parse(b"collection_date=&select_all=1").unwrap();
    assert!(form.collection_date.is_none());
    assert!(form.select_all);
  }

  #[test]
  fn test_apply_refuses_unknown_and_malformed_ids() {
    let mut selection = BatchSelection::default();
    let form = BoardForm {
      invoice_ids: vec!["not-a-uuid".to_string(), Uuid::new_v4().to_string()],
      ..Default::default()
    };

    let refused = form.apply(&mut selection).unwrap();
    assert_eq!(refused.len(), 2);
    assert!(selection.is_empty());
  }

  #[test]
  fn test_apply_rejects_bad_date() {
    let mut selection = BatchSelection::default();
    let form = BoardForm {
      collection_date: Some("15/06/2024".to_string()),
      ..Default::default()
    };
    assert!(matches!(
      form.apply(&mut selection),
      Err(ApiError::Validation(_))
    ));
  }
}
