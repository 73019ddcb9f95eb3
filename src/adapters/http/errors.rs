use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use std::fmt;

use crate::domain::direct_debit::{BatchRejection, DebitError};

use super::dtos::ErrorResponse;

/// API error type that maps domain errors to HTTP responses
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
  /// Validation error (400 Bad Request)
  Validation(String),

  /// One or more invoices cannot be collected (422 Unprocessable Entity)
  BatchRejected(Vec<BatchRejection>),

  /// Internal server error (500 Internal Server Error)
  Internal(String),
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::BatchRejected(rejections) => {
        write!(f, "Batch rejected: {} invoice(s)", rejections.len())
      }
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::BatchRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (error_type, message, details) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone(), None),
      ApiError::BatchRejected(rejections) => {
        let names: Vec<&str> = rejections
          .iter()
          .map(|r| r.invoice_number.as_str())
          .collect();
        (
          "batch_rejected",
          format!(
            "No file generated: invalid SEPA data for invoice(s) {}",
            names.join(", ")
          ),
          Some(serde_json::json!({ "rejections": rejections })),
        )
      }
      ApiError::Internal(msg) => {
        // Don't expose internal error details in production
        tracing::error!("Internal error: {}", msg);
        (
          "internal_error",
          "An internal server error occurred".to_string(),
          None,
        )
      }
    };

    let error_response = ErrorResponse {
      error: error_type.to_string(),
      message,
      details,
    };

    HttpResponse::build(status)
      .content_type(ContentType::json())
      .json(error_response)
  }
}

/// Convert DebitError to ApiError
impl From<DebitError> for ApiError {
  fn from(error: DebitError) -> Self {
    match error {
      DebitError::Validation(e) => ApiError::Validation(e.to_string()),
      DebitError::BatchRejected { rejections } => ApiError::BatchRejected(rejections),
      e @ (DebitError::EmptyBatch | DebitError::CollectionDateTooEarly { .. }) => {
        ApiError::Validation(e.to_string())
      }
      e @ (DebitError::Configuration(_)
      | DebitError::Rendering(_)
      | DebitError::Repository(_)
      | DebitError::Database(_)
      | DebitError::Internal(_)) => ApiError::Internal(e.to_string()),
    }
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let messages: Vec<String> = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors
          .iter()
          .map(|error| {
            error
              .message
              .as_ref()
              .map(|m| m.to_string())
              .unwrap_or_else(|| format!("Invalid field: {}", field))
          })
          .collect::<Vec<_>>()
      })
      .collect();

    ApiError::Validation(messages.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::direct_debit::{RejectionReason, SepaField, ValueObjectError};
  use actix_web::body::MessageBody;
  use uuid::Uuid;

  #[test]
  fn test_api_error_status_codes() {
    assert_eq!(
      ApiError::Validation("test".to_string()).status_code(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      ApiError::BatchRejected(vec![]).status_code(),
      StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
      ApiError::Internal("test".to_string()).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn test_debit_error_conversion() {
    let api_error: ApiError = DebitError::EmptyBatch.into();
    assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);

    let api_error: ApiError =
      DebitError::Validation(ValueObjectError::InvalidStatus("open".to_string())).into();
    assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);

    let api_error: ApiError = DebitError::Rendering("boom".to_string()).into();
    assert_eq!(api_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn test_batch_rejected_body_lists_invoices() {
    let error = ApiError::BatchRejected(vec![BatchRejection {
      invoice_id: Uuid::nil(),
      invoice_number: "F-B".to_string(),
      reason: RejectionReason::MissingSepaFields {
        fields: vec![SepaField::Bic],
      },
    }]);

    let body = error.error_response().into_body().try_into_bytes().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["error"], "batch_rejected");
    assert!(json["message"].as_str().unwrap().contains("F-B"));
    assert_eq!(json["details"]["rejections"][0]["invoiceNumber"], "F-B");
    assert_eq!(json["details"]["rejections"][0]["reason"]["kind"], "missing_sepa_fields");
  }
}
