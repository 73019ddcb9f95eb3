use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Query string of `GET /prelevements`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDirectDebitsQuery {
  /// `pending` (default), `exported`, `executed` or `paid`
  pub status: Option<String>,
}

/// Request for a PAIN.008 file
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSepaFileRequest {
  /// Invoices to collect; unknown ids are ignored
  #[validate(length(min = 1, message = "No invoices to export"))]
  pub invoice_ids: Vec<Uuid>,

  /// Collection date for every transaction; defaults per invoice when absent
  #[serde(default)]
  pub requested_collection_date: Option<NaiveDate>,
}

/// Request for a status action on a set of invoices
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDebitStatusRequest {
  #[validate(length(min = 1, message = "At least one invoice id is required"))]
  pub invoice_ids: Vec<Uuid>,

  /// `mark_exported`, `mark_executed` or `mark_paid`
  #[validate(length(min = 1, message = "Action is required"))]
  pub action: String,
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,

  /// Human-readable error message
  pub message: String,

  /// Optional detailed error information
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use validator::Validate;

  #[test]
  fn test_generate_request_uses_camel_case() {
    let json = r#"{
      "invoiceIds": ["6f1c2a8e-4d3b-4b8e-9a51-0c7d2e3f4a5b"],
      "requestedCollectionDate": "2024-06-15"
    }"#;
    let request: GenerateSepaFileRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.invoice_ids.len(), 1);
    assert_eq!(
      request.requested_collection_date,
      NaiveDate::from_ymd_opt(2024, 6, 15)
    );
    assert!(request.validate().is_ok());
  }

  #[test]
  fn test_generate_request_date_is_optional() {
    let json = r#"{"invoiceIds": []}"#;
    let request: GenerateSepaFileRequest = serde_json::from_str(json).unwrap();

    assert!(request.requested_collection_date.is_none());
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_change_status_request_validation() {
    let request = ChangeDebitStatusRequest {
      invoice_ids: vec![Uuid::new_v4()],
      action: "mark_paid".to_string(),
    };
    assert!(request.validate().is_ok());

    let request = ChangeDebitStatusRequest {
      invoice_ids: vec![],
      action: "mark_paid".to_string(),
    };
    assert!(request.validate().is_err());
  }
}
