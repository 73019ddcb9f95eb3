use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::entities::SepaField;
use super::value_objects::{DebitStatus, PaymentMode, ValueObjectError};

/// Why one invoice cannot go into a PAIN.008 file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
  MissingSepaFields { fields: Vec<SepaField> },
  UnknownClient { client_id: Uuid },
  InvalidSepaData { message: String },
  NotDirectDebit { payment_mode: PaymentMode },
  NotCollectable { status: DebitStatus },
  InvalidAmount { message: String },
}

impl fmt::Display for RejectionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RejectionReason::MissingSepaFields { fields } => {
        let names: Vec<String> = fields.iter().map(ToString::to_string).collect();
        write!(f, "client SEPA profile is missing {}", names.join(", "))
      }
      RejectionReason::UnknownClient { client_id } => write!(f, "client {} not found", client_id),
      RejectionReason::InvalidSepaData { message } => f.write_str(message),
      RejectionReason::NotDirectDebit { payment_mode } => {
        write!(f, "payment mode is {}, not direct debit", payment_mode.as_str())
      }
      RejectionReason::NotCollectable { status } => {
        write!(f, "invoice is already {}", status.as_str())
      }
      RejectionReason::InvalidAmount { message } => f.write_str(message),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRejection {
  pub invoice_id: Uuid,
  pub invoice_number: String,
  pub reason: RejectionReason,
}

impl fmt::Display for BatchRejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "invoice {}: {}", self.invoice_number, self.reason)
  }
}

fn join_rejections(rejections: &[BatchRejection]) -> String {
  rejections
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

#[derive(Debug, Error)]
pub enum DebitError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Direct debit batch rejected: {}", join_rejections(.rejections))]
  BatchRejected { rejections: Vec<BatchRejection> },

  #[error("No invoices to export")]
  EmptyBatch,

  #[error("Requested collection date {requested} is before the earliest allowed date {earliest}")]
  CollectionDateTooEarly {
    requested: NaiveDate,
    earliest: NaiveDate,
  },

  #[error("Invalid configuration: {0}")]
  Configuration(String),

  #[error("SEPA file rendering failed: {0}")]
  Rendering(String),

  #[error("Repository error: {0}")]
  Repository(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_batch_rejected_message_names_invoices() {
    let error = DebitError::BatchRejected {
      rejections: vec![
        BatchRejection {
          invoice_id: Uuid::nil(),
          invoice_number: "B".to_string(),
          reason: RejectionReason::MissingSepaFields {
            fields: vec![SepaField::Bic],
          },
        },
        BatchRejection {
          invoice_id: Uuid::nil(),
          invoice_number: "C".to_string(),
          reason: RejectionReason::NotCollectable {
            status: DebitStatus::Paid,
          },
        },
      ],
    };

    assert_eq!(
      error.to_string(),
      "Direct debit batch rejected: invoice B: client SEPA profile is missing BIC; \
       invoice C: invoice is already paid"
    );
  }
}
