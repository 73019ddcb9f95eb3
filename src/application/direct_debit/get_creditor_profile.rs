use serde::Serialize;
use std::sync::Arc;

use crate::domain::direct_debit::DirectDebitService;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditorProfileResponse {
  pub name: String,
  pub creditor_identifier: String,
  /// Masked: country code and last four characters only
  pub iban: String,
  pub bic: String,
  pub lead_days: u32,
}

pub struct GetCreditorProfileUseCase {
  direct_debit_service: Arc<DirectDebitService>,
}

impl GetCreditorProfileUseCase {
  pub fn new(direct_debit_service: Arc<DirectDebitService>) -> Self {
    Self {
      direct_debit_service,
    }
  }

  pub fn execute(&self) -> CreditorProfileResponse {
    let creditor = self.direct_debit_service.creditor();
    CreditorProfileResponse {
      name: creditor.name.clone(),
      creditor_identifier: creditor.identifier.as_str().to_string(),
      iban: creditor.iban.masked(),
      bic: creditor.bic.as_str().to_string(),
      lead_days: self.direct_debit_service.lead_days(),
    }
  }
}
