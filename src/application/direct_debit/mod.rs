pub mod change_debit_status;
pub mod generate_sepa_file;
pub mod get_creditor_profile;
pub mod list_direct_debits;

pub use change_debit_status::{
  ChangeDebitStatusCommand, ChangeDebitStatusResponse, ChangeDebitStatusUseCase, SkippedInvoiceDto,
};
pub use generate_sepa_file::{
  GenerateSepaFileCommand, GenerateSepaFileResponse, GenerateSepaFileUseCase,
};
pub use get_creditor_profile::{CreditorProfileResponse, GetCreditorProfileUseCase};
pub use list_direct_debits::{
  DirectDebitRowDto, ListDirectDebitsCommand, ListDirectDebitsResponse, ListDirectDebitsUseCase,
};
