pub mod calendar;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod selection;
pub mod sepa_text;
pub mod services;
pub mod value_objects;

pub use calendar::CollectionCalendar;
pub use entities::{
  Client, CreditorProfile, DebitBatch, DebitCandidate, DebitTransaction, ExportBatch, Invoice,
  LocalInstrument, PaymentGroup, SepaField, SepaProfile,
};
pub use errors::{BatchRejection, DebitError, RejectionReason};
pub use ports::{ClientRepository, Clock, DebitFileRenderer, InvoiceRepository};
pub use selection::BatchSelection;
pub use services::{
  DebitFile, DirectDebitService, DirectDebitServiceDependencies, DirectDebitSettings,
  StatusChangeReport,
};
pub use value_objects::{
  Bic, CreditorIdentifier, DebitAmount, DebitStatus, Iban, InvoiceNumber, MandateReference,
  PaymentMode, SequenceType, StatusAction, ValueObjectError,
};
