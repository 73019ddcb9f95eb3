//! Direct debit back office: lists invoices collectable by SEPA direct debit,
//! builds PAIN.008.001.02 files for the bank and tracks their collection status.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
