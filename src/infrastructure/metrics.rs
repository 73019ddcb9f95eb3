//! Prometheus counters for the direct debit export, served on `GET /metrics`.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
  pub static ref REGISTRY: Registry = Registry::new_custom(Some("debitdesk".to_string()), None)
    .unwrap_or_default();
  pub static ref FILES_GENERATED: IntCounter = IntCounter::new(
    "sepa_files_generated_total",
    "PAIN.008 files handed out for download"
  )
  .expect("valid metric");
  pub static ref TRANSACTIONS_EXPORTED: IntCounter = IntCounter::new(
    "sepa_transactions_exported_total",
    "Direct debit transactions written to PAIN.008 files"
  )
  .expect("valid metric");
  pub static ref BATCHES_REJECTED: IntCounter = IntCounter::new(
    "sepa_batches_rejected_total",
    "Export requests refused because an invoice failed validation"
  )
  .expect("valid metric");
  pub static ref STATUS_UPDATES: IntCounterVec = IntCounterVec::new(
    Opts::new(
      "debit_status_updates_total",
      "Invoices moved by a status action"
    ),
    &["action"]
  )
  .expect("valid metric");
}

/// Registers the counters once at startup. Safe to call again.
pub fn register() {
  let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
    Box::new(FILES_GENERATED.clone()),
    Box::new(TRANSACTIONS_EXPORTED.clone()),
    Box::new(BATCHES_REJECTED.clone()),
    Box::new(STATUS_UPDATES.clone()),
  ];
  for collector in collectors {
    if let Err(e) = REGISTRY.register(collector) {
      tracing::debug!("Metric already registered: {}", e);
    }
  }
}

/// Text exposition of everything in [`REGISTRY`].
pub fn render() -> Result<String, prometheus::Error> {
  let mut buffer = Vec::new();
  TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
  String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
