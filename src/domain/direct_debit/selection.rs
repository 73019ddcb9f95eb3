use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use super::entities::{DebitCandidate, ExportBatch};

/// Operator's working selection on the direct debit board.
///
/// Only invoices whose client has complete SEPA information can be selected;
/// the selection lives as long as the page (or form) that holds it.
#[derive(Debug, Clone, Default)]
pub struct BatchSelection {
  selectable: HashSet<Uuid>,
  selected: BTreeSet<Uuid>,
  collection_date: Option<NaiveDate>,
}

impl BatchSelection {
  pub fn new(candidates: &[DebitCandidate]) -> Self {
    Self {
      selectable: candidates
        .iter()
        .filter(|c| c.has_valid_sepa_info())
        .map(|c| c.invoice.id)
        .collect(),
      selected: BTreeSet::new(),
      collection_date: None,
    }
  }

  /// Flips one invoice in or out. Returns whether it is now selected;
  /// ineligible ids are refused and leave the selection untouched.
  pub fn toggle(&mut self, invoice_id: Uuid) -> bool {
    if self.selected.remove(&invoice_id) {
      return false;
    }
    if !self.selectable.contains(&invoice_id) {
      return false;
    }
    self.selected.insert(invoice_id)
  }

  pub fn select_all(&mut self) {
    self.selected.extend(self.selectable.iter().copied());
  }

  pub fn clear(&mut self) {
    self.selected.clear();
  }

  pub fn set_collection_date(&mut self, date: Option<NaiveDate>) {
    self.collection_date = date;
  }

  pub fn is_selected(&self, invoice_id: Uuid) -> bool {
    self.selected.contains(&invoice_id)
  }

  pub fn is_selectable(&self, invoice_id: Uuid) -> bool {
    self.selectable.contains(&invoice_id)
  }

  pub fn len(&self) -> usize {
    self.selected.len()
  }

  pub fn is_empty(&self) -> bool {
    self.selected.is_empty()
  }

  pub fn into_request(self) -> ExportBatch {
    ExportBatch {
      invoice_ids: self.selected.into_iter().collect(),
      requested_collection_date: self.collection_date,
    }
  }
}
