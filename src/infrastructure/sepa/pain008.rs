use crate::domain::direct_debit::sepa_text::{self, MAX_NAME_LENGTH};
use crate::domain::direct_debit::value_objects::format_amount;
use crate::domain::direct_debit::{
  DebitAmount, DebitBatch, DebitError, DebitFileRenderer, DebitTransaction, PaymentGroup,
};

use super::xml_writer::XmlWriter;

pub const PAIN_008_NAMESPACE: &str = "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// ISO 20022 `pain.008.001.02` customer direct debit initiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pain008Renderer;

impl Pain008Renderer {
  pub fn new() -> Self {
    Self
  }

  pub fn to_xml(&self, batch: &DebitBatch) -> Result<Vec<u8>, DebitError> {
    if batch.groups.iter().any(|g| g.transactions.is_empty()) {
      return Err(DebitError::Rendering(
        "payment information block without transactions".to_string(),
      ));
    }

    let mut w = XmlWriter::new()?;
    w.start_with_attrs(
      "Document",
      &[("xmlns", PAIN_008_NAMESPACE), ("xmlns:xsi", XSI_NAMESPACE)],
    )?;
    w.start("CstmrDrctDbtInitn")?;

    // --- GrpHdr ---
    w.start("GrpHdr")?;
    w.text("MsgId", &batch.message_id)?;
    w.text(
      "CreDtTm",
      &batch.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
    )?;
    w.text("NbOfTxs", &batch.transaction_count().to_string())?;
    w.text("CtrlSum", &format_amount(batch.control_sum()))?;
    w.nested_text("InitgPty", "Nm", &creditor_name(batch))?;
    w.end("GrpHdr")?;

    for group in &batch.groups {
      write_payment_info(&mut w, batch, group)?;
    }

    w.end("CstmrDrctDbtInitn")?;
    w.end("Document")?;

    Ok(w.into_bytes())
  }
}

impl DebitFileRenderer for Pain008Renderer {
  fn content_type(&self) -> &'static str {
    "application/xml"
  }

  fn render(&self, batch: &DebitBatch) -> Result<Vec<u8>, DebitError> {
    self.to_xml(batch)
  }
}

fn creditor_name(batch: &DebitBatch) -> String {
  sepa_text::sanitize(&batch.creditor.name, MAX_NAME_LENGTH)
}

fn write_payment_info(
  w: &mut XmlWriter,
  batch: &DebitBatch,
  group: &PaymentGroup,
) -> Result<(), DebitError> {
  let creditor = &batch.creditor;

  w.start("PmtInf")?;
  w.text("PmtInfId", &group.payment_info_id)?;
  w.text("PmtMtd", "DD")?;
  w.text("BtchBookg", if batch.batch_booking { "true" } else { "false" })?;
  w.text("NbOfTxs", &group.transactions.len().to_string())?;
  w.text("CtrlSum", &format_amount(group.control_sum()))?;

  w.start("PmtTpInf")?;
  w.nested_text("SvcLvl", "Cd", "SEPA")?;
  w.nested_text("LclInstrm", "Cd", batch.local_instrument.as_str())?;
  w.text("SeqTp", group.sequence_type.as_str())?;
  w.end("PmtTpInf")?;

  w.text(
    "ReqdColltnDt",
    &group.collection_date.format("%Y-%m-%d").to_string(),
  )?;
  w.nested_text("Cdtr", "Nm", &creditor_name(batch))?;

  w.start("CdtrAcct")?;
  w.nested_text("Id", "IBAN", creditor.iban.as_str())?;
  w.end("CdtrAcct")?;

  w.start("CdtrAgt")?;
  w.nested_text("FinInstnId", "BIC", creditor.bic.as_str())?;
  w.end("CdtrAgt")?;

  w.text("ChrgBr", "SLEV")?;

  w.start("CdtrSchmeId")?;
  w.start("Id")?;
  w.start("PrvtId")?;
  w.start("Othr")?;
  w.text("Id", creditor.identifier.as_str())?;
  w.nested_text("SchmeNm", "Prtry", "SEPA")?;
  w.end("Othr")?;
  w.end("PrvtId")?;
  w.end("Id")?;
  w.end("CdtrSchmeId")?;

  for transaction in &group.transactions {
    write_transaction(w, transaction)?;
  }

  w.end("PmtInf")?;
  Ok(())
}

fn write_transaction(w: &mut XmlWriter, tx: &DebitTransaction) -> Result<(), DebitError> {
  w.start("DrctDbtTxInf")?;
  w.nested_text("PmtId", "EndToEndId", &tx.end_to_end_id)?;
  w.text_with_attrs(
    "InstdAmt",
    &tx.amount.to_string(),
    &[("Ccy", DebitAmount::CURRENCY)],
  )?;

  w.start("DrctDbtTx")?;
  w.start("MndtRltdInf")?;
  w.text("MndtId", tx.mandate_reference.as_str())?;
  w.text(
    "DtOfSgntr",
    &tx.mandate_signed_on.format("%Y-%m-%d").to_string(),
  )?;
  w.end("MndtRltdInf")?;
  w.end("DrctDbtTx")?;

  w.start("DbtrAgt")?;
  w.nested_text("FinInstnId", "BIC", tx.debtor_bic.as_str())?;
  w.end("DbtrAgt")?;

  w.nested_text("Dbtr", "Nm", &tx.debtor_name)?;

  w.start("DbtrAcct")?;
  w.nested_text("Id", "IBAN", tx.debtor_iban.as_str())?;
  w.end("DbtrAcct")?;

  w.nested_text("RmtInf", "Ustrd", &tx.remittance_info)?;
  w.end("DrctDbtTxInf")?;
  Ok(())
}
