use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::direct_debit::{
  DebitError, DebitStatus, Invoice, InvoiceNumber, InvoiceRepository, PaymentMode,
};

#[derive(Debug, FromRow)]
struct InvoiceRow {
  id: Uuid,
  client_id: Uuid,
  invoice_number: String,
  amount: Decimal,
  issue_date: NaiveDate,
  due_date: NaiveDate,
  debit_date: Option<NaiveDate>,
  payment_mode: String,
  status: String,
  exported_at: Option<DateTime<Utc>>,
  paid_at: Option<DateTime<Utc>>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
  type Error = DebitError;

  fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
    Ok(Invoice {
      id: row.id,
      client_id: row.client_id,
      invoice_number: InvoiceNumber::new(row.invoice_number)?,
      amount: row.amount,
      issue_date: row.issue_date,
      due_date: row.due_date,
      debit_date: row.debit_date,
      payment_mode: PaymentMode::from_str(&row.payment_mode)?,
      status: DebitStatus::from_str(&row.status)?,
      exported_at: row.exported_at,
      paid_at: row.paid_at,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub struct PostgresInvoiceRepository {
  pool: PgPool,
}

impl PostgresInvoiceRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Inserts an invoice; used by fixtures and data imports.
  pub async fn create(&self, invoice: &Invoice) -> Result<(), DebitError> {
    sqlx::query(
      r#"
            INSERT INTO invoices (
                id, client_id, invoice_number, amount, issue_date, due_date,
                debit_date, payment_mode, status, exported_at, paid_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
    )
    .bind(invoice.id)
    .bind(invoice.client_id)
    .bind(invoice.invoice_number.value())
    .bind(invoice.amount)
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.debit_date)
    .bind(invoice.payment_mode.as_str())
    .bind(invoice.status.as_str())
    .bind(invoice.exported_at)
    .bind(invoice.paid_at)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
  async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Invoice>, DebitError> {
    let rows = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, client_id, invoice_number, amount, issue_date, due_date,
                   debit_date, payment_mode, status, exported_at, paid_at,
                   created_at, updated_at
            FROM invoices
            WHERE id = ANY($1)
            "#,
    )
    .bind(ids)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn find_by_payment_mode_and_status(
    &self,
    payment_mode: PaymentMode,
    status: DebitStatus,
  ) -> Result<Vec<Invoice>, DebitError> {
    let rows = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, client_id, invoice_number, amount, issue_date, due_date,
                   debit_date, payment_mode, status, exported_at, paid_at,
                   created_at, updated_at
            FROM invoices
            WHERE payment_mode = $1 AND status = $2
            ORDER BY due_date ASC, invoice_number ASC
            "#,
    )
    .bind(payment_mode.as_str())
    .bind(status.as_str())
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn transition_statuses(
    &self,
    ids: &[Uuid],
    from: &[DebitStatus],
    to: DebitStatus,
    at: DateTime<Utc>,
  ) -> Result<Vec<Uuid>, DebitError> {
    let from: Vec<&str> = from.iter().map(DebitStatus::as_str).collect();

    let changed = sqlx::query_scalar::<_, Uuid>(
      r#"
            UPDATE invoices
            SET status = $3,
                exported_at = CASE WHEN $3 = 'exported' THEN $4 ELSE exported_at END,
                paid_at = CASE WHEN $3 = 'paid' THEN $4 ELSE paid_at END,
                updated_at = $4
            WHERE id = ANY($1) AND status = ANY($2) AND payment_mode = 'direct_debit'
            RETURNING id
            "#,
    )
    .bind(ids)
    .bind(&from)
    .bind(to.as_str())
    .bind(at)
    .fetch_all(&self.pool)
    .await?;

    Ok(changed)
  }
}
