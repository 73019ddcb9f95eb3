use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::direct_debit::{
  Client, ClientRepository, DebitError, SepaProfile, SequenceType,
};

#[derive(Debug, FromRow)]
struct ClientRow {
  id: Uuid,
  name: String,
  iban: Option<String>,
  bic: Option<String>,
  mandate_reference: Option<String>,
  mandate_signed_on: Option<NaiveDate>,
  sequence_type: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
  type Error = DebitError;

  fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
    Ok(Client {
      id: row.id,
      name: row.name,
      sepa: SepaProfile {
        iban: row.iban,
        bic: row.bic,
        mandate_reference: row.mandate_reference,
        mandate_signed_on: row.mandate_signed_on,
        sequence_type: SequenceType::from_str(&row.sequence_type)?,
      },
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub struct PostgresClientRepository {
  pool: PgPool,
}

impl PostgresClientRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Inserts a client; used by fixtures and data imports.
  pub async fn create(&self, client: &Client) -> Result<(), DebitError> {
    sqlx::query(
      r#"
            INSERT INTO clients (
                id, name, iban, bic, mandate_reference, mandate_signed_on,
                sequence_type, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
    )
    .bind(client.id)
    .bind(&client.name)
    .bind(&client.sepa.iban)
    .bind(&client.sepa.bic)
    .bind(&client.sepa.mandate_reference)
    .bind(client.sepa.mandate_signed_on)
    .bind(client.sepa.sequence_type.as_str())
    .bind(client.created_at)
    .bind(client.updated_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
  async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Client>, DebitError> {
    let rows = sqlx::query_as::<_, ClientRow>(
      r#"
            SELECT id, name, iban, bic, mandate_reference, mandate_signed_on,
                   sequence_type, created_at, updated_at
            FROM clients
            WHERE id = ANY($1)
            "#,
    )
    .bind(ids)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn advance_sequence_type(
    &self,
    ids: &[Uuid],
    from: SequenceType,
    to: SequenceType,
  ) -> Result<u64, DebitError> {
    let result = sqlx::query(
      r#"
            UPDATE clients
            SET sequence_type = $3, updated_at = NOW()
            WHERE id = ANY($1) AND sequence_type = $2
            "#,
    )
    .bind(ids)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(&self.pool)
    .await?;

    Ok(result.rows_affected())
  }
}
