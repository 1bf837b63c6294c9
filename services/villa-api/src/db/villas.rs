//! Postgres-backed villa store.
//!
//! One row per villa in the `villas` table. Ids come from an identity
//! column, so a deleted id is never handed out again.

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgRow},
    Postgres, Row, Transaction,
};
use tracing::debug;
use villa_id::VillaId;

use super::DbError;
use crate::model::{Villa, VillaFields};
use crate::store::{NameRule, StoreError, VillaStore};

const VILLA_COLUMNS: &str = "id, name, details, amenity, image_url, occupancy, rate, sqft";

/// A row of the `villas` table.
#[derive(Debug, Clone)]
struct VillaRow {
    id: i64,
    name: String,
    details: String,
    amenity: String,
    image_url: String,
    occupancy: i32,
    rate: f64,
    sqft: i32,
}

impl<'r> sqlx::FromRow<'r, PgRow> for VillaRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            details: row.try_get("details")?,
            amenity: row.try_get("amenity")?,
            image_url: row.try_get("image_url")?,
            occupancy: row.try_get("occupancy")?,
            rate: row.try_get("rate")?,
            sqft: row.try_get("sqft")?,
        })
    }
}

impl TryFrom<VillaRow> for Villa {
    type Error = StoreError;

    fn try_from(row: VillaRow) -> Result<Self, Self::Error> {
        let id = VillaId::new(row.id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Villa {
            id,
            name: row.name,
            details: row.details,
            amenity: row.amenity,
            image_url: row.image_url,
            occupancy: row.occupancy,
            rate: row.rate,
            sqft: row.sqft,
        })
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(DbError::from_query(e))
}

/// Attempts per SERIALIZABLE transaction before a conflict is reported.
const MAX_SERIALIZABLE_ATTEMPTS: u32 = 5;

fn is_retryable(err: &StoreError) -> bool {
    matches!(err, StoreError::Database(db) if db.is_retryable())
}

/// Durable villa store.
#[derive(Clone)]
pub struct PgVillaStore {
    pool: PgPool,
}

impl PgVillaStore {
    /// Create a new villa store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        Ok(tx)
    }

    async fn try_insert(&self, fields: &VillaFields) -> Result<Villa, StoreError> {
        let mut tx = self.begin_serializable().await?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM villas WHERE lower(name) = lower($1))",
        )
        .bind(&fields.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        if taken {
            return Err(StoreError::DuplicateName(fields.name.clone()));
        }

        let row = sqlx::query_as::<_, VillaRow>(&format!(
            r#"
            INSERT INTO villas (name, details, amenity, image_url, occupancy, rate, sqft)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VILLA_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(&fields.details)
        .bind(&fields.amenity)
        .bind(&fields.image_url)
        .bind(fields.occupancy)
        .bind(fields.rate)
        .bind(fields.sqft)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Villa::try_from(row)
    }

    async fn try_replace_unique(
        &self,
        id: VillaId,
        fields: &VillaFields,
    ) -> Result<Villa, StoreError> {
        let mut tx = self.begin_serializable().await?;

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM villas WHERE lower(name) = lower($1) AND id <> $2)",
        )
        .bind(&fields.name)
        .bind(id.value())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        if taken {
            // A missing target still reports NotFound ahead of the name.
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM villas WHERE id = $1)")
                    .bind(id.value())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(query_err)?;
            return Err(if exists {
                StoreError::DuplicateName(fields.name.clone())
            } else {
                StoreError::NotFound(id)
            });
        }

        let row = update_row(&mut *tx, id, fields).await?;
        tx.commit().await.map_err(query_err)?;
        Villa::try_from(row)
    }
}

async fn update_row<'e, E>(
    executor: E,
    id: VillaId,
    fields: &VillaFields,
) -> Result<VillaRow, StoreError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, VillaRow>(&format!(
        r#"
        UPDATE villas
        SET name = $2,
            details = $3,
            amenity = $4,
            image_url = $5,
            occupancy = $6,
            rate = $7,
            sqft = $8
        WHERE id = $1
        RETURNING {VILLA_COLUMNS}
        "#
    ))
    .bind(id.value())
    .bind(&fields.name)
    .bind(&fields.details)
    .bind(&fields.amenity)
    .bind(&fields.image_url)
    .bind(fields.occupancy)
    .bind(fields.rate)
    .bind(fields.sqft)
    .fetch_optional(executor)
    .await
    .map_err(query_err)?
    .ok_or(StoreError::NotFound(id))
}

#[async_trait]
impl VillaStore for PgVillaStore {
    async fn list(&self) -> Result<Vec<Villa>, StoreError> {
        let rows = sqlx::query_as::<_, VillaRow>(&format!(
            "SELECT {VILLA_COLUMNS} FROM villas ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.into_iter().map(Villa::try_from).collect()
    }

    async fn get(&self, id: VillaId) -> Result<Villa, StoreError> {
        let row = sqlx::query_as::<_, VillaRow>(&format!(
            "SELECT {VILLA_COLUMNS} FROM villas WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?
        .ok_or(StoreError::NotFound(id))?;

        Villa::try_from(row)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Villa>, StoreError> {
        let row = sqlx::query_as::<_, VillaRow>(&format!(
            "SELECT {VILLA_COLUMNS} FROM villas WHERE lower(name) = lower($1) ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_err)?;

        row.map(Villa::try_from).transpose()
    }

    async fn insert(&self, fields: VillaFields) -> Result<Villa, StoreError> {
        // A losing concurrent create is aborted with a serialization failure;
        // on retry the name check sees the winner's row.
        let mut attempt = 1;
        loop {
            match self.try_insert(&fields).await {
                Err(e) if is_retryable(&e) && attempt < MAX_SERIALIZABLE_ATTEMPTS => {
                    debug!(attempt, error = %e, "Retrying villa insert");
                    attempt += 1;
                }
                Ok(villa) => {
                    debug!(villa_id = %villa.id, "Inserted villa row");
                    return Ok(villa);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn replace(
        &self,
        id: VillaId,
        fields: VillaFields,
        names: NameRule,
    ) -> Result<Villa, StoreError> {
        if names == NameRule::Shared {
            let row = update_row(&self.pool, id, &fields).await?;
            return Villa::try_from(row);
        }

        let mut attempt = 1;
        loop {
            match self.try_replace_unique(id, &fields).await {
                Err(e) if is_retryable(&e) && attempt < MAX_SERIALIZABLE_ATTEMPTS => {
                    debug!(attempt, villa_id = %id, error = %e, "Retrying villa replace");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn remove(&self, id: VillaId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM villas WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64) -> VillaRow {
        VillaRow {
            id,
            name: "Pool View".to_string(),
            details: String::new(),
            amenity: String::new(),
            image_url: String::new(),
            occupancy: 4,
            rate: 0.0,
            sqft: 100,
        }
    }

    #[test]
    fn test_row_converts_to_villa() {
        let villa = Villa::try_from(row(5)).unwrap();
        assert_eq!(villa.id.value(), 5);
        assert_eq!(villa.sqft, 100);
    }

    #[test]
    fn test_row_with_non_positive_id_is_corrupt() {
        let err = Villa::try_from(row(0)).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
