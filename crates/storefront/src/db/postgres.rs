//! `PostgreSQL` document store.
//!
//! Each collection is a table in the configured schema:
//!
//! ```sql
//! CREATE TABLE <schema>.<collection> (
//!     seq         BIGSERIAL,
//!     id          TEXT PRIMARY KEY,
//!     doc         JSONB NOT NULL,
//!     inserted_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```
//!
//! Filters are JSONB containment (`doc @> $1`), which for a flat object is
//! exactly top-level equality. Updates are a JSONB merge (`doc || $1`).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::{Collection, DocumentStore, Filter, RepositoryError, Update, document_id};

/// Document store over a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    /// Create a `PostgreSQL` connection pool with sensible defaults.
    ///
    /// `schema` must already be a validated identifier; it is interpolated
    /// into SQL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString, schema: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;

        Ok(Self::from_pool(pool, schema))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool, schema: &str) -> Self {
        Self {
            pool,
            schema: schema.to_owned(),
        }
    }

    /// Create the schema, collection tables and indexes if missing.
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn ensure_collections(&self) -> Result<(), RepositoryError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;

        for collection in Collection::ALL {
            let table = self.table(collection);
            let name = collection.name();

            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    seq BIGSERIAL,
                    id TEXT PRIMARY KEY,
                    doc JSONB NOT NULL,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )"
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name}_doc_idx ON {table} USING GIN (doc jsonb_path_ops)"
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name}_seq_idx ON {table} (seq)"
            ))
            .execute(&self.pool)
            .await?;

            tracing::info!(collection = %collection, "Collection ready");
        }

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS payment_transactions_session_idx ON {} ((doc->>'session_id'))",
            self.table(Collection::PaymentTransactions)
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn table(&self, collection: Collection) -> String {
        format!("{}.{}", self.schema, collection.name())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Value>, RepositoryError> {
        let sql = format!(
            "SELECT doc FROM {} WHERE doc @> $1 ORDER BY seq LIMIT $2",
            self.table(collection)
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let docs = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(filter.as_map()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(docs.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, RepositoryError> {
        let sql = format!(
            "SELECT doc FROM {} WHERE doc @> $1 ORDER BY seq LIMIT 1",
            self.table(collection)
        );

        let doc = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(filter.as_map()))
            .fetch_optional(&self.pool)
            .await?;

        Ok(doc.map(|Json(doc)| doc))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Value,
    ) -> Result<(), RepositoryError> {
        let id = document_id(&document)?.to_owned();
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            self.table(collection)
        );

        sqlx::query(&sql)
            .bind(&id)
            .bind(Json(&document))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "{collection} already contains id {id}"
                    ));
                }
                RepositoryError::Database(e)
            })?;

        Ok(())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, RepositoryError> {
        let table = self.table(collection);
        let sql = format!(
            "UPDATE {table} SET doc = doc || $2
             WHERE id = (SELECT id FROM {table} WHERE doc @> $1 ORDER BY seq LIMIT 1)"
        );

        let result = sqlx::query(&sql)
            .bind(Json(filter.as_map()))
            .bind(Json(update.as_map()))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE doc @> $1",
            self.table(collection)
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(Json(filter.as_map()))
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
