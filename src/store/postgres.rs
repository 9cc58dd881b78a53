//! PostgreSQL-backed credential store.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::store::{password_digest, CredentialStore, StoreError};

/// Credential schema (embedded), applied at connect time.
const SCHEMA: &str = include_str!("schema.sql");

/// Credential store backed by a PostgreSQL pool.
pub struct PgCredentialStore {
    pool: Pool<Postgres>,
}

impl PgCredentialStore {
    /// Connect to the database and ensure the credential schema exists.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.apply_schema().await?;

        tracing::info!(max_connections, "Credential store connected");
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| {
            s.lines()
                .any(|line| !line.trim().is_empty() && !line.trim().starts_with("--"))
        }) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Verify the store is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert or replace a credential. Used by provisioning, not by the
    /// serving path.
    pub async fn upsert_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (user_name, password_sha256) VALUES ($1, $2) \
             ON CONFLICT (user_name) DO UPDATE SET password_sha256 = EXCLUDED.password_sha256",
        )
        .bind(username)
        .bind(password_digest(password))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn check(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1 AND password_sha256 = $2)",
        )
        .bind(username)
        .bind(password_digest(password))
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }
}
