//! Postgres-backed document stores.
//!
//! Each record is one JSONB `document` column next to the handful of columns the
//! queries filter or sort on. The document is the source of truth; the side
//! columns are rewritten on every save.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|-----------------------|------------|
//! | Database (unique violation on `users.email`) | `23505` | `DuplicateEmail` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / other | N/A | `Backend` |

use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use invoicer_auth::{User, normalize_email};
use invoicer_core::{InvoiceId, UserId};
use invoicer_invoicing::Invoice;

use super::{InvoiceStore, StoreError, UserStore};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          UUID PRIMARY KEY,
        email       TEXT NOT NULL UNIQUE,
        document    JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id          UUID PRIMARY KEY,
        owner_id    UUID NOT NULL,
        document    JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS invoices_owner_created_idx ON invoices (owner_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS users_email_idx ON users (email)",
];

/// Create tables and indexes if they are missing. Safe to run on every start.
pub async fn bootstrap_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("bootstrap_schema", e))?;
    }
    tracing::info!("database schema ready");
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                StoreError::DuplicateEmail
            } else {
                StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}

fn decode<T: serde::de::DeserializeOwned>(operation: &str, row: &sqlx::postgres::PgRow) -> Result<T, StoreError> {
    let Json(value) = row
        .try_get::<Json<T>, _>("document")
        .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(value)
}

#[derive(Clone)]
pub struct PostgresInvoiceStore {
    pool: PgPool,
}

impl PostgresInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn insert(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, owner_id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*invoice.id.as_uuid())
        .bind(*invoice.owner.as_uuid())
        .bind(Json(&invoice))
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_invoice", e))?;
        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query("SELECT document FROM invoices WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_invoice", e))?;
        row.as_ref().map(|r| decode("find_invoice", r)).transpose()
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Invoice>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM invoices
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(*owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_invoices", e))?;
        rows.iter().map(|r| decode("list_invoices", r)).collect()
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn update(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        let result = sqlx::query("UPDATE invoices SET document = $2, updated_at = $3 WHERE id = $1")
            .bind(*invoice.id.as_uuid())
            .bind(Json(&invoice))
            .bind(invoice.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_invoice", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_invoice", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(normalize_email(&user.email))
        .bind(Json(&user))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(user)
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT document FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(|r| decode("find_user_by_email", r)).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT document FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.as_ref().map(|r| decode("find_user", r)).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: User) -> Result<User, StoreError> {
        let result = sqlx::query("UPDATE users SET document = $2, updated_at = $3 WHERE id = $1")
            .bind(*user.id.as_uuid())
            .bind(Json(&user))
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(user)
    }
}
