//! Document stores for users and invoices.
//!
//! Stores are keyed by id only. Ownership checks belong to the caller; the one
//! owner-aware query is [`InvoiceStore::list_for_owner`].

pub mod in_memory;
pub mod postgres;

use thiserror::Error;

use invoicer_auth::User;
use invoicer_core::{InvoiceId, UserId};
use invoicer_invoicing::Invoice;

pub use in_memory::{InMemoryInvoiceStore, InMemoryUserStore};
pub use postgres::{PostgresInvoiceStore, PostgresUserStore, bootstrap_schema};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: Invoice) -> Result<Invoice, StoreError>;
    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;
    /// Newest first.
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Invoice>, StoreError>;
    /// Replace an existing invoice; [`StoreError::NotFound`] if it is gone.
    async fn update(&self, invoice: Invoice) -> Result<Invoice, StoreError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// [`StoreError::DuplicateEmail`] when the (normalized) email is taken.
    async fn insert(&self, user: User) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn update(&self, user: User) -> Result<User, StoreError>;
}

/// Newest first; ids are time-ordered so they break timestamp ties.
pub(crate) fn sort_newest_first(invoices: &mut [Invoice]) {
    invoices.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
    });
}
