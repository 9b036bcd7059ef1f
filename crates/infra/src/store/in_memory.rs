use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use invoicer_auth::{User, normalize_email};
use invoicer_core::{InvoiceId, UserId};
use invoicer_invoicing::Invoice;

use super::{InvoiceStore, StoreError, UserStore, sort_newest_first};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// In-memory invoice store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    inner: RwLock<HashMap<InvoiceId, Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn insert(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn find_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Invoice>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        let mut invoices: Vec<Invoice> = map.values().filter(|inv| inv.owner == owner).cloned().collect();
        sort_newest_first(&mut invoices);
        Ok(invoices)
    }

    async fn update(&self, invoice: Invoice) -> Result<Invoice, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        match map.get_mut(&invoice.id) {
            Some(slot) => {
                *slot = invoice.clone();
                Ok(invoice)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        Ok(map.remove(&id).is_some())
    }
}

/// In-memory user store for tests/dev. Emails are indexed normalized.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let email = normalize_email(&user.email);
        if map.values().any(|u| normalize_email(&u.email) == email) {
            return Err(StoreError::DuplicateEmail);
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.values().find(|u| normalize_email(&u.email) == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        match map.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(StoreError::NotFound),
        }
    }
}
