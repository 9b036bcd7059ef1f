//! User account model (registration and profile).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicer_core::{DomainError, DomainResult, UserId};

const MIN_PASSWORD_LEN: usize = 6;

/// A stored user account. Never serialized to clients directly; see [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Client-facing view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub business_name: String,
    pub address: String,
    pub phone: String,
}

/// Emails compare case-insensitively; store them lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl NewUser {
    /// Check required fields, email shape and password length.
    pub fn validate(&self) -> DomainResult<()> {
        let email = normalize_email(&self.email);
        if self.name.trim().is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(DomainError::validation("name, email and password are required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("email is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

impl User {
    /// Build an account from validated input. `password_hash` comes from
    /// [`crate::hash_password`], which callers run off the async runtime.
    pub fn register(input: NewUser, password_hash: String, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id: UserId::new(),
            name: input.name.trim().to_string(),
            email: normalize_email(&input.email),
            password_hash,
            business_name: String::new(),
            address: String::new(),
            phone: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            self.name = name.trim().to_string();
        }
        if let Some(business_name) = update.business_name {
            self.business_name = business_name;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        self.updated_at = now;
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            business_name: self.business_name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
        }
    }
}
