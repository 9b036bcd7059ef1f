use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Business-rule failures shared by the user and invoice models.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Names the missing record kind, e.g. `"Invoice"`. Records owned by another
    /// user are reported this way too.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness clash, such as an email that is already registered.
    #[error("{0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(kind: &'static str) -> Self {
        Self::NotFound(kind)
    }
}
