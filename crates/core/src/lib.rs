//! `invoicer-core`: shared identifiers and the domain error model.
//!
//! Pure data with no storage or HTTP dependencies.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{InvoiceId, UserId};
