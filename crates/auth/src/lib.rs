//! `invoicer-auth`: user accounts, password hashing and bearer tokens.
//!
//! Independent of HTTP and storage.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod user;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{AuthError, Hs256Jwt, JwtValidator};
pub use password::{authenticate, hash_password, verify_password};
pub use user::{NewUser, ProfileUpdate, User, UserProfile, normalize_email};
