//! Argon2id password hashes, stored as PHC strings.
//!
//! Hashing is CPU-heavy; async callers should run these functions on a blocking
//! thread.

use argon2::Argon2;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use lazy_static::lazy_static;
use rand::RngCore;

use crate::jwt::AuthError;

const SALT_LEN: usize = 16;

lazy_static! {
    /// Verified when no account matches, so unknown emails cost as much as wrong passwords.
    static ref DUMMY_HASH: Option<String> = hash_password("invoicer-timing-equalizer").ok();
}

fn hashing_error(err: password_hash::Error) -> AuthError {
    AuthError::Hashing(err.to_string())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(hashing_error)?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(hashing_error)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored hash. Malformed stored values are an error,
/// a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(hashing_error)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(hashing_error(err)),
    }
}

/// Check a login attempt. `stored` is `None` when no account matched the email;
/// a dummy hash is still verified in that case.
pub fn authenticate(password: &str, stored: Option<&str>) -> Result<(), AuthError> {
    let matched = match stored {
        Some(hash) => verify_password(password, hash)?,
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            false
        }
    };

    if matched { Ok(()) } else { Err(AuthError::InvalidCredentials) }
}
