//! CSRF protection with the double-submit cookie pattern.
//!
//! The same random token lives in the `csrf_token` cookie and in the `X-CSRF-Token` header.
//! A cross-origin attacker can make the browser send the cookie but can't read it to set the header.

use derive_more::Deref;
use rand::{rng, RngCore};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";
/// Shortest token either half of the double-submit may carry.
pub const CSRF_MIN_LEN: usize = 32;

/// A random 64 character-long lowercase hex encoded CSRF token.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generates an array of 32 random bytes and encodes it to hex.
    pub fn generate() -> Self {
        let mut rand_bytes = [0u8; 32];
        rng().fill_bytes(&mut rand_bytes);

        Self(hex::encode(rand_bytes))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for CsrfToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks both halves of a double-submit. The error variants are for server logs only,
/// callers get the same generic rejection whichever half failed.
pub fn verify_double_submit(cookie: Option<&str>, header: Option<&str>) -> Result<(), CsrfError> {
    let cookie = cookie
        .filter(|v| !v.is_empty())
        .ok_or(CsrfError::MissingCookie)?;
    let header = header
        .filter(|v| !v.is_empty())
        .ok_or(CsrfError::MissingHeader)?;

    if cookie.len() < CSRF_MIN_LEN || header.len() < CSRF_MIN_LEN {
        return Err(CsrfError::TooShort);
    }
    if cookie != header {
        return Err(CsrfError::Mismatch);
    }

    Ok(())
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CsrfError {
    #[error("csrf cookie missing or empty")]
    MissingCookie,
    #[error("csrf header missing or empty")]
    MissingHeader,
    #[error("csrf token shorter than {CSRF_MIN_LEN} characters")]
    TooShort,
    #[error("csrf cookie and header don't match")]
    Mismatch,
}
