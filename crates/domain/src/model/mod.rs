//! Data structures and helpers shared across the API and resolver crates.

use std::fmt;

use hex::encode as hex_encode;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Number of digits in a canonical zip code.
pub const LOOKUP_KEY_LEN: usize = 8;

/// Errors emitted when a user-supplied zip code fails normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    #[error("zip code must contain exactly {LOOKUP_KEY_LEN} digits, found {0}")]
    WrongDigitCount(usize),
}

/// Removes every character that is not an ASCII digit.
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Canonical 8-digit zip code. Values are immutable; degrading a key yields a
/// new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Strips separators and accepts the input only if exactly
    /// [`LOOKUP_KEY_LEN`] digits remain.
    pub fn parse(raw: &str) -> Result<Self, KeyFormatError> {
        let digits = strip_non_digits(raw);
        if digits.len() != LOOKUP_KEY_LEN {
            return Err(KeyFormatError::WrongDigitCount(digits.len()));
        }
        Ok(Self(digits))
    }

    pub fn zero() -> Self {
        Self("0".repeat(LOOKUP_KEY_LEN))
    }

    /// Zeroes the right-most non-zero digit. The all-zero key maps to itself.
    pub fn degrade(&self) -> Self {
        let mut digits = self.0.clone().into_bytes();
        if let Some(slot) = digits.iter_mut().rev().find(|d| **d != b'0') {
            *slot = b'0';
        }
        // Only ASCII digits are ever stored, so the bytes stay valid UTF-8.
        Self(digits.into_iter().map(char::from).collect())
    }

    pub fn is_all_zero(&self) -> bool {
        self.0.bytes().all(|d| d == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-independent address record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedAddress {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

impl UnifiedAddress {
    pub fn new(
        street: impl Into<String>,
        neighborhood: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            neighborhood: neighborhood.into(),
            city: city.into(),
            state: state.into(),
        }
    }

    /// True when every field is blank, which providers use to signal "no data"
    /// inside an otherwise well-formed payload.
    pub fn is_empty(&self) -> bool {
        [&self.street, &self.neighborhood, &self.city, &self.state]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Deterministically derives a SHA3-256 fingerprint for a caller credential so
/// raw tokens never end up inside cache keys or logs.
pub fn derive_caller_fingerprint(token: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    hex_encode(digest)
}

/// Opaque cache key scoped to one caller and one resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(caller_token: &str, path: &str) -> Self {
        Self(format!("{}:{}", derive_caller_fingerprint(caller_token), path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
