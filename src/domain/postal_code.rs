//! Postal code (CEP) validation.

use std::fmt;

use thiserror::Error;

/// Number of digits in a CEP.
pub const POSTAL_CODE_LEN: usize = 8;

/// Returns true iff `s` is exactly eight ASCII decimal digits.
pub fn is_valid_postal_code(s: &str) -> bool {
    s.len() == POSTAL_CODE_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

/// Rejected postal code candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid postal code: {0:?}")]
pub struct InvalidPostalCode(pub String);

/// A validated eight-digit postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Validate `s` and wrap it.
    pub fn parse(s: &str) -> Result<Self, InvalidPostalCode> {
        if is_valid_postal_code(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidPostalCode(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PostalCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
