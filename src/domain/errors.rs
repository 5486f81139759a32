//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value object validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value is empty after trimming.
    EmptyValue,

    /// The provided phone number cannot be normalized.
    InvalidPhone(String),

    /// A bit pattern carries bits outside the known flags.
    UnknownBits(u32),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue => write!(f, "Value cannot be empty"),
            Self::InvalidPhone(phone) => write!(f, "Invalid phone number: {}", phone),
            Self::UnknownBits(bits) => write!(f, "Unknown flag bits: {:#x}", bits),
        }
    }
}

impl std::error::Error for ValidationError {}
