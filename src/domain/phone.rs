//! Phone normalization.
//!
//! Stored `phone`/`mobile` values are E.164 strings, so raw contact input must
//! be normalized the same way before it can be compared. A number that cannot
//! be normalized simply deactivates its matching dimension.

use super::errors::ValidationError;
use std::fmt;

/// A phone number in E.164 form (`+` followed by 8 to 15 digits).
///
/// # Example
///
/// ```
/// use contact_cache::domain::{E164PhoneNormalizer, PhoneNormalizer};
///
/// let normalizer = E164PhoneNormalizer::default();
/// let phone = normalizer.normalize("(555) 123-4567").unwrap();
/// assert_eq!(phone.as_str(), "+15551234567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Get the phone number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability: normalize a raw phone string or reject it.
///
/// Implementations must be safe to share across concurrent checks; the
/// engine constructs one eagerly and holds it for its whole lifetime.
pub trait PhoneNormalizer: Send + Sync {
    /// Normalize `raw`, or explain why it cannot be.
    fn normalize(&self, raw: &str) -> Result<PhoneNumber, ValidationError>;
}

/// Normalizer producing E.164 numbers, assuming a default country calling code
/// for national-format input.
///
/// This is a formatting normalizer, not a numbering-plan validator:
///
/// - For calling code 1 a national number must have exactly 10 digits
///   (or 11 with the leading 1).
/// - For any other calling code one leading trunk `0` is dropped and the
///   result is accepted whenever it has 8 to 15 digits. Per-country lengths,
///   area codes and number types are not checked.
/// - Explicit international input (`+..` or `00..`) is only length-checked.
///
/// Two spellings of the same number always converge, which is all matching
/// needs; a stricter implementation can be plugged in through
/// [`PhoneNormalizer`].
#[derive(Debug, Clone)]
pub struct E164PhoneNormalizer {
    country_code: u16,
}

impl E164PhoneNormalizer {
    /// Create a normalizer for national numbers of the given calling code.
    pub fn new(country_code: u16) -> Self {
        Self { country_code }
    }

    /// Get the default country calling code.
    pub fn country_code(&self) -> u16 {
        self.country_code
    }

    /// Check that only digits and common formatting characters are present.
    fn has_valid_characters(phone: &str) -> bool {
        phone.chars().any(|c| c.is_ascii_digit())
            && phone.chars().all(|c| {
                c.is_ascii_digit()
                    || c == ' '
                    || c == '-'
                    || c == '('
                    || c == ')'
                    || c == '+'
                    || c == '.'
            })
    }
}

impl Default for E164PhoneNormalizer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PhoneNormalizer for E164PhoneNormalizer {
    fn normalize(&self, raw: &str) -> Result<PhoneNumber, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyValue);
        }
        if !Self::has_valid_characters(trimmed) {
            return Err(ValidationError::InvalidPhone(trimmed.to_string()));
        }

        // '+' is only meaningful as the leading character.
        if trimmed.rfind('+').is_some_and(|pos| pos != 0) {
            return Err(ValidationError::InvalidPhone(trimmed.to_string()));
        }

        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        let country = self.country_code.to_string();

        let international = if trimmed.starts_with('+') {
            digits
        } else if let Some(rest) = digits.strip_prefix("00") {
            rest.to_string()
        } else if self.country_code == 1 && digits.len() == 11 && digits.starts_with('1') {
            digits
        } else if self.country_code == 1 {
            if digits.len() != 10 {
                return Err(ValidationError::InvalidPhone(trimmed.to_string()));
            }
            format!("{}{}", country, digits)
        } else {
            // National trunk prefix.
            let national = digits.strip_prefix('0').unwrap_or(&digits);
            format!("{}{}", country, national)
        };

        if !(8..=15).contains(&international.len()) || international.starts_with('0') {
            return Err(ValidationError::InvalidPhone(trimmed.to_string()));
        }

        Ok(PhoneNumber(format!("+{}", international)))
    }
}
