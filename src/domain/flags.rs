//! Matching and scope bit flags.
//!
//! Rules and recorded exclusivity locks describe themselves as integer bit
//! patterns. `bitwise_in` expands a single flag into every composite pattern
//! (up to a maximum) that contains it, so a lookup matches any earlier lock
//! that *included* the dimension rather than only an identical pattern.

use super::errors::ValidationError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Contact attributes a rule can match on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Matching: u32 {
        /// The exact same contact id
        const EXPLICIT = 0b0_0001;
        /// Trimmed email address
        const EMAIL = 0b0_0010;
        /// Normalized phone number
        const PHONE = 0b0_0100;
        /// Normalized mobile number
        const MOBILE = 0b0_1000;
        /// Full postal address (needs address1 plus city or zipcode)
        const ADDRESS = 0b1_0000;
    }
}

bitflags! {
    /// Sub-populations a rule applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scope: u32 {
        /// Every record of the destination client
        const GLOBAL = 0b001;
        /// Records sharing the client's category
        const CATEGORY = 0b010;
        /// Records sharing the traffic source
        const UTM_SOURCE = 0b100;
    }
}

impl Matching {
    /// Dimensions checked for exclusivity unless the caller opts into more.
    ///
    /// ADDRESS is left out: comparing full address tuples across every
    /// exclusivity lock is too expensive to run on every send.
    pub const EXCLUSIVE_DEFAULT: Matching = Matching::EXPLICIT
        .union(Matching::EMAIL)
        .union(Matching::PHONE)
        .union(Matching::MOBILE);

    /// Parse a raw integer, rejecting unknown bits.
    pub fn try_from_bits(bits: u32) -> Result<Self, ValidationError> {
        Self::from_bits(bits).ok_or(ValidationError::UnknownBits(bits))
    }
}

impl Scope {
    /// Scopes checked for exclusivity by default.
    pub const EXCLUSIVE_DEFAULT: Scope = Scope::GLOBAL.union(Scope::CATEGORY);

    /// Parse a raw integer, rejecting unknown bits.
    pub fn try_from_bits(bits: u32) -> Result<Self, ValidationError> {
        Self::from_bits(bits).ok_or(ValidationError::UnknownBits(bits))
    }
}

impl Default for Matching {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::empty()
    }
}

// Rules arrive as plain integers, so serialize the raw bits.
impl Serialize for Matching {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Matching {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::try_from_bits(bits).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Scope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::try_from_bits(bits).map_err(serde::de::Error::custom)
    }
}

/// All integers in `1..=max` whose bitwise AND with `flag` is non-zero, ascending.
///
/// Used to build `exclusive_pattern IN (...)` / `exclusive_scope IN (...)`
/// lists: every stored pattern that contains `flag` and is no wider than `max`.
pub fn bitwise_in(max: u32, flag: u32) -> Vec<i64> {
    (1..=max)
        .filter(|candidate| candidate & flag != 0)
        .map(i64::from)
        .collect()
}
