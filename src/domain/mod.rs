//! Domain value objects and types.
//!
//! This module contains the small building blocks the match engine composes
//! rules from: the matching/scope bit flags, phone normalization, and the
//! title-cased address tuple. Degraded values are rejected here so the engine
//! can treat "no value" and "bad value" the same way.

pub mod address;
pub mod errors;
pub mod flags;
pub mod phone;

pub use address::{ucwords, AddressTuple};
pub use errors::ValidationError;
pub use flags::{bitwise_in, Matching, Scope};
pub use phone::{E164PhoneNormalizer, PhoneNormalizer};
