//! Test doubles and fixtures shared by the integration tests.

#![allow(dead_code)]

pub mod fixtures;
mod mock_cache_store;

pub use mock_cache_store::MockCacheStore;
