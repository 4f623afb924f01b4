//! Common test utilities for API integration tests
//!
//! Shared gateway fixtures, a minimal HTTP client and polling helpers.

#![allow(unused_imports)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
