//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why manual mocks instead of mockall?
//! - Ports take borrowed ids and `&str` arguments, which mockall handles poorly
//! - In-memory repositories keep state, so a service test can assert on it afterwards
//! - We control exactly what the source backends return

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
