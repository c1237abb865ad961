//! Shared test infrastructure for the CRUD integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
