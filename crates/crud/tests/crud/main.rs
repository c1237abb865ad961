//! CRUD orchestration tests.
//!
//! Save, read, delete, batch and query-by-example behavior of `Crud` over the
//! in-memory backend and a failure-injecting wrapper.

#[path = "../common/mod.rs"]
mod common;

mod batch_tests;
mod connection_tests;
mod delete_tests;
mod filter_tests;
mod save_tests;
