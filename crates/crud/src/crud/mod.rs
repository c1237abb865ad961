//! CRUD orchestration.
//!
//! [`Crud`] resolves each call's argument shape ([`Subject`]) once, then
//! routes it to a filter-based backend operation, the batch engine, or a
//! single backend call. [`AsyncCrud`] runs the same operations from async
//! code.

mod config;
mod engine;
mod subject;
mod task;

pub use config::CrudConfig;
pub use engine::Crud;
pub use subject::Subject;
pub use task::AsyncCrud;
