//! CLI command implementations.
//!
//! - [`invoke`] - Run one catalog operation
//! - [`operations`] - List the catalog

pub mod invoke;
pub mod operations;

pub use invoke::InvokeCommand;
pub use operations::OperationsCommand;
