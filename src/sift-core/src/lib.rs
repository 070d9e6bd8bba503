//! Core data model for the sift analysis engine.
//!
//! This crate provides the fundamental types shared by the engine:
//! - `Value` and `DataType` for the runtime type system
//! - `FromValue` for typed cell extraction at the callable boundary
//! - `RowSource` and `MemTable` for the columnar source contract
//! - row-range partitioning for the parallel driver

pub mod source;
pub mod types;

// Re-export commonly used types
pub use source::{partition_rows, ColumnReader, MemTable, RowSource};
pub use types::{DataType, FromValue, Value};
