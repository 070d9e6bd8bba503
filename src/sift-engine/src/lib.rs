//! Lazy pipeline engine over row-oriented tabular sources.
//!
//! A [`DataFrame`] wraps a [`RowSource`] and books a pipeline of
//! transformations (filters, derived columns) and actions (count, take,
//! min/max/mean, reduce, histogram fill, per-row callbacks). Nothing runs at
//! booking time: the first observation of any [`ResultHandle`] drives exactly
//! one pass over the dataset, shared across every pipeline rooted at the same
//! frame, and parallelised over a worker pool when implicit parallelism is
//! enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_engine::{DataFrame, MemTable};
//!
//! let table = MemTable::new().with_i64("met", vec![1, 5, 9])?;
//! let frame = DataFrame::new(table);
//! let passing = frame.filter(|met: i64| met > 4, &["met"])?.count()?;
//! assert_eq!(passing.value()?, 2); // pass runs here, once
//! ```
//!
//! # Architecture
//!
//! ```text
//! DataFrame (chain state) ──book──▶ FrameCore (root, owns nodes)
//!                                       │ first observation
//!                                       ▼
//!                                  executor: 1 pass, N worker slots
//!                                       │ finalise + publish
//!                                       ▼
//!                                  ResultHandle::value()
//! ```
//!
//! Per row and worker slot, each filter and derived column is evaluated at
//! most once; filter chains short-circuit; named filters tally accept/reject
//! counts for the cutflow [`CutflowReport`].

mod actions;
mod callable;
mod executor;
mod frame;
mod nodes;
mod report;
mod result;

pub mod hist;

pub use callable::{IntoColumnValue, IntoFilterResult, IntoUnitResult, RowFn, SlotRowFn};
pub use frame::DataFrame;
pub use hist::{FillSink, Hist1D};
pub use report::{CutflowEntry, CutflowReport};
pub use result::ResultHandle;

// Re-export the pieces callers need alongside the engine
pub use common_error::{SiftError, SiftResult};
pub use common_runtime::{
    disable_implicit_parallelism, enable_implicit_parallelism, implicit_worker_count,
    is_implicit_parallelism_enabled,
};
pub use sift_core::{DataType, FromValue, MemTable, RowSource, Value};
