//! Pipeline graph nodes and their shared evaluation plumbing.

mod column;
mod filter;

pub(crate) use column::DefinedColumn;
pub(crate) use filter::FilterNode;

use std::collections::HashMap;
use std::sync::Arc;

use common_error::SiftResult;
use sift_core::{ColumnReader, RowSource, Value};

/// The root's view handed to nodes for the duration of one pass.
///
/// Nodes resolve their input names through this context when per-slot
/// readers are built; it never outlives the pass, so nodes hold no owning
/// reference back to the root.
pub(crate) struct PassContext {
    pub(crate) source: Arc<dyn RowSource>,
    pub(crate) branches: HashMap<String, Arc<DefinedColumn>>,
}

/// Resolved input reader for one worker slot: either a persistent source
/// column or a derived column booked upstream.
pub(crate) enum InputReader {
    Source(ColumnReader),
    Derived(Arc<DefinedColumn>),
}

impl InputReader {
    /// Read the input value for `row` in `slot`.
    ///
    /// Derived reads go through the producing node's per-slot cache, so a
    /// value consumed by several descendants is computed once per (row, slot).
    pub(crate) fn read(&self, slot: usize, row: u64) -> SiftResult<Value> {
        match self {
            Self::Source(reader) => reader.read(row),
            Self::Derived(column) => column.value(slot, row),
        }
    }
}

/// Resolve a node's input names against the pass context.
///
/// Derived columns shadow nothing: booking rejects name collisions, so each
/// name maps to exactly one of the two kinds.
pub(crate) fn resolve_inputs(
    ctx: &PassContext,
    columns: &[String],
) -> SiftResult<Vec<InputReader>> {
    columns
        .iter()
        .map(|name| {
            if let Some(branch) = ctx.branches.get(name) {
                Ok(InputReader::Derived(Arc::clone(branch)))
            } else {
                ctx.source.open_column(name).map(InputReader::Source)
            }
        })
        .collect()
}

/// Read all of a node's inputs for one row.
pub(crate) fn read_inputs(
    readers: &[InputReader],
    slot: usize,
    row: u64,
) -> SiftResult<Vec<Value>> {
    readers.iter().map(|r| r.read(slot, row)).collect()
}

/// Link from a node to the filter chain above it.
#[derive(Clone)]
pub(crate) enum ChainLink {
    /// Directly below the root: every row is accepted.
    Source,
    /// Below a filter node.
    Filter(Arc<FilterNode>),
}

impl ChainLink {
    /// Evaluate the ancestor chain for `row` in `slot`.
    pub(crate) fn check(&self, slot: usize, row: u64) -> SiftResult<bool> {
        match self {
            Self::Source => Ok(true),
            Self::Filter(filter) => filter.check(slot, row),
        }
    }
}
