//! Columnar source contract and the in-memory reference implementation.

use std::ops::Range;
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};

use common_error::{SiftError, SiftResult};

use crate::types::{DataType, Value};

/// Contract a tabular dataset must satisfy to drive a pass.
///
/// A source exposes a directory of persistent columns with their type kinds
/// and random-access handles to the column data. Row ranges for the parallel
/// driver are produced by [`partition_rows`].
pub trait RowSource: Send + Sync {
    /// Total number of rows.
    fn num_rows(&self) -> u64;

    /// Names of the persistent columns, in declaration order.
    fn column_names(&self) -> Vec<String>;

    /// Type kind of a persistent column.
    fn column_type(&self, name: &str) -> Option<DataType>;

    /// Random-access handle to a persistent column.
    fn column(&self, name: &str) -> Option<ArrayRef>;

    /// Check whether a persistent column exists.
    fn has_column(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }

    /// Open a per-pass reader over a persistent column.
    fn open_column(&self, name: &str) -> SiftResult<ColumnReader> {
        let array = self
            .column(name)
            .ok_or_else(|| SiftError::unknown_column(name))?;
        Ok(ColumnReader::new(name.to_string(), array))
    }
}

/// Random-access view of one persistent column, resolved once per pass per
/// worker slot.
#[derive(Debug, Clone)]
pub struct ColumnReader {
    name: String,
    array: ArrayRef,
}

impl ColumnReader {
    /// Create a reader over `array`, labelled with the column name for
    /// diagnostics.
    pub fn new(name: String, array: ArrayRef) -> Self {
        Self { name, array }
    }

    /// The column name this reader is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the value at `row`.
    pub fn read(&self, row: u64) -> SiftResult<Value> {
        Value::from_array(&self.array, row as usize).ok_or_else(|| {
            SiftError::internal(format!(
                "row {row} out of bounds for column \"{}\"",
                self.name
            ))
        })
    }
}

/// In-memory columnar table backed by arrow arrays.
///
/// The reference [`RowSource`] implementation: all columns share one length,
/// and only arrow types with a [`DataType`] mapping are accepted.
#[derive(Debug, Default, Clone)]
pub struct MemTable {
    columns: Vec<(String, ArrayRef)>,
    rows: u64,
}

impl MemTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, consuming and returning the table builder-style.
    ///
    /// Fails with *duplicate-name* if the name is taken, and rejects arrays
    /// whose length disagrees with the existing columns or whose arrow type
    /// has no sift mapping.
    pub fn with_column(mut self, name: impl Into<String>, array: ArrayRef) -> SiftResult<Self> {
        let name = name.into();
        if self.columns.iter().any(|(n, _)| *n == name) {
            return Err(SiftError::duplicate_name(format!(
                "column \"{name}\" already present in table"
            )));
        }
        if DataType::from_arrow(array.data_type()).is_none() {
            return Err(SiftError::internal(format!(
                "column \"{name}\" has unsupported arrow type {}",
                array.data_type()
            )));
        }
        let len = array.len() as u64;
        if !self.columns.is_empty() && len != self.rows {
            return Err(SiftError::internal(format!(
                "column \"{name}\" has {len} rows, table has {}",
                self.rows
            )));
        }
        self.rows = len;
        self.columns.push((name, array));
        Ok(self)
    }

    /// Add an `Int64` column from plain values.
    pub fn with_i64(self, name: impl Into<String>, values: Vec<i64>) -> SiftResult<Self> {
        self.with_column(name, Arc::new(Int64Array::from(values)) as ArrayRef)
    }

    /// Add a `Float64` column from plain values.
    pub fn with_f64(self, name: impl Into<String>, values: Vec<f64>) -> SiftResult<Self> {
        self.with_column(name, Arc::new(Float64Array::from(values)) as ArrayRef)
    }

    /// Add a `Bool` column from plain values.
    pub fn with_bool(self, name: impl Into<String>, values: Vec<bool>) -> SiftResult<Self> {
        self.with_column(name, Arc::new(BooleanArray::from(values)) as ArrayRef)
    }

    /// Add a `Str` column from plain values.
    pub fn with_str(self, name: impl Into<String>, values: Vec<&str>) -> SiftResult<Self> {
        self.with_column(name, Arc::new(StringArray::from(values)) as ArrayRef)
    }
}

impl RowSource for MemTable {
    fn num_rows(&self) -> u64 {
        self.rows
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    fn column_type(&self, name: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, a)| DataType::from_arrow(a.data_type()))
    }

    fn column(&self, name: &str) -> Option<ArrayRef> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| Arc::clone(a))
    }
}

/// Split `[0, rows)` into at most `parts` contiguous disjoint ranges.
///
/// Ranges cover every row exactly once; empty ranges are dropped, so fewer
/// than `parts` ranges come back when the table is small.
pub fn partition_rows(rows: u64, parts: usize) -> Vec<Range<u64>> {
    if rows == 0 || parts == 0 {
        return Vec::new();
    }
    let parts = parts as u64;
    let chunk = rows.div_ceil(parts);
    let mut ranges = Vec::with_capacity(parts as usize);
    let mut start = 0;
    while start < rows {
        let end = (start + chunk).min(rows);
        ranges.push(start..end);
        start = end;
    }
    ranges
}
