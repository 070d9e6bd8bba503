//! Derived-column node.

use parking_lot::{Mutex, RwLock};
use sift_core::Value;

use common_error::{SiftError, SiftResult};

use crate::callable::{as_user_failure, ColumnCallable};
use crate::nodes::{read_inputs, resolve_inputs, InputReader, PassContext};

/// Per-slot evaluation state of a derived column.
#[derive(Default)]
struct ColumnSlot {
    /// Row the cache holds a value for; `None` before the first evaluation.
    last_row: Option<u64>,
    value: Value,
    readers: Vec<InputReader>,
}

/// A column computed per row from named inputs, cached per (row, slot).
///
/// The cache guarantees exactly one evaluation per (row, slot) regardless of
/// how many descendants consume the value.
pub(crate) struct DefinedColumn {
    name: String,
    columns: Vec<String>,
    callable: ColumnCallable,
    slots: RwLock<Vec<Mutex<ColumnSlot>>>,
}

impl DefinedColumn {
    pub(crate) fn new(name: String, callable: ColumnCallable, columns: Vec<String>) -> Self {
        Self {
            name,
            columns,
            callable,
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Size per-slot state for `n` worker slots, clearing previous caches.
    pub(crate) fn create_slots(&self, n: usize) {
        let mut slots = self.slots.write();
        slots.clear();
        slots.resize_with(n, || Mutex::new(ColumnSlot::default()));
    }

    /// Resolve input readers for `slot`.
    pub(crate) fn build_readers(&self, ctx: &PassContext, slot: usize) -> SiftResult<()> {
        let readers = resolve_inputs(ctx, &self.columns)?;
        self.slots.read()[slot].lock().readers = readers;
        Ok(())
    }

    /// Value of this column for `row` in `slot`, evaluating at most once.
    pub(crate) fn value(&self, slot: usize, row: u64) -> SiftResult<Value> {
        let slots = self.slots.read();
        let mut state = slots[slot].lock();
        if state.last_row == Some(row) {
            return Ok(state.value.clone());
        }
        let values = read_inputs(&state.readers, slot, row)?;
        let value = self
            .callable
            .call(&values, &self.columns)
            .map_err(|err| match as_user_failure(err) {
                SiftError::UserCallable(msg) => {
                    SiftError::user_callable(format!("derived column \"{}\": {msg}", self.name))
                }
                other => other,
            })?;
        state.last_row = Some(row);
        state.value = value.clone();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use sift_core::{MemTable, RowSource};

    use super::*;

    fn ctx() -> PassContext {
        let table = MemTable::new().with_i64("a", vec![10, 20, 30]).unwrap();
        PassContext {
            source: Arc::new(table) as Arc<dyn RowSource>,
            branches: HashMap::new(),
        }
    }

    #[test]
    fn test_evaluates_from_source() {
        let node = DefinedColumn::new(
            "doubled".into(),
            ColumnCallable::from_fn(|a: i64| a * 2),
            vec!["a".into()],
        );
        node.create_slots(1);
        node.build_readers(&ctx(), 0).unwrap();
        assert_eq!(node.value(0, 1).unwrap(), Value::Int64(40));
    }

    #[test]
    fn test_caches_per_row_per_slot() {
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);
        let node = DefinedColumn::new(
            "counted".into(),
            ColumnCallable::from_fn(move |a: i64| {
                seen.fetch_add(1, Ordering::Relaxed);
                a
            }),
            vec!["a".into()],
        );
        node.create_slots(2);
        let ctx = ctx();
        node.build_readers(&ctx, 0).unwrap();
        node.build_readers(&ctx, 1).unwrap();

        node.value(0, 0).unwrap();
        node.value(0, 0).unwrap();
        node.value(0, 0).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        // a different slot has its own cache
        node.value(1, 0).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 2);

        // a new row evaluates again
        node.value(0, 2).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_user_failure_kind() {
        let node = DefinedColumn::new(
            "failing".into(),
            ColumnCallable::from_fn(|_a: i64| -> SiftResult<i64> {
                Err(common_error::SiftError::internal("oops"))
            }),
            vec!["a".into()],
        );
        node.create_slots(1);
        node.build_readers(&ctx(), 0).unwrap();
        let err = node.value(0, 0).unwrap_err();
        assert!(matches!(err, common_error::SiftError::UserCallable(_)));
    }
}
