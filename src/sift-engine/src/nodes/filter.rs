//! Filter node.

use parking_lot::{Mutex, RwLock};

use common_error::SiftResult;

use crate::callable::{as_user_failure, FilterCallable};
use crate::nodes::{read_inputs, resolve_inputs, ChainLink, InputReader, PassContext};
use crate::report::CutflowEntry;

/// Per-slot evaluation state of a filter.
#[derive(Default)]
struct FilterSlot {
    last_row: Option<u64>,
    result: bool,
    accepted: u64,
    rejected: u64,
    readers: Vec<InputReader>,
}

/// A boolean predicate over named inputs, cached per (row, slot).
///
/// Evaluation short-circuits: when any ancestor filter rejects a row, this
/// node records the rejection without invoking its own predicate, and named
/// counters are not touched. A named filter therefore observes exactly the
/// rows its whole ancestor chain accepted.
pub(crate) struct FilterNode {
    name: Option<String>,
    columns: Vec<String>,
    callable: FilterCallable,
    parent: ChainLink,
    slots: RwLock<Vec<Mutex<FilterSlot>>>,
}

impl FilterNode {
    pub(crate) fn new(
        name: Option<String>,
        callable: FilterCallable,
        columns: Vec<String>,
        parent: ChainLink,
    ) -> Self {
        Self {
            name,
            columns,
            callable,
            parent,
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Check whether this filter carries a name (and thus cutflow counters).
    pub(crate) fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Size per-slot state for `n` worker slots.
    ///
    /// Counters are zeroed: they account for the upcoming pass only.
    pub(crate) fn create_slots(&self, n: usize) {
        let mut slots = self.slots.write();
        slots.clear();
        slots.resize_with(n, || Mutex::new(FilterSlot::default()));
    }

    /// Resolve input readers for `slot`.
    pub(crate) fn build_readers(&self, ctx: &PassContext, slot: usize) -> SiftResult<()> {
        let readers = resolve_inputs(ctx, &self.columns)?;
        self.slots.read()[slot].lock().readers = readers;
        Ok(())
    }

    /// Evaluate the filter for `row` in `slot`, at most once per (row, slot).
    pub(crate) fn check(&self, slot: usize, row: u64) -> SiftResult<bool> {
        let slots = self.slots.read();
        let mut state = slots[slot].lock();
        if state.last_row == Some(row) {
            return Ok(state.result);
        }
        if !self.parent.check(slot, row)? {
            state.last_row = Some(row);
            state.result = false;
            return Ok(false);
        }
        let values = read_inputs(&state.readers, slot, row)?;
        let pass = self
            .callable
            .call(&values, &self.columns)
            .map_err(as_user_failure)?;
        state.last_row = Some(row);
        state.result = pass;
        if self.name.is_some() {
            if pass {
                state.accepted += 1;
            } else {
                state.rejected += 1;
            }
        }
        Ok(pass)
    }

    /// Sum per-slot counters into one cutflow row.
    pub(crate) fn cutflow_entry(&self) -> CutflowEntry {
        let slots = self.slots.read();
        let (mut accepted, mut rejected) = (0, 0);
        for slot in slots.iter() {
            let state = slot.lock();
            accepted += state.accepted;
            rejected += state.rejected;
        }
        CutflowEntry {
            name: self.name.clone().unwrap_or_default(),
            accepted,
            observed: accepted + rejected,
        }
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
        let table = MemTable::new().with_i64("a", vec![1, 2, 3]).unwrap();
        PassContext {
            source: Arc::new(table) as Arc<dyn RowSource>,
            branches: HashMap::new(),
        }
    }

    fn filter(name: Option<&str>, parent: ChainLink) -> FilterNode {
        FilterNode::new(
            name.map(str::to_string),
            FilterCallable::from_fn(|a: i64| a > 1),
            vec!["a".into()],
            parent,
        )
    }

    #[test]
    fn test_check_and_cache() {
        let node = filter(None, ChainLink::Source);
        node.create_slots(1);
        node.build_readers(&ctx(), 0).unwrap();
        assert!(!node.check(0, 0).unwrap());
        assert!(node.check(0, 1).unwrap());
        // cached: same row returns without re-evaluating
        assert!(node.check(0, 1).unwrap());
    }

    #[test]
    fn test_named_counters() {
        let node = filter(Some("gt1"), ChainLink::Source);
        node.create_slots(1);
        node.build_readers(&ctx(), 0).unwrap();
        for row in 0..3 {
            node.check(0, row).unwrap();
        }
        let entry = node.cutflow_entry();
        assert_eq!(entry.name, "gt1");
        assert_eq!(entry.accepted, 2);
        assert_eq!(entry.observed, 3);
    }

    #[test]
    fn test_short_circuit_skips_predicate() {
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);

        let upstream = Arc::new(filter(None, ChainLink::Source));
        let downstream = FilterNode::new(
            Some("lt3".into()),
            FilterCallable::from_fn(move |a: i64| {
                seen.fetch_add(1, Ordering::Relaxed);
                a < 3
            }),
            vec!["a".into()],
            ChainLink::Filter(Arc::clone(&upstream)),
        );

        let ctx = ctx();
        upstream.create_slots(1);
        upstream.build_readers(&ctx, 0).unwrap();
        downstream.create_slots(1);
        downstream.build_readers(&ctx, 0).unwrap();

        for row in 0..3 {
            downstream.check(0, row).unwrap();
        }
        // row 0 fails upstream, so the downstream predicate ran twice
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        let entry = downstream.cutflow_entry();
        assert_eq!(entry.accepted, 1);
        assert_eq!(entry.observed, 2);
    }

    #[test]
    fn test_counters_reset_on_create_slots() {
        let node = filter(Some("gt1"), ChainLink::Source);
        node.create_slots(1);
        node.build_readers(&ctx(), 0).unwrap();
        node.check(0, 1).unwrap();
        assert_eq!(node.cutflow_entry().observed, 1);
        node.create_slots(1);
        assert_eq!(node.cutflow_entry().observed, 0);
    }
}
