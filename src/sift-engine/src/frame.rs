//! Frame root: booking surface, node ownership, pass lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use common_error::{SiftError, SiftResult};
use sift_core::{FromValue, RowSource};

use crate::actions::{
    Action, ActionHelper, ActionNode, CountHelper, ExtremumHelper, ExtremumKind, FillHelper,
    ForeachHelper, MeanHelper, ReduceHelper, TakeHelper,
};
use crate::callable::{
    ColumnCallable, FilterCallable, IntoColumnValue, IntoFilterResult, IntoUnitResult, RowFn,
    SlotCallable, SlotRowFn,
};
use crate::executor::{self, PassNodes};
use crate::hist::FillSink;
use crate::nodes::{ChainLink, DefinedColumn, FilterNode};
use crate::report::{CutflowEntry, CutflowReport};
use crate::result::{ResultHandle, ResultSlot};

/// Lifecycle of a root: booking, one pass, then frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Booking,
    Running,
    Ready,
}

/// Booked nodes and lifecycle state, guarded by the root's mutex.
struct BookedNodes {
    phase: Phase,
    /// Thread driving the current pass, while `phase` is `Running`.
    runner: Option<ThreadId>,
    branches: HashMap<String, Arc<DefinedColumn>>,
    filters: Vec<Arc<FilterNode>>,
    /// Named filters in booking order, for the cutflow report.
    named_filters: Vec<Arc<FilterNode>>,
    actions: Vec<Arc<dyn ActionNode>>,
    readiness: Vec<Arc<AtomicBool>>,
}

/// The root of one pipeline graph: owns the source identity and every
/// booked node, and drives the single shared pass.
pub(crate) struct FrameCore {
    source: Arc<dyn RowSource>,
    default_columns: Vec<String>,
    state: Mutex<BookedNodes>,
    /// Signalled when a running pass settles, whichever way.
    pass_done: Condvar,
}

impl FrameCore {
    fn new(source: Arc<dyn RowSource>, default_columns: Vec<String>) -> Self {
        Self {
            source,
            default_columns,
            state: Mutex::new(BookedNodes {
                phase: Phase::Booking,
                runner: None,
                branches: HashMap::new(),
                filters: Vec::new(),
                named_filters: Vec::new(),
                actions: Vec::new(),
                readiness: Vec::new(),
            }),
            pass_done: Condvar::new(),
        }
    }

    /// Run a booking mutation; fails once the root has left the booking
    /// phase.
    fn with_booking<R>(
        &self,
        f: impl FnOnce(&mut BookedNodes) -> SiftResult<R>,
    ) -> SiftResult<R> {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Booking => f(&mut state),
            Phase::Running => Err(SiftError::root_frozen("booking during a running pass")),
            Phase::Ready => Err(SiftError::root_frozen(
                "booking after the pass has completed",
            )),
        }
    }

    /// Drive the pass if none has completed yet.
    ///
    /// On success the booked-actions list is cleared (stale handles cannot
    /// re-trigger a pass) and every readiness flag flips. On failure the
    /// root returns to the booking phase with handles unready, so a later
    /// observation retries the pass.
    pub(crate) fn run(&self) -> SiftResult<()> {
        let snapshot = {
            let mut state = self.state.lock();
            loop {
                match state.phase {
                    Phase::Ready => return Ok(()),
                    Phase::Running => {
                        if state.runner == Some(thread::current().id()) {
                            return Err(SiftError::internal(
                                "pass observation from inside the running pass",
                            ));
                        }
                        // another thread is driving: wait for it to settle,
                        // then re-check (it may have failed, in which case
                        // this observer retries the pass itself)
                        self.pass_done.wait(&mut state);
                    }
                    Phase::Booking => break,
                }
            }
            state.phase = Phase::Running;
            state.runner = Some(thread::current().id());
            PassNodes {
                branches: state.branches.clone(),
                filters: state.filters.clone(),
                named_filters: state.named_filters.clone(),
                actions: state.actions.clone(),
            }
        };

        let outcome = executor::run_pass(&self.source, &snapshot);

        let mut state = self.state.lock();
        state.runner = None;
        let settled = match outcome {
            Ok(()) => {
                state.phase = Phase::Ready;
                state.actions.clear();
                for flag in state.readiness.drain(..) {
                    flag.store(true, Ordering::Release);
                }
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "pass aborted");
                state.phase = Phase::Booking;
                Err(err)
            }
        };
        drop(state);
        self.pass_done.notify_all();
        settled
    }

    fn cutflow(&self) -> Vec<CutflowEntry> {
        self.state
            .lock()
            .named_filters
            .iter()
            .map(|filter| filter.cutflow_entry())
            .collect()
    }
}

/// A chain state of a pipeline graph: a handle to the root plus the filter
/// chain and derived columns booked up to this point.
///
/// Cloning is cheap and shares the root, so several branches of one graph
/// can be grown from a stored state; all of them are served by the same
/// single pass, and shared filters or derived columns are evaluated once
/// per (row, slot) no matter how many descendants consume them.
#[derive(Clone)]
pub struct DataFrame {
    core: Arc<FrameCore>,
    chain: ChainLink,
    /// Names of derived columns booked on this chain, in booking order.
    avail: Vec<String>,
}

impl std::fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFrame").field("avail", &self.avail).finish()
    }
}

impl DataFrame {
    /// Build a frame over `source` with no default column list.
    pub fn new(source: impl RowSource + 'static) -> Self {
        Self::with_default_columns(source, &[])
    }

    /// Build a frame over `source` with a default column list, used
    /// whenever a booking omits its input columns.
    pub fn with_default_columns(source: impl RowSource + 'static, columns: &[&str]) -> Self {
        Self {
            core: Arc::new(FrameCore::new(
                Arc::new(source),
                columns.iter().map(|c| (*c).to_string()).collect(),
            )),
            chain: ChainLink::Source,
            avail: Vec::new(),
        }
    }

    /// Resolve the input list for a booking: an explicit list must match
    /// the callable arity exactly; an empty list falls back to the first
    /// `arity` entries of the default column list.
    fn pick_columns(&self, what: &str, arity: usize, explicit: &[&str]) -> SiftResult<Vec<String>> {
        if explicit.len() == arity {
            return Ok(explicit.iter().map(|c| (*c).to_string()).collect());
        }
        if explicit.is_empty() {
            let defaults = &self.core.default_columns;
            if defaults.len() >= arity {
                return Ok(defaults[..arity].to_vec());
            }
            return Err(SiftError::arity_mismatch(format!(
                "{what} expects {arity} column(s), default list has {}",
                defaults.len()
            )));
        }
        Err(SiftError::arity_mismatch(format!(
            "{what} expects {arity} column(s), {} given",
            explicit.len()
        )))
    }

    /// Every input must be a persistent source column or a derived column
    /// booked upstream on this chain.
    fn validate_inputs(&self, columns: &[String]) -> SiftResult<()> {
        for name in columns {
            if !self.core.source.has_column(name) && !self.avail.iter().any(|a| a == name) {
                return Err(SiftError::unknown_column(format!(
                    "column \"{name}\" is neither a source column nor a derived column \
                     booked upstream"
                )));
            }
        }
        Ok(())
    }

    /// Book a derived column named `name`, computed from `columns` (default
    /// list when empty) by `f`.
    ///
    /// The column is evaluated lazily, at most once per (row, slot), and is
    /// visible to every booking chained after this call.
    pub fn define<Args, F>(&self, name: &str, f: F, columns: &[&str]) -> SiftResult<DataFrame>
    where
        F: RowFn<Args>,
        F::Output: IntoColumnValue,
    {
        let callable = ColumnCallable::from_fn(f);
        let columns = self.pick_columns("derived column", callable.arity(), columns)?;
        self.validate_inputs(&columns)?;
        self.core.with_booking(|state| {
            if self.core.source.has_column(name) || state.branches.contains_key(name) {
                return Err(SiftError::duplicate_name(format!(
                    "column \"{name}\" already present in source or booked"
                )));
            }
            let node = Arc::new(DefinedColumn::new(name.to_string(), callable, columns));
            state.branches.insert(name.to_string(), node);
            Ok(())
        })?;
        let mut next = self.clone();
        next.avail.push(name.to_string());
        Ok(next)
    }

    /// Book an anonymous filter over `columns` (default list when empty).
    pub fn filter<Args, F>(&self, f: F, columns: &[&str]) -> SiftResult<DataFrame>
    where
        F: RowFn<Args>,
        F::Output: IntoFilterResult,
    {
        self.book_filter(None, FilterCallable::from_fn(f), columns)
    }

    /// Book a named filter: filters as usual and additionally tallies
    /// accept/reject counts for [`DataFrame::report`].
    pub fn named_filter<Args, F>(
        &self,
        name: &str,
        f: F,
        columns: &[&str],
    ) -> SiftResult<DataFrame>
    where
        F: RowFn<Args>,
        F::Output: IntoFilterResult,
    {
        self.book_filter(Some(name.to_string()), FilterCallable::from_fn(f), columns)
    }

    fn book_filter(
        &self,
        name: Option<String>,
        callable: FilterCallable,
        columns: &[&str],
    ) -> SiftResult<DataFrame> {
        let columns = self.pick_columns("filter", callable.arity(), columns)?;
        self.validate_inputs(&columns)?;
        let node = Arc::new(FilterNode::new(name, callable, columns, self.chain.clone()));
        self.core.with_booking(|state| {
            state.filters.push(Arc::clone(&node));
            if node.has_name() {
                state.named_filters.push(Arc::clone(&node));
            }
            Ok(())
        })?;
        let mut next = self.clone();
        next.chain = ChainLink::Filter(node);
        Ok(next)
    }

    fn book_action<H>(&self, helper: H, columns: Vec<String>) -> SiftResult<ResultHandle<H::Out>>
    where
        H: ActionHelper + 'static,
    {
        let ready = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(ResultSlot::new(Arc::clone(&ready)));
        let action = Arc::new(Action::new(
            helper,
            columns,
            self.chain.clone(),
            Arc::clone(&slot),
        ));
        self.core.with_booking(move |state| {
            state.actions.push(action);
            state.readiness.push(ready);
            Ok(())
        })?;
        Ok(ResultHandle::new(slot, Arc::clone(&self.core)))
    }

    /// Book a single-column action: resolve the column (default list when
    /// empty) and validate it before handing over to the helper.
    fn single_column(&self, what: &str, columns: &[&str]) -> SiftResult<Vec<String>> {
        let columns = self.pick_columns(what, 1, columns)?;
        self.validate_inputs(&columns)?;
        Ok(columns)
    }

    /// Book a count of the rows accepted by this chain.
    pub fn count(&self) -> SiftResult<ResultHandle<u64>> {
        self.book_action(CountHelper, Vec::new())
    }

    /// Book a collection of every accepted value of one column.
    ///
    /// The buffer is merged in slot-index order under implicit parallelism,
    /// not in original row order.
    pub fn take<T>(&self, columns: &[&str]) -> SiftResult<ResultHandle<Vec<T>>>
    where
        T: FromValue + Clone + Send + Sync + 'static,
    {
        let columns = self.single_column("take", columns)?;
        self.book_action(TakeHelper::<T>::new(), columns)
    }

    /// Book the minimum accepted value of one column.
    ///
    /// Observing the handle fails with *empty-input* when no row was
    /// accepted.
    pub fn min<T>(&self, columns: &[&str]) -> SiftResult<ResultHandle<T>>
    where
        T: FromValue + PartialOrd + Clone + Send + Sync + 'static,
    {
        let columns = self.single_column("min", columns)?;
        let helper = ExtremumHelper::<T>::new(ExtremumKind::Min, columns[0].clone());
        self.book_action(helper, columns)
    }

    /// Book the maximum accepted value of one column.
    pub fn max<T>(&self, columns: &[&str]) -> SiftResult<ResultHandle<T>>
    where
        T: FromValue + PartialOrd + Clone + Send + Sync + 'static,
    {
        let columns = self.single_column("max", columns)?;
        let helper = ExtremumHelper::<T>::new(ExtremumKind::Max, columns[0].clone());
        self.book_action(helper, columns)
    }

    /// Book the arithmetic mean of one column's accepted values.
    pub fn mean(&self, columns: &[&str]) -> SiftResult<ResultHandle<f64>> {
        let columns = self.single_column("mean", columns)?;
        let helper = MeanHelper::new(columns[0].clone());
        self.book_action(helper, columns)
    }

    /// Book a left-fold of one column's accepted values with `f`, seeded by
    /// `init`. Slot partials are merged with the same `f` in slot-index
    /// order.
    pub fn reduce<T, F>(&self, f: F, init: T, columns: &[&str]) -> SiftResult<ResultHandle<T>>
    where
        T: FromValue + Clone + Send + Sync + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let columns = self.single_column("reduce", columns)?;
        self.book_action(ReduceHelper::new(f, init), columns)
    }

    /// Book a histogram-style fill of one column's accepted values into a
    /// clone of `model` per worker slot, merged in slot-index order.
    pub fn fill<H>(&self, model: H, columns: &[&str]) -> SiftResult<ResultHandle<H>>
    where
        H: FillSink + Clone + Send + Sync + 'static,
    {
        let columns = self.single_column("fill", columns)?;
        self.book_action(FillHelper::new(model), columns)
    }

    /// Book a generic per-row callback over `columns` (default list when
    /// empty).
    ///
    /// Under implicit parallelism the callback runs concurrently from every
    /// worker; its thread safety is the caller's responsibility. Prefer
    /// [`DataFrame::foreach_slot`] for slot-partitioned state.
    pub fn foreach<Args, F>(&self, f: F, columns: &[&str]) -> SiftResult<ResultHandle<()>>
    where
        F: RowFn<Args>,
        F::Output: IntoUnitResult,
    {
        let callable = SlotCallable::from_fn(f);
        let columns = self.pick_columns("foreach", callable.arity(), columns)?;
        self.validate_inputs(&columns)?;
        self.book_action(ForeachHelper::new(callable), columns)
    }

    /// Book a slot-aware per-row callback: `f` receives the worker slot
    /// index in `[0, workers)` ahead of the column values, so callers can
    /// keep one accumulator per slot and merge afterwards.
    pub fn foreach_slot<Args, F>(&self, f: F, columns: &[&str]) -> SiftResult<ResultHandle<()>>
    where
        F: SlotRowFn<Args>,
        F::Output: IntoUnitResult,
    {
        let callable = SlotCallable::from_slot_fn(f);
        let columns = self.pick_columns("foreach_slot", callable.arity(), columns)?;
        self.validate_inputs(&columns)?;
        self.book_action(ForeachHelper::new(callable), columns)
    }

    /// Cutflow over every named filter of this root, in booking order.
    ///
    /// Drives the pass first if none has run, so the report always refers
    /// to a completed pass. Calling it again returns identical entries.
    pub fn report(&self) -> SiftResult<CutflowReport> {
        self.core.run()?;
        Ok(CutflowReport::new(self.core.cutflow()))
    }
}

#[cfg(test)]
mod tests {
    use sift_core::MemTable;

    use super::*;

    fn frame() -> DataFrame {
        let table = MemTable::new()
            .with_i64("a", vec![1, 2, 3, 4, 5])
            .unwrap()
            .with_i64("b", vec![5, 4, 3, 2, 1])
            .unwrap();
        DataFrame::new(table)
    }

    #[test]
    fn test_duplicate_define_rejected() {
        let df = frame();
        // collides with a persistent column
        let err = df.define("a", |x: i64| x, &["b"]).unwrap_err();
        assert!(matches!(err, SiftError::DuplicateName(_)));
        // collides with a booked derived column
        let df = df.define("c", |x: i64| x + 1, &["a"]).unwrap();
        let err = df.define("c", |x: i64| x, &["a"]).unwrap_err();
        assert!(matches!(err, SiftError::DuplicateName(_)));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let df = frame();
        let err = df.filter(|x: i64| x > 0, &["missing"]).unwrap_err();
        assert!(matches!(err, SiftError::UnknownColumn(_)));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let df = frame();
        let err = df.filter(|x: i64, y: i64| x > y, &["a"]).unwrap_err();
        assert!(matches!(err, SiftError::ArityMismatch(_)));
    }

    #[test]
    fn test_default_columns_prefix() {
        let table = MemTable::new()
            .with_i64("a", vec![1, 2, 3])
            .unwrap()
            .with_i64("b", vec![3, 2, 1])
            .unwrap();
        let df = DataFrame::with_default_columns(table, &["a", "b"]);
        // unary callable picks up "a" only
        let count = df.filter(|a: i64| a > 1, &[]).unwrap().count().unwrap();
        assert_eq!(count.value().unwrap(), 2);
    }

    #[test]
    fn test_default_columns_too_short() {
        let table = MemTable::new().with_i64("a", vec![1]).unwrap();
        let df = DataFrame::with_default_columns(table, &["a"]);
        let err = df.filter(|x: i64, y: i64| x > y, &[]).unwrap_err();
        assert!(matches!(err, SiftError::ArityMismatch(_)));
    }

    #[test]
    fn test_booking_after_pass_is_frozen() {
        let df = frame();
        let count = df.count().unwrap();
        assert_eq!(count.value().unwrap(), 5);
        let err = df.filter(|x: i64| x > 0, &["a"]).unwrap_err();
        assert!(matches!(err, SiftError::RootFrozen(_)));
        let err = df.count().unwrap_err();
        assert!(matches!(err, SiftError::RootFrozen(_)));
    }

    #[test]
    fn test_derived_column_visible_downstream() {
        let df = frame();
        let sum = df
            .define("c", |a: i64, b: i64| a + b, &["a", "b"])
            .unwrap()
            .filter(|c: i64| c == 6, &["c"])
            .unwrap()
            .count()
            .unwrap();
        assert_eq!(sum.value().unwrap(), 5);
    }

    #[test]
    fn test_derived_column_not_visible_on_sibling_chain() {
        let df = frame();
        let _with_c = df.define("c", |a: i64| a * 2, &["a"]).unwrap();
        // the original chain state never saw "c"
        let err = df.filter(|c: i64| c > 0, &["c"]).unwrap_err();
        assert!(matches!(err, SiftError::UnknownColumn(_)));
    }
}
