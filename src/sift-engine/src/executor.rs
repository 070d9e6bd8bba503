//! Pass execution: the single-threaded loop and the parallel driver.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use common_error::{SiftError, SiftResult};
use common_runtime::ComputePool;
use sift_core::{partition_rows, RowSource};

use crate::actions::ActionNode;
use crate::nodes::{DefinedColumn, FilterNode, PassContext};

/// Snapshot of the booked graph taken when a pass starts.
pub(crate) struct PassNodes {
    pub(crate) branches: HashMap<String, Arc<DefinedColumn>>,
    pub(crate) filters: Vec<Arc<FilterNode>>,
    pub(crate) named_filters: Vec<Arc<FilterNode>>,
    pub(crate) actions: Vec<Arc<dyn ActionNode>>,
}

/// Drive one pass over the source.
///
/// The implicit-parallelism flag and worker count are read exactly once,
/// here; the slot count is fixed for the whole pass.
pub(crate) fn run_pass(source: &Arc<dyn RowSource>, nodes: &PassNodes) -> SiftResult<()> {
    let slots = if common_runtime::is_implicit_parallelism_enabled() {
        common_runtime::implicit_worker_count().max(1)
    } else {
        1
    };
    let rows = source.num_rows();
    debug!(rows, slots, "starting pass");

    for action in &nodes.actions {
        action.create_slots(slots);
    }
    for filter in &nodes.filters {
        filter.create_slots(slots);
    }
    for branch in nodes.branches.values() {
        branch.create_slots(slots);
    }

    let ctx = PassContext {
        source: Arc::clone(source),
        branches: nodes.branches.clone(),
    };

    let started = Instant::now();
    if slots == 1 {
        run_sequential(&ctx, nodes, rows)?;
    } else {
        run_parallel(&ctx, nodes, rows, slots)?;
    }

    // single-threaded: workers have joined by now
    for action in &nodes.actions {
        action.finalize();
    }
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "pass complete");
    Ok(())
}

fn run_sequential(ctx: &PassContext, nodes: &PassNodes, rows: u64) -> SiftResult<()> {
    build_readers(ctx, nodes, 0)?;
    process_rows(nodes, 0, 0..rows, None)
}

fn run_parallel(
    ctx: &PassContext,
    nodes: &PassNodes,
    rows: u64,
    workers: usize,
) -> SiftResult<()> {
    let pool = ComputePool::new(workers)?;
    let ranges = partition_rows(rows, workers);
    let slot_map: Mutex<HashMap<ThreadId, usize>> = Mutex::new(HashMap::with_capacity(workers));
    let first_error: Mutex<Option<SiftError>> = Mutex::new(None);
    let abort = AtomicBool::new(false);

    pool.install(|| {
        rayon::scope(|scope| {
            for range in ranges {
                let (slot_map, first_error, abort) = (&slot_map, &first_error, &abort);
                scope.spawn(move |_| {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    let slot = acquire_slot(slot_map);
                    let outcome = build_readers(ctx, nodes, slot)
                        .and_then(|()| process_rows(nodes, slot, range, Some(abort)));
                    if let Err(err) = outcome {
                        abort.store(true, Ordering::Relaxed);
                        let mut guard = first_error.lock();
                        if guard.is_none() {
                            *guard = Some(err);
                        }
                    }
                });
            }
        });
    });

    // marshal the first worker failure back to the observing caller
    match first_error.into_inner() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Stable slot index for the current worker thread.
///
/// One short critical section per worker per pass; the slot stays with the
/// thread, so a worker picking up a second partition keeps its state.
fn acquire_slot(map: &Mutex<HashMap<ThreadId, usize>>) -> usize {
    let id = std::thread::current().id();
    let mut map = map.lock();
    let next = map.len();
    *map.entry(id).or_insert(next)
}

fn build_readers(ctx: &PassContext, nodes: &PassNodes, slot: usize) -> SiftResult<()> {
    for action in &nodes.actions {
        action.build_readers(ctx, slot)?;
    }
    for filter in &nodes.filters {
        filter.build_readers(ctx, slot)?;
    }
    for branch in nodes.branches.values() {
        branch.build_readers(ctx, slot)?;
    }
    Ok(())
}

/// Run the per-row dispatch for one slot over one row range.
///
/// Named filters are polled after the actions so their cutflow counters are
/// filled even when no booked action depends on them.
fn process_rows(
    nodes: &PassNodes,
    slot: usize,
    range: Range<u64>,
    abort: Option<&AtomicBool>,
) -> SiftResult<()> {
    for row in range {
        if let Some(flag) = abort {
            if flag.load(Ordering::Relaxed) {
                return Ok(());
            }
        }
        for action in &nodes.actions {
            action.run(slot, row)?;
        }
        for filter in &nodes.named_filters {
            filter.check(slot, row)?;
        }
    }
    Ok(())
}
