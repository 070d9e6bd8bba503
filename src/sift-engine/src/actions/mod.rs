//! Action nodes: per-slot accumulation, merge, publication.
//!
//! Every action kind is an [`ActionHelper`]: a strategy providing the slot
//! accumulator, the per-row update, and the slot-index-ordered merge. The
//! generic [`Action`] node owns the per-slot state, gates rows on the filter
//! chain, and publishes the merged result into its [`ResultSlot`].

mod count;
mod extremum;
mod fill;
mod foreach;
mod mean;
mod reduce;
mod take;

pub(crate) use count::CountHelper;
pub(crate) use extremum::{ExtremumHelper, ExtremumKind};
pub(crate) use fill::FillHelper;
pub(crate) use foreach::ForeachHelper;
pub(crate) use mean::MeanHelper;
pub(crate) use reduce::ReduceHelper;
pub(crate) use take::TakeHelper;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use common_error::SiftResult;
use sift_core::Value;

use crate::nodes::{read_inputs, resolve_inputs, ChainLink, InputReader, PassContext};
use crate::result::ResultSlot;

/// One booked action, driven by the executor.
pub(crate) trait ActionNode: Send + Sync {
    /// Size per-slot state for `n` worker slots.
    fn create_slots(&self, n: usize);

    /// Resolve input readers for `slot`.
    fn build_readers(&self, ctx: &PassContext, slot: usize) -> SiftResult<()>;

    /// Process one row in `slot`: evaluate the ancestor chain and, when it
    /// accepts, update the slot accumulator from the current input values.
    fn run(&self, slot: usize, row: u64) -> SiftResult<()>;

    /// Merge slot accumulators and publish the result.
    fn finalize(&self);
}

/// Accumulation strategy of one action kind.
pub(crate) trait ActionHelper: Send + Sync {
    /// Slot-local accumulator.
    type Acc: Send + 'static;
    /// Published result.
    type Out: Send + 'static;

    /// Fresh accumulator for one slot.
    fn init(&self) -> Self::Acc;

    /// Update `acc` from one accepted row's input values.
    fn exec(
        &self,
        slot: usize,
        acc: &mut Self::Acc,
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()>;

    /// Merge slot accumulators, given in slot-index order.
    fn merge(&self, accs: Vec<Self::Acc>) -> SiftResult<Self::Out>;
}

struct ActionSlot<A> {
    acc: A,
    readers: Vec<InputReader>,
}

/// Generic action node parameterised by its accumulation strategy.
pub(crate) struct Action<H: ActionHelper> {
    helper: H,
    columns: Vec<String>,
    chain: ChainLink,
    slots: RwLock<Vec<Mutex<ActionSlot<H::Acc>>>>,
    result: Arc<ResultSlot<H::Out>>,
}

impl<H: ActionHelper> Action<H> {
    pub(crate) fn new(
        helper: H,
        columns: Vec<String>,
        chain: ChainLink,
        result: Arc<ResultSlot<H::Out>>,
    ) -> Self {
        Self {
            helper,
            columns,
            chain,
            slots: RwLock::new(Vec::new()),
            result,
        }
    }
}

impl<H: ActionHelper> ActionNode for Action<H> {
    fn create_slots(&self, n: usize) {
        let mut slots = self.slots.write();
        slots.clear();
        slots.resize_with(n, || {
            Mutex::new(ActionSlot {
                acc: self.helper.init(),
                readers: Vec::new(),
            })
        });
    }

    fn build_readers(&self, ctx: &PassContext, slot: usize) -> SiftResult<()> {
        let readers = resolve_inputs(ctx, &self.columns)?;
        self.slots.read()[slot].lock().readers = readers;
        Ok(())
    }

    fn run(&self, slot: usize, row: u64) -> SiftResult<()> {
        if !self.chain.check(slot, row)? {
            return Ok(());
        }
        let slots = self.slots.read();
        let mut state = slots[slot].lock();
        let ActionSlot { acc, readers } = &mut *state;
        let values = read_inputs(readers, slot, row)?;
        self.helper.exec(slot, acc, &values, &self.columns)
    }

    fn finalize(&self) {
        let mut slots = self.slots.write();
        let accs: Vec<H::Acc> = slots
            .drain(..)
            .map(|slot| slot.into_inner().acc)
            .collect();
        self.result.publish(self.helper.merge(accs));
    }
}
