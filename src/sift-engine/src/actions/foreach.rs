//! Generic per-row callback actions.

use common_error::SiftResult;
use sift_core::Value;

use super::ActionHelper;
use crate::callable::{as_user_failure, SlotCallable};

/// Invokes a user callback per accepted row; publishes unit.
///
/// Serves both the single-slot and the slot-aware variant: the erased
/// callable either ignores or forwards the slot index.
pub(crate) struct ForeachHelper {
    callable: SlotCallable,
}

impl ForeachHelper {
    pub(crate) fn new(callable: SlotCallable) -> Self {
        Self { callable }
    }
}

impl ActionHelper for ForeachHelper {
    type Acc = ();
    type Out = ();

    fn init(&self) {}

    fn exec(
        &self,
        slot: usize,
        _acc: &mut (),
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()> {
        self.callable
            .call(slot, values, columns)
            .map_err(as_user_failure)
    }

    fn merge(&self, _accs: Vec<()>) -> SiftResult<()> {
        Ok(())
    }
}
