//! Count action.

use common_error::SiftResult;
use sift_core::Value;

use super::ActionHelper;

/// Counts rows accepted by the chain. Takes no column inputs.
pub(crate) struct CountHelper;

impl ActionHelper for CountHelper {
    type Acc = u64;
    type Out = u64;

    fn init(&self) -> u64 {
        0
    }

    fn exec(
        &self,
        _slot: usize,
        acc: &mut u64,
        _values: &[Value],
        _columns: &[String],
    ) -> SiftResult<()> {
        *acc += 1;
        Ok(())
    }

    fn merge(&self, accs: Vec<u64>) -> SiftResult<u64> {
        Ok(accs.into_iter().sum())
    }
}
