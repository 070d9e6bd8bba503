//! Take action.

use std::marker::PhantomData;

use common_error::SiftResult;
use sift_core::{FromValue, Value};

use super::ActionHelper;

/// Collects every accepted value of one column into a buffer.
///
/// Slot buffers are concatenated in slot-index order, not original row
/// order.
pub(crate) struct TakeHelper<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TakeHelper<T> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> ActionHelper for TakeHelper<T>
where
    T: FromValue + Send + 'static,
{
    type Acc = Vec<T>;
    type Out = Vec<T>;

    fn init(&self) -> Vec<T> {
        Vec::new()
    }

    fn exec(
        &self,
        _slot: usize,
        acc: &mut Vec<T>,
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()> {
        acc.push(T::from_value(&values[0], &columns[0])?);
        Ok(())
    }

    fn merge(&self, accs: Vec<Vec<T>>) -> SiftResult<Vec<T>> {
        Ok(accs.into_iter().flatten().collect())
    }
}
