//! User-supplied binary reduction action.

use common_error::SiftResult;
use sift_core::{FromValue, Value};

use super::ActionHelper;

/// Left-folds one column's accepted values with a binary function, seeded by
/// `init`; slot partials are merged with the same function in slot-index
/// order.
pub(crate) struct ReduceHelper<T, F> {
    f: F,
    init: T,
}

impl<T, F> ReduceHelper<T, F> {
    pub(crate) fn new(f: F, init: T) -> Self {
        Self { f, init }
    }
}

impl<T, F> ActionHelper for ReduceHelper<T, F>
where
    T: FromValue + Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + Send + Sync,
{
    type Acc = T;
    type Out = T;

    fn init(&self) -> T {
        self.init.clone()
    }

    fn exec(
        &self,
        _slot: usize,
        acc: &mut T,
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()> {
        let value = T::from_value(&values[0], &columns[0])?;
        let folded = (self.f)(std::mem::replace(acc, self.init.clone()), value);
        *acc = folded;
        Ok(())
    }

    fn merge(&self, accs: Vec<T>) -> SiftResult<T> {
        Ok(accs
            .into_iter()
            .reduce(|a, b| (self.f)(a, b))
            .unwrap_or_else(|| self.init.clone()))
    }
}
