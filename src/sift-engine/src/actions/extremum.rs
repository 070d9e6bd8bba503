//! Min and max actions.

use std::marker::PhantomData;

use common_error::{SiftError, SiftResult};
use sift_core::{FromValue, Value};

use super::ActionHelper;

/// Which extremum an [`ExtremumHelper`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExtremumKind {
    Min,
    Max,
}

impl ExtremumKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Min => "Min",
            Self::Max => "Max",
        }
    }
}

/// Tracks the minimum or maximum accepted value of one column.
///
/// Publishes *empty-input* when the chain accepted zero rows.
pub(crate) struct ExtremumHelper<T> {
    kind: ExtremumKind,
    column: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ExtremumHelper<T> {
    pub(crate) fn new(kind: ExtremumKind, column: String) -> Self {
        Self {
            kind,
            column,
            _marker: PhantomData,
        }
    }

    fn better(&self, candidate: &T, current: &T) -> bool
    where
        T: PartialOrd,
    {
        match self.kind {
            ExtremumKind::Min => candidate < current,
            ExtremumKind::Max => candidate > current,
        }
    }
}

impl<T> ActionHelper for ExtremumHelper<T>
where
    T: FromValue + PartialOrd + Send + 'static,
{
    type Acc = Option<T>;
    type Out = T;

    fn init(&self) -> Option<T> {
        None
    }

    fn exec(
        &self,
        _slot: usize,
        acc: &mut Option<T>,
        values: &[Value],
        columns: &[String],
    ) -> SiftResult<()> {
        let candidate = T::from_value(&values[0], &columns[0])?;
        let replace = match acc {
            None => true,
            Some(current) => self.better(&candidate, current),
        };
        if replace {
            *acc = Some(candidate);
        }
        Ok(())
    }

    fn merge(&self, accs: Vec<Option<T>>) -> SiftResult<T> {
        let mut best: Option<T> = None;
        for candidate in accs.into_iter().flatten() {
            let replace = match &best {
                None => true,
                Some(current) => self.better(&candidate, current),
            };
            if replace {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| {
            SiftError::empty_input(format!(
                "{} of \"{}\": no rows accepted",
                self.kind.name(),
                self.column
            ))
        })
    }
}
