//! Future-like handles to action results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use common_error::{SiftError, SiftResult};

use crate::frame::FrameCore;

/// Shared cell an action publishes its finalised result into.
///
/// The readiness flag is shared with the root, which flips it only after the
/// pass completed and every action finalised.
pub(crate) struct ResultSlot<T> {
    value: Mutex<Option<SiftResult<T>>>,
    ready: Arc<AtomicBool>,
}

impl<T> ResultSlot<T> {
    pub(crate) fn new(ready: Arc<AtomicBool>) -> Self {
        Self {
            value: Mutex::new(None),
            ready,
        }
    }

    pub(crate) fn publish(&self, result: SiftResult<T>) {
        *self.value.lock() = Some(result);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// A future-like reference to an action's finalised value.
///
/// The first observation of any handle issued by a root drives that root's
/// single pass; every other handle of the same root becomes ready at the
/// same time, and later observations return the published value directly.
pub struct ResultHandle<T> {
    slot: Arc<ResultSlot<T>>,
    core: Arc<FrameCore>,
}

impl<T> std::fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandle").finish()
    }
}

impl<T> ResultHandle<T> {
    pub(crate) fn new(slot: Arc<ResultSlot<T>>, core: Arc<FrameCore>) -> Self {
        Self { slot, core }
    }
}

impl<T: Clone> ResultHandle<T> {
    /// Observe the result, driving the pass if it has not run yet.
    ///
    /// A pass aborted by a failing callable leaves every handle unready; the
    /// failure is returned here, and observing again retries the pass.
    pub fn value(&self) -> SiftResult<T> {
        if !self.slot.is_ready() {
            self.core.run()?;
        }
        match &*self.slot.value.lock() {
            Some(result) => result.clone(),
            None => Err(SiftError::internal(
                "result handle observed but no value was published",
            )),
        }
    }
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            core: Arc::clone(&self.core),
        }
    }
}
