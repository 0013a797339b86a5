//! services/api/src/web/guard.rs
//!
//! Re-entrancy guard for actions with a simulated delay. While one submission
//! is pending the action is disabled: a second attempt is turned away, not queued.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    /// Marks the action as running, or returns `None` if it already is.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Re-enables the action when dropped.
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_attempt_is_rejected_until_release() {
        let action = InFlight::default();
        let first = action.try_begin();
        assert!(first.is_some());
        assert!(action.is_busy());
        assert!(action.try_begin().is_none());

        drop(first);
        assert!(!action.is_busy());
        assert!(action.try_begin().is_some());
    }
}
