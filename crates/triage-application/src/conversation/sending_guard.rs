use std::sync::atomic::{AtomicBool, Ordering};
use triage_core::{Result, TriageError};

/// Holds the `sending` flag for the lifetime of one upstream call.
///
/// Dropping the guard clears the flag, so early returns and failed calls
/// release it as reliably as successful ones.
pub(crate) struct SendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SendingGuard<'a> {
    /// Sets the flag, or rejects the caller when it is already set.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TriageError::SendInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
