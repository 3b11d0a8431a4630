//! In-memory transport double.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use driftwire_client::{Transport, TransportError};

#[derive(Debug, Default)]
struct SimInner {
    sent: Mutex<Vec<String>>,
    fail_sends: AtomicBool,
}

/// Transport that records outbound wire text instead of delivering it.
///
/// Clones share the same buffer, so a test can move one handle into the
/// client and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct SimTransport {
    inner: Arc<SimInner>,
}

impl SimTransport {
    /// Create an empty transport double.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.inner.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of frames sent so far.
    pub fn sent_count(&self) -> usize {
        self.inner.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Make subsequent sends fail (fault injection).
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl Transport for SimTransport {
    fn send(&self, text: &str) -> Result<(), TransportError> {
        if self.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::new("simulated send failure"));
        }
        self.inner.sent.lock().unwrap_or_else(PoisonError::into_inner).push(text.to_string());
        Ok(())
    }
}
