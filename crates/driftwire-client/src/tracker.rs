//! Pending operation tracker.
//!
//! The single in-flight-operation ledger. At most one operation is
//! awaited at a time; starting a new wait supersedes an old, unmatched
//! one. This mirrors the one-request-at-a-time usage of a single-caller
//! front end and is a documented limitation, not a general-purpose
//! multiplexer (see the crate docs for the recommended generalization).
//!
//! All pending state lives behind one mutex paired with one condvar, the
//! monitor shared by the caller context and the transport delivery
//! context. Every mutation that could satisfy a waiter notifies the
//! condvar inside the same critical section, so no waiter can miss a
//! satisfying transition.

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::error::ClientError;

/// Kind of request an operation id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Remote method invocation. Satisfied once both the result and the
    /// data-ready acknowledgment have arrived, in either order.
    Method,
    /// Dataset subscription. Satisfied by a single data-ready or
    /// rejection acknowledgment.
    Subscription,
}

/// How a wait ended once the tracker released it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every required acknowledgment arrived.
    Completed,

    /// The server rejected the request (`nosub`). Terminal for the wait.
    Rejected,

    /// The wait was released without a result: a protocol error reset
    /// the pending state, a newer request superseded it, or nothing was
    /// pending to begin with.
    Abandoned,
}

/// The single pending operation.
#[derive(Debug)]
struct Pending {
    id: String,
    kind: OperationKind,
    result_acked: bool,
    data_acked: bool,
    rejected: bool,
}

impl Pending {
    fn satisfied(&self) -> bool {
        match self.kind {
            OperationKind::Method => self.result_acked && self.data_acked,
            OperationKind::Subscription => self.data_acked,
        }
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    pending: Option<Pending>,
    closed: bool,
}

/// Monitor over the single pending operation.
///
/// Mutated by the dispatcher on the delivery context, waited on by the
/// facade on the caller context.
#[derive(Debug, Default)]
pub struct PendingTracker {
    state: Mutex<TrackerState>,
    satisfied: Condvar,
}

impl PendingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically record a fresh pending operation, discarding any
    /// previous state. Wakes waiters of a superseded operation so they
    /// observe an abandoned wait instead of hanging.
    pub fn begin(&self, id: &str, kind: OperationKind) {
        let mut state = self.lock();
        if let Some(prev) = state.pending.take() {
            tracing::debug!(old = %prev.id, new = %id, "superseding unmatched pending operation");
        }
        state.pending = Some(Pending {
            id: id.to_string(),
            kind,
            result_acked: false,
            data_acked: false,
            rejected: false,
        });
        self.satisfied.notify_all();
    }

    /// Record the method result acknowledgment for `id`.
    ///
    /// Returns whether `id` matched the pending operation; a mismatch is
    /// a no-op, guarding against late or out-of-order server replies.
    pub fn mark_result_acked(&self, id: &str) -> bool {
        let mut state = self.lock();
        match state.pending.as_mut() {
            Some(pending) if pending.id == id => {
                pending.result_acked = true;
                self.satisfied.notify_all();
                true
            },
            _ => false,
        }
    }

    /// Record the data-ready acknowledgment when the pending id appears
    /// in `ids` (the `subs` / `methods` list of a `ready` / `updated`
    /// message). Returns whether the pending id was listed.
    pub fn mark_data_acked_in(&self, ids: &[String]) -> bool {
        let mut state = self.lock();
        match state.pending.as_mut() {
            Some(pending) if ids.contains(&pending.id) => {
                pending.data_acked = true;
                self.satisfied.notify_all();
                true
            },
            _ => false,
        }
    }

    /// Record a subscription rejection for `id`: data-acks the pending
    /// operation and flags it so the waiter observes
    /// [`WaitOutcome::Rejected`]. Returns whether `id` matched.
    pub fn mark_rejected(&self, id: &str) -> bool {
        let mut state = self.lock();
        match state.pending.as_mut() {
            Some(pending) if pending.id == id => {
                pending.data_acked = true;
                pending.rejected = true;
                self.satisfied.notify_all();
                true
            },
            _ => false,
        }
    }

    /// Whether the current pending operation has every acknowledgment it
    /// needs. False when nothing is pending.
    pub fn is_satisfied(&self) -> bool {
        self.lock().pending.as_ref().is_some_and(Pending::satisfied)
    }

    /// Clear pending state unconditionally (protocol error path). Any
    /// waiter is released and observes [`WaitOutcome::Abandoned`].
    pub fn reset(&self) {
        let mut state = self.lock();
        state.pending = None;
        self.satisfied.notify_all();
    }

    /// Mark the transport closed. All waiters are released and fail with
    /// [`ClientError::ConnectionClosed`], as do subsequent waits.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.satisfied.notify_all();
    }

    /// Whether the transport has closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Block the calling context until the operation `id` is satisfied,
    /// abandoned, or the transport closes.
    ///
    /// Standard monitor wait: the lock is released while suspended and
    /// the predicate is re-checked after every wake, so spurious wakes
    /// are harmless. On satisfaction the pending slot is cleared and the
    /// outcome distinguishes completion from rejection. Returns
    /// immediately with [`WaitOutcome::Abandoned`] when nothing matching
    /// is pending (defensive).
    ///
    /// # Errors
    ///
    /// [`ClientError::ConnectionClosed`] when the transport closed before
    /// or during the wait; [`ClientError::TimedOut`] when `timeout`
    /// elapsed first.
    pub fn wait_until_satisfied(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome, ClientError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        loop {
            if state.closed {
                return Err(ClientError::ConnectionClosed);
            }

            match state.pending.as_ref() {
                Some(pending) if pending.id == id => {
                    if pending.satisfied() {
                        let rejected = pending.rejected;
                        state.pending = None;
                        return Ok(if rejected {
                            WaitOutcome::Rejected
                        } else {
                            WaitOutcome::Completed
                        });
                    }
                },
                // Reset, superseded, or never begun: nothing will ever
                // satisfy this id.
                _ => return Ok(WaitOutcome::Abandoned),
            }

            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(ClientError::TimedOut);
                    }
                    self.satisfied
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                },
                None => self.satisfied.wait(state).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // A poisoned lock only means another thread panicked mid-update;
        // the state itself stays structurally valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;

    const SHORT: Option<Duration> = Some(Duration::from_millis(100));
    const LONG: Option<Duration> = Some(Duration::from_secs(5));

    #[test]
    fn method_requires_both_acknowledgments() {
        let tracker = Arc::new(PendingTracker::new());
        tracker.begin("1", OperationKind::Method);

        assert!(tracker.mark_result_acked("1"));
        assert!(!tracker.is_satisfied());

        assert!(tracker.mark_data_acked_in(&["1".to_string()]));
        assert!(tracker.is_satisfied());

        let outcome = tracker.wait_until_satisfied("1", SHORT).unwrap();
        assert_eq!(outcome, WaitOutcome::Completed);
    }

    #[test]
    fn subscription_requires_only_data_acknowledgment() {
        let tracker = PendingTracker::new();
        tracker.begin("2", OperationKind::Subscription);

        assert!(tracker.mark_data_acked_in(&["2".to_string()]));

        let outcome = tracker.wait_until_satisfied("2", SHORT).unwrap();
        assert_eq!(outcome, WaitOutcome::Completed);
    }

    #[test]
    fn wake_arrives_from_another_thread() {
        let tracker = Arc::new(PendingTracker::new());
        tracker.begin("7", OperationKind::Method);

        let delivery = Arc::clone(&tracker);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            delivery.mark_data_acked_in(&["7".to_string()]);
            thread::sleep(Duration::from_millis(20));
            delivery.mark_result_acked("7");
        });

        let outcome = tracker.wait_until_satisfied("7", LONG).unwrap();
        assert_eq!(outcome, WaitOutcome::Completed);
        handle.join().unwrap();
    }

    #[test]
    fn mismatched_ids_are_ignored() {
        let tracker = PendingTracker::new();
        tracker.begin("3", OperationKind::Method);

        assert!(!tracker.mark_result_acked("99"));
        assert!(!tracker.mark_data_acked_in(&["98".to_string(), "99".to_string()]));
        assert!(!tracker.mark_rejected("99"));
        assert!(!tracker.is_satisfied());

        assert!(matches!(
            tracker.wait_until_satisfied("3", SHORT),
            Err(ClientError::TimedOut)
        ));
    }

    #[test]
    fn reset_releases_waiter_as_abandoned() {
        let tracker = Arc::new(PendingTracker::new());
        tracker.begin("4", OperationKind::Method);

        let delivery = Arc::clone(&tracker);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            delivery.reset();
        });

        let outcome = tracker.wait_until_satisfied("4", LONG).unwrap();
        assert_eq!(outcome, WaitOutcome::Abandoned);
        handle.join().unwrap();
    }

    #[test]
    fn close_releases_waiter_with_error() {
        let tracker = Arc::new(PendingTracker::new());
        tracker.begin("5", OperationKind::Subscription);

        let delivery = Arc::clone(&tracker);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            delivery.close();
        });

        assert!(matches!(
            tracker.wait_until_satisfied("5", LONG),
            Err(ClientError::ConnectionClosed)
        ));
        handle.join().unwrap();
    }

    #[test]
    fn wait_after_close_fails_immediately() {
        let tracker = PendingTracker::new();
        tracker.close();
        tracker.begin("6", OperationKind::Method);

        assert!(matches!(
            tracker.wait_until_satisfied("6", None),
            Err(ClientError::ConnectionClosed)
        ));
    }

    #[test]
    fn wait_with_nothing_pending_returns_immediately() {
        let tracker = PendingTracker::new();
        let outcome = tracker.wait_until_satisfied("1", None).unwrap();
        assert_eq!(outcome, WaitOutcome::Abandoned);
    }

    #[test]
    fn new_begin_supersedes_unmatched_wait() {
        let tracker = PendingTracker::new();
        tracker.begin("8", OperationKind::Method);
        tracker.begin("9", OperationKind::Subscription);

        // The old id can no longer be satisfied.
        assert!(!tracker.mark_result_acked("8"));
        let outcome = tracker.wait_until_satisfied("8", SHORT).unwrap();
        assert_eq!(outcome, WaitOutcome::Abandoned);

        // The new one proceeds normally.
        assert!(tracker.mark_data_acked_in(&["9".to_string()]));
        let outcome = tracker.wait_until_satisfied("9", SHORT).unwrap();
        assert_eq!(outcome, WaitOutcome::Completed);
    }

    #[test]
    fn rejection_is_distinguishable_from_completion() {
        let tracker = PendingTracker::new();
        tracker.begin("10", OperationKind::Subscription);

        assert!(tracker.mark_rejected("10"));
        let outcome = tracker.wait_until_satisfied("10", SHORT).unwrap();
        assert_eq!(outcome, WaitOutcome::Rejected);
    }

    proptest::proptest! {
        /// No sequence of acknowledgments for other ids can satisfy the
        /// pending operation or flip any of its flags.
        #[test]
        fn prop_foreign_acknowledgments_never_satisfy(
            ops in proptest::collection::vec((0u8..3, "[0-9]{1,4}"), 0..40)
        ) {
            let tracker = PendingTracker::new();
            tracker.begin("op", OperationKind::Method);

            for (op, id) in ops {
                let matched = match op {
                    0 => tracker.mark_result_acked(&id),
                    1 => tracker.mark_data_acked_in(std::slice::from_ref(&id)),
                    _ => tracker.mark_rejected(&id),
                };
                proptest::prop_assert!(!matched);
            }

            proptest::prop_assert!(!tracker.is_satisfied());
        }
    }

    #[test]
    fn satisfied_wait_clears_pending_slot() {
        let tracker = PendingTracker::new();
        tracker.begin("11", OperationKind::Subscription);
        tracker.mark_data_acked_in(&["11".to_string()]);

        tracker.wait_until_satisfied("11", SHORT).unwrap();

        // A second wait on the same id finds nothing pending.
        let outcome = tracker.wait_until_satisfied("11", SHORT).unwrap();
        assert_eq!(outcome, WaitOutcome::Abandoned);
    }
}
