//! Inbound message dispatch.
//!
//! Runs on the transport delivery context. Each inbound frame is decoded
//! once into a tagged variant and matched exhaustively; the handlers
//! update the pending tracker, flip session state, and emit classified
//! events. The delivery context never blocks and never panics: decode
//! failures are logged and dropped without touching protocol state.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use driftwire_proto::ServerMessage;

use crate::{
    event::{ClientEvent, CollectionChange, EventSink},
    tracker::PendingTracker,
};

/// Connection-level state shared between the facade and the dispatcher.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    /// True once the server acknowledged the handshake.
    pub(crate) connected: AtomicBool,
    /// Version the server suggested in a `failed` message, kept for the
    /// caller's retry policy. The core never retries on its own.
    pub(crate) suggested_version: Mutex<Option<String>>,
}

impl SessionState {
    pub(crate) fn suggested_version(&self) -> Option<String> {
        self.suggested_version.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Routes decoded inbound messages to their handlers.
pub(crate) struct Dispatcher {
    tracker: Arc<PendingTracker>,
    session: Arc<SessionState>,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub(crate) fn new(
        tracker: Arc<PendingTracker>,
        session: Arc<SessionState>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self { tracker, session, sink }
    }

    /// Handle one raw inbound frame.
    pub(crate) fn handle_text(&self, text: &str) {
        tracing::trace!(raw = %text, "recv");
        match ServerMessage::decode(text) {
            Ok(message) => self.handle(message),
            Err(error) => {
                // Non-fatal: drop the frame, keep the delivery context alive.
                tracing::warn!(%error, "dropping undecodable inbound message");
            },
        }
    }

    /// Handle the transport closing. Releases every blocked wait.
    pub(crate) fn handle_close(&self) {
        tracing::warn!("connection closed");
        self.session.connected.store(false, Ordering::SeqCst);
        self.tracker.close();
        self.sink.on_event(ClientEvent::Closed);
    }

    fn handle(&self, message: ServerMessage) {
        match message {
            ServerMessage::Connected => {
                tracing::info!("connected");
                self.session.connected.store(true, Ordering::SeqCst);
                self.sink.on_event(ClientEvent::Connected);
            },

            ServerMessage::Failed { version } => {
                tracing::warn!(suggested = %version, "server rejected protocol version");
                *self
                    .session
                    .suggested_version
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(version.clone());
                self.sink.on_event(ClientEvent::VersionRejected { suggested: version });
            },

            ServerMessage::Error { reason } => {
                tracing::warn!(%reason, "protocol error, abandoning pending operation");
                self.tracker.reset();
                self.sink.on_event(ClientEvent::ProtocolError { reason });
            },

            ServerMessage::MethodResult { id, result, error } => {
                // Late or mismatched results are silently ignored.
                if self.tracker.mark_result_acked(&id) {
                    if let Some(remote) = error {
                        let reason = remote.describe();
                        tracing::warn!(%id, %reason, "method failed");
                        self.sink.on_event(ClientEvent::MethodFailed { id, reason });
                    } else {
                        tracing::info!(%id, ?result, "method result");
                        self.sink.on_event(ClientEvent::MethodSucceeded { id, result });
                    }
                }
            },

            ServerMessage::Added { collection, id, fields } => {
                tracing::info!(%collection, %id, "added");
                self.sink.on_event(ClientEvent::Change(CollectionChange::Added {
                    collection,
                    id,
                    fields,
                }));
            },

            ServerMessage::Changed { collection, id, fields, cleared } => {
                tracing::info!(%collection, %id, "changed");
                self.sink.on_event(ClientEvent::Change(CollectionChange::Changed {
                    collection,
                    id,
                    fields,
                    cleared,
                }));
            },

            ServerMessage::Removed { collection, ids } => {
                tracing::info!(%collection, count = ids.len(), "removed");
                self.sink.on_event(ClientEvent::Change(CollectionChange::Removed {
                    collection,
                    ids,
                }));
            },

            ServerMessage::Ready { subs } => {
                tracing::info!(?subs, "ready");
                if self.tracker.mark_data_acked_in(&subs) {
                    self.sink.on_event(ClientEvent::Ready { subs });
                }
            },

            ServerMessage::Updated { methods } => {
                tracing::info!(?methods, "updated");
                if self.tracker.mark_data_acked_in(&methods) {
                    self.sink.on_event(ClientEvent::Updated { methods });
                }
            },

            ServerMessage::Nosub { id, error } => {
                let reason = error.map(|remote| remote.describe());
                tracing::warn!(%id, ?reason, "subscription denied");
                if self.tracker.mark_rejected(&id) {
                    self.sink.on_event(ClientEvent::SubscriptionDenied { id, reason });
                }
            },

            ServerMessage::Unknown => {
                tracing::debug!("ignoring unrecognized message kind");
            },
        }
    }
}
