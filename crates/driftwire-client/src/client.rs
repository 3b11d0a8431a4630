//! Synchronous request facade.
//!
//! The public operations (`call`, `subscribe`) send a request through the
//! transport and block the calling thread until the tracker reports
//! completion for that request's id. Concurrent calls from multiple
//! caller threads are not supported: the tracker holds one pending
//! operation, and a new request supersedes an old unmatched one.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use driftwire_proto::ClientMessage;
use serde_json::Value;

use crate::{
    dispatch::{Dispatcher, SessionState},
    error::ClientError,
    event::{EventSink, NullSink},
    tracker::{OperationKind, PendingTracker, WaitOutcome},
    transport::Transport,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on each synchronous wait. `None` waits forever, which
    /// reintroduces the hang-on-silent-server hazard and should only be
    /// used under an external watchdog.
    pub wait_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { wait_timeout: Some(Duration::from_secs(30)) }
    }
}

/// Outcome of a completed synchronous request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The id assigned to the request. Strictly increasing across the
    /// connection lifetime, never reused.
    pub id: String,
    /// How the wait ended.
    pub outcome: WaitOutcome,
}

/// Protocol client over an abstract transport.
///
/// The transport collaborator calls [`Client::handle_message`] once per
/// inbound frame, in arrival order, on its own delivery context, and
/// [`Client::handle_close`] when the connection drops. The caller
/// context issues [`Client::call`] / [`Client::subscribe`] and blocks.
pub struct Client<T: Transport> {
    transport: T,
    tracker: Arc<PendingTracker>,
    session: Arc<SessionState>,
    dispatcher: Dispatcher,
    next_id: AtomicU64,
    config: ClientConfig,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default (discarding) event sink.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_sink(transport, config, Arc::new(NullSink))
    }

    /// Create a client that reports classified events to `sink`.
    pub fn with_sink(transport: T, config: ClientConfig, sink: Arc<dyn EventSink>) -> Self {
        let tracker = Arc::new(PendingTracker::new());
        let session = Arc::new(SessionState::default());
        let dispatcher = Dispatcher::new(Arc::clone(&tracker), Arc::clone(&session), sink);
        Self { transport, tracker, session, dispatcher, next_id: AtomicU64::new(1), config }
    }

    /// Send the protocol handshake. Fire-and-forget: the handshake has no
    /// id to match, so there is nothing to wait on; the server answers
    /// with `connected` or `failed` asynchronously.
    pub fn connect(&self) -> Result<(), ClientError> {
        let text = ClientMessage::connect().encode()?;
        self.send_text(&text)
    }

    /// Invoke a remote method and block until it fully returns: both the
    /// `result` and the data-ready (`updated`) acknowledgment, in either
    /// arrival order.
    pub fn call(&self, method: &str, params: Vec<Value>) -> Result<Completion, ClientError> {
        let id = self.allocate_id();
        let text = ClientMessage::Method {
            method: method.to_string(),
            params,
            id: id.clone(),
        }
        .encode()?;

        self.request(id, OperationKind::Method, &text)
    }

    /// Subscribe to a remote dataset and block until the server marks it
    /// ready or rejects it.
    pub fn subscribe(&self, name: &str, params: Vec<Value>) -> Result<Completion, ClientError> {
        let id = self.allocate_id();
        let text = ClientMessage::Sub {
            name: name.to_string(),
            params,
            id: id.clone(),
        }
        .encode()?;

        self.request(id, OperationKind::Subscription, &text)
    }

    /// Delivery-context entry point: handle one raw inbound frame.
    pub fn handle_message(&self, text: &str) {
        self.dispatcher.handle_text(text);
    }

    /// Delivery-context entry point: the transport closed. Releases every
    /// blocked wait with [`ClientError::ConnectionClosed`].
    pub fn handle_close(&self) {
        self.dispatcher.handle_close();
    }

    /// Whether the server has acknowledged the handshake.
    pub fn is_connected(&self) -> bool {
        self.session.connected.load(Ordering::SeqCst)
    }

    /// Version the server suggested after rejecting the handshake, for
    /// the caller's retry policy. The core never retries on its own.
    pub fn suggested_version(&self) -> Option<String> {
        self.session.suggested_version()
    }

    fn request(
        &self,
        id: String,
        kind: OperationKind,
        text: &str,
    ) -> Result<Completion, ClientError> {
        // Register before sending so an acknowledgment racing the send
        // cannot slip past an empty tracker.
        self.tracker.begin(&id, kind);

        if let Err(error) = self.send_text(text) {
            self.tracker.reset();
            return Err(error);
        }

        let outcome = self.tracker.wait_until_satisfied(&id, self.config.wait_timeout)?;
        Ok(Completion { id, outcome })
    }

    fn send_text(&self, text: &str) -> Result<(), ClientError> {
        if self.tracker.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }
        tracing::trace!(raw = %text, "send");
        self.transport.send(text)?;
        Ok(())
    }

    /// Ids are a monotonically increasing counter starting at 1, rendered
    /// as strings, unique for the lifetime of the connection.
    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use crate::transport::TransportError;

    use super::*;

    /// Transport that records outbound wire text.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<String>>,
    }

    impl Transport for RecordingTransport {
        fn send(&self, text: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Transport that always fails.
    struct BrokenTransport;

    impl Transport for BrokenTransport {
        fn send(&self, _text: &str) -> Result<(), TransportError> {
            Err(TransportError::new("wire cut"))
        }
    }

    #[test]
    fn ids_are_strictly_increasing_and_never_reused() {
        let client = Client::new(RecordingTransport::default(), ClientConfig::default());

        let ids: Vec<u64> =
            (0..100).map(|_| client.allocate_id().parse().unwrap()).collect();

        assert_eq!(ids[0], 1);
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0], "ids must be strictly increasing: {pair:?}");
        }
    }

    #[test]
    fn connect_sends_version_and_support() {
        let client = Client::new(RecordingTransport::default(), ClientConfig::default());

        client.connect().unwrap();

        let sent = client.transport.sent.lock().unwrap();
        let value: Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(value["msg"], "connect");
        assert_eq!(value["version"], driftwire_proto::PROTOCOL_VERSION);
        assert_eq!(value["support"], json!(["1"]));
    }

    #[test]
    fn send_after_close_is_rejected() {
        let client = Client::new(RecordingTransport::default(), ClientConfig::default());

        client.handle_close();

        assert!(matches!(client.connect(), Err(ClientError::ConnectionClosed)));
        assert!(matches!(
            client.call("vote", vec![json!("x")]),
            Err(ClientError::ConnectionClosed)
        ));
        assert!(client.transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_send_surfaces_and_clears_pending() {
        let client = Client::new(BrokenTransport, ClientConfig::default());

        assert!(matches!(client.call("vote", vec![]), Err(ClientError::Transport(_))));

        // The aborted request leaves nothing pending behind.
        assert_eq!(
            client.tracker.wait_until_satisfied("1", None).unwrap(),
            WaitOutcome::Abandoned
        );
    }

    #[test]
    fn connected_flag_tracks_handshake() {
        let client = Client::new(RecordingTransport::default(), ClientConfig::default());
        assert!(!client.is_connected());

        client.handle_message(r#"{"msg":"connected"}"#);
        assert!(client.is_connected());
    }

    #[test]
    fn suggested_version_is_surfaced_for_caller_policy() {
        let client = Client::new(RecordingTransport::default(), ClientConfig::default());
        assert_eq!(client.suggested_version(), None);

        client.handle_message(r#"{"msg":"failed","version":"2"}"#);
        assert_eq!(client.suggested_version(), Some("2".to_string()));
    }
}
