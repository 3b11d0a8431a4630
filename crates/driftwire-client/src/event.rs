//! Observable event surface.
//!
//! The core does not materialize a local mirror of collection data; it
//! reports classified events to an [`EventSink`] and discards them.
//! `tracing` carries a parallel always-on log entry per event, plus the
//! raw wire text at TRACE level.

use serde_json::Value;

/// Collection change reported by the server. Transient: emitted to the
/// sink and discarded, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange {
    /// A document appeared.
    Added {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// Initial field values.
        fields: Option<serde_json::Map<String, Value>>,
    },

    /// A document changed.
    Changed {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// Changed fields with their new values.
        fields: Option<serde_json::Map<String, Value>>,
        /// Fields removed from the document.
        cleared: Option<Vec<String>>,
    },

    /// Documents were removed.
    Removed {
        /// Collection name.
        collection: String,
        /// Ids of the removed documents.
        ids: Vec<String>,
    },
}

/// Classified event, one per handled inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Handshake accepted by the server.
    Connected,

    /// Handshake rejected; retry policy is left to the caller.
    VersionRejected {
        /// Version the server suggests instead.
        suggested: String,
    },

    /// Server-sent protocol error. Any in-flight wait was abandoned.
    ProtocolError {
        /// Reason supplied by the server.
        reason: String,
    },

    /// The pending method returned a value.
    MethodSucceeded {
        /// Method invocation id.
        id: String,
        /// Return value, when the server sent one.
        result: Option<Value>,
    },

    /// The pending method failed server-side.
    MethodFailed {
        /// Method invocation id.
        id: String,
        /// Description of the remote error.
        reason: String,
    },

    /// A collection change event.
    Change(CollectionChange),

    /// The pending subscription delivered its initial data.
    Ready {
        /// Subscription ids the server marked ready.
        subs: Vec<String>,
    },

    /// The pending method's data writes were fully delivered.
    Updated {
        /// Method ids whose writes are delivered.
        methods: Vec<String>,
    },

    /// The pending subscription was rejected by the server.
    SubscriptionDenied {
        /// Subscription id.
        id: String,
        /// Description of the rejection, when the server sent one.
        reason: Option<String>,
    },

    /// The transport closed.
    Closed,
}

/// Observer for classified events.
///
/// Invoked on the transport delivery context; implementations must not
/// block.
pub trait EventSink: Send + Sync {
    /// Called once per classified inbound event.
    fn on_event(&self, event: ClientEvent);
}

/// Sink that discards every event. The `tracing` entries still fire.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: ClientEvent) {}
}
