//! Protocol message types and their wire representation.
//!
//! # Protocol Flow
//!
//! A session opens with a fire-and-forget `connect` carrying the proposed
//! protocol version and the full support list. The server answers with
//! `connected` (accept) or `failed` (reject, suggesting a version). After
//! that the client issues `method` and `sub` requests, each tagged with a
//! client-assigned id, and matches the asynchronous `result` / `updated` /
//! `ready` / `nosub` acknowledgments back to that id. Collection change
//! events (`added` / `changed` / `removed`) arrive unsolicited for the
//! datasets the client subscribed to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CodecError;

/// Protocol version this client proposes during the handshake.
pub const PROTOCOL_VERSION: &str = "1";

/// Protocol versions this client can speak, in preference order.
pub const SUPPORTED_VERSIONS: &[&str] = &["1"];

/// Outbound request, encoded to JSON wire text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msg", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Session handshake. Has no id and expects no matched reply.
    Connect {
        /// Proposed protocol version.
        version: String,
        /// All versions the client supports, in preference order.
        support: Vec<String>,
    },

    /// Remote method invocation.
    Method {
        /// Method name.
        method: String,
        /// Ordered call arguments; empty when the caller supplied none.
        params: Vec<Value>,
        /// Client-assigned request id, unique for the connection lifetime.
        id: String,
    },

    /// Dataset subscription.
    Sub {
        /// Subscription name.
        name: String,
        /// Ordered subscription arguments; empty when none were supplied.
        params: Vec<Value>,
        /// Client-assigned request id, unique for the connection lifetime.
        id: String,
    },
}

impl ClientMessage {
    /// Build the handshake message from the crate's version constants.
    pub fn connect() -> Self {
        Self::Connect {
            version: PROTOCOL_VERSION.to_string(),
            support: SUPPORTED_VERSIONS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Render this request as wire text.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }
}

/// Inbound event, decoded from JSON wire text and tagged by its `msg`
/// field.
///
/// Fields the protocol marks optional default to `None`; unknown fields
/// are ignored so the decoder tolerates servers newer than this client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "msg", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Handshake accepted.
    Connected,

    /// Handshake rejected; the server suggests a version instead.
    Failed {
        /// Version the server proposes the client retry with.
        version: String,
    },

    /// Protocol-level error. Abandons any in-flight wait.
    Error {
        /// Human-readable reason supplied by the server.
        #[serde(default)]
        reason: String,
    },

    /// Method outcome, carrying either a result or a remote error.
    #[serde(rename = "result")]
    MethodResult {
        /// Id of the method invocation this answers.
        id: String,
        /// Successful return value, when the method succeeded.
        #[serde(default)]
        result: Option<Value>,
        /// Remote error, when the method failed server-side.
        #[serde(default)]
        error: Option<RemoteError>,
    },

    /// A document appeared in a collection.
    Added {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// Initial field values.
        #[serde(default)]
        fields: Option<serde_json::Map<String, Value>>,
    },

    /// A document changed in a collection.
    Changed {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// Fields that changed, with their new values.
        #[serde(default)]
        fields: Option<serde_json::Map<String, Value>>,
        /// Fields that were removed from the document.
        #[serde(default)]
        cleared: Option<Vec<String>>,
    },

    /// Documents left a collection.
    Removed {
        /// Collection name.
        collection: String,
        /// Ids of the removed documents.
        ids: Vec<String>,
    },

    /// The named subscriptions have delivered their initial data.
    Ready {
        /// Ids of subscriptions that are now ready.
        subs: Vec<String>,
    },

    /// The data writes of the named method calls have been delivered.
    Updated {
        /// Ids of method calls whose writes are fully delivered.
        methods: Vec<String>,
    },

    /// A subscription was rejected or stopped by the server.
    Nosub {
        /// Id of the affected subscription.
        id: String,
        /// Remote error explaining the rejection, when the server sent one.
        #[serde(default)]
        error: Option<RemoteError>,
    },

    /// Any `msg` value this client does not recognize. Decoded but ignored.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode one inbound frame of wire text.
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        serde_json::from_str(text).map_err(CodecError::Format)
    }
}

/// Error object a server attaches to `result` and `nosub` messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteError {
    /// Machine-readable error code or value.
    #[serde(default)]
    pub error: Option<Value>,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Extended message, when the server provides one.
    #[serde(default)]
    pub message: Option<String>,
}

impl RemoteError {
    /// Best human-readable description of this error.
    pub fn describe(&self) -> String {
        self.reason
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.error.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "unspecified remote error".to_string())
    }
}
