//! Client error types.

use driftwire_proto::CodecError;

use crate::transport::TransportError;

/// Errors surfaced to callers of the synchronous request facade.
///
/// Format-level failures on the receive path are handled locally (logged
/// and dropped) and never appear here; only operation-level outcomes
/// reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport closed while a wait was in progress, or an operation
    /// was attempted after closure. No further sends are accepted.
    #[error("connection closed")]
    ConnectionClosed,

    /// The caller-configured timeout elapsed before the server satisfied
    /// the pending operation.
    #[error("timed out waiting for server acknowledgment")]
    TimedOut,

    /// An outbound request could not be rendered as wire text.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The transport rejected an outbound send.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
