//! Codec error types.

/// Errors produced while converting messages to or from wire text.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Inbound text was not valid JSON, or had no usable `msg` tag.
    ///
    /// Reported to the caller of decode; the delivery context logs and
    /// drops the message without touching any protocol state.
    #[error("malformed wire message: {0}")]
    Format(#[source] serde_json::Error),

    /// An outbound message could not be rendered as JSON text.
    #[error("failed to encode wire message: {0}")]
    Encode(#[source] serde_json::Error),
}
