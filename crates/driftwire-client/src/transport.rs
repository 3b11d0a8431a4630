//! Transport seam.
//!
//! The connection itself (framing, handshake, reconnection) is an
//! external collaborator. The core depends only on the ability to hand
//! it outbound text; the collaborator in turn drives
//! [`crate::Client::handle_message`] once per inbound frame, in arrival
//! order, on a context distinct from the caller's, and
//! [`crate::Client::handle_close`] when the connection drops.

/// Outbound half of the transport collaborator.
pub trait Transport: Send + Sync {
    /// Hand one frame of UTF-8 JSON text to the transport for delivery.
    fn send(&self, text: &str) -> Result<(), TransportError>;
}

/// Failure to hand an outbound frame to the transport.
#[derive(Debug, thiserror::Error)]
#[error("transport send failed: {reason}")]
pub struct TransportError {
    /// Transport-specific description of the failure.
    pub reason: String,
}

impl TransportError {
    /// Build a transport error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}
