//! Host transport contract.
//!
//! The bridge owns no messaging primitive of its own. An embedder
//! supplies the outbound half as a [`HostSink`] and feeds every raw
//! event from the shared inbound channel to
//! [`Bridge::deliver`](crate::bridge::Bridge::deliver), including
//! events that have nothing to do with this protocol; the router
//! filters by shape and id.
//!
//! Delivery is fire-and-forget within a single trust boundary:
//! in-order per sender, no acknowledgement, no retry.

use crate::wire::OutboundEnvelope;

/// Failure to hand an envelope to the host context.
#[derive(Debug, thiserror::Error)]
#[error("host sink rejected envelope: {message}")]
pub struct SinkError {
    /// Description of the failure.
    pub message: String,
}

impl SinkError {
    /// Build an error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound half of the cross-context channel.
pub trait HostSink {
    /// Hand one envelope to the host context.
    ///
    /// Either the envelope is enqueued or the caller observes the
    /// failure synchronously; there is nothing in between.
    fn post(&self, envelope: &OutboundEnvelope) -> Result<(), SinkError>;
}
