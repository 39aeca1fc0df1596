//! Error types raised synchronously by bridge entry points.
//!
//! The display strings of [`BridgeError::CallbackRequired`] and
//! [`BridgeError::NotInitialized`] are part of the public contract:
//! callers match against the exact text.

/// Errors a caller can observe synchronously from `dispatch` and the
/// lifecycle entry points.
///
/// Remote failures never appear here; the host reports those through
/// the callback's error slot as a [`HostError`](crate::wire::HostError).
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A capability was invoked without a response callback.
    ///
    /// Reported before the lifecycle check so misuse is diagnosed the
    /// same way on an uninitialized bridge.
    #[error("[{capability}] Callback cannot be null")]
    CallbackRequired {
        /// Human-readable capability name supplied by the shim.
        capability: String,
    },

    /// An operation was attempted while the bridge is not `Ready`.
    #[error("The library has not yet been initialized")]
    NotInitialized,

    /// A request argument could not be serialized into the envelope.
    #[error("serialization failed: {message}")]
    SerializationFailed {
        /// Details about the serialization failure.
        message: String,
    },

    /// The host sink rejected the outgoing envelope.
    #[error("send failed: {message}")]
    SendFailed {
        /// Details about the send failure.
        message: String,
    },
}
