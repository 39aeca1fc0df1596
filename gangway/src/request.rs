//! Builder for outgoing capability requests.
//!
//! A shim names the host function, optionally attaches the
//! human-readable capability label used in misuse errors, and adds
//! serialized arguments:
//!
//! ```rust,ignore
//! let request = BridgeRequest::new("setVolume")
//!     .capability("set volume")
//!     .arg(&0.8)?;
//! bridge.dispatch(request, Some(callback))?;
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;
use crate::wire::{CorrelationId, OutboundEnvelope};

/// An outgoing capability request, before an identifier is assigned.
#[derive(Debug, Clone)]
pub struct BridgeRequest {
    func: String,
    capability: Option<String>,
    args: Vec<Value>,
}

impl BridgeRequest {
    /// Start a request for the given host function.
    pub fn new(func: impl Into<String>) -> Self {
        Self {
            func: func.into(),
            capability: None,
            args: Vec::new(),
        }
    }

    /// Human-readable capability name used in misuse errors.
    ///
    /// Defaults to the wire function name when not set.
    pub fn capability(mut self, name: impl Into<String>) -> Self {
        self.capability = Some(name.into());
        self
    }

    /// Append a serialized argument.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SerializationFailed`] if the value cannot
    /// be represented in the envelope.
    pub fn arg<T: Serialize>(mut self, value: &T) -> Result<Self, BridgeError> {
        let value = serde_json::to_value(value).map_err(|e| BridgeError::SerializationFailed {
            message: e.to_string(),
        })?;
        self.args.push(value);
        Ok(self)
    }

    /// Append an already-serialized argument.
    pub fn raw_arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Wire function name.
    pub fn func(&self) -> &str {
        &self.func
    }

    /// Label reported in `[<capability>] Callback cannot be null`.
    pub fn capability_name(&self) -> &str {
        self.capability.as_deref().unwrap_or(&self.func)
    }

    /// Seal the request into an immutable envelope.
    pub(crate) fn into_envelope(self, id: CorrelationId) -> OutboundEnvelope {
        OutboundEnvelope {
            id,
            func: self.func,
            args: self.args,
        }
    }
}
