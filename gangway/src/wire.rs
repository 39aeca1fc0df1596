//! Envelope types exchanged with the host context.
//!
//! Outbound: `{ "id": n, "func": "name", "args": [...] }`
//! Inbound:  `{ "id": n, "args": [...] }`
//!
//! The inbound side is untrusted. The event channel is shared with
//! traffic that has nothing to do with this protocol, so every decoder
//! here is total: anything that does not match the expected shape comes
//! back as `None` and is dropped by the router, never raised.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier pairing one in-flight request with its response.
///
/// Allocated from a monotonic counter and never reused within a process
/// lifetime, so a stale response can never match a newer request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct CorrelationId(
    /// Raw identifier value as it appears on the wire.
    pub u64,
);

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Envelope posted to the host. Immutable once sent.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEnvelope {
    /// Correlation identifier for the eventual response.
    pub id: CorrelationId,
    /// Host function being invoked.
    pub func: String,
    /// Ordered, serialized call arguments.
    pub args: Vec<Value>,
}

/// Envelope received from the host.
///
/// The `id` may reference no pending call, or one already resolved;
/// the router treats both as noise.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    /// Correlation identifier echoed by the host.
    pub id: CorrelationId,
    /// Response arguments, in the two-slot convention.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl InboundEnvelope {
    /// Decode a raw event from the shared channel.
    ///
    /// Returns `None` for events that do not carry this protocol's
    /// response shape.
    pub fn from_event(event: &Value) -> Option<Self> {
        serde_json::from_value(event.clone()).ok()
    }
}

/// Numeric failure code reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(
    /// Raw numeric code as it appears on the wire.
    pub u32,
);

impl ErrorCode {
    /// The capability is not supported on this host.
    pub const NOT_SUPPORTED_ON_PLATFORM: ErrorCode = ErrorCode(100);
    /// Generic failure inside the host while servicing the request.
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode(500);
    /// The user or host denied the required permission.
    pub const PERMISSION_DENIED: ErrorCode = ErrorCode(1000);
    /// A network failure prevented the host from completing the call.
    pub const NETWORK_ERROR: ErrorCode = ErrorCode(2000);
    /// The request arguments were rejected by the host.
    pub const INVALID_ARGUMENTS: ErrorCode = ErrorCode(4000);
    /// The host is too old to understand this request.
    pub const OLD_HOST: ErrorCode = ErrorCode(9000);
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error descriptor surfaced to capability callers on failure.
///
/// This is the entire failure surface: a code plus an optional
/// human-readable message, no stack and no transport detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostError {
    /// Machine-readable failure code.
    pub error_code: ErrorCode,
    /// Optional human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HostError {
    /// Descriptor carrying just a code.
    pub fn from_code(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            message: None,
        }
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "host error {}: {}", self.error_code, message),
            None => write!(f, "host error {}", self.error_code),
        }
    }
}

impl std::error::Error for HostError {}

/// Decoded `(error, result)` pair from a response envelope.
///
/// Exactly one of the two is expected to be `Some` for a typical
/// response; both `None` means "no error, no payload" and is legal
/// where the capability's contract allows it.
#[derive(Debug, Clone, Default)]
pub struct ResponsePayload {
    /// Failure reported by the host, if any.
    pub error: Option<HostError>,
    /// Raw result value, if any.
    pub result: Option<Value>,
}

/// Helper for the combined single-object response form.
#[derive(Deserialize)]
struct CombinedSlots {
    #[serde(default)]
    error: Option<HostError>,
    #[serde(default)]
    result: Option<Value>,
}

impl ResponsePayload {
    /// Decode the two-slot response convention.
    ///
    /// Hosts answer in one of two observed forms:
    ///
    /// - combined: `args[0]` is `{ "error": E|null, "result": R|null }`
    /// - positional: `args[0]` is an error descriptor or null, and
    ///   `args[1]` the result or null
    ///
    /// Returns `None` when the first slot matches neither form; the
    /// router drops such envelopes without touching the registry.
    pub fn from_args(args: &[Value]) -> Option<Self> {
        let first = match args.first() {
            None | Some(Value::Null) => {
                return Some(Self {
                    error: None,
                    result: positional_result(args),
                });
            }
            Some(first) => first,
        };

        match first {
            Value::Object(slots) if slots.contains_key("error") || slots.contains_key("result") => {
                let combined: CombinedSlots = serde_json::from_value(first.clone()).ok()?;
                Some(Self {
                    error: combined.error,
                    result: combined.result,
                })
            }
            Value::Object(_) => {
                let error: HostError = serde_json::from_value(first.clone()).ok()?;
                Some(Self {
                    error: Some(error),
                    result: positional_result(args),
                })
            }
            _ => None,
        }
    }
}

fn positional_result(args: &[Value]) -> Option<Value> {
    args.get(1).filter(|value| !value.is_null()).cloned()
}
