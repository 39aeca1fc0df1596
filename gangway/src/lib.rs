//! # Gangway
//!
//! Request/response bridge between an embedded frame and its host
//! application.
//!
//! A sandboxed frame cannot touch host capabilities directly; it posts
//! structured envelopes across a shared event channel and waits for the
//! host's asynchronous, possibly out-of-order answers. This crate is
//! the correlation and dispatch engine that makes those answers land in
//! the right place exactly once:
//!
//! - **Transport seam**: [`HostSink`] for the outbound direction; the
//!   embedder pushes raw inbound events into [`Bridge::deliver`]
//! - **Lifecycle guard**: [`LifecycleState`] machine with an explicit
//!   host handshake; nothing is sent before `Ready`, and teardown
//!   abandons everything in flight
//! - **Correlation registry**: [`CorrelationRegistry`] pairs monotonic,
//!   never-reused identifiers with pending callbacks
//! - **Request dispatch**: [`BridgeRequest`] builder plus
//!   [`Bridge::dispatch`] (callback style) and [`Bridge::request`]
//!   (typed [`ReplyFuture`] handle)
//! - **Response routing**: shape-validated decoding of untrusted host
//!   events; anything that is not ours is dropped, never raised
//!
//! Execution is single-threaded and event-driven; nothing here blocks
//! a thread or takes a lock.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Bridge context: lifecycle, dispatch and routing.
pub mod bridge;

/// Capability shims built on the dispatch primitive.
pub mod capability;

/// Synchronous error types.
pub mod error;

/// In-process host double for tests.
pub mod harness;

/// Lifecycle state machine.
pub mod lifecycle;

/// Pending-call table keyed by correlation id.
pub mod registry;

/// Promise/future pair for handle-based requests.
pub mod reply;

/// Builder for outgoing requests.
pub mod request;

/// Host transport contract.
pub mod transport;

/// Envelope and descriptor wire types.
pub mod wire;

pub use bridge::{Bridge, BridgeConfig};
pub use capability::{
    toggle_incoming_audio, toggle_incoming_audio_request, ToggleAudioCallback,
    ToggleAudioResponse,
};
pub use error::BridgeError;
pub use harness::FakeHost;
pub use lifecycle::LifecycleState;
pub use registry::{CorrelationRegistry, PendingCall, ResponseCallback};
pub use reply::{HostResponse, ReplyError, ReplyFuture, ReplyPromise};
pub use request::BridgeRequest;
pub use transport::{HostSink, SinkError};
pub use wire::{
    CorrelationId, ErrorCode, HostError, InboundEnvelope, OutboundEnvelope, ResponsePayload,
};
