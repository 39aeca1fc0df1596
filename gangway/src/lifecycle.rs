//! Bridge lifecycle states.
//!
//! A frame has exactly one bridge to exactly one host, and that bridge
//! must not carry traffic before the host has acknowledged it. The
//! state machine is deliberately small:
//!
//! ```text
//! Uninitialized ──initialize──► Initializing ──handshake reply──► Ready
//!       ▲                                                           │
//!       └───────────────────── uninitialize ────────────────────────┘
//! ```
//!
//! Only the bridge's `initialize`/`uninitialize` operations and the
//! handshake reply mutate the state; every other component reads it.

/// Lifecycle of a bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// No host attached. Every dispatch is rejected.
    #[default]
    Uninitialized,

    /// The handshake envelope has been posted but the host has not yet
    /// answered it. Dispatch is still rejected.
    Initializing,

    /// The host acknowledged the handshake. Requests may flow.
    Ready,
}

impl LifecycleState {
    /// Whether outward-facing operations are allowed.
    pub fn is_ready(self) -> bool {
        matches!(self, LifecycleState::Ready)
    }

    /// Short name for logging.
    pub fn name(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
