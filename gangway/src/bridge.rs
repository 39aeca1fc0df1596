//! The bridge context: lifecycle guard, request dispatch, response
//! routing.
//!
//! A frame has exactly one bridge to exactly one host. Rather than
//! ambient global state, the whole session lives in one owned
//! [`Bridge`] value with an enforced state machine, which also makes
//! resetting between host sessions (or test runs) trivial.
//!
//! # Control flow
//!
//! ```text
//! caller ─► dispatch (validate, lifecycle check)
//!        ─► registry (register callback, allocate id)
//!        ─► sink.post(envelope)            … later …
//! host   ─► deliver (decode, filter)
//!        ─► registry (take by id)
//!        ─► callback (fire exactly once, outside the borrow)
//! ```
//!
//! # Single-Threaded
//!
//! Interior mutability via `RefCell` - not thread-safe but efficient
//! for single-threaded event-driven runtimes. Nothing here blocks a
//! thread: "waiting for a response" is a registry entry, not a
//! suspended frame.

use std::cell::RefCell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BridgeError;
use crate::lifecycle::LifecycleState;
use crate::registry::{CorrelationRegistry, ResponseCallback};
use crate::reply::{ReplyFuture, ReplyPromise};
use crate::request::BridgeRequest;
use crate::transport::HostSink;
use crate::wire::{CorrelationId, InboundEnvelope, OutboundEnvelope, ResponsePayload};

/// Wire name of the initialization handshake function.
const INITIALIZE_FUNC: &str = "initialize";

/// Bridge behavior knobs.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Library version reported to the host in the handshake envelope.
    pub version: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

struct Inner {
    state: LifecycleState,
    registry: CorrelationRegistry,
    sink: Option<Rc<dyn HostSink>>,

    /// Correlation id of the in-flight handshake. Tracked outside the
    /// pending table: its reply mutates lifecycle state instead of
    /// firing a caller callback.
    handshake: Option<CorrelationId>,

    /// Frame context reported by the host in the handshake reply.
    frame_context: Option<String>,

    config: BridgeConfig,
}

/// One frame↔host session.
pub struct Bridge {
    inner: RefCell<Inner>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// Create an uninitialized bridge with default configuration.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Create an uninitialized bridge with explicit configuration.
    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            inner: RefCell::new(Inner {
                state: LifecycleState::Uninitialized,
                registry: CorrelationRegistry::new(),
                sink: None,
                handshake: None,
                frame_context: None,
                config,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state
    }

    /// Whether the host has acknowledged the handshake.
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Frame context reported by the host, once `Ready`.
    pub fn frame_context(&self) -> Option<String> {
        self.inner.borrow().frame_context.clone()
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().registry.len()
    }

    /// Begin the initialization handshake with the host.
    ///
    /// Posts an `initialize` envelope carrying the library version and
    /// moves to `Initializing`; the host's reply to that envelope
    /// completes the transition to `Ready`. Calling this while already
    /// `Initializing` or `Ready` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SendFailed`] if the sink rejects the
    /// handshake envelope; the bridge rolls back to `Uninitialized`.
    pub fn initialize(&self, sink: Rc<dyn HostSink>) -> Result<(), BridgeError> {
        let envelope = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != LifecycleState::Uninitialized {
                return Ok(());
            }
            inner.state = LifecycleState::Initializing;
            inner.sink = Some(Rc::clone(&sink));

            let id = inner.registry.allocate();
            inner.handshake = Some(id);
            OutboundEnvelope {
                id,
                func: INITIALIZE_FUNC.to_string(),
                args: vec![Value::String(inner.config.version.clone())],
            }
        };

        // The sink is embedder code; post outside the borrow so a
        // synchronously-delivered reply can re-enter the bridge.
        if let Err(err) = sink.post(&envelope) {
            let mut inner = self.inner.borrow_mut();
            inner.state = LifecycleState::Uninitialized;
            inner.sink = None;
            inner.handshake = None;
            return Err(BridgeError::SendFailed {
                message: err.to_string(),
            });
        }

        tracing::debug!(id = %envelope.id, "initialization handshake posted");
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Every still-pending call is abandoned without its callback being
    /// invoked, the sink is dropped, and the bridge returns to
    /// `Uninitialized`. Safe to call in any state; a later
    /// [`initialize`](Bridge::initialize) starts a fresh session.
    pub fn uninitialize(&self) {
        let (previous, abandoned) = {
            let mut inner = self.inner.borrow_mut();
            let previous = inner.state;
            let abandoned = inner.registry.clear();
            inner.state = LifecycleState::Uninitialized;
            inner.sink = None;
            inner.handshake = None;
            inner.frame_context = None;
            (previous, abandoned)
        };

        tracing::debug!(
            from = %previous,
            abandoned = abandoned.len(),
            "bridge torn down"
        );
        // Abandoned callbacks are dropped here, outside the borrow:
        // a ReplyPromise destructor resolves its future as Abandoned.
        drop(abandoned);
    }

    /// Lifecycle check performed before any send.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotInitialized`] while the state is not
    /// `Ready`.
    pub fn ensure_ready(&self) -> Result<(), BridgeError> {
        if self.inner.borrow().state.is_ready() {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }

    /// Dispatch a capability request with a response callback.
    ///
    /// Validation order matters: a missing callback is reported first,
    /// so misuse is diagnosed identically on an uninitialized bridge;
    /// then the lifecycle check; then the callback is registered and
    /// the envelope posted. Either the envelope reaches the sink or the
    /// caller observes the failure synchronously; there are no retries.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::CallbackRequired`] when `callback` is `None`
    /// - [`BridgeError::NotInitialized`] when the bridge is not `Ready`
    /// - [`BridgeError::SendFailed`] when the sink rejects the envelope
    ///   (the registration is rolled back; nothing leaks)
    pub fn dispatch(
        &self,
        request: BridgeRequest,
        callback: Option<ResponseCallback>,
    ) -> Result<(), BridgeError> {
        let callback = callback.ok_or_else(|| BridgeError::CallbackRequired {
            capability: request.capability_name().to_owned(),
        })?;
        self.ensure_ready()?;

        let (sink, envelope) = {
            let mut inner = self.inner.borrow_mut();
            let sink = match inner.sink.clone() {
                Some(sink) => sink,
                // Ready implies an attached sink; guard anyway.
                None => return Err(BridgeError::NotInitialized),
            };
            let id = inner.registry.register(request.func(), callback);
            (sink, request.into_envelope(id))
        };

        if let Err(err) = sink.post(&envelope) {
            // Roll the registration back so the registry does not keep
            // an entry for an envelope that never left.
            let stale = self.inner.borrow_mut().registry.take(envelope.id);
            drop(stale);
            return Err(BridgeError::SendFailed {
                message: err.to_string(),
            });
        }
        Ok(())
    }

    /// Dispatch a capability request and get a typed handle for the
    /// response.
    ///
    /// The returned future resolves exactly once: with the host's
    /// decoded answer, or with
    /// [`ReplyError::Abandoned`](crate::reply::ReplyError::Abandoned)
    /// if the bridge is torn down first.
    ///
    /// # Errors
    ///
    /// Same synchronous failures as [`dispatch`](Bridge::dispatch),
    /// except that a callback is always supplied internally.
    pub fn request<T>(&self, request: BridgeRequest) -> Result<ReplyFuture<T>, BridgeError>
    where
        T: DeserializeOwned + 'static,
    {
        let (promise, future) = ReplyPromise::<T>::pair();
        self.dispatch(
            request,
            Some(Box::new(move |payload| promise.complete(payload))),
        )?;
        Ok(future)
    }

    /// Route one raw event from the shared inbound channel.
    ///
    /// This is total: events that are not envelopes, envelopes whose
    /// payload matches no known response form, and ids with no pending
    /// call are all dropped silently. The channel legitimately carries
    /// traffic that is not ours, and a duplicate or late response must
    /// never fault the frame.
    pub fn deliver(&self, event: &Value) {
        let envelope = match InboundEnvelope::from_event(event) {
            Some(envelope) => envelope,
            None => {
                tracing::trace!("non-protocol event dropped");
                return;
            }
        };

        if self.try_complete_handshake(&envelope) {
            return;
        }

        let payload = match ResponsePayload::from_args(&envelope.args) {
            Some(payload) => payload,
            None => {
                tracing::trace!(id = %envelope.id, "malformed response payload dropped");
                return;
            }
        };

        // Take first, invoke after: the callback may re-enter the
        // bridge (dispatch a follow-up, even uninitialize).
        let call = self.inner.borrow_mut().registry.take(envelope.id);
        match call {
            Some(call) => call.complete(payload),
            None => tracing::trace!(id = %envelope.id, "unmatched response dropped"),
        }
    }

    /// Handle a reply to the in-flight handshake, if this is one.
    fn try_complete_handshake(&self, envelope: &InboundEnvelope) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.handshake != Some(envelope.id) {
            return false;
        }
        inner.handshake = None;
        inner.state = LifecycleState::Ready;
        inner.frame_context = envelope
            .args
            .first()
            .and_then(|value| value.as_str().map(str::to_owned));
        tracing::debug!(context = ?inner.frame_context, "bridge ready");
        true
    }
}
