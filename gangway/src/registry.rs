//! Correlation registry: pending-call table keyed by correlation id.
//!
//! The registry is the single shared mutable resource of the bridge.
//! Execution is single-threaded and event-driven, so no locking is
//! involved; `register`/`resolve`/`clear` each take `&mut self` and are
//! therefore atomic with respect to each other.
//!
//! # Identifier allocation
//!
//! Identifiers come from a monotonic counter and are never reused
//! within a process lifetime, which removes any chance of a stale
//! response matching a newer, unrelated request.

use std::collections::HashMap;

use crate::wire::{CorrelationId, ResponsePayload};

/// Callback invoked with the decoded `(error, result)` pair.
pub type ResponseCallback = Box<dyn FnOnce(ResponsePayload)>;

/// One in-flight request, owned exclusively by the registry from
/// registration until resolution or teardown.
pub struct PendingCall {
    func: String,
    callback: ResponseCallback,
}

impl PendingCall {
    /// Host function this call was dispatched to.
    pub fn func(&self) -> &str {
        &self.func
    }

    /// Fire the callback with the decoded response.
    ///
    /// Consumes the call: a correlation id resolves at most once, ever.
    pub fn complete(self, payload: ResponsePayload) {
        (self.callback)(payload);
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("func", &self.func)
            .finish_non_exhaustive()
    }
}

/// Pending-call table with monotonic identifier allocation.
#[derive(Default)]
pub struct CorrelationRegistry {
    next_id: u64,
    pending: HashMap<CorrelationId, PendingCall>,

    // Counters for metrics and debugging.
    registration_count: u64,
    deregistration_count: u64,
    abandoned_count: u64,
}

impl CorrelationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh identifier without registering a call.
    ///
    /// Used for traffic that is tracked outside the pending table (the
    /// initialization handshake) but must share the same never-reused
    /// id space as ordinary requests.
    pub fn allocate(&mut self) -> CorrelationId {
        let id = CorrelationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Store a pending call and return its fresh identifier.
    pub fn register(&mut self, func: &str, callback: ResponseCallback) -> CorrelationId {
        let id = self.allocate();
        self.pending.insert(
            id,
            PendingCall {
                func: func.to_owned(),
                callback,
            },
        );
        self.registration_count += 1;
        id
    }

    /// Remove the pending call for `id` without invoking it.
    ///
    /// The router uses this split so the callback runs outside the
    /// registry borrow and may re-enter the bridge.
    pub fn take(&mut self, id: CorrelationId) -> Option<PendingCall> {
        let call = self.pending.remove(&id);
        if call.is_some() {
            self.deregistration_count += 1;
        }
        call
    }

    /// Resolve `id`: remove its pending call and fire the callback.
    ///
    /// Returns `false` for an unknown id (already resolved or never
    /// registered). That case is a silent no-op; it must never panic
    /// or invoke the wrong callback.
    pub fn resolve(&mut self, id: CorrelationId, payload: ResponsePayload) -> bool {
        match self.take(id) {
            Some(call) => {
                call.complete(payload);
                true
            }
            None => false,
        }
    }

    /// Remove every pending call without invoking its callback.
    ///
    /// The abandoned calls are returned so the caller can drop them
    /// outside of any shared borrow; a callback's destructor may itself
    /// re-enter bridge state.
    pub fn clear(&mut self) -> Vec<PendingCall> {
        let abandoned: Vec<PendingCall> = self.pending.drain().map(|(_, call)| call).collect();
        self.abandoned_count += abandoned.len() as u64;
        abandoned
    }

    /// Whether `id` has a pending call.
    pub fn contains(&self, id: CorrelationId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of calls currently pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no calls are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total calls registered (for metrics).
    pub fn registration_count(&self) -> u64 {
        self.registration_count
    }

    /// Total calls removed for resolution or rollback (for metrics).
    pub fn deregistration_count(&self) -> u64 {
        self.deregistration_count
    }

    /// Total calls abandoned by teardown (for metrics).
    pub fn abandoned_count(&self) -> u64 {
        self.abandoned_count
    }
}
