//! Promise/future pair for handle-based requests.
//!
//! `Bridge::request` returns a [`ReplyFuture`] instead of taking a raw
//! callback: the bridge holds the matching [`ReplyPromise`] inside the
//! correlation registry and completes it exactly once when the host
//! answers. If the bridge is torn down first, the promise is dropped
//! without fulfillment and the future resolves with
//! [`ReplyError::Abandoned`].
//!
//! # Single-Threaded
//!
//! Uses `Rc<RefCell<>>` internally - not thread-safe but efficient
//! for single-threaded event-driven runtimes.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use serde::de::DeserializeOwned;

use crate::wire::{HostError, ResponsePayload};

/// Local failure of a handle-based request.
///
/// Distinct from [`HostError`]: the host never reported anything; the
/// request failed on this side of the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The bridge was torn down while the request was still pending.
    Abandoned,

    /// The response arrived but its result slot did not decode as the
    /// expected type.
    Decode {
        /// Human-readable decode failure.
        message: String,
    },
}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyError::Abandoned => write!(f, "bridge torn down before the host answered"),
            ReplyError::Decode { message } => write!(f, "response decode failed: {}", message),
        }
    }
}

impl std::error::Error for ReplyError {}

/// Typed view of a decoded host response.
#[derive(Debug, Clone, PartialEq)]
pub struct HostResponse<T> {
    /// Failure reported by the host, if any.
    pub error: Option<HostError>,
    /// Decoded result, if the host sent one.
    pub result: Option<T>,
}

impl<T> HostResponse<T> {
    /// Collapse the two-slot pair into a `Result`.
    ///
    /// A response carrying both slots (the host should not do this)
    /// resolves in favor of the error.
    pub fn into_result(self) -> Result<Option<T>, HostError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

enum SlotState<T> {
    Pending { waker: Option<Waker> },
    Ready(Result<HostResponse<T>, ReplyError>),
    Taken,
}

struct Shared<T> {
    state: RefCell<SlotState<T>>,
}

impl<T> Shared<T> {
    fn fulfill(&self, outcome: Result<HostResponse<T>, ReplyError>) {
        let waker = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                SlotState::Pending { waker } => {
                    let waker = waker.take();
                    *state = SlotState::Ready(outcome);
                    waker
                }
                // Already fulfilled; keep the first outcome.
                _ => None,
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Completion half held by the bridge.
///
/// Fulfilled with `complete` when the matched response arrives. If
/// dropped without fulfillment (the registry was cleared by teardown),
/// the paired future resolves with [`ReplyError::Abandoned`].
pub struct ReplyPromise<T> {
    shared: Rc<Shared<T>>,
    fulfilled: bool,
}

impl<T> ReplyPromise<T> {
    /// Create a connected promise/future pair.
    pub fn pair() -> (ReplyPromise<T>, ReplyFuture<T>) {
        let shared = Rc::new(Shared {
            state: RefCell::new(SlotState::Pending { waker: None }),
        });
        (
            ReplyPromise {
                shared: Rc::clone(&shared),
                fulfilled: false,
            },
            ReplyFuture { shared },
        )
    }
}

impl<T: DeserializeOwned> ReplyPromise<T> {
    /// Complete the paired future with a decoded response.
    ///
    /// Consumes the promise, preventing double completion. A result
    /// slot that does not decode as `T` resolves the future with
    /// [`ReplyError::Decode`] rather than trusting the payload.
    pub fn complete(mut self, payload: ResponsePayload) {
        self.fulfilled = true;
        let outcome = match payload.result {
            Some(value) => match serde_json::from_value::<T>(value) {
                Ok(result) => Ok(HostResponse {
                    error: payload.error,
                    result: Some(result),
                }),
                Err(e) => Err(ReplyError::Decode {
                    message: e.to_string(),
                }),
            },
            None => Ok(HostResponse {
                error: payload.error,
                result: None,
            }),
        };
        self.shared.fulfill(outcome);
    }
}

impl<T> Drop for ReplyPromise<T> {
    fn drop(&mut self) {
        if !self.fulfilled {
            self.shared.fulfill(Err(ReplyError::Abandoned));
        }
    }
}

/// Future resolving to the host's answer for one request.
pub struct ReplyFuture<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Future for ReplyFuture<T> {
    type Output = Result<HostResponse<T>, ReplyError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.borrow_mut();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(outcome) => Poll::Ready(outcome),
            SlotState::Pending { .. } => {
                *state = SlotState::Pending {
                    waker: Some(cx.waker().clone()),
                };
                Poll::Pending
            }
            SlotState::Taken => Poll::Pending,
        }
    }
}
