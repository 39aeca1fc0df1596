//! In-process host double for exercising a bridge.
//!
//! `FakeHost` plays the host side of the channel: it captures every
//! posted envelope, lets a test pick one out by function name, and
//! pushes raw reply events back through
//! [`Bridge::deliver`](crate::bridge::Bridge::deliver), the same entry
//! point a real embedder wires to its message event stream.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};

use crate::bridge::Bridge;
use crate::transport::{HostSink, SinkError};
use crate::wire::{CorrelationId, OutboundEnvelope};

/// Scripted host on the far side of the channel.
#[derive(Default)]
pub struct FakeHost {
    posted: RefCell<Vec<OutboundEnvelope>>,
    closed: Cell<bool>,
}

impl FakeHost {
    /// New host accepting posts.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Number of envelopes posted so far.
    pub fn posted_count(&self) -> usize {
        self.posted.borrow().len()
    }

    /// First posted envelope invoking `func`, if any.
    pub fn find_by_func(&self, func: &str) -> Option<OutboundEnvelope> {
        self.posted
            .borrow()
            .iter()
            .find(|envelope| envelope.func == func)
            .cloned()
    }

    /// All posted envelopes, in post order.
    pub fn posted(&self) -> Vec<OutboundEnvelope> {
        self.posted.borrow().clone()
    }

    /// Make every subsequent post fail, as a detached host window does.
    pub fn close(&self) {
        self.closed.set(true);
    }

    /// Deliver a reply event `{ id, args }` to the bridge.
    pub fn respond(&self, bridge: &Bridge, id: CorrelationId, args: Vec<Value>) {
        bridge.deliver(&json!({ "id": id, "args": args }));
    }

    /// Answer the pending initialization handshake with a frame
    /// context, completing the transition to `Ready`.
    ///
    /// Returns `false` if no handshake envelope was posted.
    pub fn complete_initialize(&self, bridge: &Bridge, context: &str) -> bool {
        match self.find_by_func("initialize") {
            Some(handshake) => {
                self.respond(bridge, handshake.id, vec![json!(context)]);
                true
            }
            None => false,
        }
    }
}

impl HostSink for FakeHost {
    fn post(&self, envelope: &OutboundEnvelope) -> Result<(), SinkError> {
        if self.closed.get() {
            return Err(SinkError::new("host window detached"));
        }
        self.posted.borrow_mut().push(envelope.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_host_captures_posts() {
        let host = FakeHost::new();
        let envelope = OutboundEnvelope {
            id: CorrelationId(1),
            func: "ping".to_string(),
            args: vec![],
        };

        host.post(&envelope).expect("post should succeed");
        assert_eq!(host.posted_count(), 1);
        assert!(host.find_by_func("ping").is_some());
        assert!(host.find_by_func("pong").is_none());
    }

    #[test]
    fn test_closed_host_rejects_posts() {
        let host = FakeHost::new();
        host.close();

        let envelope = OutboundEnvelope {
            id: CorrelationId(1),
            func: "ping".to_string(),
            args: vec![],
        };
        assert!(host.post(&envelope).is_err());
        assert_eq!(host.posted_count(), 0);
    }
}
