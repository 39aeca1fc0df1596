//! Capability shims.
//!
//! A shim owns zero protocol logic: it names the host function, shapes
//! the arguments, and re-exposes the decoded `(error, result)` pair
//! through a capability-specific response type. The rest is the
//! bridge's job.

use serde_json::Value;

use crate::bridge::Bridge;
use crate::error::BridgeError;
use crate::registry::ResponseCallback;
use crate::reply::ReplyFuture;
use crate::request::BridgeRequest;
use crate::wire::{HostError, ResponsePayload};

const TOGGLE_INCOMING_AUDIO_FUNC: &str = "toggleIncomingAudio";
const TOGGLE_INCOMING_AUDIO_LABEL: &str = "toggle incoming audio";

/// Host answer to [`toggle_incoming_audio`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleAudioResponse {
    /// Failure reported by the host, if any.
    pub error: Option<HostError>,
    /// New mute state, if the host reported one.
    pub result: Option<bool>,
}

/// Callback receiving the host's answer for the audio toggle.
pub type ToggleAudioCallback = Box<dyn FnOnce(ToggleAudioResponse)>;

/// Ask the host to toggle the incoming audio stream on or off.
///
/// The callback fires exactly once with the host's answer; it never
/// fires if the bridge is torn down first.
///
/// # Errors
///
/// - [`BridgeError::CallbackRequired`] when `callback` is `None`,
///   reported as `[toggle incoming audio] Callback cannot be null`
/// - [`BridgeError::NotInitialized`] when the bridge is not `Ready`
pub fn toggle_incoming_audio(
    bridge: &Bridge,
    callback: Option<ToggleAudioCallback>,
) -> Result<(), BridgeError> {
    let callback = callback.map(|callback| -> ResponseCallback {
        Box::new(move |payload: ResponsePayload| {
            callback(ToggleAudioResponse {
                error: payload.error,
                result: payload.result.as_ref().and_then(Value::as_bool),
            })
        })
    });
    bridge.dispatch(toggle_request(), callback)
}

/// Handle-based variant of [`toggle_incoming_audio`].
///
/// # Errors
///
/// Same synchronous failures as [`Bridge::request`].
pub fn toggle_incoming_audio_request(bridge: &Bridge) -> Result<ReplyFuture<bool>, BridgeError> {
    bridge.request(toggle_request())
}

fn toggle_request() -> BridgeRequest {
    BridgeRequest::new(TOGGLE_INCOMING_AUDIO_FUNC).capability(TOGGLE_INCOMING_AUDIO_LABEL)
}
