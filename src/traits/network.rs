//! Network abstraction traits for announcing panel events.
//!
//! The panel core never talks to a transport directly. Everything it wants
//! to announce goes through [`EventBus`], a fire-and-forget sink. Boards with a
//! blocking MQTT stack implement [`MqttClient`] and wrap it in
//! [`crate::bridge::MqttEventBus`]; the desktop build uses the `rumqttc`
//! bridge in `services::mqtt` (requires the `mqtt` feature).
//!
//! # Topics
//!
//! ```text
//! livingroom/button/press        - Press event (JSON, includes packed code)
//! livingroom/button/mode         - Mode change event (JSON)
//! livingroom/light_kitchen       - Kitchen light state, retained "0"/"1"
//! livingroom/light_kitchen/set   - Set kitchen light
//! livingroom/light_lounge        - Lounge light state, retained "0"/"1"
//! livingroom/light_lounge/set    - Set lounge light
//! livingroom/lights/toggle       - Toggle both lights
//! livingroom/set_rgbled          - Fade indicator to a 15-bit colour
//! livingroom/set_rgbled_instant  - Snap indicator to a 15-bit colour
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::panel::PanelEvent;

// ============================================================================
// Event Bus
// ============================================================================

/// Best-effort sink for semantic panel events.
///
/// Publishing never reports failure to the caller: there is no delivery
/// confirmation and the panel behaves the same whether anyone listens or not.
/// Implementations should log and drop anything they cannot send.
pub trait EventBus {
    /// Announce an event.
    fn publish(&mut self, event: &PanelEvent);
}

/// An event bus that discards everything.
///
/// Useful when a panel runs without any network connectivity.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&mut self, _event: &PanelEvent) {}
}

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// MQTT client trait for pub/sub messaging.
///
/// Sync-first so it fits blocking embedded stacks; `try_recv` must never
/// block, which lets the tick loop poll for inbound commands.
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error;

    /// Publish a message to a topic.
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}
