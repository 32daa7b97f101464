//! Trait definitions for hardware abstraction and event publishing.
//!
//! These traits keep the panel logic free of board and transport details:
//!
//! - `hardware`: clock, button sampling, indicator LED and servo drivers
//! - `network`: the event bus and a sync MQTT client
//!
//! # Hardware Abstraction
//!
//! - [`Clock`]: wrapping millisecond time source
//! - [`ButtonInput`]: sampled button vector
//! - [`RgbDriver`]: PWM duty output for the indicator LED
//! - [`ServoDriver`]: light switch servo
//!
//! # Publishing
//!
//! - [`EventBus`]: fire-and-forget sink for [`crate::PanelEvent`]s
//! - [`MqttClient`]: blocking MQTT client used by [`crate::bridge`]

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
