//! # wallpanel
//!
//! Control logic for a living-room wall panel: eight push buttons, an RGB
//! indicator LED and two servos that flip the room's light switches.
//!
//! ## Features
//!
//! - **Button classification**: multi-button presses, long presses, modifier
//!   buttons and cycling modes, one semantic event per press session
//! - **Indicator fades**: linear, period-stepped colour fades for a
//!   common-anode LED, with a compact 15-bit remote colour format
//! - **Light switches**: servo actuation with settle/detach timing and
//!   mutual exclusion between the two servos
//! - **Remote control**: MQTT bridge publishing events and accepting light and
//!   indicator commands (`mqtt` feature)
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `buttons` - Session-based button classifier
//! - `sequencer` - Indicator colour fades
//! - `lighting` - Servo light switches and their arbitration
//! - `panel` - Everything wired together, driven by one tick
//! - `hal` - Concrete implementations (mocks, `embedded-hal` adapters)
//!
//! ## Example
//!
//! ```rust
//! use wallpanel::{Config, Panel, PanelEvent};
//! use wallpanel::hal::{MockBus, MockRgb, MockServo};
//!
//! let mut panel = Panel::new(
//!     &Config::default(),
//!     MockRgb::new(),
//!     MockServo::new(),
//!     MockServo::new(),
//!     MockBus::new(),
//! );
//! panel.init(0).unwrap();
//!
//! // Tap the first mode button
//! panel.tick(0x20, 1000).unwrap();
//! panel.tick(0x00, 1050).unwrap();
//!
//! assert!(matches!(panel.bus().events.as_slice(), [PanelEvent::ModeChange(m)] if m.number == 0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Session-based classification of the button vector.
pub mod buttons;
/// Indicator colours and the 15-bit colour codec.
pub mod colour;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Servo-driven light switches.
pub mod lighting;
/// Panel wiring: classifier, indicator and lights behind one tick.
pub mod panel;
/// Linear colour fades for the indicator LED.
pub mod sequencer;
/// Core traits for hardware abstraction and event publishing.
pub mod traits;

/// Shared configuration system for desktop and embedded builds.
pub mod config;

/// Wire formats for events and commands (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Event bus over a blocking MQTT client.
#[cfg(feature = "serde-json-core")]
pub mod bridge;

/// Network services for MQTT (feature-gated).
#[cfg(feature = "mqtt")]
pub mod services;

// Re-exports for convenience
pub use buttons::{
    ButtonClassifier, ButtonEvent, ButtonListener, ButtonPress, Mode, PressSession, Role,
    RoleMasks,
};
pub use colour::Colour;
pub use lighting::{ActuatorTiming, LightActuator, LightChange, LightId, LightPair, ServoAngles};
pub use panel::{Panel, PanelCommand, PanelError, PanelEvent, PanelState};
pub use sequencer::ColorSequencer;
pub use traits::{
    // Hardware
    ButtonInput,
    Clock,
    // Network
    EventBus,
    MqttClient,
    MqttMessage,
    NullBus,
    RgbDriver,
    ServoDriver,
};

// Config re-exports
pub use config::{ButtonConfig, Config, DeviceConfig, IndicatorConfig, LightConfig, MqttConfig};

// Message re-exports (for MQTT APIs)
#[cfg(feature = "serde")]
pub use messages::{parse_command, ModeMessage, ParseError, PressMessage};
