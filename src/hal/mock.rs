//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without a panel attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockClock`] | [`Clock`] | Controllable, wrapping time source |
//! | [`MockButtons`] | [`ButtonInput`] | Scripted button vector |
//! | [`MockRgb`] | [`RgbDriver`] | Records the last duty triple |
//! | [`MockServo`] | [`ServoDriver`] | Tracks angle, attachment and writes |
//! | [`MockBus`] | [`EventBus`] | Records published panel events |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//! | [`MockPin`] | `embedded_hal::digital::InputPin` | Scripted input level |
//! | [`MockPwm`] | `embedded_hal::pwm::SetDutyCycle` | Records the raw duty |
//!
//! # Example
//!
//! ```rust
//! use wallpanel::{Config, Panel, PanelEvent};
//! use wallpanel::hal::{MockBus, MockRgb, MockServo};
//!
//! let mut panel = Panel::new(&Config::default(), MockRgb::new(), MockServo::new(), MockServo::new(), MockBus::new());
//! panel.init(0).unwrap();
//!
//! // Button 0 tapped
//! panel.tick(0x01, 0).unwrap();
//! panel.tick(0x00, 100).unwrap();
//!
//! assert!(matches!(panel.bus().events.last(), Some(PanelEvent::ButtonPress { .. })));
//! ```
//!
//! [`Clock`]: crate::traits::Clock
//! [`ButtonInput`]: crate::traits::ButtonInput
//! [`RgbDriver`]: crate::traits::RgbDriver
//! [`ServoDriver`]: crate::traits::ServoDriver
//! [`EventBus`]: crate::traits::EventBus
//! [`MqttClient`]: crate::traits::MqttClient

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::Infallible;

use crate::panel::PanelEvent;
use crate::traits::{
    ButtonInput, Clock, EventBus, MqttClient, MqttMessage, RgbDriver, ServoDriver,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
/// Like a hardware millisecond counter it wraps at `u32::MAX`.
///
/// # Example
///
/// ```rust
/// use wallpanel::hal::MockClock;
/// use wallpanel::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(u32::MAX);
/// clock.advance(2);
/// assert_eq!(clock.now_ms(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u32,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u32) {
        self.current_ms = ms;
    }

    /// Advances the clock, wrapping on overflow.
    pub fn advance(&mut self, ms: u32) {
        self.current_ms = self.current_ms.wrapping_add(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        self.current_ms
    }
}

/// Mock button bank.
///
/// The vector returned by `read_mask` is whatever was last set.
///
/// # Example
///
/// ```rust
/// use wallpanel::hal::MockButtons;
/// use wallpanel::traits::ButtonInput;
///
/// let mut buttons = MockButtons::new();
/// buttons.press(0x01);
/// buttons.press(0x40);
/// assert_eq!(buttons.read_mask(), 0x41);
///
/// buttons.release(0x01);
/// assert_eq!(buttons.read_mask(), 0x40);
/// ```
#[derive(Debug, Default)]
pub struct MockButtons {
    /// Buttons currently held.
    pub mask: u8,
    /// Number of times `read_mask` was called.
    pub reads: usize,
    /// Wall switch level; `None` for a panel without one.
    pub wall_switch: Option<bool>,
}

impl MockButtons {
    /// Creates a bank with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole vector.
    pub fn set(&mut self, mask: u8) {
        self.mask = mask;
    }

    /// Hold the given buttons in addition to the current ones.
    pub fn press(&mut self, mask: u8) {
        self.mask |= mask;
    }

    /// Let go of the given buttons.
    pub fn release(&mut self, mask: u8) {
        self.mask &= !mask;
    }
}

impl ButtonInput for MockButtons {
    fn read_mask(&mut self) -> u8 {
        self.reads += 1;
        self.mask
    }

    fn read_wall_switch(&mut self) -> Option<bool> {
        self.wall_switch
    }
}

/// Mock indicator LED.
///
/// Records the last duty triple written. A failing LED returns `Err(())`
/// from every write, for exercising error paths.
///
/// # Example
///
/// ```rust
/// use wallpanel::hal::MockRgb;
/// use wallpanel::traits::RgbDriver;
///
/// let mut led = MockRgb::failing();
/// assert!(led.write_duty(0, 0, 0).is_err());
/// assert_eq!(led.writes, 0);
/// ```
#[derive(Debug, Default)]
pub struct MockRgb {
    /// Last duty written, red first.
    pub duty: [u8; 3],
    /// Number of successful writes.
    pub writes: usize,
    /// Whether writes fail.
    pub fail: bool,
}

impl MockRgb {
    /// Creates a working mock LED.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock LED whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl RgbDriver for MockRgb {
    type Error = ();

    fn write_duty(&mut self, r: u8, g: u8, b: u8) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.duty = [r, g, b];
        self.writes += 1;
        Ok(())
    }
}

/// Mock servo.
///
/// `angle` is the last commanded angle, `None` until the first write.
/// Detaching keeps the last angle but clears `attached`.
#[derive(Debug, Default)]
pub struct MockServo {
    /// Last commanded angle.
    pub angle: Option<u8>,
    /// Whether the pulse train is running.
    pub attached: bool,
    /// Number of `write_angle` calls.
    pub writes: usize,
    /// Number of `detach` calls.
    pub detaches: usize,
    /// Every angle written, oldest first.
    pub history: Vec<u8>,
    /// Whether operations fail.
    pub fail: bool,
}

impl MockServo {
    /// Creates a detached mock servo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock servo whose operations always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl ServoDriver for MockServo {
    type Error = ();

    fn write_angle(&mut self, degrees: u8) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.angle = Some(degrees);
        self.attached = true;
        self.writes += 1;
        self.history.push(degrees);
        Ok(())
    }

    fn detach(&mut self) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.attached = false;
        self.detaches += 1;
        Ok(())
    }
}

// ============================================================================
// embedded-hal Mocks
// ============================================================================

/// Mock digital input pin.
///
/// # Example
///
/// ```rust
/// use embedded_hal::digital::InputPin;
/// use wallpanel::hal::MockPin;
///
/// let mut pin = MockPin::high();
/// assert!(pin.is_high().unwrap());
/// pin.low = true;
/// assert!(pin.is_low().unwrap());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct MockPin {
    /// Whether the pin reads low.
    pub low: bool,
}

impl MockPin {
    /// A pin idling high (released, with pull-up).
    pub fn high() -> Self {
        Self { low: false }
    }

    /// A pin pulled low (pressed).
    pub fn low() -> Self {
        Self { low: true }
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.low)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.low)
    }
}

/// Mock PWM channel.
#[derive(Debug, Clone, Copy)]
pub struct MockPwm {
    /// Last raw duty written.
    pub duty: u16,
    /// Duty value equivalent to 100 %.
    pub max_duty: u16,
}

impl MockPwm {
    /// Create a channel with the given resolution.
    pub fn new(max_duty: u16) -> Self {
        Self { duty: 0, max_duty }
    }
}

impl embedded_hal::pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl embedded_hal::pwm::SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.duty = duty;
        Ok(())
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock event bus recording everything published.
#[derive(Debug, Default)]
pub struct MockBus {
    /// Published events, oldest first.
    pub events: Vec<PanelEvent>,
}

impl MockBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventBus for MockBus {
    fn publish(&mut self, event: &PanelEvent) {
        self.events.push(event.clone());
    }
}

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use wallpanel::hal::MockMqtt;
/// use wallpanel::traits::MqttClient;
///
/// let mut mqtt = MockMqtt::new();
///
/// mqtt.queue_message("livingroom/lights/toggle", b"".to_vec());
/// assert_eq!(mqtt.try_recv().map(|m| m.topic), Some("livingroom/lights/toggle".into()));
///
/// mqtt.publish("livingroom/light_kitchen", b"1", true).unwrap();
/// assert_eq!(mqtt.published_to("livingroom/light_kitchen").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// Tests
// ============================================================================
