//! Hardware abstraction traits for button input, the indicator LED and servos.
//!
//! This module defines the hardware interfaces that keep the panel logic
//! independent of the board it runs on.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Clock`] | Wrapping millisecond time source |
//! | [`ButtonInput`] | Sampled button vector (one bit per button) |
//! | [`RgbDriver`] | Three PWM channels for the indicator LED |
//! | [`ServoDriver`] | Hobby servo pressing a light switch |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For boards with an `embedded-hal` 1.0 HAL, the
//! adapters in [`crate::hal::pins`] wrap input pins and PWM channels.
//!
//! # Example
//!
//! ```rust
//! use wallpanel::traits::{RgbDriver, ServoDriver};
//! use wallpanel::hal::{MockRgb, MockServo};
//!
//! let mut led = MockRgb::new();
//! led.write_duty(255, 0, 255).unwrap();
//! assert_eq!(led.duty, [255, 0, 255]);
//!
//! let mut servo = MockServo::new();
//! servo.write_angle(90).unwrap();
//! assert_eq!(servo.angle, Some(90));
//! ```

/// Time source in milliseconds.
///
/// The counter is free-running and wraps at `u32::MAX`, like a
/// microcontroller `millis()` counter. Consumers must only ever compare
/// timestamps with [`u32::wrapping_sub`].
///
/// # Example
///
/// ```rust
/// use wallpanel::traits::Clock;
/// use wallpanel::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns the current time in milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u32;
}

/// Sampled state of up to eight buttons.
///
/// Bit `n` of the returned mask is set while button `n` is held. No
/// debouncing is expected; the classifier polls at a coarse cadence.
pub trait ButtonInput {
    /// Read the current button vector.
    fn read_mask(&mut self) -> u8;

    /// Level of the separate wall light switch (`true` while held), or
    /// `None` when the panel has no such switch.
    fn read_wall_switch(&mut self) -> Option<bool> {
        None
    }
}

/// Indicator LED driver.
///
/// Receives raw PWM duty values. The panel drives a common-anode LED, so
/// a duty of 255 means "off"; see [`crate::ColorSequencer`] for the
/// polarity conversion.
pub trait RgbDriver {
    /// Error type for driver operations.
    type Error;

    /// Write one duty value per channel.
    fn write_duty(&mut self, r: u8, g: u8, b: u8) -> Result<(), Self::Error>;
}

/// Hobby servo driver.
///
/// # Implementation Notes
///
/// - `write_angle` attaches the output if it was detached
/// - `detach` stops the pulse train so the servo no longer holds position
pub trait ServoDriver {
    /// Error type for servo operations.
    type Error;

    /// Command the servo to an angle in degrees (0-180).
    fn write_angle(&mut self, degrees: u8) -> Result<(), Self::Error>;

    /// Stop driving the servo.
    fn detach(&mut self) -> Result<(), Self::Error>;
}
