//! Adapters from `embedded-hal` 1.0 peripherals to the panel traits.
//!
//! Any HAL that implements `embedded_hal::digital::InputPin` and
//! `embedded_hal::pwm::SetDutyCycle` can drive a panel through these wrappers:
//!
//! - [`ActiveLowButtons`]: up to eight push buttons wired to ground with pull-ups
//! - [`PwmRgb`]: three PWM channels for the indicator LED
//! - [`PwmServo`]: a 50 Hz PWM channel driving a hobby servo
//!
//! # Example
//!
//! ```rust
//! use wallpanel::hal::{ActiveLowButtons, MockPin};
//! use wallpanel::traits::ButtonInput;
//!
//! let mut buttons = ActiveLowButtons::new([MockPin::high(), MockPin::low()]);
//! assert_eq!(buttons.read_mask(), 0b10);
//! ```

use embedded_hal::digital::InputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::traits::{ButtonInput, RgbDriver, ServoDriver};

// ============================================================================
// Buttons
// ============================================================================

/// Push buttons that pull their pin low when held.
///
/// Pin `n` maps to bit `n` of the button vector; only the first eight pins
/// are read. A button pin that fails to read counts as released. The wall
/// light switch, if wired, is active-low as well and keeps its last good
/// level through read errors.
pub struct ActiveLowButtons<P: InputPin, const N: usize> {
    pins: [P; N],
    wall_switch: Option<P>,
    wall_switch_level: bool,
}

impl<P: InputPin, const N: usize> ActiveLowButtons<P, N> {
    /// Wrap the pins, in bit order.
    pub fn new(pins: [P; N]) -> Self {
        Self {
            pins,
            wall_switch: None,
            wall_switch_level: false,
        }
    }

    /// Also read a wall light switch.
    pub fn with_wall_switch(mut self, pin: P) -> Self {
        self.wall_switch = Some(pin);
        self
    }
}

impl<P: InputPin, const N: usize> ButtonInput for ActiveLowButtons<P, N> {
    fn read_mask(&mut self) -> u8 {
        self.pins
            .iter_mut()
            .take(8)
            .enumerate()
            .fold(0, |mask, (bit, pin)| match pin.is_low() {
                Ok(true) => mask | (1 << bit),
                Ok(false) => mask,
                Err(_) => {
                    warn!("button pin {} unreadable", bit);
                    mask
                }
            })
    }

    fn read_wall_switch(&mut self) -> Option<bool> {
        let pin = self.wall_switch.as_mut()?;
        match pin.is_low() {
            Ok(level) => self.wall_switch_level = level,
            Err(_) => warn!("wall switch pin unreadable"),
        }
        Some(self.wall_switch_level)
    }
}

// ============================================================================
// Indicator LED
// ============================================================================

/// Indicator LED on three PWM channels.
///
/// Duty values `0..=255` are scaled to each channel's resolution. The panel
/// logic already inverts colours for the common-anode LED, so no polarity
/// handling happens here.
pub struct PwmRgb<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle<Error = R::Error>,
    B: SetDutyCycle<Error = R::Error>,
{
    red: R,
    green: G,
    blue: B,
}

impl<R, G, B> PwmRgb<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle<Error = R::Error>,
    B: SetDutyCycle<Error = R::Error>,
{
    /// Wrap three PWM channels.
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self { red, green, blue }
    }
}

impl<R, G, B> RgbDriver for PwmRgb<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle<Error = R::Error>,
    B: SetDutyCycle<Error = R::Error>,
{
    type Error = R::Error;

    fn write_duty(&mut self, r: u8, g: u8, b: u8) -> Result<(), Self::Error> {
        self.red.set_duty_cycle_fraction(u16::from(r), 255)?;
        self.green.set_duty_cycle_fraction(u16::from(g), 255)?;
        self.blue.set_duty_cycle_fraction(u16::from(b), 255)
    }
}

// ============================================================================
// Servo
// ============================================================================

/// Length of one servo frame at 50 Hz.
pub const SERVO_PERIOD_US: u32 = 20_000;

/// Pulse width range of a hobby servo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseRange {
    /// Pulse width at 0 degrees.
    pub min_us: u16,
    /// Pulse width at 180 degrees.
    pub max_us: u16,
}

impl Default for PulseRange {
    /// 544-2400 us, the usual range of small hobby servos.
    fn default() -> Self {
        Self {
            min_us: 544,
            max_us: 2400,
        }
    }
}

impl PulseRange {
    /// Pulse width for an angle; angles past 180 are clamped.
    pub fn pulse_us(&self, degrees: u8) -> u32 {
        let degrees = u32::from(degrees.min(180));
        let span = u32::from(self.max_us.saturating_sub(self.min_us));
        u32::from(self.min_us) + span * degrees / 180
    }
}

/// Hobby servo on a PWM channel running at 50 Hz.
///
/// Detaching sets the duty to zero, which stops the pulse train.
pub struct PwmServo<P: SetDutyCycle> {
    pwm: P,
    range: PulseRange,
}

impl<P: SetDutyCycle> PwmServo<P> {
    /// Wrap a channel already configured for 50 Hz.
    pub fn new(pwm: P) -> Self {
        Self::with_range(pwm, PulseRange::default())
    }

    /// Wrap a channel with a custom pulse range.
    pub fn with_range(pwm: P, range: PulseRange) -> Self {
        Self { pwm, range }
    }

    /// Borrow the PWM channel.
    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

impl<P: SetDutyCycle> ServoDriver for PwmServo<P> {
    type Error = P::Error;

    fn write_angle(&mut self, degrees: u8) -> Result<(), Self::Error> {
        let max = u32::from(self.pwm.max_duty_cycle());
        let duty = max * self.range.pulse_us(degrees) / SERVO_PERIOD_US;
        self.pwm.set_duty_cycle(duty as u16)
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        self.pwm.set_duty_cycle_fully_off()
    }
}
