//! Linear colour fades for the indicator LED.
//!
//! [`ColorSequencer`] owns an [`RgbDriver`] and walks the rendered colour
//! from an anchor to a target in fixed-period steps. Time only advances in
//! whole update periods; any remainder is carried into the next refresh so
//! that many short refreshes never drift.
//!
//! # Polarity
//!
//! The panel LED is common-anode: a channel is lit by pulling it low. The
//! sequencer therefore writes `255 - value` for every channel, so black is
//! a duty of 255 on all three outputs.
//!
//! # Example
//!
//! ```rust
//! use wallpanel::{ColorSequencer, Colour};
//! use wallpanel::hal::MockRgb;
//!
//! let mut led = ColorSequencer::new(MockRgb::new());
//! led.attach(0).unwrap();
//! assert_eq!(led.driver().duty, [255, 255, 255]);
//!
//! // 100 ms fade to red, refreshed every 10 ms
//! led.set_colour(Colour::RED, 100);
//! for t in (10..=100).step_by(10) {
//!     led.refresh(t).unwrap();
//! }
//! assert_eq!(led.current(), Colour::RED);
//! assert_eq!(led.driver().duty, [0, 255, 255]);
//! ```

use log::trace;

use crate::colour::Colour;
use crate::traits::RgbDriver;

/// Default length of one fade step in milliseconds.
pub const DEFAULT_UPDATE_PERIOD_MS: u32 = 10;

/// Fades an RGB LED between colours.
///
/// Call [`refresh`](Self::refresh) every tick; call
/// [`set_colour`](Self::set_colour) whenever a new target is wanted. A new
/// target interrupts any fade in flight and starts from the colour that is
/// currently rendered.
pub struct ColorSequencer<D: RgbDriver> {
    driver: D,
    update_period_ms: u32,
    current: Colour,
    old: Colour,
    new: Colour,
    step: u32,
    total_steps: u32,
    last_refresh: u32,
}

impl<D: RgbDriver> ColorSequencer<D> {
    /// Create a sequencer with the default 10 ms update period.
    pub fn new(driver: D) -> Self {
        Self::with_update_period(driver, DEFAULT_UPDATE_PERIOD_MS)
    }

    /// Create a sequencer with a custom update period (clamped to >= 1 ms).
    pub fn with_update_period(driver: D, update_period_ms: u32) -> Self {
        Self {
            driver,
            update_period_ms: update_period_ms.max(1),
            current: Colour::BLACK,
            old: Colour::BLACK,
            new: Colour::BLACK,
            step: 0,
            total_steps: 1,
            last_refresh: 0,
        }
    }

    /// Anchor the step clock at `now_ms` and render the current colour
    /// (black after construction).
    pub fn attach(&mut self, now_ms: u32) -> Result<(), D::Error> {
        self.last_refresh = now_ms;
        self.render()
    }

    /// Start a fade from the rendered colour to `target`.
    ///
    /// The fade takes `duration_ms / update_period` steps. Durations shorter
    /// than one update period (including zero) snap to the target on the
    /// next refresh.
    pub fn set_colour(&mut self, target: Colour, duration_ms: u32) {
        self.old = self.current;
        self.new = target;
        self.step = 0;

        let steps = duration_ms / self.update_period_ms;
        self.total_steps = steps.max(1);
        // Shorter than one period: pre-advance so the next refresh lands on the target with no elapsed time
        if steps == 0 {
            self.step = self.total_steps;
        }

        trace!(
            "indicator fade {:?} -> {:?} over {} steps",
            self.old,
            self.new,
            self.total_steps
        );
    }

    /// Advance the fade to `now_ms` and write the LED outputs.
    pub fn refresh(&mut self, now_ms: u32) -> Result<(), D::Error> {
        let elapsed_steps = now_ms.wrapping_sub(self.last_refresh) / self.update_period_ms;
        self.last_refresh = self
            .last_refresh
            .wrapping_add(elapsed_steps * self.update_period_ms);
        self.step = self.step.saturating_add(elapsed_steps);

        if self.step >= self.total_steps {
            // Fade finished, hold the target
            self.old = self.new;
            self.step = 0;
        }

        self.current = interpolate(self.old, self.new, self.step, self.total_steps);
        self.render()
    }

    /// The colour currently rendered.
    pub fn current(&self) -> Colour {
        self.current
    }

    /// The colour being faded towards (or held).
    pub fn target(&self) -> Colour {
        self.new
    }

    /// Whether a fade is still in progress.
    pub fn is_fading(&self) -> bool {
        self.old != self.new
    }

    /// Steps elapsed in the current fade.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Length of the current fade in steps.
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Length of one fade step in milliseconds.
    pub fn update_period_ms(&self) -> u32 {
        self.update_period_ms
    }

    /// Borrow the LED driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutably borrow the LED driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn render(&mut self) -> Result<(), D::Error> {
        let duty = self.current.inverted();
        self.driver.write_duty(duty.r, duty.g, duty.b)
    }
}

/// `old + (new - old) * step / total` per channel, truncating toward `old`.
fn interpolate(old: Colour, new: Colour, step: u32, total: u32) -> Colour {
    let total = i64::from(total.max(1));
    let step = i64::from(step);
    let lerp = |from: u8, to: u8| -> u8 {
        let from = i64::from(from);
        let delta = i64::from(to) - from;
        (from + delta * step / total) as u8
    };

    Colour::new(lerp(old.r, new.r), lerp(old.g, new.g), lerp(old.b, new.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockRgb;

    fn attached() -> ColorSequencer<MockRgb> {
        let mut seq = ColorSequencer::new(MockRgb::new());
        seq.attach(0).unwrap();
        seq
    }

    #[test]
    fn attach_renders_black_as_all_high() {
        let seq = attached();
        assert_eq!(seq.current(), Colour::BLACK);
        assert_eq!(seq.driver().duty, [255, 255, 255]);
        assert_eq!(seq.driver().writes, 1);
    }

    #[test]
    fn total_steps_from_duration() {
        let mut seq = attached();
        seq.set_colour(Colour::RED, 250);
        assert_eq!(seq.total_steps(), 25);
        assert_eq!(seq.step(), 0);

        seq.set_colour(Colour::RED, 19);
        assert_eq!(seq.total_steps(), 1);
    }

    #[test]
    fn zero_duration_snaps_on_next_refresh() {
        let mut seq = attached();
        seq.set_colour(Colour::GREEN, 0);
        seq.refresh(0).unwrap();
        assert_eq!(seq.current(), Colour::GREEN);
        assert_eq!(seq.driver().duty, [255, 0, 255]);
    }

    #[test]
    fn halfway_is_truncated_midpoint() {
        let mut seq = attached();
        seq.set_colour(Colour::new(255, 100, 3), 100);
        seq.refresh(50).unwrap();
        assert_eq!(seq.current(), Colour::new(127, 50, 1));
    }

    #[test]
    fn remainder_is_carried_between_refreshes() {
        let mut seq = attached();
        seq.set_colour(Colour::new(100, 0, 0), 100);

        // Three 7 ms refreshes cross two period boundaries
        seq.refresh(7).unwrap();
        assert_eq!(seq.step(), 0);
        seq.refresh(14).unwrap();
        assert_eq!(seq.step(), 1);
        seq.refresh(21).unwrap();
        assert_eq!(seq.step(), 2);
        assert_eq!(seq.current(), Colour::new(20, 0, 0));
    }

    #[test]
    fn fading_down_is_monotonic() {
        let mut seq = attached();
        seq.set_colour(Colour::WHITE, 0);
        seq.refresh(0).unwrap();

        seq.set_colour(Colour::new(0, 200, 17), 330);
        let mut last = seq.current();
        for t in (3..=400).step_by(3) {
            seq.refresh(t).unwrap();
            let now = seq.current();
            assert!(now.r <= last.r);
            assert!(now.g <= last.g && now.g >= 200);
            assert!(now.b <= last.b && now.b >= 17);
            last = now;
        }
        assert_eq!(seq.current(), Colour::new(0, 200, 17));
        assert!(!seq.is_fading());
    }

    #[test]
    fn interrupt_starts_from_rendered_colour() {
        let mut seq = attached();
        seq.set_colour(Colour::new(200, 0, 0), 100);
        seq.refresh(50).unwrap();
        assert_eq!(seq.current(), Colour::new(100, 0, 0));

        seq.set_colour(Colour::new(0, 0, 200), 100);
        seq.refresh(50).unwrap();
        assert_eq!(seq.current(), Colour::new(100, 0, 0));
        assert_eq!(seq.target(), Colour::new(0, 0, 200));

        seq.refresh(100).unwrap();
        assert_eq!(seq.current(), Colour::new(50, 0, 100));
    }

    #[test]
    fn refresh_across_clock_wrap() {
        let mut seq = ColorSequencer::new(MockRgb::new());
        let start = u32::MAX - 25;
        seq.attach(start).unwrap();
        seq.set_colour(Colour::new(0, 0, 100), 100);

        seq.refresh(start.wrapping_add(50)).unwrap();
        assert_eq!(seq.current(), Colour::new(0, 0, 50));

        seq.refresh(start.wrapping_add(100)).unwrap();
        assert_eq!(seq.current(), Colour::new(0, 0, 100));
    }

    #[test]
    fn period_is_clamped_to_one() {
        let seq = ColorSequencer::with_update_period(MockRgb::new(), 0);
        assert_eq!(seq.update_period_ms(), 1);
    }
}
