//! Servo-driven light switches.
//!
//! Each room light is toggled by a hobby servo that physically presses a
//! bistable wall switch. A [`LightActuator`] swings its servo to the on or off
//! extreme, lets it settle, eases it back to an idle angle clear of the switch
//! and finally stops driving it so it does not buzz or draw current.
//!
//! Two actuators share one supply, so [`LightPair`] makes sure only one of them
//! moves at a time. Requests are queued per light and applied once the *other*
//! light has finished its busy window. When both lights are free and both have
//! a request in the same tick, the kitchen light goes first.
//!
//! # Timeline of one switch
//!
//! ```text
//! t            t + settle          t + settle + detach
//! |--- extreme ---|------ idle ------|--- detached ...
//! |<-------------- busy ------------>|
//! ```
//!
//! # Example
//!
//! ```rust
//! use wallpanel::lighting::{ActuatorTiming, LightActuator, ServoAngles};
//! use wallpanel::hal::MockServo;
//!
//! let mut light = LightActuator::new(
//!     MockServo::new(),
//!     ServoAngles::new(120, 90, 60),
//!     ActuatorTiming::default(),
//! );
//! light.init(0).unwrap();
//! light.set(true, 1000).unwrap();
//! assert!(light.get());
//! assert!(light.is_busy(1499));
//! assert!(!light.is_busy(1500));
//! ```

use heapless::Vec as HVec;
use log::{debug, info};

use crate::traits::ServoDriver;

/// Servo angles (degrees) for one light switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoAngles {
    /// Angle that pushes the switch off.
    pub off: u8,
    /// Resting angle clear of the switch.
    pub idle: u8,
    /// Angle that pushes the switch on.
    pub on: u8,
}

impl ServoAngles {
    /// Create an angle set.
    pub const fn new(off: u8, idle: u8, on: u8) -> Self {
        Self { off, idle, on }
    }

    /// The extreme angle for a logical state.
    #[inline]
    pub const fn extreme(&self, on: bool) -> u8 {
        if on {
            self.on
        } else {
            self.off
        }
    }
}

/// How long an actuator holds its extreme angle and then its idle angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorTiming {
    /// Time at the extreme angle before easing back to idle.
    pub settle_ms: u32,
    /// Time at idle before the servo is detached.
    pub detach_ms: u32,
}

impl ActuatorTiming {
    /// Create a timing pair.
    pub const fn new(settle_ms: u32, detach_ms: u32) -> Self {
        Self {
            settle_ms,
            detach_ms,
        }
    }

    /// Length of the busy window.
    #[inline]
    pub const fn busy_ms(&self) -> u32 {
        self.settle_ms.saturating_add(self.detach_ms)
    }
}

impl Default for ActuatorTiming {
    fn default() -> Self {
        Self::new(250, 250)
    }
}

/// Drives one servo-operated light switch.
pub struct LightActuator<S: ServoDriver> {
    servo: S,
    angles: ServoAngles,
    timing: ActuatorTiming,
    state: bool,
    last_change: u32,
    angle: Option<u8>,
}

impl<S: ServoDriver> LightActuator<S> {
    /// Create an actuator. The servo is not touched until [`init`](Self::init)
    /// or [`set`](Self::set).
    pub fn new(servo: S, angles: ServoAngles, timing: ActuatorTiming) -> Self {
        Self {
            servo,
            angles,
            timing,
            state: false,
            last_change: 0,
            angle: None,
        }
    }

    /// Move to the idle angle without declaring the light on or off.
    pub fn init(&mut self, now_ms: u32) -> Result<(), S::Error> {
        self.write(self.angles.idle)?;
        self.last_change = now_ms;
        Ok(())
    }

    /// Swing to the on or off extreme and record the new logical state.
    ///
    /// Calling this while the actuator is still busy restarts its timeline.
    pub fn set(&mut self, on: bool, now_ms: u32) -> Result<(), S::Error> {
        self.write(self.angles.extreme(on))?;
        self.state = on;
        self.last_change = now_ms;
        Ok(())
    }

    /// Logical state from the last [`set`](Self::set).
    pub fn get(&self) -> bool {
        self.state
    }

    /// Ease back to idle once settled, then detach.
    pub fn refresh(&mut self, now_ms: u32) -> Result<(), S::Error> {
        if self.angle.is_none() {
            return Ok(());
        }

        let delta = now_ms.wrapping_sub(self.last_change);
        if delta >= self.timing.busy_ms() {
            self.servo.detach()?;
            self.angle = None;
        } else if delta >= self.timing.settle_ms && self.angle != Some(self.angles.idle) {
            self.write(self.angles.idle)?;
        }
        Ok(())
    }

    /// Whether the actuator is inside its busy window.
    ///
    /// A detached actuator is never busy, which keeps the answer correct
    /// after the clock wraps past an old timestamp.
    pub fn is_busy(&self, now_ms: u32) -> bool {
        self.angle.is_some() && now_ms.wrapping_sub(self.last_change) < self.timing.busy_ms()
    }

    /// Angle currently commanded, or `None` while detached.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    /// Whether the servo is being driven.
    pub fn is_attached(&self) -> bool {
        self.angle.is_some()
    }

    /// Timestamp of the last `init`/`set`.
    pub fn last_change_ms(&self) -> u32 {
        self.last_change
    }

    /// Borrow the servo driver.
    pub fn servo(&self) -> &S {
        &self.servo
    }

    fn write(&mut self, degrees: u8) -> Result<(), S::Error> {
        self.servo.write_angle(degrees)?;
        self.angle = Some(degrees);
        Ok(())
    }
}

// ============================================================================
// Light pair arbitration
// ============================================================================

/// Identifies one of the two panel lights.
///
/// The declaration order is the arbitration order: when both lights are free
/// and both have a pending request, [`LightId::Kitchen`] moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LightId {
    /// Kitchen ceiling light.
    Kitchen,
    /// Lounge ceiling light.
    Lounge,
}

impl LightId {
    /// Both lights, in arbitration order.
    pub const ALL: [LightId; 2] = [LightId::Kitchen, LightId::Lounge];

    /// Property name used on the event bus.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LightId::Kitchen => "light_kitchen",
            LightId::Lounge => "light_lounge",
        }
    }

    /// The other light of the pair.
    pub const fn other(&self) -> LightId {
        match self {
            LightId::Kitchen => LightId::Lounge,
            LightId::Lounge => LightId::Kitchen,
        }
    }

    const fn index(&self) -> usize {
        match self {
            LightId::Kitchen => 0,
            LightId::Lounge => 1,
        }
    }
}

/// A logical state change applied by [`LightPair::refresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightChange {
    /// Which light moved.
    pub light: LightId,
    /// New logical state.
    pub on: bool,
}

/// Changes applied in one refresh (at most one per light).
pub type LightChanges = HVec<LightChange, 2>;

/// Two light actuators that never move at the same time.
///
/// Requests are latched per light (a newer request overwrites an older,
/// unapplied one) and applied from [`refresh`](Self::refresh).
pub struct LightPair<S: ServoDriver> {
    lights: [LightActuator<S>; 2],
    pending: [Option<bool>; 2],
}

impl<S: ServoDriver> LightPair<S> {
    /// Pair a kitchen and a lounge actuator.
    pub fn new(kitchen: LightActuator<S>, lounge: LightActuator<S>) -> Self {
        Self {
            lights: [kitchen, lounge],
            pending: [None, None],
        }
    }

    /// Move both servos to idle.
    ///
    /// Both are moved at once; this only happens at power-up, before any
    /// switch is pressed.
    pub fn init(&mut self, now_ms: u32) -> Result<(), S::Error> {
        for light in &mut self.lights {
            light.init(now_ms)?;
        }
        Ok(())
    }

    /// Queue a state for one light.
    pub fn request(&mut self, light: LightId, on: bool) {
        debug!("{} requested {}", light.as_str(), if on { "on" } else { "off" });
        self.pending[light.index()] = Some(on);
    }

    /// Queue the wall-switch toggle: both lights go off if both are on,
    /// otherwise both go on.
    pub fn request_toggle(&mut self) {
        let on = !(self.get(LightId::Kitchen) && self.get(LightId::Lounge));
        for light in LightId::ALL {
            self.request(light, on);
        }
    }

    /// Pending (not yet applied) request for a light.
    pub fn pending(&self, light: LightId) -> Option<bool> {
        self.pending[light.index()]
    }

    /// Logical state of a light.
    pub fn get(&self, light: LightId) -> bool {
        self.lights[light.index()].get()
    }

    /// Borrow one actuator.
    pub fn light(&self, light: LightId) -> &LightActuator<S> {
        &self.lights[light.index()]
    }

    /// Whether either actuator is inside its busy window.
    pub fn is_busy(&self, now_ms: u32) -> bool {
        self.lights.iter().any(|l| l.is_busy(now_ms))
    }

    /// Advance both actuators, then apply whatever pending requests the
    /// other light's busy window allows, in [`LightId::ALL`] order.
    pub fn refresh(&mut self, now_ms: u32) -> Result<LightChanges, S::Error> {
        for light in &mut self.lights {
            light.refresh(now_ms)?;
        }

        let mut changes = LightChanges::new();
        for id in LightId::ALL {
            let Some(on) = self.pending[id.index()] else {
                continue;
            };
            if self.lights[id.other().index()].is_busy(now_ms) {
                continue;
            }

            self.lights[id.index()].set(on, now_ms)?;
            self.pending[id.index()] = None;
            info!("{} switched {}", id.as_str(), if on { "on" } else { "off" });
            // Capacity is two and each light is visited once
            let _ = changes.push(LightChange { light: id, on });
        }
        Ok(changes)
    }
}
