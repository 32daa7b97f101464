//! The wall panel: buttons, indicator LED and light switches wired together.
//!
//! [`Panel`] owns every component and is driven by one call to
//! [`Panel::tick`] per poll cycle. It reacts to the button classifier by
//! colouring the indicator and announces semantic events on an
//! [`EventBus`]. Remote commands arrive as [`PanelCommand`]s through
//! [`Panel::apply`] and take effect on the following ticks.
//!
//! # Indicator behaviour
//!
//! | Trigger | Indicator |
//! |---------|-----------|
//! | Mode change | Fade to the palette colour of the new mode number |
//! | Long-press timer (re)started | Fade to the hold colour, arriving as the press turns long |
//! | Long-press timer stopped | Fade back to the current mode colour |
//! | `set_rgbled` / `set_rgbled_instant` | Fade (fast) or snap to the given colour |
//!
//! # Example
//!
//! ```rust
//! use wallpanel::{Config, Panel, PanelCommand, LightId};
//! use wallpanel::hal::{MockBus, MockRgb, MockServo};
//!
//! let config = Config::default();
//! let mut panel = Panel::new(&config, MockRgb::new(), MockServo::new(), MockServo::new(), MockBus::new());
//! panel.init(0).unwrap();
//!
//! panel.apply(PanelCommand::SetLight { light: LightId::Lounge, on: true });
//!
//! // Servos are idle-busy for 500 ms after power-up
//! for t in (0..=600).step_by(10) {
//!     panel.tick(0, t).unwrap();
//! }
//! assert!(panel.state().lounge);
//! ```

use core::fmt;

use log::{debug, info};

use crate::buttons::{ButtonClassifier, ButtonListener, ButtonPress, Mode};
use crate::colour::Colour;
use crate::config::{Config, IndicatorConfig};
use crate::lighting::{LightActuator, LightId, LightPair};
use crate::sequencer::ColorSequencer;
use crate::traits::{ButtonInput, EventBus, RgbDriver, ServoDriver};

// ============================================================================
// Events, Commands, Errors
// ============================================================================

/// Semantic events announced on the event bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelEvent {
    /// A button press was classified.
    ButtonPress(ButtonPress),
    /// The panel mode changed.
    ModeChange(Mode),
    /// A light switch was actuated.
    LightChanged {
        /// Which light.
        light: LightId,
        /// New logical state.
        on: bool,
    },
}

/// Commands accepted from remote peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelCommand {
    /// Switch one light on or off.
    SetLight {
        /// Which light.
        light: LightId,
        /// Requested state.
        on: bool,
    },
    /// Same as releasing the wall switch.
    ToggleLights,
    /// Fade the indicator to a colour.
    SetColour {
        /// Target colour.
        colour: Colour,
        /// Fade duration; zero snaps on the next tick.
        duration_ms: u32,
    },
}

/// A driver failure, tagged with the component it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError<R, S> {
    /// The indicator LED driver failed.
    Indicator(R),
    /// A light switch servo failed.
    Light(S),
}

impl<R: fmt::Debug, S: fmt::Debug> fmt::Display for PanelError<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::Indicator(e) => write!(f, "indicator LED error: {:?}", e),
            PanelError::Light(e) => write!(f, "light servo error: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<R: fmt::Debug, S: fmt::Debug> std::error::Error for PanelError<R, S> {}

/// Snapshot of the panel for status reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PanelState {
    /// Current mode.
    pub mode: Mode,
    /// Colour currently shown.
    pub indicator: Colour,
    /// Colour being faded towards, 15-bit encoded.
    pub indicator_target: u16,
    /// Kitchen light state.
    pub kitchen: bool,
    /// Lounge light state.
    pub lounge: bool,
    /// Whether a light request is still waiting for its turn.
    pub lights_pending: bool,
}

// ============================================================================
// Panel
// ============================================================================

/// Result type of panel operations for given drivers.
pub type PanelResult<D, S> = Result<(), PanelError<<D as RgbDriver>::Error, <S as ServoDriver>::Error>>;

/// The complete panel.
pub struct Panel<D: RgbDriver, S: ServoDriver, B: EventBus> {
    classifier: ButtonClassifier,
    indicator: ColorSequencer<D>,
    lights: LightPair<S>,
    bus: B,
    indicator_config: IndicatorConfig,
    wall_switch_held: bool,
}

impl<D: RgbDriver, S: ServoDriver, B: EventBus> Panel<D, S, B> {
    /// Build a panel from its configuration and drivers.
    pub fn new(config: &Config, led: D, kitchen: S, lounge: S, bus: B) -> Self {
        let buttons = &config.buttons;
        let lights = &config.lights;
        Self {
            classifier: ButtonClassifier::new(
                buttons.roles.clone(),
                buttons.long_press_ms,
                buttons.mode_count,
            ),
            indicator: ColorSequencer::with_update_period(
                led,
                config.indicator.update_period_ms,
            ),
            lights: LightPair::new(
                LightActuator::new(kitchen, lights.kitchen, lights.timing),
                LightActuator::new(lounge, lights.lounge, lights.timing),
            ),
            bus,
            indicator_config: config.indicator.clone(),
            wall_switch_held: false,
        }
    }

    /// Power-up: park both servos and fade the indicator in to the colour of
    /// the initial mode.
    pub fn init(&mut self, now_ms: u32) -> PanelResult<D, S> {
        self.indicator.attach(now_ms).map_err(PanelError::Indicator)?;
        self.lights.init(now_ms).map_err(PanelError::Light)?;

        let colour = self.indicator_config.mode_colour(self.classifier.mode().number);
        self.indicator
            .set_colour(colour, self.indicator_config.fast_fade_ms);
        info!("panel ready");
        Ok(())
    }

    /// Run one poll cycle with a sampled button vector.
    pub fn tick(&mut self, buttons: u8, now_ms: u32) -> PanelResult<D, S> {
        let mut wiring = Wiring {
            indicator: &mut self.indicator,
            bus: &mut self.bus,
            config: &self.indicator_config,
            long_press_ms: self.classifier.long_press_ms(),
            mode: self.classifier.mode(),
        };
        self.classifier.update(buttons, now_ms, &mut wiring);

        self.indicator.refresh(now_ms).map_err(PanelError::Indicator)?;

        let changes = self.lights.refresh(now_ms).map_err(PanelError::Light)?;
        for change in changes {
            self.bus.publish(&PanelEvent::LightChanged {
                light: change.light,
                on: change.on,
            });
        }
        Ok(())
    }

    /// Sample `input` (buttons and, if present, the wall switch) and run one
    /// poll cycle.
    pub fn poll<I: ButtonInput + ?Sized>(&mut self, input: &mut I, now_ms: u32) -> PanelResult<D, S> {
        if let Some(held) = input.read_wall_switch() {
            self.wall_switch(held);
        }
        let buttons = input.read_mask();
        self.tick(buttons, now_ms)
    }

    /// Feed the wall switch level. Releasing the switch toggles both lights.
    pub fn wall_switch(&mut self, held: bool) {
        if self.wall_switch_held && !held {
            debug!("wall switch released");
            self.lights.request_toggle();
        }
        self.wall_switch_held = held;
    }

    /// Apply a remote command.
    pub fn apply(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::SetLight { light, on } => self.lights.request(light, on),
            PanelCommand::ToggleLights => self.lights.request_toggle(),
            PanelCommand::SetColour {
                colour,
                duration_ms,
            } => self.indicator.set_colour(colour, duration_ms),
        }
    }

    /// Status snapshot.
    pub fn state(&self) -> PanelState {
        PanelState {
            mode: self.classifier.mode(),
            indicator: self.indicator.current(),
            indicator_target: self.indicator.target().to_rgb15(),
            kitchen: self.lights.get(LightId::Kitchen),
            lounge: self.lights.get(LightId::Lounge),
            lights_pending: LightId::ALL
                .iter()
                .any(|l| self.lights.pending(*l).is_some()),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.classifier.mode()
    }

    /// Indicator configuration in use.
    pub fn indicator_config(&self) -> &IndicatorConfig {
        &self.indicator_config
    }

    /// Borrow the button classifier.
    pub fn classifier(&self) -> &ButtonClassifier {
        &self.classifier
    }

    /// Borrow the indicator.
    pub fn indicator(&self) -> &ColorSequencer<D> {
        &self.indicator
    }

    /// Borrow the lights.
    pub fn lights(&self) -> &LightPair<S> {
        &self.lights
    }

    /// Borrow the event bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the event bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

/// Classifier listener holding disjoint borrows of the panel.
struct Wiring<'a, D: RgbDriver, B: EventBus> {
    indicator: &'a mut ColorSequencer<D>,
    bus: &'a mut B,
    config: &'a IndicatorConfig,
    long_press_ms: u32,
    mode: Mode,
}

impl<D: RgbDriver, B: EventBus> ButtonListener for Wiring<'_, D, B> {
    fn on_mode_change(&mut self, mode: Mode) {
        self.mode = mode;
        self.indicator
            .set_colour(self.config.mode_colour(mode.number), self.config.fast_fade_ms);
        self.bus.publish(&PanelEvent::ModeChange(mode));
    }

    fn on_press(&mut self, press: ButtonPress) {
        self.bus.publish(&PanelEvent::ButtonPress(press));
    }

    fn on_hold_start(&mut self, _first: bool) {
        self.indicator
            .set_colour(self.config.hold_colour, self.long_press_ms);
    }

    fn on_hold_end(&mut self, _completed: bool) {
        self.indicator
            .set_colour(self.config.mode_colour(self.mode.number), self.config.fast_fade_ms);
    }
}
