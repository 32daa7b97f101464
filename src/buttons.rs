//! Session-based classification of multi-button input.
//!
//! The panel samples its eight buttons as a bitmask once per tick and feeds
//! the mask to [`ButtonClassifier::update`]. The classifier groups samples
//! into *sessions* (from "nothing held" to "nothing held again") and emits at
//! most one semantic event per session:
//!
//! - a **press** of one or more normal buttons, optionally combined with
//!   modifier buttons, either short (on release) or long (once held for the
//!   configured duration)
//! - a **mode change**, when any mode button took part in the session
//!
//! # Button Roles
//!
//! Every button belongs to one of three roles, given as lists of masks:
//!
//! | Role | Purpose |
//! |------|---------|
//! | Normal | Selectable targets; reported in [`ButtonPress::buttons`] |
//! | Mode | Select a behaviour group; drive [`Mode`] |
//! | Modifier | Alter press semantics; reported in [`ButtonPress::modifiers`] |
//!
//! Reported bit patterns are *role-relative*: bit `i` of
//! [`ButtonPress::buttons`] is set when the `i`-th normal mask was held.
//!
//! # Modes
//!
//! Releasing a mode button on its own cycles the mode number
//! (`0, 1, ... mode_count - 1, 0, ...`). Holding a normal button together with
//! a mode button selects that button's index directly. Switching to a
//! different combination of mode buttons restarts numbering at zero.
//!
//! # Known limitation
//!
//! Input is not debounced beyond the polling cadence. A bouncing contact
//! shows up as a genuine release and re-press.
//!
//! # Example
//!
//! ```rust
//! use wallpanel::buttons::{ButtonClassifier, ButtonEvent, RoleMasks};
//!
//! let mut classifier = ButtonClassifier::new(RoleMasks::default(), 750, 5);
//! let mut events: heapless::Vec<ButtonEvent, 8> = heapless::Vec::new();
//!
//! classifier.update(0x01, 0, &mut events);
//! classifier.update(0x00, 100, &mut events);
//!
//! let press = events.iter().find_map(|e| match e {
//!     ButtonEvent::Press(p) => Some(*p),
//!     _ => None,
//! });
//! assert_eq!(press.map(|p| (p.buttons, p.long_press)), Some((0b1, false)));
//! ```

use heapless::Vec as HVec;
use log::{debug, trace};

/// Maximum number of masks per role (one per bit of the button vector).
pub const MAX_ROLE_MASKS: usize = 8;

/// Mask storage for one role.
pub type MaskList = HVec<u8, MAX_ROLE_MASKS>;

// ============================================================================
// Roles
// ============================================================================

/// One button role: an ordered list of masks over the button vector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Role {
    masks: MaskList,
}

impl Role {
    /// Build a role from masks. Masks past [`MAX_ROLE_MASKS`] are ignored.
    pub fn new(masks: &[u8]) -> Self {
        let take = masks.len().min(MAX_ROLE_MASKS);
        let mut list = MaskList::new();
        // Cannot fail, `take` fits the capacity
        let _ = list.extend_from_slice(&masks[..take]);
        Self { masks: list }
    }

    /// The masks, in reporting order.
    pub fn masks(&self) -> &[u8] {
        &self.masks
    }

    /// Number of masks in this role.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Whether the role has no masks.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Whether any mask of this role intersects `state`.
    #[inline]
    pub fn any(&self, state: u8) -> bool {
        self.masks.iter().any(|m| state & m != 0)
    }

    /// Role-relative bits: bit `i` is set when mask `i` intersects `state`.
    pub fn bits(&self, state: u8) -> u8 {
        self.masks
            .iter()
            .enumerate()
            .filter(|(_, m)| state & **m != 0)
            .fold(0, |acc, (i, _)| acc | (1 << i))
    }
}

/// The three button roles of a panel.
///
/// Roles must not overlap; overlapping masks give unspecified (but memory
/// safe) classification.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleMasks {
    /// Selectable targets.
    pub normal: Role,
    /// Behaviour group selectors.
    pub mode: Role,
    /// Press modifiers.
    pub modifier: Role,
}

impl RoleMasks {
    /// Build role masks from mask lists.
    pub fn new(normal: &[u8], mode: &[u8], modifier: &[u8]) -> Self {
        Self {
            normal: Role::new(normal),
            mode: Role::new(mode),
            modifier: Role::new(modifier),
        }
    }
}

impl Default for RoleMasks {
    /// Wall panel layout: five normal buttons on bits 0-4, mode buttons on
    /// bits 5 and 7, a modifier on bit 6.
    fn default() -> Self {
        Self::new(&[0x01, 0x02, 0x04, 0x08, 0x10], &[0x20, 0x80], &[0x40])
    }
}

// ============================================================================
// Events
// ============================================================================

/// Persistent panel mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mode {
    /// Position within the mode group (`0..mode_count`).
    pub number: u8,
    /// Mode-role bits that selected the group.
    pub kind: u8,
}

impl Mode {
    /// Create a mode.
    pub const fn new(number: u8, kind: u8) -> Self {
        Self { number, kind }
    }

    /// Pack as `number << mode_mask_count | kind`.
    pub const fn packed(&self, mode_mask_count: u32) -> u16 {
        ((self.number as u16) << mode_mask_count) | self.kind as u16
    }
}

/// A classified button press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonPress {
    /// Mode in effect when the press fired.
    pub mode: Mode,
    /// Role-relative modifier bits held during the session.
    pub modifiers: u8,
    /// Whether the long-press duration was reached.
    pub long_press: bool,
    /// Role-relative normal bits held during the session.
    pub buttons: u8,
}

/// Receiver for classifier output.
///
/// Every method has an empty default, so a listener only implements the
/// slots it cares about; events for the rest are dropped.
pub trait ButtonListener {
    /// A mode session completed.
    fn on_mode_change(&mut self, _mode: Mode) {}

    /// A press session completed (or reached the long-press duration).
    fn on_press(&mut self, _press: ButtonPress) {}

    /// The long-press timer was (re)started. `first` is false when an
    /// already running timer was restarted by another button.
    fn on_hold_start(&mut self, _first: bool) {}

    /// The long-press timer stopped. `completed` is true only when it
    /// stopped because an event fired after the full duration.
    fn on_hold_end(&mut self, _completed: bool) {}
}

impl ButtonListener for () {}

/// Classifier output as a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    /// See [`ButtonListener::on_mode_change`].
    ModeChange(Mode),
    /// See [`ButtonListener::on_press`].
    Press(ButtonPress),
    /// See [`ButtonListener::on_hold_start`].
    HoldStart {
        /// Timer was idle before.
        first: bool,
    },
    /// See [`ButtonListener::on_hold_end`].
    HoldEnd {
        /// Timer ran to completion.
        completed: bool,
    },
}

/// Collects events into a fixed-capacity buffer; events past capacity are
/// dropped.
impl<const N: usize> ButtonListener for HVec<ButtonEvent, N> {
    fn on_mode_change(&mut self, mode: Mode) {
        let _ = self.push(ButtonEvent::ModeChange(mode));
    }

    fn on_press(&mut self, press: ButtonPress) {
        let _ = self.push(ButtonEvent::Press(press));
    }

    fn on_hold_start(&mut self, first: bool) {
        let _ = self.push(ButtonEvent::HoldStart { first });
    }

    fn on_hold_end(&mut self, completed: bool) {
        let _ = self.push(ButtonEvent::HoldEnd { completed });
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// State of the current press session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressSession {
    /// Buttons held now.
    pub current: u8,
    /// Buttons held at any point this session.
    pub cumulative: u8,
    /// Buttons pressed on the last update.
    pub added: u8,
    /// Buttons released on the last update.
    pub removed: u8,
    /// Whether the long-press timer is running.
    pub hold_active: bool,
    /// When the long-press timer was last (re)started.
    pub hold_started_ms: u32,
    /// Whether this session already produced its event.
    pub event_fired: bool,
}

/// Turns sampled button vectors into presses and mode changes.
#[derive(Clone, Debug)]
pub struct ButtonClassifier {
    roles: RoleMasks,
    long_press_ms: u32,
    mode_count: u8,
    mode: Mode,
    session: PressSession,
}

impl ButtonClassifier {
    /// Create a classifier. The initial mode is number 0 with no mode bits.
    pub fn new(roles: RoleMasks, long_press_ms: u32, mode_count: u8) -> Self {
        Self {
            roles,
            long_press_ms,
            mode_count,
            mode: Mode::default(),
            session: PressSession::default(),
        }
    }

    /// Feed one sample of the button vector.
    ///
    /// Call once per poll tick. Listener methods are invoked synchronously;
    /// at most one of `on_press`/`on_mode_change` fires per session.
    pub fn update<L: ButtonListener + ?Sized>(&mut self, raw: u8, now_ms: u32, listener: &mut L) {
        let s = &mut self.session;
        s.added = !s.current & raw;
        s.removed = s.current & !raw;
        s.current = raw;
        s.cumulative |= raw;

        if self.roles.normal.any(s.added) || self.roles.modifier.any(s.added) {
            self.restart_hold(now_ms, listener);
        } else if self.roles.mode.any(self.session.cumulative) {
            // Mode buttons never count towards a long press
            self.stop_hold(false, now_ms, listener);
        }

        if !self.session.event_fired {
            let released = self.session.current == 0 && self.session.removed != 0;
            if released || self.hold_expired(now_ms) {
                if self.roles.mode.any(self.session.cumulative) {
                    self.fire_mode_change(listener);
                } else {
                    self.fire_press(now_ms, listener);
                }
                self.stop_hold(true, now_ms, listener);
                self.session.event_fired = true;
            }
        } else if self.session.current == 0 {
            // Close the session only on an all-released sample after the
            // one that fired; presses before that fold into this session
            self.stop_hold(false, now_ms, listener);
            self.session.cumulative = 0;
            self.session.event_fired = false;
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current session state.
    pub fn session(&self) -> &PressSession {
        &self.session
    }

    /// Role configuration.
    pub fn roles(&self) -> &RoleMasks {
        &self.roles
    }

    /// Long-press duration in milliseconds.
    pub fn long_press_ms(&self) -> u32 {
        self.long_press_ms
    }

    /// Number of modes per mode group.
    pub fn mode_count(&self) -> u8 {
        self.mode_count
    }

    fn fire_mode_change<L: ButtonListener + ?Sized>(&mut self, listener: &mut L) {
        let cumulative = self.session.cumulative;
        let buttons = self.roles.normal.bits(cumulative);
        let kind = self.roles.mode.bits(cumulative);

        let number = if buttons != 0 {
            // An explicit selection wins over cycling
            buttons.trailing_zeros() as u8
        } else if kind == self.mode.kind {
            (self.mode.number.wrapping_add(1)) % self.mode_count.max(1)
        } else {
            0
        };

        self.mode = Mode::new(number, kind);
        debug!("mode change: number {} kind {:#04b}", number, kind);
        listener.on_mode_change(self.mode);
    }

    fn fire_press<L: ButtonListener + ?Sized>(&mut self, now_ms: u32, listener: &mut L) {
        let cumulative = self.session.cumulative;
        let press = ButtonPress {
            mode: self.mode,
            modifiers: self.roles.modifier.bits(cumulative),
            long_press: self.hold_expired(now_ms),
            buttons: self.roles.normal.bits(cumulative),
        };
        debug!(
            "press: buttons {:#07b} modifiers {:#03b} long {}",
            press.buttons, press.modifiers, press.long_press
        );
        listener.on_press(press);
    }

    fn restart_hold<L: ButtonListener + ?Sized>(&mut self, now_ms: u32, listener: &mut L) {
        let first = !self.session.hold_active;
        trace!("hold timer start (first: {})", first);
        listener.on_hold_start(first);
        self.session.hold_active = true;
        self.session.hold_started_ms = now_ms;
    }

    fn stop_hold<L: ButtonListener + ?Sized>(&mut self, finished: bool, now_ms: u32, listener: &mut L) {
        if self.session.hold_active {
            let completed = finished && self.hold_expired(now_ms);
            trace!("hold timer stop (completed: {})", completed);
            listener.on_hold_end(completed);
        }
        self.session.hold_active = false;
    }

    fn hold_expired(&self, now_ms: u32) -> bool {
        self.session.hold_active
            && now_ms.wrapping_sub(self.session.hold_started_ms) >= self.long_press_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Events = HVec<ButtonEvent, 16>;

    fn classifier() -> ButtonClassifier {
        ButtonClassifier::new(RoleMasks::default(), 750, 5)
    }

    fn presses(events: &Events) -> HVec<ButtonPress, 16> {
        events
            .iter()
            .filter_map(|e| match e {
                ButtonEvent::Press(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn modes(events: &Events) -> HVec<Mode, 16> {
        events
            .iter()
            .filter_map(|e| match e {
                ButtonEvent::ModeChange(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn role_bits_are_role_relative() {
        let roles = RoleMasks::default();
        assert_eq!(roles.normal.bits(0x10), 0b10000);
        assert_eq!(roles.mode.bits(0x80), 0b10);
        assert_eq!(roles.mode.bits(0xA0), 0b11);
        assert_eq!(roles.modifier.bits(0x40), 0b1);
        assert_eq!(roles.modifier.bits(0x3F), 0);
    }

    #[test]
    fn role_truncates_extra_masks() {
        let role = Role::new(&[1, 2, 4, 8, 16, 32, 64, 128, 1]);
        assert_eq!(role.len(), MAX_ROLE_MASKS);
    }

    #[test]
    fn multi_bit_mask_reports_one_bit() {
        let roles = RoleMasks::new(&[0x03, 0x04], &[], &[]);
        assert_eq!(roles.normal.bits(0x02), 0b01);
        assert_eq!(roles.normal.bits(0x07), 0b11);
    }

    #[test]
    fn short_press_on_release() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x01, 0, &mut events);
        assert!(presses(&events).is_empty());

        c.update(0x00, 100, &mut events);
        let p = presses(&events);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].buttons, 0b1);
        assert!(!p[0].long_press);
        assert_eq!(p[0].modifiers, 0);
    }

    #[test]
    fn hold_start_and_end_around_short_press() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x02, 0, &mut events);
        c.update(0x00, 100, &mut events);
        assert_eq!(events.first(), Some(&ButtonEvent::HoldStart { first: true }));
        assert_eq!(events.last(), Some(&ButtonEvent::HoldEnd { completed: false }));
    }

    #[test]
    fn long_press_fires_while_held() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x04, 0, &mut events);
        c.update(0x04, 749, &mut events);
        assert!(presses(&events).is_empty());

        c.update(0x04, 750, &mut events);
        let p = presses(&events);
        assert_eq!(p.len(), 1);
        assert!(p[0].long_press);
        assert_eq!(events.last(), Some(&ButtonEvent::HoldEnd { completed: true }));

        // Release closes the session without another event
        c.update(0x00, 900, &mut events);
        assert_eq!(presses(&events).len(), 1);
        assert_eq!(c.session().cumulative, 0);
    }

    #[test]
    fn new_button_restarts_long_press_window() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x01, 0, &mut events);
        c.update(0x03, 500, &mut events);
        assert_eq!(events[1], ButtonEvent::HoldStart { first: false });

        c.update(0x03, 1000, &mut events);
        assert!(presses(&events).is_empty());

        c.update(0x03, 1250, &mut events);
        let p = presses(&events);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].buttons, 0b11);
        assert!(p[0].long_press);
    }

    #[test]
    fn modifier_reported_with_press() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x40, 0, &mut events);
        c.update(0x48, 10, &mut events);
        c.update(0x00, 20, &mut events);
        let p = presses(&events);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].modifiers, 0b1);
        assert_eq!(p[0].buttons, 0b1000);
    }

    #[test]
    fn partial_release_does_not_fire() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x03, 0, &mut events);
        c.update(0x01, 50, &mut events);
        assert!(presses(&events).is_empty());
        c.update(0x00, 60, &mut events);
        assert_eq!(presses(&events)[0].buttons, 0b11);
    }

    #[test]
    fn idle_samples_are_noop() {
        let mut c = classifier();
        let mut events = Events::new();
        for t in 0..10 {
            c.update(0x00, t * 100, &mut events);
        }
        assert!(events.is_empty());
    }

    #[test]
    fn first_mode_session_starts_at_zero() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x20, 0, &mut events);
        c.update(0x00, 50, &mut events);
        assert_eq!(modes(&events).as_slice(), &[Mode::new(0, 0b01)]);
        assert!(presses(&events).is_empty());
    }

    #[test]
    fn mode_hold_never_times_out() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x80, 0, &mut events);
        c.update(0x80, 5000, &mut events);
        assert!(events.is_empty());
        c.update(0x00, 5001, &mut events);
        assert_eq!(modes(&events).as_slice(), &[Mode::new(0, 0b10)]);
    }

    #[test]
    fn mode_cycles_and_wraps() {
        let mut c = ButtonClassifier::new(RoleMasks::default(), 750, 3);
        let mut events = Events::new();
        for i in 0..5u32 {
            c.update(0x20, i * 100, &mut events);
            c.update(0x00, i * 100 + 50, &mut events);
            c.update(0x00, i * 100 + 60, &mut events);
        }
        let numbers: HVec<u8, 16> = modes(&events).iter().map(|m| m.number).collect();
        assert_eq!(numbers.as_slice(), &[0, 1, 2, 0, 1]);
    }

    #[test]
    fn other_mode_button_resets_number() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x20, 0, &mut events);
        c.update(0x00, 10, &mut events);
        c.update(0x00, 15, &mut events);
        c.update(0x20, 20, &mut events);
        c.update(0x00, 30, &mut events);
        c.update(0x00, 35, &mut events);
        assert_eq!(c.mode(), Mode::new(1, 0b01));

        c.update(0x80, 40, &mut events);
        c.update(0x00, 50, &mut events);
        assert_eq!(c.mode(), Mode::new(0, 0b10));
    }

    #[test]
    fn explicit_selection_overrides_cycling() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x20, 0, &mut events);
        c.update(0x28, 10, &mut events);
        c.update(0x00, 20, &mut events);
        assert_eq!(c.mode(), Mode::new(3, 0b01));
        assert!(presses(&events).is_empty());
    }

    #[test]
    fn mode_button_cancels_running_long_press() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x02, 0, &mut events);
        c.update(0x22, 100, &mut events);
        assert_eq!(events.last(), Some(&ButtonEvent::HoldEnd { completed: false }));

        // Long past the press duration, still nothing fires
        c.update(0x22, 2000, &mut events);
        assert!(modes(&events).is_empty());

        c.update(0x00, 2100, &mut events);
        assert_eq!(modes(&events).as_slice(), &[Mode::new(1, 0b01)]);
    }

    #[test]
    fn press_carries_current_mode() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x80, 0, &mut events);
        c.update(0x00, 10, &mut events);
        c.update(0x00, 15, &mut events);
        c.update(0x10, 20, &mut events);
        c.update(0x00, 30, &mut events);
        assert_eq!(presses(&events)[0].mode, Mode::new(0, 0b10));
    }

    #[test]
    fn long_press_across_clock_wrap() {
        let mut c = classifier();
        let mut events = Events::new();
        let start = u32::MAX - 100;
        c.update(0x01, start, &mut events);
        c.update(0x01, start.wrapping_add(749), &mut events);
        assert!(presses(&events).is_empty());
        c.update(0x01, start.wrapping_add(750), &mut events);
        assert!(presses(&events)[0].long_press);
    }

    #[test]
    fn unit_listener_drops_everything() {
        let mut c = classifier();
        c.update(0x01, 0, &mut ());
        c.update(0x00, 10, &mut ());
        c.update(0x00, 20, &mut ());
        assert_eq!(c.session().cumulative, 0);
        assert!(!c.session().event_fired);
    }

    #[test]
    fn session_stays_open_until_an_idle_sample() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x01, 0, &mut events);
        c.update(0x00, 10, &mut events);
        assert!(c.session().event_fired);
        assert_eq!(c.session().cumulative, 0x01);

        c.update(0x00, 20, &mut events);
        assert!(!c.session().event_fired);
        assert_eq!(c.session().cumulative, 0);
    }

    #[test]
    fn immediate_repress_joins_fired_session() {
        let mut c = classifier();
        let mut events = Events::new();
        c.update(0x01, 0, &mut events);
        c.update(0x00, 10, &mut events);
        c.update(0x02, 20, &mut events);
        c.update(0x00, 30, &mut events);
        assert_eq!(presses(&events).len(), 1);
        assert_eq!(events.last(), Some(&ButtonEvent::HoldEnd { completed: false }));
        assert!(!c.session().hold_active);

        // An idle sample in between starts a fresh session
        c.update(0x00, 40, &mut events);
        c.update(0x02, 50, &mut events);
        c.update(0x00, 60, &mut events);
        let p = presses(&events);
        assert_eq!(p.len(), 2);
        assert_eq!(p[1].buttons, 0b10);
    }

    #[test]
    fn mode_packing() {
        assert_eq!(Mode::new(3, 0b01).packed(2), 0b1101);
        assert_eq!(Mode::new(0, 0b10).packed(2), 0b10);
    }
}
