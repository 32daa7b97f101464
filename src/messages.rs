//! Wire formats for publishing panel events and parsing remote commands.
//!
//! Outbound events are JSON objects that also carry the *packed code* older
//! peers understand. Inbound payloads accept either plain text (`"1"`,
//! `"on"`, `"31744"`) or a small JSON object, so they can be typed by hand
//! into any MQTT client.
//!
//! The types are `no_std` compatible and can be (de)serialized with either
//! `serde_json` (desktop) or `serde-json-core` (embedded).
//!
//! # Packed codes
//!
//! With `n` normal masks, `m` modifier masks and `k` mode masks:
//!
//! ```text
//! mode  = number << k | mode_type
//! press = buttons | long_press << n | modifiers << (n + 1) | mode << (n + 1 + m)
//! ```
//!
//! # Example
//!
//! ```
//! use wallpanel::buttons::{ButtonPress, Mode, RoleMasks};
//! use wallpanel::messages::PressMessage;
//!
//! let press = ButtonPress {
//!     mode: Mode::new(1, 0b01),
//!     modifiers: 0b1,
//!     long_press: true,
//!     buttons: 0b00100,
//! };
//! let msg = PressMessage::new(&press, &RoleMasks::default());
//! // 0b101 << 7 | 1 << 6 | 1 << 5 | 0b00100
//! assert_eq!(msg.code, 0b101_1_1_00100);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::buttons::{ButtonPress, Mode, RoleMasks};
use crate::colour::Colour;
use crate::lighting::LightId;
use crate::panel::PanelCommand;

// ============================================================================
// Packed codes
// ============================================================================

/// Pack a mode as `number << mode_mask_count | mode_type`.
pub fn pack_mode(mode: Mode, roles: &RoleMasks) -> u16 {
    mode.packed(roles.mode.len() as u32)
}

/// Pack a press as
/// `buttons | long << n | modifiers << (n + 1) | mode << (n + 1 + m)`.
pub fn pack_press(press: &ButtonPress, roles: &RoleMasks) -> u64 {
    let n = roles.normal.len() as u32;
    let m = roles.modifier.len() as u32;
    u64::from(press.buttons)
        | u64::from(press.long_press) << n
        | u64::from(press.modifiers) << (n + 1)
        | u64::from(pack_mode(press.mode, roles)) << (n + 1 + m)
}

// ============================================================================
// Outbound Types
// ============================================================================

/// Published on `button/press`.
///
/// # JSON Example
///
/// ```json
/// {"buttons":4,"modifiers":1,"long_press":true,"mode":1,"mode_type":1,"code":740}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressMessage {
    /// Role-relative normal bits
    pub buttons: u8,
    /// Role-relative modifier bits
    pub modifiers: u8,
    /// Whether the press was long
    pub long_press: bool,
    /// Mode number
    pub mode: u8,
    /// Mode type bits
    pub mode_type: u8,
    /// Packed press code
    pub code: u64,
}

impl PressMessage {
    /// Build the message for a press.
    pub fn new(press: &ButtonPress, roles: &RoleMasks) -> Self {
        Self {
            buttons: press.buttons,
            modifiers: press.modifiers,
            long_press: press.long_press,
            mode: press.mode.number,
            mode_type: press.mode.kind,
            code: pack_press(press, roles),
        }
    }
}

/// Published on `button/mode`.
///
/// # JSON Example
///
/// ```json
/// {"mode":2,"mode_type":1,"code":9}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeMessage {
    /// Mode number
    pub mode: u8,
    /// Mode type bits
    pub mode_type: u8,
    /// Packed mode code
    pub code: u16,
}

impl ModeMessage {
    /// Build the message for a mode.
    pub fn new(mode: Mode, roles: &RoleMasks) -> Self {
        Self {
            mode: mode.number,
            mode_type: mode.kind,
            code: pack_mode(mode, roles),
        }
    }
}

/// Retained payload for a light state topic.
pub const fn light_payload(on: bool) -> &'static [u8] {
    if on {
        b"1"
    } else {
        b"0"
    }
}

// ============================================================================
// Inbound Types
// ============================================================================

/// JSON form of a light request.
///
/// ```json
/// {"on": true}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLightRequest {
    /// Requested state
    pub on: bool,
}

/// JSON form of an indicator colour request (15-bit encoded).
///
/// ```json
/// {"colour": 31744}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetColourRequest {
    /// 15-bit colour, see [`Colour::from_rgb15`]
    pub colour: u16,
}

/// Why an inbound message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Topic suffix is not a command topic
    UnknownTopic,
    /// Payload could not be understood for this topic
    InvalidPayload,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownTopic => f.write_str("unknown command topic"),
            ParseError::InvalidPayload => f.write_str("invalid payload"),
        }
    }
}

/// Command topics, relative to the topic prefix.
pub const COMMAND_TOPICS: [&str; 5] = [
    "light_kitchen/set",
    "light_lounge/set",
    "lights/toggle",
    "set_rgbled",
    "set_rgbled_instant",
];

fn text(payload: &[u8]) -> Option<&str> {
    core::str::from_utf8(payload).ok().map(str::trim)
}

/// Parse a light state: `1`/`0`, `on`/`off`, `true`/`false` or
/// `{"on": bool}`.
///
/// # Example
///
/// ```
/// use wallpanel::messages::parse_switch_state;
///
/// assert_eq!(parse_switch_state(b"ON"), Some(true));
/// assert_eq!(parse_switch_state(b" 0\n"), Some(false));
/// assert_eq!(parse_switch_state(b"maybe"), None);
/// ```
pub fn parse_switch_state(payload: &[u8]) -> Option<bool> {
    let s = text(payload)?;
    if s == "1" || s.eq_ignore_ascii_case("on") || s.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if s == "0" || s.eq_ignore_ascii_case("off") || s.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    parse_light_request(payload).map(|req| req.on)
}

/// Parse a 15-bit colour: decimal, `0x`-prefixed hex or
/// `{"colour": u16}`.
///
/// # Example
///
/// ```
/// use wallpanel::messages::parse_colour;
/// use wallpanel::Colour;
///
/// assert_eq!(parse_colour(b"31"), Some(Colour::new(248, 0, 0)));
/// assert_eq!(parse_colour(b"0x03E0"), Some(Colour::new(0, 248, 0)));
/// ```
pub fn parse_colour(payload: &[u8]) -> Option<Colour> {
    let s = text(payload)?;
    let encoded = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u16>().ok()
    };
    encoded
        .or_else(|| parse_colour_request(payload).map(|req| req.colour))
        .map(Colour::from_rgb15)
}

/// Turn a command topic suffix and payload into a [`PanelCommand`].
///
/// `fast_fade_ms` is the fade duration used by `set_rgbled`.
///
/// # Example
///
/// ```
/// use wallpanel::messages::parse_command;
/// use wallpanel::{LightId, PanelCommand};
///
/// let cmd = parse_command("light_lounge/set", b"off", 250).unwrap();
/// assert_eq!(cmd, PanelCommand::SetLight { light: LightId::Lounge, on: false });
/// ```
pub fn parse_command(
    suffix: &str,
    payload: &[u8],
    fast_fade_ms: u32,
) -> Result<PanelCommand, ParseError> {
    let light = |light: LightId| {
        parse_switch_state(payload)
            .map(|on| PanelCommand::SetLight { light, on })
            .ok_or(ParseError::InvalidPayload)
    };
    let colour = |duration_ms: u32| {
        parse_colour(payload)
            .map(|colour| PanelCommand::SetColour {
                colour,
                duration_ms,
            })
            .ok_or(ParseError::InvalidPayload)
    };

    match suffix {
        "light_kitchen/set" => light(LightId::Kitchen),
        "light_lounge/set" => light(LightId::Lounge),
        "lights/toggle" => Ok(PanelCommand::ToggleLights),
        "set_rgbled" => colour(fast_fade_ms),
        "set_rgbled_instant" => colour(0),
        _ => Err(ParseError::UnknownTopic),
    }
}

// ============================================================================
// Parsing Functions (using serde-json-core for no_std compatibility)
// ============================================================================

/// Parse a JSON light request.
#[cfg(feature = "serde-json-core")]
pub fn parse_light_request(json: &[u8]) -> Option<SetLightRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a JSON light request.
#[cfg(not(feature = "serde-json-core"))]
pub fn parse_light_request(_json: &[u8]) -> Option<SetLightRequest> {
    None
}

/// Parse a JSON colour request.
///
/// # Example
///
/// ```
/// use wallpanel::messages::parse_colour_request;
///
/// let req = parse_colour_request(br#"{"colour": 31744}"#).unwrap();
/// assert_eq!(req.colour, 0x7C00);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_colour_request(json: &[u8]) -> Option<SetColourRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a JSON colour request.
#[cfg(not(feature = "serde-json-core"))]
pub fn parse_colour_request(_json: &[u8]) -> Option<SetColourRequest> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(buttons: u8, modifiers: u8, long_press: bool, mode: Mode) -> ButtonPress {
        ButtonPress {
            mode,
            modifiers,
            long_press,
            buttons,
        }
    }

    // =========================================================================
    // Packed codes
    // =========================================================================

    #[test]
    fn pack_plain_short_press() {
        let roles = RoleMasks::default();
        assert_eq!(pack_press(&press(0b1, 0, false, Mode::default()), &roles), 1);
    }

    #[test]
    fn pack_long_flag_sits_above_buttons() {
        let roles = RoleMasks::default();
        assert_eq!(
            pack_press(&press(0b10000, 0, true, Mode::default()), &roles),
            0b1_10000
        );
    }

    #[test]
    fn pack_mode_into_high_bits() {
        let roles = RoleMasks::default();
        // mode = 2 << 2 | 0b10 = 0b1010, shifted by 5 + 1 + 1
        assert_eq!(
            pack_press(&press(0, 0, false, Mode::new(2, 0b10)), &roles),
            0b1010 << 7
        );
        assert_eq!(pack_mode(Mode::new(2, 0b10), &roles), 0b1010);
    }

    #[test]
    fn pack_follows_role_sizes() {
        let roles = RoleMasks::new(&[0x01, 0x02], &[0x04], &[0x08, 0x10]);
        // n = 2, m = 2, k = 1
        let p = press(0b11, 0b10, true, Mode::new(1, 0b1));
        assert_eq!(pack_press(&p, &roles), 0b11 | 1 << 2 | 0b10 << 3 | 0b11 << 5);
    }

    // =========================================================================
    // Inbound parsing
    // =========================================================================

    #[test]
    fn switch_state_forms() {
        for on in [&b"1"[..], b"on", b"True", br#"{"on": true}"#] {
            assert_eq!(parse_switch_state(on), Some(true));
        }
        for off in [&b"0"[..], b"OFF", b"false", br#"{"on":false}"#] {
            assert_eq!(parse_switch_state(off), Some(false));
        }
        assert_eq!(parse_switch_state(b"2"), None);
        assert_eq!(parse_switch_state(&[0xff]), None);
    }

    #[test]
    fn colour_forms() {
        assert_eq!(parse_colour(b"31744"), Some(Colour::new(0, 0, 248)));
        assert_eq!(parse_colour(b"0x7FFF"), Some(Colour::new(248, 248, 248)));
        assert_eq!(parse_colour(br#"{"colour": 992}"#), Some(Colour::new(0, 248, 0)));
        assert_eq!(parse_colour(b"-1"), None);
        assert_eq!(parse_colour(b"red"), None);
    }

    #[test]
    fn command_topics() {
        assert_eq!(
            parse_command("light_kitchen/set", b"1", 250),
            Ok(PanelCommand::SetLight {
                light: LightId::Kitchen,
                on: true
            })
        );
        assert_eq!(
            parse_command("lights/toggle", b"", 250),
            Ok(PanelCommand::ToggleLights)
        );
        assert_eq!(
            parse_command("set_rgbled", b"31", 250),
            Ok(PanelCommand::SetColour {
                colour: Colour::new(248, 0, 0),
                duration_ms: 250
            })
        );
        assert_eq!(
            parse_command("set_rgbled_instant", b"31", 250),
            Ok(PanelCommand::SetColour {
                colour: Colour::new(248, 0, 0),
                duration_ms: 0
            })
        );
    }

    #[test]
    fn command_rejections() {
        assert_eq!(
            parse_command("light_hall/set", b"1", 250),
            Err(ParseError::UnknownTopic)
        );
        assert_eq!(
            parse_command("light_kitchen/set", b"dim", 250),
            Err(ParseError::InvalidPayload)
        );
    }

    #[test]
    fn every_command_topic_is_known() {
        for topic in COMMAND_TOPICS {
            assert_ne!(
                parse_command(topic, b"1", 250),
                Err(ParseError::UnknownTopic)
            );
        }
    }

    // =========================================================================
    // Outbound serialization
    // =========================================================================

    #[test]
    fn mode_message_fields() {
        let msg = ModeMessage::new(Mode::new(3, 0b01), &RoleMasks::default());
        assert_eq!(msg.mode, 3);
        assert_eq!(msg.mode_type, 1);
        assert_eq!(msg.code, 0b1101);
    }

    #[cfg(feature = "std")]
    #[test]
    fn press_message_serialize() {
        let p = press(0b100, 0b1, true, Mode::new(1, 0b01));
        let json = serde_json::to_string(&PressMessage::new(&p, &RoleMasks::default())).unwrap();
        assert!(json.contains("\"buttons\":4"));
        assert!(json.contains("\"long_press\":true"));
        assert!(json.contains("\"code\":740"));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn press_message_serialize_no_std() {
        let p = press(0b1, 0, false, Mode::default());
        let mut buf = [0u8; 128];
        let len = serde_json_core::to_slice(&PressMessage::new(&p, &RoleMasks::default()), &mut buf).unwrap();
        let (back, _): (PressMessage, _) = serde_json_core::from_slice(&buf[..len]).unwrap();
        assert_eq!(back.code, 1);
    }

    #[test]
    fn light_payloads() {
        assert_eq!(light_payload(true), b"1");
        assert_eq!(light_payload(false), b"0");
    }
}
