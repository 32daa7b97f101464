//! Panel configuration shared by embedded and desktop builds.
//!
//! Uses `heapless` containers for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use wallpanel::config::{ButtonConfig, Config, MqttConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.buttons.long_press_ms, 500);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_buttons(ButtonConfig::default().with_long_press_ms(750))
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"));
//! ```

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::buttons::RoleMasks;
use crate::colour::Colour;
use crate::lighting::{ActuatorTiming, LightId, ServoAngles};
use crate::sequencer::DEFAULT_UPDATE_PERIOD_MS;

/// Maximum length for short config strings (hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (full topics)
pub const MAX_LONG_STRING: usize = 128;

/// Maximum number of indicator palette entries.
pub const MAX_PALETTE: usize = 8;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

/// Indicator colours indexed by mode number.
pub type Palette = HVec<Colour, MAX_PALETTE>;

// ============================================================================
// Helpers for creating heapless strings
// ============================================================================

fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    // Longest prefix that fits and ends on a char boundary
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= N)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete panel configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Button layout and timing
    pub buttons: ButtonConfig,
    /// Indicator LED behaviour
    pub indicator: IndicatorConfig,
    /// Light switch servos
    pub lights: LightConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Set button configuration
    pub fn with_buttons(mut self, buttons: ButtonConfig) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set indicator configuration
    pub fn with_indicator(mut self, indicator: IndicatorConfig) -> Self {
        self.indicator = indicator;
        self
    }

    /// Set light configuration
    pub fn with_lights(mut self, lights: LightConfig) -> Self {
        self.lights = lights;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Button Config
// ============================================================================

/// Button classifier configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonConfig {
    /// Hold duration that turns a press into a long press
    pub long_press_ms: u32,
    /// Modes per mode group
    pub mode_count: u8,
    /// Role of every button
    pub roles: RoleMasks,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            mode_count: 5,
            roles: RoleMasks::default(),
        }
    }
}

impl ButtonConfig {
    /// Set the long-press duration
    pub fn with_long_press_ms(mut self, ms: u32) -> Self {
        self.long_press_ms = ms;
        self
    }

    /// Set the number of modes per group (at least one)
    pub fn with_mode_count(mut self, count: u8) -> Self {
        self.mode_count = count.max(1);
        self
    }

    /// Set the button roles
    pub fn with_roles(mut self, roles: RoleMasks) -> Self {
        self.roles = roles;
        self
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// Indicator LED configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorConfig {
    /// Length of one fade step
    pub update_period_ms: u32,
    /// Fade duration used by `set_rgbled`
    pub fast_fade_ms: u32,
    /// Colour shown for each mode number
    pub palette: Palette,
    /// Colour faded towards while a long press builds up
    pub hold_colour: Colour,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        let mut palette = Palette::new();
        let _ = palette.extend_from_slice(&[
            Colour::RED,
            Colour::GREEN,
            Colour::BLUE,
            Colour::new(255, 160, 0),
            Colour::new(160, 0, 255),
        ]);
        Self {
            update_period_ms: DEFAULT_UPDATE_PERIOD_MS,
            fast_fade_ms: 250,
            palette,
            hold_colour: Colour::WHITE,
        }
    }
}

impl IndicatorConfig {
    /// Set the fade step length
    pub fn with_update_period_ms(mut self, ms: u32) -> Self {
        self.update_period_ms = ms.max(1);
        self
    }

    /// Set the fast fade duration
    pub fn with_fast_fade_ms(mut self, ms: u32) -> Self {
        self.fast_fade_ms = ms;
        self
    }

    /// Replace the palette; entries past [`MAX_PALETTE`] are dropped
    pub fn with_palette(mut self, colours: &[Colour]) -> Self {
        self.palette.clear();
        let take = colours.len().min(MAX_PALETTE);
        let _ = self.palette.extend_from_slice(&colours[..take]);
        self
    }

    /// Set the hold feedback colour
    pub fn with_hold_colour(mut self, colour: Colour) -> Self {
        self.hold_colour = colour;
        self
    }

    /// Palette colour for a mode number, wrapping around the palette.
    /// Black when the palette is empty.
    pub fn mode_colour(&self, number: u8) -> Colour {
        if self.palette.is_empty() {
            return Colour::BLACK;
        }
        self.palette[usize::from(number) % self.palette.len()]
    }
}

// ============================================================================
// Light Config
// ============================================================================

/// Light switch servo configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightConfig {
    /// Kitchen servo angles
    pub kitchen: ServoAngles,
    /// Lounge servo angles
    pub lounge: ServoAngles,
    /// Settle and detach timing shared by both servos
    pub timing: ActuatorTiming,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            kitchen: ServoAngles::new(120, 90, 60),
            lounge: ServoAngles::new(115, 90, 65),
            timing: ActuatorTiming::default(),
        }
    }
}

impl LightConfig {
    /// Set the kitchen angles
    pub fn with_kitchen(mut self, angles: ServoAngles) -> Self {
        self.kitchen = angles;
        self
    }

    /// Set the lounge angles
    pub fn with_lounge(mut self, angles: ServoAngles) -> Self {
        self.lounge = angles;
        self
    }

    /// Set the actuator timing
    pub fn with_timing(mut self, timing: ActuatorTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Angles for one light
    pub fn angles(&self, light: LightId) -> ServoAngles {
        match light {
            LightId::Kitchen => self.kitchen,
            LightId::Lounge => self.lounge,
        }
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic prefix for all pub/sub (e.g., "livingroom" -> "livingroom/button/press")
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Whether MQTT is enabled
    pub enabled: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: 1883,
            client_id: short_string("wallpanel"),
            topic_prefix: short_string("livingroom"),
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 30,
            enabled: true,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Enable or disable MQTT
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build a topic string with the configured prefix
    pub fn topic(&self, suffix: &str) -> LongString {
        let mut topic = LongString::new();
        let _ = topic.push_str(self.topic_prefix.as_str());
        let _ = topic.push('/');
        let _ = topic.push_str(suffix);
        topic
    }

    /// Strip the prefix (and separator) from a full topic.
    pub fn suffix<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(self.topic_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
    /// Device ID (for several panels on one broker)
    pub id: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("Living room panel"),
            id: short_string("panel1"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the device ID
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = short_string(id);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
