//! MQTT bridge for the panel, built on `rumqttc`.
//!
//! Subscribes to command topics and publishes panel events:
//!
//! **Subscribe Topics:**
//! - `livingroom/light_kitchen/set` - `1`/`0`, `on`/`off` or `{"on": true}`
//! - `livingroom/light_lounge/set` - same forms
//! - `livingroom/lights/toggle` - Toggle both lights (any payload)
//! - `livingroom/set_rgbled` - Fast fade to a 15-bit colour (`31744` or `{"colour": 31744}`)
//! - `livingroom/set_rgbled_instant` - Snap to a 15-bit colour
//!
//! **Publish Topics:**
//! - `livingroom/button/press` - Press JSON with packed code
//! - `livingroom/button/mode` - Mode JSON with packed code
//! - `livingroom/light_kitchen` / `livingroom/light_lounge` - `0`/`1` (retained)
//!
//! # Ownership
//!
//! The panel is owned by a single tick loop. The network side never touches
//! it: inbound commands are sent to the loop over a `tokio::sync::mpsc`
//! channel, and the loop publishes through [`AsyncMqttBus`], which only
//! enqueues into the `rumqttc` request channel.
//!
//! ```ignore
//! let service = MqttService::new(&config);
//! let bus = service.bus(&config);
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//! tokio::spawn(service.run(tx));
//! ```

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use crate::buttons::RoleMasks;
use crate::config::{Config, MqttConfig as SharedMqttConfig};
use crate::messages::{light_payload, parse_command, ModeMessage, PressMessage, COMMAND_TOPICS};
use crate::panel::{PanelCommand, PanelEvent, PanelState};
use crate::traits::EventBus;
use crate::LightId;

/// Requests buffered between the bus and the event loop.
const REQUEST_CAPACITY: usize = 32;

/// Pause after a connection error before polling again.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Configuration
// ============================================================================

/// Runtime MQTT client configuration for `rumqttc`.
///
/// This struct uses `String` for runtime compatibility with the `rumqttc` library.
/// For embedded/no-alloc contexts, use [`crate::config::MqttConfig`] which uses
/// fixed-size `ShortString` types and convert with [`MqttRuntimeConfig::from_config`].
#[derive(Debug, Clone)]
pub struct MqttRuntimeConfig {
    /// MQTT broker hostname
    pub host: String,
    /// MQTT broker port
    pub port: u16,
    /// Client ID
    pub client_id: String,
    /// Topic prefix (default: "livingroom")
    pub topic_prefix: String,
    /// Username, empty for none
    pub username: String,
    /// Password
    pub password: String,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
}

impl Default for MqttRuntimeConfig {
    fn default() -> Self {
        Self::from_config(&SharedMqttConfig::default())
    }
}

impl MqttRuntimeConfig {
    /// Create a new config with the given broker address
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create from shared MqttConfig
    pub fn from_config(config: &SharedMqttConfig) -> Self {
        Self {
            host: config.host.as_str().to_string(),
            port: config.port,
            client_id: config.client_id.as_str().to_string(),
            topic_prefix: config.topic_prefix.as_str().to_string(),
            username: config.username.as_str().to_string(),
            password: config.password.as_str().to_string(),
            keep_alive_secs: config.keep_alive_secs,
        }
    }

    /// Set the client ID
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set the topic prefix
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Full topic for a suffix.
    pub fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.topic_prefix, suffix)
    }

    fn suffix<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(self.topic_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        if !self.username.is_empty() {
            options.set_credentials(&self.username, &self.password);
        }
        options
    }
}

// ============================================================================
// Errors
// ============================================================================

/// MQTT-related errors
#[derive(Debug)]
pub enum MqttError {
    /// Failed to subscribe to topic
    Subscribe(String),
    /// Failed to publish message
    Publish(String),
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MqttError::Subscribe(e) => write!(f, "MQTT subscribe failed: {}", e),
            MqttError::Publish(e) => write!(f, "MQTT publish failed: {}", e),
        }
    }
}

impl std::error::Error for MqttError {}

// ============================================================================
// Event Bus
// ============================================================================

/// One outbound MQTT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Full topic.
    pub topic: String,
    /// Payload bytes.
    pub payload: Vec<u8>,
    /// Retain flag.
    pub retain: bool,
}

/// [`EventBus`] that enqueues events on a `rumqttc` client without waiting.
#[derive(Clone)]
pub struct AsyncMqttBus {
    client: AsyncClient,
    config: MqttRuntimeConfig,
    roles: RoleMasks,
}

impl AsyncMqttBus {
    /// Wrap a client.
    pub fn new(client: AsyncClient, config: MqttRuntimeConfig, roles: RoleMasks) -> Self {
        Self {
            client,
            config,
            roles,
        }
    }

    /// Publish both light states (retained).
    pub fn announce(&mut self, state: &PanelState) {
        for (light, on) in [(LightId::Kitchen, state.kitchen), (LightId::Lounge, state.lounge)] {
            self.publish(&PanelEvent::LightChanged { light, on });
        }
    }

    /// Build the MQTT message for an event.
    pub fn encode(&self, event: &PanelEvent) -> Result<Outbound, MqttError> {
        let json = |suffix: &str, payload: serde_json::Result<Vec<u8>>| {
            payload
                .map(|payload| Outbound {
                    topic: self.config.topic(suffix),
                    payload,
                    retain: false,
                })
                .map_err(|e| MqttError::Publish(e.to_string()))
        };

        match event {
            PanelEvent::ButtonPress(press) => json(
                "button/press",
                serde_json::to_vec(&PressMessage::new(press, &self.roles)),
            ),
            PanelEvent::ModeChange(mode) => json(
                "button/mode",
                serde_json::to_vec(&ModeMessage::new(*mode, &self.roles)),
            ),
            PanelEvent::LightChanged { light, on } => Ok(Outbound {
                topic: self.config.topic(light.as_str()),
                payload: light_payload(*on).to_vec(),
                retain: true,
            }),
        }
    }
}

impl EventBus for AsyncMqttBus {
    fn publish(&mut self, event: &PanelEvent) {
        let result = self.encode(event).and_then(|out| {
            self.client
                .try_publish(out.topic, QoS::AtLeastOnce, out.retain, out.payload)
                .map_err(|e| MqttError::Publish(e.to_string()))
        });
        if let Err(e) = result {
            warn!("dropping {:?}: {}", event, e);
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Owns the `rumqttc` event loop and forwards commands to the tick loop.
pub struct MqttService {
    client: AsyncClient,
    eventloop: EventLoop,
    config: MqttRuntimeConfig,
    fast_fade_ms: u32,
}

impl MqttService {
    /// Create the client. Nothing is sent until [`run`](Self::run) polls.
    pub fn new(config: &Config) -> Self {
        let runtime = MqttRuntimeConfig::from_config(&config.mqtt);
        let (client, eventloop) = AsyncClient::new(runtime.options(), REQUEST_CAPACITY);
        Self {
            client,
            eventloop,
            config: runtime,
            fast_fade_ms: config.indicator.fast_fade_ms,
        }
    }

    /// An event bus sharing this service's connection.
    pub fn bus(&self, config: &Config) -> AsyncMqttBus {
        AsyncMqttBus::new(
            self.client.clone(),
            self.config.clone(),
            config.buttons.roles.clone(),
        )
    }

    /// Parse an inbound publish into a command.
    pub fn command_for(&self, topic: &str, payload: &[u8]) -> Option<PanelCommand> {
        let suffix = self.config.suffix(topic)?;
        match parse_command(suffix, payload, self.fast_fade_ms) {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                warn!("rejected message on {}: {}", topic, e);
                None
            }
        }
    }

    /// Subscribe to the command topics and pump the connection until the
    /// command receiver is dropped.
    ///
    /// Connection errors are logged and retried; `rumqttc` reconnects on the
    /// next poll. Subscriptions are renewed on every connection.
    pub async fn run(mut self, commands: mpsc::Sender<PanelCommand>) -> Result<(), MqttError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("MQTT connected to {}:{}", self.config.host, self.config.port);
                    self.subscribe()?;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!("MQTT message on {}", publish.topic);
                    if let Some(cmd) = self.command_for(&publish.topic, &publish.payload) {
                        if commands.send(cmd).await.is_err() {
                            info!("panel loop gone, stopping MQTT service");
                            return Ok(());
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("MQTT error: {}", e);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    // Only enqueues: awaiting here would stall the event loop that drains
    // the request channel.
    fn subscribe(&self) -> Result<(), MqttError> {
        for suffix in COMMAND_TOPICS {
            self.client
                .try_subscribe(self.config.topic(suffix), QoS::AtLeastOnce)
                .map_err(|e| MqttError::Subscribe(e.to_string()))?;
        }
        info!("subscribed to {} command topics", COMMAND_TOPICS.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buttons::{ButtonPress, Mode};
    use crate::config::short_string;
    use crate::Colour;

    // ========================================================================
    // MqttRuntimeConfig tests
    // ========================================================================

    #[test]
    fn test_mqtt_config_default() {
        let config = MqttRuntimeConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "wallpanel");
        assert_eq!(config.topic_prefix, "livingroom");
        assert_eq!(config.keep_alive_secs, 30);
    }

    #[test]
    fn test_mqtt_config_new() {
        let config = MqttRuntimeConfig::new("mqtt.example.com", 8883);
        assert_eq!(config.host, "mqtt.example.com");
        assert_eq!(config.port, 8883);
        assert_eq!(config.topic_prefix, "livingroom");
    }

    #[test]
    fn test_mqtt_config_builder_chaining() {
        let config = MqttRuntimeConfig::new("broker.local", 1883)
            .client_id("hall-panel")
            .topic_prefix("hall");

        assert_eq!(config.client_id, "hall-panel");
        assert_eq!(config.topic("lights/toggle"), "hall/lights/toggle");
        assert_eq!(config.suffix("hall/lights/toggle"), Some("lights/toggle"));
        assert_eq!(config.suffix("hallway/lights/toggle"), None);
    }

    #[test]
    fn test_mqtt_config_from_config() {
        let shared = SharedMqttConfig {
            host: short_string("mqtt.test.com"),
            port: 8883,
            client_id: short_string("test-id"),
            topic_prefix: short_string("upstairs"),
            username: short_string("u"),
            password: short_string("p"),
            keep_alive_secs: 60,
            enabled: true,
        };

        let config = MqttRuntimeConfig::from_config(&shared);
        assert_eq!(config.host, "mqtt.test.com");
        assert_eq!(config.client_id, "test-id");
        assert_eq!(config.topic_prefix, "upstairs");
        assert_eq!(config.username, "u");
        assert_eq!(config.keep_alive_secs, 60);
    }

    // ========================================================================
    // Encoding and command parsing
    // ========================================================================

    fn service() -> MqttService {
        MqttService::new(&Config::default())
    }

    #[tokio::test]
    async fn encode_light_change_retained() {
        let service = service();
        let bus = service.bus(&Config::default());
        let out = bus
            .encode(&PanelEvent::LightChanged {
                light: LightId::Kitchen,
                on: false,
            })
            .unwrap();
        assert_eq!(out.topic, "livingroom/light_kitchen");
        assert_eq!(out.payload, b"0");
        assert!(out.retain);
    }

    #[tokio::test]
    async fn encode_press_json() {
        let service = service();
        let bus = service.bus(&Config::default());
        let out = bus
            .encode(&PanelEvent::ButtonPress(ButtonPress {
                mode: Mode::new(0, 0b01),
                modifiers: 0,
                long_press: false,
                buttons: 0b1,
            }))
            .unwrap();
        assert_eq!(out.topic, "livingroom/button/press");
        let json: serde_json::Value = serde_json::from_slice(&out.payload).unwrap();
        assert_eq!(json["code"], 1 | (0b01 << 7));
        assert!(!out.retain);
    }

    #[tokio::test]
    async fn publish_enqueues_without_network() {
        let service = service();
        let mut bus = service.bus(&Config::default());
        bus.publish(&PanelEvent::ModeChange(Mode::new(1, 0b10)));
        bus.announce(&PanelState {
            mode: Mode::default(),
            indicator: Colour::BLACK,
            indicator_target: 0,
            kitchen: true,
            lounge: false,
            lights_pending: false,
        });
    }

    #[tokio::test]
    async fn run_future_can_be_spawned() {
        fn assert_send<T: Send>(_: &T) {}

        let (tx, _rx) = mpsc::channel(1);
        let run = service().run(tx);
        assert_send(&run);
    }

    #[tokio::test]
    async fn subscribe_does_not_wait_for_the_event_loop() {
        // Nothing polls the event loop here; a blocking subscribe would hang
        let service = service();
        service.subscribe().unwrap();
        service.subscribe().unwrap();
    }

    #[tokio::test]
    async fn command_for_topics() {
        let service = service();
        assert_eq!(
            service.command_for("livingroom/set_rgbled", b"31"),
            Some(PanelCommand::SetColour {
                colour: Colour::new(248, 0, 0),
                duration_ms: 250
            })
        );
        assert_eq!(service.command_for("livingroom/light_kitchen/set", b"?"), None);
        assert_eq!(service.command_for("other/lights/toggle", b""), None);
    }
}
