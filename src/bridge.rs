//! Event bus over a blocking [`MqttClient`].
//!
//! [`MqttEventBus`] publishes panel events under the configured topic prefix
//! and turns messages on the command topics back into [`PanelCommand`]s.
//! It fits boards whose MQTT stack offers a sync client; the desktop build
//! uses the async bridge in `services::mqtt` instead.
//!
//! # Example
//!
//! ```rust
//! use wallpanel::bridge::MqttEventBus;
//! use wallpanel::hal::{MockMqtt, MockRgb, MockServo};
//! use wallpanel::{Config, Panel};
//!
//! let config = Config::default();
//! let mut bus = MqttEventBus::new(MockMqtt::new(), &config);
//! bus.subscribe_commands().unwrap();
//!
//! let mut panel = Panel::new(&config, MockRgb::new(), MockServo::new(), MockServo::new(), bus);
//! panel.init(0).unwrap();
//!
//! panel.bus_mut().client_mut().queue_message("livingroom/set_rgbled_instant", b"31".to_vec());
//! assert_eq!(panel.apply_remote_commands(), 1);
//! ```

use core::fmt::Debug;

use log::{debug, warn};

use crate::buttons::RoleMasks;
use crate::config::{Config, MqttConfig};
use crate::messages::{
    light_payload, parse_command, ModeMessage, PressMessage, COMMAND_TOPICS,
};
use crate::panel::{Panel, PanelCommand, PanelEvent, PanelState};
use crate::traits::{EventBus, MqttClient, RgbDriver, ServoDriver};
use crate::LightId;

/// Scratch size for one serialized event.
const JSON_BUF: usize = 128;

/// Publishes panel events through a sync MQTT client.
pub struct MqttEventBus<C: MqttClient> {
    client: C,
    mqtt: MqttConfig,
    roles: RoleMasks,
    fast_fade_ms: u32,
}

impl<C: MqttClient> MqttEventBus<C>
where
    C::Error: Debug,
{
    /// Wrap a client using the topic prefix, button roles and fade settings
    /// from `config`.
    pub fn new(client: C, config: &Config) -> Self {
        Self {
            client,
            mqtt: config.mqtt.clone(),
            roles: config.buttons.roles.clone(),
            fast_fade_ms: config.indicator.fast_fade_ms,
        }
    }

    /// Subscribe to every command topic.
    pub fn subscribe_commands(&mut self) -> Result<(), C::Error> {
        for suffix in COMMAND_TOPICS {
            self.client.subscribe(self.mqtt.topic(suffix).as_str())?;
        }
        debug!("subscribed to {} command topics", COMMAND_TOPICS.len());
        Ok(())
    }

    /// Publish both light states (retained), e.g. after (re)connecting.
    pub fn announce(&mut self, state: &PanelState) {
        self.publish_light(LightId::Kitchen, state.kitchen);
        self.publish_light(LightId::Lounge, state.lounge);
    }

    /// Next valid command from the client, skipping anything unparseable.
    pub fn next_command(&mut self) -> Option<PanelCommand> {
        while let Some(msg) = self.client.try_recv() {
            let Some(suffix) = self.mqtt.suffix(&msg.topic) else {
                warn!("ignoring message on foreign topic {}", msg.topic);
                continue;
            };
            match parse_command(suffix, &msg.payload, self.fast_fade_ms) {
                Ok(cmd) => return Some(cmd),
                Err(e) => warn!("rejected message on {}: {}", msg.topic, e),
            }
        }
        None
    }

    /// Borrow the client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutably borrow the client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    fn publish_light(&mut self, light: LightId, on: bool) {
        let topic = self.mqtt.topic(light.as_str());
        self.send(topic.as_str(), light_payload(on), true);
    }

    fn send(&mut self, topic: &str, payload: &[u8], retain: bool) {
        if let Err(e) = self.client.publish(topic, payload, retain) {
            warn!("publish to {} failed: {:?}", topic, e);
        }
    }

    fn send_json<T: serde::Serialize>(&mut self, suffix: &str, value: &T) {
        let topic = self.mqtt.topic(suffix);
        let mut buf = [0u8; JSON_BUF];
        match serde_json_core::to_slice(value, &mut buf) {
            Ok(len) => self.send(topic.as_str(), &buf[..len], false),
            Err(_) => warn!("event for {} does not fit {} bytes", topic, JSON_BUF),
        }
    }
}

impl<C: MqttClient> EventBus for MqttEventBus<C>
where
    C::Error: Debug,
{
    fn publish(&mut self, event: &PanelEvent) {
        match event {
            PanelEvent::ButtonPress(press) => {
                let msg = PressMessage::new(press, &self.roles);
                self.send_json("button/press", &msg);
            }
            PanelEvent::ModeChange(mode) => {
                let msg = ModeMessage::new(*mode, &self.roles);
                self.send_json("button/mode", &msg);
            }
            PanelEvent::LightChanged { light, on } => self.publish_light(*light, *on),
        }
    }
}

impl<D, S, C> Panel<D, S, MqttEventBus<C>>
where
    D: RgbDriver,
    S: ServoDriver,
    C: MqttClient,
    C::Error: Debug,
{
    /// Apply every command waiting in the MQTT client. Returns how many were
    /// applied.
    pub fn apply_remote_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Some(cmd) = self.bus_mut().next_command() {
            self.apply(cmd);
            applied += 1;
        }
        applied
    }
}
