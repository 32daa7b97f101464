//! Desktop panel with mock hardware, bridged to an MQTT broker.
//!
//! The panel logic runs exactly as on the wall, with mock drivers standing
//! in for the LED, servos and buttons. Drive it from any MQTT client:
//!
//! ```sh
//! mosquitto_pub -t livingroom/light_kitchen/set -m on
//! mosquitto_pub -t livingroom/set_rgbled -m 31744
//! mosquitto_sub -t 'livingroom/#' -v
//! ```
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_panel --features mqtt
//! ```

use std::time::Duration;

use anyhow::Result;
use log::info;
use tokio::sync::mpsc;

use wallpanel::hal::{MockButtons, MockRgb, MockServo};
use wallpanel::services::{run_panel, MqttService, SystemClock};
use wallpanel::{Config, NullBus, Panel};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Central configuration - modify this for your setup
    let config = Config::default();
    // Example of customization:
    // let config = Config::default()
    //     .with_mqtt(wallpanel::MqttConfig::default()
    //         .with_host("192.168.1.100")
    //         .with_topic_prefix("hall"))
    //     .with_buttons(wallpanel::ButtonConfig::default()
    //         .with_long_press_ms(750));

    let period = Duration::from_millis(u64::from(config.indicator.update_period_ms));
    info!(
        "{} ({}) starting, tick {:?}",
        config.device.name, config.device.id, period
    );

    let (tx, rx) = mpsc::channel(16);

    if !config.mqtt.enabled {
        info!("MQTT disabled, running offline");
        drop(tx);
        let panel = Panel::new(
            &config,
            MockRgb::new(),
            MockServo::new(),
            MockServo::new(),
            NullBus,
        );
        return run_panel(panel, MockButtons::new(), SystemClock::new(), rx, period).await;
    }

    let service = MqttService::new(&config);
    let bus = service.bus(&config);
    tokio::spawn(async move {
        if let Err(e) = service.run(tx).await {
            log::error!("MQTT service stopped: {}", e);
        }
    });

    let mut panel = Panel::new(
        &config,
        MockRgb::new(),
        MockServo::new(),
        MockServo::new(),
        bus,
    );
    let state = panel.state();
    panel.bus_mut().announce(&state);

    info!(
        "MQTT bridge on {}:{} under '{}/'",
        config.mqtt.host, config.mqtt.port, config.mqtt.topic_prefix
    );
    run_panel(panel, MockButtons::new(), SystemClock::new(), rx, period).await
}
