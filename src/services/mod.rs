//! Network services for running a panel on a desktop or gateway host.
//!
//! Available with the `mqtt` feature:
//!
//! - `mqtt`: `rumqttc` client that publishes panel events and forwards
//!   inbound commands over a channel
//! - `runner`: tokio tick loop that owns the [`crate::Panel`]
//!
//! # Wiring
//!
//! ```ignore
//! use std::time::Duration;
//! use wallpanel::services::{run_panel, MqttService, SystemClock};
//!
//! let service = MqttService::new(&config);
//! let bus = service.bus(&config);
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//! tokio::spawn(service.run(tx));
//!
//! let panel = Panel::new(&config, led, kitchen, lounge, bus);
//! run_panel(panel, buttons, SystemClock::new(), rx, Duration::from_millis(10)).await?;
//! ```

pub mod mqtt;
pub mod runner;

pub use mqtt::*;
pub use runner::*;
