//! Tokio tick loop that owns and drives a [`Panel`].
//!
//! The runner is the single owner of the panel. Each period it drains the
//! command channel, samples the inputs and calls [`Panel::poll`]. Driver
//! errors end the loop; everything else (rejected commands, failed
//! publishes) is logged by the layer that saw it.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use log::{info, trace};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::panel::{Panel, PanelCommand};
use crate::traits::{ButtonInput, Clock, EventBus, RgbDriver, ServoDriver};

/// Millisecond clock based on [`Instant`], wrapping like a hardware counter.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Start counting from zero now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap
        self.start.elapsed().as_millis() as u32
    }
}

/// Drives a panel from inputs, a clock and a command channel.
pub struct PanelRunner<D, S, B, I, C>
where
    D: RgbDriver,
    S: ServoDriver,
    B: EventBus,
    I: ButtonInput,
    C: Clock,
{
    panel: Panel<D, S, B>,
    input: I,
    clock: C,
    commands: mpsc::Receiver<PanelCommand>,
    period: Duration,
}

impl<D, S, B, I, C> PanelRunner<D, S, B, I, C>
where
    D: RgbDriver,
    S: ServoDriver,
    B: EventBus,
    I: ButtonInput,
    C: Clock,
    D::Error: Debug,
    S::Error: Debug,
{
    /// Create a runner ticking every `period`.
    pub fn new(
        panel: Panel<D, S, B>,
        input: I,
        clock: C,
        commands: mpsc::Receiver<PanelCommand>,
        period: Duration,
    ) -> Self {
        Self {
            panel,
            input,
            clock,
            commands,
            period,
        }
    }

    /// Initialise the panel at the current time.
    pub fn init(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        self.panel.init(now).map_err(|e| anyhow!("panel init failed: {}", e))
    }

    /// One iteration: apply queued commands, then poll the panel.
    pub fn step(&mut self) -> Result<()> {
        while let Ok(cmd) = self.commands.try_recv() {
            trace!("applying {:?}", cmd);
            self.panel.apply(cmd);
        }
        let now = self.clock.now_ms();
        self.panel
            .poll(&mut self.input, now)
            .map_err(|e| anyhow!("panel tick failed at {} ms: {}", now, e))
    }

    /// Initialise, then step once per period until a driver fails.
    pub async fn run(mut self) -> Result<()> {
        self.init()?;
        info!("panel loop running every {:?}", self.period);

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.step()?;
        }
    }

    /// Borrow the panel.
    pub fn panel(&self) -> &Panel<D, S, B> {
        &self.panel
    }

    /// Mutably borrow the inputs.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Mutably borrow the clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

/// Run a panel until a driver fails.
pub async fn run_panel<D, S, B, I, C>(
    panel: Panel<D, S, B>,
    input: I,
    clock: C,
    commands: mpsc::Receiver<PanelCommand>,
    period: Duration,
) -> Result<()>
where
    D: RgbDriver,
    S: ServoDriver,
    B: EventBus,
    I: ButtonInput,
    C: Clock,
    D::Error: Debug,
    S::Error: Debug,
{
    PanelRunner::new(panel, input, clock, commands, period)
        .run()
        .await
}
