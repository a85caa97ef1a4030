//! The charge-current control loop.

use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::battery_level::{BatteryLevel, Threshold};
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::state::GovernorState;
use crate::sysfs::{
    restore_charge_current, set_charge_current, ChargeDevice, UNRESTRICTED_CURRENT,
};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Limit applied above the threshold: just enough to keep the port alive.
pub const HOLD_CURRENT: i64 = 1_000;

/// Limit applied inside the hysteresis band.
pub const TRICKLE_CURRENT: i64 = 50_000;

/// Width of the band below the threshold, in hundredths of a percent.
pub const HYSTERESIS_BAND: i64 = 25;

/// Pick the limit for a battery that is receiving external power.
pub fn hysteresis_current(threshold: Threshold, capacity_raw: i64) -> i64 {
    let threshold = i64::from(threshold.get());
    if capacity_raw > threshold {
        HOLD_CURRENT
    } else if capacity_raw < threshold - HYSTERESIS_BAND {
        UNRESTRICTED_CURRENT
    } else {
        TRICKLE_CURRENT
    }
}

/// Telemetry gathered during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub status: String,
    /// Only read while external power is present.
    pub capacity_raw: Option<i64>,
    pub input_current: i64,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Governing is disabled; nothing was touched.
    Idle,
    Governed {
        snapshot: TelemetrySnapshot,
        current: i64,
    },
    /// The limit was restored and the loop should exit.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Enable(BatteryLevel),
    Disable,
}

#[derive(Debug)]
struct Envelope {
    request: Request,
    done: oneshot::Sender<()>,
}

/// Handle through which front ends drive a running [`Governor`].
#[derive(Debug, Clone)]
pub struct Controller {
    requests: Sender<Envelope>,
    state: Arc<GovernorState>,
}

impl Controller {
    /// Hand `request` to the loop and wait until it has been applied.
    pub async fn submit(&self, request: Request) {
        let (done, applied) = oneshot::channel();
        if self.requests.send(Envelope { request, done }).await.is_err() {
            tracing::warn!(?request, "governor loop is gone, request dropped");
            return;
        }
        // The sender only disappears when the loop is failing.
        let _ = applied.await;
    }

    pub fn state(&self) -> &Arc<GovernorState> {
        &self.state
    }
}

pub struct Governor<D> {
    device: D,
    state: Arc<GovernorState>,
    requests: Receiver<Envelope>,
    interval: Duration,
    dashboard: Option<Dashboard>,
}

impl<D: ChargeDevice> Governor<D> {
    pub fn new(device: D, state: Arc<GovernorState>) -> (Self, Controller) {
        let (tx, rx) = async_channel::bounded(8);
        let governor = Self {
            device,
            state: state.clone(),
            requests: rx,
            interval: TICK_INTERVAL,
            dashboard: None,
        };
        let controller = Controller {
            requests: tx,
            state,
        };
        (governor, controller)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_dashboard(mut self, dashboard: Dashboard) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub async fn handle(&mut self, request: Request) -> Result<()> {
        match request {
            Request::Enable(level) => {
                let threshold = level.threshold(&self.device).await?;
                self.state.enable(threshold);
                tracing::info!(%threshold, "charge governing enabled");
            }
            Request::Disable => {
                self.state.disable();
                if self.state.stop_requested() {
                    // The stop tick performs the one restore.
                    tracing::debug!("stop pending, leaving restore to the loop");
                    return Ok(());
                }
                restore_charge_current(&self.device).await?;
                tracing::info!("charge governing disabled, limit restored");
            }
        }
        Ok(())
    }

    pub async fn tick(&mut self) -> Result<Tick> {
        if self.state.stop_requested() {
            restore_charge_current(&self.device).await?;
            tracing::info!("max charging current restored");
            return Ok(Tick::Stopped);
        }
        if !self.state.is_enabled() {
            return Ok(Tick::Idle);
        }

        let threshold = self.state.threshold();
        let input_current = self.device.input_current().await?;
        let (capacity_raw, current) = if input_current > 0 {
            let raw = self.device.capacity_raw().await?;
            (Some(raw), hysteresis_current(threshold, raw))
        } else {
            (None, UNRESTRICTED_CURRENT)
        };
        let status = self.device.status().await?;
        set_charge_current(&self.device, current).await?;

        let snapshot = TelemetrySnapshot {
            status,
            capacity_raw,
            input_current,
        };
        tracing::debug!(?snapshot, current, %threshold, "tick");
        if let Some(line) = self
            .dashboard
            .as_mut()
            .and_then(|d| d.observe(&snapshot, current))
        {
            println!("{line}");
        }
        Ok(Tick::Governed { snapshot, current })
    }

    /// Drive the loop until a stop is requested or the platform fails us.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.tick().await? == Tick::Stopped {
                        return Ok(());
                    }
                }
                Ok(Envelope { request, done }) = self.requests.recv() => {
                    self.handle(request).await?;
                    let _ = done.send(());
                }
            }
        }
    }
}
