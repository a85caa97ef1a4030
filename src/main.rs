//! charge_governor: holds a phone battery near a chosen charge level.
//!
//! Run with:  `RUST_LOG=info charge_governor -p 80`

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use charge_governor::args::GovernorArgs;
use charge_governor::battery_level::BatteryLevel;
use charge_governor::dashboard::Dashboard;
use charge_governor::governor::{Governor, Request};
use charge_governor::server;
use charge_governor::shutdown::spawn_signal_listener;
use charge_governor::state::GovernorState;
use charge_governor::sysfs::{PlatformPaths, SysfsDevice};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: GovernorArgs = argh::from_env();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: GovernorArgs) -> Result<()> {
    let initial = args
        .percentage
        .map(BatteryLevel::try_from)
        .transpose()
        .context("invalid --percentage")?;

    let state = Arc::new(GovernorState::new());
    let device = SysfsDevice::new(PlatformPaths::default());
    let (mut governor, controller) = Governor::new(device, state.clone());
    if args.dashboard {
        governor = governor.with_dashboard(Dashboard::new());
    }
    if let Some(level) = initial {
        governor.handle(Request::Enable(level)).await?;
    }

    tracing::info!("charge_governor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("press Ctrl+C to quit and restore the charge limit");
    spawn_signal_listener(state);
    let server = tokio::spawn(server::serve(args.listen, controller));

    tokio::select! {
        res = governor.run() => res.context("charge governor failed"),
        res = server => {
            res.context("control server panicked")?
                .with_context(|| format!("control server on {} failed", args.listen))?;
            bail!("control server exited unexpectedly")
        }
    }
}
