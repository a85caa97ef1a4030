use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;

use crate::state::GovernorState;

/// Spawn a background task that turns SIGINT or SIGTERM into a stop request.
///
/// The governor loop performs the actual restore so it cannot interleave with
/// a write of its own.
pub fn spawn_signal_listener(state: Arc<GovernorState>) -> JoinHandle<()> {
    stop_on(state, wait_for_signal())
}

/// Request a stop once `signal` resolves.
fn stop_on<F>(state: Arc<GovernorState>, signal: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        state.request_stop();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler");
            let _ = signal::ctrl_c().await;
            tracing::info!("received Ctrl+C, restoring charge limit");
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, restoring charge limit"),
        _ = signal::ctrl_c() => tracing::info!("received Ctrl+C, restoring charge limit"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("received Ctrl+C, restoring charge limit");
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::battery_level::BatteryLevel;
    use crate::governor::{Governor, Request, TelemetrySnapshot, Tick};
    use crate::sysfs::testing::FakeDevice;
    use crate::sysfs::UNRESTRICTED_CURRENT;

    #[tokio::test]
    async fn signal_requests_stop() {
        let state = Arc::new(GovernorState::new());
        let (raise, received) = oneshot::channel::<()>();
        let listener = stop_on(state.clone(), async move {
            let _ = received.await;
        });
        assert!(!state.stop_requested());

        raise.send(()).unwrap();
        listener.await.unwrap();
        assert!(state.stop_requested());
    }

    #[tokio::test]
    async fn signal_while_governing_restores_once() {
        let state = Arc::new(GovernorState::new());
        let (mut governor, _controller) = Governor::new(FakeDevice::new(), state.clone());
        governor
            .handle(Request::Enable(BatteryLevel::Custom(70)))
            .await
            .unwrap();
        let governed = Tick::Governed {
            snapshot: TelemetrySnapshot {
                status: "Discharging".to_owned(),
                capacity_raw: None,
                input_current: 0,
            },
            current: UNRESTRICTED_CURRENT,
        };
        assert_eq!(governor.tick().await.unwrap(), governed);

        let (raise, received) = oneshot::channel::<()>();
        let listener = stop_on(state.clone(), async move {
            let _ = received.await;
        });
        raise.send(()).unwrap();
        listener.await.unwrap();

        assert_eq!(governor.tick().await.unwrap(), Tick::Stopped);
        assert_eq!(governor.device().writes(), vec![UNRESTRICTED_CURRENT]);
    }
}
