use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::controller::Shared;
use crate::stats::TunnelStatistics;
use crate::status::{ConnectionStatus, NativeState};

/// Handle for a running status monitor. Dropping it stops the loop.
pub struct MonitorHandle {
    abort: AbortHandle,
}

impl MonitorHandle {
    pub fn stop(self) {
        self.abort.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.abort.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Polling loop that keeps the controller's cached status and statistics
/// current after a connect, and detects tunnels removed outside this
/// process. The only recurring background operation in the crate.
pub struct StatusMonitor;

impl StatusMonitor {
    /// Spawn the poll loop for one tunnel. The controller guarantees at
    /// most one monitor is alive per instance and stops it before any new
    /// connect/disconnect cycle.
    pub(crate) fn spawn(shared: Arc<Shared>, tunnel: String, interval: Duration) -> MonitorHandle {
        let task = tokio::spawn(async move {
            debug!(tunnel = %tunnel, interval_ms = interval.as_millis() as u64, "status_monitor_started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                // Tunnel removed outside this controller's control: the
                // backend has nothing left to tear down.
                let running = shared.backend.running_tunnel_names().await;
                if !running.contains(&tunnel) {
                    warn!(tunnel = %tunnel, "tunnel_removed_externally");
                    shared.publish_status(ConnectionStatus::Disconnected);
                    shared.clear_statistics();
                    break;
                }

                match shared.backend.current_state(&tunnel).await {
                    NativeState::Up => {
                        shared.publish_status(ConnectionStatus::Connected);
                        match shared.backend.statistics_snapshot(&tunnel).await {
                            Ok(raw) => shared.set_statistics(TunnelStatistics::from_raw(&raw)),
                            // Fetch failures are logged and skipped; status
                            // stays untouched for this cycle.
                            Err(err) => {
                                warn!(tunnel = %tunnel, error = %err, "statistics_snapshot_failed");
                            }
                        }
                    }
                    NativeState::Down | NativeState::Unknown => {
                        shared.clear_statistics();
                    }
                }
            }
            info!(tunnel = %tunnel, "status_monitor_stopped");
        });

        MonitorHandle {
            abort: task.abort_handle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerConfig, TunnelController};
    use crate::test_support::FakeBackend;

    const TICK: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_monitor_stops_when_tunnel_disappears() {
        let backend = FakeBackend::new();
        let ctrl = TunnelController::with_config(
            backend.clone(),
            ControllerConfig {
                poll_interval: TICK,
            },
        );
        ctrl.setup_tunnel("peer1").await.unwrap();
        ctrl.connect("[Interface]\n").await.unwrap();
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(ctrl.current_status(), ConnectionStatus::Connected);

        backend.remove_running("peer1");
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(ctrl.current_status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_handle_drop_aborts_loop() {
        let backend = FakeBackend::new();
        backend.insert_running("peer1");
        let ctrl = TunnelController::with_config(
            backend.clone(),
            ControllerConfig {
                poll_interval: TICK,
            },
        );
        // Reach into the spawn path directly to hold a handle.
        let handle = StatusMonitor::spawn(ctrl.shared.clone(), "peer1".to_string(), TICK);
        assert!(handle.is_running());
        drop(handle);
        tokio::time::sleep(TICK).await;

        let handle = StatusMonitor::spawn(ctrl.shared.clone(), "peer1".to_string(), TICK);
        assert!(handle.is_running());
        handle.stop();
    }
}
