use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::backend::BackendAdapter;
use crate::error::{BackendErrorKind, BridgeError, Result};
use crate::handle::TunnelHandle;
use crate::monitor::{MonitorHandle, StatusMonitor};
use crate::stats::TunnelStatistics;
use crate::status::ConnectionStatus;

/// Default poll interval for the status monitor.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Interval between status monitor cycles.
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// State shared between the controller and its status monitor: the backend,
/// the authoritative status channel, and the cached statistics. The monitor
/// only reads the backend; all handle mutation stays in the controller.
pub(crate) struct Shared {
    pub(crate) backend: Arc<dyn BackendAdapter>,
    status_tx: watch::Sender<ConnectionStatus>,
    stats: StdMutex<Option<TunnelStatistics>>,
}

impl Shared {
    fn new(backend: Arc<dyn BackendAdapter>) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            backend,
            status_tx,
            stats: StdMutex::new(None),
        }
    }

    pub(crate) fn current_status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// Publish a status value; duplicates are suppressed so the stream only
    /// carries transitions.
    pub(crate) fn publish_status(&self, next: ConnectionStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            debug!(status = next.as_str(), "connection_status_changed");
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    pub(crate) fn set_statistics(&self, stats: TunnelStatistics) {
        *self.stats.lock().expect("stats lock poisoned") = Some(stats);
    }

    pub(crate) fn clear_statistics(&self) {
        *self.stats.lock().expect("stats lock poisoned") = None;
    }

    /// Cached statistics, defined only while the status is connected. Never
    /// returns stale data from a previous session.
    pub(crate) fn statistics(&self) -> Option<TunnelStatistics> {
        if !self.current_status().is_connected() {
            return None;
        }
        self.stats.lock().expect("stats lock poisoned").clone()
    }
}

struct Inner {
    handle: Option<TunnelHandle>,
    monitor: Option<MonitorHandle>,
}

/// Tunnel lifecycle state machine. Owns the current [`TunnelHandle`] and the
/// authoritative [`ConnectionStatus`]; sequences connect/disconnect against
/// the backend and keeps at most one status monitor alive.
///
/// Construct one per hosting process and hand it to all consumers; there is
/// deliberately no process-wide singleton here.
///
/// All mutating operations are serialized through one async mutex held
/// across the backend call, so at most one state-changing backend call is in
/// flight at any time.
pub struct TunnelController {
    pub(crate) shared: Arc<Shared>,
    inner: Mutex<Inner>,
    poll_interval: Duration,
}

impl TunnelController {
    pub fn new(backend: Arc<dyn BackendAdapter>) -> Self {
        Self::with_config(backend, ControllerConfig::default())
    }

    pub fn with_config(backend: Arc<dyn BackendAdapter>, config: ControllerConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(backend)),
            inner: Mutex::new(Inner {
                handle: None,
                monitor: None,
            }),
            poll_interval: config.poll_interval,
        }
    }

    /// Validate the name and create (or replace) the tunnel handle. The
    /// published status afterwards reflects the backend's actual native
    /// state; an already-running tunnel is adopted and monitored.
    pub async fn setup_tunnel(&self, name: &str) -> Result<()> {
        crate::handle::validate_name(name)?;
        let mut inner = self.inner.lock().await;

        let same = inner.handle.as_ref().is_some_and(|h| h.name() == name);
        if !same {
            if let Some(monitor) = inner.monitor.take() {
                monitor.stop();
            }
            self.shared.clear_statistics();
            inner.handle = Some(TunnelHandle::new(name)?);
        }

        let native = self.shared.backend.current_state(name).await;
        let status = ConnectionStatus::from_native(native);
        self.shared.publish_status(status);
        if status.is_connected() && inner.monitor.is_none() {
            inner.monitor = Some(StatusMonitor::spawn(
                self.shared.clone(),
                name.to_string(),
                self.poll_interval,
            ));
        }
        info!(tunnel = name, status = status.as_str(), "tunnel_configured");
        Ok(())
    }

    /// Whether a tunnel by this name is already set up in this controller or
    /// running in the backend.
    pub async fn check_tunnel_configuration(&self, name: &str) -> bool {
        {
            let inner = self.inner.lock().await;
            if inner.handle.as_ref().is_some_and(|h| h.name() == name) {
                return true;
            }
        }
        self.shared.backend.running_tunnel_names().await.contains(name)
    }

    /// Bring the configured tunnel up. The status flips to `connecting`
    /// before the backend call is awaited; completion means the backend
    /// accepted the up request, and the monitor flips the status to
    /// `connected` once the backend reports the tunnel up.
    ///
    /// A connect while already connecting/connected re-issues the backend
    /// call without duplicating transitions or spawning a second monitor.
    pub async fn connect(&self, config_text: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let name = match &inner.handle {
            Some(handle) => handle.name().to_string(),
            None => return Err(BridgeError::NotConfigured),
        };

        let resumed = matches!(
            self.shared.current_status(),
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        );
        if !resumed {
            if let Some(monitor) = inner.monitor.take() {
                monitor.stop();
            }
            self.shared.publish_status(ConnectionStatus::Connecting);
        }

        info!(tunnel = %name, "tunnel_up_requested");
        if let Err(err) = self.shared.backend.bring_up(&name, config_text).await {
            warn!(tunnel = %name, error = %err, "tunnel_up_failed");
            if let Some(monitor) = inner.monitor.take() {
                monitor.stop();
            }
            self.shared.publish_status(ConnectionStatus::Disconnected);
            self.shared.clear_statistics();
            return Err(connect_error(&name, err));
        }

        if let Some(handle) = inner.handle.as_mut() {
            handle.set_config_text(config_text);
        }
        if inner.monitor.is_none() {
            inner.monitor = Some(StatusMonitor::spawn(
                self.shared.clone(),
                name.clone(),
                self.poll_interval,
            ));
        }
        info!(tunnel = %name, "tunnel_up_accepted");
        Ok(())
    }

    /// Bring the active tunnel down. The status is forced to `disconnected`
    /// even when teardown fails; the failure is logged and returned but
    /// never leaves the state machine stuck in a non-terminal state.
    pub async fn disconnect(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let name = match &inner.handle {
            Some(handle) => handle.name().to_string(),
            None => return Err(BridgeError::NotConfigured),
        };

        let running = self.shared.backend.running_tunnel_names().await;
        if !running.contains(&name) {
            return Err(BridgeError::NotRunning { tunnel: name });
        }

        if let Some(monitor) = inner.monitor.take() {
            monitor.stop();
        }
        self.shared.publish_status(ConnectionStatus::Disconnecting);
        self.shared.clear_statistics();

        info!(tunnel = %name, "tunnel_down_requested");
        let result = self.shared.backend.bring_down(&name).await;
        self.shared.publish_status(ConnectionStatus::Disconnected);

        match result {
            Ok(()) => {
                info!(tunnel = %name, "tunnel_down_complete");
                Ok(())
            }
            Err(err) => {
                warn!(tunnel = %name, error = %err, "tunnel_down_failed");
                Err(BridgeError::Disconnect {
                    tunnel: name,
                    source: err,
                })
            }
        }
    }

    /// Last known status; never queries the backend.
    #[must_use]
    pub fn current_status(&self) -> ConnectionStatus {
        self.shared.current_status()
    }

    /// Cached statistics; `None` unless the status is connected.
    #[must_use]
    pub fn statistics_snapshot(&self) -> Option<TunnelStatistics> {
        self.shared.statistics()
    }

    /// Status stream: the receiver observes the current value and every
    /// subsequent transition, with no replay of missed history.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.subscribe()
    }

    /// Name of the configured tunnel, if any.
    pub async fn tunnel_name(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.handle.as_ref().map(|h| h.name().to_string())
    }

    /// Tear the controller state down without touching the backend: stop
    /// monitoring, drop the handle and statistics. For engine shutdown.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(monitor) = inner.monitor.take() {
            monitor.stop();
        }
        inner.handle = None;
        self.shared.clear_statistics();
        self.shared.publish_status(ConnectionStatus::Disconnected);
        info!("tunnel_controller_shutdown");
    }
}

fn connect_error(tunnel: &str, err: crate::error::BackendError) -> BridgeError {
    if err.kind == BackendErrorKind::Permission {
        return BridgeError::Permission {
            detail: err.details(),
        };
    }
    BridgeError::Connect {
        tunnel: tunnel.to_string(),
        details: err.details(),
        source: err,
    }
}
