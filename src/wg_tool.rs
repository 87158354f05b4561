//! Backend adapter driving the system `wg`/`wg-quick` tools. Linux and
//! macOS hosts use this; other platforms supply their own adapter.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::backend::BackendAdapter;
use crate::config;
use crate::error::{BackendError, BackendErrorKind};
use crate::stats::{PeerStats, RawStats};
use crate::status::NativeState;

pub struct WgToolAdapter;

impl WgToolAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn run_wg_quick(&self, action: &str, tunnel: &str) -> Result<(), BackendError> {
        let conf_path = config::tunnel_config_path(tunnel);
        let conf_str = conf_path.to_string_lossy().into_owned();
        info!(tunnel = %tunnel, action = %action, "running_wg_quick");
        let output = Command::new("wg-quick")
            .args([action, &conf_str])
            .output()
            .await
            .map_err(|e| {
                BackendError::new(BackendErrorKind::Io, format!("failed to run wg-quick {action}"))
                    .with_cause(e.to_string())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(command_error(
                &format!("wg-quick {action} failed"),
                stderr.trim(),
            ));
        }
        Ok(())
    }

    async fn wg_show(&self, args: &[&str]) -> Result<String, BackendError> {
        let output = Command::new("wg").args(args).output().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Io, "failed to run wg").with_cause(e.to_string())
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(command_error("wg show failed", stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn running_names(&self) -> Result<HashSet<String>, BackendError> {
        let stdout = self.wg_show(&["show", "interfaces"]).await?;
        Ok(stdout.split_whitespace().map(str::to_string).collect())
    }
}

impl Default for WgToolAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendAdapter for WgToolAdapter {
    async fn bring_up(&self, tunnel: &str, config_text: &str) -> Result<(), BackendError> {
        // wg-quick errors out on an interface that already exists; treat
        // that as already connected.
        if let Ok(running) = self.running_names().await {
            if running.contains(tunnel) {
                debug!(tunnel = %tunnel, "interface_already_up");
                return Ok(());
            }
        }
        config::write_tunnel_config(tunnel, config_text).map_err(|e| {
            BackendError::new(BackendErrorKind::Config, "failed to write tunnel config")
                .with_cause(e.to_string())
        })?;
        self.run_wg_quick("up", tunnel).await
    }

    async fn bring_down(&self, tunnel: &str) -> Result<(), BackendError> {
        let result = self.run_wg_quick("down", tunnel).await;
        if let Err(e) = config::remove_tunnel_config(tunnel) {
            warn!(tunnel = %tunnel, error = %e, "tunnel_config_cleanup_failed");
        }
        result
    }

    async fn current_state(&self, tunnel: &str) -> NativeState {
        match self.running_names().await {
            Ok(running) if running.contains(tunnel) => NativeState::Up,
            Ok(_) => NativeState::Down,
            Err(e) => {
                warn!(tunnel = %tunnel, error = %e, "wg_state_query_failed");
                NativeState::Unknown
            }
        }
    }

    async fn statistics_snapshot(&self, tunnel: &str) -> Result<RawStats, BackendError> {
        let stdout = self.wg_show(&["show", tunnel, "dump"]).await?;
        Ok(parse_dump(&stdout))
    }

    async fn running_tunnel_names(&self) -> HashSet<String> {
        self.running_names().await.unwrap_or_default()
    }
}

fn command_error(reason: &str, stderr: &str) -> BackendError {
    let kind = if stderr.to_ascii_lowercase().contains("permission denied")
        || stderr.contains("Operation not permitted")
    {
        BackendErrorKind::Permission
    } else {
        BackendErrorKind::Other
    };
    BackendError::new(kind, reason).with_cause(stderr)
}

/// Parse `wg show <interface> dump` output. The first line describes the
/// interface itself; each following line is one peer with latest-handshake
/// in epoch seconds and transfer counters in bytes.
fn parse_dump(stdout: &str) -> RawStats {
    let peers = stdout
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            let handshake_secs: u64 = fields[4].parse().ok()?;
            let rx_bytes: u64 = fields[5].parse().ok()?;
            let tx_bytes: u64 = fields[6].parse().ok()?;
            Some(PeerStats {
                rx_bytes,
                tx_bytes,
                latest_handshake_epoch_millis: handshake_secs * 1000,
            })
        })
        .collect();
    RawStats { peers }
}
