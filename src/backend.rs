use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::stats::RawStats;
use crate::status::NativeState;

/// Seam between the lifecycle core and a platform VPN engine (Go backend on
/// Android, NetworkExtension on Apple platforms, `wg`/`wg-quick` tooling on
/// Linux). Implementations must be cheap to share behind an `Arc`.
///
/// `bring_up` and `bring_down` are idempotent requests and the only calls
/// that may block on native setup. `current_state` must be a cheap query and
/// report `Unknown` rather than fail.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Request tunnel establishment with the given serialized config.
    async fn bring_up(&self, tunnel: &str, config: &str) -> Result<(), BackendError>;

    /// Request tunnel teardown.
    async fn bring_down(&self, tunnel: &str) -> Result<(), BackendError>;

    /// Raw backend state for the named tunnel.
    async fn current_state(&self, tunnel: &str) -> NativeState;

    /// Traffic counters; only meaningful while the tunnel state is up.
    async fn statistics_snapshot(&self, tunnel: &str) -> Result<RawStats, BackendError>;

    /// Names of tunnels the backend currently considers running, whether or
    /// not this process started them.
    async fn running_tunnel_names(&self) -> HashSet<String>;
}
