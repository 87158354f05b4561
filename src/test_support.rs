//! Controllable fake backend for exercising the lifecycle core in tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::BackendAdapter;
use crate::error::BackendError;
use crate::stats::{PeerStats, RawStats};
use crate::status::{ConnectionStatus, NativeState};

pub(crate) struct FakeBackend {
    state: Mutex<NativeState>,
    running: Mutex<HashSet<String>>,
    up_error: Mutex<Option<BackendError>>,
    down_error: Mutex<Option<BackendError>>,
    stats: Mutex<Result<RawStats, BackendError>>,
    up_delay: Mutex<Duration>,
    pub(crate) up_calls: AtomicUsize,
    pub(crate) down_calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(NativeState::Down),
            running: Mutex::new(HashSet::new()),
            up_error: Mutex::new(None),
            down_error: Mutex::new(None),
            stats: Mutex::new(Ok(RawStats {
                peers: vec![PeerStats {
                    rx_bytes: 1,
                    tx_bytes: 1,
                    latest_handshake_epoch_millis: 1,
                }],
            })),
            up_delay: Mutex::new(Duration::ZERO),
            up_calls: AtomicUsize::new(0),
            down_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_state(&self, state: NativeState) {
        *self.state.lock().unwrap() = state;
    }

    pub(crate) fn insert_running(&self, name: &str) {
        self.running.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn remove_running(&self, name: &str) {
        self.running.lock().unwrap().remove(name);
    }

    pub(crate) fn fail_up(&self, err: BackendError) {
        *self.up_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_down(&self, err: BackendError) {
        *self.down_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn set_stats(&self, raw: RawStats) {
        *self.stats.lock().unwrap() = Ok(raw);
    }

    pub(crate) fn fail_stats(&self, err: BackendError) {
        *self.stats.lock().unwrap() = Err(err);
    }

    pub(crate) fn set_up_delay(&self, delay: Duration) {
        *self.up_delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl BackendAdapter for FakeBackend {
    async fn bring_up(&self, tunnel: &str, _config: &str) -> Result<(), BackendError> {
        self.up_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.up_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.up_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.running.lock().unwrap().insert(tunnel.to_string());
        *self.state.lock().unwrap() = NativeState::Up;
        Ok(())
    }

    async fn bring_down(&self, tunnel: &str) -> Result<(), BackendError> {
        self.down_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.down_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.running.lock().unwrap().remove(tunnel);
        *self.state.lock().unwrap() = NativeState::Down;
        Ok(())
    }

    async fn current_state(&self, _tunnel: &str) -> NativeState {
        *self.state.lock().unwrap()
    }

    async fn statistics_snapshot(&self, _tunnel: &str) -> Result<RawStats, BackendError> {
        self.stats.lock().unwrap().clone()
    }

    async fn running_tunnel_names(&self) -> HashSet<String> {
        self.running.lock().unwrap().clone()
    }
}

/// Collect every status transition a subscriber observes. The receiver
/// must come fresh from `subscribe()`, which already treats the
/// subscription-time value as seen; transitions published before the
/// recorder task first runs are still delivered by `changed()`.
pub(crate) fn record_statuses(
    mut rx: watch::Receiver<ConnectionStatus>,
) -> Arc<Mutex<Vec<ConnectionStatus>>> {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = recorded.clone();
    let _task: JoinHandle<()> = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            sink.lock().unwrap().push(*rx.borrow_and_update());
        }
    });
    recorded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recorder_keeps_transition_published_before_its_first_poll() {
        let (tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let recorded = record_statuses(tx.subscribe());

        // Published before the recorder task has had a chance to run.
        tx.send(ConnectionStatus::Connecting).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(ConnectionStatus::Connected).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            recorded.lock().unwrap().as_slice(),
            &[ConnectionStatus::Connecting, ConnectionStatus::Connected]
        );
    }
}
