//! Push-style observation of the controller. Hosts that cannot poll a
//! watch channel register a callback and get the current status at once,
//! then every transition after it.

use tokio::task::AbortHandle;
use tracing::debug;

use crate::controller::TunnelController;
use crate::stats::TunnelStatistics;
use crate::status::ConnectionStatus;

/// Handle for a registered observer. Dropping it unregisters the callback.
pub struct ObserverHandle {
    abort: AbortHandle,
}

impl ObserverHandle {
    pub fn stop(self) {
        self.abort.abort();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.abort.is_finished()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Register a status observer. The callback fires immediately with the
/// current status, then once per subsequent transition, always with the
/// statistics snapshot valid at that moment.
pub fn observe<F>(controller: &TunnelController, callback: F) -> ObserverHandle
where
    F: Fn(ConnectionStatus, Option<TunnelStatistics>) + Send + 'static,
{
    let shared = controller.shared.clone();
    let mut rx = controller.subscribe();
    let task = tokio::spawn(async move {
        let current = *rx.borrow_and_update();
        callback(current, shared.statistics());
        while rx.changed().await.is_ok() {
            let status = *rx.borrow_and_update();
            debug!(status = %status, "observer_notified");
            callback(status, shared.statistics());
        }
    });
    ObserverHandle {
        abort: task.abort_handle(),
    }
}
