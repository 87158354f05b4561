// wgbridge library crate
//
// Exports the tunnel lifecycle core for use by the CLI binary and by
// host-platform shims (method-channel bridges, FFI). The wg-tool backend
// only exists on unix hosts; other platforms plug in their own
// BackendAdapter implementation.

// Infrastructure
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

// Lifecycle core
pub mod backend;
pub mod controller;
pub mod handle;
pub mod monitor;
pub mod observer;
pub mod stats;
pub mod status;

// Host-facing surfaces
pub mod bridge;
pub mod keys;

// System wg/wg-quick backend
#[cfg(unix)]
pub mod wg_tool;

#[cfg(test)]
mod test_support;

pub use backend::BackendAdapter;
pub use controller::{ControllerConfig, TunnelController, DEFAULT_POLL_INTERVAL};
pub use error::{BackendError, BackendErrorKind, BridgeError, Result};
pub use handle::TunnelHandle;
pub use keys::KeyPair;
pub use stats::{RawStats, TunnelStatistics};
pub use status::{ConnectionStatus, NativeState};
