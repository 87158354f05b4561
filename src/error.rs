use std::fmt;

use thiserror::Error;

/// Classifies a backend failure so callers can distinguish a missing VPN
/// permission (caller should request it and retry) from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Platform VPN permission has not been granted.
    Permission,
    /// The tunnel configuration was rejected by the backend.
    Config,
    /// IO failure talking to the backend.
    Io,
    /// Anything else the backend reports.
    Other,
}

/// Failure reported by a platform VPN engine. The original cause is kept
/// verbatim for diagnostics and never downgraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub reason: String,
    pub cause: Option<String>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn permission(reason: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Permission, reason)
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Config, reason)
    }

    pub fn other(reason: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, reason)
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::new(BackendErrorKind::Io, err.to_string())
    }

    /// Reason plus cause, the way the original exception text read.
    #[must_use]
    pub fn details(&self) -> String {
        match &self.cause {
            Some(cause) => format!("{}: {}", self.reason, cause),
            None => self.reason.clone(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.details())
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid tunnel name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("tunnel has not been configured -- call setup_tunnel first")]
    NotConfigured,

    #[error("tunnel {tunnel:?} is not running")]
    NotRunning { tunnel: String },

    #[error("VPN permission has not been granted: {detail}")]
    Permission { detail: String },

    #[error("could not connect tunnel {tunnel:?}: {details}")]
    Connect {
        tunnel: String,
        details: String,
        #[source]
        source: BackendError,
    },

    #[error("could not disconnect tunnel {tunnel:?}: {source}")]
    Disconnect {
        tunnel: String,
        #[source]
        source: BackendError,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("key error: {0}")]
    Key(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Underlying backend diagnostic, when one exists. Kept separate from
    /// the display text so hosts can surface it on its own.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Connect { details, .. } => Some(details.clone()),
            Self::Permission { detail } => Some(detail.clone()),
            Self::Disconnect { source, .. } | Self::Backend(source) => Some(source.details()),
            _ => None,
        }
    }

    /// Stable machine-readable code for the bridge error surface.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "INVALID_NAME",
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::NotRunning { .. } => "NOT_RUNNING",
            Self::Permission { .. } => "PERMISSION_DENIED",
            Self::Connect { .. } => "CONNECT_FAILED",
            Self::Disconnect { .. } => "DISCONNECT_FAILED",
            Self::Backend(_) => "BACKEND_ERR",
            Self::Key(_) => "KEY_ERR",
            Self::Json(_) | Self::Io(_) => "NATIVE_ERR",
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
