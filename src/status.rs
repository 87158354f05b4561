use serde::{Deserialize, Serialize};

/// Raw tunnel state as a platform backend reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeState {
    Up,
    Down,
    Unknown,
}

/// Connection status published to the UI event stream and any notifier.
/// Single source of truth; every observer derives from the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Unknown,
}

impl ConnectionStatus {
    /// Map a backend's native state; anything unmappable becomes `Unknown`.
    #[must_use]
    pub fn from_native(state: NativeState) -> Self {
        match state {
            NativeState::Up => Self::Connected,
            NativeState::Down => Self::Disconnected,
            NativeState::Unknown => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self == Self::Connected
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
