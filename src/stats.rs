use serde::{Deserialize, Serialize};

/// Per-peer counters as a backend reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStats {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    /// Most recent handshake for this peer; 0 when none has completed yet.
    pub latest_handshake_epoch_millis: u64,
}

/// Unaggregated statistics snapshot from a backend. Only meaningful while
/// the tunnel is up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStats {
    pub peers: Vec<PeerStats>,
}

/// Aggregated traffic statistics surfaced to listeners. Counters are
/// monotonically non-decreasing for the lifetime of one tunnel session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelStatistics {
    pub total_download: u64,
    pub total_upload: u64,
    /// Most recent handshake across all peers; 0 if none yet.
    pub latest_handshake_epoch_millis: u64,
}

impl TunnelStatistics {
    /// Sum counters across peers and take the newest handshake, the same
    /// aggregation the platform backends apply.
    #[must_use]
    pub fn from_raw(raw: &RawStats) -> Self {
        let total_download = raw.peers.iter().map(|p| p.rx_bytes).sum();
        let total_upload = raw.peers.iter().map(|p| p.tx_bytes).sum();
        let latest_handshake_epoch_millis = raw
            .peers
            .iter()
            .map(|p| p.latest_handshake_epoch_millis)
            .max()
            .unwrap_or(0);
        Self {
            total_download,
            total_upload,
            latest_handshake_epoch_millis,
        }
    }
}
