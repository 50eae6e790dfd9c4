//! Per-entry TTL pairs and the presets used across services

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Remote (shared tier) and local (private tier) time-to-live.
/// The local TTL never exceeds the remote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPair {
    remote: Duration,
    local: Duration,
}

impl TtlPair {
    pub const fn new(remote: Duration, local: Duration) -> Self {
        let local = if local.as_nanos() > remote.as_nanos() {
            remote
        } else {
            local
        };
        Self { remote, local }
    }

    /// Remote TTL only; the private tier keeps entries for half of it.
    pub const fn remote_only(remote: Duration) -> Self {
        Self::new(remote, Duration::from_nanos((remote.as_nanos() / 2) as u64))
    }

    pub const fn from_secs(remote: u64, local: u64) -> Self {
        Self::new(Duration::from_secs(remote), Duration::from_secs(local))
    }

    pub fn remote(&self) -> Duration {
        self.remote
    }

    pub fn local(&self) -> Duration {
        self.local
    }
}

/// TTL presets grouped by how fast the underlying data moves
pub struct CacheTtlInfo;

impl CacheTtlInfo {
    pub const CONTRACT_STATE: TtlPair = TtlPair::from_secs(10 * MINUTE, 5 * MINUTE);
    pub const CONTRACT_INFO: TtlPair = TtlPair::from_secs(HOUR, 30 * MINUTE);
    pub const CONTRACT_BALANCE: TtlPair = TtlPair::from_secs(MINUTE, 30);
    pub const PRICE: TtlPair = TtlPair::from_secs(MINUTE, 30);
    pub const TOKEN: TtlPair = TtlPair::from_secs(DAY, 12 * HOUR);
    pub const ANALYTICS: TtlPair = TtlPair::from_secs(10 * MINUTE, 5 * MINUTE);
    pub const ATTRIBUTES: TtlPair = TtlPair::from_secs(DAY, 30 * MINUTE);
    pub const ESCROW: TtlPair = TtlPair::remote_only(Duration::from_secs(DAY));
}
