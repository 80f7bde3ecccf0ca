use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::identity::ActorId;

/// Who a lease was granted to, and therefore how much priority it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseKind {
    /// The bag's own owner. Always outranks an admin.
    Owner,
    /// An administrator working on someone else's bag.
    Admin,
}

impl LeaseKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for LeaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outstanding claim on a [`ResourceKey`](crate::ResourceKey).
///
/// `acquired_at_ms` is wall-clock milliseconds since the UNIX epoch as
/// reported by the arbitrator's [`Clock`](crate::Clock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseInfo {
    pub holder_id: ActorId,
    pub holder_name: String,
    pub kind: LeaseKind,
    pub acquired_at_ms: u64,
}

impl LeaseInfo {
    pub fn new(
        holder_id: ActorId,
        holder_name: impl Into<String>,
        kind: LeaseKind,
        acquired_at_ms: u64,
    ) -> Self {
        Self {
            holder_id,
            holder_name: holder_name.into(),
            kind,
            acquired_at_ms,
        }
    }

    /// A lease is expired once strictly more than `ttl` has elapsed since
    /// it was acquired. A clock that moved backwards never expires it.
    pub fn is_expired(&self, ttl: Duration, now_ms: u64) -> bool {
        u128::from(now_ms.saturating_sub(self.acquired_at_ms)) > ttl.as_millis()
    }

    /// The last instant (inclusive) at which the lease is still live.
    pub fn expires_at_ms(&self, ttl: Duration) -> u64 {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.acquired_at_ms.saturating_add(ttl_ms)
    }

    pub fn is_held_by(&self, actor: ActorId) -> bool {
        self.holder_id == actor
    }
}
