use std::fmt;

use baglease_core::ResourceKey;
use serde::{Deserialize, Serialize};

/// What changed for the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The owner (re)took the page; the recipient's view is read-only.
    OwnerArrived,
    /// The owner's lease lapsed; edit access may now be available.
    OwnerLeaseLapsed,
}

/// A message pushed to a read-only viewer when its access right changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub key: ResourceKey,
    pub kind: NoticeKind,
    pub owner_name: String,
}

impl Notice {
    pub fn owner_arrived(key: ResourceKey, owner_name: impl Into<String>) -> Self {
        Self {
            key,
            kind: NoticeKind::OwnerArrived,
            owner_name: owner_name.into(),
        }
    }

    pub fn owner_lease_lapsed(key: ResourceKey, owner_name: impl Into<String>) -> Self {
        Self {
            key,
            kind: NoticeKind::OwnerLeaseLapsed,
            owner_name: owner_name.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::OwnerArrived => write!(
                f,
                "{} has started using this bag; your view is now read-only. \
                 Refresh to try for edit access.",
                self.owner_name
            ),
            NoticeKind::OwnerLeaseLapsed => write!(
                f,
                "{}'s session on this bag has timed out. Refresh to try for edit access.",
                self.owner_name
            ),
        }
    }
}
