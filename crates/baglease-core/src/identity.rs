use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// An opaque actor identity (a player, an admin, a service account).
///
/// Wide enough to carry a UUID verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u128);

impl From<u128> for ActorId {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Identifies one lockable bag page: `(owner, page)`.
///
/// Keys compare structurally and are cheap to copy, so they are built
/// on demand for every request rather than interned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    owner: ActorId,
    page: NonZeroU32,
}

impl ResourceKey {
    /// Builds a key for `owner`'s bag at `page` (1-based).
    pub fn new(owner: ActorId, page: u32) -> Result<Self, KeyError> {
        let page = NonZeroU32::new(page).ok_or(KeyError::ZeroPage)?;
        Ok(Self { owner, page })
    }

    pub const fn from_nonzero(owner: ActorId, page: NonZeroU32) -> Self {
        Self { owner, page }
    }

    pub const fn owner(&self) -> ActorId {
        self.owner
    }

    pub const fn page(&self) -> u32 {
        self.page.get()
    }

    /// True when `actor` is the identity this bag belongs to.
    pub fn is_owned_by(&self, actor: ActorId) -> bool {
        self.owner == actor
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.page)
    }
}
