//! # baglease
//!
//! Edit leases for shared storage pages ("bags"). The owner of a bag
//! always wins; an admin who arrives while the owner is active gets a
//! read-only view and is told when the owner comes back. Two admins never
//! edit the same page. Abandoned leases expire lazily.
//!
//! ```
//! use baglease::prelude::*;
//!
//! let arbitrator = LeaseArbitrator::default();
//! let owner = ActorId(1);
//! let admin = ActorId(2);
//! let page = ResourceKey::new(owner, 1)?;
//!
//! assert!(arbitrator.request_as_owner(page, owner, "Steve").is_edit_mode());
//! assert!(arbitrator.request_as_admin(page, admin, "Alex").is_read_only_mode());
//!
//! arbitrator.release(&page, owner);
//! assert!(arbitrator.refresh_admin_view(page, admin, "Alex").is_edit_mode());
//! # Ok::<(), baglease::BagLeaseError>(())
//! ```

pub use baglease_core as core;
pub use baglease_lease as lease;
pub use baglease_notify as notify;

pub mod error;
pub mod telemetry;

pub use error::BagLeaseError;

pub mod prelude {
    pub use crate::error::BagLeaseError;
    pub use baglease_core::{
        AccessDecision, AccessMode, ActorId, Clock, LeaseInfo, LeaseKind, ResourceKey,
        SystemClock,
    };
    pub use baglease_lease::{
        ArbiterMetrics, ArbitratorConfig, LeaseArbitrator, spawn_configured_sweeper,
    };
    pub use baglease_notify::{ChannelNotifier, Inbox, Notice, NoticeKind, Notifier};
}
