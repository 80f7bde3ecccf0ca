//! # baglease-lease
//!
//! The lease arbitrator: decides who may edit a bag page, who gets a
//! read-only view, and reclaims abandoned leases.
//!
//! ```text
//!              request_as_owner            request_as_admin
//!   UNLOCKED ───────────────────▶ OWNER ◀──── (read-only view, viewer registered)
//!      ▲  ▲                         │
//!      │  └── release / expiry ─────┘
//!      │
//!      └── release / expiry ──── ADMIN ◀──── request_as_admin (page free)
//!                                  │
//!                                  └── blocks owners and other admins
//! ```

mod arbitrator;
mod config;
mod metrics;
mod sweeper;
mod viewers;

pub use arbitrator::{LeaseArbitrator, LeaseArbitratorBuilder};
pub use config::{
    ArbitratorConfig, ArbitratorConfigBuilder, ConfigError, DEFAULT_LEASE_TTL_SECS,
    ENV_LEASE_TTL_SECS, ENV_NOTIFY_READ_ONLY_VIEWERS, ENV_SWEEP_INTERVAL_SECS,
    MAX_LEASE_TTL_SECS, MIN_LEASE_TTL_SECS,
};
pub use metrics::{ArbiterMetrics, EvictionReason};
pub use sweeper::{spawn_configured_sweeper, spawn_sweeper};
pub use viewers::ViewerRegistry;
