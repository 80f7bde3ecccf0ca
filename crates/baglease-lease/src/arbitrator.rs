use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use baglease_core::{
    AccessDecision, AccessMode, ActorId, Clock, LeaseInfo, LeaseKind, ResourceKey, SystemClock,
};
use baglease_notify::{NoopNotifier, Notice, Notifier};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, trace, warn};

use crate::config::ArbitratorConfig;
use crate::metrics::{ArbiterMetrics, EvictionReason};
use crate::viewers::ViewerRegistry;

/// Arbitrates access to bag pages between owners and admins.
///
/// # Policy
///
/// * The owner always outranks an admin. An admin arriving while the owner
///   is active gets a read-only view instead of a denial, and is told when
///   the owner (re)takes the page.
/// * Two admins never edit the same page: first come, first served.
/// * Leases are not renewed by use. Once older than the lease duration they
///   are treated as abandoned and evicted on the next touch of the key.
///
/// # Concurrency
///
/// Lease state lives in a sharded map. Every read-modify-write on one key
/// runs under that key's entry guard, so requests on the same key are
/// linearizable while different keys proceed in parallel. The viewer
/// registry is only ever locked after the lease map, never before.
/// Notices go out after the guard is dropped.
pub struct LeaseArbitrator {
    leases: DashMap<ResourceKey, LeaseInfo>,
    viewers: ViewerRegistry,
    ttl_ms: AtomicU64,
    notify_read_only_viewers: bool,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    metrics: Option<ArbiterMetrics>,
}

impl fmt::Debug for LeaseArbitrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseArbitrator")
            .field("leases", &self.leases.len())
            .field("viewed_keys", &self.viewers.key_count())
            .field("ttl_ms", &self.ttl_ms.load(Ordering::Relaxed))
            .field("notify_read_only_viewers", &self.notify_read_only_viewers)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

enum OwnerOutcome {
    Acquired { replaced: Option<LeaseInfo> },
    Reaffirmed,
    Blocked(LeaseInfo),
}

impl Default for LeaseArbitrator {
    fn default() -> Self {
        Self::new(ArbitratorConfig::default())
    }
}

impl LeaseArbitrator {
    /// Arbitrator with the system clock and no notification delivery.
    pub fn new(config: ArbitratorConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> LeaseArbitratorBuilder {
        LeaseArbitratorBuilder::default()
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Changes the lease duration for every subsequent expiry check.
    pub fn set_lease_duration(&self, ttl: Duration) {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.ttl_ms.store(ttl_ms, Ordering::Relaxed);
        info!(ttl_ms, "lease duration changed");
    }

    pub fn set_lease_duration_secs(&self, secs: u64) {
        self.set_lease_duration(Duration::from_secs(secs));
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_millis(self.ttl_ms.load(Ordering::Relaxed))
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// The owner opens their own page.
    ///
    /// Granted for edit unless a live admin lease is in the way. A repeat
    /// request by the current holder re-affirms the lease without resetting
    /// its clock. Every fresh acquisition tells the page's read-only viewers
    /// that the owner has arrived.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key, actor = %actor))]
    pub fn request_as_owner(
        &self,
        key: ResourceKey,
        actor: ActorId,
        actor_name: &str,
    ) -> AccessDecision {
        if !key.is_owned_by(actor) {
            warn!("owner request from an actor that does not own this bag");
        }

        let now = self.clock.now_ms();
        let ttl = self.lease_duration();
        let fresh = LeaseInfo::new(actor, actor_name, LeaseKind::Owner, now);

        let (outcome, to_notify) = match self.leases.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                (
                    OwnerOutcome::Acquired { replaced: None },
                    self.viewers_to_notify(&key),
                )
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.is_held_by(actor) {
                    (OwnerOutcome::Reaffirmed, Vec::new())
                } else if current.is_expired(ttl, now) || current.kind == LeaseKind::Owner {
                    let replaced = slot.insert(fresh);
                    (
                        OwnerOutcome::Acquired {
                            replaced: Some(replaced),
                        },
                        self.viewers_to_notify(&key),
                    )
                } else {
                    (OwnerOutcome::Blocked(current.clone()), Vec::new())
                }
            }
        };

        let decision = match outcome {
            OwnerOutcome::Acquired { replaced } => {
                match replaced {
                    Some(old) if old.is_expired(ttl, now) => {
                        info!(
                            previous = %old.holder_id,
                            kind = %old.kind,
                            "reclaimed expired lease"
                        );
                        self.record_evictions(EvictionReason::Expired, 1);
                    }
                    Some(old) => {
                        warn!(
                            previous = %old.holder_id,
                            "owner lease taken over by a different actor"
                        );
                    }
                    None => debug!("owner lease acquired"),
                }
                self.notify_all(&to_notify, &Notice::owner_arrived(key, actor_name));
                AccessDecision::edit_granted()
            }
            OwnerOutcome::Reaffirmed => {
                debug!("owner re-entered; lease clock unchanged");
                AccessDecision::edit_granted()
            }
            OwnerOutcome::Blocked(lease) => {
                debug!(holder = %lease.holder_id, "owner blocked by admin lease");
                AccessDecision::blocked(lease)
            }
        };

        self.record_decision(LeaseKind::Owner, &decision);
        decision
    }

    /// An admin opens someone else's page.
    ///
    /// Takes an edit lease when the page is free (or its lease is stale).
    /// Falls back to a read-only view while the owner is active, and is
    /// blocked by another admin's live lease.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key, actor = %actor))]
    pub fn request_as_admin(
        &self,
        key: ResourceKey,
        actor: ActorId,
        actor_name: &str,
    ) -> AccessDecision {
        let now = self.clock.now_ms();
        let ttl = self.lease_duration();
        let fresh = LeaseInfo::new(actor, actor_name, LeaseKind::Admin, now);

        let decision = match self.leases.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                debug!("admin lease acquired");
                AccessDecision::edit_granted()
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.is_expired(ttl, now) {
                    let old = slot.insert(fresh);
                    info!(previous = %old.holder_id, kind = %old.kind, "reclaimed expired lease");
                    self.record_evictions(EvictionReason::Expired, 1);
                    AccessDecision::edit_granted()
                } else {
                    match current.kind {
                        LeaseKind::Owner => {
                            let owner_lease = current.clone();
                            self.viewers.register(key, actor);
                            debug!(owner = %owner_lease.holder_id, "owner active; read-only view");
                            AccessDecision::read_only(owner_lease)
                        }
                        LeaseKind::Admin if current.is_held_by(actor) => {
                            AccessDecision::edit_granted()
                        }
                        LeaseKind::Admin => {
                            debug!(holder = %current.holder_id, "admin blocked by another admin");
                            AccessDecision::blocked(current.clone())
                        }
                    }
                }
            }
        };

        self.record_decision(LeaseKind::Admin, &decision);
        decision
    }

    /// A read-only viewer pressed "refresh".
    ///
    /// Re-runs the admin policy, which upgrades to edit if the owner has
    /// left and otherwise keeps the viewer registered for notices.
    pub fn refresh_admin_view(
        &self,
        key: ResourceKey,
        actor: ActorId,
        actor_name: &str,
    ) -> AccessDecision {
        let decision = self.request_as_admin(key, actor, actor_name);
        debug!(%key, %actor, outcome = decision.outcome_label(), "admin view refreshed");
        decision
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Drops `holder`'s lease on `key`, if it still holds it, and its viewer
    /// registration. Releasing something you do not hold is a no-op.
    pub fn release(&self, key: &ResourceKey, holder: ActorId) {
        let released = self
            .leases
            .remove_if(key, |_, lease| lease.is_held_by(holder))
            .is_some();
        let was_viewer = self.viewers.unregister(key, holder);

        if released {
            self.record_evictions(EvictionReason::Released, 1);
        }
        debug!(%key, %holder, released, was_viewer, "release");
    }

    /// Drops every lease and viewer registration held by `holder`, e.g.
    /// when the actor disconnects. Returns the number of leases dropped.
    pub fn release_all(&self, holder: ActorId) -> usize {
        let mut released = 0usize;
        self.leases.retain(|_, lease| {
            let keep = !lease.is_held_by(holder);
            if !keep {
                released += 1;
            }
            keep
        });
        let views = self.viewers.unregister_everywhere(holder);

        self.record_evictions(EvictionReason::ReleaseAll, released as u64);
        debug!(%holder, released, views, "release all");
        released
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The mode `viewer` should currently be shown.
    ///
    /// Only a live owner lease held by someone else forces read-only; a live
    /// admin lease does not downgrade third parties here. Evicts an expired
    /// lease as a side effect.
    pub fn current_access_mode(&self, key: &ResourceKey, viewer: ActorId) -> AccessMode {
        let now = self.clock.now_ms();
        let ttl = self.lease_duration();
        self.evict_if_expired(key, ttl, now);

        match self.leases.get(key) {
            Some(lease) if !lease.is_held_by(viewer) && lease.kind == LeaseKind::Owner => {
                AccessMode::ReadOnly
            }
            _ => AccessMode::Edit,
        }
    }

    /// True when no live lease exists. Never mutates; the next request
    /// performs the actual reclaim.
    pub fn can_upgrade_to_edit(&self, key: &ResourceKey) -> bool {
        let now = self.clock.now_ms();
        let ttl = self.lease_duration();
        self.leases
            .get(key)
            .is_none_or(|lease| lease.is_expired(ttl, now))
    }

    /// The live lease on `key`, evicting it first if it has expired.
    pub fn lease_info(&self, key: &ResourceKey) -> Option<LeaseInfo> {
        let now = self.clock.now_ms();
        let ttl = self.lease_duration();
        self.evict_if_expired(key, ttl, now);
        self.leases.get(key).map(|lease| lease.clone())
    }

    pub fn is_locked(&self, key: &ResourceKey) -> bool {
        self.lease_info(key).is_some()
    }

    /// Read-only viewers registered on `key`, ascending.
    pub fn viewers(&self, key: &ResourceKey) -> Vec<ActorId> {
        self.viewers.snapshot(key)
    }

    /// Leases in the table, including expired ones not yet evicted.
    pub fn lease_count(&self) -> usize {
        self.leases.len()
    }

    // ------------------------------------------------------------------
    // Housekeeping
    // ------------------------------------------------------------------

    /// Evicts every expired lease in one pass.
    ///
    /// Viewers of a page whose owner lease lapsed are told that edit access
    /// may be available. Returns the number of leases evicted.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let ttl = self.lease_duration();

        let mut evicted = 0usize;
        let mut lapsed_owners = Vec::new();
        self.leases.retain(|key, lease| {
            if !lease.is_expired(ttl, now) {
                return true;
            }
            evicted += 1;
            if lease.kind == LeaseKind::Owner {
                lapsed_owners.push((*key, lease.holder_name.clone()));
            }
            false
        });

        self.record_evictions(EvictionReason::Expired, evicted as u64);
        for (key, owner_name) in lapsed_owners {
            // Re-taken between the sweep and now; its viewers already got
            // the arrival notice.
            if self.leases.get(&key).is_some_and(|lease| !lease.is_expired(ttl, now)) {
                continue;
            }
            let viewers = self.viewers_to_notify(&key);
            self.notify_all(&viewers, &Notice::owner_lease_lapsed(key, owner_name));
        }

        if evicted > 0 {
            info!(evicted, "swept expired leases");
        }
        evicted
    }

    /// Releases everything. Returns the number of leases dropped.
    pub fn shutdown(&self) -> usize {
        let mut dropped = 0usize;
        self.leases.retain(|_, _| {
            dropped += 1;
            false
        });
        self.viewers.clear();

        self.record_evictions(EvictionReason::Shutdown, dropped as u64);
        info!(dropped, "lease arbitrator shut down");
        dropped
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn evict_if_expired(&self, key: &ResourceKey, ttl: Duration, now: u64) {
        if let Some((_, old)) = self
            .leases
            .remove_if(key, |_, lease| lease.is_expired(ttl, now))
        {
            debug!(%key, holder = %old.holder_id, "evicted expired lease");
            self.record_evictions(EvictionReason::Expired, 1);
        }
    }

    /// Must be called with the key's lease guard held (or after the lease
    /// table has been updated) so the snapshot matches the transition.
    fn viewers_to_notify(&self, key: &ResourceKey) -> Vec<ActorId> {
        if self.notify_read_only_viewers {
            self.viewers.snapshot(key)
        } else {
            Vec::new()
        }
    }

    fn notify_all(&self, recipients: &[ActorId], notice: &Notice) {
        for &recipient in recipients {
            let delivered = match self.notifier.notify(recipient, notice) {
                Ok(()) => {
                    trace!(%recipient, kind = ?notice.kind, "notice delivered");
                    true
                }
                Err(err) => {
                    trace!(%recipient, error = %err, "notice dropped");
                    false
                }
            };
            if let Some(metrics) = &self.metrics {
                metrics.record_notification(delivered);
            }
        }
    }

    fn record_decision(&self, role: LeaseKind, decision: &AccessDecision) {
        if let Some(metrics) = &self.metrics {
            metrics.record_decision(role.as_str(), decision.outcome_label());
        }
    }

    fn record_evictions(&self, reason: EvictionReason, count: u64) {
        if let Some(metrics) = &self.metrics {
            metrics.record_evictions(reason, count);
        }
    }
}

/// Builder for [`LeaseArbitrator`].
#[derive(Default)]
pub struct LeaseArbitratorBuilder {
    config: Option<ArbitratorConfig>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<ArbiterMetrics>,
}

impl LeaseArbitratorBuilder {
    /// Sets the configuration (default: [`ArbitratorConfig::default`]).
    pub fn config(mut self, config: ArbitratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the notice delivery mechanism (default: [`NoopNotifier`]).
    pub fn notifier<N: Notifier + 'static>(mut self, notifier: Arc<N>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the time source (default: [`SystemClock`]).
    pub fn clock<C: Clock + 'static>(mut self, clock: Arc<C>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Attaches prometheus collectors.
    pub fn metrics(mut self, metrics: ArbiterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> LeaseArbitrator {
        let config = self.config.unwrap_or_default();
        let ttl_ms = u64::try_from(config.lease_ttl().as_millis()).unwrap_or(u64::MAX);

        LeaseArbitrator {
            leases: DashMap::new(),
            viewers: ViewerRegistry::new(),
            ttl_ms: AtomicU64::new(ttl_ms),
            notify_read_only_viewers: config.notify_read_only_viewers,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            metrics: self.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baglease_core::ManualClock;

    const OWNER: ActorId = ActorId(1);
    const ADMIN: ActorId = ActorId(100);

    fn key(page: u32) -> ResourceKey {
        ResourceKey::new(OWNER, page).unwrap()
    }

    fn arbitrator() -> (LeaseArbitrator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let arbitrator = LeaseArbitrator::builder().clock(Arc::clone(&clock)).build();
        arbitrator.set_lease_duration_secs(1);
        (arbitrator, clock)
    }

    #[test]
    fn test_default_duration_comes_from_config() {
        let arbitrator = LeaseArbitrator::default();
        assert_eq!(arbitrator.lease_duration(), Duration::from_secs(300));
    }

    #[test]
    fn test_owner_takes_over_foreign_owner_lease() {
        let (arbitrator, _clock) = arbitrator();
        let impostor = ActorId(2);

        assert!(arbitrator.request_as_owner(key(1), impostor, "Impostor").is_edit_mode());
        let decision = arbitrator.request_as_owner(key(1), OWNER, "Steve");

        assert!(decision.is_edit_mode());
        assert_eq!(arbitrator.lease_info(&key(1)).unwrap().holder_id, OWNER);
    }

    #[test]
    fn test_same_owner_expired_lease_is_reaffirmed_not_renewed() {
        let (arbitrator, clock) = arbitrator();
        assert!(arbitrator.request_as_owner(key(1), OWNER, "Steve").is_edit_mode());
        clock.advance(Duration::from_millis(1_500));

        let decision = arbitrator.request_as_owner(key(1), OWNER, "Steve");

        assert!(decision.is_edit_mode());
        // Still the original (now expired) lease; the next touch evicts it.
        assert!(!arbitrator.is_locked(&key(1)));
    }

    #[test]
    fn test_current_access_mode_evicts_expired() {
        let (arbitrator, clock) = arbitrator();
        assert!(arbitrator.request_as_owner(key(1), OWNER, "Steve").is_edit_mode());
        assert_eq!(arbitrator.current_access_mode(&key(1), ADMIN), AccessMode::ReadOnly);

        clock.advance(Duration::from_millis(1_001));
        assert_eq!(arbitrator.lease_count(), 1);
        assert_eq!(arbitrator.current_access_mode(&key(1), ADMIN), AccessMode::Edit);
        assert_eq!(arbitrator.lease_count(), 0);
    }

    #[test]
    fn test_can_upgrade_does_not_mutate() {
        let (arbitrator, clock) = arbitrator();
        assert!(arbitrator.request_as_admin(key(1), ADMIN, "Alex").is_edit_mode());
        clock.advance(Duration::from_secs(2));

        assert!(arbitrator.can_upgrade_to_edit(&key(1)));
        assert_eq!(arbitrator.lease_count(), 1);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let (arbitrator, _clock) = arbitrator();
        assert!(arbitrator.request_as_owner(key(1), OWNER, "Steve").is_edit_mode());
        assert!(arbitrator.request_as_admin(key(1), ADMIN, "Alex").is_read_only_mode());
        assert!(arbitrator.request_as_admin(key(2), ADMIN, "Alex").is_edit_mode());

        assert_eq!(arbitrator.shutdown(), 2);
        assert_eq!(arbitrator.lease_count(), 0);
        assert!(arbitrator.viewers(&key(1)).is_empty());
    }
}
