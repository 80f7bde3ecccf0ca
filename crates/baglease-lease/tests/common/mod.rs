#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use baglease_core::{AccessMode, ActorId, ManualClock, ResourceKey};
use baglease_lease::{ArbitratorConfig, LeaseArbitrator};
use baglease_notify::{Notice, Notifier, NotifyError};

pub const OWNER: ActorId = ActorId(0x0001);
pub const OTHER_OWNER: ActorId = ActorId(0x0002);
pub const ADMIN: ActorId = ActorId(0x0a01);
pub const ADMIN2: ActorId = ActorId(0x0a02);

pub const START_MS: u64 = 1_700_000_000_000;

pub fn key(page: u32) -> ResourceKey {
    ResourceKey::new(OWNER, page).unwrap()
}

pub fn key_of(owner: ActorId, page: u32) -> ResourceKey {
    ResourceKey::new(owner, page).unwrap()
}

/// Display name used for each test actor.
pub fn name_of(actor: ActorId) -> &'static str {
    match actor {
        OWNER => "Steve",
        OTHER_OWNER => "Herobrine",
        ADMIN => "Alex",
        ADMIN2 => "Sam",
        _ => "Kim",
    }
}

/// The key's owner opens it and must get edit access.
#[track_caller]
pub fn owner_edits(arbitrator: &LeaseArbitrator, key: ResourceKey) {
    let owner = key.owner();
    let decision = arbitrator.request_as_owner(key, owner, name_of(owner));
    assert!(decision.is_edit_mode(), "owner {owner} refused on {key}: {decision:?}");
}

/// `admin` opens `key` and must not be blocked. Returns the granted mode.
#[track_caller]
pub fn admin_opens(arbitrator: &LeaseArbitrator, key: ResourceKey, admin: ActorId) -> AccessMode {
    let decision = arbitrator.request_as_admin(key, admin, name_of(admin));
    decision
        .mode()
        .unwrap_or_else(|| panic!("admin {admin} blocked on {key}: {decision:?}"))
}

/// Records every notice; actors in `offline` are unreachable.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ActorId, Notice)>>,
    offline: Mutex<HashSet<ActorId>>,
}

impl RecordingNotifier {
    pub fn set_offline(&self, actor: ActorId) {
        self.offline.lock().unwrap().insert(actor);
    }

    pub fn sent(&self) -> Vec<(ActorId, Notice)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<ActorId> {
        self.sent().into_iter().map(|(actor, _)| actor).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: ActorId, notice: &Notice) -> Result<(), NotifyError> {
        if self.offline.lock().unwrap().contains(&recipient) {
            return Err(NotifyError::Unreachable(recipient));
        }
        self.sent.lock().unwrap().push((recipient, notice.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub arbitrator: LeaseArbitrator,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Arbitrator on a manual clock with a one-second lease.
pub fn harness() -> Harness {
    harness_with(ArbitratorConfig::default())
}

pub fn harness_with(config: ArbitratorConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(START_MS));
    let notifier = Arc::new(RecordingNotifier::default());
    let arbitrator = LeaseArbitrator::builder()
        .config(config)
        .clock(Arc::clone(&clock))
        .notifier(Arc::clone(&notifier))
        .build();
    arbitrator.set_lease_duration_secs(1);
    Harness {
        arbitrator,
        clock,
        notifier,
    }
}
