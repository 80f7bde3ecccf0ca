use prometheus::{IntCounterVec, Opts, Registry};

/// Why a lease left the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Released,
    ReleaseAll,
    Expired,
    Shutdown,
}

impl EvictionReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Released => "released",
            Self::ReleaseAll => "release_all",
            Self::Expired => "expired",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Prometheus collectors for arbitration outcomes.
#[derive(Debug, Clone)]
pub struct ArbiterMetrics {
    decisions: IntCounterVec,
    evictions: IntCounterVec,
    notifications: IntCounterVec,
}

impl ArbiterMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            decisions: IntCounterVec::new(
                Opts::new("baglease_decisions_total", "Access decisions by role and outcome"),
                &["role", "outcome"],
            )?,
            evictions: IntCounterVec::new(
                Opts::new("baglease_evictions_total", "Leases removed, by reason"),
                &["reason"],
            )?,
            notifications: IntCounterVec::new(
                Opts::new("baglease_notifications_total", "Viewer notices by delivery result"),
                &["result"],
            )?,
        })
    }

    /// Creates the collectors and registers them with `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let metrics = Self::new()?;
        registry.register(Box::new(metrics.decisions.clone()))?;
        registry.register(Box::new(metrics.evictions.clone()))?;
        registry.register(Box::new(metrics.notifications.clone()))?;
        Ok(metrics)
    }

    pub fn record_decision(&self, role: &str, outcome: &str) {
        self.decisions.with_label_values(&[role, outcome]).inc();
    }

    pub fn record_evictions(&self, reason: EvictionReason, count: u64) {
        if count > 0 {
            self.evictions
                .with_label_values(&[reason.as_str()])
                .inc_by(count);
        }
    }

    pub fn record_notification(&self, delivered: bool) {
        let result = if delivered { "delivered" } else { "unreachable" };
        self.notifications.with_label_values(&[result]).inc();
    }

    pub fn decisions(&self, role: &str, outcome: &str) -> u64 {
        self.decisions.with_label_values(&[role, outcome]).get()
    }

    pub fn evictions(&self, reason: EvictionReason) -> u64 {
        self.evictions.with_label_values(&[reason.as_str()]).get()
    }

    pub fn notifications(&self, delivered: bool) -> u64 {
        let result = if delivered { "delivered" } else { "unreachable" };
        self.notifications.with_label_values(&[result]).get()
    }
}
