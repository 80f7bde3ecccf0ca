use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::arbitrator::LeaseArbitrator;
use crate::config::ArbitratorConfig;

/// Runs [`LeaseArbitrator::sweep_expired`] every `period` on the current
/// tokio runtime until the handle is aborted.
///
/// Expiry is still enforced lazily on every request; the sweep only makes
/// lapsed-owner notices arrive without waiting for someone to touch the key.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn spawn_sweeper(arbitrator: Arc<LeaseArbitrator>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            arbitrator.sweep_expired();
        }
    })
}

/// Spawns the sweeper if `config` enables it.
pub fn spawn_configured_sweeper(
    arbitrator: Arc<LeaseArbitrator>,
    config: &ArbitratorConfig,
) -> Option<JoinHandle<()>> {
    let period = config.sweep_interval()?;
    tracing::info!(period_secs = period.as_secs(), "starting lease sweeper");
    Some(spawn_sweeper(arbitrator, period))
}
