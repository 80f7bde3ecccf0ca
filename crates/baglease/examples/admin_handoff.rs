//! An admin opens a player's bag while the player is using it, watches
//! read-only, and takes over once the player closes it.
//!
//! ```sh
//! RUST_LOG=baglease_lease=debug cargo run -p baglease --example admin_handoff
//! ```

use std::sync::Arc;

use baglease::prelude::*;
use baglease::telemetry::{TelemetryConfig, shutdown_tracing};

#[tokio::main]
async fn main() -> Result<(), BagLeaseError> {
    TelemetryConfig::builder()
        .service_name("admin-handoff")
        .build()
        .init()?;

    let config = ArbitratorConfig::from_env()?;
    let notifier = Arc::new(ChannelNotifier::new());
    let registry = prometheus::Registry::new();
    let arbitrator = Arc::new(
        LeaseArbitrator::builder()
            .config(config.clone())
            .notifier(Arc::clone(&notifier))
            .metrics(ArbiterMetrics::register(&registry)?)
            .build(),
    );
    let sweeper = spawn_configured_sweeper(Arc::clone(&arbitrator), &config);

    let steve = ActorId(0x5745);
    let alex = ActorId(0xa1e);
    let bag = ResourceKey::new(steve, 1)?;
    let mut alex_inbox = notifier.connect(alex);

    println!("Steve opens {bag}");
    let opened = arbitrator.request_as_owner(bag, steve, "Steve");
    println!("  -> {:?}", opened.mode());

    println!("Alex opens {bag}");
    let view = arbitrator.request_as_admin(bag, alex, "Alex");
    println!("  -> {:?}: {}", view.mode(), view.message().unwrap_or_default());

    println!("Steve closes and re-opens the bag");
    arbitrator.release(&bag, steve);
    let reopened = arbitrator.request_as_owner(bag, steve, "Steve");
    println!("  -> {:?}", reopened.mode());
    if let Some(notice) = alex_inbox.recv().await {
        println!("  Alex is told: {notice}");
    }

    println!("Steve logs out");
    arbitrator.release_all(steve);

    println!("Alex refreshes");
    let upgraded = arbitrator.refresh_admin_view(bag, alex, "Alex");
    println!("  -> {:?}", upgraded.mode());
    if let Some(lease) = arbitrator.lease_info(&bag) {
        println!("  lease: {} ({}) since {}", lease.holder_name, lease.kind, lease.acquired_at_ms);
    }

    arbitrator.release(&bag, alex);

    if let Some(handle) = sweeper {
        handle.abort();
    }
    arbitrator.shutdown();
    shutdown_tracing();
    Ok(())
}
