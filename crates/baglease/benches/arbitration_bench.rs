use std::sync::Arc;
use std::time::Duration;

use baglease::core::ManualClock;
use baglease::prelude::*;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn key(owner: ActorId, page: u32) -> ResourceKey {
    ResourceKey::new(owner, page).unwrap()
}

fn bench_owner_reentry(c: &mut Criterion) {
    let arbitrator = LeaseArbitrator::default();
    let owner = ActorId(1);
    let page = key(owner, 1);
    assert!(arbitrator.request_as_owner(page, owner, "Steve").is_edit_mode());

    c.bench_function("owner_reentry", |b| {
        b.iter(|| {
            black_box(arbitrator.request_as_owner(black_box(page), owner, "Steve"));
        })
    });
}

fn bench_admin_read_only(c: &mut Criterion) {
    let arbitrator = LeaseArbitrator::default();
    let owner = ActorId(1);
    let page = key(owner, 1);
    assert!(arbitrator.request_as_owner(page, owner, "Steve").is_edit_mode());

    c.bench_function("admin_read_only", |b| {
        b.iter(|| {
            let decision = arbitrator.request_as_admin(black_box(page), ActorId(2), "Alex");
            assert!(decision.is_read_only_mode());
        })
    });
}

fn bench_acquire_release(c: &mut Criterion) {
    let arbitrator = LeaseArbitrator::default();
    let admin = ActorId(2);
    let page = key(ActorId(1), 1);

    c.bench_function("admin_acquire_release", |b| {
        b.iter(|| {
            black_box(arbitrator.request_as_admin(page, admin, "Alex"));
            arbitrator.release(&page, admin);
        })
    });
}

fn bench_sweep(c: &mut Criterion) {
    c.bench_function("sweep_1000_expired", |b| {
        b.iter_batched(
            || {
                let clock = Arc::new(ManualClock::new(0));
                let arbitrator = LeaseArbitrator::builder()
                    .clock(Arc::clone(&clock))
                    .build();
                for owner in 1..=100u128 {
                    for page in 1..=10 {
                        let page = key(ActorId(owner), page);
                        let opened = arbitrator.request_as_owner(page, ActorId(owner), "p");
                        assert!(opened.is_edit_mode());
                    }
                }
                clock.advance(Duration::from_secs(301));
                arbitrator
            },
            |arbitrator| {
                assert_eq!(arbitrator.sweep_expired(), 1_000);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_owner_reentry,
    bench_admin_read_only,
    bench_acquire_release,
    bench_sweep
);
criterion_main!(benches);
