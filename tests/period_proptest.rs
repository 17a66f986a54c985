use std::time::Duration;

use historica::db::models::Period;
use historica::engine::period::{clamp_position, derive_period, TimeTravel};
use proptest::prelude::*;

const SETTLE: Duration = Duration::from_millis(500);

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

#[test]
fn test_boundaries() {
    assert_eq!(derive_period(33.0), Period::Past);
    assert_eq!(derive_period(66.0), Period::Present);
    assert_eq!(derive_period(-1.0), Period::Ancient);
    assert_eq!(derive_period(1000.0), Period::Present);
}

proptest! {
    #[test]
    fn prop_thresholds(p in -50.0f64..150.0) {
        let expected = if p < 33.0 {
            Period::Ancient
        } else if p < 66.0 {
            Period::Past
        } else {
            Period::Present
        };
        prop_assert_eq!(derive_period(p), expected);
        prop_assert!((0.0..=100.0).contains(&clamp_position(p)));
    }

    #[test]
    fn prop_burst_commits_once_with_last_target(
        targets in proptest::collection::vec(-20.0f64..120.0, 1..10),
        gap_ms in 0u64..400,
    ) {
        let rt = paused_runtime();
        let snap = rt.block_on(async {
            let view = TimeTravel::new(SETTLE);
            for p in &targets {
                view.set_by_position(*p);
                tokio::time::sleep(Duration::from_millis(gap_ms)).await;
            }
            tokio::time::sleep(SETTLE * 2).await;
            view.snapshot()
        });

        let last = clamp_position(*targets.last().unwrap());
        prop_assert_eq!(snap.commits, 1);
        prop_assert_eq!(snap.position, last);
        prop_assert_eq!(snap.period, derive_period(last));
        prop_assert!(!snap.transitioning);
    }

    #[test]
    fn prop_discrete_is_idempotent(
        period in prop_oneof![Just(Period::Ancient), Just(Period::Past), Just(Period::Present)],
        repeats in 1usize..4,
    ) {
        let rt = paused_runtime();
        let snap = rt.block_on(async {
            let view = TimeTravel::new(SETTLE);
            for _ in 0..repeats {
                view.set_by_discrete(period);
            }
            tokio::time::sleep(SETTLE * 2).await;
            view.snapshot()
        });

        prop_assert_eq!(snap.period, period);
        prop_assert_eq!(derive_period(snap.position), period);
        prop_assert_eq!(snap.commits, 1);
    }
}
