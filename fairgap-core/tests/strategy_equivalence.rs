use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use fairgap_core::{
    ContinuityAnalyzer, ContinuityConfig, Granularity, ReportStatus, ScanStrategy,
    TradingCalendar,
};
use fairgap_mock::SeriesFixture;
use proptest::prelude::*;

// 2023-01-01T00:00:00Z
const BASE: i64 = 1_672_531_200;

fn arb_start() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..730, 0i64..96).prop_map(|(day, quarter)| {
        DateTime::from_timestamp(BASE, 0).unwrap()
            + TimeDelta::days(day)
            + TimeDelta::minutes(15 * quarter)
    })
}

fn arb_granularity() -> impl Strategy<Value = Granularity> {
    prop::sample::select(vec![
        Granularity::M1,
        Granularity::M5,
        Granularity::M15,
        Granularity::H1,
        Granularity::H4,
        Granularity::D1,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn strategies_agree(
        granularity in arb_granularity(),
        start in arb_start(),
        bars in 3usize..400,
        seed in any::<u64>(),
        session_aware in any::<bool>(),
        holes in proptest::collection::vec((0usize..400, 1usize..30), 0..4),
        dupes in proptest::collection::vec(0usize..400, 0..3),
        workers in 1usize..4,
        chunk_size in 1usize..64,
    ) {
        let calendar = Arc::new(TradingCalendar::default());
        let mut fixture = SeriesFixture::new(granularity, start).bars(bars).seed(seed);
        fixture = if session_aware {
            fixture.calendar(Arc::clone(&calendar))
        } else {
            fixture.continuous()
        };
        for (at, len) in holes {
            fixture = fixture.drop_range(at..at + len);
        }
        for at in dupes {
            fixture = fixture.duplicate(at);
        }
        let series = fixture.build_series().unwrap();

        let config = ContinuityConfig { workers: Some(workers), chunk_size, ..ContinuityConfig::default() };
        let analyzer = ContinuityAnalyzer::new(calendar, config).unwrap();
        let reference = analyzer.with_strategy(ScanStrategy::Naive).analyze_series(&series).unwrap();
        for strategy in ScanStrategy::ALL {
            let report = analyzer.with_strategy(strategy).analyze_series(&series).unwrap();
            prop_assert_eq!(&report, &reference, "{:?} diverged", strategy);
        }

        let counted: u64 = reference.data_missing.iter().map(|g| g.missing_bars).sum();
        prop_assert_eq!(counted, reference.missing_bar_total);
        prop_assert!(reference.closures.iter().all(|g| g.missing_bars == 0));
        if reference.status == ReportStatus::Completed {
            prop_assert!(reference.continuity_pct > 0.0 && reference.continuity_pct <= 100.0);
        }
    }

    #[test]
    fn gapless_session_walk_reports_no_missing_data(
        start in arb_start(),
        bars in 3usize..300,
    ) {
        let series = SeriesFixture::new(Granularity::M15, start).bars(bars).build_series().unwrap();
        let analyzer = ContinuityAnalyzer::new(
            Arc::new(TradingCalendar::default()),
            ContinuityConfig::default(),
        ).unwrap();
        let report = analyzer.analyze_series(&series).unwrap();
        prop_assert!(report.data_missing.is_empty());
        prop_assert_eq!(report.missing_bar_total, 0);
        prop_assert!(report.duplicates.is_empty());
    }
}

#[test]
fn out_of_window_series_fails_for_every_strategy() {
    let calendar = Arc::new(TradingCalendar::default());
    let start = DateTime::from_timestamp(BASE, 0).unwrap() - TimeDelta::days(365 * 24);
    let series = SeriesFixture::new(Granularity::H1, start)
        .continuous()
        .bars(50)
        .build_series()
        .unwrap();
    let analyzer = ContinuityAnalyzer::new(calendar, ContinuityConfig::default()).unwrap();
    for strategy in ScanStrategy::ALL {
        let err = analyzer.with_strategy(strategy).analyze_series(&series).unwrap_err();
        assert!(matches!(
            err,
            fairgap_core::FairGapError::CalendarRangeExceeded { .. }
        ));
    }
}
