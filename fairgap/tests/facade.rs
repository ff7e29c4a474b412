use std::sync::Arc;

use chrono::{TimeZone, Utc};
use fairgap::{
    CacheConfig, CalendarConfig, ClosureReason, FairGap, FairGapError, FillMode, FvgConfig,
    FvgState, GapKind, Granularity, ReportCache, RuleSet, ScanStrategy, TradingCalendar,
};
use fairgap_mock::{SeriesFixture, fixtures};

#[test]
fn defaults_reproduce_reference_scenarios() {
    let fg = FairGap::builder().build().unwrap();

    let fvgs = fg.detect_fvgs(&fixtures::unfilled_drift(40)).unwrap();
    assert_eq!(fvgs.fvgs.len(), 1);
    assert_eq!(fvgs.fvgs[0].state, FvgState::Expired);

    let weekend = fg.analyze_continuity(&fixtures::weekend_break(), 15).unwrap();
    assert_eq!(
        weekend.closures[0].kind,
        GapKind::TradingClosure(ClosureReason::Weekend)
    );
    let hole = fg.analyze_series(&fixtures::session_hole()).unwrap();
    assert_eq!(hole.missing_bar_total, 7);
}

#[test]
fn builder_options_reach_the_engines() {
    let fg = FairGap::builder()
        .max_age_bars(10)
        .overlap_threshold(0.8)
        .rules(RuleSet::THREE_BAR_ONLY)
        .fill_mode(FillMode::Accumulating)
        .strategy(ScanStrategy::Partitioned)
        .workers(2)
        .chunk_size(16)
        .build()
        .unwrap();
    assert_eq!(fg.fvg_config().max_age_bars, 10);
    assert_eq!(fg.fvg_config().fill_mode, FillMode::Accumulating);
    assert_eq!(fg.continuity_config().strategy, ScanStrategy::Partitioned);
    assert_eq!(fg.continuity_config().workers, Some(2));

    // Ten-bar window: the drift fixture now expires at index 10.
    let report = fg.detect_fvgs(&fixtures::unfilled_drift(40)).unwrap();
    assert_eq!(report.fvgs[0].expired_at, Some(10));
    // Single-bar gaps are off.
    assert!(fg.detect_fvgs(&fixtures::bull_single_bar_gap()).unwrap().fvgs.is_empty());
}

#[test]
fn per_call_options_override_defaults() {
    let fg = FairGap::builder().build().unwrap();
    let series = fixtures::unfilled_drift(40);
    let short = FvgConfig {
        max_age_bars: 5,
        ..FvgConfig::default()
    };
    let report = fg.detect_fvgs_with(&series, &short).unwrap();
    assert_eq!(report.fvgs[0].expired_at, Some(5));
    assert_eq!(fg.detect_fvgs(&series).unwrap().fvgs[0].expired_at, Some(40));
}

#[test]
fn repeated_bars_do_not_shift_fvg_indices() {
    let fg = FairGap::builder().build().unwrap();
    let series = fixtures::unfilled_drift(40);
    let mut bars = series.as_slice().to_vec();
    bars.insert(11, bars[10].clone());
    let repeated = fairgap::CandleSeries::new(Granularity::M15, bars);
    assert!(repeated.has_duplicates());

    let report = fg.detect_fvgs(&repeated).unwrap();
    assert_eq!(report, fg.detect_fvgs(&series).unwrap());
    assert_eq!(report.fvgs.len(), 1);
    assert_eq!(report.fvgs[0].expired_at, Some(40));
}

#[test]
fn invalid_options_fail_at_build() {
    for builder in [
        FairGap::builder().max_age_bars(0),
        FairGap::builder().max_age_bars(1),
        FairGap::builder().overlap_threshold(0.0),
        FairGap::builder().overlap_threshold(1.5),
        FairGap::builder().chunk_size(0),
        FairGap::builder().workers(0),
        FairGap::builder().calendar_config(CalendarConfig {
            first_year: 2050,
            last_year: 2040,
            ..CalendarConfig::default()
        }),
    ] {
        let err = builder.build().unwrap_err();
        assert!(matches!(err, FairGapError::InvalidArg(_)), "{err}");
    }

    let fg = FairGap::builder().build().unwrap();
    let bad = FvgConfig {
        overlap_threshold: 2.0,
        ..FvgConfig::default()
    };
    assert!(fg.detect_fvgs_with(&fixtures::bull_three_bar(), &bad).is_err());
}

#[test]
fn shared_calendar_and_cache() {
    let calendar = Arc::new(TradingCalendar::default());
    let cache = ReportCache::new(&CacheConfig::default());
    let a = FairGap::builder()
        .calendar(Arc::clone(&calendar))
        .cache(cache.clone())
        .build()
        .unwrap();
    let b = FairGap::builder()
        .calendar(Arc::clone(&calendar))
        .cache(cache.clone())
        .strategy(ScanStrategy::Naive)
        .build()
        .unwrap();
    assert!(Arc::ptr_eq(a.calendar(), b.calendar()));

    let series = fixtures::session_hole();
    let first = a.analyze_continuity(&series, 15).unwrap();
    let second = b.analyze_continuity(&series, 15).unwrap();
    assert_eq!(first, second);
    a.detect_fvgs(&series).unwrap();
    assert_eq!(cache.entry_count(), 2);

    b.clear_cache();
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn cached_errors_are_not_sticky() {
    let fg = FairGap::builder()
        .cache_config(CacheConfig::default())
        .build()
        .unwrap();
    let series = fixtures::session_hole();
    assert!(fg.analyze_continuity(&series, 5).is_err());
    assert!(fg.analyze_continuity(&series, 15).is_ok());
    assert_eq!(fg.cache().map(ReportCache::entry_count), Some(1));
}

#[test]
fn adaptive_strategy_matches_fixed() {
    let start = Utc.with_ymd_and_hms(2024, 2, 5, 14, 30, 0).unwrap();
    let series = SeriesFixture::new(Granularity::M5, start)
        .bars(2_000)
        .drop_range(100..140)
        .duplicate(500)
        .build_series()
        .unwrap();
    let adaptive = FairGap::builder().adaptive_strategy(true).build().unwrap();
    let fixed = FairGap::builder()
        .strategy(ScanStrategy::Naive)
        .build()
        .unwrap();
    assert_eq!(
        adaptive.analyze_series(&series).unwrap(),
        fixed.analyze_series(&series).unwrap()
    );
}

#[test]
fn unlabelled_candles_get_an_inferred_granularity() {
    let fg = FairGap::builder().build().unwrap();
    let candles = fixtures::session_hole().as_slice().to_vec();
    let series = fg.series_from_candles(candles).unwrap();
    assert_eq!(series.granularity(), Granularity::M15);
    assert!(fg.series_from_candles(Vec::new()).is_err());
}

#[test]
fn reports_serialize() {
    let fg = FairGap::builder().build().unwrap();
    let report = fg.detect_fvgs(&fixtures::body_fill()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["filled"], 1);
    let audit = fg.analyze_series(&fixtures::weekend_break()).unwrap();
    let back: fairgap::ContinuityReport =
        serde_json::from_str(&serde_json::to_string(&audit).unwrap()).unwrap();
    assert_eq!(back, audit);
}
