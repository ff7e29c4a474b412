use fairgap_core::Granularity;
use fairgap_mock::fixtures;

#[test]
fn fixtures_are_sorted_and_clean() {
    for series in [
        fixtures::bull_three_bar(),
        fixtures::bull_single_bar_gap(),
        fixtures::wick_only_intrusion(),
        fixtures::body_fill(),
        fixtures::unfilled_drift(40),
        fixtures::weekend_break(),
        fixtures::holiday_weekend(),
        fixtures::christmas_break(),
        fixtures::session_hole(),
    ] {
        assert_eq!(series.granularity(), Granularity::M15);
        assert!(series.warnings().is_empty());
        assert!(series.as_slice().windows(2).all(|w| w[0].ts < w[1].ts));
    }
}

#[test]
fn drift_length_is_configurable() {
    assert_eq!(fixtures::unfilled_drift(40).len(), 43);
    assert_eq!(fixtures::unfilled_drift(0).len(), 3);
}

#[test]
fn duplicate_fixture_repeats_one_timestamp() {
    let s = fixtures::with_duplicate();
    assert_eq!(s.len(), 9);
    assert!(s.has_duplicates());
}
