use chrono::{TimeZone, Utc};
use fairgap::{FairGap, FillMode, Granularity, ScanStrategy};
use fairgap_mock::SeriesFixture;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=fairgap=debug shows spans when built with `--features tracing`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Two weeks of 15-minute bars following the futures session, with a
    //    hole punched into the first Wednesday and one repeated bar.
    let start = Utc.with_ymd_and_hms(2024, 2, 5, 14, 30, 0)
        .single()
        .ok_or("invalid start")?;
    let series = SeriesFixture::new(Granularity::M15, start)
        .bars(1_200)
        .seed(2024)
        .max_move_cents(120)
        .drop_range(180..204)
        .duplicate(600)
        .build_series()?;

    // 2. Build the facade.
    let fg = FairGap::builder()
        .max_age_bars(40)
        .fill_mode(FillMode::Single)
        .strategy(ScanStrategy::Partitioned)
        .workers(4)
        .chunk_size(256)
        .build()?;

    // 3. Continuity audit.
    let audit = fg.analyze_series(&series)?;
    println!(
        "{} bars, {:.2}% continuous, {} closures, {} missing bars, {} duplicates",
        audit.total_bars,
        audit.continuity_pct,
        audit.closures.len(),
        audit.missing_bar_total,
        audit.duplicates.len(),
    );
    for gap in audit.data_missing.iter().chain(&audit.duplicates) {
        println!("  {} -> {}: {}", gap.start, gap.end, gap.reason());
    }

    // 4. Fair value gaps.
    let fvgs = fg.detect_fvgs(&series)?;
    let s = fvgs.stats;
    println!(
        "{} gaps ({} bull / {} bear): {} open, {} filled, {} expired",
        s.total, s.bullish, s.bearish, s.valid, s.filled, s.expired
    );
    for f in fvgs.active().take(5) {
        println!("  open {} [{}, {}] since {}", f.kind, f.bottom, f.top, f.left_time);
    }

    Ok(())
}
