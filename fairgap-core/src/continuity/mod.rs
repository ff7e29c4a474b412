//! Calendar-aware continuity auditing.
//!
//! The analyzer walks consecutive bars and sorts every abnormal step into a
//! trading closure, missing data or a duplicate timestamp. The control flow is
//! chosen by [`ScanStrategy`]; the report is the same for every strategy,
//! worker count and chunk size.

mod scan;

use std::sync::Arc;

use fairgap_types::{
    ContinuityConfig, ContinuityReport, FairGapError, Gap, GapKind, Granularity, ReportStatus,
    ScanStrategy,
};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::calendar::TradingCalendar;
use crate::series::CandleSeries;
use scan::ScanInput;

/// Fewest bars that make a meaningful audit.
pub const MIN_BARS: usize = 3;

/// Audits candle series against a shared trading calendar.
#[derive(Debug, Clone)]
pub struct ContinuityAnalyzer {
    calendar: Arc<TradingCalendar>,
    config: ContinuityConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl ContinuityAnalyzer {
    /// Build an analyzer. A dedicated worker pool is created up front when
    /// `config.workers` is set.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an invalid config, or `Worker` if the pool
    /// cannot be built.
    pub fn new(
        calendar: Arc<TradingCalendar>,
        config: ContinuityConfig,
    ) -> Result<Self, FairGapError> {
        config.validate()?;
        let pool = match config.workers {
            Some(n) => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("fairgap-scan-{i}"))
                    .build()
                    .map_err(|e| FairGapError::Worker(e.to_string()))?,
            )),
            None => None,
        };
        Ok(Self {
            calendar,
            config,
            pool,
        })
    }

    /// The same analyzer with another strategy; the worker pool is shared.
    #[must_use]
    pub fn with_strategy(&self, strategy: ScanStrategy) -> Self {
        let mut next = self.clone();
        next.config.strategy = strategy;
        next
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ContinuityConfig {
        &self.config
    }

    /// Calendar consulted for closures.
    #[must_use]
    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Audit `series` at its own granularity.
    ///
    /// # Errors
    /// See [`ContinuityAnalyzer::analyze`].
    pub fn analyze_series(&self, series: &CandleSeries) -> Result<ContinuityReport, FairGapError> {
        self.analyze(series, series.granularity().minutes())
    }

    /// Audit `series` recorded at `interval_minutes`.
    ///
    /// Fewer than three bars yield a report with status `InsufficientData`.
    ///
    /// # Errors
    /// - `UnsupportedGranularity` if `interval_minutes` is not a known interval.
    /// - `InvalidArg` if it disagrees with the series granularity.
    /// - `CalendarRangeExceeded` if the series leaves the calendar window.
    /// - `Worker` if a partitioned scan fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap_core::continuity::analyze",
            skip(self, series),
            fields(
                bars = series.len(),
                interval_minutes = interval_minutes,
                strategy = ?self.config.strategy,
            ),
            err,
        )
    )]
    pub fn analyze(
        &self,
        series: &CandleSeries,
        interval_minutes: u32,
    ) -> Result<ContinuityReport, FairGapError> {
        let granularity = Granularity::from_minutes(interval_minutes)?;
        if granularity != series.granularity() {
            return Err(FairGapError::invalid_arg(format!(
                "interval {granularity} does not match series granularity {}",
                series.granularity()
            )));
        }
        let warnings = series.warnings().to_vec();
        let (Some(first), Some(last)) = (series.first_ts(), series.last_ts()) else {
            return Ok(ContinuityReport::insufficient(granularity, 0, None, None, warnings));
        };
        if series.len() < MIN_BARS {
            return Ok(ContinuityReport::insufficient(
                granularity,
                series.len(),
                Some(first),
                Some(last),
                warnings,
            ));
        }
        self.calendar.check_span(first, last, granularity)?;

        let input = ScanInput {
            calendar: &self.calendar,
            candles: series.as_slice(),
            granularity,
        };
        let gaps = match self.config.strategy {
            ScanStrategy::Naive => scan::naive(input)?,
            ScanStrategy::ClosureSkipping => scan::closure_skipping(input)?,
            ScanStrategy::Batch => scan::batch(input)?,
            ScanStrategy::Partitioned => {
                scan::partitioned(input, self.config.chunk_size, self.pool.as_deref())?
            }
        };

        let report = build_report(series, granularity, gaps);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            closures = report.closures.len(),
            data_missing = report.data_missing.len(),
            duplicates = report.duplicates.len(),
            continuity_pct = report.continuity_pct,
            "continuity scan complete"
        );
        Ok(report)
    }
}

#[allow(clippy::cast_precision_loss)]
fn build_report(series: &CandleSeries, granularity: Granularity, gaps: Vec<Gap>) -> ContinuityReport {
    let mut closures = Vec::new();
    let mut data_missing = Vec::new();
    let mut duplicates = Vec::new();
    for g in gaps {
        match g.kind {
            GapKind::TradingClosure(_) => closures.push(g),
            GapKind::DataMissing => data_missing.push(g),
            GapKind::DuplicateTimestamp => duplicates.push(g),
        }
    }
    let missing_bar_total: u64 = data_missing.iter().map(|g| g.missing_bars).sum();
    let total = series.len() as u64;
    let continuity_pct = if total + missing_bar_total == 0 {
        0.0
    } else {
        total as f64 / (total + missing_bar_total) as f64 * 100.0
    };
    ContinuityReport {
        granularity,
        status: ReportStatus::Completed,
        total_bars: series.len(),
        first_ts: series.first_ts(),
        last_ts: series.last_ts(),
        closures,
        data_missing,
        duplicates,
        missing_bar_total,
        continuity_pct,
        warnings: series.warnings().to_vec(),
    }
}
