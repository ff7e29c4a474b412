use std::fmt;
use std::sync::Arc;

use fairgap_core::{CacheConfig, ContinuityReport, FairGapError, FvgReport};
use moka::sync::Cache;

use crate::key::ReportKey;

/// Two bounded maps, one per report type, sharing one size and TTL policy.
///
/// Behavior and trade-offs:
/// - Entries are evicted by moka's TinyLFU policy once `max_entries` is
///   reached for a report type; with a TTL set they also age out.
/// - Concurrent misses for one key run the computation once; the other
///   callers wait for and share its result.
/// - Failed computations are not cached.
#[derive(Clone)]
pub struct ReportCache {
    fvg: Cache<ReportKey, Arc<FvgReport>>,
    continuity: Cache<ReportKey, Arc<ContinuityReport>>,
}

impl ReportCache {
    /// Empty cache sized by `config`.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            fvg: build(config),
            continuity: build(config),
        }
    }

    /// Cached FVG report for `key`, computing and storing it on a miss.
    ///
    /// # Errors
    /// Returns the error from `compute`; nothing is stored in that case.
    pub fn fvg_report<F>(&self, key: ReportKey, compute: F) -> Result<Arc<FvgReport>, FairGapError>
    where
        F: FnOnce() -> Result<FvgReport, FairGapError>,
    {
        get_or_try(&self.fvg, key, compute)
    }

    /// Cached continuity report for `key`, computing and storing it on a miss.
    ///
    /// # Errors
    /// Returns the error from `compute`; nothing is stored in that case.
    pub fn continuity_report<F>(
        &self,
        key: ReportKey,
        compute: F,
    ) -> Result<Arc<ContinuityReport>, FairGapError>
    where
        F: FnOnce() -> Result<ContinuityReport, FairGapError>,
    {
        get_or_try(&self.continuity, key, compute)
    }

    /// Drop every cached report.
    pub fn clear(&self) {
        self.fvg.invalidate_all();
        self.continuity.invalidate_all();
        self.sync();
    }

    /// Number of cached reports across both maps.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.sync();
        self.fvg.entry_count() + self.continuity.entry_count()
    }

    fn sync(&self) {
        self.fvg.run_pending_tasks();
        self.continuity.run_pending_tasks();
    }
}

impl fmt::Debug for ReportCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportCache")
            .field("fvg_entries", &self.fvg.entry_count())
            .field("continuity_entries", &self.continuity.entry_count())
            .finish()
    }
}

fn build<V>(config: &CacheConfig) -> Cache<ReportKey, Arc<V>>
where
    V: Send + Sync + 'static,
{
    let builder = Cache::builder().max_capacity(config.max_entries);
    match config.ttl {
        Some(ttl) => builder.time_to_live(ttl).build(),
        None => builder.build(),
    }
}

fn get_or_try<V, F>(
    cache: &Cache<ReportKey, Arc<V>>,
    key: ReportKey,
    compute: F,
) -> Result<Arc<V>, FairGapError>
where
    V: Send + Sync + 'static,
    F: FnOnce() -> Result<V, FairGapError>,
{
    cache
        .try_get_with(key, || {
            #[cfg(feature = "tracing")]
            tracing::debug!(fingerprint = key.fingerprint(), "report cache miss");
            compute().map(Arc::new)
        })
        .map_err(|e| (*e).clone())
}
