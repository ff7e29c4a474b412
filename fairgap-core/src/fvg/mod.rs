//! Fair value gap detection and lifecycle tracking.
//!
//! All indices are left-anchored: an FVG is keyed by the index of its left bar
//! `L`, with `C = L + 1` and `R = L + 2`. Ordering, deduplication and the age
//! window all use that anchor.

/// Pattern scan over consecutive bar triples.
pub mod detector;
/// Deduplication, fill and expiry.
pub mod lifecycle;

pub use detector::FvgDetector;
pub use lifecycle::FvgLifecycleTracker;
