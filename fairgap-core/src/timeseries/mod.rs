//! Time-series utilities shared by the analyzers and the facade.
//!
//! Modules include:
//! - `infer`: infer the bar interval of an unlabelled series
//! - `resample`: aggregate a finer series into a coarser granularity
/// Interval inference helpers.
pub mod infer;
/// Resampling to coarser granularities.
pub mod resample;
