//! fairgap-cache
//!
//! A bounded result cache for FVG and continuity reports.
//!
//! The cache is an ordinary value: build one from a [`CacheConfig`], hand it
//! to whatever runs the analyses, and clear it when the inputs change. Nothing
//! in the analyzers reads it implicitly.
//!
//! [`CacheConfig`]: fairgap_core::CacheConfig
#![warn(missing_docs)]

mod cache;
mod key;

pub use crate::cache::ReportCache;
pub use crate::key::ReportKey;
