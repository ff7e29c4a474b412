//! Synthetic candle data for exercising `fairgap` without a market feed.
//!
//! [`SeriesFixture`] generates seeded random walks that follow the trading
//! calendar, with knobs for punching holes and repeating bars. [`fixtures`]
//! holds small hand-built series with known detection and continuity results.

pub mod fixtures;
mod generator;

pub use generator::SeriesFixture;
