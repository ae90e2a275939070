//! Cross-instrument volatility ratio study over Treasury futures tick data.
//!
//! The pipeline loads regular-session ticks for the 10-year note, the ultra
//! 10-year note and the 30-year bond, annotates running and daily ranges,
//! aligns the three series on a common intraday grid, derives pairwise range
//! ratios and their per-window extrema, and estimates bootstrap confidence
//! intervals for conditional mean-reversion probabilities.

pub mod cli;
pub mod config;
pub mod daily;
pub mod error;
pub mod estimator;
pub mod index;
pub mod instrument;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod range;
pub mod ratio;
pub mod report;
pub mod resample;
pub mod stats;
pub mod tick;
pub mod utils;
