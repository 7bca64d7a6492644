//! Benchmark utilities for tabular-nn.
//!
//! - Seeded synthetic CSV tables for classification and regression
//! - Per-stage timing for pipeline runs

pub mod data;
pub mod utils;

pub use data::{SyntheticTable, SyntheticTarget};
pub use utils::{time_fn, StageTimings};
