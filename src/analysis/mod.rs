//! Descriptive statistics, hypothesis tests and counting helpers

/// Batched optimisation log parsing and per-iteration summaries
pub mod batches;
/// Counters and two-level counter maps
pub mod counter;
/// Entropy, means and permutation tests
pub mod statistics;
