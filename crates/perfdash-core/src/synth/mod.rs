//! Scenario-aware synthetic data for the simulated backend.
//!
//! Every randomized generator takes an explicit [`rand::Rng`] so callers can
//! seed it; the gateway passes the thread RNG.

use rand::Rng;

pub mod catalog;
pub mod export;
pub mod metrics;
pub mod model;
pub mod records;
pub mod suggestions;

pub use catalog::{mock_tasks, record_total, tasks_of_type};
pub use export::performance_csv;
pub use metrics::{compare_result, distributions, metrics_summary, summary_for};
pub use model::{
    CompareResult, Distribution, Distributions, MetricsSummary, Page, PerformanceRecord,
    QaRecord, Suggestion, Task, TaskStatus, TaskType,
};
pub use records::{performance_records, qa_records, PageRequest};
pub use suggestions::suggestions;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Uniform sample from the closed interval `[min, max]`, rounded to two
/// decimals. Both bounds must already be two-decimal values so the rounded
/// sample stays inside the interval.
pub fn rand_f64<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    round2(rng.gen_range(min..=max))
}

/// Uniform integer sample from the closed interval `[min, max]`.
pub fn rand_int<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
    rng.gen_range(min..=max)
}
