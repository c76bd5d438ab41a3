//! Task-level aggregates: summary statistics, histograms, and the
//! baseline-vs-optimized comparison.

use rand::Rng;

use crate::scenario::{classify, Scenario};
use crate::synth::model::{CompareResult, Distribution, Distributions, MetricsSummary};
use crate::synth::{rand_f64, round2};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

const OPTIMIZED_SUMMARY: MetricsSummary = MetricsSummary {
    ttft_avg: 92.4,
    ttft_p50: 85.2,
    ttft_p90: 138.6,
    ttft_p99: 215.3,
    tpot_avg: 18.6,
    tpot_p50: 17.2,
    tpot_p90: 26.4,
    tpot_p99: 38.9,
    tps_avg: 68.5,
    tps_p50: 70.2,
    tps_p90: 55.4,
    tps_p99: 42.1,
    e2e_avg: 1285.7,
    e2e_p50: 1120.4,
    e2e_p90: 2150.8,
    e2e_p99: 3240.6,
};

const BASELINE_SUMMARY: MetricsSummary = MetricsSummary {
    ttft_avg: 523.6,
    ttft_p50: 468.3,
    ttft_p90: 812.5,
    ttft_p99: 1245.8,
    tpot_avg: 32.8,
    tpot_p50: 30.1,
    tpot_p90: 48.7,
    tpot_p99: 76.4,
    tps_avg: 38.2,
    tps_p50: 40.5,
    tps_p90: 28.6,
    tps_p99: 19.3,
    e2e_avg: 2856.4,
    e2e_p50: 2480.2,
    e2e_p90: 4620.7,
    e2e_p99: 6850.3,
};

/// Fixed summary for a cohort. Deterministic so repeated reads of one task
/// always agree.
pub fn summary_for(scenario: Scenario) -> MetricsSummary {
    match scenario {
        Scenario::Optimized => OPTIMIZED_SUMMARY,
        Scenario::Baseline => BASELINE_SUMMARY,
    }
}

pub fn metrics_summary(task_id: &str) -> MetricsSummary {
    summary_for(classify(task_id))
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

const CONTEXT_LENGTH_LABELS: [&str; 7] =
    ["0-512", "512-1K", "1K-2K", "2K-4K", "4K-8K", "8K-16K", "16K+"];
const RESPONSE_LATENCY_LABELS: [&str; 7] =
    ["0-200", "200-500", "500-1K", "1K-2K", "2K-3K", "3K-5K", "5K+"];
const CACHE_HIT_RATE_LABELS: [&str; 6] = ["0%", "0-20%", "20-40%", "40-60%", "60-80%", "80-100%"];

const BASELINE_CONTEXT_LENGTH: [u64; 7] = [40, 75, 110, 130, 85, 42, 18];
const OPTIMIZED_CONTEXT_LENGTH: [u64; 7] = [38, 72, 112, 134, 86, 40, 18];

const BASELINE_RESPONSE_LATENCY: [u64; 7] = [6, 24, 58, 142, 128, 96, 46];
const OPTIMIZED_RESPONSE_LATENCY: [u64; 7] = [62, 148, 156, 88, 30, 12, 4];

const BASELINE_CACHE_HIT_RATE: [u64; 6] = [310, 120, 42, 18, 7, 3];
const OPTIMIZED_CACHE_HIT_RATE: [u64; 6] = [4, 9, 22, 78, 186, 201];

/// Context-length, response-latency and cache-hit-rate histograms. Labels
/// are shared by both cohorts; only the counts differ.
pub fn distributions(task_id: &str) -> Distributions {
    let (context, latency, cache) = match classify(task_id) {
        Scenario::Optimized => (
            OPTIMIZED_CONTEXT_LENGTH,
            OPTIMIZED_RESPONSE_LATENCY,
            OPTIMIZED_CACHE_HIT_RATE,
        ),
        Scenario::Baseline => (
            BASELINE_CONTEXT_LENGTH,
            BASELINE_RESPONSE_LATENCY,
            BASELINE_CACHE_HIT_RATE,
        ),
    };

    Distributions {
        context_length: Distribution::new(&CONTEXT_LENGTH_LABELS, &context),
        response_latency: Distribution::new(&RESPONSE_LATENCY_LABELS, &latency),
        cache_hit_rate: Distribution::new(&CACHE_HIT_RATE_LABELS, &cache),
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

const BASELINE_TTFT_RANGE: (f64, f64) = (380.0, 720.0);
const OPTIMIZED_TTFT_RANGE: (f64, f64) = (65.0, 135.0);
const BASELINE_DECODE_RANGE: (f64, f64) = (28.0, 48.0);
const OPTIMIZED_DECODE_RANGE: (f64, f64) = (55.0, 85.0);

fn reduction(baseline: f64, optimized: f64) -> f64 {
    round2((baseline - optimized) / baseline)
}

fn series<R: Rng + ?Sized>(rng: &mut R, len: usize, (min, max): (f64, f64)) -> Vec<f64> {
    (0..len).map(|_| rand_f64(rng, min, max)).collect()
}

/// Build a comparison between the two cohorts.
///
/// The four series share one length drawn from `len_range` (inclusive) so
/// they can be plotted pairwise. Ratios come from the fixed summaries, so
/// the headline deltas always agree with the summary views.
pub fn compare_result<R: Rng + ?Sized>(
    rng: &mut R,
    baseline_id: Option<&str>,
    optimized_id: Option<&str>,
    len_range: (usize, usize),
) -> CompareResult {
    let (min_len, max_len) = len_range;
    let len = rng.gen_range(min_len..=max_len.max(min_len));

    let b = summary_for(Scenario::Baseline);
    let o = summary_for(Scenario::Optimized);

    CompareResult {
        baseline_id: baseline_id.map(str::to_string),
        optimized_id: optimized_id.map(str::to_string),
        ttft_reduction: reduction(b.ttft_avg, o.ttft_avg),
        tps_increase: round2((o.tps_avg - b.tps_avg) / b.tps_avg),
        tpot_reduction: reduction(b.tpot_avg, o.tpot_avg),
        e2e_reduction: reduction(b.e2e_avg, o.e2e_avg),
        baseline_ttft: series(rng, len, BASELINE_TTFT_RANGE),
        optimized_ttft: series(rng, len, OPTIMIZED_TTFT_RANGE),
        baseline_decode_speed: series(rng, len, BASELINE_DECODE_RANGE),
        optimized_decode_speed: series(rng, len, OPTIMIZED_DECODE_RANGE),
    }
}
