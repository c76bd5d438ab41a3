//! Paginated per-request records: performance rows and prompt/response pairs.

use std::collections::HashMap;

use rand::Rng;

use crate::scenario::{classify, Scenario};
use crate::synth::model::{Page, PerformanceRecord, QaRecord};
use crate::synth::{rand_f64, rand_int};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Model name reported on every synthesized row.
pub const MOCK_MODEL: &str = "gpt-4o-2026-01-01";

/// Calendar day every synthesized arrival time falls on.
const ARRIVAL_DATE: &str = "2026-02-01";

// ---------------------------------------------------------------------------
// PageRequest
// ---------------------------------------------------------------------------

/// A 1-based page request. Both fields are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request, replacing zero values with the defaults.
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
        }
    }

    /// Read `page` and `size` from query parameters. Missing, non-numeric,
    /// zero or negative values fall back to the defaults; fractional values
    /// are truncated.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            page: coerce_positive(query.get("page")).unwrap_or(DEFAULT_PAGE),
            size: coerce_positive(query.get("size")).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Zero-based offset of the first row on this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Number of rows this page holds out of a collection of `total`.
    pub fn row_count(&self, total: u64) -> u64 {
        let offset = self.offset();
        if offset >= total {
            0
        } else {
            self.size.min(total - offset)
        }
    }
}

fn coerce_positive(raw: Option<&String>) -> Option<u64> {
    let raw = raw?.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return (n >= 1).then_some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f >= 1.0).then(|| f.trunc() as u64)
}

// ---------------------------------------------------------------------------
// Performance records
// ---------------------------------------------------------------------------

struct RowProfile {
    ttft_ms: (f64, f64),
    tpot_ms: (f64, f64),
    tps: (f64, f64),
    e2e_ms: (f64, f64),
}

const OPTIMIZED_ROW: RowProfile = RowProfile {
    ttft_ms: (45.0, 180.0),
    tpot_ms: (12.0, 26.0),
    tps: (48.0, 90.0),
    e2e_ms: (600.0, 2600.0),
};

const BASELINE_ROW: RowProfile = RowProfile {
    ttft_ms: (280.0, 950.0),
    tpot_ms: (24.0, 55.0),
    tps: (18.0, 45.0),
    e2e_ms: (1800.0, 6500.0),
};

/// Fraction of the prompt served from the prefix cache on optimized runs.
const OPTIMIZED_CACHE_FRACTION: (f64, f64) = (0.55, 0.85);
/// Flat cached-token range on baseline runs.
const BASELINE_CACHED_TOKENS: (u64, u64) = (0, 50);

fn cached_tokens<R: Rng + ?Sized>(rng: &mut R, scenario: Scenario, prompt_tokens: u64) -> u64 {
    let cached = match scenario {
        Scenario::Optimized => {
            let (lo, hi) = OPTIMIZED_CACHE_FRACTION;
            (prompt_tokens as f64 * rng.gen_range(lo..=hi)).round() as u64
        }
        Scenario::Baseline => {
            let (lo, hi) = BASELINE_CACHED_TOKENS;
            rand_int(rng, lo, hi)
        }
    };
    cached.min(prompt_tokens)
}

fn arrival_time<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{ARRIVAL_DATE} {:02}:{:02}:{:02}",
        rand_int(rng, 8, 22),
        rand_int(rng, 0, 59),
        rand_int(rng, 0, 59)
    )
}

fn performance_row<R: Rng + ?Sized>(rng: &mut R, id: u64, scenario: Scenario) -> PerformanceRecord {
    let profile = match scenario {
        Scenario::Optimized => &OPTIMIZED_ROW,
        Scenario::Baseline => &BASELINE_ROW,
    };
    let prompt_tokens = rand_int(rng, 100, 8000);
    let cached_tokens = cached_tokens(rng, scenario, prompt_tokens);

    PerformanceRecord {
        id,
        model: MOCK_MODEL.to_string(),
        prompt_tokens,
        cached_tokens,
        completion_tokens: rand_int(rng, 50, 2000),
        ttft_ms: rand_f64(rng, profile.ttft_ms.0, profile.ttft_ms.1),
        tpot_ms: rand_f64(rng, profile.tpot_ms.0, profile.tpot_ms.1),
        tps: rand_f64(rng, profile.tps.0, profile.tps.1),
        e2e_latency_ms: rand_f64(rng, profile.e2e_ms.0, profile.e2e_ms.1),
        arrival_time: arrival_time(rng),
    }
}

/// One page of performance rows for `task_id` out of a collection of
/// `total`. Pages past the end come back empty with the same `total`.
pub fn performance_records<R: Rng + ?Sized>(
    rng: &mut R,
    task_id: &str,
    request: PageRequest,
    total: u64,
) -> Page<PerformanceRecord> {
    let scenario = classify(task_id);
    let offset = request.offset();
    let items = (0..request.row_count(total))
        .map(|i| performance_row(rng, offset + i + 1, scenario))
        .collect();

    Page {
        items,
        total,
        page: request.page,
        size: request.size,
    }
}

// ---------------------------------------------------------------------------
// QA records
// ---------------------------------------------------------------------------

const SAMPLE_PROMPTS: [&str; 8] = [
    "Explain the basic principles of quantum computing",
    "How can I speed up a slow Python program?",
    "What is the Transformer architecture?",
    "Write a simple HTTP server in Rust",
    "Explain the CAP theorem and how it applies to distributed systems",
    "How would you design a highly available microservice architecture?",
    "How does a KV cache work?",
    "Compare the pros and cons of gRPC and REST APIs",
];

/// One page of prompt/response pairs. Prompts cycle through a fixed pool by
/// global row position, so a row keeps its prompt regardless of page size.
pub fn qa_records<R: Rng + ?Sized>(
    rng: &mut R,
    request: PageRequest,
    total: u64,
) -> Page<QaRecord> {
    let offset = request.offset();
    let items = (0..request.row_count(total))
        .map(|i| {
            let index = offset + i;
            let prompt = SAMPLE_PROMPTS[(index % SAMPLE_PROMPTS.len() as u64) as usize];
            QaRecord {
                id: index + 1,
                model: MOCK_MODEL.to_string(),
                messages: prompt.to_string(),
                response_content: format!(
                    "This is a simulated answer to \"{prompt}\", with a detailed technical \
                     analysis and recommendations... (about {} words omitted)",
                    rand_int(rng, 200, 800)
                ),
            }
        })
        .collect();

    Page {
        items,
        total,
        page: request.page,
        size: request.size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // PageRequest
    // -----------------------------------------------------------------------

    #[test]
    fn missing_params_use_defaults() {
        let req = PageRequest::from_query(&HashMap::new());
        assert_eq!(req, PageRequest { page: 1, size: 20 });
    }

    #[test]
    fn invalid_params_fall_back_to_defaults() {
        for bad in ["abc", "0", "-3", "", "NaN", "inf", "0.5"] {
            let req = PageRequest::from_query(&query(&[("page", bad), ("size", bad)]));
            assert_eq!(req, PageRequest::default(), "input {bad:?}");
        }
    }

    #[test]
    fn valid_params_are_used_and_fractions_truncated() {
        let req = PageRequest::from_query(&query(&[("page", "3"), ("size", " 50 ")]));
        assert_eq!(req, PageRequest { page: 3, size: 50 });
        let req = PageRequest::from_query(&query(&[("page", "2.9"), ("size", "10.0")]));
        assert_eq!(req, PageRequest { page: 2, size: 10 });
    }

    #[test]
    fn new_replaces_zeroes() {
        assert_eq!(PageRequest::new(0, 0), PageRequest::default());
        assert_eq!(PageRequest::new(4, 7), PageRequest { page: 4, size: 7 });
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let req = PageRequest::new(u64::MAX, u64::MAX);
        assert_eq!(req.offset(), u64::MAX);
        assert_eq!(req.row_count(500), 0);
    }

    // -----------------------------------------------------------------------
    // performance_records
    // -----------------------------------------------------------------------

    #[test]
    fn page_length_matches_formula_for_many_pages_and_sizes() {
        let mut rng = StdRng::seed_from_u64(99);
        let total = 500u64;
        for size in [1u64, 7, 20, 64, 499, 500, 501, 1000] {
            for page in 1u64..=8 {
                let result = performance_records(
                    &mut rng,
                    "task-baseline-gpt4o-20260201",
                    PageRequest::new(page, size),
                    total,
                );
                let expected = total.saturating_sub((page - 1) * size).min(size);
                assert_eq!(result.items.len() as u64, expected, "page {page} size {size}");
                assert_eq!(result.total, total);
                assert_eq!(result.page, page);
                assert_eq!(result.size, size);
            }
        }
    }

    #[test]
    fn page_past_end_is_empty_with_same_total() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = performance_records(&mut rng, "x", PageRequest::new(30, 20), 500);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 500);
    }

    #[test]
    fn last_partial_page_is_short() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = performance_records(&mut rng, "x", PageRequest::new(3, 200), 500);
        assert_eq!(result.items.len(), 100);
        assert_eq!(result.items[0].id, 401);
        assert_eq!(result.items[99].id, 500);
    }

    #[test]
    fn ids_are_global_row_positions() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = performance_records(&mut rng, "x", PageRequest::new(2, 20), 500);
        let ids: Vec<u64> = result.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, (21..=40).collect::<Vec<_>>());
    }

    #[test]
    fn cached_never_exceeds_prompt_in_either_scenario() {
        let mut rng = StdRng::seed_from_u64(2024);
        for task in ["task-optimized-gpt4o-20260210", "task-baseline-gpt4o-20260201"] {
            let result = performance_records(&mut rng, task, PageRequest::new(1, 500), 500);
            assert!(result
                .items
                .iter()
                .all(|r| r.cached_tokens <= r.prompt_tokens));
        }
    }

    #[test]
    fn optimized_rows_have_high_cache_fraction() {
        let mut rng = StdRng::seed_from_u64(8);
        let result = performance_records(
            &mut rng,
            "task-optimized-gpt4o-20260210",
            PageRequest::new(1, 200),
            500,
        );
        for row in &result.items {
            let fraction = row.cached_tokens as f64 / row.prompt_tokens as f64;
            assert!((0.54..=0.86).contains(&fraction), "fraction {fraction}");
            assert!((45.0..=180.0).contains(&row.ttft_ms));
            assert!((48.0..=90.0).contains(&row.tps));
        }
    }

    #[test]
    fn baseline_rows_have_flat_small_cache_and_slow_ttft() {
        let mut rng = StdRng::seed_from_u64(8);
        let result = performance_records(
            &mut rng,
            "task-baseline-gpt4o-20260201",
            PageRequest::new(1, 200),
            500,
        );
        for row in &result.items {
            assert!(row.cached_tokens <= 50);
            assert!((280.0..=950.0).contains(&row.ttft_ms));
            assert!((1800.0..=6500.0).contains(&row.e2e_latency_ms));
        }
    }

    #[test]
    fn arrival_time_is_wall_clock_on_fixed_day() {
        let mut rng = StdRng::seed_from_u64(4);
        let result = performance_records(&mut rng, "x", PageRequest::new(1, 50), 500);
        for row in &result.items {
            let parsed = chrono::NaiveDateTime::parse_from_str(&row.arrival_time, "%Y-%m-%d %H:%M:%S")
                .expect("arrival time parses");
            assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2026-02-01");
            let hour: u32 = row.arrival_time[11..13].parse().unwrap();
            assert!((8..=22).contains(&hour));
        }
    }

    // -----------------------------------------------------------------------
    // qa_records
    // -----------------------------------------------------------------------

    #[test]
    fn qa_page_length_and_ids() {
        let mut rng = StdRng::seed_from_u64(3);
        let result = qa_records(&mut rng, PageRequest::new(2, 10), 256);
        assert_eq!(result.items.len(), 10);
        assert_eq!(result.items[0].id, 11);
        assert_eq!(result.total, 256);
        let empty = qa_records(&mut rng, PageRequest::new(27, 10), 256);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn qa_prompts_cycle_by_global_position() {
        let mut rng = StdRng::seed_from_u64(3);
        let result = qa_records(&mut rng, PageRequest::new(1, 16), 256);
        assert_eq!(result.items[0].messages, result.items[8].messages);
        assert_ne!(result.items[0].messages, result.items[1].messages);

        let second = qa_records(&mut rng, PageRequest::new(2, 3), 256);
        assert_eq!(second.items[0].messages, SAMPLE_PROMPTS[3]);
    }

    #[test]
    fn qa_response_echoes_prompt_and_omitted_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let result = qa_records(&mut rng, PageRequest::new(1, 8), 256);
        for row in &result.items {
            assert!(row.response_content.contains(&row.messages));
            let words: u64 = row
                .response_content
                .rsplit("(about ")
                .next()
                .and_then(|tail| tail.split(' ').next())
                .and_then(|n| n.parse().ok())
                .expect("omitted length present");
            assert!((200..=800).contains(&words));
        }
    }
}
