use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::scenario::{classify, Scenario};

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Kind of run a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Passive traffic capture through the proxy.
    Collect,
    /// Active replay of recorded prompts against a target.
    Benchmark,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub task_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub record_count: u64,
    #[serde(with = "wall_clock")]
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Cohort this task belongs to, derived from its identifier.
    pub fn scenario(&self) -> Scenario {
        classify(&self.task_id)
    }
}

/// `YYYY-MM-DD HH:MM:SS` wall-clock timestamps as the dashboard displays them.
pub(crate) mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Paginated records
// ---------------------------------------------------------------------------

/// One page of a paginated listing. `total` is the size of the whole
/// collection, independent of the page requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

/// One captured inference request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PerformanceRecord {
    pub id: u64,
    pub model: String,
    pub prompt_tokens: u64,
    /// Prompt tokens served from the prefix cache. Never exceeds
    /// `prompt_tokens`.
    pub cached_tokens: u64,
    pub completion_tokens: u64,
    pub ttft_ms: f64,
    pub tpot_ms: f64,
    pub tps: f64,
    pub e2e_latency_ms: f64,
    pub arrival_time: String,
}

/// One captured prompt/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QaRecord {
    pub id: u64,
    pub model: String,
    pub messages: String,
    pub response_content: String,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Percentile and average statistics over the four latency/throughput
/// metrics of a task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsSummary {
    pub ttft_avg: f64,
    pub ttft_p50: f64,
    pub ttft_p90: f64,
    pub ttft_p99: f64,
    pub tpot_avg: f64,
    pub tpot_p50: f64,
    pub tpot_p90: f64,
    pub tpot_p99: f64,
    pub tps_avg: f64,
    pub tps_p50: f64,
    pub tps_p90: f64,
    pub tps_p99: f64,
    pub e2e_avg: f64,
    pub e2e_p50: f64,
    pub e2e_p90: f64,
    pub e2e_p99: f64,
}

/// A named histogram. `labels` and `values` always have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Distribution {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl Distribution {
    pub fn new<const N: usize>(labels: &[&str; N], values: &[u64; N]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            values: values.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Distributions {
    pub context_length: Distribution,
    pub response_latency: Distribution,
    pub cache_hit_rate: Distribution,
}

/// Baseline-vs-optimized comparison: reduction ratios (fractions, not
/// percentages) plus paired time series of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompareResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_id: Option<String>,
    pub ttft_reduction: f64,
    pub tps_increase: f64,
    pub tpot_reduction: f64,
    pub e2e_reduction: f64,
    pub baseline_ttft: Vec<f64>,
    pub optimized_ttft: Vec<f64>,
    pub baseline_decode_speed: Vec<f64>,
    pub optimized_decode_speed: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub content: String,
}

/// `{ "data": ... }` wrapper used by the metrics and analysis endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

// ---------------------------------------------------------------------------
// Small acknowledgement / status records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileSummary {
    pub total_records: u64,
    pub model: String,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectStatus {
    pub status: String,
    pub task_id: Option<String>,
    pub collected_count: u64,
    pub elapsed_seconds: u64,
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchmarkProgress {
    pub task_id: String,
    pub total: u64,
    pub completed: u64,
    pub status: String,
    pub elapsed_s: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskStarted {
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskStopped {
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportCreated {
    pub report_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisEngine {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginToken {
    pub access_token: String,
    pub token_type: String,
}
