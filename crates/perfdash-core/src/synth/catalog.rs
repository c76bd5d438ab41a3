//! The fixed task catalog plus the small canned responses for lifecycle,
//! status, report and analysis endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::synth::model::{
    AnalysisEngine, BenchmarkProgress, CollectStatus, FileSummary, LoginToken, ReportCreated,
    Task, TaskStarted, TaskStatus, TaskStopped, TaskType,
};

/// Row count reported for tasks that are not in the catalog.
pub const DEFAULT_RECORD_TOTAL: u64 = 500;

pub const MOCK_ACCESS_TOKEN: &str = "mock-token-abc123";

struct CatalogEntry {
    task_id: &'static str,
    task_type: TaskType,
    record_count: u64,
    created: (i32, u32, u32, u32, u32, u32),
}

const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        task_id: "task-baseline-gpt4o-20260201",
        task_type: TaskType::Collect,
        record_count: 256,
        created: (2026, 2, 1, 10, 30, 0),
    },
    CatalogEntry {
        task_id: "task-optimized-gpt4o-20260210",
        task_type: TaskType::Collect,
        record_count: 256,
        created: (2026, 2, 10, 14, 20, 0),
    },
    CatalogEntry {
        task_id: "task-baseline-deepseek-20260215",
        task_type: TaskType::Collect,
        record_count: 128,
        created: (2026, 2, 15, 9, 0, 0),
    },
    CatalogEntry {
        task_id: "task-bench-concurrency-20260220",
        task_type: TaskType::Benchmark,
        record_count: 512,
        created: (2026, 2, 20, 16, 45, 0),
    },
];

fn created_at((y, mo, d, h, mi, s): (i32, u32, u32, u32, u32, u32)) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, mo, d)?.and_hms_opt(h, mi, s)
}

impl CatalogEntry {
    fn to_task(&self) -> Option<Task> {
        Some(Task {
            task_id: self.task_id.to_string(),
            name: self.task_id.trim_start_matches("task-").to_string(),
            task_type: self.task_type,
            status: TaskStatus::Completed,
            record_count: self.record_count,
            created_at: created_at(self.created)?,
        })
    }
}

/// Every task in the catalog, in catalog order.
pub fn mock_tasks() -> Vec<Task> {
    CATALOG.iter().filter_map(CatalogEntry::to_task).collect()
}

pub fn tasks_of_type(task_type: TaskType) -> Vec<Task> {
    mock_tasks()
        .into_iter()
        .filter(|t| t.task_type == task_type)
        .collect()
}

pub fn find_task(task_id: &str) -> Option<Task> {
    CATALOG
        .iter()
        .find(|e| e.task_id == task_id)
        .and_then(CatalogEntry::to_task)
}

/// Size of a task's record collection: the catalog count when known,
/// `fallback` otherwise.
pub fn record_total(task_id: &str, fallback: u64) -> u64 {
    CATALOG
        .iter()
        .find(|e| e.task_id == task_id)
        .map_or(fallback, |e| e.record_count)
}

// ---------------------------------------------------------------------------
// Lifecycle stubs
// ---------------------------------------------------------------------------

fn minted_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-{}", now.timestamp_millis())
}

pub fn start_collect(now: DateTime<Utc>) -> TaskStarted {
    TaskStarted {
        task_id: minted_id("task-mock", now),
        status: TaskStatus::Running,
    }
}

pub fn stop_collect(task_id: Option<String>) -> TaskStopped {
    TaskStopped {
        status: TaskStatus::Stopped,
        task_id,
    }
}

pub fn start_benchmark(now: DateTime<Utc>) -> TaskStarted {
    TaskStarted {
        task_id: minted_id("task-bench-mock", now),
        status: TaskStatus::Running,
    }
}

pub fn generate_report(now: DateTime<Utc>) -> ReportCreated {
    ReportCreated {
        report_id: minted_id("report-mock", now),
        status: "completed".to_string(),
    }
}

/// Progress of a benchmark run. Catalog tasks are reported as finished;
/// anything else is `not_found`.
pub fn benchmark_progress(task_id: &str) -> BenchmarkProgress {
    match find_task(task_id) {
        Some(task) => BenchmarkProgress {
            task_id: task.task_id,
            total: task.record_count,
            completed: task.record_count,
            status: "completed".to_string(),
            elapsed_s: 0.0,
        },
        None => BenchmarkProgress {
            task_id: task_id.to_string(),
            total: 0,
            completed: 0,
            status: "not_found".to_string(),
            elapsed_s: 0.0,
        },
    }
}

pub fn collect_status() -> CollectStatus {
    CollectStatus {
        status: "idle".to_string(),
        task_id: None,
        collected_count: 0,
        elapsed_seconds: 0,
        progress: None,
    }
}

pub fn file_summary() -> FileSummary {
    FileSummary {
        total_records: 256,
        model: "gpt-4o".to_string(),
        duration_seconds: 1820,
    }
}

pub fn analysis_engines() -> Vec<AnalysisEngine> {
    vec![AnalysisEngine {
        id: "default".to_string(),
        name: "Built-in Analyzer".to_string(),
        status: "ready".to_string(),
    }]
}

pub fn login_token() -> LoginToken {
    LoginToken {
        access_token: MOCK_ACCESS_TOKEN.to_string(),
        token_type: "bearer".to_string(),
    }
}
