//! Ordered route table for the simulation gateway.
//!
//! Entries are tested in registration order and the first match wins. The
//! table does not detect overlapping patterns; keep patterns for the same
//! method disjoint, or register the more specific one first.

use regex::Regex;
use tracing::debug;

use crate::error::PerfdashError;
use crate::http::request::{normalize_path, HttpMethod};

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Every simulated endpoint. The gateway dispatches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    GetProxyConfig,
    UpdateProxyConfig,
    StartCollect,
    StopCollect,
    CollectStatus,
    CollectTasks,
    FileTasks,
    PerformanceRecords,
    QaRecords,
    FileSummary,
    MetricsSummary,
    Distributions,
    StartBenchmark,
    BenchmarkProgress,
    BenchmarkTasks,
    Compare,
    GenerateReport,
    ListReports,
    AnalysisEngines,
    Suggestions,
    Health,
}

// ---------------------------------------------------------------------------
// RouteEntry / RouteMatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct RouteEntry {
    pub method: HttpMethod,
    pub matcher: Regex,
    pub endpoint: Endpoint,
}

/// A resolved route: the endpoint plus the pattern's capture groups, in
/// group order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    pub captures: Vec<String>,
}

impl RouteMatch {
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

/// One path segment, captured.
const SEGMENT: &str = "([^/]+)";

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. `pattern` is a regular expression matched against
    /// the request path; it is anchored to the end of the path if it is not
    /// already.
    pub fn register(
        &mut self,
        method: HttpMethod,
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<&mut Self, PerfdashError> {
        let anchored = if pattern.ends_with('$') {
            pattern.to_string()
        } else {
            format!("{pattern}$")
        };
        let matcher = Regex::new(&anchored)?;
        self.entries.push(RouteEntry {
            method,
            matcher,
            endpoint,
        });
        Ok(self)
    }

    /// The dashboard API surface.
    pub fn standard() -> Result<Self, PerfdashError> {
        use Endpoint::*;
        use HttpMethod::{Get, Post};

        let task = |suffix: &str, prefix: &str| format!(r"/api/{prefix}/{SEGMENT}/{suffix}");

        let mut table = Self::new();
        table
            // Auth
            .register(Post, r"/api/auth/login", Login)?
            // Config
            .register(Get, r"/api/config/proxy", GetProxyConfig)?
            .register(Post, r"/api/config/proxy", UpdateProxyConfig)?
            // Collect
            .register(Post, r"/api/collect/start", StartCollect)?
            .register(Post, r"/api/collect/stop", StopCollect)?
            .register(Get, r"/api/collect/status", CollectStatus)?
            .register(Get, r"/api/collect/tasks", CollectTasks)?
            // Files
            .register(Get, r"/api/files/tasks", FileTasks)?
            .register(Get, &task("performance", "files"), PerformanceRecords)?
            .register(Get, &task("qa", "files"), QaRecords)?
            .register(Get, &task("summary", "files"), FileSummary)?
            // Metrics
            .register(Get, &task("summary", "metrics"), MetricsSummary)?
            .register(Get, &task("distributions", "metrics"), Distributions)?
            // Benchmark
            .register(Post, r"/api/benchmark/start", StartBenchmark)?
            .register(Get, r"/api/benchmark/tasks", BenchmarkTasks)?
            .register(Get, &task("progress", "benchmark"), BenchmarkProgress)?
            // Compare
            .register(Get, r"/api/compare", Compare)?
            // Report
            .register(Post, r"/api/report/generate", GenerateReport)?
            .register(Get, r"/api/report/list", ListReports)?
            // Analysis
            .register(Get, r"/api/analysis/engines", AnalysisEngines)?
            .register(Get, &task("suggestions", "analysis"), Suggestions)?
            // Health
            .register(Get, r"/health", Health)?;
        Ok(table)
    }

    /// Find the first entry whose method equals `method` and whose pattern
    /// matches `path` (query string and fragment ignored).
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        let path = normalize_path(path);
        let found = self
            .entries
            .iter()
            .filter(|entry| entry.method == method)
            .find_map(|entry| {
                entry.matcher.captures(path).map(|caps| RouteMatch {
                    endpoint: entry.endpoint,
                    captures: caps
                        .iter()
                        .skip(1)
                        .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                        .collect(),
                })
            });
        debug!(
            method = method.as_lowercase(),
            path,
            endpoint = ?found.as_ref().map(|m| m.endpoint),
            "Route resolution"
        );
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> RouteTable {
        RouteTable::standard().expect("standard table compiles")
    }

    // -----------------------------------------------------------------------
    // register
    // -----------------------------------------------------------------------

    #[test]
    fn register_anchors_pattern_to_end() {
        let mut table = RouteTable::new();
        table
            .register(HttpMethod::Get, r"/api/report/list", Endpoint::ListReports)
            .unwrap();
        assert_eq!(table.entries[0].matcher.as_str(), r"/api/report/list$");
        assert!(table
            .resolve(HttpMethod::Get, "/api/report/list/extra")
            .is_none());
    }

    #[test]
    fn register_rejects_invalid_pattern() {
        let mut table = RouteTable::new();
        let err = table
            .register(HttpMethod::Get, r"/api/(unclosed", Endpoint::Health)
            .unwrap_err();
        assert!(matches!(err, PerfdashError::Pattern(_)));
        assert!(table.is_empty());
    }

    // -----------------------------------------------------------------------
    // resolve
    // -----------------------------------------------------------------------

    #[test]
    fn standard_table_resolves_every_endpoint() {
        let table = standard();
        let cases = [
            (HttpMethod::Post, "/api/auth/login", Endpoint::Login),
            (HttpMethod::Get, "/api/config/proxy", Endpoint::GetProxyConfig),
            (HttpMethod::Post, "/api/config/proxy", Endpoint::UpdateProxyConfig),
            (HttpMethod::Post, "/api/collect/start", Endpoint::StartCollect),
            (HttpMethod::Post, "/api/collect/stop", Endpoint::StopCollect),
            (HttpMethod::Get, "/api/collect/status", Endpoint::CollectStatus),
            (HttpMethod::Get, "/api/collect/tasks", Endpoint::CollectTasks),
            (HttpMethod::Get, "/api/files/tasks", Endpoint::FileTasks),
            (HttpMethod::Get, "/api/files/t1/performance", Endpoint::PerformanceRecords),
            (HttpMethod::Get, "/api/files/t1/qa", Endpoint::QaRecords),
            (HttpMethod::Get, "/api/files/t1/summary", Endpoint::FileSummary),
            (HttpMethod::Get, "/api/metrics/t1/summary", Endpoint::MetricsSummary),
            (HttpMethod::Get, "/api/metrics/t1/distributions", Endpoint::Distributions),
            (HttpMethod::Post, "/api/benchmark/start", Endpoint::StartBenchmark),
            (HttpMethod::Get, "/api/benchmark/t1/progress", Endpoint::BenchmarkProgress),
            (HttpMethod::Get, "/api/benchmark/tasks", Endpoint::BenchmarkTasks),
            (HttpMethod::Get, "/api/compare", Endpoint::Compare),
            (HttpMethod::Post, "/api/report/generate", Endpoint::GenerateReport),
            (HttpMethod::Get, "/api/report/list", Endpoint::ListReports),
            (HttpMethod::Get, "/api/analysis/engines", Endpoint::AnalysisEngines),
            (HttpMethod::Get, "/api/analysis/t1/suggestions", Endpoint::Suggestions),
            (HttpMethod::Get, "/health", Endpoint::Health),
        ];
        assert_eq!(table.len(), cases.len());
        for (method, path, expected) in cases {
            let m = table
                .resolve(method, path)
                .unwrap_or_else(|| panic!("{method} {path} did not resolve"));
            assert_eq!(m.endpoint, expected, "{method} {path}");
        }
    }

    #[test]
    fn task_id_is_captured() {
        let m = standard()
            .resolve(
                HttpMethod::Get,
                "/api/metrics/task-optimized-gpt4o-20260210/summary",
            )
            .unwrap();
        assert_eq!(m.endpoint, Endpoint::MetricsSummary);
        assert_eq!(m.capture(0), Some("task-optimized-gpt4o-20260210"));
        assert_eq!(m.capture(1), None);
    }

    #[test]
    fn files_tasks_is_not_mistaken_for_a_task_id() {
        let m = standard().resolve(HttpMethod::Get, "/api/files/tasks").unwrap();
        assert_eq!(m.endpoint, Endpoint::FileTasks);
        assert!(m.captures.is_empty());
    }

    #[test]
    fn method_must_match() {
        let table = standard();
        assert!(table.resolve(HttpMethod::Get, "/api/auth/login").is_none());
        assert!(table.resolve(HttpMethod::Delete, "/api/config/proxy").is_none());
    }

    #[test]
    fn query_string_and_absolute_urls_are_handled() {
        let table = standard();
        let m = table
            .resolve(HttpMethod::Get, "/api/compare?baseline_id=a&optimized_id=b")
            .unwrap();
        assert_eq!(m.endpoint, Endpoint::Compare);

        let m = table
            .resolve(HttpMethod::Get, "http://localhost:8080/api/files/t9/qa")
            .unwrap();
        assert_eq!(m.endpoint, Endpoint::QaRecords);
        assert_eq!(m.capture(0), Some("t9"));
    }

    #[test]
    fn unknown_paths_do_not_resolve() {
        let table = standard();
        assert!(table.resolve(HttpMethod::Get, "/api/report/download/r1").is_none());
        assert!(table.resolve(HttpMethod::Get, "/api/files/a/b/performance").is_none());
        assert!(table.resolve(HttpMethod::Get, "").is_none());
    }

    #[test]
    fn first_registered_pattern_wins_on_ambiguity() {
        let mut generic_first = RouteTable::new();
        generic_first
            .register(HttpMethod::Get, r"/api/files/([^/]+)/summary", Endpoint::FileSummary)
            .unwrap()
            .register(HttpMethod::Get, r"/api/files/special/summary", Endpoint::Health)
            .unwrap();
        let m = generic_first
            .resolve(HttpMethod::Get, "/api/files/special/summary")
            .unwrap();
        assert_eq!(m.endpoint, Endpoint::FileSummary);
        assert_eq!(m.capture(0), Some("special"));

        let mut specific_first = RouteTable::new();
        specific_first
            .register(HttpMethod::Get, r"/api/files/special/summary", Endpoint::Health)
            .unwrap()
            .register(HttpMethod::Get, r"/api/files/([^/]+)/summary", Endpoint::FileSummary)
            .unwrap();
        let m = specific_first
            .resolve(HttpMethod::Get, "/api/files/special/summary")
            .unwrap();
        assert_eq!(m.endpoint, Endpoint::Health);
        assert!(m.captures.is_empty());
    }

    #[test]
    fn optional_group_that_did_not_participate_is_empty() {
        let mut table = RouteTable::new();
        table
            .register(HttpMethod::Get, r"/api/x(/([^/]+))?", Endpoint::Health)
            .unwrap();
        let m = table.resolve(HttpMethod::Get, "/api/x").unwrap();
        assert_eq!(m.captures, vec![String::new(), String::new()]);
    }
}
