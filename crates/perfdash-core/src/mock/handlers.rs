//! Endpoint handlers: turn a resolved route into a JSON body.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::PerfdashError;
use crate::mock::routes::Endpoint;
use crate::mock::store::ConfigStore;
use crate::settings::SimulationSettings;
use crate::synth::model::{Envelope, TaskType};
use crate::synth::{self, catalog, PageRequest};

/// Everything a handler may read for one intercepted request.
pub struct HandlerContext<'a> {
    pub captures: &'a [String],
    pub query: &'a HashMap<String, String>,
    pub body: Option<&'a Value>,
    pub store: &'a ConfigStore,
    pub settings: &'a SimulationSettings,
    pub now: DateTime<Utc>,
}

impl HandlerContext<'_> {
    fn task_id(&self) -> Result<&str, PerfdashError> {
        self.captures
            .first()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PerfdashError::Handler("route did not capture a task id".to_string()))
    }

    fn body_str(&self, key: &str) -> Option<String> {
        self.body?.get(key)?.as_str().map(str::to_string)
    }

    fn query_str(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, PerfdashError> {
    Ok(serde_json::to_value(value)?)
}

fn enveloped<T: Serialize>(data: T) -> Result<Value, PerfdashError> {
    to_json(Envelope { data })
}

/// Produce the response body for `endpoint`.
pub fn handle<R: Rng + ?Sized>(
    endpoint: Endpoint,
    ctx: &HandlerContext<'_>,
    rng: &mut R,
) -> Result<Value, PerfdashError> {
    match endpoint {
        Endpoint::Login => to_json(catalog::login_token()),

        Endpoint::GetProxyConfig => to_json(ctx.store.get()),
        Endpoint::UpdateProxyConfig => {
            ctx.store.update_from_body(ctx.body);
            Ok(json!({ "status": "ok" }))
        }

        Endpoint::StartCollect => to_json(catalog::start_collect(ctx.now)),
        Endpoint::StopCollect => to_json(catalog::stop_collect(ctx.body_str("task_id"))),
        Endpoint::CollectStatus => to_json(catalog::collect_status()),
        Endpoint::CollectTasks => to_json(catalog::tasks_of_type(TaskType::Collect)),

        Endpoint::FileTasks => Ok(json!({ "tasks": catalog::mock_tasks() })),
        Endpoint::PerformanceRecords => {
            let task_id = ctx.task_id()?;
            let total = catalog::record_total(task_id, ctx.settings.default_record_total);
            let page = PageRequest::from_query(ctx.query);
            to_json(synth::performance_records(rng, task_id, page, total))
        }
        Endpoint::QaRecords => {
            let task_id = ctx.task_id()?;
            let total = catalog::record_total(task_id, ctx.settings.default_record_total);
            let page = PageRequest::from_query(ctx.query);
            to_json(synth::qa_records(rng, page, total))
        }
        Endpoint::FileSummary => {
            ctx.task_id()?;
            to_json(catalog::file_summary())
        }

        Endpoint::MetricsSummary => enveloped(synth::metrics_summary(ctx.task_id()?)),
        Endpoint::Distributions => enveloped(synth::distributions(ctx.task_id()?)),

        Endpoint::StartBenchmark => to_json(catalog::start_benchmark(ctx.now)),
        Endpoint::BenchmarkProgress => to_json(catalog::benchmark_progress(ctx.task_id()?)),
        Endpoint::BenchmarkTasks => to_json(catalog::tasks_of_type(TaskType::Benchmark)),

        Endpoint::Compare => to_json(synth::compare_result(
            rng,
            ctx.query_str("baseline_id"),
            ctx.query_str("optimized_id"),
            ctx.settings.compare_len_range(),
        )),

        Endpoint::GenerateReport => to_json(catalog::generate_report(ctx.now)),
        Endpoint::ListReports => Ok(json!([])),

        Endpoint::AnalysisEngines => to_json(catalog::analysis_engines()),
        Endpoint::Suggestions => enveloped(synth::suggestions(ctx.task_id()?)),

        Endpoint::Health => Ok(json!({ "status": "ok" })),
    }
}
