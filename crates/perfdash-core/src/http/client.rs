use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::PerfdashError;
use crate::http::request::{ApiRequest, RequestBody};
use crate::http::response::ApiResponse;
use crate::http::token::TokenStore;
use crate::mock::gateway::MockGateway;
use crate::mock::store::{ConfigStore, ProxyConfig, ProxyConfigUpdate};
use crate::settings::{ClientSettings, SimulationSettings};
use crate::synth::model::{
    AnalysisEngine, BenchmarkProgress, CollectStatus, CompareResult, Distributions, Envelope,
    FileSummary, LoginToken, MetricsSummary, Page, PerformanceRecord, QaRecord, ReportCreated,
    Suggestion, Task, TaskStarted, TaskStopped,
};
use crate::synth::PageRequest;

/// Where a rejected session should sign in again.
pub const LOGIN_REDIRECT: &str = "/login";

/// Dashboard API client: bearer-token injection, optional simulation
/// gateway in front of a pooled reqwest transport, and 401 handling.
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: String,
    gateway: Option<MockGateway>,
    tokens: Arc<TokenStore>,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    user_agent: String,
    gateway: Option<MockGateway>,
    tokens: Arc<TokenStore>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            base_url: settings.base_url,
            timeout: Duration::from_secs(settings.timeout_secs),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("perfdash/{}", env!("CARGO_PKG_VERSION")),
            gateway: None,
            tokens: Arc::new(TokenStore::new()),
        }
    }
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `settings`. When `use_mock` is set a gateway with a fresh
    /// config store and `simulation` settings is installed.
    pub fn from_settings(
        settings: &ClientSettings,
        simulation: SimulationSettings,
    ) -> Result<Self, PerfdashError> {
        let mut builder = Self::new()
            .base_url(settings.base_url.clone())
            .timeout(settings.timeout());
        if settings.use_mock {
            let gateway = MockGateway::new(Arc::new(ConfigStore::default()), simulation)?;
            builder = builder.gateway(gateway);
        }
        Ok(builder)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.pool_max_idle_per_host = n;
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn gateway(mut self, gateway: MockGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Share a token store with other clients.
    pub fn tokens(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn build(self) -> Result<ApiClient, PerfdashError> {
        if self.base_url.trim().is_empty() {
            return Err(PerfdashError::Validation("base URL must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(self.pool_idle_timeout)
            .user_agent(self.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(ApiClient {
            inner: client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            gateway: self.gateway,
            tokens: self.tokens,
        })
    }
}

// Only used to borrow the URL path encoder.
const PATH_BASE: &str = "http://localhost/";

/// `/api/{section}/{task_id}/{suffix}` with the task id percent-encoded, so
/// a `/`, `?` or `#` inside it stays within its own segment.
fn task_path(section: &str, task_id: &str, suffix: &str) -> Result<String, PerfdashError> {
    let mut url = Url::parse(PATH_BASE)
        .map_err(|e| PerfdashError::Internal(format!("path encoder base: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| PerfdashError::Internal("path encoder base has no path".to_string()))?
        .clear()
        .extend(["api", section, task_id, suffix]);
    Ok(url.path().to_string())
}

#[derive(Deserialize)]
struct TaskList {
    tasks: Vec<Task>,
}

impl ApiClient {
    /// Returns a builder for customising the client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn gateway(&self) -> Option<&MockGateway> {
        self.gateway.as_ref()
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Absolute URL for `url`; relative paths are joined onto the base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }

    /// Send a request through the gateway if one is installed and matches,
    /// otherwise over the network.
    ///
    /// A 401 clears the stored token and is reported as
    /// [`PerfdashError::Unauthorized`]; every other status is returned as is.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, PerfdashError> {
        if let Some(token) = self.tokens.get() {
            request
                .headers
                .insert("Authorization".to_string(), format!("Bearer {token}"));
        }

        let pending = self.gateway.as_ref().and_then(|g| g.intercept(&request));
        let response = match pending {
            Some(pending) => pending.wait().await?,
            None => self.send_remote(&request).await?,
        };

        if response.status == 401 {
            if self.tokens.clear() {
                info!("Cleared stored access token");
            }
            warn!(method = %request.method, url = %request.url, "Request was rejected as unauthorized");
            return Err(PerfdashError::Unauthorized {
                redirect: LOGIN_REDIRECT.to_string(),
            });
        }

        Ok(response)
    }

    async fn send_remote(&self, request: &ApiRequest) -> Result<ApiResponse, PerfdashError> {
        let method = reqwest::Method::from_bytes(request.method.to_string().as_bytes())
            .map_err(|e| PerfdashError::Validation(format!("Invalid HTTP method: {e}")))?;
        let url = self.resolve_url(&request.url);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self.inner.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        match &request.body {
            Some(RequestBody::Json(value)) => builder = builder.json(value),
            Some(RequestBody::Form(pairs)) => builder = builder.form(pairs),
            None => {}
        }

        let start = Instant::now();
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
            .collect();

        let body_bytes = response.bytes().await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let size_bytes = body_bytes.len() as u64;
        let body = String::from_utf8_lossy(&body_bytes).into_owned();

        Ok(ApiResponse {
            status,
            headers,
            body,
            elapsed_ms,
            size_bytes,
            simulated: false,
        })
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, PerfdashError> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(PerfdashError::Status {
                status: response.status,
                body: response.body,
            });
        }
        response.json()
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Exchange credentials for a bearer token and keep it for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginToken, PerfdashError> {
        let request = ApiRequest::post("/api/auth/login").form(vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        let token: LoginToken = self.call(request).await?;
        self.tokens.set(token.access_token.clone());
        info!(username, "Signed in");
        Ok(token)
    }

    // -----------------------------------------------------------------------
    // Config
    // -----------------------------------------------------------------------

    pub async fn get_proxy_config(&self) -> Result<ProxyConfig, PerfdashError> {
        self.call(ApiRequest::get("/api/config/proxy")).await
    }

    pub async fn set_proxy_config(&self, update: &ProxyConfigUpdate) -> Result<Value, PerfdashError> {
        let body = serde_json::to_value(update)?;
        self.call(ApiRequest::post("/api/config/proxy").json(body)).await
    }

    // -----------------------------------------------------------------------
    // Collect
    // -----------------------------------------------------------------------

    pub async fn start_collect(&self, params: Value) -> Result<TaskStarted, PerfdashError> {
        self.call(ApiRequest::post("/api/collect/start").json(params)).await
    }

    pub async fn stop_collect(&self, task_id: Option<&str>) -> Result<TaskStopped, PerfdashError> {
        let body = match task_id {
            Some(id) => json!({ "task_id": id }),
            None => json!({}),
        };
        self.call(ApiRequest::post("/api/collect/stop").json(body)).await
    }

    pub async fn get_collect_status(&self) -> Result<CollectStatus, PerfdashError> {
        self.call(ApiRequest::get("/api/collect/status")).await
    }

    pub async fn list_collect_tasks(&self) -> Result<Vec<Task>, PerfdashError> {
        self.call(ApiRequest::get("/api/collect/tasks")).await
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    pub async fn list_task_files(&self) -> Result<Vec<Task>, PerfdashError> {
        let list: TaskList = self.call(ApiRequest::get("/api/files/tasks")).await?;
        Ok(list.tasks)
    }

    pub async fn get_performance_data(
        &self,
        task_id: &str,
        page: PageRequest,
    ) -> Result<Page<PerformanceRecord>, PerfdashError> {
        let request = ApiRequest::get(task_path("files", task_id, "performance")?)
            .query("page", page.page)
            .query("size", page.size);
        self.call(request).await
    }

    pub async fn get_qa_data(
        &self,
        task_id: &str,
        page: PageRequest,
    ) -> Result<Page<QaRecord>, PerfdashError> {
        let request = ApiRequest::get(task_path("files", task_id, "qa")?)
            .query("page", page.page)
            .query("size", page.size);
        self.call(request).await
    }

    pub async fn get_summary(&self, task_id: &str) -> Result<FileSummary, PerfdashError> {
        self.call(ApiRequest::get(task_path("files", task_id, "summary")?)).await
    }

    // -----------------------------------------------------------------------
    // Metrics
    // -----------------------------------------------------------------------

    pub async fn get_distributions(&self, task_id: &str) -> Result<Distributions, PerfdashError> {
        let envelope: Envelope<Distributions> = self
            .call(ApiRequest::get(task_path("metrics", task_id, "distributions")?))
            .await?;
        Ok(envelope.data)
    }

    pub async fn get_metrics_summary(&self, task_id: &str) -> Result<MetricsSummary, PerfdashError> {
        let envelope: Envelope<MetricsSummary> = self
            .call(ApiRequest::get(task_path("metrics", task_id, "summary")?))
            .await?;
        Ok(envelope.data)
    }

    // -----------------------------------------------------------------------
    // Benchmark
    // -----------------------------------------------------------------------

    pub async fn start_benchmark(&self, params: Value) -> Result<TaskStarted, PerfdashError> {
        self.call(ApiRequest::post("/api/benchmark/start").json(params)).await
    }

    pub async fn get_benchmark_progress(
        &self,
        task_id: &str,
    ) -> Result<BenchmarkProgress, PerfdashError> {
        self.call(ApiRequest::get(task_path("benchmark", task_id, "progress")?)).await
    }

    pub async fn list_benchmark_tasks(&self) -> Result<Vec<Task>, PerfdashError> {
        self.call(ApiRequest::get("/api/benchmark/tasks")).await
    }

    // -----------------------------------------------------------------------
    // Compare
    // -----------------------------------------------------------------------

    pub async fn compare_tasks(
        &self,
        baseline_id: &str,
        optimized_id: &str,
    ) -> Result<CompareResult, PerfdashError> {
        let request = ApiRequest::get("/api/compare")
            .query("baseline_id", baseline_id)
            .query("optimized_id", optimized_id);
        self.call(request).await
    }

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------

    pub async fn generate_report(&self, params: Value) -> Result<ReportCreated, PerfdashError> {
        self.call(ApiRequest::post("/api/report/generate").json(params)).await
    }

    pub async fn list_reports(&self) -> Result<Vec<Value>, PerfdashError> {
        self.call(ApiRequest::get("/api/report/list")).await
    }

    /// Download link for a generated report. Never routed through the
    /// gateway; the file is fetched by whoever opens the link.
    pub fn download_report_url(&self, report_id: &str) -> String {
        format!("{}/api/report/download/{report_id}", self.base_url)
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    pub async fn list_engines(&self) -> Result<Vec<AnalysisEngine>, PerfdashError> {
        self.call(ApiRequest::get("/api/analysis/engines")).await
    }

    pub async fn get_suggestions(&self, task_id: &str) -> Result<Vec<Suggestion>, PerfdashError> {
        let envelope: Envelope<Vec<Suggestion>> = self
            .call(ApiRequest::get(task_path("analysis", task_id, "suggestions")?))
            .await?;
        Ok(envelope.data)
    }

    pub async fn health(&self) -> Result<Value, PerfdashError> {
        self.call(ApiRequest::get("/health")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::model::TaskStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn mock_client() -> ApiClient {
        let gateway =
            MockGateway::new(Arc::new(ConfigStore::default()), SimulationSettings::instant())
                .unwrap();
        ApiClient::builder().gateway(gateway).build().unwrap()
    }

    /// Accept one connection, answer it with `status_line` and `body`, and
    /// hand back the raw request text.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    // -----------------------------------------------------------------------
    // Builder
    // -----------------------------------------------------------------------

    #[test]
    fn default_builder_has_expected_values() {
        let builder = ApiClientBuilder::default();
        assert_eq!(builder.base_url, "http://localhost:8080");
        assert_eq!(builder.timeout, Duration::from_secs(60));
        assert_eq!(builder.pool_max_idle_per_host, 10);
        assert!(builder.gateway.is_none());
        assert!(builder.user_agent.starts_with("perfdash/"));
    }

    #[test]
    fn builder_chaining_all_options() {
        let client = ApiClient::builder()
            .base_url("http://perf.internal:9000/")
            .timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent("perfdash-test")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://perf.internal:9000");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let result = ApiClient::builder().base_url("  ").build();
        assert!(matches!(result, Err(PerfdashError::Validation(_))));
    }

    #[test]
    fn from_settings_installs_gateway_only_when_enabled() {
        let mut settings = ClientSettings::default();
        let client = ApiClientBuilder::from_settings(&settings, SimulationSettings::instant())
            .unwrap()
            .build()
            .unwrap();
        assert!(client.gateway().is_none());

        settings.use_mock = true;
        let client = ApiClientBuilder::from_settings(&settings, SimulationSettings::instant())
            .unwrap()
            .build()
            .unwrap();
        assert!(client.gateway().is_some());
    }

    #[test]
    fn relative_urls_join_base() {
        let client = ApiClient::builder().base_url("http://host:1/").build().unwrap();
        assert_eq!(client.resolve_url("/api/compare"), "http://host:1/api/compare");
        assert_eq!(client.resolve_url("health"), "http://host:1/health");
        assert_eq!(client.resolve_url("https://other/x"), "https://other/x");
    }

    #[test]
    fn task_ids_are_encoded_as_one_segment() {
        assert_eq!(
            task_path("files", "task-baseline-gpt4o-20260201", "qa").unwrap(),
            "/api/files/task-baseline-gpt4o-20260201/qa"
        );
        assert_eq!(
            task_path("metrics", "a/b?c#d", "summary").unwrap(),
            "/api/metrics/a%2Fb%3Fc%23d/summary"
        );
    }

    #[test]
    fn download_url_uses_base() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(
            client.download_report_url("report-mock-1"),
            "http://localhost:8080/api/report/download/report-mock-1"
        );
    }

    // -----------------------------------------------------------------------
    // Simulated calls
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn login_stores_token() {
        let client = mock_client();
        let token = client.login("admin", "secret").await.unwrap();
        assert_eq!(token.access_token, "mock-token-abc123");
        assert_eq!(client.tokens().get().as_deref(), Some("mock-token-abc123"));
    }

    #[tokio::test]
    async fn typed_calls_through_gateway() {
        let client = mock_client();

        let summary = client
            .get_metrics_summary("task-optimized-gpt4o-20260210")
            .await
            .unwrap();
        assert_eq!(summary.ttft_avg, 92.4);

        let page = client
            .get_performance_data("task-baseline-gpt4o-20260201", PageRequest::new(1, 5))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(page.items.iter().all(|r| r.cached_tokens <= r.prompt_tokens));

        let qa = client
            .get_qa_data("task-baseline-gpt4o-20260201", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(qa.items.len(), 20);

        let files = client.list_task_files().await.unwrap();
        assert_eq!(files.len(), 4);

        let started = client.start_collect(json!({"name": "run"})).await.unwrap();
        assert_eq!(started.status, TaskStatus::Running);
        assert!(started.task_id.starts_with("task-mock-"));

        let stopped = client.stop_collect(Some(started.task_id.as_str())).await.unwrap();
        assert_eq!(stopped.status, TaskStatus::Stopped);

        let compare = client
            .compare_tasks("task-baseline-gpt4o-20260201", "task-optimized-gpt4o-20260210")
            .await
            .unwrap();
        assert_eq!(compare.optimized_id.as_deref(), Some("task-optimized-gpt4o-20260210"));
        assert_eq!(compare.baseline_ttft.len(), compare.optimized_ttft.len());

        assert_eq!(client.get_suggestions("task-optimized-gpt4o-20260210").await.unwrap().len(), 4);
        assert!(client.list_reports().await.unwrap().is_empty());
        assert_eq!(client.health().await.unwrap()["status"], "ok");
    }

    #[tokio::test]
    async fn task_id_with_reserved_characters_keeps_its_route() {
        let client = mock_client();
        let page = client
            .get_performance_data("odd/id?x#y", PageRequest::new(1, 5))
            .await
            .unwrap();
        assert_eq!(page.total, 500);
        assert_eq!(page.items.len(), 5);

        let summary = client.get_metrics_summary("runs/optimized").await.unwrap();
        assert_eq!(summary.ttft_avg, 92.4);
    }

    #[tokio::test]
    async fn proxy_config_round_trips_through_gateway() {
        let client = mock_client();
        let ack = client
            .set_proxy_config(&ProxyConfigUpdate {
                target_port: Some(9000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ack["status"], "ok");

        let config = client.get_proxy_config().await.unwrap();
        assert_eq!(config.target_port, 9000);
        assert_eq!(config.target_host, "127.0.0.1");
    }

    // -----------------------------------------------------------------------
    // Real transport
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unmatched_request_reaches_network_with_bearer_token() {
        let (base, server) = one_shot_server("200 OK", r#"{"status":"ok"}"#).await;
        let client = ApiClient::builder().base_url(base).build().unwrap();
        client.tokens().set("tok-1");

        let resp = client
            .send(ApiRequest::get("/api/report/download/r1"))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert!(!resp.simulated);

        let raw = server.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get /api/report/download/r1 "));
        assert!(raw.contains("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn unauthorized_clears_token() {
        let (base, server) = one_shot_server("401 Unauthorized", "{}").await;
        let client = ApiClient::builder().base_url(base).build().unwrap();
        client.tokens().set("stale");

        let err = client.health().await.unwrap_err();
        match err {
            PerfdashError::Unauthorized { redirect } => assert_eq!(redirect, "/login"),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        assert!(client.tokens().get().is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn other_failures_are_returned_unchanged() {
        let (base, server) = one_shot_server("503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let client = ApiClient::builder().base_url(base).build().unwrap();
        client.tokens().set("keep");

        let resp = client.send(ApiRequest::get("/health")).await.unwrap();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.json::<Value>().unwrap()["error"], "busy");
        assert_eq!(client.tokens().get().as_deref(), Some("keep"));
        server.await.unwrap();
    }
}
