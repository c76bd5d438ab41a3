use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::PerfdashError;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::mock::handlers::{handle, HandlerContext};
use crate::mock::routes::{Endpoint, RouteMatch, RouteTable};
use crate::mock::store::ConfigStore;
use crate::settings::SimulationSettings;

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

struct GatewayInner {
    routes: RouteTable,
    store: Arc<ConfigStore>,
    settings: SimulationSettings,
}

/// Development-mode substitute backend.
///
/// Requests that match the route table are answered with synthetic data
/// after an artificial delay; everything else is left for the real
/// transport. Cloning is cheap and clones share the route table and store.
#[derive(Clone)]
pub struct MockGateway {
    inner: Arc<GatewayInner>,
}

impl MockGateway {
    /// Gateway over the standard route table.
    pub fn new(store: Arc<ConfigStore>, settings: SimulationSettings) -> Result<Self, PerfdashError> {
        Self::with_routes(RouteTable::standard()?, store, settings)
    }

    pub fn with_routes(
        routes: RouteTable,
        store: Arc<ConfigStore>,
        settings: SimulationSettings,
    ) -> Result<Self, PerfdashError> {
        settings.validate()?;
        if routes.is_empty() {
            return Err(PerfdashError::Validation(
                "mock gateway needs at least one route".to_string(),
            ));
        }
        debug!(routes = routes.len(), "Mock gateway ready");
        Ok(Self {
            inner: Arc::new(GatewayInner {
                routes,
                store,
                settings,
            }),
        })
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.inner.store
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.inner.settings
    }

    /// Try to answer `request` from the simulation.
    ///
    /// Returns `None` when no route matches; the caller should then send the
    /// request over the network unchanged. On a match the handler runs on a
    /// spawned task after the delay, so this must be called from within a
    /// Tokio runtime.
    pub fn intercept(&self, request: &ApiRequest) -> Option<PendingResponse> {
        let route = self.inner.routes.resolve(request.method, request.path())?;

        let (min_ms, max_ms) = self.inner.settings.delay_range();
        let delay = Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms));
        debug!(
            method = %request.method,
            url = %request.url,
            endpoint = ?route.endpoint,
            delay_ms = delay.as_millis() as u64,
            "Intercepted request"
        );

        let cancel = CancellationToken::new();
        let endpoint = route.endpoint;
        let inner = self.inner.clone();
        let token = cancel.clone();
        let query = request.merged_query();
        let body = request.body.as_ref().map(|b| b.to_json());

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(endpoint = ?route.endpoint, "Simulated request cancelled");
                    None
                }
                _ = tokio::time::sleep(delay) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    Some(inner.respond(&route, &query, body.as_ref(), elapsed_ms))
                }
            }
        });

        Some(PendingResponse {
            endpoint,
            cancel,
            handle,
        })
    }
}

impl GatewayInner {
    fn respond(
        &self,
        route: &RouteMatch,
        query: &HashMap<String, String>,
        body: Option<&Value>,
        elapsed_ms: u64,
    ) -> ApiResponse {
        let ctx = HandlerContext {
            captures: &route.captures,
            query,
            body,
            store: &self.store,
            settings: &self.settings,
            now: Utc::now(),
        };
        match handle(route.endpoint, &ctx, &mut rand::thread_rng()) {
            Ok(value) => ApiResponse::synthetic(200, &value, elapsed_ms),
            Err(e) => {
                warn!(endpoint = ?route.endpoint, "Simulated handler failed: {e}");
                ApiResponse::synthetic(500, &json!({ "error": e.to_string() }), elapsed_ms)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PendingResponse
// ---------------------------------------------------------------------------

/// A simulated response that has been scheduled but may not have resolved
/// yet. Each one owns its own timer, so many can be in flight at once.
pub struct PendingResponse {
    endpoint: Endpoint,
    cancel: CancellationToken,
    handle: JoinHandle<Option<ApiResponse>>,
}

impl PendingResponse {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Stop the timer. If the delay has not elapsed yet the handler is never
    /// invoked and [`wait`](Self::wait) reports the cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the synthetic response.
    pub async fn wait(self) -> Result<ApiResponse, PerfdashError> {
        match self.handle.await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(PerfdashError::Internal(format!(
                "simulated {:?} request was cancelled",
                self.endpoint
            ))),
            Err(e) => Err(PerfdashError::Internal(format!(
                "simulated {:?} request task failed: {e}",
                self.endpoint
            ))),
        }
    }
}
