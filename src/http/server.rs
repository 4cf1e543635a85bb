//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the fan-out and health handlers
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Swap in a new dispatcher when the configuration is reloaded
//! - Serve until the shutdown signal fires

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::uri::InvalidUri,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validation::validate_config, FanoutConfig};
use crate::fanout::{self, Dispatcher, Invocation};
use crate::http::request::{propagate_request_id, request_span, set_request_id};

/// Everything an invocation needs, replaced as a unit on reload.
#[derive(Debug)]
pub struct Runtime {
    pub config: FanoutConfig,
    pub dispatcher: Dispatcher,
}

impl Runtime {
    pub fn from_config(config: FanoutConfig) -> Result<Self, InvalidUri> {
        let dispatcher = Dispatcher::from_config(&config)?;
        Ok(Self { config, dispatcher })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Runtime>>,
}

/// HTTP server for the fan-out handler.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: FanoutConfig) -> Result<Self, InvalidUri> {
        Ok(Self::with_runtime(Runtime::from_config(config)?))
    }

    /// Create a server around a prebuilt runtime (e.g. a custom downstream).
    pub fn with_runtime(runtime: Runtime) -> Self {
        let router_config = runtime.config.clone();
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(runtime)),
        };
        let router = Self::build_router(&router_config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &FanoutConfig, state: AppState) -> Router {
        Router::new()
            .route("/", post(fanout_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(propagate_request_id())
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::new(config.timeouts.request())),
            )
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the runtime for
    /// subsequent invocations; in-flight invocations keep the one they started with.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<FanoutConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let inner = self.state.inner.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_config(&inner, new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_config(inner: &ArcSwap<Runtime>, new_config: FanoutConfig) {
    if let Err(errors) = validate_config(&new_config) {
        tracing::error!(errors = errors.len(), first = %errors[0], "Rejected reloaded configuration");
        return;
    }

    let current = inner.load();
    if current.config.listener.bind_address != new_config.listener.bind_address {
        tracing::warn!(
            bind_address = %current.config.listener.bind_address,
            "Listener address changes need a restart; keeping the bound address"
        );
    }

    match Runtime::from_config(new_config) {
        Ok(runtime) => {
            tracing::info!(
                downstream = %runtime.config.downstream.url,
                max_in_flight = runtime.dispatcher.max_in_flight(),
                call_timeout_ms = runtime.config.timeouts.call_ms,
                "Configuration reloaded"
            );
            inner.store(Arc::new(runtime));
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected reloaded configuration");
        }
    }
}

/// Fan the posted batch out to the downstream.
async fn fanout_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let runtime = state.inner.load_full();
    let invocation = Invocation::from_http_body(&body);
    fanout::handle(&runtime.dispatcher, invocation).await.into_response()
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
