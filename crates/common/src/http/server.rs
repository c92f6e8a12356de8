//! HTTP server shared by every module router.
//!
//! Module crates build their own [`Router`]s (with authentication applied to
//! the routes that need it); [`build_app`] merges them and adds the boundary
//! layers, [`run_http_server`] serves until the cancellation token fires.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::Router;
use saas_runner::ShutdownSignal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

use super::{integrity_boundary, panic_response, HttpLoggingConfig, HttpLoggingLayer};
use crate::auth::TRACE_ID_HEADER;

/// CORS configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. `["*"]` allows all origins.
    pub allowed_origins: Vec<String>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    /// Parse comma-separated origins string.
    pub fn from_comma_separated(origins: &str) -> Self {
        let allowed_origins: Vec<String> = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            allowed_origins: if allowed_origins.is_empty() {
                vec!["*".to_string()]
            } else {
                allowed_origins
            },
            max_age_secs: 3600,
        }
    }

    fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub logging_config: HttpLoggingConfig,
    pub cors_config: CorsConfig,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            request_timeout: Duration::from_secs(30),
            logging_config: HttpLoggingConfig::default(),
            cors_config: CorsConfig::default(),
        }
    }
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = if config.allows_any() {
        warn!("CORS configured to allow all origins");
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("traceid")])
        .max_age(Duration::from_secs(config.max_age_secs))
}

async fn health() -> &'static str {
    "ok"
}

/// Merge module routers and wrap them in the boundary layers.
///
/// Outermost first: CORS, request logging, panic recovery, integrity
/// shutdown, request timeout.
pub fn build_app(config: &HttpServerConfig, routers: Vec<Router>, shutdown: ShutdownSignal) -> Router {
    let app = routers
        .into_iter()
        .fold(Router::new().route("/health", get(health)), |app, router| {
            app.merge(router)
        });

    debug!(trace_header = TRACE_ID_HEADER, "building HTTP app");

    app.layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        config.request_timeout,
    ))
        .layer(axum::middleware::from_fn_with_state(shutdown, integrity_boundary))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(HttpLoggingLayer::new(config.logging_config.clone()))
        .layer(build_cors_layer(&config.cors_config))
}

/// Serve `app` until the cancellation token fires.
pub async fn run_http_server(
    config: HttpServerConfig,
    app: Router,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid server address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            debug!("HTTP server shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    debug!("HTTP server stopped gracefully");
    Ok(())
}
