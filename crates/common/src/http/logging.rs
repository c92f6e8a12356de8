use crate::auth::TRACE_ID_HEADER;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{error, info, warn, Instrument, Span};

/// Configuration for HTTP request logging
#[derive(Clone, Debug)]
pub struct HttpLoggingConfig {
    /// Path prefixes that are not logged (e.g. health checks)
    pub ignored_paths: Vec<String>,
}

impl Default for HttpLoggingConfig {
    fn default() -> Self {
        Self {
            ignored_paths: vec!["/health".to_string()],
        }
    }
}

impl HttpLoggingConfig {
    pub fn new(ignored_paths: Vec<String>) -> Self {
        Self { ignored_paths }
    }

    fn should_ignore(&self, path: &str) -> bool {
        self.ignored_paths
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

/// Tower layer that logs one line per HTTP request
#[derive(Clone, Default)]
pub struct HttpLoggingLayer {
    config: HttpLoggingConfig,
}

impl HttpLoggingLayer {
    pub fn new(config: HttpLoggingConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for HttpLoggingLayer {
    type Service = HttpLoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        HttpLoggingService {
            inner: service,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct HttpLoggingService<S> {
    inner: S,
    config: HttpLoggingConfig,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for HttpLoggingService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Error: std::fmt::Display,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let trace_id = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let should_ignore = self.config.should_ignore(&path);
        let start = Instant::now();
        let future = self.inner.call(req);

        let span = Span::current();

        Box::pin(
            async move {
                let result = future.await;

                if should_ignore {
                    return result;
                }

                let duration_ms = start.elapsed().as_millis();
                match &result {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            warn!(
                                method = %method,
                                path = %path,
                                status,
                                duration_ms = %duration_ms,
                                trace_id = %trace_id,
                                "{} {} - {} - {}ms",
                                method,
                                path,
                                status,
                                duration_ms
                            );
                        } else {
                            info!(
                                method = %method,
                                path = %path,
                                status,
                                duration_ms = %duration_ms,
                                trace_id = %trace_id,
                                "{} {} - {} - {}ms",
                                method,
                                path,
                                status,
                                duration_ms
                            );
                        }
                    }
                    Err(e) => {
                        error!(
                            method = %method,
                            path = %path,
                            duration_ms = %duration_ms,
                            error = %e,
                            "{} {} - {}ms - ERROR: {}",
                            method,
                            path,
                            duration_ms,
                            e
                        );
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
