use super::{ApiError, IntegrityFailure};
use crate::auth::{authenticate, TokenVerifier};
use crate::domain::TenantConnectionMap;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use saas_runner::ShutdownSignal;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error};

/// Everything the authentication middleware needs.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub connections: Arc<TenantConnectionMap>,
    pub routing_header: String,
}

impl AuthState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        connections: Arc<TenantConnectionMap>,
        routing_header: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            connections,
            routing_header: routing_header.into(),
        }
    }
}

/// Authenticate the caller and store its [`RequestValues`](crate::domain::RequestValues)
/// in the request extensions. Failures answer 401 without reaching the handler.
pub async fn authenticate_request(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let values = match authenticate(
        req.headers(),
        state.verifier.as_ref(),
        Arc::clone(&state.connections),
        &state.routing_header,
    )
    .await
    {
        Ok(values) => values,
        Err(err) => return ApiError(err).into_response(),
    };

    debug!(
        user_id = %values.user_id,
        tenant_id = %values.tenant_id,
        trace_id = %values.trace_id,
        "request authenticated"
    );
    req.extensions_mut().insert(values);
    next.run(req).await
}

/// Trigger process shutdown when a handler reported an integrity failure.
pub async fn integrity_boundary(
    State(shutdown): State<ShutdownSignal>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if let Some(IntegrityFailure(reason)) = response.extensions().get::<IntegrityFailure>() {
        shutdown.trigger(reason.clone());
    }
    response
}

/// Response for a handler that panicked. Used with `CatchPanicLayer::custom`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(
        panic = %detail,
        backtrace = %std::backtrace::Backtrace::force_capture(),
        "handler panicked"
    );
    ApiError(crate::domain::DomainError::Repository(anyhow::anyhow!(
        "handler panicked"
    )))
    .into_response()
}
