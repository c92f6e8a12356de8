use super::{TokenVerifier, VerifiedClaims};
use crate::domain::{AuthError, DomainResult, RequestValues, TenantConnectionMap};
use http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

/// Correlation id header shared with the web clients.
pub const TRACE_ID_HEADER: &str = "TraceID";

/// Extract the token from `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidAuthorizationHeader)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(token.to_string())
        }
        _ => Err(AuthError::InvalidAuthorizationHeader),
    }
}

/// Trace id sent by the caller, or a fresh one.
pub fn trace_id_from(headers: &HeaderMap) -> String {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| xid::new().to_string())
}

/// Pick the tenant a request acts on.
///
/// Only machine clients may switch tenants: for them a routing key that maps
/// to a known tenant wins over the token's tenant claim. End-user tokens stay
/// on the tenant they carry, whatever the routing header says.
pub fn resolve_tenant(
    claims: &VerifiedClaims,
    headers: &HeaderMap,
    connections: &TenantConnectionMap,
    routing_header: &str,
) -> Result<String, AuthError> {
    let routing_key = headers.get(routing_header).and_then(|v| v.to_str().ok());

    if claims.is_machine_client() {
        if let Some(route) = routing_key.and_then(|key| connections.get(key)) {
            debug!(tenant_id = %route.tenant_id, "tenant resolved from routing key");
            return Ok(route.tenant_id.clone());
        }
    } else if let Some(key) = routing_key {
        debug!(routing_key = %key, "ignoring routing key on end-user token");
    }

    claims
        .tenant()
        .map(str::to_string)
        .ok_or(AuthError::MissingTenantId)
}

/// Build the request values of an authenticated request.
pub async fn authenticate(
    headers: &HeaderMap,
    verifier: &dyn TokenVerifier,
    connections: Arc<TenantConnectionMap>,
    routing_header: &str,
) -> DomainResult<RequestValues> {
    let trace_id = trace_id_from(headers);
    let token = extract_bearer_token(headers)?;
    let claims = verifier.verify(&token).await?;
    let tenant_id = resolve_tenant(&claims, headers, &connections, routing_header)?;

    Ok(RequestValues {
        is_machine_client: claims.is_machine_client(),
        user_id: claims.sub,
        tenant_id,
        trace_id,
        token,
        tenant_connection_map: connections,
    })
}
