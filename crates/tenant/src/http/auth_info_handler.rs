use crate::AuthInfoService;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::get;
use axum::{Json, Router};
use common::domain::AuthInfoAndRegion;
use common::http::ApiError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthInfoState {
    pub service: Arc<AuthInfoService>,
}

/// `GET /tenants/auth-info`
///
/// Called by the login page before any token exists, so the route is not
/// authenticated. The `Referer` names the tenant path.
pub async fn get_auth_info(
    State(state): State<AuthInfoState>,
    headers: HeaderMap,
) -> Result<Json<AuthInfoAndRegion>, ApiError> {
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let info = state.service.get_info(referer).await?;
    Ok(Json(info))
}

pub fn auth_info_routes(state: AuthInfoState) -> Router {
    Router::new()
        .route("/tenants/auth-info", get(get_auth_info))
        .with_state(state)
}
