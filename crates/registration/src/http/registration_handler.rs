use crate::{NewTenant, TenantRegistrar};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use common::domain::{DomainError, RequestValues};
use common::http::{authenticate_request, ApiError, AuthState, JsonBody};
use saas_runner::ShutdownSignal;
use std::sync::Arc;
use tracing::{error, info, Instrument, Span};

#[derive(Clone)]
pub struct RegistrationState {
    pub registrar: Arc<dyn TenantRegistrar>,
    pub shutdown: ShutdownSignal,
}

/// `POST /registration/register`
///
/// Validates the request and answers right away; provisioning continues in
/// the background.
pub async fn register_tenant(
    State(state): State<RegistrationState>,
    values: RequestValues,
    JsonBody(tenant): JsonBody<NewTenant>,
) -> Result<Json<serde_json::Value>, ApiError> {
    tenant.validate_request()?;
    info!(tenant_id = %tenant.id, plan = %tenant.plan, "registration accepted");

    let registrar = Arc::clone(&state.registrar);
    let shutdown = state.shutdown.clone();
    tokio::spawn(
        async move {
            match registrar.create_registration(values, tenant).await {
                Ok(()) => {}
                Err(DomainError::Shutdown(reason)) => shutdown.trigger(reason),
                Err(e) => error!(error = %e, "tenant registration failed"),
            }
        }
        .instrument(Span::current()),
    );

    Ok(Json(serde_json::json!({})))
}

/// Routes of the registration module. Every route requires authentication.
pub fn registration_routes(state: RegistrationState, auth: AuthState) -> Router {
    Router::new()
        .route("/registration/register", post(register_tenant))
        .route_layer(axum::middleware::from_fn_with_state(auth, authenticate_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTenantRegistrar;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{header, StatusCode};
    use common::auth::{MockTokenVerifier, VerifiedClaims};
    use common::domain::TenantConnectionMap;
    use std::time::Duration;
    use tower::ServiceExt;

    const BODY: &str = r#"{"id":"t-1","email":"owner@acme.io","firstName":"Ada","lastName":"Lovelace","companyName":"Acme","plan":"premium"}"#;

    fn auth() -> AuthState {
        let mut verifier = MockTokenVerifier::new();
        verifier.expect_verify().returning(|_| {
            Ok(VerifiedClaims {
                sub: "admin-1".to_string(),
                tenant_id: Some("admin-tenant".to_string()),
                client_id: None,
                token_use: Some("id".to_string()),
            })
        });
        AuthState::new(
            Arc::new(verifier),
            Arc::new(TenantConnectionMap::default()),
            "BasePath",
        )
    }

    fn router(registrar: MockTenantRegistrar, shutdown: ShutdownSignal) -> Router {
        registration_routes(
            RegistrationState {
                registrar: Arc::new(registrar),
                shutdown,
            },
            auth(),
        )
    }

    fn post_register(body: &str, authorized: bool) -> Request {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/registration/register")
            .header(header::CONTENT_TYPE, "application/json");
        if authorized {
            builder = builder.header(header::AUTHORIZATION, "Bearer token");
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_registration_is_accepted_and_runs() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut registrar = MockTenantRegistrar::new();
        registrar
            .expect_create_registration()
            .withf(|values: &RequestValues, tenant: &NewTenant| {
                values.user_id == "admin-1" && tenant.company_name == "Acme"
            })
            .times(1)
            .return_once(move |_, _| {
                let _ = tx.send(());
                Ok(())
            });

        let response = router(registrar, ShutdownSignal::new())
            .oneshot(post_register(BODY, true))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"{}");
        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_registration_is_bad_request() {
        let mut registrar = MockTenantRegistrar::new();
        registrar.expect_create_registration().times(0);

        let body = BODY.replace("owner@acme.io", "nope").replace("premium", "gold");
        let response = router(registrar, ShutdownSignal::new())
            .oneshot(post_register(&body, true))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["fields"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let mut registrar = MockTenantRegistrar::new();
        registrar.expect_create_registration().times(0);

        let response = router(registrar, ShutdownSignal::new())
            .oneshot(post_register("{\"id\":", true))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unauthenticated_registration_is_rejected() {
        let mut registrar = MockTenantRegistrar::new();
        registrar.expect_create_registration().times(0);

        let response = router(registrar, ShutdownSignal::new())
            .oneshot(post_register(BODY, false))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_background_integrity_failure_triggers_shutdown() {
        let mut registrar = MockTenantRegistrar::new();
        registrar
            .expect_create_registration()
            .times(1)
            .return_once(|_, _| Err(DomainError::missing_request_values()));
        let shutdown = ShutdownSignal::new();

        let response = router(registrar, shutdown.clone())
            .oneshot(post_register(BODY, true))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::timeout(Duration::from_secs(5), shutdown.triggered())
            .await
            .unwrap();
    }
}
