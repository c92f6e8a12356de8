use crate::{Project, ProjectService};
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use common::domain::RequestValues;
use common::http::{authenticate_request, ApiError, AuthState};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProjectState {
    pub service: Arc<ProjectService>,
}

/// `GET /projects`
pub async fn list_projects(
    State(state): State<ProjectState>,
    values: RequestValues,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.service.list_projects(&values).await?;
    Ok(Json(projects))
}

/// `GET /projects/{id}`
///
/// A project of another tenant is invisible to the tenant connection and
/// answers 404 like a missing one.
pub async fn get_project(
    State(state): State<ProjectState>,
    values: RequestValues,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let project = state.service.get_project(&values, &project_id).await?;
    Ok(Json(project))
}

pub fn project_routes(state: ProjectState, auth: AuthState) -> Router {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/{id}", get(get_project))
        .route_layer(axum::middleware::from_fn_with_state(auth, authenticate_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProjectRepository;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::{header, StatusCode};
    use chrono::Utc;
    use common::auth::{MockTokenVerifier, VerifiedClaims};
    use common::domain::{TenantConnectionMap, TenantRoute};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn user_claims() -> VerifiedClaims {
        VerifiedClaims {
            sub: "user-1".to_string(),
            tenant_id: Some("t-1".to_string()),
            client_id: None,
            token_use: Some("id".to_string()),
        }
    }

    fn machine_claims() -> VerifiedClaims {
        VerifiedClaims {
            sub: "reporting-client".to_string(),
            tenant_id: None,
            client_id: Some("reporting-client".to_string()),
            token_use: Some("access".to_string()),
        }
    }

    fn auth(claims: VerifiedClaims) -> AuthState {
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(move |_| Ok(claims.clone()));

        let mut routes = HashMap::new();
        routes.insert(
            "globex".to_string(),
            TenantRoute {
                tenant_id: "t-2".to_string(),
                company_name: None,
                plan: None,
                path: None,
            },
        );

        AuthState::new(
            Arc::new(verifier),
            Arc::new(TenantConnectionMap::new(routes)),
            "BasePath",
        )
    }

    fn router_as(repository: MockProjectRepository, claims: VerifiedClaims) -> Router {
        project_routes(
            ProjectState {
                service: Arc::new(ProjectService::new(Arc::new(repository))),
            },
            auth(claims),
        )
    }

    fn router(repository: MockProjectRepository) -> Router {
        router_as(repository, user_claims())
    }

    fn get_request(uri: &str, routing_key: Option<&str>) -> Request {
        let mut builder = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer token");
        if let Some(key) = routing_key {
            builder = builder.header("BasePath", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn project(tenant_id: &str) -> Project {
        let now = Utc::now();
        Project {
            project_id: "p-1".to_string(),
            tenant_id: tenant_id.to_string(),
            name: "Roadmap".to_string(),
            prefix: "RM".to_string(),
            description: String::new(),
            team_id: String::new(),
            user_id: "user-1".to_string(),
            active: true,
            public: false,
            column_order: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_uses_token_tenant() {
        let mut repository = MockProjectRepository::new();
        repository
            .expect_list_projects()
            .withf(|values: &RequestValues| values.tenant_id == "t-1" && values.user_id == "user-1")
            .times(1)
            .return_once(|_| Ok(vec![project("t-1")]));

        let response = router(repository)
            .oneshot(get_request("/projects", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body[0]["projectId"], "p-1");
        assert_eq!(body[0]["tenantId"], "t-1");
    }

    #[tokio::test]
    async fn test_routing_key_scopes_machine_client_to_mapped_tenant() {
        let mut repository = MockProjectRepository::new();
        repository
            .expect_list_projects()
            .withf(|values: &RequestValues| {
                values.tenant_id == "t-2"
                    && values.user_id == "reporting-client"
                    && values.is_machine_client
            })
            .times(1)
            .return_once(|_| Ok(vec![project("t-2")]));

        let response = router_as(repository, machine_claims())
            .oneshot(get_request("/projects", Some("globex")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_routing_key_cannot_move_end_user_to_other_tenant() {
        let mut repository = MockProjectRepository::new();
        repository
            .expect_list_projects()
            .withf(|values: &RequestValues| values.tenant_id == "t-1" && values.user_id == "user-1")
            .times(1)
            .return_once(|_| Ok(vec![project("t-1")]));

        let response = router(repository)
            .oneshot(get_request("/projects", Some("globex")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body[0]["tenantId"], "t-1");
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let mut repository = MockProjectRepository::new();
        repository
            .expect_get_project()
            .withf(|_, project_id: &str| project_id == "p-404")
            .times(1)
            .return_once(|_, _| Ok(None));

        let response = router(repository)
            .oneshot(get_request("/projects/p-404", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_token_never_reaches_storage() {
        let mut repository = MockProjectRepository::new();
        repository.expect_list_projects().times(0);

        let response = router(repository)
            .oneshot(Request::builder().uri("/projects").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
