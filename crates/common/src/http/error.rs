use crate::domain::{AuthError, DomainError, FieldError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error, warn};

/// Marker attached to responses produced from an integrity failure.
/// The boundary middleware turns it into a process shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityFailure(pub String);

/// JSON error body: `{"error": "...", "fields": [{"field": "...", "error": "..."}]}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// Domain error on its way out of an HTTP handler
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(DomainError::Unauthorized(err))
    }
}

/// Status code for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::AlreadyExists(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) | DomainError::NoTenant => StatusCode::UNAUTHORIZED,
        DomainError::ConnectionFailed(_)
        | DomainError::Shutdown(_)
        | DomainError::IdentityProvider(_)
        | DomainError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

const INTERNAL_ERROR: &str = "internal server error";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);

        let body = match &self.0 {
            DomainError::Validation(fields) => {
                debug!(error = %self.0, "request rejected");
                ErrorBody {
                    error: "validation failed".to_string(),
                    fields: fields.clone(),
                }
            }
            DomainError::NotFound(_) | DomainError::AlreadyExists(_) => ErrorBody {
                error: self.0.to_string(),
                fields: Vec::new(),
            },
            DomainError::Unauthorized(_) | DomainError::NoTenant => {
                warn!(error = %self.0, "unauthorized request");
                ErrorBody {
                    error: self.0.to_string(),
                    fields: Vec::new(),
                }
            }
            DomainError::ConnectionFailed(err) => {
                error!(error = ?err, "storage connection failed");
                ErrorBody {
                    error: INTERNAL_ERROR.to_string(),
                    fields: Vec::new(),
                }
            }
            DomainError::Shutdown(reason) => {
                error!(reason = %reason, "integrity failure while serving request");
                let mut response = (
                    status,
                    Json(ErrorBody {
                        error: INTERNAL_ERROR.to_string(),
                        fields: Vec::new(),
                    }),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(IntegrityFailure(reason.clone()));
                return response;
            }
            DomainError::IdentityProvider(_) | DomainError::Repository(_) => {
                error!(error = %self.0, "unexpected error while serving request");
                ErrorBody {
                    error: INTERNAL_ERROR.to_string(),
                    fields: Vec::new(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DomainError::validation("email", "bad"), StatusCode::BAD_REQUEST),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (AuthError::MissingTenantId.into(), StatusCode::UNAUTHORIZED),
            (DomainError::NoTenant, StatusCode::UNAUTHORIZED),
            (
                DomainError::ConnectionFailed(anyhow!("refused")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (DomainError::Shutdown("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::Repository(anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(status_for(&error), expected, "{error}");
        }
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let response = ApiError(DomainError::Validation(vec![
            FieldError::new("email", "not a valid email address"),
            FieldError::new("plan", "must be one of basic, premium"),
        ]))
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation failed");
        assert_eq!(body["fields"][0]["field"], "email");
        assert_eq!(body["fields"][1]["error"], "must be one of basic, premium");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = ApiError(DomainError::Repository(anyhow!("password=hunter2"))).into_response();

        let body = body_json(response).await;
        assert_eq!(body["error"], INTERNAL_ERROR);
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn test_shutdown_marks_response() {
        let response = ApiError(DomainError::missing_request_values()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<IntegrityFailure>(),
            Some(&IntegrityFailure("request values missing from context".to_string()))
        );
    }

    #[test]
    fn test_ordinary_errors_are_not_integrity_failures() {
        let response = ApiError(DomainError::NotFound("project p-1".into())).into_response();
        assert!(response.extensions().get::<IntegrityFailure>().is_none());
    }
}
