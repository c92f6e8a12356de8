use super::ApiError;
use crate::domain::{DomainError, RequestValues};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

/// Request values are placed in the request extensions by the
/// authentication middleware. A handler that asks for them on a route
/// without that middleware is a wiring bug, reported as an integrity failure.
impl<S> FromRequestParts<S> for RequestValues
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestValues>()
            .cloned()
            .ok_or_else(|| ApiError(DomainError::missing_request_values()))
    }
}

/// JSON body whose decoding failures are reported as validation errors.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError(DomainError::validation("body", rejection.body_text())))?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    async fn echo(JsonBody(payload): JsonBody<Payload>) -> String {
        payload.name
    }

    async fn whoami(values: RequestValues) -> String {
        values.user_id
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = Router::new().route("/", post(echo));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"name\":"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["fields"][0]["field"], "body");
    }

    #[tokio::test]
    async fn test_valid_json_reaches_handler() {
        let app = Router::new().route("/", post(echo));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"acme"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"acme");
    }

    #[tokio::test]
    async fn test_missing_request_values_is_integrity_failure() {
        let app = Router::new().route("/", get(whoami));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<crate::http::IntegrityFailure>().is_some());
    }

    #[tokio::test]
    async fn test_request_values_from_extensions() {
        let app = Router::new().route("/", get(whoami));

        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(RequestValues {
            user_id: "user-1".to_string(),
            ..Default::default()
        });

        let response = app.oneshot(request).await.unwrap().into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"user-1");
    }
}
