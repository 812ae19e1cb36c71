//! Extractors whose rejections go through `AppError`, so malformed bodies,
//! path ids and query strings get the usual 400 JSON envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::IntoResponse,
        routing::post,
        Router,
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Window {
        #[allow(dead_code)]
        start: chrono::DateTime<chrono::Utc>,
    }

    async fn accept(AppPath(_id): AppPath<Uuid>, AppJson(_body): AppJson<Window>) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    async fn call(uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/windows/:id", post(accept));
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap().into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_well_formed_request_passes() {
        let uri = format!("/windows/{}", Uuid::new_v4());
        let (status, _) = call(&uri, r#"{"start":"2024-01-10T09:00:00Z"}"#).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_bad_request_envelope() {
        let uri = format!("/windows/{}", Uuid::new_v4());
        let (status, body) = call(&uri, r#"{"start":"2024-01-10 09:00"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
        assert!(body["error"]["message"].as_str().unwrap().contains("start"));
    }

    #[tokio::test]
    async fn test_bad_path_id_is_bad_request_envelope() {
        let (status, body) = call("/windows/not-a-uuid", r#"{"start":"2024-01-10T09:00:00Z"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
    }
}
