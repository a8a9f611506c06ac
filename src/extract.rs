//! Request extractors whose rejections render through [`ApiError`], so a
//! malformed body, path or query answers 400 with a `{"message"}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Window {
        from: u32,
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn bad_json_is_a_validation_error() {
        let err = ApiJson::<Window>::from_request(json_request(r#"{"from":"soon"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiJson::<Window>::from_request(json_request("not json"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let ApiJson(w) = ApiJson::<Window>::from_request(json_request(r#"{"from":3}"#), &())
            .await
            .unwrap();
        assert_eq!(w.from, 3);
    }

    #[tokio::test]
    async fn bad_query_is_a_validation_error() {
        let (mut parts, _) = Request::builder()
            .uri("/?from=later")
            .body(())
            .unwrap()
            .into_parts();
        let err = ApiQuery::<Window>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
