//! HTTP client for integration testing.
//!
//! Drives the router in-process via `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

/// Result of one request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

pub struct HttpClient {
    router: Router,
}

/// Credential attached to a request.
#[derive(Debug, Clone, Copy)]
pub enum As<'a> {
    Anonymous,
    Session(&'a str),
    ApiKey { app: &'a str, secret: &'a str },
}

impl HttpClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub async fn get(&self, path: &str, caller: As<'_>) -> TestResponse {
        self.send(Method::GET, path, caller).await
    }

    pub async fn put(&self, path: &str, caller: As<'_>) -> TestResponse {
        self.send(Method::PUT, path, caller).await
    }

    pub async fn send(&self, method: Method, path: &str, caller: As<'_>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        builder = match caller {
            As::Anonymous => builder,
            As::Session(token) => builder.header("authorization", format!("Bearer {}", token)),
            As::ApiKey { app, secret } => builder
                .header("x-api-app", app)
                .header("x-api-key", secret),
        };
        let request = builder.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
