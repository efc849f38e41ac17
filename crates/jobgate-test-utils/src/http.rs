//! In-process HTTP helpers: build requests, drive a [`Router`] with
//! `oneshot`, decode the JSON answer.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use jobgate_config::FeatureSettings;
use jobgate_core::{
    CommandDispatcher, CommandFactory, Credentials, FeatureEndpoint, FeatureRegistrar, RouteTable,
};

/// `Authorization` header value for the given pair.
pub fn basic_auth(user: &str, pass: &str) -> String {
    Credentials::new(user, pass).to_authorization()
}

/// `GET /feature`, optionally with an `Authorization` header.
pub fn list_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(FeatureEndpoint::PATH);
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("valid request")
}

/// `POST /feature` with a JSON body, optionally with an `Authorization`
/// header.
pub fn schedule_request(authorization: Option<&str>, body: &Value) -> Request<Body> {
    schedule_request_raw(authorization, body.to_string())
}

/// `POST /feature` with an arbitrary body.
pub fn schedule_request_raw(authorization: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::post(FeatureEndpoint::PATH).header(CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(body.into()).expect("valid request")
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, or `Value::Null` for an empty body.
    pub body: Value,
}

/// Send `request` through `router` and decode the response.
pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let resp = router.oneshot(request).await.expect("router is infallible");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

/// A router holding only the feature routes for `settings`.
pub fn feature_router(
    settings: Option<&FeatureSettings>,
    factory: Arc<dyn CommandFactory>,
    dispatcher: CommandDispatcher,
) -> Router {
    let mut table = RouteTable::new();
    FeatureRegistrar::new(factory, Arc::new(dispatcher))
        .register(&mut table, settings)
        .expect("feature registration");
    table.into_router()
}
