//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the production router (same middleware stack as `main.rs`) on
//! a test database pool, with in-memory directory stubs standing in for
//! the resident and region services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use civica_api::auth::jwt::{generate_access_token, JwtConfig};
use civica_api::clients::{
    RegionDirectory, RegionSummary, ResidentDirectory, ResidentRecord, ResidentSummary,
};
use civica_api::config::ServerConfig;
use civica_api::router::build_app_router;
use civica_api::state::AppState;
use civica_core::types::DbId;

/// Signing secret used by every test token.
const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        resident_service_url: "http://localhost:8001".to_string(),
        region_service_url: "http://localhost:8002".to_string(),
    }
}

/// In-memory resident directory stub keyed by resident id.
#[derive(Default)]
pub struct StubResidentDirectory {
    residents: HashMap<DbId, Value>,
}

impl StubResidentDirectory {
    pub fn with_residents(records: Vec<Value>) -> Self {
        let residents = records
            .into_iter()
            .filter_map(|record| {
                let id = record.get("id").and_then(Value::as_i64)?;
                Some((id, record))
            })
            .collect();
        Self { residents }
    }

    fn summary(&self, id: DbId, record: &Value) -> ResidentSummary {
        ResidentSummary {
            id,
            name: record
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            region_id: record.get("region_id").and_then(Value::as_i64),
            region_name: record
                .pointer("/region/name")
                .and_then(Value::as_str)
                .map(String::from),
        }
    }
}

#[async_trait]
impl ResidentDirectory for StubResidentDirectory {
    async fn find_by_id(&self, id: DbId) -> Option<ResidentRecord> {
        let record = self.residents.get(&id)?.clone();
        let summary = self.summary(id, &record);
        Some(ResidentRecord { summary, record })
    }

    async fn find_by_ids(&self, ids: &[DbId]) -> HashMap<DbId, ResidentSummary> {
        ids.iter()
            .filter_map(|&id| {
                self.residents
                    .get(&id)
                    .map(|record| (id, self.summary(id, record)))
            })
            .collect()
    }
}

/// In-memory region directory stub keyed by region id.
#[derive(Default)]
pub struct StubRegionDirectory {
    regions: HashMap<DbId, String>,
}

impl StubRegionDirectory {
    pub fn with_regions(regions: Vec<(DbId, &str)>) -> Self {
        Self {
            regions: regions
                .into_iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl RegionDirectory for StubRegionDirectory {
    async fn find_by_ids(&self, ids: &[DbId]) -> HashMap<DbId, RegionSummary> {
        ids.iter()
            .filter_map(|&id| {
                self.regions
                    .get(&id)
                    .map(|name| (id, RegionSummary { id, name: name.clone() }))
            })
            .collect()
    }
}

/// Build the application router with empty directory stubs.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_directories(
        pool,
        StubResidentDirectory::default(),
        StubRegionDirectory::default(),
    )
}

/// Build the application router with the given directory stubs.
pub fn build_test_app_with_directories(
    pool: PgPool,
    residents: StubResidentDirectory,
    regions: StubRegionDirectory,
) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        residents: Arc::new(residents),
        regions: Arc::new(regions),
    };
    build_app_router(state, &config)
}

/// A bearer token for a staff user.
pub fn staff_token(user_id: DbId) -> String {
    generate_access_token(user_id, "staff", &test_config().jwt).unwrap()
}

/// A bearer token for an authenticated non-staff user.
pub fn resident_token(user_id: DbId) -> String {
    generate_access_token(user_id, "resident", &test_config().jwt).unwrap()
}

fn apply_token(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Send a GET request, optionally authenticated.
pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let request = apply_token(Request::builder().method("GET").uri(uri), token)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body, optionally authenticated.
pub async fn post_json(app: Router, uri: &str, body: Value, token: Option<&str>) -> Response<Body> {
    let request = apply_token(Request::builder().method("POST").uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a PUT request with a JSON body, optionally authenticated.
pub async fn put_json(app: Router, uri: &str, body: Value, token: Option<&str>) -> Response<Body> {
    let request = apply_token(Request::builder().method("PUT").uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a DELETE request, optionally authenticated.
pub async fn delete(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let request = apply_token(Request::builder().method("DELETE").uri(uri), token)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
