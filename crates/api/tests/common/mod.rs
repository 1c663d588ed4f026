#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tenders_api::config::{ServerConfig, StoreBackend};
use tenders_api::router::build_app_router;
use tenders_api::state::AppState;
use tenders_core::directory::{Employee, Organization, OrganizationType};
use tenders_core::store::InMemoryStore;
use tenders_core::types::{new_id, DbId};
use tenders_core::Procurement;

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store: StoreBackend::Memory,
        store_timeout_secs: 5,
        page_default_limit: 5,
        page_max_limit: 50,
        directory_seed: None,
    }
}

/// A router over a fresh in-memory store with a small directory:
///
/// - `alice` is responsible for `Acme`
/// - `bob` is responsible for `Globex`
/// - `carol` belongs to no organization
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub acme: DbId,
    pub globex: DbId,
    pub alice: DbId,
    pub bob: DbId,
    pub carol: DbId,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

fn employee(store: &InMemoryStore, username: &str) -> DbId {
    let id = new_id();
    store
        .add_employee(Employee {
            id,
            username: username.to_string(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
        })
        .unwrap();
    id
}

fn organization(store: &InMemoryStore, name: &str, responsible: DbId) -> DbId {
    let id = new_id();
    store
        .add_organization(Organization {
            id,
            name: name.to_string(),
            description: None,
            organization_type: OrganizationType::Llc,
            created_at: Utc::now(),
        })
        .unwrap();
    store.assign_responsible(id, responsible).unwrap();
    id
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryStore::new());

    let alice = employee(&store, "alice");
    let bob = employee(&store, "bob");
    let carol = employee(&store, "carol");
    let acme = organization(&store, "Acme", alice);
    let globex = organization(&store, "Globex", bob);

    let procurement = Procurement::new(store.clone(), config.service_settings());
    let state = AppState { procurement };
    let router = build_app_router(state, &config).unwrap();

    TestApp {
        router,
        store,
        acme,
        globex,
        alice,
        bob,
        carol,
    }
}

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn put(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::PUT, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a tender as `username` for `organization_id` and return its JSON.
pub async fn create_tender(
    app: &TestApp,
    organization_id: DbId,
    username: &str,
    name: &str,
    service_type: &str,
) -> serde_json::Value {
    let response = post_json(
        app.app(),
        "/api/tenders/new",
        serde_json::json!({
            "name": name,
            "description": "Tender description",
            "serviceType": service_type,
            "organizationId": organization_id,
            "creatorUsername": username,
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}

/// Create and publish a tender owned by alice's `Acme`.
pub async fn published_tender(app: &TestApp) -> serde_json::Value {
    let tender = create_tender(app, app.acme, "alice", "Road works", "Construction").await;
    let id = tender["id"].as_str().unwrap().to_string();
    let response = put(
        app.app(),
        &format!("/api/tenders/{id}/status?status=Published&username=alice"),
    )
    .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["data"].clone()
}

/// Create a bid on `tender_id` as the user `username` (author type `User`).
pub async fn create_user_bid(
    app: &TestApp,
    tender_id: &str,
    username: &str,
    author_id: DbId,
) -> serde_json::Value {
    let response = post_json(
        app.app(),
        "/api/bids/new",
        serde_json::json!({
            "name": format!("Offer from {username}"),
            "description": "We can do it",
            "tenderId": tender_id,
            "authorType": "User",
            "authorId": author_id,
            "creatorUsername": username,
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}
