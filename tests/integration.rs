use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dispatch_desk::api::rest::router;
use dispatch_desk::auth::memory::InMemoryAuth;
use dispatch_desk::backend::memory::InMemoryStore;
use dispatch_desk::backend::seed::Seed;
use dispatch_desk::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

const SEED: &str = r#"{
    "accounts": [
        { "uid": "u-ana", "email": "ana@example.com", "password": "secret-1" },
        { "uid": "u-root", "email": "root@example.com", "password": "secret-2" }
    ],
    "collections": {
        "users": [
            { "id": "u-ana", "email": "ana@example.com", "role": "Driver" },
            { "id": "u-root", "email": "root@example.com", "role": "Administrator" }
        ],
        "drivers": [
            { "id": "u-ana", "name": "Ana Rojas", "national_id": "11.111.111-1", "license": "A2" }
        ],
        "stores": [
            { "id": "s1", "chain": "Lider", "district": "Maipu", "address": "Av. Pajaritos 1", "link": "", "name": "Cd 429" },
            { "id": "s2", "chain": "Jumbo", "district": "Nunoa", "address": "Irarrazaval 2", "link": "", "name": "Cd 12" }
        ],
        "shifts": [{ "name": "Day" }, { "name": "Night" }],
        "dispatch_records": [
            { "id": "d1", "driver": "Ana Rojas", "status": "Pending", "timestamp": "2025-04-01T09:00:00Z",
              "load_type": "Dry", "store": "Cd 429", "vehicle": "GWCL77", "shift": "Day", "round": "First" },
            { "id": "d2", "driver": "Ana Rojas", "status": "Pending", "timestamp": "2025-04-02T23:30:00Z",
              "load_type": "Frozen", "store": "Cd 12", "vehicle": "GWCL77", "shift": "Night", "round": "Second" },
            { "id": "d3", "driver": "Bo Diaz", "status": "Delivered", "timestamp": "2025-04-02T08:00:00Z",
              "load_type": "Dry", "store": "Cd 429", "vehicle": "HXPT21", "shift": "Day", "round": "First" }
        ]
    }
}"#;

async fn setup() -> Router {
    let store = Arc::new(InMemoryStore::new());
    let auth = Arc::new(InMemoryAuth::new(4));
    Seed::parse(SEED)
        .unwrap()
        .apply(&*store, &auth)
        .await
        .unwrap();
    router(Arc::new(AppState::new(store, auth, 64)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    empty_request("GET", uri)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap()
}

fn ids(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup().await;
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["signed_in"], false);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup().await;
    login(&app, "ana@example.com", "secret-1").await;
    app.clone()
        .oneshot(get_request("/driver/dispatches"))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("list_loads_total"));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = setup().await;
    let response = login(&app, "ana@example.com", "nope-nope").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn driver_list_requires_a_session() {
    let app = setup().await;
    let response = app
        .oneshot(get_request("/driver/dispatches"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_reports_the_session() {
    let app = setup().await;
    let response = login(&app, "ana@example.com", "secret-1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["account"]["uid"], "u-ana");
    assert_eq!(body["user"]["role"], "Driver");
    assert_eq!(body["driver"]["name"], "Ana Rojas");

    let response = app.clone().oneshot(get_request("/auth/session")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/auth/logout"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/auth/session")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn driver_delivers_and_rejects() {
    let app = setup().await;
    login(&app, "ana@example.com", "secret-1").await;

    let response = app
        .clone()
        .oneshot(get_request("/driver/dispatches?segment=pending"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(ids(&body["items"]), vec!["d2", "d1"]);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/driver/dispatches/d1/deliver"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(ids(&body["items"]), vec!["d2"]);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/driver/dispatches/d2/reject",
            json!({ "reason": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/driver/dispatches/d2/reject",
            json!({ "reason": "store closed" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 0);

    let response = app
        .clone()
        .oneshot(get_request("/driver/dispatches?segment=rejected"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["items"][0]["rejection_reason"], "store closed");

    let response = app
        .oneshot(empty_request("POST", "/driver/dispatches/d1/deliver"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn driver_summary_counts_every_record_in_total() {
    let app = setup().await;
    login(&app, "ana@example.com", "secret-1").await;

    let response = app
        .clone()
        .oneshot(get_request("/driver/summary?period=total"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 2);

    let response = app
        .oneshot(get_request("/driver/summary?period=weekly"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["count"], 0);
}

#[tokio::test]
async fn stores_can_be_looked_up_by_name() {
    let app = setup().await;
    login(&app, "ana@example.com", "secret-1").await;

    let response = app
        .oneshot(get_request("/stores?name=Cd%2012"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(ids(&body), vec!["s2"]);
    assert_eq!(body[0]["district"], "Nunoa");
}

#[tokio::test]
async fn drivers_cannot_reach_admin_routes() {
    let app = setup().await;
    login(&app, "ana@example.com", "secret-1").await;

    let response = app
        .oneshot(get_request("/admin/dispatches"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_manages_dispatches() {
    let app = setup().await;
    login(&app, "root@example.com", "secret-2").await;

    let response = app
        .clone()
        .oneshot(get_request("/admin/dispatches"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(ids(&body["items"]), vec!["d2", "d3", "d1"]);

    let response = app
        .clone()
        .oneshot(get_request("/admin/dispatches?date=2025-04-02"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(ids(&body["items"]), vec!["d2", "d3"]);
    assert_eq!(body["filter"]["date"], "2025-04-02");

    let response = app
        .clone()
        .oneshot(get_request("/admin/dispatches?date=02-04-2025"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/dispatches",
            json!({
                "driver": "Ana Rojas",
                "timestamp": "2025-04-02T12:00:00Z",
                "load_type": "Fresh",
                "store": "Cd 12",
                "vehicle": "GWCL77",
                "shift": "Day",
                "round": "Third"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(get_request("/admin/dispatches?date=2025-04-02&shift=Day"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(ids(&body["items"]), vec![created.clone(), "d3".to_string()]);
    assert_eq!(body["items"][0]["status"], "Pending");

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/admin/dispatches/{created}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("DELETE", "/admin/dispatches/filters"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert!(body["filter"]["date"].is_null());
}

#[tokio::test]
async fn admin_create_without_driver_is_rejected() {
    let app = setup().await;
    login(&app, "root@example.com", "secret-2").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/dispatches",
            json!({
                "driver": "",
                "timestamp": "2025-04-02T12:00:00Z",
                "store": "Cd 12"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_dashboard_and_options() {
    let app = setup().await;
    login(&app, "root@example.com", "secret-2").await;

    let response = app
        .clone()
        .oneshot(get_request("/admin/dashboard?view=total"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["counts"]["total"], 3);
    assert_eq!(body["matching"], 3);
    assert_eq!(body["records"][0]["id"], "d2");
    assert_eq!(body["records"][0]["driver_national_id"], "11.111.111-1");

    let response = app.oneshot(get_request("/admin/options")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["drivers"].as_array().unwrap().len(), 1);
    assert_eq!(body["stores"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn dashboard_skips_records_without_a_timestamp() {
    let store = Arc::new(InMemoryStore::new());
    let auth = Arc::new(InMemoryAuth::new(4));
    let mut seed = Seed::parse(SEED).unwrap();
    let undated = json!({ "id": "d4", "driver": "Ana Rojas", "status": "Pending", "store": "Cd 12" });
    seed.collections
        .get_mut("dispatch_records")
        .unwrap()
        .push(undated.as_object().unwrap().clone());
    seed.apply(&*store, &auth).await.unwrap();
    let app = router(Arc::new(AppState::new(store, auth, 64)));
    login(&app, "root@example.com", "secret-2").await;

    let response = app
        .oneshot(get_request("/admin/dashboard"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["counts"]["total"], 3);
    assert!(!ids(&body["records"]).contains(&"d4".to_string()));
}

#[tokio::test]
async fn admin_registers_a_driver() {
    let app = setup().await;
    login(&app, "root@example.com", "secret-2").await;

    let response = app.clone().oneshot(get_request("/admin/options")).await.unwrap();
    assert_eq!(body_json(response).await["drivers"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/drivers",
            json!({
                "email": "cata@example.com",
                "name": "Cata Soto",
                "national_id": "33.333.333-3",
                "license": "A4"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Cata Soto");

    let response = app.clone().oneshot(get_request("/admin/options")).await.unwrap();
    let body = body_json(response).await;
    let drivers = body["drivers"].as_array().unwrap();
    assert_eq!(drivers.len(), 2);
    assert!(drivers.iter().any(|driver| driver["name"] == "Cata Soto"));

    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/drivers",
            json!({
                "email": "cata@example.com",
                "name": "Cata Soto",
                "national_id": "33.333.333-3",
                "license": "A4"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
