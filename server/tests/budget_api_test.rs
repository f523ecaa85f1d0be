//! Integration tests for the budget API.
//!
//! Tests in `routing_tests` never reach the database and run anywhere.
//! Tests in `database_tests` need PostgreSQL: set DATABASE_URL to run them,
//! otherwise they return early.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use budgetbox_server::{app, config::Config, db, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const UNREACHABLE_DB: &str = "postgres://budgetbox@127.0.0.1:1/budgetbox_test";

fn config(database_url: &str, auth_secret: Option<&str>) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: database_url.to_string(),
        auth_secret: auth_secret.map(str::to_string),
    }
}

/// A router whose pool would only connect on first query.
fn offline_app(auth_secret: Option<&str>) -> Router {
    let pool = db::create_lazy_pool(UNREACHABLE_DB).unwrap();
    app(AppState::new(pool, config(UNREACHABLE_DB, auth_secret)))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn budget_body(user_id: &str, bills: f64) -> Value {
    json!({
        "userId": user_id,
        "income": 50000.0,
        "bills": bills,
        "food": 0.0,
        "transport": 0.0,
        "subscriptions": 0.0,
        "miscellaneous": 0.0
    })
}

mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok_without_database() {
        let (status, body) =
            send_json(offline_app(None), request(Method::GET, "/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["authRequired"], false);
        assert_eq!(body["dbConnections"], 0);
    }

    #[tokio::test]
    async fn root_names_the_server() {
        let (status, body) = send(offline_app(None), request(Method::GET, "/", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"BudgetBox Server");
    }

    #[tokio::test]
    async fn missing_token_is_rejected_when_auth_required() {
        let app = offline_app(Some("secret"));
        let (status, body) = send_json(
            app,
            request(Method::GET, "/budgets?userId=user-1", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["details"], "Missing authorization header");
    }

    #[tokio::test]
    async fn malformed_authorization_header_is_rejected() {
        let req = Request::builder()
            .uri("/budgets?userId=user-1")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(offline_app(None), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reading_another_users_budget_is_forbidden() {
        let (status, body) = send_json(
            offline_app(Some("secret")),
            request(Method::GET, "/budgets?userId=user-2", Some("user-1"), None),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn writing_another_users_budget_is_forbidden() {
        let (status, _) = send(
            offline_app(None),
            request(
                Method::POST,
                "/budgets",
                Some("user-1"),
                Some(budget_body("user-2", 1.0)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            offline_app(None),
            request(
                Method::PUT,
                "/budgets/some-id",
                Some("user-1"),
                Some(budget_body("user-2", 1.0)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn lookup_requires_user_id() {
        let (status, _) = send(offline_app(None), request(Method::GET, "/budgets", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn incomplete_payload_is_unprocessable() {
        let (status, _) = send(
            offline_app(None),
            request(
                Method::POST,
                "/budgets",
                None,
                Some(json!({"userId": "user-1", "income": 1.0})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn blank_user_is_bad_request() {
        let (status, body) = send_json(
            offline_app(None),
            request(Method::POST, "/budgets", None, Some(budget_body("", 1.0))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "userId must not be empty");
    }
}

mod database_tests {
    use super::*;
    use budgetbox_engine::{
        BudgetField, ConnectivityMonitor, HttpRemote, MemoryStore, RemoteBudget, StaticAuth,
        SyncEngine, SyncStatus, User,
    };
    use std::sync::Arc;
    use std::time::Duration;

    async fn database_app() -> Option<(Router, String)> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping");
            return None;
        };
        let pool = db::create_pool(&url).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let user_id = format!("test-{}", uuid::Uuid::new_v4());
        Some((app(AppState::new(pool, config(&url, None))), user_id))
    }

    #[tokio::test]
    async fn insert_find_update_cycle() {
        let Some((app, user)) = database_app().await else {
            return;
        };
        let lookup = format!("/budgets?userId={}", user);

        let (status, body) =
            send_json(app.clone(), request(Method::GET, &lookup, Some(&user), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (status, body) = send_json(
            app.clone(),
            request(Method::POST, "/budgets", Some(&user), Some(budget_body(&user, 100.0))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: RemoteBudget = serde_json::from_value(body).unwrap();
        assert_eq!(created.version, Some(1));
        assert_eq!(created.bills, 100.0);

        let (status, _) = send(
            app.clone(),
            request(Method::POST, "/budgets", Some(&user), Some(budget_body(&user, 5.0))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send_json(
            app.clone(),
            request(
                Method::PUT,
                &format!("/budgets/{}", created.id),
                Some(&user),
                Some(budget_body(&user, 50.0)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated: RemoteBudget = serde_json::from_value(body).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.bills, 50.0);
        assert_eq!(updated.version, Some(2));

        let (_, body) = send_json(app, request(Method::GET, &lookup, Some(&user), None)).await;
        let found: RemoteBudget = serde_json::from_value(body).unwrap();
        assert_eq!(found, updated);
    }

    #[tokio::test]
    async fn update_of_unknown_budget_is_not_found() {
        let Some((app, user)) = database_app().await else {
            return;
        };
        let (status, _) = send(
            app,
            request(
                Method::PUT,
                "/budgets/does-not-exist",
                Some(&user),
                Some(budget_body(&user, 1.0)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn engine_syncs_through_http() {
        let Some((app, user)) = database_app().await else {
            return;
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let remote = HttpRemote::new(format!("http://{}", addr), Duration::from_secs(5))
            .unwrap()
            .with_token(user.clone());
        let engine = SyncEngine::builder(
            Arc::new(MemoryStore::new()),
            Arc::new(remote),
            Arc::new(StaticAuth::signed_in(User::new(user.clone(), "e2e@example.com"))),
            ConnectivityMonitor::new(true),
        )
        .build();

        engine.load().await;
        engine.update_field(BudgetField::Income, 50000.0).unwrap();
        engine.update_field(BudgetField::Bills, 12000.0).unwrap();
        assert!(engine.sync().await.unwrap().is_synced());

        engine.update_field(BudgetField::Bills, 11000.0).unwrap();
        assert!(engine.sync().await.unwrap().is_synced());

        let record = engine.record();
        assert_eq!(record.sync_status, SyncStatus::Synced);
        assert_eq!(record.budget.version, Some(2));
        assert!(record.budget.remote_id.is_some());
    }
}
