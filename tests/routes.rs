use std::sync::Arc;

use actix_identity::IdentityMiddleware;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::Utc;
use serde_json::{Value, json};

use leadflow_crm::auth::encode_token;
use leadflow_crm::changes::{ChangePublisher, MemoryChangePublisher};
use leadflow_crm::domain::auth::{AuthenticatedUser, Role};
use leadflow_crm::models::config::ServerConfig;
use leadflow_crm::{routes, session_middleware};

mod common;

const SECRET: &str = "integration-test-secret-0123456789abcdef0123456789abcdef0123456789";

fn server_config() -> ServerConfig {
    ServerConfig {
        domain: "localhost".into(),
        address: "127.0.0.1".into(),
        port: 8080,
        database_url: String::new(),
        db_pool_size: 1,
        db_busy_timeout_ms: 1_000,
        secret: SECRET.into(),
        auth_service_url: "http://auth.local/signin".into(),
        platform_auth_url: "http://platform.local".into(),
        platform_api_key: String::new(),
        platform_initial_balance: "10000.00".into(),
        zmq_changes_pub: "inproc://changes".into(),
        zmq_changes_sub: "inproc://changes".into(),
        zmq_worker_pub: "inproc://worker".into(),
    }
}

fn bearer(role: Role) -> String {
    let user = AuthenticatedUser {
        sub: "1".into(),
        email: "admin@example.com".into(),
        name: "Admin".into(),
        role,
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    format!("Bearer {}", encode_token(&user, SECRET).unwrap())
}

macro_rules! test_app {
    ($test_db:expr, $publisher:expr) => {
        test::init_service(
            App::new()
                .wrap(IdentityMiddleware::default())
                .wrap(session_middleware(&server_config()))
                .configure(routes::configure)
                .app_data(web::Data::new($test_db.repo()))
                .app_data(web::Data::from($publisher.clone() as Arc<dyn ChangePublisher>))
                .app_data(web::Data::new(server_config())),
        )
        .await
    };
}

#[actix_web::test]
async fn test_requests_without_token_are_rejected() {
    let test_db = common::TestDb::new("test_requests_without_token_are_rejected.db");
    let publisher = Arc::new(MemoryChangePublisher::new());
    let app = test_app!(test_db, publisher);

    let req = test::TestRequest::get().uri("/api/v1/leads").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["login_url"], "http://auth.local/signin");
}

#[actix_web::test]
async fn test_session_reports_role_features() {
    let test_db = common::TestDb::new("test_session_reports_role_features.db");
    let publisher = Arc::new(MemoryChangePublisher::new());
    let app = test_app!(test_db, publisher);

    let req = test::TestRequest::get()
        .uri("/api/v1/session")
        .insert_header((header::AUTHORIZATION, bearer(Role::Compliance)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["email"], "admin@example.com");
    assert_eq!(body["role"], "compliance");
    assert!(
        body["features"]
            .as_array()
            .unwrap()
            .contains(&json!("kyc"))
    );
}

#[actix_web::test]
async fn test_admin_lists_empty_leads() {
    let test_db = common::TestDb::new("test_admin_lists_empty_leads.db");
    let publisher = Arc::new(MemoryChangePublisher::new());
    let app = test_app!(test_db, publisher);

    let req = test::TestRequest::get()
        .uri("/api/v1/leads?page=3")
        .insert_header((header::AUTHORIZATION, bearer(Role::Admin)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total"], 0);
    assert_eq!(body["leads"], json!([]));
}

#[actix_web::test]
async fn test_agent_cannot_create_users() {
    let test_db = common::TestDb::new("test_agent_cannot_create_users.db");
    let publisher = Arc::new(MemoryChangePublisher::new());
    let app = test_app!(test_db, publisher);

    let req = test::TestRequest::post()
        .uri("/api/v1/team/users")
        .insert_header((header::AUTHORIZATION, bearer(Role::Conversion)))
        .set_json(json!({
            "email": "new@example.com",
            "real_name": "New Agent",
            "role": "retention",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(publisher.topics().is_empty());
}

#[actix_web::test]
async fn test_missing_notification_is_not_found() {
    let test_db = common::TestDb::new("test_missing_notification_is_not_found.db");
    let publisher = Arc::new(MemoryChangePublisher::new());
    let app = test_app!(test_db, publisher);

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications/42/read")
        .insert_header((header::AUTHORIZATION, bearer(Role::Admin)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
