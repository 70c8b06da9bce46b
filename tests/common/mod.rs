#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{http::header, test, web, App};
use serde_json::{json, Value};
use std::collections::HashMap;
use taskdesk::auth::AuthMiddleware;
use taskdesk::routes::{self, health};
use taskdesk::{AppState, Config};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_INVITE: &str = "bootstrap-admin-secret";
pub const PASSWORD: &str = "Password123!";

pub fn test_config() -> Config {
    let values = HashMap::from([
        ("JWT_SECRET", JWT_SECRET),
        ("ADMIN_INVITE_TOKEN", ADMIN_INVITE),
        ("BCRYPT_COST", "4"),
    ]);
    Config::from_lookup(|key| values.get(key).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

/// The production app wiring over a fresh in-memory store.
pub async fn init_app() -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let state = AppState::in_memory(&test_config());
    let tokens = state.tokens.clone();

    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens))
                    .configure(routes::config),
            ),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

// Helper struct to hold auth details
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Registers and logs in a user; `admin` supplies the bootstrap secret.
pub async fn register_and_login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
    admin: bool,
) -> TestUser {
    let mut payload = json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
    });
    if admin {
        payload["adminToken"] = json!(ADMIN_INVITE);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration of {} failed. Body: {}",
        email,
        String::from_utf8_lossy(&body)
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    let data = &body["data"];

    TestUser {
        id: data["user"]["id"]
            .as_str()
            .and_then(|id| id.parse().ok())
            .expect("login returns the user id"),
        name: name.to_string(),
        email: email.to_string(),
        token: data["token"]
            .as_str()
            .expect("login returns a token")
            .to_string(),
    }
}

/// Creates a task as `admin` and returns the task view from the response.
pub async fn create_task(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    admin: &TestUser,
    payload: Value,
) -> Value {
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header(bearer(&admin.token))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Create task failed. Body: {}",
        body
    );
    body["data"]["task"].clone()
}

/// Sends a request and returns the status together with the parsed envelope.
pub async fn send(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    req: test::TestRequest,
) -> (actix_web::http::StatusCode, Value) {
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
