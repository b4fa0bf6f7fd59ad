use actix_web::{
    http::{header, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use chrono::Utc;
use loyalty_engine::{db_types::User, helpers::hash_password, traits::StorageError, AuthApi};
use lps_common::Secret;
use serde_json::json;

use super::{
    helpers::{send_request, TEST_SIGNATURE_KEY},
    mocks::MockLoyaltyStore,
};
use crate::routes;

fn stored_user(id: i64, name: &str, password: &str) -> User {
    User {
        id,
        name: name.to_string(),
        password_hash: hash_password(password, TEST_SIGNATURE_KEY),
        created_at: Utc::now(),
    }
}

fn auth_routes(cfg: &mut ServiceConfig, store: MockLoyaltyStore) {
    let api = AuthApi::new(store, Secret::new(TEST_SIGNATURE_KEY.to_string()));
    cfg.app_data(web::Data::new(api))
        .route("/api/user/register", web::post().to(routes::register::<MockLoyaltyStore>))
        .route("/api/user/login", web::post().to(routes::login::<MockLoyaltyStore>));
}

fn configure_register_ok(cfg: &mut ServiceConfig) {
    let mut store = MockLoyaltyStore::new();
    store.expect_create_user().returning(|u| {
        Ok(User { id: 1, name: u.name, password_hash: u.password_hash, created_at: Utc::now() })
    });
    auth_routes(cfg, store);
}

fn configure_register_taken(cfg: &mut ServiceConfig) {
    let mut store = MockLoyaltyStore::new();
    store.expect_create_user().returning(|_| Err(StorageError::AlreadyExists));
    auth_routes(cfg, store);
}

fn configure_login(cfg: &mut ServiceConfig) {
    let mut store = MockLoyaltyStore::new();
    store.expect_fetch_user_by_name().returning(|name| match name {
        "Vasia" => Ok(stored_user(1, "Vasia", "12345")),
        _ => Err(StorageError::NotFound),
    });
    auth_routes(cfg, store);
}

#[actix_web::test]
async fn register_sets_the_jwt_cookie() {
    let _ = env_logger::try_init();
    let req = TestRequest::post()
        .uri("/api/user/register")
        .set_json(json!({"login": "Vasia", "password": "12345"}));
    let (status, headers, _) = send_request(req, configure_register_ok).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers.get(header::SET_COOKIE).expect("No jwt cookie was set").to_str().unwrap();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
}

#[actix_web::test]
async fn register_rejects_a_taken_name() {
    let req = TestRequest::post()
        .uri("/api/user/register")
        .set_json(json!({"login": "Vasia", "password": "12345"}));
    let (status, headers, _) = send_request(req, configure_register_taken).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[actix_web::test]
async fn register_rejects_empty_fields() {
    for body in [json!({"login": "", "password": "12345"}), json!({"login": "Vasia", "password": ""})] {
        let req = TestRequest::post().uri("/api/user/register").set_json(body);
        // The mock has no expectations: empty fields must never reach storage.
        let (status, _, _) = send_request(req, |cfg| auth_routes(cfg, MockLoyaltyStore::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn register_rejects_wrong_content_type() {
    let req = TestRequest::post()
        .uri("/api/user/register")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload(r#"{"login": "Vasia", "password": "12345"}"#);
    let (status, _, _) = send_request(req, |cfg| auth_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_with_the_right_password_sets_a_cookie() {
    let req = TestRequest::post()
        .uri("/api/user/login")
        .set_json(json!({"login": "Vasia", "password": "12345"}));
    let (status, headers, _) = send_request(req, configure_login).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().starts_with("jwt="));
}

#[actix_web::test]
async fn login_with_the_wrong_password_is_unauthorized() {
    let req = TestRequest::post()
        .uri("/api/user/login")
        .set_json(json!({"login": "Vasia", "password": "guess"}));
    let (status, headers, _) = send_request(req, configure_login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[actix_web::test]
async fn login_with_an_unknown_name_is_unauthorized() {
    let req = TestRequest::post()
        .uri("/api/user/login")
        .set_json(json!({"login": "Petya", "password": "12345"}));
    let (status, _, _) = send_request(req, configure_login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
