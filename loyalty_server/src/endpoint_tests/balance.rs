use actix_web::{
    http::StatusCode,
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use chrono::Utc;
use loyalty_engine::{db_types::Balance, traits::StorageError, OrderApi};
use lps_common::Amount;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use super::{
    helpers::{send_request, valid_cookie},
    mocks::MockLoyaltyStore,
};
use crate::routes;

fn balance_routes(cfg: &mut ServiceConfig, store: MockLoyaltyStore) {
    cfg.app_data(web::Data::new(OrderApi::new(store)))
        .route("/api/user/balance", web::get().to(routes::balance::<MockLoyaltyStore>))
        .route("/api/user/balance/withdraw", web::post().to(routes::withdraw::<MockLoyaltyStore>));
}

#[actix_web::test]
async fn balance_reports_current_and_withdrawn() {
    let _ = env_logger::try_init();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_fetch_balance().returning(|user_id| {
            Ok(Balance {
                user_id,
                current: Amount::from(dec!(500)),
                withdrawn: Amount::from(dec!(10)),
                changed_at: Utc::now(),
            })
        });
        balance_routes(cfg, store);
    };
    let req = TestRequest::get().uri("/api/user/balance").cookie(valid_cookie(1, "Vasia"));
    let (status, _, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed, json!({"current": 500.0, "withdrawn": 10.0}));
}

#[actix_web::test]
async fn balance_requires_authentication() {
    let req = TestRequest::get().uri("/api/user/balance");
    let (status, _, _) = send_request(req, |cfg| balance_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn withdraw_request(body: Value) -> TestRequest {
    TestRequest::post().uri("/api/user/balance/withdraw").set_json(body).cookie(valid_cookie(1, "Vasia"))
}

#[actix_web::test]
async fn a_covered_withdrawal_succeeds() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store
            .expect_insert_withdrawal()
            .withf(|w| w.user_id == 1 && w.order_id == 2377225624 && w.sum == Amount::from(dec!(751)))
            .returning(|_| Ok(()));
        balance_routes(cfg, store);
    };
    let (status, _, _) = send_request(withdraw_request(json!({"order": "2377225624", "sum": 751})), configure).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn fractional_sums_are_accepted() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store
            .expect_insert_withdrawal()
            .withf(|w| w.sum == Amount::from(dec!(729.98)))
            .returning(|_| Ok(()));
        balance_routes(cfg, store);
    };
    let (status, _, _) =
        send_request(withdraw_request(json!({"order": "2377225624", "sum": 729.98})), configure).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn an_uncovered_withdrawal_answers_payment_required() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_insert_withdrawal().returning(|_| Err(StorageError::BalanceNotEnough));
        balance_routes(cfg, store);
    };
    let (status, _, _) = send_request(withdraw_request(json!({"order": "2377225624", "sum": 751})), configure).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn withdrawing_against_a_bad_order_number_is_unprocessable() {
    let (status, _, _) = send_request(
        withdraw_request(json!({"order": "123456", "sum": 751})),
        |cfg| balance_routes(cfg, MockLoyaltyStore::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
