use actix_web::{
    http::{header, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Order, OrderStatusType},
    traits::StorageError,
    OrderApi,
};
use lps_common::Amount;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use super::{
    helpers::{send_request, valid_cookie},
    mocks::MockLoyaltyStore,
};
use crate::routes;

fn order_routes(cfg: &mut ServiceConfig, store: MockLoyaltyStore) {
    cfg.app_data(web::Data::new(OrderApi::new(store)))
        .route("/api/user/orders", web::post().to(routes::submit_order::<MockLoyaltyStore>))
        .route("/api/user/orders", web::get().to(routes::my_orders::<MockLoyaltyStore>));
}

fn submit_request(number: &'static str) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload(number)
        .cookie(valid_cookie(1, "Vasia"))
}

fn stored_order(order_id: i64, user_id: i64) -> Order {
    Order {
        order_id,
        user_id,
        status: OrderStatusType::New,
        accrual: Amount::ZERO,
        uploaded_at: Utc::now(),
        changed_at: Utc::now(),
    }
}

#[actix_web::test]
async fn a_fresh_order_is_accepted() {
    let _ = env_logger::try_init();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_insert_order().withf(|o| o.order_id == 5062821234567892 && o.user_id == 1).returning(|_| Ok(()));
        order_routes(cfg, store);
    };
    let (status, _, _) = send_request(submit_request("5062821234567892"), configure).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn submitting_without_a_cookie_is_unauthorized() {
    let req = TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload("5062821234567892");
    let (status, _, _) = send_request(req, |cfg| order_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn submitting_with_a_garbage_token_is_unauthorized() {
    let req = TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .cookie(actix_web::cookie::Cookie::new("jwt", "not-a-token"))
        .set_payload("5062821234567892");
    let (status, _, _) = send_request(req, |cfg| order_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn non_luhn_numbers_are_unprocessable() {
    let (status, _, _) =
        send_request(submit_request("123456"), |cfg| order_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn resubmitting_my_own_order_is_idempotent() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_insert_order().returning(|_| Err(StorageError::AlreadyExists));
        store.expect_fetch_order_by_id().returning(|id| Ok(stored_order(id, 1)));
        order_routes(cfg, store);
    };
    let (status, _, _) = send_request(submit_request("5062821234567892"), configure).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn submitting_somebody_elses_order_is_a_conflict() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_insert_order().returning(|_| Err(StorageError::AlreadyExists));
        store.expect_fetch_order_by_id().returning(|id| Ok(stored_order(id, 2)));
        order_routes(cfg, store);
    };
    let (status, _, _) = send_request(submit_request("5062821234567892"), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn submitting_with_the_wrong_content_type_is_a_bad_request() {
    let req = TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("5062821234567892")
        .cookie(valid_cookie(1, "Vasia"));
    let (status, _, _) = send_request(req, |cfg| order_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn listing_orders_returns_them_newest_first() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_fetch_orders_for_user().returning(|_| {
            Ok(vec![
                Order {
                    order_id: 5062821234567892,
                    user_id: 1,
                    status: OrderStatusType::Processed,
                    accrual: Amount::from(dec!(500)),
                    uploaded_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap(),
                    changed_at: Utc.with_ymd_and_hms(2024, 3, 16, 11, 20, 0).unwrap(),
                },
                Order {
                    order_id: 2377225624,
                    user_id: 1,
                    status: OrderStatusType::Invalid,
                    accrual: Amount::ZERO,
                    uploaded_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
                    changed_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
                },
            ])
        });
        order_routes(cfg, store);
    };
    let req = TestRequest::get().uri("/api/user/orders").cookie(valid_cookie(1, "Vasia"));
    let (status, _, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    let expected = json!([
        {
            "number": "5062821234567892",
            "status": "PROCESSED",
            "accrual": 500.0,
            "uploaded_at": "2024-03-15T18:30:00Z"
        },
        {
            "number": "2377225624",
            "status": "INVALID",
            "accrual": 0.0,
            "uploaded_at": "2024-02-29T13:30:00Z"
        }
    ]);
    assert_eq!(parsed, expected);
}

#[actix_web::test]
async fn an_empty_order_list_answers_no_content() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_fetch_orders_for_user().returning(|_| Ok(vec![]));
        order_routes(cfg, store);
    };
    let req = TestRequest::get().uri("/api/user/orders").cookie(valid_cookie(1, "Vasia"));
    let (status, _, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}
