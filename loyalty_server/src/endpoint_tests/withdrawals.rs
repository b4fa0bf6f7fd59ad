use actix_web::{
    http::StatusCode,
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use loyalty_engine::{db_types::Withdrawal, OrderApi};
use lps_common::Amount;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use super::{
    helpers::{send_request, valid_cookie},
    mocks::MockLoyaltyStore,
};
use crate::routes;

fn withdrawal_routes(cfg: &mut ServiceConfig, store: MockLoyaltyStore) {
    cfg.app_data(web::Data::new(OrderApi::new(store)))
        .route("/api/user/withdrawals", web::get().to(routes::withdrawals::<MockLoyaltyStore>));
}

#[actix_web::test]
async fn withdrawals_are_listed_with_their_timestamps() {
    let _ = env_logger::try_init();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_fetch_withdrawals().returning(|user_id| {
            Ok(vec![Withdrawal {
                user_id,
                order_id: 2377225624,
                sum: Amount::from(dec!(751)),
                processed_at: Utc.with_ymd_and_hms(2024, 3, 16, 11, 20, 0).unwrap(),
            }])
        });
        withdrawal_routes(cfg, store);
    };
    let req = TestRequest::get().uri("/api/user/withdrawals").cookie(valid_cookie(1, "Vasia"));
    let (status, _, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        parsed,
        json!([{"order": "2377225624", "sum": 751.0, "processed_at": "2024-03-16T11:20:00Z"}])
    );
}

#[actix_web::test]
async fn no_withdrawals_answers_no_content() {
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockLoyaltyStore::new();
        store.expect_fetch_withdrawals().returning(|_| Ok(vec![]));
        withdrawal_routes(cfg, store);
    };
    let req = TestRequest::get().uri("/api/user/withdrawals").cookie(valid_cookie(1, "Vasia"));
    let (status, _, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn withdrawals_require_authentication() {
    let req = TestRequest::get().uri("/api/user/withdrawals");
    let (status, _, _) = send_request(req, |cfg| withdrawal_routes(cfg, MockLoyaltyStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
