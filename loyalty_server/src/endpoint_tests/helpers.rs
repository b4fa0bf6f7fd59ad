use actix_web::{
    body::to_bytes,
    cookie::Cookie,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App, HttpResponse,
};
use lps_common::Secret;

use crate::{
    auth::{auth_cookie, TokenIssuer},
    server::json_error_handler,
};

// Keys for issuing test tokens and hashing test passwords. DO NOT re-use these anywhere.
pub const TEST_JWT_KEY: &str = "6eb9ed674bfb4cf0e87cba40ae4b2b2f";
pub const TEST_SIGNATURE_KEY: &str = "b75c5798c5bfe17e49e0a5d0b43f1b22";

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(&Secret::new(TEST_JWT_KEY.to_string()))
}

pub fn valid_cookie(user_id: i64, name: &str) -> Cookie<'static> {
    let token = test_issuer().issue_token(user_id, name).expect("Failed to sign token");
    auth_cookie(token)
}

/// Builds an app from the given route configuration, fires the request at it and hands back the pieces
/// the assertions care about. Errors that short-circuit before a handler runs (failed auth, bad payloads)
/// are rendered the same way the real server renders them.
pub async fn send_request(
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, HeaderMap, String) {
    let app = App::new()
        .app_data(web::Data::new(test_issuer()))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let headers = res.headers().clone();
            let body = test::read_body(res).await;
            (status, headers, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = HttpResponse::from_error(e);
            let status = res.status();
            let headers = res.headers().clone();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            (status, headers, String::from_utf8_lossy(&body).into_owned())
        },
    }
}
