//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: content-type bookkeeping, a call into the
//! service layer, and the mapping from service errors to HTTP statuses. Anything heavier belongs in
//! `loyalty_engine`.

use actix_web::{http::header, web, HttpMessage, HttpRequest, HttpResponse};
use log::{debug, trace};
use loyalty_engine::{
    api::{AuthApiError, OrderApiError},
    traits::{BalanceManagement, OrderManagement, UserManagement},
    AuthApi, OrderApi,
};

use crate::{
    auth::{auth_cookie, AuthenticatedUser, TokenIssuer},
    data_objects::{BalanceResult, OrderResult, UserCredentials, WithdrawRequest, WithdrawalResult},
    errors::ServerError,
};

const TEXT_HTML: &str = "text/html";
const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";
const TEXT_PLAIN_CHARSET: &str = "text/plain; charset=utf-8";

/// Mirrors the request's `Accept` header in the response content type, the way the original clients
/// expect. Anything unrecognised gets plain text.
fn negotiated_content_type(req: &HttpRequest) -> &'static str {
    match req.headers().get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
        Some(TEXT_HTML) => TEXT_HTML,
        Some(APPLICATION_JSON) => APPLICATION_JSON,
        _ => TEXT_PLAIN_CHARSET,
    }
}

// ----------------------------------------------   Root   ----------------------------------------------------

pub async fn index(req: HttpRequest) -> HttpResponse {
    trace!("💻️ Received root request");
    HttpResponse::Ok().content_type(negotiated_content_type(&req)).body("Server Started")
}

// ----------------------------------------------   Auth   ----------------------------------------------------

/// `POST /api/user/register`. Answers 200 with the `jwt` cookie, 400 on empty fields, 409 on a taken name.
pub async fn register<B>(
    req: HttpRequest,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<UserCredentials>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement,
{
    let user = match api.register_user(&body.login, &body.password).await {
        Ok(user) => user,
        Err(AuthApiError::BadCredentials) => return Err(ServerError::MissingCredentials),
        Err(AuthApiError::AuthenticationFailed) => return Err(ServerError::NameAlreadyTaken),
        Err(AuthApiError::Storage(e)) => return Err(ServerError::backend(e)),
    };
    let token = signer.issue_token(user.id, &user.name)?;
    debug!("💻️ User {} registered and logged in", user.name);
    Ok(HttpResponse::Ok().content_type(negotiated_content_type(&req)).cookie(auth_cookie(token)).finish())
}

/// `POST /api/user/login`. Answers 200 with a fresh `jwt` cookie, 400 on empty fields, 401 otherwise.
pub async fn login<B>(
    req: HttpRequest,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<UserCredentials>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement,
{
    let user = match api.login_user(&body.login, &body.password).await {
        Ok(user) => user,
        Err(AuthApiError::BadCredentials) => return Err(ServerError::MissingCredentials),
        Err(AuthApiError::AuthenticationFailed) => return Err(ServerError::AuthenticationFailed),
        Err(AuthApiError::Storage(e)) => return Err(ServerError::backend(e)),
    };
    let token = signer.issue_token(user.id, &user.name)?;
    Ok(HttpResponse::Ok().content_type(negotiated_content_type(&req)).cookie(auth_cookie(token)).finish())
}

// ----------------------------------------------   Orders  ----------------------------------------------------

/// `POST /api/user/orders` with a text/plain body carrying the order number. 202 on acceptance, 200 when
/// the same user already uploaded the number, 409 when somebody else did, 422 on an invalid number.
pub async fn submit_order<B>(
    req: HttpRequest,
    user: AuthenticatedUser,
    api: web::Data<OrderApi<B>>,
    body: String,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + BalanceManagement,
{
    if req.content_type() != TEXT_PLAIN {
        return Err(ServerError::BadContentType);
    }
    let content_type = negotiated_content_type(&req);
    match api.submit_order(user.user_id, body.trim()).await {
        Ok(()) => Ok(HttpResponse::Accepted().content_type(content_type).finish()),
        Err(OrderApiError::OrderAlreadyLoaded) => Ok(HttpResponse::Ok().content_type(content_type).finish()),
        Err(OrderApiError::OrderAlreadyLoadedByOtherUser) => Err(ServerError::OrderConflict),
        Err(OrderApiError::InvalidOrderNumber(n)) => Err(ServerError::UnprocessableValue(n)),
        Err(e) => Err(ServerError::backend(e)),
    }
}

/// `GET /api/user/orders`. 200 with the user's orders newest first, or 204 when there are none.
pub async fn my_orders<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + BalanceManagement,
{
    let orders = api.orders_for_user(user.user_id).await.map_err(ServerError::backend)?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let result = orders.into_iter().map(OrderResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(result))
}

// ----------------------------------------------  Balance  ----------------------------------------------------

/// `GET /api/user/balance`. Users without a balance row simply see zeroes.
pub async fn balance<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + BalanceManagement,
{
    let balance = api.balance_for_user(user.user_id).await.map_err(ServerError::backend)?;
    trace!("💻️ Balance for user {}: {}", user.user_id, balance.current);
    Ok(HttpResponse::Ok().json(BalanceResult::from(balance)))
}

/// `POST /api/user/balance/withdraw`. 200 on success, 402 when the balance does not cover the sum, 422 on
/// a bad order number or sum.
pub async fn withdraw<B>(
    req: HttpRequest,
    user: AuthenticatedUser,
    api: web::Data<OrderApi<B>>,
    body: web::Json<WithdrawRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + BalanceManagement,
{
    debug!("💻️ User {} requests a withdrawal against order {}", user.user_id, body.order);
    match api.withdraw(user.user_id, &body.order, body.sum).await {
        Ok(()) => Ok(HttpResponse::Ok().content_type(negotiated_content_type(&req)).finish()),
        Err(OrderApiError::BalanceNotEnough) => Err(ServerError::BalanceNotEnough),
        Err(OrderApiError::InvalidOrderNumber(n)) => Err(ServerError::UnprocessableValue(n)),
        Err(OrderApiError::InvalidWithdrawalSum(s)) => Err(ServerError::UnprocessableValue(s.to_string())),
        Err(e) => Err(ServerError::backend(e)),
    }
}

/// `GET /api/user/withdrawals`. 200 with the user's withdrawals, or 204 when there are none.
pub async fn withdrawals<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + BalanceManagement,
{
    let withdrawals = api.withdrawals_for_user(user.user_id).await.map_err(ServerError::backend)?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let result = withdrawals.into_iter().map(WithdrawalResult::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(result))
}
