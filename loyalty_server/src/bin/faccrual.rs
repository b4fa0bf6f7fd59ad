//! A throwaway accrual scorer for local runs.
//!
//! Order numbers starting with `1` score INVALID; everything else scores PROCESSED with an accrual of 700.

use actix_web::{get, web, App, HttpResponse, HttpServer};
use log::info;
use serde::Serialize;

#[derive(Serialize)]
struct OrderScore<'a> {
    order: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    accrual: Option<f64>,
}

#[get("/api/orders/{number}")]
async fn score(path: web::Path<String>) -> HttpResponse {
    let number = path.into_inner();
    info!("read order {number}");
    let score = if number.starts_with('1') {
        OrderScore { order: &number, status: "INVALID", accrual: None }
    } else {
        OrderScore { order: &number, status: "PROCESSED", accrual: Some(700.0) }
    };
    HttpResponse::Ok().json(score)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    HttpServer::new(|| App::new().service(score))
        .client_request_timeout(std::time::Duration::from_secs(2))
        .bind(("0.0.0.0", 8100))?
        .run()
        .await
}
