use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{InternalError, JsonPayloadError},
    middleware::{Compress, Logger},
    web, App, HttpRequest, HttpResponse, HttpServer,
};
use loyalty_engine::traits::LoyaltyDatabase;

use crate::{auth::TokenIssuer, config::ServerConfig, errors::ServerError, routes};

/// How long in-flight requests get to finish on shutdown.
const SHUTDOWN_GRACE_SECS: u64 = 10;
/// How long a client gets to deliver its request head.
const READ_HEADER_TIMEOUT: Duration = Duration::from_secs(2);

pub fn create_server_instance<B>(config: ServerConfig, db: B) -> Result<Server, ServerError>
where B: LoyaltyDatabase + Send + Sync + 'static
{
    let bind_address = config.bind_address();
    let srv = HttpServer::new(move || {
        let auth_api = loyalty_engine::AuthApi::new(db.clone(), config.signature_key.clone());
        let order_api = loyalty_engine::OrderApi::new(db.clone());
        let signer = TokenIssuer::new(&config.jwt_key);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %r %a"))
            .wrap(Compress::default())
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(signer))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/", web::get().to(routes::index))
            .service(
                web::scope("/api/user")
                    .route("/register", web::post().to(routes::register::<B>))
                    .route("/login", web::post().to(routes::login::<B>))
                    .route("/orders", web::post().to(routes::submit_order::<B>))
                    .route("/orders", web::get().to(routes::my_orders::<B>))
                    .route("/balance", web::get().to(routes::balance::<B>))
                    .route("/balance/withdraw", web::post().to(routes::withdraw::<B>))
                    .route("/withdrawals", web::get().to(routes::withdrawals::<B>)),
            )
    })
    .client_request_timeout(READ_HEADER_TIMEOUT)
    .shutdown_timeout(SHUTDOWN_GRACE_SECS)
    .bind(bind_address)?
    .run();
    Ok(srv)
}

/// The JSON endpoints answer 400 for anything wrong with the payload, content type included.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    InternalError::from_response(err, HttpResponse::BadRequest().body("Bad content type or request body")).into()
}
