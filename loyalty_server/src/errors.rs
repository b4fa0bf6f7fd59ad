use std::fmt::Display;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad content type")]
    BadContentType,
    #[error("Login and password must both be supplied")]
    MissingCredentials,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Unauthorized access")]
    Unauthorized,
    #[error("This user name is already taken")]
    NameAlreadyTaken,
    #[error("Order was uploaded by another user")]
    OrderConflict,
    #[error("Unprocessable value: {0}")]
    UnprocessableValue(String),
    #[error("The balance does not cover the withdrawal")]
    BalanceNotEnough,
    #[error("Could not issue an auth token. {0}")]
    TokenIssue(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Storage fault. {0}")]
    Backend(String),
}

impl ServerError {
    /// Wraps any lower-layer fault that should surface as a plain 500.
    pub fn backend(e: impl Display) -> Self {
        Self::Backend(e.to_string())
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::BadContentType | Self::MissingCredentials => StatusCode::BAD_REQUEST,
            Self::AuthenticationFailed | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BalanceNotEnough => StatusCode::PAYMENT_REQUIRED,
            Self::NameAlreadyTaken | Self::OrderConflict => StatusCode::CONFLICT,
            Self::UnprocessableValue(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            error!("💻️ Internal error: {self}");
        }
        HttpResponse::build(self.status_code()).insert_header(ContentType::plaintext()).body(self.to_string())
    }
}
