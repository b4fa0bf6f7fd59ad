//! JWT-cookie authentication.
//!
//! Login and registration answer with a `Set-Cookie` carrying an HS256 token; every protected route simply
//! asks for an [`AuthenticatedUser`] in its signature and the extractor does the rest. The cookie outlives
//! the token on purpose: the browser keeps presenting it, and the server starts answering 401 once the
//! embedded expiry passes.

use std::future::{ready, Ready};

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::Payload,
    web, FromRequest, HttpRequest,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use lps_common::Secret;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// Name of the auth cookie.
pub const JWT_COOKIE: &str = "jwt";
const ISSUER: &str = "gophermart";
const TOKEN_LIFETIME_HOURS: i64 = 1;
const COOKIE_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id as a decimal string.
    pub sub: String,
    pub name: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and validates the access tokens carried by the `jwt` cookie.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(key: &Secret<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.reveal().as_bytes()),
            decoding_key: DecodingKey::from_secret(key.reveal().as_bytes()),
        }
    }

    pub fn issue_token(&self, user_id: i64, name: &str) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            iss: ISSUER.to_string(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::TokenIssue(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        decode::<JwtClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

/// Builds the `Set-Cookie` for a freshly issued token.
pub fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build(JWT_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(COOKIE_LIFETIME_DAYS))
        .finish()
}

/// The caller identity every protected handler receives.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub name: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::ConfigurationError("TokenIssuer is not registered".to_string()))?;
    let cookie = req.cookie(JWT_COOKIE).ok_or(ServerError::Unauthorized)?;
    let claims = issuer.validate(cookie.value()).map_err(|e| {
        debug!("🔐️ Rejecting token: {e}");
        ServerError::Unauthorized
    })?;
    let user_id = claims.sub.parse::<i64>().map_err(|_| ServerError::Unauthorized)?;
    Ok(AuthenticatedUser { user_id, name: claims.name })
}

#[cfg(test)]
mod test {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&Secret::new("0123456789abcdef0123456789abcdef".to_string()))
    }

    #[test]
    fn tokens_round_trip() {
        let token = issuer().issue_token(42, "Vasia").unwrap();
        let claims = issuer().validate(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.name, "Vasia");
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_from_another_key_are_rejected() {
        let other = TokenIssuer::new(&Secret::new("another-key".to_string()));
        let token = other.issue_token(42, "Vasia").unwrap();
        assert!(issuer().validate(&token).is_err());
    }

    #[test]
    fn cookie_is_locked_down() {
        let cookie = auth_cookie("token".to_string());
        assert_eq!(cookie.name(), JWT_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
