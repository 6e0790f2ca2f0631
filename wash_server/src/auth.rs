//! Bearer-token authentication.
//!
//! HS256 JWTs carry the user's id and role. The same token authenticates HTTP requests (via the
//! `Authorization: Bearer` header) and WebSocket handshakes (via the header or a `token` query
//! parameter, since browsers cannot set headers on WebSocket upgrades).
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use wash_engine::db_types::Role;

use crate::{config::AuthConfig, errors::AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id.
    pub sub: i64,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime }
    }

    pub fn issue_token(&self, user_id: i64, name: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id,
            name: name.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        encode(&Header::default(), &claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

/// The verification half, shared by the HTTP middleware and the WebSocket handshake.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::default();
        let data = decode::<JwtClaims>(token, &self.key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }
}

/// Pull the bearer token out of an `Authorization` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").map(str::trim)
}

/// Handlers take `JwtClaims` as an extractor; the bearer-token middleware has already verified
/// the token and stored the claims in the request extensions by the time a handler runs.
impl actix_web::FromRequest for JwtClaims {
    type Error = actix_web::Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        use actix_web::HttpMessage;
        std::future::ready(
            req.extensions()
                .get::<JwtClaims>()
                .cloned()
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("No authenticated user in request")),
        )
    }
}
