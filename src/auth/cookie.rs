use super::session::SessionId;
use crate::error::{session_error, AppResult};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Name of the cookie carrying the signed session ID
pub const SESSION_COOKIE_NAME: &str = "taskcal_session";

/// JWT claims of the session cookie
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Session ID
    pub sub: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies session cookies
#[derive(Clone)]
pub struct SessionCookie {
    keys: Arc<Keys>,
    ttl_seconds: i64,
    secure: bool,
}

impl SessionCookie {
    pub fn new(secret: &str, ttl_seconds: u64, secure: bool) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl_seconds: i64::try_from(ttl_seconds).unwrap_or(i64::MAX),
            secure,
        }
    }

    /// Sign a session ID
    pub fn sign(&self, id: &SessionId) -> AppResult<String> {
        let now = Utc::now();
        let exp = TimeDelta::try_seconds(self.ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| session_error("Session lifetime is out of range"))?;

        let claims = SessionClaims {
            sub: id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.keys.encoding)?)
    }

    /// Verify a cookie value, `None` when it's forged, malformed or expired
    pub fn verify(&self, value: &str) -> Option<SessionId> {
        decode::<SessionClaims>(value, &self.keys.decoding, &Validation::default())
            .map(|data| SessionId::from(data.claims.sub))
            .map_err(|e| debug!("Rejected session cookie: {:?}", e))
            .ok()
    }

    /// Cookie pointing the browser at `id`
    pub fn cookie(&self, id: &SessionId) -> AppResult<Cookie<'static>> {
        Ok(Cookie::build((SESSION_COOKIE_NAME, self.sign(id)?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build())
    }
}
