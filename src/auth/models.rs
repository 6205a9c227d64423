use serde::{Deserialize, Serialize};

/// Lifetime assumed when the token endpoint doesn't send `expires_in`
pub const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

/// OAuth token pair kept in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    /// Expiry as a unix timestamp
    pub expires_at: Option<i64>,
}

impl UserToken {
    /// Build a session token from a token endpoint response issued at `now`.
    /// `previous_refresh` is kept when the response carries no refresh token.
    pub fn from_response(response: TokenResponse, now: i64, previous_refresh: Option<String>) -> Self {
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS);

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scope: response.scope,
            id_token: response.id_token,
            expires_at: Some(now + expires_in),
        }
    }

    /// A token without a known expiry is treated as valid
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
    pub id_token: Option<String>,
}

/// Profile returned by the userinfo endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    pub sub: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl UserProfile {
    /// Name shown in the greeting
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("there")
    }
}
