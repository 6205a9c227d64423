use super::cookie::SESSION_COOKIE_NAME;
use super::models::UserToken;
use super::session::{SessionData, SessionId};
use super::AuthError;
use crate::error::Error;
use crate::web::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

/// The caller's session, empty when the browser has none
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    /// `None` until a session has been stored for this browser
    pub id: Option<SessionId>,
    pub data: SessionData,
}

impl CurrentSession {
    /// Resolve the session named by the request's cookie
    pub async fn resolve(parts: &Parts, state: &AppState) -> Result<Self, Error> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(id) = jar
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| state.cookies.verify(cookie.value()))
        else {
            return Ok(Self::default());
        };

        match state.sessions.load(&id).await? {
            Some(data) => Ok(Self { id: Some(id), data }),
            None => Ok(Self::default()),
        }
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::resolve(parts, state).await
    }
}

/// A session that carries a token; requests without one are sent to `/login`
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub id: SessionId,
    pub data: SessionData,
    pub token: UserToken,
}

impl AuthenticatedSession {
    /// Replace the session's token, keeping `data` in step
    pub fn set_token(&mut self, token: UserToken) {
        self.data.user_token = Some(token.clone());
        self.token = token;
    }
}

impl FromRequestParts<AppState> for AuthenticatedSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::resolve(parts, state)
            .await
            .map_err(AuthError::Other)?;

        match (current.id, current.data.user_token.clone()) {
            (Some(id), Some(token)) => Ok(Self {
                id,
                data: current.data,
                token,
            }),
            _ => Err(AuthError::NotLoggedIn),
        }
    }
}
