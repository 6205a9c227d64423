use crate::auth::{AuthenticatedSession, IdentityProvider, SessionStore, UserToken};
use crate::error::AppResult;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Keeps the session's access token usable for calendar calls
#[derive(Clone)]
pub struct TokenManager {
    identity: Arc<dyn IdentityProvider>,
    sessions: Arc<dyn SessionStore>,
}

impl TokenManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { identity, sessions }
    }

    /// Get the session's token, refreshing and storing it first if it has expired
    pub async fn fresh_token(&self, session: &mut AuthenticatedSession) -> AppResult<UserToken> {
        self.fresh_token_at(session, Utc::now().timestamp()).await
    }

    /// Same as [`fresh_token`](Self::fresh_token) with an explicit clock
    pub async fn fresh_token_at(
        &self,
        session: &mut AuthenticatedSession,
        now: i64,
    ) -> AppResult<UserToken> {
        if !session.token.is_expired_at(now) {
            return Ok(session.token.clone());
        }

        if session.token.refresh_token.is_none() {
            // Nothing to refresh with; the remote call reports the expiry
            warn!("Access token for session {} expired and has no refresh token", session.id);
            return Ok(session.token.clone());
        }

        info!("Access token for session {} expired, refreshing", session.id);
        let refreshed = self.identity.refresh(&session.token).await?;

        session.set_token(refreshed.clone());

        // Reload so a logout that finished meanwhile isn't overwritten
        match self.sessions.load(&session.id).await? {
            Some(mut stored) if stored.is_authenticated() => {
                stored.user_token = Some(refreshed.clone());
                self.sessions.save(&session.id, &stored).await?;
            }
            _ => info!("Session {} logged out during refresh, not storing the token", session.id),
        }

        Ok(refreshed)
    }
}
