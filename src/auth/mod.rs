//! Login with an OpenID Connect provider and server-side sessions

pub mod cookie;
pub mod extract;
pub mod models;
pub mod provider;
pub mod session;

pub use cookie::SessionCookie;
pub use extract::{AuthenticatedSession, CurrentSession};
pub use models::{UserProfile, UserToken};
pub use provider::{IdentityProvider, OAuthClient, ProviderMetadata};
pub use session::{InMemorySessionStore, RedisSessionStore, SessionData, SessionId, SessionStore};

use crate::error::Error;
use axum::response::{IntoResponse, Redirect, Response};

/// Why a request could not be tied to a signed-in user
#[derive(Debug)]
pub enum AuthError {
    /// No session, or a session without a token
    NotLoggedIn,
    /// Loading the session failed
    Other(Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::NotLoggedIn => Redirect::to("/login").into_response(),
            AuthError::Other(err) => err.into_response(),
        }
    }
}
