//! HTTP routes of the task manager

pub mod handlers;
pub mod templates;

use crate::auth::{IdentityProvider, SessionCookie, SessionStore};
use crate::config::Config;
use crate::google_calendar::{TaskCalendar, TokenManager};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use handlers::{
    callback_handler, delete_task_handler, health_handler, home_handler, login_handler,
    logout_handler, tasks_create_handler, tasks_list_handler,
};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Session storage
    pub sessions: Arc<dyn SessionStore>,
    /// Session cookie signing
    pub cookies: SessionCookie,
    /// OAuth/OpenID Connect provider
    pub identity: Arc<dyn IdentityProvider>,
    /// Calendar holding the tasks
    pub calendar: Arc<dyn TaskCalendar>,
    pub tokens: TokenManager,
}

impl AppState {
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        calendar: Arc<dyn TaskCalendar>,
    ) -> Self {
        let cookies = SessionCookie::new(
            &config.session_secret,
            config.session_ttl_seconds,
            config.secure_cookies(),
        );
        let tokens = TokenManager::new(identity.clone(), sessions.clone());

        Self {
            config: Arc::new(config),
            sessions,
            cookies,
            identity,
            calendar,
            tokens,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .route("/logout", get(logout_handler))
        .route("/tasks", get(tasks_list_handler).post(tasks_create_handler))
        .route("/delete/{task_id}", get(delete_task_handler))
        .route("/health", get(health_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
