//! Shared fakes and helpers for the web flow tests
#![allow(dead_code)]

mod calendar;

pub use calendar::InMemoryCalendar;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskcal::auth::{IdentityProvider, InMemorySessionStore, UserProfile, UserToken};
use taskcal::config::{parse_base_url, Config};
use taskcal::error::{oauth_error, AppResult};
use taskcal::web::{self, AppState};
use tower::ServiceExt;
use url::Url;

pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.example.test/authorize";

/// Identity provider that issues predictable tokens
pub struct FakeIdentityProvider {
    /// Lifetime of issued access tokens; negative means already expired
    pub expires_in: i64,
    pub refreshes: AtomicUsize,
    pub exchanges: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new(expires_in: i64) -> Self {
        Self {
            expires_in,
            refreshes: AtomicUsize::new(0),
            exchanges: AtomicUsize::new(0),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorize_url(&self, state: &str) -> AppResult<Url> {
        let mut url = Url::parse(AUTHORIZE_ENDPOINT).map_err(|e| oauth_error(&e.to_string()))?;
        url.query_pairs_mut().append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> AppResult<UserToken> {
        if code == "bad-code" {
            return Err(oauth_error("Failed to get token: HTTP 400 Bad Request - invalid_grant"));
        }
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        Ok(UserToken {
            access_token: format!("access-{}", code),
            refresh_token: Some("refresh-1".to_string()),
            token_type: "Bearer".to_string(),
            scope: Some("openid email profile".to_string()),
            id_token: None,
            expires_at: Some(Utc::now().timestamp() + self.expires_in),
        })
    }

    async fn refresh(&self, token: &UserToken) -> AppResult<UserToken> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(UserToken {
            access_token: "refreshed-access".to_string(),
            expires_at: Some(Utc::now().timestamp() + 3600),
            ..token.clone()
        })
    }

    async fn fetch_profile(&self, _token: &UserToken) -> AppResult<UserProfile> {
        Ok(UserProfile {
            sub: Some("1234567890".to_string()),
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            picture: None,
        })
    }
}

pub fn test_config() -> Config {
    Config {
        google_client_id: "test_client_id".to_string(),
        google_client_secret: "test_client_secret".to_string(),
        session_secret: "test_session_secret".to_string(),
        timezone: chrono_tz::Asia::Kolkata,
        google_calendar_id: "primary".to_string(),
        base_url: parse_base_url("http://127.0.0.1:5000").unwrap(),
        bind_addr: "127.0.0.1:5000".parse().unwrap(),
        redis_url: None,
        discovery_url: "http://127.0.0.1:1/unused".to_string(),
        max_tasks: 10,
        session_ttl_seconds: 3600,
    }
}

/// A router wired to fakes, with handles to inspect them
pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<InMemorySessionStore>,
    pub identity: Arc<FakeIdentityProvider>,
    pub calendar: Arc<InMemoryCalendar>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(FakeIdentityProvider::new(3600), InMemoryCalendar::new())
    }

    /// Same as [`TestApp::new`] with form times read in `timezone`
    pub fn with_timezone(timezone: chrono_tz::Tz) -> Self {
        let config = Config {
            timezone,
            ..test_config()
        };
        Self::build(config, FakeIdentityProvider::new(3600), InMemoryCalendar::new())
    }

    pub fn with(identity: FakeIdentityProvider, calendar: InMemoryCalendar) -> Self {
        Self::build(test_config(), identity, calendar)
    }

    fn build(config: Config, identity: FakeIdentityProvider, calendar: InMemoryCalendar) -> Self {
        let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(3600)));
        let identity = Arc::new(identity);
        let calendar = Arc::new(calendar);
        let state = AppState::new(config, sessions.clone(), identity.clone(), calendar.clone());

        Self {
            router: web::router(state),
            sessions,
            identity,
            calendar,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    /// Go through `/login` and `/callback`, returning the signed-in cookie
    pub async fn log_in(&self) -> String {
        let response = self.get("/login", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response).expect("login sets a session cookie");
        let state = state_param(location(&response));

        let response = self
            .get(&format!("/callback?code=abc&state={}", state), Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        session_cookie(&response).expect("callback sets a new session cookie")
    }
}

/// `name=value` of the session cookie set by a response
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("taskcal_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

pub fn state_param(location: &str) -> String {
    Url::parse(location)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
