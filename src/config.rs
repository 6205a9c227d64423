use crate::error::{config_error, env_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use tracing::warn;
use url::Url;

/// Timezone used to interpret the task form's local date and time
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Calendar that tasks are read from and written to
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Google's OpenID Connect discovery document
pub const GOOGLE_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_TASKS: u32 = 10;
/// 7 days in seconds
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
/// One year in seconds
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Secret used to sign session cookies
    pub session_secret: String,
    /// Timezone of the task form input
    pub timezone: Tz,
    /// Google Calendar ID to manage tasks in
    pub google_calendar_id: String,
    /// Public base URL of the app, used to build the OAuth redirect URI
    pub base_url: Url,
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Redis connection URL; sessions are kept in memory when unset
    pub redis_url: Option<String>,
    /// OpenID Connect discovery document URL
    pub discovery_url: String,
    /// Maximum number of upcoming tasks listed
    pub max_tasks: u32,
    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present)
    pub fn load() -> AppResult<Self> {
        dotenv().ok();

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        let session_secret = match env::var("SESSION_SECRET_KEY").or_else(|_| env::var("FLASK_SECRET_KEY")) {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("SESSION_SECRET_KEY not set, using a random secret; sessions will not survive a restart");
                random_secret()
            }
        };

        let timezone = parse_timezone(
            &env::var("TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
        )?;

        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| DEFAULT_CALENDAR_ID.to_string());

        let base_url = parse_base_url(
            &env::var("APP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )?;

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(addr) => addr
                .parse::<SocketAddr>()
                .map_err(|_| config_error(&format!("Invalid BIND_ADDR format: {}", addr)))?,
            Err(_) => {
                let port = parse_number("PORT", DEFAULT_PORT)?;
                SocketAddr::from(([127, 0, 0, 1], port))
            }
        };

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let discovery_url =
            env::var("OIDC_DISCOVERY_URL").unwrap_or_else(|_| GOOGLE_DISCOVERY_URL.to_string());

        let max_tasks = parse_number("MAX_TASKS", DEFAULT_MAX_TASKS)?;
        let session_ttl_seconds = validate_session_ttl(parse_number(
            "SESSION_TTL_SECONDS",
            DEFAULT_SESSION_TTL_SECONDS,
        )?)?;

        Ok(Config {
            google_client_id,
            google_client_secret,
            session_secret,
            timezone,
            google_calendar_id,
            base_url,
            bind_addr,
            redis_url,
            discovery_url,
            max_tasks,
            session_ttl_seconds,
        })
    }

    /// Redirect URI registered with the identity provider
    pub fn redirect_uri(&self) -> AppResult<Url> {
        self.base_url
            .join("callback")
            .map_err(|e| config_error(&format!("Invalid redirect URI: {}", e)))
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))
}

/// Parse the base URL, making sure it ends with a slash so joins keep any path prefix
pub fn parse_base_url(raw: &str) -> AppResult<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash).map_err(|e| config_error(&format!("Invalid APP_BASE_URL: {}", e)))
}

/// Session lifetime must be at least a second and at most a year
pub fn validate_session_ttl(seconds: u64) -> AppResult<u64> {
    if (1..=MAX_SESSION_TTL_SECONDS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(config_error(&format!(
            "SESSION_TTL_SECONDS must be between 1 and {}, got {}",
            MAX_SESSION_TTL_SECONDS, seconds
        )))
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, default: T) -> AppResult<T> {
    match env::var(var) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} format", var))),
        Err(_) => Ok(default),
    }
}

fn random_secret() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}
