use crate::auth::{InMemorySessionStore, OAuthClient, ProviderMetadata, RedisSessionStore, SessionStore};
use crate::config::Config;
use crate::error::{other_error, AppResult, Error};
use crate::google_calendar::GoogleCalendarClient;
use crate::shutdown;
use crate::web::{self, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Pick the session store: Redis when configured and reachable, memory otherwise
pub async fn session_store(config: &Config) -> Arc<dyn SessionStore> {
    let ttl = Duration::from_secs(config.session_ttl_seconds);
    let Some(redis_url) = &config.redis_url else {
        info!("REDIS_URL not set, keeping sessions in memory");
        return Arc::new(InMemorySessionStore::new(ttl));
    };

    let store = match RedisSessionStore::new(redis_url, config.session_ttl_seconds) {
        Ok(store) => store,
        Err(e) => {
            error!("{}", e);
            info!("Using in-memory session store as fallback");
            return Arc::new(InMemorySessionStore::new(ttl));
        }
    };

    match store.ping().await {
        Ok(()) => {
            info!("Connected to Redis successfully");
            Arc::new(store)
        }
        Err(e) => {
            error!("{}", e);
            info!("Using in-memory session store as fallback");
            Arc::new(InMemorySessionStore::new(ttl))
        }
    }
}

/// Wire the production services into the app state
pub async fn build_state(config: Config) -> AppResult<AppState> {
    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let metadata = ProviderMetadata::discover_or_default(&http, &config.discovery_url).await;
    let identity = OAuthClient::from_config(http.clone(), &config, metadata)?;
    let calendar = GoogleCalendarClient::new(http, config.google_calendar_id.clone());
    let sessions = session_store(&config).await;

    info!(
        "Tasks go to calendar '{}', form times are read as {}",
        config.google_calendar_id, config.timezone
    );

    Ok(AppState::new(config, sessions, Arc::new(identity), Arc::new(calendar)))
}

/// Build the app and serve it until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    let addr = config.bind_addr;
    let state = build_state(config).await?;
    let app = web::router(state);

    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(Error::from)?;

    info!("Server shut down");
    Ok(())
}
