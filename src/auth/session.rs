use super::models::{UserProfile, UserToken};
use crate::error::AppResult;
use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Redis key prefix for sessions
pub const SESSION_KEY_PREFIX: &str = "taskcal:session:";

/// Opaque identifier of a browser session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything remembered about a browser between requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionData {
    /// Token pair from the identity provider
    pub user_token: Option<UserToken>,
    /// Profile of the signed-in user
    pub user: Option<UserProfile>,
    /// CSRF state of a login in progress
    pub oauth_state: Option<String>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.user_token.is_some()
    }

    /// Forget the signed-in user
    pub fn log_out(&mut self) {
        self.user = None;
        self.user_token = None;
    }
}

/// Storage for session data keyed by session ID
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load a session, `None` if unknown or expired
    async fn load(&self, id: &SessionId) -> AppResult<Option<SessionData>>;

    /// Create or replace a session
    async fn save(&self, id: &SessionId, data: &SessionData) -> AppResult<()>;

    /// Delete a session
    async fn remove(&self, id: &SessionId) -> AppResult<()>;
}

struct MemoryEntry {
    data: SessionData,
    expires_at: Instant,
}

/// In-memory session store, used when no Redis is configured and in tests.
/// Entries expire `ttl` after their last save, like the Redis keys do.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, MemoryEntry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of stored sessions, expired ones not yet pruned included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> AppResult<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        let now = Instant::now();
        Ok(sessions
            .get(id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.data.clone()))
    }

    async fn save(&self, id: &SessionId, data: &SessionData) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        if sessions.len() < before {
            debug!("Pruned {} expired sessions", before - sessions.len());
        }

        sessions.insert(
            id.clone(),
            MemoryEntry {
                data: data.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        Ok(())
    }
}

/// Redis-backed session store; entries expire after the session lifetime
pub struct RedisSessionStore {
    client: RedisClient,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Create a store for the given Redis URL
    pub fn new(redis_url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = RedisClient::open(redis_url)?;
        let store = Self { client, ttl_seconds };
        info!("Using Redis session store at {}", store.address());
        Ok(store)
    }

    /// Host and port of the server, without credentials
    pub fn address(&self) -> String {
        self.client.get_connection_info().addr.to_string()
    }

    /// Check that Redis is reachable
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn key(id: &SessionId) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &SessionId) -> AppResult<Option<SessionData>> {
        let mut conn = self.get_connection().await?;
        let raw: Option<String> = conn.get(Self::key(id)).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => {
                debug!("Session {} not found in Redis", id);
                Ok(None)
            }
        }
    }

    async fn save(&self, id: &SessionId, data: &SessionData) -> AppResult<()> {
        let json = serde_json::to_string(data)?;

        let mut conn = self.get_connection().await?;
        conn.set_ex::<_, _, ()>(Self::key(id), json, self.ttl_seconds).await?;
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        conn.del::<_, ()>(Self::key(id)).await?;
        Ok(())
    }
}
