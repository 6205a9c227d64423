use super::models::{TokenResponse, UserProfile, UserToken};
use crate::config::Config;
use crate::error::{oauth_error, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

/// Scopes requested at login: identity plus full calendar access
pub const SCOPES: &[&str] = &[
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/calendar",
];

/// Endpoints of the identity provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

impl ProviderMetadata {
    /// Google's published endpoints
    pub fn google() -> Self {
        Self {
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
        }
    }

    /// Fetch the OpenID Connect discovery document
    pub async fn discover(client: &Client, discovery_url: &str) -> AppResult<Self> {
        let response = client
            .get(discovery_url)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Failed to fetch discovery document: {}", e)))?;

        let response = check_status(response, "fetch discovery document").await?;

        response
            .json::<Self>()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse discovery document: {}", e)))
    }

    /// Discover endpoints, falling back to Google's when discovery fails
    pub async fn discover_or_default(client: &Client, discovery_url: &str) -> Self {
        match Self::discover(client, discovery_url).await {
            Ok(metadata) => {
                info!("Loaded OpenID configuration from {}", discovery_url);
                metadata
            }
            Err(e) => {
                warn!("{}; using built-in Google endpoints", e);
                Self::google()
            }
        }
    }
}

/// The remote half of the login flow
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// URL the browser is sent to in order to log in
    fn authorize_url(&self, state: &str) -> AppResult<Url>;

    /// Exchange an authorization code for a token pair
    async fn exchange_code(&self, code: &str) -> AppResult<UserToken>;

    /// Obtain a new access token using the refresh token
    async fn refresh(&self, token: &UserToken) -> AppResult<UserToken>;

    /// Fetch the signed-in user's profile
    async fn fetch_profile(&self, token: &UserToken) -> AppResult<UserProfile>;
}

/// OAuth 2.0 authorization-code client for an OpenID Connect provider
pub struct OAuthClient {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: Url,
    metadata: ProviderMetadata,
}

impl OAuthClient {
    pub fn new(
        http: Client,
        client_id: String,
        client_secret: String,
        redirect_uri: Url,
        metadata: ProviderMetadata,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
            metadata,
        }
    }

    /// Build a client from the app configuration
    pub fn from_config(http: Client, config: &Config, metadata: ProviderMetadata) -> AppResult<Self> {
        Ok(Self::new(
            http,
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.redirect_uri()?,
            metadata,
        ))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> AppResult<TokenResponse> {
        let response = self
            .http
            .post(&self.metadata.token_endpoint)
            .form(params)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Failed to reach token endpoint: {}", e)))?;

        let response = check_status(response, "get token").await?;

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse token response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    fn authorize_url(&self, state: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.metadata.authorization_endpoint)
            .map_err(|e| oauth_error(&format!("Invalid authorization endpoint: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);

        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> AppResult<UserToken> {
        let response = self
            .request_token(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        Ok(UserToken::from_response(response, Utc::now().timestamp(), None))
    }

    async fn refresh(&self, token: &UserToken) -> AppResult<UserToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| oauth_error("No refresh token in token data"))?;

        let response = self
            .request_token(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        Ok(UserToken::from_response(
            response,
            Utc::now().timestamp(),
            Some(refresh_token.to_string()),
        ))
    }

    async fn fetch_profile(&self, token: &UserToken) -> AppResult<UserProfile> {
        let response = self
            .http
            .get(&self.metadata.userinfo_endpoint)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Failed to fetch user info: {}", e)))?;

        let response = check_status(response, "fetch user info").await?;

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse user info: {}", e)))
    }
}

async fn check_status(response: Response, action: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(oauth_error(&format!(
        "Failed to {}: HTTP {} - {}",
        action, status, error_body
    )))
}
