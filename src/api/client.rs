//! HTTP implementation of the authentication provider boundary.
//!
//! This module provides the `HttpAuthProvider` struct for talking to the
//! hosted backend: credential exchange, session refresh, sign-out, and
//! profile row lookup.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{AuthProvider, ProviderSession, TokenStore};
use crate::config::Config;
use crate::models::Profile;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix for authentication endpoints
const AUTH_PATH: &str = "/auth/v1";

/// Path prefix for data endpoints
const REST_PATH: &str = "/rest/v1";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

impl TokenResponse {
    /// Resolve the absolute expiry, preferring the server-supplied unix
    /// timestamp over the relative lifetime.
    fn resolve_expiry(&self) -> Result<DateTime<Utc>, ApiError> {
        if let Some(at) = self.expires_at {
            return Utc
                .timestamp_opt(at, 0)
                .single()
                .ok_or_else(|| ApiError::InvalidResponse(format!("Bad expires_at: {}", at)));
        }
        if let Some(secs) = self.expires_in {
            return Ok(Utc::now() + Duration::seconds(secs));
        }
        Err(ApiError::InvalidResponse(
            "Token response carried neither expires_at nor expires_in".to_string(),
        ))
    }

    fn into_session(self) -> Result<ProviderSession, ApiError> {
        let expires_at = self.resolve_expiry()?;
        Ok(ProviderSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            expires_at,
        })
    }
}

/// HTTP client for the hosted backend's auth and profile endpoints.
///
/// Holds the current provider session in memory, the way the original
/// browser SDK persists its session locally. `get_session` reports the
/// held session; `refresh_session` exchanges the refresh token for a new
/// one and replaces it.
pub struct HttpAuthProvider {
    client: Client,
    base_url: String,
    api_key: String,
    session: Mutex<Option<ProviderSession>>,
}

impl HttpAuthProvider {
    /// Create a new provider client from configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session: Mutex::new(None),
        })
    }

    /// Seed the held session, e.g. after a federated-identity handshake
    /// returns an opaque token exchanged elsewhere.
    pub fn set_session(&self, session: ProviderSession) {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    fn current_session(&self) -> Option<ProviderSession> {
        self.session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Exchange email and password for a provider session.
    ///
    /// Stores the refresh token in the OS keychain so a later process
    /// start can refresh without re-prompting.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, ApiError> {
        let url = format!("{}{}/token?grant_type=password", self.base_url, AUTH_PATH);

        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .client
            .post(&url)
            .headers(self.base_headers()?)
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let token: TokenResponse = response.json().await?;
        let session = token.into_session()?;

        if let Some(ref refresh) = session.refresh_token {
            if let Err(e) = TokenStore::store(&session.user_id, refresh) {
                warn!(error = %e, "Failed to store refresh token");
            }
        }

        debug!(user_id = %session.user_id, expires_at = %session.expires_at, "Signed in");
        self.set_session(session.clone());
        Ok(session)
    }

    fn base_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(&self.api_key)
                .map_err(|e| ApiError::InvalidResponse(format!("Bad api key: {}", e)))?,
        );
        Ok(headers)
    }

    fn auth_headers(&self, access_token: &str) -> Result<header::HeaderMap, ApiError> {
        let mut headers = self.base_headers()?;
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|e| ApiError::InvalidResponse(format!("Bad bearer token: {}", e)))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ApiError> {
        Ok(self.current_session())
    }

    async fn refresh_session(&self) -> Result<ProviderSession, ApiError> {
        let held = self.current_session().ok_or(ApiError::Unauthorized)?;

        // Fall back to the keychain copy when the held session predates
        // this process.
        let refresh_token = match held.refresh_token.clone() {
            Some(token) => token,
            None => TokenStore::restore(&held.user_id).ok_or(ApiError::Unauthorized)?,
        };

        let url = format!(
            "{}{}/token?grant_type=refresh_token",
            self.base_url, AUTH_PATH
        );
        let body = serde_json::json!({ "refresh_token": refresh_token });

        let response = self
            .client
            .post(&url)
            .headers(self.base_headers()?)
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let token: TokenResponse = response.json().await?;
        let session = token.into_session()?;

        if let Some(ref refresh) = session.refresh_token {
            if let Err(e) = TokenStore::store(&session.user_id, refresh) {
                warn!(error = %e, "Failed to rotate refresh token");
            }
        }

        debug!(expires_at = %session.expires_at, "Session refreshed");
        self.set_session(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        let held = self.current_session();

        if let Some(session) = held {
            let url = format!("{}{}/logout", self.base_url, AUTH_PATH);
            let response = self
                .client
                .post(&url)
                .headers(self.auth_headers(&session.access_token)?)
                .send()
                .await?;

            // A 401 here just means the session already lapsed server-side.
            if !response.status().is_success() && response.status() != StatusCode::UNAUTHORIZED {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &body));
            }
        }

        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, ApiError> {
        let session = self.current_session().ok_or(ApiError::Unauthorized)?;

        let url = format!("{}{}/profiles", self.base_url, REST_PATH);

        let response = self
            .client
            .get(&url)
            // query() percent-encodes the id inside the row filter
            .query(&[("id", format!("eq.{user_id}")), ("select", "*".into())])
            .headers(self.auth_headers(&session.access_token)?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        // Row filters return an array, empty when the row is gone.
        let rows: Vec<Profile> = response.json().await?;
        Ok(rows.into_iter().next())
    }
}
