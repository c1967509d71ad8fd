use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::client::{check, SupabaseClient};
use crate::auth::jwt::verify_access_token;
use crate::error::RemoteError;
use crate::models::identity::Identity;
use crate::services::session::{SessionChannel, SessionProvider, SessionSubscription};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

/// Tokens returned by a successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct Grant {
    pub identity: Identity,
    pub refresh_token: String,
}

impl SupabaseClient {
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Grant, RemoteError> {
        let url = self.auth_url("token?grant_type=password");
        let resp = self
            .request(Method::POST, &url, None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        self.grant(resp).await
    }

    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<Grant, RemoteError> {
        let url = self.auth_url("token?grant_type=refresh_token");
        let resp = self
            .request(Method::POST, &url, None)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        self.grant(resp).await
    }

    pub async fn sign_out_token(&self, access_token: &str) -> Result<(), RemoteError> {
        let url = self.auth_url("logout");
        let resp = self
            .request(Method::POST, &url, Some(access_token))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn grant(&self, resp: reqwest::Response) -> Result<Grant, RemoteError> {
        let tokens: TokenResponse = check(resp).await?.json().await?;
        let identity = verify_access_token(&tokens.access_token, self.jwt_secret())
            .map_err(|_| RemoteError::Decode("access token failed verification".into()))?;
        Ok(Grant {
            identity,
            refresh_token: tokens.refresh_token,
        })
    }
}

#[derive(Debug)]
struct RefreshState {
    token: Option<String>,
    ended: bool,
}

/// One browser's signed-in session, kept server-side. Once ended it stays
/// ended.
#[derive(Debug)]
pub struct SupabaseSession {
    client: SupabaseClient,
    channel: SessionChannel,
    refresh: Mutex<RefreshState>,
}

impl SupabaseSession {
    pub fn new(client: SupabaseClient, grant: Grant) -> Self {
        Self {
            client,
            channel: SessionChannel::new(Some(grant.identity)),
            refresh: Mutex::new(RefreshState {
                token: Some(grant.refresh_token),
                ended: false,
            }),
        }
    }

    /// The identity if still signed in and not expired.
    pub fn identity(&self) -> Option<Identity> {
        self.channel
            .current()
            .filter(|identity| !identity.is_expired(Utc::now()))
    }

    pub fn is_active(&self) -> bool {
        self.channel.current().is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.with_refresh(|r| r.ended)
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    /// Exchange the refresh token for a new access token. Subscribers see
    /// the new identity.
    pub async fn refresh(&self) -> Result<(), RemoteError> {
        let refresh_token = self
            .with_refresh(|r| r.token.take())
            .ok_or(RemoteError::NotAuthenticated)?;
        let result = self.client.refresh_grant(&refresh_token).await;

        // The session may have ended while the grant was in flight.
        self.with_refresh(|r| {
            if r.ended {
                return Err(RemoteError::NotAuthenticated);
            }
            match result {
                Ok(grant) => {
                    r.token = Some(grant.refresh_token);
                    self.channel.set(Some(grant.identity));
                    Ok(())
                }
                Err(e) => {
                    // Not consumed; keep it for the next attempt.
                    r.token = Some(refresh_token);
                    Err(e)
                }
            }
        })
    }

    /// Keep the session alive across access-token expiry. Returns false once
    /// the session has ended.
    pub async fn maintain(&self, now: DateTime<Utc>, refresh_window: chrono::Duration) -> bool {
        let Some(identity) = self.channel.current() else {
            return false;
        };
        if identity.expires_at - refresh_window > now {
            return true;
        }

        match self.refresh().await {
            Ok(()) => {
                tracing::debug!(user_id = %identity.user_id, "Session refreshed");
                true
            }
            Err(_) if self.is_ended() => false,
            Err(e) if identity.is_expired(now) => {
                tracing::info!(user_id = %identity.user_id, error = %e, "Session expired");
                self.end();
                false
            }
            Err(e) => {
                tracing::warn!(user_id = %identity.user_id, error = %e, "Session refresh failed, will retry");
                true
            }
        }
    }

    /// Drop the identity locally, waking every live dashboard.
    pub fn end(&self) {
        self.with_refresh(|r| {
            r.ended = true;
            r.token = None;
            self.channel.set(None);
        });
    }

    fn with_refresh<T>(&self, f: impl FnOnce(&mut RefreshState) -> T) -> T {
        match self.refresh.lock() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl SessionProvider for SupabaseSession {
    async fn current_session(&self) -> Result<Option<Identity>, RemoteError> {
        Ok(self.identity())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.channel.subscribe()
    }

    /// Local state is cleared first so the session ends even if the backend
    /// call fails.
    async fn sign_out(&self) -> Result<(), RemoteError> {
        let Some(identity) = self.channel.current() else {
            return Ok(());
        };
        self.end();
        self.client.sign_out_token(&identity.access_token).await
    }
}
