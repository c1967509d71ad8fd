use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::Config;
use crate::error::RemoteError;

/// Shared HTTP client for the hosted backend's auth and REST APIs.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    jwt_secret: String,
    table: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mood-journal-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            jwt_secret: config.supabase_jwt_secret.clone(),
            table: config.entries_table.clone(),
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub(crate) fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Request carrying the project key, authorized as `bearer` or, when
    /// absent, as the anonymous role.
    pub(crate) fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
    }

    /// Whether the auth service answers its health probe.
    pub async fn health(&self) -> Result<(), RemoteError> {
        let resp = self
            .request(Method::GET, &self.auth_url("health"), None)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

/// Error bodies differ between the auth and REST services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pass successful responses through; turn anything else into a
/// `RemoteError` carrying the backend's message.
pub(crate) async fn check(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Backend {
        status: status.as_u16(),
        message: backend_message(status.as_u16(), &body),
    })
}

pub(crate) fn backend_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error_description)
        .or(parsed.msg)
        .or(parsed.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}
