use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;

use super::auth::SupabaseSession;
use super::client::{check, SupabaseClient};
use crate::error::RemoteError;
use crate::models::entry::{MoodEntry, MoodEntryPatch, NewMoodEntry};
use crate::services::repository::EntryRepository;

/// The entry table over PostgREST, authorized as the session's user.
pub struct SupabaseEntries {
    client: SupabaseClient,
    session: Arc<SupabaseSession>,
}

impl SupabaseEntries {
    pub fn new(client: SupabaseClient, session: Arc<SupabaseSession>) -> Self {
        Self { client, session }
    }

    fn access_token(&self) -> Result<String, RemoteError> {
        self.session
            .identity()
            .map(|identity| identity.access_token)
            .ok_or(RemoteError::NotAuthenticated)
    }

    fn request(&self, method: Method) -> Result<reqwest::RequestBuilder, RemoteError> {
        let token = self.access_token()?;
        Ok(self
            .client
            .request(method, &self.client.rest_url(), Some(&token)))
    }
}

#[async_trait]
impl EntryRepository for SupabaseEntries {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<MoodEntry>, RemoteError> {
        let owner = format!("eq.{owner_id}");
        let resp = self
            .request(Method::GET)?
            .query(&[
                ("select", "*"),
                ("user_id", owner.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn insert(&self, entry: NewMoodEntry) -> Result<MoodEntry, RemoteError> {
        let resp = self
            .request(Method::POST)?
            .header("Prefer", "return=representation")
            .json(&entry)
            .send()
            .await?;
        let rows: Vec<MoodEntry> = check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no row".into()))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: MoodEntryPatch,
    ) -> Result<MoodEntry, RemoteError> {
        let filter = format!("eq.{id}");
        let resp = self
            .request(Method::PATCH)?
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let rows: Vec<MoodEntry> = check(resp).await?.json().await?;
        rows.into_iter().next().ok_or(RemoteError::NotFound)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RemoteError> {
        let filter = format!("eq.{id}");
        let resp = self
            .request(Method::DELETE)?
            .query(&[("id", filter.as_str())])
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
