use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::models::entry::{MoodEntry, MoodEntryPatch, NewMoodEntry};

/// The remote entry table. Implementations are bound to the caller's session,
/// and the backend enforces that only the caller's own rows are visible.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// All entries of `owner_id`, newest `created_at` first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<MoodEntry>, RemoteError>;

    async fn insert(&self, entry: NewMoodEntry) -> Result<MoodEntry, RemoteError>;

    async fn update_by_id(&self, id: Uuid, patch: MoodEntryPatch)
        -> Result<MoodEntry, RemoteError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RemoteError>;
}
