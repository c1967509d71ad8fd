use crate::error::AppResult;
use crate::models::entry::{MoodEntry, MoodEntryPatch};
use crate::models::mood::MoodCode;
use crate::services::notifier::Toast;
use crate::services::Collaborators;

/// An open edit surface for one existing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    entry: MoodEntry,
    mood: MoodCode,
    note: String,
}

impl EditSession {
    /// Pre-populate from the entry being edited.
    pub fn open(entry: MoodEntry) -> Self {
        Self {
            mood: entry.mood,
            note: entry.note.clone().unwrap_or_default(),
            entry,
        }
    }

    pub fn entry(&self) -> &MoodEntry {
        &self.entry
    }

    pub fn mood(&self) -> MoodCode {
        self.mood
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn select_mood(&mut self, mood: MoodCode) {
        self.mood = mood;
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Write what the surface currently shows back to the entry. Both fields
    /// are always replaced; a blank note clears it.
    pub async fn submit(&self, collab: &Collaborators) -> AppResult<MoodEntry> {
        let id = self.entry.id;
        let patch = MoodEntryPatch::replace(self.mood, &self.note);

        match collab.entries.update_by_id(id, patch).await {
            Ok(updated) => {
                tracing::info!(entry_id = %id, mood = %updated.mood, "Mood entry updated");
                collab.notifier.notify(Toast::success(
                    "Entry updated!",
                    "Your mood entry has been updated successfully.",
                ));
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!(entry_id = %id, error = %e, "Failed to update mood entry");
                collab.notifier.notify(Toast::error("Error", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Discard local edits. Nothing is sent.
    pub fn cancel(self) {
        tracing::debug!(entry_id = %self.entry.id, "Edit cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, RemoteError};
    use crate::models::entry::NewMoodEntry;
    use crate::services::repository::EntryRepository;
    use crate::testing::Harness;

    async fn seeded(h: &Harness, owner: uuid::Uuid, mood: MoodCode, note: Option<&str>) -> MoodEntry {
        h.entries
            .insert(NewMoodEntry {
                user_id: owner,
                mood,
                note: note.map(String::from),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_prefills_from_entry() {
        let (h, id) = Harness::signed_in("ada@example.com");
        let entry = seeded(&h, id.user_id, MoodCode::Sad, None).await;

        let edit = EditSession::open(entry);
        assert_eq!(edit.mood(), MoodCode::Sad);
        assert_eq!(edit.note(), "");
    }

    #[tokio::test]
    async fn test_submit_replaces_both_fields() {
        let (h, id) = Harness::signed_in("ada@example.com");
        let entry = seeded(&h, id.user_id, MoodCode::Sad, Some("rough day")).await;

        let mut edit = EditSession::open(entry.clone());
        edit.select_mood(MoodCode::Excited);
        edit.set_note("");
        let updated = edit.submit(&h.collaborators()).await.unwrap();

        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.user_id, entry.user_id);
        assert_eq!(updated.created_at, entry.created_at);
        assert!(updated.updated_at > entry.updated_at);
        assert_eq!(updated.mood, MoodCode::Excited);
        assert_eq!(updated.note, None);
        assert_eq!(h.toast_titles(), vec!["Entry updated!"]);
    }

    #[tokio::test]
    async fn test_untouched_note_is_kept() {
        let (h, id) = Harness::signed_in("ada@example.com");
        let entry = seeded(&h, id.user_id, MoodCode::Sad, Some("rough day")).await;

        let mut edit = EditSession::open(entry);
        edit.select_mood(MoodCode::Excited);
        let updated = edit.submit(&h.collaborators()).await.unwrap();

        assert_eq!(updated.note.as_deref(), Some("rough day"));
    }

    #[tokio::test]
    async fn test_failure_reports_and_keeps_local_edits() {
        let (h, id) = Harness::signed_in("ada@example.com");
        let entry = seeded(&h, id.user_id, MoodCode::Happy, None).await;
        h.entries.fail_with(RemoteError::Transport("connection reset".into()));

        let mut edit = EditSession::open(entry);
        edit.set_note("changed");
        let err = edit.submit(&h.collaborators()).await.unwrap_err();

        assert!(matches!(err, AppError::Remote(RemoteError::Transport(_))));
        assert_eq!(edit.note(), "changed");
        assert_eq!(h.toasts.drain()[0].description, "Network error: connection reset");
    }

    #[tokio::test]
    async fn test_cancel_sends_nothing() {
        let (h, id) = Harness::signed_in("ada@example.com");
        let entry = seeded(&h, id.user_id, MoodCode::Happy, None).await;

        let mut edit = EditSession::open(entry);
        edit.select_mood(MoodCode::Sad);
        edit.cancel();

        assert_eq!(h.entries.count(&h.entries.calls.update), 0);
        assert_eq!(h.entries.rows()[0].mood, MoodCode::Happy);
    }
}
