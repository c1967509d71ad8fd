use crate::error::{AppError, AppResult, RemoteError};
use crate::models::entry::{normalize_note, MoodEntry, NewMoodEntry};
use crate::models::mood::MoodCode;
use crate::services::notifier::Toast;
use crate::services::Collaborators;

/// Local state of the "log a mood" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateForm {
    mood: Option<MoodCode>,
    note: String,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mood: Option<MoodCode>, note: impl Into<String>) -> Self {
        Self {
            mood,
            note: note.into(),
        }
    }

    pub fn select_mood(&mut self, mood: MoodCode) {
        self.mood = Some(mood);
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    pub fn mood(&self) -> Option<MoodCode> {
        self.mood
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Insert a new entry for the signed-in identity.
    ///
    /// Without a selected mood nothing is sent. On success the form is
    /// cleared; on failure it is left as-is so the user can resubmit. Every
    /// outcome is reported through the notifier exactly once.
    pub async fn submit(&mut self, collab: &Collaborators) -> AppResult<MoodEntry> {
        let Some(mood) = self.mood else {
            collab.notifier.notify(Toast::error(
                "Please select a mood",
                "Choose how you're feeling today",
            ));
            return Err(AppError::Validation("Please select a mood".into()));
        };

        match self.insert(collab, mood).await {
            Ok(entry) => {
                tracing::info!(entry_id = %entry.id, mood = %mood, "Mood entry created");
                collab.notifier.notify(Toast::success(
                    "Mood logged!",
                    "Your mood has been saved successfully.",
                ));
                *self = Self::default();
                Ok(entry)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create mood entry");
                collab.notifier.notify(Toast::error("Error", e.to_string()));
                Err(e.into())
            }
        }
    }

    async fn insert(&self, collab: &Collaborators, mood: MoodCode) -> Result<MoodEntry, RemoteError> {
        let identity = collab
            .session
            .current_session()
            .await?
            .ok_or(RemoteError::NotAuthenticated)?;

        collab
            .entries
            .insert(NewMoodEntry {
                user_id: identity.user_id,
                mood,
                note: normalize_note(&self.note),
            })
            .await
    }
}
