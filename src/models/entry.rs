use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mood::MoodCode;

/// A row of the `mood_entries` table. `id`, `user_id` and `created_at` are
/// assigned by the backend and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: MoodCode,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewMoodEntry {
    pub user_id: Uuid,
    pub mood: MoodCode,
    pub note: Option<String>,
}

/// Update payload. Only supplied fields change; `note: Some(None)` clears
/// the note and is sent as an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MoodEntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
}

impl MoodEntryPatch {
    /// Replace both fields, which is what the edit surface submits.
    pub fn replace(mood: MoodCode, note: &str) -> Self {
        Self {
            mood: Some(mood),
            note: Some(normalize_note(note)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mood.is_none() && self.note.is_none()
    }
}

/// Blank input means "no note", never an empty string.
pub fn normalize_note(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
