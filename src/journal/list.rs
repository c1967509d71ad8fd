use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::entry::MoodEntry;
use crate::models::mood::MoodDisplay;
use crate::services::notifier::Toast;
use crate::services::Collaborators;

const TIMESTAMP_FORMAT: &str = "%b %-d, %Y • %-I:%M %p";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryRow {
    pub id: Uuid,
    pub mood: MoodDisplay,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub timestamp: String,
}

impl From<&MoodEntry> for EntryRow {
    fn from(entry: &MoodEntry) -> Self {
        Self {
            id: entry.id,
            mood: entry.mood.display(),
            note: entry.note.clone(),
            created_at: entry.created_at,
            timestamp: entry.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListView {
    Empty {
        glyph: &'static str,
        title: &'static str,
        hint: &'static str,
    },
    Entries {
        heading: &'static str,
        rows: Vec<EntryRow>,
    },
}

impl ListView {
    /// Rows keep the order of `entries`.
    pub fn render(entries: &[MoodEntry]) -> Self {
        if entries.is_empty() {
            return ListView::Empty {
                glyph: "📝",
                title: "No mood entries yet",
                hint: "Start by logging your first mood above!",
            };
        }
        ListView::Entries {
            heading: "Your Mood History",
            rows: entries.iter().map(EntryRow::from).collect(),
        }
    }
}

/// The user's answer to "Are you sure you want to delete this mood entry?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

/// Delete one entry once the user has confirmed. Returns whether a delete
/// was issued and succeeded; declining issues nothing.
pub async fn delete_entry(
    collab: &Collaborators,
    id: Uuid,
    confirmation: Confirmation,
) -> AppResult<bool> {
    if confirmation == Confirmation::Declined {
        tracing::debug!(entry_id = %id, "Delete declined");
        return Ok(false);
    }

    match collab.entries.delete_by_id(id).await {
        Ok(()) => {
            tracing::info!(entry_id = %id, "Mood entry deleted");
            collab.notifier.notify(Toast::success(
                "Entry deleted",
                "Your mood entry has been removed.",
            ));
            Ok(true)
        }
        Err(e) => {
            tracing::warn!(entry_id = %id, error = %e, "Failed to delete mood entry");
            collab
                .notifier
                .notify(Toast::error("Error", "Failed to delete entry"));
            Err(e.into())
        }
    }
}
