use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The authenticated principal on whose behalf entries are read and written.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// Name used in the dashboard greeting: the local part of the email.
    pub fn display_name(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|s| !s.is_empty())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
