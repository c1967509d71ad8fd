//! Request/response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::journal::DashboardSnapshot;
use crate::models::mood::MoodCode;
use crate::services::notifier::Toast;

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Returned whenever the client must go to the auth surface.
#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub redirect: &'static str,
    pub toasts: Vec<Toast>,
}

// ============================================================================
// Entries
// ============================================================================

/// POST /api/entries. An empty or missing mood is a validation failure,
/// reported by the create flow.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub note: String,
}

/// PUT /api/entries/:id. Both fields replace what is stored; a missing mood
/// is rejected by the handler.
#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub note: String,
}

/// DELETE /api/entries/:id
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub dashboard: DashboardSnapshot,
    pub toasts: Vec<Toast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

/// Treat a blank mood as "not selected"; reject codes outside the vocabulary.
pub fn parse_mood(raw: Option<&str>) -> AppResult<Option<MoodCode>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(code) => code
            .parse()
            .map(Some)
            .map_err(|e: crate::models::mood::UnknownMood| AppError::Validation(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mood() {
        assert_eq!(parse_mood(None).unwrap(), None);
        assert_eq!(parse_mood(Some("")).unwrap(), None);
        assert_eq!(parse_mood(Some("happy")).unwrap(), Some(MoodCode::Happy));
        assert!(matches!(parse_mood(Some("grumpy")), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginRequest {
            email: "ada@example.com".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
