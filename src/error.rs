use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::journal::AUTH_SURFACE;
use crate::services::notifier::Toast;

/// Failure of a call into the hosted backend (session or entry table).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Entry not found")]
    NotFound,

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not shown to the user; the client is sent to the auth surface.
    #[error("Authentication required")]
    AuthRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Remote(RemoteError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Remote(RemoteError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        let status = self.status();
        let message = match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::AuthRequired => self.to_string(),
            AppError::Remote(e) => {
                tracing::error!(error = %e, "Remote operation failed");
                e.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".into()
            }
        };

        let mut body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
            }
        });
        if status == StatusCode::UNAUTHORIZED {
            body["redirect"] = json!(AUTH_SURFACE);
        }
        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// An error from a dashboard route together with the toasts its flow raised
/// before failing.
#[derive(Debug)]
pub struct DashboardError {
    pub error: AppError,
    pub toasts: Vec<Toast>,
}

impl From<AppError> for DashboardError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            toasts: Vec::new(),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let mut body = self.error.body();
        body["toasts"] = json!(self.toasts);
        (self.error.status(), Json(body)).into_response()
    }
}
