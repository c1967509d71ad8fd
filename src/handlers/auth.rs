use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::BrowserSession;
use crate::dto::{LoginRequest, LoginResponse, RedirectResponse, UserSummary};
use crate::error::{AppError, AppResult, RemoteError};
use crate::journal::{Dashboard, AUTH_SURFACE};
use crate::services::notifier::ToastBuffer;
use crate::supabase::SupabaseSession;
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let grant = state
        .supabase
        .sign_in_with_password(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            // Wrong credentials, unconfirmed email and the like
            RemoteError::Backend { status, message } if status < 500 => {
                AppError::Validation(message)
            }
            other => other.into(),
        })?;

    let identity = grant.identity.clone();
    let session = Arc::new(SupabaseSession::new(state.supabase.clone(), grant));
    let session_token = state.sessions.insert(session).await;

    tracing::info!(user_id = %identity.user_id, "Signed in");

    Ok(Json(LoginResponse {
        session_token,
        expires_at: identity.expires_at,
        user: UserSummary {
            id: identity.user_id,
            email: identity.email,
        },
    }))
}

/// Sign out through the dashboard's sign-out command. The client is always
/// sent to the auth surface.
pub async fn logout(
    State(state): State<AppState>,
    Extension(browser): Extension<BrowserSession>,
) -> Json<RedirectResponse> {
    let toasts = Arc::new(ToastBuffer::new());
    let mut dashboard = Dashboard::new(state.collaborators(&browser, toasts.clone()));
    dashboard.sign_out().await;
    dashboard.teardown();

    state.sessions.remove(&browser.token).await;

    Json(RedirectResponse {
        redirect: AUTH_SURFACE,
        toasts: toasts.drain(),
    })
}

pub async fn me(Extension(browser): Extension<BrowserSession>) -> AppResult<Json<UserSummary>> {
    let identity = browser.session.identity().ok_or(AppError::AuthRequired)?;
    Ok(Json(UserSummary {
        id: identity.user_id,
        email: identity.email,
    }))
}
