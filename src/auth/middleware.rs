use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::AppError;
use crate::supabase::SupabaseSession;
use crate::AppState;

/// The caller's server-side session, inserted by `require_auth`.
#[derive(Clone)]
pub struct BrowserSession {
    pub token: String,
    pub session: Arc<SupabaseSession>,
}

pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::AuthRequired)?;
    let token = bearer.token().to_string();

    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or(AppError::AuthRequired)?;

    // Expired but not yet swept
    if session.identity().is_none() {
        return Err(AppError::AuthRequired);
    }

    req.extensions_mut().insert(BrowserSession { token, session });
    Ok(next.run(req).await)
}
