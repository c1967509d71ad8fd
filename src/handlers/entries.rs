use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::BrowserSession;
use crate::dto::{
    parse_mood, CreateEntryRequest, DashboardResponse, DeleteQuery, UpdateEntryRequest,
};
use crate::error::{AppError, DashboardError};
use crate::journal::{CreateForm, Dashboard, Navigation};
use crate::services::notifier::ToastBuffer;
use crate::AppState;

type DashboardResult<T> = Result<T, DashboardError>;

/// A dashboard scoped to one request. Toasts raised while serving it are
/// returned with the response, on success and on failure.
struct RequestDashboard {
    dashboard: Dashboard,
    toasts: Arc<ToastBuffer>,
}

impl RequestDashboard {
    async fn open(state: &AppState, browser: &BrowserSession) -> DashboardResult<Self> {
        let toasts = Arc::new(ToastBuffer::new());
        let mut dashboard = Dashboard::new(state.collaborators(browser, toasts.clone()));
        match dashboard.initialize().await {
            Navigation::Stay => Ok(Self { dashboard, toasts }),
            Navigation::RedirectToAuth => {
                dashboard.teardown();
                Err(AppError::AuthRequired.into())
            }
        }
    }

    fn respond(self, deleted: Option<bool>) -> Json<DashboardResponse> {
        let response = DashboardResponse {
            dashboard: self.dashboard.snapshot(),
            toasts: self.toasts.drain(),
            deleted,
        };
        self.dashboard.teardown();
        Json(response)
    }

    fn fail(self, error: AppError) -> DashboardError {
        self.dashboard.teardown();
        DashboardError {
            error,
            toasts: self.toasts.drain(),
        }
    }

    fn finish<T>(
        self,
        result: Result<T, AppError>,
        deleted: impl FnOnce(T) -> Option<bool>,
    ) -> DashboardResult<Json<DashboardResponse>> {
        match result {
            Ok(value) => Ok(self.respond(deleted(value))),
            Err(e) => Err(self.fail(e)),
        }
    }
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(browser): Extension<BrowserSession>,
) -> DashboardResult<Json<DashboardResponse>> {
    let view = RequestDashboard::open(&state, &browser).await?;
    Ok(view.respond(None))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(browser): Extension<BrowserSession>,
    Json(body): Json<CreateEntryRequest>,
) -> DashboardResult<Json<DashboardResponse>> {
    let mood = parse_mood(body.mood.as_deref())?;
    let mut view = RequestDashboard::open(&state, &browser).await?;

    let mut form = CreateForm::with(mood, body.note);
    let result = view.dashboard.create(&mut form).await;

    view.finish(result, |_| None)
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(browser): Extension<BrowserSession>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateEntryRequest>,
) -> DashboardResult<Json<DashboardResponse>> {
    let mood = parse_mood(body.mood.as_deref())?
        .ok_or_else(|| AppError::Validation("Please select a mood".into()))?;
    let mut view = RequestDashboard::open(&state, &browser).await?;

    let result = view.dashboard.edit(entry_id, mood, &body.note).await;

    view.finish(result, |_| None)
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(browser): Extension<BrowserSession>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> DashboardResult<Json<DashboardResponse>> {
    let mut view = RequestDashboard::open(&state, &browser).await?;

    let result = view.dashboard.delete(entry_id, query.confirm.into()).await;

    view.finish(result, Some)
}
