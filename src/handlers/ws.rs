use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::middleware::BrowserSession;
use crate::dto::parse_mood;
use crate::error::AppError;
use crate::journal::{CreateForm, Dashboard, DashboardSnapshot, Navigation, AUTH_SURFACE};
use crate::services::notifier::{ChannelNotifier, Toast};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Commands a live dashboard accepts.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Refresh,
    Create {
        #[serde(default)]
        mood: Option<String>,
        #[serde(default)]
        note: String,
    },
    BeginEdit {
        id: Uuid,
    },
    SubmitEdit {
        #[serde(default)]
        mood: Option<String>,
        #[serde(default)]
        note: String,
    },
    CancelEdit,
    Delete {
        id: Uuid,
        #[serde(default)]
        confirmed: bool,
    },
    SignOut,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Snapshot { dashboard: DashboardSnapshot },
    Toast { toast: Toast },
    Redirect { to: &'static str },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let browser = match authenticate_ws(&state, query.token).await {
        Ok(browser) => browser,
        Err(e) => {
            tracing::warn!("WebSocket auth failed: {}", e);
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, browser))
}

async fn authenticate_ws(state: &AppState, token: Option<String>) -> Result<BrowserSession, &'static str> {
    let token = token.ok_or("Missing token query parameter")?;
    let session = state
        .sessions
        .get(&token)
        .await
        .ok_or("Unknown or ended session")?;
    Ok(BrowserSession { token, session })
}

type Sender = SplitSink<WebSocket, Message>;

async fn send(sender: &mut Sender, frame: &ServerFrame) -> bool {
    match serde_json::to_string(frame) {
        Ok(text) => sender.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode frame");
            false
        }
    }
}

async fn flush_toasts(sender: &mut Sender, toasts: &mut mpsc::UnboundedReceiver<Toast>) -> bool {
    while let Ok(toast) = toasts.try_recv() {
        if !send(sender, &ServerFrame::Toast { toast }).await {
            return false;
        }
    }
    true
}

/// One live dashboard per connection. Its session subscription is released
/// when the loop ends, whichever way it ends.
async fn handle_socket(socket: WebSocket, state: AppState, browser: BrowserSession) {
    let (mut sender, mut receiver) = socket.split();
    let user_id = browser.session.identity().map(|i| i.user_id);

    tracing::debug!(user_id = ?user_id, "Dashboard connection established");

    let (toast_tx, mut toast_rx) = mpsc::unbounded_channel();
    let notifier = Arc::new(ChannelNotifier::new(toast_tx));
    let mut dashboard = Dashboard::new(state.collaborators(&browser, notifier));

    let mut navigation = dashboard.initialize().await;

    while navigation == Navigation::Stay {
        if !flush_toasts(&mut sender, &mut toast_rx).await
            || !send(&mut sender, &ServerFrame::Snapshot { dashboard: dashboard.snapshot() }).await
        {
            break;
        }

        tokio::select! {
            change = dashboard.next_session_change() => match change {
                Some(nav) => navigation = nav,
                None => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    navigation = run_command(&mut dashboard, &text).await;
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                _ => {}
            },
        }
    }

    if navigation == Navigation::RedirectToAuth {
        let _ = flush_toasts(&mut sender, &mut toast_rx).await;
        let _ = send(&mut sender, &ServerFrame::Redirect { to: AUTH_SURFACE }).await;
        let _ = sender.close().await;
    }

    dashboard.teardown();
    forget_ended_session(&state, &browser).await;
    tracing::debug!(user_id = ?user_id, "Dashboard connection closed");
}

/// A session signed out from this connection (or anywhere else) must not
/// authenticate the browser's token again.
async fn forget_ended_session(state: &AppState, browser: &BrowserSession) {
    if browser.session.is_ended() {
        state.sessions.remove(&browser.token).await;
    }
}

/// Failures have already been reported as toasts by the flows.
async fn run_command(dashboard: &mut Dashboard, text: &str) -> Navigation {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed dashboard command");
            return Navigation::Stay;
        }
    };

    let result = match command {
        ClientCommand::Refresh => dashboard.refresh().await,
        ClientCommand::Create { mood, note } => match parse_mood(mood.as_deref()) {
            Ok(mood) => {
                let mut form = CreateForm::with(mood, note);
                dashboard.create(&mut form).await.map(|_| ())
            }
            Err(e) => Err(e),
        },
        ClientCommand::BeginEdit { id } => dashboard.begin_edit(id).map(|_| ()),
        ClientCommand::SubmitEdit { mood, note } => match parse_mood(mood.as_deref()) {
            Ok(Some(mood)) => {
                if let Some(edit) = dashboard.editing_mut() {
                    edit.select_mood(mood);
                    edit.set_note(note);
                }
                dashboard.submit_edit().await.map(|_| ())
            }
            Ok(None) => Err(AppError::Validation("Please select a mood".into())),
            Err(e) => Err(e),
        },
        ClientCommand::CancelEdit => {
            dashboard.cancel_edit();
            Ok(())
        }
        ClientCommand::Delete { id, confirmed } => {
            dashboard.delete(id, confirmed.into()).await.map(|_| ())
        }
        ClientCommand::SignOut => return dashboard.sign_out().await,
    };

    match result {
        Err(AppError::AuthRequired) => Navigation::RedirectToAuth,
        Err(e) => {
            tracing::debug!(error = %e, "Dashboard command failed");
            Navigation::Stay
        }
        Ok(()) => Navigation::Stay,
    }
}
