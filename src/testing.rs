//! In-memory collaborators for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::jwt::sign_for_tests;

use crate::error::RemoteError;
use crate::models::entry::{MoodEntry, MoodEntryPatch, NewMoodEntry};
use crate::models::identity::Identity;
use crate::services::notifier::ToastBuffer;
use crate::services::repository::EntryRepository;
use crate::services::session::{SessionChannel, SessionProvider, SessionSubscription};
use crate::services::Collaborators;

pub fn identity(email: &str) -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        email: Some(email.into()),
        access_token: format!("access-{email}"),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

#[derive(Default)]
pub struct CallCounts {
    pub list: AtomicUsize,
    pub insert: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
}

/// Entry table kept in memory. Timestamps come from a logical clock so every
/// insert gets a distinct `created_at`.
#[derive(Default)]
pub struct MemoryEntries {
    rows: Mutex<Vec<MoodEntry>>,
    clock: AtomicUsize,
    failure: Mutex<Option<RemoteError>>,
    pub calls: CallCounts,
}

impl MemoryEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `err` until `recover`.
    pub fn fail_with(&self, err: RemoteError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn rows(&self) -> Vec<MoodEntry> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn tick(&self) -> DateTime<Utc> {
        let n = self.clock.fetch_add(1, Ordering::SeqCst) as i64;
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(n)
    }

    fn check(&self) -> Result<(), RemoteError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntryRepository for MemoryEntries {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<MoodEntry>, RemoteError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows: Vec<MoodEntry> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, entry: NewMoodEntry) -> Result<MoodEntry, RemoteError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let now = self.tick();
        let row = MoodEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            mood: entry.mood,
            note: entry.note,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: MoodEntryPatch,
    ) -> Result<MoodEntry, RemoteError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let now = self.tick();
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RemoteError::NotFound)?;
        if let Some(mood) = patch.mood {
            row.mood = mood;
        }
        if let Some(note) = patch.note {
            row.note = note;
        }
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RemoteError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.rows.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }
}

/// Session provider whose identity is driven by the test.
pub struct FakeSession {
    pub channel: SessionChannel,
    sign_out_error: Mutex<Option<RemoteError>>,
    pub sign_outs: AtomicUsize,
}

impl FakeSession {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            channel: SessionChannel::new(identity),
            sign_out_error: Mutex::new(None),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn fail_sign_out(&self, err: RemoteError) {
        *self.sign_out_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl SessionProvider for FakeSession {
    async fn current_session(&self) -> Result<Option<Identity>, RemoteError> {
        Ok(self.channel.current())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.channel.subscribe()
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.channel.set(None);
        match self.sign_out_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub struct Harness {
    pub session: Arc<FakeSession>,
    pub entries: Arc<MemoryEntries>,
    pub toasts: Arc<ToastBuffer>,
}

impl Harness {
    pub fn signed_in(email: &str) -> (Self, Identity) {
        let id = identity(email);
        (Self::with_identity(Some(id.clone())), id)
    }

    pub fn with_identity(identity: Option<Identity>) -> Self {
        Self {
            session: Arc::new(FakeSession::new(identity)),
            entries: Arc::new(MemoryEntries::new()),
            toasts: Arc::new(ToastBuffer::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.session.clone(),
            self.entries.clone(),
            self.toasts.clone(),
        )
    }

    pub fn toast_titles(&self) -> Vec<String> {
        self.toasts.drain().into_iter().map(|t| t.title).collect()
    }
}

pub const MOCK_JWT_SECRET: &str = "test-jwt-secret-with-enough-length";

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub type MockTable = Arc<Mutex<Vec<Value>>>;
type Params = Query<HashMap<String, String>>;

pub const MOCK_PASSWORD: &str = "correct horse";
pub const MOCK_DB_ERROR: &str = "database unavailable";

#[derive(Clone, Default)]
struct MockState {
    table: MockTable,
    failing: Arc<Mutex<Vec<Method>>>,
}

impl MockState {
    /// The configured failure for `method` on the entry table, if any.
    fn failure(&self, method: Method) -> Option<Response> {
        self.failing.lock().unwrap().contains(&method).then(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "code": "XX000", "message": MOCK_DB_ERROR })),
            )
                .into_response()
        })
    }
}

/// Just enough of the hosted backend (auth + entry table) to drive the
/// Supabase collaborators end to end.
pub struct MockSupabase {
    pub base_url: String,
    pub table: MockTable,
    pub user_id: Uuid,
    failing: Arc<Mutex<Vec<Method>>>,
}

impl MockSupabase {
    pub async fn start() -> Self {
        let state = MockState::default();
        let user_id = Uuid::new_v4();
        let base_url = spawn_mock(supabase_router(state.clone(), user_id)).await;
        Self {
            base_url,
            table: state.table,
            user_id,
            failing: state.failing,
        }
    }

    pub fn config(&self) -> crate::config::Config {
        crate::config::Config::for_tests(&self.base_url)
    }

    /// Answer every `method` request on the entry table with a 500.
    pub fn fail(&self, method: Method) {
        self.failing.lock().unwrap().push(method);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }
}

fn id_filter(q: &HashMap<String, String>) -> String {
    q.get("id")
        .and_then(|f| f.strip_prefix("eq."))
        .unwrap_or_default()
        .to_string()
}

fn supabase_router(state: MockState, user_id: Uuid) -> Router {
    Router::new()
        .route(
            "/auth/v1/token",
            post(move |Json(body): Json<Value>| async move {
                if body["password"] != MOCK_PASSWORD && body["refresh_token"] != "mock-refresh" {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
                    );
                }
                let access = sign_for_tests(user_id, "ada@example.com", 3600, MOCK_JWT_SECRET);
                (
                    StatusCode::OK,
                    Json(json!({ "access_token": access, "refresh_token": "mock-refresh", "expires_in": 3600 })),
                )
            }),
        )
        .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route("/auth/v1/health", get(|| async { Json(json!({ "name": "GoTrue" })) }))
        .route(
            "/rest/v1/mood_entries",
            get(|State(s): State<MockState>, Query(q): Params, headers: HeaderMap| async move {
                if let Some(resp) = s.failure(Method::GET) {
                    return resp;
                }
                assert!(headers.get("apikey").is_some());
                assert_eq!(q.get("order").map(String::as_str), Some("created_at.desc"));
                let owner = q["user_id"].strip_prefix("eq.").unwrap().to_string();
                let mut rows: Vec<Value> = s
                    .table
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|r| r["user_id"] == owner.as_str())
                    .cloned()
                    .collect();
                rows.sort_by(|a, b| b["created_at"].as_str().cmp(&a["created_at"].as_str()));
                Json(rows).into_response()
            })
            .post(|State(s): State<MockState>, headers: HeaderMap, Json(body): Json<Value>| async move {
                if let Some(resp) = s.failure(Method::POST) {
                    return resp;
                }
                assert_eq!(headers["prefer"], "return=representation");
                // Distinct, increasing timestamps
                std::thread::sleep(std::time::Duration::from_millis(2));
                let now = Utc::now().to_rfc3339();
                let mut row = body;
                row["id"] = json!(Uuid::new_v4());
                row["created_at"] = json!(now);
                row["updated_at"] = json!(now);
                s.table.lock().unwrap().push(row.clone());
                (StatusCode::CREATED, Json(vec![row])).into_response()
            })
            .patch(|State(s): State<MockState>, Query(q): Params, Json(body): Json<Value>| async move {
                if let Some(resp) = s.failure(Method::PATCH) {
                    return resp;
                }
                let id = id_filter(&q);
                let mut rows = s.table.lock().unwrap();
                let updated: Vec<Value> = rows
                    .iter_mut()
                    .filter(|r| r["id"] == id.as_str())
                    .map(|r| {
                        if let Some(fields) = body.as_object() {
                            for (k, v) in fields {
                                r[k.as_str()] = v.clone();
                            }
                        }
                        r["updated_at"] = json!((Utc::now() + Duration::seconds(1)).to_rfc3339());
                        r.clone()
                    })
                    .collect();
                Json(updated).into_response()
            })
            .delete(|State(s): State<MockState>, Query(q): Params| async move {
                if let Some(resp) = s.failure(Method::DELETE) {
                    return resp;
                }
                let id = id_filter(&q);
                s.table.lock().unwrap().retain(|r| r["id"] != id.as_str());
                StatusCode::NO_CONTENT.into_response()
            }),
        )
        .with_state(state)
}
