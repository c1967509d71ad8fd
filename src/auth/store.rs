use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::Mutex;

use super::jwt::{hash_token, new_session_token};
use crate::supabase::SupabaseSession;

/// Server-side browser sessions, keyed by the SHA-256 of the token handed to
/// the browser.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Arc<SupabaseSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return the raw token for the browser.
    pub async fn insert(&self, session: Arc<SupabaseSession>) -> String {
        let token = new_session_token();
        self.sessions.lock().await.insert(hash_token(&token), session);
        token
    }

    /// Look up a session that is still signed in.
    pub async fn get(&self, token: &str) -> Option<Arc<SupabaseSession>> {
        self.sessions
            .lock()
            .await
            .get(&hash_token(token))
            .filter(|s| s.is_active())
            .cloned()
    }

    pub async fn remove(&self, token: &str) -> Option<Arc<SupabaseSession>> {
        self.sessions.lock().await.remove(&hash_token(token))
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Refresh sessions close to expiry and drop the ones that have ended.
    /// Returns how many were dropped.
    pub async fn sweep(&self, refresh_window: chrono::Duration) -> usize {
        // Refreshing talks to the backend, so work on a copy outside the lock.
        let snapshot: Vec<(String, Arc<SupabaseSession>)> = self
            .sessions
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let now = Utc::now();
        let mut ended = Vec::new();
        for (key, session) in snapshot {
            if !session.maintain(now, refresh_window).await {
                ended.push(key);
            }
        }

        let mut sessions = self.sessions.lock().await;
        for key in &ended {
            sessions.remove(key);
        }
        ended.len()
    }
}

/// Periodically refresh or expire sessions (runs for the process lifetime).
pub fn spawn_session_sweeper(store: SessionStore, every_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
        // Refresh anything that would expire before the next two ticks.
        let window = chrono::Duration::seconds(every_secs.max(1) as i64 * 2);
        loop {
            interval.tick().await;
            let dropped = store.sweep(window).await;
            if dropped > 0 {
                tracing::info!(dropped, "Session sweep: removed ended sessions");
            }
        }
    });
}
