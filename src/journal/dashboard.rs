use serde::Serialize;
use uuid::Uuid;

use super::create::CreateForm;
use super::edit::EditSession;
use super::list::{delete_entry, Confirmation, ListView};
use crate::error::{AppError, AppResult, RemoteError};
use crate::models::entry::MoodEntry;
use crate::models::identity::Identity;
use crate::models::mood::MoodCode;
use crate::services::notifier::Toast;
use crate::services::session::SessionSubscription;
use crate::services::Collaborators;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DashboardState {
    Initializing,
    Unauthenticated,
    Loading,
    Ready,
}

/// What the view should do after a controller step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    RedirectToAuth,
}

/// Owns the signed-in user's entry collection for the lifetime of one
/// dashboard view.
///
/// The collection is only ever replaced wholesale by a fresh fetch; every
/// successful create, edit or delete is followed by a full refresh. The
/// session-change subscription taken in `initialize` lives until the
/// dashboard is torn down or dropped.
pub struct Dashboard {
    collab: Collaborators,
    state: DashboardState,
    identity: Option<Identity>,
    entries: Vec<MoodEntry>,
    editing: Option<EditSession>,
    subscription: Option<SessionSubscription>,
    // Set while the collection could not be fetched
    load_error: Option<RemoteError>,
}

impl Dashboard {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            collab,
            state: DashboardState::Initializing,
            identity: None,
            entries: Vec::new(),
            editing: None,
            subscription: None,
            load_error: None,
        }
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut EditSession> {
        self.editing.as_mut()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .map(SessionSubscription::is_active)
            .unwrap_or(false)
    }

    /// Query the session once and load entries if someone is signed in.
    /// Subscribes to session changes before the query so none are missed.
    pub async fn initialize(&mut self) -> Navigation {
        if self.subscription.is_none() {
            self.subscription = Some(self.collab.session.on_session_change());
        }

        let identity = match self.collab.session.current_session().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating as signed out");
                None
            }
        };
        self.apply_identity(identity).await
    }

    /// Wait for the next session change and react to it. `None` when the
    /// subscription has been released.
    pub async fn next_session_change(&mut self) -> Option<Navigation> {
        let identity = self.subscription.as_mut()?.changed().await?;
        Some(self.handle_session_change(identity).await)
    }

    pub async fn handle_session_change(&mut self, identity: Option<Identity>) -> Navigation {
        match &identity {
            Some(id) => tracing::debug!(user_id = %id.user_id, "Session changed: signed in"),
            None => tracing::debug!("Session changed: signed out"),
        }
        self.apply_identity(identity).await
    }

    async fn apply_identity(&mut self, identity: Option<Identity>) -> Navigation {
        match identity {
            None => {
                self.state = DashboardState::Unauthenticated;
                self.identity = None;
                self.entries.clear();
                self.editing = None;
                self.load_error = None;
                Navigation::RedirectToAuth
            }
            Some(identity) => {
                self.identity = Some(identity);
                self.state = DashboardState::Loading;
                // A failed load is already reported; the view still opens.
                let _ = self.refresh().await;
                Navigation::Stay
            }
        }
    }

    /// Re-fetch the whole collection and replace it. On failure the last
    /// good collection is kept.
    pub async fn refresh(&mut self) -> AppResult<()> {
        let owner = self.signed_in()?.user_id;

        let result = self.collab.entries.list_by_owner(owner).await;
        if self.state == DashboardState::Loading {
            self.state = DashboardState::Ready;
        }

        match result {
            Ok(entries) => {
                tracing::debug!(user_id = %owner, count = entries.len(), "Entries loaded");
                self.entries = entries;
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %owner, error = %e, "Failed to load entries");
                self.collab
                    .notifier
                    .notify(Toast::error("Error", "Failed to load mood entries"));
                self.load_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    pub async fn create(&mut self, form: &mut CreateForm) -> AppResult<MoodEntry> {
        self.signed_in()?;
        let entry = form.submit(&self.collab).await?;
        self.refresh_after_mutation().await;
        Ok(entry)
    }

    /// Open the edit surface for an entry of the current collection. An id
    /// missing from a collection that failed to load reports the load error.
    pub fn begin_edit(&mut self, id: Uuid) -> AppResult<&mut EditSession> {
        self.signed_in()?;
        let Some(entry) = self.entries.iter().find(|e| e.id == id).cloned() else {
            return Err(match &self.load_error {
                Some(e) => AppError::Remote(e.clone()),
                None => AppError::NotFound("Entry not found".into()),
            });
        };
        Ok(self.editing.insert(EditSession::open(entry)))
    }

    /// Submit the open edit surface. It closes on success and stays open on
    /// failure.
    pub async fn submit_edit(&mut self) -> AppResult<MoodEntry> {
        self.signed_in()?;
        let edit = self
            .editing
            .as_ref()
            .ok_or_else(|| AppError::Validation("No entry is being edited".into()))?;

        let updated = edit.submit(&self.collab).await?;
        self.editing = None;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    /// Convenience for views that submit an edit in one step.
    pub async fn edit(&mut self, id: Uuid, mood: MoodCode, note: &str) -> AppResult<MoodEntry> {
        let edit = self.begin_edit(id)?;
        edit.select_mood(mood);
        edit.set_note(note);
        self.submit_edit().await
    }

    pub fn cancel_edit(&mut self) {
        if let Some(edit) = self.editing.take() {
            edit.cancel();
        }
    }

    /// Returns whether the entry was deleted.
    pub async fn delete(&mut self, id: Uuid, confirmation: Confirmation) -> AppResult<bool> {
        self.signed_in()?;
        let deleted = delete_entry(&self.collab, id, confirmation).await?;
        if deleted {
            self.refresh_after_mutation().await;
        }
        Ok(deleted)
    }

    /// Invalidate the session. The view always goes to the auth surface; a
    /// provider failure is only reported.
    pub async fn sign_out(&mut self) -> Navigation {
        if let Err(e) = self.collab.session.sign_out().await {
            tracing::warn!(error = %e, "Sign out failed");
            self.collab
                .notifier
                .notify(Toast::error("Error", "Failed to sign out"));
        }
        self.apply_identity(None).await
    }

    /// Release the session subscription.
    pub fn teardown(mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.cancel();
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            state: self.state,
            greeting: self.identity.as_ref().map(|id| match id.display_name() {
                Some(name) => format!("How are you feeling today, {name}?"),
                None => "How are you feeling today?".to_string(),
            }),
            list: (self.state == DashboardState::Ready).then(|| ListView::render(&self.entries)),
            editing: self.editing.as_ref().map(|e| EditingView {
                id: e.entry().id,
                mood: e.mood(),
                note: e.note().to_string(),
            }),
        }
    }

    fn signed_in(&self) -> AppResult<&Identity> {
        self.identity.as_ref().ok_or(AppError::AuthRequired)
    }

    async fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Refresh after mutation failed");
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSnapshot {
    pub state: DashboardState,
    pub greeting: Option<String>,
    pub list: Option<ListView>,
    pub editing: Option<EditingView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EditingView {
    pub id: Uuid,
    pub mood: MoodCode,
    pub note: String,
}
