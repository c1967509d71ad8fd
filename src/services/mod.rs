pub mod notifier;
pub mod repository;
pub mod session;

use std::sync::Arc;

use notifier::Notifier;
use repository::EntryRepository;
use session::SessionProvider;

/// The collaborators a dashboard and its flows are wired with.
#[derive(Clone)]
pub struct Collaborators {
    pub session: Arc<dyn SessionProvider>,
    pub entries: Arc<dyn EntryRepository>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        entries: Arc<dyn EntryRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            entries,
            notifier,
        }
    }
}
