//! The journal itself: logging a mood, editing and deleting entries, and the
//! dashboard that ties them to the signed-in session.

pub mod create;
pub mod dashboard;
pub mod edit;
pub mod list;

pub use create::CreateForm;
pub use dashboard::{Dashboard, DashboardSnapshot, DashboardState, Navigation};
pub use edit::EditSession;
pub use list::{Confirmation, ListView};

/// Where a signed-out visitor is sent.
pub const AUTH_SURFACE: &str = "/auth";
