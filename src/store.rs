//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. Holds only
//! what is not server data: the current route and the signed-in user.
//! Server data lives in the query cache.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::{ProjectId, User, WorkspaceId};

/// Where the app currently is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Login,
    Register,
    Dashboard,
    Workspace(WorkspaceId),
    Board { workspace_id: WorkspaceId, project_id: ProjectId },
}

impl Route {
    /// Routes reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// The route one level up, for back links
    pub fn parent(&self) -> Option<Route> {
        match *self {
            Route::Login | Route::Register | Route::Dashboard => None,
            Route::Workspace(_) => Some(Route::Dashboard),
            Route::Board { workspace_id, .. } => Some(Route::Workspace(workspace_id)),
        }
    }
}

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    pub route: Route,
    pub user: Option<User>,
    /// True while a stored token is being checked at startup
    pub restoring: bool,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

pub fn navigate(store: &AppStore, route: Route) {
    log::debug!("[ROUTE] {:?}", route);
    store.route().set(route);
}

/// Signed in: remember the user and leave the auth pages
pub fn store_sign_in(store: &AppStore, user: User) {
    store.user().set(Some(user));
    if store.route().get_untracked().is_public() {
        navigate(store, Route::Dashboard);
    }
}

/// Session over: forget the user and show the login page
pub fn store_sign_out(store: &AppStore) {
    store.user().set(None);
    navigate(store, Route::Login);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parents() {
        assert_eq!(Route::Dashboard.parent(), None);
        assert_eq!(Route::Workspace(2).parent(), Some(Route::Dashboard));
        assert_eq!(
            Route::Board { workspace_id: 2, project_id: 5 }.parent(),
            Some(Route::Workspace(2))
        );
    }

    #[test]
    fn test_public_routes() {
        assert!(Route::Login.is_public());
        assert!(Route::Register.is_public());
        assert!(!Route::Dashboard.is_public());
    }
}
