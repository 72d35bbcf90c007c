//! Taskboard App
//!
//! Builds the long-lived services, wires the session to the view, and
//! renders the page for the current route.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;

use crate::api::ApiClient;
use crate::components::{AuthPage, BoardPage, Dashboard, NoticeBar, TopBar, WorkspacePage};
use crate::config::AppConfig;
use crate::context::{AppContext, Services};
use crate::notify::Notifications;
use crate::query::{QueryClient, RetryPolicy};
use crate::session::{BrowserTokenStore, MemoryTokenStore, Session, SessionEnd, TokenStore};
use crate::store::{store_sign_in, store_sign_out, AppState, AppStateStoreFields, Route};

pub fn build_services(config: AppConfig) -> Services {
    let tokens: Rc<dyn TokenStore> = match BrowserTokenStore::open() {
        Some(store) => Rc::new(store),
        None => {
            log::warn!("[APP] localStorage unavailable, session will not survive a reload");
            Rc::new(MemoryTokenStore::default())
        }
    };

    let api = Rc::new(ApiClient::new(&config, tokens.clone()));
    let client = QueryClient::new(api.clone(), RetryPolicy::from(&config));
    let session = Session::new(tokens, client.clone(), api.clone());

    // Weak: the client must not keep the session alive
    let weak = session.downgrade();
    api.set_on_session_expired(move || {
        if let Some(session) = weak.upgrade() {
            session.expire();
        }
    });

    Services { config, api, client, session, notices: Notifications::new() }
}

#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    log::info!("[APP] starting, api={}", config.api_base_url);

    let services = build_services(config);
    let session = services.session.clone();
    let notices = services.notices.clone();

    let store = Store::new(AppState::default());
    provide_context(store);
    provide_context(AppContext::new(services));

    session.on_end(move |reason| {
        notices.clear();
        if reason == SessionEnd::Expired && store.user().get_untracked().is_some() {
            notices.info("Your session has expired. Please sign in again.");
        }
        store_sign_out(&store);
    });

    if session.has_token() {
        store.restoring().set(true);
        spawn_local(async move {
            if let Some(user) = session.restore().await {
                store_sign_in(&store, user);
            }
            store.restoring().set(false);
        });
    }

    let page = move || {
        if store.restoring().get() {
            return view! { <p class="loading">"Loading..."</p> }.into_any();
        }
        let signed_in = store.user().with(|u| u.is_some());
        match store.route().get() {
            Route::Register if !signed_in => view! { <AuthPage register=true /> }.into_any(),
            _ if !signed_in => view! { <AuthPage register=false /> }.into_any(),
            Route::Workspace(id) => view! { <WorkspacePage workspace_id=id /> }.into_any(),
            Route::Board { workspace_id, project_id } => {
                view! { <BoardPage workspace_id=workspace_id project_id=project_id /> }.into_any()
            }
            _ => view! { <Dashboard /> }.into_any(),
        }
    };

    view! {
        <div class="app-layout">
            <Show when=move || store.user().with(|u| u.is_some())>
                <TopBar />
            </Show>
            <NoticeBar />
            <main class="main-content">{page}</main>
        </div>
    }
}
