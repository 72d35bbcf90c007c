//! Top Bar Component
//!
//! Signed-in user, back link and logout.

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::store::{navigate, use_app_store, AppStateStoreFields};

#[component]
pub fn TopBar() -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let user_label = move || {
        store.user().get().map(|u| {
            let initials = u.avatar_initials.clone().or_else(|| crate::validation::initials(&u.name)).unwrap_or_default();
            (initials, u.name.clone())
        })
    };

    view! {
        <header class="top-bar">
            <button
                type="button"
                class="brand"
                on:click=move |_| navigate(&store, crate::store::Route::Dashboard)
            >
                "Taskboard"
            </button>

            {move || store.route().get().parent().map(|parent| view! {
                <button type="button" class="back-btn" on:click=move |_| navigate(&store, parent)>
                    "← Back"
                </button>
            })}

            <div class="top-bar-spacer"></div>

            {move || user_label().map(|(initials, name)| view! {
                <span class="user-badge">
                    <span class="avatar">{initials}</span>
                    <span class="user-name">{name}</span>
                </span>
                <button type="button" class="logout-btn" on:click=move |_| ctx.session().logout()>
                    "Log out"
                </button>
            })}
        </header>
    }
}
