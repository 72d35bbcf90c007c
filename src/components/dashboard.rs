//! Dashboard
//!
//! The signed-in user's workspaces.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::cache::QueryKey;
use crate::components::{DeleteConfirmButton, NamedEntityForm, QueryStatus, SubmitFuture};
use crate::context::use_app_context;
use crate::models::{NamedEntityRequest, Workspace};
use crate::store::{navigate, use_app_store, Route};
use crate::validation::NamedEntityForm as Fields;

#[component]
pub fn Dashboard() -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let (creating, set_creating) = signal(false);

    ctx.load(QueryKey::Workspaces);

    let workspaces = move || ctx.query::<Vec<Workspace>>(QueryKey::Workspaces).unwrap_or_default();

    let create = move |request: NamedEntityRequest| {
        let api = ctx.api();
        let client = ctx.client();
        let fut: SubmitFuture = Box::pin(async move {
            client
                .mutate(api.create_workspace(&request), &[QueryKey::Workspaces])
                .await
                .map(|ws| log::info!("[WORKSPACE] created {} ({})", ws.name, ws.id))
        });
        fut
    };

    let delete = move |id| {
        let api = ctx.api();
        let client = ctx.client();
        spawn_local(async move {
            if let Err(err) = client.mutate(api.delete_workspace(id), &[QueryKey::Workspaces]).await {
                ctx.notices().error(format!("Failed to delete workspace: {}", err.user_message()));
            }
        });
    };

    view! {
        <section class="dashboard">
            <div class="section-header">
                <h1>"Workspaces"</h1>
                <button type="button" class="primary-btn" on:click=move |_| set_creating.set(true)>
                    "New workspace"
                </button>
            </div>

            <Show when=move || creating.get()>
                <NamedEntityForm
                    initial=Fields::default()
                    submit_label="Create"
                    on_submit=create
                    on_close=move |_| set_creating.set(false)
                />
            </Show>

            <QueryStatus key=QueryKey::Workspaces />

            <ul class="card-list">
                <For
                    each=workspaces
                    key=|ws| (ws.id, ws.updated_at)
                    children=move |ws| {
                        let id = ws.id;
                        view! {
                            <li class="card-list-item" on:click=move |_| navigate(&store, Route::Workspace(id))>
                                <div class="card-title">{ws.name.clone()}</div>
                                <div class="card-subtitle">{ws.description.clone().unwrap_or_default()}</div>
                                <div class="card-meta">"Owner: " {ws.owner_name.clone()}</div>
                                <DeleteConfirmButton
                                    button_class="delete-btn"
                                    on_confirm=move |_| delete(id)
                                />
                            </li>
                        }
                    }
                />
            </ul>

            <Show when=move || !ctx.is_loading(QueryKey::Workspaces) && workspaces().is_empty()>
                <p class="empty-state">"No workspaces yet."</p>
            </Show>
        </section>
    }
}
