//! Workspace Page
//!
//! One workspace: its projects and its members.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::cache::QueryKey;
use crate::components::{DeleteConfirmButton, FieldError, FormError, NamedEntityForm, QueryStatus, SubmitFuture};
use crate::context::use_app_context;
use crate::models::{MemberRole, NamedEntityRequest, Project, Workspace, WorkspaceId, WorkspaceMember};
use crate::store::{navigate, use_app_store, Route};
use crate::validation::{FieldErrors, InviteForm, NamedEntityForm as Fields};

#[component]
pub fn WorkspacePage(workspace_id: WorkspaceId) -> impl IntoView {
    let ctx = use_app_context();
    let (editing, set_editing) = signal(false);

    ctx.load(QueryKey::Workspace(workspace_id));
    ctx.load(QueryKey::Projects(workspace_id));
    ctx.load(QueryKey::Members(workspace_id));

    // Memoized so unrelated cache traffic does not rebuild the edit form
    let workspace = Memo::new(move |_| ctx.query::<Workspace>(QueryKey::Workspace(workspace_id)));

    let rename = move |request: NamedEntityRequest| {
        let api = ctx.api();
        let client = ctx.client();
        let fut: SubmitFuture = Box::pin(async move {
            client
                .mutate(
                    api.update_workspace(workspace_id, &request),
                    &[QueryKey::Workspace(workspace_id), QueryKey::Workspaces],
                )
                .await
                .map(|_| ())
        });
        fut
    };

    view! {
        <section class="workspace-page">
            <QueryStatus key=QueryKey::Workspace(workspace_id) />

            {move || workspace.get().map(|ws| {
                let initial = Fields { name: ws.name.clone(), description: ws.description.clone().unwrap_or_default() };
                view! {
                    <div class="section-header">
                        <div>
                            <h1>{ws.name.clone()}</h1>
                            <p class="subtitle">{ws.description.clone().unwrap_or_default()}</p>
                        </div>
                        <button type="button" class="secondary-btn" on:click=move |_| set_editing.set(true)>
                            "Edit"
                        </button>
                    </div>
                    <Show when=move || editing.get()>
                        <NamedEntityForm
                            initial=initial.clone()
                            submit_label="Save"
                            on_submit=rename
                            on_close=move |_| set_editing.set(false)
                        />
                    </Show>
                }
            })}

            <div class="workspace-columns">
                <ProjectList workspace_id=workspace_id />
                <MemberList workspace_id=workspace_id />
            </div>
        </section>
    }
}

#[component]
fn ProjectList(workspace_id: WorkspaceId) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let (creating, set_creating) = signal(false);

    let projects = move || ctx.query::<Vec<Project>>(QueryKey::Projects(workspace_id)).unwrap_or_default();

    let create = move |request: NamedEntityRequest| {
        let api = ctx.api();
        let client = ctx.client();
        let fut: SubmitFuture = Box::pin(async move {
            client
                .mutate(api.create_project(workspace_id, &request), &[QueryKey::Projects(workspace_id)])
                .await
                .map(|p| log::info!("[PROJECT] created {} ({})", p.name, p.id))
        });
        fut
    };

    let delete = move |project_id| {
        let api = ctx.api();
        let client = ctx.client();
        spawn_local(async move {
            if let Err(err) = client.mutate(api.delete_project(project_id), &[QueryKey::Projects(workspace_id)]).await {
                ctx.notices().error(format!("Failed to delete project: {}", err.user_message()));
            }
        });
    };

    view! {
        <div class="project-list">
            <div class="section-header">
                <h2>"Projects"</h2>
                <button type="button" class="primary-btn" on:click=move |_| set_creating.set(true)>
                    "New project"
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

            <QueryStatus key=QueryKey::Projects(workspace_id) />

            <ul class="card-list">
                <For
                    each=projects
                    key=|p| (p.id, p.updated_at)
                    children=move |project| {
                        let project_id = project.id;
                        view! {
                            <li
                                class="card-list-item"
                                on:click=move |_| navigate(&store, Route::Board { workspace_id, project_id })
                            >
                                <div class="card-title">{project.name.clone()}</div>
                                <div class="card-subtitle">{project.description.clone().unwrap_or_default()}</div>
                                <DeleteConfirmButton
                                    button_class="delete-btn"
                                    on_confirm=move |_| delete(project_id)
                                />
                            </li>
                        }
                    }
                />
            </ul>
        </div>
    }
}

#[component]
fn MemberList(workspace_id: WorkspaceId) -> impl IntoView {
    let ctx = use_app_context();

    let members = move || ctx.query::<Vec<WorkspaceMember>>(QueryKey::Members(workspace_id)).unwrap_or_default();

    let remove = move |user_id| {
        let api = ctx.api();
        let client = ctx.client();
        spawn_local(async move {
            if let Err(err) = client.mutate(api.remove_member(workspace_id, user_id), &[QueryKey::Members(workspace_id)]).await {
                ctx.notices().error(format!("Failed to remove member: {}", err.user_message()));
            }
        });
    };

    view! {
        <div class="member-list">
            <h2>"Members"</h2>
            <QueryStatus key=QueryKey::Members(workspace_id) />
            <ul>
                <For
                    each=members
                    key=|m| (m.user_id, m.role)
                    children=move |member| {
                        let user_id = member.user_id;
                        view! {
                            <li class="member-row">
                                <span class="member-name">{member.user_name.clone()}</span>
                                <span class="member-email">{member.user_email.clone()}</span>
                                <span class="member-role">{member.role.as_str()}</span>
                                <DeleteConfirmButton
                                    button_class="delete-btn"
                                    label="Remove"
                                    on_confirm=move |_| remove(user_id)
                                />
                            </li>
                        }
                    }
                />
            </ul>
            <InviteMember workspace_id=workspace_id />
        </div>
    }
}

#[component]
fn InviteMember(workspace_id: WorkspaceId) -> impl IntoView {
    let ctx = use_app_context();
    let (user_id, set_user_id) = signal(String::new());
    let (role, set_role) = signal(InviteForm::default().role);
    let (errors, set_errors) = signal(FieldErrors::default());
    let (server_error, set_server_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        let form = InviteForm { user_id: user_id.get_untracked(), role: role.get_untracked() };
        let request = match form.validate() {
            Ok(request) => request,
            Err(errs) => return set_errors.set(errs),
        };
        set_errors.set(FieldErrors::default());
        set_server_error.set(None);
        set_busy.set(true);

        let api = ctx.api();
        let client = ctx.client();
        spawn_local(async move {
            let result = client.mutate(api.add_member(workspace_id, &request), &[QueryKey::Members(workspace_id)]).await;
            set_busy.set(false);
            match result {
                Ok(member) => {
                    log::info!("[MEMBER] invited user {} as {}", member.user_id, member.role.as_str());
                    set_user_id.set(String::new());
                }
                Err(err) => set_server_error.set(Some(err.user_message())),
            }
        });
    };

    view! {
        <form class="invite-form" on:submit=on_submit>
            <h3>"Invite member"</h3>
            <FormError error=server_error />
            <label class="form-field">
                <span>"User ID"</span>
                <input
                    type="text"
                    inputmode="numeric"
                    prop:value=move || user_id.get()
                    on:input=move |ev| set_user_id.set(event_target_value(&ev))
                />
                <FieldError errors=errors field="user_id" />
            </label>
            <label class="form-field">
                <span>"Role"</span>
                <select
                    prop:value=move || role.get()
                    on:change=move |ev| set_role.set(event_target_value(&ev))
                >
                    {MemberRole::ALL.iter().map(|r| view! {
                        <option value=r.as_str()>{r.as_str()}</option>
                    }).collect_view()}
                </select>
                <FieldError errors=errors field="role" />
            </label>
            <button type="submit" class="primary-btn" disabled=move || busy.get()>"Invite"</button>
        </form>
    }
}
