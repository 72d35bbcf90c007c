//! Task Modal Component
//!
//! Create form for a new task, or detail view with edit and delete for an
//! existing one. Errors stay inline and the modal stays open until the
//! mutation succeeds.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::cache::QueryKey;
use crate::components::{DeleteConfirmButton, FieldError, FormError};
use crate::context::use_app_context;
use crate::models::{Priority, ProjectId, Task, TaskId, WorkspaceId, WorkspaceMember};
use crate::validation::{FieldErrors, TaskForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskModalMode {
    Create,
    Edit(TaskId),
}

#[component]
pub fn TaskModal(
    workspace_id: WorkspaceId,
    project_id: ProjectId,
    mode: TaskModalMode,
    #[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
    let ctx = use_app_context();
    let tasks_key = QueryKey::Tasks(project_id);

    // Snapshot at open; later cache traffic does not reset the form
    let existing: Option<Task> = match mode {
        TaskModalMode::Create => None,
        TaskModalMode::Edit(id) => ctx
            .client()
            .get::<Vec<Task>>(&tasks_key)
            .and_then(|tasks| tasks.into_iter().find(|t| t.id == id)),
    };

    if let (TaskModalMode::Edit(id), None) = (mode, &existing) {
        log::warn!("[TASK] task {} not in cache, closing detail", id);
        return view! {
            <div class="modal-overlay" on:click=move |_| on_close.run(())>
                <div class="modal">
                    <p>"This task no longer exists."</p>
                    <button type="button" class="cancel-btn" on:click=move |_| on_close.run(())>"Close"</button>
                </div>
            </div>
        }
        .into_any();
    }

    let initial = existing.as_ref().map(TaskForm::from_task).unwrap_or_default();
    let (title, set_title) = signal(initial.title);
    let (description, set_description) = signal(initial.description);
    let (assignee, set_assignee) = signal(initial.assignee);
    let (priority, set_priority) = signal(initial.priority);
    let (due_date, set_due_date) = signal(initial.due_date);
    let (errors, set_errors) = signal(FieldErrors::default());
    let (server_error, set_server_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let members = move || ctx.query::<Vec<WorkspaceMember>>(QueryKey::Members(workspace_id)).unwrap_or_default();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        let form = TaskForm {
            title: title.get_untracked(),
            description: description.get_untracked(),
            assignee: assignee.get_untracked(),
            priority: priority.get_untracked(),
            due_date: due_date.get_untracked(),
        };
        let api = ctx.api();
        let client = ctx.client();

        match mode {
            TaskModalMode::Create => {
                let request = match form.validate_create() {
                    Ok(request) => request,
                    Err(errs) => return set_errors.set(errs),
                };
                set_errors.set(FieldErrors::default());
                set_busy.set(true);
                spawn_local(async move {
                    let result = client.mutate(api.create_task(project_id, &request), &[tasks_key]).await;
                    set_busy.set(false);
                    match result {
                        Ok(task) => {
                            log::info!("[TASK] created {} in column {}", task.id, task.column_id);
                            on_close.run(());
                        }
                        Err(err) => set_server_error.set(Some(err.user_message())),
                    }
                });
            }
            TaskModalMode::Edit(id) => {
                let request = match form.validate_update() {
                    Ok(request) => request,
                    Err(errs) => return set_errors.set(errs),
                };
                set_errors.set(FieldErrors::default());
                set_busy.set(true);
                spawn_local(async move {
                    let result = client.mutate(api.update_task(id, &request), &[tasks_key]).await;
                    set_busy.set(false);
                    match result {
                        Ok(_) => on_close.run(()),
                        Err(err) => set_server_error.set(Some(err.user_message())),
                    }
                });
            }
        }
    };

    let on_delete = move |id: TaskId| {
        let api = ctx.api();
        let client = ctx.client();
        set_busy.set(true);
        spawn_local(async move {
            let result = client.mutate(api.delete_task(id), &[tasks_key]).await;
            set_busy.set(false);
            match result {
                Ok(()) => on_close.run(()),
                Err(err) => set_server_error.set(Some(err.user_message())),
            }
        });
    };

    let heading = if existing.is_some() { "Task details" } else { "New task" };
    let details = existing.map(|task| {
        let id = task.id;
        view! {
            <dl class="task-details">
                <dt>"Created"</dt>
                <dd>{task.created_at.format("%Y-%m-%d %H:%M").to_string()}</dd>
                <dt>"Updated"</dt>
                <dd>{task.updated_at.format("%Y-%m-%d %H:%M").to_string()}</dd>
                <dt>"Assignee"</dt>
                <dd>{task.assigned_to_name.clone().unwrap_or_else(|| "Unassigned".to_string())}</dd>
            </dl>
            <DeleteConfirmButton
                button_class="delete-btn"
                label="Delete task"
                on_confirm=move |_| on_delete(id)
            />
        }
    });

    view! {
        <div class="modal-overlay" on:click=move |_| on_close.run(())>
            <div class="modal" on:click=|ev| ev.stop_propagation()>
                <h2>{heading}</h2>
                <FormError error=server_error />
                <form class="task-form" on:submit=on_submit>
                    <label class="form-field">
                        <span>"Title"</span>
                        <input
                            type="text"
                            prop:value=move || title.get()
                            on:input=move |ev| set_title.set(event_target_value(&ev))
                        />
                        <FieldError errors=errors field="title" />
                    </label>
                    <label class="form-field">
                        <span>"Description"</span>
                        <textarea
                            prop:value=move || description.get()
                            on:input=move |ev| set_description.set(event_target_value(&ev))
                        ></textarea>
                        <FieldError errors=errors field="description" />
                    </label>
                    <label class="form-field">
                        <span>"Priority"</span>
                        <select
                            prop:value=move || priority.get()
                            on:change=move |ev| set_priority.set(event_target_value(&ev))
                        >
                            {Priority::ALL.iter().map(|p| view! {
                                <option value=p.as_str()>{p.label()}</option>
                            }).collect_view()}
                        </select>
                        <FieldError errors=errors field="priority" />
                    </label>
                    <label class="form-field">
                        <span>"Assignee"</span>
                        <select
                            prop:value=move || assignee.get()
                            on:change=move |ev| set_assignee.set(event_target_value(&ev))
                        >
                            <option value="">"Unassigned"</option>
                            <For
                                each=members
                                key=|m| m.user_id
                                children=|m| view! {
                                    <option value=m.user_id.to_string()>{m.user_name.clone()}</option>
                                }
                            />
                        </select>
                        <FieldError errors=errors field="assignee" />
                    </label>
                    <label class="form-field">
                        <span>"Due date"</span>
                        <input
                            type="datetime-local"
                            prop:value=move || due_date.get()
                            on:input=move |ev| set_due_date.set(event_target_value(&ev))
                        />
                        <FieldError errors=errors field="due_date" />
                    </label>
                    <div class="form-actions">
                        <button type="submit" class="primary-btn" disabled=move || busy.get()>
                            {if mode == TaskModalMode::Create { "Create" } else { "Save" }}
                        </button>
                        <button type="button" class="cancel-btn" on:click=move |_| on_close.run(())>
                            "Cancel"
                        </button>
                    </div>
                </form>
                {details}
            </div>
        </div>
    }
    .into_any()
}
