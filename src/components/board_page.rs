//! Board Page
//!
//! Kanban board of one project. Cards are dragged between columns with
//! leptos-dragdrop; each drop is handed to the project's `BoardReconciler`,
//! which writes the move into the cache before the server answers.

use std::rc::Rc;

use chrono::{Local, NaiveDateTime};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::anomaly;
use crate::board::{column_class, due_label, is_overdue, merge_columns, priority_class, BoardColumn};
use crate::cache::QueryKey;
use crate::components::{NamedEntityForm, QueryStatus, SubmitFuture, TaskModal, TaskModalMode};
use crate::context::{use_app_context, AppContext};
use crate::models::{Column, ColumnId, NamedEntityRequest, Project, ProjectId, Task, WorkspaceId, WorkspaceMember};
use crate::reconcile::{BoardReconciler, MovePhase, TaskMover};
use crate::validation::NamedEntityForm as Fields;

use leptos_dragdrop::*;

#[component]
pub fn BoardPage(workspace_id: WorkspaceId, project_id: ProjectId) -> impl IntoView {
    let ctx = use_app_context();

    for key in [
        QueryKey::Project(project_id),
        QueryKey::Columns(project_id),
        QueryKey::Tasks(project_id),
        QueryKey::Members(workspace_id),
    ] {
        ctx.load(key);
    }

    let mover: Rc<dyn TaskMover> = ctx.api();
    let reconciler = StoredValue::new_local(BoardReconciler::new(project_id, ctx.client(), mover, ctx.notices()));

    // Bumped whenever a move settles, so pending cards re-render
    let (settled, set_settled) = signal(0u32);

    let dnd = create_dnd_signals(ctx.config().drag_threshold_px);

    Effect::new(move |_| {
        if let Some(task_id) = dnd.dragging_id_read.get() {
            log::debug!("[DND] dragging task {}", task_id);
            reconciler.with_value(|r| r.begin_drag(task_id));
        }
    });

    bind_global_handlers(dnd, move |drop: DropEvent| {
        let reconciler = reconciler.get_value();
        log::debug!("[DND] drop task {} on column {:?}", drop.item_id, drop.zone);
        spawn_local(async move {
            let outcome = reconciler.drop_task(drop.item_id, drop.zone).await;
            log::debug!("[DND] task {} settled: {:?}", drop.item_id, outcome);
            set_settled.update(|v| *v += 1);
        });
    });

    watch_for_anomaly(ctx, workspace_id, project_id);

    let project = Memo::new(move |_| ctx.query::<Project>(QueryKey::Project(project_id)));
    let board = Memo::new(move |_| {
        let columns = ctx.query::<Vec<Column>>(QueryKey::Columns(project_id)).unwrap_or_default();
        let tasks = ctx.query::<Vec<Task>>(QueryKey::Tasks(project_id)).unwrap_or_default();
        merge_columns(&columns, &tasks)
    });

    let (modal, set_modal) = signal::<Option<TaskModalMode>>(None);
    let (editing, set_editing) = signal(false);

    let rename = move |request: NamedEntityRequest| {
        let api = ctx.api();
        let client = ctx.client();
        let fut: SubmitFuture = Box::pin(async move {
            client
                .mutate(
                    api.update_project(project_id, &request),
                    &[QueryKey::Project(project_id), QueryKey::Projects(workspace_id)],
                )
                .await
                .map(|_| ())
        });
        fut
    };

    let phase = move |task_id| {
        settled.track();
        ctx.cache_version.track();
        reconciler.with_value(|r| r.phase(task_id))
    };

    view! {
        <section class="board-page">
            <div class="section-header">
                <div>
                    <h1>{move || project.get().map(|p| p.name).unwrap_or_default()}</h1>
                    <p class="subtitle">{move || project.get().and_then(|p| p.description).unwrap_or_default()}</p>
                </div>
                <div class="form-actions">
                    <button type="button" class="secondary-btn" on:click=move |_| set_editing.set(true)>
                        "Edit"
                    </button>
                    <button type="button" class="primary-btn" on:click=move |_| set_modal.set(Some(TaskModalMode::Create))>
                        "Add task"
                    </button>
                </div>
            </div>

            {move || editing.get().then(|| {
                let initial = project
                    .get_untracked()
                    .map(|p| Fields { name: p.name, description: p.description.unwrap_or_default() })
                    .unwrap_or_default();
                view! {
                    <NamedEntityForm
                        initial=initial
                        submit_label="Save"
                        on_submit=rename
                        on_close=move |_| set_editing.set(false)
                    />
                }
            })}

            <QueryStatus key=QueryKey::Project(project_id) />
            <QueryStatus key=QueryKey::Columns(project_id) />
            <QueryStatus key=QueryKey::Tasks(project_id) />

            <div class="board" class:dragging=move || dnd.dragging_id_read.get().is_some()>
                <For
                    each=move || board.get()
                    key=|c| (c.column.id, c.column.position, c.column.name.clone())
                    children=move |c| {
                        view! {
                            <BoardColumnView
                                column=c.column
                                board=board
                                dnd=dnd
                                phase=phase
                                on_open=move |task_id: u32| set_modal.set(Some(TaskModalMode::Edit(task_id)))
                            />
                        }
                    }
                />
            </div>

            {move || modal.get().map(|mode| view! {
                <TaskModal
                    workspace_id=workspace_id
                    project_id=project_id
                    mode=mode
                    on_close=move |_| set_modal.set(None)
                />
            })}
        </section>
    }
}

#[component]
fn BoardColumnView<P>(
    column: Column,
    board: Memo<Vec<BoardColumn>>,
    dnd: DndSignals,
    phase: P,
    #[prop(into)] on_open: Callback<u32>,
) -> impl IntoView
where
    P: Fn(u32) -> MovePhase + Copy + Send + Sync + 'static,
{
    let column_id: ColumnId = column.id;
    let tasks = move || {
        board.with(|b| b.iter().find(|c| c.column.id == column_id).map(|c| c.tasks.clone()).unwrap_or_default())
    };
    let count = move || tasks().len();

    let on_enter = make_on_zone_pointerenter(dnd, column_id);
    let on_leave = make_on_zone_pointerleave(dnd, column_id);

    let class = move || {
        let mut c = format!("board-column {}", column_class(column.column_type));
        if dnd.is_over(column_id) {
            c.push_str(" drop-target");
        }
        c
    };

    view! {
        <div class=class on:pointerenter=on_enter on:pointerleave=on_leave>
            <div class="board-column-header">
                <span class="board-column-name">{column.name.clone()}</span>
                <span class="board-column-count">{count}</span>
            </div>
            <div class="board-column-body">
                <For
                    each=tasks
                    key=|t| (t.id, t.column_id, t.updated_at)
                    children=move |task| view! { <TaskCard task=task dnd=dnd phase=phase on_open=on_open /> }
                />
            </div>
        </div>
    }
}

#[component]
fn TaskCard<P>(task: Task, dnd: DndSignals, phase: P, on_open: Callback<u32>) -> impl IntoView
where
    P: Fn(u32) -> MovePhase + Copy + Send + Sync + 'static,
{
    let id = task.id;
    let now: NaiveDateTime = Local::now().naive_local();
    let overdue = is_overdue(&task, now);

    let on_pointerdown = make_on_pointerdown(dnd, id);
    let class = move || {
        let mut c = format!("task-card {}", priority_class(task.priority));
        if dnd.is_dragging(id) {
            c.push_str(" dragging");
        }
        if phase(id) == MovePhase::Committing {
            c.push_str(" pending");
        }
        if overdue {
            c.push_str(" overdue");
        }
        c
    };

    view! {
        <div
            class=class
            on:pointerdown=on_pointerdown
            on:click=move |_| {
                if !dnd.suppress_click() {
                    on_open.run(id);
                }
            }
        >
            <div class="task-title">{task.title.clone()}</div>
            {task.description.clone().map(|d| view! { <div class="task-description">{d}</div> })}
            <div class="task-meta">
                <span class="task-priority">{task.priority.label()}</span>
                {task.due_date.map(|due| view! {
                    <span class="task-due" class:overdue=overdue>{due_label(due, now)}</span>
                })}
                {task.assigned_to_name.clone().map(|name| view! { <span class="task-assignee">{name}</span> })}
            </div>
        </div>
    }
}

/// Report once per page when a member is refused a project read
fn watch_for_anomaly(ctx: AppContext, workspace_id: WorkspaceId, project_id: ProjectId) {
    let reported = StoredValue::new(false);
    Effect::new(move |_| {
        let error = ctx
            .query_error(QueryKey::Tasks(project_id))
            .or_else(|| ctx.query_error(QueryKey::Project(project_id)));
        let Some(error) = error else { return };
        if reported.get_value() {
            return;
        }
        let members = ctx.query::<Vec<WorkspaceMember>>(QueryKey::Members(workspace_id)).unwrap_or_default();
        let session = ctx.session();
        let user = session.current_user();
        if let Some(report) =
            anomaly::detect(&error, user.as_ref(), &members, workspace_id, project_id, session.has_token())
        {
            anomaly::report(&report);
            reported.set_value(true);
        }
    });
}
