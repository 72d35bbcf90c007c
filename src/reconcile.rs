//! Board Reconciler
//!
//! Drives a task move from drop to settlement:
//!
//! 1. cancel any in-flight fetch of the project's task collection
//! 2. snapshot the cached collection
//! 3. write the speculative collection (only the moved task changes column)
//! 4. call the remote move
//! 5. success: refetch; failure: restore and raise a notice
//!
//! Snapshots and restores are ordered per task. When an older move fails
//! after a newer move of the same task has begun, the newer move's state is
//! left in place. A failure whose snapshot may itself hold another move's
//! speculative state is followed by a refetch once every move has settled.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;

use crate::cache::{OpId, QueryData, QueryKey};
use crate::error::{ApiError, ApiResult};
use crate::models::{Column, ColumnId, ProjectId, Task, TaskId};
use crate::notify::Notifications;
use crate::query::QueryClient;

/// Remote side of a move
#[async_trait(?Send)]
pub trait TaskMover {
    async fn move_task(&self, task_id: TaskId, column_id: ColumnId) -> ApiResult<Task>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Dragging,
    Committing,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Dropped outside every column
    NoTarget,
    /// Dropped on the column the task already occupies
    SameColumn,
    /// Target is not a column of this project
    UnknownColumn,
    UnknownTask,
    /// Task collection not in the cache
    NotLoaded,
}

/// How a failed move was undone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    /// Collection restored verbatim to the pre-move snapshot
    Snapshot,
    /// Other writes landed since; only the moved task's column was reverted
    TaskOnly,
    /// A newer move of the same task owns the cached state
    Superseded,
    /// The cache was cleared (session ended) while the move was out
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    NoOp(NoOpReason),
    Committed(Task),
    RolledBack { error: ApiError, restore: Restore },
}

/// One in-flight move: what it replaced, what it wrote, what the server said
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMove {
    pub task_id: TaskId,
    pub from_column: ColumnId,
    pub to_column: ColumnId,
    pub snapshot: Vec<Task>,
    pub speculative: Vec<Task>,
    pub committed: Option<Task>,
    write: OpId,
    /// Another move of the project was out when the snapshot was taken
    overlapped: bool,
}

/// Resolve a drop into (from, to) columns, or the reason it is a no-op
pub fn plan_move(
    tasks: &[Task],
    columns: Option<&[Column]>,
    task_id: TaskId,
    target: Option<ColumnId>,
) -> Result<(ColumnId, ColumnId), NoOpReason> {
    let target = target.ok_or(NoOpReason::NoTarget)?;
    let task = tasks.iter().find(|t| t.id == task_id).ok_or(NoOpReason::UnknownTask)?;
    if task.column_id == target {
        return Err(NoOpReason::SameColumn);
    }
    if let Some(columns) = columns {
        if !columns.iter().any(|c| c.id == target && c.project_id == task.project_id) {
            return Err(NoOpReason::UnknownColumn);
        }
    }
    Ok((task.column_id, target))
}

/// Copy of `tasks` with only `task_id` moved to `column_id`
pub fn apply_move(tasks: &[Task], task_id: TaskId, column_id: ColumnId) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            if t.id == task_id {
                Task { column_id, ..t.clone() }
            } else {
                t.clone()
            }
        })
        .collect()
}

#[derive(Default)]
struct ReconcilerState {
    phases: HashMap<TaskId, MovePhase>,
    /// Speculative write of the newest move per task
    latest_move: HashMap<TaskId, OpId>,
    in_flight: usize,
    /// Refetch once every move has settled
    refetch_pending: bool,
}

/// A failed move's restored state may still hold speculation the server
/// never confirmed. Only a lone move restored verbatim is known good.
fn needs_refetch(restore: Restore, overlapped: bool) -> bool {
    match restore {
        Restore::Discarded => false,
        Restore::Superseded | Restore::TaskOnly => true,
        Restore::Snapshot => overlapped,
    }
}

/// Reconciler for one project's board
#[derive(Clone)]
pub struct BoardReconciler {
    project_id: ProjectId,
    client: QueryClient,
    mover: Rc<dyn TaskMover>,
    notices: Notifications,
    state: Rc<RefCell<ReconcilerState>>,
}

impl BoardReconciler {
    pub fn new(project_id: ProjectId, client: QueryClient, mover: Rc<dyn TaskMover>, notices: Notifications) -> Self {
        Self {
            project_id,
            client,
            mover,
            notices,
            state: Rc::new(RefCell::new(ReconcilerState::default())),
        }
    }

    fn key(&self) -> QueryKey {
        QueryKey::Tasks(self.project_id)
    }

    pub fn phase(&self, task_id: TaskId) -> MovePhase {
        self.state.borrow().phases.get(&task_id).copied().unwrap_or(MovePhase::Idle)
    }

    fn set_phase(&self, task_id: TaskId, phase: MovePhase) {
        self.state.borrow_mut().phases.insert(task_id, phase);
    }

    /// Pointer passed the activation threshold on a card. No network.
    pub fn begin_drag(&self, task_id: TaskId) {
        if self.phase(task_id) != MovePhase::Committing {
            self.set_phase(task_id, MovePhase::Dragging);
        }
    }

    /// Handle a drop. `target` is the column under the pointer, if any.
    pub async fn drop_task(&self, task_id: TaskId, target: Option<ColumnId>) -> MoveOutcome {
        let key = self.key();
        let Some(current) = self.client.get::<Vec<Task>>(&key) else {
            self.settle_noop(task_id);
            return MoveOutcome::NoOp(NoOpReason::NotLoaded);
        };
        let columns = self.client.get::<Vec<Column>>(&QueryKey::Columns(self.project_id));

        let (from, to) = match plan_move(&current, columns.as_deref(), task_id, target) {
            Ok(plan) => plan,
            Err(reason) => {
                log::debug!("[MOVE] task {} drop ignored: {:?}", task_id, reason);
                self.settle_noop(task_id);
                return MoveOutcome::NoOp(reason);
            }
        };

        // Committing
        self.set_phase(task_id, MovePhase::Committing);
        self.client.cancel(&key);
        let speculative = apply_move(&current, task_id, to);
        let write = self.client.set(key, QueryData::Tasks(speculative.clone()));
        let overlapped = {
            let mut state = self.state.borrow_mut();
            state.latest_move.insert(task_id, write);
            state.in_flight += 1;
            state.in_flight > 1
        };
        let mut record = TaskMove {
            task_id,
            from_column: from,
            to_column: to,
            snapshot: current,
            speculative,
            committed: None,
            write,
            overlapped,
        };
        log::info!("[MOVE] task {} column {} -> {} (op {:?})", task_id, from, to, write);

        let result = self.mover.move_task(task_id, to).await;
        self.state.borrow_mut().in_flight -= 1;

        let outcome = match result {
            Ok(task) => {
                log::info!("[MOVE] task {} confirmed in column {}", task_id, task.column_id);
                record.committed = Some(task.clone());
                self.state.borrow_mut().refetch_pending = true;
                MoveOutcome::Committed(task)
            }
            Err(error) => {
                let restore = self.rollback(&record);
                if needs_refetch(restore, record.overlapped) {
                    self.state.borrow_mut().refetch_pending = true;
                }
                log::warn!("[MOVE] task {} failed ({}), restore={:?}", task_id, error, restore);
                if !error.is_session_expired() {
                    self.notices.error(format!("Failed to move task: {}", error.user_message()));
                }
                MoveOutcome::RolledBack { error, restore }
            }
        };

        self.settle(&record);
        self.refetch_if_idle().await;
        outcome
    }

    fn settle_noop(&self, task_id: TaskId) {
        if self.phase(task_id) != MovePhase::Committing {
            self.set_phase(task_id, MovePhase::Settled);
        }
    }

    /// Settle the task's phase unless a newer move of it is still out
    fn settle(&self, record: &TaskMove) {
        let mut state = self.state.borrow_mut();
        if state.latest_move.get(&record.task_id) == Some(&record.write) {
            state.latest_move.remove(&record.task_id);
            state.phases.insert(record.task_id, MovePhase::Settled);
        }
    }

    fn rollback(&self, record: &TaskMove) -> Restore {
        let key = self.key();
        let superseded = self.state.borrow().latest_move.get(&record.task_id) != Some(&record.write);
        if superseded {
            return Restore::Superseded;
        }
        if self.client.last_write(&key) == Some(record.write) {
            self.client.set(key, QueryData::Tasks(record.snapshot.clone()));
            return Restore::Snapshot;
        }
        let Some(current) = self.client.get::<Vec<Task>>(&key) else {
            return Restore::Discarded;
        };
        let still_speculative = current
            .iter()
            .any(|t| t.id == record.task_id && t.column_id == record.to_column);
        if still_speculative {
            let reverted = apply_move(&current, record.task_id, record.from_column);
            self.client.set(key, QueryData::Tasks(reverted));
        }
        Restore::TaskOnly
    }

    /// Converge on the server's state once no move is out
    async fn refetch_if_idle(&self) {
        let due = {
            let mut state = self.state.borrow_mut();
            if state.in_flight == 0 && state.refetch_pending {
                state.refetch_pending = false;
                true
            } else {
                false
            }
        };
        if due {
            if let Err(err) = self.client.invalidate(self.key()).await {
                log::warn!("[MOVE] refetch after move failed: {}", err);
            }
        }
    }
}
