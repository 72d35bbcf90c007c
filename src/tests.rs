//! Scenario tests
//!
//! Board moves, cache refresh and session lifecycle against an in-memory
//! backend. Moves and fetches can be held open with oneshot gates so
//! interleavings are driven deterministically.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::oneshot;

use crate::anomaly;
use crate::cache::{Freshness, QueryData, QueryKey};
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::notify::Notifications;
use crate::query::{QueryClient, QuerySource, RetryPolicy};
use crate::reconcile::{BoardReconciler, MoveOutcome, MovePhase, NoOpReason, Restore, TaskMover};
use crate::session::{AuthApi, MemoryTokenStore, Session, SessionEnd, TokenStore, WeakSession};

const PROJECT: ProjectId = 1;
const BACKLOG: ColumnId = 1;
const TODO: ColumnId = 2;
const DONE: ColumnId = 4;

fn ts() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

fn task(id: TaskId, column_id: ColumnId) -> Task {
    Task {
        id,
        project_id: PROJECT,
        column_id,
        title: format!("Task {}", id),
        description: Some("details".into()),
        assigned_to: Some(7),
        assigned_to_name: Some("Me".into()),
        priority: Priority::High,
        due_date: None,
        created_by: 7,
        created_at: ts(),
        updated_at: ts(),
    }
}

fn column(id: ColumnId, name: &str, position: i32, column_type: ColumnType) -> Column {
    Column { id, project_id: PROJECT, name: name.into(), position, column_type }
}

fn me() -> User {
    User { id: 7, name: "Me".into(), email: "me@example.com".into(), avatar_initials: Some("ME".into()) }
}

fn other_user() -> User {
    User { id: 8, name: "Other".into(), email: "other@example.com".into(), avatar_initials: None }
}

/// Outcome of one remote call: optionally wait for a gate, then fail or succeed
#[derive(Default)]
struct Step {
    gate: Option<oneshot::Receiver<()>>,
    error: Option<ApiError>,
}

impl Step {
    fn gated() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Step { gate: Some(rx), error: None }, tx)
    }

    fn gated_failure(error: ApiError) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Step { gate: Some(rx), error: Some(error) }, tx)
    }

    fn failure(error: ApiError) -> Self {
        Step { gate: None, error: Some(error) }
    }

    async fn run(self) -> ApiResult<()> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory backend holding the server's view of one project
struct MockBackend {
    columns: Vec<Column>,
    tasks: RefCell<Vec<Task>>,
    members: Vec<WorkspaceMember>,
    tokens: Rc<MemoryTokenStore>,
    move_steps: RefCell<VecDeque<Step>>,
    task_fetch_steps: RefCell<VecDeque<Step>>,
    move_calls: RefCell<Vec<(TaskId, ColumnId)>>,
    fetches: RefCell<Vec<QueryKey>>,
    /// Session ended by a 401, as the HTTP client does
    on_unauthorized: RefCell<Option<WeakSession>>,
    logins: Cell<u32>,
}

impl MockBackend {
    fn new(tokens: Rc<MemoryTokenStore>) -> Rc<Self> {
        let member = WorkspaceMember {
            id: 1,
            user_id: 7,
            user_email: "me@example.com".into(),
            user_name: "Me".into(),
            role: MemberRole::Member,
            joined_at: ts(),
            updated_at: ts(),
        };
        Rc::new(Self {
            columns: vec![
                column(BACKLOG, "Backlog", 0, ColumnType::Backlog),
                column(TODO, "To Do", 1, ColumnType::ToDo),
                column(3, "In Progress", 2, ColumnType::InProgress),
                column(DONE, "Done", 3, ColumnType::Done),
            ],
            tasks: RefCell::new(vec![task(10, BACKLOG), task(11, TODO)]),
            members: vec![member],
            tokens,
            move_steps: RefCell::new(VecDeque::new()),
            task_fetch_steps: RefCell::new(VecDeque::new()),
            move_calls: RefCell::new(Vec::new()),
            fetches: RefCell::new(Vec::new()),
            on_unauthorized: RefCell::new(None),
            logins: Cell::new(0),
        })
    }

    fn script_move(&self, step: Step) {
        self.move_steps.borrow_mut().push_back(step);
    }

    fn script_task_fetch(&self, step: Step) {
        self.task_fetch_steps.borrow_mut().push_back(step);
    }

    fn fetch_count(&self, key: QueryKey) -> usize {
        self.fetches.borrow().iter().filter(|k| **k == key).count()
    }

    fn server_column_of(&self, task_id: TaskId) -> Option<ColumnId> {
        self.tasks.borrow().iter().find(|t| t.id == task_id).map(|t| t.column_id)
    }

    fn unauthorized<T>(&self) -> ApiResult<T> {
        let session = self.on_unauthorized.borrow().as_ref().and_then(WeakSession::upgrade);
        if let Some(session) = session {
            session.expire();
        }
        Err(ApiError::SessionExpired)
    }
}

#[async_trait(?Send)]
impl QuerySource for MockBackend {
    async fn fetch(&self, key: QueryKey) -> ApiResult<QueryData> {
        self.fetches.borrow_mut().push(key);
        match key {
            QueryKey::Tasks(_) => {
                let step = self.task_fetch_steps.borrow_mut().pop_front().unwrap_or_default();
                match step.run().await {
                    Err(ApiError::SessionExpired) => self.unauthorized(),
                    Err(err) => Err(err),
                    Ok(()) => Ok(QueryData::Tasks(self.tasks.borrow().clone())),
                }
            }
            QueryKey::Columns(_) => Ok(QueryData::Columns(self.columns.clone())),
            QueryKey::Members(_) => Ok(QueryData::Members(self.members.clone())),
            QueryKey::CurrentUser => match self.tokens.access_token() {
                Some(token) if token == "token-1" => Ok(QueryData::CurrentUser(me())),
                Some(token) if token == "token-2" => Ok(QueryData::CurrentUser(other_user())),
                _ => self.unauthorized(),
            },
            other => Err(ApiError::NotFound(format!("{:?}", other))),
        }
    }
}

#[async_trait(?Send)]
impl TaskMover for MockBackend {
    async fn move_task(&self, task_id: TaskId, column_id: ColumnId) -> ApiResult<Task> {
        self.move_calls.borrow_mut().push((task_id, column_id));
        let step = self.move_steps.borrow_mut().pop_front().unwrap_or_default();
        match step.run().await {
            Err(ApiError::SessionExpired) => return self.unauthorized(),
            Err(err) => return Err(err),
            Ok(()) => {}
        }
        let mut tasks = self.tasks.borrow_mut();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;
        task.column_id = column_id;
        Ok(task.clone())
    }
}

#[async_trait(?Send)]
impl AuthApi for MockBackend {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.logins.set(self.logins.get() + 1);
        if request.password != "correct-horse" {
            return Err(ApiError::Rejected { status: 400, message: "Invalid credentials".into() });
        }
        let (access, refresh) = if request.email == "other@example.com" {
            ("token-2", "refresh-2")
        } else {
            ("token-1", "refresh-1")
        };
        Ok(LoginResponse {
            access_token: access.into(),
            refresh_token: Some(refresh.into()),
            expires_in: Some(3600),
            username: Some(request.email.clone()),
        })
    }

    async fn register(&self, _request: &RegisterRequest) -> ApiResult<String> {
        Ok("User registered successfully".into())
    }
}

struct Harness {
    backend: Rc<MockBackend>,
    tokens: Rc<MemoryTokenStore>,
    client: QueryClient,
    notices: Notifications,
    reconciler: BoardReconciler,
    session: Session,
}

impl Harness {
    fn new() -> Self {
        let tokens = Rc::new(MemoryTokenStore::default());
        let backend = MockBackend::new(tokens.clone());
        let client = QueryClient::new(backend.clone(), RetryPolicy { max_attempts: 1, base_delay_ms: 0 });
        let notices = Notifications::new();
        let reconciler = BoardReconciler::new(PROJECT, client.clone(), backend.clone(), notices.clone());
        let session = Session::new(tokens.clone(), client.clone(), backend.clone());
        *backend.on_unauthorized.borrow_mut() = Some(session.downgrade());
        Self { backend, tokens, client, notices, reconciler, session }
    }

    /// Signed in with the board's columns and tasks cached
    async fn loaded() -> Self {
        let h = Self::new();
        h.session.login("me@example.com", "correct-horse").await.unwrap();
        h.client.fetch(QueryKey::Columns(PROJECT)).await.unwrap();
        h.client.fetch(QueryKey::Tasks(PROJECT)).await.unwrap();
        h
    }

    fn cached_tasks(&self) -> Vec<Task> {
        self.client.get::<Vec<Task>>(&QueryKey::Tasks(PROJECT)).unwrap_or_default()
    }

    fn cached_column_of(&self, task_id: TaskId) -> Option<ColumnId> {
        self.cached_tasks().iter().find(|t| t.id == task_id).map(|t| t.column_id)
    }

    fn task_fetches(&self) -> usize {
        self.backend.fetch_count(QueryKey::Tasks(PROJECT))
    }
}

// ========================
// Moves
// ========================

#[tokio::test]
async fn test_successful_move_then_refetch() {
    let h = Harness::loaded().await;
    let fetches_before = h.task_fetches();
    let (step, release) = Step::gated();
    h.backend.script_move(step);

    h.reconciler.begin_drag(10);
    assert_eq!(h.reconciler.phase(10), MovePhase::Dragging);

    let (outcome, ()) = tokio::join!(h.reconciler.drop_task(10, Some(DONE)), async {
        // Server has not answered yet: the card already shows in Done
        assert_eq!(h.cached_column_of(10), Some(DONE));
        assert_eq!(h.reconciler.phase(10), MovePhase::Committing);
        assert_eq!(h.backend.server_column_of(10), Some(BACKLOG));
        release.send(()).unwrap();
    });

    assert!(matches!(outcome, MoveOutcome::Committed(ref t) if t.column_id == DONE));
    assert_eq!(*h.backend.move_calls.borrow(), vec![(10, DONE)]);
    assert_eq!(h.task_fetches(), fetches_before + 1);
    assert_eq!(h.cached_tasks(), *h.backend.tasks.borrow());
    assert_eq!(h.reconciler.phase(10), MovePhase::Settled);
    assert!(h.notices.errors().is_empty());
}

#[tokio::test]
async fn test_same_column_drop_is_noop() {
    let h = Harness::loaded().await;
    let write_before = h.client.last_write(&QueryKey::Tasks(PROJECT));
    let fetches_before = h.task_fetches();

    h.reconciler.begin_drag(10);
    let outcome = h.reconciler.drop_task(10, Some(BACKLOG)).await;

    assert_eq!(outcome, MoveOutcome::NoOp(NoOpReason::SameColumn));
    assert!(h.backend.move_calls.borrow().is_empty());
    assert_eq!(h.client.last_write(&QueryKey::Tasks(PROJECT)), write_before);
    assert_eq!(h.task_fetches(), fetches_before);
    assert_eq!(h.reconciler.phase(10), MovePhase::Settled);
}

#[tokio::test]
async fn test_drop_outside_columns_is_noop() {
    let h = Harness::loaded().await;
    let before = h.cached_tasks();

    assert_eq!(h.reconciler.drop_task(10, None).await, MoveOutcome::NoOp(NoOpReason::NoTarget));
    assert!(h.backend.move_calls.borrow().is_empty());
    assert_eq!(h.cached_tasks(), before);
}

#[tokio::test]
async fn test_failed_move_restores_snapshot_verbatim() {
    let h = Harness::loaded().await;
    let snapshot = h.cached_tasks();
    let fetches_before = h.task_fetches();
    h.backend.script_move(Step::failure(ApiError::Server { status: 500, message: "boom".into() }));

    let outcome = h.reconciler.drop_task(10, Some(TODO)).await;

    assert!(matches!(outcome, MoveOutcome::RolledBack { restore: Restore::Snapshot, .. }));
    assert_eq!(h.cached_tasks(), snapshot);
    // Mutations are not retried, and a rollback does not refetch
    assert_eq!(h.backend.move_calls.borrow().len(), 1);
    assert_eq!(h.task_fetches(), fetches_before);
    let errors = h.notices.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("Failed to move task"));
    assert_eq!(h.reconciler.phase(10), MovePhase::Settled);
}

#[tokio::test]
async fn test_move_cancels_inflight_task_fetch() {
    let h = Harness::loaded().await;
    let (fetch_step, release_fetch) = Step::gated();
    h.backend.script_task_fetch(fetch_step);

    let (landed, outcome) = tokio::join!(h.client.fetch(QueryKey::Tasks(PROJECT)), async {
        // The fetch is parked at its gate; the move must win over its result
        let outcome = h.reconciler.drop_task(10, Some(DONE)).await;
        release_fetch.send(()).unwrap();
        outcome
    });

    assert!(matches!(outcome, MoveOutcome::Committed(_)));
    assert_eq!(landed, Ok(false));
    assert_eq!(h.cached_column_of(10), Some(DONE));
}

#[tokio::test]
async fn test_stale_value_served_during_refetch() {
    let h = Harness::loaded().await;
    let (fetch_step, release_fetch) = Step::gated();
    h.backend.script_task_fetch(fetch_step);

    let (outcome, ()) = tokio::join!(h.reconciler.drop_task(10, Some(DONE)), async {
        // Move confirmed, refetch parked: readers still get the speculative state
        assert_eq!(h.client.freshness(&QueryKey::Tasks(PROJECT)), Some(Freshness::InFlight));
        assert_eq!(h.cached_column_of(10), Some(DONE));
        assert_eq!(h.cached_tasks().len(), 2);
        release_fetch.send(()).unwrap();
    });

    assert!(matches!(outcome, MoveOutcome::Committed(_)));
    assert_eq!(h.client.freshness(&QueryKey::Tasks(PROJECT)), Some(Freshness::Fresh));
}

#[tokio::test]
async fn test_older_failure_does_not_clobber_newer_move() {
    let h = Harness::loaded().await;
    let fetches_before = h.task_fetches();
    let (first, release_first) = Step::gated_failure(ApiError::Server { status: 500, message: "boom".into() });
    let (second, release_second) = Step::gated();
    h.backend.script_move(first);
    h.backend.script_move(second);
    let (first_done_tx, first_done_rx) = oneshot::channel();

    let (a, b, ()) = tokio::join!(
        async {
            let outcome = h.reconciler.drop_task(10, Some(TODO)).await;
            first_done_tx.send(()).unwrap();
            outcome
        },
        h.reconciler.drop_task(10, Some(DONE)),
        async {
            // Second move snapshotted the first's speculative state
            assert_eq!(h.cached_column_of(10), Some(DONE));
            release_first.send(()).unwrap();
            first_done_rx.await.unwrap();
            // First move failed, the newer move's state is still shown
            assert_eq!(h.cached_column_of(10), Some(DONE));
            assert_eq!(h.reconciler.phase(10), MovePhase::Committing);
            release_second.send(()).unwrap();
        }
    );

    assert!(matches!(a, MoveOutcome::RolledBack { restore: Restore::Superseded, .. }));
    assert!(matches!(b, MoveOutcome::Committed(_)));
    assert_eq!(*h.backend.move_calls.borrow(), vec![(10, TODO), (10, DONE)]);
    assert_eq!(h.backend.server_column_of(10), Some(DONE));
    assert_eq!(h.cached_column_of(10), Some(DONE));
    // Only the last settlement refetches
    assert_eq!(h.task_fetches(), fetches_before + 1);
    assert_eq!(h.notices.errors().len(), 1);
    assert_eq!(h.reconciler.phase(10), MovePhase::Settled);
}

#[tokio::test]
async fn test_newer_failure_restores_to_older_move() {
    let h = Harness::loaded().await;
    let (first, release_first) = Step::gated();
    let (second, release_second) = Step::gated_failure(ApiError::Rejected { status: 409, message: "conflict".into() });
    h.backend.script_move(first);
    h.backend.script_move(second);
    let (first_done_tx, first_done_rx) = oneshot::channel();

    let (a, b, ()) = tokio::join!(
        async {
            let outcome = h.reconciler.drop_task(10, Some(TODO)).await;
            first_done_tx.send(()).unwrap();
            outcome
        },
        h.reconciler.drop_task(10, Some(DONE)),
        async {
            release_first.send(()).unwrap();
            first_done_rx.await.unwrap();
            // First succeeded but the second is still out: no refetch yet
            assert_eq!(h.client.freshness(&QueryKey::Tasks(PROJECT)), Some(Freshness::Fresh));
            release_second.send(()).unwrap();
        }
    );

    assert!(matches!(a, MoveOutcome::Committed(_)));
    assert!(matches!(b, MoveOutcome::RolledBack { restore: Restore::Snapshot, .. }));
    // The second move's baseline was the first move's column
    assert_eq!(h.cached_column_of(10), Some(TODO));
    assert_eq!(h.backend.server_column_of(10), Some(TODO));
}

#[tokio::test]
async fn test_both_moves_failing_converge_on_server_state() {
    let h = Harness::loaded().await;
    let fetches_before = h.task_fetches();
    let (first, release_first) = Step::gated_failure(ApiError::Server { status: 500, message: "boom".into() });
    let (second, release_second) = Step::gated_failure(ApiError::Server { status: 500, message: "boom".into() });
    h.backend.script_move(first);
    h.backend.script_move(second);
    let (first_done_tx, first_done_rx) = oneshot::channel();

    let (a, b, ()) = tokio::join!(
        async {
            let outcome = h.reconciler.drop_task(10, Some(TODO)).await;
            first_done_tx.send(()).unwrap();
            outcome
        },
        h.reconciler.drop_task(10, Some(DONE)),
        async {
            release_first.send(()).unwrap();
            first_done_rx.await.unwrap();
            // The newer move is still out: nothing refetched yet
            assert_eq!(h.cached_column_of(10), Some(DONE));
            assert_eq!(h.task_fetches(), fetches_before);
            release_second.send(()).unwrap();
        }
    );

    assert!(matches!(a, MoveOutcome::RolledBack { restore: Restore::Superseded, .. }));
    // The second snapshot held the first move's rejected column
    assert!(matches!(b, MoveOutcome::RolledBack { restore: Restore::Snapshot, .. }));
    assert_eq!(h.backend.server_column_of(10), Some(BACKLOG));
    assert_eq!(h.cached_column_of(10), Some(BACKLOG));
    assert_eq!(h.task_fetches(), fetches_before + 1);
    assert_eq!(h.client.freshness(&QueryKey::Tasks(PROJECT)), Some(Freshness::Fresh));
    assert_eq!(h.notices.errors().len(), 2);
}

#[tokio::test]
async fn test_both_moves_failing_newest_first_converge_on_server_state() {
    let h = Harness::loaded().await;
    let fetches_before = h.task_fetches();
    let (first, release_first) = Step::gated_failure(ApiError::Server { status: 500, message: "boom".into() });
    let (second, release_second) = Step::gated_failure(ApiError::Server { status: 503, message: "busy".into() });
    h.backend.script_move(first);
    h.backend.script_move(second);
    let (second_done_tx, second_done_rx) = oneshot::channel();

    let (a, b, ()) = tokio::join!(
        h.reconciler.drop_task(10, Some(TODO)),
        async {
            let outcome = h.reconciler.drop_task(10, Some(DONE)).await;
            second_done_tx.send(()).unwrap();
            outcome
        },
        async {
            release_second.send(()).unwrap();
            second_done_rx.await.unwrap();
            assert_eq!(h.cached_column_of(10), Some(TODO));
            assert_eq!(h.task_fetches(), fetches_before);
            release_first.send(()).unwrap();
        }
    );

    assert!(matches!(b, MoveOutcome::RolledBack { restore: Restore::Snapshot, .. }));
    assert!(matches!(a, MoveOutcome::RolledBack { restore: Restore::Superseded, .. }));
    assert_eq!(h.cached_column_of(10), Some(BACKLOG));
    assert_eq!(h.task_fetches(), fetches_before + 1);
}

#[tokio::test]
async fn test_moves_of_different_tasks_refetch_once() {
    let h = Harness::loaded().await;
    let fetches_before = h.task_fetches();
    let (first, release_first) = Step::gated();
    let (second, release_second) = Step::gated();
    h.backend.script_move(first);
    h.backend.script_move(second);

    let (a, b, ()) = tokio::join!(
        h.reconciler.drop_task(10, Some(DONE)),
        h.reconciler.drop_task(11, Some(BACKLOG)),
        async {
            assert_eq!(h.cached_column_of(10), Some(DONE));
            assert_eq!(h.cached_column_of(11), Some(BACKLOG));
            release_second.send(()).unwrap();
            release_first.send(()).unwrap();
        }
    );

    assert!(matches!(a, MoveOutcome::Committed(_)));
    assert!(matches!(b, MoveOutcome::Committed(_)));
    assert_eq!(h.task_fetches(), fetches_before + 1);
    assert_eq!(h.cached_tasks(), *h.backend.tasks.borrow());
}

#[tokio::test]
async fn test_move_before_tasks_load_is_noop() {
    let h = Harness::new();
    assert_eq!(h.reconciler.drop_task(10, Some(DONE)).await, MoveOutcome::NoOp(NoOpReason::NotLoaded));
    assert!(h.backend.move_calls.borrow().is_empty());
}

// ========================
// Session
// ========================

#[tokio::test]
async fn test_login_stores_token_and_loads_user() {
    let h = Harness::new();
    let user = h.session.login("  me@example.com ", "correct-horse").await.unwrap();

    assert_eq!(user, me());
    assert_eq!(h.tokens.access_token().as_deref(), Some("token-1"));
    assert_eq!(h.session.current_user(), Some(me()));
}

#[tokio::test]
async fn test_failed_login_leaves_no_session() {
    let h = Harness::new();
    let err = h.session.login("me@example.com", "wrong-password").await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    assert!(!h.session.has_token());
    assert!(h.client.is_empty());
}

#[tokio::test]
async fn test_logout_clears_token_and_cache() {
    let h = Harness::loaded().await;
    let ended = Rc::new(RefCell::new(Vec::new()));
    let seen = ended.clone();
    h.session.on_end(move |reason| seen.borrow_mut().push(reason));
    assert!(!h.client.is_empty());

    h.session.logout();

    assert!(h.tokens.access_token().is_none());
    assert!(h.client.is_empty());
    assert_eq!(*ended.borrow(), vec![SessionEnd::Logout]);
}

#[tokio::test]
async fn test_login_clears_previous_cache() {
    let h = Harness::loaded().await;
    assert!(h.client.get_data(&QueryKey::Tasks(PROJECT)).is_some());

    let user = h.session.login("other@example.com", "correct-horse").await.unwrap();

    assert_eq!(user, other_user());
    assert_eq!(h.tokens.access_token().as_deref(), Some("token-2"));
    assert!(h.client.get_data(&QueryKey::Tasks(PROJECT)).is_none());
    assert!(h.client.get_data(&QueryKey::Columns(PROJECT)).is_none());
    assert_eq!(h.session.current_user(), Some(other_user()));
}

#[tokio::test]
async fn test_fetch_from_previous_session_never_lands() {
    let h = Harness::loaded().await;
    let (step, release) = Step::gated();
    h.backend.script_task_fetch(step);

    let (landed, user) = tokio::join!(h.client.fetch(QueryKey::Tasks(PROJECT)), async {
        // First user's fetch is parked at its gate
        h.session.logout();
        let user = h.session.login("other@example.com", "correct-horse").await.unwrap();
        release.send(()).unwrap();
        user
    });

    assert_eq!(user, other_user());
    assert_eq!(landed, Ok(false));
    assert!(h.client.get_data(&QueryKey::Tasks(PROJECT)).is_none());

    assert_eq!(h.client.fetch(QueryKey::Tasks(PROJECT)).await, Ok(true));
    assert!(h.client.get_data(&QueryKey::Tasks(PROJECT)).is_some());
}

#[tokio::test]
async fn test_unauthorized_read_expires_session() {
    let h = Harness::loaded().await;
    let ended = Rc::new(RefCell::new(Vec::new()));
    let seen = ended.clone();
    h.session.on_end(move |reason| seen.borrow_mut().push(reason));
    h.backend.script_task_fetch(Step::failure(ApiError::SessionExpired));

    let result = h.client.fetch(QueryKey::Tasks(PROJECT)).await;

    assert_eq!(result, Err(ApiError::SessionExpired));
    assert!(!h.session.has_token());
    assert!(h.client.get_data(&QueryKey::Tasks(PROJECT)).is_none());
    assert!(h.client.get_data(&QueryKey::CurrentUser).is_none());
    assert_eq!(*ended.borrow(), vec![SessionEnd::Expired]);
}

#[tokio::test]
async fn test_unauthorized_move_discards_without_notice() {
    let h = Harness::loaded().await;
    h.backend.script_move(Step::failure(ApiError::SessionExpired));

    let outcome = h.reconciler.drop_task(10, Some(DONE)).await;

    assert!(matches!(
        outcome,
        MoveOutcome::RolledBack { error: ApiError::SessionExpired, restore: Restore::Discarded }
    ));
    assert!(h.client.is_empty());
    assert!(h.notices.errors().is_empty());
}

#[tokio::test]
async fn test_restore_with_rejected_token_ends_session() {
    let h = Harness::new();
    h.tokens.store("expired-token", None);

    assert_eq!(h.session.restore().await, None);
    assert!(!h.session.has_token());
    assert!(h.client.is_empty());
}

#[tokio::test]
async fn test_restore_with_valid_token() {
    let h = Harness::new();
    h.tokens.store("token-1", Some("refresh-1"));

    assert_eq!(h.session.restore().await, Some(me()));
    assert_eq!(h.backend.logins.get(), 0);
}

// ========================
// Scenario
// ========================

/// Backlog(1) / Done(4) with task 10 in Backlog: one move lands, the next
/// hits a 500 and is rolled back with a notice
#[tokio::test]
async fn test_board_scenario() {
    let h = Harness::loaded().await;
    assert_eq!(h.cached_column_of(10), Some(BACKLOG));

    let outcome = h.reconciler.drop_task(10, Some(DONE)).await;
    assert!(matches!(outcome, MoveOutcome::Committed(_)));
    assert_eq!(h.backend.server_column_of(10), Some(DONE));
    assert_eq!(h.cached_column_of(10), Some(DONE));

    h.backend.script_move(Step::failure(ApiError::from_status(500, r#"{"message":"Internal error"}"#)));
    let before = h.cached_tasks();
    let outcome = h.reconciler.drop_task(10, Some(BACKLOG)).await;

    assert!(matches!(outcome, MoveOutcome::RolledBack { error: ApiError::Server { status: 500, .. }, .. }));
    assert_eq!(h.cached_tasks(), before);
    assert_eq!(h.cached_column_of(10), Some(DONE));
    assert_eq!(h.notices.errors().len(), 1);

    let id = h.notices.errors()[0].id;
    h.notices.dismiss(id);
    assert!(h.notices.list().is_empty());
}

#[tokio::test]
async fn test_denied_board_read_for_member_is_reported() {
    let h = Harness::loaded().await;
    h.client.fetch(QueryKey::Members(3)).await.unwrap();
    h.backend.script_task_fetch(Step::failure(ApiError::AccessDenied("Access denied".into())));

    let err = h.client.fetch(QueryKey::Tasks(PROJECT)).await.unwrap_err();
    let members: Vec<WorkspaceMember> = h.client.get(&QueryKey::Members(3)).unwrap();
    let report = anomaly::detect(&err, h.session.current_user().as_ref(), &members, 3, PROJECT, h.session.has_token());

    let report = report.expect("member refused access should be reported");
    assert_eq!(report.user_id, 7);
    assert!(report.token_present);
    // The board keeps its last good value and records the denial
    assert_eq!(h.cached_column_of(10), Some(BACKLOG));
    assert!(matches!(h.client.error(&QueryKey::Tasks(PROJECT)), Some(ApiError::AccessDenied(_))));
}
