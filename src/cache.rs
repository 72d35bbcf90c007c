//! Client Cache
//!
//! Keyed store of the last-known server value of every fetched collection.
//! Every write is tagged with an operation id from one monotonically
//! increasing counter; a write older than the last write that landed on the
//! same key is discarded. Fetches register their id up front so a cancelled
//! or superseded fetch resolves as a no-op.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::models::*;

/// Composite cache key: entity kind plus scoping id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    CurrentUser,
    Workspaces,
    Workspace(WorkspaceId),
    Members(WorkspaceId),
    Projects(WorkspaceId),
    Project(ProjectId),
    Columns(ProjectId),
    Tasks(ProjectId),
}

/// Cached value, one variant per key kind
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    CurrentUser(User),
    Workspaces(Vec<Workspace>),
    Workspace(Workspace),
    Members(Vec<WorkspaceMember>),
    Projects(Vec<Project>),
    Project(Project),
    Columns(Vec<Column>),
    Tasks(Vec<Task>),
}

/// Typed access to a `QueryData` variant
pub trait QueryValue: Clone + Sized {
    fn into_data(self) -> QueryData;
    fn from_data(data: &QueryData) -> Option<&Self>;
}

macro_rules! query_value {
    ($ty:ty, $variant:ident) => {
        impl QueryValue for $ty {
            fn into_data(self) -> QueryData {
                QueryData::$variant(self)
            }

            fn from_data(data: &QueryData) -> Option<&Self> {
                match data {
                    QueryData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

query_value!(User, CurrentUser);
query_value!(Vec<Workspace>, Workspaces);
query_value!(Workspace, Workspace);
query_value!(Vec<WorkspaceMember>, Members);
query_value!(Vec<Project>, Projects);
query_value!(Project, Project);
query_value!(Vec<Column>, Columns);
query_value!(Vec<Task>, Tasks);

/// Monotonically increasing operation id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    InFlight,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Option<QueryData>,
    pub freshness: Freshness,
    /// Error of the last failed fetch, cleared by the next landed write
    pub error: Option<ApiError>,
    last_write: Option<OpId>,
    fetch: Option<OpId>,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            data: None,
            freshness: Freshness::Stale,
            error: None,
            last_write: None,
            fetch: None,
        }
    }

    fn settle_freshness(&mut self) {
        self.freshness = if self.fetch.is_some() { Freshness::InFlight } else { Freshness::Fresh };
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    next_op: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> OpId {
        self.next_op += 1;
        OpId(self.next_op)
    }

    pub fn get(&self, key: &QueryKey) -> Option<&QueryData> {
        self.entries.get(key).and_then(|e| e.data.as_ref())
    }

    pub fn get_as<T: QueryValue>(&self, key: &QueryKey) -> Option<T> {
        self.get(key).and_then(T::from_data).cloned()
    }

    pub fn entry(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn last_write(&self, key: &QueryKey) -> Option<OpId> {
        self.entries.get(key).and_then(|e| e.last_write)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.fetch.is_some())
    }

    /// Replace the value under a fresh op id. Always lands.
    pub fn set(&mut self, key: QueryKey, data: QueryData) -> OpId {
        let op = self.allocate();
        let entry = self.entries.entry(key).or_insert_with(CacheEntry::empty);
        entry.data = Some(data);
        entry.last_write = Some(op);
        entry.error = None;
        entry.settle_freshness();
        op
    }

    /// Register a fetch for `key`, superseding any fetch already in flight
    pub fn begin_fetch(&mut self, key: QueryKey) -> OpId {
        let op = self.allocate();
        let entry = self.entries.entry(key).or_insert_with(CacheEntry::empty);
        entry.fetch = Some(op);
        entry.freshness = Freshness::InFlight;
        op
    }

    /// Whether `op` is still the registered fetch for `key`
    pub fn is_current_fetch(&self, key: &QueryKey, op: OpId) -> bool {
        self.entries.get(key).is_some_and(|e| e.fetch == Some(op))
    }

    /// Apply the outcome of fetch `op`. Returns true if its data landed.
    /// Outcomes of cancelled or superseded fetches are dropped, and data is
    /// dropped when a newer write reached the key while the fetch was out.
    pub fn complete_fetch(&mut self, key: QueryKey, op: OpId, outcome: Result<QueryData, ApiError>) -> bool {
        let Some(entry) = self.entries.get_mut(&key) else { return false };
        if entry.fetch != Some(op) {
            return false;
        }
        entry.fetch = None;
        match outcome {
            Ok(data) => {
                if entry.last_write.is_some_and(|w| w > op) {
                    entry.freshness = Freshness::Stale;
                    return false;
                }
                entry.data = Some(data);
                entry.last_write = Some(op);
                entry.error = None;
                entry.freshness = Freshness::Fresh;
                true
            }
            Err(err) => {
                entry.error = Some(err);
                entry.freshness = Freshness::Stale;
                false
            }
        }
    }

    /// Drop the registration of an in-flight fetch so its result is ignored
    pub fn cancel_fetch(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if entry.fetch.is_some() => {
                entry.fetch = None;
                entry.freshness = Freshness::Stale;
                true
            }
            _ => false,
        }
    }

    /// Mark stale; the previous value stays readable
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                if entry.fetch.is_none() {
                    entry.freshness = Freshness::Stale;
                }
                true
            }
            None => false,
        }
    }

    /// Discard every entry. The op counter keeps running so nothing issued
    /// before the clear can match a registration made after it.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
