//! Resource stores.
//!
//! One generic store owns one resource collection plus its request status and
//! is the sole mutator of that collection. Each resource type gets a store by
//! pairing the generic machinery with its service.
//!
//! Per-operation-kind discipline:
//! - dispatching marks the store loading and clears the previous error;
//! - a dispatch while the same kind is already in flight coalesces instead of
//!   issuing a second request;
//! - every dispatch carries a sequence number, and a completion at or below
//!   the last applied sequence for its kind is discarded, so a delayed
//!   response can never overwrite a fresher one;
//! - a rejected operation stores the error message and leaves the collection
//!   untouched. The store never retries and never returns an error itself.

mod filter;

pub use filter::*;

use std::sync::RwLock;

use crate::models::Keyed;
use crate::services::ResourceService;

/// Lifecycle state of the store's most recent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// The kinds of async operation a store performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    FetchList,
    Upsert,
    Remove,
}

impl OpKind {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            OpKind::FetchList => 0,
            OpKind::Upsert => 1,
            OpKind::Remove => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::FetchList => "fetch-list",
            OpKind::Upsert => "upsert",
            OpKind::Remove => "remove",
        }
    }
}

/// Outcome of dispatching an operation on a store.
///
/// Failures do not surface here; they land in [`ResourceStore::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The operation ran and settled (successfully or not).
    Completed,
    /// An operation of the same kind was already in flight; no request was issued.
    AlreadyInFlight,
}

/// How a settled operation mutates the collection.
enum Settled<R> {
    /// List fetch: replace the collection wholesale.
    List(Vec<R>),
    /// Upsert: replace in place by key, else append.
    Upserted(R),
    /// Remove: delete by key.
    Removed(String),
    /// Rejection: record the message, leave the collection untouched.
    Failed(String),
}

/// The state machine behind a store, kept separate from the async driver so
/// the transitions stay synchronous and directly testable.
struct StoreState<R> {
    records: Vec<R>,
    status: RequestStatus,
    error: Option<String>,
    in_flight: [bool; OpKind::COUNT],
    issued: [u64; OpKind::COUNT],
    applied: [u64; OpKind::COUNT],
}

impl<R: Keyed + Clone> StoreState<R> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            status: RequestStatus::Idle,
            error: None,
            in_flight: [false; OpKind::COUNT],
            issued: [0; OpKind::COUNT],
            applied: [0; OpKind::COUNT],
        }
    }

    /// Transition into `Loading` for `kind`, or `None` when that kind already
    /// has an operation in flight (single-flight).
    fn begin(&mut self, kind: OpKind) -> Option<u64> {
        let i = kind.index();
        if self.in_flight[i] {
            return None;
        }
        self.in_flight[i] = true;
        self.issued[i] += 1;
        self.status = RequestStatus::Loading;
        self.error = None;
        Some(self.issued[i])
    }

    /// Settle the operation issued as `seq`.
    fn settle(&mut self, kind: OpKind, seq: u64, outcome: Settled<R>) {
        let i = kind.index();
        self.in_flight[i] = false;

        if let Settled::Failed(message) = outcome {
            self.status = RequestStatus::Failed;
            self.error = Some(message);
            return;
        }

        self.status = RequestStatus::Succeeded;

        // Stale completion: a newer response of this kind already applied.
        if seq <= self.applied[i] {
            tracing::warn!(
                op = kind.as_str(),
                seq,
                applied = self.applied[i],
                "discarding stale completion"
            );
            return;
        }
        self.applied[i] = seq;

        match outcome {
            Settled::List(records) => self.records = records,
            Settled::Upserted(record) => {
                match self.records.iter_mut().find(|r| r.key() == record.key()) {
                    Some(existing) => *existing = record,
                    None => self.records.push(record),
                }
            }
            Settled::Removed(key) => self.records.retain(|r| r.key() != key),
            Settled::Failed(_) => unreachable!(),
        }
    }
}

/// In-memory cache of one resource collection, driven through its service.
pub struct ResourceStore<S: ResourceService> {
    service: S,
    state: RwLock<StoreState<S::Record>>,
}

impl<S: ResourceService> ResourceStore<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: RwLock::new(StoreState::new()),
        }
    }

    /// Access the underlying service for resource-specific extensions
    /// (schema validation, sitemap generation, by-id reads).
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Fetch the full collection, replacing the cached one on success.
    pub async fn fetch_all(&self) -> Dispatch {
        let Some(seq) = self.lock().begin(OpKind::FetchList) else {
            return Dispatch::AlreadyInFlight;
        };
        let outcome = match self.service.list().await {
            Ok(records) => Settled::List(records),
            Err(e) => self.rejected(OpKind::FetchList, e),
        };
        self.lock().settle(OpKind::FetchList, seq, outcome);
        Dispatch::Completed
    }

    /// Create or update one record; the server-confirmed record is merged
    /// into the collection by key.
    pub async fn upsert(&self, record: S::Record) -> Dispatch {
        let Some(seq) = self.lock().begin(OpKind::Upsert) else {
            return Dispatch::AlreadyInFlight;
        };
        let outcome = match self.service.upsert(&record).await {
            Ok(confirmed) => Settled::Upserted(confirmed),
            Err(e) => self.rejected(OpKind::Upsert, e),
        };
        self.lock().settle(OpKind::Upsert, seq, outcome);
        Dispatch::Completed
    }

    /// Delete one record by key.
    pub async fn remove(&self, key: &str) -> Dispatch {
        let Some(seq) = self.lock().begin(OpKind::Remove) else {
            return Dispatch::AlreadyInFlight;
        };
        let outcome = match self.service.remove(key).await {
            Ok(()) => Settled::Removed(key.to_string()),
            Err(e) => self.rejected(OpKind::Remove, e),
        };
        self.lock().settle(OpKind::Remove, seq, outcome);
        Dispatch::Completed
    }

    fn rejected(&self, kind: OpKind, error: crate::errors::ApiError) -> Settled<S::Record> {
        tracing::warn!(
            resource = self.service.resource_name(),
            op = kind.as_str(),
            "operation rejected: {}",
            error
        );
        Settled::Failed(error.message())
    }

    /// Snapshot of the collection in insertion order.
    pub fn records(&self) -> Vec<S::Record> {
        self.lock().records.clone()
    }

    pub fn get(&self, key: &str) -> Option<S::Record> {
        self.lock().records.iter().find(|r| r.key() == key).cloned()
    }

    pub fn status(&self) -> RequestStatus {
        self.lock().status
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    fn lock(&self) -> std::sync::RwLockWriteGuard<'_, StoreState<S::Record>> {
        // Never held across an await point.
        self.state.write().expect("store lock poisoned")
    }
}

impl<S: ResourceService> ResourceStore<S>
where
    S::Record: Queryable,
{
    /// Derived, filtered and sorted view of the collection. Pure over the
    /// current snapshot; identical inputs yield identical output.
    pub fn select_filtered(
        &self,
        filter: &FilterDescriptor,
        sort: Option<&SortDescriptor>,
    ) -> Vec<S::Record> {
        let records = self.records();
        select_filtered(&records, filter, sort)
    }
}
