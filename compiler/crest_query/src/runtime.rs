//! Revision clock, active-query stacks and the event log.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{DatabaseKey, QueryError, Revision};

/// Something the runtime did, recorded when logging is enabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub thread: ThreadId,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A query is about to run its body.
    WillExecute { query: &'static str, key: String },
    /// A stale memo was re-validated without re-executing.
    DidValidateMemoizedValue { query: &'static str, key: String },
    /// This thread waits for another thread computing the same key.
    WillBlockOn {
        other: ThreadId,
        query: &'static str,
        key: String,
    },
}

impl EventKind {
    pub fn query(&self) -> &'static str {
        match self {
            EventKind::WillExecute { query, .. }
            | EventKind::DidValidateMemoizedValue { query, .. }
            | EventKind::WillBlockOn { query, .. } => query,
        }
    }
}

/// A query currently executing on some thread.
struct ActiveQuery {
    key: DatabaseKey,
    query: &'static str,
    deps: Vec<DatabaseKey>,
    seen: FxHashSet<DatabaseKey>,
}

/// Dependencies collected by one execution.
pub(crate) struct Collected {
    pub(crate) deps: Box<[DatabaseKey]>,
}

/// Shared runtime state of a database.
pub struct Runtime {
    revision: AtomicU64,
    stacks: Mutex<FxHashMap<ThreadId, Vec<ActiveQuery>>>,
    /// Waiting thread -> thread it waits for.
    waits: Mutex<FxHashMap<ThreadId, ThreadId>>,
    events: Mutex<Option<Vec<Event>>>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            revision: AtomicU64::new(Revision::START.raw()),
            stacks: Mutex::new(FxHashMap::default()),
            waits: Mutex::new(FxHashMap::default()),
            events: Mutex::new(None),
        }
    }

    pub fn current_revision(&self) -> Revision {
        Revision::from_raw(self.revision.load(Ordering::Acquire))
    }

    /// Advance the clock; called by inputs whose value changed.
    pub(crate) fn new_revision(&self) -> Revision {
        let next = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        let revision = Revision::from_raw(next);
        tracing::debug!(?revision, "new revision");
        revision
    }

    // Event log

    /// Start recording events.
    pub fn enable_logging(&self) {
        let mut events = self.events.lock();
        if events.is_none() {
            *events = Some(Vec::new());
        }
    }

    /// Take the events recorded so far.
    pub fn take_events(&self) -> Vec<Event> {
        match &mut *self.events.lock() {
            Some(events) => std::mem::take(events),
            None => Vec::new(),
        }
    }

    /// Record an event; `make` only runs when logging is enabled.
    pub(crate) fn emit(&self, make: impl FnOnce() -> EventKind) {
        if let Some(events) = &mut *self.events.lock() {
            events.push(Event {
                thread: std::thread::current().id(),
                kind: make(),
            });
        }
    }

    // Active query stacks

    pub(crate) fn push_frame(&self, key: DatabaseKey, query: &'static str) {
        self.stacks
            .lock()
            .entry(std::thread::current().id())
            .or_default()
            .push(ActiveQuery {
                key,
                query,
                deps: Vec::new(),
                seen: FxHashSet::default(),
            });
    }

    pub(crate) fn pop_frame(&self) -> Collected {
        let thread = std::thread::current().id();
        let mut stacks = self.stacks.lock();
        let frame = stacks.get_mut(&thread).and_then(Vec::pop);
        if stacks.get(&thread).is_some_and(Vec::is_empty) {
            stacks.remove(&thread);
        }
        Collected {
            deps: frame.map(|f| f.deps).unwrap_or_default().into_boxed_slice(),
        }
    }

    /// Pop a frame whose execution failed. Its reads move to the enclosing
    /// query, which saw the failure and may have recovered from it.
    pub(crate) fn abandon_frame(&self) {
        let thread = std::thread::current().id();
        let mut stacks = self.stacks.lock();
        let Some(stack) = stacks.get_mut(&thread) else {
            return;
        };
        let failed = stack.pop();
        if let (Some(failed), Some(parent)) = (failed, stack.last_mut()) {
            for dep in failed.deps {
                if parent.seen.insert(dep) {
                    parent.deps.push(dep);
                }
            }
        }
        if stack.is_empty() {
            stacks.remove(&thread);
        }
    }

    /// Record that the innermost active query on this thread read `key`.
    pub(crate) fn report_read(&self, key: DatabaseKey) {
        let thread = std::thread::current().id();
        let mut stacks = self.stacks.lock();
        if let Some(frame) = stacks.get_mut(&thread).and_then(|s| s.last_mut()) {
            if frame.seen.insert(key) {
                frame.deps.push(key);
            }
        }
    }

    /// Names of the active queries on this thread, outermost first.
    pub(crate) fn active_path(&self) -> Vec<&'static str> {
        let thread = std::thread::current().id();
        self.stacks
            .lock()
            .get(&thread)
            .map(|s| s.iter().map(|f| f.query).collect())
            .unwrap_or_default()
    }

    /// Whether `key` is executing on this thread.
    pub fn is_active(&self, key: DatabaseKey) -> bool {
        let thread = std::thread::current().id();
        self.stacks
            .lock()
            .get(&thread)
            .is_some_and(|s| s.iter().any(|f| f.key == key))
    }

    // Cross-thread blocking

    /// Register that this thread waits for `owner`. Fails when the wait
    /// chain starting at `owner` leads back here.
    pub(crate) fn block_on(
        &self,
        owner: ThreadId,
        query: &'static str,
        key: impl Fn() -> String,
    ) -> Result<(), QueryError> {
        let me = std::thread::current().id();
        let mut waits = self.waits.lock();
        let mut cursor = owner;
        loop {
            if cursor == me {
                return Err(QueryError::Cycle {
                    query,
                    key: key(),
                    path: self.active_path(),
                });
            }
            match waits.get(&cursor) {
                Some(&next) => cursor = next,
                None => break,
            }
        }
        waits.insert(me, owner);
        drop(waits);
        self.emit(|| EventKind::WillBlockOn {
            other: owner,
            query,
            key: key(),
        });
        Ok(())
    }

    pub(crate) fn unblock(&self) {
        self.waits.lock().remove(&std::thread::current().id());
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("revision", &self.current_revision())
            .finish_non_exhaustive()
    }
}
