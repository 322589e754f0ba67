//! Storage of a derived query: one memo slot per key.

use std::thread::ThreadId;

use parking_lot::{Condvar, Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::database::{Database, Ingredient, Query};
use crate::runtime::EventKind;
use crate::{DatabaseKey, IngredientIndex, QueryError, Revision};

type DbError<Q> = <<Q as Query>::Db as Database>::Error;

#[derive(Clone)]
struct Memo<V> {
    value: V,
    /// Last revision in which `value` changed.
    changed_at: Revision,
    /// Last revision in which `value` was known to be current.
    verified_at: Revision,
    deps: Box<[DatabaseKey]>,
}

enum SlotState<V> {
    Empty,
    /// Being computed or re-validated by `owner`. The previous state is
    /// restored if that fails.
    Running {
        owner: ThreadId,
    },
    Ready(Memo<V>),
}

struct Table<Q: Query> {
    map: FxHashMap<Q::Key, u32>,
    keys: Vec<Q::Key>,
    slots: Vec<SlotState<Q::Value>>,
}

impl<Q: Query> Table<Q> {
    fn slot_for(&mut self, key: &Q::Key) -> u32 {
        if let Some(&slot) = self.map.get(key) {
            return slot;
        }
        let slot = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.map.insert(key.clone(), slot);
        self.keys.push(key.clone());
        self.slots.push(SlotState::Empty);
        slot
    }

    fn state_mut(&mut self, slot: u32) -> Option<&mut SlotState<Q::Value>> {
        self.slots.get_mut(slot as usize)
    }
}

/// Memo table of one derived query.
pub struct DerivedStorage<Q: Query> {
    index: IngredientIndex,
    table: Mutex<Table<Q>>,
    ready: Condvar,
}

/// What a claimed slot held before it was marked running.
enum Claim<V> {
    Fresh,
    Stale(Memo<V>),
}

/// Restores a claimed slot if the computation does not complete.
struct RunGuard<'s, Q: Query> {
    storage: &'s DerivedStorage<Q>,
    slot: u32,
    previous: Option<Memo<Q::Value>>,
    armed: bool,
}

impl<Q: Query> RunGuard<'_, Q> {
    fn complete(mut self, memo: Memo<Q::Value>) {
        self.armed = false;
        self.storage.publish(self.slot, SlotState::Ready(memo));
    }
}

impl<Q: Query> Drop for RunGuard<'_, Q> {
    fn drop(&mut self) {
        if self.armed {
            let restored = match self.previous.take() {
                Some(memo) => SlotState::Ready(memo),
                None => SlotState::Empty,
            };
            self.storage.publish(self.slot, restored);
        }
    }
}

/// Pops the active frame even when the query body fails or panics.
struct FrameGuard<'r> {
    runtime: &'r crate::Runtime,
    popped: bool,
}

impl FrameGuard<'_> {
    fn finish(mut self) -> Box<[DatabaseKey]> {
        self.popped = true;
        self.runtime.pop_frame().deps
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.popped {
            self.runtime.abandon_frame();
        }
    }
}

impl<Q: Query> DerivedStorage<Q> {
    pub fn new(index: IngredientIndex) -> Self {
        DerivedStorage {
            index,
            table: Mutex::new(Table {
                map: FxHashMap::default(),
                keys: Vec::new(),
                slots: Vec::new(),
            }),
            ready: Condvar::new(),
        }
    }

    pub fn index(&self) -> IngredientIndex {
        self.index
    }

    /// Value for `key`, recording a dependency of the active query on it.
    pub fn fetch(&self, db: &Q::Db, key: &Q::Key) -> Result<Q::Value, DbError<Q>> {
        let slot = self.table.lock().slot_for(key);
        let (value, _) = self.refresh_slot(db, slot)?;
        db.runtime().report_read(DatabaseKey::new(self.index, slot));
        Ok(value)
    }

    /// Memoized value for `key` if it is verified in the current revision.
    /// Records no dependency.
    pub fn peek(&self, db: &Q::Db, key: &Q::Key) -> Option<Q::Value> {
        let current = db.runtime().current_revision();
        let table = self.table.lock();
        let slot = *table.map.get(key)?;
        match table.slots.get(slot as usize)? {
            SlotState::Ready(memo) if memo.verified_at == current => Some(memo.value.clone()),
            _ => None,
        }
    }

    /// Number of keys holding a memo.
    pub fn memoized_count(&self) -> usize {
        self.table
            .lock()
            .slots
            .iter()
            .filter(|s| matches!(s, SlotState::Ready(_)))
            .count()
    }

    fn key_of(&self, slot: u32) -> String {
        self.table
            .lock()
            .keys
            .get(slot as usize)
            .map(|k| format!("{k:?}"))
            .unwrap_or_default()
    }

    fn publish(&self, slot: u32, state: SlotState<Q::Value>) {
        let mut table = self.table.lock();
        if let Some(s) = table.state_mut(slot) {
            *s = state;
        }
        drop(table);
        self.ready.notify_all();
    }

    /// Make `slot` current: reuse, re-validate or execute. Returns the value
    /// and its `changed_at`.
    fn refresh_slot(&self, db: &Q::Db, slot: u32) -> Result<(Q::Value, Revision), DbError<Q>> {
        let runtime = db.runtime();
        let current = runtime.current_revision();
        let me = std::thread::current().id();

        let claim = {
            let mut table = self.table.lock();
            loop {
                let Some(state) = table.state_mut(slot) else {
                    return Err(QueryError::UnknownIngredient {
                        index: self.index.raw(),
                    }
                    .into());
                };
                match state {
                    SlotState::Ready(memo) if memo.verified_at == current => {
                        tracing::trace!(query = Q::NAME, slot, "memo hit");
                        return Ok((memo.value.clone(), memo.changed_at));
                    }
                    SlotState::Running { owner } if *owner == me => {
                        drop(table);
                        return Err(QueryError::Cycle {
                            query: Q::NAME,
                            key: self.key_of(slot),
                            path: runtime.active_path(),
                        }
                        .into());
                    }
                    SlotState::Running { owner } => {
                        let owner = *owner;
                        table = self.wait_for(table, db, owner, slot)?;
                    }
                    SlotState::Ready(_) | SlotState::Empty => {
                        match std::mem::replace(state, SlotState::Running { owner: me }) {
                            SlotState::Ready(memo) => break Claim::Stale(memo),
                            _ => break Claim::Fresh,
                        }
                    }
                }
            }
        };

        let mut guard = RunGuard {
            storage: self,
            slot,
            previous: None,
            armed: true,
        };

        if let Claim::Stale(memo) = claim {
            guard.previous = Some(memo);
        }
        let reusable = match &guard.previous {
            Some(memo) => self.deps_unchanged(db, memo)?,
            None => false,
        };
        if reusable {
            if let Some(memo) = guard.previous.take() {
                runtime.emit(|| EventKind::DidValidateMemoizedValue {
                    query: Q::NAME,
                    key: self.key_of(slot),
                });
                tracing::trace!(query = Q::NAME, slot, "memo re-validated");
                let result = (memo.value.clone(), memo.changed_at);
                guard.complete(Memo {
                    verified_at: current,
                    ..memo
                });
                return Ok(result);
            }
        }

        let key = {
            let table = self.table.lock();
            table.keys.get(slot as usize).cloned()
        };
        let Some(key) = key else {
            return Err(QueryError::UnknownIngredient {
                index: self.index.raw(),
            }
            .into());
        };

        runtime.emit(|| EventKind::WillExecute {
            query: Q::NAME,
            key: format!("{key:?}"),
        });
        tracing::debug!(query = Q::NAME, ?key, "execute");

        runtime.push_frame(DatabaseKey::new(self.index, slot), Q::NAME);
        let frame = FrameGuard {
            runtime,
            popped: false,
        };
        let value = Q::execute(db, &key)?;
        let deps = frame.finish();

        let changed_at = match &guard.previous {
            Some(old) if old.value == value => {
                tracing::trace!(query = Q::NAME, ?key, "backdated");
                old.changed_at
            }
            _ => current,
        };
        guard.complete(Memo {
            value: value.clone(),
            changed_at,
            verified_at: current,
            deps,
        });
        Ok((value, changed_at))
    }

    /// Whether every dependency is unchanged since `memo` was verified.
    fn deps_unchanged(&self, db: &Q::Db, memo: &Memo<Q::Value>) -> Result<bool, DbError<Q>> {
        for dep in memo.deps.iter() {
            let ingredient = db
                .ingredient(dep.ingredient)
                .ok_or(QueryError::UnknownIngredient {
                    index: dep.ingredient.raw(),
                })?;
            if ingredient.refresh(db, dep.slot)? > memo.verified_at {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn wait_for<'t>(
        &'t self,
        mut table: MutexGuard<'t, Table<Q>>,
        db: &Q::Db,
        owner: ThreadId,
        slot: u32,
    ) -> Result<MutexGuard<'t, Table<Q>>, DbError<Q>> {
        let runtime = db.runtime();
        let key = table
            .keys
            .get(slot as usize)
            .map(|k| format!("{k:?}"))
            .unwrap_or_default();
        runtime.block_on(owner, Q::NAME, || key.clone())?;
        self.ready.wait(&mut table);
        runtime.unblock();
        Ok(table)
    }
}

impl<Q: Query> Ingredient<Q::Db> for DerivedStorage<Q>
where
    Q::Key: 'static,
    Q::Value: 'static,
{
    fn name(&self) -> &'static str {
        Q::NAME
    }

    fn debug_key(&self, slot: u32) -> String {
        self.key_of(slot)
    }

    fn refresh(&self, db: &Q::Db, slot: u32) -> Result<Revision, DbError<Q>> {
        self.refresh_slot(db, slot).map(|(_, changed_at)| changed_at)
    }
}

impl<Q: Query> std::fmt::Debug for DerivedStorage<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedStorage")
            .field("query", &Q::NAME)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
