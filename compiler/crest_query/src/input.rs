//! Input storage: values set from outside the database.

use std::fmt::Debug;
use std::hash::Hash;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::database::{Database, Ingredient};
use crate::{DatabaseKey, IngredientIndex, Revision};

struct InputSlot<V> {
    /// `None` for keys read before they were ever set.
    value: Option<V>,
    changed_at: Revision,
}

struct InputTable<K, V> {
    map: FxHashMap<K, u32>,
    keys: Vec<K>,
    slots: Vec<InputSlot<V>>,
}

impl<K: Clone + Eq + Hash, V> InputTable<K, V> {
    fn slot_for(&mut self, key: &K) -> u32 {
        if let Some(&slot) = self.map.get(key) {
            return slot;
        }
        let slot = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.map.insert(key.clone(), slot);
        self.keys.push(key.clone());
        self.slots.push(InputSlot {
            value: None,
            changed_at: Revision::START,
        });
        slot
    }
}

/// Keyed input values.
///
/// Reading a key records a dependency even when the key is absent, so a
/// later `set` of that key invalidates the reader.
pub struct InputStorage<K, V> {
    index: IngredientIndex,
    name: &'static str,
    table: RwLock<InputTable<K, V>>,
}

impl<K, V> InputStorage<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync,
    V: Clone + Eq + Send + Sync,
{
    pub fn new(index: IngredientIndex, name: &'static str) -> Self {
        InputStorage {
            index,
            name,
            table: RwLock::new(InputTable {
                map: FxHashMap::default(),
                keys: Vec::new(),
                slots: Vec::new(),
            }),
        }
    }

    pub fn index(&self) -> IngredientIndex {
        self.index
    }

    /// Current value of `key`, recording a dependency.
    pub fn get<Db: Database>(&self, db: &Db, key: &K) -> Option<V> {
        let existing = {
            let table = self.table.read();
            table.map.get(key).map(|&slot| {
                let value = table.slots.get(slot as usize).and_then(|s| s.value.clone());
                (slot, value)
            })
        };
        let (slot, value) = match existing {
            Some(found) => found,
            None => (self.table.write().slot_for(key), None),
        };
        db.runtime().report_read(DatabaseKey::new(self.index, slot));
        value
    }

    /// Set `key`. Starts a new revision only when the value changes.
    /// Returns whether it changed.
    pub fn set<Db: Database>(&self, db: &Db, key: K, value: V) -> bool {
        self.replace(db, key, Some(value))
    }

    /// Remove `key`, invalidating its readers if it was present.
    pub fn remove<Db: Database>(&self, db: &Db, key: K) -> bool {
        self.replace(db, key, None)
    }

    fn replace<Db: Database>(&self, db: &Db, key: K, value: Option<V>) -> bool {
        let mut table = self.table.write();
        let slot = table.slot_for(&key);
        let Some(entry) = table.slots.get_mut(slot as usize) else {
            return false;
        };
        if entry.value == value {
            return false;
        }
        let revision = db.runtime().new_revision();
        tracing::debug!(input = self.name, ?key, ?revision, "input changed");
        entry.value = value;
        entry.changed_at = revision;
        true
    }

    /// Keys that currently hold a value, in first-seen order.
    pub fn keys(&self) -> Vec<K> {
        let table = self.table.read();
        table
            .keys
            .iter()
            .zip(&table.slots)
            .filter(|(_, s)| s.value.is_some())
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl<Db, K, V> Ingredient<Db> for InputStorage<K, V>
where
    Db: Database,
    K: Clone + Eq + Hash + Debug + Send + Sync,
    V: Clone + Eq + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn debug_key(&self, slot: u32) -> String {
        self.table
            .read()
            .keys
            .get(slot as usize)
            .map(|k| format!("{k:?}"))
            .unwrap_or_default()
    }

    fn refresh(&self, _db: &Db, slot: u32) -> Result<Revision, Db::Error> {
        Ok(self
            .table
            .read()
            .slots
            .get(slot as usize)
            .map_or(Revision::START, |s| s.changed_at))
    }
}
