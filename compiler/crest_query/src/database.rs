use std::fmt::Debug;
use std::hash::Hash;

use crate::{DerivedStorage, IngredientIndex, QueryError, Revision, Runtime};

/// A database: a runtime plus the storages of its queries.
pub trait Database: Sized + Send + Sync + 'static {
    /// Fatal error type of every query. Substrate failures convert into it.
    type Error: From<QueryError> + Clone + Debug + Send + Sync + 'static;

    fn runtime(&self) -> &Runtime;

    /// Storage registered under `index`.
    fn ingredient(&self, index: IngredientIndex) -> Option<&dyn Ingredient<Self>>;
}

/// Type-erased view of a storage, used to re-validate dependencies.
pub trait Ingredient<Db: Database>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Debug rendering of the key in `slot`.
    fn debug_key(&self, slot: u32) -> String;

    /// Bring `slot` up to date with the current revision and report the
    /// revision in which its value last changed.
    fn refresh(&self, db: &Db, slot: u32) -> Result<Revision, Db::Error>;
}

/// A derived query.
pub trait Query: Sized + 'static {
    type Db: Database;
    type Key: Clone + Eq + Hash + Debug + Send + Sync;
    /// Compared on re-execution for early cutoff.
    type Value: Clone + Eq + Debug + Send + Sync;

    const NAME: &'static str;

    fn storage(db: &Self::Db) -> &DerivedStorage<Self>;

    fn execute(
        db: &Self::Db,
        key: &Self::Key,
    ) -> Result<Self::Value, <Self::Db as Database>::Error>;

    /// Fetch through the query's storage, recording the dependency.
    fn get(db: &Self::Db, key: Self::Key) -> Result<Self::Value, <Self::Db as Database>::Error> {
        Self::storage(db).fetch(db, &key)
    }
}
