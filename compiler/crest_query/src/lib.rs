//! Memoized query substrate.
//!
//! A database owns one storage ("ingredient") per query. Inputs are set from
//! outside and bump the global [`Revision`] when their value changes.
//! Derived queries are pure functions of the database; while one executes,
//! every query it reads is recorded as a dependency. A later fetch first
//! re-validates those dependencies and reuses the memo when none changed.
//! When a query re-executes and produces an equal value, its old
//! `changed_at` is kept so dependents further up are not invalidated.
//!
//! Each key has a single writer. Other threads asking for a key that is
//! being computed wait for it; a thread that re-enters its own running key,
//! or a wait chain that loops back, fails with [`QueryError::Cycle`].

mod database;
mod derived;
mod error;
mod input;
mod key;
mod revision;
mod runtime;

pub use database::{Database, Ingredient, Query};
pub use derived::DerivedStorage;
pub use error::QueryError;
pub use input::InputStorage;
pub use key::{DatabaseKey, IngredientIndex};
pub use revision::Revision;
pub use runtime::{Event, EventKind, Runtime};
