// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end resolution tests.
//!
//! Programs are built with `crest_ir::AstBuilder` and resolved through the
//! public API only.
//!
//! # Organization
//!
//! - `names/` - lookup, shadowing and declaration order
//! - `calls/` - overload selection and failures
//! - `generics/` - instantiation, where clauses and recursion limits
//! - `arrays/` - array, domain and loop typing
//! - `incremental/` - memo reuse across edits and idempotence
//! - `check/` - `check_module` and diagnostics
//!
//! ```bash
//! cargo test -p crest_resolve --test resolution
//! cargo test -p crest_resolve --test resolution generics
//! ```

#[path = "resolution/common.rs"]
mod common;

#[path = "resolution/names.rs"]
mod names;

#[path = "resolution/calls.rs"]
mod calls;

#[path = "resolution/generics.rs"]
mod generics;

#[path = "resolution/arrays.rs"]
mod arrays;

#[path = "resolution/incremental.rs"]
mod incremental;

#[path = "resolution/check.rs"]
mod check;
