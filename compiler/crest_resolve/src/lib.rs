//! Incremental semantic resolution for Crest.
//!
//! Given finished syntax trees, the resolver computes a qualified type for
//! every expression and declaration, binds every name to the declarations
//! it denotes, and resolves every call to one overload, instantiating
//! generic functions and aggregates on demand.
//!
//! All work happens in memoized queries owned by a [`Context`]:
//!
//! - scopes and lookups per `(scope, name, mode)`
//! - one result table per module statement, module and function body
//! - initial signatures, instantiations, return types and aggregate fields
//!
//! Program errors are values ([`ResolutionError`]) stored in the result
//! tables. [`InternalError`] is reserved for broken invariants.
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=crest_resolve=debug`: instantiations, bodies and modules
//!   as they are resolved (after [`init_tracing`]).
//! - `RUST_LOG=crest_resolve=trace`: also candidate rejections and
//!   speculative failures.
//! - `CREST_MAX_INSTANTIATION_DEPTH`: read by [`ResolverConfig::from_env`].

mod aggregate;
mod api;
mod call;
mod coerce;
mod config;
mod context;
mod driver;
mod error;
mod instantiate;
mod lookup;
mod queries;
mod resolver;
mod result;
mod returns;
mod scope;
mod signature;
mod stack;

use std::sync::Once;

pub use aggregate::{FieldInfo, FieldsInfo};
pub use api::{
    check_module, diagnostics, instantiations_of, lookup, resolve_concrete_function,
    resolve_function_body, resolve_module, resolve_modules, resolved_call, resolved_expr,
    scope_for, signature_of, type_of,
};
pub use config::{ResolverConfig, MAX_DEPTH_ENV};
pub use context::Context;
pub use error::{
    ErrorCategory, InternalError, RejectReason, Rejection, ResolutionError, ResolutionErrorKind,
};
pub use instantiate::{GenericKey, InstantiateOutcome, Instantiated, Instantiation, InstantiationKey};
pub use lookup::{LookupMode, LookupResult, Target};
pub use result::{ActualSource, FormalActual, ResolutionResult, ResolvedCall, ResolvedExpr};
pub use scope::{Scope, UseDirective};
pub use signature::SignatureInfo;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
