//! Type and value representation for semantic resolution.
//!
//! - [`TypePool`]: structural interning, identical structure means identical [`TypeId`]
//! - [`QualifiedType`]: kind + type + optional compile-time [`ParamValue`]
//! - [`Substitution`]: generic declaration to concrete qualified type, order independent
//! - [`Signature`] / [`SignaturePool`]: interned function signatures

mod data;
mod flags;
mod format;
mod ids;
mod param;
mod pool;
mod qualified;
mod signature;
mod substitution;

pub use data::{AggregateType, DomainKind, TypeData};
pub use flags::TypeFlags;
pub use format::{display_qualified, display_signature, display_type};
pub use ids::{SignatureId, TypeId};
pub use param::ParamValue;
pub use pool::TypePool;
pub use qualified::{QualKind, QualifiedType};
pub use signature::{SigFormal, Signature, SignatureKind, SignaturePool, WhereClause};
pub use substitution::Substitution;
