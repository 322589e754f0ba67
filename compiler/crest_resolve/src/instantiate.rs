//! The instantiation cache.
//!
//! Instantiation is the `Instantiate` query, so equal keys share one
//! result for the whole session and are recomputed only when the generic
//! declaration's file changes. The registry indexes every key ever
//! instantiated by its generic declaration.

use crest_ir::NodeId;
use crest_query::Query;
use crest_types::{SignatureId, Substitution, TypeId};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::aggregate;
use crate::context::Frame;
use crate::error::{InternalError, ResolutionError};
use crate::queries::InitialSignature;
use crate::signature;
use crate::Context;

/// The generic declaration being instantiated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericKey {
    Function(NodeId),
    /// Compiler-generated initializer of the aggregate.
    Initializer(NodeId),
    /// The aggregate type itself, as in `R(int)`.
    Aggregate(NodeId),
}

impl GenericKey {
    pub fn decl(self) -> NodeId {
        match self {
            GenericKey::Function(d) | GenericKey::Initializer(d) | GenericKey::Aggregate(d) => d,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstantiationKey {
    pub generic: GenericKey,
    pub subs: Substitution,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instantiated {
    Signature(SignatureId),
    Type(TypeId),
}

impl Instantiated {
    pub fn signature(self) -> Option<SignatureId> {
        match self {
            Instantiated::Signature(id) => Some(id),
            Instantiated::Type(_) => None,
        }
    }

    pub fn ty(self) -> Option<TypeId> {
        match self {
            Instantiated::Type(id) => Some(id),
            Instantiated::Signature(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstantiateOutcome {
    pub value: Instantiated,
    /// Failures in the instantiated signature, such as a where clause that
    /// is not a param.
    pub errors: Vec<ResolutionError>,
}

/// One entry of [`crate::instantiations_of`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instantiation {
    pub key: InstantiationKey,
    pub value: Instantiated,
}

/// Keys instantiated so far, by generic declaration.
#[derive(Default)]
pub(crate) struct InstantiationRegistry {
    by_decl: Mutex<FxHashMap<NodeId, Vec<Instantiation>>>,
}

impl InstantiationRegistry {
    fn record(&self, key: &InstantiationKey, value: Instantiated) {
        let mut map = self.by_decl.lock();
        let entries = map.entry(key.generic.decl()).or_default();
        match entries.iter_mut().find(|e| e.key == *key) {
            Some(existing) => existing.value = value,
            None => entries.push(Instantiation {
                key: key.clone(),
                value,
            }),
        }
    }

    pub(crate) fn of(&self, decl: NodeId) -> Vec<Instantiation> {
        self.by_decl.lock().get(&decl).cloned().unwrap_or_default()
    }

    pub(crate) fn all(&self) -> Vec<Instantiation> {
        let map = self.by_decl.lock();
        let mut decls: Vec<_> = map.keys().copied().collect();
        decls.sort();
        decls
            .into_iter()
            .filter_map(|d| map.get(&d))
            .flat_map(|entries| entries.iter().cloned())
            .collect()
    }
}

#[tracing::instrument(level = "debug", skip(ctx), fields(decl = %key.generic.decl()))]
pub(crate) fn instantiate(
    ctx: &Context,
    key: &InstantiationKey,
) -> Result<InstantiateOutcome, InternalError> {
    let _frame = ctx.push_frame(Frame::Instantiate(key.clone()));
    let decl = key.generic.decl();
    let ast = ctx.ast(decl.file)?;

    let outcome = match key.generic {
        GenericKey::Function(decl) => {
            let generic = InitialSignature::get(ctx, decl)?.signature;
            let (sig, errors) =
                signature::build_function(ctx, &ast, decl, key.subs.clone(), Some(generic))?;
            InstantiateOutcome {
                value: Instantiated::Signature(ctx.signatures().intern(sig)),
                errors,
            }
        }
        GenericKey::Initializer(decl) => {
            let generic = InitialSignature::get(ctx, decl)?.signature;
            let ty = aggregate::instance(ctx, decl, &key.subs)?;
            let sig = signature::build_default_init(ctx, decl, ty, Some(generic))?;
            InstantiateOutcome {
                value: Instantiated::Signature(ctx.signatures().intern(sig)),
                errors: Vec::new(),
            }
        }
        GenericKey::Aggregate(decl) => InstantiateOutcome {
            value: Instantiated::Type(aggregate::instantiate_type(ctx, &ast, decl, &key.subs)?),
            errors: Vec::new(),
        },
    };

    ctx.registry.record(key, outcome.value);
    tracing::debug!(value = ?outcome.value, bindings = key.subs.len(), "instantiated");
    Ok(outcome)
}

#[cfg(test)]
mod tests;
