//! Structural type data, the key of the type pool.

use crest_ir::{AggregateKind, Name, NodeId};

use crate::{Substitution, TypeId};

/// Shape of a domain type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DomainKind {
    /// `domain(rank)`, indexed by `idx` (always `int` today).
    Rectangular { rank: u32, idx: TypeId },
    /// `domain(idxType, parSafe)`.
    Associative { idx: TypeId, par_safe: bool },
    /// Bare `domain`: matches any domain.
    Generic,
}

/// A record, class or union type, possibly instantiated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregateType {
    pub decl: NodeId,
    pub name: Name,
    pub kind: AggregateKind,
    /// Bindings of the declaration's generic fields.
    pub subs: Substitution,
    /// Whether some generic field is still unbound.
    pub generic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Unknown,
    Erroneous,
    Any,
    Void,
    Nothing,
    Bool,
    Int,
    Uint,
    Real,
    String,
    Bytes,
    Locale,
    Range { idx: TypeId },
    Domain(DomainKind),
    Array { domain: TypeId, elt: TypeId },
    Tuple(Box<[TypeId]>),
    Aggregate(AggregateType),
}

impl TypeData {
    /// Primitives in [`TypeId`] constant order.
    pub(crate) const PRIMITIVES: [TypeData; 12] = [
        TypeData::Unknown,
        TypeData::Erroneous,
        TypeData::Any,
        TypeData::Void,
        TypeData::Nothing,
        TypeData::Bool,
        TypeData::Int,
        TypeData::Uint,
        TypeData::Real,
        TypeData::String,
        TypeData::Bytes,
        TypeData::Locale,
    ];

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeData::Int | TypeData::Uint | TypeData::Real)
    }
}
