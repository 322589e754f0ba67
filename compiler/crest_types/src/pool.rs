//! Type interner.
//!
//! Structurally identical [`TypeData`] always interns to the same
//! [`TypeId`], so downstream type identity is an integer comparison.
//! Reads take the read lock; a miss upgrades to the write lock and checks
//! again before inserting.

use crest_ir::{AggregateKind, Name, NodeId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::data::{AggregateType, DomainKind, TypeData};
use crate::{Substitution, TypeFlags, TypeId};

struct PoolTable {
    map: FxHashMap<TypeData, TypeId>,
    types: Vec<TypeData>,
    flags: Vec<TypeFlags>,
}

impl PoolTable {
    fn with_primitives() -> Self {
        let mut table = PoolTable {
            map: FxHashMap::default(),
            types: Vec::with_capacity(64),
            flags: Vec::with_capacity(64),
        };
        for data in TypeData::PRIMITIVES {
            table.insert(data);
        }
        table
    }

    fn flags_of(&self, id: TypeId) -> TypeFlags {
        self.flags.get(id.index()).copied().unwrap_or_default()
    }

    fn compute_flags(&self, data: &TypeData) -> TypeFlags {
        match data {
            TypeData::Unknown => TypeFlags::empty(),
            TypeData::Erroneous => TypeFlags::HAS_ERROR,
            TypeData::Any => TypeFlags::IS_GENERIC,
            TypeData::Int | TypeData::Uint | TypeData::Real => {
                TypeFlags::IS_PRIMITIVE | TypeFlags::IS_NUMERIC
            }
            TypeData::Void
            | TypeData::Nothing
            | TypeData::Bool
            | TypeData::String
            | TypeData::Bytes
            | TypeData::Locale => TypeFlags::IS_PRIMITIVE,
            TypeData::Range { idx } => TypeFlags::IS_RANGE | self.flags_of(*idx).propagated(),
            TypeData::Domain(kind) => {
                TypeFlags::IS_DOMAIN
                    | match kind {
                        DomainKind::Rectangular { idx, .. } | DomainKind::Associative { idx, .. } => {
                            self.flags_of(*idx).propagated()
                        }
                        DomainKind::Generic => TypeFlags::IS_GENERIC,
                    }
            }
            TypeData::Array { domain, elt } => {
                TypeFlags::IS_ARRAY
                    | self.flags_of(*domain).propagated()
                    | self.flags_of(*elt).propagated()
            }
            TypeData::Tuple(elems) => elems
                .iter()
                .fold(TypeFlags::IS_TUPLE, |acc, e| acc | self.flags_of(*e).propagated()),
            TypeData::Aggregate(agg) => {
                let mut flags = TypeFlags::IS_AGGREGATE;
                if agg.generic {
                    flags |= TypeFlags::IS_GENERIC;
                }
                flags
            }
        }
    }

    fn insert(&mut self, data: TypeData) -> TypeId {
        // Types are bounded by program size, far below u32::MAX.
        let id = TypeId::from_raw(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        let flags = self.compute_flags(&data);
        self.map.insert(data.clone(), id);
        self.types.push(data);
        self.flags.push(flags);
        id
    }
}

/// Thread-safe structural type interner.
pub struct TypePool {
    table: RwLock<PoolTable>,
}

impl TypePool {
    pub fn new() -> Self {
        TypePool {
            table: RwLock::new(PoolTable::with_primitives()),
        }
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(&id) = self.table.read().map.get(&data) {
            return id;
        }
        let mut table = self.table.write();
        if let Some(&id) = table.map.get(&data) {
            return id;
        }
        let id = table.insert(data);
        tracing::trace!(?id, "interned type");
        id
    }

    /// Structure of `id`. Unknown ids read as [`TypeData::Unknown`].
    pub fn get(&self, id: TypeId) -> TypeData {
        self.table
            .read()
            .types
            .get(id.index())
            .cloned()
            .unwrap_or(TypeData::Unknown)
    }

    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.table.read().flags_of(id)
    }

    #[inline]
    pub fn is_generic(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::IS_GENERIC)
    }

    #[inline]
    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::IS_NUMERIC)
    }

    pub fn len(&self) -> usize {
        self.table.read().types.len()
    }

    /// Always false: primitives are present from construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Constructors

    pub fn range(&self, idx: TypeId) -> TypeId {
        self.intern(TypeData::Range { idx })
    }

    pub fn rectangular_domain(&self, rank: u32, idx: TypeId) -> TypeId {
        self.intern(TypeData::Domain(DomainKind::Rectangular { rank, idx }))
    }

    pub fn associative_domain(&self, idx: TypeId, par_safe: bool) -> TypeId {
        self.intern(TypeData::Domain(DomainKind::Associative { idx, par_safe }))
    }

    pub fn generic_domain(&self) -> TypeId {
        self.intern(TypeData::Domain(DomainKind::Generic))
    }

    pub fn array(&self, domain: TypeId, elt: TypeId) -> TypeId {
        self.intern(TypeData::Array { domain, elt })
    }

    pub fn tuple(&self, elems: Vec<TypeId>) -> TypeId {
        self.intern(TypeData::Tuple(elems.into_boxed_slice()))
    }

    pub fn aggregate(
        &self,
        decl: NodeId,
        name: Name,
        kind: AggregateKind,
        subs: Substitution,
        generic: bool,
    ) -> TypeId {
        self.intern(TypeData::Aggregate(AggregateType {
            decl,
            name,
            kind,
            subs,
            generic,
        }))
    }

    // Accessors

    /// `(domain, element)` of an array type.
    pub fn array_parts(&self, id: TypeId) -> Option<(TypeId, TypeId)> {
        match self.get(id) {
            TypeData::Array { domain, elt } => Some((domain, elt)),
            _ => None,
        }
    }

    pub fn domain_kind(&self, id: TypeId) -> Option<DomainKind> {
        match self.get(id) {
            TypeData::Domain(kind) => Some(kind),
            _ => None,
        }
    }

    /// Index type of a range, domain or array.
    pub fn index_type(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            TypeData::Range { idx }
            | TypeData::Domain(
                DomainKind::Rectangular { idx, .. } | DomainKind::Associative { idx, .. },
            ) => Some(idx),
            TypeData::Array { domain, .. } => self.index_type(domain),
            _ => None,
        }
    }

    /// Rank of a rectangular domain or of an array over one.
    pub fn rank(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            TypeData::Domain(DomainKind::Rectangular { rank, .. }) => Some(rank),
            TypeData::Domain(DomainKind::Associative { .. }) => Some(1),
            TypeData::Array { domain, .. } => self.rank(domain),
            _ => None,
        }
    }

    pub fn aggregate_type(&self, id: TypeId) -> Option<AggregateType> {
        match self.get(id) {
            TypeData::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    /// The generic aggregate an instantiated aggregate came from: the same
    /// declaration with an empty substitution.
    pub fn instantiated_from(&self, id: TypeId) -> Option<TypeId> {
        let agg = self.aggregate_type(id)?;
        if agg.subs.is_empty() {
            return None;
        }
        Some(self.aggregate(agg.decl, agg.name, agg.kind, Substitution::empty(), true))
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypePool").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests;
