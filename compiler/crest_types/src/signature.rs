//! Function signatures and their interner.

use std::sync::Arc;

use crest_ir::{Intent, Name, NodeId, ReturnIntent};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{QualKind, QualifiedType, SignatureId, Substitution, TypePool};

/// One formal of a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SigFormal {
    /// The `Formal` node, the field `Variable` of a default initializer, or
    /// the function itself for an implicit `this`.
    pub decl: NodeId,
    pub name: Name,
    pub intent: Intent,
    pub qt: QualifiedType,
    pub has_default: bool,
    pub variadic: bool,
}

impl SigFormal {
    /// Whether the formal still needs a binding before the signature is
    /// concrete.
    pub fn is_generic(&self, types: &TypePool) -> bool {
        (self.qt.kind == QualKind::Param && self.qt.param.is_none())
            || types.is_generic(self.qt.ty)
    }
}

/// State of a where clause.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WhereClause {
    None,
    Evaluated(bool),
    /// Depends on generic formals; evaluated after instantiation.
    Pending,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SignatureKind {
    /// A user-written function, method or initializer.
    Function,
    /// Compiler-generated initializer of an aggregate (`decl` is the
    /// aggregate; formals are its fields).
    DefaultInit,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub decl: NodeId,
    pub name: Name,
    pub kind: SignatureKind,
    pub formals: Vec<SigFormal>,
    pub return_intent: ReturnIntent,
    pub is_method: bool,
    pub where_clause: WhereClause,
    /// Bindings this signature was instantiated with; empty for generics.
    pub substitution: Substitution,
    pub instantiated_from: Option<SignatureId>,
}

impl Signature {
    /// Generic when any formal is unbound or the where clause still waits
    /// for instantiation.
    pub fn is_generic(&self, types: &TypePool) -> bool {
        self.where_clause == WhereClause::Pending
            || self.formals.iter().any(|f| f.is_generic(types))
    }

    pub fn formal_named(&self, name: Name) -> Option<usize> {
        self.formals.iter().position(|f| f.name == name)
    }

    /// Formals a caller supplies, skipping an implicit `this`.
    pub fn explicit_formals(&self) -> &[SigFormal] {
        if self.is_method {
            self.formals.get(1..).unwrap_or(&[])
        } else {
            &self.formals
        }
    }

    /// False only when the where clause was evaluated to `false`.
    pub fn where_satisfied(&self) -> bool {
        self.where_clause != WhereClause::Evaluated(false)
    }
}

#[derive(Default)]
struct SignatureTable {
    map: FxHashMap<Arc<Signature>, SignatureId>,
    sigs: Vec<Arc<Signature>>,
}

/// Interns signatures: identical content means identical [`SignatureId`].
#[derive(Default)]
pub struct SignaturePool {
    table: RwLock<SignatureTable>,
}

impl SignaturePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, sig: Signature) -> SignatureId {
        if let Some(&id) = self.table.read().map.get(&sig) {
            return id;
        }
        let mut table = self.table.write();
        if let Some(&id) = table.map.get(&sig) {
            return id;
        }
        let id = SignatureId::from_raw(u32::try_from(table.sigs.len()).unwrap_or(u32::MAX));
        let sig = Arc::new(sig);
        table.sigs.push(Arc::clone(&sig));
        table.map.insert(sig, id);
        id
    }

    pub fn get(&self, id: SignatureId) -> Option<Arc<Signature>> {
        self.table.read().sigs.get(id.raw() as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().sigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SignaturePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePool")
            .field("len", &self.len())
            .finish()
    }
}
