//! Result tables: one per resolved module statement or function body.

use std::collections::BTreeMap;

use crest_ir::NodeId;
use crest_types::{QualifiedType, SignatureId};
use smallvec::SmallVec;

use crate::error::{InternalError, ResolutionError, ResolutionErrorKind};
use crate::lookup::Target;

/// Where a formal got its value at a call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActualSource {
    /// Actual nodes; more than one only for a variadic formal.
    Actuals(Vec<NodeId>),
    /// The method receiver, written or implicit `this`.
    Receiver,
    /// The formal's default value.
    Default,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormalActual {
    /// Index into the chosen signature's formals.
    pub formal: usize,
    pub source: ActualSource,
    /// Whether passing needed an implicit conversion.
    pub converts: bool,
}

/// The candidate a call resolved to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedCall {
    /// Concrete signature that was chosen.
    pub signature: SignatureId,
    /// Generic signature it was instantiated from, if any.
    pub instantiated_from: Option<SignatureId>,
    pub formal_actuals: Vec<FormalActual>,
    pub return_type: QualifiedType,
}

/// Everything known about one node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedExpr {
    pub qt: QualifiedType,
    /// Declarations an identifier or member access referred to.
    pub targets: SmallVec<[Target; 1]>,
    pub call: Option<ResolvedCall>,
    /// Set when this node itself failed. Nodes that only inherit an operand's
    /// failure carry an erroneous type and no failure of their own.
    pub failure: Option<ResolutionErrorKind>,
}

impl ResolvedExpr {
    pub fn of(qt: QualifiedType) -> Self {
        ResolvedExpr {
            qt,
            targets: SmallVec::new(),
            call: None,
            failure: None,
        }
    }

    /// Statements and declarations without a value of their own.
    pub(crate) fn statement() -> Self {
        Self::of(QualifiedType::value(crest_types::TypeId::VOID))
    }

    /// Erroneous because an operand was.
    pub(crate) fn erroneous() -> Self {
        Self::of(QualifiedType::erroneous())
    }

    pub(crate) fn failed(kind: ResolutionErrorKind) -> Self {
        ResolvedExpr {
            failure: Some(kind),
            ..Self::erroneous()
        }
    }

    #[must_use]
    pub(crate) fn with_targets(mut self, targets: impl IntoIterator<Item = Target>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    #[must_use]
    pub(crate) fn with_call(mut self, call: ResolvedCall) -> Self {
        self.call = Some(call);
        self
    }
}

/// Per-node results of one resolution, plus the errors it found.
///
/// Each node is written at most once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionResult {
    owner: NodeId,
    nodes: BTreeMap<NodeId, ResolvedExpr>,
    errors: Vec<ResolutionError>,
    inferred_return: Option<QualifiedType>,
    /// Instantiated bodies only: how many nested instantiated bodies this
    /// one needs, itself included.
    chain_height: usize,
}

impl ResolutionResult {
    pub fn new(owner: NodeId) -> Self {
        ResolutionResult {
            owner,
            nodes: BTreeMap::new(),
            errors: Vec::new(),
            inferred_return: None,
            chain_height: 0,
        }
    }

    /// The module statement, function or module this table belongs to.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn get(&self, node: NodeId) -> Option<&ResolvedExpr> {
        self.nodes.get(&node)
    }

    pub fn qt(&self, node: NodeId) -> Option<QualifiedType> {
        self.get(node).map(|r| r.qt)
    }

    pub fn require(&self, node: NodeId) -> Result<&ResolvedExpr, InternalError> {
        self.get(node).ok_or(InternalError::MissingResult { node })
    }

    /// Entries in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ResolvedExpr)> {
        self.nodes.iter().map(|(id, r)| (*id, r))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn errors(&self) -> &[ResolutionError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Return type inferred from `return` statements, for function bodies.
    pub fn inferred_return(&self) -> Option<QualifiedType> {
        self.inferred_return
    }

    pub(crate) fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub(crate) fn record(&mut self, node: NodeId, expr: ResolvedExpr) -> Result<(), InternalError> {
        match self.nodes.entry(node) {
            std::collections::btree_map::Entry::Occupied(_) => {
                Err(InternalError::ResultWrittenTwice { node })
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(expr);
                Ok(())
            }
        }
    }

    pub(crate) fn push_error(&mut self, error: ResolutionError) {
        self.errors.push(error);
    }

    pub(crate) fn set_inferred_return(&mut self, qt: QualifiedType) {
        self.inferred_return = Some(qt);
    }

    pub(crate) fn chain_height(&self) -> usize {
        self.chain_height
    }

    pub(crate) fn set_chain_height(&mut self, height: usize) {
        self.chain_height = height;
    }

    /// Fold in the table of another statement of the same module.
    pub(crate) fn absorb(&mut self, other: &ResolutionResult) -> Result<(), InternalError> {
        for (node, expr) in other.iter() {
            self.record(node, expr.clone())?;
        }
        self.errors.extend(other.errors.iter().cloned());
        Ok(())
    }
}
