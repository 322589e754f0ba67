//! Closed, immutable syntax tree.
//!
//! Every node lives in a per-file arena and is addressed by [`NodeId`]. Node
//! indices are assigned in creation order and children are always created
//! before their parent, so a child's index is smaller than its parent's.
//! Parents are derived once when the tree is finished.

use crate::ids::{FileId, NodeId};
use crate::syntax::{
    AggregateKind, FunctionKind, Intent, LoopKind, OpKind, ReturnIntent, UseKind, VarKind,
};
use crate::{Name, Span};

/// One actual argument of a call, optionally named.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Actual {
    pub name: Option<Name>,
    pub value: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionDecl {
    pub name: Name,
    pub kind: FunctionKind,
    /// `Formal` nodes, in declaration order.
    pub formals: Vec<NodeId>,
    pub return_intent: ReturnIntent,
    pub return_type: Option<NodeId>,
    pub where_clause: Option<NodeId>,
    /// A `Block`, absent for bodiless declarations.
    pub body: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormalDecl {
    pub name: Name,
    pub intent: Intent,
    pub type_expr: Option<NodeId>,
    pub default: Option<NodeId>,
    pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableDecl {
    pub name: Name,
    pub kind: VarKind,
    pub type_expr: Option<NodeId>,
    pub init: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregateDecl {
    pub name: Name,
    pub kind: AggregateKind,
    /// Field `Variable`s and method `Function`s.
    pub members: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoopStmt {
    pub kind: LoopKind,
    /// Index `Variable`, if the loop binds one.
    pub index: Option<NodeId>,
    pub iterand: NodeId,
    /// A `Block`.
    pub body: NodeId,
}

/// Node payload, one variant per syntactic form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module { name: Name, body: Vec<NodeId> },
    Function(FunctionDecl),
    Formal(FormalDecl),
    Variable(VariableDecl),
    Aggregate(AggregateDecl),
    Use { target: Name, kind: UseKind },
    Block(Vec<NodeId>),

    Identifier(Name),
    /// `?t` inside a formal's type expression.
    TypeQuery(Name),
    Dot { receiver: NodeId, member: Name },
    Call { callee: NodeId, actuals: Vec<Actual> },
    Index { base: NodeId, indices: Vec<NodeId> },
    Op { op: OpKind, operands: Vec<NodeId> },
    IntLiteral(i64),
    UintLiteral(u64),
    /// IEEE-754 bits, so the node stays `Eq + Hash`.
    RealLiteral(u64),
    BoolLiteral(bool),
    StringLiteral(Name),
    Tuple(Vec<NodeId>),
    /// Elements in row-major order; `rank` is the literal's dimensionality.
    ArrayLiteral { elements: Vec<NodeId>, rank: u32 },
    Range { low: Option<NodeId>, high: Option<NodeId> },
    /// `[D] T`, `[] T` or `[]`.
    ArrayType { domain: Option<NodeId>, element: Option<NodeId> },
    /// `domain(rank)` or `domain(idxType[, parSafe])`; `domain` alone is generic.
    DomainType { args: Vec<NodeId> },

    Return(Option<NodeId>),
    If { cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId> },
    While { cond: NodeId, body: NodeId },
    Loop(LoopStmt),
    Begin(NodeId),
    Cobegin(Vec<NodeId>),
    On { locale: NodeId, body: NodeId },
}

impl NodeKind {
    /// Visit direct children in source order.
    pub fn for_each_child(&self, mut f: impl FnMut(NodeId)) {
        match self {
            NodeKind::Module { body: ids, .. }
            | NodeKind::Block(ids)
            | NodeKind::Tuple(ids)
            | NodeKind::Cobegin(ids)
            | NodeKind::DomainType { args: ids }
            | NodeKind::Op { operands: ids, .. }
            | NodeKind::ArrayLiteral { elements: ids, .. } => ids.iter().copied().for_each(f),
            NodeKind::Function(decl) => {
                decl.formals.iter().copied().for_each(&mut f);
                decl.return_type.into_iter().for_each(&mut f);
                decl.where_clause.into_iter().for_each(&mut f);
                decl.body.into_iter().for_each(f);
            }
            NodeKind::Formal(decl) => {
                decl.type_expr.into_iter().for_each(&mut f);
                decl.default.into_iter().for_each(f);
            }
            NodeKind::Variable(decl) => {
                decl.type_expr.into_iter().for_each(&mut f);
                decl.init.into_iter().for_each(f);
            }
            NodeKind::Aggregate(decl) => decl.members.iter().copied().for_each(f),
            NodeKind::Dot { receiver, .. } => f(*receiver),
            NodeKind::Call { callee, actuals } => {
                f(*callee);
                actuals.iter().for_each(|a| f(a.value));
            }
            NodeKind::Index { base, indices } => {
                f(*base);
                indices.iter().copied().for_each(f);
            }
            NodeKind::Range { low, high } => {
                low.iter().copied().for_each(&mut f);
                high.iter().copied().for_each(f);
            }
            NodeKind::ArrayType { domain, element } => {
                domain.iter().copied().for_each(&mut f);
                element.iter().copied().for_each(f);
            }
            NodeKind::Return(value) => value.iter().copied().for_each(f),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                f(*cond);
                f(*then_branch);
                else_branch.iter().copied().for_each(f);
            }
            NodeKind::While { cond, body } => {
                f(*cond);
                f(*body);
            }
            NodeKind::Loop(stmt) => {
                stmt.index.into_iter().for_each(&mut f);
                f(stmt.iterand);
                f(stmt.body);
            }
            NodeKind::Begin(body) => f(*body),
            NodeKind::On { locale, body } => {
                f(*locale);
                f(*body);
            }
            NodeKind::Use { .. }
            | NodeKind::Identifier(_)
            | NodeKind::TypeQuery(_)
            | NodeKind::IntLiteral(_)
            | NodeKind::UintLiteral(_)
            | NodeKind::RealLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::StringLiteral(_) => {}
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.for_each_child(|c| out.push(c));
        out
    }

    /// Whether the node introduces a scope.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::Module { .. }
                | NodeKind::Function(_)
                | NodeKind::Aggregate(_)
                | NodeKind::Block(_)
                | NodeKind::Loop(_)
        )
    }

    /// Name introduced by a declaration node.
    pub fn declared_name(&self) -> Option<Name> {
        match self {
            NodeKind::Module { name, .. } | NodeKind::TypeQuery(name) => Some(*name),
            NodeKind::Function(decl) => Some(decl.name),
            NodeKind::Formal(decl) => Some(decl.name),
            NodeKind::Variable(decl) => Some(decl.name),
            NodeKind::Aggregate(decl) => Some(decl.name),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, NodeKind::Function(_))
    }

    /// Short label used in logs and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "module",
            NodeKind::Function(_) => "function",
            NodeKind::Formal(_) => "formal",
            NodeKind::Variable(_) => "variable",
            NodeKind::Aggregate(decl) => decl.kind.as_str(),
            NodeKind::Use { .. } => "use",
            NodeKind::Block(_) => "block",
            NodeKind::Identifier(_) => "identifier",
            NodeKind::TypeQuery(_) => "type query",
            NodeKind::Dot { .. } => "member access",
            NodeKind::Call { .. } => "call",
            NodeKind::Index { .. } => "index",
            NodeKind::Op { .. } => "operator",
            NodeKind::IntLiteral(_)
            | NodeKind::UintLiteral(_)
            | NodeKind::RealLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::StringLiteral(_) => "literal",
            NodeKind::Tuple(_) => "tuple",
            NodeKind::ArrayLiteral { .. } => "array literal",
            NodeKind::Range { .. } => "range",
            NodeKind::ArrayType { .. } => "array type",
            NodeKind::DomainType { .. } => "domain type",
            NodeKind::Return(_) => "return",
            NodeKind::If { .. } => "if",
            NodeKind::While { .. } => "while",
            NodeKind::Loop(_) => "loop",
            NodeKind::Begin(_) => "begin",
            NodeKind::Cobegin(_) => "cobegin",
            NodeKind::On { .. } => "on",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AstNode {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

/// Finished tree of one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ast {
    file: FileId,
    nodes: Vec<AstNode>,
    parents: Vec<Option<NodeId>>,
    roots: Vec<NodeId>,
}

impl Ast {
    /// Assemble a tree from nodes indexed by their id, deriving parents.
    pub fn new(file: FileId, nodes: Vec<AstNode>, roots: Vec<NodeId>) -> Self {
        let mut parents = vec![None; nodes.len()];
        for node in &nodes {
            node.kind.for_each_child(|child| {
                if let Some(slot) = parents.get_mut(child.slot()) {
                    *slot = Some(node.id);
                }
            });
        }
        Ast {
            file,
            nodes,
            parents,
            roots,
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        if id.file != self.file {
            return None;
        }
        self.nodes.get(id.slot())
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).map_or(Span::DUMMY, |n| n.span)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if id.file != self.file {
            return None;
        }
        self.parents.get(id.slot()).copied().flatten()
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Top-level nodes (normally modules).
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn nodes(&self) -> impl Iterator<Item = &AstNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every declaration of `name`, in postorder.
    pub fn declarations_named(&self, name: Name) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |n| n.kind.declared_name() == Some(name))
            .map(|n| n.id)
    }

    /// Whether `ancestor` encloses `id` (or is `id`).
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }
}
