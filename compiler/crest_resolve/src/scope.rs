//! Scopes: the declarations a scope-introducing node makes visible.

use std::collections::BTreeMap;

use crest_ir::{Ast, Name, NodeId, NodeKind, UseKind};
use smallvec::SmallVec;

use crate::error::InternalError;

/// A `use` or `import` statement inside a scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UseDirective {
    pub node: NodeId,
    pub target: Name,
    pub kind: UseKind,
}

/// Declarations introduced directly by one module, function, aggregate,
/// block or loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub node: NodeId,
    /// Nearest enclosing scope.
    pub parent: Option<NodeId>,
    entries: BTreeMap<Name, SmallVec<[NodeId; 2]>>,
    uses: Vec<UseDirective>,
    /// Statements in order, for scopes whose declarations run in sequence.
    statements: Vec<NodeId>,
    functions: SmallVec<[NodeId; 4]>,
}

impl Scope {
    /// Declarations of `name` in this scope, in source order.
    pub fn get(&self, name: Name) -> &[NodeId] {
        self.entries.get(&name).map_or(&[], |d| d.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.entries.keys().copied()
    }

    pub fn uses(&self) -> &[UseDirective] {
        &self.uses
    }

    /// Position of a direct statement, for blocks and modules.
    pub fn position(&self, stmt: NodeId) -> Option<usize> {
        self.statements.iter().position(|&s| s == stmt)
    }

    /// Whether declarations here are visible only after they appear.
    pub fn is_sequential(&self) -> bool {
        !self.statements.is_empty()
    }

    /// Names declared more than once where at least one declaration is not
    /// a function.
    pub fn conflicts(&self) -> impl Iterator<Item = (Name, &[NodeId])> + '_ {
        self.entries
            .iter()
            .filter(|(_, decls)| decls.len() > 1 && decls.len() != self.functions_among(decls))
            .map(|(&name, decls)| (name, decls.as_slice()))
    }

    fn functions_among(&self, decls: &[NodeId]) -> usize {
        decls.iter().filter(|d| self.functions.contains(d)).count()
    }

    fn declare(&mut self, ast: &Ast, node: NodeId) {
        match ast.kind(node) {
            Some(NodeKind::Use { target, kind }) => self.uses.push(UseDirective {
                node,
                target: *target,
                kind: *kind,
            }),
            Some(kind) => {
                if let Some(name) = kind.declared_name() {
                    self.entries.entry(name).or_default().push(node);
                    if kind.is_function() {
                        self.functions.push(node);
                    }
                }
            }
            None => {}
        }
    }
}

/// Nearest strict ancestor of `node` that introduces a scope.
pub(crate) fn enclosing_scope(ast: &Ast, node: NodeId) -> Option<NodeId> {
    ast.ancestors(node)
        .find(|&a| ast.kind(a).is_some_and(NodeKind::is_scope))
}

pub(crate) fn build_scope(ast: &Ast, node: NodeId) -> Result<Scope, InternalError> {
    let kind = ast.kind(node).ok_or(InternalError::UnknownNode { node })?;
    let mut scope = Scope {
        node,
        parent: enclosing_scope(ast, node),
        entries: BTreeMap::new(),
        uses: Vec::new(),
        statements: Vec::new(),
        functions: SmallVec::new(),
    };
    match kind {
        NodeKind::Module { body, .. } | NodeKind::Block(body) => {
            scope.statements.clone_from(body);
            for &stmt in body {
                scope.declare(ast, stmt);
            }
        }
        NodeKind::Aggregate(decl) => {
            for &member in &decl.members {
                scope.declare(ast, member);
            }
        }
        NodeKind::Function(decl) => {
            for &formal in &decl.formals {
                scope.declare(ast, formal);
                if let Some(NodeKind::Formal(f)) = ast.kind(formal) {
                    for query in f.type_expr.into_iter().flat_map(|t| type_queries(ast, t)) {
                        scope.declare(ast, query);
                    }
                }
            }
        }
        NodeKind::Loop(stmt) => {
            if let Some(index) = stmt.index {
                scope.declare(ast, index);
            }
        }
        _ => {
            return Err(InternalError::NotADeclaration {
                node,
                expected: "scope",
            })
        }
    }
    Ok(scope)
}

/// `?t` nodes inside a type expression, in source order.
pub(crate) fn type_queries(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(kind) = ast.kind(id) else { continue };
        if matches!(kind, NodeKind::TypeQuery(_)) {
            found.push(id);
        }
        let mut children = kind.children();
        children.reverse();
        stack.extend(children);
    }
    found
}

#[cfg(test)]
mod tests;
