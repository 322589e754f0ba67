//! Programmatic tree construction.
//!
//! The resolver consumes finished trees; this builder is how hosts and tests
//! produce them without a parser. Nodes receive indices in creation order and
//! synthetic spans that grow with that order, so diagnostics stay ordered.

use crate::ast::{
    Actual, AggregateDecl, Ast, AstNode, FormalDecl, FunctionDecl, LoopStmt, NodeKind,
    VariableDecl,
};
use crate::ids::{FileId, NodeId};
use crate::syntax::{
    AggregateKind, FunctionKind, Intent, LoopKind, OpKind, ReturnIntent, UseKind, VarKind,
};
use crate::{Name, Span, StringInterner};

/// Everything about a function besides its name.
#[derive(Clone, Debug, Default)]
pub struct FnSpec {
    kind: FunctionKind,
    formals: Vec<NodeId>,
    return_intent: ReturnIntent,
    return_type: Option<NodeId>,
    where_clause: Option<NodeId>,
    body: Option<Vec<NodeId>>,
}

impl FnSpec {
    pub fn new(formals: Vec<NodeId>) -> Self {
        FnSpec {
            formals,
            ..FnSpec::default()
        }
    }

    #[must_use]
    pub fn returns(mut self, ty: NodeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    #[must_use]
    pub fn return_intent(mut self, intent: ReturnIntent) -> Self {
        self.return_intent = intent;
        self
    }

    #[must_use]
    pub fn where_(mut self, cond: NodeId) -> Self {
        self.where_clause = Some(cond);
        self
    }

    #[must_use]
    pub fn body(mut self, stmts: Vec<NodeId>) -> Self {
        self.body = Some(stmts);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Builds one file's tree.
pub struct AstBuilder<'a> {
    file: FileId,
    interner: &'a StringInterner,
    nodes: Vec<AstNode>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(file: FileId, interner: &'a StringInterner) -> Self {
        AstBuilder {
            file,
            interner,
            nodes: Vec::new(),
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Append a node. Children referenced by `kind` must already exist.
    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        let id = NodeId::new(self.file, index);
        let mut span = Span::new(index.saturating_mul(4), index.saturating_mul(4) + 3);
        kind.for_each_child(|child| {
            if let Some(c) = self.nodes.get(child.index as usize) {
                span = span.merge(c.span);
            }
        });
        self.nodes.push(AstNode { id, span, kind });
        id
    }

    pub fn finish(self, roots: Vec<NodeId>) -> Ast {
        Ast::new(self.file, self.nodes, roots)
    }

    // Declarations

    pub fn module(&mut self, name: &str, body: Vec<NodeId>) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Module { name, body })
    }

    pub fn function(&mut self, name: &str, spec: FnSpec) -> NodeId {
        let name = self.name(name);
        let body = spec.body.map(|stmts| self.push(NodeKind::Block(stmts)));
        self.push(NodeKind::Function(FunctionDecl {
            name,
            kind: spec.kind,
            formals: spec.formals,
            return_intent: spec.return_intent,
            return_type: spec.return_type,
            where_clause: spec.where_clause,
            body,
        }))
    }

    pub fn formal(&mut self, name: &str, intent: Intent, type_expr: Option<NodeId>) -> NodeId {
        self.formal_full(name, intent, type_expr, None, false)
    }

    pub fn formal_with_default(
        &mut self,
        name: &str,
        intent: Intent,
        type_expr: Option<NodeId>,
        default: NodeId,
    ) -> NodeId {
        self.formal_full(name, intent, type_expr, Some(default), false)
    }

    pub fn variadic_formal(
        &mut self,
        name: &str,
        intent: Intent,
        type_expr: Option<NodeId>,
    ) -> NodeId {
        self.formal_full(name, intent, type_expr, None, true)
    }

    fn formal_full(
        &mut self,
        name: &str,
        intent: Intent,
        type_expr: Option<NodeId>,
        default: Option<NodeId>,
        variadic: bool,
    ) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Formal(FormalDecl {
            name,
            intent,
            type_expr,
            default,
            variadic,
        }))
    }

    pub fn var_decl(
        &mut self,
        kind: VarKind,
        name: &str,
        type_expr: Option<NodeId>,
        init: Option<NodeId>,
    ) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Variable(VariableDecl {
            name,
            kind,
            type_expr,
            init,
        }))
    }

    /// `var name = init;`
    pub fn var(&mut self, name: &str, init: NodeId) -> NodeId {
        self.var_decl(VarKind::Var, name, None, Some(init))
    }

    pub fn aggregate(&mut self, kind: AggregateKind, name: &str, members: Vec<NodeId>) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Aggregate(AggregateDecl {
            name,
            kind,
            members,
        }))
    }

    pub fn record(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        self.aggregate(AggregateKind::Record, name, members)
    }

    pub fn use_(&mut self, module: &str) -> NodeId {
        let target = self.name(module);
        self.push(NodeKind::Use {
            target,
            kind: UseKind::Use,
        })
    }

    pub fn import(&mut self, module: &str) -> NodeId {
        let target = self.name(module);
        self.push(NodeKind::Use {
            target,
            kind: UseKind::Import,
        })
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Block(stmts))
    }

    // Expressions

    pub fn ident(&mut self, name: &str) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::Identifier(name))
    }

    pub fn type_query(&mut self, name: &str) -> NodeId {
        let name = self.name(name);
        self.push(NodeKind::TypeQuery(name))
    }

    pub fn dot(&mut self, receiver: NodeId, member: &str) -> NodeId {
        let member = self.name(member);
        self.push(NodeKind::Dot { receiver, member })
    }

    pub fn call(&mut self, callee: NodeId, actuals: Vec<NodeId>) -> NodeId {
        let actuals = actuals
            .into_iter()
            .map(|value| Actual { name: None, value })
            .collect();
        self.push(NodeKind::Call { callee, actuals })
    }

    pub fn call_named(&mut self, callee: NodeId, actuals: Vec<(Option<&str>, NodeId)>) -> NodeId {
        let actuals = actuals
            .into_iter()
            .map(|(name, value)| Actual {
                name: name.map(|n| self.name(n)),
                value,
            })
            .collect();
        self.push(NodeKind::Call { callee, actuals })
    }

    /// `name(actuals...)`, creating the callee identifier after the actuals.
    pub fn call_ident(&mut self, name: &str, actuals: Vec<NodeId>) -> NodeId {
        let callee = self.ident(name);
        self.call(callee, actuals)
    }

    pub fn index(&mut self, base: NodeId, indices: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Index { base, indices })
    }

    pub fn op(&mut self, op: OpKind, operands: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Op { op, operands })
    }

    pub fn binary(&mut self, op: OpKind, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.op(op, vec![lhs, rhs])
    }

    pub fn unary(&mut self, op: OpKind, operand: NodeId) -> NodeId {
        self.op(op, vec![operand])
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.push(NodeKind::IntLiteral(value))
    }

    pub fn uint(&mut self, value: u64) -> NodeId {
        self.push(NodeKind::UintLiteral(value))
    }

    pub fn real(&mut self, value: f64) -> NodeId {
        self.push(NodeKind::RealLiteral(value.to_bits()))
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.push(NodeKind::BoolLiteral(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        let value = self.name(value);
        self.push(NodeKind::StringLiteral(value))
    }

    pub fn tuple(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Tuple(elements))
    }

    pub fn array_literal(&mut self, elements: Vec<NodeId>, rank: u32) -> NodeId {
        self.push(NodeKind::ArrayLiteral { elements, rank })
    }

    pub fn range(&mut self, low: Option<NodeId>, high: Option<NodeId>) -> NodeId {
        self.push(NodeKind::Range { low, high })
    }

    pub fn array_type(&mut self, domain: Option<NodeId>, element: Option<NodeId>) -> NodeId {
        self.push(NodeKind::ArrayType { domain, element })
    }

    pub fn domain_type(&mut self, args: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::DomainType { args })
    }

    // Statements

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.push(NodeKind::Return(value))
    }

    pub fn if_(
        &mut self,
        cond: NodeId,
        then_branch: Vec<NodeId>,
        else_branch: Option<Vec<NodeId>>,
    ) -> NodeId {
        let then_branch = self.block(then_branch);
        let else_branch = else_branch.map(|stmts| self.block(stmts));
        self.push(NodeKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn while_(&mut self, cond: NodeId, body: Vec<NodeId>) -> NodeId {
        let body = self.block(body);
        self.push(NodeKind::While { cond, body })
    }

    /// A loop whose index variable (if any) is created here, after the
    /// iterand. `body` is built by the closure so it can refer to the index.
    pub fn loop_(
        &mut self,
        kind: LoopKind,
        index: Option<&str>,
        iterand: NodeId,
        body: impl FnOnce(&mut Self) -> Vec<NodeId>,
    ) -> NodeId {
        let index = index.map(|name| self.var_decl(VarKind::Var, name, None, None));
        let stmts = body(self);
        let body = self.block(stmts);
        self.push(NodeKind::Loop(LoopStmt {
            kind,
            index,
            iterand,
            body,
        }))
    }

    pub fn begin(&mut self, body: Vec<NodeId>) -> NodeId {
        let body = self.block(body);
        self.push(NodeKind::Begin(body))
    }

    pub fn cobegin(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Cobegin(stmts))
    }

    pub fn on(&mut self, locale: NodeId, body: Vec<NodeId>) -> NodeId {
        let body = self.block(body);
        self.push(NodeKind::On { locale, body })
    }
}
