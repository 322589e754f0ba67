//! Postorder resolution of one module statement, function body or
//! signature into a [`ResolutionResult`].
//!
//! Handlers resolve their children before themselves, so every operand is
//! in the table when its parent is computed. The exceptions are nested
//! functions and aggregates, which are resolved by their own queries, and
//! the untaken branch of a param `if`.

mod exprs;
mod names;
mod stmts;

use std::sync::Arc;

use crest_ir::{Ast, NodeId, NodeKind};
use crest_types::{ParamValue, QualifiedType, Substitution};

use crate::aggregate;
use crate::error::{InternalError, ResolutionError, ResolutionErrorKind};
use crate::result::{ResolutionResult, ResolvedExpr};
use crate::stack::ensure_sufficient_stack;
use crate::Context;

/// A failure to report on the node being resolved.
pub(crate) type Outcome<T> = Result<T, ResolutionErrorKind>;

pub(crate) struct Resolver<'c> {
    pub(crate) ctx: &'c Context,
    pub(crate) ast: Arc<Ast>,
    /// Declarations inside this subtree are resolved into this table.
    pub(crate) root: NodeId,
    /// Bindings of generic formals, fields and type queries.
    pub(crate) subs: Substitution,
    /// Receiver of the method being resolved.
    pub(crate) this_qt: Option<QualifiedType>,
    pub(crate) result: ResolutionResult,
    /// Failures are recorded on nodes but not reported.
    pub(crate) speculative: bool,
    /// `return` statements seen so far, in order.
    pub(crate) returns: Vec<(NodeId, QualifiedType)>,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(ctx: &'c Context, ast: Arc<Ast>, root: NodeId, subs: Substitution) -> Self {
        Resolver {
            ctx,
            ast,
            root,
            subs,
            this_qt: None,
            result: ResolutionResult::new(root),
            speculative: false,
            returns: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> ResolutionResult {
        self.result
    }

    /// Resolve `id` (once) and return its qualified type.
    pub(crate) fn resolve(&mut self, id: NodeId) -> Result<QualifiedType, InternalError> {
        if let Some(done) = self.result.qt(id) {
            return Ok(done);
        }
        let expr = ensure_sufficient_stack(|| self.resolve_node(id))?;
        let qt = expr.qt;
        self.record(id, expr)?;
        Ok(qt)
    }

    pub(crate) fn resolve_all(&mut self, ids: &[NodeId]) -> Result<Vec<QualifiedType>, InternalError> {
        ids.iter().map(|&id| self.resolve(id)).collect()
    }

    /// Record a result computed outside the postorder walk.
    pub(crate) fn record(&mut self, id: NodeId, expr: ResolvedExpr) -> Result<(), InternalError> {
        if let Some(kind) = &expr.failure {
            self.report(id, kind.clone());
        }
        self.result.record(id, expr)
    }

    pub(crate) fn seed(&mut self, id: NodeId, qt: QualifiedType) -> Result<(), InternalError> {
        self.record(id, ResolvedExpr::of(qt))
    }

    /// Report a failure attached to `id` without recording a result for it.
    pub(crate) fn report(&mut self, id: NodeId, kind: ResolutionErrorKind) {
        if self.speculative && !self.ctx.config().report_speculative_failures {
            tracing::trace!(node = %id, ?kind, "speculative failure");
            return;
        }
        let span = self.ast.span(id);
        self.result.push_error(ResolutionError::new(id, span, kind));
    }

    fn resolve_node(&mut self, id: NodeId) -> Result<ResolvedExpr, InternalError> {
        let ast = Arc::clone(&self.ast);
        let node = ast.get(id).ok_or(InternalError::UnknownNode { node: id })?;
        match &node.kind {
            NodeKind::Module { .. } => Ok(ResolvedExpr::of(QualifiedType::module())),
            NodeKind::Function(_) => Ok(ResolvedExpr::of(QualifiedType::function())),
            NodeKind::Aggregate(_) => {
                let ty = aggregate::declared_type(self.ctx, &ast, id)?;
                Ok(ResolvedExpr::of(QualifiedType::type_(ty)))
            }
            NodeKind::Use { target, .. } => self.resolve_use(id, *target),
            NodeKind::Formal(_) => {
                crate::signature::resolve_formal(self, id).map(ResolvedExpr::of)
            }
            NodeKind::Variable(decl) => self.resolve_variable(id, decl),
            NodeKind::Block(stmts) => {
                self.resolve_all(stmts)?;
                Ok(ResolvedExpr::statement())
            }

            NodeKind::Identifier(name) => self.resolve_identifier(id, *name),
            NodeKind::TypeQuery(_) => Ok(self.resolve_type_query(id)),
            NodeKind::Dot { receiver, member } => self.resolve_dot(id, *receiver, *member),
            NodeKind::Call { callee, actuals } => crate::call::resolve_call(self, id, *callee, actuals),
            NodeKind::Index { base, indices } => self.resolve_index(*base, indices),
            NodeKind::Op { op, operands } => self.resolve_op(*op, operands),
            NodeKind::IntLiteral(v) => Ok(param(ParamValue::Int(*v))),
            NodeKind::UintLiteral(v) => Ok(param(ParamValue::Uint(*v))),
            NodeKind::RealLiteral(bits) => Ok(param(ParamValue::Real(*bits))),
            NodeKind::BoolLiteral(b) => Ok(param(ParamValue::Bool(*b))),
            NodeKind::StringLiteral(s) => Ok(param(ParamValue::Str(*s))),
            NodeKind::Tuple(elements) => self.resolve_tuple(elements),
            NodeKind::ArrayLiteral { elements, rank } => {
                self.resolve_array_literal(elements, *rank)
            }
            NodeKind::Range { low, high } => self.resolve_range(*low, *high),
            NodeKind::ArrayType { domain, element } => self.resolve_array_type(*domain, *element),
            NodeKind::DomainType { args } => self.resolve_domain_type(args),

            NodeKind::Return(value) => self.resolve_return(id, *value),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.resolve_if(*cond, *then_branch, *else_branch),
            NodeKind::While { cond, body } => self.resolve_while(*cond, *body),
            NodeKind::Loop(stmt) => self.resolve_loop(stmt),
            NodeKind::Begin(body) => {
                self.resolve(*body)?;
                Ok(ResolvedExpr::statement())
            }
            NodeKind::Cobegin(stmts) => {
                self.resolve_all(stmts)?;
                Ok(ResolvedExpr::statement())
            }
            NodeKind::On { locale, body } => {
                let locale_qt = self.resolve(*locale)?;
                self.resolve(*body)?;
                if !locale_qt.is_erroneous() && !locale_qt.kind.is_value_like() {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedValue));
                }
                Ok(ResolvedExpr::statement())
            }
        }
    }
}

fn param(value: ParamValue) -> ResolvedExpr {
    ResolvedExpr::of(QualifiedType::param(value))
}
