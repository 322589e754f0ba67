//! Variables and control statements.

use crest_ir::{LoopStmt, NodeId, NodeKind, VarKind, VariableDecl};
use crest_types::{QualKind, QualifiedType, TypeData, TypeId};

use super::Resolver;
use crate::call;
use crate::coerce::{can_convert, matches_pattern};
use crate::error::{InternalError, ResolutionErrorKind};
use crate::result::ResolvedExpr;

impl Resolver<'_> {
    pub(super) fn resolve_variable(
        &mut self,
        id: NodeId,
        decl: &VariableDecl,
    ) -> Result<ResolvedExpr, InternalError> {
        let declared = decl.type_expr.map(|t| self.resolve(t)).transpose()?;
        let init = decl.init.map(|i| self.resolve(i)).transpose()?;
        if declared.is_some_and(QualifiedType::is_erroneous)
            || init.is_some_and(QualifiedType::is_erroneous)
        {
            return Ok(ResolvedExpr::erroneous());
        }
        if declared.is_some_and(|d| !d.is_type()) {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedType));
        }
        let declared = declared.map(|d| d.ty);

        match decl.kind {
            VarKind::Type => Ok(match init {
                Some(init) if init.is_type() => ResolvedExpr::of(init),
                Some(_) => ResolvedExpr::failed(ResolutionErrorKind::ExpectedType),
                None => ResolvedExpr::failed(ResolutionErrorKind::ExpectedType),
            }),
            VarKind::Param => {
                let Some(value) = init.filter(|i| i.is_known_param()).and_then(|i| i.param) else {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedParam));
                };
                let Some(ty) = declared else {
                    return Ok(ResolvedExpr::of(QualifiedType::param(value)));
                };
                Ok(match value.coerce(ty) {
                    Some(coerced) => ResolvedExpr::of(QualifiedType::param(coerced)),
                    None => ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
                        expected: ty,
                        found: value.type_id(),
                    }),
                })
            }
            kind => self.value_variable(id, kind, declared, init),
        }
    }

    fn value_variable(
        &self,
        id: NodeId,
        kind: VarKind,
        declared: Option<TypeId>,
        init: Option<QualifiedType>,
    ) -> Result<ResolvedExpr, InternalError> {
        let types = self.ctx.types();
        if let Some(init) = init {
            if !init.kind.is_value_like() {
                return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedValue));
            }
            if matches!(kind, VarKind::Ref) && !init.kind.is_lvalue() {
                return Ok(ResolvedExpr::failed(ResolutionErrorKind::NotAssignable));
            }
        }

        let ty = match (declared, init) {
            (Some(ty), Some(init)) if types.is_generic(ty) => {
                if !matches_pattern(types, init.ty, ty) {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
                        expected: ty,
                        found: init.ty,
                    }));
                }
                init.ty
            }
            (Some(ty), Some(init)) => {
                let exact = matches!(kind, VarKind::Ref | VarKind::ConstRef);
                let fits = if exact { init.ty == ty } else { can_convert(types, init, ty) };
                if !fits {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
                        expected: ty,
                        found: init.ty,
                    }));
                }
                ty
            }
            (Some(ty), None) => {
                // Fields of a generic aggregate may have generic types.
                let is_field = self
                    .ast
                    .parent(id)
                    .is_some_and(|p| matches!(self.ast.kind(p), Some(NodeKind::Aggregate(_))));
                if types.is_generic(ty) && !is_field {
                    return Ok(ResolvedExpr::failed(
                        ResolutionErrorKind::GenericTypeWithoutInstantiation { ty },
                    ));
                }
                if matches!(kind, VarKind::Ref | VarKind::ConstRef) {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedValue));
                }
                if types.aggregate_type(ty).is_some() && !types.is_generic(ty) {
                    if let Err(kind) = call::default_initializable(self.ctx, ty)? {
                        return Ok(ResolvedExpr::failed(kind));
                    }
                }
                ty
            }
            (None, Some(init)) => init.ty,
            (None, None) => return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedType)),
        };

        let qt_kind = match kind {
            VarKind::Const => QualKind::ConstVar,
            VarKind::Ref => QualKind::Ref,
            VarKind::ConstRef => QualKind::ConstRef,
            _ => QualKind::Var,
        };
        Ok(ResolvedExpr::of(QualifiedType::new(qt_kind, ty)))
    }

    pub(super) fn resolve_return(
        &mut self,
        id: NodeId,
        value: Option<NodeId>,
    ) -> Result<ResolvedExpr, InternalError> {
        let qt = match value {
            Some(v) => self.resolve(v)?,
            None => QualifiedType::value(TypeId::VOID),
        };
        self.returns.push((id, qt));
        Ok(ResolvedExpr::statement())
    }

    /// A `param` condition resolves only the branch it selects.
    pub(super) fn resolve_if(
        &mut self,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> Result<ResolvedExpr, InternalError> {
        let cond_qt = self.resolve(cond)?;
        if cond_qt.kind == QualKind::Param {
            if let Some(taken) = cond_qt.param.and_then(crest_types::ParamValue::as_bool) {
                if taken {
                    self.resolve(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.resolve(else_branch)?;
                }
                return Ok(ResolvedExpr::statement());
            }
        }
        self.resolve(then_branch)?;
        if let Some(else_branch) = else_branch {
            self.resolve(else_branch)?;
        }
        Ok(check_condition(cond_qt))
    }

    pub(super) fn resolve_while(
        &mut self,
        cond: NodeId,
        body: NodeId,
    ) -> Result<ResolvedExpr, InternalError> {
        let cond_qt = self.resolve(cond)?;
        self.resolve(body)?;
        Ok(check_condition(cond_qt))
    }

    /// The index variable takes the iterand's element or index type.
    pub(super) fn resolve_loop(&mut self, stmt: &LoopStmt) -> Result<ResolvedExpr, InternalError> {
        let iterand = self.resolve(stmt.iterand)?;
        let index_qt = self.loop_index(iterand);
        if let Some(index) = stmt.index {
            self.seed(index, index_qt.unwrap_or(QualifiedType::erroneous()))?;
        }
        self.resolve(stmt.body)?;
        match index_qt {
            Some(_) => Ok(ResolvedExpr::statement()),
            None if iterand.is_erroneous() => Ok(ResolvedExpr::erroneous()),
            None => Ok(ResolvedExpr::failed(ResolutionErrorKind::InvalidOperands {
                op: "for",
            })),
        }
    }

    fn loop_index(&self, iterand: QualifiedType) -> Option<QualifiedType> {
        if !iterand.kind.is_value_like() {
            return None;
        }
        let types = self.ctx.types();
        match types.get(iterand.ty) {
            TypeData::Array { elt, .. } if iterand.kind.is_lvalue() => Some(QualifiedType::ref_(elt)),
            TypeData::Array { elt, .. } => Some(QualifiedType::const_ref(elt)),
            TypeData::Domain(_) | TypeData::Range { .. } => {
                let idx = types.index_type(iterand.ty)?;
                let rank = types.rank(iterand.ty).unwrap_or(1);
                let ty = if rank > 1 {
                    types.tuple(vec![idx; rank as usize])
                } else {
                    idx
                };
                Some(QualifiedType::const_var(ty))
            }
            _ => None,
        }
    }
}

fn check_condition(cond: QualifiedType) -> ResolvedExpr {
    if cond.is_erroneous() || (cond.kind.is_value_like() && cond.ty == TypeId::BOOL) {
        return ResolvedExpr::statement();
    }
    ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
        expected: TypeId::BOOL,
        found: cond.ty,
    })
}
