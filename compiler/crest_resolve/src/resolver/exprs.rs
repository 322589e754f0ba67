//! Operators, indexing, literals of compound shape and type expressions.

use crest_ir::{NodeId, OpKind};
use crest_types::{ParamValue, QualKind, QualifiedType, TypeData, TypeId};

use super::Resolver;
use crate::coerce::{can_convert, common_numeric};
use crate::error::{InternalError, ResolutionErrorKind};
use crate::result::ResolvedExpr;

fn invalid(op: &'static str) -> ResolvedExpr {
    ResolvedExpr::failed(ResolutionErrorKind::InvalidOperands { op })
}

impl Resolver<'_> {
    pub(super) fn resolve_type_query(&self, id: NodeId) -> ResolvedExpr {
        ResolvedExpr::of(
            self.subs
                .get(id)
                .unwrap_or(QualifiedType::type_(TypeId::ANY)),
        )
    }

    pub(super) fn resolve_index(
        &mut self,
        base: NodeId,
        indices: &[NodeId],
    ) -> Result<ResolvedExpr, InternalError> {
        let base_qt = self.resolve(base)?;
        let index_qts = self.resolve_all(indices)?;
        if base_qt.is_erroneous() || index_qts.iter().any(|q| q.is_erroneous()) {
            return Ok(ResolvedExpr::erroneous());
        }
        if !base_qt.kind.is_value_like() {
            return Ok(invalid("[]"));
        }
        let types = self.ctx.types();
        let element_of = |elt: TypeId| {
            if base_qt.kind.is_lvalue() {
                QualifiedType::ref_(elt)
            } else {
                QualifiedType::const_ref(elt)
            }
        };

        match types.get(base_qt.ty) {
            TypeData::Array { domain, elt } => {
                let rank = types.rank(domain).unwrap_or(1) as usize;
                if index_qts.len() != rank {
                    return Ok(invalid("[]"));
                }
                let idx = types.index_type(domain).unwrap_or(TypeId::INT);
                if let Some(bad) = index_qts.iter().find(|q| !can_convert(types, **q, idx)) {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
                        expected: idx,
                        found: bad.ty,
                    }));
                }
                Ok(ResolvedExpr::of(element_of(elt)))
            }
            TypeData::Tuple(elems) => {
                let [index] = index_qts.as_slice() else {
                    return Ok(invalid("[]"));
                };
                let Some(position) = index.param.and_then(ParamValue::as_int) else {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedParam));
                };
                match usize::try_from(position).ok().and_then(|p| elems.get(p)) {
                    Some(&elt) => Ok(ResolvedExpr::of(element_of(elt))),
                    None => Ok(invalid("[]")),
                }
            }
            _ => Ok(invalid("[]")),
        }
    }

    pub(super) fn resolve_op(
        &mut self,
        op: OpKind,
        operands: &[NodeId],
    ) -> Result<ResolvedExpr, InternalError> {
        let qts = self.resolve_all(operands)?;
        if qts.iter().any(|q| q.is_erroneous()) {
            return Ok(ResolvedExpr::erroneous());
        }
        match (op, qts.as_slice()) {
            (OpKind::Assign, [lhs, rhs]) => Ok(self.assign(*lhs, *rhs)),
            (OpKind::Not | OpKind::Neg, [operand]) => Ok(self.unary(op, *operand)),
            (_, [lhs, rhs]) if !op.is_unary() => Ok(self.binary(op, *lhs, *rhs)),
            _ => Ok(invalid(op.symbol())),
        }
    }

    fn assign(&self, lhs: QualifiedType, rhs: QualifiedType) -> ResolvedExpr {
        if !lhs.kind.is_lvalue() {
            return ResolvedExpr::failed(ResolutionErrorKind::NotAssignable);
        }
        if !rhs.kind.is_value_like() {
            return ResolvedExpr::failed(ResolutionErrorKind::ExpectedValue);
        }
        if !can_convert(self.ctx.types(), rhs, lhs.ty) {
            return ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
                expected: lhs.ty,
                found: rhs.ty,
            });
        }
        ResolvedExpr::statement()
    }

    fn unary(&self, op: OpKind, operand: QualifiedType) -> ResolvedExpr {
        if !operand.kind.is_value_like() {
            return invalid(op.symbol());
        }
        let applies = match op {
            OpKind::Not => operand.ty == TypeId::BOOL,
            _ => self.ctx.types().is_numeric(operand.ty),
        };
        if !applies {
            return invalid(op.symbol());
        }
        let folded = operand
            .param
            .filter(|_| operand.kind == QualKind::Param)
            .and_then(|v| ParamValue::fold_unary(op, v));
        ResolvedExpr::of(folded.map_or(QualifiedType::value(operand.ty), QualifiedType::param))
    }

    fn binary(&self, op: OpKind, lhs: QualifiedType, rhs: QualifiedType) -> ResolvedExpr {
        // `t1 == t2` compares types at compile time.
        if lhs.is_type() && rhs.is_type() && matches!(op, OpKind::Eq | OpKind::Ne) {
            let same = lhs.ty == rhs.ty;
            return ResolvedExpr::of(QualifiedType::param(ParamValue::Bool(
                if op == OpKind::Eq { same } else { !same },
            )));
        }
        if !lhs.kind.is_value_like() || !rhs.kind.is_value_like() {
            return invalid(op.symbol());
        }

        let result_ty = match op {
            OpKind::And | OpKind::Or => {
                (lhs.ty == TypeId::BOOL && rhs.ty == TypeId::BOOL).then_some(TypeId::BOOL)
            }
            OpKind::Add if lhs.ty == TypeId::STRING && rhs.ty == TypeId::STRING => {
                if let (Some(ParamValue::Str(a)), Some(ParamValue::Str(b))) = (lhs.param, rhs.param) {
                    let names = self.ctx.interner();
                    let joined = format!("{}{}", names.lookup(a), names.lookup(b));
                    return ResolvedExpr::of(QualifiedType::param(ParamValue::Str(
                        names.intern(&joined),
                    )));
                }
                Some(TypeId::STRING)
            }
            _ if op.is_comparison() => {
                let comparable = lhs.ty == rhs.ty || common_numeric(lhs.ty, rhs.ty).is_some();
                comparable.then_some(TypeId::BOOL)
            }
            _ => common_numeric(lhs.ty, rhs.ty),
        };
        let Some(result_ty) = result_ty else {
            return invalid(op.symbol());
        };

        let folded = match (lhs.param, rhs.param) {
            (Some(a), Some(b)) if lhs.kind == QualKind::Param && rhs.kind == QualKind::Param => {
                ParamValue::fold_binary(op, a, b)
            }
            _ => None,
        };
        ResolvedExpr::of(folded.map_or(QualifiedType::value(result_ty), QualifiedType::param))
    }

    pub(super) fn resolve_tuple(&mut self, elements: &[NodeId]) -> Result<ResolvedExpr, InternalError> {
        let qts = self.resolve_all(elements)?;
        if qts.iter().any(|q| q.is_erroneous()) {
            return Ok(ResolvedExpr::erroneous());
        }
        let tys = qts.iter().map(|q| q.ty).collect();
        if !qts.is_empty() && qts.iter().all(|q| q.is_type()) {
            return Ok(ResolvedExpr::of(QualifiedType::type_(self.ctx.types().tuple(tys))));
        }
        if qts.iter().all(|q| q.kind.is_value_like()) {
            return Ok(ResolvedExpr::of(QualifiedType::value(self.ctx.types().tuple(tys))));
        }
        Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedValue))
    }

    pub(super) fn resolve_array_literal(
        &mut self,
        elements: &[NodeId],
        rank: u32,
    ) -> Result<ResolvedExpr, InternalError> {
        let qts = self.resolve_all(elements)?;
        if qts.iter().any(|q| q.is_erroneous()) {
            return Ok(ResolvedExpr::erroneous());
        }
        let Some((first, rest)) = qts.split_first() else {
            return Ok(invalid("[]"));
        };
        if qts.iter().any(|q| !q.kind.is_value_like()) {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedValue));
        }
        let mut elt = first.ty;
        for qt in rest {
            if qt.ty == elt {
                continue;
            }
            match common_numeric(elt, qt.ty) {
                Some(common) => elt = common,
                None => {
                    return Ok(ResolvedExpr::failed(ResolutionErrorKind::TypeMismatch {
                        expected: elt,
                        found: qt.ty,
                    }))
                }
            }
        }
        let types = self.ctx.types();
        let domain = types.rectangular_domain(rank.max(1), TypeId::INT);
        Ok(ResolvedExpr::of(QualifiedType::value(types.array(domain, elt))))
    }

    pub(super) fn resolve_range(
        &mut self,
        low: Option<NodeId>,
        high: Option<NodeId>,
    ) -> Result<ResolvedExpr, InternalError> {
        let bounds: Vec<NodeId> = low.into_iter().chain(high).collect();
        let qts = self.resolve_all(&bounds)?;
        if qts.iter().any(|q| q.is_erroneous()) {
            return Ok(ResolvedExpr::erroneous());
        }
        let types = self.ctx.types();
        if qts
            .iter()
            .any(|q| !q.kind.is_value_like() || !can_convert(types, *q, TypeId::INT))
        {
            return Ok(invalid(".."));
        }
        Ok(ResolvedExpr::of(QualifiedType::value(types.range(TypeId::INT))))
    }

    pub(super) fn resolve_array_type(
        &mut self,
        domain: Option<NodeId>,
        element: Option<NodeId>,
    ) -> Result<ResolvedExpr, InternalError> {
        let domain_qt = domain.map(|d| self.resolve(d)).transpose()?;
        let element_qt = element.map(|e| self.resolve(e)).transpose()?;
        if domain_qt.is_some_and(QualifiedType::is_erroneous)
            || element_qt.is_some_and(QualifiedType::is_erroneous)
        {
            return Ok(ResolvedExpr::erroneous());
        }
        let types = self.ctx.types();

        let domain_ty = match domain_qt {
            None => types.generic_domain(),
            Some(qt) if qt.is_type() && qt.ty == TypeId::ANY => types.generic_domain(),
            Some(qt) => match types.get(qt.ty) {
                TypeData::Domain(_) if qt.is_type() || qt.kind.is_value_like() => qt.ty,
                // `[1..n] T` declares a one-dimensional rectangular domain.
                TypeData::Range { .. } if qt.kind.is_value_like() => {
                    types.rectangular_domain(1, TypeId::INT)
                }
                _ => return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedType)),
            },
        };
        let element_ty = match element_qt {
            None => TypeId::ANY,
            Some(qt) if qt.is_type() => qt.ty,
            Some(_) => return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedType)),
        };
        Ok(ResolvedExpr::of(QualifiedType::type_(types.array(domain_ty, element_ty))))
    }

    pub(super) fn resolve_domain_type(&mut self, args: &[NodeId]) -> Result<ResolvedExpr, InternalError> {
        let qts = self.resolve_all(args)?;
        if qts.iter().any(|q| q.is_erroneous()) {
            return Ok(ResolvedExpr::erroneous());
        }
        let types = self.ctx.types();
        let ty = match qts.as_slice() {
            [] => types.generic_domain(),
            [idx] if idx.is_type() => types.associative_domain(idx.ty, true),
            [rank] => match rank.param.and_then(ParamValue::as_int) {
                Some(n) if n > 0 && rank.kind == QualKind::Param => {
                    types.rectangular_domain(u32::try_from(n).unwrap_or(u32::MAX), TypeId::INT)
                }
                _ => return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedParam)),
            },
            [idx, par_safe] if idx.is_type() => match par_safe.param.and_then(ParamValue::as_bool) {
                Some(par_safe) => types.associative_domain(idx.ty, par_safe),
                None => return Ok(ResolvedExpr::failed(ResolutionErrorKind::ExpectedParam)),
            },
            _ => return Ok(invalid("domain")),
        };
        Ok(ResolvedExpr::of(QualifiedType::type_(ty)))
    }
}
