//! Signatures of user functions and of compiler-generated initializers.
//!
//! A function's initial signature resolves every formal type expression
//! with no bindings; formals that stay generic (`any`, unbound params,
//! generic arrays and aggregates) make the signature generic. The same
//! builders produce instantiated signatures from a substitution.

use std::sync::Arc;

use crest_ir::{Ast, Intent, Name, NodeId, NodeKind, ReturnIntent, VarKind};
use crest_query::Query;
use crest_types::{
    ParamValue, QualKind, QualifiedType, SigFormal, Signature, SignatureId, SignatureKind,
    Substitution, TypeId, WhereClause,
};

use crate::aggregate;
use crate::context::Frame;
use crate::error::{InternalError, ResolutionError, ResolutionErrorKind};
use crate::queries::AggregateFields;
use crate::resolver::Resolver;
use crate::Context;

/// An interned signature and the failures found while building it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: SignatureId,
    pub errors: Vec<ResolutionError>,
}

pub(crate) fn initial_signature(ctx: &Context, decl: NodeId) -> Result<SignatureInfo, InternalError> {
    let _frame = ctx.push_frame(Frame::Signature(decl));
    let ast = ctx.ast(decl.file)?;
    let (sig, errors) = match ast.kind(decl) {
        Some(NodeKind::Function(_)) => build_function(ctx, &ast, decl, Substitution::empty(), None)?,
        Some(NodeKind::Aggregate(_)) => {
            let ty = aggregate::declared_type(ctx, &ast, decl)?;
            (build_default_init(ctx, decl, ty, None)?, Vec::new())
        }
        _ => {
            return Err(InternalError::NotADeclaration {
                node: decl,
                expected: "function",
            })
        }
    };
    let signature = ctx.signatures().intern(sig);
    tracing::trace!(%decl, ?signature, "initial signature");
    Ok(SignatureInfo { signature, errors })
}

/// Kind of a formal passed with `intent`.
pub(crate) fn intent_kind(intent: Intent) -> QualKind {
    match intent {
        Intent::Default | Intent::Const | Intent::ConstIn => QualKind::ConstVar,
        Intent::In => QualKind::Var,
        Intent::Ref | Intent::Out | Intent::InOut => QualKind::Ref,
        Intent::ConstRef => QualKind::ConstRef,
        Intent::Param => QualKind::Param,
        Intent::Type => QualKind::Type,
    }
}

/// Qualified type of a formal under the resolver's bindings. A variadic
/// formal answers with the type of one element.
pub(crate) fn resolve_formal(r: &mut Resolver<'_>, id: NodeId) -> Result<QualifiedType, InternalError> {
    if let Some(bound) = r.subs.get(id) {
        return Ok(bound);
    }
    let ast = Arc::clone(&r.ast);
    let Some(NodeKind::Formal(formal)) = ast.kind(id) else {
        return Err(InternalError::NotADeclaration {
            node: id,
            expected: "formal",
        });
    };

    let declared = match formal.type_expr {
        Some(expr) => {
            let qt = r.resolve(expr)?;
            if qt.is_erroneous() {
                return Ok(QualifiedType::erroneous());
            }
            if !qt.is_type() {
                r.report(expr, ResolutionErrorKind::ExpectedType);
                return Ok(QualifiedType::erroneous());
            }
            Some(qt.ty)
        }
        None => None,
    };
    let default = formal.default.map(|d| r.resolve(d)).transpose()?;

    Ok(match formal.intent {
        Intent::Type => QualifiedType::type_(declared.unwrap_or(TypeId::ANY)),
        Intent::Param => QualifiedType::unbound_param(declared.unwrap_or(TypeId::ANY)),
        intent => {
            let from_default = default
                .filter(|d| d.kind.is_value_like() && !d.is_erroneous())
                .map(|d| d.ty);
            let ty = declared.or(from_default).unwrap_or(TypeId::ANY);
            QualifiedType::new(intent_kind(intent), ty)
        }
    })
}

/// Build the signature of function `decl` under `subs`.
pub(crate) fn build_function(
    ctx: &Context,
    ast: &Arc<Ast>,
    decl: NodeId,
    subs: Substitution,
    instantiated_from: Option<SignatureId>,
) -> Result<(Signature, Vec<ResolutionError>), InternalError> {
    let Some(NodeKind::Function(fd)) = ast.kind(decl) else {
        return Err(InternalError::NotADeclaration {
            node: decl,
            expected: "function",
        });
    };
    let mut r = Resolver::new(ctx, Arc::clone(ast), decl, subs.clone());
    let mut formals = Vec::with_capacity(fd.formals.len() + 1);

    let owner = ast
        .parent(decl)
        .filter(|p| matches!(ast.kind(*p), Some(NodeKind::Aggregate(_))));
    if let Some(owner) = owner {
        let intent = if fd.name == Name::INIT {
            Intent::Ref
        } else {
            Intent::ConstRef
        };
        let qt = match subs.get(decl) {
            Some(bound) => bound,
            None => QualifiedType::new(
                intent_kind(intent),
                aggregate::declared_type(ctx, ast, owner)?,
            ),
        };
        r.this_qt = Some(qt);
        formals.push(SigFormal {
            decl,
            name: Name::THIS,
            intent,
            qt,
            has_default: false,
            variadic: false,
        });
    }

    for &formal in &fd.formals {
        let Some(NodeKind::Formal(f)) = ast.kind(formal) else {
            return Err(InternalError::NotADeclaration {
                node: formal,
                expected: "formal",
            });
        };
        let resolved = r.resolve(formal)?;
        let qt = if f.variadic && !subs.contains(formal) {
            QualifiedType::new(resolved.kind, TypeId::ANY)
        } else {
            resolved
        };
        formals.push(SigFormal {
            decl: formal,
            name: f.name,
            intent: f.intent,
            qt,
            has_default: f.default.is_some(),
            variadic: f.variadic,
        });
    }

    let generic = formals.iter().any(|f| f.is_generic(ctx.types()));
    let where_clause = match fd.where_clause {
        None => WhereClause::None,
        Some(_) if generic => WhereClause::Pending,
        Some(cond) => {
            let qt = r.resolve(cond)?;
            match qt.param.and_then(ParamValue::as_bool) {
                Some(value) if qt.kind == QualKind::Param => WhereClause::Evaluated(value),
                _ if qt.is_erroneous() => WhereClause::Evaluated(false),
                _ => {
                    r.report(cond, ResolutionErrorKind::WhereClauseNotParam);
                    WhereClause::Evaluated(false)
                }
            }
        }
    };

    let sig = Signature {
        decl,
        name: fd.name,
        kind: SignatureKind::Function,
        formals,
        return_intent: fd.return_intent,
        is_method: owner.is_some(),
        where_clause,
        substitution: subs,
        instantiated_from,
    };
    Ok((sig, r.finish().errors().to_vec()))
}

/// The compiler-generated initializer of aggregate type `ty`: one formal per
/// field, in declaration order.
pub(crate) fn build_default_init(
    ctx: &Context,
    decl: NodeId,
    ty: TypeId,
    instantiated_from: Option<SignatureId>,
) -> Result<Signature, InternalError> {
    let agg = ctx
        .types()
        .aggregate_type(ty)
        .ok_or(InternalError::NotAnAggregate { ty })?;
    let ast = ctx.ast(decl.file)?;
    let fields = AggregateFields::get(ctx, ty)?;

    let formals = fields
        .fields
        .iter()
        .map(|field| {
            let var = match ast.kind(field.decl) {
                Some(NodeKind::Variable(v)) => Some(v),
                _ => None,
            };
            let (intent, qt) = match field.qt.kind {
                QualKind::Type => (Intent::Type, field.qt),
                QualKind::Param => (Intent::Param, field.qt),
                _ => (Intent::Default, QualifiedType::const_var(field.qt.ty)),
            };
            let has_default = agg.subs.contains(field.decl)
                || var.is_some_and(|v| {
                    v.init.is_some()
                        || (v.type_expr.is_some() && !matches!(v.kind, VarKind::Type | VarKind::Param))
                });
            SigFormal {
                decl: field.decl,
                name: field.name,
                intent,
                qt,
                has_default,
                variadic: false,
            }
        })
        .collect();

    Ok(Signature {
        decl,
        name: agg.name,
        kind: SignatureKind::DefaultInit,
        formals,
        return_intent: ReturnIntent::Default,
        is_method: false,
        where_clause: WhereClause::None,
        substitution: agg.subs,
        instantiated_from,
    })
}
