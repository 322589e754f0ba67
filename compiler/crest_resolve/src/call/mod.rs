//! Call resolution.
//!
//! Candidates come from the callee: overloads found by name lookup, the
//! methods of a receiver's aggregate, or the initializers of a type being
//! constructed. Each candidate is checked for applicability and
//! instantiated when generic; the most specific survivor wins.

mod matching;
mod rank;

use std::sync::Arc;

use crest_ir::{Actual, AggregateKind, Name, NodeId, NodeKind, VarKind};
use crest_query::Query;
use crest_types::{AggregateType, QualKind, QualifiedType, SignatureId, TypeId};

use crate::aggregate;
use crate::context::Frame;
use crate::error::{InternalError, RejectReason, Rejection, ResolutionErrorKind};
use crate::instantiate::{GenericKey, InstantiationKey};
use crate::lookup::{self, LookupMode};
use crate::queries::{InitialSignature, Instantiate, LookupKey, LookupQuery};
use crate::resolver::{Outcome, Resolver};
use crate::result::{ResolvedCall, ResolvedExpr};
use crate::returns;
use crate::Context;

use matching::Applicable;
use rank::Selection;

#[derive(Copy, Clone, Debug)]
pub(crate) struct CallActual {
    pub node: NodeId,
    pub name: Option<Name>,
    pub qt: QualifiedType,
}

/// The receiver of a method call, written (`r.f()`) or implicit `this`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Receiver {
    pub qt: QualifiedType,
}

#[derive(Clone, Debug)]
pub(crate) struct CallSite {
    pub name: Name,
    pub actuals: Vec<CallActual>,
    pub receiver: Option<Receiver>,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Candidate {
    pub decl: NodeId,
    pub signature: SignatureId,
}

pub(crate) fn resolve_call(
    r: &mut Resolver<'_>,
    call: NodeId,
    callee: NodeId,
    actuals: &[Actual],
) -> Result<ResolvedExpr, InternalError> {
    let callee_qt = r.resolve(callee)?;
    let mut resolved = Vec::with_capacity(actuals.len());
    for actual in actuals {
        let qt = r.resolve(actual.value)?;
        resolved.push(CallActual {
            node: actual.value,
            name: actual.name,
            qt,
        });
    }
    if callee_qt.is_erroneous() || resolved.iter().any(|a| a.qt.is_erroneous()) {
        return Ok(ResolvedExpr::erroneous());
    }
    tracing::trace!(%call, actuals = resolved.len(), "resolving call");

    match callee_qt.kind {
        QualKind::Function => call_function(r, callee, resolved),
        QualKind::Type => construct(r, callee_qt.ty, resolved),
        _ => Ok(ResolvedExpr::failed(ResolutionErrorKind::NotCallable)),
    }
}

fn call_function(
    r: &mut Resolver<'_>,
    callee: NodeId,
    actuals: Vec<CallActual>,
) -> Result<ResolvedExpr, InternalError> {
    let decls: Vec<NodeId> = r
        .result
        .get(callee)
        .map(|e| e.targets.iter().filter_map(|t| t.decl()).collect())
        .unwrap_or_default();
    let ast = Arc::clone(&r.ast);
    let (name, receiver) = match ast.kind(callee) {
        Some(NodeKind::Dot { receiver, member }) => {
            let recv = r
                .result
                .qt(*receiver)
                .filter(|qt| qt.kind.is_value_like())
                .map(|qt| Receiver { qt });
            (*member, recv)
        }
        Some(NodeKind::Identifier(name)) => (*name, r.this_qt.map(|qt| Receiver { qt })),
        _ => (Name::EMPTY, None),
    };
    let site = CallSite {
        name,
        actuals,
        receiver,
    };
    let candidates = match gather(r.ctx, &decls)? {
        Ok(candidates) => candidates,
        Err(kind) => return Ok(ResolvedExpr::failed(kind)),
    };
    select(r, &site, &candidates)
}

/// Initial signatures of the candidate declarations.
fn gather(ctx: &Context, decls: &[NodeId]) -> Result<Outcome<Vec<Candidate>>, InternalError> {
    let mut out = Vec::with_capacity(decls.len());
    for &decl in decls {
        if ctx.reentry(&Frame::Signature(decl)).is_some() {
            return Ok(Err(ResolutionErrorKind::RecursiveDefinition { decl }));
        }
        let info = InitialSignature::get(ctx, decl)?;
        out.push(Candidate {
            decl,
            signature: info.signature,
        });
    }
    Ok(Ok(out))
}

fn select(
    r: &mut Resolver<'_>,
    site: &CallSite,
    candidates: &[Candidate],
) -> Result<ResolvedExpr, InternalError> {
    let mut applicable = Vec::new();
    let mut rejected = Vec::new();
    for &candidate in candidates {
        match matching::evaluate(r.ctx, candidate, site)? {
            Ok(app) => applicable.push(app),
            Err(reason) => {
                tracing::trace!(candidate = %candidate.decl, ?reason, "candidate rejected");
                rejected.push(Rejection {
                    candidate: candidate.decl,
                    reason,
                });
            }
        }
    }

    match rank::select(applicable, |a| a.key) {
        Selection::Best(best) => finish(r, best),
        Selection::Ambiguous(tied) => {
            let mut candidates: Vec<NodeId> = tied.iter().map(|a| a.candidate).collect();
            candidates.sort();
            Ok(ResolvedExpr::failed(ResolutionErrorKind::AmbiguousCall {
                name: site.name,
                candidates,
            }))
        }
        Selection::None => {
            if let [only] = rejected.as_slice() {
                if let RejectReason::Arity { expected, found } = only.reason {
                    return Ok(ResolvedExpr::failed(
                        ResolutionErrorKind::WrongArgumentCount {
                            name: site.name,
                            expected,
                            found,
                        },
                    ));
                }
            }
            Ok(ResolvedExpr::failed(ResolutionErrorKind::NoMatchingCandidate {
                name: site.name,
                rejected,
            }))
        }
    }
}

fn finish(r: &Resolver<'_>, best: Applicable) -> Result<ResolvedExpr, InternalError> {
    let outcome = returns::call_return(r.ctx, best.signature)?;
    let return_type = outcome.clone().unwrap_or_else(|_| QualifiedType::erroneous());
    let call = ResolvedCall {
        signature: best.signature,
        instantiated_from: best.instantiated_from,
        formal_actuals: best.formal_actuals,
        return_type,
    };
    let expr = match outcome {
        Ok(qt) => ResolvedExpr::of(qt),
        Err(kind) => ResolvedExpr::failed(kind),
    };
    Ok(expr.with_call(call))
}

/// A call whose callee is a type: instantiate a generic aggregate from
/// type and param actuals, or initialize a value.
fn construct(
    r: &mut Resolver<'_>,
    ty: TypeId,
    actuals: Vec<CallActual>,
) -> Result<ResolvedExpr, InternalError> {
    let ctx = r.ctx;
    let Some(agg) = ctx.types().aggregate_type(ty) else {
        return Ok(ResolvedExpr::failed(ResolutionErrorKind::NotCallable));
    };
    if ctx.reentry(&Frame::Fields(ty)).is_some()
        || ctx.reentry(&Frame::Signature(agg.decl)).is_some()
    {
        return Ok(ResolvedExpr::failed(ResolutionErrorKind::RecursiveDefinition {
            decl: agg.decl,
        }));
    }
    if is_type_call(ctx, &agg, &actuals)? {
        return type_constructor(ctx, &agg, &actuals);
    }

    let mut site = CallSite {
        name: agg.name,
        actuals,
        receiver: None,
    };
    if !agg.generic {
        let inits = user_initializers(ctx, agg.decl)?;
        if !inits.is_empty() {
            site.receiver = Some(Receiver {
                qt: QualifiedType::var(ty),
            });
            let candidates = match gather(ctx, &inits)? {
                Ok(candidates) => candidates,
                Err(kind) => return Ok(ResolvedExpr::failed(kind)),
            };
            return select(r, &site, &candidates);
        }
    }
    let signature = default_init_signature(ctx, &agg)?;
    select(
        r,
        &site,
        &[Candidate {
            decl: agg.decl,
            signature,
        }],
    )
}

fn user_initializers(ctx: &Context, decl: NodeId) -> Result<Vec<NodeId>, InternalError> {
    let found = LookupQuery::get(
        ctx,
        LookupKey {
            scope: decl,
            name: Name::INIT,
            mode: LookupMode::Members,
        },
    )?;
    let mut inits = Vec::new();
    for d in found.decls() {
        if lookup::is_function(ctx, d)? {
            inits.push(d);
        }
    }
    Ok(inits)
}

/// The compiler-generated initializer of `agg`, instantiated when `agg` is.
fn default_init_signature(ctx: &Context, agg: &AggregateType) -> Result<SignatureId, InternalError> {
    if agg.subs.is_empty() {
        return Ok(InitialSignature::get(ctx, agg.decl)?.signature);
    }
    let key = InstantiationKey {
        generic: GenericKey::Initializer(agg.decl),
        subs: agg.subs.clone(),
    };
    Instantiate::get(ctx, key)?
        .value
        .signature()
        .ok_or(InternalError::NotADeclaration {
            node: agg.decl,
            expected: "aggregate",
        })
}

/// `R(int)` names a type. `R(1)` builds a value, unless every generic
/// field of `R` is a `type` or `param` field.
fn is_type_call(ctx: &Context, agg: &AggregateType, actuals: &[CallActual]) -> Result<bool, InternalError> {
    if !agg.generic || actuals.is_empty() {
        return Ok(false);
    }
    if actuals
        .iter()
        .any(|a| !a.qt.is_type() && a.qt.kind != QualKind::Param)
    {
        return Ok(false);
    }
    if actuals.iter().any(|a| a.qt.is_type()) {
        return Ok(true);
    }
    let ast = ctx.ast(agg.decl.file)?;
    Ok(aggregate::generic_fields(&ast, agg.decl)?.iter().all(|&d| {
        matches!(
            ast.kind(d),
            Some(NodeKind::Variable(v)) if matches!(v.kind, VarKind::Type | VarKind::Param)
        )
    }))
}

/// `R(int, 3)`: bind the generic fields of `R` in order, or by name.
fn type_constructor(
    ctx: &Context,
    agg: &AggregateType,
    actuals: &[CallActual],
) -> Result<ResolvedExpr, InternalError> {
    let ast = ctx.ast(agg.decl.file)?;
    let open: Vec<NodeId> = aggregate::generic_fields(&ast, agg.decl)?
        .into_iter()
        .filter(|&d| !agg.subs.contains(d))
        .collect();
    let reject = |reason| {
        ResolvedExpr::failed(ResolutionErrorKind::NoMatchingCandidate {
            name: agg.name,
            rejected: vec![Rejection {
                candidate: agg.decl,
                reason,
            }],
        })
    };
    let field_name = |d: NodeId| ast.kind(d).and_then(NodeKind::declared_name);

    let mut subs = agg.subs.clone();
    let mut next = 0;
    for actual in actuals {
        let field = match actual.name {
            Some(name) => match open.iter().copied().find(|&d| field_name(d) == Some(name)) {
                Some(d) if subs.contains(d) => {
                    return Ok(reject(RejectReason::DuplicateActual(name)));
                }
                Some(d) => d,
                None => return Ok(reject(RejectReason::UnknownNamedActual(name))),
            },
            None => {
                while open.get(next).is_some_and(|&d| subs.contains(d)) {
                    next += 1;
                }
                let Some(&d) = open.get(next) else {
                    return Ok(ResolvedExpr::failed(
                        ResolutionErrorKind::WrongArgumentCount {
                            name: agg.name,
                            expected: open.len(),
                            found: actuals.len(),
                        },
                    ));
                };
                d
            }
        };
        let Some(NodeKind::Variable(var)) = ast.kind(field) else {
            return Err(InternalError::NotADeclaration {
                node: field,
                expected: "field",
            });
        };
        let binding = match var.kind {
            VarKind::Param => match actual.qt.param.filter(|_| actual.qt.kind == QualKind::Param) {
                Some(value) => QualifiedType::param(value),
                None => return Ok(reject(RejectReason::NeedsParam { formal: var.name })),
            },
            _ if actual.qt.is_type() => aggregate::field_binding(match var.kind {
                VarKind::Type => QualifiedType::type_(actual.qt.ty),
                _ => QualifiedType::var(actual.qt.ty),
            }),
            _ => return Ok(reject(RejectReason::NeedsType { formal: var.name })),
        };
        subs.insert(field, binding);
    }

    let instance = aggregate::instance(ctx, agg.decl, &subs)?;
    Ok(ResolvedExpr::of(QualifiedType::type_(instance)))
}

/// Whether a variable of aggregate type `ty` can be declared without an
/// initializer.
pub(crate) fn default_initializable(ctx: &Context, ty: TypeId) -> Result<Outcome<()>, InternalError> {
    let Some(agg) = ctx.types().aggregate_type(ty) else {
        return Ok(Ok(()));
    };
    if ctx.reentry(&Frame::Fields(ty)).is_some()
        || ctx.reentry(&Frame::Signature(agg.decl)).is_some()
    {
        // Class fields hold references, so a class may contain itself.
        return Ok(if agg.kind == AggregateKind::Class {
            Ok(())
        } else {
            Err(ResolutionErrorKind::RecursiveDefinition { decl: agg.decl })
        });
    }
    if !agg.generic {
        let inits = user_initializers(ctx, agg.decl)?;
        if !inits.is_empty() {
            for decl in inits {
                if ctx.reentry(&Frame::Signature(decl)).is_some() {
                    continue;
                }
                let sig = ctx.signature(InitialSignature::get(ctx, decl)?.signature)?;
                if sig
                    .explicit_formals()
                    .iter()
                    .all(|f| f.has_default || f.variadic)
                {
                    return Ok(Ok(()));
                }
            }
            return Ok(Err(ResolutionErrorKind::NotDefaultInitializable { ty }));
        }
    }
    let sig = ctx.signature(default_init_signature(ctx, &agg)?)?;
    if sig.formals.iter().all(|f| f.has_default) {
        Ok(Ok(()))
    } else {
        Ok(Err(ResolutionErrorKind::NotDefaultInitializable { ty }))
    }
}
