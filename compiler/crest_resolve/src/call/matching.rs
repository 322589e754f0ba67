//! Applicability of one candidate to one call site.

use std::sync::Arc;

use crest_ir::{Ast, Intent, NodeId, NodeKind};
use crest_query::Query;
use crest_types::{
    QualKind, QualifiedType, SigFormal, Signature, SignatureId, SignatureKind, Substitution,
    TypeData, TypeId, TypePool, WhereClause,
};

use super::rank::RankKey;
use super::{CallSite, Candidate};
use crate::aggregate;
use crate::coerce::{can_convert, matches_pattern};
use crate::context::Frame;
use crate::error::{InternalError, RejectReason};
use crate::instantiate::{GenericKey, InstantiationKey};
use crate::queries::{AggregateFields, Instantiate};
use crate::resolver::Resolver;
use crate::result::{ActualSource, FormalActual};
use crate::Context;

/// Where a formal's value comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Indices into the call's actuals; several only for a variadic formal.
    Actuals(Vec<usize>),
    Receiver,
    Default,
}

/// Outcome of passing one actual to one formal.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Pass {
    Exact,
    Converts,
    /// The formal is generic; the actual binds it to this.
    Instantiates(QualifiedType),
    Fails(RejectReason),
}

/// A candidate that survived, with its concrete signature.
#[derive(Clone, Debug)]
pub(crate) struct Applicable {
    pub candidate: NodeId,
    pub signature: SignatureId,
    pub instantiated_from: Option<SignatureId>,
    pub formal_actuals: Vec<FormalActual>,
    pub key: RankKey,
}

/// Assign every actual to a formal: named actuals first, then positional
/// ones in order, then defaults.
pub(crate) fn map_actuals(sig: &Signature, site: &CallSite) -> Result<Vec<Slot>, RejectReason> {
    let offset = usize::from(sig.is_method);
    let arity = || RejectReason::Arity {
        expected: sig.explicit_formals().len(),
        found: site.actuals.len(),
    };
    let mut slots: Vec<Option<Slot>> = vec![None; sig.formals.len()];
    if sig.is_method {
        if site.receiver.is_none() {
            return Err(RejectReason::MissingReceiver);
        }
        slots[0] = Some(Slot::Receiver);
    }

    for (i, actual) in site.actuals.iter().enumerate() {
        let Some(name) = actual.name else { continue };
        let Some(j) = (offset..sig.formals.len()).find(|&j| sig.formals[j].name == name) else {
            return Err(RejectReason::UnknownNamedActual(name));
        };
        if slots[j].is_some() {
            return Err(RejectReason::DuplicateActual(name));
        }
        slots[j] = Some(Slot::Actuals(vec![i]));
    }

    let mut positional = site
        .actuals
        .iter()
        .enumerate()
        .filter(|(_, a)| a.name.is_none())
        .map(|(i, _)| i);
    let mut next = offset;
    while let Some(i) = positional.next() {
        while slots.get(next).is_some_and(Option::is_some) {
            next += 1;
        }
        let Some(formal) = sig.formals.get(next) else {
            return Err(arity());
        };
        if formal.variadic {
            let mut all = vec![i];
            all.extend(positional.by_ref());
            slots[next] = Some(Slot::Actuals(all));
            break;
        }
        slots[next] = Some(Slot::Actuals(vec![i]));
    }

    slots
        .into_iter()
        .zip(&sig.formals)
        .map(|(slot, formal)| match slot {
            Some(slot) => Ok(slot),
            None if formal.variadic => Ok(Slot::Actuals(Vec::new())),
            None if formal.has_default => Ok(Slot::Default),
            None => Err(arity()),
        })
        .collect()
}

/// Whether `actual` can be passed to `formal`, and how.
pub(crate) fn can_pass(types: &TypePool, formal: &SigFormal, actual: QualifiedType) -> Pass {
    let name = formal.name;
    let mismatch = Pass::Fails(RejectReason::TypeMismatch {
        formal: name,
        expected: formal.qt.ty,
        found: actual.ty,
    });
    match formal.intent {
        Intent::Type => {
            if !actual.is_type() {
                Pass::Fails(RejectReason::NeedsType { formal: name })
            } else if actual.ty == formal.qt.ty {
                Pass::Exact
            } else if matches_pattern(types, actual.ty, formal.qt.ty) {
                Pass::Instantiates(QualifiedType::type_(actual.ty))
            } else {
                mismatch
            }
        }
        Intent::Param => {
            let Some(value) = actual.param.filter(|_| actual.kind == QualKind::Param) else {
                return Pass::Fails(RejectReason::NeedsParam { formal: name });
            };
            let coerced = if formal.qt.ty == TypeId::ANY {
                Some(value)
            } else {
                value.coerce(formal.qt.ty)
            };
            match (formal.qt.param, coerced) {
                (Some(bound), _) if bound == value => Pass::Exact,
                (Some(bound), Some(c)) if bound == c => Pass::Converts,
                (None, Some(c)) => Pass::Instantiates(QualifiedType::param(c)),
                _ => mismatch,
            }
        }
        intent => {
            if !actual.kind.is_value_like() {
                mismatch
            } else if intent.needs_lvalue() && !actual.kind.is_lvalue() {
                Pass::Fails(RejectReason::NeedsLvalue { formal: name })
            } else if types.is_generic(formal.qt.ty) {
                if matches_pattern(types, actual.ty, formal.qt.ty) {
                    Pass::Instantiates(QualifiedType::new(formal.qt.kind, actual.ty))
                } else {
                    mismatch
                }
            } else if actual.ty == formal.qt.ty {
                Pass::Exact
            } else if intent.allows_conversion() && can_convert(types, actual, formal.qt.ty) {
                Pass::Converts
            } else {
                mismatch
            }
        }
    }
}

/// Check `candidate` against the call, instantiating it when generic.
pub(crate) fn evaluate(
    ctx: &Context,
    candidate: Candidate,
    site: &CallSite,
) -> Result<Result<Applicable, RejectReason>, InternalError> {
    let types = ctx.types();
    let generic_sig = ctx.signature(candidate.signature)?;
    let slots = match map_actuals(&generic_sig, site) {
        Ok(slots) => slots,
        Err(reason) => return Ok(Err(reason)),
    };

    let (signature, instantiated_from) = if generic_sig.is_generic(types) {
        match instantiate_candidate(ctx, &generic_sig, site, &slots)? {
            Ok(id) => (id, Some(candidate.signature)),
            Err(reason) => return Ok(Err(reason)),
        }
    } else if generic_sig.where_satisfied() {
        (candidate.signature, None)
    } else {
        return Ok(Err(RejectReason::WhereClauseFalse));
    };

    let sig = ctx.signature(signature)?;
    let mut formal_actuals = Vec::with_capacity(sig.formals.len());
    let mut conversions = 0;
    for (index, (formal, slot)) in sig.formals.iter().zip(&slots).enumerate() {
        let (source, converts) = match slot {
            Slot::Default => (ActualSource::Default, false),
            Slot::Receiver => {
                let Some(receiver) = site.receiver else {
                    return Ok(Err(RejectReason::MissingReceiver));
                };
                match settle(types, formal, receiver.qt) {
                    Ok(converts) => (ActualSource::Receiver, converts),
                    Err(reason) => return Ok(Err(reason)),
                }
            }
            Slot::Actuals(indices) => {
                let element_types = variadic_elements(types, formal, indices.len());
                let mut converts = false;
                for (k, &i) in indices.iter().enumerate() {
                    let checked = match &element_types {
                        Some(elts) => {
                            let element = SigFormal {
                                qt: QualifiedType::new(formal.qt.kind, elts[k]),
                                variadic: false,
                                ..formal.clone()
                            };
                            settle(types, &element, site.actuals[i].qt)
                        }
                        None => settle(types, formal, site.actuals[i].qt),
                    };
                    match checked {
                        Ok(c) => converts |= c,
                        Err(reason) => return Ok(Err(reason)),
                    }
                }
                let nodes = indices.iter().map(|&i| site.actuals[i].node).collect();
                (ActualSource::Actuals(nodes), converts)
            }
        };
        conversions += usize::from(converts);
        formal_actuals.push(FormalActual {
            formal: index,
            source,
            converts,
        });
    }

    let key = RankKey {
        generic_bindings: generic_sig
            .formals
            .iter()
            .filter(|f| f.is_generic(types))
            .count(),
        conversions,
        loose_intents: sig
            .formals
            .iter()
            .filter(|f| f.intent == Intent::Default)
            .count(),
        where_absent: generic_sig.where_clause == WhereClause::None,
    };
    Ok(Ok(Applicable {
        candidate: candidate.decl,
        signature,
        instantiated_from,
        formal_actuals,
        key,
    }))
}

/// Passing against a concrete formal: `Ok(true)` when it converts.
fn settle(types: &TypePool, formal: &SigFormal, actual: QualifiedType) -> Result<bool, RejectReason> {
    match can_pass(types, formal, actual) {
        Pass::Exact => Ok(false),
        Pass::Converts => Ok(true),
        Pass::Instantiates(_) => Err(RejectReason::StillGeneric),
        Pass::Fails(reason) => Err(reason),
    }
}

/// Element types of an instantiated variadic formal.
fn variadic_elements(types: &TypePool, formal: &SigFormal, count: usize) -> Option<Box<[TypeId]>> {
    if !formal.variadic {
        return None;
    }
    match types.get(formal.qt.ty) {
        TypeData::Tuple(elts) if elts.len() == count => Some(elts),
        _ => Some(vec![formal.qt.ty; count].into_boxed_slice()),
    }
}

/// Bind the generic formals of `sig` from the call's actuals, left to
/// right, and instantiate it.
fn instantiate_candidate(
    ctx: &Context,
    sig: &Signature,
    site: &CallSite,
    slots: &[Slot],
) -> Result<Result<SignatureId, RejectReason>, InternalError> {
    let types = ctx.types();
    let ast = ctx.ast(sig.decl.file)?;
    let default_init = sig.kind == SignatureKind::DefaultInit;
    let mut trial = Resolver::new(ctx, Arc::clone(&ast), sig.decl, Substitution::empty());
    trial.speculative = true;
    let mut subs = Substitution::empty();

    for (index, (formal, slot)) in sig.formals.iter().zip(slots).enumerate() {
        let is_this = sig.is_method && index == 0;
        trial.subs = subs.clone();
        let pattern = if is_this {
            formal.qt
        } else if default_init {
            if formal.is_generic(types) && !subs.is_empty() {
                field_pattern(ctx, &ast, sig.decl, &subs, formal.decl)?.unwrap_or(formal.qt)
            } else {
                formal.qt
            }
        } else {
            trial.resolve(formal.decl)?
        };
        let trial_formal = SigFormal {
            qt: pattern,
            ..formal.clone()
        };

        let binding = match slot {
            Slot::Receiver => {
                let Some(receiver) = site.receiver else {
                    return Ok(Err(RejectReason::MissingReceiver));
                };
                match can_pass(types, &trial_formal, receiver.qt) {
                    Pass::Instantiates(b) => Some(b),
                    Pass::Fails(reason) => return Ok(Err(reason)),
                    Pass::Exact | Pass::Converts => None,
                }
            }
            Slot::Actuals(indices) if formal.variadic => {
                let element = SigFormal {
                    variadic: false,
                    ..trial_formal.clone()
                };
                let mut elts = Vec::with_capacity(indices.len());
                for &i in indices {
                    match can_pass(types, &element, site.actuals[i].qt) {
                        Pass::Exact | Pass::Converts => elts.push(pattern.ty),
                        Pass::Instantiates(b) => elts.push(b.ty),
                        Pass::Fails(reason) => return Ok(Err(reason)),
                    }
                }
                Some(QualifiedType::new(pattern.kind, types.tuple(elts)))
            }
            Slot::Actuals(indices) => {
                let Some(&i) = indices.first() else { continue };
                let actual = site.actuals[i].qt;
                match can_pass(types, &trial_formal, actual) {
                    Pass::Instantiates(b) => {
                        if let Some(expr) = formal_type_expr(&ast, formal.decl) {
                            bind_queries(&ast, types, &mut subs, expr, actual.ty);
                        }
                        Some(b)
                    }
                    Pass::Fails(reason) => return Ok(Err(reason)),
                    Pass::Exact | Pass::Converts => None,
                }
            }
            Slot::Default if trial_formal.is_generic(types) => default_binding(&mut trial, formal, pattern)?,
            Slot::Default => None,
        };

        match binding {
            Some(b) => {
                let b = if default_init {
                    aggregate::field_binding(b)
                } else {
                    b
                };
                subs.insert(formal.decl, b);
                if is_this {
                    trial.this_qt = Some(b);
                }
            }
            None if is_this => trial.this_qt = Some(pattern),
            None => {}
        }
    }

    let generic = if default_init {
        GenericKey::Initializer(sig.decl)
    } else {
        GenericKey::Function(sig.decl)
    };
    let key = InstantiationKey { generic, subs };
    if ctx.reentry(&Frame::Instantiate(key.clone())).is_some() {
        return Ok(Err(RejectReason::StillGeneric));
    }
    let outcome = Instantiate::get(ctx, key)?;
    let Some(id) = outcome.value.signature() else {
        return Err(InternalError::NotADeclaration {
            node: sig.decl,
            expected: "function",
        });
    };
    let inst = ctx.signature(id)?;
    if !inst.where_satisfied() {
        return Ok(Err(RejectReason::WhereClauseFalse));
    }
    if inst.is_generic(types) {
        return Ok(Err(RejectReason::StillGeneric));
    }
    Ok(Ok(id))
}

fn formal_type_expr(ast: &Ast, decl: NodeId) -> Option<NodeId> {
    match ast.kind(decl) {
        Some(NodeKind::Formal(f)) => f.type_expr,
        _ => None,
    }
}

/// Bind the `?t` queries of a formal type expression against the actual
/// type they were matched with.
fn bind_queries(ast: &Ast, types: &TypePool, subs: &mut Substitution, expr: NodeId, actual: TypeId) {
    match ast.kind(expr) {
        Some(NodeKind::TypeQuery(_)) => {
            if !subs.contains(expr) {
                subs.insert(expr, QualifiedType::type_(actual));
            }
        }
        Some(NodeKind::ArrayType { domain, element }) => {
            if let Some((dom, elt)) = types.array_parts(actual) {
                if let Some(d) = domain {
                    bind_queries(ast, types, subs, *d, dom);
                }
                if let Some(e) = element {
                    bind_queries(ast, types, subs, *e, elt);
                }
            }
        }
        Some(NodeKind::Tuple(elems)) => {
            if let TypeData::Tuple(tys) = types.get(actual) {
                for (&e, &t) in elems.iter().zip(tys.iter()) {
                    bind_queries(ast, types, subs, e, t);
                }
            }
        }
        _ => {}
    }
}

/// Field pattern of a default initializer once the earlier fields are
/// bound, as in `record R { type t; var x: t; }`.
fn field_pattern(
    ctx: &Context,
    ast: &Ast,
    decl: NodeId,
    subs: &Substitution,
    field: NodeId,
) -> Result<Option<QualifiedType>, InternalError> {
    let ty = aggregate::instantiate_type(ctx, ast, decl, subs)?;
    if ctx.reentry(&Frame::Fields(ty)).is_some() {
        return Ok(None);
    }
    let info = AggregateFields::get(ctx, ty)?;
    Ok(info
        .fields
        .iter()
        .find(|f| f.decl == field)
        .map(|f| match f.qt.kind {
            QualKind::Type | QualKind::Param => f.qt,
            _ => QualifiedType::const_var(f.qt.ty),
        }))
}

/// Binding of a generic formal left to its default.
fn default_binding(
    trial: &mut Resolver<'_>,
    formal: &SigFormal,
    pattern: QualifiedType,
) -> Result<Option<QualifiedType>, InternalError> {
    let ast = Arc::clone(&trial.ast);
    let default = match ast.kind(formal.decl) {
        Some(NodeKind::Formal(f)) => f.default,
        Some(NodeKind::Variable(v)) => v.init,
        _ => None,
    };
    let Some(default) = default else {
        return Ok(None);
    };
    let qt = trial.resolve(default)?;
    if qt.is_erroneous() {
        return Ok(None);
    }
    Ok(match formal.intent {
        Intent::Type if qt.is_type() => Some(QualifiedType::type_(qt.ty)),
        Intent::Type => None,
        Intent::Param => qt
            .param
            .map(|v| QualifiedType::param(v.coerce(pattern.ty).unwrap_or(v))),
        _ => Some(QualifiedType::new(pattern.kind, qt.ty)),
    })
}
