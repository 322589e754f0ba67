//! Return types: declared, or inferred from the body's `return` statements.

use crest_ir::{Ast, FunctionDecl, Name, NodeId, NodeKind, ReturnIntent};
use crest_query::Query;
use crest_types::{
    ParamValue, QualKind, QualifiedType, Signature, SignatureId, SignatureKind, TypeId,
};

use crate::aggregate;
use crate::coerce::{can_convert, common_numeric};
use crate::context::{Frame, Reentry};
use crate::driver::signature_resolver;
use crate::error::{InternalError, ResolutionErrorKind};
use crate::queries::{ResolveBody, ReturnType};
use crate::resolver::{Outcome, Resolver};
use crate::Context;

fn function_decl(ast: &Ast, decl: NodeId) -> Result<&FunctionDecl, InternalError> {
    match ast.kind(decl) {
        Some(NodeKind::Function(fd)) => Ok(fd),
        _ => Err(InternalError::NotADeclaration {
            node: decl,
            expected: "function",
        }),
    }
}

fn is_initializer(sig: &Signature) -> bool {
    sig.is_method && sig.name == Name::INIT
}

/// Whether the return type comes from resolving the body.
fn needs_inference(ast: &Ast, fd: &FunctionDecl, sig: &Signature) -> bool {
    if sig.kind != SignatureKind::Function || is_initializer(sig) {
        return false;
    }
    let Some(body) = fd.body else {
        return false;
    };
    match fd.return_intent {
        ReturnIntent::Param | ReturnIntent::Type => true,
        _ => fd.return_type.is_none() && returns_value(ast, body),
    }
}

/// Whether `body` has a `return` with a value outside nested declarations.
fn returns_value(ast: &Ast, body: NodeId) -> bool {
    let mut pending = vec![body];
    while let Some(id) = pending.pop() {
        match ast.kind(id) {
            Some(NodeKind::Return(Some(_))) => return true,
            Some(NodeKind::Function(_) | NodeKind::Aggregate(_)) | None => {}
            Some(kind) => pending.extend(kind.children()),
        }
    }
    false
}

fn with_intent(intent: ReturnIntent, ty: TypeId) -> QualifiedType {
    match intent {
        ReturnIntent::Ref => QualifiedType::ref_(ty),
        ReturnIntent::ConstRef => QualifiedType::const_ref(ty),
        _ => QualifiedType::value(ty),
    }
}

pub(crate) fn return_type(ctx: &Context, sig_id: SignatureId) -> Result<QualifiedType, InternalError> {
    let _frame = ctx.push_frame(Frame::ReturnType(sig_id));
    let sig = ctx.signature(sig_id)?;
    if sig.kind == SignatureKind::DefaultInit {
        let ty = aggregate::instance(ctx, sig.decl, &sig.substitution)?;
        return Ok(QualifiedType::value(ty));
    }
    if is_initializer(&sig) {
        return Ok(sig
            .formals
            .first()
            .map_or_else(QualifiedType::erroneous, |this| QualifiedType::value(this.qt.ty)));
    }

    let ast = ctx.ast(sig.decl.file)?;
    let fd = function_decl(&ast, sig.decl)?;
    if needs_inference(&ast, fd, &sig) {
        let body = ResolveBody::get(ctx, sig_id)?;
        return Ok(body.inferred_return().unwrap_or_else(QualifiedType::erroneous));
    }
    let Some(declared) = fd.return_type else {
        return Ok(QualifiedType::value(TypeId::VOID));
    };
    let mut r = signature_resolver(ctx, &ast, &sig)?;
    r.speculative = true;
    let qt = r.resolve(declared)?;
    if !qt.is_type() {
        return Ok(QualifiedType::erroneous());
    }
    Ok(with_intent(fd.return_intent, qt.ty))
}

/// Return type of `sig_id` as seen from a call, or the recursion failure
/// to report on the call when inferring it would re-enter its own body.
pub(crate) fn call_return(
    ctx: &Context,
    sig_id: SignatureId,
) -> Result<Outcome<QualifiedType>, InternalError> {
    let sig = ctx.signature(sig_id)?;
    if sig.kind != SignatureKind::Function {
        return Ok(Ok(ReturnType::get(ctx, sig_id)?));
    }
    let ast = ctx.ast(sig.decl.file)?;
    if needs_inference(&ast, function_decl(&ast, sig.decl)?, &sig) {
        if sig.instantiated_from.is_some() {
            return instantiated_return(ctx, sig_id, &sig);
        }
        let frames = [
            Frame::Body {
                sig: sig_id,
                instantiated: false,
            },
            Frame::ReturnType(sig_id),
        ];
        if frames.iter().any(|f| ctx.reentry(f) == Some(Reentry::Cycle)) {
            tracing::debug!(function = %sig.decl, "return type depends on itself");
            return Ok(Err(ResolutionErrorKind::RecursiveReturnInference {
                function: sig.decl,
            }));
        }
    }
    Ok(Ok(ReturnType::get(ctx, sig_id)?))
}

/// Inferred return of an instantiated function.
///
/// Its body extends the caller's chain of instantiated bodies. A chain that
/// repeats a body or outgrows the limit unwinds to the body that started
/// it, which reports the call. Bodies inside the chain are never memoized
/// with the failure, and a memoized body carries its height, so the outcome
/// is the same whichever call resolves a body first.
fn instantiated_return(
    ctx: &Context,
    sig_id: SignatureId,
    sig: &Signature,
) -> Result<Outcome<QualifiedType>, InternalError> {
    let depth = ctx.chain_depth();
    let entered = ctx
        .reentry(&Frame::Body {
            sig: sig_id,
            instantiated: true,
        })
        .or_else(|| ctx.reentry(&Frame::ReturnType(sig_id)));
    let unbounded = match entered {
        Some(reentry) => {
            tracing::debug!(function = %sig.decl, ?reentry, "instantiation chain cannot grow");
            true
        }
        None => match ResolveBody::get(ctx, sig_id) {
            Ok(body) => {
                let reached = depth + body.chain_height();
                if reached > ctx.config().max_instantiation_depth {
                    true
                } else {
                    ctx.reach(reached);
                    false
                }
            }
            Err(InternalError::InstantiationTooDeep) => true,
            Err(e) => return Err(e),
        },
    };
    if !unbounded {
        match ReturnType::get(ctx, sig_id) {
            Ok(qt) => return Ok(Ok(qt)),
            Err(InternalError::InstantiationTooDeep) => {}
            Err(e) => return Err(e),
        }
    }
    if depth > 1 {
        return Err(InternalError::InstantiationTooDeep);
    }
    ctx.stop_chain();
    Ok(Err(ResolutionErrorKind::UnboundedGenericRecursion {
        function: sig.decl,
    }))
}

/// Combine the `return` statements collected by a body walk. `declared` is
/// the evaluated declared return type, if any.
pub(crate) fn infer(
    r: &mut Resolver<'_>,
    decl: NodeId,
    fd: &FunctionDecl,
    declared: Option<TypeId>,
) -> QualifiedType {
    let returns = std::mem::take(&mut r.returns);
    if returns.iter().any(|(_, qt)| qt.is_erroneous()) {
        return QualifiedType::erroneous();
    }
    match fd.return_intent {
        ReturnIntent::Param => infer_param(r, decl, &returns, declared),
        ReturnIntent::Type => infer_type(r, decl, &returns),
        intent => {
            let types = r.ctx.types();
            if let Some(ty) = declared {
                for &(node, qt) in &returns {
                    if !can_convert(types, qt, ty) {
                        r.report(
                            node,
                            ResolutionErrorKind::TypeMismatch {
                                expected: ty,
                                found: qt.ty,
                            },
                        );
                    }
                }
                return with_intent(intent, ty);
            }
            let Some(&(_, first)) = returns.first() else {
                return QualifiedType::value(TypeId::VOID);
            };
            if let Some(&(node, _)) = returns.iter().find(|(_, qt)| !qt.kind.is_value_like()) {
                r.report(node, ResolutionErrorKind::ExpectedValue);
                return QualifiedType::erroneous();
            }
            let mut ty = first.ty;
            for &(_, qt) in &returns[1..] {
                if qt.ty == ty {
                    continue;
                }
                match common_numeric(ty, qt.ty) {
                    Some(common) => ty = common,
                    None => {
                        r.report(decl, ResolutionErrorKind::InconsistentReturns);
                        return QualifiedType::erroneous();
                    }
                }
            }
            with_intent(intent, ty)
        }
    }
}

fn infer_param(
    r: &mut Resolver<'_>,
    decl: NodeId,
    returns: &[(NodeId, QualifiedType)],
    declared: Option<TypeId>,
) -> QualifiedType {
    let mut value: Option<ParamValue> = None;
    for &(node, qt) in returns {
        let Some(v) = qt.param.filter(|_| qt.kind == QualKind::Param) else {
            r.report(node, ResolutionErrorKind::ExpectedParam);
            return QualifiedType::erroneous();
        };
        let v = match declared {
            Some(ty) => match v.coerce(ty) {
                Some(c) => c,
                None => {
                    r.report(
                        node,
                        ResolutionErrorKind::TypeMismatch {
                            expected: ty,
                            found: qt.ty,
                        },
                    );
                    return QualifiedType::erroneous();
                }
            },
            None => v,
        };
        match value {
            Some(seen) if seen != v => {
                r.report(decl, ResolutionErrorKind::InconsistentReturns);
                return QualifiedType::erroneous();
            }
            _ => value = Some(v),
        }
    }
    match value {
        Some(v) => QualifiedType::param(v),
        None => {
            r.report(decl, ResolutionErrorKind::ExpectedParam);
            QualifiedType::erroneous()
        }
    }
}

fn infer_type(
    r: &mut Resolver<'_>,
    decl: NodeId,
    returns: &[(NodeId, QualifiedType)],
) -> QualifiedType {
    let mut found: Option<TypeId> = None;
    for &(node, qt) in returns {
        if !qt.is_type() {
            r.report(node, ResolutionErrorKind::ExpectedType);
            return QualifiedType::erroneous();
        }
        match found {
            Some(ty) if ty != qt.ty => {
                r.report(decl, ResolutionErrorKind::InconsistentReturns);
                return QualifiedType::erroneous();
            }
            _ => found = Some(qt.ty),
        }
    }
    match found {
        Some(ty) => QualifiedType::type_(ty),
        None => {
            r.report(decl, ResolutionErrorKind::ExpectedType);
            QualifiedType::erroneous()
        }
    }
}
