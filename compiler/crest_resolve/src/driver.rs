//! Query bodies for module statements, modules and function bodies.

use std::sync::Arc;

use crest_ir::{Ast, NodeId, NodeKind};
use crest_query::Query;
use crest_types::{QualifiedType, Signature, SignatureId, SignatureKind, Substitution};

use crate::context::Frame;
use crate::error::{InternalError, ResolutionErrorKind};
use crate::queries::ResolveModuleStmt;
use crate::resolver::Resolver;
use crate::result::{ResolutionResult, ResolvedExpr};
use crate::returns;
use crate::Context;

pub(crate) fn resolve_module_stmt(ctx: &Context, stmt: NodeId) -> Result<ResolutionResult, InternalError> {
    let _frame = ctx.push_frame(Frame::ModuleStmt(stmt));
    let ast = ctx.ast(stmt.file)?;
    let mut r = Resolver::new(ctx, ast, stmt, Substitution::empty());
    r.resolve(stmt)?;
    Ok(r.finish())
}

#[tracing::instrument(level = "debug", skip(ctx))]
pub(crate) fn resolve_module(ctx: &Context, module: NodeId) -> Result<ResolutionResult, InternalError> {
    let ast = ctx.ast(module.file)?;
    let Some(NodeKind::Module { body, .. }) = ast.kind(module) else {
        return Err(InternalError::NotADeclaration {
            node: module,
            expected: "module",
        });
    };
    let mut result = ResolutionResult::new(module);
    result.record(module, ResolvedExpr::of(QualifiedType::module()))?;
    for &stmt in body {
        let table = ResolveModuleStmt::get(ctx, stmt)?;
        result.absorb(&table)?;
    }
    Ok(result)
}

/// A resolver rooted at the signature's function with every formal already
/// typed as the signature says.
pub(crate) fn signature_resolver<'c>(
    ctx: &'c Context,
    ast: &Arc<Ast>,
    sig: &Signature,
) -> Result<Resolver<'c>, InternalError> {
    let mut r = Resolver::new(ctx, Arc::clone(ast), sig.decl, sig.substitution.clone());
    for formal in &sig.formals {
        if formal.decl == sig.decl {
            r.this_qt = Some(formal.qt);
        } else if !r.result.contains(formal.decl) {
            r.seed(formal.decl, formal.qt)?;
        }
    }
    Ok(r)
}

#[tracing::instrument(level = "debug", skip(ctx))]
pub(crate) fn resolve_body(ctx: &Context, sig_id: SignatureId) -> Result<ResolutionResult, InternalError> {
    let sig = ctx.signature(sig_id)?;
    let _frame = ctx.push_frame(Frame::Body {
        sig: sig_id,
        instantiated: sig.instantiated_from.is_some(),
    });
    if sig.kind == SignatureKind::DefaultInit || sig.is_generic(ctx.types()) {
        tracing::trace!("no body to resolve");
        return Ok(ResolutionResult::new(sig.decl));
    }
    let ast = ctx.ast(sig.decl.file)?;
    let Some(NodeKind::Function(fd)) = ast.kind(sig.decl) else {
        return Err(InternalError::NotADeclaration {
            node: sig.decl,
            expected: "function",
        });
    };

    let mut r = signature_resolver(ctx, &ast, &sig)?;
    let declared = match fd.return_type {
        Some(expr) => {
            let qt = r.resolve(expr)?;
            if qt.is_type() {
                Some(qt.ty)
            } else {
                if !qt.is_erroneous() {
                    r.report(expr, ResolutionErrorKind::ExpectedType);
                }
                None
            }
        }
        None => None,
    };
    if let Some(body) = fd.body {
        r.resolve(body)?;
    }
    let inferred = returns::infer(&mut r, sig.decl, fd, declared);
    let mut result = r.finish();
    result.set_inferred_return(inferred);
    result.set_chain_height(ctx.chain_height());
    tracing::debug!(nodes = result.len(), errors = result.errors().len(), "body resolved");
    Ok(result)
}

#[cfg(test)]
mod tests;
