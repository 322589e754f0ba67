//! Entry points for clients of the resolver.
//!
//! Every function here is a thin layer over the memoized queries: asking
//! twice returns the same `Arc`, and after an edit only the affected
//! queries re-run.

use std::sync::Arc;

use crest_diagnostic::Diagnostic;
use crest_ir::{Name, NodeId, NodeKind};
use crest_query::Query;
use crest_types::{
    display_qualified, QualifiedType, Signature, SignatureId, SignatureKind, Substitution,
};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::aggregate;
use crate::error::{InternalError, ResolutionError, ResolutionErrorKind};
use crate::instantiate::{GenericKey, Instantiated, Instantiation, InstantiationKey};
use crate::lookup::{LookupMode, LookupResult};
use crate::queries::{
    AggregateFields, InitialSignature, Instantiate, LookupKey, LookupQuery, ResolveBody,
    ResolveModule, ResolveModuleStmt,
};
use crate::result::{ResolutionResult, ResolvedCall, ResolvedExpr};
use crate::scope::Scope;
use crate::Context;

/// Resolve every top-level statement of `module`.
pub fn resolve_module(ctx: &Context, module: NodeId) -> Result<Arc<ResolutionResult>, InternalError> {
    ResolveModule::get(ctx, module)
}

/// Resolve independent modules in parallel.
pub fn resolve_modules(
    ctx: &Context,
    modules: &[NodeId],
) -> Result<Vec<Arc<ResolutionResult>>, InternalError> {
    modules
        .par_iter()
        .map(|&module| resolve_module(ctx, module))
        .collect()
}

/// Body of the function behind `signature`, instantiated with `subs` first
/// when it is non-empty.
pub fn resolve_function_body(
    ctx: &Context,
    signature: SignatureId,
    subs: &Substitution,
) -> Result<Arc<ResolutionResult>, InternalError> {
    if subs.is_empty() {
        return ResolveBody::get(ctx, signature);
    }
    let generic = ctx.signature(signature)?;
    let key = InstantiationKey {
        generic: match generic.kind {
            SignatureKind::Function => GenericKey::Function(generic.decl),
            SignatureKind::DefaultInit => GenericKey::Initializer(generic.decl),
        },
        subs: subs.clone(),
    };
    let instantiated = Instantiate::get(ctx, key)?
        .value
        .signature()
        .ok_or(InternalError::NotADeclaration {
            node: generic.decl,
            expected: "function",
        })?;
    ResolveBody::get(ctx, instantiated)
}

/// Body of `decl`, or `None` when the function is generic.
pub fn resolve_concrete_function(
    ctx: &Context,
    decl: NodeId,
) -> Result<Option<Arc<ResolutionResult>>, InternalError> {
    let info = InitialSignature::get(ctx, decl)?;
    if ctx.signature(info.signature)?.is_generic(ctx.types()) {
        return Ok(None);
    }
    ResolveBody::get(ctx, info.signature).map(Some)
}

/// Initial signature of a function or aggregate declaration.
pub fn signature_of(ctx: &Context, decl: NodeId) -> Result<Arc<Signature>, InternalError> {
    let info = InitialSignature::get(ctx, decl)?;
    ctx.signature(info.signature)
}

/// The scope introduced by `node`.
pub fn scope_for(ctx: &Context, node: NodeId) -> Result<Arc<Scope>, InternalError> {
    ctx.scope(node)
}

/// Lexical lookup of `name` from `scope`.
pub fn lookup(ctx: &Context, scope: NodeId, name: Name) -> Result<Arc<LookupResult>, InternalError> {
    LookupQuery::get(
        ctx,
        LookupKey {
            scope,
            name,
            mode: LookupMode::Lexical,
        },
    )
}

/// What the resolver recorded for `node`.
///
/// `None` for nodes with no table of their own: nodes inside generic
/// functions, formal type expressions and field initializers.
pub fn resolved_expr(ctx: &Context, node: NodeId) -> Result<Option<ResolvedExpr>, InternalError> {
    let ast = ctx.ast(node.file)?;
    if matches!(ast.kind(node), Some(NodeKind::Module { .. })) && ast.parent(node).is_none() {
        return Ok(resolve_module(ctx, node)?.get(node).cloned());
    }
    let mut child = node;
    for ancestor in ast.ancestors(node) {
        match ast.kind(ancestor) {
            Some(NodeKind::Function(_)) => {
                let Some(body) = resolve_concrete_function(ctx, ancestor)? else {
                    return Ok(None);
                };
                return Ok(body.get(node).cloned());
            }
            Some(NodeKind::Aggregate(_)) => {
                if child != node {
                    return Ok(None);
                }
                let ty = aggregate::declared_type(ctx, &ast, ancestor)?;
                if ctx.types().is_generic(ty) {
                    return Ok(None);
                }
                let info = AggregateFields::get(ctx, ty)?;
                return Ok(info
                    .fields
                    .iter()
                    .find(|f| f.decl == node)
                    .map(|f| ResolvedExpr::of(f.qt)));
            }
            Some(NodeKind::Module { .. }) => {
                return Ok(ResolveModuleStmt::get(ctx, child)?.get(node).cloned());
            }
            _ => child = ancestor,
        }
    }
    Ok(None)
}

pub fn type_of(ctx: &Context, node: NodeId) -> Result<Option<QualifiedType>, InternalError> {
    Ok(resolved_expr(ctx, node)?.map(|e| e.qt))
}

pub fn resolved_call(ctx: &Context, node: NodeId) -> Result<Option<ResolvedCall>, InternalError> {
    Ok(resolved_expr(ctx, node)?.and_then(|e| e.call))
}

/// Instantiations of `decl` made so far, in a stable order.
pub fn instantiations_of(ctx: &Context, decl: NodeId) -> Vec<Instantiation> {
    let types = ctx.types();
    let names = ctx.interner();
    let mut found: Vec<(Vec<(NodeId, String)>, Instantiation)> = ctx
        .registry
        .of(decl)
        .into_iter()
        .map(|inst| {
            let key = inst
                .key
                .subs
                .iter()
                .map(|(d, qt)| (d, display_qualified(types, names, qt)))
                .collect();
            (key, inst)
        })
        .collect();
    found.sort_by(|a, b| {
        a.1.key
            .generic
            .cmp(&b.1.key.generic)
            .then_with(|| a.0.cmp(&b.0))
    });
    found.into_iter().map(|(_, inst)| inst).collect()
}

pub fn diagnostics(ctx: &Context, errors: &[ResolutionError]) -> Vec<Diagnostic> {
    errors.iter().map(|e| e.to_diagnostic(ctx)).collect()
}

/// Every error in `module`: its statements, the signatures and bodies of
/// its functions and methods, the fields of its aggregates, nested modules,
/// and the bodies of generic functions instantiated along the way.
#[tracing::instrument(level = "debug", skip(ctx))]
pub fn check_module(ctx: &Context, module: NodeId) -> Result<Vec<ResolutionError>, InternalError> {
    let mut checker = Checker {
        ctx,
        module,
        errors: Vec::new(),
        seen: FxHashSet::default(),
    };
    checker.declarations()?;
    checker.instantiations()?;
    let mut errors = checker.errors;
    errors.sort_by_key(|e| (e.node, e.span.start));
    tracing::debug!(errors = errors.len(), "module checked");
    Ok(errors)
}

struct Checker<'c> {
    ctx: &'c Context,
    module: NodeId,
    errors: Vec<ResolutionError>,
    seen: FxHashSet<ResolutionError>,
}

impl Checker<'_> {
    fn extend(&mut self, errors: &[ResolutionError]) {
        for e in errors {
            if self.seen.insert(e.clone()) {
                self.errors.push(e.clone());
            }
        }
    }

    fn declarations(&mut self) -> Result<(), InternalError> {
        let ctx = self.ctx;
        let ast = ctx.ast(self.module.file)?;
        for (index, node) in ast.nodes().enumerate() {
            let id = NodeId::new(ast.file(), u32::try_from(index).unwrap_or(u32::MAX));
            if id != self.module && !ast.contains(self.module, id) {
                continue;
            }
            match &node.kind {
                NodeKind::Module { .. } => {
                    let result = resolve_module(ctx, id)?;
                    self.extend(result.errors());
                }
                NodeKind::Function(_) => {
                    let info = InitialSignature::get(ctx, id)?;
                    self.extend(&info.errors);
                    if let Some(body) = resolve_concrete_function(ctx, id)? {
                        self.extend(body.errors());
                    }
                }
                NodeKind::Aggregate(_) => {
                    let ty = aggregate::declared_type(ctx, &ast, id)?;
                    if !ctx.types().is_generic(ty) {
                        let info = AggregateFields::get(ctx, ty)?;
                        self.extend(&info.errors);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn contains(&self, decl: NodeId) -> Result<bool, InternalError> {
        if decl.file != self.module.file {
            return Ok(false);
        }
        let ast = self.ctx.ast(decl.file)?;
        Ok(ast.contains(self.module, decl))
    }

    /// Bodies and fields of instantiations of this module's generics,
    /// repeated until resolving them instantiates nothing new. A generic
    /// whose body stopped an unbounded chain is not walked again, since its
    /// later instantiations only continue that chain.
    fn instantiations(&mut self) -> Result<(), InternalError> {
        let ctx = self.ctx;
        let limit = ctx.config().max_instantiation_depth;
        let mut done: FxHashSet<InstantiationKey> = FxHashSet::default();
        let mut unbounded: FxHashSet<NodeId> = FxHashSet::default();
        for _ in 0..limit {
            let mut pending = Vec::new();
            for inst in ctx.registry.all() {
                let decl = inst.key.generic.decl();
                if !done.contains(&inst.key) && !unbounded.contains(&decl) && self.contains(decl)? {
                    pending.push(inst);
                }
            }
            if pending.is_empty() {
                return Ok(());
            }
            let mut stopped = Vec::new();
            for inst in pending {
                done.insert(inst.key.clone());
                let outcome = Instantiate::get(ctx, inst.key.clone())?;
                self.extend(&outcome.errors);
                match (inst.key.generic, outcome.value) {
                    (GenericKey::Function(decl), Instantiated::Signature(sig)) => {
                        if !ctx.signature(sig)?.is_generic(ctx.types()) {
                            let body = ResolveBody::get(ctx, sig)?;
                            self.extend(body.errors());
                            if body.chain_height() > limit {
                                stopped.push(decl);
                            }
                        }
                    }
                    (GenericKey::Aggregate(_), Instantiated::Type(ty)) => {
                        if !ctx.types().is_generic(ty) {
                            let info = AggregateFields::get(ctx, ty)?;
                            self.extend(&info.errors);
                        }
                    }
                    _ => {}
                }
            }
            unbounded.extend(stopped);
        }

        let unfinished: Vec<NodeId> = ctx
            .registry
            .all()
            .into_iter()
            .filter(|inst| !done.contains(&inst.key))
            .map(|inst| inst.key.generic.decl())
            .filter(|decl| !unbounded.contains(decl))
            .collect();
        for decl in unfinished {
            if self.contains(decl)? {
                self.extend(&[ResolutionError::new(
                    decl,
                    ctx.span_of(decl),
                    ResolutionErrorKind::UnboundedGenericRecursion { function: decl },
                )]);
            }
        }
        Ok(())
    }
}
