//! Name lookup over scopes, `use` directives and builtins.

use std::sync::Arc;

use crest_ir::{Name, NodeId, NodeKind, UseKind};
use crest_query::Query;
use crest_types::TypeId;
use smallvec::SmallVec;

use crate::error::InternalError;
use crate::queries::{LookupKey, LookupQuery, ModulesNamed};
use crate::Context;

/// What a name refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Decl(NodeId),
    /// A builtin type name such as `int` or `domain`.
    Builtin(TypeId),
}

impl Target {
    pub fn decl(self) -> Option<NodeId> {
        match self {
            Target::Decl(id) => Some(id),
            Target::Builtin(_) => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LookupMode {
    /// Walk outward from the scope, consulting `use` directives and
    /// finally builtins.
    Lexical,
    /// Only declarations made directly by the scope: module members after
    /// `M.`, aggregate members after `r.`.
    Members,
    /// Modules visible from the scope, then top-level modules of any file.
    ModuleName,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupResult {
    /// Innermost first; function overloads from every scope that has them.
    pub targets: SmallVec<[Target; 2]>,
    /// The innermost declaring scope has several non-overloadable matches.
    pub ambiguous: bool,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn decls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.targets.iter().filter_map(|t| t.decl())
    }

    /// The single target of an unambiguous, non-overloaded lookup.
    pub fn single(&self) -> Option<Target> {
        match self.targets.as_slice() {
            [only] if !self.ambiguous => Some(*only),
            _ => None,
        }
    }
}

/// Builtin type named `name`, if any.
pub(crate) fn builtin_type(ctx: &Context, name: Name) -> Option<TypeId> {
    let ty = match name {
        Name::INT => TypeId::INT,
        Name::UINT => TypeId::UINT,
        Name::REAL => TypeId::REAL,
        Name::BOOL => TypeId::BOOL,
        Name::STRING => TypeId::STRING,
        Name::BYTES => TypeId::BYTES,
        Name::NOTHING => TypeId::NOTHING,
        Name::VOID => TypeId::VOID,
        Name::LOCALE => TypeId::LOCALE,
        Name::RANGE => ctx.types().range(TypeId::INT),
        Name::DOMAIN => ctx.types().generic_domain(),
        _ => return None,
    };
    Some(ty)
}

pub(crate) fn is_function(ctx: &Context, decl: NodeId) -> Result<bool, InternalError> {
    let ast = ctx.ast(decl.file)?;
    Ok(matches!(ast.kind(decl), Some(NodeKind::Function(_))))
}

fn is_module(ctx: &Context, decl: NodeId) -> Result<bool, InternalError> {
    let ast = ctx.ast(decl.file)?;
    Ok(matches!(ast.kind(decl), Some(NodeKind::Module { .. })))
}

fn push_unique(out: &mut SmallVec<[NodeId; 2]>, decl: NodeId) {
    if !out.contains(&decl) {
        out.push(decl);
    }
}

/// Result for declarations found in one scope.
fn settle(ctx: &Context, decls: &[NodeId]) -> Result<LookupResult, InternalError> {
    let mut functions = 0;
    for &d in decls {
        if is_function(ctx, d)? {
            functions += 1;
        }
    }
    Ok(LookupResult {
        targets: decls.iter().map(|&d| Target::Decl(d)).collect(),
        ambiguous: functions != decls.len() && decls.len() > 1,
    })
}

pub(crate) fn lookup(
    ctx: &Context,
    scope: NodeId,
    name: Name,
    mode: LookupMode,
) -> Result<LookupResult, InternalError> {
    match mode {
        LookupMode::Members => settle(ctx, ctx.scope(scope)?.get(name)),
        LookupMode::ModuleName => lookup_module(ctx, scope, name),
        LookupMode::Lexical => lookup_lexical(ctx, scope, name),
    }
}

fn lookup_module(ctx: &Context, scope: NodeId, name: Name) -> Result<LookupResult, InternalError> {
    let mut cursor = Some(scope);
    while let Some(id) = cursor {
        let s = ctx.scope(id)?;
        let mut modules = SmallVec::<[NodeId; 2]>::new();
        for &decl in s.get(name) {
            if is_module(ctx, decl)? {
                modules.push(decl);
            }
        }
        if !modules.is_empty() {
            return settle(ctx, &modules);
        }
        cursor = s.parent;
    }
    let top_level = ModulesNamed::get(ctx, name)?;
    settle(ctx, &top_level)
}

/// Declarations of `name` brought into `scope` by its `use` directives.
fn used_decls(
    ctx: &Context,
    scope: &crate::scope::Scope,
    name: Name,
) -> Result<SmallVec<[NodeId; 2]>, InternalError> {
    let mut out = SmallVec::new();
    for directive in scope.uses() {
        let modules = LookupQuery::get(
            ctx,
            LookupKey {
                scope: scope.node,
                name: directive.target,
                mode: LookupMode::ModuleName,
            },
        )?;
        for module in modules.decls() {
            if directive.target == name {
                push_unique(&mut out, module);
            }
            if directive.kind == UseKind::Use {
                for &decl in ctx.scope(module)?.get(name) {
                    push_unique(&mut out, decl);
                }
            }
        }
    }
    Ok(out)
}

fn all_functions(ctx: &Context, decls: &[NodeId]) -> Result<bool, InternalError> {
    for &d in decls {
        if !is_function(ctx, d)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn lookup_lexical(ctx: &Context, scope: NodeId, name: Name) -> Result<LookupResult, InternalError> {
    let mut overloads = SmallVec::<[NodeId; 2]>::new();
    let mut cursor = Some(scope);
    while let Some(id) = cursor {
        let s = ctx.scope(id)?;
        let mut found: SmallVec<[NodeId; 2]> = s.get(name).iter().copied().collect();

        // Direct declarations shadow used ones, except that overloads merge.
        if all_functions(ctx, &found)? {
            let used = used_decls(ctx, &s, name)?;
            if found.is_empty() {
                found = used;
            } else {
                for d in used {
                    if is_function(ctx, d)? {
                        push_unique(&mut found, d);
                    }
                }
            }
        }

        if !found.is_empty() {
            if all_functions(ctx, &found)? {
                for d in found {
                    push_unique(&mut overloads, d);
                }
            } else if overloads.is_empty() {
                return settle(ctx, &found);
            } else {
                // A non-function shadows the overloads further out.
                break;
            }
        }
        cursor = s.parent;
    }

    if !overloads.is_empty() {
        return Ok(LookupResult {
            targets: overloads.into_iter().map(Target::Decl).collect(),
            ambiguous: false,
        });
    }
    Ok(LookupResult {
        targets: builtin_type(ctx, name).map(Target::Builtin).into_iter().collect(),
        ambiguous: false,
    })
}

/// Top-level modules named `name` across all files, in file order.
pub(crate) fn modules_named(ctx: &Context, name: Name) -> Result<Arc<[NodeId]>, InternalError> {
    let mut out = Vec::new();
    for file in ctx.file_ids().iter() {
        let ast = ctx.ast(*file)?;
        for &root in ast.roots() {
            if matches!(ast.kind(root), Some(NodeKind::Module { name: n, .. }) if *n == name) {
                out.push(root);
            }
        }
    }
    Ok(out.into())
}
