//! Shared setup: one interner, one context, files built in place.

use std::sync::Arc;

use crest_ir::{Ast, AstBuilder, FileId, Name, NodeId, SharedInterner};
use crest_resolve::{
    check_module, resolve_module, type_of, Context, ResolutionErrorKind, ResolutionResult,
    ResolverConfig,
};
use crest_types::QualifiedType;

pub struct Program {
    pub names: SharedInterner,
    pub ctx: Context,
}

impl Program {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        let names = SharedInterner::default();
        let ctx = Context::with_config(names.clone(), config);
        Program { names, ctx }
    }

    /// Build file `file` and load it. `build` returns the roots and whatever
    /// node ids the test wants to keep.
    pub fn file<T>(
        &self,
        file: u32,
        build: impl FnOnce(&mut AstBuilder<'_>) -> (Vec<NodeId>, T),
    ) -> T {
        let (ast, ids) = self.tree(file, build);
        self.ctx.set_file(ast);
        ids
    }

    /// Build a tree without loading it.
    pub fn tree<T>(
        &self,
        file: u32,
        build: impl FnOnce(&mut AstBuilder<'_>) -> (Vec<NodeId>, T),
    ) -> (Ast, T) {
        let mut b = AstBuilder::new(FileId::new(file), &self.names);
        let (roots, ids) = build(&mut b);
        (b.finish(roots), ids)
    }

    pub fn name(&self, text: &str) -> Name {
        self.names.intern(text)
    }

    pub fn module(&self, module: NodeId) -> Arc<ResolutionResult> {
        resolve_module(&self.ctx, module).unwrap()
    }

    pub fn qt(&self, node: NodeId) -> QualifiedType {
        type_of(&self.ctx, node)
            .unwrap()
            .unwrap_or_else(|| panic!("{node} has no recorded type"))
    }

    /// Kinds of every error `check_module` reports, in report order.
    pub fn error_kinds(&self, module: NodeId) -> Vec<ResolutionErrorKind> {
        check_module(&self.ctx, module)
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }
}

/// Every successfully resolved node has a known type.
pub fn assert_no_unknowns(result: &ResolutionResult) {
    for (node, expr) in result.iter() {
        if expr.failure.is_none() {
            assert!(!expr.qt.is_unknown(), "{node} resolved to an unknown type");
        }
    }
}
