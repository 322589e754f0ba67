//! Crest IR: names, node identities and the closed syntax tree consumed by
//! the resolver.
//!
//! The tree is produced elsewhere (a parser, or [`AstBuilder`] in tests and
//! embedders) and never mutated afterwards; every later phase addresses nodes
//! by [`NodeId`].

mod ast;
mod builder;
mod ids;
mod interner;
mod name;
mod span;
mod syntax;

pub use ast::{
    Actual, AggregateDecl, Ast, AstNode, FormalDecl, FunctionDecl, LoopStmt, NodeKind,
    VariableDecl,
};
pub use builder::{AstBuilder, FnSpec};
pub use ids::{FileId, NodeId};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::{Span, SpanError};
pub use syntax::{
    AggregateKind, FunctionKind, Intent, LoopKind, OpKind, ReturnIntent, UseKind, VarKind,
};
