//! Memo reuse across edits, idempotence and parallel requests.

use crest_ir::{AstBuilder, FnSpec, Intent, NodeId};
use crest_query::{Database, EventKind};
use crest_resolve::{resolve_modules, type_of};
use crest_types::{QualifiedType, TypeId};
use pretty_assertions::assert_eq;

use crate::common::{assert_no_unknowns, Program};

/// `module M { proc identity(x) { return x; } var a = identity(1); var b = 2.5; }`
fn main_module(b: &mut AstBuilder<'_>) -> (Vec<NodeId>, (NodeId, NodeId)) {
    let x = b.formal("x", Intent::Default, None);
    let x_ref = b.ident("x");
    let ret = b.ret(Some(x_ref));
    let f = b.function("identity", FnSpec::new(vec![x]).body(vec![ret]));
    let one = b.int(1);
    let call = b.call_ident("identity", vec![one]);
    let a = b.var("a", call);
    let half = b.real(2.5);
    let c = b.var("b", half);
    let module = b.module("M", vec![f, a, c]);
    (vec![module], (module, a))
}

/// `module N { var n = <value>; }`
fn other_module(b: &mut AstBuilder<'_>, value: i64) -> (Vec<NodeId>, (NodeId, NodeId)) {
    let v = b.int(value);
    let n = b.var("n", v);
    let module = b.module("N", vec![n]);
    (vec![module], (module, n))
}

#[test]
fn editing_another_file_reuses_every_memo() {
    let p = Program::new();
    let (module, _) = p.file(0, main_module);
    p.file(1, |b| other_module(b, 1));
    let before = p.module(module);

    p.ctx.runtime().enable_logging();
    p.file(1, |b| {
        let s = b.string("changed");
        let n = b.var("n", s);
        let module = b.module("N", vec![n]);
        (vec![module], ())
    });
    let after = p.module(module);
    assert_eq!(*before, *after);

    let events = p.ctx.runtime().take_events();
    let executed: Vec<&str> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::WillExecute { .. }))
        .map(|e| e.kind.query())
        .collect();
    assert!(executed.is_empty(), "re-executed: {executed:?}");
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::DidValidateMemoizedValue { .. })));
}

#[test]
fn editing_a_file_updates_its_types() {
    let p = Program::new();
    let (_, a) = p.file(0, |b| {
        let one = b.int(1);
        let a = b.var("a", one);
        let module = b.module("M", vec![a]);
        (vec![module], (module, a))
    });
    assert_eq!(p.qt(a), QualifiedType::var(TypeId::INT));

    p.ctx.runtime().enable_logging();
    let (_, edited) = p.file(0, |b| {
        let s = b.string("s");
        let a = b.var("a", s);
        let module = b.module("M", vec![a]);
        (vec![module], (module, a))
    });
    assert_eq!(edited, a);
    assert_eq!(p.qt(a), QualifiedType::var(TypeId::STRING));
    assert!(p
        .ctx
        .runtime()
        .take_events()
        .iter()
        .any(|e| matches!(e.kind, EventKind::WillExecute { query: "resolve_module_stmt", .. })));
}

#[test]
fn loading_an_identical_tree_changes_nothing() {
    let p = Program::new();
    let (module, _) = p.file(0, main_module);
    let before = p.module(module);
    let (ast, _) = p.tree(0, main_module);
    assert!(!p.ctx.set_file(ast));

    p.ctx.runtime().enable_logging();
    let after = p.module(module);
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert!(p.ctx.runtime().take_events().is_empty());
}

#[test]
fn separate_sessions_agree() {
    let first = Program::new();
    let (module, a) = first.file(0, main_module);
    let second = Program::new();
    second.file(0, main_module);

    let left = first.module(module);
    let right = second.module(module);
    assert_eq!(*left, *right);
    assert!(left.errors().is_empty(), "{:?}", left.errors());
    assert_no_unknowns(&left);
    assert_eq!(first.qt(a), QualifiedType::var(TypeId::INT));
    assert_eq!(first.module(module), left);
}

#[test]
fn modules_resolve_in_parallel() {
    let p = Program::new();
    let (main, _) = p.file(0, main_module);
    let (other, n) = p.file(1, |b| other_module(b, 7));
    let results = resolve_modules(&p.ctx, &[main, other]).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(*results[0], *p.module(main));
    assert_eq!(*results[1], *p.module(other));
    assert_eq!(
        type_of(&p.ctx, n).unwrap(),
        Some(QualifiedType::var(TypeId::INT))
    );
}
