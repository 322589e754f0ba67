#![allow(clippy::unwrap_used, clippy::expect_used)]

use crest_ir::{AstBuilder, FileId, FnSpec, Intent, StringInterner};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn module_scope_lists_declarations_and_uses() {
    let names = StringInterner::new();
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let one = b.int(1);
    let x = b.var("x", one);
    let f = b.function("f", FnSpec::new(vec![]).body(vec![]));
    let g = b.function("f", FnSpec::new(vec![]).body(vec![]));
    let using = b.use_("Other");
    let m = b.module("M", vec![x, f, g, using]);
    let ast = b.finish(vec![m]);

    let scope = build_scope(&ast, m).unwrap();
    assert_eq!(scope.get(names.intern("x")), &[x]);
    assert_eq!(scope.get(names.intern("f")), &[f, g]);
    assert!(scope.get(names.intern("missing")).is_empty());
    assert_eq!(scope.uses().len(), 1);
    assert_eq!(scope.uses()[0].target, names.intern("Other"));
    assert_eq!(scope.position(f), Some(1));
    assert!(scope.is_sequential());
    assert_eq!(scope.parent, None);
}

#[test]
fn function_scope_holds_formals_and_type_queries() {
    let names = StringInterner::new();
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let elt = b.type_query("t");
    let arr = b.array_type(None, Some(elt));
    let a = b.formal("a", Intent::Default, Some(arr));
    let n = b.formal("n", Intent::Param, None);
    let f = b.function("f", FnSpec::new(vec![a, n]).body(vec![]));
    let m = b.module("M", vec![f]);
    let ast = b.finish(vec![m]);

    let scope = build_scope(&ast, f).unwrap();
    assert_eq!(scope.get(names.intern("a")), &[a]);
    assert_eq!(scope.get(names.intern("n")), &[n]);
    assert_eq!(scope.get(names.intern("t")), &[elt]);
    assert_eq!(scope.parent, Some(m));
    assert!(!scope.is_sequential());
}

#[test]
fn enclosing_scope_skips_non_scope_nodes() {
    let names = StringInterner::new();
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let x = b.ident("x");
    let one = b.int(1);
    let sum = b.binary(crest_ir::OpKind::Add, x, one);
    let ret = b.ret(Some(sum));
    let f = b.function("f", FnSpec::new(vec![]).body(vec![ret]));
    let m = b.module("M", vec![f]);
    let ast = b.finish(vec![m]);

    let body = match ast.kind(f) {
        Some(NodeKind::Function(decl)) => decl.body.unwrap(),
        other => panic!("expected a function, got {other:?}"),
    };
    assert_eq!(enclosing_scope(&ast, x), Some(body));
    assert_eq!(enclosing_scope(&ast, body), Some(f));
    assert_eq!(enclosing_scope(&ast, f), Some(m));
}

#[test]
fn non_scope_nodes_are_rejected() {
    let names = StringInterner::new();
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let one = b.int(1);
    let m = b.module("M", vec![]);
    let ast = b.finish(vec![m]);
    assert!(matches!(
        build_scope(&ast, one),
        Err(InternalError::NotADeclaration { .. })
    ));
}

#[test]
fn redeclared_variables_conflict_but_overloads_do_not() {
    let names = StringInterner::new();
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let one = b.int(1);
    let x1 = b.var("x", one);
    let two = b.int(2);
    let x2 = b.var("x", two);
    let f = b.function("f", FnSpec::new(vec![]).body(vec![]));
    let g = b.function("f", FnSpec::new(vec![]).body(vec![]));
    let m = b.module("M", vec![x1, x2, f, g]);
    let ast = b.finish(vec![m]);

    let scope = build_scope(&ast, m).unwrap();
    let conflicts: Vec<_> = scope.conflicts().collect();
    assert_eq!(conflicts, vec![(names.intern("x"), &[x1, x2][..])]);
}
