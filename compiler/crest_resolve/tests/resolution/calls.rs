//! Overload selection among concrete candidates.

use crest_ir::{FnSpec, Intent, NodeId};
use crest_resolve::{resolved_call, signature_of, ResolutionErrorKind};
use crest_types::{QualifiedType, TypeId};
use pretty_assertions::assert_eq;

use crate::common::Program;

/// `proc pick(x: int) { return 1; }` and `proc pick(x: string) { return "a"; }`.
fn picks(b: &mut crest_ir::AstBuilder<'_>) -> (NodeId, NodeId) {
    let int = b.ident("int");
    let x = b.formal("x", Intent::Default, Some(int));
    let one = b.int(1);
    let ret = b.ret(Some(one));
    let by_int = b.function("pick", FnSpec::new(vec![x]).body(vec![ret]));

    let string = b.ident("string");
    let x = b.formal("x", Intent::Default, Some(string));
    let a = b.string("a");
    let ret = b.ret(Some(a));
    let by_string = b.function("pick", FnSpec::new(vec![x]).body(vec![ret]));
    (by_int, by_string)
}

#[test]
fn actual_types_pick_the_overload() {
    let p = Program::new();
    let (pick_int, pick_string, int_call, string_call) = p.file(0, |b| {
        let (pick_int, pick_string) = picks(b);
        let seven = b.int(7);
        let int_call = b.call_ident("pick", vec![seven]);
        let a = b.var("a", int_call);
        let s = b.string("s");
        let string_call = b.call_ident("pick", vec![s]);
        let c = b.var("c", string_call);
        let module = b.module("M", vec![pick_int, pick_string, a, c]);
        (vec![module], (pick_int, pick_string, int_call, string_call))
    });
    assert_eq!(p.qt(int_call), QualifiedType::value(TypeId::INT));
    assert_eq!(p.qt(string_call), QualifiedType::value(TypeId::STRING));

    let call = resolved_call(&p.ctx, int_call).unwrap().unwrap();
    assert_eq!(p.ctx.signature(call.signature).unwrap().decl, pick_int);
    let call = resolved_call(&p.ctx, string_call).unwrap().unwrap();
    assert_eq!(p.ctx.signature(call.signature).unwrap().decl, pick_string);
    assert_eq!(call.return_type, QualifiedType::value(TypeId::STRING));
}

#[test]
fn an_actual_no_overload_accepts_lists_both() {
    let p = Program::new();
    let (module, call, pick_int, pick_string) = p.file(0, |b| {
        let (pick_int, pick_string) = picks(b);
        let one = b.int(1);
        let two = b.int(2);
        let pair = b.tuple(vec![one, two]);
        let call = b.call_ident("pick", vec![pair]);
        let a = b.var("a", call);
        let module = b.module("M", vec![pick_int, pick_string, a]);
        (vec![module], (module, call, pick_int, pick_string))
    });
    let result = p.module(module);
    let Some(ResolutionErrorKind::NoMatchingCandidate { name, rejected }) =
        result.get(call).unwrap().failure.clone()
    else {
        panic!("expected no matching candidate, got {:?}", result.errors());
    };
    assert_eq!(name, p.name("pick"));
    let candidates: Vec<NodeId> = rejected.iter().map(|r| r.candidate).collect();
    assert_eq!(candidates, vec![pick_int, pick_string]);
    assert!(p.qt(call).is_erroneous());
}

#[test]
fn identical_candidates_are_ambiguous() {
    let p = Program::new();
    let (module, call, first, second) = p.file(0, |b| {
        let int = b.ident("int");
        let x = b.formal("x", Intent::Default, Some(int));
        let first = b.function("f", FnSpec::new(vec![x]).body(vec![]));
        let int = b.ident("int");
        let y = b.formal("y", Intent::Default, Some(int));
        let second = b.function("f", FnSpec::new(vec![y]).body(vec![]));
        let one = b.int(1);
        let call = b.call_ident("f", vec![one]);
        let module = b.module("M", vec![first, second, call]);
        (vec![module], (module, call, first, second))
    });
    let result = p.module(module);
    assert_eq!(
        result.get(call).unwrap().failure,
        Some(ResolutionErrorKind::AmbiguousCall {
            name: p.name("f"),
            candidates: vec![first, second],
        })
    );
}

#[test]
fn named_actuals_and_defaults_fill_formals() {
    let p = Program::new();
    let (f, call) = p.file(0, |b| {
        let int = b.ident("int");
        let x = b.formal("x", Intent::Default, Some(int));
        let zero = b.real(0.0);
        let real = b.ident("real");
        let scale = b.formal_with_default("scale", Intent::Default, Some(real), zero);
        let x_ref = b.ident("x");
        let ret = b.ret(Some(x_ref));
        let f = b.function("f", FnSpec::new(vec![x, scale]).body(vec![ret]));
        let callee = b.ident("f");
        let five = b.int(5);
        let call = b.call_named(callee, vec![(Some("x"), five)]);
        let a = b.var("a", call);
        (vec![b.module("M", vec![f, a])], (f, call))
    });
    assert_eq!(p.qt(call), QualifiedType::value(TypeId::INT));
    let sig = signature_of(&p.ctx, f).unwrap();
    assert_eq!(sig.formals.len(), 2);
    let resolved = resolved_call(&p.ctx, call).unwrap().unwrap();
    assert_eq!(resolved.formal_actuals.len(), 2);
    assert_eq!(resolved.formal_actuals[1].source, crest_resolve::ActualSource::Default);
}

#[test]
fn an_explicit_intent_beats_the_default_intent() {
    let p = Program::new();
    let (module, call, by_const_ref) = p.file(0, |b| {
        let int = b.ident("int");
        let x = b.formal("x", Intent::ConstRef, Some(int));
        let a = b.string("a");
        let ret = b.ret(Some(a));
        let by_const_ref = b.function("f", FnSpec::new(vec![x]).body(vec![ret]));

        let int = b.ident("int");
        let x = b.formal("x", Intent::Default, Some(int));
        let one = b.int(1);
        let ret = b.ret(Some(one));
        let by_default = b.function("f", FnSpec::new(vec![x]).body(vec![ret]));

        let seven = b.int(7);
        let v = b.var("v", seven);
        let v_ref = b.ident("v");
        let call = b.call_ident("f", vec![v_ref]);
        let r = b.var("r", call);
        let module = b.module("M", vec![by_default, by_const_ref, v, r]);
        (vec![module], (module, call, by_const_ref))
    });
    let result = p.module(module);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    let chosen = resolved_call(&p.ctx, call).unwrap().unwrap();
    assert_eq!(p.ctx.signature(chosen.signature).unwrap().decl, by_const_ref);
    assert_eq!(p.qt(call), QualifiedType::value(TypeId::STRING));
    assert_eq!(signature_of(&p.ctx, by_const_ref).unwrap().formals[0].intent, Intent::ConstRef);
}
