//! Instantiation of generic functions and records.

use crest_ir::{FnSpec, Intent, NodeId, OpKind, ReturnIntent, VarKind};
use crest_resolve::{
    instantiations_of, resolved_call, GenericKey, ResolutionErrorKind, ResolverConfig,
};
use crest_types::{ParamValue, QualifiedType, TypeId};
use pretty_assertions::assert_eq;

use crate::common::Program;

/// `proc identity(x) { return x; }`
fn identity(b: &mut crest_ir::AstBuilder<'_>) -> NodeId {
    let x = b.formal("x", Intent::Default, None);
    let x_ref = b.ident("x");
    let ret = b.ret(Some(x_ref));
    b.function("identity", FnSpec::new(vec![x]).body(vec![ret]))
}

#[test]
fn equal_substitutions_share_one_instantiation() {
    let p = Program::new();
    let (f, first, second, third) = p.file(0, |b| {
        let f = identity(b);
        let one = b.int(1);
        let first = b.call_ident("identity", vec![one]);
        let a = b.var("a", first);
        let two = b.int(2);
        let second = b.call_ident("identity", vec![two]);
        let c = b.var("c", second);
        let s = b.string("s");
        let third = b.call_ident("identity", vec![s]);
        let d = b.var("d", third);
        (vec![b.module("M", vec![f, a, c, d])], (f, first, second, third))
    });
    assert_eq!(p.qt(first), QualifiedType::value(TypeId::INT));
    assert_eq!(p.qt(third), QualifiedType::value(TypeId::STRING));

    let by_one = resolved_call(&p.ctx, first).unwrap().unwrap();
    let by_two = resolved_call(&p.ctx, second).unwrap().unwrap();
    assert_eq!(by_one.signature, by_two.signature);

    let made = instantiations_of(&p.ctx, f);
    assert_eq!(made.len(), 2);
    assert!(made
        .iter()
        .all(|inst| inst.key.generic == GenericKey::Function(f)));
    let x = p.ctx.signature(by_one.signature).unwrap().formals[0].decl;
    assert!(made
        .iter()
        .any(|inst| inst.key.subs.get(x) == Some(QualifiedType::const_var(TypeId::INT))));
}

/// `proc g(param b: bool) where b` returns an int; `where !b` a string.
#[test]
fn where_clauses_choose_by_param_value() {
    let p = Program::new();
    let (on_true, on_false, yes, no) = p.file(0, |b| {
        let overload = |b: &mut crest_ir::AstBuilder<'_>, negate: bool, value: NodeId| {
            let boolean = b.ident("bool");
            let flag = b.formal("b", Intent::Param, Some(boolean));
            let flag_ref = b.ident("b");
            let cond = if negate {
                b.unary(OpKind::Not, flag_ref)
            } else {
                flag_ref
            };
            let ret = b.ret(Some(value));
            b.function("g", FnSpec::new(vec![flag]).where_(cond).body(vec![ret]))
        };
        let one = b.int(1);
        let on_true = overload(b, false, one);
        let s = b.string("s");
        let on_false = overload(b, true, s);
        let t = b.bool(true);
        let yes = b.call_ident("g", vec![t]);
        let a = b.var("a", yes);
        let f = b.bool(false);
        let no = b.call_ident("g", vec![f]);
        let c = b.var("c", no);
        let module = b.module("M", vec![on_true, on_false, a, c]);
        (vec![module], (on_true, on_false, yes, no))
    });
    assert_eq!(p.qt(yes), QualifiedType::value(TypeId::INT));
    assert_eq!(p.qt(no), QualifiedType::value(TypeId::STRING));

    let chosen = |call| {
        let call = resolved_call(&p.ctx, call).unwrap().unwrap();
        p.ctx.signature(call.signature).unwrap().decl
    };
    assert_eq!(chosen(yes), on_true);
    assert_eq!(chosen(no), on_false);
}

#[test]
fn param_functions_fold_into_param_expressions() {
    let p = Program::new();
    let (module, sum) = p.file(0, |b| {
        let two = b.int(2);
        let ret = b.ret(Some(two));
        let f = b.function(
            "two",
            FnSpec::new(vec![])
                .return_intent(ReturnIntent::Param)
                .body(vec![ret]),
        );
        let call = b.call_ident("two", vec![]);
        let one = b.int(1);
        let sum = b.binary(OpKind::Add, call, one);
        let three = b.var_decl(VarKind::Param, "three", None, Some(sum));
        let module = b.module("M", vec![f, three]);
        (vec![module], (module, sum))
    });
    let result = p.module(module);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(p.qt(sum), QualifiedType::param(ParamValue::Int(3)));
}

#[test]
fn generic_record_values_share_their_type() {
    let p = Program::new();
    let (rec, first, second) = p.file(0, |b| {
        let x = b.var_decl(VarKind::Var, "x", None, None);
        let rec = b.record("R", vec![x]);
        let one = b.int(1);
        let first = b.call_ident("R", vec![one]);
        let a = b.var("a", first);
        let two = b.int(2);
        let second = b.call_ident("R", vec![two]);
        let c = b.var("c", second);
        (vec![b.module("M", vec![rec, a, c])], (rec, first, second))
    });
    let ty = p.qt(first);
    assert_eq!(p.qt(second), ty);
    assert_eq!(p.ctx.types().aggregate_type(ty.ty).unwrap().decl, rec);

    let initializers = instantiations_of(&p.ctx, rec)
        .into_iter()
        .filter(|inst| inst.key.generic == GenericKey::Initializer(rec))
        .count();
    assert_eq!(initializers, 1);
}

#[test]
fn self_instantiation_is_unbounded_recursion() {
    let p = Program::new();
    let (module, f) = p.file(0, |b| {
        let x = b.formal("x", Intent::Default, None);
        let x_ref = b.ident("x");
        let again = b.call_ident("spin", vec![x_ref]);
        let ret = b.ret(Some(again));
        let f = b.function("spin", FnSpec::new(vec![x]).body(vec![ret]));
        let one = b.int(1);
        let call = b.call_ident("spin", vec![one]);
        let a = b.var("a", call);
        let module = b.module("M", vec![f, a]);
        (vec![module], (module, f))
    });
    let kinds = p.error_kinds(module);
    assert!(
        kinds.contains(&ResolutionErrorKind::UnboundedGenericRecursion { function: f }),
        "{kinds:?}"
    );
}

#[test]
fn growing_instantiations_stop_at_the_depth_limit() {
    let p = Program::new();
    let (module, f) = p.file(0, |b| {
        let x = b.formal("x", Intent::Default, None);
        let x_ref = b.ident("x");
        let wrapped = b.tuple(vec![x_ref]);
        let again = b.call_ident("nest", vec![wrapped]);
        let ret = b.ret(Some(again));
        let f = b.function("nest", FnSpec::new(vec![x]).body(vec![ret]));
        let one = b.int(1);
        let call = b.call_ident("nest", vec![one]);
        let a = b.var("a", call);
        let module = b.module("M", vec![f, a]);
        (vec![module], (module, f))
    });
    let kinds = p.error_kinds(module);
    assert!(
        kinds.contains(&ResolutionErrorKind::UnboundedGenericRecursion { function: f }),
        "{kinds:?}"
    );
}

#[test]
fn a_concrete_function_inferring_from_itself_is_reported() {
    let p = Program::new();
    let (module, f) = p.file(0, |b| {
        let int = b.ident("int");
        let n = b.formal("n", Intent::Default, Some(int));
        let n_ref = b.ident("n");
        let again = b.call_ident("loop_forever", vec![n_ref]);
        let ret = b.ret(Some(again));
        let f = b.function("loop_forever", FnSpec::new(vec![n]).body(vec![ret]));
        let module = b.module("M", vec![f]);
        (vec![module], (module, f))
    });
    assert_eq!(
        p.error_kinds(module),
        vec![ResolutionErrorKind::RecursiveReturnInference { function: f }]
    );
}

/// `proc a(x) { return b(x); }` through `d(x) { return x; }`, then
/// `var va = a(1); var vc = c(1);` with the statements in either order.
fn chain_program(c_first: bool) -> (Program, NodeId, NodeId, NodeId, NodeId) {
    let p = Program::with_config(ResolverConfig::default().with_max_instantiation_depth(3));
    let (module, va, vc, b_decl) = p.file(0, |b| {
        let mut fns = Vec::new();
        for (name, next) in [("a", Some("b")), ("b", Some("c")), ("c", Some("d")), ("d", None)] {
            let x = b.formal("x", Intent::Default, None);
            let x_ref = b.ident("x");
            let value = match next {
                Some(callee) => b.call_ident(callee, vec![x_ref]),
                None => x_ref,
            };
            let ret = b.ret(Some(value));
            fns.push(b.function(name, FnSpec::new(vec![x]).body(vec![ret])));
        }
        let one = b.int(1);
        let va = b.call_ident("a", vec![one]);
        let a_var = b.var("va", va);
        let one = b.int(1);
        let vc = b.call_ident("c", vec![one]);
        let c_var = b.var("vc", vc);
        let b_decl = fns[1];
        let mut stmts = fns;
        if c_first {
            stmts.extend([c_var, a_var]);
        } else {
            stmts.extend([a_var, c_var]);
        }
        let module = b.module("M", stmts);
        (vec![module], (module, va, vc, b_decl))
    });
    (p, module, va, vc, b_decl)
}

#[test]
fn depth_limit_outcome_does_not_depend_on_statement_order() {
    let (a_first, module, va, vc, b_decl) = chain_program(false);
    let (c_first, other_module, other_va, other_vc, _) = chain_program(true);

    assert_eq!(a_first.qt(vc), QualifiedType::value(TypeId::INT));
    assert_eq!(c_first.qt(other_vc), QualifiedType::value(TypeId::INT));
    assert!(a_first.qt(va).is_erroneous());
    assert!(c_first.qt(other_va).is_erroneous());

    let kinds = a_first.error_kinds(module);
    assert_eq!(kinds, c_first.error_kinds(other_module));
    assert!(
        kinds.contains(&ResolutionErrorKind::UnboundedGenericRecursion { function: b_decl }),
        "{kinds:?}"
    );
}

#[test]
fn a_chain_within_the_limit_resolves() {
    let (p, _, _, vc, _) = chain_program(true);
    let call = resolved_call(&p.ctx, vc).unwrap().unwrap();
    assert_eq!(call.return_type, QualifiedType::value(TypeId::INT));
}

/// `proc walk(n: int) { if n > 0 { walk(n - 1); } }`, concrete or generic.
fn walk(b: &mut crest_ir::AstBuilder<'_>, typed: bool) -> NodeId {
    let ty = typed.then(|| b.ident("int"));
    let n = b.formal("n", Intent::Default, ty);
    let n_ref = b.ident("n");
    let zero = b.int(0);
    let cond = b.binary(OpKind::Gt, n_ref, zero);
    let n_ref = b.ident("n");
    let one = b.int(1);
    let less = b.binary(OpKind::Sub, n_ref, one);
    let again = b.call_ident("walk", vec![less]);
    let branch = b.if_(cond, vec![again], None);
    b.function("walk", FnSpec::new(vec![n]).body(vec![branch]))
}

#[test]
fn recursive_procedures_without_a_value_are_not_inference_cycles() {
    let p = Program::new();
    let (module, call) = p.file(0, |b| {
        let f = walk(b, true);
        let three = b.int(3);
        let call = b.call_ident("walk", vec![three]);
        let module = b.module("M", vec![f, call]);
        (vec![module], (module, call))
    });
    assert_eq!(p.error_kinds(module), vec![]);
    assert_eq!(p.qt(call), QualifiedType::value(TypeId::VOID));
}

#[test]
fn generic_recursive_procedures_without_a_value_instantiate_once() {
    let p = Program::new();
    let (module, f) = p.file(0, |b| {
        let f = walk(b, false);
        let three = b.int(3);
        let call = b.call_ident("walk", vec![three]);
        let module = b.module("M", vec![f, call]);
        (vec![module], (module, f))
    });
    assert_eq!(p.error_kinds(module), vec![]);
    assert_eq!(instantiations_of(&p.ctx, f).len(), 1);
}
