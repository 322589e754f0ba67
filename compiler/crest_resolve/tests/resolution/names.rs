//! Lookup through blocks, functions and modules.

use crest_ir::{FnSpec, Intent, VarKind};
use crest_resolve::{lookup, resolve_concrete_function, ResolutionErrorKind, Target};
use crest_types::{QualifiedType, TypeId};
use pretty_assertions::assert_eq;

use crate::common::Program;

#[test]
fn inner_blocks_shadow_outer_locals() {
    let p = Program::new();
    let (f, inner_x, inner_use, outer_use) = p.file(0, |b| {
        let s = b.string("s");
        let outer_x = b.var("x", s);
        let half = b.real(0.5);
        let inner_x = b.var("x", half);
        let inner_use = b.ident("x");
        let block = b.block(vec![inner_x, inner_use]);
        let outer_use = b.ident("x");
        let ret = b.ret(Some(outer_use));
        let f = b.function("f", FnSpec::new(vec![]).body(vec![outer_x, block, ret]));
        (vec![b.module("M", vec![f])], (f, inner_x, inner_use, outer_use))
    });
    let body = resolve_concrete_function(&p.ctx, f).unwrap().unwrap();
    assert!(body.errors().is_empty(), "{:?}", body.errors());
    assert_eq!(body.qt(inner_use), Some(QualifiedType::var(TypeId::REAL)));
    assert_eq!(
        body.get(inner_use).unwrap().targets.as_slice(),
        &[Target::Decl(inner_x)]
    );
    assert_eq!(body.qt(outer_use), Some(QualifiedType::var(TypeId::STRING)));
    assert_eq!(
        body.inferred_return(),
        Some(QualifiedType::value(TypeId::STRING))
    );
}

#[test]
fn overloads_from_enclosing_scopes_join_the_candidates() {
    let p = Program::new();
    let (outer, by_int, by_string) = p.file(0, |b| {
        let int = b.ident("int");
        let x = b.formal("x", Intent::Default, Some(int));
        let one = b.int(1);
        let ret = b.ret(Some(one));
        let h_int = b.function("h", FnSpec::new(vec![x]).body(vec![ret]));

        let string = b.ident("string");
        let y = b.formal("y", Intent::Default, Some(string));
        let a = b.string("a");
        let ret = b.ret(Some(a));
        let h_string = b.function("h", FnSpec::new(vec![y]).body(vec![ret]));
        let two = b.int(2);
        let by_int = b.call_ident("h", vec![two]);
        let first = b.var("first", by_int);
        let s = b.string("s");
        let by_string = b.call_ident("h", vec![s]);
        let second = b.var("second", by_string);
        let outer = b.function(
            "outer",
            FnSpec::new(vec![]).body(vec![h_string, first, second]),
        );
        (vec![b.module("M", vec![h_int, outer])], (outer, by_int, by_string))
    });
    let body = resolve_concrete_function(&p.ctx, outer).unwrap().unwrap();
    assert!(body.errors().is_empty(), "{:?}", body.errors());
    assert_eq!(body.qt(by_int), Some(QualifiedType::value(TypeId::INT)));
    assert_eq!(body.qt(by_string), Some(QualifiedType::value(TypeId::STRING)));
}

#[test]
fn lookup_sees_builtins_and_module_members() {
    let p = Program::new();
    let (module, x) = p.file(0, |b| {
        let one = b.int(1);
        let x = b.var("x", one);
        let module = b.module("M", vec![x]);
        (vec![module], (module, x))
    });
    let found = lookup(&p.ctx, module, p.name("x")).unwrap();
    assert_eq!(found.single(), Some(Target::Decl(x)));
    let int = lookup(&p.ctx, module, p.name("int")).unwrap();
    assert_eq!(int.single(), Some(Target::Builtin(TypeId::INT)));
    assert!(lookup(&p.ctx, module, p.name("y")).unwrap().is_empty());
}

#[test]
fn module_variables_are_read_after_their_declaration() {
    let p = Program::new();
    let (module, early, late) = p.file(0, |b| {
        let early = b.ident("late");
        let a = b.var("a", early);
        let one = b.int(1);
        let late = b.var("late", one);
        let module = b.module("M", vec![a, late]);
        (vec![module], (module, early, late))
    });
    let result = p.module(module);
    assert_eq!(
        result.get(early).unwrap().failure,
        Some(ResolutionErrorKind::UseBeforeDeclaration {
            name: p.name("late"),
            decl: late,
        })
    );
    assert_eq!(result.qt(late), Some(QualifiedType::var(TypeId::INT)));
    assert_eq!(result.errors().len(), 1);
}

#[test]
fn unknown_names_and_modules_are_reported() {
    let p = Program::new();
    let (module, missing, used) = p.file(0, |b| {
        let used = b.use_("Nowhere");
        let missing = b.ident("undefined_thing");
        let a = b.var_decl(VarKind::Var, "a", None, Some(missing));
        let module = b.module("M", vec![used, a]);
        (vec![module], (module, missing, used))
    });
    let result = p.module(module);
    assert_eq!(
        result.get(used).unwrap().failure,
        Some(ResolutionErrorKind::UnknownModule {
            name: p.name("Nowhere")
        })
    );
    assert_eq!(
        result.get(missing).unwrap().failure,
        Some(ResolutionErrorKind::UndeclaredIdentifier {
            name: p.name("undefined_thing")
        })
    );
    assert_eq!(result.errors().len(), 2);
}

#[test]
fn a_name_declared_twice_in_one_scope_is_ambiguous() {
    let p = Program::new();
    let (module, first, second, used) = p.file(0, |b| {
        let one = b.int(1);
        let first = b.var("d", one);
        let two = b.int(2);
        let second = b.var("d", two);
        let used = b.ident("d");
        let e = b.var("e", used);
        let module = b.module("M", vec![first, second, e]);
        (vec![module], (module, first, second, used))
    });
    let result = p.module(module);
    assert_eq!(
        result.get(used).unwrap().failure,
        Some(ResolutionErrorKind::AmbiguousDeclaration {
            name: p.name("d"),
            decls: vec![first, second],
        })
    );
    assert!(p.qt(used).is_erroneous());
    assert!(result
        .errors()
        .iter()
        .any(|e| e.node == used && matches!(e.kind, ResolutionErrorKind::AmbiguousDeclaration { .. })));
}
