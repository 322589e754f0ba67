//! Whole-module checking and diagnostic rendering.

use crest_ir::{FnSpec, Intent};
use crest_resolve::{check_module, diagnostics, ErrorCategory, ResolutionErrorKind};
use pretty_assertions::assert_eq;

use crate::common::Program;

#[test]
fn check_module_collects_statements_bodies_signatures_and_nested_modules() {
    let p = Program::new();
    let module = p.file(0, |b| {
        let missing = b.ident("missing");
        let ret = b.ret(Some(missing));
        let bad = b.function("bad", FnSpec::new(vec![]).body(vec![ret]));

        let nope = b.ident("nope");
        let y = b.var("y", nope);
        let inner = b.module("Inner", vec![y]);

        let one = b.int(1);
        let fine = b.var("fine", one);

        let unknown_type = b.ident("badtype");
        let x = b.formal("x", Intent::Default, Some(unknown_type));
        let f = b.function("f", FnSpec::new(vec![x]).body(vec![]));

        let module = b.module("M", vec![bad, inner, fine, f]);
        (vec![module], module)
    });
    let errors = check_module(&p.ctx, module).unwrap();
    let kinds: Vec<ResolutionErrorKind> = errors.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ResolutionErrorKind::UndeclaredIdentifier {
                name: p.name("missing")
            },
            ResolutionErrorKind::UndeclaredIdentifier { name: p.name("nope") },
            ResolutionErrorKind::UndeclaredIdentifier {
                name: p.name("badtype")
            },
        ]
    );
    assert!(errors.iter().all(|e| e.category() == ErrorCategory::Lookup));

    let again = check_module(&p.ctx, module).unwrap();
    assert_eq!(again, errors);
}

#[test]
fn a_clean_module_has_no_errors() {
    let p = Program::new();
    let module = p.file(0, |b| {
        let int = b.ident("int");
        let x = b.formal("x", Intent::Default, Some(int));
        let x_ref = b.ident("x");
        let one = b.int(1);
        let sum = b.binary(crest_ir::OpKind::Add, x_ref, one);
        let ret = b.ret(Some(sum));
        let succ = b.function("succ", FnSpec::new(vec![x]).body(vec![ret]));
        let two = b.int(2);
        let call = b.call_ident("succ", vec![two]);
        let a = b.var("a", call);
        let module = b.module("M", vec![succ, a]);
        (vec![module], module)
    });
    assert_eq!(p.error_kinds(module), vec![]);
}

#[test]
fn diagnostics_name_the_failure_and_the_related_declarations() {
    let p = Program::new();
    let (module, first, second) = p.file(0, |b| {
        let missing = b.ident("missing");
        let a = b.var("a", missing);
        let int = b.ident("int");
        let x = b.formal("x", Intent::Default, Some(int));
        let first = b.function("f", FnSpec::new(vec![x]).body(vec![]));
        let int = b.ident("int");
        let y = b.formal("y", Intent::Default, Some(int));
        let second = b.function("f", FnSpec::new(vec![y]).body(vec![]));
        let one = b.int(1);
        let call = b.call_ident("f", vec![one]);
        let module = b.module("M", vec![a, first, second, call]);
        (vec![module], (module, first, second))
    });
    let errors = check_module(&p.ctx, module).unwrap();
    let rendered = diagnostics(&p.ctx, &errors);
    assert_eq!(rendered.len(), 2);

    assert_eq!(rendered[0].message, "cannot find `missing` in this scope");
    assert!(rendered[0].is_error());
    assert_eq!(rendered[0].primary_span(), Some(errors[0].span));

    assert_eq!(rendered[1].message, "call to `f` is ambiguous");
    let related: Vec<_> = rendered[1].secondary_labels().map(|l| l.span).collect();
    assert_eq!(related, vec![p.ctx.span_of(first), p.ctx.span_of(second)]);
}
