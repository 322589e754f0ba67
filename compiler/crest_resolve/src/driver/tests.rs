#![allow(clippy::unwrap_used, clippy::expect_used)]

use crest_ir::{AstBuilder, FileId, FnSpec, Intent, ReturnIntent, SharedInterner};
use crest_types::ParamValue;
use pretty_assertions::assert_eq;

use super::*;
use crate::queries::{InitialSignature, ResolveBody, ResolveModule};

fn load(names: &SharedInterner, build: impl FnOnce(&mut AstBuilder<'_>) -> Vec<NodeId>) -> Context {
    let ctx = Context::new(names.clone());
    let mut b = AstBuilder::new(FileId::new(0), names);
    let roots = build(&mut b);
    ctx.set_file(b.finish(roots));
    ctx
}

fn body_of(ctx: &Context, f: NodeId) -> Arc<ResolutionResult> {
    let sig = InitialSignature::get(ctx, f).unwrap().signature;
    ResolveBody::get(ctx, sig).unwrap()
}

#[test]
fn module_table_merges_its_statements() {
    let names = SharedInterner::default();
    let mut ids = None;
    let ctx = load(&names, |b| {
        let one = b.int(1);
        let x = b.var("x", one);
        let x_ref = b.ident("x");
        let y = b.var("y", x_ref);
        let module = b.module("M", vec![x, y]);
        ids = Some((module, x, y, x_ref));
        vec![module]
    });
    let (module, x, y, x_ref) = ids.unwrap();
    let result = ResolveModule::get(&ctx, module).unwrap();
    assert!(result.errors().is_empty());
    assert_eq!(result.qt(module), Some(QualifiedType::module()));
    assert_eq!(result.qt(x), Some(QualifiedType::var(crest_types::TypeId::INT)));
    assert_eq!(result.qt(x_ref), Some(QualifiedType::var(crest_types::TypeId::INT)));
    assert_eq!(result.qt(y), Some(QualifiedType::var(crest_types::TypeId::INT)));
    assert_eq!(result.get(x_ref).unwrap().targets.as_slice(), &[crate::lookup::Target::Decl(x)]);
}

#[test]
fn numeric_returns_widen() {
    let names = SharedInterner::default();
    let mut f = None;
    let ctx = load(&names, |b| {
        let one = b.int(1);
        let first = b.ret(Some(one));
        let half = b.real(0.5);
        let second = b.ret(Some(half));
        let decl = b.function("f", FnSpec::new(vec![]).body(vec![first, second]));
        f = Some(decl);
        vec![b.module("M", vec![decl])]
    });
    let body = body_of(&ctx, f.unwrap());
    assert!(body.errors().is_empty());
    assert_eq!(
        body.inferred_return(),
        Some(QualifiedType::value(crest_types::TypeId::REAL))
    );
}

#[test]
fn unrelated_returns_are_inconsistent() {
    let names = SharedInterner::default();
    let mut f = None;
    let ctx = load(&names, |b| {
        let one = b.int(1);
        let first = b.ret(Some(one));
        let s = b.string("s");
        let second = b.ret(Some(s));
        let decl = b.function("f", FnSpec::new(vec![]).body(vec![first, second]));
        f = Some(decl);
        vec![b.module("M", vec![decl])]
    });
    let f = f.unwrap();
    let body = body_of(&ctx, f);
    assert_eq!(body.inferred_return(), Some(QualifiedType::erroneous()));
    let errors: Vec<_> = body.errors().iter().map(|e| (e.node, e.kind.clone())).collect();
    assert_eq!(errors, vec![(f, ResolutionErrorKind::InconsistentReturns)]);
}

#[test]
fn param_functions_return_their_value() {
    let names = SharedInterner::default();
    let mut f = None;
    let ctx = load(&names, |b| {
        let one = b.int(1);
        let two = b.int(2);
        let sum = b.binary(crest_ir::OpKind::Add, one, two);
        let ret = b.ret(Some(sum));
        let decl = b.function(
            "three",
            FnSpec::new(vec![])
                .return_intent(ReturnIntent::Param)
                .body(vec![ret]),
        );
        f = Some(decl);
        vec![b.module("M", vec![decl])]
    });
    let body = body_of(&ctx, f.unwrap());
    assert_eq!(
        body.inferred_return(),
        Some(QualifiedType::param(ParamValue::Int(3)))
    );
}

#[test]
fn formals_are_seeded_from_the_signature() {
    let names = SharedInterner::default();
    let mut ids = None;
    let ctx = load(&names, |b| {
        let real = b.ident("real");
        let x = b.formal("x", Intent::Ref, Some(real));
        let x_ref = b.ident("x");
        let ret = b.ret(Some(x_ref));
        let decl = b.function("f", FnSpec::new(vec![x]).body(vec![ret]));
        ids = Some((decl, x, x_ref));
        vec![b.module("M", vec![decl])]
    });
    let (f, x, x_ref) = ids.unwrap();
    let body = body_of(&ctx, f);
    let real = QualifiedType::ref_(crest_types::TypeId::REAL);
    assert_eq!(body.qt(x), Some(real));
    assert_eq!(body.qt(x_ref), Some(real));
    assert_eq!(
        body.inferred_return(),
        Some(QualifiedType::value(crest_types::TypeId::REAL))
    );
}

fn speculative_lookup(report: bool) -> (NodeId, ResolutionResult) {
    let names = SharedInterner::default();
    let config = crate::ResolverConfig::default().with_report_speculative_failures(report);
    let ctx = Context::with_config(names.clone(), config);
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let missing = b.ident("missing");
    let a = b.var("a", missing);
    let module = b.module("M", vec![a]);
    ctx.set_file(b.finish(vec![module]));

    let ast = ctx.ast(FileId::new(0)).unwrap();
    let mut r = Resolver::new(&ctx, ast, a, Substitution::empty());
    r.speculative = true;
    r.resolve(a).unwrap();
    (missing, r.finish())
}

#[test]
fn speculative_failures_stay_on_the_node_unless_reported() {
    let failure_of = |result: &ResolutionResult, node: NodeId| {
        result.get(node).and_then(|e| e.failure.clone())
    };

    let (missing, quiet) = speculative_lookup(false);
    assert!(matches!(
        failure_of(&quiet, missing),
        Some(ResolutionErrorKind::UndeclaredIdentifier { .. })
    ));
    assert!(quiet.qt(missing).unwrap().is_erroneous());
    assert!(quiet.errors().is_empty(), "{:?}", quiet.errors());

    let (missing, loud) = speculative_lookup(true);
    assert!(matches!(
        failure_of(&loud, missing),
        Some(ResolutionErrorKind::UndeclaredIdentifier { .. })
    ));
    assert!(loud
        .errors()
        .iter()
        .any(|e| e.node == missing
            && matches!(e.kind, ResolutionErrorKind::UndeclaredIdentifier { .. })));
}
