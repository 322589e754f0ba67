//! Arrays, domains and loops.

use crest_ir::{FnSpec, Intent, LoopKind, NodeId};
use crest_resolve::{resolve_concrete_function, resolved_call};
use crest_types::{QualifiedType, TypeId};
use pretty_assertions::assert_eq;

use crate::common::{assert_no_unknowns, Program};

#[test]
fn array_members_indexing_and_loop_indices() {
    let p = Program::new();
    let mut ids = None;
    let f = p.file(0, |b| {
        let one = b.int(1);
        let two = b.int(2);
        let three = b.int(3);
        let literal = b.array_literal(vec![one, two, three], 1);
        let arr = b.var("A", literal);

        let a = b.ident("A");
        let domain = b.dot(a, "domain");
        let a = b.ident("A");
        let size = b.dot(a, "size");
        let a = b.ident("A");
        let first = b.int(1);
        let element = b.index(a, vec![first]);

        let a = b.ident("A");
        let over_domain = b.dot(a, "domain");
        let mut index_use = None;
        let by_index = b.loop_(LoopKind::For, Some("i"), over_domain, |b| {
            let i = b.ident("i");
            index_use = Some(i);
            vec![i]
        });
        let a = b.ident("A");
        let mut element_use = None;
        let by_element = b.loop_(LoopKind::Forall, Some("x"), a, |b| {
            let x = b.ident("x");
            element_use = Some(x);
            vec![x]
        });

        let f = b.function(
            "f",
            FnSpec::new(vec![]).body(vec![arr, domain, size, element, by_index, by_element]),
        );
        ids = Some((
            literal,
            domain,
            size,
            element,
            index_use.unwrap(),
            element_use.unwrap(),
        ));
        (vec![b.module("M", vec![f])], f)
    });
    let (literal, domain, size, element, index_use, element_use) = ids.unwrap();
    let body = resolve_concrete_function(&p.ctx, f).unwrap().unwrap();
    assert!(body.errors().is_empty(), "{:?}", body.errors());
    assert_no_unknowns(&body);

    let types = p.ctx.types();
    let dom = types.rectangular_domain(1, TypeId::INT);
    assert_eq!(
        body.qt(literal),
        Some(QualifiedType::value(types.array(dom, TypeId::INT)))
    );
    assert_eq!(body.qt(domain), Some(QualifiedType::const_ref(dom)));
    assert_eq!(body.qt(size), Some(QualifiedType::value(TypeId::INT)));
    assert_eq!(body.qt(element), Some(QualifiedType::ref_(TypeId::INT)));
    assert_eq!(body.qt(index_use), Some(QualifiedType::const_var(TypeId::INT)));
    assert_eq!(body.qt(element_use), Some(QualifiedType::ref_(TypeId::INT)));
}

#[test]
fn literal_rank_and_element_type() {
    let p = Program::new();
    let (flat, square) = p.file(0, |b| {
        let one = b.int(1);
        let half = b.real(0.5);
        let flat = b.array_literal(vec![one, half], 1);
        let a = b.var("flat", flat);
        let cells: Vec<NodeId> = (0..4).map(|v| b.int(v)).collect();
        let square = b.array_literal(cells, 2);
        let c = b.var("square", square);
        (vec![b.module("M", vec![a, c])], (flat, square))
    });
    let types = p.ctx.types();
    let one_dim = types.rectangular_domain(1, TypeId::INT);
    let two_dim = types.rectangular_domain(2, TypeId::INT);
    assert_eq!(
        p.qt(flat),
        QualifiedType::value(types.array(one_dim, TypeId::REAL))
    );
    assert_eq!(
        p.qt(square),
        QualifiedType::value(types.array(two_dim, TypeId::INT))
    );
    assert_eq!(types.rank(two_dim), Some(2));
}

/// `proc total(A: [] int)` and `proc total(A: [] string)`.
#[test]
fn array_formals_choose_by_element_type() {
    let p = Program::new();
    let (by_int, by_string, ints, strings) = p.file(0, |b| {
        let overload = |b: &mut crest_ir::AstBuilder<'_>, elt: &str, value: NodeId| {
            let elt = b.ident(elt);
            let ty = b.array_type(None, Some(elt));
            let formal = b.formal("A", Intent::Default, Some(ty));
            let ret = b.ret(Some(value));
            b.function("total", FnSpec::new(vec![formal]).body(vec![ret]))
        };
        let zero = b.int(0);
        let by_int = overload(b, "int", zero);
        let empty = b.string("");
        let by_string = overload(b, "string", empty);

        let one = b.int(1);
        let two = b.int(2);
        let numbers = b.array_literal(vec![one, two], 1);
        let ints = b.call_ident("total", vec![numbers]);
        let a = b.var("a", ints);
        let x = b.string("x");
        let y = b.string("y");
        let words = b.array_literal(vec![x, y], 1);
        let strings = b.call_ident("total", vec![words]);
        let c = b.var("c", strings);
        let module = b.module("M", vec![by_int, by_string, a, c]);
        (vec![module], (by_int, by_string, ints, strings))
    });
    assert_eq!(p.qt(ints), QualifiedType::value(TypeId::INT));
    assert_eq!(p.qt(strings), QualifiedType::value(TypeId::STRING));

    let chosen = |call| {
        let call = resolved_call(&p.ctx, call).unwrap().unwrap();
        let sig = p.ctx.signature(call.signature).unwrap();
        (sig.decl, sig.formals[0].qt)
    };
    let types = p.ctx.types();
    let dom = types.rectangular_domain(1, TypeId::INT);
    assert_eq!(
        chosen(ints),
        (by_int, QualifiedType::const_var(types.array(dom, TypeId::INT)))
    );
    assert_eq!(chosen(strings).0, by_string);
}
