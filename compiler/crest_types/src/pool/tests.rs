use super::*;
use crest_ir::FileId;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn primitives_are_pre_interned() {
    let pool = TypePool::new();
    assert_eq!(pool.intern(TypeData::Int), TypeId::INT);
    assert_eq!(pool.intern(TypeData::Bool), TypeId::BOOL);
    assert_eq!(pool.intern(TypeData::Locale), TypeId::LOCALE);
    assert_eq!(pool.get(TypeId::REAL), TypeData::Real);
}

#[test]
fn structural_identity() {
    let pool = TypePool::new();
    let d1 = pool.rectangular_domain(1, TypeId::INT);
    let d2 = pool.rectangular_domain(1, TypeId::INT);
    assert_eq!(d1, d2);
    assert_eq!(pool.array(d1, TypeId::INT), pool.array(d2, TypeId::INT));
    assert_ne!(pool.array(d1, TypeId::INT), pool.array(d1, TypeId::STRING));
}

#[test]
fn genericity_propagates() {
    let pool = TypePool::new();
    let generic_dom = pool.generic_domain();
    let arr = pool.array(generic_dom, TypeId::INT);
    assert!(pool.is_generic(arr));
    let concrete = pool.array(pool.rectangular_domain(1, TypeId::INT), TypeId::INT);
    assert!(!pool.is_generic(concrete));
    let nested = pool.tuple(vec![TypeId::INT, TypeId::ANY]);
    assert!(pool.is_generic(nested));
    assert!(pool.flags(nested).contains(TypeFlags::IS_TUPLE));
}

#[test]
fn array_accessors() {
    let pool = TypePool::new();
    let dom = pool.rectangular_domain(3, TypeId::INT);
    let arr = pool.array(dom, TypeId::REAL);
    assert_eq!(pool.array_parts(arr), Some((dom, TypeId::REAL)));
    assert_eq!(pool.rank(arr), Some(3));
    assert_eq!(pool.index_type(arr), Some(TypeId::INT));
    assert_eq!(pool.index_type(pool.range(TypeId::INT)), Some(TypeId::INT));
}

#[test]
fn instantiated_aggregate_points_back_to_generic() {
    let pool = TypePool::new();
    let file = FileId::new(0);
    let decl = NodeId::new(file, 7);
    let name = Name::from_raw(200);
    let generic = pool.aggregate(decl, name, AggregateKind::Record, Substitution::empty(), true);
    let subs: Substitution = [(NodeId::new(file, 2), crate::QualifiedType::type_(TypeId::INT))]
        .into_iter()
        .collect();
    let inst = pool.aggregate(decl, name, AggregateKind::Record, subs, false);

    assert!(pool.is_generic(generic));
    assert!(!pool.is_generic(inst));
    assert_eq!(pool.instantiated_from(inst), Some(generic));
    assert_eq!(pool.instantiated_from(generic), None);
}

#[test]
fn concurrent_interning_agrees() {
    let pool = std::sync::Arc::new(TypePool::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = std::sync::Arc::clone(&pool);
            std::thread::spawn(move || {
                (1..32)
                    .map(|rank| pool.rectangular_domain(rank, TypeId::INT))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap_or_default())
        .collect();
    for r in &results[1..] {
        assert_eq!(r, &results[0]);
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Shape {
    Prim(TypeId),
    Domain(u32),
    Array(u32, Box<Shape>),
    Tuple(Vec<Shape>),
}

fn build(pool: &TypePool, shape: &Shape) -> TypeId {
    match shape {
        Shape::Prim(id) => *id,
        Shape::Domain(rank) => pool.rectangular_domain(*rank, TypeId::INT),
        Shape::Array(rank, elt) => {
            let elt = build(pool, elt);
            pool.array(pool.rectangular_domain(*rank, TypeId::INT), elt)
        }
        Shape::Tuple(elems) => pool.tuple(elems.iter().map(|e| build(pool, e)).collect()),
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        Just(Shape::Prim(TypeId::INT)),
        Just(Shape::Prim(TypeId::REAL)),
        Just(Shape::Prim(TypeId::BOOL)),
        Just(Shape::Prim(TypeId::ANY)),
        (1u32..4).prop_map(Shape::Domain),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (1u32..4, inner.clone()).prop_map(|(rank, elt)| Shape::Array(rank, Box::new(elt))),
            proptest::collection::vec(inner, 1..4).prop_map(Shape::Tuple),
        ]
    })
}

proptest! {
    #[test]
    fn equal_shapes_intern_to_equal_ids(a in shape(), b in shape()) {
        let pool = TypePool::new();
        let ia = build(&pool, &a);
        let ib = build(&pool, &b);
        prop_assert_eq!(ia == ib, a == b);
        prop_assert_eq!(build(&pool, &a), ia);
    }
}
