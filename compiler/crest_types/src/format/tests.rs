use super::*;
use crate::{SigFormal, SignatureKind, Substitution, WhereClause};
use crest_ir::{AggregateKind, FileId, Intent, NodeId, ReturnIntent};
use pretty_assertions::assert_eq;

#[test]
fn arrays_and_domains() {
    let types = TypePool::new();
    let names = StringInterner::new();
    let dom = types.rectangular_domain(2, TypeId::INT);
    let arr = types.array(dom, TypeId::REAL);
    assert_eq!(display_type(&types, &names, arr), "[domain(2, int)] real");

    let generic = types.array(types.generic_domain(), TypeId::INT);
    assert_eq!(display_type(&types, &names, generic), "[] int");
}

#[test]
fn instantiated_aggregate_shows_bindings() {
    let types = TypePool::new();
    let names = StringInterner::new();
    let file = FileId::new(0);
    let subs: Substitution = [
        (NodeId::new(file, 1), QualifiedType::type_(TypeId::INT)),
        (NodeId::new(file, 2), QualifiedType::param(ParamValue::Int(3))),
    ]
    .into_iter()
    .collect();
    let r = types.aggregate(
        NodeId::new(file, 9),
        names.intern("R"),
        AggregateKind::Record,
        subs,
        false,
    );
    assert_eq!(display_type(&types, &names, r), "R(int, 3)");
}

#[test]
fn qualified_param_shows_value() {
    let types = TypePool::new();
    let names = StringInterner::new();
    let qt = QualifiedType::param(ParamValue::Bool(true));
    assert_eq!(display_qualified(&types, &names, qt), "param bool = true");
    let s = QualifiedType::param(ParamValue::Str(names.intern("hi")));
    assert_eq!(display_qualified(&types, &names, s), "param string = \"hi\"");
}

#[test]
fn signature_lists_formals() {
    let types = TypePool::new();
    let names = StringInterner::new();
    let file = FileId::new(0);
    let sig = Signature {
        decl: NodeId::new(file, 4),
        name: names.intern("f"),
        kind: SignatureKind::Function,
        formals: vec![
            SigFormal {
                decl: NodeId::new(file, 1),
                name: names.intern("b"),
                intent: Intent::Param,
                qt: QualifiedType::param(ParamValue::Bool(false)),
                has_default: false,
                variadic: false,
            },
            SigFormal {
                decl: NodeId::new(file, 2),
                name: names.intern("x"),
                intent: Intent::Default,
                qt: QualifiedType::const_var(TypeId::INT),
                has_default: false,
                variadic: false,
            },
        ],
        return_intent: ReturnIntent::Default,
        is_method: false,
        where_clause: WhereClause::None,
        substitution: Substitution::empty(),
        instantiated_from: None,
    };
    assert_eq!(
        display_signature(&types, &names, &sig),
        "f(param b: false, x: int)"
    );
}
