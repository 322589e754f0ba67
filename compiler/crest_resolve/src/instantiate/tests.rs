#![allow(clippy::unwrap_used, clippy::expect_used)]

use crest_ir::{AstBuilder, FileId, FnSpec, Intent, SharedInterner, VarKind};
use crest_types::QualifiedType;
use pretty_assertions::assert_eq;

use super::*;
use crate::queries::Instantiate;

#[test]
fn equal_keys_share_one_instantiation() {
    let names = SharedInterner::default();
    let ctx = Context::new(names.clone());
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let x = b.formal("x", Intent::Default, None);
    let x_ref = b.ident("x");
    let ret = b.ret(Some(x_ref));
    let f = b.function("identity", FnSpec::new(vec![x]).body(vec![ret]));
    let module = b.module("M", vec![f]);
    ctx.set_file(b.finish(vec![module]));

    let key = |ty| InstantiationKey {
        generic: GenericKey::Function(f),
        subs: [(x, QualifiedType::const_var(ty))].into_iter().collect(),
    };
    let first = Instantiate::get(&ctx, key(TypeId::INT)).unwrap();
    let again = Instantiate::get(&ctx, key(TypeId::INT)).unwrap();
    let real = Instantiate::get(&ctx, key(TypeId::REAL)).unwrap();
    assert_eq!(first.value, again.value);
    assert_ne!(first.value, real.value);
    assert_eq!(ctx.registry.of(f).len(), 2);

    let sig = ctx.signature(first.value.signature().unwrap()).unwrap();
    assert!(!sig.is_generic(ctx.types()));
    assert_eq!(sig.formals[0].qt, QualifiedType::const_var(TypeId::INT));
    let generic = InitialSignature::get(&ctx, f).unwrap().signature;
    assert_eq!(sig.instantiated_from, Some(generic));
}

#[test]
fn aggregate_keys_produce_types() {
    let names = SharedInterner::default();
    let ctx = Context::new(names.clone());
    let mut b = AstBuilder::new(FileId::new(0), &names);
    let t = b.var_decl(VarKind::Type, "t", None, None);
    let rec = b.record("R", vec![t]);
    let module = b.module("M", vec![rec]);
    ctx.set_file(b.finish(vec![module]));

    let key = InstantiationKey {
        generic: GenericKey::Aggregate(rec),
        subs: [(t, QualifiedType::type_(TypeId::INT))].into_iter().collect(),
    };
    let outcome = Instantiate::get(&ctx, key.clone()).unwrap();
    let ty = outcome.value.ty().unwrap();
    assert!(!ctx.types().is_generic(ty));
    assert!(ctx.types().instantiated_from(ty).is_some());
    assert_eq!(
        ctx.registry.all(),
        vec![Instantiation {
            key,
            value: Instantiated::Type(ty)
        }]
    );
    assert_eq!(GenericKey::Initializer(rec).decl(), rec);
}
