//! Implicit conversions and generic pattern matching between types.

use crest_types::{DomainKind, QualKind, QualifiedType, TypeData, TypeId, TypePool};

/// Whether `from` converts implicitly to `to`.
///
/// Widening to `real` and `uint` to `int` always work; a param `int`
/// converts to `uint` when the value fits.
pub(crate) fn can_convert(types: &TypePool, from: QualifiedType, to: TypeId) -> bool {
    if from.ty == to {
        return true;
    }
    if let (QualKind::Param, Some(value)) = (from.kind, from.param) {
        if value.coerce(to).is_some() {
            return true;
        }
    }
    match (types.get(from.ty), types.get(to)) {
        (TypeData::Int | TypeData::Uint, TypeData::Real) | (TypeData::Uint, TypeData::Int) => true,
        (TypeData::Tuple(from_elems), TypeData::Tuple(to_elems)) => {
            from_elems.len() == to_elems.len()
                && from_elems
                    .iter()
                    .zip(to_elems.iter())
                    .all(|(&f, &t)| can_convert(types, QualifiedType::value(f), t))
        }
        _ => false,
    }
}

/// Result type of an arithmetic operator over two numeric types.
pub(crate) fn common_numeric(a: TypeId, b: TypeId) -> Option<TypeId> {
    let rank = |t: TypeId| match t {
        TypeId::UINT => Some(0),
        TypeId::INT => Some(1),
        TypeId::REAL => Some(2),
        _ => None,
    };
    let (ra, rb) = (rank(a)?, rank(b)?);
    Some(if ra >= rb { a } else { b })
}

/// Whether concrete `actual` is an instance of the possibly generic
/// `pattern`.
pub(crate) fn matches_pattern(types: &TypePool, actual: TypeId, pattern: TypeId) -> bool {
    if actual == pattern || pattern == TypeId::ANY {
        return true;
    }
    if !types.is_generic(pattern) {
        return false;
    }
    match (types.get(actual), types.get(pattern)) {
        (TypeData::Domain(_), TypeData::Domain(DomainKind::Generic)) => true,
        (
            TypeData::Array {
                domain: ad,
                elt: ae,
            },
            TypeData::Array {
                domain: pd,
                elt: pe,
            },
        ) => matches_pattern(types, ad, pd) && matches_pattern(types, ae, pe),
        (TypeData::Range { idx: a }, TypeData::Range { idx: p }) => matches_pattern(types, a, p),
        (TypeData::Tuple(a), TypeData::Tuple(p)) => {
            a.len() == p.len()
                && a.iter()
                    .zip(p.iter())
                    .all(|(&a, &p)| matches_pattern(types, a, p))
        }
        (TypeData::Aggregate(a), TypeData::Aggregate(p)) => {
            a.decl == p.decl && p.subs.iter().all(|(decl, qt)| a.subs.get(decl) == Some(qt))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crest_types::ParamValue;

    #[test]
    fn widening_and_param_conversions() {
        let types = TypePool::new();
        assert!(can_convert(&types, QualifiedType::value(TypeId::INT), TypeId::REAL));
        assert!(!can_convert(&types, QualifiedType::value(TypeId::REAL), TypeId::INT));
        assert!(!can_convert(&types, QualifiedType::value(TypeId::INT), TypeId::UINT));
        assert!(can_convert(&types, QualifiedType::value(TypeId::UINT), TypeId::INT));
        assert!(can_convert(
            &types,
            QualifiedType::param(ParamValue::Int(3)),
            TypeId::UINT
        ));
        assert!(!can_convert(
            &types,
            QualifiedType::param(ParamValue::Int(-3)),
            TypeId::UINT
        ));
    }

    #[test]
    fn numeric_promotion_prefers_the_wider_type() {
        assert_eq!(common_numeric(TypeId::INT, TypeId::REAL), Some(TypeId::REAL));
        assert_eq!(common_numeric(TypeId::UINT, TypeId::INT), Some(TypeId::INT));
        assert_eq!(common_numeric(TypeId::INT, TypeId::INT), Some(TypeId::INT));
        assert_eq!(common_numeric(TypeId::BOOL, TypeId::INT), None);
    }

    #[test]
    fn arrays_match_generic_domains_and_elements() {
        let types = TypePool::new();
        let dom = types.rectangular_domain(1, TypeId::INT);
        let ints = types.array(dom, TypeId::INT);
        let any_array = types.array(types.generic_domain(), TypeId::ANY);
        let int_array = types.array(types.generic_domain(), TypeId::INT);
        let string_array = types.array(types.generic_domain(), TypeId::STRING);

        assert!(matches_pattern(&types, ints, any_array));
        assert!(matches_pattern(&types, ints, int_array));
        assert!(!matches_pattern(&types, ints, string_array));
        assert!(!matches_pattern(&types, TypeId::INT, int_array));
        assert!(matches_pattern(&types, TypeId::INT, TypeId::ANY));
    }
}
