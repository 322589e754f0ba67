//! Human-readable rendering of types, qualified types and signatures.

use std::fmt::Write as _;

use crest_ir::StringInterner;

use crate::data::{DomainKind, TypeData};
use crate::{ParamValue, QualKind, QualifiedType, Signature, TypeId, TypePool};

pub fn display_type(types: &TypePool, names: &StringInterner, ty: TypeId) -> String {
    let mut out = String::new();
    write_type(types, names, ty, &mut out);
    out
}

fn write_type(types: &TypePool, names: &StringInterner, ty: TypeId, out: &mut String) {
    match types.get(ty) {
        TypeData::Unknown => out.push_str("<unknown>"),
        TypeData::Erroneous => out.push_str("<error>"),
        TypeData::Any => out.push_str("?"),
        TypeData::Void => out.push_str("void"),
        TypeData::Nothing => out.push_str("nothing"),
        TypeData::Bool => out.push_str("bool"),
        TypeData::Int => out.push_str("int"),
        TypeData::Uint => out.push_str("uint"),
        TypeData::Real => out.push_str("real"),
        TypeData::String => out.push_str("string"),
        TypeData::Bytes => out.push_str("bytes"),
        TypeData::Locale => out.push_str("locale"),
        TypeData::Range { idx } => {
            out.push_str("range(");
            write_type(types, names, idx, out);
            out.push(')');
        }
        TypeData::Domain(kind) => match kind {
            DomainKind::Rectangular { rank, idx } => {
                let _ = write!(out, "domain({rank}, ");
                write_type(types, names, idx, out);
                out.push(')');
            }
            DomainKind::Associative { idx, par_safe } => {
                out.push_str("domain(");
                write_type(types, names, idx, out);
                let _ = write!(out, ", parSafe={par_safe})");
            }
            DomainKind::Generic => out.push_str("domain"),
        },
        TypeData::Array { domain, elt } => {
            out.push('[');
            if types.domain_kind(domain) != Some(DomainKind::Generic) {
                write_type(types, names, domain, out);
            }
            out.push_str("] ");
            write_type(types, names, elt, out);
        }
        TypeData::Tuple(elems) => {
            out.push('(');
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(types, names, *e, out);
            }
            out.push(')');
        }
        TypeData::Aggregate(agg) => {
            out.push_str(names.lookup(agg.name));
            if !agg.subs.is_empty() {
                out.push('(');
                for (i, (_, qt)) in agg.subs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_bound(types, names, qt, out);
                }
                out.push(')');
            }
        }
    }
}

fn write_param(names: &StringInterner, value: ParamValue, out: &mut String) {
    match value {
        ParamValue::Str(name) => {
            let _ = write!(out, "\"{}\"", names.lookup(name));
        }
        other => {
            let _ = write!(out, "{other}");
        }
    }
}

/// A binding: the value of a param, otherwise the type.
fn write_bound(types: &TypePool, names: &StringInterner, qt: QualifiedType, out: &mut String) {
    match qt.param {
        Some(value) => write_param(names, value, out),
        None => write_type(types, names, qt.ty, out),
    }
}

pub fn display_qualified(types: &TypePool, names: &StringInterner, qt: QualifiedType) -> String {
    let mut out = String::new();
    out.push_str(qt.kind.as_str());
    if matches!(qt.kind, QualKind::Function | QualKind::Module | QualKind::Unknown) {
        return out;
    }
    out.push(' ');
    write_type(types, names, qt.ty, &mut out);
    if let Some(value) = qt.param {
        out.push_str(" = ");
        write_param(names, value, &mut out);
    }
    out
}

/// `name(intent formal: type, ...)`, with bound params shown by value.
pub fn display_signature(types: &TypePool, names: &StringInterner, sig: &Signature) -> String {
    let mut out = String::new();
    out.push_str(names.lookup(sig.name));
    out.push('(');
    for (i, formal) in sig.formals.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let intent = formal.intent.as_str();
        if !intent.is_empty() {
            out.push_str(intent);
            out.push(' ');
        }
        if formal.variadic {
            out.push_str("...");
        }
        out.push_str(names.lookup(formal.name));
        out.push_str(": ");
        write_bound(types, names, formal.qt, &mut out);
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests;
