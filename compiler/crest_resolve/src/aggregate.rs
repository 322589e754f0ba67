//! Records, classes and unions: declared and instantiated types, fields.
//!
//! An aggregate is generic when it has a `type` or `param` field without a
//! default, or a `var` field with neither a type nor an initializer. Its
//! instantiations bind exactly those fields.

use std::sync::Arc;

use crest_ir::{Ast, Name, NodeId, NodeKind, VarKind, VariableDecl};
use crest_query::Query;
use crest_types::{QualKind, QualifiedType, Substitution, TypeId};

use crate::context::Frame;
use crate::error::{InternalError, ResolutionError};
use crate::instantiate::{GenericKey, InstantiationKey};
use crate::queries::Instantiate;
use crate::resolver::Resolver;
use crate::Context;

/// One field and its type in a particular instantiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub decl: NodeId,
    pub name: Name,
    pub qt: QualifiedType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldsInfo {
    pub fields: Vec<FieldInfo>,
    pub errors: Vec<ResolutionError>,
}

fn is_generic_field(var: &VariableDecl) -> bool {
    match var.kind {
        VarKind::Type | VarKind::Param => var.init.is_none(),
        _ => var.type_expr.is_none() && var.init.is_none(),
    }
}

fn aggregate_decl<'a>(ast: &'a Ast, decl: NodeId) -> Result<&'a crest_ir::AggregateDecl, InternalError> {
    match ast.kind(decl) {
        Some(NodeKind::Aggregate(agg)) => Ok(agg),
        _ => Err(InternalError::NotADeclaration {
            node: decl,
            expected: "aggregate",
        }),
    }
}

/// Fields that instantiations bind, in declaration order.
pub(crate) fn generic_fields(ast: &Ast, decl: NodeId) -> Result<Vec<NodeId>, InternalError> {
    Ok(aggregate_decl(ast, decl)?
        .members
        .iter()
        .copied()
        .filter(|&m| matches!(ast.kind(m), Some(NodeKind::Variable(v)) if is_generic_field(v)))
        .collect())
}

/// The type a reference to the declaration denotes: generic when any field
/// is, with nothing bound.
pub(crate) fn declared_type(ctx: &Context, ast: &Ast, decl: NodeId) -> Result<TypeId, InternalError> {
    let agg = aggregate_decl(ast, decl)?;
    let generic = !generic_fields(ast, decl)?.is_empty();
    Ok(ctx
        .types()
        .aggregate(decl, agg.name, agg.kind, Substitution::empty(), generic))
}

/// Binding stored for a field: `type` and `param` bindings as given,
/// variables as `var` of the bound type.
pub(crate) fn field_binding(qt: QualifiedType) -> QualifiedType {
    match qt.kind {
        QualKind::Type | QualKind::Param => qt,
        _ => QualifiedType::var(qt.ty),
    }
}

/// Type of `decl` with the generic fields bound by `subs`. Bindings of other
/// declarations are dropped.
pub(crate) fn instantiate_type(
    ctx: &Context,
    ast: &Ast,
    decl: NodeId,
    subs: &Substitution,
) -> Result<TypeId, InternalError> {
    let agg = aggregate_decl(ast, decl)?;
    let generic = generic_fields(ast, decl)?;
    let bound: Substitution = subs
        .iter()
        .filter(|(d, _)| generic.contains(d))
        .map(|(d, qt)| (d, field_binding(qt)))
        .collect();
    let still_generic = generic.iter().any(|&d| !bound.contains(d));
    Ok(ctx
        .types()
        .aggregate(decl, agg.name, agg.kind, bound, still_generic))
}

/// Instance of aggregate `decl` under `subs`, through the instantiation
/// cache.
pub(crate) fn instance(ctx: &Context, decl: NodeId, subs: &Substitution) -> Result<TypeId, InternalError> {
    let ast = ctx.ast(decl.file)?;
    if subs.is_empty() {
        return declared_type(ctx, &ast, decl);
    }
    let key = InstantiationKey {
        generic: GenericKey::Aggregate(decl),
        subs: subs.clone(),
    };
    Instantiate::get(ctx, key)?
        .value
        .ty()
        .ok_or(InternalError::NotADeclaration {
            node: decl,
            expected: "aggregate",
        })
}

/// Field types of aggregate type `ty`.
#[tracing::instrument(level = "debug", skip(ctx))]
pub(crate) fn fields(ctx: &Context, ty: TypeId) -> Result<FieldsInfo, InternalError> {
    let _frame = ctx.push_frame(Frame::Fields(ty));
    let agg = ctx
        .types()
        .aggregate_type(ty)
        .ok_or(InternalError::NotAnAggregate { ty })?;
    let ast = ctx.ast(agg.decl.file)?;
    let decl = aggregate_decl(&ast, agg.decl)?;
    let generic = generic_fields(&ast, agg.decl)?;

    let mut r = Resolver::new(ctx, Arc::clone(&ast), agg.decl, agg.subs.clone());
    r.this_qt = Some(QualifiedType::const_ref(ty));
    let mut fields = Vec::new();
    for &member in &decl.members {
        let Some(NodeKind::Variable(var)) = ast.kind(member) else {
            continue;
        };
        let qt = if let Some(bound) = agg.subs.get(member) {
            let qt = field_binding(bound);
            r.seed(member, qt)?;
            qt
        } else if generic.contains(&member) {
            let qt = match var.kind {
                VarKind::Type => QualifiedType::type_(TypeId::ANY),
                VarKind::Param => {
                    let declared = var.type_expr.map(|t| r.resolve(t)).transpose()?;
                    let ty = declared
                        .filter(|d| d.is_type())
                        .map_or(TypeId::ANY, |d| d.ty);
                    QualifiedType::unbound_param(ty)
                }
                _ => QualifiedType::var(TypeId::ANY),
            };
            r.seed(member, qt)?;
            qt
        } else {
            r.resolve(member)?
        };
        fields.push(FieldInfo {
            decl: member,
            name: var.name,
            qt,
        });
    }

    let errors = r.finish().errors().to_vec();
    Ok(FieldsInfo { fields, errors })
}
