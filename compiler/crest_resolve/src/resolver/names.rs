//! Identifiers, member access and `use` directives.

use crest_ir::{Name, NodeId, NodeKind};
use crest_query::Query;
use crest_types::{ParamValue, QualKind, QualifiedType, TypeData, TypeId, TypePool};

use super::{Outcome, Resolver};
use crate::aggregate::{self, FieldInfo};
use crate::context::Frame;
use crate::error::{InternalError, ResolutionErrorKind};
use crate::lookup::{LookupMode, LookupResult, Target};
use crate::queries::{AggregateFields, LookupKey, LookupQuery, ResolveModuleStmt};
use crate::result::ResolvedExpr;
use crate::scope::enclosing_scope;

impl Resolver<'_> {
    pub(super) fn resolve_use(&mut self, id: NodeId, target: Name) -> Result<ResolvedExpr, InternalError> {
        let Some(scope) = enclosing_scope(&self.ast, id) else {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::UnknownModule {
                name: target,
            }));
        };
        let found = self.lookup(scope, target, LookupMode::ModuleName)?;
        if found.is_empty() {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::UnknownModule {
                name: target,
            }));
        }
        Ok(ResolvedExpr::statement().with_targets(found.targets.iter().copied()))
    }

    pub(crate) fn lookup(
        &self,
        scope: NodeId,
        name: Name,
        mode: LookupMode,
    ) -> Result<std::sync::Arc<LookupResult>, InternalError> {
        LookupQuery::get(self.ctx, LookupKey { scope, name, mode })
    }

    pub(super) fn resolve_identifier(
        &mut self,
        id: NodeId,
        name: Name,
    ) -> Result<ResolvedExpr, InternalError> {
        if name == Name::THIS {
            if let Some(this) = self.this_qt {
                return Ok(ResolvedExpr::of(this));
            }
        }
        let Some(scope) = enclosing_scope(&self.ast, id) else {
            return Ok(ResolvedExpr::failed(
                ResolutionErrorKind::UndeclaredIdentifier { name },
            ));
        };
        let found = self.lookup(scope, name, LookupMode::Lexical)?;
        self.resolve_targets(id, name, &found)
    }

    /// Turn a lookup result into the node's type.
    fn resolve_targets(
        &mut self,
        use_site: NodeId,
        name: Name,
        found: &LookupResult,
    ) -> Result<ResolvedExpr, InternalError> {
        if found.ambiguous {
            return Ok(ResolvedExpr::failed(
                ResolutionErrorKind::AmbiguousDeclaration {
                    name,
                    decls: found.decls().collect(),
                },
            ));
        }
        let targets = found.targets.iter().copied();
        match found.targets.as_slice() {
            [] => Ok(ResolvedExpr::failed(
                ResolutionErrorKind::UndeclaredIdentifier { name },
            )),
            [Target::Builtin(ty)] => {
                Ok(ResolvedExpr::of(QualifiedType::type_(*ty)).with_targets(targets))
            }
            [Target::Decl(decl)] => {
                let expr = match self.decl_type(use_site, name, *decl)? {
                    Ok(qt) => ResolvedExpr::of(qt),
                    Err(kind) => ResolvedExpr::failed(kind),
                };
                Ok(expr.with_targets(targets))
            }
            // Several targets survive lookup only when all are functions.
            _ => Ok(ResolvedExpr::of(QualifiedType::function()).with_targets(targets)),
        }
    }

    /// Type of the declaration `decl`, referenced as `name` at `use_site`.
    pub(crate) fn decl_type(
        &mut self,
        use_site: NodeId,
        name: Name,
        decl: NodeId,
    ) -> Result<Outcome<QualifiedType>, InternalError> {
        let ast = self.ctx.ast(decl.file)?;
        let kind = ast.kind(decl).ok_or(InternalError::UnknownNode { node: decl })?;
        match kind {
            NodeKind::Module { .. } => return Ok(Ok(QualifiedType::module())),
            NodeKind::Function(_) => return Ok(Ok(QualifiedType::function())),
            NodeKind::Aggregate(_) => {
                let ty = aggregate::declared_type(self.ctx, &ast, decl)?;
                return Ok(Ok(QualifiedType::type_(ty)));
            }
            NodeKind::Formal(_) | NodeKind::TypeQuery(_) => {
                if let Some(bound) = self.subs.get(decl) {
                    return Ok(Ok(bound));
                }
            }
            NodeKind::Variable(_) => {}
            _ => {
                return Err(InternalError::NotADeclaration {
                    node: decl,
                    expected: "named",
                })
            }
        }
        if let Some(qt) = self.result.qt(decl) {
            return Ok(Ok(qt));
        }

        let parent = ast.parent(decl);
        let parent_kind = parent.and_then(|p| ast.kind(p));
        if matches!(parent_kind, Some(NodeKind::Aggregate(_))) {
            return self.field_type(name, decl);
        }
        if decl.file == self.root.file && self.ast.contains(self.root, decl) {
            return Ok(Err(ResolutionErrorKind::UseBeforeDeclaration { name, decl }));
        }
        match (parent, parent_kind) {
            (Some(module), Some(NodeKind::Module { .. })) => {
                self.module_variable_type(use_site, name, module, decl)
            }
            _ => Ok(Err(ResolutionErrorKind::UnsupportedOuterVariable { name, decl })),
        }
    }

    fn field_type(
        &mut self,
        name: Name,
        decl: NodeId,
    ) -> Result<Outcome<QualifiedType>, InternalError> {
        let Some(this) = self.this_qt else {
            return Ok(Err(ResolutionErrorKind::UnsupportedOuterVariable { name, decl }));
        };
        let Some(fields) = self.fields_of(this.ty)? else {
            return Ok(Err(ResolutionErrorKind::RecursiveDefinition { decl }));
        };
        Ok(fields
            .into_iter()
            .find(|f| f.decl == decl)
            .map(|f| field_access(this, f.qt))
            .ok_or(ResolutionErrorKind::UnsupportedOuterVariable { name, decl }))
    }

    /// Fields of aggregate `ty`, or `None` when they are being computed
    /// on this thread already.
    fn fields_of(&self, ty: TypeId) -> Result<Option<Vec<FieldInfo>>, InternalError> {
        if self.ctx.reentry(&Frame::Fields(ty)).is_some() {
            tracing::debug!(?ty, "fields requested while computing them");
            return Ok(None);
        }
        Ok(Some(AggregateFields::get(self.ctx, ty)?.fields.clone()))
    }

    fn module_variable_type(
        &mut self,
        use_site: NodeId,
        name: Name,
        module: NodeId,
        decl: NodeId,
    ) -> Result<Outcome<QualifiedType>, InternalError> {
        // Module initialization runs statements in order.
        let root_kind = self.ast.kind(self.root);
        let runs_at_init = self.ast.parent(self.root) == Some(module)
            && !matches!(
                root_kind,
                Some(NodeKind::Function(_) | NodeKind::Aggregate(_))
            );
        if runs_at_init {
            let scope = self.ctx.scope(module)?;
            if let (Some(used), Some(declared)) = (scope.position(self.root), scope.position(decl)) {
                if used < declared {
                    return Ok(Err(ResolutionErrorKind::UseBeforeDeclaration { name, decl }));
                }
            }
        }
        if self.ctx.reentry(&Frame::ModuleStmt(decl)).is_some() {
            tracing::debug!(use_site = %use_site, %decl, "module variable depends on itself");
            return Ok(Err(ResolutionErrorKind::RecursiveDefinition { decl }));
        }
        let table = ResolveModuleStmt::get(self.ctx, decl)?;
        Ok(Ok(table.require(decl)?.qt))
    }

    pub(super) fn resolve_dot(
        &mut self,
        id: NodeId,
        receiver: NodeId,
        member: Name,
    ) -> Result<ResolvedExpr, InternalError> {
        let recv = self.resolve(receiver)?;
        if recv.is_erroneous() {
            return Ok(ResolvedExpr::erroneous());
        }
        let no_member = || ResolvedExpr::failed(ResolutionErrorKind::NoSuchMember { member });
        match recv.kind {
            QualKind::Module => {
                let module = self
                    .result
                    .get(receiver)
                    .and_then(|r| r.targets.iter().find_map(|t| t.decl()));
                let Some(module) = module else {
                    return Ok(no_member());
                };
                let found = self.lookup(module, member, LookupMode::Members)?;
                if found.is_empty() {
                    return Ok(no_member());
                }
                self.resolve_targets(id, member, &found)
            }
            QualKind::Type => Ok(self
                .type_member(recv, member)?
                .map_or_else(no_member, ResolvedExpr::of)),
            kind if kind.is_value_like() => self.value_member(recv, member),
            _ => Ok(no_member()),
        }
    }

    /// `T.eltType`, `T.idxType`, `T.rank` and type or param fields of `T`.
    fn type_member(
        &mut self,
        recv: QualifiedType,
        member: Name,
    ) -> Result<Option<QualifiedType>, InternalError> {
        let types = self.ctx.types();
        if let Some(qt) = shape_member(types, recv.ty, member) {
            return Ok(Some(qt));
        }
        if types.aggregate_type(recv.ty).is_some() {
            let Some(fields) = self.fields_of(recv.ty)? else {
                return Ok(None);
            };
            return Ok(fields
                .into_iter()
                .find(|f| f.name == member && matches!(f.qt.kind, QualKind::Type | QualKind::Param))
                .map(|f| f.qt));
        }
        Ok(None)
    }

    fn value_member(
        &mut self,
        recv: QualifiedType,
        member: Name,
    ) -> Result<ResolvedExpr, InternalError> {
        let types = self.ctx.types();
        if member == Name::TYPE {
            return Ok(ResolvedExpr::of(QualifiedType::type_(recv.ty)));
        }
        let data = types.get(recv.ty);
        let builtin = match (&data, member) {
            (TypeData::Array { domain, .. }, Name::DOMAIN) => {
                Some(QualifiedType::const_ref(*domain))
            }
            (TypeData::Array { .. } | TypeData::Domain(_) | TypeData::Range { .. }, Name::SIZE) => {
                Some(QualifiedType::value(TypeId::INT))
            }
            (TypeData::Tuple(elems), Name::SIZE) => Some(QualifiedType::param(
                ParamValue::Int(i64::try_from(elems.len()).unwrap_or(i64::MAX)),
            )),
            (TypeData::Array { .. } | TypeData::Domain(_) | TypeData::Range { .. }, _) => {
                shape_member(types, recv.ty, member)
            }
            _ => None,
        };
        if let Some(qt) = builtin {
            return Ok(ResolvedExpr::of(qt));
        }

        let Some(agg) = types.aggregate_type(recv.ty) else {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::NoSuchMember { member }));
        };
        let Some(fields) = self.fields_of(recv.ty)? else {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::RecursiveDefinition {
                decl: agg.decl,
            }));
        };
        if let Some(field) = fields.into_iter().find(|f| f.name == member) {
            return Ok(ResolvedExpr::of(field_access(recv, field.qt))
                .with_targets([Target::Decl(field.decl)]));
        }
        let methods = self.lookup(agg.decl, member, LookupMode::Members)?;
        let mut decls = Vec::new();
        for decl in methods.decls() {
            if crate::lookup::is_function(self.ctx, decl)? {
                decls.push(Target::Decl(decl));
            }
        }
        if decls.is_empty() {
            return Ok(ResolvedExpr::failed(ResolutionErrorKind::NoSuchMember { member }));
        }
        Ok(ResolvedExpr::of(QualifiedType::function()).with_targets(decls))
    }
}

/// Members every array, domain and range type answers.
fn shape_member(
    types: &TypePool,
    ty: TypeId,
    member: Name,
) -> Option<QualifiedType> {
    let data = types.get(ty);
    match member {
        Name::ELT_TYPE => types.array_parts(ty).map(|(_, elt)| QualifiedType::type_(elt)),
        Name::IDX_TYPE => types.index_type(ty).map(QualifiedType::type_),
        Name::RANK if matches!(data, TypeData::Array { .. } | TypeData::Domain(_)) => types
            .rank(ty)
            .map(|rank| QualifiedType::param(ParamValue::Int(i64::from(rank)))),
        _ => None,
    }
}

/// Kind of a field read through a receiver of kind `recv`.
fn field_access(recv: QualifiedType, field: QualifiedType) -> QualifiedType {
    match field.kind {
        QualKind::Type | QualKind::Param => field,
        _ if recv.kind.is_lvalue() => QualifiedType::ref_(field.ty),
        _ => QualifiedType::const_ref(field.ty),
    }
}
