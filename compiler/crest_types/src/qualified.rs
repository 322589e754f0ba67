//! Qualified types: what a node denotes, its type and compile-time value.

use crate::{ParamValue, TypeId};

/// What kind of entity an expression denotes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum QualKind {
    #[default]
    Unknown,
    /// The expression is a type.
    Type,
    /// A compile-time value.
    Param,
    /// Mutable variable (an l-value).
    Var,
    /// Immutable variable.
    ConstVar,
    /// Mutable reference (an l-value).
    Ref,
    ConstRef,
    /// Temporary produced by an expression.
    Value,
    /// A function name, resolved by the enclosing call.
    Function,
    /// A module name.
    Module,
}

impl QualKind {
    pub fn is_lvalue(self) -> bool {
        matches!(self, QualKind::Var | QualKind::Ref)
    }

    /// Kinds that carry a runtime value of their type.
    pub fn is_value_like(self) -> bool {
        matches!(
            self,
            QualKind::Param
                | QualKind::Var
                | QualKind::ConstVar
                | QualKind::Ref
                | QualKind::ConstRef
                | QualKind::Value
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualKind::Unknown => "unknown",
            QualKind::Type => "type",
            QualKind::Param => "param",
            QualKind::Var => "var",
            QualKind::ConstVar => "const",
            QualKind::Ref => "ref",
            QualKind::ConstRef => "const ref",
            QualKind::Value => "value",
            QualKind::Function => "function",
            QualKind::Module => "module",
        }
    }
}

/// Kind + type + optional compile-time value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct QualifiedType {
    pub kind: QualKind,
    pub ty: TypeId,
    pub param: Option<ParamValue>,
}

impl QualifiedType {
    pub const UNKNOWN: QualifiedType = QualifiedType {
        kind: QualKind::Unknown,
        ty: TypeId::UNKNOWN,
        param: None,
    };

    pub const fn new(kind: QualKind, ty: TypeId) -> Self {
        QualifiedType {
            kind,
            ty,
            param: None,
        }
    }

    /// Placeholder recorded on failed nodes.
    pub const fn erroneous() -> Self {
        Self::new(QualKind::Value, TypeId::ERRONEOUS)
    }

    pub const fn type_(ty: TypeId) -> Self {
        Self::new(QualKind::Type, ty)
    }

    /// Known compile-time value; its type is the value's intrinsic type.
    pub fn param(value: ParamValue) -> Self {
        QualifiedType {
            kind: QualKind::Param,
            ty: value.type_id(),
            param: Some(value),
        }
    }

    /// A `param` formal or field whose value is not bound yet.
    pub const fn unbound_param(ty: TypeId) -> Self {
        Self::new(QualKind::Param, ty)
    }

    pub const fn var(ty: TypeId) -> Self {
        Self::new(QualKind::Var, ty)
    }

    pub const fn const_var(ty: TypeId) -> Self {
        Self::new(QualKind::ConstVar, ty)
    }

    pub const fn ref_(ty: TypeId) -> Self {
        Self::new(QualKind::Ref, ty)
    }

    pub const fn const_ref(ty: TypeId) -> Self {
        Self::new(QualKind::ConstRef, ty)
    }

    pub const fn value(ty: TypeId) -> Self {
        Self::new(QualKind::Value, ty)
    }

    pub const fn function() -> Self {
        Self::new(QualKind::Function, TypeId::VOID)
    }

    pub const fn module() -> Self {
        Self::new(QualKind::Module, TypeId::VOID)
    }

    #[inline]
    pub fn is_unknown(self) -> bool {
        self.kind == QualKind::Unknown || self.ty == TypeId::UNKNOWN
    }

    #[inline]
    pub fn is_erroneous(self) -> bool {
        self.ty == TypeId::ERRONEOUS
    }

    #[inline]
    pub fn is_type(self) -> bool {
        self.kind == QualKind::Type
    }

    /// A param with a known value.
    #[inline]
    pub fn is_known_param(self) -> bool {
        self.kind == QualKind::Param && self.param.is_some()
    }

    #[must_use]
    pub fn with_kind(self, kind: QualKind) -> Self {
        QualifiedType { kind, ..self }
    }

    /// Same type as a fresh value, dropping any compile-time value.
    #[must_use]
    pub fn to_value(self) -> Self {
        Self::value(self.ty)
    }
}
