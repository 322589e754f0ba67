//! Resolution errors.
//!
//! [`ResolutionError`]s are ordinary results: they are stored in result
//! tables, compared for early cutoff and rendered as diagnostics on demand.
//! [`InternalError`] is the fatal channel for broken invariants and query
//! cycles; it aborts the request instead of being recorded.

use std::fmt;

use crest_diagnostic::{Diagnostic, ErrorCode};
use crest_ir::{Name, NodeId, Span};
use crest_query::QueryError;
use crest_types::{display_type, TypeId};

use crate::Context;

/// Why one candidate was not applicable to a call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Too many or too few actuals.
    Arity { expected: usize, found: usize },
    /// A named actual matches no formal.
    UnknownNamedActual(Name),
    /// Two actuals map to the same formal.
    DuplicateActual(Name),
    /// Actual type cannot be passed to the formal.
    TypeMismatch {
        formal: Name,
        expected: TypeId,
        found: TypeId,
    },
    /// `ref`, `out` and `inout` formals need a mutable actual.
    NeedsLvalue { formal: Name },
    /// A `type` formal got a value.
    NeedsType { formal: Name },
    /// A `param` formal got something not known at compile time.
    NeedsParam { formal: Name },
    WhereClauseFalse,
    /// A method called without a receiver.
    MissingReceiver,
    /// The instantiated signature is still generic.
    StillGeneric,
}

impl RejectReason {
    fn describe(&self, ctx: &Context) -> String {
        let names = ctx.interner();
        match self {
            RejectReason::Arity { expected, found } => {
                format!("expects {expected} argument(s), found {found}")
            }
            RejectReason::UnknownNamedActual(name) => {
                format!("has no formal named `{}`", names.lookup(*name))
            }
            RejectReason::DuplicateActual(name) => {
                format!("formal `{}` is given more than once", names.lookup(*name))
            }
            RejectReason::TypeMismatch {
                formal,
                expected,
                found,
            } => format!(
                "formal `{}` expects `{}`, found `{}`",
                names.lookup(*formal),
                display_type(ctx.types(), names, *expected),
                display_type(ctx.types(), names, *found)
            ),
            RejectReason::NeedsLvalue { formal } => {
                format!("formal `{}` needs a mutable actual", names.lookup(*formal))
            }
            RejectReason::NeedsType { formal } => {
                format!("formal `{}` expects a type", names.lookup(*formal))
            }
            RejectReason::NeedsParam { formal } => {
                format!("formal `{}` expects a param value", names.lookup(*formal))
            }
            RejectReason::WhereClauseFalse => "where clause is false".to_owned(),
            RejectReason::MissingReceiver => "is a method and needs a receiver".to_owned(),
            RejectReason::StillGeneric => "cannot be instantiated from these actuals".to_owned(),
        }
    }
}

/// A candidate and why it was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rejection {
    pub candidate: NodeId,
    pub reason: RejectReason,
}

/// Coarse grouping of error kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Lookup,
    Call,
    Typing,
    Instantiation,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionErrorKind {
    // Lookup
    UndeclaredIdentifier { name: Name },
    AmbiguousDeclaration { name: Name, decls: Vec<NodeId> },
    UseBeforeDeclaration { name: Name, decl: NodeId },
    UnknownModule { name: Name },
    /// A nested function reads a local of an enclosing function.
    UnsupportedOuterVariable { name: Name, decl: NodeId },

    // Calls
    NoMatchingCandidate { name: Name, rejected: Vec<Rejection> },
    AmbiguousCall { name: Name, candidates: Vec<NodeId> },
    WrongArgumentCount {
        name: Name,
        expected: usize,
        found: usize,
    },
    NotCallable,
    NotDefaultInitializable { ty: TypeId },

    // Typing
    TypeMismatch { expected: TypeId, found: TypeId },
    ExpectedType,
    ExpectedParam,
    ExpectedValue,
    NotAssignable,
    NoSuchMember { member: Name },
    InvalidOperands { op: &'static str },
    InconsistentReturns,
    GenericTypeWithoutInstantiation { ty: TypeId },

    // Instantiation and recursion
    WhereClauseNotParam,
    UnboundedGenericRecursion { function: NodeId },
    RecursiveReturnInference { function: NodeId },
    RecursiveDefinition { decl: NodeId },
}

impl ResolutionErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ResolutionErrorKind::UndeclaredIdentifier { .. }
            | ResolutionErrorKind::AmbiguousDeclaration { .. }
            | ResolutionErrorKind::UseBeforeDeclaration { .. }
            | ResolutionErrorKind::UnknownModule { .. }
            | ResolutionErrorKind::UnsupportedOuterVariable { .. } => ErrorCategory::Lookup,
            ResolutionErrorKind::NoMatchingCandidate { .. }
            | ResolutionErrorKind::AmbiguousCall { .. }
            | ResolutionErrorKind::WrongArgumentCount { .. }
            | ResolutionErrorKind::NotCallable
            | ResolutionErrorKind::NotDefaultInitializable { .. } => ErrorCategory::Call,
            ResolutionErrorKind::TypeMismatch { .. }
            | ResolutionErrorKind::ExpectedType
            | ResolutionErrorKind::ExpectedParam
            | ResolutionErrorKind::ExpectedValue
            | ResolutionErrorKind::NotAssignable
            | ResolutionErrorKind::NoSuchMember { .. }
            | ResolutionErrorKind::InvalidOperands { .. }
            | ResolutionErrorKind::InconsistentReturns
            | ResolutionErrorKind::GenericTypeWithoutInstantiation { .. } => ErrorCategory::Typing,
            ResolutionErrorKind::WhereClauseNotParam
            | ResolutionErrorKind::UnboundedGenericRecursion { .. }
            | ResolutionErrorKind::RecursiveReturnInference { .. }
            | ResolutionErrorKind::RecursiveDefinition { .. } => ErrorCategory::Instantiation,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ResolutionErrorKind::UndeclaredIdentifier { .. } => ErrorCode::E2001,
            ResolutionErrorKind::AmbiguousDeclaration { .. } => ErrorCode::E2002,
            ResolutionErrorKind::UseBeforeDeclaration { .. } => ErrorCode::E2003,
            ResolutionErrorKind::UnknownModule { .. } => ErrorCode::E2004,
            ResolutionErrorKind::UnsupportedOuterVariable { .. } => ErrorCode::E2005,
            ResolutionErrorKind::NoMatchingCandidate { .. } => ErrorCode::E2101,
            ResolutionErrorKind::AmbiguousCall { .. } => ErrorCode::E2102,
            ResolutionErrorKind::WrongArgumentCount { .. } => ErrorCode::E2103,
            ResolutionErrorKind::NotCallable => ErrorCode::E2104,
            ResolutionErrorKind::NotDefaultInitializable { .. } => ErrorCode::E2105,
            ResolutionErrorKind::TypeMismatch { .. }
            | ResolutionErrorKind::NotAssignable
            | ResolutionErrorKind::ExpectedValue => ErrorCode::E2201,
            ResolutionErrorKind::ExpectedType => ErrorCode::E2202,
            ResolutionErrorKind::ExpectedParam => ErrorCode::E2203,
            ResolutionErrorKind::NoSuchMember { .. } => ErrorCode::E2204,
            ResolutionErrorKind::InvalidOperands { .. } => ErrorCode::E2205,
            ResolutionErrorKind::InconsistentReturns => ErrorCode::E2206,
            ResolutionErrorKind::GenericTypeWithoutInstantiation { .. } => ErrorCode::E2207,
            ResolutionErrorKind::WhereClauseNotParam => ErrorCode::E3001,
            ResolutionErrorKind::UnboundedGenericRecursion { .. } => ErrorCode::E3002,
            ResolutionErrorKind::RecursiveReturnInference { .. } => ErrorCode::E3003,
            ResolutionErrorKind::RecursiveDefinition { .. } => ErrorCode::E3004,
        }
    }
}

/// A failure attached to the node that could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolutionError {
    pub node: NodeId,
    pub span: Span,
    pub kind: ResolutionErrorKind,
}

impl ResolutionError {
    pub fn new(node: NodeId, span: Span, kind: ResolutionErrorKind) -> Self {
        ResolutionError { node, span, kind }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Render with names and types spelled out.
    pub fn to_diagnostic(&self, ctx: &Context) -> Diagnostic {
        let names = ctx.interner();
        let ty = |id: TypeId| display_type(ctx.types(), names, id);
        let file = self.node.file;
        let diag = Diagnostic::error(self.kind.code());
        let related = |diag: Diagnostic, decl: NodeId, message: &str| {
            diag.with_secondary_label(decl.file, ctx.span_of(decl), message)
        };

        match &self.kind {
            ResolutionErrorKind::UndeclaredIdentifier { name } => diag
                .with_message(format!("cannot find `{}` in this scope", names.lookup(*name)))
                .with_label(file, self.span, "not found"),
            ResolutionErrorKind::AmbiguousDeclaration { name, decls } => {
                let diag = diag
                    .with_message(format!("`{}` is ambiguous", names.lookup(*name)))
                    .with_label(file, self.span, "refers to more than one declaration");
                decls
                    .iter()
                    .fold(diag, |d, &decl| related(d, decl, "declared here"))
            }
            ResolutionErrorKind::UseBeforeDeclaration { name, decl } => related(
                diag.with_message(format!(
                    "`{}` is used before it is declared",
                    names.lookup(*name)
                ))
                .with_label(file, self.span, "used here"),
                *decl,
                "declared here",
            ),
            ResolutionErrorKind::UnknownModule { name } => diag
                .with_message(format!("cannot find module `{}`", names.lookup(*name)))
                .with_label(file, self.span, "unknown module"),
            ResolutionErrorKind::UnsupportedOuterVariable { name, decl } => related(
                diag.with_message(format!(
                    "nested functions cannot refer to the outer local `{}`",
                    names.lookup(*name)
                ))
                .with_label(file, self.span, "outer local"),
                *decl,
                "declared here",
            ),
            ResolutionErrorKind::NoMatchingCandidate { name, rejected } => {
                let diag = diag
                    .with_message(format!(
                        "no matching candidate for call to `{}`",
                        names.lookup(*name)
                    ))
                    .with_label(file, self.span, "no candidate applies");
                rejected.iter().fold(diag, |d, r| {
                    related(d, r.candidate, &format!("this candidate {}", r.reason.describe(ctx)))
                })
            }
            ResolutionErrorKind::AmbiguousCall { name, candidates } => {
                let diag = diag
                    .with_message(format!("call to `{}` is ambiguous", names.lookup(*name)))
                    .with_label(file, self.span, "more than one best candidate");
                candidates
                    .iter()
                    .fold(diag, |d, &c| related(d, c, "could be this"))
            }
            ResolutionErrorKind::WrongArgumentCount {
                name,
                expected,
                found,
            } => {
                let plural = if *expected == 1 { "" } else { "s" };
                diag.with_message(format!(
                    "`{}` expects {expected} argument{plural}, found {found}",
                    names.lookup(*name)
                ))
                .with_label(file, self.span, format!("expected {expected} argument{plural}"))
            }
            ResolutionErrorKind::NotCallable => diag
                .with_message("expression is not callable")
                .with_label(file, self.span, "cannot call this"),
            ResolutionErrorKind::NotDefaultInitializable { ty: t } => diag
                .with_message(format!("`{}` cannot be default-initialized", ty(*t)))
                .with_label(file, self.span, "needs an initializer"),
            ResolutionErrorKind::TypeMismatch { expected, found } => diag
                .with_message(format!(
                    "type mismatch: expected `{}`, found `{}`",
                    ty(*expected),
                    ty(*found)
                ))
                .with_label(file, self.span, format!("expected `{}`", ty(*expected))),
            ResolutionErrorKind::ExpectedType => diag
                .with_message("expected a type")
                .with_label(file, self.span, "not a type"),
            ResolutionErrorKind::ExpectedParam => diag
                .with_message("expected a value known at compile time")
                .with_label(file, self.span, "not a param"),
            ResolutionErrorKind::ExpectedValue => diag
                .with_message("expected a value")
                .with_label(file, self.span, "not a value"),
            ResolutionErrorKind::NotAssignable => diag
                .with_message("cannot assign to this expression")
                .with_label(file, self.span, "not mutable"),
            ResolutionErrorKind::NoSuchMember { member } => diag
                .with_message(format!("no member named `{}`", names.lookup(*member)))
                .with_label(file, self.span, "unknown member"),
            ResolutionErrorKind::InvalidOperands { op } => diag
                .with_message(format!("invalid operands to `{op}`"))
                .with_label(file, self.span, "unsupported operand types"),
            ResolutionErrorKind::InconsistentReturns => diag
                .with_message("return statements disagree on the returned type")
                .with_label(file, self.span, "inferred return type is inconsistent"),
            ResolutionErrorKind::GenericTypeWithoutInstantiation { ty: t } => diag
                .with_message(format!("`{}` is generic here", ty(*t)))
                .with_label(file, self.span, "needs a concrete type")
                .with_note("provide an initializer or instantiate the type"),
            ResolutionErrorKind::WhereClauseNotParam => diag
                .with_message("where clause must be a param bool")
                .with_label(file, self.span, "not known at compile time"),
            ResolutionErrorKind::UnboundedGenericRecursion { function } => related(
                diag.with_message("generic recursion does not terminate")
                    .with_label(file, self.span, "instantiation requested again here"),
                *function,
                "of this function",
            ),
            ResolutionErrorKind::RecursiveReturnInference { function } => related(
                diag.with_message("cannot infer the return type of a recursive function")
                    .with_label(file, self.span, "recursive call")
                    .with_note("declare the return type explicitly"),
                *function,
                "function declared here",
            ),
            ResolutionErrorKind::RecursiveDefinition { decl } => related(
                diag.with_message("definition depends on itself")
                    .with_label(file, self.span, "cycle reached here"),
                *decl,
                "declared here",
            ),
        }
    }
}

/// Fatal failure of a resolution request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InternalError {
    /// The query substrate failed, for example on a dependency cycle.
    Query(QueryError),
    /// A result table was asked for a node it should contain.
    MissingResult { node: NodeId },
    /// A node was recorded twice in one result table.
    ResultWrittenTwice { node: NodeId },
    UnknownFile { file: u32 },
    UnknownNode { node: NodeId },
    UnknownSignature { raw: u32 },
    /// A node of the wrong kind was passed where a declaration was needed.
    NotADeclaration { node: NodeId, expected: &'static str },
    /// A type without fields was used where an aggregate was needed.
    NotAnAggregate { ty: TypeId },
    /// Unwinds an instantiation chain that went past the depth limit. The
    /// body that started the chain catches it and reports the call, so it
    /// never reaches a caller of the public API.
    InstantiationTooDeep,
}

impl InternalError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InternalError::Query(_) => ErrorCode::E9001,
            InternalError::MissingResult { .. } | InternalError::ResultWrittenTwice { .. } => {
                ErrorCode::E9002
            }
            InternalError::UnknownFile { .. }
            | InternalError::UnknownNode { .. }
            | InternalError::UnknownSignature { .. }
            | InternalError::NotADeclaration { .. }
            | InternalError::NotAnAggregate { .. } => ErrorCode::E9003,
            InternalError::InstantiationTooDeep => ErrorCode::E9002,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(format!("internal resolver error: {self}"))
            .with_note("this is a bug in the resolver, not in the program")
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalError::Query(e) => write!(f, "{e}"),
            InternalError::MissingResult { node } => write!(f, "no result recorded for {node}"),
            InternalError::ResultWrittenTwice { node } => {
                write!(f, "result for {node} written twice")
            }
            InternalError::UnknownFile { file } => write!(f, "unknown file {file}"),
            InternalError::UnknownNode { node } => write!(f, "unknown node {node}"),
            InternalError::UnknownSignature { raw } => write!(f, "unknown signature {raw}"),
            InternalError::NotADeclaration { node, expected } => {
                write!(f, "{node} is not a {expected} declaration")
            }
            InternalError::NotAnAggregate { ty } => write!(f, "type {} is not an aggregate", ty.raw()),
            InternalError::InstantiationTooDeep => {
                write!(f, "instantiation chain escaped the body that started it")
            }
        }
    }
}

impl std::error::Error for InternalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InternalError::Query(e) => Some(e),
            _ => None,
        }
    }
}

impl From<QueryError> for InternalError {
    fn from(e: QueryError) -> Self {
        InternalError::Query(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_the_error_family() {
        let name = Name::from_raw(40);
        assert_eq!(
            ResolutionErrorKind::UndeclaredIdentifier { name }.category(),
            ErrorCategory::Lookup
        );
        assert_eq!(
            ResolutionErrorKind::AmbiguousCall {
                name,
                candidates: vec![]
            }
            .category(),
            ErrorCategory::Call
        );
        assert_eq!(
            ResolutionErrorKind::InconsistentReturns.category(),
            ErrorCategory::Typing
        );
        assert!(ResolutionErrorKind::WhereClauseNotParam
            .code()
            .is_instantiation_error());
    }

    #[test]
    fn query_errors_convert_to_internal() {
        let err = InternalError::from(QueryError::UnknownIngredient { index: 3 });
        assert_eq!(err.code(), ErrorCode::E9001);
        assert!(err.code().is_internal());
        assert!(err.to_string().contains("unknown ingredient 3"));
    }
}
