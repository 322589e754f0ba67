use std::fmt;

use crest_ir::{FileId, Span};

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled span with a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub file: FileId,
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

impl Label {
    /// Create a primary label (the main error location).
    pub fn primary(file: FileId, span: Span, message: impl Into<String>) -> Self {
        Label {
            file,
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a secondary label (related context).
    pub fn secondary(file: FileId, span: Span, message: impl Into<String>) -> Self {
        Label {
            file,
            span,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// One reported problem.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a primary label at the error location.
    pub fn with_label(mut self, file: FileId, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(file, span, message));
        self
    }

    /// Add a secondary label for context.
    pub fn with_secondary_label(
        mut self,
        file: FileId,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(Label::secondary(file, span, message));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.is_primary).map(|l| l.span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    pub fn secondary_labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter().filter(|l| !l.is_primary)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;

        for label in &self.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            write!(
                f,
                "\n  {} {:?} {:?}: {}",
                marker, label.file, label.span, label.message
            )?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_collects_labels_in_order() {
        let file = FileId::new(0);
        let diag = Diagnostic::error(ErrorCode::E2102)
            .with_message("ambiguous call to `f`")
            .with_label(file, Span::new(10, 14), "call here")
            .with_secondary_label(file, Span::new(0, 3), "candidate")
            .with_secondary_label(file, Span::new(4, 7), "candidate");

        assert!(diag.is_error());
        assert_eq!(diag.primary_span(), Some(Span::new(10, 14)));
        assert_eq!(diag.secondary_labels().count(), 2);
    }

    #[test]
    fn display_includes_code_and_labels() {
        let file = FileId::new(2);
        let diag = Diagnostic::error(ErrorCode::E2001)
            .with_message("undeclared identifier `x`")
            .with_label(file, Span::new(1, 2), "not found in this scope")
            .with_note("declare `x` before use");
        let text = diag.to_string();
        assert!(text.starts_with("error [E2001]: undeclared identifier `x`"));
        assert!(text.contains("--> FileId(2) 1..2: not found in this scope"));
        assert!(text.contains("= note: declare `x` before use"));
    }
}
