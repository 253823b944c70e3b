use crate::syntax::Span;
use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

/// Accumulates problems for one header without stopping at the first.
#[derive(Default)]
pub struct Errors {
    diagnostics: Vec<Diagnostic>,
}

impl Errors {
    pub fn new() -> Self {
        Errors {
            diagnostics: Vec::new(),
        }
    }

    pub fn error(&mut self, span: Span, msg: impl Display) {
        self.push(Diagnostic {
            severity: Severity::Error,
            message: msg.to_string(),
            span,
        });
    }

    pub fn warning(&mut self, span: Span, msg: impl Display) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            message: msg.to_string(),
            span,
        });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// In source order, so the report reads top to bottom.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| (d.span.lo, d.span.hi));
        self.diagnostics
    }
}
