use crate::gen::fs;
use crate::syntax;
use crate::syntax::report::{self, Severity};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::WriteColor;
use codespan_reporting::term::{self, Config};
use std::path::PathBuf;
use std::str::Utf8Error;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] fs::Error),
    #[error("failed to parse config `{file}`", file = .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{file}` is not valid UTF-8", file = .0.display())]
    Utf8(PathBuf, #[source] Utf8Error),
    #[error("no input headers")]
    NoInput,
}

/// Renders the diagnostics of one header to the terminal.
pub(crate) fn emit(
    stderr: &mut dyn WriteColor,
    name: &str,
    source: &str,
    diagnostics: &[report::Diagnostic],
) {
    let mut files = SimpleFiles::new();
    let file = files.add(name, source);
    let config = Config::default();
    for diagnostic in diagnostics {
        let diagnostic = diagnose(file, source.len(), diagnostic);
        let _ = term::emit(stderr, &config, &files, &diagnostic);
    }
}

fn diagnose(file: usize, len: usize, reported: &report::Diagnostic) -> Diagnostic<usize> {
    let message = &reported.message;
    let info = syntax::error::ERRORS
        .iter()
        .find(|e| message.contains(e.msg));
    let mut diagnostic = match reported.severity {
        Severity::Error => Diagnostic::error(),
        Severity::Warning => Diagnostic::warning(),
    }
    .with_message(message);
    let lo = reported.span.lo.min(len);
    let hi = reported.span.hi.clamp(lo, len);
    let mut label = Label::primary(file, lo..hi);
    if let Some(info) = info {
        label.message = info.label.map_or_else(|| message.clone(), str::to_owned);
        diagnostic.labels.push(label);
        diagnostic.notes.extend(info.note.map(str::to_owned));
    } else {
        label.message = message.clone();
        diagnostic.labels.push(label);
    }
    diagnostic.code = Some("cppfier".to_owned());
    diagnostic
}

#[cfg(test)]
mod tests {
    use super::diagnose;
    use crate::syntax::report::{Diagnostic, Severity};
    use crate::syntax::Span;

    #[test]
    fn test_known_error_gets_label_and_note() {
        let reported = Diagnostic {
            severity: Severity::Error,
            message: "unbalanced parentheses in signature".to_owned(),
            span: Span::new(4, 5),
        };
        let diagnostic = diagnose(0, 10, &reported);
        assert_eq!(diagnostic.code.as_deref(), Some("cppfier"));
        assert_eq!(diagnostic.labels[0].message, "this parenthesis is never closed");
        assert_eq!(diagnostic.labels[0].range, 4..5);
        assert_eq!(diagnostic.notes, ["the declaration was skipped"]);
    }

    #[test]
    fn test_span_is_clamped_to_source() {
        let reported = Diagnostic {
            severity: Severity::Warning,
            message: "something new".to_owned(),
            span: Span::new(8, 20),
        };
        let diagnostic = diagnose(0, 10, &reported);
        assert_eq!(diagnostic.labels[0].range, 8..10);
        assert_eq!(diagnostic.labels[0].message, "something new");
        assert!(diagnostic.notes.is_empty());
    }

    #[test]
    fn test_notes_are_not_prefixed() {
        let reported = Diagnostic {
            severity: Severity::Error,
            message: "discriminant overflow on value after `MyLAST`".to_owned(),
            span: Span::new(0, 6),
        };
        let diagnostic = diagnose(0, 10, &reported);
        assert_eq!(
            diagnostic.notes,
            ["give the enumerator an explicit value to restart the sequence"],
        );
        for error in crate::syntax::error::ERRORS {
            assert!(!error.note.is_some_and(|note| note.starts_with("note:")), "{}", error.msg);
        }
    }
}
