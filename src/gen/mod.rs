// Functionality shared between the library entry points, the fixture harness
// and the cppfier CLI command.

pub(crate) mod classify;
pub mod error;
pub(crate) mod fs;
pub(crate) mod include;
pub(crate) mod out;
mod write;

use crate::syntax::report::{Diagnostic, Errors, Severity};
use crate::syntax::{self, Decl, ParseOpt, Types};
use codespan_reporting::term::termcolor::WriteColor;
use std::path::Path;

pub use self::error::Error;
use self::error::Result;

/// Options for wrapper generation.
///
/// Create a default value and mutate the fields you want to change.
///
/// ```
/// # use cppfier::Opt;
/// #
/// let mut opt = Opt::default();
/// opt.namespace = Some("SDL".to_owned());
/// opt.prefixes = vec!["SDL_".to_owned()];
/// opt.ignore_tokens = vec!["SDL_DECLSPEC".to_owned(), "SDLCALL".to_owned()];
/// ```
#[derive(Clone, Debug)]
pub struct Opt {
    /// Namespace the wrappers are emitted into. None emits at global scope,
    /// where a wrapper that would keep its source name is skipped.
    pub namespace: Option<String>,
    /// Library prefixes stripped from source names, tried in order.
    pub prefixes: Vec<String>,
    /// Attribute-like macros the parser skips, such as `SDL_DECLSPEC`.
    pub ignore_tokens: Vec<String>,
    pub constructor_verbs: Vec<String>,
    pub destructor_verbs: Vec<String>,
    /// Prepended to the source header name, giving `#include <prefix/name.h>`
    /// instead of `#include "name.h"`.
    pub include_prefix: Option<String>,
}

pub const CONSTRUCTOR_VERBS: &[&str] = &["Create", "Open", "New", "Load", "Make", "Alloc", "Acquire"];
pub const DESTRUCTOR_VERBS: &[&str] = &["Destroy", "Close", "Free", "Release", "Delete", "Unload"];

impl Default for Opt {
    fn default() -> Self {
        Opt {
            namespace: None,
            prefixes: Vec::new(),
            ignore_tokens: Vec::new(),
            constructor_verbs: CONSTRUCTOR_VERBS.iter().map(|&verb| verb.to_owned()).collect(),
            destructor_verbs: DESTRUCTOR_VERBS.iter().map(|&verb| verb.to_owned()).collect(),
            include_prefix: None,
        }
    }
}

/// One source header of a run.
#[derive(Clone, Debug)]
pub struct Input {
    /// File name as written in the generated `#include`.
    pub name: String,
    /// File name of the generated wrapper header.
    pub output: String,
    pub source: String,
}

impl Input {
    pub fn new(name: impl Into<String>, output: impl Into<String>, source: impl Into<String>) -> Self {
        Input {
            name: name.into(),
            output: output.into(),
            source: source.into(),
        }
    }

    pub fn from_path(path: &Path, output: impl Into<String>) -> Result<Self> {
        let bytes = fs::read(path)?;
        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(err) => return Err(Error::Utf8(path.to_owned(), err.utf8_error())),
        };
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Input::new(name, output, source))
    }
}

/// Default output name: the input stem with the first matching prefix
/// stripped, plus `.hpp`. `SDL_video.h` becomes `video.hpp` under the
/// prefix `SDL_`.
pub fn default_output_name(input: &str, prefixes: &[String]) -> String {
    let stem = match input.rfind('.') {
        Some(dot) if dot > 0 => &input[..dot],
        _ => input,
    };
    let stem = prefixes
        .iter()
        .filter_map(|prefix| stem.strip_prefix(prefix.as_str()))
        .find(|rest| !rest.is_empty())
        .unwrap_or(stem);
    format!("{}.hpp", stem)
}

/// A generated wrapper header.
pub struct GeneratedFile {
    /// Output file name, relative to the output directory.
    pub path: String,
    pub content: String,
    /// Source names of the declarations that produced output, in order.
    pub decls: Vec<String>,
    /// Every emitted constant and enumerator, in order.
    pub constants: Vec<EmittedConstant>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmittedConstant {
    pub name: String,
    /// Source symbol the constant refers to.
    pub source: String,
    /// Evaluated value, when the source expression could be computed.
    pub value: Option<i128>,
}

/// Diagnostics collected for one input header.
pub struct FileReport {
    pub name: String,
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Results of one run: one generated file per input, in input order, plus
/// the diagnostics. Output is produced even for inputs with errors.
pub struct Generation {
    pub files: Vec<GeneratedFile>,
    pub reports: Vec<FileReport>,
}

impl Generation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics().any(|d| d.severity == Severity::Warning)
    }

    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.diagnostics().next().is_none()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter().flat_map(|report| &report.diagnostics)
    }

    pub fn emit_diagnostics(&self, stderr: &mut dyn WriteColor) {
        for report in &self.reports {
            error::emit(stderr, &report.name, &report.source, &report.diagnostics);
        }
    }
}

pub fn generate(inputs: &[Input], opt: &Opt) -> Generation {
    let parse_opt = ParseOpt {
        ignore: &opt.ignore_tokens,
    };
    let mut errors: Vec<Errors> = inputs.iter().map(|_| Errors::new()).collect();
    let files: Vec<Vec<Decl>> = inputs
        .iter()
        .zip(&mut errors)
        .map(|(input, errors)| {
            let decls = syntax::parse_file(&input.source, &parse_opt, errors);
            tracing::debug!(file = %input.name, decls = decls.len(), "parsed");
            decls
        })
        .collect();

    let types = Types::collect(&files);
    let plan = classify::plan(&files, &types, opt, &mut errors);
    let generated = plan
        .files
        .iter()
        .enumerate()
        .map(|(file, file_plan)| write::gen(file, inputs, file_plan, &plan.renames, opt))
        .collect();

    let reports = inputs
        .iter()
        .zip(errors)
        .filter(|(_, errors)| !errors.is_empty())
        .map(|(input, errors)| FileReport {
            name: input.name.clone(),
            source: input.source.clone(),
            diagnostics: errors.into_sorted(),
        })
        .collect();

    Generation {
        files: generated,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::default_output_name;

    #[test]
    fn test_default_output_name() {
        let prefixes = vec!["SDL_".to_owned()];
        assert_eq!(default_output_name("SDL_video.h", &prefixes), "video.hpp");
        assert_eq!(default_output_name("functions.h", &prefixes), "functions.hpp");
        assert_eq!(default_output_name("SDL_.h", &prefixes), "SDL_.hpp");
        assert_eq!(default_output_name("noext", &[]), "noext.hpp");
    }
}
