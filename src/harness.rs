//! Fixture comparison for generated headers.
//!
//! Both texts are lexed, which drops comments and whitespace, and split into
//! top-level declarations. `namespace` and `extern "C"` blocks are
//! transparent except that they qualify the names inside them. The first
//! declaration that differs is reported by name.

use crate::config::Config;
use crate::error::Error;
use crate::gen::{self, fs, Generation};
use crate::syntax::lex::{self, Token, TokenKind};
use crate::syntax::report::Errors;
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};

/// One top-level declaration of a header.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Qualified name, such as `SDL::Window` or `SDL::Window::GetTitle`.
    pub name: String,
    pub tokens: Vec<String>,
}

impl Item {
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// The first declaration at which two headers differ.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub name: String,
    /// None when the expected header ended first.
    pub expected: Option<String>,
    /// None when the generated header ended first.
    pub actual: Option<String>,
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "first differing declaration: `{}`", self.name)?;
        writeln!(f, "  expected: {}", self.expected.as_deref().unwrap_or("(nothing)"))?;
        write!(f, "  actual:   {}", self.actual.as_deref().unwrap_or("(nothing)"))
    }
}

#[derive(Debug)]
pub enum Failure {
    /// No fixture exists for a generated file.
    Missing { path: PathBuf },
    Differs { path: PathBuf, mismatch: Mismatch },
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Failure::Missing { path } => write!(f, "{}: no such file", path.display()),
            Failure::Differs { path, mismatch } => write!(f, "{}: {}", path.display(), mismatch),
        }
    }
}

/// Result of checking a fixture directory.
pub struct Report {
    pub generation: Generation,
    pub checked: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl Report {
    /// True when every generated file matched its fixture.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn outline(text: &str) -> Vec<Item> {
    let mut errors = Errors::new();
    let tokens = lex::tokenize(text, &mut errors)
        .into_iter()
        .filter(|token| !token.is_doc())
        .collect();
    let mut outliner = Outliner {
        text,
        tokens,
        pos: 0,
        scopes: Vec::new(),
        items: Vec::new(),
    };
    outliner.run();
    outliner.items
}

pub fn compare(expected: &str, actual: &str) -> Result<(), Mismatch> {
    let expected = outline(expected);
    let actual = outline(actual);
    for i in 0..expected.len().max(actual.len()) {
        match (expected.get(i), actual.get(i)) {
            (Some(e), Some(a)) if e == a => {}
            (e, a) => {
                let name = e.or(a).map(|item| item.name.clone()).unwrap_or_default();
                return Err(Mismatch {
                    name,
                    expected: e.map(Item::text),
                    actual: a.map(Item::text),
                });
            }
        }
    }
    Ok(())
}

/// Compares every generated file with the file of the same name in
/// `output_dir`.
pub fn check(generation: &Generation, output_dir: &Path) -> Result<Vec<Failure>, Error> {
    let mut failures = Vec::new();
    for file in &generation.files {
        let path = output_dir.join(&file.path);
        let expected = match fs::read_to_string(&path) {
            Ok(expected) => expected,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                failures.push(Failure::Missing { path });
                continue;
            }
            Err(err) => return Err(Error::from(err)),
        };
        if let Err(mismatch) = compare(&expected, &file.content) {
            tracing::debug!(path = %path.display(), name = %mismatch.name, "mismatch");
            failures.push(Failure::Differs { path, mismatch });
        }
    }
    Ok(failures)
}

/// Generates every `*.h` in `dir` using `dir/config.json`, when present, and
/// compares each result with its sibling output file.
pub fn check_dir(dir: &Path) -> Result<Report, Error> {
    let config_path = dir.join("config.json");
    let mut config = if config_path.is_file() {
        Config::load(&config_path)?
    } else {
        Config {
            source_dir: Some(dir.to_owned()),
            ..Config::default()
        }
    };
    let output_dir = config
        .output_dir
        .take()
        .or_else(|| config.source_dir.clone())
        .unwrap_or_else(|| dir.to_owned());

    let inputs = config.inputs()?;
    let generation = gen::generate(&inputs, &config.opt());
    let failures = check(&generation, &output_dir)?;
    let checked = generation
        .files
        .iter()
        .map(|file| output_dir.join(&file.path))
        .collect();
    Ok(Report {
        generation,
        checked,
        failures,
    })
}

struct Outliner<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Open `namespace` (Some) and `extern "C"` (None) blocks.
    scopes: Vec<Option<String>>,
    items: Vec<Item>,
}

impl<'a> Outliner<'a> {
    fn run(&mut self) {
        while let Some(token) = self.tokens.get(self.pos).cloned() {
            if token.kind == TokenKind::Directive {
                let directive = self.directive(&token);
                self.items.push(Item {
                    name: directive.clone(),
                    tokens: vec![directive],
                });
                self.pos += 1;
                continue;
            }
            if (token.is_ident("namespace") && self.open_namespace())
                || (token.is_ident("extern") && self.open_extern())
            {
                continue;
            }
            if token.is_punct("}") {
                self.scopes.pop();
                self.pos += 1;
                self.eat(";");
            } else if token.is_punct(";") {
                self.pos += 1;
            } else {
                self.item();
            }
        }
    }

    fn text_of(&self, token: &Token) -> &'a str {
        &self.text[token.span.range()]
    }

    fn eat(&mut self, punct: &str) -> bool {
        let found = self.tokens.get(self.pos).is_some_and(|t| t.is_punct(punct));
        if found {
            self.pos += 1;
        }
        found
    }

    fn directive(&self, token: &Token) -> String {
        let mut errors = Errors::new();
        let body = lex::tokenize_range(self.text, token.span.lo + 1..token.span.hi, &mut errors);
        let mut directive = "#".to_owned();
        for (i, token) in body.iter().filter(|token| !token.is_doc()).enumerate() {
            if i > 0 {
                directive.push(' ');
            }
            directive.push_str(self.text_of(token));
        }
        directive
    }

    fn open_namespace(&mut self) -> bool {
        let mut name = String::new();
        let mut i = self.pos + 1;
        while let Some(token) = self.tokens.get(i) {
            if token.is_punct("{") {
                self.scopes.push(Some(name));
                self.pos = i + 1;
                return true;
            }
            match token.ident() {
                Some(ident) => name.push_str(ident),
                None if token.is_punct("::") => name.push_str("::"),
                None => return false,
            }
            i += 1;
        }
        false
    }

    fn open_extern(&mut self) -> bool {
        let is_block = matches!(
            self.tokens.get(self.pos + 1).map(|t| &t.kind),
            Some(TokenKind::Str(_))
        ) && self.tokens.get(self.pos + 2).is_some_and(|t| t.is_punct("{"));
        if is_block {
            self.scopes.push(None);
            self.pos += 3;
        }
        is_block
    }

    fn item(&mut self) {
        let start = self.pos;
        let mut braces = 0usize;
        let mut parens = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if token.is_punct("(") || token.is_punct("[") {
                parens += 1;
            } else if token.is_punct(")") || token.is_punct("]") {
                parens = parens.saturating_sub(1);
            } else if token.is_punct("{") {
                braces += 1;
            } else if token.is_punct("}") {
                braces = braces.saturating_sub(1);
                if braces == 0 && parens == 0 {
                    self.eat(";");
                    break;
                }
            } else if token.is_punct(";") && braces == 0 && parens == 0 {
                break;
            }
        }
        let tokens = &self.tokens[start..self.pos];
        let name = self.qualify(item_name(tokens, self.text));
        let tokens = tokens
            .iter()
            .map(|token| self.text_of(token).to_owned())
            .collect();
        self.items.push(Item { name, tokens });
    }

    fn qualify(&self, name: String) -> String {
        let mut qualified = String::new();
        for scope in self.scopes.iter().flatten() {
            if !scope.is_empty() {
                qualified.push_str(scope);
                qualified.push_str("::");
            }
        }
        qualified.push_str(&name);
        qualified
    }
}

fn item_name(tokens: &[Token], text: &str) -> String {
    let word = |i: usize| tokens.get(i).and_then(Token::ident);
    let mut i = 0;
    if word(0) == Some("template") && tokens.get(1).is_some_and(|t| t.is_punct("<")) {
        let mut angles = 0usize;
        for (j, token) in tokens.iter().enumerate().skip(1) {
            if token.is_punct("<") {
                angles += 1;
            } else if token.is_punct(">") {
                angles -= 1;
                if angles == 0 {
                    i = j + 1;
                    break;
                }
            } else if token.is_punct(">>") {
                angles = angles.saturating_sub(2);
                if angles == 0 {
                    i = j + 1;
                    break;
                }
            }
        }
    }

    match word(i) {
        Some("using") if word(i + 1) == Some("namespace") => {
            return format!("using namespace {}", word(i + 2).unwrap_or_default());
        }
        Some("using") => return word(i + 1).unwrap_or_default().to_owned(),
        Some("class" | "struct" | "union" | "enum") => {
            let mut j = i + 1;
            if matches!(word(j), Some("class" | "struct")) {
                j += 1;
            }
            if let Some(name) = word(j) {
                return name.to_owned();
            }
        }
        _ => {}
    }

    let mut depth = 0usize;
    let mut last_ident = None;
    for (j, token) in tokens.iter().enumerate().skip(i) {
        let at_top = depth == 0;
        if token.is_punct("(") || token.is_punct("[") || token.is_punct("{") {
            if at_top && token.is_punct("(") {
                // `typedef void (*Name)(...)`
                if tokens.get(j + 1).is_some_and(|t| t.is_punct("*")) {
                    if let Some(name) = word(j + 2) {
                        return name.to_owned();
                    }
                }
                if let Some(name) = qualified_before(tokens, j, text) {
                    return name;
                }
            }
            if at_top && token.is_punct("{") {
                break;
            }
            depth += 1;
        } else if token.is_punct(")") || token.is_punct("]") || token.is_punct("}") {
            depth = depth.saturating_sub(1);
        } else if at_top && token.is_punct("=") {
            if let Some(name) = qualified_before(tokens, j, text) {
                return name;
            }
        } else if at_top && token.ident().is_some() {
            last_ident = token.ident();
        }
    }
    last_ident.unwrap_or_default().to_owned()
}

// `A::B::c` ending right before `tokens[end]`.
fn qualified_before(tokens: &[Token], end: usize, text: &str) -> Option<String> {
    let mut k = end.checked_sub(1)?;
    let mut name = tokens[k].ident()?.to_owned();
    if k > 0 && tokens[k - 1].is_punct("~") {
        name.insert(0, '~');
        k -= 1;
    }
    while k >= 2 && tokens[k - 1].is_punct("::") && tokens[k - 2].ident().is_some() {
        name = format!("{}::{}", &text[tokens[k - 2].span.range()], name);
        k -= 2;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::{compare, outline};

    #[test]
    fn test_outline_names() {
        let items = outline(
            "#pragma once\n\
             namespace ns {\n\
             using Enum = ::MyEnum;\n\
             constexpr Enum ENUM_VALUE0 = ::MyENUM_VALUE0; ///< doc\n\
             struct WindowParam { int value; };\n\
             inline const char* Window::GetTitle() const { return ::f(m_resource); }\n\
             template<class... ARGS>\n\
             inline void Log(ARGS... args) { static_assert(false, \"Not implemented\"); }\n\
             typedef void (*Callback)(int);\n\
             } // namespace ns\n",
        );
        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "#pragma once",
                "ns::Enum",
                "ns::ENUM_VALUE0",
                "ns::WindowParam",
                "ns::Window::GetTitle",
                "ns::Log",
                "ns::Callback",
            ],
        );
    }

    #[test]
    fn test_comments_and_whitespace_are_ignored() {
        let expected = "// header\nnamespace ns {\n/** Doc. */\ninline int f(int a)\n{\n  return ::f(a);\n}\n}\n";
        let actual = "namespace ns { inline int f(int a) { return ::f(a); } } // namespace ns";
        assert_eq!(compare(expected, actual), Ok(()));
    }

    #[test]
    fn test_first_difference_is_named() {
        let expected = "namespace ns {\nusing A = ::A_t;\ninline int f(int a) { return ::f(a); }\ninline int g() { return ::g(); }\n}";
        let actual = "namespace ns {\nusing A = ::A_t;\ninline int f(long a) { return ::f(a); }\ninline int g() { return 0; }\n}";
        let mismatch = compare(expected, actual).unwrap_err();
        assert_eq!(mismatch.name, "ns::f");
        assert!(mismatch.actual.unwrap().contains("long"));
    }

    #[test]
    fn test_missing_declaration() {
        let mismatch = compare("using A = int;\nusing B = int;", "using A = int;").unwrap_err();
        assert_eq!(mismatch.name, "B");
        assert_eq!(mismatch.actual, None);
    }
}
