use crate::syntax::error::{UNEXPECTED_CHARACTER, UNTERMINATED_COMMENT, UNTERMINATED_STRING};
use crate::syntax::report::Errors;
use crate::syntax::Span;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(String),
    Str(String),
    Char(String),
    Punct(&'static str),
    Doc(DocComment),
    /// A whole preprocessor line, `#` through the end of the last
    /// continuation line. The body is retokenized on demand.
    Directive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocComment {
    pub text: String,
    /// `///<` and `/**<` document the preceding item.
    pub trailing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(p) if p == punct)
    }

    pub fn is_doc(&self) -> bool {
        matches!(self.kind, TokenKind::Doc(_))
    }
}

// Longest first.
const PUNCTS: &[&str] = &[
    "...", "<<=", ">>=", "::", "->", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "##", "{", "}", "(", ")", "[", "]", ";", ",",
    "<", ">", "=", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", ".", "#", "@", "\\",
    "$",
];

pub fn tokenize(source: &str, errors: &mut Errors) -> Vec<Token> {
    let mut lexer = Lexer::new(source, 0..source.len(), true, errors);
    lexer.run();
    lexer.tokens
}

/// Tokens of a directive body or any other subrange. Never produces
/// `Directive` tokens.
pub fn tokenize_range(source: &str, range: Range<usize>, errors: &mut Errors) -> Vec<Token> {
    let mut lexer = Lexer::new(source, range, false, errors);
    lexer.run();
    lexer.tokens
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    directives: bool,
    line_start: bool,
    tokens: Vec<Token>,
    errors: &'a mut Errors,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, range: Range<usize>, directives: bool, errors: &'a mut Errors) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: range.start,
            end: range.end.min(src.len()),
            directives,
            line_start: directives,
            tokens: Vec::new(),
            errors,
        }
    }

    fn peek(&self, ahead: usize) -> u8 {
        let i = self.pos + ahead;
        if i < self.end {
            self.bytes[i]
        } else {
            0
        }
    }

    fn push(&mut self, kind: TokenKind, lo: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(lo, self.pos),
        });
        self.line_start = false;
    }

    fn run(&mut self) {
        while self.pos < self.end {
            let b = self.bytes[self.pos];
            match b {
                b'\n' => {
                    self.pos += 1;
                    self.line_start = self.directives;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'\\' if self.peek(1) == b'\n' => self.pos += 2,
                b'\\' if self.peek(1) == b'\r' && self.peek(2) == b'\n' => self.pos += 3,
                b'/' if self.peek(1) == b'/' => self.line_comment(),
                b'/' if self.peek(1) == b'*' => {
                    if !self.block_comment() {
                        return;
                    }
                }
                b'#' if self.line_start => self.directive(),
                b'"' | b'\'' => self.quoted(self.pos),
                b'.' if self.peek(1).is_ascii_digit() => self.number(),
                b'0'..=b'9' => self.number(),
                b if b == b'_' || b.is_ascii_alphabetic() => self.ident(),
                b if b.is_ascii() => self.punct(),
                _ => {
                    let lo = self.pos;
                    let len = self.src[lo..].chars().next().map_or(1, char::len_utf8);
                    self.pos += len;
                    self.errors.error(
                        Span::new(lo, self.pos),
                        format_args!("{}`{}`", UNEXPECTED_CHARACTER.msg, &self.src[lo..self.pos]),
                    );
                }
            }
        }
    }

    fn line_comment(&mut self) {
        let lo = self.pos;
        let line_end = self.src[lo..self.end].find('\n').map_or(self.end, |i| lo + i);
        self.pos = line_end;
        let text = &self.src[lo + 2..line_end];
        let is_doc = (text.starts_with('/') && !text.starts_with("//")) || text.starts_with('!');
        if is_doc {
            let mut text = &text[1..];
            let trailing = text.starts_with('<');
            if trailing {
                text = &text[1..];
            }
            let doc = DocComment {
                text: text.to_owned(),
                trailing,
            };
            self.tokens.push(Token {
                kind: TokenKind::Doc(doc),
                span: Span::new(lo, line_end),
            });
        }
    }

    fn block_comment(&mut self) -> bool {
        let lo = self.pos;
        let Some(close) = self.src[lo + 2..self.end].find("*/") else {
            self.errors.error(Span::new(lo, lo + 2), UNTERMINATED_COMMENT.msg);
            self.pos = self.end;
            return false;
        };
        let hi = lo + 2 + close + 2;
        self.pos = hi;
        let inner = &self.src[lo + 2..hi - 2];
        let is_doc = (inner.starts_with('*') && !inner.starts_with("**") && inner.len() > 1)
            || inner.starts_with('!');
        if is_doc {
            let mut text = &inner[1..];
            let trailing = text.starts_with('<');
            if trailing {
                text = &text[1..];
            }
            let doc = DocComment {
                text: text.to_owned(),
                trailing,
            };
            self.tokens.push(Token {
                kind: TokenKind::Doc(doc),
                span: Span::new(lo, hi),
            });
        }
        true
    }

    fn directive(&mut self) {
        let lo = self.pos;
        let mut i = self.pos + 1;
        while i < self.end {
            match self.bytes[i] {
                b'\n' => break,
                b'\\' if i + 1 < self.end && self.bytes[i + 1] == b'\n' => i += 2,
                b'\\' if i + 2 < self.end && &self.bytes[i + 1..i + 3] == b"\r\n" => i += 3,
                b'/' if i + 1 < self.end && self.bytes[i + 1] == b'*' => {
                    match self.src[i + 2..self.end].find("*/") {
                        Some(close) => i += 2 + close + 2,
                        // Reported when the body is tokenized.
                        None => i = self.end,
                    }
                }
                b'/' if i + 1 < self.end && self.bytes[i + 1] == b'/' => {
                    while i < self.end && self.bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                quote @ (b'"' | b'\'') => {
                    i += 1;
                    while i < self.end && self.bytes[i] != quote && self.bytes[i] != b'\n' {
                        if self.bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }
        let mut hi = i.min(self.end);
        while hi > lo && self.bytes[hi - 1] == b'\r' {
            hi -= 1;
        }
        self.pos = i.min(self.end);
        self.tokens.push(Token {
            kind: TokenKind::Directive,
            span: Span::new(lo, hi),
        });
        self.line_start = false;
    }

    fn quoted(&mut self, lo: usize) {
        let quote = self.bytes[self.pos];
        self.pos += 1;
        loop {
            if self.pos >= self.end || self.bytes[self.pos] == b'\n' {
                self.errors.error(Span::new(lo, self.pos), UNTERMINATED_STRING.msg);
                break;
            }
            match self.bytes[self.pos] {
                b'\\' => {
                    let escaped = self.src[self.pos + 1..].chars().next().map_or(0, char::len_utf8);
                    self.pos = (self.pos + 1 + escaped).min(self.end);
                }
                b if b == quote => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    let len = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
                    self.pos += len;
                }
            }
        }
        let text = self.src[lo..self.pos].to_owned();
        let kind = if quote == b'"' {
            TokenKind::Str(text)
        } else {
            TokenKind::Char(text)
        };
        self.push(kind, lo);
    }

    fn number(&mut self) {
        let lo = self.pos;
        while self.pos < self.end {
            let b = self.bytes[self.pos];
            let exponent_sign = (b == b'+' || b == b'-')
                && matches!(self.bytes[self.pos - 1], b'e' | b'E' | b'p' | b'P');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'\'' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = self.src[lo..self.pos].to_owned();
        self.push(TokenKind::Number(text), lo);
    }

    fn ident(&mut self) {
        let lo = self.pos;
        while self.pos < self.end
            && (self.bytes[self.pos] == b'_' || self.bytes[self.pos].is_ascii_alphanumeric())
        {
            self.pos += 1;
        }
        let word = &self.src[lo..self.pos];
        let next = self.peek(0);
        if matches!(word, "L" | "u" | "U" | "u8") && (next == b'"' || next == b'\'') {
            self.quoted(lo);
            return;
        }
        self.push(TokenKind::Ident(word.to_owned()), lo);
    }

    fn punct(&mut self) {
        let lo = self.pos;
        let rest = &self.src[lo..self.end];
        if let Some(&punct) = PUNCTS.iter().find(|p| rest.starts_with(**p)) {
            self.pos += punct.len();
            self.push(TokenKind::Punct(punct), lo);
        } else {
            self.pos += 1;
            self.errors.error(
                Span::new(lo, self.pos),
                format_args!("{}`{}`", UNEXPECTED_CHARACTER.msg, &self.src[lo..self.pos]),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{tokenize, TokenKind};
    use crate::syntax::report::Errors;

    fn kinds(source: &str) -> (Vec<TokenKind>, Errors) {
        let mut errors = Errors::new();
        let tokens = tokenize(source, &mut errors);
        (tokens.into_iter().map(|t| t.kind).collect(), errors)
    }

    #[test]
    fn test_plain_comments_dropped() {
        let (tokens, errors) = kinds("int /* c */ x; // trailing\n");
        assert!(errors.is_empty());
        assert_eq!(
            tokens,
            [
                TokenKind::Ident("int".to_owned()),
                TokenKind::Ident("x".to_owned()),
                TokenKind::Punct(";"),
            ],
        );
    }

    #[test]
    fn test_doc_comments() {
        let (tokens, _) = kinds("/** leading */ A, ///< trailing\n");
        match &tokens[0] {
            TokenKind::Doc(doc) => {
                assert_eq!(doc.text, " leading ");
                assert!(!doc.trailing);
            }
            other => panic!("expected doc, found {:?}", other),
        }
        match &tokens[3] {
            TokenKind::Doc(doc) => {
                assert_eq!(doc.text, " trailing");
                assert!(doc.trailing);
            }
            other => panic!("expected doc, found {:?}", other),
        }
    }

    #[test]
    fn test_directive_spans_continuation() {
        let source = "#define A \\\n  1\nint";
        let mut errors = Errors::new();
        let tokens = tokenize(source, &mut errors);
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert_eq!(&source[tokens[0].span.range()], "#define A \\\n  1");
        assert!(tokens[1].is_ident("int"));
    }

    #[test]
    fn test_hash_mid_line_is_punct() {
        let (tokens, _) = kinds("a # b");
        assert_eq!(tokens[1], TokenKind::Punct("#"));
    }

    #[test]
    fn test_unterminated_comment() {
        let (tokens, errors) = kinds("int x; /* never closed\nint y;");
        assert_eq!(tokens.len(), 3);
        assert!(errors.has_errors());
    }

    #[test]
    fn test_longest_punct() {
        let (tokens, _) = kinds("a::b ...");
        assert_eq!(tokens[1], TokenKind::Punct("::"));
        assert_eq!(tokens[3], TokenKind::Punct("..."));
    }

    #[test]
    fn test_escaped_multibyte_char() {
        let (tokens, errors) = kinds("\"\\\u{e9}\" '\\\u{e9}' int");
        assert!(errors.is_empty());
        assert_eq!(tokens[0], TokenKind::Str("\"\\\u{e9}\"".to_owned()));
        assert_eq!(tokens[1], TokenKind::Char("'\\\u{e9}'".to_owned()));
        assert!(matches!(&tokens[2], TokenKind::Ident(ident) if ident == "int"));
    }
}
