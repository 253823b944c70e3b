use std::fmt::{self, Display};

#[derive(Copy, Clone)]
pub struct Error {
    pub msg: &'static str,
    pub label: Option<&'static str>,
    pub note: Option<&'static str>,
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.msg.fmt(formatter)
    }
}

pub static ERRORS: &[Error] = &[
    AMBIGUOUS_DECL,
    DISCRIMINANT_OVERFLOW,
    DUPLICATE_NAME,
    EXPECTED_TYPE,
    SELF_REFERENCE,
    UNBALANCED_BRACES,
    UNBALANCED_PARENS,
    UNEXPECTED_CHARACTER,
    UNEXPECTED_TOKEN,
    UNSUPPORTED_DECL,
    UNTERMINATED_COMMENT,
    UNTERMINATED_STRING,
];

pub static AMBIGUOUS_DECL: Error = Error {
    msg: "no wrapper pattern matches ",
    label: Some("emitted as a plain forwarding accessor"),
    note: Some("review the generated accessor, or rename the declaration to match a known shape"),
};

pub static DISCRIMINANT_OVERFLOW: Error = Error {
    msg: "discriminant overflow on value after ",
    label: Some("discriminant overflow"),
    note: Some("give the enumerator an explicit value to restart the sequence"),
};

pub static DUPLICATE_NAME: Error = Error {
    msg: "duplicate wrapper name ",
    label: Some("skipped"),
    note: Some("another declaration already produced a wrapper with this name"),
};

pub static EXPECTED_TYPE: Error = Error {
    msg: "expected a type",
    label: None,
    note: Some("the declaration was skipped"),
};

pub static SELF_REFERENCE: Error = Error {
    msg: "wrapper name collides with the source name ",
    label: Some("skipped"),
    note: Some("configure a namespace or a prefix so the wrapper gets a distinct name"),
};

pub static UNBALANCED_BRACES: Error = Error {
    msg: "unbalanced braces",
    label: Some("this brace is never closed"),
    note: Some("the rest of the file was skipped"),
};

pub static UNBALANCED_PARENS: Error = Error {
    msg: "unbalanced parentheses in signature",
    label: Some("this parenthesis is never closed"),
    note: Some("the declaration was skipped"),
};

pub static UNEXPECTED_CHARACTER: Error = Error {
    msg: "unexpected character ",
    label: None,
    note: None,
};

pub static UNEXPECTED_TOKEN: Error = Error {
    msg: "unexpected token ",
    label: None,
    note: Some("the declaration was skipped"),
};

pub static UNSUPPORTED_DECL: Error = Error {
    msg: "cannot emit a wrapper for ",
    label: Some("not implemented"),
    note: Some("a placeholder that fails to compile when used was emitted instead"),
};

pub static UNTERMINATED_COMMENT: Error = Error {
    msg: "unterminated comment",
    label: Some("comment starts here"),
    note: Some("the rest of the file could not be read"),
};

pub static UNTERMINATED_STRING: Error = Error {
    msg: "unterminated string literal",
    label: None,
    note: None,
};
