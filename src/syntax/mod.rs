// Declaration model shared between the generator and the fixture harness.

pub mod atom;
pub mod discriminant;
pub mod doc;
pub mod error;
pub mod eval;
pub mod lex;
pub mod names;
mod parse;
pub mod report;
pub mod types;

use std::fmt::{self, Display};
use std::ops::Range;

pub use self::atom::Atom;
pub use self::discriminant::Value;
pub use self::doc::Doc;
pub use self::parse::{parse_file, ParseOpt};
pub use self::types::Types;

/// Byte range into the source text of one header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}

impl Span {
    pub fn new(lo: usize, hi: usize) -> Self {
        Span { lo, hi }
    }

    pub fn to(self, other: Span) -> Span {
        Span {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    pub fn range(self) -> Range<usize> {
        self.lo..self.hi
    }
}

pub enum Decl {
    Function(Function),
    Enum(Enum),
    Struct(Struct),
    Alias(Alias),
    Constant(Constant),
    MacroAlias(MacroAlias),
    Variable(Variable),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

pub struct Function {
    pub doc: Doc,
    pub name: Name,
    pub ret: Type,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub is_inline: bool,
    pub is_constexpr: bool,
    pub is_static: bool,
    pub has_body: bool,
    pub span: Span,
}

pub struct Param {
    pub name: Option<Name>,
    pub ty: Type,
    pub default: Option<String>,
    pub span: Span,
}

pub struct Enum {
    pub doc: Doc,
    pub name: Name,
    pub scoped: bool,
    pub repr: Option<Type>,
    pub variants: Vec<Variant>,
    pub span: Span,
}

pub struct Variant {
    pub doc: Doc,
    pub name: Name,
    pub expr: Option<String>,
    pub value: Value,
}

/// A struct or union. Without a body it is an opaque handle type.
pub struct Struct {
    pub doc: Doc,
    pub name: Name,
    pub opaque: bool,
    pub span: Span,
}

pub struct Alias {
    pub doc: Doc,
    pub name: Name,
    pub target: Type,
    pub span: Span,
}

pub struct Constant {
    pub doc: Doc,
    pub name: Name,
    /// None for object-like macros.
    pub ty: Option<Type>,
    pub expr: String,
    pub value: Value,
    pub span: Span,
}

/// `#define A B` where `B` is a lone identifier.
pub struct MacroAlias {
    pub doc: Doc,
    pub name: Name,
    pub target: Name,
    pub span: Span,
}

pub struct Variable {
    pub doc: Doc,
    pub name: Name,
    pub ty: Type,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
    pub is_const: bool,
    pub tag: Option<Tag>,
    pub base: Base,
    pub pointers: Vec<Pointer>,
    pub reference: Option<Reference>,
    pub array: Vec<String>,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    Struct,
    Union,
    Enum,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Base {
    Atom(Atom),
    Named(String),
    /// Function pointer spelled inline, stored as its normalized C text.
    FnPtr(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pointer {
    pub is_const: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    LValue,
    RValue,
}

impl Decl {
    pub fn name(&self) -> &Name {
        match self {
            Decl::Function(efn) => &efn.name,
            Decl::Enum(enm) => &enm.name,
            Decl::Struct(strct) => &strct.name,
            Decl::Alias(alias) => &alias.name,
            Decl::Constant(konst) => &konst.name,
            Decl::MacroAlias(alias) => &alias.name,
            Decl::Variable(var) => &var.name,
        }
    }

    pub fn doc(&self) -> &Doc {
        match self {
            Decl::Function(efn) => &efn.doc,
            Decl::Enum(enm) => &enm.doc,
            Decl::Struct(strct) => &strct.doc,
            Decl::Alias(alias) => &alias.doc,
            Decl::Constant(konst) => &konst.doc,
            Decl::MacroAlias(alias) => &alias.doc,
            Decl::Variable(var) => &var.doc,
        }
    }

    pub fn doc_mut(&mut self) -> &mut Doc {
        match self {
            Decl::Function(efn) => &mut efn.doc,
            Decl::Enum(enm) => &mut enm.doc,
            Decl::Struct(strct) => &mut strct.doc,
            Decl::Alias(alias) => &mut alias.doc,
            Decl::Constant(konst) => &mut konst.doc,
            Decl::MacroAlias(alias) => &mut alias.doc,
            Decl::Variable(var) => &mut var.doc,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Function(efn) => efn.span,
            Decl::Enum(enm) => enm.span,
            Decl::Struct(strct) => strct.span,
            Decl::Alias(alias) => alias.span,
            Decl::Constant(konst) => konst.span,
            Decl::MacroAlias(alias) => alias.span,
            Decl::Variable(var) => var.span,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Decl::Function(_) => "function",
            Decl::Enum(_) => "enum",
            Decl::Struct(strct) if strct.opaque => "opaque struct",
            Decl::Struct(_) => "struct",
            Decl::Alias(_) => "alias",
            Decl::Constant(_) => "constant",
            Decl::MacroAlias(_) => "macro alias",
            Decl::Variable(_) => "variable",
        }
    }
}

impl Type {
    pub fn named(&self) -> Option<&str> {
        match &self.base {
            Base::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.base == Base::Atom(Atom::Void)
            && self.pointers.is_empty()
            && self.reference.is_none()
            && self.array.is_empty()
    }

    /// `T*` with a mutable pointee, one level of indirection, nothing else.
    pub fn is_bare_pointer_to(&self, name: &str) -> bool {
        self.named() == Some(name)
            && !self.is_const
            && self.pointers.len() == 1
            && self.reference.is_none()
            && self.array.is_empty()
    }

    /// `T*` or `const T*`.
    pub fn is_single_pointer_to(&self, name: &str) -> bool {
        self.named() == Some(name)
            && self.pointers.len() == 1
            && self.reference.is_none()
            && self.array.is_empty()
    }

    /// Same type spelled with a different base name.
    pub fn with_base(&self, name: impl Into<String>) -> Type {
        Type {
            tag: None,
            base: Base::Named(name.into()),
            ..self.clone()
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.to_cxx())
    }
}

impl Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Base::Atom(atom) => Display::fmt(atom, f),
            Base::Named(name) => f.write_str(name),
            Base::FnPtr(text) => f.write_str(text),
        }
    }
}

// Renders without array extents; those belong after the declarator name.
impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        match self.tag {
            Some(Tag::Struct) => f.write_str("struct ")?,
            Some(Tag::Union) => f.write_str("union ")?,
            Some(Tag::Enum) => f.write_str("enum ")?,
            None => {}
        }
        Display::fmt(&self.base, f)?;
        for ptr in &self.pointers {
            f.write_str("*")?;
            if ptr.is_const {
                f.write_str(" const")?;
            }
        }
        match self.reference {
            Some(Reference::LValue) => f.write_str("&")?,
            Some(Reference::RValue) => f.write_str("&&")?,
            None => {}
        }
        Ok(())
    }
}
