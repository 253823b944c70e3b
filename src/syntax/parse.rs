use crate::syntax::atom::{self, Atom};
use crate::syntax::discriminant::{DiscriminantSet, Value};
use crate::syntax::error::{EXPECTED_TYPE, UNBALANCED_BRACES, UNBALANCED_PARENS, UNEXPECTED_TOKEN};
use crate::syntax::eval;
use crate::syntax::lex::{self, DocComment, Token, TokenKind};
use crate::syntax::report::Errors;
use crate::syntax::{
    Alias, Base, Constant, Decl, Doc, Enum, Function, MacroAlias, Name, Param, Pointer, Reference,
    Span, Struct, Tag, Type, Variable, Variant,
};
use std::collections::HashMap;
use std::mem;

#[derive(Default)]
pub struct ParseOpt<'a> {
    /// Annotation macros to skip wherever they appear, such as
    /// `SDL_DECLSPEC` or `SDLCALL`. One directly followed by `(` takes its
    /// argument list along with it.
    pub ignore: &'a [String],
}

/// Parses every declaration of one header. Malformed declarations are
/// reported into `errors` and skipped; parsing resumes after them.
pub fn parse_file(source: &str, opt: &ParseOpt, errors: &mut Errors) -> Vec<Decl> {
    let raw = lex::tokenize(source, errors);

    let mut tokens = Vec::with_capacity(raw.len());
    let mut docs = Vec::with_capacity(raw.len() + 1);
    let mut directives = Vec::new();
    let mut pending: Vec<DocComment> = Vec::new();
    for token in raw {
        match token.kind {
            TokenKind::Doc(doc) => pending.push(doc),
            TokenKind::Directive => {
                let (trailing, leading) = pending.drain(..).partition(|doc| doc.trailing);
                pending = trailing;
                directives.push(Directive {
                    at: tokens.len(),
                    span: token.span,
                    docs: leading,
                });
            }
            _ => {
                docs.push(mem::take(&mut pending));
                tokens.push(token);
            }
        }
    }
    docs.push(pending);

    let mut parser = Parser {
        source,
        tokens,
        docs,
        directives,
        next_directive: 0,
        pos: 0,
        depth: 0,
        opt,
        errors,
        decls: Vec::new(),
        values: HashMap::new(),
    };
    parser.run();
    parser.decls
}

struct Directive {
    /// Index of the first ordinary token after the directive.
    at: usize,
    span: Span,
    docs: Vec<DocComment>,
}

struct Failure {
    span: Span,
    msg: String,
}

type Result<T> = std::result::Result<T, Failure>;

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    /// `docs[i]` are the doc comments between `tokens[i - 1]` and `tokens[i]`.
    docs: Vec<Vec<DocComment>>,
    directives: Vec<Directive>,
    next_directive: usize,
    pos: usize,
    /// Open `namespace` and `extern "C"` blocks.
    depth: usize,
    opt: &'a ParseOpt<'a>,
    errors: &'a mut Errors,
    decls: Vec<Decl>,
    /// Integer values of the enumerators and constants seen so far.
    values: HashMap<String, i128>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) {
        while self.pos < self.tokens.len() {
            self.flush_directives(self.pos);
            if self.eat_punct("}") {
                if self.depth == 0 {
                    let span = self.tokens[self.pos - 1].span;
                    self.errors
                        .error(span, format_args!("{}`}}`", UNEXPECTED_TOKEN.msg));
                } else {
                    self.depth -= 1;
                }
                self.eat_punct(";");
                continue;
            }
            if self.eat_punct(";") {
                continue;
            }

            let start = self.pos;
            match self.item() {
                Ok(mut decls) => {
                    let leading = self.leading_doc(start);
                    let trailing = self.trailing_doc(self.pos);
                    for decl in &mut decls {
                        decl.doc_mut().extend(leading.clone());
                    }
                    if let Some(last) = decls.last_mut() {
                        last.doc_mut().extend(trailing);
                    }
                    for decl in &decls {
                        tracing::trace!(name = %decl.name().text, kind = decl.kind(), "parsed");
                    }
                    self.decls.extend(decls);
                }
                Err(failure) => {
                    self.errors.error(failure.span, failure.msg);
                    self.pos = start;
                    self.recover();
                    if self.pos == start {
                        self.pos += 1;
                    }
                }
            }
        }
        self.flush_directives(usize::MAX);
    }

    fn flush_directives(&mut self, upto: usize) {
        while let Some(directive) = self.directives.get_mut(self.next_directive) {
            if directive.at > upto {
                break;
            }
            let span = directive.span;
            let docs = mem::take(&mut directive.docs);
            self.next_directive += 1;
            self.directive(span, docs);
        }
    }

    // Skips the rest of a declaration: through the next `;` at brace depth 0,
    // or through a complete braced body.
    fn recover(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            if token.is_punct("{") {
                depth += 1;
            } else if token.is_punct("}") {
                if depth == 0 {
                    return;
                }
                depth -= 1;
                self.pos += 1;
                if depth == 0 {
                    self.eat_punct(";");
                    return;
                }
                continue;
            } else if token.is_punct(";") && depth == 0 {
                self.pos += 1;
                return;
            }
            self.pos += 1;
        }
    }

    fn item(&mut self) -> Result<Vec<Decl>> {
        let first = self.peek_ident().map(str::to_owned);
        match first.as_deref() {
            Some("namespace") => {
                self.pos += 1;
                while self.peek_ident().is_some() || self.peek_punct("::") {
                    self.pos += 1;
                }
                if self.eat_punct("{") {
                    self.depth += 1;
                } else {
                    self.recover();
                }
                Ok(Vec::new())
            }
            Some("extern") if self.peek_str_at(1) => {
                self.pos += 2;
                if self.eat_punct("{") {
                    self.depth += 1;
                    Ok(Vec::new())
                } else {
                    self.declaration()
                }
            }
            Some(
                "template" | "static_assert" | "_Static_assert" | "friend" | "class" | "public"
                | "private" | "protected",
            ) => {
                self.recover();
                Ok(Vec::new())
            }
            Some("using") if self.peek_ident_at(1) == Some("namespace") => {
                self.recover();
                Ok(Vec::new())
            }
            Some("typedef") => self.typedef(),
            Some("using") => self.using(),
            Some("struct" | "union") if self.is_definition() => self.struct_decl(),
            Some("enum") if self.is_definition() => self.enum_decl(false),
            _ => self.declaration(),
        }
    }

    // `struct X;`, `struct X {`, `struct {`, `enum X : int {`, `enum class X {`
    fn is_definition(&self) -> bool {
        let mut i = self.pos + 1;
        if matches!(self.peek_ident_at(1), Some("class" | "struct")) {
            i += 1;
        }
        match self.tokens.get(i) {
            Some(token) if token.is_punct("{") => true,
            Some(token) if token.ident().is_some() => match self.tokens.get(i + 1) {
                Some(next) => next.is_punct(";") || next.is_punct("{") || next.is_punct(":"),
                None => false,
            },
            _ => false,
        }
    }

    fn typedef(&mut self) -> Result<Vec<Decl>> {
        let start = self.pos;
        self.pos += 1;
        self.skip_ignored();

        if matches!(self.peek_ident(), Some("struct" | "union")) {
            let braced = self.peek_punct_at(1, "{")
                || (self.peek_ident_at(1).is_some() && self.peek_punct_at(2, "{"));
            if braced {
                self.pos += 1;
                let tag = self.eat_any_ident();
                self.skip_braces()?;
                let name = match self.eat_any_ident() {
                    Some(name) => name,
                    None => tag.ok_or_else(|| self.unexpected())?,
                };
                self.skip_through_semi()?;
                return Ok(vec![Decl::Struct(Struct {
                    doc: Doc::new(),
                    name,
                    opaque: false,
                    span: self.span_from(start),
                })]);
            }
        }

        if self.peek_ident() == Some("enum") && self.is_definition() {
            let mut decls = self.enum_decl(true)?;
            if let Some(Decl::Enum(enm)) = decls.first_mut() {
                enm.span = self.span_from(start);
            }
            return Ok(decls);
        }

        let mut ty = self.parse_type()?;
        self.skip_ignored();
        if self.peek_punct("(") {
            let (name, fnptr) = self.fn_pointer_declarator(&ty)?;
            let name = name.ok_or_else(|| self.unexpected())?;
            self.skip_through_semi()?;
            return Ok(vec![Decl::Alias(Alias {
                doc: Doc::new(),
                name,
                target: fnptr,
                span: self.span_from(start),
            })]);
        }

        let name = self.expect_ident()?;
        self.array_extents(&mut ty)?;
        self.skip_through_semi()?;
        let span = self.span_from(start);

        let is_struct_tag = matches!(ty.tag, Some(Tag::Struct | Tag::Union));
        if is_struct_tag
            && !ty.is_const
            && ty.pointers.is_empty()
            && ty.reference.is_none()
            && ty.array.is_empty()
        {
            return Ok(vec![Decl::Struct(Struct {
                doc: Doc::new(),
                name,
                opaque: true,
                span,
            })]);
        }

        Ok(vec![Decl::Alias(Alias {
            doc: Doc::new(),
            name,
            target: ty,
            span,
        })])
    }

    fn using(&mut self) -> Result<Vec<Decl>> {
        let start = self.pos;
        self.pos += 1;
        let name = self.expect_ident()?;
        self.expect_punct("=")?;
        let ty = self.parse_type()?;
        let target = if self.peek_punct("(") {
            // using Callback = void (*)(int);
            let first = self.pos;
            while !self.peek_punct(";") {
                if self.pos >= self.tokens.len() {
                    return Err(self.unexpected());
                }
                self.pos += 1;
            }
            let declarator = self.text(first, self.pos);
            Type {
                base: Base::FnPtr(normalize_space(&format!("{} {}", ty, declarator))),
                pointers: Vec::new(),
                reference: None,
                is_const: false,
                tag: None,
                array: Vec::new(),
                span: ty.span.to(self.tokens[self.pos - 1].span),
            }
        } else {
            ty
        };
        self.expect_punct(";")?;
        Ok(vec![Decl::Alias(Alias {
            doc: Doc::new(),
            name,
            target,
            span: self.span_from(start),
        })])
    }

    fn struct_decl(&mut self) -> Result<Vec<Decl>> {
        let start = self.pos;
        self.pos += 1;
        let name = self.eat_any_ident();
        if self.eat_punct(";") {
            let name = name.ok_or_else(|| self.unexpected())?;
            return Ok(vec![Decl::Struct(Struct {
                doc: Doc::new(),
                name,
                opaque: true,
                span: self.span_from(start),
            })]);
        }
        if self.eat_punct(":") {
            while !self.peek_punct("{") {
                if self.pos >= self.tokens.len() || self.peek_punct(";") {
                    return Err(self.unexpected());
                }
                self.pos += 1;
            }
        }
        self.skip_braces()?;
        self.skip_through_semi()?;
        match name {
            Some(name) => Ok(vec![Decl::Struct(Struct {
                doc: Doc::new(),
                name,
                opaque: false,
                span: self.span_from(start),
            })]),
            // An anonymous struct declares nothing nameable.
            None => Ok(Vec::new()),
        }
    }

    fn enum_decl(&mut self, typedef: bool) -> Result<Vec<Decl>> {
        let start = self.pos;
        self.pos += 1;
        let scoped = self.eat_ident("class") || self.eat_ident("struct");
        let tag = self.eat_any_ident();
        let repr = if self.eat_punct(":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        if self.eat_punct(";") {
            return Ok(Vec::new());
        }
        self.expect_punct("{")?;

        let mut variants = Vec::new();
        let mut set = DiscriminantSet::new();
        loop {
            if self.eat_punct("}") {
                break;
            }
            let mut doc = self.leading_doc(self.pos);
            let name = self.expect_ident()?;
            let expr = if self.eat_punct("=") {
                let first = self.pos;
                self.scan_expression(&[",", "}"])?;
                Some(first..self.pos)
            } else {
                None
            };

            let value = match &expr {
                Some(range) => {
                    let computed = eval::eval(&self.tokens[range.clone()], &|name| {
                        self.values.get(name).copied()
                    });
                    let value = match computed {
                        Some(int) => Value::from(int),
                        None => Value::Symbolic(self.text(range.start, range.end)),
                    };
                    set.insert(&name.text, value)
                }
                None => match set.insert_next(&name.text) {
                    Ok(value) => value,
                    Err(msg) => {
                        self.errors.error(name.span, msg);
                        Value::Symbolic(format!("{} + 1", name.text))
                    }
                },
            };
            if let Some(int) = value.as_int() {
                self.values.insert(name.text.clone(), int);
            }

            doc.extend(self.trailing_doc(self.pos));
            if self.eat_punct(",") {
                doc.extend(self.trailing_doc(self.pos));
            } else if !self.peek_punct("}") {
                return Err(self.unexpected());
            }
            variants.push(Variant {
                doc,
                name,
                expr: expr.map(|range| self.text(range.start, range.end)),
                value,
            });
        }

        let mut name = tag;
        if typedef {
            if let Some(alias) = self.eat_any_ident() {
                name = Some(alias);
            }
        }
        self.skip_through_semi()?;
        let span = self.span_from(start);

        match name {
            Some(name) => Ok(vec![Decl::Enum(Enum {
                doc: Doc::new(),
                name,
                scoped,
                repr,
                variants,
                span,
            })]),
            // Anonymous enums only introduce constants.
            None => Ok(variants
                .into_iter()
                .map(|variant| {
                    let expr = variant
                        .expr
                        .clone()
                        .unwrap_or_else(|| variant.value.to_string());
                    Decl::Constant(Constant {
                        doc: variant.doc,
                        span: variant.name.span,
                        name: variant.name,
                        ty: None,
                        expr,
                        value: variant.value,
                    })
                })
                .collect()),
        }
    }

    fn declaration(&mut self) -> Result<Vec<Decl>> {
        let start = self.pos;
        let (mut is_inline, mut is_constexpr, mut is_static) = (false, false, false);
        loop {
            self.skip_ignored();
            match self.peek_ident() {
                Some("extern") => {
                    self.pos += 1;
                    if self.peek_str_at(0) {
                        self.pos += 1;
                    }
                }
                Some("static") => {
                    is_static = true;
                    self.pos += 1;
                }
                Some("inline" | "__inline" | "__inline__" | "__forceinline") => {
                    is_inline = true;
                    self.pos += 1;
                }
                Some("constexpr" | "consteval") => {
                    is_constexpr = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }

        let base = self.parse_type()?;
        let mut decls = Vec::new();
        let mut first = true;
        loop {
            let mut ty = base.clone();
            if !first {
                ty.pointers.clear();
                ty.reference = None;
                self.pointers(&mut ty);
            }
            first = false;
            self.skip_ignored();

            if self.peek_punct("(") {
                let (name, fnptr) = self.fn_pointer_declarator(&ty)?;
                let name = name.ok_or_else(|| self.unexpected())?;
                decls.push(Decl::Variable(Variable {
                    doc: Doc::new(),
                    name,
                    ty: fnptr,
                    span: self.span_from(start),
                }));
            } else {
                let name = self.expect_ident()?;
                if self.peek_punct("(") {
                    let (params, variadic) = self.params()?;
                    self.skip_function_suffix();
                    let has_body = if self.eat_punct(";") {
                        false
                    } else if self.peek_punct("{") {
                        self.skip_braces()?;
                        self.eat_punct(";");
                        true
                    } else if self.eat_punct("=") {
                        self.skip_through_semi()?;
                        false
                    } else {
                        return Err(self.unexpected());
                    };
                    return Ok(vec![Decl::Function(Function {
                        doc: Doc::new(),
                        name,
                        ret: ty,
                        params,
                        variadic,
                        is_inline,
                        is_constexpr,
                        is_static,
                        has_body,
                        span: self.span_from(start),
                    })]);
                }

                self.array_extents(&mut ty)?;
                if self.eat_punct("=") {
                    let first = self.pos;
                    self.scan_expression(&[",", ";"])?;
                    let expr = self.text(first, self.pos);
                    let computed =
                        eval::eval(&self.tokens[first..self.pos], &|name| self.values.get(name).copied());
                    let immutable = is_constexpr
                        || match ty.pointers.last() {
                            Some(ptr) => ptr.is_const,
                            None => ty.is_const,
                        };
                    if immutable {
                        let value = match computed {
                            Some(int) => {
                                self.values.insert(name.text.clone(), int);
                                Value::from(int)
                            }
                            None => Value::Symbolic(expr.clone()),
                        };
                        decls.push(Decl::Constant(Constant {
                            doc: Doc::new(),
                            name,
                            ty: Some(ty),
                            expr,
                            value,
                            span: self.span_from(start),
                        }));
                    } else {
                        decls.push(Decl::Variable(Variable {
                            doc: Doc::new(),
                            name,
                            ty,
                            span: self.span_from(start),
                        }));
                    }
                } else {
                    decls.push(Decl::Variable(Variable {
                        doc: Doc::new(),
                        name,
                        ty,
                        span: self.span_from(start),
                    }));
                }
            }

            if self.eat_punct(",") {
                continue;
            }
            self.expect_punct(";")?;
            return Ok(decls);
        }
    }

    fn parse_type(&mut self) -> Result<Type> {
        let lo = self.current_span();
        let mut is_const = false;
        let mut tag = None;
        let mut base = None;
        let mut words = Vec::new();

        loop {
            self.skip_ignored();
            let Some(token) = self.tokens.get(self.pos) else {
                break;
            };
            let word = match &token.kind {
                TokenKind::Ident(word) => word.clone(),
                TokenKind::Punct("::") if base.is_none() && words.is_empty() => {
                    base = Some(Base::Named(self.qualified_name()?));
                    continue;
                }
                _ => break,
            };
            match word.as_str() {
                "const" => {
                    is_const = true;
                    self.pos += 1;
                }
                "volatile" | "restrict" | "__restrict" | "register" | "typename" => self.pos += 1,
                "struct" | "union" | "enum" | "class" if base.is_none() && words.is_empty() => {
                    tag = Some(match word.as_str() {
                        "union" => Tag::Union,
                        "enum" => Tag::Enum,
                        _ => Tag::Struct,
                    });
                    self.pos += 1;
                    base = Some(Base::Named(self.qualified_name()?));
                }
                word if atom::is_keyword(word) && base.is_none() => {
                    words.push(word.to_owned());
                    self.pos += 1;
                }
                word if base.is_none() && words.is_empty() && !is_specifier(word) => {
                    base = Some(Base::Named(self.qualified_name()?));
                }
                _ => break,
            }
        }

        let base = match base {
            Some(base) => base,
            None if !words.is_empty() => {
                let words: Vec<&str> = words.iter().map(String::as_str).collect();
                match Atom::from_words(&words) {
                    Some(atom) => Base::Atom(atom),
                    None => {
                        return Err(Failure {
                            span: lo,
                            msg: format!("invalid type `{}`", words.join(" ")),
                        });
                    }
                }
            }
            None => {
                return Err(Failure {
                    span: self.current_span(),
                    msg: EXPECTED_TYPE.msg.to_owned(),
                });
            }
        };

        let mut ty = Type {
            is_const,
            tag,
            base,
            pointers: Vec::new(),
            reference: None,
            array: Vec::new(),
            span: lo,
        };
        self.pointers(&mut ty);
        ty.span = lo.to(self.tokens[self.pos - 1].span);
        Ok(ty)
    }

    fn pointers(&mut self, ty: &mut Type) {
        loop {
            self.skip_ignored();
            if self.eat_punct("*") {
                ty.pointers.push(Pointer { is_const: false });
            } else if self.eat_ident("const") {
                match ty.pointers.last_mut() {
                    Some(ptr) => ptr.is_const = true,
                    None => ty.is_const = true,
                }
            } else if self.eat_ident("volatile")
                || self.eat_ident("restrict")
                || self.eat_ident("__restrict")
            {
            } else {
                break;
            }
        }
        if self.eat_punct("&&") {
            ty.reference = Some(Reference::RValue);
        } else if self.eat_punct("&") {
            ty.reference = Some(Reference::LValue);
        }
    }

    // `a::b::c`, `::c`, `std::vector<int>`
    fn qualified_name(&mut self) -> Result<String> {
        let first = self.pos;
        self.eat_punct("::");
        loop {
            if self.eat_any_ident().is_none() {
                return Err(self.unexpected());
            }
            if self.peek_punct("<") {
                self.skip_angles()?;
            }
            if !self.eat_punct("::") {
                break;
            }
        }
        Ok(normalize_space(&self.text(first, self.pos)))
    }

    fn skip_angles(&mut self) -> Result<()> {
        let open = self.current_span();
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if token.is_punct("<") {
                depth += 1;
            } else if token.is_punct(">") {
                depth -= 1;
            } else if token.is_punct(">>") {
                depth = depth.saturating_sub(2);
            } else if token.is_punct(";") || token.is_punct("{") {
                break;
            }
            if depth == 0 {
                return Ok(());
            }
        }
        Err(Failure {
            span: open,
            msg: "unbalanced template argument list".to_owned(),
        })
    }

    fn params(&mut self) -> Result<(Vec<Param>, bool)> {
        let open = self.expect_punct("(")?;
        let unbalanced = || Failure {
            span: open,
            msg: UNBALANCED_PARENS.msg.to_owned(),
        };
        let mut params = Vec::new();
        let mut variadic = false;

        if self.eat_punct(")") {
            return Ok((params, variadic));
        }
        if self.peek_ident() == Some("void") && self.peek_punct_at(1, ")") {
            self.pos += 2;
            return Ok((params, variadic));
        }

        loop {
            if self.at_statement_end() {
                return Err(unbalanced());
            }
            if self.eat_punct("...") {
                variadic = true;
                if self.eat_punct(")") {
                    break;
                }
                return Err(if self.at_statement_end() {
                    unbalanced()
                } else {
                    self.unexpected()
                });
            }

            let first = self.pos;
            let mut ty = match self.parse_type() {
                Ok(ty) => ty,
                Err(_) if self.at_statement_end() => return Err(unbalanced()),
                Err(failure) => return Err(failure),
            };
            self.skip_ignored();
            let name = if self.peek_punct("(") {
                let (name, fnptr) = self.fn_pointer_declarator(&ty)?;
                ty = fnptr;
                name
            } else {
                self.eat_any_ident()
            };
            self.array_extents(&mut ty)?;
            let default = if self.eat_punct("=") {
                let start = self.pos;
                if self.scan_expression(&[",", ")"]).is_err() || self.pos == start {
                    return Err(unbalanced());
                }
                Some(self.text(start, self.pos))
            } else {
                None
            };
            params.push(Param {
                name,
                ty,
                default,
                span: self.span_from(first),
            });

            if self.eat_punct(",") {
                continue;
            }
            if self.eat_punct(")") {
                break;
            }
            return Err(if self.at_statement_end() {
                unbalanced()
            } else {
                self.unexpected()
            });
        }
        Ok((params, variadic))
    }

    // `(*name)(params)` after a return type; `name` may be absent.
    fn fn_pointer_declarator(&mut self, ret: &Type) -> Result<(Option<Name>, Type)> {
        let open = self.expect_punct("(")?;
        self.skip_ignored();
        if !self.eat_punct("*") {
            return Err(self.unexpected());
        }
        while self.eat_ident("const") {}
        let name = self.eat_any_ident();
        if !self.eat_punct(")") {
            return Err(Failure {
                span: open,
                msg: UNBALANCED_PARENS.msg.to_owned(),
            });
        }
        let params_open = self.expect_punct("(")?;
        let first = self.pos;
        let mut depth = 1usize;
        while depth > 0 {
            let Some(token) = self.tokens.get(self.pos) else {
                return Err(Failure {
                    span: params_open,
                    msg: UNBALANCED_PARENS.msg.to_owned(),
                });
            };
            if token.is_punct(";") || token.is_punct("{") {
                return Err(Failure {
                    span: params_open,
                    msg: UNBALANCED_PARENS.msg.to_owned(),
                });
            }
            if token.is_punct("(") {
                depth += 1;
            } else if token.is_punct(")") {
                depth -= 1;
            }
            self.pos += 1;
        }
        let params = if self.pos - 1 > first {
            self.text(first, self.pos - 1)
        } else {
            String::new()
        };
        let text = normalize_space(&format!("{} (*)({})", ret, params));
        let ty = Type {
            is_const: false,
            tag: None,
            base: Base::FnPtr(text),
            pointers: Vec::new(),
            reference: None,
            array: Vec::new(),
            span: ret.span.to(self.tokens[self.pos - 1].span),
        };
        Ok((name, ty))
    }

    fn array_extents(&mut self, ty: &mut Type) -> Result<()> {
        while self.peek_punct("[") {
            let open = self.current_span();
            self.pos += 1;
            let first = self.pos;
            while !self.peek_punct("]") {
                if self.at_statement_end() {
                    return Err(Failure {
                        span: open,
                        msg: "unbalanced brackets".to_owned(),
                    });
                }
                self.pos += 1;
            }
            let extent = if self.pos > first {
                self.text(first, self.pos)
            } else {
                String::new()
            };
            self.pos += 1;
            ty.array.push(extent);
        }
        Ok(())
    }

    // `const`, `noexcept`, attributes and annotation macros between a
    // parameter list and `;` or a body.
    fn skip_function_suffix(&mut self) {
        loop {
            self.skip_ignored();
            if self.eat_ident("const") || self.eat_ident("override") || self.eat_ident("final") {
                continue;
            }
            if self.eat_ident("noexcept") {
                if self.peek_punct("(") {
                    let _ = self.skip_parens();
                }
                continue;
            }
            if self.eat_punct("->") {
                let _ = self.parse_type();
                continue;
            }
            break;
        }
    }

    /// Moves past an initializer or default argument, stopping before the
    /// first of `stops` found outside brackets.
    fn scan_expression(&mut self, stops: &[&str]) -> Result<()> {
        let open = self.current_span();
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            if depth == 0 && stops.iter().any(|stop| token.is_punct(stop)) {
                return Ok(());
            }
            if token.is_punct("(") || token.is_punct("[") || token.is_punct("{") {
                depth += 1;
            } else if token.is_punct(")") || token.is_punct("]") || token.is_punct("}") {
                if depth == 0 {
                    return Err(self.unexpected());
                }
                depth -= 1;
            } else if token.is_punct(";") {
                return Err(Failure {
                    span: open,
                    msg: UNBALANCED_PARENS.msg.to_owned(),
                });
            }
            self.pos += 1;
        }
        Err(Failure {
            span: open,
            msg: UNBALANCED_PARENS.msg.to_owned(),
        })
    }

    fn skip_braces(&mut self) -> Result<()> {
        let open = self.expect_punct("{")?;
        let mut depth = 1usize;
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if token.is_punct("{") {
                depth += 1;
            } else if token.is_punct("}") {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(Failure {
            span: open,
            msg: UNBALANCED_BRACES.msg.to_owned(),
        })
    }

    fn skip_parens(&mut self) -> Result<()> {
        let open = self.expect_punct("(")?;
        let mut depth = 1usize;
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            if token.is_punct("(") {
                depth += 1;
            } else if token.is_punct(")") {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else if token.is_punct(";") {
                break;
            }
        }
        Err(Failure {
            span: open,
            msg: UNBALANCED_PARENS.msg.to_owned(),
        })
    }

    fn skip_through_semi(&mut self) -> Result<()> {
        while let Some(token) = self.tokens.get(self.pos) {
            if token.is_punct("{") {
                self.skip_braces()?;
                continue;
            }
            self.pos += 1;
            if token.is_punct(";") {
                return Ok(());
            }
        }
        Err(self.unexpected())
    }

    fn skip_ignored(&mut self) {
        loop {
            let ignored = match self.peek_ident() {
                Some("__attribute__" | "__declspec" | "alignas" | "_Alignas") => true,
                Some(word) => self.opt.ignore.iter().any(|ignore| ignore == word),
                None => {
                    if self.peek_punct("[") && self.peek_punct_at(1, "[") {
                        while !self.peek_punct("]") && self.pos < self.tokens.len() {
                            self.pos += 1;
                        }
                        self.eat_punct("]");
                        self.eat_punct("]");
                        continue;
                    }
                    false
                }
            };
            if !ignored {
                return;
            }
            self.pos += 1;
            if self.peek_punct("(") && self.skip_parens().is_err() {
                return;
            }
        }
    }

    fn directive(&mut self, span: Span, leading: Vec<DocComment>) {
        // `#error` and `#pragma` bodies are free text, not tokens.
        if !self.source[span.lo + 1..span.hi]
            .trim_start()
            .starts_with("define")
        {
            return;
        }
        let body = lex::tokenize_range(self.source, span.lo + 1..span.hi, self.errors);
        let mut doc = Doc::new();
        for comment in leading {
            doc.push(comment.text);
        }
        let mut tokens = Vec::new();
        for token in body {
            match token.kind {
                TokenKind::Doc(comment) => doc.push(comment.text),
                _ => tokens.push(token),
            }
        }

        if !tokens.first().is_some_and(|t| t.is_ident("define")) {
            return;
        }
        let Some(name) = tokens.get(1).and_then(|t| {
            t.ident().map(|ident| Name {
                text: ident.to_owned(),
                span: t.span,
            })
        }) else {
            return;
        };
        let value = &tokens[2..];
        let Some(first) = value.first() else {
            // Include guards and feature flags.
            return;
        };
        if first.is_punct("(") && first.span.lo == name.span.hi {
            // Function-like macro.
            return;
        }

        if let [single] = value {
            if let Some(target) = single.ident() {
                self.decls.push(Decl::MacroAlias(MacroAlias {
                    doc,
                    target: Name {
                        text: target.to_owned(),
                        span: single.span,
                    },
                    name,
                    span,
                }));
                return;
            }
        }

        let last = &value[value.len() - 1];
        let expr = normalize_space(&self.source[first.span.lo..last.span.hi]);
        let value = match eval::eval(value, &|name| self.values.get(name).copied()) {
            Some(int) => {
                self.values.insert(name.text.clone(), int);
                Value::from(int)
            }
            None => Value::Symbolic(expr.clone()),
        };
        self.decls.push(Decl::Constant(Constant {
            doc,
            name,
            ty: None,
            expr,
            value,
            span,
        }));
    }

    fn leading_doc(&self, index: usize) -> Doc {
        let mut doc = Doc::new();
        if let Some(comments) = self.docs.get(index) {
            for comment in comments.iter().filter(|c| !c.trailing) {
                doc.push(comment.text.clone());
            }
        }
        doc
    }

    fn trailing_doc(&self, index: usize) -> Doc {
        let mut doc = Doc::new();
        if let Some(comments) = self.docs.get(index) {
            for comment in comments.iter().filter(|c| c.trailing) {
                doc.push(comment.text.clone());
            }
        }
        doc
    }

    fn peek_ident(&self) -> Option<&str> {
        self.peek_ident_at(0)
    }

    fn peek_ident_at(&self, ahead: usize) -> Option<&str> {
        self.tokens.get(self.pos + ahead).and_then(Token::ident)
    }

    fn peek_punct(&self, punct: &str) -> bool {
        self.peek_punct_at(0, punct)
    }

    fn peek_punct_at(&self, ahead: usize, punct: &str) -> bool {
        self.tokens
            .get(self.pos + ahead)
            .is_some_and(|t| t.is_punct(punct))
    }

    fn peek_str_at(&self, ahead: usize) -> bool {
        self.tokens
            .get(self.pos + ahead)
            .is_some_and(|t| matches!(t.kind, TokenKind::Str(_)))
    }

    fn at_statement_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek_punct(";") || self.peek_punct("{")
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let found = self.peek_punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        let found = self.peek_ident() == Some(word);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_any_ident(&mut self) -> Option<Name> {
        let token = self.tokens.get(self.pos)?;
        let text = token.ident()?;
        if is_specifier(text) || text == "const" {
            return None;
        }
        let name = Name {
            text: text.to_owned(),
            span: token.span,
        };
        self.pos += 1;
        Some(name)
    }

    fn expect_ident(&mut self) -> Result<Name> {
        self.eat_any_ident().ok_or_else(|| self.unexpected())
    }

    fn expect_punct(&mut self, punct: &str) -> Result<Span> {
        match self.tokens.get(self.pos) {
            Some(token) if token.is_punct(punct) => {
                self.pos += 1;
                Ok(token.span)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn unexpected(&self) -> Failure {
        match self.tokens.get(self.pos) {
            Some(token) => Failure {
                span: token.span,
                msg: format!(
                    "{}`{}`",
                    UNEXPECTED_TOKEN.msg,
                    &self.source[token.span.range()],
                ),
            },
            None => Failure {
                span: self.current_span(),
                msg: "unexpected end of input".to_owned(),
            },
        }
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(token) => token.span,
            None => Span::new(self.source.len(), self.source.len()),
        }
    }

    fn span_from(&self, start: usize) -> Span {
        let lo = self.tokens[start].span;
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(last) => lo.to(last.span),
            None => lo,
        }
    }

    /// Source text of `tokens[first..end]` as written.
    fn text(&self, first: usize, end: usize) -> String {
        if end <= first {
            return String::new();
        }
        let lo = self.tokens[first].span.lo;
        let hi = self.tokens[end - 1].span.hi;
        self.source[lo..hi].to_owned()
    }
}

fn is_specifier(word: &str) -> bool {
    matches!(
        word,
        "extern"
            | "static"
            | "inline"
            | "__inline"
            | "__inline__"
            | "__forceinline"
            | "constexpr"
            | "consteval"
            | "typedef"
            | "virtual"
            | "explicit"
            | "friend"
            | "volatile"
            | "restrict"
            | "__restrict"
            | "register"
            | "typename"
            | "struct"
            | "union"
            | "enum"
            | "class"
    ) || atom::is_keyword(word)
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{parse_file, ParseOpt};
    use crate::syntax::report::Errors;
    use crate::syntax::{Atom, Base, Decl};
    use indoc::indoc;

    fn parse(source: &str) -> (Vec<Decl>, Errors) {
        let ignore = vec!["SDL_DECLSPEC".to_owned(), "SDLCALL".to_owned()];
        let opt = ParseOpt { ignore: &ignore };
        let mut errors = Errors::new();
        let decls = parse_file(source, &opt, &mut errors);
        (decls, errors)
    }

    fn names(decls: &[Decl]) -> Vec<&str> {
        decls.iter().map(|decl| decl.name().text.as_str()).collect()
    }

    #[test]
    fn test_function_overloads_with_defaults() {
        let (decls, errors) = parse(indoc! {"
            int funcInt(int value, int otherValue = 0);
            int funcInt(int value);
        "});
        assert!(errors.is_empty());
        assert_eq!(names(&decls), ["funcInt", "funcInt"]);
        let Decl::Function(first) = &decls[0] else {
            panic!("expected function");
        };
        assert_eq!(first.params.len(), 2);
        assert_eq!(first.params[1].default.as_deref(), Some("0"));
        let Decl::Function(second) = &decls[1] else {
            panic!("expected function");
        };
        assert_eq!(second.params.len(), 1);
        assert!(second.params[0].default.is_none());
    }

    #[test]
    fn test_enum_values() {
        let (decls, errors) = parse(indoc! {"
            enum MyEnum
            {
              MyENUM_VALUE0,
              MyENUM_VALUE1 = 123,
              MyENUM_VALUE_N = 9999
            };
        "});
        assert!(errors.is_empty());
        let Decl::Enum(enm) = &decls[0] else {
            panic!("expected enum");
        };
        assert_eq!(enm.name.text, "MyEnum");
        let values: Vec<_> = enm
            .variants
            .iter()
            .map(|v| (v.name.text.as_str(), v.value.as_int()))
            .collect();
        assert_eq!(
            values,
            [
                ("MyENUM_VALUE0", Some(0)),
                ("MyENUM_VALUE1", Some(123)),
                ("MyENUM_VALUE_N", Some(9999)),
            ],
        );
    }

    #[test]
    fn test_typedef_enum_with_docs() {
        let (decls, _) = parse(indoc! {"
            /** Flash operation. */
            typedef enum SDL_FlashOperation
            {
                SDL_FLASH_CANCEL,     /**< Cancel any window flash state */
                SDL_FLASH_BRIEFLY,    ///< Flash the window briefly
                SDL_FLASH_UNTIL_FOCUSED = SDL_FLASH_BRIEFLY << 2
            } SDL_FlashOperation;
        "});
        let Decl::Enum(enm) = &decls[0] else {
            panic!("expected enum");
        };
        assert_eq!(enm.doc.lines(), ["Flash operation."]);
        assert_eq!(enm.variants[0].doc.lines(), ["Cancel any window flash state"]);
        assert_eq!(enm.variants[1].doc.lines(), ["Flash the window briefly"]);
        assert_eq!(enm.variants[2].value.as_int(), Some(4));
    }

    #[test]
    fn test_opaque_struct_and_functions() {
        let (decls, errors) = parse(indoc! {"
            typedef struct SDL_Window SDL_Window;
            extern SDL_DECLSPEC SDL_Window * SDLCALL SDL_CreateWindow(const char *title, int w, int h);
            extern SDL_DECLSPEC void SDLCALL SDL_DestroyWindow(SDL_Window *window);
        "});
        assert!(errors.is_empty());
        assert_eq!(
            names(&decls),
            ["SDL_Window", "SDL_CreateWindow", "SDL_DestroyWindow"],
        );
        assert!(matches!(&decls[0], Decl::Struct(s) if s.opaque));
        let Decl::Function(create) = &decls[1] else {
            panic!("expected function");
        };
        assert!(create.ret.is_bare_pointer_to("SDL_Window"));
        assert_eq!(create.params[0].ty.to_string(), "const char*");
    }

    #[test]
    fn test_function_pointer_typedef() {
        let (decls, errors) = parse("typedef void (SDLCALL *SDL_Callback)(void *userdata, int  x);");
        assert!(errors.is_empty());
        let Decl::Alias(alias) = &decls[0] else {
            panic!("expected alias");
        };
        assert_eq!(alias.name.text, "SDL_Callback");
        assert_eq!(
            alias.target.base,
            Base::FnPtr("void (*)(void *userdata, int x)".to_owned()),
        );
    }

    #[test]
    fn test_constexpr_and_macros() {
        let (decls, errors) = parse(indoc! {"
            #define SDL_VALUE 0x10 /**< sixteen */
            #define SDL_OTHER (SDL_VALUE + 1)
            #define SDL_ALIAS SDL_VALUE
            #define SDL_FUNCLIKE(x) ((x) + 1)
            #define SDL_GUARD
            constexpr Enum ENUM_VALUE0 = MyENUM_VALUE0;
            static const int SDL_LIMIT = 3 * 4;
        "});
        assert!(errors.is_empty());
        assert_eq!(
            names(&decls),
            ["SDL_VALUE", "SDL_OTHER", "SDL_ALIAS", "ENUM_VALUE0", "SDL_LIMIT"],
        );
        let Decl::Constant(other) = &decls[1] else {
            panic!("expected constant");
        };
        assert_eq!(other.value.as_int(), Some(17));
        assert!(matches!(&decls[2], Decl::MacroAlias(alias) if alias.target.text == "SDL_VALUE"));
        let Decl::Constant(value0) = &decls[3] else {
            panic!("expected constant");
        };
        assert_eq!(value0.ty.as_ref().and_then(|ty| ty.named()), Some("Enum"));
        assert_eq!(value0.expr, "MyENUM_VALUE0");
        assert!(value0.value.as_int().is_none());
        let Decl::Constant(limit) = &decls[4] else {
            panic!("expected constant");
        };
        assert_eq!(limit.value.as_int(), Some(12));
    }

    #[test]
    fn test_using_alias_and_namespace() {
        let (decls, errors) = parse(indoc! {"
            namespace name {
            using Enum = MyEnum;
            extern \"C\" {
            unsigned long long counter(void);
            }
            } // namespace name
        "});
        assert!(errors.is_empty());
        assert_eq!(names(&decls), ["Enum", "counter"]);
        let Decl::Function(counter) = &decls[1] else {
            panic!("expected function");
        };
        assert_eq!(counter.ret.base, Base::Atom(Atom::ULongLong));
        assert!(counter.params.is_empty());
    }

    #[test]
    fn test_constexpr_function_body() {
        let (decls, errors) = parse(indoc! {"
            constexpr int funcConst(int v) { return v * (2 + 1); }
            inline void funcInline() {}
        "});
        assert!(errors.is_empty());
        let Decl::Function(func) = &decls[0] else {
            panic!("expected function");
        };
        assert!(func.is_constexpr && func.has_body);
        assert_eq!(names(&decls), ["funcConst", "funcInline"]);
    }

    #[test]
    fn test_error_isolation() {
        let (decls, errors) = parse(indoc! {"
            int before(int a);
            int broken(int a, ;
            int after(int b);
        "});
        assert_eq!(names(&decls), ["before", "after"]);
        assert_eq!(errors.iter().count(), 1);
    }

    #[test]
    fn test_unbalanced_parens() {
        let (decls, errors) = parse(indoc! {"
            int broken(int a;
            int after(void);
        "});
        assert_eq!(names(&decls), ["after"]);
        let messages: Vec<_> = errors.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages, ["unbalanced parentheses in signature"]);
    }

    #[test]
    fn test_unterminated_comment_keeps_earlier_decls() {
        let (decls, errors) = parse("int kept(void);\n/** never closed\nint lost(void);\n");
        assert_eq!(names(&decls), ["kept"]);
        assert!(errors.has_errors());
    }

    #[test]
    fn test_variadic_and_fnptr_params() {
        let (decls, errors) = parse(indoc! {"
            int SDL_Log(const char *fmt, ...);
            void SDL_SetHook(void (*hook)(int), void *userdata);
        "});
        assert!(errors.is_empty());
        let Decl::Function(log) = &decls[0] else {
            panic!("expected function");
        };
        assert!(log.variadic);
        let Decl::Function(hook) = &decls[1] else {
            panic!("expected function");
        };
        assert_eq!(hook.params[0].name.as_ref().unwrap().text, "hook");
        assert!(matches!(hook.params[0].ty.base, Base::FnPtr(_)));
    }

    #[test]
    fn test_variables() {
        let (decls, errors) = parse("extern int SDL_counter;\nextern const char *SDL_names[4];\n");
        assert!(errors.is_empty());
        assert!(matches!(&decls[0], Decl::Variable(_)));
        let Decl::Variable(names) = &decls[1] else {
            panic!("expected variable");
        };
        assert_eq!(names.ty.array, ["4"]);
    }

    #[test]
    fn test_doc_attaches_to_next_decl() {
        let (decls, _) = parse(indoc! {"
            /**
             * Get the title.
             *
             * \\param window the window.
             */
            const char *SDL_GetWindowTitle(SDL_Window *window);
        "});
        assert_eq!(
            decls[0].doc().lines(),
            ["Get the title.", "", "\\param window the window."],
        );
    }

    #[test]
    fn test_struct_with_body() {
        let (decls, errors) = parse(indoc! {"
            typedef struct SDL_Point
            {
                int x;
                int y;
            } SDL_Point;
            struct SDL_Rect { int x, y, w, h; };
        "});
        assert!(errors.is_empty());
        assert!(matches!(&decls[0], Decl::Struct(s) if !s.opaque && s.name.text == "SDL_Point"));
        assert!(matches!(&decls[1], Decl::Struct(s) if !s.opaque && s.name.text == "SDL_Rect"));
    }
}
