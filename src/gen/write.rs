use crate::gen::classify::{
    AliasPlan, ConstantPlan, EnumPlan, FilePlan, Forward, ForwardKind, Member, ParamPlan,
    Resource, WrapperPlan,
};
use crate::gen::out::OutFile;
use crate::gen::{EmittedConstant, GeneratedFile, Input, Opt};
use crate::syntax::doc;
use crate::syntax::Doc;
use indexmap::IndexMap as Map;

pub(super) fn gen(
    file: usize,
    inputs: &[Input],
    plan: &FilePlan,
    renames: &Map<String, String>,
    opt: &Opt,
) -> GeneratedFile {
    let input = &inputs[file];
    let banner = format!("// Generated by cppfier from {}. Do not edit.", input.name);
    let scope = match &opt.namespace {
        Some(namespace) => format!("{}::", namespace),
        None => "::".to_owned(),
    };
    let out = &mut OutFile::new(banner, renames, scope);

    out.include.insert(match &opt.include_prefix {
        Some(prefix) => format!("<{}{}>", prefix, input.name),
        None => input.name.clone(),
    });
    out.include
        .extend(plan.deps.iter().map(|&dep| inputs[dep].output.clone()));
    if plan
        .plans
        .iter()
        .any(|planned| matches!(planned.plan, WrapperPlan::Resource(_)))
    {
        out.include.compare = true;
        out.include.cstddef = true;
        out.include.utility = true;
    }

    if let Some(namespace) = &opt.namespace {
        out.begin_block(&format!("namespace {}", namespace));
    }

    let mut decls = Vec::new();
    let mut constants = Vec::new();
    for planned in &plan.plans {
        match &planned.plan {
            WrapperPlan::Skip => continue,
            WrapperPlan::Resource(resource) => write_resource(out, resource),
            WrapperPlan::Opaque(alias) | WrapperPlan::Alias(alias) | WrapperPlan::EnumAlias(alias) => {
                write_alias(out, alias);
                constants.extend(alias.constants.iter().map(emitted));
            }
            WrapperPlan::Enum(enm) => {
                write_enum(out, enm);
                constants.extend(enm.constants.iter().map(emitted));
            }
            WrapperPlan::Function(forward) => write_forward(out, forward),
            WrapperPlan::Constant(konst) => {
                write_constant(out, konst);
                constants.push(emitted(konst));
            }
            WrapperPlan::Accessor(accessor) => {
                write_doc(out, "", &accessor.source.doc);
                writeln!(
                    out,
                    "inline auto& {}() {{ return {}; }}",
                    accessor.name, accessor.src,
                );
            }
            WrapperPlan::Unsupported(unsupported) => {
                write_doc(out, "", unsupported.doc);
                writeln!(out, "// {}: not implemented", unsupported.reason);
                writeln!(out, "template<class... ARGS>");
                writeln!(out, "inline void {}(ARGS... args)", unsupported.name);
                writeln!(out, "{{");
                writeln!(out, "  static_assert(false, \"Not implemented\");");
                writeln!(out, "}}");
            }
        }
        decls.push(planned.decl.name().text.clone());
        out.next_section();
    }

    if let Some(namespace) = &opt.namespace {
        out.end_block(&format!("namespace {}", namespace));
    }

    GeneratedFile {
        path: input.output.clone(),
        content: out.content(),
        decls,
        constants,
    }
}

fn emitted(konst: &ConstantPlan) -> EmittedConstant {
    EmittedConstant {
        name: konst.name.clone(),
        source: konst.source_name.clone(),
        value: konst.value,
    }
}

fn write_doc(out: &mut OutFile, indent: &str, doc: &Doc) {
    let lines = doc.lines();
    if lines.is_empty() {
        return;
    }
    writeln!(out, "{}/**", indent);
    for line in &lines {
        if line.is_empty() {
            writeln!(out, "{} *", indent);
        } else {
            writeln!(out, "{} * {}", indent, rename_doc(out, line));
        }
    }
    writeln!(out, "{} */", indent);
}

fn rename_doc(out: &OutFile, line: &str) -> String {
    let renames = out.renames;
    doc::rename_words(line, &|word| renames.get(word).cloned()).replace("*/", "* /")
}

fn write_alias(out: &mut OutFile, alias: &AliasPlan) {
    write_doc(out, "", alias.doc);
    writeln!(out, "using {} = {};", alias.name, alias.src);
    write_constants(out, &alias.constants);
}

fn write_enum(out: &mut OutFile, enm: &EnumPlan) {
    write_doc(out, "", &enm.source.doc);
    writeln!(out, "using {} = {};", enm.name, enm.src);
    write_constants(out, &enm.constants);
}

fn write_constants(out: &mut OutFile, constants: &[ConstantPlan]) {
    if constants.is_empty() {
        return;
    }
    writeln!(out);
    for konst in constants {
        write_constant(out, konst);
    }
}

// A one-line doc trails the constant; anything longer goes above it.
fn write_constant(out: &mut OutFile, konst: &ConstantPlan) {
    let lines = konst.doc.lines();
    if lines.len() > 1 {
        write_doc(out, "", &konst.doc);
    }
    write!(out, "constexpr {} {} = {};", konst.ty, konst.name, konst.src);
    if let [line] = lines.as_slice() {
        write!(out, " ///< {}", rename_doc(out, line));
    }
    writeln!(out);
}

fn write_params(params: &[ParamPlan], defaults: bool) -> String {
    let mut out = String::new();
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.ty);
        out.push(' ');
        out.push_str(&param.name);
        out.push_str(&param.suffix);
        if let (true, Some(default)) = (defaults, &param.default) {
            out.push_str(" = ");
            out.push_str(default);
        }
    }
    out
}

fn write_args<'p>(names: impl IntoIterator<Item = &'p str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}

fn write_forward(out: &mut OutFile, forward: &Forward) {
    write_doc(out, "", &forward.source.doc);
    let qualifier = if forward.source.is_constexpr {
        "constexpr"
    } else {
        "inline"
    };
    writeln!(
        out,
        "{} {} {}({})",
        qualifier,
        forward.ret,
        forward.name,
        write_params(&forward.params, true),
    );
    let args = write_args(forward.params.iter().map(|param| param.name.as_str()));
    writeln!(out, "{{");
    match (&forward.kind, &forward.ret_class) {
        (ForwardKind::Constructor { class, in_class: true }, _) => {
            writeln!(out, "  return {}({});", class, args);
        }
        (_, Some(class)) => writeln!(out, "  return {}({}({}));", class, forward.src, args),
        (_, None) if forward.ret == "void" => writeln!(out, "  {}({});", forward.src, args),
        (_, None) => writeln!(out, "  return {}({});", forward.src, args),
    }
    writeln!(out, "}}");

    match &forward.kind {
        ForwardKind::Destructor { class, method } => {
            writeln!(out);
            writeln!(
                out,
                "inline void {}::{}() {{ {}{}(release()); }}",
                class, method, out.scope, forward.name,
            );
        }
        ForwardKind::Method {
            class,
            method,
            is_const,
        } => {
            let rest = &forward.params[1..];
            writeln!(out);
            writeln!(
                out,
                "inline {} {}::{}({}){}",
                forward.ret,
                class,
                method,
                write_params(rest, false),
                if *is_const { " const" } else { "" },
            );
            let args = write_args(
                Some("m_resource")
                    .into_iter()
                    .chain(rest.iter().map(|param| param.name.as_str())),
            );
            writeln!(out, "{{");
            let ret = if forward.ret == "void" { "" } else { "return " };
            writeln!(out, "  {}{}{}({});", ret, out.scope, forward.name, args);
            writeln!(out, "}}");
        }
        ForwardKind::Plain | ForwardKind::Constructor { .. } => {}
    }
}

fn write_resource(out: &mut OutFile, resource: &Resource) {
    let Resource {
        name,
        raw,
        reference,
        param,
        src,
        destroy,
        ..
    } = resource;

    writeln!(out, "/// Alias to raw representation for {}.", name);
    writeln!(out, "using {} = {}*;", raw, src);
    writeln!(out);
    writeln!(out, "struct {};", reference);
    writeln!(out);

    writeln!(out, "/// Safely wrap {} for non owning parameters", name);
    writeln!(out, "struct {}", param);
    writeln!(out, "{{");
    writeln!(out, "  {} value;", raw);
    writeln!(out);
    writeln!(out, "  /// Constructs from {}", raw);
    writeln!(out, "  constexpr {}({} value)", param, raw);
    writeln!(out, "    : value(value)");
    writeln!(out, "  {{");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Constructs null/invalid");
    writeln!(out, "  constexpr {}(std::nullptr_t _ = nullptr)", param);
    writeln!(out, "    : value(nullptr)");
    writeln!(out, "  {{");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Converts to bool");
    writeln!(out, "  constexpr explicit operator bool() const {{ return !!value; }}");
    writeln!(out);
    writeln!(out, "  /// Comparison");
    writeln!(
        out,
        "  constexpr auto operator<=>(const {}& other) const = default;",
        param,
    );
    writeln!(out);
    writeln!(out, "  /// Converts to underlying {}", raw);
    writeln!(out, "  constexpr operator {}() const {{ return value; }}", raw);
    writeln!(out, "}};");
    writeln!(out);

    write_doc(out, "", &resource.source.doc);
    writeln!(out, "class {}", name);
    writeln!(out, "{{");
    writeln!(out, "  {} m_resource = nullptr;", raw);
    writeln!(out);
    writeln!(out, "public:");
    writeln!(out, "  /// Default ctor");
    writeln!(out, "  constexpr {}() = default;", name);
    writeln!(out);
    writeln!(out, "  /// Constructs from {}, taking ownership.", raw);
    writeln!(out, "  constexpr explicit {}(const {} resource)", name, raw);
    writeln!(out, "    : m_resource(resource)");
    writeln!(out, "  {{");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Copy constructor");
    writeln!(out, "  constexpr {0}(const {0}& other) = delete;", name);
    writeln!(out);
    writeln!(out, "  /// Move constructor");
    writeln!(out, "  constexpr {0}({0}&& other)", name);
    writeln!(out, "    : {}(other.release())", name);
    writeln!(out, "  {{");
    writeln!(out, "  }}");
    for ctor in &resource.ctors {
        writeln!(out);
        write_doc(out, "  ", &ctor.doc);
        writeln!(out, "  {}({})", name, write_params(&ctor.params, true));
        let args = write_args(ctor.params.iter().map(|param| param.name.as_str()));
        writeln!(out, "    : m_resource({}({}))", ctor.src, args);
        writeln!(out, "  {{");
        writeln!(out, "  }}");
    }
    writeln!(out);
    writeln!(out, "  /// Destructor");
    writeln!(out, "  ~{}() {{ {}(m_resource); }}", name, destroy);
    writeln!(out);
    writeln!(out, "  /// Assignment operator.");
    writeln!(out, "  {0}& operator=({0} other)", name);
    writeln!(out, "  {{");
    writeln!(out, "    std::swap(m_resource, other.m_resource);");
    writeln!(out, "    return *this;");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Retrieves underlying {}.", raw);
    writeln!(out, "  constexpr {} get() const {{ return m_resource; }}", raw);
    writeln!(out);
    writeln!(out, "  /// Retrieves underlying {} and clear this.", raw);
    writeln!(out, "  constexpr {} release()", raw);
    writeln!(out, "  {{");
    writeln!(out, "    auto r = m_resource;");
    writeln!(out, "    m_resource = nullptr;");
    writeln!(out, "    return r;");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Comparison");
    writeln!(
        out,
        "  constexpr auto operator<=>(const {}& other) const = default;",
        name,
    );
    writeln!(out);
    writeln!(out, "  /// Converts to bool");
    writeln!(out, "  constexpr explicit operator bool() const {{ return !!m_resource; }}");
    writeln!(out);
    writeln!(out, "  /// Converts to {}", param);
    writeln!(out, "  constexpr operator {}() const {{ return {{m_resource}}; }}", param);
    for member in &resource.members {
        write_member(out, member);
    }
    writeln!(out, "}};");
    writeln!(out);

    writeln!(out, "/// Semi-safe reference for {}.", name);
    writeln!(out, "struct {} : {}", reference, name);
    writeln!(out, "{{");
    writeln!(out, "  /// Constructs from {}.", param);
    writeln!(out, "  {}({} resource)", reference, param);
    writeln!(out, "    : {}(resource.value)", name);
    writeln!(out, "  {{");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Copy constructor.");
    writeln!(out, "  {0}(const {0}& other)", reference);
    writeln!(out, "    : {}(other.get())", name);
    writeln!(out, "  {{");
    writeln!(out, "  }}");
    writeln!(out);
    writeln!(out, "  /// Destructor");
    writeln!(out, "  ~{}() {{ release(); }}", reference);
    writeln!(out, "}};");
}

fn write_member(out: &mut OutFile, member: &Member) {
    writeln!(out);
    write_doc(out, "  ", &member.doc);
    writeln!(
        out,
        "  {} {}({}){};",
        member.ret,
        member.name,
        write_params(&member.params, true),
        if member.is_const { " const" } else { "" },
    );
}
