use crate::gen::Opt;
use crate::syntax::error::{AMBIGUOUS_DECL, DUPLICATE_NAME, SELF_REFERENCE, UNSUPPORTED_DECL};
use crate::syntax::names::{self, Naming};
use crate::syntax::report::Errors;
use crate::syntax::types::Types;
use crate::syntax::{
    Alias, Base, Constant, Decl, Doc, Enum, Function, MacroAlias, Reference, Span, Struct, Type,
    Variable,
};
use indexmap::{IndexMap as Map, IndexSet as Set};
use std::ptr;

/// What to emit for one source declaration.
pub enum WrapperPlan<'a> {
    /// Owning class, `Ref` class and `Param` adapter for an opaque handle.
    Resource(Resource<'a>),
    /// `using TRaw = T*;` for an opaque type without a constructor and
    /// destructor pair.
    Opaque(AliasPlan<'a>),
    Function(Forward<'a>),
    Enum(EnumPlan<'a>),
    EnumAlias(AliasPlan<'a>),
    Alias(AliasPlan<'a>),
    Constant(ConstantPlan),
    Accessor(Accessor<'a>),
    Unsupported(Unsupported<'a>),
    /// Covered elsewhere: a redeclaration, a constant grouped under its
    /// alias, or a name that could not be given a wrapper.
    Skip,
}

pub struct Planned<'a> {
    pub decl: &'a Decl,
    pub plan: WrapperPlan<'a>,
}

pub struct FilePlan<'a> {
    pub plans: Vec<Planned<'a>>,
    /// Other input files whose wrappers this file's signatures use.
    pub deps: Set<usize>,
}

pub struct Plan<'a> {
    pub files: Vec<FilePlan<'a>>,
    /// Source symbol to wrapper symbol, for rewriting doc comments.
    pub renames: Map<String, String>,
}

pub struct Resource<'a> {
    pub source: &'a Struct,
    pub name: String,
    pub raw: String,
    pub reference: String,
    pub param: String,
    /// The source struct as spelled from inside the wrapper namespace.
    pub src: String,
    pub destroy: String,
    pub ctors: Vec<ClassCtor>,
    pub members: Vec<Member>,
}

pub struct ClassCtor {
    pub doc: Doc,
    pub src: String,
    pub params: Vec<ParamPlan>,
}

/// A method declared in the owning class and defined after its free
/// function.
pub struct Member {
    pub doc: Doc,
    pub name: String,
    pub ret: String,
    pub params: Vec<ParamPlan>,
    pub is_const: bool,
}

pub struct Forward<'a> {
    pub source: &'a Function,
    pub name: String,
    pub src: String,
    pub kind: ForwardKind,
    pub ret: String,
    /// Wraps the source call's result: `Class(src(args))`.
    pub ret_class: Option<String>,
    pub params: Vec<ParamPlan>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ForwardKind {
    Plain,
    Constructor { class: String, in_class: bool },
    Destructor { class: String, method: String },
    Method { class: String, method: String, is_const: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParamPlan {
    pub ty: String,
    pub name: String,
    /// Array extents written after the name.
    pub suffix: String,
    pub default: Option<String>,
}

pub struct EnumPlan<'a> {
    pub source: &'a Enum,
    pub name: String,
    pub src: String,
    pub constants: Vec<ConstantPlan>,
}

pub struct AliasPlan<'a> {
    pub doc: &'a Doc,
    pub name: String,
    /// Right-hand side of the `using`.
    pub src: String,
    pub constants: Vec<ConstantPlan>,
}

#[derive(Clone, Debug)]
pub struct ConstantPlan {
    pub doc: Doc,
    pub name: String,
    pub source_name: String,
    pub ty: String,
    pub src: String,
    pub value: Option<i128>,
}

pub struct Accessor<'a> {
    pub source: &'a Variable,
    pub name: String,
    pub src: String,
}

pub struct Unsupported<'a> {
    pub doc: &'a Doc,
    pub name: String,
    pub reason: &'static str,
}

#[derive(Copy, Clone, PartialEq)]
enum Seen {
    Type,
    Value,
    Function,
}

struct ResourceInfo<'a> {
    /// File declaring the opaque struct.
    file: usize,
    /// File holding the destructor, where the triad is emitted.
    home: usize,
    decl: &'a Decl,
    source: &'a Struct,
    name: String,
    ctors: Vec<&'a Function>,
    destroy: &'a Function,
    ctor_signatures: Set<String>,
    member_keys: Set<String>,
}

// Names the owning class already defines.
const RESERVED_MEMBERS: &[&str] = &["get", "release", "swap", "operator"];

pub fn plan<'a>(
    files: &'a [Vec<Decl>],
    types: &'a Types<'a>,
    opt: &'a Opt,
    errors: &mut [Errors],
) -> Plan<'a> {
    let mut cx = Classifier {
        types,
        naming: Naming {
            prefixes: &opt.prefixes,
            constructor_verbs: &opt.constructor_verbs,
            destructor_verbs: &opt.destructor_verbs,
        },
        namespace: opt.namespace.as_deref(),
        resources: Map::new(),
        wrappers: Map::new(),
        renames: Map::new(),
        seen: Map::new(),
    };

    cx.find_resources(files);
    for (file, decls) in files.iter().enumerate() {
        cx.register_types(decls, &mut errors[file]);
    }
    let mut plans = Vec::with_capacity(files.len());
    for (file, decls) in files.iter().enumerate() {
        let plan = cx.plan_file(file, decls, &mut errors[file]);
        tracing::debug!(
            file,
            plans = plan.plans.len(),
            deps = plan.deps.len(),
            "classified"
        );
        plans.push(plan);
    }

    Plan {
        files: plans,
        renames: cx.renames,
    }
}

struct Classifier<'a> {
    types: &'a Types<'a>,
    naming: Naming<'a>,
    namespace: Option<&'a str>,
    resources: Map<&'a str, ResourceInfo<'a>>,
    /// Source type name to the wrapper's base name.
    wrappers: Map<&'a str, String>,
    renames: Map<String, String>,
    seen: Map<String, Seen>,
}

impl<'a> Classifier<'a> {
    fn find_resources(&mut self, files: &'a [Vec<Decl>]) {
        let types = self.types;
        for (&name, located) in &types.opaque {
            let base = self.naming.strip(name);
            let Some(decl) = files[located.file]
                .iter()
                .find(|decl| matches!(decl, Decl::Struct(strct) if ptr::eq(strct, located.decl)))
            else {
                continue;
            };
            let mut ctors = Vec::new();
            let mut destroy = None;
            for (file, decls) in files.iter().enumerate() {
                for decl in decls {
                    let Decl::Function(efn) = decl else {
                        continue;
                    };
                    if efn.variadic {
                        continue;
                    }
                    let fn_name = &efn.name.text;
                    if efn.ret.is_bare_pointer_to(name) && self.naming.is_constructor(fn_name, base) {
                        ctors.push(efn);
                    } else if destroy.is_none()
                        && efn.ret.is_void()
                        && efn.params.len() == 1
                        && efn.params[0].ty.is_bare_pointer_to(name)
                        && self.naming.is_destructor(fn_name)
                    {
                        destroy = Some((file, efn));
                    }
                }
            }
            if let (false, Some((home, destroy))) = (ctors.is_empty(), destroy) {
                tracing::debug!(name, home, ctors = ctors.len(), "resource");
                self.resources.insert(
                    name,
                    ResourceInfo {
                        file: located.file,
                        home,
                        decl,
                        source: located.decl,
                        name: base.to_owned(),
                        ctors,
                        destroy,
                        ctor_signatures: Set::new(),
                        member_keys: Set::new(),
                    },
                );
            }
        }
    }

    // Type wrappers are decided up front so that every signature, in any
    // file, agrees on how a type is spelled.
    fn register_types(&mut self, decls: &'a [Decl], errors: &mut Errors) {
        for decl in decls {
            let name = match decl {
                Decl::Struct(strct) if self.is_primary_struct(strct) => &strct.name,
                Decl::Enum(enm) => {
                    let primary = self.types.enums.get(enm.name.text.as_str());
                    if !self.is_primary(primary.map(|e| e.decl), enm) {
                        continue;
                    }
                    &enm.name
                }
                Decl::Alias(alias) => {
                    let primary = self.types.aliases.get(alias.name.text.as_str());
                    if !self.is_primary(primary.map(|a| a.decl), alias) || is_self_alias(alias) {
                        continue;
                    }
                    &alias.name
                }
                Decl::MacroAlias(alias) if self.types.is_type(&alias.target.text) => &alias.name,
                _ => continue,
            };
            let source = name.text.as_str();
            let wrapper = self.naming.strip(source).to_owned();
            if !self.allow_name(source, &wrapper, name.span, errors) {
                continue;
            }
            let mut claimed = vec![wrapper.clone()];
            if self.resources.contains_key(source) {
                claimed.extend(["Raw", "Ref", "Param"].map(|suffix| format!("{}{}", wrapper, suffix)));
            } else if self.types.opaque.contains_key(source) {
                claimed = vec![format!("{}Raw", wrapper)];
            }
            if !self.claim(&claimed, Seen::Type, name.span, errors) {
                continue;
            }
            self.rename(source, &claimed[0]);
            self.wrappers.insert(source, wrapper);
        }
    }

    fn plan_file(&mut self, file: usize, decls: &'a [Decl], errors: &mut Errors) -> FilePlan<'a> {
        let mut deps = Set::new();

        // Constants typed with an alias of this file are emitted under it.
        let mut grouped = Map::<&str, Vec<&'a Constant>>::new();
        for decl in decls {
            if let Decl::Constant(konst) = decl {
                if let Some(alias) = self.grouping_alias(file, konst) {
                    grouped.entry(alias).or_default().push(konst);
                }
            }
        }
        let is_grouped = |konst: &Constant| {
            grouped
                .values()
                .any(|group| group.iter().any(|k| ptr::eq(*k, konst)))
        };

        // Resources whose destructor lives here but whose struct is declared
        // in another file. Each is emitted before its first use.
        let mut moved: Vec<&'a str> = self
            .resources
            .iter()
            .filter(|(_, info)| info.home == file && info.file != file)
            .map(|(&raw, _)| raw)
            .collect();

        let mut plans = Vec::with_capacity(decls.len());
        let mut resource_at = Map::<String, usize>::new();
        for decl in decls {
            if let Decl::Function(efn) = decl {
                while let Some(at) = moved.iter().position(|&raw| mentions(efn, raw)) {
                    let raw = moved.remove(at);
                    if let Some(planned) = self.moved_resource(raw) {
                        if let WrapperPlan::Resource(resource) = &planned.plan {
                            resource_at.insert(resource.name.clone(), plans.len());
                        }
                        plans.push(planned);
                    }
                }
            }
            let plan = match decl {
                Decl::Struct(strct) => self.plan_struct(file, strct),
                Decl::Enum(enm) => self.plan_enum(enm, errors),
                Decl::Alias(alias) => {
                    let group = grouped.get(alias.name.text.as_str());
                    self.plan_alias(file, alias, group, &mut deps, errors)
                }
                Decl::Constant(konst) if is_grouped(konst) => WrapperPlan::Skip,
                Decl::Constant(konst) => match self.plan_constant(file, konst, &mut deps, errors) {
                    Some(plan) => WrapperPlan::Constant(plan),
                    None => WrapperPlan::Skip,
                },
                Decl::MacroAlias(alias) => self.plan_macro_alias(alias, errors),
                Decl::Variable(var) => self.plan_variable(var, errors),
                Decl::Function(efn) => self.plan_function(file, efn, &mut deps, errors),
            };
            if let WrapperPlan::Resource(resource) = &plan {
                resource_at.insert(resource.name.clone(), plans.len());
            }
            plans.push(Planned { decl, plan });
        }

        // Fill in the class members now that every function is planned.
        let mut ctors = Map::<usize, Vec<ClassCtor>>::new();
        let mut members = Map::<usize, Vec<Member>>::new();
        for planned in &plans {
            let WrapperPlan::Function(forward) = &planned.plan else {
                continue;
            };
            match &forward.kind {
                ForwardKind::Plain => {}
                ForwardKind::Constructor { class, in_class } => {
                    if let (true, Some(&at)) = (*in_class, resource_at.get(class)) {
                        ctors.entry(at).or_default().push(ClassCtor {
                            doc: forward.source.doc.clone(),
                            src: forward.src.clone(),
                            params: forward.params.clone(),
                        });
                    }
                }
                ForwardKind::Destructor { class, method } => {
                    if let Some(&at) = resource_at.get(class) {
                        members.entry(at).or_default().push(Member {
                            doc: forward.source.doc.clone(),
                            name: method.clone(),
                            ret: "void".to_owned(),
                            params: Vec::new(),
                            is_const: false,
                        });
                    }
                }
                ForwardKind::Method {
                    class,
                    method,
                    is_const,
                } => {
                    if let Some(&at) = resource_at.get(class) {
                        members.entry(at).or_default().push(Member {
                            doc: forward.source.doc.clone(),
                            name: method.clone(),
                            ret: forward.ret.clone(),
                            params: forward.params[1..].to_vec(),
                            is_const: *is_const,
                        });
                    }
                }
            }
        }
        for (at, list) in ctors {
            if let WrapperPlan::Resource(resource) = &mut plans[at].plan {
                resource.ctors = list;
            }
        }
        for (at, list) in members {
            if let WrapperPlan::Resource(resource) = &mut plans[at].plan {
                resource.members = list;
            }
        }

        FilePlan { plans, deps }
    }

    fn plan_struct(&mut self, file: usize, strct: &'a Struct) -> WrapperPlan<'a> {
        let source = strct.name.text.as_str();
        if !self.is_primary_struct(strct) {
            return WrapperPlan::Skip;
        }
        let Some(wrapper) = self.wrappers.get(source).cloned() else {
            return WrapperPlan::Skip;
        };
        if let Some(info) = self.resources.get(source) {
            if info.home != file {
                return WrapperPlan::Skip;
            }
            return WrapperPlan::Resource(self.resource(info, wrapper));
        }
        let src = self.src(source);
        if strct.opaque {
            return WrapperPlan::Opaque(AliasPlan {
                doc: &strct.doc,
                name: format!("{}Raw", wrapper),
                src: format!("{}*", src),
                constants: Vec::new(),
            });
        }
        WrapperPlan::Alias(AliasPlan {
            doc: &strct.doc,
            name: wrapper,
            src,
            constants: Vec::new(),
        })
    }

    fn moved_resource(&self, raw: &str) -> Option<Planned<'a>> {
        let info = self.resources.get(raw)?;
        let wrapper = self.wrappers.get(raw)?.clone();
        Some(Planned {
            decl: info.decl,
            plan: WrapperPlan::Resource(self.resource(info, wrapper)),
        })
    }

    fn resource(&self, info: &ResourceInfo<'a>, wrapper: String) -> Resource<'a> {
        Resource {
            source: info.source,
            raw: format!("{}Raw", wrapper),
            reference: format!("{}Ref", wrapper),
            param: format!("{}Param", wrapper),
            name: wrapper,
            src: self.src(&info.source.name.text),
            destroy: self.src(&info.destroy.name.text),
            ctors: Vec::new(),
            members: Vec::new(),
        }
    }

    fn plan_enum(&mut self, enm: &'a Enum, errors: &mut Errors) -> WrapperPlan<'a> {
        let source = enm.name.text.as_str();
        let primary = self.types.enums.get(source).map(|e| e.decl);
        if !self.is_primary(primary, enm) {
            return WrapperPlan::Skip;
        }
        let Some(wrapper) = self.wrappers.get(source).cloned() else {
            return WrapperPlan::Skip;
        };
        let src = self.src(source);

        let mut constants = Vec::new();
        for variant in &enm.variants {
            let variant_name = variant.name.text.as_str();
            let name = self.naming.strip(variant_name).to_owned();
            // Scoped enumerators are not visible at namespace scope, so they
            // can never collide with their wrapper.
            if !enm.scoped && !self.allow_name(variant_name, &name, variant.name.span, errors) {
                continue;
            }
            if !self.claim(&[name.clone()], Seen::Value, variant.name.span, errors) {
                continue;
            }
            self.rename(variant_name, &name);
            let src = if enm.scoped {
                format!("{}::{}", src, variant_name)
            } else {
                self.src(variant_name)
            };
            constants.push(ConstantPlan {
                doc: variant.doc.clone(),
                name,
                source_name: variant_name.to_owned(),
                ty: wrapper.clone(),
                src,
                value: self.types.value(&variant.value),
            });
        }

        WrapperPlan::Enum(EnumPlan {
            source: enm,
            name: wrapper,
            src,
            constants,
        })
    }

    fn plan_alias(
        &mut self,
        file: usize,
        alias: &'a Alias,
        group: Option<&Vec<&'a Constant>>,
        deps: &mut Set<usize>,
        errors: &mut Errors,
    ) -> WrapperPlan<'a> {
        let source = alias.name.text.as_str();
        let primary = self.types.aliases.get(source).map(|a| a.decl);
        if !self.is_primary(primary, alias) || is_self_alias(alias) {
            return WrapperPlan::Skip;
        }
        let Some(wrapper) = self.wrappers.get(source).cloned() else {
            return WrapperPlan::Skip;
        };

        let mut constants = Vec::new();
        for konst in group.into_iter().flatten() {
            if let Some(plan) = self.plan_constant(file, konst, deps, errors) {
                constants.push(plan);
            }
        }

        let base = self.types.resolve_enum(source);
        let plan = AliasPlan {
            doc: &alias.doc,
            name: wrapper.clone(),
            src: self.src(source),
            constants,
        };
        let Some(base) = base else {
            return WrapperPlan::Alias(plan);
        };

        let mut plan = plan;
        if plan.constants.is_empty() && base.file != file {
            // Re-export the base enumerators under the alias's own names.
            let base_wrapper = self
                .wrappers
                .get(base.decl.name.text.as_str())
                .cloned()
                .unwrap_or_else(|| self.naming.strip(&base.decl.name.text).to_owned());
            let base_src = self.src(&base.decl.name.text);
            for variant in &base.decl.variants {
                let variant_name = variant.name.text.as_str();
                let stripped = self.naming.strip(variant_name);
                let name = rename_enumerator(stripped, &base_wrapper, &wrapper);
                if !self.claim(&[name.clone()], Seen::Value, alias.name.span, errors) {
                    continue;
                }
                let src = if base.decl.scoped {
                    format!("{}::{}", base_src, variant_name)
                } else {
                    self.src(variant_name)
                };
                plan.constants.push(ConstantPlan {
                    doc: variant.doc.clone(),
                    name,
                    source_name: variant_name.to_owned(),
                    ty: wrapper.clone(),
                    src,
                    value: self.types.value(&variant.value),
                });
            }
        }
        WrapperPlan::EnumAlias(plan)
    }

    fn plan_constant(
        &mut self,
        file: usize,
        konst: &Constant,
        deps: &mut Set<usize>,
        errors: &mut Errors,
    ) -> Option<ConstantPlan> {
        let source = konst.name.text.as_str();
        let name = self.naming.strip(source).to_owned();
        if !self.allow_name(source, &name, konst.name.span, errors)
            || !self.claim(&[name.clone()], Seen::Value, konst.name.span, errors)
        {
            return None;
        }
        self.rename(source, &name);
        let ty = match &konst.ty {
            Some(ty) => {
                let mut ty = self.wrapped(file, ty, deps);
                if ty.pointers.is_empty() {
                    ty.is_const = false;
                }
                ty.to_string()
            }
            None => "auto".to_owned(),
        };
        Some(ConstantPlan {
            doc: konst.doc.clone(),
            name,
            source_name: source.to_owned(),
            ty,
            src: self.src(source),
            value: self.types.value(&konst.value),
        })
    }

    fn plan_macro_alias(&mut self, alias: &'a MacroAlias, errors: &mut Errors) -> WrapperPlan<'a> {
        let source = alias.name.text.as_str();
        let target = alias.target.text.as_str();
        if self.types.is_type(target) {
            return match self.wrappers.get(source).cloned() {
                Some(wrapper) => WrapperPlan::Alias(AliasPlan {
                    doc: &alias.doc,
                    name: wrapper,
                    src: self.src(source),
                    constants: Vec::new(),
                }),
                None => WrapperPlan::Skip,
            };
        }

        let name = self.naming.strip(source).to_owned();
        if !self.allow_name(source, &name, alias.name.span, errors)
            || !self.claim(&[name.clone()], Seen::Value, alias.name.span, errors)
        {
            return WrapperPlan::Skip;
        }
        let known = self.types.is_value(target) || self.types.macro_aliases.contains_key(target);
        if !known {
            self.warn(
                errors,
                alias.name.span,
                format!("{}`{}`", AMBIGUOUS_DECL.msg, source),
            );
        }
        self.rename(source, &name);
        WrapperPlan::Constant(ConstantPlan {
            doc: alias.doc.clone(),
            name,
            source_name: source.to_owned(),
            ty: "auto".to_owned(),
            src: self.src(source),
            value: self.types.resolve(source),
        })
    }

    fn plan_variable(&mut self, var: &'a Variable, errors: &mut Errors) -> WrapperPlan<'a> {
        let source = var.name.text.as_str();
        let name = self.naming.strip(source).to_owned();
        if !self.allow_name(source, &name, var.name.span, errors)
            || !self.claim(&[name.clone()], Seen::Function, var.name.span, errors)
        {
            return WrapperPlan::Skip;
        }
        self.warn(
            errors,
            var.name.span,
            format!("{}`{}`", AMBIGUOUS_DECL.msg, source),
        );
        self.rename(source, &name);
        WrapperPlan::Accessor(Accessor {
            source: var,
            name,
            src: self.src(source),
        })
    }

    fn plan_function(
        &mut self,
        file: usize,
        efn: &'a Function,
        deps: &mut Set<usize>,
        errors: &mut Errors,
    ) -> WrapperPlan<'a> {
        let source = efn.name.text.as_str();
        let name = self.naming.strip(source).to_owned();
        if !self.allow_name(source, &name, efn.name.span, errors)
            || !self.claim(&[name.clone()], Seen::Function, efn.name.span, errors)
        {
            return WrapperPlan::Skip;
        }
        self.rename(source, &name);

        if let Some(reason) = unsupported_reason(efn) {
            self.error(
                errors,
                efn.name.span,
                format!("{}`{}`: {}", UNSUPPORTED_DECL.msg, source, reason),
            );
            return WrapperPlan::Unsupported(Unsupported {
                doc: &efn.doc,
                name,
                reason,
            });
        }

        let kind = self.forward_kind(file, efn);
        let mut params = Vec::with_capacity(efn.params.len());
        for (i, param) in efn.params.iter().enumerate() {
            let ty = match &kind {
                ForwardKind::Destructor { class, .. } if i == 0 => format!("{}Raw", class),
                _ => self.param_type(file, &param.ty, deps),
            };
            let name = match &param.name {
                Some(name) => name.text.clone(),
                None => format!("arg{}", i),
            };
            let suffix = param
                .ty
                .array
                .iter()
                .map(|extent| format!("[{}]", extent))
                .collect();
            params.push(ParamPlan {
                ty,
                name,
                suffix,
                default: param.default.clone(),
            });
        }

        if let ForwardKind::Constructor { class, in_class } = &kind {
            if *in_class {
                let signature = params
                    .iter()
                    .map(|param| format!("{}{}", param.ty, param.suffix))
                    .collect::<Vec<_>>()
                    .join(", ");
                let fresh = self
                    .resource_by_class(class)
                    .is_some_and(|info| info.ctor_signatures.insert(signature));
                if !fresh {
                    let kind = ForwardKind::Constructor {
                        class: class.clone(),
                        in_class: false,
                    };
                    return self.finish_forward(file, efn, name, kind, params, deps);
                }
            }
        }
        let kind = match kind {
            ForwardKind::Method {
                class,
                method,
                is_const,
            } => {
                let key = format!(
                    "{}({}){}",
                    method,
                    params[1..]
                        .iter()
                        .map(|param| param.ty.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    if is_const { " const" } else { "" },
                );
                let clash = method == class
                    || RESERVED_MEMBERS.contains(&method.as_str())
                    || !self
                        .resource_by_class(&class)
                        .is_some_and(|info| info.member_keys.insert(key));
                if clash {
                    ForwardKind::Plain
                } else {
                    ForwardKind::Method {
                        class,
                        method,
                        is_const,
                    }
                }
            }
            ForwardKind::Destructor { class, method } => {
                let key = format!("{}()", method);
                let fresh = self
                    .resource_by_class(&class)
                    .is_some_and(|info| info.member_keys.insert(key));
                if fresh && !RESERVED_MEMBERS.contains(&method.as_str()) && method != class {
                    ForwardKind::Destructor { class, method }
                } else {
                    ForwardKind::Plain
                }
            }
            kind => kind,
        };
        self.finish_forward(file, efn, name, kind, params, deps)
    }

    fn finish_forward(
        &mut self,
        file: usize,
        efn: &'a Function,
        name: String,
        kind: ForwardKind,
        params: Vec<ParamPlan>,
        deps: &mut Set<usize>,
    ) -> WrapperPlan<'a> {
        let (ret, ret_class) = match &kind {
            ForwardKind::Constructor { class, in_class } => {
                let wrap = if *in_class { None } else { Some(class.clone()) };
                (class.clone(), wrap)
            }
            _ => self.ret_type(file, &efn.ret, deps),
        };
        WrapperPlan::Function(Forward {
            source: efn,
            name,
            src: self.src(&efn.name.text),
            kind,
            ret,
            ret_class,
            params,
        })
    }

    fn forward_kind(&self, file: usize, efn: &'a Function) -> ForwardKind {
        let resources = || {
            self.resources
                .iter()
                .filter(|&(&raw, _)| self.wrappers.contains_key(raw))
        };
        // Creating or destroying one resource wins over being a method of another.
        for (_, info) in resources() {
            if info.ctors.iter().any(|ctor| ptr::eq(*ctor, efn)) {
                return ForwardKind::Constructor {
                    class: info.name.clone(),
                    in_class: info.home == file && !efn.params.is_empty(),
                };
            }
            if ptr::eq(info.destroy, efn) {
                return ForwardKind::Destructor {
                    class: info.name.clone(),
                    method: names::method_name(self.naming.strip(&efn.name.text), &info.name),
                };
            }
        }
        for (&raw, info) in resources() {
            if info.home != file {
                continue;
            }
            if let Some(first) = efn.params.first() {
                if first.ty.is_single_pointer_to(raw) {
                    return ForwardKind::Method {
                        class: info.name.clone(),
                        method: names::method_name(self.naming.strip(&efn.name.text), &info.name),
                        is_const: first.ty.is_const,
                    };
                }
            }
        }
        ForwardKind::Plain
    }

    fn resource_by_class(&mut self, class: &str) -> Option<&mut ResourceInfo<'a>> {
        self.resources.values_mut().find(|info| info.name == class)
    }

    // The alias a constant is grouped under: one declared in the same file
    // that names the constant's type exactly.
    fn grouping_alias(&self, file: usize, konst: &Constant) -> Option<&'a str> {
        let ty = konst.ty.as_ref()?;
        if !ty.pointers.is_empty() || ty.reference.is_some() {
            return None;
        }
        let name = ty.named()?;
        let (&key, alias) = self.types.aliases.get_key_value(name)?;
        (alias.file == file && self.wrappers.contains_key(key)).then_some(key)
    }

    /// A type spelled with wrapper names where they exist.
    fn wrapped(&self, file: usize, ty: &Type, deps: &mut Set<usize>) -> Type {
        let Some(name) = ty.named() else {
            return ty.clone();
        };
        let Some(wrapper) = self.wrappers.get(name) else {
            return ty.clone();
        };
        if self.types.opaque.contains_key(name) {
            if !ty.is_bare_pointer_to(name) {
                return ty.clone();
            }
            self.depend(file, name, deps);
            let mut raw = ty.with_base(format!("{}Raw", wrapper));
            let outer = raw.pointers.pop();
            raw.is_const = outer.is_some_and(|ptr| ptr.is_const);
            return raw;
        }
        self.depend(file, name, deps);
        ty.with_base(wrapper.clone())
    }

    fn param_type(&self, file: usize, ty: &Type, deps: &mut Set<usize>) -> String {
        if let Some(name) = ty.named() {
            if self.resources.contains_key(name)
                && self.wrappers.contains_key(name)
                && ty.is_single_pointer_to(name)
            {
                self.depend(file, name, deps);
                return format!("{}Param", self.wrappers[name]);
            }
        }
        self.wrapped(file, ty, deps).to_string()
    }

    fn ret_type(&self, file: usize, ty: &Type, deps: &mut Set<usize>) -> (String, Option<String>) {
        if let Some(name) = ty.named() {
            if self.resources.contains_key(name)
                && self.wrappers.contains_key(name)
                && ty.is_bare_pointer_to(name)
            {
                self.depend(file, name, deps);
                let reference = format!("{}Ref", self.wrappers[name]);
                return (reference.clone(), Some(reference));
            }
        }
        (self.wrapped(file, ty, deps).to_string(), None)
    }

    fn depend(&self, file: usize, name: &str, deps: &mut Set<usize>) {
        let other = match self.resources.get(name) {
            Some(info) => Some(info.home),
            None => self.types.file_of_type(name),
        };
        if let Some(other) = other {
            if other != file {
                deps.insert(other);
            }
        }
    }

    fn is_primary_struct(&self, strct: &Struct) -> bool {
        let name = strct.name.text.as_str();
        let primary = self
            .types
            .opaque
            .get(name)
            .or_else(|| self.types.structs.get(name))
            .map(|s| s.decl);
        self.is_primary(primary, strct)
    }

    fn is_primary<T>(&self, primary: Option<&T>, decl: &T) -> bool {
        primary.is_some_and(|primary| ptr::eq(primary, decl))
    }

    /// The source spelling of `name` from inside the wrapper namespace.
    fn src(&self, name: &str) -> String {
        if self.namespace.is_some() && self.naming.strip(name) == name {
            format!("::{}", name)
        } else {
            name.to_owned()
        }
    }

    // Without a namespace a wrapper cannot share its source's name.
    fn allow_name(&self, source: &str, wrapper: &str, span: Span, errors: &mut Errors) -> bool {
        if self.namespace.is_none() && source == wrapper {
            self.warn(errors, span, format!("{}`{}`", SELF_REFERENCE.msg, source));
            return false;
        }
        true
    }

    fn claim(&mut self, names: &[String], kind: Seen, span: Span, errors: &mut Errors) -> bool {
        for name in names {
            match self.seen.get(name) {
                None => {}
                Some(Seen::Function) if kind == Seen::Function => {}
                Some(_) => {
                    self.warn(errors, span, format!("{}`{}`", DUPLICATE_NAME.msg, name));
                    return false;
                }
            }
        }
        for name in names {
            self.seen.insert(name.clone(), kind);
        }
        true
    }

    fn rename(&mut self, source: &str, wrapper: &str) {
        if source != wrapper {
            self.renames.insert(source.to_owned(), wrapper.to_owned());
        }
    }

    fn warn(&self, errors: &mut Errors, span: Span, msg: String) {
        tracing::warn!("{}", msg);
        errors.warning(span, msg);
    }

    fn error(&self, errors: &mut Errors, span: Span, msg: String) {
        tracing::warn!("{}", msg);
        errors.error(span, msg);
    }
}

// `typedef enum E E;` restates a name that is already a type.
fn is_self_alias(alias: &Alias) -> bool {
    alias.target.named() == Some(alias.name.text.as_str()) && alias.target.pointers.is_empty()
}

fn mentions(efn: &Function, raw: &str) -> bool {
    efn.ret.named() == Some(raw) || efn.params.iter().any(|param| param.ty.named() == Some(raw))
}

fn unsupported_reason(efn: &Function) -> Option<&'static str> {
    if efn.variadic {
        return Some("variadic function");
    }
    for param in &efn.params {
        match &param.ty.base {
            Base::FnPtr(_) => return Some("inline function pointer parameter"),
            Base::Named(name) if name == "va_list" => return Some("va_list parameter"),
            _ => {}
        }
        if param.ty.reference == Some(Reference::RValue) {
            return Some("rvalue reference parameter");
        }
    }
    None
}

/// Enumerator name for an alias of an enum declared elsewhere:
/// `ENUM_VALUE0` of `Enum` becomes `OTHER_ENUM_VALUE0` under `OtherEnum`.
pub fn rename_enumerator(enumerator: &str, base: &str, alias: &str) -> String {
    let base_upper = upper_snake(base);
    let alias_upper = upper_snake(alias);
    for candidate in [base_upper.clone(), base.to_ascii_uppercase()] {
        if let Some(rest) = enumerator.strip_prefix(candidate.as_str()) {
            if rest.is_empty() || rest.starts_with('_') {
                return format!("{}{}", alias_upper, rest);
            }
        }
    }
    format!("{}_{}", alias_upper, enumerator)
}

fn upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        out.push(ch.to_ascii_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{rename_enumerator, upper_snake};

    #[test]
    fn test_upper_snake() {
        assert_eq!(upper_snake("Enum"), "ENUM");
        assert_eq!(upper_snake("FlashOperation"), "FLASH_OPERATION");
        assert_eq!(upper_snake("Uint32"), "UINT32");
    }

    #[test]
    fn test_rename_enumerator() {
        assert_eq!(rename_enumerator("ENUM_VALUE0", "Enum", "OtherEnum"), "OTHER_ENUM_VALUE0");
        assert_eq!(rename_enumerator("FLASH_CANCEL", "FlashOperation", "Flash"), "FLASH_FLASH_CANCEL");
        assert_eq!(rename_enumerator("ENUM", "Enum", "Other"), "OTHER");
    }
}
