use crate::syntax::discriminant::Value;
use crate::syntax::lex;
use crate::syntax::report::Errors;
use crate::syntax::{eval, Alias, Constant, Decl, Enum, Function, MacroAlias, Struct};
use indexmap::IndexMap as Map;

const MAX_RESOLVE_DEPTH: usize = 32;

/// A declaration together with the index of the input file it came from.
pub struct Located<'a, T> {
    pub file: usize,
    pub decl: &'a T,
}

impl<'a, T> Clone for Located<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Located<'a, T> {}

/// Every name declared across all headers of one run.
pub struct Types<'a> {
    /// Structs declared without a body anywhere in the run.
    pub opaque: Map<&'a str, Located<'a, Struct>>,
    pub structs: Map<&'a str, Located<'a, Struct>>,
    pub enums: Map<&'a str, Located<'a, Enum>>,
    pub aliases: Map<&'a str, Located<'a, Alias>>,
    pub functions: Map<&'a str, Vec<Located<'a, Function>>>,
    pub constants: Map<&'a str, Located<'a, Constant>>,
    pub macro_aliases: Map<&'a str, Located<'a, MacroAlias>>,
    /// Enumerators, keyed by their own name, with the enum they belong to.
    pub enumerators: Map<&'a str, (Located<'a, Enum>, usize)>,
}

impl<'a> Types<'a> {
    pub fn collect(files: &'a [Vec<Decl>]) -> Self {
        let mut opaque = Map::new();
        let mut structs = Map::new();
        let mut enums = Map::new();
        let mut aliases = Map::new();
        let mut functions = Map::<&str, Vec<_>>::new();
        let mut constants = Map::new();
        let mut macro_aliases = Map::new();
        let mut enumerators = Map::new();

        for (file, decls) in files.iter().enumerate() {
            for decl in decls {
                match decl {
                    Decl::Struct(strct) => {
                        let name = strct.name.text.as_str();
                        let located = Located { file, decl: strct };
                        if strct.opaque {
                            opaque.entry(name).or_insert(located);
                        } else {
                            structs.entry(name).or_insert(located);
                        }
                    }
                    Decl::Enum(enm) => {
                        let located = Located { file, decl: enm };
                        enums.entry(enm.name.text.as_str()).or_insert(located);
                        for (i, variant) in enm.variants.iter().enumerate() {
                            enumerators
                                .entry(variant.name.text.as_str())
                                .or_insert((located, i));
                        }
                    }
                    Decl::Alias(alias) => {
                        aliases
                            .entry(alias.name.text.as_str())
                            .or_insert(Located { file, decl: alias });
                    }
                    Decl::Function(efn) => {
                        functions
                            .entry(efn.name.text.as_str())
                            .or_default()
                            .push(Located { file, decl: efn });
                    }
                    Decl::Constant(konst) => {
                        constants
                            .entry(konst.name.text.as_str())
                            .or_insert(Located { file, decl: konst });
                    }
                    Decl::MacroAlias(alias) => {
                        macro_aliases
                            .entry(alias.name.text.as_str())
                            .or_insert(Located { file, decl: alias });
                    }
                    Decl::Variable(_) => {}
                }
            }
        }

        // A forward declaration followed by a definition is a value type.
        opaque.retain(|name, _| !structs.contains_key(name));

        Types {
            opaque,
            structs,
            enums,
            aliases,
            functions,
            constants,
            macro_aliases,
            enumerators,
        }
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.opaque.contains_key(name)
            || self.structs.contains_key(name)
            || self.enums.contains_key(name)
            || self.aliases.contains_key(name)
    }

    pub fn is_value(&self, name: &str) -> bool {
        self.constants.contains_key(name)
            || self.enumerators.contains_key(name)
            || self.functions.contains_key(name)
    }

    /// The enum behind `name`, following `typedef` and `using` chains.
    pub fn resolve_enum(&self, name: &str) -> Option<Located<'a, Enum>> {
        let mut name = name;
        for _ in 0..MAX_RESOLVE_DEPTH {
            if let Some(enm) = self.enums.get(name) {
                return Some(*enm);
            }
            let alias = self.aliases.get(name)?;
            let target = &alias.decl.target;
            if !target.pointers.is_empty() || target.reference.is_some() {
                return None;
            }
            name = target.named()?;
        }
        None
    }

    /// File declaring the type `name`, if it is one of this run's inputs.
    pub fn file_of_type(&self, name: &str) -> Option<usize> {
        if let Some(strct) = self.opaque.get(name).or_else(|| self.structs.get(name)) {
            return Some(strct.file);
        }
        if let Some(enm) = self.enums.get(name) {
            return Some(enm.file);
        }
        self.aliases.get(name).map(|alias| alias.file)
    }

    /// Integer value of an enumerator, constant or macro, looking through
    /// other headers for anything the parser left symbolic.
    pub fn resolve(&self, name: &str) -> Option<i128> {
        self.resolve_depth(name, 0)
    }

    pub fn value(&self, value: &Value) -> Option<i128> {
        self.value_depth(value, 0)
    }

    fn resolve_depth(&self, name: &str, depth: usize) -> Option<i128> {
        if depth > MAX_RESOLVE_DEPTH {
            return None;
        }
        if let Some((enm, i)) = self.enumerators.get(name) {
            return self.value_depth(&enm.decl.variants[*i].value, depth + 1);
        }
        if let Some(konst) = self.constants.get(name) {
            return self.value_depth(&konst.decl.value, depth + 1);
        }
        let alias = self.macro_aliases.get(name)?;
        self.resolve_depth(&alias.decl.target.text, depth + 1)
    }

    fn value_depth(&self, value: &Value, depth: usize) -> Option<i128> {
        match value {
            Value::Int(discriminant) => Some(discriminant.to_i128()),
            Value::Symbolic(text) => {
                let tokens = lex::tokenize(text, &mut Errors::new());
                eval::eval(&tokens, &|ident| self.resolve_depth(ident, depth + 1))
            }
        }
    }
}
