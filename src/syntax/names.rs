// Naming conventions connecting source declarations to wrapper names.

pub struct Naming<'a> {
    pub prefixes: &'a [String],
    pub constructor_verbs: &'a [String],
    pub destructor_verbs: &'a [String],
}

impl<'a> Naming<'a> {
    /// The source name without its library prefix. A name that would become
    /// empty or stop being an identifier keeps its source spelling.
    pub fn strip<'n>(&self, name: &'n str) -> &'n str {
        for prefix in self.prefixes {
            if let Some(rest) = name.strip_prefix(prefix.as_str()) {
                // `My` is a prefix of `MyEnum` but not of `Mystery`.
                let word_break = prefix.ends_with('_')
                    || rest.starts_with(|ch: char| ch == '_' || ch.is_ascii_uppercase());
                if word_break && rest.starts_with(|ch: char| ch == '_' || ch.is_ascii_alphabetic())
                {
                    return rest;
                }
            }
        }
        name
    }

    pub fn is_constructor(&self, function: &str, type_base: &str) -> bool {
        let stripped = self.strip(function);
        stripped == type_base
            || self
                .constructor_verbs
                .iter()
                .any(|verb| starts_with_verb(stripped, verb))
    }

    pub fn is_destructor(&self, function: &str) -> bool {
        let stripped = self.strip(function);
        self.destructor_verbs
            .iter()
            .any(|verb| starts_with_verb(stripped, verb))
    }
}

/// `CreateWindow`, `Create_Window` and `create_window` start with the verb
/// `Create`; `Created` and `Creator` do not.
pub fn starts_with_verb(name: &str, verb: &str) -> bool {
    if name.len() < verb.len() || !name.is_char_boundary(verb.len()) {
        return false;
    }
    let (head, rest) = name.split_at(verb.len());
    let boundary = rest.is_empty()
        || rest.starts_with(|ch: char| ch == '_' || ch.is_ascii_uppercase() || ch.is_ascii_digit());
    head.eq_ignore_ascii_case(verb) && boundary
}

/// Method name on the owning class: the function's name with the type's base
/// name cut out, so `GetWindowTitle` on `Window` becomes `GetTitle` and
/// `window_get_title` becomes `get_title`.
pub fn method_name(function: &str, type_base: &str) -> String {
    if type_base.is_empty() {
        return function.to_owned();
    }
    let mut search = 0;
    while let Some(found) = function[search..].find(type_base) {
        let start = search + found;
        let end = start + type_base.len();
        let before_ok = start == 0
            || function[..start].ends_with(|ch: char| ch == '_' || ch.is_ascii_lowercase());
        let after = &function[end..];
        let after_ok = after.is_empty()
            || after.starts_with(|ch: char| ch == '_' || ch.is_ascii_uppercase());
        if before_ok && after_ok {
            let mut head = &function[..start];
            let mut tail = after;
            if head.ends_with('_') && (tail.is_empty() || tail.starts_with('_')) {
                head = &head[..head.len() - 1];
            } else if head.is_empty() {
                tail = tail.strip_prefix('_').unwrap_or(tail);
            }
            let method = format!("{}{}", head, tail);
            if method.starts_with(|ch: char| ch == '_' || ch.is_ascii_alphabetic()) {
                return method;
            }
            return function.to_owned();
        }
        search = end;
    }
    // snake_case functions on a CamelCase type: match case-insensitively
    // on whole underscore-separated words.
    let lower = type_base.to_ascii_lowercase();
    let words: Vec<&str> = function.split('_').collect();
    if let Some(pos) = words.iter().position(|word| *word == lower) {
        if words.len() > 1 {
            let rest: Vec<&str> = words
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != pos)
                .map(|(_, word)| *word)
                .collect();
            return rest.join("_");
        }
    }
    function.to_owned()
}

#[cfg(test)]
mod tests {
    use super::{method_name, starts_with_verb, Naming};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_strip_prefix() {
        let prefixes = strings(&["SDL_", "My"]);
        let verbs = Vec::new();
        let naming = Naming {
            prefixes: &prefixes,
            constructor_verbs: &verbs,
            destructor_verbs: &verbs,
        };
        assert_eq!(naming.strip("SDL_Window"), "Window");
        assert_eq!(naming.strip("MyEnum"), "Enum");
        assert_eq!(naming.strip("MyENUM_VALUE0"), "ENUM_VALUE0");
        assert_eq!(naming.strip("funcInt"), "funcInt");
        assert_eq!(naming.strip("Mystery"), "Mystery");
        assert_eq!(naming.strip("SDL_"), "SDL_");
        assert_eq!(naming.strip("SDL_1D"), "SDL_1D");
    }

    #[test]
    fn test_verbs() {
        assert!(starts_with_verb("CreateWindow", "Create"));
        assert!(starts_with_verb("create_window", "Create"));
        assert!(starts_with_verb("Open", "Open"));
        assert!(!starts_with_verb("Created", "Create"));
        assert!(!starts_with_verb("Opener", "Open"));
    }

    #[test]
    fn test_method_name() {
        assert_eq!(method_name("GetWindowTitle", "Window"), "GetTitle");
        assert_eq!(method_name("DestroyWindow", "Window"), "Destroy");
        assert_eq!(method_name("WindowShow", "Window"), "Show");
        assert_eq!(method_name("ShowSimple", "Window"), "ShowSimple");
        assert_eq!(method_name("GetWindowsCount", "Window"), "GetWindowsCount");
        assert_eq!(method_name("window_get_title", "Window"), "get_title");
        assert_eq!(method_name("get_window_title", "window"), "get_title");
        assert_eq!(method_name("Window", "Window"), "Window");
    }
}
