/// Builtin arithmetic and void types spelled with C keywords.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Atom {
    Void,
    Bool,
    Char,
    SChar,
    UChar,
    WChar,
    Char8,
    Char16,
    Char32,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
}

pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "void"
            | "bool"
            | "_Bool"
            | "char"
            | "wchar_t"
            | "char8_t"
            | "char16_t"
            | "char32_t"
            | "short"
            | "int"
            | "long"
            | "signed"
            | "unsigned"
            | "float"
            | "double"
    )
}

impl Atom {
    /// Combines a sequence of primitive keywords, in any order, the way C
    /// allows: `unsigned long int`, `long unsigned`, `signed char`.
    pub fn from_words(words: &[&str]) -> Option<Self> {
        use self::Atom::*;

        let (mut signed, mut unsigned, mut short, mut long) = (false, false, false, 0);
        let mut base = None;
        for &word in words {
            match word {
                "signed" => signed = true,
                "unsigned" => unsigned = true,
                "short" => short = true,
                "long" => long += 1,
                "void" | "bool" | "_Bool" | "char" | "wchar_t" | "char8_t" | "char16_t"
                | "char32_t" | "int" | "float" | "double" => {
                    if base.replace(word).is_some() {
                        return None;
                    }
                }
                _ => return None,
            }
        }
        if signed && unsigned || short && long > 0 || long > 2 {
            return None;
        }

        let atom = match base {
            None | Some("int") => match (unsigned, short, long) {
                (false, true, _) => Short,
                (true, true, _) => UShort,
                (false, false, 0) if base.is_some() || signed => Int,
                (true, false, 0) => UInt,
                (false, false, 1) => Long,
                (true, false, 1) => ULong,
                (false, false, 2) => LongLong,
                (true, false, 2) => ULongLong,
                _ => return None,
            },
            Some("char") => match (signed, unsigned) {
                (true, _) => SChar,
                (_, true) => UChar,
                _ => Char,
            },
            Some("double") if long == 1 => LongDouble,
            Some(_) if signed || unsigned || short || long > 0 => return None,
            Some("void") => Void,
            Some("bool" | "_Bool") => Bool,
            Some("wchar_t") => WChar,
            Some("char8_t") => Char8,
            Some("char16_t") => Char16,
            Some("char32_t") => Char32,
            Some("float") => Float,
            Some("double") => Double,
            Some(_) => return None,
        };
        Some(atom)
    }

    pub fn to_cxx(self) -> &'static str {
        use self::Atom::*;
        match self {
            Void => "void",
            Bool => "bool",
            Char => "char",
            SChar => "signed char",
            UChar => "unsigned char",
            WChar => "wchar_t",
            Char8 => "char8_t",
            Char16 => "char16_t",
            Char32 => "char32_t",
            Short => "short",
            UShort => "unsigned short",
            Int => "int",
            UInt => "unsigned int",
            Long => "long",
            ULong => "unsigned long",
            LongLong => "long long",
            ULongLong => "unsigned long long",
            Float => "float",
            Double => "double",
            LongDouble => "long double",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Atom;

    #[test]
    fn test_word_order() {
        assert_eq!(Atom::from_words(&["unsigned"]), Some(Atom::UInt));
        assert_eq!(
            Atom::from_words(&["long", "unsigned", "long"]),
            Some(Atom::ULongLong),
        );
        assert_eq!(Atom::from_words(&["signed", "char"]), Some(Atom::SChar));
        assert_eq!(Atom::from_words(&["long", "double"]), Some(Atom::LongDouble));
        assert_eq!(Atom::from_words(&["short", "int"]), Some(Atom::Short));
    }

    #[test]
    fn test_invalid_combinations() {
        assert_eq!(Atom::from_words(&["signed", "unsigned"]), None);
        assert_eq!(Atom::from_words(&["unsigned", "float"]), None);
        assert_eq!(Atom::from_words(&["int", "char"]), None);
        assert_eq!(Atom::from_words(&["long", "long", "long"]), None);
    }
}
