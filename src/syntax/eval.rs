//! Integer constant expressions of the kind found in enumerator initializers
//! and object-like macros.

use crate::syntax::lex::{Token, TokenKind};

/// Evaluates `tokens` as an integer constant expression. Identifiers go
/// through `lookup`. Returns None for anything that is not fully computable:
/// floats, strings, casts, macro invocations, unknown names.
pub fn eval(tokens: &[Token], lookup: &dyn Fn(&str) -> Option<i128>) -> Option<i128> {
    let mut eval = Eval {
        tokens,
        pos: 0,
        lookup,
    };
    let value = eval.binary(0)?;
    if eval.pos == tokens.len() {
        Some(value)
    } else {
        None
    }
}

struct Eval<'a> {
    tokens: &'a [Token],
    pos: usize,
    lookup: &'a dyn Fn(&str) -> Option<i128>,
}

fn precedence(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | ">" | "<=" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    })
}

impl<'a> Eval<'a> {
    fn next_punct(&self) -> Option<&'static str> {
        match self.tokens.get(self.pos)?.kind {
            TokenKind::Punct(p) => Some(p),
            _ => None,
        }
    }

    fn binary(&mut self, min: u8) -> Option<i128> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.next_punct() {
            let Some(prec) = precedence(op) else { break };
            if prec <= min {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(prec)?;
            lhs = apply(op, lhs, rhs)?;
        }
        if min == 0 && self.next_punct() == Some("?") {
            self.pos += 1;
            let then = self.binary(0)?;
            if self.next_punct() != Some(":") {
                return None;
            }
            self.pos += 1;
            let otherwise = self.binary(0)?;
            return Some(if lhs != 0 { then } else { otherwise });
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<i128> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        match &token.kind {
            TokenKind::Punct("-") => self.unary()?.checked_neg(),
            TokenKind::Punct("+") => self.unary(),
            TokenKind::Punct("~") => Some(!self.unary()?),
            TokenKind::Punct("!") => Some(i128::from(self.unary()? == 0)),
            TokenKind::Punct("(") => {
                let value = self.binary(0)?;
                if self.next_punct() != Some(")") {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            TokenKind::Number(text) => parse_int(text),
            TokenKind::Char(text) => parse_char(text),
            TokenKind::Ident(ident) => match ident.as_str() {
                "true" => Some(1),
                "false" => Some(0),
                _ => (self.lookup)(ident),
            },
            TokenKind::Punct("::") => match &self.tokens.get(self.pos)?.kind {
                TokenKind::Ident(ident) => {
                    self.pos += 1;
                    (self.lookup)(ident)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

fn apply(op: &str, lhs: i128, rhs: i128) -> Option<i128> {
    Some(match op {
        "||" => i128::from(lhs != 0 || rhs != 0),
        "&&" => i128::from(lhs != 0 && rhs != 0),
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => i128::from(lhs == rhs),
        "!=" => i128::from(lhs != rhs),
        "<" => i128::from(lhs < rhs),
        ">" => i128::from(lhs > rhs),
        "<=" => i128::from(lhs <= rhs),
        ">=" => i128::from(lhs >= rhs),
        "<<" => lhs.checked_shl(u32::try_from(rhs).ok()?)?,
        ">>" => lhs.checked_shr(u32::try_from(rhs).ok()?)?,
        "+" => lhs.checked_add(rhs)?,
        "-" => lhs.checked_sub(rhs)?,
        "*" => lhs.checked_mul(rhs)?,
        "/" => lhs.checked_div(rhs)?,
        "%" => lhs.checked_rem(rhs)?,
        _ => return None,
    })
}

/// Decimal, hex, octal and binary literals with optional `u`/`l` suffixes
/// and `'` digit separators.
pub fn parse_int(text: &str) -> Option<i128> {
    let digits: String = text.chars().filter(|&ch| ch != '\'').collect();
    let trimmed = digits.trim_end_matches(['u', 'U', 'l', 'L', 'z', 'Z']);
    let (radix, body) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        (2, bin)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (8, &trimmed[1..])
    } else {
        (10, trimmed)
    };
    if body.is_empty() {
        return None;
    }
    i128::from_str_radix(body, radix).ok()
}

fn parse_char(text: &str) -> Option<i128> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let value = match chars.next()? {
        '\\' => match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        },
        ch => ch,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(i128::from(u32::from(value)))
}

#[cfg(test)]
mod tests {
    use super::{eval, parse_int};
    use crate::syntax::lex::tokenize;
    use crate::syntax::report::Errors;

    fn eval_str(source: &str) -> Option<i128> {
        let tokens = tokenize(source, &mut Errors::new());
        eval(&tokens, &|name| match name {
            "A" => Some(4),
            _ => None,
        })
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_int("9999"), Some(9999));
        assert_eq!(parse_int("0x10u"), Some(16));
        assert_eq!(parse_int("010"), Some(8));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("1'000ULL"), Some(1000));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("1.5"), None);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval_str("1 + 2 * 3"), Some(7));
        assert_eq!(eval_str("(1 + 2) * 3"), Some(9));
        assert_eq!(eval_str("1 << 4 | 1"), Some(17));
        assert_eq!(eval_str("10 - 4 - 3"), Some(3));
        assert_eq!(eval_str("-A"), Some(-4));
        assert_eq!(eval_str("~0 & 0xff"), Some(255));
        assert_eq!(eval_str("A > 2 ? 1 : 2"), Some(1));
        assert_eq!(eval_str("'a'"), Some(97));
    }

    #[test]
    fn test_not_computable() {
        assert_eq!(eval_str("B + 1"), None);
        assert_eq!(eval_str("SDL_UINT64_C(1)"), None);
        assert_eq!(eval_str("\"text\""), None);
        assert_eq!(eval_str("1 / 0"), None);
    }
}
