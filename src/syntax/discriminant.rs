use crate::syntax::error::DISCRIMINANT_OVERFLOW;
use std::cmp::Ordering;
use std::fmt::{self, Display};

/// A constant's value, as far as the headers alone determine it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(Discriminant),
    /// Depends on something outside the parsed input; kept as source text so
    /// it can be resolved once every header of the run is known.
    Symbolic(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(discriminant) => Some(discriminant.to_i128()),
            Value::Symbolic(_) => None,
        }
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        match Discriminant::from_i128(value) {
            Some(discriminant) => Value::Int(discriminant),
            None => Value::Symbolic(value.to_string()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(discriminant) => Display::fmt(discriminant, f),
            Value::Symbolic(text) => f.write_str(text),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Discriminant {
    negative: bool,
    magnitude: u64,
}

impl Discriminant {
    pub const fn zero() -> Self {
        Discriminant {
            negative: false,
            magnitude: 0,
        }
    }

    pub fn from_i128(value: i128) -> Option<Self> {
        let magnitude = u64::try_from(value.unsigned_abs()).ok()?;
        Some(Discriminant {
            negative: value < 0,
            magnitude,
        })
    }

    pub fn to_i128(self) -> i128 {
        let magnitude = i128::from(self.magnitude);
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        Display::fmt(&self.magnitude, f)
    }
}

impl Ord for Discriminant {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (true, true) => self.magnitude.cmp(&other.magnitude).reverse(),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.magnitude.cmp(&other.magnitude),
        }
    }
}

impl PartialOrd for Discriminant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Assigns enumerator values in declaration order. Duplicates are legal in
/// C, so unlike a Rust enum nothing here rejects a repeated value.
pub struct DiscriminantSet {
    previous: Option<(String, Value)>,
}

impl DiscriminantSet {
    pub fn new() -> Self {
        DiscriminantSet { previous: None }
    }

    pub fn insert(&mut self, name: &str, value: Value) -> Value {
        self.previous = Some((name.to_owned(), value.clone()));
        value
    }

    pub fn insert_next(&mut self, name: &str) -> Result<Value, String> {
        let value = match &self.previous {
            None => Value::Int(Discriminant::zero()),
            Some((_, Value::Int(prev))) => {
                let next = prev.to_i128() + 1;
                match Discriminant::from_i128(next) {
                    Some(discriminant) => Value::Int(discriminant),
                    None => return Err(format!("{}{}", DISCRIMINANT_OVERFLOW.msg, prev)),
                }
            }
            Some((prev_name, Value::Symbolic(_))) => Value::Symbolic(format!("{} + 1", prev_name)),
        };
        Ok(self.insert(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::{Discriminant, DiscriminantSet, Value};

    #[test]
    fn test_implicit_values_follow_previous() {
        let mut set = DiscriminantSet::new();
        assert_eq!(set.insert_next("A").unwrap().as_int(), Some(0));
        set.insert("B", Value::from(123));
        assert_eq!(set.insert_next("C").unwrap().as_int(), Some(124));
        set.insert("D", Value::from(-2));
        assert_eq!(set.insert_next("E").unwrap().as_int(), Some(-1));
        assert_eq!(set.insert_next("F").unwrap().as_int(), Some(0));
    }

    #[test]
    fn test_implicit_after_symbolic() {
        let mut set = DiscriminantSet::new();
        set.insert("A", Value::Symbolic("OTHER".to_owned()));
        assert_eq!(
            set.insert_next("B").unwrap(),
            Value::Symbolic("A + 1".to_owned()),
        );
    }

    #[test]
    fn test_overflow() {
        let mut set = DiscriminantSet::new();
        set.insert("MAX", Value::from(i128::from(u64::MAX)));
        let err = set.insert_next("NEXT").unwrap_err();
        assert!(err.starts_with("discriminant overflow"));
    }

    #[test]
    fn test_ordering() {
        let neg = Discriminant::from_i128(-5).unwrap();
        let pos = Discriminant::from_i128(3).unwrap();
        assert!(neg < pos);
        assert!(Discriminant::from_i128(-1).unwrap() > neg);
        assert_eq!(neg.to_string(), "-5");
    }
}
