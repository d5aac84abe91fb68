use crate::error::CoreError;
use crate::ident::Ident;
use std::fmt;

/// The typed union of what can live in an `Env`. Replaces the dynamic
/// any-typed values of the original implementation with an explicit sum so
/// that rejecting unsupported types is a construction-time check rather than
/// a runtime surprise deep in a delta application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnvValue {
    String(String),
    Number(i64),
    Ident(Ident),
    Tuple(Vec<EnvValue>),
}

impl EnvValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnvValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[EnvValue]> {
        match self {
            EnvValue::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// Concatenates two values the way `append`/`prepend` do: string + string
    /// and tuple + tuple, in the given order. Mismatched variants are a
    /// programming error in the caller (deltas only ever concatenate values
    /// that already share a key), so this panics rather than propagating a
    /// `CoreError` — the same way `cobble.env`'s `+` on dict values would
    /// raise a Python `TypeError` for a mismatched pair.
    pub fn concat(self, other: EnvValue) -> EnvValue {
        match (self, other) {
            (EnvValue::String(mut a), EnvValue::String(b)) => {
                a.push_str(&b);
                EnvValue::String(a)
            }
            (EnvValue::Tuple(mut a), EnvValue::Tuple(b)) => {
                a.extend(b);
                EnvValue::Tuple(a)
            }
            (a, b) => panic!("cannot concatenate mismatched env values {:?} and {:?}", a, b),
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::String(s) => write!(f, "{s}"),
            EnvValue::Number(n) => write!(f, "{n}"),
            EnvValue::Ident(i) => write!(f, "{i}"),
            EnvValue::Tuple(items) => {
                write!(f, "(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for EnvValue {
    fn from(s: &str) -> Self {
        EnvValue::String(s.to_owned())
    }
}

impl From<String> for EnvValue {
    fn from(s: String) -> Self {
        EnvValue::String(s)
    }
}

impl From<i64> for EnvValue {
    fn from(n: i64) -> Self {
        EnvValue::Number(n)
    }
}

impl From<Ident> for EnvValue {
    fn from(i: Ident) -> Self {
        EnvValue::Ident(i)
    }
}

impl<T: Into<EnvValue>> From<Vec<T>> for EnvValue {
    fn from(items: Vec<T>) -> Self {
        EnvValue::Tuple(items.into_iter().map(Into::into).collect())
    }
}

/// Source-level representation accepted when constructing or deriving an
/// Env. Anything that isn't a string, number, ident, or (recursively) an
/// iterable of those is rejected with `InvalidEnvValue`.
pub trait IntoFrozen {
    fn into_frozen(self, key: &str) -> Result<EnvValue, CoreError>;
}

impl IntoFrozen for EnvValue {
    fn into_frozen(self, _key: &str) -> Result<EnvValue, CoreError> {
        Ok(self)
    }
}

/// Freezes a value already expressed as `EnvValue` — a no-op today since the
/// typed union can't represent an invalid shape, but kept as a distinct step
/// (matching `cobble.env.freeze`) so a future looser input representation has
/// a single place to enforce the invariant.
pub fn freeze(key: &str, value: EnvValue) -> Result<EnvValue, CoreError> {
    match &value {
        EnvValue::Tuple(items) => {
            for item in items {
                freeze(key, item.clone())?;
            }
            Ok(value)
        }
        _ => Ok(value),
    }
}
