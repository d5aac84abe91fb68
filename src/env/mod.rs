mod interpolate;
mod value;

pub use interpolate::interpolate;
pub use value::{freeze, EnvValue};

use crate::delta::Delta;
use crate::error::CoreError;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// An immutable key-value mapping with a content digest; the unit of
/// configuration context threaded through the evaluator.
///
/// Once constructed, an Env's observable state never changes — `derive` and
/// `subset` always return a *new* Env. The digest is a deterministic,
/// order-independent function of the content (invariant 2 of the core
/// spec): two Envs built from equal `(key, value)` sets always hash equal,
/// regardless of construction history.
#[derive(Clone)]
pub struct Env {
    dict: BTreeMap<String, EnvValue>,
    digest: OnceLock<String>,
}

impl Env {
    /// Builds an Env from an iterable of key/value pairs, freezing each
    /// value on the way in.
    pub fn new(
        contents: impl IntoIterator<Item = (String, EnvValue)>,
    ) -> Result<Env, CoreError> {
        let mut dict = BTreeMap::new();
        for (k, v) in contents {
            let frozen = freeze(&k, v)?;
            dict.insert(k, frozen);
        }
        Ok(Env { dict, digest: OnceLock::new() })
    }

    pub fn empty() -> Env {
        Env { dict: BTreeMap::new(), digest: OnceLock::new() }
    }

    /// A deterministic hex digest over the sorted (key, value) pairs. Used
    /// both as the memoization cache key and as the output-path-embedded
    /// hermeticity boundary (`outpath`). SHA-1 is fine here — the digest
    /// addresses content, it does not protect against adversaries.
    pub fn digest(&self) -> &str {
        self.digest.get_or_init(|| {
            let mut hasher = Sha1::new();
            for (k, v) in &self.dict {
                hasher.update(k.as_bytes());
                hasher.update([0u8]);
                hasher.update(canonical_bytes(v));
                hasher.update([0u8]);
            }
            let digest = hasher.finalize();
            digest.iter().map(|b| format!("{b:02x}")).collect()
        })
    }

    /// Applies a delta sequence left to right to a shallow copy of the
    /// underlying dict, returning a new Env.
    pub fn derive(&self, delta: &[Delta]) -> Result<Env, CoreError> {
        let mut dict = self.dict.clone();
        for change in delta {
            change.apply(&mut dict)?;
        }
        Ok(Env { dict, digest: OnceLock::new() })
    }

    /// Returns a new Env containing only the intersection of this Env's
    /// keys and `keys`.
    pub fn subset<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Env {
        let wanted: std::collections::HashSet<&str> = keys.into_iter().collect();
        let dict = self.dict.iter().filter(|(k, _)| wanted.contains(k.as_str())).map(|(k, v)| (k.clone(), v.clone())).collect();
        Env { dict, digest: OnceLock::new() }
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.dict.get(key)
    }

    pub fn get_list(&self, key: &str) -> Vec<EnvValue> {
        match self.dict.get(key) {
            Some(EnvValue::Tuple(items)) => items.clone(),
            Some(other) => vec![other.clone()],
            None => Vec::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.dict.keys().map(String::as_str)
    }

    pub fn dict_copy(&self) -> BTreeMap<String, EnvValue> {
        self.dict.clone()
    }
}

impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        self.digest() == other.digest() && self.dict == other.dict
    }
}
impl Eq for Env {}

impl std::hash::Hash for Env {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.digest().hash(state);
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env").field("digest", &self.digest()).field("dict", &self.dict).finish()
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Env({})", self.digest())
    }
}

fn canonical_bytes(value: &EnvValue) -> Vec<u8> {
    match value {
        EnvValue::String(s) => {
            let mut out = vec![b's'];
            out.extend_from_slice(s.as_bytes());
            out
        }
        EnvValue::Number(n) => format!("n{n}").into_bytes(),
        EnvValue::Ident(i) => format!("i{i}").into_bytes(),
        EnvValue::Tuple(items) => {
            let mut out = vec![b't'];
            for item in items {
                out.extend(canonical_bytes(item));
                out.push(0);
            }
            out
        }
    }
}
