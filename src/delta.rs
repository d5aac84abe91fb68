//! Environment deltas: first-class values representing a single mutation to
//! an environment dict. A `Vec<Delta>` is applied left to right by
//! `Env::derive`. This is also the channel that carries a target's
//! dependency list — `deps` is just a conventional key that local deltas
//! populate with `append`.

use crate::env::{freeze, interpolate, EnvValue};
use crate::error::CoreError;
use std::collections::BTreeMap;
use std::rc::Rc;

type Mutator = Rc<dyn Fn(&mut BTreeMap<String, EnvValue>) -> Result<(), CoreError>>;

#[derive(Clone)]
pub struct Delta(Mutator);

impl Delta {
    pub fn apply(&self, dict: &mut BTreeMap<String, EnvValue>) -> Result<(), CoreError> {
        (self.0)(dict)
    }

    fn from_fn(
        f: impl Fn(&mut BTreeMap<String, EnvValue>) -> Result<(), CoreError> + 'static,
    ) -> Delta {
        Delta(Rc::new(f))
    }
}

/// Sets `key` to `value` if absent, otherwise concatenates the existing
/// value with `value` (string + string, or tuple + tuple).
pub fn append(key: impl Into<String>, value: impl Into<EnvValue>) -> Delta {
    let key = key.into();
    let value = value.into();
    Delta::from_fn(move |dict| {
        let frozen = freeze(&key, interpolate(dict, value.clone())?)?;
        match dict.remove(&key) {
            Some(current) => {
                dict.insert(key.clone(), current.concat(frozen));
            }
            None => {
                dict.insert(key.clone(), frozen);
            }
        }
        Ok(())
    })
}

/// Like `append`, but the new value goes before the existing one.
pub fn prepend(key: impl Into<String>, value: impl Into<EnvValue>) -> Delta {
    let key = key.into();
    let value = value.into();
    Delta::from_fn(move |dict| {
        let frozen = freeze(&key, interpolate(dict, value.clone())?)?;
        match dict.remove(&key) {
            Some(current) => {
                dict.insert(key.clone(), frozen.concat(current));
            }
            None => {
                dict.insert(key.clone(), frozen);
            }
        }
        Ok(())
    })
}

/// Unconditionally replaces `key`'s value, creating it if absent.
pub fn override_(key: impl Into<String>, value: impl Into<EnvValue>) -> Delta {
    let key = key.into();
    let value = value.into();
    Delta::from_fn(move |dict| {
        let frozen = freeze(&key, interpolate(dict, value.clone())?)?;
        dict.insert(key.clone(), frozen);
        Ok(())
    })
}

/// Deletes `key` if present; a no-op otherwise.
pub fn remove(key: impl Into<String>) -> Delta {
    let key = key.into();
    Delta::from_fn(move |dict| {
        dict.remove(&key);
        Ok(())
    })
}

/// Deletes every key not present in `keys`.
pub fn subset(keys: impl IntoIterator<Item = impl Into<String>>) -> Delta {
    let keys: std::collections::HashSet<String> = keys.into_iter().map(Into::into).collect();
    Delta::from_fn(move |dict| {
        dict.retain(|k, _| keys.contains(k));
        Ok(())
    })
}

/// Wraps `delta` so that each inner delta only applies when `predicate`
/// holds on the dict *at the point that inner delta would run* — later
/// deltas in the sequence see the effect of earlier ones that did apply.
pub fn conditional(
    delta: Vec<Delta>,
    predicate: impl Fn(&BTreeMap<String, EnvValue>) -> bool + 'static,
) -> Vec<Delta> {
    let predicate = Rc::new(predicate);
    delta
        .into_iter()
        .map(|inner| {
            let predicate = predicate.clone();
            Delta::from_fn(move |dict| if predicate(dict) { inner.apply(dict) } else { Ok(()) })
        })
        .collect()
}

/// Builds one `append` delta per (key, value) pair. Safe to apply in any
/// order because each targets a distinct key.
pub fn make_appending_delta(
    pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<EnvValue>)>,
) -> Vec<Delta> {
    pairs.into_iter().map(|(k, v)| append(k, v)).collect()
}

/// Builds one `prepend` delta per (key, value) pair.
pub fn make_prepending_delta(
    pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<EnvValue>)>,
) -> Vec<Delta> {
    pairs.into_iter().map(|(k, v)| prepend(k, v)).collect()
}
