//! Build products: the ninja-edge-shaped records a target's evaluation
//! contributes to the final graph.

use crate::env::EnvValue;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Reserved env keys that never reach the emitted ninja `variables` block —
/// they carry edge-scoped implicit/order-only dependencies instead, and are
/// stripped out by `product()` before the remaining keys become variables.
pub const IMPLICIT_KEY: &str = "__implicit__";
pub const ORDER_ONLY_KEY: &str = "__order_only__";

/// One ninja build edge: a rule invocation with its inputs, outputs, and the
/// variables that parameterize the rule's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub rule: String,
    pub outputs: Vec<PathBuf>,
    pub inputs: Vec<PathBuf>,
    pub implicit: Vec<PathBuf>,
    pub order_only: Vec<PathBuf>,
    pub variables: BTreeMap<String, String>,
}

impl ProductRecord {
    /// The canonical dedup key: outputs, sorted and space-joined. Two
    /// products sharing this key must be field-equal or the dedup pass
    /// raises `IncompatibleDuplicateProducts`.
    pub fn dedup_key(&self) -> String {
        let mut paths: Vec<String> = self.outputs.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        paths.sort();
        paths.join(" ")
    }
}

/// Builds a `ProductRecord`, pulling `__implicit__`/`__order_only__` out of
/// `variables` into their dedicated fields and stringifying everything else
/// for the emitter.
pub fn product(
    rule: impl Into<String>,
    outputs: Vec<PathBuf>,
    inputs: Vec<PathBuf>,
    mut variables: BTreeMap<String, EnvValue>,
) -> ProductRecord {
    let implicit = take_paths(&mut variables, IMPLICIT_KEY);
    let order_only = take_paths(&mut variables, ORDER_ONLY_KEY);
    let variables = variables.into_iter().map(|(k, v)| (k, v.to_string())).collect();
    ProductRecord { rule: rule.into(), outputs, inputs, implicit, order_only, variables }
}

fn take_paths(variables: &mut BTreeMap<String, EnvValue>, key: &str) -> Vec<PathBuf> {
    match variables.remove(key) {
        Some(EnvValue::Tuple(items)) => {
            items.iter().filter_map(|v| v.as_str()).map(PathBuf::from).collect()
        }
        Some(single) => single.as_str().map(|s| vec![PathBuf::from(s)]).unwrap_or_default(),
        None => Vec::new(),
    }
}
