//! Final pass between evaluation and emission: collapses products that were
//! discovered more than once (the same library pulled in through two
//! dependency paths under the same environment) and fixes a stable,
//! deterministic emission order.

use crate::error::CoreError;
use crate::product::ProductRecord;
use std::collections::HashMap;
use std::path::Path;

/// Deduplicates by `ProductRecord::dedup_key`. Two records sharing a key
/// must be field-for-field equal — they're the same edge discovered twice —
/// or this raises `IncompatibleDuplicateProducts` naming the clashing
/// outputs, since the graph cannot express two different edges producing
/// the same file.
pub fn dedup(records: Vec<ProductRecord>) -> Result<Vec<ProductRecord>, CoreError> {
    let mut by_key: HashMap<String, ProductRecord> = HashMap::new();
    for record in records {
        let key = record.dedup_key();
        match by_key.get(&key) {
            None => {
                by_key.insert(key, record);
            }
            Some(existing) if *existing == record => {}
            Some(_) => return Err(CoreError::IncompatibleDuplicateProducts { outputs: key }),
        }
    }
    let mut out: Vec<ProductRecord> = by_key.into_values().collect();
    out.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    Ok(out)
}

/// Orders by a path representation that treats the env-digest path segment
/// as a wildcard, so the same logical output under two environments sorts
/// next to itself instead of being scattered by hash order; the real path
/// (digest included) breaks ties so the order is still a strict total one.
fn sort_key(record: &ProductRecord) -> (String, String) {
    let primary = record.outputs.first();
    let desensitized = primary.map(desensitize).unwrap_or_default();
    let exact = primary.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
    (desensitized, exact)
}

fn desensitize(path: &Path) -> String {
    let mut comps: Vec<String> =
        path.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if let Some(pos) = comps.iter().position(|c| c == "env") {
        if let Some(digest_slot) = comps.get_mut(pos + 1) {
            *digest_slot = "*".to_owned();
        }
    }
    comps.join("/")
}
