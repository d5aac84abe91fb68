use super::value::EnvValue;
use crate::error::CoreError;
use std::collections::BTreeMap;

/// Expands `%(name)s`-style references in `value` against the dict as it
/// stands *right now* — i.e. mid-derivation, not the fully-derived Env. This
/// is what lets a later append in the same delta sequence see an earlier
/// one's result, and what makes `%%` -> `%` and missing-key errors behave
/// exactly like the classic `%`-operator this mimics.
pub fn interpolate(
    dict: &BTreeMap<String, EnvValue>,
    value: EnvValue,
) -> Result<EnvValue, CoreError> {
    match value {
        EnvValue::String(s) => Ok(EnvValue::String(interpolate_str(dict, &s)?)),
        EnvValue::Tuple(items) => {
            let expanded =
                items.into_iter().map(|v| interpolate(dict, v)).collect::<Result<Vec<_>, _>>()?;
            Ok(EnvValue::Tuple(expanded))
        }
        other => Ok(other),
    }
}

fn interpolate_str(dict: &BTreeMap<String, EnvValue>, input: &str) -> Result<String, CoreError> {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i] as char);
            i += 1;
            continue;
        }

        match bytes.get(i + 1) {
            Some(b'%') => {
                out.push('%');
                i += 2;
            }
            Some(b'(') => {
                let close = input[i + 2..].find(")s").map(|p| i + 2 + p).ok_or_else(|| {
                    CoreError::InterpolationMissingKey {
                        key: input[i..].to_owned(),
                        available: available_keys(dict),
                    }
                })?;
                let key = &input[i + 2..close];
                let value =
                    dict.get(key).ok_or_else(|| CoreError::InterpolationMissingKey {
                        key: key.to_owned(),
                        available: available_keys(dict),
                    })?;
                out.push_str(&value.to_string());
                i = close + 2;
            }
            _ => {
                out.push('%');
                i += 1;
            }
        }
    }
    Ok(out)
}

fn available_keys(dict: &BTreeMap<String, EnvValue>) -> String {
    dict.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}
