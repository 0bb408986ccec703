//! Substitution of `"define.<path>"` reference strings over a raw JSON
//! document. Runs before typed deserialization so references may appear
//! anywhere a literal value could.

use crate::foundation::error::{CuelineError, CuelineResult};
use crate::scenario::model::DefineSection;
use serde_json::Value;

const REF_PREFIX: &str = "define.";

/// Deep-copy `value`, replacing every reference string with the literal it
/// points at. Non-reference leaves pass through unchanged. Idempotent on
/// reference-free input.
pub fn resolve_references(define: &DefineSection, value: &Value) -> CuelineResult<Value> {
    let mut in_progress = Vec::new();
    resolve_value(define, value, &mut in_progress)
}

fn resolve_value(
    define: &DefineSection,
    value: &Value,
    in_progress: &mut Vec<String>,
) -> CuelineResult<Value> {
    match value {
        Value::String(s) if s.starts_with(REF_PREFIX) => {
            resolve_reference(define, s, in_progress)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(define, item, in_progress))
            .collect::<CuelineResult<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), resolve_value(define, v, in_progress)?)))
            .collect::<CuelineResult<serde_json::Map<_, _>>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn resolve_reference(
    define: &DefineSection,
    reference: &str,
    in_progress: &mut Vec<String>,
) -> CuelineResult<Value> {
    let path = &reference[REF_PREFIX.len()..];
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CuelineError::reference(format!(
            "malformed reference \"{reference}\": empty path segment"
        )));
    }

    if in_progress.iter().any(|r| r == reference) {
        let mut chain = in_progress.join(" -> ");
        chain.push_str(" -> ");
        chain.push_str(reference);
        return Err(CuelineError::reference(format!(
            "circular reference: {chain}"
        )));
    }

    in_progress.push(reference.to_owned());
    let result = lookup(define, reference, &segments, in_progress);
    in_progress.pop();
    result
}

fn lookup(
    define: &DefineSection,
    reference: &str,
    segments: &[&str],
    in_progress: &mut Vec<String>,
) -> CuelineResult<Value> {
    let root_key = segments[0];
    let root_value = define.get(root_key).ok_or_else(|| {
        CuelineError::reference(format!("undefined define key \"{root_key}\""))
    })?;

    // Define entries may themselves hold references.
    let resolved_root = resolve_value(define, root_value, in_progress)?;

    let mut current = &resolved_root;
    for (i, segment) in segments.iter().enumerate().skip(1) {
        let obj = current.as_object().ok_or_else(|| {
            CuelineError::reference(format!(
                "cannot descend into \"{}\" in \"{reference}\": value at \"{}\" is not an object",
                segment,
                segments[..i].join(".")
            ))
        })?;
        current = obj.get(*segment).ok_or_else(|| {
            CuelineError::reference(format!(
                "missing path segment \"{segment}\" in \"{reference}\""
            ))
        })?;
    }

    Ok(current.clone())
}
