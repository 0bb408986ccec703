//! Load-time pipeline: reference substitution, typed parse, inheritance,
//! validation. Each stage builds a new structure, so a failure never
//! leaves a partially-resolved document visible to the caller.

pub mod define;
mod inherit;
mod validate;

use crate::foundation::error::{CuelineError, CuelineResult};
use crate::scenario::model::{DefineSection, Scenario};
use crate::scenario::resolved::ResolvedScenario;

pub use define::resolve_references;

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Seconds added on both sides of an auto-computed cue lifetime so the
    /// subtree is mounted slightly before and after its visible window.
    pub lifetime_margin: f64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            lifetime_margin: 0.3,
        }
    }
}

/// Resolve a raw scenario document into a validated [`ResolvedScenario`].
///
/// Fail-fast: any load-time violation (reference cycle, undefined define
/// key, malformed range, duplicate identity, dangling track reference)
/// rejects the whole document.
#[tracing::instrument(skip(raw))]
pub fn resolve(raw: &serde_json::Value) -> CuelineResult<ResolvedScenario> {
    resolve_with_options(raw, &ResolveOptions::default())
}

pub fn resolve_with_options(
    raw: &serde_json::Value,
    opts: &ResolveOptions,
) -> CuelineResult<ResolvedScenario> {
    let define: DefineSection = match raw.get("define") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| CuelineError::serde(format!("parse define section: {e}")))?,
        None => DefineSection::new(),
    };

    let substituted = define::resolve_references(&define, raw)?;
    let scenario: Scenario = serde_json::from_value(substituted)
        .map_err(|e| CuelineError::serde(format!("parse scenario: {e}")))?;

    let mut resolved = inherit::resolve_inheritance(&scenario, opts);
    resolved.warnings = validate::validate(&resolved)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pipeline_substitutes_references_before_parsing() {
        let doc = json!({
            "version": "1",
            "define": {
                "accent": {"color": "#0af"},
                "intro_window": [0.5, 2.5]
            },
            "tracks": [{"id": "t", "kind": "free"}],
            "cues": [{
                "id": "c0",
                "track": "t",
                "root": {
                    "id": "n0",
                    "kind": {"text": {"text": "hello"}},
                    "display_time": "define.intro_window",
                    "style": "define.accent"
                }
            }]
        });
        let resolved = resolve(&doc).unwrap();
        let node = &resolved.cues[0].root;
        assert_eq!(node.display_time.start, 0.5);
        assert_eq!(node.style["color"], json!("#0af"));
    }

    #[test]
    fn reference_cycle_fails_the_whole_load() {
        let doc = json!({
            "version": "1",
            "define": {"a": "define.b", "b": "define.a"},
            "tracks": [],
            "cues": []
        });
        let err = resolve(&doc).unwrap_err();
        assert!(err.to_string().contains("circular reference"));
    }

    #[test]
    fn missing_required_fields_is_a_serde_error() {
        let err = resolve(&json!({"tracks": []})).unwrap_err();
        assert!(err.to_string().contains("serialization error"));
    }
}
