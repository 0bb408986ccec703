//! Structural validation of a resolved scenario. Hard checks fail fast
//! with the first violated invariant and its document path; soft checks
//! become warnings on the resolved scenario.

use crate::foundation::error::{CuelineError, CuelineResult};
use crate::scenario::resolved::{ResolvedCue, ResolvedNode, ResolvedScenario, ValidationWarning};
use std::collections::HashMap;

const SUPPORTED_VERSION: &str = "1";

/// Check hard invariants in order (version, time ranges, node identity,
/// track integrity, cue identity) and collect soft findings.
pub(crate) fn validate(scenario: &ResolvedScenario) -> CuelineResult<Vec<ValidationWarning>> {
    check_version(scenario)?;
    check_time_ranges(scenario)?;
    check_node_ids(scenario)?;
    check_tracks(scenario)?;
    check_cue_ids(scenario)?;
    Ok(soft_findings(scenario))
}

fn check_version(scenario: &ResolvedScenario) -> CuelineResult<()> {
    if scenario.version != SUPPORTED_VERSION {
        return Err(CuelineError::validation(format!(
            "$.version: unsupported version \"{}\", expected \"{SUPPORTED_VERSION}\"",
            scenario.version
        )));
    }
    Ok(())
}

fn check_time_ranges(scenario: &ResolvedScenario) -> CuelineResult<()> {
    for (i, cue) in scenario.cues.iter().enumerate() {
        if !cue.dom_lifetime.is_well_formed() {
            return Err(CuelineError::validation(format!(
                "$.cues[{i}].dom_lifetime: start must be <= end and free of NaN"
            )));
        }
        check_node_ranges(&cue.root, &format!("$.cues[{i}].root"))?;
    }
    Ok(())
}

fn check_node_ranges(node: &ResolvedNode, path: &str) -> CuelineResult<()> {
    if !node.display_time.is_well_formed() {
        return Err(CuelineError::validation(format!(
            "{path}.display_time: start must be <= end and free of NaN"
        )));
    }
    for (i, child) in node.kind.children().iter().enumerate() {
        check_node_ranges(child, &format!("{path}.children[{i}]"))?;
    }
    Ok(())
}

fn check_node_ids(scenario: &ResolvedScenario) -> CuelineResult<()> {
    // Single pass over the whole document; first duplicate reports both
    // the original and the offending path.
    let mut seen: HashMap<String, String> = HashMap::new();
    for (i, cue) in scenario.cues.iter().enumerate() {
        collect_node_ids(&cue.root, &format!("$.cues[{i}].root"), &mut seen)?;
    }
    Ok(())
}

fn collect_node_ids(
    node: &ResolvedNode,
    path: &str,
    seen: &mut HashMap<String, String>,
) -> CuelineResult<()> {
    if node.id.trim().is_empty() {
        return Err(CuelineError::validation(format!(
            "{path}.id: node id must be non-empty"
        )));
    }
    if let Some(first) = seen.get(&node.id) {
        return Err(CuelineError::validation(format!(
            "{path}.id: duplicate node id \"{}\" (first declared at {first}.id)",
            node.id
        )));
    }
    seen.insert(node.id.clone(), path.to_owned());

    for (i, child) in node.kind.children().iter().enumerate() {
        collect_node_ids(child, &format!("{path}.children[{i}]"), seen)?;
    }
    Ok(())
}

fn check_tracks(scenario: &ResolvedScenario) -> CuelineResult<()> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, track) in scenario.tracks.iter().enumerate() {
        if track.id.trim().is_empty() {
            return Err(CuelineError::validation(format!(
                "$.tracks[{i}].id: track id must be non-empty"
            )));
        }
        if let Some(first) = seen.get(track.id.as_str()) {
            return Err(CuelineError::validation(format!(
                "$.tracks[{i}].id: duplicate track id \"{}\" (first declared at $.tracks[{first}].id)",
                track.id
            )));
        }
        seen.insert(&track.id, i);
    }

    for (i, cue) in scenario.cues.iter().enumerate() {
        if !seen.contains_key(cue.track.as_str()) {
            return Err(CuelineError::validation(format!(
                "$.cues[{i}].track: unknown track \"{}\"",
                cue.track
            )));
        }
    }
    Ok(())
}

fn check_cue_ids(scenario: &ResolvedScenario) -> CuelineResult<()> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, cue) in scenario.cues.iter().enumerate() {
        if cue.id.trim().is_empty() {
            return Err(CuelineError::validation(format!(
                "$.cues[{i}].id: cue id must be non-empty"
            )));
        }
        if let Some(first) = seen.get(cue.id.as_str()) {
            return Err(CuelineError::validation(format!(
                "$.cues[{i}].id: duplicate cue id \"{}\" (first declared at $.cues[{first}].id)",
                cue.id
            )));
        }
        seen.insert(&cue.id, i);
    }
    Ok(())
}

/// Soft consistency checks. A display time escaping its cue's lifetime
/// risks a late mount or early unmount but does not block loading.
fn soft_findings(scenario: &ResolvedScenario) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    for (i, cue) in scenario.cues.iter().enumerate() {
        collect_lifetime_findings(cue, &cue.root, &format!("$.cues[{i}].root"), &mut warnings);
    }
    for w in &warnings {
        tracing::warn!(path = %w.path, "{}", w.message);
    }
    warnings
}

fn collect_lifetime_findings(
    cue: &ResolvedCue,
    node: &ResolvedNode,
    path: &str,
    warnings: &mut Vec<ValidationWarning>,
) {
    // Inherited unbounded display times are skipped: only a node that
    // declares (or inherits) a finite window can meaningfully escape the
    // cue lifetime.
    if node.display_time.is_finite()
        && !(cue.dom_lifetime.contains(node.display_time.start)
            && cue.dom_lifetime.contains(node.display_time.end))
    {
        warnings.push(ValidationWarning {
            path: format!("{path}.display_time"),
            message: format!(
                "display time [{}, {}] is not covered by the cue dom_lifetime [{}, {}]",
                node.display_time.start,
                node.display_time.end,
                cue.dom_lifetime.start,
                cue.dom_lifetime.end
            ),
        });
    }
    for (i, child) in node.kind.children().iter().enumerate() {
        collect_lifetime_findings(cue, child, &format!("{path}.children[{i}]"), warnings);
    }
}
