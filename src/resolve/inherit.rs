//! Cascades inheritable node fields through the priority chain
//! direct -> parent -> track default -> system default, and computes cue
//! lifetimes. Builds new resolved structures; the input scenario is never
//! mutated.

use crate::foundation::core::TimeRange;
use crate::resolve::ResolveOptions;
use crate::scenario::model::{Cue, Node, NodeKind, Scenario, StyleMap, Track};
use crate::scenario::resolved::{ResolvedCue, ResolvedNode, ResolvedNodeKind, ResolvedScenario};
use std::collections::HashMap;

/// Inherited context carried down the node tree. For the root node this is
/// seeded from the cue's track; below that it is the parent's resolved state.
struct Inherited<'a> {
    display_time: TimeRange,
    style: &'a StyleMap,
    layout: &'a StyleMap,
    effect_scope: Option<&'a str>,
}

pub(crate) fn resolve_inheritance(
    scenario: &Scenario,
    opts: &ResolveOptions,
) -> ResolvedScenario {
    let tracks_by_id: HashMap<&str, &Track> =
        scenario.tracks.iter().map(|t| (t.id.as_str(), t)).collect();
    let empty = StyleMap::new();

    let cues = scenario
        .cues
        .iter()
        .map(|cue| {
            // A dangling track reference still resolves (with empty
            // defaults); the validator rejects it afterwards with a path.
            let track = tracks_by_id.get(cue.track.as_str()).copied();
            let seed = Inherited {
                display_time: TimeRange::unbounded(),
                style: track.map_or(&empty, |t| &t.default_style),
                layout: track.map_or(&empty, |t| &t.default_layout),
                effect_scope: None,
            };
            ResolvedCue {
                id: cue.id.clone(),
                track: cue.track.clone(),
                dom_lifetime: cue_lifetime(cue, opts),
                root: resolve_node(&cue.root, &seed),
            }
        })
        .collect();

    ResolvedScenario {
        version: scenario.version.clone(),
        tracks: scenario.tracks.clone(),
        cues,
        warnings: Vec::new(),
    }
}

fn resolve_node(node: &Node, inherited: &Inherited<'_>) -> ResolvedNode {
    let display_time = node.display_time.unwrap_or(inherited.display_time);

    // Merge policy: per-key shallow union, direct keys winning over
    // inherited ones. Inherited maps already contain the track defaults.
    let mut style = inherited.style.clone();
    if let Some(direct) = &node.style {
        style.extend(direct.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    let mut layout = inherited.layout.clone();
    if let Some(direct) = &node.layout {
        layout.extend(direct.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    let effect_scope = node
        .effect_scope
        .as_deref()
        .or(inherited.effect_scope)
        .map(str::to_owned);

    let kind = match &node.kind {
        NodeKind::Group { children } => {
            let child_ctx = Inherited {
                display_time,
                style: &style,
                layout: &layout,
                effect_scope: effect_scope.as_deref(),
            };
            ResolvedNodeKind::Group {
                children: children
                    .iter()
                    .map(|child| resolve_node(child, &child_ctx))
                    .collect(),
            }
        }
        NodeKind::Text { text } => ResolvedNodeKind::Text { text: text.clone() },
        NodeKind::Image { source } => ResolvedNodeKind::Image {
            source: source.clone(),
        },
        NodeKind::Video { source } => ResolvedNodeKind::Video {
            source: source.clone(),
        },
    };

    ResolvedNode {
        id: node.id.clone(),
        kind,
        display_time,
        style,
        layout,
        plugin_chain: node.plugin_chain.clone(),
        effect_scope,
    }
}

/// Declared lifetime, or the union of every declared display time in the
/// subtree widened by the preload/cleanup margin. Unbounded when nothing
/// in the subtree declares one.
fn cue_lifetime(cue: &Cue, opts: &ResolveOptions) -> TimeRange {
    if let Some(declared) = cue.dom_lifetime {
        return declared;
    }

    let mut union: Option<TimeRange> = None;
    collect_display_times(&cue.root, &mut union);
    match union {
        Some(r) => r.widened(opts.lifetime_margin),
        None => TimeRange::unbounded(),
    }
}

fn collect_display_times(node: &Node, union: &mut Option<TimeRange>) {
    if let Some(dt) = node.display_time {
        *union = Some(match *union {
            Some(acc) => acc.union(dt),
            None => dt,
        });
    }
    for child in node.kind.children() {
        collect_display_times(child, union);
    }
}
