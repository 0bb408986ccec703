use crate::foundation::core::TimeRange;
use crate::scenario::model::{PluginSpec, StyleMap, Track};
use serde::Serialize;

/// Fully resolved scenario: references substituted, inheritance applied,
/// invariants validated. Immutable once produced by [`crate::resolve::resolve`];
/// replacing it invalidates all scheduler state (see
/// [`crate::session::playback::PlaybackSession::load`]).
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedScenario {
    pub version: String,
    pub tracks: Vec<Track>,
    pub cues: Vec<ResolvedCue>,
    /// Soft validator findings. Non-fatal; also emitted via `tracing::warn!`.
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationWarning {
    /// Document path of the offending field, e.g. `$.cues[1].root.display_time`.
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCue {
    pub id: String,
    pub track: String,
    /// Concrete mount window: declared, or computed from the node subtree.
    pub dom_lifetime: TimeRange,
    pub root: ResolvedNode,
}

/// Node with every inheritable field cascaded to a concrete value.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNode {
    pub id: String,
    pub kind: ResolvedNodeKind,
    pub display_time: TimeRange,
    pub style: StyleMap,
    pub layout: StyleMap,
    /// Direct-only: plugin chains are never inherited.
    pub plugin_chain: Vec<PluginSpec>,
    pub effect_scope: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedNodeKind {
    Group { children: Vec<ResolvedNode> },
    Text { text: String },
    Image { source: String },
    Video { source: String },
}

impl ResolvedNodeKind {
    pub fn children(&self) -> &[ResolvedNode] {
        match self {
            Self::Group { children } => children,
            _ => &[],
        }
    }
}

impl ResolvedScenario {
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn cue(&self, id: &str) -> Option<&ResolvedCue> {
        self.cues.iter().find(|c| c.id == id)
    }
}

impl ResolvedNode {
    /// Find a node by id in this subtree, including `self`.
    pub fn descendant(&self, id: &str) -> Option<&ResolvedNode> {
        if self.id == id {
            return Some(self);
        }
        self.kind
            .children()
            .iter()
            .find_map(|child| child.descendant(id))
    }
}
