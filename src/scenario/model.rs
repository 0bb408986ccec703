use crate::foundation::core::TimeRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named values a document can reference via `"define.<path>"` strings.
pub type DefineSection = BTreeMap<String, serde_json::Value>;

/// Shallow key/value bag for style and layout fields. Values stay JSON;
/// interpreting them is the rendering layer's concern.
pub type StyleMap = BTreeMap<String, serde_json::Value>;

/// Top-level scenario document, as parsed after reference resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub version: String,
    #[serde(default)]
    pub define: DefineSection,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub cues: Vec<Cue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub default_style: StyleMap,
    #[serde(default)]
    pub default_layout: StyleMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Subtitle,
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cue {
    pub id: String,
    /// Id of the track this cue renders on.
    pub track: String,
    /// When the cue's subtree should exist in the render tree. Computed
    /// from the node tree when absent.
    #[serde(default)]
    pub dom_lifetime: Option<TimeRange>,
    pub root: Node,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub display_time: Option<TimeRange>,
    #[serde(default)]
    pub style: Option<StyleMap>,
    #[serde(default)]
    pub layout: Option<StyleMap>,
    #[serde(default)]
    pub plugin_chain: Vec<PluginSpec>,
    #[serde(default)]
    pub effect_scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Group { children: Vec<Node> },
    Text { text: String },
    Image { source: String },
    Video { source: String },
}

impl NodeKind {
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Group { children } => children,
            _ => &[],
        }
    }
}

/// One entry of a node's animation plugin chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
    #[serde(default = "OffsetRange::full")]
    pub time_offset: OffsetRange,
    #[serde(default)]
    pub compose: ComposeMode,
    #[serde(default)]
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeMode {
    #[default]
    Replace,
    Add,
    Multiply,
}

/// Start/end pair of a plugin's execution window, relative to the owning
/// node's display time. Wire form is the 2-element array `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetRange {
    pub start: TimeEdge,
    pub end: TimeEdge,
}

impl Serialize for OffsetRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [self.start, self.end].serialize(serializer)
    }
}

impl OffsetRange {
    /// The whole display time of the node.
    pub fn full() -> Self {
        Self {
            start: TimeEdge::Fraction(0.0),
            end: TimeEdge::Fraction(1.0),
        }
    }
}

impl<'de> Deserialize<'de> for OffsetRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([TimeEdge; 2]),
            Obj { start: TimeEdge, end: TimeEdge },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([start, end]) => Ok(Self { start, end }),
            Repr::Obj { start, end } => Ok(Self { start, end }),
        }
    }
}

/// One edge of a plugin window offset.
///
/// Canonical form is tagged: `{"seconds": 1.5}` or `{"fraction": 0.5}`.
/// The legacy shim additionally accepts a bare number (always seconds)
/// and a percentage string `"-?\d+(\.\d+)?%"` (fraction = percent / 100).
/// Magnitude never disambiguates: `0.5` is half a second, `"50%"` is half
/// the parent duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEdge {
    /// Offset from the parent range start, in seconds.
    Seconds(f64),
    /// Offset from the parent range start, as a fraction of its duration.
    /// Values outside `[0, 1]` are allowed and extend past the parent.
    Fraction(f64),
}

impl<'de> Deserialize<'de> for TimeEdge {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
            Tagged(TaggedRepr),
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum TaggedRepr {
            Seconds(f64),
            Fraction(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Num(s) => Ok(Self::Seconds(s)),
            Repr::Str(s) => match parse_percent_literal(&s) {
                Some(pct) => Ok(Self::Fraction(pct / 100.0)),
                None => Err(serde::de::Error::custom(format!(
                    "time edge string must be a percentage like \"50%\", got \"{s}\""
                ))),
            },
            Repr::Tagged(TaggedRepr::Seconds(s)) => Ok(Self::Seconds(s)),
            Repr::Tagged(TaggedRepr::Fraction(f)) => Ok(Self::Fraction(f)),
        }
    }
}

/// Strict percentage literal: `-?\d+(\.\d+)?%`.
fn parse_percent_literal(s: &str) -> Option<f64> {
    let body = s.strip_suffix('%')?;
    let digits = body.strip_prefix('-').unwrap_or(body);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next()?;
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac_part) = parts.next() {
        if frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    body.parse::<f64>().ok()
}
