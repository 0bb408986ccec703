use serde::Serialize;
use std::collections::BTreeMap;

/// Per-tick map of named channel values for one node (translate_x, scale,
/// opacity, ...). Recomputed every tick, never persisted.
pub type Channels = BTreeMap<String, ChannelValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Num(f64),
    Str(String),
}

impl ChannelValue {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(_) => None,
        }
    }
}

impl From<f64> for ChannelValue {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for ChannelValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

/// Arithmetic role of a channel, deciding its implicit base value when an
/// `add`/`multiply` contribution arrives before any other plugin touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Base 0: translations, rotations, skews.
    Additive,
    /// Base 1: scale and opacity family.
    Multiplicative,
}

impl ChannelRole {
    pub fn base(self) -> f64 {
        match self {
            Self::Additive => 0.0,
            Self::Multiplicative => 1.0,
        }
    }
}

/// Role by channel name. Unknown channels default to additive.
pub fn channel_role(name: &str) -> ChannelRole {
    match name {
        "scale" | "scale_x" | "scale_y" | "opacity" => ChannelRole::Multiplicative,
        _ => ChannelRole::Additive,
    }
}
