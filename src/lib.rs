//! Cueline renders nothing: it is the document-resolution and temporal-
//! composition core of a time-driven overlay engine.
//!
//! - Load a scenario JSON and [`resolve`] it into a [`ResolvedScenario`]
//!   (reference substitution, inheritance cascade, validation)
//! - Create a [`PlaybackSession`] with an injected [`PluginEvaluator`]
//! - Call [`PlaybackSession::update`] once per tick to get the live node
//!   set and each node's composed channel map
//!
//! The rendering layer, media transport, and plugin loading are external
//! collaborators consuming these outputs.
#![forbid(unsafe_code)]

pub mod compose;
pub mod foundation;
pub mod resolve;
pub mod scenario;
pub mod schedule;
pub mod session;
pub mod timing;

pub use crate::foundation::core::{Fps, TimeRange};
pub use crate::foundation::error::{CuelineError, CuelineResult};

pub use crate::compose::channels::{channel_role, ChannelRole, ChannelValue, Channels};
pub use crate::compose::composer::{compose_node_channels, NoopEvaluator, PluginEvaluator};
pub use crate::resolve::{resolve, resolve_with_options, ResolveOptions};
pub use crate::scenario::model::{
    ComposeMode, Cue, DefineSection, Node, NodeKind, OffsetRange, PluginSpec, Scenario, StyleMap,
    TimeEdge, Track, TrackKind,
};
pub use crate::scenario::resolved::{
    ResolvedCue, ResolvedNode, ResolvedNodeKind, ResolvedScenario, ValidationWarning,
};
pub use crate::schedule::clock::{ManualClock, SystemClock, TickClock};
pub use crate::schedule::lifecycle::{
    LifecycleScheduler, LifecycleState, MountedEntry, SchedulerOptions,
};
pub use crate::session::playback::{PlaybackSession, TickOutput};
