//! Session-oriented playback API: one `update` per tick turns the
//! resolved scenario plus the current media time into the live node set
//! and its composed channels. The rendering layer consumes the output;
//! nothing here draws.

use crate::compose::channels::Channels;
use crate::compose::composer::{compose_node_channels, PluginEvaluator};
use crate::scenario::resolved::{ResolvedCue, ResolvedNode, ResolvedScenario};
use crate::schedule::clock::{SystemClock, TickClock};
use crate::schedule::lifecycle::{LifecycleScheduler, LifecycleState, SchedulerOptions};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Output of one tick. `live_nodes` is ordered by (track layer, cue
/// document order, DFS order); `channels` has one entry per live node.
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub live_nodes: Vec<String>,
    pub channels: BTreeMap<String, Channels>,
}

pub struct PlaybackSession {
    scenario: Arc<ResolvedScenario>,
    scheduler: LifecycleScheduler,
    evaluator: Box<dyn PluginEvaluator>,
}

impl PlaybackSession {
    pub fn new(
        scenario: Arc<ResolvedScenario>,
        evaluator: Box<dyn PluginEvaluator>,
        opts: SchedulerOptions,
    ) -> Self {
        Self::with_clock(scenario, evaluator, opts, Box::new(SystemClock::new()))
    }

    pub fn with_clock(
        scenario: Arc<ResolvedScenario>,
        evaluator: Box<dyn PluginEvaluator>,
        opts: SchedulerOptions,
        clock: Box<dyn TickClock>,
    ) -> Self {
        Self {
            scenario,
            scheduler: LifecycleScheduler::new(opts, clock),
            evaluator,
        }
    }

    pub fn scenario(&self) -> &ResolvedScenario {
        &self.scenario
    }

    pub fn scheduler(&self) -> &LifecycleScheduler {
        &self.scheduler
    }

    /// Replace the scenario. Resets the scheduler first so no pending
    /// unmount from the old document can touch the new one.
    pub fn load(&mut self, scenario: Arc<ResolvedScenario>) {
        self.scheduler.reset();
        self.scenario = scenario;
    }

    /// Advance to `current_time` and produce the tick output.
    #[tracing::instrument(skip(self))]
    pub fn update(&mut self, current_time: f64) -> TickOutput {
        self.scheduler.update(&self.scenario, current_time);

        // Stable order: track layer first, then cue document order.
        let mut ordered: Vec<(i32, &ResolvedCue)> = self
            .scenario
            .cues
            .iter()
            .filter(|cue| self.scheduler.state(&cue.id) == Some(LifecycleState::Active))
            .map(|cue| {
                let layer = self
                    .scenario
                    .track(&cue.track)
                    .map(|t| t.layer)
                    .unwrap_or(0);
                (layer, cue)
            })
            .collect();
        ordered.sort_by_key(|(layer, _)| *layer);

        let mut out = TickOutput {
            live_nodes: Vec::new(),
            channels: BTreeMap::new(),
        };
        for (_, cue) in ordered {
            self.visit_visible(&cue.root, current_time, &mut out);
        }
        out
    }

    /// DFS preorder over visible nodes. A node hidden by its display time
    /// hides its whole subtree, matching parent-gated visibility.
    fn visit_visible(&self, node: &ResolvedNode, t: f64, out: &mut TickOutput) {
        if !node.display_time.contains(t) {
            return;
        }
        out.live_nodes.push(node.id.clone());
        out.channels.insert(
            node.id.clone(),
            compose_node_channels(node, t, self.evaluator.as_ref()),
        );
        for child in node.kind.children() {
            self.visit_visible(child, t, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::channels::{ChannelValue, Channels};
    use crate::resolve::resolve;
    use crate::scenario::model::PluginSpec;
    use crate::schedule::clock::ManualClock;
    use serde_json::json;

    struct ProgressEvaluator;

    impl PluginEvaluator for ProgressEvaluator {
        fn evaluate(&self, spec: &PluginSpec, progress: f64) -> anyhow::Result<Channels> {
            let mut c = Channels::new();
            c.insert(spec.name.clone(), ChannelValue::Num(progress));
            Ok(c)
        }
    }

    fn session_for(doc: serde_json::Value) -> (PlaybackSession, ManualClock) {
        let scenario = Arc::new(resolve(&doc).unwrap());
        let clock = ManualClock::new();
        let session = PlaybackSession::with_clock(
            scenario,
            Box::new(ProgressEvaluator),
            SchedulerOptions::default(),
            Box::new(clock.clone()),
        );
        (session, clock)
    }

    fn layered_doc() -> serde_json::Value {
        json!({
            "version": "1",
            "tracks": [
                {"id": "top", "kind": "free", "layer": 5},
                {"id": "subs", "kind": "subtitle", "layer": 0}
            ],
            "cues": [
                {
                    "id": "badge",
                    "track": "top",
                    "root": {
                        "id": "badge_root",
                        "kind": {"image": {"source": "badge.png"}},
                        "display_time": [0.0, 10.0]
                    }
                },
                {
                    "id": "line1",
                    "track": "subs",
                    "root": {
                        "id": "line1_group",
                        "kind": {"group": {"children": [
                            {
                                "id": "line1_text",
                                "kind": {"text": {"text": "hello"}},
                                "plugin_chain": [{"name": "fade"}]
                            },
                            {
                                "id": "line1_late",
                                "kind": {"text": {"text": "later"}},
                                "display_time": [3.0, 4.0]
                            }
                        ]}},
                        "display_time": [1.0, 4.0]
                    }
                }
            ]
        })
    }

    #[test]
    fn live_nodes_are_layer_then_dfs_ordered() {
        let (mut session, _clock) = session_for(layered_doc());
        let out = session.update(2.0);
        // subs layer 0 before top layer 5; group before its children.
        assert_eq!(
            out.live_nodes,
            vec!["line1_group", "line1_text", "badge_root"]
        );
    }

    #[test]
    fn hidden_parent_hides_subtree() {
        let (mut session, _clock) = session_for(layered_doc());
        let out = session.update(3.5);
        assert!(out.live_nodes.contains(&"line1_late".to_owned()));

        let after = session.update(5.0);
        assert!(!after.live_nodes.iter().any(|n| n.starts_with("line1")));
    }

    #[test]
    fn channels_follow_plugin_progress() {
        let (mut session, _clock) = session_for(layered_doc());
        let out = session.update(2.5);
        // fade spans the node display time [1, 4]; t=2.5 is halfway.
        let c = &out.channels["line1_text"];
        assert_eq!(c["fade"], ChannelValue::Num(0.5));

        // Nodes without plugins still appear, with empty channels.
        assert!(out.channels["badge_root"].is_empty());
    }

    #[test]
    fn load_resets_scheduler_state() {
        let (mut session, _clock) = session_for(layered_doc());
        session.update(2.0);
        assert!(session.scheduler().mounted_len() > 0);

        let replacement = Arc::new(resolve(&layered_doc()).unwrap());
        session.load(replacement);
        assert_eq!(session.scheduler().mounted_len(), 0);
    }
}
