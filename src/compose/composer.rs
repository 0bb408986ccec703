//! Per-tick evaluation of a node's plugin chain into a composed channel
//! map. Plugin logic lives outside the core behind [`PluginEvaluator`];
//! this module owns windows, ordering, and merge semantics.

use crate::compose::channels::{channel_role, ChannelValue, Channels};
use crate::scenario::model::{ComposeMode, PluginSpec};
use crate::scenario::resolved::ResolvedNode;
use crate::timing::window;

/// Supplied by the plugin-loading subsystem. The evaluator receives the
/// plugin spec and its normalized window progress and returns a partial
/// channel map. Errors are isolated per plugin: the failing plugin
/// contributes nothing for the tick and the rest of the chain continues.
pub trait PluginEvaluator {
    fn evaluate(&self, spec: &PluginSpec, progress: f64) -> anyhow::Result<Channels>;
}

/// Evaluator contributing no channels. Useful when only lifecycle output
/// is of interest (e.g. the CLI `states` command).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvaluator;

impl PluginEvaluator for NoopEvaluator {
    fn evaluate(&self, _spec: &PluginSpec, _progress: f64) -> anyhow::Result<Channels> {
        Ok(Channels::new())
    }
}

/// Compose the channel map of `node` at time `t`.
///
/// Chain order is `(priority, chain index)`, so the priority field
/// reorders plugins while untagged ones keep document order. A plugin
/// whose window does not contain `t` contributes nothing.
pub fn compose_node_channels(
    node: &ResolvedNode,
    t: f64,
    evaluator: &dyn PluginEvaluator,
) -> Channels {
    let mut ordered: Vec<&PluginSpec> = node.plugin_chain.iter().collect();
    ordered.sort_by_key(|spec| spec.priority.unwrap_or(0));

    let mut acc = Channels::new();
    for spec in ordered {
        let win = window::compute_window(node.display_time, &spec.time_offset);
        if !window::is_within(t, win) {
            continue;
        }
        let progress = window::progress(t, win);

        let contribution = match evaluator.evaluate(spec, progress) {
            Ok(c) => c,
            Err(error) => {
                tracing::warn!(
                    plugin = %spec.name,
                    node = %node.id,
                    %error,
                    "plugin evaluator failed, contributing no channels this tick"
                );
                continue;
            }
        };

        for (name, value) in contribution {
            merge_channel(&mut acc, &name, value, spec.compose);
        }
    }
    acc
}

/// Merge one contribution into the accumulator under `mode`.
///
/// `add`/`multiply` combine numerically against the accumulated value, or
/// against the channel's role base when the channel is still untouched.
/// Contributions without arithmetic meaning fall back to replace.
pub fn merge_channel(acc: &mut Channels, name: &str, value: ChannelValue, mode: ComposeMode) {
    if mode == ComposeMode::Replace {
        acc.insert(name.to_owned(), value);
        return;
    }

    let incoming = match value.as_num() {
        Some(n) => n,
        None => {
            tracing::warn!(
                channel = name,
                ?mode,
                "non-numeric contribution has no arithmetic meaning, falling back to replace"
            );
            acc.insert(name.to_owned(), value);
            return;
        }
    };

    let current = match acc.get(name) {
        Some(ChannelValue::Num(n)) => *n,
        Some(ChannelValue::Str(_)) => {
            tracing::warn!(
                channel = name,
                ?mode,
                "accumulated value is non-numeric, falling back to replace"
            );
            acc.insert(name.to_owned(), ChannelValue::Num(incoming));
            return;
        }
        None => channel_role(name).base(),
    };

    let combined = match mode {
        ComposeMode::Add => current + incoming,
        ComposeMode::Multiply => current * incoming,
        ComposeMode::Replace => unreachable!("handled above"),
    };
    acc.insert(name.to_owned(), ChannelValue::Num(combined));
}
