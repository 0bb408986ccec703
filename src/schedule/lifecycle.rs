//! Decides which cues must exist in the render tree at a given media
//! time: preloading ahead of their lifetime, active inside it, and kept
//! mounted for a deferred cleanup window after it so scrubbing does not
//! thrash remounts.

use crate::scenario::resolved::ResolvedScenario;
use crate::schedule::clock::TickClock;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Mounted ahead of (or outside) the lifetime, not currently visible.
    Preloading,
    /// Media time is inside the cue's dom lifetime.
    Active,
    /// Past the lifetime end; unmount is scheduled but not yet fired.
    CleanupPending,
}

/// Scheduler bookkeeping for one mounted cue. Owned exclusively by the
/// scheduler; `Unmounted` is represented by absence from the mounted set.
#[derive(Debug, Clone)]
pub struct MountedEntry {
    pub cue_id: String,
    /// Monotonic mount sequence, used for oldest-first eviction.
    pub mounted_seq: u64,
    pub state: LifecycleState,
    /// Tick-clock deadline of the deferred unmount. Clearing this field
    /// is the cancellation: each entry's timer is individually keyed.
    pending_unmount_at: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Seconds of media time a cue is mounted ahead of its lifetime start.
    pub preload_lookahead: f64,
    /// Seconds on the tick clock between lifetime end and actual unmount.
    pub cleanup_delay: f64,
    /// Mounted-set bound; beyond it the oldest inactive entries are
    /// evicted. Active entries are never evicted.
    pub max_mounted: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            preload_lookahead: 0.3,
            cleanup_delay: 0.5,
            max_mounted: 64,
        }
    }
}

pub struct LifecycleScheduler {
    opts: SchedulerOptions,
    clock: Box<dyn TickClock>,
    mounted: HashMap<String, MountedEntry>,
    next_seq: u64,
}

impl LifecycleScheduler {
    pub fn new(opts: SchedulerOptions, clock: Box<dyn TickClock>) -> Self {
        Self {
            opts,
            clock,
            mounted: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Drop every mounted entry and its pending unmount. Must be called
    /// when a new scenario replaces the current one, so no stale deadline
    /// can unmount an entry belonging to the new document.
    pub fn reset(&mut self) {
        self.mounted.clear();
    }

    pub fn state(&self, cue_id: &str) -> Option<LifecycleState> {
        self.mounted.get(cue_id).map(|e| e.state)
    }

    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &MountedEntry> {
        self.mounted.values()
    }

    /// Advance the mounted set to `current_time`. Idempotent: repeated
    /// calls with the same time (and tick clock) settle on the same state.
    pub fn update(&mut self, scenario: &ResolvedScenario, current_time: f64) {
        let now = self.clock.now();

        for cue in &scenario.cues {
            let lifetime = cue.dom_lifetime;
            match self.mounted.entry(cue.id.clone()) {
                Entry::Occupied(mut occupied) => {
                    let entry = occupied.get_mut();
                    if current_time > lifetime.end {
                        if entry.state != LifecycleState::CleanupPending {
                            entry.state = LifecycleState::CleanupPending;
                            entry.pending_unmount_at = Some(now + self.opts.cleanup_delay);
                        }
                    } else {
                        // Relevant again: cancel any pending unmount so the
                        // entry resumes without ever leaving the mounted
                        // state.
                        entry.pending_unmount_at = None;
                        entry.state = if lifetime.contains(current_time) {
                            LifecycleState::Active
                        } else {
                            LifecycleState::Preloading
                        };
                    }
                }
                Entry::Vacant(vacant) => {
                    let within_lookahead =
                        current_time + self.opts.preload_lookahead >= lifetime.start;
                    if within_lookahead && current_time <= lifetime.end {
                        let state = if lifetime.contains(current_time) {
                            LifecycleState::Active
                        } else {
                            LifecycleState::Preloading
                        };
                        let seq = self.next_seq;
                        self.next_seq += 1;
                        vacant.insert(MountedEntry {
                            cue_id: cue.id.clone(),
                            mounted_seq: seq,
                            state,
                            pending_unmount_at: None,
                        });
                    }
                }
            }
        }

        self.fire_expired(now);
        self.enforce_bound();
    }

    fn fire_expired(&mut self, now: f64) {
        self.mounted.retain(|_, entry| {
            match (entry.state, entry.pending_unmount_at) {
                (LifecycleState::CleanupPending, Some(deadline)) => deadline > now,
                _ => true,
            }
        });
    }

    fn enforce_bound(&mut self) {
        while self.mounted.len() > self.opts.max_mounted {
            let victim = self
                .mounted
                .values()
                .filter(|e| e.state != LifecycleState::Active)
                .min_by_key(|e| e.mounted_seq)
                .map(|e| e.cue_id.clone());
            match victim {
                Some(id) => {
                    tracing::warn!(cue = %id, "mounted-set bound exceeded, evicting inactive entry");
                    self.mounted.remove(&id);
                }
                // Everything is active; the bound cannot be enforced
                // without visible breakage.
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use crate::schedule::clock::ManualClock;
    use serde_json::json;

    fn scenario_with_lifetimes(lifetimes: &[[f64; 2]]) -> ResolvedScenario {
        let cues: Vec<_> = lifetimes
            .iter()
            .enumerate()
            .map(|(i, lt)| {
                json!({
                    "id": format!("c{i}"),
                    "track": "t",
                    "dom_lifetime": lt,
                    "root": {"id": format!("n{i}"), "kind": {"text": {"text": "x"}}}
                })
            })
            .collect();
        resolve(&json!({
            "version": "1",
            "tracks": [{"id": "t", "kind": "free"}],
            "cues": cues
        }))
        .unwrap()
    }

    fn scheduler(clock: &ManualClock) -> LifecycleScheduler {
        LifecycleScheduler::new(
            SchedulerOptions {
                preload_lookahead: 0.3,
                cleanup_delay: 0.5,
                max_mounted: 64,
            },
            Box::new(clock.clone()),
        )
    }

    #[test]
    fn preloads_within_lookahead_and_activates_inside() {
        let sc = scenario_with_lifetimes(&[[2.0, 5.0]]);
        let clock = ManualClock::new();
        let mut s = scheduler(&clock);

        s.update(&sc, 1.0);
        assert_eq!(s.state("c0"), None);

        s.update(&sc, 1.71);
        assert_eq!(s.state("c0"), Some(LifecycleState::Preloading));

        s.update(&sc, 2.0);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));

        s.update(&sc, 5.0);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));
    }

    #[test]
    fn cleanup_defers_unmount_and_can_be_cancelled() {
        let sc = scenario_with_lifetimes(&[[2.0, 5.0]]);
        let clock = ManualClock::new();
        let mut s = scheduler(&clock);

        s.update(&sc, 4.9);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));

        // Past the end: scheduled for cleanup, still mounted.
        s.update(&sc, 5.1);
        assert_eq!(s.state("c0"), Some(LifecycleState::CleanupPending));

        // Scrub back inside the lifetime before the deadline fires.
        clock.advance(0.2);
        s.update(&sc, 4.95);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));

        // The cancelled deadline must not fire later.
        clock.advance(1.0);
        s.update(&sc, 4.96);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));
    }

    #[test]
    fn cleanup_unmounts_after_the_delay() {
        let sc = scenario_with_lifetimes(&[[2.0, 5.0]]);
        let clock = ManualClock::new();
        let mut s = scheduler(&clock);

        s.update(&sc, 4.0);
        s.update(&sc, 5.1);
        assert_eq!(s.state("c0"), Some(LifecycleState::CleanupPending));

        clock.advance(0.4);
        s.update(&sc, 5.2);
        assert_eq!(s.state("c0"), Some(LifecycleState::CleanupPending));

        clock.advance(0.2);
        s.update(&sc, 5.3);
        assert_eq!(s.state("c0"), None);
    }

    #[test]
    fn repeated_cleanup_updates_keep_the_original_deadline() {
        let sc = scenario_with_lifetimes(&[[2.0, 5.0]]);
        let clock = ManualClock::new();
        let mut s = scheduler(&clock);

        s.update(&sc, 4.0);
        s.update(&sc, 5.1);
        clock.advance(0.3);
        // A second past-end update must not push the deadline out.
        s.update(&sc, 5.2);
        clock.advance(0.3);
        s.update(&sc, 5.3);
        assert_eq!(s.state("c0"), None);
    }

    #[test]
    fn no_remount_long_after_the_lifetime() {
        let sc = scenario_with_lifetimes(&[[2.0, 5.0]]);
        let clock = ManualClock::new();
        let mut s = scheduler(&clock);

        s.update(&sc, 4.0);
        s.update(&sc, 5.1);
        assert_eq!(s.state("c0"), Some(LifecycleState::CleanupPending));

        clock.advance(1.0);
        s.update(&sc, 20.0);
        assert_eq!(s.state("c0"), None);

        // Well past the lifetime: mounting again would be wrong.
        s.update(&sc, 21.0);
        assert_eq!(s.state("c0"), None);
    }

    #[test]
    fn eviction_prefers_oldest_inactive_never_active() {
        let sc = scenario_with_lifetimes(&[[0.0, 100.0], [1.0, 100.0], [90.0, 100.0]]);
        let clock = ManualClock::new();
        let mut s = LifecycleScheduler::new(
            SchedulerOptions {
                preload_lookahead: 100.0,
                cleanup_delay: 0.5,
                max_mounted: 2,
            },
            Box::new(clock.clone()),
        );

        // c0 and c1 are active at t=2, c2 only preloading. Three mounted
        // exceeds the bound of two; the preloading entry goes.
        s.update(&sc, 2.0);
        assert_eq!(s.mounted_len(), 2);
        assert_eq!(s.state("c2"), None);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));
        assert_eq!(s.state("c1"), Some(LifecycleState::Active));
    }

    #[test]
    fn reset_clears_entries_and_deadlines() {
        let sc = scenario_with_lifetimes(&[[2.0, 5.0]]);
        let clock = ManualClock::new();
        let mut s = scheduler(&clock);

        s.update(&sc, 4.0);
        s.update(&sc, 5.1);
        assert_eq!(s.mounted_len(), 1);

        s.reset();
        assert_eq!(s.mounted_len(), 0);

        // A stale deadline must not be able to unmount entries mounted
        // for the replacement document.
        let replacement = scenario_with_lifetimes(&[[2.0, 5.0]]);
        clock.advance(10.0);
        s.update(&replacement, 3.0);
        assert_eq!(s.state("c0"), Some(LifecycleState::Active));
    }
}
