use std::sync::Arc;

use cueline::{
    resolve, ChannelValue, Channels, LifecycleState, ManualClock, PlaybackSession,
    PluginEvaluator, PluginSpec, SchedulerOptions,
};
use serde_json::json;

struct CaptionEvaluator;

impl PluginEvaluator for CaptionEvaluator {
    fn evaluate(&self, spec: &PluginSpec, progress: f64) -> anyhow::Result<Channels> {
        let mut c = Channels::new();
        match spec.name.as_str() {
            "fade_in" => {
                c.insert("opacity".to_owned(), ChannelValue::Num(progress));
            }
            "fade_out" => {
                c.insert("opacity".to_owned(), ChannelValue::Num(1.0 - progress));
            }
            "slide" => {
                c.insert(
                    "translate_x".to_owned(),
                    ChannelValue::Num(40.0 * (1.0 - progress)),
                );
            }
            other => anyhow::bail!("unknown plugin '{other}'"),
        }
        Ok(c)
    }
}

fn fixture_session() -> (PlaybackSession, ManualClock) {
    let raw: serde_json::Value =
        serde_json::from_str(include_str!("data/subtitle_scenario.json")).unwrap();
    let scenario = Arc::new(resolve(&raw).unwrap());
    let clock = ManualClock::new();
    let session = PlaybackSession::with_clock(
        scenario,
        Box::new(CaptionEvaluator),
        SchedulerOptions::default(),
        Box::new(clock.clone()),
    );
    (session, clock)
}

#[test]
fn entrance_and_exit_windows_drive_opacity() {
    let (mut session, _clock) = fixture_session();

    // fade_in runs over [1.0, 1.9] (30% of the 3s display time).
    let out = session.update(1.45);
    assert_eq!(
        out.channels["line_1_text"]["opacity"],
        ChannelValue::Num(0.5)
    );

    // Between the windows neither plugin contributes.
    let mid = session.update(2.5);
    assert!(mid.channels["line_1_text"].is_empty());

    // fade_out multiplies against the untouched opacity base of 1.
    let late = session.update(3.55);
    assert_eq!(
        late.channels["line_1_text"]["opacity"],
        ChannelValue::Num(0.5)
    );
}

#[test]
fn add_composes_from_additive_base() {
    let (mut session, _clock) = fixture_session();

    // slide window is [5.75, 7.0]: 0.25s after start to 50% of duration.
    let out = session.update(5.75);
    assert_eq!(
        out.channels["sting_image"]["translate_x"],
        ChannelValue::Num(40.0)
    );

    let end = session.update(7.0);
    assert_eq!(
        end.channels["sting_image"]["translate_x"],
        ChannelValue::Num(0.0)
    );

    // Outside the window the channel is untouched.
    let outside = session.update(8.0);
    assert!(outside.channels["sting_image"].is_empty());
}

#[test]
fn live_set_follows_lifetimes() {
    let (mut session, _clock) = fixture_session();

    let early = session.update(2.0);
    assert_eq!(early.live_nodes, vec!["line_1_group", "line_1_text"]);

    let later = session.update(6.0);
    assert_eq!(later.live_nodes, vec!["sting_image"]);
}

#[test]
fn scheduler_walkthrough_with_deferred_cleanup() {
    let doc = json!({
        "version": "1",
        "tracks": [{"id": "t", "kind": "free"}],
        "cues": [{
            "id": "c0",
            "track": "t",
            "dom_lifetime": [2.0, 5.0],
            "root": {"id": "n0", "kind": {"text": {"text": "x"}}, "display_time": [2.0, 5.0]}
        }]
    });
    let scenario = Arc::new(resolve(&doc).unwrap());
    let clock = ManualClock::new();
    let mut session = PlaybackSession::with_clock(
        scenario,
        Box::new(cueline::NoopEvaluator),
        SchedulerOptions {
            preload_lookahead: 0.3,
            cleanup_delay: 0.5,
            max_mounted: 64,
        },
        Box::new(clock.clone()),
    );

    session.update(1.71);
    assert_eq!(
        session.scheduler().state("c0"),
        Some(LifecycleState::Preloading)
    );

    session.update(2.0);
    assert_eq!(session.scheduler().state("c0"), Some(LifecycleState::Active));

    // Past the end: cleanup is scheduled but the entry stays mounted.
    session.update(5.1);
    assert_eq!(
        session.scheduler().state("c0"),
        Some(LifecycleState::CleanupPending)
    );

    // Seek back inside the lifetime before the deferred unmount fires:
    // still mounted, pending unmount cancelled, no remount flicker.
    clock.advance(0.2);
    let out = session.update(4.8);
    assert_eq!(session.scheduler().state("c0"), Some(LifecycleState::Active));
    assert_eq!(out.live_nodes, vec!["n0"]);

    // The cancelled deadline never fires.
    clock.advance(2.0);
    session.update(4.8);
    assert_eq!(session.scheduler().state("c0"), Some(LifecycleState::Active));
}
