//! Pure time-window math. Every function is referentially transparent;
//! callers re-invoke per tick since progress depends on the current time.

use crate::foundation::core::{Fps, TimeRange};
use crate::scenario::model::{OffsetRange, TimeEdge};

/// `range.start <= t <= range.end`. False for malformed ranges and NaN input.
pub fn is_within(t: f64, range: TimeRange) -> bool {
    range.contains(t)
}

/// Normalized progress of `t` through `range`, clamped to `[0, 1]`.
///
/// Zero, negative, or non-finite duration yields 0.
pub fn progress(t: f64, range: TimeRange) -> f64 {
    let dur = range.duration();
    if t.is_nan() || !dur.is_finite() || dur <= 0.0 {
        return 0.0;
    }
    ((t - range.start) / dur).clamp(0.0, 1.0)
}

/// Absolute execution window for a plugin offset against its node's range.
///
/// `Seconds(s)` maps to `parent.start + s`; `Fraction(f)` to
/// `parent.start + parent.duration() * f`. Fractions outside `[0, 1]` and
/// negative seconds are permitted and extend the window past the parent.
/// An inverted result (`end < start`) contains no time at all.
pub fn compute_window(parent: TimeRange, offset: &OffsetRange) -> TimeRange {
    TimeRange {
        start: resolve_edge(parent, offset.start),
        end: resolve_edge(parent, offset.end),
    }
}

/// Like [`compute_window`], with both edges clamped into the parent range.
pub fn compute_window_clamped(parent: TimeRange, offset: &OffsetRange) -> TimeRange {
    let w = compute_window(parent, offset);
    TimeRange {
        start: parent.clamp(w.start),
        end: parent.clamp(w.end),
    }
}

fn resolve_edge(parent: TimeRange, edge: TimeEdge) -> f64 {
    match edge {
        TimeEdge::Seconds(s) => parent.start + s,
        TimeEdge::Fraction(f) => {
            let dur = parent.duration();
            if dur.is_finite() {
                parent.start + dur * f
            } else {
                // An unbounded parent cannot be subdivided: fractions pin to
                // the nearest bound instead of producing inf * 0 artifacts.
                if f >= 1.0 {
                    parent.end
                } else {
                    parent.start
                }
            }
        }
    }
}

/// Round `t` to the nearest integer multiple of one frame duration.
pub fn snap_to_frame(t: f64, fps: Fps) -> f64 {
    let dt = fps.frame_duration_secs();
    (t / dt).round() * dt
}
