use crate::foundation::error::{CuelineError, CuelineResult};

/// Inclusive time range `[start, end]` in seconds on the media timeline.
///
/// Wire form is the 2-element array `[start, end]`. Resolution may produce
/// unbounded ranges using `-INFINITY`/`INFINITY`; those never come from the
/// document itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    /// Inclusive range start.
    pub start: f64,
    /// Inclusive range end.
    pub end: f64,
}

impl TimeRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: f64, end: f64) -> CuelineResult<Self> {
        let r = Self { start, end };
        if !r.is_well_formed() {
            return Err(CuelineError::validation(
                "TimeRange start must be <= end and free of NaN",
            ));
        }
        Ok(r)
    }

    /// Range covering the whole timeline, used as the system default
    /// when no ancestor declares a display time.
    pub fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    /// `start <= end` with neither bound NaN.
    pub fn is_well_formed(self) -> bool {
        !self.start.is_nan() && !self.end.is_nan() && self.start <= self.end
    }

    /// Both bounds finite.
    pub fn is_finite(self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Duration in seconds. Negative for malformed ranges.
    pub fn duration(self) -> f64 {
        self.end - self.start
    }

    /// Return `true` when `t` is inside `[start, end]`, inclusive on both
    /// ends. Malformed ranges and NaN input contain nothing.
    pub fn contains(self, t: f64) -> bool {
        self.is_well_formed() && !t.is_nan() && self.start <= t && t <= self.end
    }

    /// Clamp a time into this range. Malformed ranges clamp to `start`.
    pub fn clamp(self, t: f64) -> f64 {
        if !self.is_well_formed() {
            return self.start;
        }
        t.clamp(self.start, self.end)
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Widen both ends by `margin` seconds, never past infinity.
    pub fn widened(self, margin: f64) -> Self {
        Self {
            start: self.start - margin,
            end: self.end + margin,
        }
    }
}

impl serde::Serialize for TimeRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [self.start, self.end].serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for TimeRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 2]),
            Obj { start: f64, end: f64 },
        }

        // Well-formedness (start <= end) is left to the validator so the
        // error can name the document path.
        match Repr::deserialize(deserializer)? {
            Repr::Arr([start, end]) => Ok(Self { start, end }),
            Repr::Obj { start, end } => Ok(Self { start, end }),
        }
    }
}

/// Frames-per-second represented as a rational `num/den`, used only for
/// optional frame snapping of computed windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> CuelineResult<Self> {
        if num == 0 || den == 0 {
            return Err(CuelineError::validation("Fps num and den must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}
