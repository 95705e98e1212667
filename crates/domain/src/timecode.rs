use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Ticks per second of the probing tool's timecode counters.
pub const TIMECODE_FACTOR: u64 = 10_000_000;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    pub const DEFAULT: FrameRate = FrameRate(25.0);

    pub fn new(frames_per_second: f64) -> Result<Self, DomainError> {
        if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
            return Err(DomainError::InvalidFrameRate(frames_per_second));
        }
        Ok(Self(frames_per_second))
    }

    pub fn or_default(rate: Option<FrameRate>) -> FrameRate {
        rate.unwrap_or(Self::DEFAULT)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FrameRate> for f64 {
    fn from(value: FrameRate) -> Self {
        value.0
    }
}

/// A tape position counted in 1/[`TIMECODE_FACTOR`] second ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimecodeValue(u64);

impl TimecodeValue {
    pub fn from_raw_counter(counter: u64) -> Self {
        Self(counter)
    }

    /// Rebuilds a counter from an `HH:MM:SS:FF` reading where `frame` is the
    /// zero-based frame within the second.
    pub fn from_timecode_of_first_frame(
        hour: u32,
        minute: u32,
        second: u32,
        frame: u32,
        frame_rate: FrameRate,
    ) -> Self {
        let whole_seconds =
            u64::from(hour) * 3600 + u64::from(minute) * 60 + u64::from(second);
        let fraction = (f64::from(frame) / frame_rate.get() * TIMECODE_FACTOR as f64).floor();
        Self(
            whole_seconds
                .saturating_mul(TIMECODE_FACTOR)
                .saturating_add(fraction as u64),
        )
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Renders `HH:MM:SS:FF` with a 1-based frame index. Hours wrap within a day.
    pub fn to_display_string(self, frame_rate: Option<FrameRate>) -> String {
        let rate = FrameRate::or_default(frame_rate);
        let total_seconds = self.0 / TIMECODE_FACTOR;
        let fraction = (self.0 % TIMECODE_FACTOR) as f64 / TIMECODE_FACTOR as f64;
        let frame = (fraction * rate.get()).floor() as u64 + 1;

        let seconds_of_day = total_seconds % SECONDS_PER_DAY;
        format!(
            "{:02}:{:02}:{:02}:{:02}",
            seconds_of_day / 3600,
            (seconds_of_day / 60) % 60,
            seconds_of_day % 60,
            frame
        )
    }
}

pub fn format_range(
    timecode_in: Option<TimecodeValue>,
    timecode_out: Option<TimecodeValue>,
    frame_rate: Option<FrameRate>,
) -> Option<String> {
    let start = timecode_in?.to_display_string(frame_rate);
    match timecode_out {
        Some(end) => Some(format!("{start} - {}", end.to_display_string(frame_rate))),
        None => Some(start),
    }
}
