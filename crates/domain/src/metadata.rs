use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timecode::{format_range, FrameRate, TimecodeValue};

/// Capture details recovered from one probe report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    /// Wall-clock recording moment as reported by the camcorder, zone unknown.
    pub recorded_date: Option<NaiveDateTime>,
    pub tape_name: Option<String>,
    pub timecode_in: Option<TimecodeValue>,
    pub timecode_out: Option<TimecodeValue>,
    pub captured_frames: Option<u32>,
    pub dropped_frames: Option<u32>,
    pub frame_rate: Option<FrameRate>,
}

impl CaptureMetadata {
    pub fn effective_frame_rate(&self) -> FrameRate {
        FrameRate::or_default(self.frame_rate)
    }

    pub fn timecode_range(&self) -> Option<String> {
        format_range(self.timecode_in, self.timecode_out, self.frame_rate)
    }

    pub fn dropped_frames_note(&self) -> Option<String> {
        let dropped = self.dropped_frames.filter(|dropped| *dropped > 0)?;
        let total = u64::from(self.captured_frames.unwrap_or(0)) + u64::from(dropped);
        Some(format!("({dropped} of {total} dropped frames)"))
    }

    pub fn album(&self) -> Option<&str> {
        self.tape_name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.tape_name.as_deref()
    }

    pub fn comment(&self) -> Option<String> {
        let parts: Vec<String> = [self.timecode_range(), self.dropped_frames_note()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join(" "))
    }
}
