use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::metadata::CaptureMetadata;
use crate::timecode::{FrameRate, TimecodeValue};

const RECORDED_DATE: &str = "Recorded date";
const TAPE: &str = "TAPE";
const FRAME_RATE: &str = "Frame rate";
const TIMECODE_IN: &str = "TCOD";
const TIMECODE_OUT: &str = "TCDO";
const CAPTURE_STATS: &str = "STAT";
const FIRST_FRAME_TIMECODE: &str = "Time code of first frame";

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Recovers [`CaptureMetadata`] from a probe report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParser;

struct ValueGrammars {
    date_time: Regex,
    word: Regex,
    counter: Regex,
    frames_per_second: Regex,
    first_frame: Regex,
}

fn grammars() -> &'static ValueGrammars {
    static GRAMMARS: OnceLock<ValueGrammars> = OnceLock::new();
    GRAMMARS.get_or_init(|| ValueGrammars {
        date_time: literal(r"^[0-9\- :.]*"),
        word: literal(r"^\w+"),
        counter: literal(r"^[0-9]+"),
        frames_per_second: literal(r"^([0-9]+(?:\.[0-9]*)?)\s*FPS\b"),
        first_frame: literal(r"^([0-9]{2}):([0-9]{2}):([0-9]{2})[:;]([0-9]+)"),
    })
}

fn literal(pattern: &str) -> Regex {
    Regex::new(pattern).expect("report value patterns are valid literals")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FirstFrameTimecode {
    hour: u32,
    minute: u32,
    second: u32,
    frame: u32,
}

#[derive(Debug)]
struct Slot<T> {
    decided: bool,
    value: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            decided: false,
            value: None,
        }
    }
}

impl<T> Slot<T> {
    /// The first line carrying the key decides the field, even when its value is unusable.
    fn offer(&mut self, extract: impl FnOnce() -> Option<T>) {
        if !self.decided {
            self.decided = true;
            self.value = extract();
        }
    }

    /// Lines whose value does not fit the grammar are skipped; the first fitting one decides.
    fn offer_until_matched(&mut self, extract: impl FnOnce() -> Option<T>) {
        if !self.decided {
            self.value = extract();
            self.decided = self.value.is_some();
        }
    }
}

#[derive(Debug, Default)]
struct ReportFields {
    recorded_date: Slot<NaiveDateTime>,
    tape_name: Slot<String>,
    frame_rate: Slot<FrameRate>,
    timecode_in: Slot<TimecodeValue>,
    timecode_out: Slot<TimecodeValue>,
    capture_stats: Slot<(Option<u32>, Option<u32>)>,
    first_frame: Slot<FirstFrameTimecode>,
}

impl ReportParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, report: &str) -> CaptureMetadata {
        let mut fields = ReportFields::default();

        for (key, value) in report.lines().filter_map(split_field) {
            match key {
                RECORDED_DATE => fields.recorded_date.offer(|| recorded_date(value)),
                TAPE => fields.tape_name.offer(|| tape_name(value)),
                FRAME_RATE => fields.frame_rate.offer_until_matched(|| frame_rate(value)),
                TIMECODE_IN => fields.timecode_in.offer(|| timecode(value)),
                TIMECODE_OUT => fields.timecode_out.offer(|| timecode(value)),
                CAPTURE_STATS => fields.capture_stats.offer(|| capture_stats(value)),
                FIRST_FRAME_TIMECODE => fields
                    .first_frame
                    .offer_until_matched(|| first_frame(value)),
                _ => {}
            }
        }

        let frame_rate = fields.frame_rate.value;
        let timecode_in = fields.timecode_in.value.or_else(|| {
            fields.first_frame.value.map(|first| {
                TimecodeValue::from_timecode_of_first_frame(
                    first.hour,
                    first.minute,
                    first.second,
                    first.frame,
                    FrameRate::or_default(frame_rate),
                )
            })
        });
        let (captured_frames, dropped_frames) = fields.capture_stats.value.unwrap_or_default();

        CaptureMetadata {
            recorded_date: fields.recorded_date.value,
            tape_name: fields.tape_name.value,
            timecode_in,
            timecode_out: fields.timecode_out.value,
            captured_frames,
            dropped_frames,
            frame_rate,
        }
    }
}

fn recorded_date(value: &str) -> Option<NaiveDateTime> {
    let literal = grammars().date_time.find(value)?.as_str().trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(literal, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(literal, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn tape_name(value: &str) -> Option<String> {
    grammars()
        .word
        .find(value)
        .map(|word| word.as_str().to_string())
}

/// `<decimal> FPS`; annotated forms such as `29.970 (30000/1001) FPS` do not fit.
fn frame_rate(value: &str) -> Option<FrameRate> {
    let captures = grammars().frames_per_second.captures(value)?;
    let fps = captures.get(1)?.as_str().parse::<f64>().ok()?;
    FrameRate::new(fps).ok()
}

fn timecode(value: &str) -> Option<TimecodeValue> {
    let digits = grammars().counter.find(value)?.as_str();
    digits.parse::<u64>().ok().map(TimecodeValue::from_raw_counter)
}

fn first_frame(value: &str) -> Option<FirstFrameTimecode> {
    let captures = grammars().first_frame.captures(value)?;
    let number = |index: usize| captures.get(index)?.as_str().parse::<u32>().ok();
    Some(FirstFrameTimecode {
        hour: number(1)?,
        minute: number(2)?,
        second: number(3)?,
        frame: number(4)?,
    })
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// `STAT : <total> <dropped> <rate> <other>`
fn capture_stats(value: &str) -> Option<(Option<u32>, Option<u32>)> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    Some((tokens[0].parse().ok(), tokens[1].parse().ok()))
}
