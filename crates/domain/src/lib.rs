mod error;
mod metadata;
mod reconcile;
mod report;
mod stats;
mod timecode;
mod zone;

pub use error::DomainError;
pub use metadata::CaptureMetadata;
pub use reconcile::{
    BlockedOverride, ChangeField, ExistingFileState, PendingChange, Reconciliation,
    ReconciliationPolicy, TagChange, TagField, TimestampChange,
};
pub use report::ReportParser;
pub use stats::RunStatistics;
pub use timecode::{format_range, FrameRate, TimecodeValue, TIMECODE_FACTOR};
pub use zone::{NameMatch, NameSubject, ZoneMatcher, ZoneRule, ZoneTable};

pub use chrono_tz::Tz;
