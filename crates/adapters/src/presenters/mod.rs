use std::path::Path;

use chrono::{DateTime, Utc};
use dvtag_application::FileReport;
use dvtag_domain::{
    BlockedOverride, CaptureMetadata, PendingChange, RunStatistics, TagChange, TagField,
};
use serde_json::json;

pub fn present_scan_banner(folder: &Path, pattern: &str, recursive: bool) -> String {
    format!(
        "Scanning folder {} {}for files matching {pattern}:",
        folder.display(),
        if recursive { "recursively " } else { "" }
    )
}

pub fn present_metadata(
    metadata: &CaptureMetadata,
    recorded_utc: Option<DateTime<Utc>>,
) -> Vec<String> {
    let optional = |value: Option<String>| value.unwrap_or_default();
    let frame_rate = metadata.frame_rate;
    vec![
        format!(
            "    Recorded date:   {}, {}",
            optional(metadata.recorded_date.map(|date| date.to_string())),
            optional(recorded_utc.map(|instant| instant.to_rfc3339()))
        ),
        format!(
            "    Tape name:       {}",
            optional(metadata.tape_name.clone())
        ),
        format!(
            "    Timecode in:     {}",
            optional(
                metadata
                    .timecode_in
                    .map(|value| format!("{} ({})", value.raw(), value.to_display_string(frame_rate)))
            )
        ),
        format!(
            "    Timecode out:    {}",
            optional(
                metadata
                    .timecode_out
                    .map(|value| format!("{} ({})", value.raw(), value.to_display_string(frame_rate)))
            )
        ),
        format!(
            "    Total frames:    {}",
            optional(metadata.captured_frames.map(|frames| frames.to_string()))
        ),
        format!(
            "    Frame rate:      {} FPS",
            optional(frame_rate.map(|rate| rate.get().to_string()))
        ),
        format!(
            "    Dropped frames:  {}",
            optional(metadata.dropped_frames.map(|frames| frames.to_string()))
        ),
    ]
}

pub fn present_change(change: &PendingChange, applied: bool) -> String {
    let verb = if applied { "updated" } else { "would be updated" };
    match change {
        PendingChange::Album(tag) => present_tag_change(TagField::Album, tag, verb),
        PendingChange::Title(tag) => present_tag_change(TagField::Title, tag, verb),
        PendingChange::Comment(tag) => present_tag_change(TagField::Comment, tag, verb),
        PendingChange::CreationTimestamp(stamp) => format!(
            "  Creation time {verb} from {} to match recorded date: {}",
            stamp
                .old
                .map(|instant| instant.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string()),
            stamp.new.to_rfc3339()
        ),
    }
}

fn present_tag_change(field: TagField, tag: &TagChange, verb: &str) -> String {
    let reason = match field {
        TagField::Album | TagField::Title => "to match tape name",
        TagField::Comment => "to include timecode information",
    };
    format!(
        "  {field} tag {verb} from '{}' {reason}: '{}'",
        tag.old.as_deref().unwrap_or_default(),
        tag.new
    )
}

pub fn present_blocked(blocked: &BlockedOverride) -> String {
    format!(
        "  {} tag will not be updated from '{}' to '{}', use --allow-tag-overrides to override existing tag values.",
        blocked.field, blocked.current, blocked.proposed
    )
}

pub fn present_summary(statistics: &RunStatistics, applied: bool) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Number of matching files found:  {}",
            statistics.files_checked
        ),
        format!(
            "Number of file tags changed:     {} files {} tags",
            statistics.files_with_tag_changes, statistics.tags_changed
        ),
        format!(
            "Number of creation dates set:    {}",
            statistics.creation_dates_changed
        ),
    ];
    if statistics.files_failed > 0 {
        lines.push(format!(
            "Number of files with errors:     {}",
            statistics.files_failed
        ));
    }
    if applied {
        lines.push(format!(
            "Number of files with tags saved: {}",
            statistics.files_saved_with_tags
        ));
        lines.push(format!(
            "Number of files with date saved: {}",
            statistics.files_saved_with_date
        ));
    } else {
        lines.push(
            "** No file updates performed: use -u/--perform-update to actually apply file updates."
                .to_string(),
        );
    }
    lines
}

pub fn present_report_json(report: &FileReport) -> String {
    json!({
        "path": report.path.to_string_lossy(),
        "metadata": report.metadata,
        "recorded_utc": report.reconciliation.recorded_utc,
        "changes": report.reconciliation.changes,
        "blocked": report.reconciliation.blocked,
        "tags_writable": report.tags.as_ref().map(|tags| tags.writable),
        "tag_read_error": report.tag_read_error,
        "tags_saved": report.outcome.tags_saved,
        "date_saved": report.outcome.date_saved,
        "errors": report.outcome.errors,
        "failure": report.failure,
    })
    .to_string()
}

pub fn present_statistics_json(statistics: &RunStatistics) -> String {
    json!({ "statistics": statistics }).to_string()
}
