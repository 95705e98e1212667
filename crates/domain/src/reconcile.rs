use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metadata::CaptureMetadata;
use crate::stats::RunStatistics;
use crate::zone::ZoneTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagField {
    Album,
    Title,
    Comment,
}

impl TagField {
    pub const ALL: [TagField; 3] = [TagField::Album, TagField::Title, TagField::Comment];

    fn current(self, state: &ExistingFileState) -> Option<&str> {
        match self {
            Self::Album => state.album.as_deref(),
            Self::Title => state.title.as_deref(),
            Self::Comment => state.comment.as_deref(),
        }
    }

    fn derived(self, metadata: &CaptureMetadata) -> Option<String> {
        match self {
            Self::Album => metadata.album().map(str::to_string),
            Self::Title => metadata.title().map(str::to_string),
            Self::Comment => metadata.comment(),
        }
    }

    fn pending(self, change: TagChange) -> PendingChange {
        match self {
            Self::Album => PendingChange::Album(change),
            Self::Title => PendingChange::Title(change),
            Self::Comment => PendingChange::Comment(change),
        }
    }
}

impl Display for TagField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Album => write!(f, "Album"),
            Self::Title => write!(f, "Title"),
            Self::Comment => write!(f, "Comment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
    Album,
    Title,
    Comment,
    CreationTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChange {
    pub old: Option<String>,
    pub new: String,
    /// The old value was non-blank and is being replaced.
    pub overrides_existing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimestampChange {
    pub old: Option<DateTime<Utc>>,
    pub new: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum PendingChange {
    Album(TagChange),
    Title(TagChange),
    Comment(TagChange),
    CreationTimestamp(TimestampChange),
}

impl PendingChange {
    pub fn field(&self) -> ChangeField {
        match self {
            Self::Album(_) => ChangeField::Album,
            Self::Title(_) => ChangeField::Title,
            Self::Comment(_) => ChangeField::Comment,
            Self::CreationTimestamp(_) => ChangeField::CreationTimestamp,
        }
    }

    pub fn tag_change(&self) -> Option<(TagField, &TagChange)> {
        match self {
            Self::Album(change) => Some((TagField::Album, change)),
            Self::Title(change) => Some((TagField::Title, change)),
            Self::Comment(change) => Some((TagField::Comment, change)),
            Self::CreationTimestamp(_) => None,
        }
    }
}

/// An existing tag value left in place because overrides are disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedOverride {
    pub field: TagField,
    pub current: String,
    pub proposed: String,
}

/// What a file looks like right now, as read by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingFileState {
    /// File name without directory or extension; used for zone selection.
    pub file_name: String,
    pub album: Option<String>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl ExistingFileState {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// The state after every change has been written.
    pub fn with_changes_applied(&self, changes: &[PendingChange]) -> Self {
        let mut next = self.clone();
        for change in changes {
            match change {
                PendingChange::Album(tag) => next.album = Some(tag.new.clone()),
                PendingChange::Title(tag) => next.title = Some(tag.new.clone()),
                PendingChange::Comment(tag) => next.comment = Some(tag.new.clone()),
                PendingChange::CreationTimestamp(stamp) => next.created = Some(stamp.new),
            }
        }
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub changes: Vec<PendingChange>,
    pub blocked: Vec<BlockedOverride>,
    pub recorded_utc: Option<DateTime<Utc>>,
    pub delta: RunStatistics,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn tag_changes(&self) -> impl Iterator<Item = (TagField, &TagChange)> + '_ {
        self.changes.iter().filter_map(PendingChange::tag_change)
    }

    pub fn has_tag_changes(&self) -> bool {
        self.tag_changes().next().is_some()
    }

    pub fn creation_change(&self) -> Option<&TimestampChange> {
        self.changes.iter().find_map(|change| match change {
            PendingChange::CreationTimestamp(stamp) => Some(stamp),
            _ => None,
        })
    }

    fn merge(&mut self, other: Reconciliation) {
        self.changes.extend(other.changes);
        self.blocked.extend(other.blocked);
        self.recorded_utc = self.recorded_utc.or(other.recorded_utc);
        self.delta.record(&other.delta);
    }
}

/// Decides which tag and timestamp writes bring a file in line with its
/// capture metadata. Performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPolicy {
    zones: ZoneTable,
    allow_override: bool,
}

impl ReconciliationPolicy {
    pub fn new(zones: ZoneTable, allow_override: bool) -> Self {
        Self {
            zones,
            allow_override,
        }
    }

    pub fn allow_override(&self) -> bool {
        self.allow_override
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn recorded_utc(
        &self,
        file_name: &str,
        derived: &CaptureMetadata,
    ) -> Option<DateTime<Utc>> {
        let recorded = derived.recorded_date?;
        self.zones
            .to_utc(recorded, derived.tape_name.as_deref(), file_name)
    }

    pub fn reconcile(
        &self,
        current: &ExistingFileState,
        derived: &CaptureMetadata,
    ) -> Reconciliation {
        let mut outcome = self.reconcile_tags(current, derived);
        outcome.merge(self.reconcile_creation(current, derived));
        outcome
    }

    pub fn reconcile_tags(
        &self,
        current: &ExistingFileState,
        derived: &CaptureMetadata,
    ) -> Reconciliation {
        let mut outcome = Reconciliation::default();

        for field in TagField::ALL {
            let Some(proposed) = field.derived(derived) else {
                continue;
            };
            let existing = field.current(current).unwrap_or_default();
            if existing == proposed {
                continue;
            }

            let occupied = !existing.trim().is_empty();
            if occupied && !self.allow_override {
                outcome.blocked.push(BlockedOverride {
                    field,
                    current: existing.to_string(),
                    proposed,
                });
                continue;
            }

            outcome.changes.push(field.pending(TagChange {
                old: field.current(current).map(str::to_string),
                new: proposed,
                overrides_existing: occupied,
            }));
            outcome.delta.tags_changed += 1;
        }

        if outcome.delta.tags_changed > 0 {
            outcome.delta.files_with_tag_changes = 1;
        }
        outcome
    }

    pub fn reconcile_creation(
        &self,
        current: &ExistingFileState,
        derived: &CaptureMetadata,
    ) -> Reconciliation {
        let mut outcome = Reconciliation {
            recorded_utc: self.recorded_utc(&current.file_name, derived),
            ..Reconciliation::default()
        };

        if let Some(recorded) = outcome.recorded_utc {
            if current.created != Some(recorded) {
                outcome
                    .changes
                    .push(PendingChange::CreationTimestamp(TimestampChange {
                        old: current.created,
                        new: recorded,
                    }));
                outcome.delta.creation_dates_changed = 1;
            }
        }
        outcome
    }
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self::new(ZoneTable::capture_regions(), false)
    }
}
