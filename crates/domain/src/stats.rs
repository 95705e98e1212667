use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Batch counters. Also used as the per-file delta folded into the batch total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub files_checked: u32,
    pub tags_changed: u32,
    pub files_with_tag_changes: u32,
    pub creation_dates_changed: u32,
    pub files_saved_with_tags: u32,
    pub files_saved_with_date: u32,
    pub files_failed: u32,
}

impl RunStatistics {
    pub fn record(&mut self, delta: &RunStatistics) {
        self.files_checked += delta.files_checked;
        self.tags_changed += delta.tags_changed;
        self.files_with_tag_changes += delta.files_with_tag_changes;
        self.creation_dates_changed += delta.creation_dates_changed;
        self.files_saved_with_tags += delta.files_saved_with_tags;
        self.files_saved_with_date += delta.files_saved_with_date;
        self.files_failed += delta.files_failed;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.record(&rhs);
    }
}
