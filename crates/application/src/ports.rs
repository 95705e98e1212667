use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dvtag_domain::{ExistingFileState, TagField};

use crate::ApplicationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub folder: PathBuf,
    /// Glob matched against file names, e.g. `*.avi`.
    pub pattern: String,
    pub recursive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FileScanSummary {
    pub scanned_files: usize,
    pub matched_files: usize,
    /// Matching files in lexicographic path order.
    pub files: Vec<PathBuf>,
}

pub trait FileScanner {
    fn scan(&self, request: &ScanRequest) -> Result<FileScanSummary, ApplicationError>;
}

/// Produces the free-text technical report for a media file.
pub trait MediaProber {
    fn probe_report(&self, path: &Path) -> Result<String, ApplicationError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTags {
    pub album: Option<String>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub writable: bool,
}

impl FileTags {
    pub fn set(&mut self, field: TagField, value: String) {
        match field {
            TagField::Album => self.album = Some(value),
            TagField::Title => self.title = Some(value),
            TagField::Comment => self.comment = Some(value),
        }
    }

    pub fn to_file_state(
        &self,
        file_name: &str,
        created: Option<DateTime<Utc>>,
    ) -> ExistingFileState {
        ExistingFileState {
            file_name: file_name.to_string(),
            album: self.album.clone(),
            title: self.title.clone(),
            comment: self.comment.clone(),
            created,
        }
    }
}

pub trait TagStore {
    fn read_tags(&self, path: &Path) -> Result<FileTags, ApplicationError>;

    fn save_tags(&self, path: &Path, tags: &FileTags) -> Result<(), ApplicationError>;
}

pub trait CreationTimeStore {
    /// `None` when the platform or filesystem does not record a creation time.
    fn creation_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>, ApplicationError>;

    fn set_creation_time(&self, path: &Path, instant: DateTime<Utc>)
        -> Result<(), ApplicationError>;
}
