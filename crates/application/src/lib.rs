mod error;
mod ports;
mod service;
mod use_cases;

pub use error::ApplicationError;
pub use ports::{
    CreationTimeStore, FileScanSummary, FileScanner, FileTags, MediaProber, ScanRequest, TagStore,
};
pub use service::{ApplyOutcome, CaptureTagService, FileReport};
pub use use_cases::TagFolderCommand;
