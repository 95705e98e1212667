use dvtag_application::{ApplicationError, FileScanSummary, FileScanner, ScanRequest};
use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct WalkdirFileScanner;

impl FileScanner for WalkdirFileScanner {
    fn scan(&self, request: &ScanRequest) -> Result<FileScanSummary, ApplicationError> {
        let folder_path = request.folder.as_path();
        if !folder_path.is_dir() {
            return Err(ApplicationError::InvalidInput(format!(
                "folder does not exist or is not a directory: {}",
                folder_path.display()
            )));
        }

        let matcher = GlobBuilder::new(&request.pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|error| {
                ApplicationError::InvalidInput(format!("invalid file pattern: {error}"))
            })?
            .compile_matcher();

        let mut walker = WalkDir::new(folder_path).min_depth(1);
        if !request.recursive {
            walker = walker.max_depth(1);
        }

        let mut summary = FileScanSummary::default();

        // Entries we cannot read are skipped, not fatal.
        for entry in walker.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }

            summary.scanned_files += 1;
            if !matcher.is_match(entry.file_name()) {
                continue;
            }

            summary.matched_files += 1;
            summary.files.push(entry.into_path());
        }

        summary.files.sort();
        debug!(
            folder = %folder_path.display(),
            scanned = summary.scanned_files,
            matched = summary.matched_files,
            "folder scanned"
        );
        Ok(summary)
    }
}
