use std::path::{Path, PathBuf};

use dvtag_domain::{
    CaptureMetadata, ExistingFileState, Reconciliation, ReconciliationPolicy, ReportParser,
    RunStatistics, ZoneTable,
};
use tracing::{debug, info, warn};

use crate::{
    ApplicationError, CreationTimeStore, FileScanner, FileTags, MediaProber, ScanRequest,
    TagFolderCommand, TagStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub tags_saved: bool,
    pub date_saved: bool,
    /// Tag changes were due but the container cannot be written.
    pub tags_unwritable: bool,
    pub errors: Vec<String>,
}

/// Everything known about one file after it has been processed.
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    pub metadata: Option<CaptureMetadata>,
    /// Tag values as found, before any write.
    pub tags: Option<FileTags>,
    pub tag_read_error: Option<String>,
    pub reconciliation: Reconciliation,
    pub outcome: ApplyOutcome,
    /// Set when the file could not be probed at all.
    pub failure: Option<String>,
}

impl FileReport {
    fn failed(path: &Path, error: ApplicationError) -> Self {
        Self {
            path: path.to_path_buf(),
            failure: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some() || !self.outcome.errors.is_empty()
    }

    pub fn delta(&self) -> RunStatistics {
        let mut delta = self.reconciliation.delta;
        delta.files_checked = 1;
        delta.files_saved_with_tags = u32::from(self.outcome.tags_saved);
        delta.files_saved_with_date = u32::from(self.outcome.date_saved);
        delta.files_failed = u32::from(self.is_failed());
        delta
    }
}

pub struct CaptureTagService {
    scanner: Box<dyn FileScanner>,
    prober: Box<dyn MediaProber>,
    tags: Box<dyn TagStore>,
    timestamps: Box<dyn CreationTimeStore>,
    parser: ReportParser,
    zones: ZoneTable,
}

impl CaptureTagService {
    pub fn new(
        scanner: Box<dyn FileScanner>,
        prober: Box<dyn MediaProber>,
        tags: Box<dyn TagStore>,
        timestamps: Box<dyn CreationTimeStore>,
        zones: ZoneTable,
    ) -> Self {
        Self {
            scanner,
            prober,
            tags,
            timestamps,
            parser: ReportParser::new(),
            zones,
        }
    }

    /// Reconciles every matching file in path order, handing each report to
    /// `on_file` as soon as it is done. A failing file never stops the batch.
    pub fn tag_folder(
        &self,
        command: TagFolderCommand,
        on_file: &mut dyn FnMut(&FileReport),
    ) -> Result<RunStatistics, ApplicationError> {
        if command.folder.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "folder path must not be empty".to_string(),
            ));
        }
        if command.pattern.trim().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "file pattern must not be empty".to_string(),
            ));
        }

        let scan = self.scanner.scan(&ScanRequest {
            folder: command.folder.clone(),
            pattern: command.pattern.clone(),
            recursive: command.recursive,
        })?;
        info!(
            folder = %command.folder.display(),
            scanned = scan.scanned_files,
            matched = scan.matched_files,
            apply = command.apply,
            "scan finished"
        );

        let policy = ReconciliationPolicy::new(self.zones.clone(), command.allow_override);
        let mut statistics = RunStatistics::default();
        for path in &scan.files {
            let report = self.process_file(path, &policy, command.apply);
            statistics.record(&report.delta());
            on_file(&report);
        }

        Ok(statistics)
    }

    pub fn inspect(&self, path: &Path) -> Result<CaptureMetadata, ApplicationError> {
        let report = self.prober.probe_report(path)?;
        Ok(self.parser.parse(&report))
    }

    fn process_file(&self, path: &Path, policy: &ReconciliationPolicy, apply: bool) -> FileReport {
        let metadata = match self.inspect(path) {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(path = %path.display(), %error, "probe failed");
                return FileReport::failed(path, error);
            }
        };
        debug!(path = %path.display(), ?metadata, "parsed capture metadata");

        let file_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let created = self.timestamps.creation_time(path).unwrap_or_else(|error| {
            warn!(path = %path.display(), %error, "creation time unavailable");
            None
        });

        let (tags, tag_read_error) = match self.tags.read_tags(path) {
            Ok(tags) => (Some(tags), None),
            Err(error) => {
                warn!(path = %path.display(), %error, "tags unavailable, only the creation time is reconciled");
                (None, Some(error.to_string()))
            }
        };

        let reconciliation = match &tags {
            Some(tags) => policy.reconcile(&tags.to_file_state(&file_name, created), &metadata),
            None => policy.reconcile_creation(
                &ExistingFileState {
                    created,
                    ..ExistingFileState::new(file_name)
                },
                &metadata,
            ),
        };

        let outcome = if apply {
            self.apply(path, tags.as_ref(), &reconciliation)
        } else {
            ApplyOutcome::default()
        };

        FileReport {
            path: path.to_path_buf(),
            metadata: Some(metadata),
            tags,
            tag_read_error,
            reconciliation,
            outcome,
            failure: None,
        }
    }

    fn apply(
        &self,
        path: &Path,
        tags: Option<&FileTags>,
        reconciliation: &Reconciliation,
    ) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        if let (Some(current), true) = (tags, reconciliation.has_tag_changes()) {
            if current.writable {
                let mut updated = current.clone();
                for (field, change) in reconciliation.tag_changes() {
                    updated.set(field, change.new.clone());
                }
                match self.tags.save_tags(path, &updated) {
                    Ok(()) => {
                        info!(path = %path.display(), "tags saved");
                        outcome.tags_saved = true;
                    }
                    Err(error) => {
                        warn!(path = %path.display(), %error, "saving tags failed");
                        outcome.errors.push(error.to_string());
                    }
                }
            } else {
                warn!(path = %path.display(), "tags are not writable");
                outcome.tags_unwritable = true;
            }
        }

        if let Some(change) = reconciliation.creation_change() {
            match self.timestamps.set_creation_time(path, change.new) {
                Ok(()) => {
                    info!(path = %path.display(), created = %change.new, "creation time saved");
                    outcome.date_saved = true;
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "setting creation time failed");
                    outcome.errors.push(error.to_string());
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use chrono::{DateTime, Utc};
    use dvtag_domain::{BlockedOverride, PendingChange, TagField};

    use super::*;
    use crate::FileScanSummary;

    const CAPTURE_REPORT: &str = "Recorded date : 2020-01-02 10:00:00\n\
        TAPE : VIC001\n\
        TCOD : 5000000\n\
        TCDO : 15000000\n\
        Frame rate : 25.0 FPS\n\
        STAT : 250 0 25.0 0";

    struct FakeScanner {
        files: Vec<PathBuf>,
    }

    impl FileScanner for FakeScanner {
        fn scan(&self, _request: &ScanRequest) -> Result<FileScanSummary, ApplicationError> {
            Ok(FileScanSummary {
                scanned_files: self.files.len(),
                matched_files: self.files.len(),
                files: self.files.clone(),
            })
        }
    }

    struct FakeProber {
        reports: HashMap<PathBuf, String>,
    }

    impl MediaProber for FakeProber {
        fn probe_report(&self, path: &Path) -> Result<String, ApplicationError> {
            self.reports
                .get(path)
                .cloned()
                .ok_or_else(|| ApplicationError::Probe(format!("cannot open {}", path.display())))
        }
    }

    #[derive(Clone, Default)]
    struct FakeTagStore {
        tags: Rc<RefCell<HashMap<PathBuf, FileTags>>>,
        saves: Rc<RefCell<usize>>,
    }

    impl TagStore for FakeTagStore {
        fn read_tags(&self, path: &Path) -> Result<FileTags, ApplicationError> {
            self.tags
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| ApplicationError::Tags("unsupported container".to_string()))
        }

        fn save_tags(&self, path: &Path, tags: &FileTags) -> Result<(), ApplicationError> {
            *self.saves.borrow_mut() += 1;
            self.tags
                .borrow_mut()
                .insert(path.to_path_buf(), tags.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeTimestamps {
        created: Rc<RefCell<HashMap<PathBuf, DateTime<Utc>>>>,
        read_only: bool,
    }

    impl CreationTimeStore for FakeTimestamps {
        fn creation_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>, ApplicationError> {
            Ok(self.created.borrow().get(path).copied())
        }

        fn set_creation_time(
            &self,
            path: &Path,
            instant: DateTime<Utc>,
        ) -> Result<(), ApplicationError> {
            if self.read_only {
                return Err(ApplicationError::Unsupported(
                    "creation time is read-only".to_string(),
                ));
            }
            self.created
                .borrow_mut()
                .insert(path.to_path_buf(), instant);
            Ok(())
        }
    }

    fn writable_tags() -> FileTags {
        FileTags {
            writable: true,
            ..FileTags::default()
        }
    }

    fn build_service(
        reports: &[(&str, &str)],
        tags: &FakeTagStore,
        timestamps: &FakeTimestamps,
    ) -> CaptureTagService {
        let mut files: Vec<PathBuf> = reports.iter().map(|(path, _)| PathBuf::from(path)).collect();
        files.sort();
        CaptureTagService::new(
            Box::new(FakeScanner { files }),
            Box::new(FakeProber {
                reports: reports
                    .iter()
                    .filter(|(_, report)| !report.is_empty())
                    .map(|(path, report)| (PathBuf::from(path), report.to_string()))
                    .collect(),
            }),
            Box::new(tags.clone()),
            Box::new(timestamps.clone()),
            ZoneTable::capture_regions(),
        )
    }

    fn command(apply: bool, allow_override: bool) -> TagFolderCommand {
        TagFolderCommand {
            folder: PathBuf::from("/captures"),
            pattern: "*.avi".to_string(),
            recursive: false,
            apply,
            allow_override,
        }
    }

    fn run(
        service: &CaptureTagService,
        command: TagFolderCommand,
    ) -> (RunStatistics, Vec<FileReport>) {
        let mut reports = Vec::new();
        let statistics = service
            .tag_folder(command, &mut |report: &FileReport| reports.push(report.clone()))
            .expect("batch should run");
        (statistics, reports)
    }

    #[test]
    fn dry_run_reports_changes_without_writing() {
        let tags = FakeTagStore::default();
        tags.tags
            .borrow_mut()
            .insert(PathBuf::from("/captures/a.avi"), writable_tags());
        let timestamps = FakeTimestamps::default();
        let service = build_service(&[("/captures/a.avi", CAPTURE_REPORT)], &tags, &timestamps);

        let (statistics, reports) = run(&service, command(false, false));

        assert_eq!(
            statistics,
            RunStatistics {
                files_checked: 1,
                tags_changed: 3,
                files_with_tag_changes: 1,
                creation_dates_changed: 1,
                ..RunStatistics::default()
            }
        );
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].reconciliation.changes.len(), 4);
        assert_eq!(reports[0].outcome, ApplyOutcome::default());
        assert_eq!(*tags.saves.borrow(), 0);
        assert!(timestamps.created.borrow().is_empty());
    }

    #[test]
    fn apply_writes_once_and_second_run_is_quiet() {
        let path = PathBuf::from("/captures/a.avi");
        let tags = FakeTagStore::default();
        tags.tags.borrow_mut().insert(path.clone(), writable_tags());
        let timestamps = FakeTimestamps::default();
        let service = build_service(&[("/captures/a.avi", CAPTURE_REPORT)], &tags, &timestamps);

        let (first, _) = run(&service, command(true, false));
        assert_eq!(first.files_saved_with_tags, 1);
        assert_eq!(first.files_saved_with_date, 1);
        assert_eq!(*tags.saves.borrow(), 1);

        let saved = tags.tags.borrow().get(&path).cloned().expect("saved tags");
        assert_eq!(saved.album.as_deref(), Some("VIC001"));
        assert_eq!(saved.title.as_deref(), Some("VIC001"));
        assert_eq!(saved.comment.as_deref(), Some("00:00:00:13 - 00:00:01:13"));
        assert_eq!(
            timestamps
                .created
                .borrow()
                .get(&path)
                .map(|instant| instant.to_rfc3339()),
            Some("2020-01-01T23:00:00+00:00".to_string())
        );

        let (second, reports) = run(&service, command(true, false));
        assert_eq!(
            second,
            RunStatistics {
                files_checked: 1,
                ..RunStatistics::default()
            }
        );
        assert!(reports[0].reconciliation.is_noop());
        assert_eq!(*tags.saves.borrow(), 1);
    }

    #[test]
    fn blocked_override_is_reported_and_not_written() {
        let path = PathBuf::from("/captures/a.avi");
        let tags = FakeTagStore::default();
        tags.tags.borrow_mut().insert(
            path.clone(),
            FileTags {
                album: Some("Existing".to_string()),
                title: Some("Existing".to_string()),
                comment: Some("Existing".to_string()),
                writable: true,
            },
        );
        let timestamps = FakeTimestamps::default();
        let service = build_service(&[("/captures/a.avi", "TAPE : New")], &tags, &timestamps);

        let (statistics, reports) = run(&service, command(true, false));

        assert_eq!(statistics.tags_changed, 0);
        assert_eq!(statistics.files_saved_with_tags, 0);
        assert_eq!(
            reports[0].reconciliation.blocked,
            vec![
                BlockedOverride {
                    field: TagField::Album,
                    current: "Existing".to_string(),
                    proposed: "New".to_string(),
                },
                BlockedOverride {
                    field: TagField::Title,
                    current: "Existing".to_string(),
                    proposed: "New".to_string(),
                },
            ]
        );
        assert_eq!(*tags.saves.borrow(), 0);

        let (statistics, _) = run(&service, command(true, true));
        assert_eq!(statistics.tags_changed, 2);
        assert_eq!(statistics.files_saved_with_tags, 1);
    }

    #[test]
    fn failing_probe_does_not_stop_the_batch() {
        let tags = FakeTagStore::default();
        tags.tags
            .borrow_mut()
            .insert(PathBuf::from("/captures/b.avi"), writable_tags());
        let timestamps = FakeTimestamps::default();
        let service = build_service(
            &[("/captures/a.avi", ""), ("/captures/b.avi", "TAPE : SA01")],
            &tags,
            &timestamps,
        );

        let (statistics, reports) = run(&service, command(false, false));

        assert_eq!(statistics.files_checked, 2);
        assert_eq!(statistics.files_failed, 1);
        assert_eq!(statistics.files_with_tag_changes, 1);
        let order: Vec<&Path> = reports.iter().map(|report| report.path.as_path()).collect();
        assert_eq!(
            order,
            vec![Path::new("/captures/a.avi"), Path::new("/captures/b.avi")]
        );
        assert!(reports[0].failure.is_some());
        assert!(reports[0].metadata.is_none());
    }

    #[test]
    fn unreadable_tags_still_reconcile_creation_time() {
        let tags = FakeTagStore::default();
        let timestamps = FakeTimestamps::default();
        let service = build_service(&[("/captures/a.avi", CAPTURE_REPORT)], &tags, &timestamps);

        let (statistics, reports) = run(&service, command(true, false));

        assert!(reports[0].tag_read_error.is_some());
        assert!(matches!(
            reports[0].reconciliation.changes.as_slice(),
            [PendingChange::CreationTimestamp(_)]
        ));
        assert_eq!(statistics.tags_changed, 0);
        assert_eq!(statistics.files_saved_with_date, 1);
        assert_eq!(statistics.files_failed, 0);
    }

    #[test]
    fn unwritable_tags_are_not_saved() {
        let tags = FakeTagStore::default();
        tags.tags
            .borrow_mut()
            .insert(PathBuf::from("/captures/a.avi"), FileTags::default());
        let timestamps = FakeTimestamps {
            read_only: true,
            ..FakeTimestamps::default()
        };
        let service = build_service(&[("/captures/a.avi", CAPTURE_REPORT)], &tags, &timestamps);

        let (statistics, reports) = run(&service, command(true, false));

        assert!(reports[0].outcome.tags_unwritable);
        assert_eq!(reports[0].outcome.errors.len(), 1);
        assert_eq!(statistics.tags_changed, 3);
        assert_eq!(statistics.files_saved_with_tags, 0);
        assert_eq!(statistics.files_saved_with_date, 0);
        assert_eq!(statistics.files_failed, 1);
        assert_eq!(*tags.saves.borrow(), 0);
    }

    #[test]
    fn blank_pattern_is_rejected() {
        let service = build_service(&[], &FakeTagStore::default(), &FakeTimestamps::default());
        let result = service.tag_folder(
            TagFolderCommand {
                pattern: " ".to_string(),
                ..command(false, false)
            },
            &mut |_: &FileReport| {},
        );
        assert!(matches!(result, Err(ApplicationError::InvalidInput(_))));
    }

    #[test]
    fn inspect_parses_the_probe_report() {
        let service = build_service(
            &[("/captures/a.avi", CAPTURE_REPORT)],
            &FakeTagStore::default(),
            &FakeTimestamps::default(),
        );
        let metadata = service
            .inspect(Path::new("/captures/a.avi"))
            .expect("inspect should work");
        assert_eq!(metadata.tape_name.as_deref(), Some("VIC001"));
        assert_eq!(metadata.captured_frames, Some(250));
    }
}
