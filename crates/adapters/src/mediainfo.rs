use std::path::{Path, PathBuf};
use std::process::Command;

use dvtag_application::{ApplicationError, MediaProber};
use tracing::debug;

/// Runs the `mediainfo` command line tool and returns its text report.
#[derive(Debug, Clone)]
pub struct MediaInfoCliProber {
    binary: PathBuf,
}

impl MediaInfoCliProber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for MediaInfoCliProber {
    fn default() -> Self {
        Self::new("mediainfo")
    }
}

impl MediaProber for MediaInfoCliProber {
    fn probe_report(&self, path: &Path) -> Result<String, ApplicationError> {
        let output = Command::new(&self.binary)
            .arg(path)
            .output()
            .map_err(|error| {
                ApplicationError::Probe(format!(
                    "failed to execute {}: {error}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApplicationError::Probe(format!(
                "{} failed for {}: {}",
                self.binary.display(),
                path.display(),
                stderr.trim()
            )));
        }

        let report = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(path = %path.display(), bytes = report.len(), "probe report received");
        Ok(report)
    }
}
