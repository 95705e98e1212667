use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use dvtag_application::{ApplicationError, CreationTimeStore};

#[derive(Debug, Default)]
pub struct FsCreationTimeStore;

impl CreationTimeStore for FsCreationTimeStore {
    fn creation_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>, ApplicationError> {
        let metadata = path
            .metadata()
            .map_err(|error| ApplicationError::Io(format!("{}: {error}", path.display())))?;
        match metadata.created() {
            Ok(created) => Ok(Some(DateTime::<Utc>::from(created))),
            Err(error) if error.kind() == ErrorKind::Unsupported => Ok(None),
            Err(error) => Err(ApplicationError::Io(format!(
                "{}: {error}",
                path.display()
            ))),
        }
    }

    fn set_creation_time(
        &self,
        path: &Path,
        instant: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        write_created(path, SystemTime::from(instant))
    }
}

#[cfg(any(windows, target_os = "macos"))]
fn write_created(path: &Path, created: SystemTime) -> Result<(), ApplicationError> {
    use std::fs::{File, FileTimes};
    #[cfg(target_os = "macos")]
    use std::os::macos::fs::FileTimesExt;
    #[cfg(windows)]
    use std::os::windows::fs::FileTimesExt;

    let io_error = |error: std::io::Error| ApplicationError::Io(format!("{}: {error}", path.display()));
    let file = File::options().write(true).open(path).map_err(io_error)?;
    file.set_times(FileTimes::new().set_created(created))
        .map_err(io_error)
}

#[cfg(not(any(windows, target_os = "macos")))]
fn write_created(path: &Path, _created: SystemTime) -> Result<(), ApplicationError> {
    Err(ApplicationError::Unsupported(format!(
        "creation time cannot be set on this platform: {}",
        path.display()
    )))
}
