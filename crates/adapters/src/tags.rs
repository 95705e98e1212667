use std::path::Path;

use dvtag_application::{ApplicationError, FileTags, TagStore};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use tracing::debug;

use crate::riff::RiffInfoTagStore;

/// Routes AVI captures to their RIFF INFO chunk and every other container
/// through lofty.
#[derive(Debug, Default)]
pub struct ContainerTagStore {
    riff: RiffInfoTagStore,
    lofty: LoftyTagStore,
}

impl ContainerTagStore {
    fn store_for(&self, path: &Path) -> &dyn TagStore {
        let is_avi = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("avi"));
        if is_avi {
            &self.riff
        } else {
            &self.lofty
        }
    }
}

impl TagStore for ContainerTagStore {
    fn read_tags(&self, path: &Path) -> Result<FileTags, ApplicationError> {
        self.store_for(path).read_tags(path)
    }

    fn save_tags(&self, path: &Path, tags: &FileTags) -> Result<(), ApplicationError> {
        self.store_for(path).save_tags(path, tags)
    }
}

/// Tag access through lofty. Reads the primary tag (or the first tag present)
/// and writes into the primary tag, creating it when the file has none.
#[derive(Debug, Default)]
pub struct LoftyTagStore;

impl TagStore for LoftyTagStore {
    fn read_tags(&self, path: &Path) -> Result<FileTags, ApplicationError> {
        let tagged_file = open_tagged(path)?;
        let writable = is_writable(path)?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());
        let tags = FileTags {
            album: tag.and_then(|tag| tag.album()).map(|value| value.to_string()),
            title: tag.and_then(|tag| tag.title()).map(|value| value.to_string()),
            comment: tag.and_then(|tag| tag.comment()).map(|value| value.to_string()),
            writable,
        };

        debug!(
            path = %path.display(),
            album = ?tags.album,
            title = ?tags.title,
            comment = ?tags.comment,
            writable,
            "read tags"
        );
        Ok(tags)
    }

    fn save_tags(&self, path: &Path, tags: &FileTags) -> Result<(), ApplicationError> {
        let mut tagged_file = open_tagged(path)?;
        if tagged_file.primary_tag().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let tag = tagged_file.primary_tag_mut().ok_or_else(|| {
            ApplicationError::Tags(format!("no writable tag in {}", path.display()))
        })?;
        if let Some(album) = &tags.album {
            tag.set_album(album.clone());
        }
        if let Some(title) = &tags.title {
            tag.set_title(title.clone());
        }
        if let Some(comment) = &tags.comment {
            tag.set_comment(comment.clone());
        }

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|error| ApplicationError::Tags(format!("{}: {error}", path.display())))
    }
}

pub(crate) fn is_writable(path: &Path) -> Result<bool, ApplicationError> {
    let metadata = path
        .metadata()
        .map_err(|error| ApplicationError::Io(format!("{}: {error}", path.display())))?;
    Ok(!metadata.permissions().readonly())
}

fn open_tagged(path: &Path) -> Result<TaggedFile, ApplicationError> {
    let tag_error = |error: &dyn std::fmt::Display| {
        ApplicationError::Tags(format!("{}: {error}", path.display()))
    };
    Probe::open(path)
        .map_err(|error| tag_error(&error))?
        .guess_file_type()
        .map_err(|error| tag_error(&error))?
        .read()
        .map_err(|error| tag_error(&error))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// Half a second of 8 kHz mono 16-bit silence.
    fn silent_wav() -> Vec<u8> {
        let data_len: u32 = 8000;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16_u32.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&8000_u32.to_le_bytes());
        bytes.extend_from_slice(&16000_u32.to_le_bytes());
        bytes.extend_from_slice(&2_u16.to_le_bytes());
        bytes.extend_from_slice(&16_u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        bytes
    }

    #[test]
    fn untagged_file_reads_as_empty_and_writable() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clip.wav");
        fs::write(&path, silent_wav()).expect("write");

        let tags = LoftyTagStore.read_tags(&path).expect("read tags");

        assert_eq!(
            tags,
            FileTags {
                writable: true,
                ..FileTags::default()
            }
        );
    }

    #[test]
    fn saved_tags_read_back() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clip.wav");
        fs::write(&path, silent_wav()).expect("write");

        let updated = FileTags {
            album: Some("VIC001".to_string()),
            title: Some("VIC001".to_string()),
            comment: Some("00:00:00:13 - 00:00:01:13".to_string()),
            writable: true,
        };
        LoftyTagStore.save_tags(&path, &updated).expect("save tags");

        assert_eq!(LoftyTagStore.read_tags(&path).expect("read tags"), updated);
    }

    /// `RIFF AVI ` with an empty `hdrl` list and nothing else.
    fn bare_avi() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&16_u32.to_le_bytes());
        bytes.extend_from_slice(b"AVI ");
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&4_u32.to_le_bytes());
        bytes.extend_from_slice(b"hdrl");
        bytes
    }

    #[test]
    fn avi_captures_are_tagged_through_riff_info() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("VIC001.AVI");
        fs::write(&path, bare_avi()).expect("write");
        let store = ContainerTagStore::default();

        assert_eq!(
            store.read_tags(&path).expect("read tags"),
            FileTags {
                writable: true,
                ..FileTags::default()
            }
        );

        let updated = FileTags {
            album: Some("VIC001".to_string()),
            title: Some("VIC001".to_string()),
            comment: Some("00:00:00:13 - 00:00:01:13".to_string()),
            writable: true,
        };
        store.save_tags(&path, &updated).expect("save tags");
        assert_eq!(store.read_tags(&path).expect("read tags"), updated);
    }

    #[test]
    fn other_containers_go_through_lofty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("clip.wav");
        fs::write(&path, silent_wav()).expect("write");

        let store = ContainerTagStore::default();
        assert!(store.read_tags(&path).is_ok());
    }

    #[test]
    fn unrecognized_container_is_a_tag_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("notes.avi");
        fs::write(&path, b"not a media file").expect("write");

        let result = LoftyTagStore.read_tags(&path);
        assert!(matches!(result, Err(ApplicationError::Tags(_))));
    }
}
