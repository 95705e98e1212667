use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use dvtag_application::{ApplicationError, FileTags, TagStore};
use tracing::debug;

use crate::tags::is_writable;

const TITLE: [u8; 4] = *b"INAM";
const ALBUM: [u8; 4] = *b"IPRD";
const COMMENT: [u8; 4] = *b"ICMT";

/// Tags held in the `LIST/INFO` chunk of an AVI container: `IPRD` (album),
/// `INAM` (title) and `ICMT` (comment).
///
/// Saving never moves the `movi` data. The new INFO list goes into the space
/// of the old one or of adjacent `JUNK` padding, and is appended to the end of
/// the file only when the file is a single RIFF. A replaced INFO list is
/// retired as `JUNK`.
#[derive(Debug, Default)]
pub struct RiffInfoTagStore;

impl TagStore for RiffInfoTagStore {
    fn read_tags(&self, path: &Path) -> Result<FileTags, ApplicationError> {
        let mut file = File::open(path).map_err(|error| tag_error(path, error))?;
        let layout = RiffLayout::read(&mut file).map_err(|error| tag_error(path, error))?;
        let entries = layout
            .read_info(&mut file)
            .map_err(|error| tag_error(path, error))?;

        let tags = FileTags {
            album: entry_text(&entries, ALBUM),
            title: entry_text(&entries, TITLE),
            comment: entry_text(&entries, COMMENT),
            writable: is_writable(path)?,
        };
        debug!(
            path = %path.display(),
            album = ?tags.album,
            title = ?tags.title,
            comment = ?tags.comment,
            writable = tags.writable,
            "read RIFF INFO tags"
        );
        Ok(tags)
    }

    fn save_tags(&self, path: &Path, tags: &FileTags) -> Result<(), ApplicationError> {
        if tags.album.is_none() && tags.title.is_none() && tags.comment.is_none() {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|error| tag_error(path, error))?;
        let layout = RiffLayout::read(&mut file).map_err(|error| tag_error(path, error))?;

        let mut entries = layout
            .read_info(&mut file)
            .map_err(|error| tag_error(path, error))?;
        set_entry(&mut entries, ALBUM, tags.album.as_deref());
        set_entry(&mut entries, TITLE, tags.title.as_deref());
        set_entry(&mut entries, COMMENT, tags.comment.as_deref());
        let list = encode_info_list(&entries).map_err(|error| tag_error(path, error))?;

        let placement = layout.place(list.len() as u64).ok_or_else(|| {
            ApplicationError::Tags(format!(
                "{}: no room for an INFO list without moving media data",
                path.display()
            ))
        })?;
        layout
            .write(&mut file, placement, &list)
            .map_err(|error| tag_error(path, error))?;
        file.flush().map_err(|error| tag_error(path, error))?;

        debug!(path = %path.display(), ?placement, bytes = list.len(), "saved RIFF INFO tags");
        Ok(())
    }
}

fn tag_error(path: &Path, error: io::Error) -> ApplicationError {
    ApplicationError::Tags(format!("{}: {error}", path.display()))
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn fourcc(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Data size rounded up to the word boundary every chunk is aligned to.
fn padded(size: u64) -> u64 {
    size + (size & 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    id: [u8; 4],
    offset: u64,
    size: u32,
    is_info: bool,
}

impl Chunk {
    fn span(&self) -> u64 {
        8 + padded(u64::from(self.size))
    }

    fn is_junk(&self) -> bool {
        &self.id == b"JUNK"
    }
}

/// A run of adjacent chunks that may be overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeSpan {
    offset: u64,
    len: u64,
    holds_info: bool,
}

impl FreeSpan {
    /// Exact fit, or enough left over for a `JUNK` header.
    fn fits(&self, needed: u64) -> bool {
        self.len == needed || self.len >= needed + 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    InPlace(FreeSpan),
    Append { offset: u64 },
}

/// Top-level chunks of the first RIFF in the file.
#[derive(Debug)]
struct RiffLayout {
    chunks: Vec<Chunk>,
    riff_end: u64,
    file_len: u64,
}

impl RiffLayout {
    fn read(file: &mut File) -> io::Result<Self> {
        let file_len = file.metadata()?.len();
        let mut header = [0_u8; 12];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;
        if &header[0..4] != b"RIFF" || &header[8..12] != b"AVI " {
            return Err(invalid("not an AVI RIFF container"));
        }
        let riff_end = (8 + u64::from(le_u32(&header[4..8]))).min(file_len);

        let mut chunks = Vec::new();
        let mut offset = 12;
        while offset + 8 <= riff_end {
            let mut chunk_header = [0_u8; 12];
            file.seek(SeekFrom::Start(offset))?;
            let available = (riff_end - offset).min(12) as usize;
            file.read_exact(&mut chunk_header[..available])?;

            let id = fourcc(&chunk_header[0..4]);
            let size = le_u32(&chunk_header[4..8]);
            let is_info = &id == b"LIST"
                && size >= 4
                && available == 12
                && &chunk_header[8..12] == b"INFO"
                && !chunks.iter().any(|chunk: &Chunk| chunk.is_info);
            let chunk = Chunk {
                id,
                offset,
                size,
                is_info,
            };
            chunks.push(chunk);
            offset += chunk.span();
        }

        Ok(Self {
            chunks,
            riff_end,
            file_len,
        })
    }

    fn info(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.is_info)
    }

    fn read_info(&self, file: &mut File) -> io::Result<Vec<InfoEntry>> {
        let Some(info) = self.info() else {
            return Ok(Vec::new());
        };
        if info.offset + 8 + u64::from(info.size) > self.file_len {
            return Err(invalid("truncated INFO list"));
        }
        let mut payload = vec![0_u8; info.size as usize];
        file.seek(SeekFrom::Start(info.offset + 8))?;
        file.read_exact(&mut payload)?;
        Ok(parse_info_entries(&payload[4..]))
    }

    fn free_spans(&self) -> Vec<FreeSpan> {
        let mut spans = Vec::new();
        let mut current: Option<FreeSpan> = None;
        for chunk in &self.chunks {
            let reusable =
                (chunk.is_info || chunk.is_junk()) && chunk.offset + chunk.span() <= self.riff_end;
            if reusable {
                let span = current.get_or_insert(FreeSpan {
                    offset: chunk.offset,
                    len: 0,
                    holds_info: false,
                });
                span.len += chunk.span();
                span.holds_info |= chunk.is_info;
            } else if let Some(span) = current.take() {
                spans.push(span);
            }
        }
        spans.extend(current);
        spans
    }

    fn place(&self, needed: u64) -> Option<Placement> {
        let spans = self.free_spans();
        let fitting = spans
            .iter()
            .filter(|span| span.fits(needed))
            .max_by_key(|span| span.holds_info)
            .copied();
        if let Some(span) = fitting {
            return Some(Placement::InPlace(span));
        }
        (self.riff_end == self.file_len).then(|| Placement::Append {
            offset: padded(self.riff_end),
        })
    }

    fn write(&self, file: &mut File, placement: Placement, list: &[u8]) -> io::Result<()> {
        let retire_old = match placement {
            Placement::InPlace(span) => {
                file.seek(SeekFrom::Start(span.offset))?;
                file.write_all(list)?;
                let remaining = span.len - list.len() as u64;
                if remaining > 0 {
                    let junk_size = u32::try_from(remaining - 8)
                        .map_err(|_| invalid("JUNK padding exceeds chunk size limit"))?;
                    file.write_all(b"JUNK")?;
                    file.write_all(&junk_size.to_le_bytes())?;
                    io::copy(&mut io::repeat(0).take(u64::from(junk_size)), file)?;
                }
                !span.holds_info
            }
            Placement::Append { offset } => {
                let riff_size = u32::try_from(offset + list.len() as u64 - 8)
                    .map_err(|_| invalid("RIFF size limit reached"))?;
                file.set_len(offset)?;
                file.seek(SeekFrom::Start(offset))?;
                file.write_all(list)?;
                file.seek(SeekFrom::Start(4))?;
                file.write_all(&riff_size.to_le_bytes())?;
                true
            }
        };

        if retire_old {
            if let Some(info) = self.info() {
                file.seek(SeekFrom::Start(info.offset))?;
                file.write_all(b"JUNK")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InfoEntry {
    id: [u8; 4],
    data: Vec<u8>,
}

fn parse_info_entries(mut bytes: &[u8]) -> Vec<InfoEntry> {
    let mut entries = Vec::new();
    while bytes.len() >= 8 {
        let id = fourcc(&bytes[0..4]);
        let size = le_u32(&bytes[4..8]) as usize;
        let data_end = size.saturating_add(8).min(bytes.len());
        entries.push(InfoEntry {
            id,
            data: bytes[8..data_end].to_vec(),
        });
        let next = size.saturating_add(8).saturating_add(size & 1);
        bytes = bytes.get(next..).unwrap_or(&[]);
    }
    entries
}

fn entry_text(entries: &[InfoEntry], id: [u8; 4]) -> Option<String> {
    let entry = entries.iter().find(|entry| entry.id == id)?;
    let end = entry
        .data
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(entry.data.len());
    let text = String::from_utf8_lossy(&entry.data[..end]).into_owned();
    (!text.is_empty()).then_some(text)
}

fn set_entry(entries: &mut Vec<InfoEntry>, id: [u8; 4], value: Option<&str>) {
    let Some(value) = value else {
        return;
    };
    let mut data = value.as_bytes().to_vec();
    data.push(0);
    match entries.iter_mut().find(|entry| entry.id == id) {
        Some(entry) => entry.data = data,
        None => entries.push(InfoEntry { id, data }),
    }
}

fn encode_info_list(entries: &[InfoEntry]) -> io::Result<Vec<u8>> {
    let mut payload = b"INFO".to_vec();
    for entry in entries {
        let size =
            u32::try_from(entry.data.len()).map_err(|_| invalid("INFO value too large"))?;
        payload.extend_from_slice(&entry.id);
        payload.extend_from_slice(&size.to_le_bytes());
        payload.extend_from_slice(&entry.data);
        if entry.data.len() % 2 == 1 {
            payload.push(0);
        }
    }
    let size = u32::try_from(payload.len()).map_err(|_| invalid("INFO list too large"))?;

    let mut list = Vec::with_capacity(payload.len() + 8);
    list.extend_from_slice(b"LIST");
    list.extend_from_slice(&size.to_le_bytes());
    list.extend_from_slice(&payload);
    Ok(list)
}
