use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::DatabaseError;

/// The sidecar file extensions: summary header, comment offsets, sequence offsets.
const HEADER_EXT: &str = "hdr";
const COMMENT_EXT: &str = "cmo";
const SEQUENCE_EXT: &str = "sqo";
const HEADER_LEN: usize = 12;

/// The index record for one database entry. Offsets are byte positions into the FASTA file
/// and strictly increase with the serial number.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DatabaseEntry {
    /// The zero based serial number of the entry.
    pub serial: u32,
    /// The byte offset of the `>` starting the comment line.
    pub comment_offset: u64,
    /// The byte offset of the first sequence byte, one past the comment line.
    pub sequence_offset: u64,
}

#[derive(Clone, Copy, Debug, Default)]
struct Header {
    entry_count: u32,
    max_comment_len: u32,
    max_sequence_len: u32,
}

impl Header {
    fn parse(bytes: &[u8], path: &Path) -> Result<Self, DatabaseError> {
        if bytes.len() != HEADER_LEN {
            return Err(DatabaseError::corrupt(
                path,
                format!("header is {} bytes, expected {HEADER_LEN}", bytes.len()),
            ));
        }
        let field = |i: usize| {
            u32::from_le_bytes(
                bytes[i * 4..i * 4 + 4]
                    .try_into()
                    .expect("the header length was validated"),
            )
        };
        Ok(Self {
            entry_count: field(0),
            max_comment_len: field(1),
            max_sequence_len: field(2),
        })
    }
}

/// The random access index over a FASTA file: a read only memory map of the raw bytes plus
/// the persisted offset arrays. Building happens once, on the first open; every later open
/// maps the existing sidecar files without rescanning the FASTA.
#[derive(Debug)]
pub struct SequenceIndex {
    path: PathBuf,
    /// `None` for a zero length FASTA file, which is a valid empty database.
    data: Option<Mmap>,
    header: Header,
    /// `None` when the database has no entries.
    comment_offsets: Option<Mmap>,
    sequence_offsets: Option<Mmap>,
}

/// `database.fasta` gets sidecars `database.fasta.hdr` and friends.
fn sidecar(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Memory map a file read only, `None` for an empty file (zero length maps are rejected by
/// the OS).
fn map_file(path: &Path) -> Result<Option<Mmap>, DatabaseError> {
    let file = File::open(path).map_err(|e| DatabaseError::io(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| DatabaseError::io(path, e))?
        .len();
    if len == 0 {
        return Ok(None);
    }
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| DatabaseError::io(path, e))?;
    Ok(Some(mmap))
}

fn offset_at(offsets: &[u8], index: usize) -> u64 {
    u64::from_le_bytes(
        offsets[index * 8..index * 8 + 8]
            .try_into()
            .expect("the offset file length was validated"),
    )
}

impl SequenceIndex {
    /// Open the index for the given FASTA file. When the sidecar files are missing or stale
    /// and `build_if_missing` is set they are rebuilt, otherwise opening fails. Building
    /// writes temp files and publishes them with an atomic rename, so a crashed or racing
    /// builder can never leave a torn index behind.
    pub fn open(path: impl AsRef<Path>, build_if_missing: bool) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let data = map_file(path)?;
        let bytes = data.as_deref().map_or(&[][..], |m| &m[..]);

        match Self::load(path, bytes) {
            Ok((header, comment_offsets, sequence_offsets)) => Ok(Self {
                path: path.to_path_buf(),
                data,
                header,
                comment_offsets,
                sequence_offsets,
            }),
            Err(error) if build_if_missing => {
                log::debug!("rebuilding index for {}: {error}", path.display());
                build(path, bytes)?;
                let (header, comment_offsets, sequence_offsets) = Self::load(path, bytes)?;
                Ok(Self {
                    path: path.to_path_buf(),
                    data,
                    header,
                    comment_offsets,
                    sequence_offsets,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Map and validate the sidecar files.
    fn load(
        path: &Path,
        data: &[u8],
    ) -> Result<(Header, Option<Mmap>, Option<Mmap>), DatabaseError> {
        let header_path = sidecar(path, HEADER_EXT);
        let header_map = map_file(&header_path)?;
        let header = Header::parse(
            header_map.as_deref().map_or(&[][..], |m| &m[..]),
            &header_path,
        )?;
        let count = header.entry_count as usize;

        let comment_offsets = map_file(&sidecar(path, COMMENT_EXT))?;
        let sequence_offsets = map_file(&sidecar(path, SEQUENCE_EXT))?;
        for (map, extension) in [(&comment_offsets, COMMENT_EXT), (&sequence_offsets, SEQUENCE_EXT)]
        {
            let len = map.as_deref().map_or(0, |m| m.len());
            if len != count * 8 {
                return Err(DatabaseError::corrupt(
                    &sidecar(path, extension),
                    format!("{len} bytes for {count} entries"),
                ));
            }
        }

        // Cheap staleness checks against the mapped FASTA, avoiding a full rescan
        if count > 0 {
            let comments = comment_offsets.as_deref().expect("length checked above");
            let sequences = sequence_offsets.as_deref().expect("length checked above");
            let first = offset_at(comments, 0) as usize;
            let last = offset_at(sequences, count - 1) as usize;
            if last > data.len() || data.get(first) != Some(&b'>') {
                return Err(DatabaseError::corrupt(
                    path,
                    "index files do not match the database content",
                ));
            }
        }

        Ok((header, comment_offsets, sequence_offsets))
    }

    /// The FASTA file this index belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The number of entries. Zero is a valid empty database.
    pub const fn entry_count(&self) -> u32 {
        self.header.entry_count
    }

    /// The byte length of the longest comment line, a pre-allocation hint.
    pub const fn max_comment_len(&self) -> u32 {
        self.header.max_comment_len
    }

    /// The byte length of the longest sequence region, a pre-allocation hint.
    pub const fn max_sequence_len(&self) -> u32 {
        self.header.max_sequence_len
    }

    fn check(&self, serial: u32) -> Result<usize, DatabaseError> {
        if serial < self.header.entry_count {
            Ok(serial as usize)
        } else {
            Err(DatabaseError::OutOfBounds {
                serial,
                count: self.header.entry_count,
            })
        }
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_deref().map_or(&[], |m| &m[..])
    }

    /// The index record for an entry.
    pub fn entry(&self, serial: u32) -> Result<DatabaseEntry, DatabaseError> {
        let index = self.check(serial)?;
        Ok(DatabaseEntry {
            serial,
            comment_offset: offset_at(
                self.comment_offsets.as_deref().expect("count is nonzero"),
                index,
            ),
            sequence_offset: offset_at(
                self.sequence_offsets.as_deref().expect("count is nonzero"),
                index,
            ),
        })
    }

    /// The comment of an entry: the text of its header line after the `>`, without the line
    /// ending.
    pub fn comment(&self, serial: u32) -> Result<&[u8], DatabaseError> {
        let entry = self.entry(serial)?;
        let data = self.bytes();
        let start = entry.comment_offset as usize + 1;
        let mut end = (entry.sequence_offset as usize).min(data.len());
        while end > start && matches!(data[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        Ok(&data[start.min(end)..end])
    }

    /// The raw sequence region of an entry, line endings included. The region ends where the
    /// next entry's comment begins, or at the end of the file for the last entry.
    pub fn raw_sequence(&self, serial: u32) -> Result<&[u8], DatabaseError> {
        let entry = self.entry(serial)?;
        let data = self.bytes();
        let start = (entry.sequence_offset as usize).min(data.len());
        let end = if serial + 1 < self.header.entry_count {
            self.entry(serial + 1)?.comment_offset as usize
        } else {
            data.len()
        };
        Ok(&data[start..end.max(start)])
    }
}

/// Scan the FASTA bytes and write the three sidecar files.
fn build(path: &Path, data: &[u8]) -> Result<(), DatabaseError> {
    let mut comment_offsets: Vec<u64> = Vec::new();
    let mut sequence_offsets: Vec<u64> = Vec::new();
    let mut header = Header::default();

    let mut pos = 0;
    while pos < data.len() {
        let line_end = data[pos..]
            .iter()
            .position(|b| *b == b'\n')
            .map_or(data.len(), |i| pos + i);
        if data[pos] == b'>' {
            // The `>` closes the previous entry's sequence region
            if let Some(&sequence_start) = sequence_offsets.last() {
                header.max_sequence_len =
                    header.max_sequence_len.max((pos as u64 - sequence_start) as u32);
            }
            let mut comment_end = line_end;
            while comment_end > pos && data[comment_end - 1] == b'\r' {
                comment_end -= 1;
            }
            comment_offsets.push(pos as u64);
            sequence_offsets.push(line_end.saturating_add(1).min(data.len()) as u64);
            header.max_comment_len = header
                .max_comment_len
                .max(comment_end.saturating_sub(pos + 1) as u32);
        } else if comment_offsets.is_empty()
            && data[pos..line_end].iter().any(|b| !b.is_ascii_whitespace())
        {
            return Err(DatabaseError::corrupt(
                path,
                "sequence content before the first header line",
            ));
        }
        pos = line_end + 1;
    }
    if let Some(&sequence_start) = sequence_offsets.last() {
        header.max_sequence_len = header
            .max_sequence_len
            .max((data.len() as u64 - sequence_start) as u32);
    }
    header.entry_count = comment_offsets.len() as u32;

    write_sidecar(&sidecar(path, HEADER_EXT), |writer| {
        writer.write_all(&header.entry_count.to_le_bytes())?;
        writer.write_all(&header.max_comment_len.to_le_bytes())?;
        writer.write_all(&header.max_sequence_len.to_le_bytes())
    })?;
    write_sidecar(&sidecar(path, COMMENT_EXT), |writer| {
        comment_offsets
            .iter()
            .try_for_each(|offset| writer.write_all(&offset.to_le_bytes()))
    })?;
    write_sidecar(&sidecar(path, SEQUENCE_EXT), |writer| {
        sequence_offsets
            .iter()
            .try_for_each(|offset| writer.write_all(&offset.to_le_bytes()))
    })?;

    log::info!(
        "indexed {} entries in {}",
        header.entry_count,
        path.display()
    );
    Ok(())
}

/// Write one sidecar through a temp file in the same directory, published with an atomic
/// rename.
fn write_sidecar(
    target: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<(), DatabaseError> {
    let temp = sidecar(target, "tmp");
    let result = File::create(&temp)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()
        })
        .and_then(|()| std::fs::rename(&temp, target));
    result.map_err(|e| DatabaseError::io(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fasta(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("test.fasta")).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        dir
    }

    #[test]
    fn offsets_point_at_entries() {
        let dir = write_fasta(">one first\nPEPTIDE\nSEQ\n>two second\nMKRR\n");
        let index = SequenceIndex::open(dir.path().join("test.fasta"), true).unwrap();
        assert_eq!(index.entry_count(), 2);
        assert_eq!(index.comment(0).unwrap(), b"one first");
        assert_eq!(index.raw_sequence(0).unwrap(), b"PEPTIDE\nSEQ\n");
        assert_eq!(index.comment(1).unwrap(), b"two second");
        assert_eq!(index.raw_sequence(1).unwrap(), b"MKRR\n");
        assert_eq!(index.max_comment_len(), 10);
    }

    #[test]
    fn missing_database_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = SequenceIndex::open(dir.path().join("absent.fasta"), true);
        assert!(matches!(result, Err(DatabaseError::Io { .. })));
    }

    #[test]
    fn out_of_bounds_serial() {
        let dir = write_fasta(">only\nAA\n");
        let index = SequenceIndex::open(dir.path().join("test.fasta"), true).unwrap();
        assert!(matches!(
            index.comment(1),
            Err(DatabaseError::OutOfBounds { serial: 1, count: 1 })
        ));
    }

    #[test]
    fn empty_database_is_not_an_error() {
        let dir = write_fasta("");
        let index = SequenceIndex::open(dir.path().join("test.fasta"), true).unwrap();
        assert_eq!(index.entry_count(), 0);
    }

    #[test]
    fn second_open_skips_the_scan() {
        let dir = write_fasta(">a\nGG\n");
        drop(SequenceIndex::open(dir.path().join("test.fasta"), true).unwrap());
        // Without permission to build, the persisted sidecars must be enough
        let index = SequenceIndex::open(dir.path().join("test.fasta"), false).unwrap();
        assert_eq!(index.entry_count(), 1);
        assert_eq!(index.raw_sequence(0).unwrap(), b"GG\n");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let dir = write_fasta(">a x\nGGG\n>b y\nAA\n");
        let path = dir.path().join("test.fasta");
        drop(SequenceIndex::open(&path, true).unwrap());
        let read_all = |p: &Path| {
            [HEADER_EXT, COMMENT_EXT, SEQUENCE_EXT]
                .map(|ext| std::fs::read(sidecar(p, ext)).unwrap())
        };
        let first = read_all(&path);
        std::fs::remove_file(sidecar(&path, HEADER_EXT)).unwrap();
        drop(SequenceIndex::open(&path, true).unwrap());
        assert_eq!(first, read_all(&path));
    }

    #[test]
    fn no_trailing_newline() {
        let dir = write_fasta(">last entry\nSEQNOEOL");
        let index = SequenceIndex::open(dir.path().join("test.fasta"), true).unwrap();
        assert_eq!(index.raw_sequence(0).unwrap(), b"SEQNOEOL");
    }

    #[test]
    fn junk_before_first_header_is_corrupt() {
        let dir = write_fasta("SEQ\n>a\nGG\n");
        assert!(matches!(
            SequenceIndex::open(dir.path().join("test.fasta"), true),
            Err(DatabaseError::Corrupt { .. })
        ));
    }
}
