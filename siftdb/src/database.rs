use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{DatabaseError, SequenceIndex};

/// The width sequence lines are wrapped at when writing FASTA output.
const LINE_WIDTH: usize = 60;

/// How a decoy database is derived from its source.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DecoyStyle {
    /// Every sequence reversed, comments prefixed with `rev_`.
    Reversed,
    /// Every sequence shuffled with a seeded generator, comments prefixed with `ran_`.
    /// The same seed reproduces the same decoy database.
    Shuffled {
        /// The seed for the shuffle.
        seed: u64,
    },
}

impl DecoyStyle {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Reversed => "rev_",
            Self::Shuffled { .. } => "ran_",
        }
    }
}

/// A protein sequence database over a FASTA file, addressable by serial number through the
/// persistent [`SequenceIndex`]. The mapping is read only and can be shared between
/// concurrent searches.
#[derive(Debug)]
pub struct SequenceDatabase {
    index: SequenceIndex,
}

impl SequenceDatabase {
    /// Open a database, building the index when needed. See [`SequenceIndex::open`].
    pub fn open(path: impl AsRef<Path>, build_if_missing: bool) -> Result<Self, DatabaseError> {
        Ok(Self {
            index: SequenceIndex::open(path, build_if_missing)?,
        })
    }

    /// The underlying index.
    pub const fn index(&self) -> &SequenceIndex {
        &self.index
    }

    /// The number of entries.
    pub const fn entry_count(&self) -> u32 {
        self.index.entry_count()
    }

    /// The comment of an entry as text.
    pub fn comment(&self, serial: u32) -> Result<Cow<'_, str>, DatabaseError> {
        Ok(String::from_utf8_lossy(self.index.comment(serial)?))
    }

    /// The sequence of an entry with line endings and whitespace removed.
    pub fn sequence(&self, serial: u32) -> Result<String, DatabaseError> {
        Ok(self
            .index
            .raw_sequence(serial)?
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .map(char::from)
            .collect())
    }

    /// Iterate over all `(serial, sequence)` pairs in ascending serial order.
    pub fn sequences(&self) -> impl Iterator<Item = Result<(u32, String), DatabaseError>> + '_ {
        (0..self.entry_count()).map(|serial| Ok((serial, self.sequence(serial)?)))
    }

    /// Write a decoy variant of this database as a new FASTA file. The output gets its own
    /// index on first open, like any other database.
    pub fn write_decoy(&self, target: impl AsRef<Path>, style: DecoyStyle) -> Result<u32, DatabaseError> {
        let target = target.as_ref();
        let file = File::create(target).map_err(|e| DatabaseError::io(target, e))?;
        let mut writer = BufWriter::new(file);
        for serial in 0..self.entry_count() {
            let mut residues = self.sequence(serial)?.into_bytes();
            match style {
                DecoyStyle::Reversed => residues.reverse(),
                DecoyStyle::Shuffled { seed } => {
                    let mut rng = StdRng::seed_from_u64(seed ^ u64::from(serial));
                    residues.shuffle(&mut rng);
                }
            }
            write_entry(&mut writer, style.prefix(), &self.comment(serial)?, &residues)
                .map_err(|e| DatabaseError::io(target, e))?;
        }
        writer
            .flush()
            .map_err(|e| DatabaseError::io(target, e))?;
        log::info!(
            "wrote {} decoy entries to {}",
            self.entry_count(),
            target.display()
        );
        Ok(self.entry_count())
    }
}

fn write_entry(
    writer: &mut impl Write,
    prefix: &str,
    comment: &str,
    residues: &[u8],
) -> std::io::Result<()> {
    writeln!(writer, ">{prefix}{comment}")?;
    for line in residues.chunks(LINE_WIDTH) {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
