mod aminoacid;
mod digest;
mod protease;

pub use aminoacid::*;
pub use digest::*;
pub use protease::*;

use thiserror::Error;

/// The error for invalid sequence text.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum SequenceError {
    /// A character in a protein string that is not an amino acid code.
    #[error("invalid amino acid character {0:?}")]
    InvalidAminoAcid(char),
}
