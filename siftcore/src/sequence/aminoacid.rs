use serde::{Deserialize, Serialize};

use crate::chemistry::{MassMode, MolecularFormula};
use crate::molecular_formula;
use crate::sequence::SequenceError;

/// An amino acid. The residue formulas are the formulas of the amino acid minus one water,
/// which is what a residue contributes inside a peptide chain.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum AminoAcid {
    /// A
    #[default]
    Alanine,
    /// R
    Arginine,
    /// N
    Asparagine,
    /// D
    AsparticAcid,
    /// C
    Cysteine,
    /// Q
    Glutamine,
    /// E
    GlutamicAcid,
    /// G
    Glycine,
    /// H
    Histidine,
    /// I
    Isoleucine,
    /// L
    Leucine,
    /// K
    Lysine,
    /// M
    Methionine,
    /// F
    Phenylalanine,
    /// P
    Proline,
    /// S
    Serine,
    /// T
    Threonine,
    /// W
    Tryptophan,
    /// Y
    Tyrosine,
    /// V
    Valine,
    /// U
    Selenocysteine,
    /// O
    Pyrrolysine,
    /// B, N or D. Takes the asparagine formula for mass purposes.
    AmbiguousAsparagine,
    /// Z, Q or E. Takes the glutamine formula for mass purposes.
    AmbiguousGlutamine,
    /// J, L or I, which are isobaric.
    AmbiguousLeucine,
    /// X, no residue formula and zero mass.
    Unknown,
}

impl AminoAcid {
    /// All amino acids that can occur in a sequence.
    pub const ALL: [Self; 26] = [
        Self::Alanine,
        Self::Arginine,
        Self::Asparagine,
        Self::AsparticAcid,
        Self::Cysteine,
        Self::Glutamine,
        Self::GlutamicAcid,
        Self::Glycine,
        Self::Histidine,
        Self::Isoleucine,
        Self::Leucine,
        Self::Lysine,
        Self::Methionine,
        Self::Phenylalanine,
        Self::Proline,
        Self::Serine,
        Self::Threonine,
        Self::Tryptophan,
        Self::Tyrosine,
        Self::Valine,
        Self::Selenocysteine,
        Self::Pyrrolysine,
        Self::AmbiguousAsparagine,
        Self::AmbiguousGlutamine,
        Self::AmbiguousLeucine,
        Self::Unknown,
    ];

    /// The twenty canonical amino acids.
    pub const CANONICAL: [Self; 20] = [
        Self::Alanine,
        Self::Arginine,
        Self::Asparagine,
        Self::AsparticAcid,
        Self::Cysteine,
        Self::Glutamine,
        Self::GlutamicAcid,
        Self::Glycine,
        Self::Histidine,
        Self::Isoleucine,
        Self::Leucine,
        Self::Lysine,
        Self::Methionine,
        Self::Phenylalanine,
        Self::Proline,
        Self::Serine,
        Self::Threonine,
        Self::Tryptophan,
        Self::Tyrosine,
        Self::Valine,
    ];

    /// The one letter code.
    pub const fn char(self) -> char {
        match self {
            Self::Alanine => 'A',
            Self::Arginine => 'R',
            Self::Asparagine => 'N',
            Self::AsparticAcid => 'D',
            Self::Cysteine => 'C',
            Self::Glutamine => 'Q',
            Self::GlutamicAcid => 'E',
            Self::Glycine => 'G',
            Self::Histidine => 'H',
            Self::Isoleucine => 'I',
            Self::Leucine => 'L',
            Self::Lysine => 'K',
            Self::Methionine => 'M',
            Self::Phenylalanine => 'F',
            Self::Proline => 'P',
            Self::Serine => 'S',
            Self::Threonine => 'T',
            Self::Tryptophan => 'W',
            Self::Tyrosine => 'Y',
            Self::Valine => 'V',
            Self::Selenocysteine => 'U',
            Self::Pyrrolysine => 'O',
            Self::AmbiguousAsparagine => 'B',
            Self::AmbiguousGlutamine => 'Z',
            Self::AmbiguousLeucine => 'J',
            Self::Unknown => 'X',
        }
    }

    /// The formula this residue contributes inside a peptide chain.
    pub fn residue_formula(self) -> MolecularFormula {
        match self {
            Self::Alanine => molecular_formula!(H 5 C 3 O 1 N 1),
            Self::Arginine => molecular_formula!(H 12 C 6 O 1 N 4),
            Self::Asparagine | Self::AmbiguousAsparagine => molecular_formula!(H 6 C 4 O 2 N 2),
            Self::AsparticAcid => molecular_formula!(H 5 C 4 O 3 N 1),
            Self::Cysteine => molecular_formula!(H 5 C 3 O 1 N 1 S 1),
            Self::Glutamine | Self::AmbiguousGlutamine => molecular_formula!(H 8 C 5 O 2 N 2),
            Self::GlutamicAcid => molecular_formula!(H 7 C 5 O 3 N 1),
            Self::Glycine => molecular_formula!(H 3 C 2 O 1 N 1),
            Self::Histidine => molecular_formula!(H 7 C 6 O 1 N 3),
            Self::Isoleucine | Self::Leucine | Self::AmbiguousLeucine => {
                molecular_formula!(H 11 C 6 O 1 N 1)
            }
            Self::Lysine => molecular_formula!(H 12 C 6 O 1 N 2),
            Self::Methionine => molecular_formula!(H 9 C 5 O 1 N 1 S 1),
            Self::Phenylalanine => molecular_formula!(H 9 C 9 O 1 N 1),
            Self::Proline => molecular_formula!(H 7 C 5 O 1 N 1),
            Self::Pyrrolysine => molecular_formula!(H 19 C 11 O 2 N 3),
            Self::Selenocysteine => molecular_formula!(H 5 C 3 O 1 N 1 Se 1),
            Self::Serine => molecular_formula!(H 5 C 3 O 2 N 1),
            Self::Threonine => molecular_formula!(H 7 C 4 O 2 N 1),
            Self::Tryptophan => molecular_formula!(H 10 C 11 O 1 N 2),
            Self::Tyrosine => molecular_formula!(H 9 C 9 O 2 N 1),
            Self::Valine => molecular_formula!(H 9 C 5 O 1 N 1),
            Self::Unknown => MolecularFormula::default(),
        }
    }

    /// The mass this residue contributes inside a peptide chain.
    pub fn residue_mass(self, mode: MassMode) -> f64 {
        self.residue_formula().mass(mode)
    }

    /// Whether this residue carries a basic side chain (arginine, lysine, histidine), which is
    /// what determines how many protons a fragment can reasonably hold.
    pub const fn is_basic(self) -> bool {
        matches!(self, Self::Arginine | Self::Lysine | Self::Histidine)
    }

    /// Parse a whole protein string. Fails on the first character that is not an amino acid.
    pub fn parse_sequence(sequence: &str) -> Result<Vec<Self>, SequenceError> {
        sequence.chars().map(Self::try_from).collect()
    }
}

impl TryFrom<char> for AminoAcid {
    type Error = SequenceError;
    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|aa| aa.char() == value.to_ascii_uppercase())
            .ok_or(SequenceError::InvalidAminoAcid(value))
    }
}

impl TryFrom<u8> for AminoAcid {
    type Error = SequenceError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(char::from(value))
    }
}

impl From<AminoAcid> for char {
    fn from(value: AminoAcid) -> Self {
        value.char()
    }
}

impl std::fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_round_trip() {
        for aa in AminoAcid::ALL {
            assert_eq!(AminoAcid::try_from(aa.char()), Ok(aa));
        }
        assert!(AminoAcid::try_from('1').is_err());
    }

    #[test]
    fn residue_masses() {
        // Reference values from the standard residue mass table
        let cases = [
            (AminoAcid::Glycine, 57.02146),
            (AminoAcid::Alanine, 71.03711),
            (AminoAcid::Lysine, 128.09496),
            (AminoAcid::Arginine, 156.10111),
            (AminoAcid::Tryptophan, 186.07931),
        ];
        for (aa, expected) in cases {
            assert!(
                (aa.residue_mass(MassMode::Monoisotopic) - expected).abs() < 1e-4,
                "{aa}: {} != {expected}",
                aa.residue_mass(MassMode::Monoisotopic)
            );
        }
    }

    #[test]
    fn leucine_isoleucine_isobaric() {
        assert_eq!(
            AminoAcid::Leucine.residue_formula(),
            AminoAcid::Isoleucine.residue_formula()
        );
    }
}
