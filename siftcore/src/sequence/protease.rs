use std::io::BufReader;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sequence::AminoAcid;

/// A protease defined by its ability to cut at any site identified by the right amino acids on
/// the n and c terminal side of the cut. Each position is an option, a none means there is no
/// specificity at that position; if there is a specificity any amino acid contained in the set
/// is allowed.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Protease {
    /// The amino acids n terminal of the cut site.
    pub before: Vec<Option<Vec<AminoAcid>>>,
    /// The amino acids c terminal of the cut site.
    pub after: Vec<Option<Vec<AminoAcid>>>,
}

impl Protease {
    /// Define a protease that cuts between the specified options before and after the site.
    pub fn between_options(before: Vec<AminoAcid>, after: Vec<AminoAcid>) -> Self {
        Self {
            before: vec![Some(before)],
            after: vec![Some(after)],
        }
    }

    /// Define a protease that cuts on the c terminal side of the provided amino acids.
    pub fn c_terminal_of(residues: Vec<AminoAcid>) -> Self {
        Self {
            before: vec![Some(residues)],
            after: Vec::new(),
        }
    }

    /// Define a protease that cuts on the n terminal side of the provided amino acids.
    pub fn n_terminal_of(residues: Vec<AminoAcid>) -> Self {
        Self {
            before: Vec::new(),
            after: vec![Some(residues)],
        }
    }

    /// Helper to get a list of all amino acids except the ones given.
    pub fn get_exclusive(exclude: &[AminoAcid]) -> Vec<AminoAcid> {
        AminoAcid::ALL
            .iter()
            .copied()
            .filter(|aa| !exclude.contains(aa))
            .collect_vec()
    }

    /// All locations in the given sequence where this protease could cut. Only sites strictly
    /// inside the sequence are reported.
    pub fn match_locations(&self, sequence: &[AminoAcid]) -> Vec<usize> {
        let upper = sequence
            .len()
            .saturating_sub(self.after.len())
            .min(sequence.len().saturating_sub(1));
        (self.before.len()..=upper)
            .filter(|i| self.matches_at(&sequence[i - self.before.len()..i + self.after.len()]))
            .collect_vec()
    }

    fn matches_at(&self, slice: &[AminoAcid]) -> bool {
        debug_assert!(slice.len() == self.before.len() + self.after.len());
        slice
            .iter()
            .zip(self.before.iter().chain(self.after.iter()))
            .all(|(actual, pattern)| {
                pattern.as_ref().is_none_or(|options| options.contains(actual))
            })
    }
}

/// On which side of the residues in the break set an enzyme cuts.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleavageSide {
    /// Cuts after a break residue.
    CTerminal,
    /// Cuts before a break residue.
    NTerminal,
    /// Cuts on either side of a break residue.
    Both,
    /// Cuts between every pair of residues, used for non-specific searches.
    Nonspecific,
}

/// One entry of the named enzyme table, the serialized form of an [`Enzyme`].
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct EnzymeDefinition {
    /// The name the enzyme is looked up under.
    pub name: String,
    /// The residues the enzyme cleaves at, as one letter codes.
    #[serde(default, rename = "break")]
    pub break_residues: String,
    /// The residues that block cleavage when found on the far side of the cut.
    #[serde(default, rename = "exclude")]
    pub exclude_residues: String,
    /// Which side of the break residues the cut falls on.
    pub specificity: CleavageSide,
}

impl EnzymeDefinition {
    fn residues(name: &str, text: &str) -> Result<Vec<AminoAcid>, EnzymeError> {
        text.chars()
            .map(|c| {
                AminoAcid::try_from(c).map_err(|_| EnzymeError::InvalidResidue {
                    name: name.to_string(),
                    residue: c,
                })
            })
            .collect()
    }

    /// Resolve this definition into an enzyme ready for digestion.
    pub fn build(&self) -> Result<Enzyme, EnzymeError> {
        if self.specificity == CleavageSide::Nonspecific {
            return Ok(Enzyme::nonspecific(&self.name));
        }
        let break_residues = Self::residues(&self.name, &self.break_residues)?;
        if break_residues.is_empty() {
            return Err(EnzymeError::EmptyBreakSet(self.name.clone()));
        }
        let exclude = Self::residues(&self.name, &self.exclude_residues)?;
        let blocked = (!exclude.is_empty()).then(|| Protease::get_exclusive(&exclude));
        let c_terminal = Protease {
            before: vec![Some(break_residues.clone())],
            after: blocked.clone().map(|b| vec![Some(b)]).unwrap_or_default(),
        };
        let n_terminal = Protease {
            before: blocked.map(|b| vec![Some(b)]).unwrap_or_default(),
            after: vec![Some(break_residues)],
        };
        let rules = match self.specificity {
            CleavageSide::CTerminal => vec![c_terminal],
            CleavageSide::NTerminal => vec![n_terminal],
            CleavageSide::Both => vec![c_terminal, n_terminal],
            CleavageSide::Nonspecific => unreachable!(),
        };
        Ok(Enzyme {
            name: self.name.clone(),
            rules,
            nonspecific: false,
        })
    }
}

/// A named enzyme: one or more cleavage rules, or the non-specific enzyme that cuts at every
/// residue boundary.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Enzyme {
    name: String,
    rules: Vec<Protease>,
    nonspecific: bool,
}

impl Enzyme {
    /// Create an enzyme from explicit cleavage rules.
    pub fn specific(name: &str, rules: Vec<Protease>) -> Self {
        Self {
            name: name.to_string(),
            rules,
            nonspecific: false,
        }
    }

    /// The enzyme that cuts between every pair of residues.
    pub fn nonspecific(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            nonspecific: true,
        }
    }

    /// The name this enzyme is looked up under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the non-specific enzyme.
    pub const fn is_nonspecific(&self) -> bool {
        self.nonspecific
    }

    /// All locations where this enzyme cuts the given sequence, sorted and deduplicated.
    /// A location `i` means the cut falls between `sequence[i - 1]` and `sequence[i]`.
    pub fn cut_sites(&self, sequence: &[AminoAcid]) -> Vec<usize> {
        if self.nonspecific {
            return (1..sequence.len()).collect_vec();
        }
        self.rules
            .iter()
            .flat_map(|rule| rule.match_locations(sequence))
            .sorted_unstable()
            .dedup()
            .collect_vec()
    }
}

/// The error for enzyme lookup and enzyme table parsing. All of these are construction time
/// failures, no search is started on a broken enzyme configuration.
#[derive(Debug, Error)]
pub enum EnzymeError {
    /// The requested name is not in the registry.
    #[error("unknown enzyme {0:?}")]
    UnknownEnzyme(String),
    /// A residue letter in the table is not an amino acid.
    #[error("invalid residue {residue:?} in enzyme table entry {name:?}")]
    InvalidResidue {
        /// The table entry the residue occurred in.
        name: String,
        /// The offending character.
        residue: char,
    },
    /// A specific enzyme without any break residues would never cut.
    #[error("enzyme {0:?} has an empty break set")]
    EmptyBreakSet(String),
    /// The table file could not be read.
    #[error("enzyme table {path}: {source}")]
    TableIo {
        /// The path of the table file.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The table file is not valid JSON for a list of enzyme definitions.
    #[error("enzyme table {path}: {source}")]
    TableFormat {
        /// The path of the table file.
        path: String,
        /// The underlying parse error.
        source: serde_json::Error,
    },
}

/// The name to enzyme lookup table. Starts from the built in set and can be extended from a
/// JSON parameter file; entries from the file shadow built ins with the same name.
#[derive(Clone, Debug)]
pub struct EnzymeRegistry {
    enzymes: Vec<Enzyme>,
}

/// The built in enzyme table.
const BUILT_IN: &[(&str, &str, &str, CleavageSide)] = &[
    ("trypsin", "KR", "P", CleavageSide::CTerminal),
    ("chymotrypsin", "FWY", "P", CleavageSide::CTerminal),
    ("pepsin", "FWYL", "", CleavageSide::CTerminal),
    ("glu-c", "E", "", CleavageSide::CTerminal),
    ("lys-c", "K", "", CleavageSide::CTerminal),
    ("arg-c", "R", "", CleavageSide::CTerminal),
    ("asp-n", "D", "", CleavageSide::NTerminal),
    ("cnbr", "M", "", CleavageSide::CTerminal),
    ("no enzyme", "", "", CleavageSide::Nonspecific),
];

impl EnzymeRegistry {
    /// The registry with only the built in enzymes.
    pub fn built_in() -> Self {
        let enzymes = BUILT_IN
            .iter()
            .map(|(name, break_residues, exclude_residues, specificity)| {
                EnzymeDefinition {
                    name: (*name).to_string(),
                    break_residues: (*break_residues).to_string(),
                    exclude_residues: (*exclude_residues).to_string(),
                    specificity: *specificity,
                }
                .build()
                .expect("the built in enzyme table is valid")
            })
            .collect_vec();
        Self { enzymes }
    }

    /// The built in registry extended with the definitions from a JSON table file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EnzymeError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| EnzymeError::TableIo {
            path: path.display().to_string(),
            source,
        })?;
        let definitions: Vec<EnzymeDefinition> =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                EnzymeError::TableFormat {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        let mut registry = Self::built_in();
        for definition in &definitions {
            let enzyme = definition.build()?;
            registry
                .enzymes
                .retain(|e| !e.name().eq_ignore_ascii_case(enzyme.name()));
            registry.enzymes.push(enzyme);
        }
        Ok(registry)
    }

    /// Look up an enzyme by name, case insensitive.
    pub fn get(&self, name: &str) -> Result<&Enzyme, EnzymeError> {
        self.enzymes
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| EnzymeError::UnknownEnzyme(name.to_string()))
    }

    /// The names of all registered enzymes.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.enzymes.iter().map(Enzyme::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(text: &str) -> Vec<AminoAcid> {
        AminoAcid::parse_sequence(text).unwrap()
    }

    #[test]
    fn trypsin_cut_sites() {
        let registry = EnzymeRegistry::built_in();
        let trypsin = registry.get("Trypsin").unwrap();
        // After K and R, except before P
        assert_eq!(trypsin.cut_sites(&sequence("AKRPGKR")), vec![2, 6]);
        assert_eq!(trypsin.cut_sites(&sequence("ARAKGCVLRPKDGR")), vec![2, 4, 11]);
    }

    #[test]
    fn asp_n_cuts_before() {
        let registry = EnzymeRegistry::built_in();
        let aspn = registry.get("asp-n").unwrap();
        assert_eq!(aspn.cut_sites(&sequence("FARDKPGLFD")), vec![3, 9]);
    }

    #[test]
    fn nonspecific_cuts_everywhere() {
        let registry = EnzymeRegistry::built_in();
        let none = registry.get("no enzyme").unwrap();
        assert_eq!(none.cut_sites(&sequence("PEPTIDE")), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn both_sides_union() {
        let definition = EnzymeDefinition {
            name: "test".to_string(),
            break_residues: "D".to_string(),
            exclude_residues: String::new(),
            specificity: CleavageSide::Both,
        };
        let enzyme = definition.build().unwrap();
        assert_eq!(enzyme.cut_sites(&sequence("AADGG")), vec![2, 3]);
    }

    #[test]
    fn unknown_enzyme_is_rejected() {
        let registry = EnzymeRegistry::built_in();
        assert!(matches!(
            registry.get("laser beam"),
            Err(EnzymeError::UnknownEnzyme(_))
        ));
    }

    #[test]
    fn table_from_json() {
        let definitions: Vec<EnzymeDefinition> = serde_json::from_str(
            r#"[{"name": "his-c", "break": "H", "specificity": "c-terminal"}]"#,
        )
        .unwrap();
        let enzyme = definitions[0].build().unwrap();
        assert_eq!(enzyme.cut_sites(&sequence("AAHFGHKLM")), vec![3, 6]);
    }
}
