use serde::{Deserialize, Serialize};

use crate::chemistry::MassMode;
use crate::molecular_formula;
use crate::sequence::{AminoAcid, Enzyme, SequenceError};

/// A protein terminus.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Terminus {
    /// The n terminus, the start of the sequence.
    NTerminal,
    /// The c terminus, the end of the sequence.
    CTerminal,
}

/// Strip up to `max_strip` copies of one residue off a fragment terminus, generating one extra
/// fragment per removed residue. Used for ragged termini, for example n terminal methionine
/// loss.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TerminalStrip {
    /// The terminus to strip from.
    pub terminus: Terminus,
    /// The residue that can be stripped.
    pub residue: AminoAcid,
    /// The maximal number of residues to strip.
    pub max_strip: u32,
}

/// How the residues of a [`CompositionFilter`] combine.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CombineMode {
    /// Every listed residue must be present in the fragment.
    #[default]
    All,
    /// At least one listed residue must be present in the fragment.
    Any,
}

/// Keep only fragments containing the given residues.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct CompositionFilter {
    /// The residues that must occur.
    pub residues: Vec<AminoAcid>,
    /// Whether all or any of the residues must occur.
    pub mode: CombineMode,
}

impl CompositionFilter {
    fn accepts(&self, residues: &[AminoAcid]) -> bool {
        match self.mode {
            CombineMode::All => self
                .residues
                .iter()
                .all(|required| residues.contains(required)),
            CombineMode::Any => self
                .residues
                .iter()
                .any(|required| residues.contains(required)),
        }
    }
}

/// The parameters for one digestion run.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DigestParameters {
    /// The maximal number of cleavage sites a fragment may span.
    pub missed_cleavages: u32,
    /// Optional terminal stripping.
    pub strip: Option<TerminalStrip>,
    /// Optional composition filter.
    pub filter: Option<CompositionFilter>,
}

impl DigestParameters {
    /// Parameters with the given number of missed cleavages and no stripping or filtering.
    pub const fn new(missed_cleavages: u32) -> Self {
        Self {
            missed_cleavages,
            strip: None,
            filter: None,
        }
    }
}

/// One enzymatic fragment of a protein. Positions are 1 based and inclusive, the flanking
/// residues are `'-'` exactly at the protein termini.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnzymeFragment {
    /// The fragment text, a verbatim slice of the protein string.
    pub sequence: String,
    /// The 1 based position of the first residue.
    pub start: u32,
    /// The 1 based position of the last residue.
    pub end: u32,
    /// The residue before the fragment, `'-'` at the protein n terminus.
    pub previous_aa: char,
    /// The residue after the fragment, `'-'` at the protein c terminus.
    pub next_aa: char,
    /// The number of cleavage sites this fragment spans.
    pub missed_cleavages: u32,
    /// The maximal charge this fragment can reasonably hold, one proton plus one per basic
    /// residue.
    pub max_charge: u32,
}

impl EnzymeFragment {
    /// The neutral peptide mass of this fragment: the residue masses plus one water.
    pub fn mass(&self, mode: MassMode) -> f64 {
        let water = molecular_formula!(H 2 O 1).mass(mode);
        self.sequence
            .chars()
            .filter_map(|c| AminoAcid::try_from(c).ok())
            .map(|aa| aa.residue_mass(mode))
            .sum::<f64>()
            + water
    }
}

impl std::fmt::Display for EnzymeFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}){}({}) {}-{}",
            self.previous_aa, self.sequence, self.next_aa, self.start, self.end
        )
    }
}

/// Digest a protein with the given enzyme. The cleavage sites are enumerated once in a single
/// scan, then every window of `0..=missed_cleavages` consecutive sites becomes a fragment,
/// each with its terminal stripped variants.
///
/// # Errors
/// If the protein contains a character that is not an amino acid code.
pub fn digest(
    protein: &str,
    enzyme: &Enzyme,
    params: &DigestParameters,
) -> Result<Vec<EnzymeFragment>, SequenceError> {
    let residues = AminoAcid::parse_sequence(protein)?;

    let mut sites = vec![0];
    sites.extend_from_slice(&enzyme.cut_sites(&residues));
    sites.push(residues.len());
    sites.dedup();

    let mut result = Vec::new();
    for (index, &start) in sites.iter().enumerate() {
        for (missed, &end) in sites
            .iter()
            .skip(index + 1)
            .take(params.missed_cleavages as usize + 1)
            .enumerate()
        {
            emit(
                protein,
                &residues,
                start,
                end,
                missed as u32,
                params,
                &mut result,
            );
        }
    }
    Ok(result)
}

/// Push the fragment for `start..end` and its stripped variants, dropping any that fail the
/// composition filter or become empty.
fn emit(
    protein: &str,
    residues: &[AminoAcid],
    start: usize,
    end: usize,
    missed_cleavages: u32,
    params: &DigestParameters,
    result: &mut Vec<EnzymeFragment>,
) {
    let mut spans = vec![(start, end)];
    if let Some(strip) = params.strip {
        for n in 1..=strip.max_strip as usize {
            let (stripped, edge) = match strip.terminus {
                Terminus::NTerminal => ((start + n, end), residues.get(start + n - 1)),
                Terminus::CTerminal => ((start, end - n), residues.get(end - n)),
            };
            if stripped.1 <= stripped.0 || edge != Some(&strip.residue) {
                break;
            }
            spans.push(stripped);
        }
    }

    for (start, end) in spans {
        let span = &residues[start..end];
        if params.filter.as_ref().is_some_and(|f| !f.accepts(span)) {
            continue;
        }
        result.push(EnzymeFragment {
            sequence: protein[start..end].to_string(),
            start: start as u32 + 1,
            end: end as u32,
            previous_aa: if start == 0 {
                '-'
            } else {
                char::from(protein.as_bytes()[start - 1])
            },
            next_aa: if end == protein.len() {
                '-'
            } else {
                char::from(protein.as_bytes()[end])
            },
            missed_cleavages,
            max_charge: 1 + span.iter().filter(|aa| aa.is_basic()).count() as u32,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::EnzymeRegistry;

    fn fragments(protein: &str, enzyme: &str, params: &DigestParameters) -> Vec<EnzymeFragment> {
        let registry = EnzymeRegistry::built_in();
        digest(protein, registry.get(enzyme).unwrap(), params).unwrap()
    }

    #[test]
    fn trypsin_reference_table() {
        // K at position 2 is followed by P and does not cut, K at position 10 does
        let result = fragments("MKPEPTIDEKR", "trypsin", &DigestParameters::new(1));
        let expected = [
            ("MKPEPTIDEK", 1, 10, '-', 'R', 0),
            ("MKPEPTIDEKR", 1, 11, '-', '-', 1),
            ("R", 11, 11, 'K', '-', 0),
        ];
        assert_eq!(result.len(), expected.len());
        for (fragment, (sequence, start, end, previous, next, missed)) in
            result.iter().zip(expected)
        {
            assert_eq!(fragment.sequence, sequence);
            assert_eq!(fragment.start, start);
            assert_eq!(fragment.end, end);
            assert_eq!(fragment.previous_aa, previous);
            assert_eq!(fragment.next_aa, next);
            assert_eq!(fragment.missed_cleavages, missed);
        }
    }

    #[test]
    fn zero_missed_count_is_sites_plus_one() {
        for (protein, strict_sites) in [("AKGKGR", 2), ("PEPTIDE", 0), ("KAKAKA", 3)] {
            let result = fragments(protein, "trypsin", &DigestParameters::new(0));
            assert_eq!(result.len(), strict_sites + 1, "protein {protein}");
        }
    }

    #[test]
    fn terminal_flags_match_positions() {
        let protein = "AKGKGRLK";
        let result = fragments(protein, "trypsin", &DigestParameters::new(2));
        for fragment in result {
            assert_eq!(fragment.previous_aa == '-', fragment.start == 1);
            assert_eq!(
                fragment.next_aa == '-',
                fragment.end == protein.len() as u32
            );
            assert_eq!(
                fragment.end - fragment.start + 1,
                fragment.sequence.len() as u32
            );
        }
    }

    #[test]
    fn nonspecific_digestion() {
        let result = fragments("GAG", "no enzyme", &DigestParameters::new(0));
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|f| f.sequence.len() == 1));
    }

    #[test]
    fn methionine_stripping() {
        let params = DigestParameters {
            missed_cleavages: 0,
            strip: Some(TerminalStrip {
                terminus: Terminus::NTerminal,
                residue: AminoAcid::Methionine,
                max_strip: 2,
            }),
            filter: None,
        };
        let result = fragments("MMGK", "lys-c", &params);
        let sequences: Vec<_> = result.iter().map(|f| f.sequence.as_str()).collect();
        assert_eq!(sequences, vec!["MMGK", "MGK", "GK"]);
        // The stripped variants keep their flanking context
        assert_eq!(result[1].previous_aa, 'M');
        assert_eq!(result[1].start, 2);
    }

    #[test]
    fn composition_filter_all_and_any() {
        let all = DigestParameters {
            missed_cleavages: 0,
            strip: None,
            filter: Some(CompositionFilter {
                residues: vec![AminoAcid::Cysteine],
                mode: CombineMode::All,
            }),
        };
        let result = fragments("ACKGGK", "trypsin", &all);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].sequence, "ACK");

        let any = DigestParameters {
            missed_cleavages: 0,
            strip: None,
            filter: Some(CompositionFilter {
                residues: vec![AminoAcid::Cysteine, AminoAcid::Glycine],
                mode: CombineMode::Any,
            }),
        };
        assert_eq!(fragments("ACKGGK", "trypsin", &any).len(), 2);
    }

    #[test]
    fn fragment_mass() {
        let result = fragments("GAK", "no enzyme", &DigestParameters::new(2));
        let whole = result.iter().find(|f| f.sequence == "GAK").unwrap();
        // G + A + K + water
        let expected = 57.02146 + 71.03711 + 128.09496 + 18.01056;
        assert!((whole.mass(MassMode::Monoisotopic) - expected).abs() < 1e-4);
    }

    #[test]
    fn max_charge_counts_basic_residues() {
        let result = fragments("HKRAG", "no enzyme", &DigestParameters::new(4));
        let whole = result.iter().find(|f| f.sequence == "HKRAG").unwrap();
        assert_eq!(whole.max_charge, 4);
    }

    #[test]
    fn invalid_character_is_rejected() {
        let registry = EnzymeRegistry::built_in();
        assert!(matches!(
            digest("PEPT1DE", registry.get("trypsin").unwrap(), &DigestParameters::new(0)),
            Err(SequenceError::InvalidAminoAcid('1'))
        ));
    }
}
