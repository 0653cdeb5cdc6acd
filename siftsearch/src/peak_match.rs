use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use siftcore::chemistry::{MassMode, PROTON_MASS};
use siftcore::quantities::Tolerance;
use siftcore::sequence::EnzymeFragment;

/// One observed peak from a spectrum. The `used` flag is owned by the matching pass of a
/// single search and is set at most once per peak per search.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Peak {
    /// The measured mass over charge.
    pub mz: f64,
    /// The measured intensity.
    pub intensity: f64,
    /// The charge state, 0 when unknown (treated as singly charged).
    pub charge: i32,
    /// Whether a fragment already claimed this peak in the current search.
    pub used: bool,
}

impl Peak {
    /// A fresh unused peak.
    pub const fn new(mz: f64, intensity: f64, charge: i32) -> Self {
        Self {
            mz,
            intensity,
            charge,
            used: false,
        }
    }

    /// The neutral mass this peak represents: the protons carried by the charge are removed.
    pub fn neutral_mass(&self) -> f64 {
        let charge = f64::from(self.charge.unsigned_abs().max(1));
        self.mz.mul_add(charge, -(charge * PROTON_MASS))
    }
}

/// The observed peaks of one search, sorted by neutral mass, each with its own precomputed
/// tolerance window. Handing the set to an engine by `&mut` makes the per search ownership
/// of the `used` flags a compile time property.
#[derive(Clone, Debug, Default)]
pub struct PeakSet {
    peaks: Vec<Peak>,
    /// The `[low, high]` window per peak, parallel to `peaks`.
    windows: Vec<(f64, f64)>,
}

impl PeakSet {
    /// Build a peak set with the given tolerance around every peak's neutral mass.
    pub fn new(peaks: Vec<Peak>, tolerance: Tolerance) -> Self {
        let peaks = peaks
            .into_iter()
            .sorted_by_key(|peak| OrderedFloat(peak.neutral_mass()))
            .collect_vec();
        let windows = peaks
            .iter()
            .map(|peak| tolerance.bounds(peak.neutral_mass()))
            .collect_vec();
        Self { peaks, windows }
    }

    /// The number of peaks.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// Whether there are no peaks.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// The peaks in ascending neutral mass order.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// The number of peaks claimed by a fragment.
    pub fn used_count(&self) -> usize {
        self.peaks.iter().filter(|peak| peak.used).count()
    }

    /// Clear all `used` flags for the next search.
    pub fn reset(&mut self) {
        for peak in &mut self.peaks {
            peak.used = false;
        }
    }

    /// The lowest mass unused peak whose window contains the given mass, claimed for the
    /// caller.
    fn claim(&mut self, mass: f64) -> Option<usize> {
        // First window that can still reach up to this mass
        let start = self.windows.partition_point(|(_, high)| *high < mass);
        for index in start..self.peaks.len() {
            let (low, high) = self.windows[index];
            if low > mass {
                break;
            }
            if !self.peaks[index].used && mass <= high {
                self.peaks[index].used = true;
                return Some(index);
            }
        }
        None
    }
}

/// One fragment that claimed a peak.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MatchHit {
    /// The matching fragment.
    pub fragment: EnzymeFragment,
    /// The computed fragment mass the comparison used.
    pub mass: f64,
    /// The index of the claimed peak in the sorted peak set.
    pub peak: usize,
    /// The MOWSE weight of this match, 1 when scored by plain counting.
    pub score: f64,
}

/// The outcome of matching one protein's fragments against a spectrum.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MatchResult {
    /// The hits in ascending fragment mass order.
    pub hits: Vec<MatchHit>,
    /// The number of peaks claimed in this search.
    pub matched_peaks: usize,
    /// The number of peaks searched.
    pub total_peaks: usize,
    /// The protein level score: the matched peak count, or the MOWSE score when a frequency
    /// table was supplied.
    pub score: f64,
}

/// Matches digestion fragments against an observed spectrum. Fragments are processed in
/// ascending mass order and each fragment mass is computed once; a peak is claimed by the
/// first fragment that reaches it and never by a second one.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeakMatchEngine {
    mode: MassMode,
}

impl PeakMatchEngine {
    /// An engine computing fragment masses in the given mode.
    pub const fn new(mode: MassMode) -> Self {
        Self { mode }
    }

    /// Match with plain counting: the protein score is the number of claimed peaks.
    pub fn match_fragments(
        &self,
        fragments: &[EnzymeFragment],
        peaks: &mut PeakSet,
    ) -> MatchResult {
        self.run(fragments, peaks, None)
    }

    /// Match with MOWSE weighting. The table must have been accumulated over the entire
    /// searched database before any scoring happens, see [`MowseAccumulator`].
    pub fn match_fragments_mowse(
        &self,
        fragments: &[EnzymeFragment],
        peaks: &mut PeakSet,
        table: &MowseTable,
        protein_mass: f64,
    ) -> MatchResult {
        self.run(fragments, peaks, Some((table, protein_mass)))
    }

    fn run(
        &self,
        fragments: &[EnzymeFragment],
        peaks: &mut PeakSet,
        mowse: Option<(&MowseTable, f64)>,
    ) -> MatchResult {
        let total_peaks = peaks.len();
        let ordered = fragments
            .iter()
            .map(|fragment| (fragment, fragment.mass(self.mode)))
            .sorted_by_key(|(_, mass)| OrderedFloat(*mass))
            .collect_vec();

        let mut hits = Vec::new();
        for (fragment, mass) in ordered {
            if let Some(peak) = peaks.claim(mass) {
                let score = mowse.map_or(1.0, |(table, protein_mass)| {
                    table.weight(mass, protein_mass)
                });
                hits.push(MatchHit {
                    fragment: fragment.clone(),
                    mass,
                    peak,
                    score,
                });
            }
        }

        let matched_peaks = hits.len();
        let score = mowse.map_or(matched_peaks as f64, |(_, protein_mass)| {
            MowseTable::protein_score(&hits, protein_mass)
        });
        MatchResult {
            hits,
            matched_peaks,
            total_peaks,
            score,
        }
    }
}

/// The fragment mass bin width of the MOWSE frequency table.
const FRAGMENT_BIN: f64 = 100.0;
/// The protein mass bin width of the MOWSE frequency table.
const PROTEIN_BIN: f64 = 10_000.0;
/// The protein mass the MOWSE score is normalized to.
const MOWSE_REFERENCE_MASS: f64 = 50_000.0;

/// Phase one of MOWSE scoring: a 2-D histogram of fragment mass versus protein mass
/// co-occurrence, fed with every fragment of every database entry. Scoring only becomes
/// available after [`freeze`](Self::freeze), so a table can never score a search it has not
/// fully seen.
#[derive(Clone, Debug, Default)]
pub struct MowseAccumulator {
    /// `bins[protein_bin][fragment_bin]`, grown on demand.
    bins: Vec<Vec<u32>>,
}

impl MowseAccumulator {
    /// An empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one digestion fragment of one database entry.
    pub fn accumulate(&mut self, fragment_mass: f64, protein_mass: f64) {
        let protein = bin(protein_mass, PROTEIN_BIN);
        let fragment = bin(fragment_mass, FRAGMENT_BIN);
        if self.bins.len() <= protein {
            self.bins.resize(protein + 1, Vec::new());
        }
        let row = &mut self.bins[protein];
        if row.len() <= fragment {
            row.resize(fragment + 1, 0);
        }
        row[fragment] += 1;
    }

    /// End the accumulation phase. The returned table is read only.
    pub fn freeze(self) -> MowseTable {
        MowseTable { bins: self.bins }
    }
}

/// Phase two of MOWSE scoring: the frozen frequency table. A match is weighted by the
/// inverse of how often fragments of that mass class occur in proteins of that mass class,
/// so matches that are rare for a protein size count for more.
#[derive(Clone, Debug)]
pub struct MowseTable {
    bins: Vec<Vec<u32>>,
}

impl MowseTable {
    /// The weight of one match: `1 / count` of its histogram cell.
    pub fn weight(&self, fragment_mass: f64, protein_mass: f64) -> f64 {
        let count = self
            .bins
            .get(bin(protein_mass, PROTEIN_BIN))
            .and_then(|row| row.get(bin(fragment_mass, FRAGMENT_BIN)))
            .copied()
            .unwrap_or(0)
            .max(1);
        1.0 / f64::from(count)
    }

    /// The protein level score: the product of the match weights scaled to a 50 kDa
    /// reference protein.
    fn protein_score(hits: &[MatchHit], protein_mass: f64) -> f64 {
        if hits.is_empty() || protein_mass <= 0.0 {
            return 0.0;
        }
        hits.iter().map(|hit| hit.score).product::<f64>() * MOWSE_REFERENCE_MASS / protein_mass
    }
}

fn bin(mass: f64, width: f64) -> usize {
    (mass.max(0.0) / width) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use siftcore::sequence::{DigestParameters, EnzymeRegistry, digest};

    fn tryptic(protein: &str) -> Vec<EnzymeFragment> {
        let registry = EnzymeRegistry::built_in();
        digest(protein, registry.get("trypsin").unwrap(), &DigestParameters::new(0)).unwrap()
    }

    fn singly_charged(masses: &[f64]) -> Vec<Peak> {
        masses
            .iter()
            .map(|mass| Peak::new(mass + PROTON_MASS, 100.0, 1))
            .collect()
    }

    #[test]
    fn neutral_mass_removes_the_protons() {
        let peak = Peak::new(500.0, 10.0, 2);
        assert!((peak.neutral_mass() - (1000.0 - 2.0 * PROTON_MASS)).abs() < 1e-9);
        // Unknown charge counts as one
        let unknown = Peak::new(500.0, 10.0, 0);
        assert!((unknown.neutral_mass() - (500.0 - PROTON_MASS)).abs() < 1e-9);
    }

    #[test]
    fn fragments_claim_matching_peaks() {
        let fragments = tryptic("GGGKAAAR");
        // GGGK = 3 G + K + water, AAAR = 3 A + R + water
        let gggk = 3.0 * 57.02146 + 128.09496 + 18.010565;
        let aaar = 3.0 * 71.03711 + 156.10111 + 18.010565;
        let mut peaks = PeakSet::new(
            singly_charged(&[gggk, aaar, 1234.5]),
            Tolerance::Absolute(0.01),
        );
        let result = PeakMatchEngine::new(MassMode::Monoisotopic)
            .match_fragments(&fragments, &mut peaks);
        assert_eq!(result.matched_peaks, 2);
        assert_eq!(result.total_peaks, 3);
        assert!((result.score - 2.0).abs() < f64::EPSILON);
        // Hits come out in ascending fragment mass order
        assert_eq!(result.hits[0].fragment.sequence, "GGGK");
        assert_eq!(result.hits[1].fragment.sequence, "AAAR");
    }

    #[test]
    fn each_peak_is_used_at_most_once() {
        // Two fragments with identical sequence mass, one peak
        let fragments = tryptic("GGKGGK");
        let ggk = 2.0 * 57.02146 + 128.09496 + 18.010565;
        let mut peaks = PeakSet::new(singly_charged(&[ggk]), Tolerance::Absolute(0.5));
        let result = PeakMatchEngine::new(MassMode::Monoisotopic)
            .match_fragments(&fragments, &mut peaks);
        assert_eq!(result.matched_peaks, 1);
        assert_eq!(peaks.used_count(), 1);
    }

    #[test]
    fn zero_peaks_is_no_match_not_an_error() {
        let fragments = tryptic("GGGKAAAR");
        let mut peaks = PeakSet::new(Vec::new(), Tolerance::Absolute(0.5));
        let result = PeakMatchEngine::new(MassMode::Monoisotopic)
            .match_fragments(&fragments, &mut peaks);
        assert_eq!(result.matched_peaks, 0);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn zero_tolerance_needs_an_exact_mass() {
        let fragments = tryptic("GGGK");
        let gggk = 3.0 * 57.02146 + 128.09496 + 18.010565;
        let mut close = PeakSet::new(
            singly_charged(&[gggk + 0.0001]),
            Tolerance::Absolute(0.0),
        );
        let result = PeakMatchEngine::new(MassMode::Monoisotopic)
            .match_fragments(&fragments, &mut close);
        assert_eq!(result.matched_peaks, 0);
    }

    #[test]
    fn reset_clears_the_claims() {
        let fragments = tryptic("GGGK");
        let gggk = 3.0 * 57.02146 + 128.09496 + 18.010565;
        let mut peaks = PeakSet::new(singly_charged(&[gggk]), Tolerance::Absolute(0.1));
        let engine = PeakMatchEngine::new(MassMode::Monoisotopic);
        assert_eq!(engine.match_fragments(&fragments, &mut peaks).matched_peaks, 1);
        assert_eq!(engine.match_fragments(&fragments, &mut peaks).matched_peaks, 0);
        peaks.reset();
        assert_eq!(engine.match_fragments(&fragments, &mut peaks).matched_peaks, 1);
    }

    #[test]
    fn mowse_rewards_rare_fragments() {
        let mut accumulator = MowseAccumulator::new();
        // Mass class 500..600 is common in 20 kDa proteins, 1200..1300 is rare
        for _ in 0..10 {
            accumulator.accumulate(550.0, 21_000.0);
        }
        accumulator.accumulate(1250.0, 21_000.0);
        let table = accumulator.freeze();

        assert!((table.weight(560.0, 20_500.0) - 0.1).abs() < 1e-12);
        assert!((table.weight(1290.0, 20_500.0) - 1.0).abs() < 1e-12);
        // An empty cell never divides by zero
        assert!((table.weight(90_000.0, 500_000.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mowse_protein_score_scales_with_protein_mass() {
        let mut accumulator = MowseAccumulator::new();
        let gggk = 3.0 * 57.02146 + 128.09496 + 18.010565;
        for _ in 0..5 {
            accumulator.accumulate(gggk, 25_000.0);
        }
        let table = accumulator.freeze();

        let fragments = tryptic("GGGK");
        let mut peaks = PeakSet::new(singly_charged(&[gggk]), Tolerance::Absolute(0.1));
        let result = PeakMatchEngine::new(MassMode::Monoisotopic).match_fragments_mowse(
            &fragments,
            &mut peaks,
            &table,
            25_000.0,
        );
        assert_eq!(result.matched_peaks, 1);
        // weight 1/5, scaled by 50 kDa / 25 kDa
        assert!((result.score - 0.2 * 2.0).abs() < 1e-12);
    }
}
