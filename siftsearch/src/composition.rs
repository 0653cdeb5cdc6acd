use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use siftcore::chemistry::{Element, MassMode, MolecularFormula};
use siftcore::sequence::AminoAcid;

/// One combination of alphabet symbols whose summed weight landed inside the search window.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CombinationHit {
    /// The symbols with their counts, in alphabet order, zero counts omitted.
    pub counts: Vec<(String, u32)>,
    /// The summed weight of the combination.
    pub mass: f64,
}

impl std::fmt::Display for CombinationHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, count) in &self.counts {
            if *count == 1 {
                write!(f, "{label}")?;
            } else {
                write!(f, "{label}{count}")?;
            }
        }
        write!(f, " {:.5}", self.mass)
    }
}

/// The outcome of a composition search. `truncated` is not an error: the hits gathered up to
/// the cap are valid, callers are expected to check the flag and warn.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CompositionHits {
    /// The hits, sorted by mass.
    pub hits: Vec<CombinationHit>,
    /// Whether enumeration stopped at the hit cap.
    pub truncated: bool,
}

/// Chemical plausibility bounds applied when the alphabet is elemental: formulas violating
/// the nitrogen parity rule or falling outside the ring plus double bond range are discarded
/// before they materialize as hits.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ElementalFilter {
    /// The elements of the alphabet, parallel to the symbol list.
    pub elements: Vec<Element>,
    /// The lowest acceptable number of rings plus double bonds.
    pub dbe_min: f64,
    /// The highest acceptable number of rings plus double bonds.
    pub dbe_max: f64,
}

impl ElementalFilter {
    fn accepts(&self, counts: &[u32]) -> bool {
        let formula = MolecularFormula::new(
            &self
                .elements
                .iter()
                .zip(counts)
                .map(|(element, count)| (*element, *count as i32))
                .collect_vec(),
        );
        // Nitrogen rule: nominal mass parity must equal nitrogen count parity
        if formula.nominal_mass() % 2 != formula.count(Element::N) % 2 {
            return false;
        }
        let dbe = formula.double_bond_equivalents();
        dbe.fract() == 0.0 && (self.dbe_min..=self.dbe_max).contains(&dbe)
    }
}

/// Enumerates all non negative integer combinations of the alphabet whose weighted sum falls
/// inside `[target - tolerance, target + tolerance]`, by depth first branch and bound over
/// symbol indices. The recursion state lives in an explicit [`SolveState`] threaded through
/// the calls.
#[derive(Clone, Debug)]
pub struct CompositionSearch {
    /// Sorted heaviest first, the traversal order; the labels keep the caller's spelling.
    symbols: Vec<(String, f64)>,
    elemental: Option<ElementalFilter>,
}

struct SolveState {
    low: f64,
    high: f64,
    /// A partial sum above this cannot be extended back into the window by any symbol.
    continue_mass: f64,
    max_hits: usize,
    counts: Vec<u32>,
    hits: Vec<(OrderedFloat<f64>, Vec<u32>)>,
    truncated: bool,
}

impl CompositionSearch {
    /// A search over an arbitrary alphabet of weighted symbols.
    pub fn new<S: AsRef<str>>(alphabet: &[(S, f64)]) -> Self {
        Self {
            symbols: alphabet
                .iter()
                .map(|(label, weight)| (label.as_ref().to_string(), *weight))
                .sorted_by_key(|(_, weight)| std::cmp::Reverse(OrderedFloat(*weight)))
                .collect_vec(),
            elemental: None,
        }
    }

    /// A search over the canonical amino acid residues.
    pub fn amino_acids(mode: MassMode) -> Self {
        Self::new(
            &AminoAcid::CANONICAL
                .iter()
                .map(|aa| (aa.char().to_string(), aa.residue_mass(mode)))
                .collect_vec(),
        )
    }

    /// A search over elemental formulas with the chemical plausibility filter enabled.
    pub fn elements(elements: &[Element], mode: MassMode, dbe_min: f64, dbe_max: f64) -> Self {
        let mut search = Self::new(
            &elements
                .iter()
                .map(|element| (element.symbol().to_string(), element.mass(mode)))
                .collect_vec(),
        );
        // The symbols were reordered by weight, keep the element list parallel
        let ordered = search
            .symbols
            .iter()
            .map(|(label, _)| {
                Element::from_symbol(label).expect("the labels come from element symbols")
            })
            .collect_vec();
        search.elemental = Some(ElementalFilter {
            elements: ordered,
            dbe_min,
            dbe_max,
        });
        search
    }

    /// Run the search. `tolerance` is an absolute window in the unit of the weights;
    /// relative tolerances are converted by the caller. Enumeration halts once `max_hits`
    /// hits are gathered, signaled by the `truncated` flag.
    pub fn solve(&self, target: f64, tolerance: f64, max_hits: usize) -> CompositionHits {
        let lightest = self
            .symbols
            .iter()
            .map(|(_, weight)| OrderedFloat(*weight))
            .min()
            .map_or(0.0, |w| w.0);
        let mut state = SolveState {
            low: target - tolerance,
            high: target + tolerance,
            continue_mass: target + tolerance - lightest,
            max_hits,
            counts: vec![0; self.symbols.len()],
            hits: Vec::new(),
            truncated: false,
        };
        if !self.symbols.is_empty() && lightest > 0.0 {
            self.extend(&mut state, 0, 0.0);
        }

        state.hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        CompositionHits {
            hits: state
                .hits
                .into_iter()
                .map(|(mass, counts)| CombinationHit {
                    counts: self
                        .symbols
                        .iter()
                        .zip(&counts)
                        .filter(|(_, count)| **count > 0)
                        .map(|((label, _), count)| (label.clone(), *count))
                        .collect_vec(),
                    mass: mass.0,
                })
                .collect_vec(),
            truncated: state.truncated,
        }
    }

    /// Try every count of symbol `level` on top of the partial sum, emitting when the sum
    /// lands in the window and descending while it can still get back there.
    fn extend(&self, state: &mut SolveState, level: usize, partial: f64) {
        let weight = self.symbols[level].1;
        let mut partial = partial;
        let mut count = 0;
        loop {
            if count > 0 && partial >= state.low && partial <= state.high {
                state.counts[level] = count;
                self.emit(state, partial);
                if state.truncated {
                    break;
                }
            }
            if level + 1 < self.symbols.len() && partial <= state.continue_mass {
                state.counts[level] = count;
                self.extend(state, level + 1, partial);
                if state.truncated {
                    break;
                }
            }
            if partial + weight > state.high {
                break;
            }
            partial += weight;
            count += 1;
        }
        state.counts[level] = 0;
    }

    fn emit(&self, state: &mut SolveState, mass: f64) {
        if self
            .elemental
            .as_ref()
            .is_some_and(|filter| !filter.accepts(&state.counts))
        {
            return;
        }
        if state.hits.len() >= state.max_hits {
            state.truncated = true;
            return;
        }
        state.hits.push((OrderedFloat(mass), state.counts.clone()));
    }
}
