use std::fmt::Write;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::chemistry::{Element, MassMode};

/// A molecular formula, a collection of elements with counts. Counts can be negative to
/// express mass differences.
#[derive(
    Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct MolecularFormula {
    /// Sorted by element, deduplicated, no zero counts.
    elements: Vec<(Element, i32)>,
}

/// Create a [`MolecularFormula`](crate::chemistry::MolecularFormula) from a list of element
/// count pairs: `molecular_formula!(H 5 C 3 O 1 N 1)`.
#[macro_export]
macro_rules! molecular_formula {
    ($($element:ident $count:literal)*) => {
        $crate::chemistry::MolecularFormula::new(&[
            $(($crate::chemistry::Element::$element, $count)),*
        ])
    };
}

impl MolecularFormula {
    /// Create a new molecular formula. Duplicate elements are merged and zero counts dropped.
    pub fn new(elements: &[(Element, i32)]) -> Self {
        let mut result = Self::default();
        for pair in elements.iter().copied() {
            result.add(pair);
        }
        result
    }

    /// Add the given count of an element to this formula.
    pub fn add(&mut self, (element, count): (Element, i32)) {
        if count == 0 {
            return;
        }
        match self.elements.binary_search_by_key(&element, |p| p.0) {
            Ok(index) => {
                self.elements[index].1 += count;
                if self.elements[index].1 == 0 {
                    self.elements.remove(index);
                }
            }
            Err(index) => self.elements.insert(index, (element, count)),
        }
    }

    /// The count for the given element, 0 if absent.
    pub fn count(&self, element: Element) -> i32 {
        self.elements
            .binary_search_by_key(&element, |p| p.0)
            .map_or(0, |index| self.elements[index].1)
    }

    /// True if no elements are present.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements with their counts.
    pub fn elements(&self) -> &[(Element, i32)] {
        &self.elements
    }

    /// The mass of this formula with all elements as their lightest stable isotope.
    pub fn monoisotopic_mass(&self) -> f64 {
        self.elements
            .iter()
            .map(|(e, n)| e.monoisotopic_mass() * f64::from(*n))
            .sum()
    }

    /// The average weight of this formula.
    pub fn average_weight(&self) -> f64 {
        self.elements
            .iter()
            .map(|(e, n)| e.average_weight() * f64::from(*n))
            .sum()
    }

    /// Get the mass in the given mode.
    pub fn mass(&self, mode: MassMode) -> f64 {
        match mode {
            MassMode::Monoisotopic => self.monoisotopic_mass(),
            MassMode::Average => self.average_weight(),
        }
    }

    /// The nominal (integer) mass of this formula.
    pub fn nominal_mass(&self) -> i32 {
        self.elements
            .iter()
            .map(|(e, n)| e.nominal_mass() * n)
            .sum()
    }

    /// The number of rings plus double bonds implied by this formula. Negative or fractional
    /// values indicate an impossible neutral molecule.
    pub fn double_bond_equivalents(&self) -> f64 {
        f64::from(self.count(Element::C))
            + 1.0
            + f64::from(self.count(Element::N) + self.count(Element::P)) / 2.0
            - f64::from(self.count(Element::H)) / 2.0
    }

    /// Create a [Hill notation](https://en.wikipedia.org/wiki/Chemical_formula#Hill_system)
    /// rendering of this formula: carbon first, hydrogen second, all others alphabetically.
    pub fn hill_notation(&self) -> String {
        let mut buffer = String::new();
        let mut write_element = |(element, count): (Element, i32)| {
            if count == 1 {
                write!(buffer, "{element}").unwrap();
            } else if count != 0 {
                write!(buffer, "{element}{count}").unwrap();
            }
        };
        write_element((Element::C, self.count(Element::C)));
        write_element((Element::H, self.count(Element::H)));
        for (element, count) in self
            .elements
            .iter()
            .filter(|(e, _)| *e != Element::C && *e != Element::H)
            .sorted_by_key(|(e, _)| e.symbol())
        {
            write_element((*element, *count));
        }
        buffer
    }
}

impl std::fmt::Display for MolecularFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hill_notation())
    }
}

impl std::ops::Add for MolecularFormula {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        for pair in rhs.elements {
            MolecularFormula::add(&mut self, pair);
        }
        self
    }
}

impl std::ops::AddAssign<&Self> for MolecularFormula {
    fn add_assign(&mut self, rhs: &Self) {
        for pair in &rhs.elements {
            self.add(*pair);
        }
    }
}

impl std::ops::Mul<i32> for &MolecularFormula {
    type Output = MolecularFormula;
    fn mul(self, rhs: i32) -> MolecularFormula {
        MolecularFormula {
            elements: if rhs == 0 {
                Vec::new()
            } else {
                self.elements.iter().map(|(e, n)| (*e, n * rhs)).collect()
            },
        }
    }
}

impl std::iter::Sum for MolecularFormula {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, f| acc + f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_and_drop_zero() {
        let formula = MolecularFormula::new(&[
            (Element::H, 2),
            (Element::O, 1),
            (Element::H, -2),
        ]);
        assert_eq!(formula.count(Element::H), 0);
        assert_eq!(formula.count(Element::O), 1);
    }

    #[test]
    fn glycine_residue() {
        let glycine = molecular_formula!(H 3 C 2 O 1 N 1);
        assert!((glycine.monoisotopic_mass() - 57.02146).abs() < 1e-4);
        assert_eq!(glycine.nominal_mass(), 57);
        assert_eq!(glycine.hill_notation(), "C2H3NO");
    }

    #[test]
    fn dbe_methane_and_benzene() {
        assert!((molecular_formula!(C 1 H 4).double_bond_equivalents()).abs() < f64::EPSILON);
        assert!(
            (molecular_formula!(C 6 H 6).double_bond_equivalents() - 4.0).abs() < f64::EPSILON
        );
    }
}
