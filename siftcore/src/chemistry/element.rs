use serde::{Deserialize, Serialize};

use crate::chemistry::MassMode;

/// The elements that occur in protein and peptide chemistry. The masses are the values of the
/// most recent IUPAC/CIAAW evaluation, monoisotopic masses are for the lightest stable isotope.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Element {
    /// Hydrogen
    H,
    /// Carbon
    C,
    /// Nitrogen
    N,
    /// Oxygen
    O,
    /// Phosphorus
    P,
    /// Sulfur
    S,
    /// Selenium
    Se,
}

impl Element {
    /// All elements in the order used for storage and display.
    pub const ALL: [Self; 7] = [
        Self::H,
        Self::C,
        Self::N,
        Self::O,
        Self::P,
        Self::S,
        Self::Se,
    ];

    /// The mass of the lightest stable isotope of this element.
    pub const fn monoisotopic_mass(self) -> f64 {
        match self {
            Self::H => 1.007825031898,
            Self::C => 12.0,
            Self::N => 14.003074004251,
            Self::O => 15.994914619257,
            Self::P => 30.97376199768,
            Self::S => 31.972071174,
            Self::Se => 79.916521761,
        }
    }

    /// The standard atomic weight of this element.
    pub const fn average_weight(self) -> f64 {
        match self {
            Self::H => 1.008,
            Self::C => 12.011,
            Self::N => 14.007,
            Self::O => 15.999,
            Self::P => 30.973761998,
            Self::S => 32.06,
            Self::Se => 78.971,
        }
    }

    /// The nominal (integer) mass of the lightest stable isotope.
    pub const fn nominal_mass(self) -> i32 {
        match self {
            Self::H => 1,
            Self::C => 12,
            Self::N => 14,
            Self::O => 16,
            Self::P => 31,
            Self::S => 32,
            Self::Se => 80,
        }
    }

    /// Get the mass of this element in the given mode.
    pub const fn mass(self, mode: MassMode) -> f64 {
        match mode {
            MassMode::Monoisotopic => self.monoisotopic_mass(),
            MassMode::Average => self.average_weight(),
        }
    }

    /// The one or two letter symbol for this element.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::H => "H",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::P => "P",
            Self::S => "S",
            Self::Se => "Se",
        }
    }

    /// Parse an element symbol, case sensitive.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.symbol() == symbol)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
