use serde::{Deserialize, Serialize};

/// The mode of mass to use.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum MassMode {
    /// Monoisotopic mass, every element is taken as its lightest stable isotope.
    #[default]
    Monoisotopic,
    /// Average weight, the average between all occurring isotopes.
    Average,
}

impl std::fmt::Display for MassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Monoisotopic => "monoisotopic",
                Self::Average => "average",
            }
        )
    }
}
