#![doc = include_str!("../README.md")]

/// Contains all things related to the underlying chemistry.
pub mod chemistry;
/// Contains all things related to tolerances on masses and other measured quantities.
pub mod quantities;
/// Contains all things related to sequences, amongst others amino acids, proteases and digestion.
pub mod sequence;

/// A subset of the types that are envisioned to be used the most, importing this is a good
/// starting point for working with the crate
pub mod prelude {
    pub use crate::chemistry::{Element, MassMode, MolecularFormula};
    pub use crate::molecular_formula;
    pub use crate::quantities::Tolerance;
    pub use crate::sequence::{
        AminoAcid, DigestParameters, Enzyme, EnzymeFragment, EnzymeRegistry, Protease, digest,
    };
}
