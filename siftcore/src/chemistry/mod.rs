mod element;
#[macro_use]
mod formula;
mod mass_mode;

pub use element::*;
pub use formula::*;
pub use mass_mode::*;

/// The mass of a proton, the charge carrier in positive mode electrospray.
pub const PROTON_MASS: f64 = 1.007276466879;
