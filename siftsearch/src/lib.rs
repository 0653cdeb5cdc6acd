#![doc = include_str!("../README.md")]

mod approximate;
mod composition;
mod limits;
mod peak_match;

pub use approximate::*;
pub use composition::*;
pub use limits::*;
pub use peak_match::*;
