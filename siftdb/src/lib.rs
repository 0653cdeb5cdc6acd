#![doc = include_str!("../README.md")]
// Only used by the siftdb-build binary
use clap as _;
use stderrlog as _;

mod database;
mod error;
mod frame;
mod index;

pub use database::*;
pub use error::*;
pub use frame::*;
pub use index::*;
