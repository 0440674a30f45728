pub mod automaton;
pub mod error;
pub mod grammar;
pub mod preset;
pub mod render;

pub use automaton::{Definition, Dfa, Run, StateId, Step};
pub use error::{Error, Malformation, Result};
pub use preset::Preset;
