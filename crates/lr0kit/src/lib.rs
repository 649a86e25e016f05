//! LR(0) automaton construction and parse table generation.

pub mod automaton;
pub mod conflict;
pub mod grammar;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;
