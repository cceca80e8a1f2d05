//! Parser module for the Cogni language

mod expr;
pub mod parser;
pub mod tree;

pub use parser::*;
pub use tree::*;
