//! Lexer module for the Cogni language

pub mod token;
pub mod scanner;

pub use token::*;
pub use scanner::*;

use crate::error::Diagnostic;

/// Tokenize `source`. Never fails; lexical problems come back as diagnostics
/// alongside synthesized `Error` tokens.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).tokenize()
}
