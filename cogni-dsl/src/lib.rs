//! Cogni DSL - Front-end for the Cogni cognitive-programming language
//!
//! This crate turns Cogni source text (goals, agent directives, memory
//! operations, plugin calls, control flow, functions, debug statements) into a
//! uniform AST, with positional diagnostics and statistics.
//!
//! Architecture:
//! ```text
//! Source text
//!     ↓
//! Lexer (tokens + lex diagnostics)
//!     ↓
//! Parser (dispatch on leading keyword, explicit block stack → parse tree)
//!     ↓
//! Transformer (parse tree → AST, exhaustive over grammar rules)
//!     ↓
//! Validator (node contracts, structural warnings, statistics)
//!     ↓
//! Pretty Printer (canonical source, for round-trip testing)
//! ```
//!
//! ```
//! let parsed = cogni_dsl::parse("goal: \"ship it\"\nagent: auto\n")?;
//! assert_eq!(parsed.ast.children.len(), 2);
//! assert_eq!(parsed.ast.children[0].meta_str("priority"), Some("medium"));
//! # Ok::<(), cogni_dsl::Diagnostics>(())
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod frontend;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod pretty_printer;
pub mod validator;

// Re-export key types for convenience
pub use ast::{AstNode, NodeType, NodeValue, Scalar};
pub use config::{ConfigError, FrontendConfig};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, FrontendError, Severity};
pub use frontend::{Frontend, Parsed};
pub use lexer::{tokenize, Span, Token, TokenKind};
pub use pretty_printer::pretty_print;
pub use validator::{Statistics, ValidationReport};

/// Parse `source` with the default configuration.
pub fn parse(source: &str) -> Result<Parsed, Diagnostics> {
    Frontend::new().parse(source)
}

/// Parse `source` and report every diagnostic, with default configuration.
pub fn validate(source: &str) -> ValidationReport {
    Frontend::new().validate(source)
}

/// Statistics for an already-parsed AST.
pub fn statistics(ast: &AstNode) -> Statistics {
    Statistics::collect(ast)
}
