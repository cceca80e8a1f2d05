//! The front-end pipeline: tokenize, parse, transform, check, validate

use crate::ast::{transform, AstNode};
use crate::config::{ConfigError, FrontendConfig};
use crate::error::{Diagnostic, Diagnostics, FrontendError};
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::validator::{check_contracts, structural_warnings, Statistics, ValidationReport};
use serde::Serialize;
use tracing::debug;

/// A successful parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed {
    /// Root `program` node, owned by the caller.
    pub ast: AstNode,
    /// Warnings only; errors would have rejected the parse.
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: Statistics,
}

/// Front-end entry point.
///
/// Holds only its configuration, which is fixed at construction, so one
/// instance can serve any number of calls from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Frontend {
    config: FrontendConfig,
}

impl Frontend {
    /// Create a front-end with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a front-end with a validated configuration.
    pub fn with_config(config: FrontendConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    /// Parse `source` into an AST.
    ///
    /// Lexical, syntax and internal errors reject the whole parse; no partial
    /// tree is ever returned.
    pub fn parse(&self, source: &str) -> Result<Parsed, Diagnostics> {
        let (tokens, lex_diagnostics) = tokenize(source);
        debug!(bytes = source.len(), tokens = tokens.len(), "parse started");

        if !lex_diagnostics.is_empty() {
            debug!(errors = lex_diagnostics.len(), "parse rejected: lexical errors");
            return Err(Diagnostics(lex_diagnostics));
        }

        let tree = Parser::new(tokens)
            .with_limits(self.config.max_block_depth, self.config.max_expression_depth)
            .parse()
            .map_err(reject)?;
        let ast = transform(&tree).map_err(reject)?;
        check_contracts(&ast).map_err(reject)?;

        let diagnostics = if self.config.structural_warnings {
            structural_warnings(&ast)
        } else {
            Vec::new()
        };
        let statistics = Statistics::collect(&ast);

        debug!(
            statements = ast.children.len(),
            nodes = statistics.total_nodes,
            warnings = diagnostics.len(),
            "parse finished"
        );

        Ok(Parsed {
            ast,
            diagnostics,
            statistics,
        })
    }

    /// Parse `source` and report every diagnostic plus statistics.
    pub fn validate(&self, source: &str) -> ValidationReport {
        match self.parse(source) {
            Ok(parsed) => ValidationReport {
                valid: true,
                diagnostics: parsed.diagnostics,
                statistics: Some(parsed.statistics),
            },
            Err(diagnostics) => ValidationReport {
                valid: false,
                diagnostics: diagnostics.into_vec(),
                statistics: None,
            },
        }
    }

    pub fn statistics(&self, ast: &AstNode) -> Statistics {
        Statistics::collect(ast)
    }
}

fn reject(err: FrontendError) -> Diagnostics {
    debug!(error = %err, "parse rejected");
    Diagnostics::from(err)
}
