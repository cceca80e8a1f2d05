//! Property-Based Tests for the Cogni front-end
//!
//! Properties:
//! - Parsing is deterministic (AST and statistics)
//! - Top-level statement count equals the number of statements written
//! - Any block missing its `end` is a syntax error
//! - Canonical printing then parsing yields an equal AST
//! - Arbitrary input never panics; failures always carry located errors

use cogni_dsl::{parse, pretty_print, DiagnosticKind, NodeType};
use cogni_test_utils::generators::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_parse_is_deterministic((source, _) in arb_program()) {
        let first = parse(&source);
        let second = parse(&source);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_generated_programs_parse((source, count) in arb_program()) {
        let parsed = match parse(&source) {
            Ok(parsed) => parsed,
            Err(diagnostics) => {
                return Err(TestCaseError::fail(format!("{}\n---\n{}", diagnostics, source)));
            }
        };
        prop_assert!(parsed.diagnostics.iter().all(|d| !d.is_error()));
        prop_assert_eq!(parsed.ast.node_type, NodeType::Program);
        prop_assert_eq!(parsed.ast.children.len(), count);
    }

    #[test]
    fn prop_unclosed_block_is_syntax_error(source in arb_unclosed_block()) {
        let result = parse(&source);
        prop_assert!(result.is_err(), "accepted:\n{}", source);
        if let Err(diagnostics) = result {
            prop_assert!(diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::SyntaxError));
        }
    }

    #[test]
    fn prop_pretty_print_round_trip((source, _) in arb_program()) {
        let parsed = match parse(&source) {
            Ok(parsed) => parsed,
            Err(diagnostics) => {
                return Err(TestCaseError::fail(format!("{}\n---\n{}", diagnostics, source)));
            }
        };
        let printed = pretty_print(&parsed.ast);
        let reparsed = match parse(&printed) {
            Ok(reparsed) => reparsed,
            Err(diagnostics) => {
                return Err(TestCaseError::fail(format!("{}\n---\n{}", diagnostics, printed)));
            }
        };
        prop_assert_eq!(&reparsed.ast, &parsed.ast);
        prop_assert_eq!(reparsed.statistics, parsed.statistics);
    }

    #[test]
    fn prop_expression_statements_round_trip(expr in arb_expression()) {
        let source = format!("x = {}\n", expr);
        let parsed = match parse(&source) {
            Ok(parsed) => parsed,
            Err(diagnostics) => {
                return Err(TestCaseError::fail(format!("{}\n---\n{}", diagnostics, source)));
            }
        };
        let printed = pretty_print(&parsed.ast);
        let reparsed = parse(&printed).map(|p| p.ast);
        prop_assert_eq!(reparsed, Ok(parsed.ast));
    }

    #[test]
    fn prop_arbitrary_input_never_panics(source in "\\PC{0,64}") {
        if let Err(diagnostics) = parse(&source) {
            prop_assert!(diagnostics.errors().count() >= 1);
            for diagnostic in &diagnostics {
                prop_assert!(diagnostic.span.line >= 1);
                prop_assert!(diagnostic.span.column >= 1);
                prop_assert!(diagnostic.span.start <= source.len());
            }
        }
    }

    #[test]
    fn prop_tokens_end_with_eof(source in "[ -~\\n]{0,64}") {
        let (tokens, _) = cogni_dsl::tokenize(&source);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(cogni_dsl::TokenKind::Eof));
    }
}
