//! Fuzz target for the Cogni front-end
//!
//! Arbitrary UTF-8 must parse to either an AST or a non-empty list of
//! located errors, and every accepted program must survive a pretty-print
//! round trip.
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use cogni_dsl::{parse, pretty_print, NodeType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    match parse(input) {
        Ok(parsed) => {
            assert_eq!(parsed.ast.node_type, NodeType::Program);
            assert!(parsed.diagnostics.iter().all(|d| !d.is_error()));

            let printed = pretty_print(&parsed.ast);
            match parse(&printed) {
                Ok(reparsed) => assert_eq!(reparsed.ast, parsed.ast),
                Err(diagnostics) => panic!("canonical source rejected: {}", diagnostics),
            }
        }
        Err(diagnostics) => {
            assert!(diagnostics.errors().count() >= 1);
            for diagnostic in &diagnostics {
                assert!(diagnostic.span.line >= 1 && diagnostic.span.column >= 1);
                assert!(!diagnostic.message.is_empty());
            }
        }
    }
});
