//! Fuzz target for the Cogni lexer
//!
//! Arbitrary UTF-8 must tokenize without panicking, always end in `Eof`, and
//! report one diagnostic per synthesized error token.
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use cogni_dsl::{tokenize, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let (tokens, diagnostics) = tokenize(input);

    assert_eq!(
        tokens.last().map(|t| t.kind),
        Some(TokenKind::Eof),
        "token stream must end in Eof"
    );

    let error_tokens = tokens.iter().filter(|t| t.kind == TokenKind::Error).count();
    assert_eq!(error_tokens, diagnostics.len());

    for token in &tokens {
        assert!(token.span.start <= token.span.end);
        assert!(token.span.end <= input.len());
        assert!(token.span.line >= 1 && token.span.column >= 1);
    }
});
