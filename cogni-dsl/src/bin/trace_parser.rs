/// Cogni Parser Tracer - Shows the flow through Tokens → Parse → AST
///
/// Usage: cargo run --bin trace_parser <source-file>
///
/// Set RUST_LOG (default `cogni_dsl=info`) to see the front-end's own logs.

use cogni_dsl::{pretty_print, tokenize, Frontend, FrontendConfig};
use std::fs;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cogni_dsl=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_parser <source-file>");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_parser programs/main.cog");
        std::process::exit(1);
    }

    let path = &args[1];

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ COGNI PARSER TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    let source = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    println!("📝 INPUT:");
    println!("{}", source);
    println!();

    // Step 1: tokens
    println!("🔤 TOKENS:");
    println!("─────────────────────────────────────────────────────────────");
    let (tokens, lex_diagnostics) = tokenize(&source);
    for token in &tokens {
        println!(
            "{:>4}:{:<3} {:<12} {:?}",
            token.span.line,
            token.span.column,
            format!("{:?}", token.kind),
            token.lexeme
        );
    }
    for diagnostic in &lex_diagnostics {
        println!("⚠️  {}", diagnostic);
    }
    println!();

    // Step 2: parse
    let frontend = match Frontend::with_config(FrontendConfig::from_env()) {
        Ok(frontend) => frontend,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    match frontend.parse(&source) {
        Ok(parsed) => {
            println!("🌳 AST:");
            println!("─────────────────────────────────────────────────────────────");
            match serde_json::to_string_pretty(&parsed.ast) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("(failed to serialize AST: {})", e),
            }
            println!();

            if !parsed.diagnostics.is_empty() {
                println!("⚠️  WARNINGS:");
                println!("─────────────────────────────────────────────────────────────");
                for diagnostic in &parsed.diagnostics {
                    println!("{}", diagnostic);
                }
                println!();
            }

            println!("📊 STATISTICS:");
            println!("─────────────────────────────────────────────────────────────");
            println!("{:#?}", parsed.statistics);
            println!();

            // Step 3: round-trip
            println!("🔄 ROUND-TRIP TEST:");
            println!("─────────────────────────────────────────────────────────────");
            let canonical = pretty_print(&parsed.ast);
            println!("Canonical source:");
            println!("{}", canonical);

            match frontend.parse(&canonical) {
                Ok(reparsed) if reparsed.ast == parsed.ast => println!("✅ Parse succeeded!"),
                Ok(_) => println!("❌ Round-trip produced a different AST"),
                Err(diagnostics) => println!("❌ Canonical source failed to parse:\n{}", diagnostics),
            }
        }
        Err(diagnostics) => {
            println!("❌ Parse failed:");
            println!("{}", diagnostics);
            std::process::exit(2);
        }
    }
}
