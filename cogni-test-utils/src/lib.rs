//! Cogni Test Utilities
//!
//! Shared test infrastructure for the Cogni workspace:
//! - Proptest generators for well-formed and malformed Cogni source
//! - Source fixtures for the documented parsing scenarios
//!
//! Generators produce source text, not ASTs, so the front-end under test is
//! always exercised from the lexer up.

/// Words the lexer reserves. Generated identifiers avoid them.
pub const RESERVED_WORDS: &[&str] = &[
    "goal", "priority", "agent", "model", "assistant", "think", "learn", "remember", "as",
    "recall", "forget", "reflect", "plugin", "intent", "debug", "trace", "inspect", "define",
    "end", "if", "else", "when", "for", "in", "while", "and", "or", "not", "true", "false",
];

/// Goal priority levels.
pub const PRIORITY_LEVELS: &[&str] = &["critical", "urgent", "high", "medium", "low"];

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Cogni source text.

    use super::*;
    use proptest::prelude::*;

    const BINARY_OPERATORS: &[&str] = &[
        "or", "and", "==", "!=", "<", "<=", ">", ">=", "+", "-", "*", "/", "%",
    ];
    const LABELLED_KEYWORDS: &[&str] = &["assistant", "think", "learn"];
    const MEMORY_KEYWORDS: &[&str] = &["recall", "forget"];
    const SELECTORS: &[&str] = &["", "tag: ", "pattern: "];
    const DEBUG_KEYWORDS: &[&str] = &["debug", "trace", "inspect"];
    const LOOP_KEYWORDS: &[&str] = &["when", "while"];
    const BLOCK_HEADERS: &[&str] = &["define f()", "if ready", "when ready", "while ready", "for x in xs"];

    // === Terminals ===

    /// A lowercase identifier that is never a reserved word.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,7}".prop_filter("reserved word", |s| !RESERVED_WORDS.contains(&s.as_str()))
    }

    /// A double-quoted string literal, sometimes with escapes.
    pub fn arb_string_literal() -> impl Strategy<Value = String> {
        let text = "[a-zA-Z0-9 .,!?%_-]{0,16}";
        prop_oneof![
            4 => text.prop_map(|s| format!("\"{}\"", s)),
            1 => (text, text).prop_map(|(a, b)| format!("\"{}\\n{}\\\"{}\"", a, b, a)),
        ]
    }

    pub fn arb_number_literal() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u32..10_000).prop_map(|n| n.to_string()),
            (0u32..1000, 0u32..1000).prop_map(|(whole, frac)| format!("{}.{}", whole, frac)),
        ]
    }

    pub fn arb_priority() -> impl Strategy<Value = &'static str> {
        prop::sample::select(PRIORITY_LEVELS)
    }

    pub fn arb_binary_operator() -> impl Strategy<Value = &'static str> {
        prop::sample::select(BINARY_OPERATORS)
    }

    // === Expressions ===

    /// A well-formed expression. Binary operations are always parenthesized,
    /// so comparisons never chain.
    pub fn arb_expression() -> impl Strategy<Value = String> {
        let leaf = prop_oneof![
            arb_number_literal(),
            arb_identifier(),
            arb_string_literal(),
            Just("true".to_string()),
            Just("false".to_string()),
        ];

        leaf.prop_recursive(3, 24, 3, |inner| {
            prop_oneof![
                (inner.clone(), arb_binary_operator(), inner.clone())
                    .prop_map(|(left, op, right)| format!("({} {} {})", left, op, right)),
                inner.clone().prop_map(|operand| format!("not {}", operand)),
                inner.clone().prop_map(|operand| format!("-{}", operand)),
                (arb_identifier(), prop::collection::vec(inner.clone(), 0..3))
                    .prop_map(|(name, args)| format!("{}({})", name, args.join(", "))),
                prop::collection::vec(inner.clone(), 0..3)
                    .prop_map(|items| format!("[{}]", items.join(", "))),
                (inner, arb_identifier())
                    .prop_map(|(receiver, method)| format!("({}).{}()", receiver, method)),
            ]
        })
    }

    // === Statements ===

    /// A single-line, non-block statement.
    pub fn arb_simple_statement() -> impl Strategy<Value = String> {
        let labelled_value = prop_oneof![arb_identifier(), arb_string_literal()];

        prop_oneof![
            (arb_string_literal(), prop::option::of(arb_priority())).prop_map(|(text, level)| {
                match level {
                    Some(level) => format!("goal: {} priority: {}", text, level),
                    None => format!("goal: {}", text),
                }
            }),
            labelled_value.clone().prop_map(|v| format!("agent: {}", v)),
            labelled_value.prop_map(|v| format!("model: {}", v)),
            (prop::sample::select(LABELLED_KEYWORDS), arb_string_literal())
                .prop_map(|(kw, text)| format!("{}: {}", kw, text)),
            (arb_string_literal(), prop::option::of(arb_string_literal())).prop_map(
                |(text, tags)| match tags {
                    Some(tags) => format!("remember({}) as {}", text, tags),
                    None => format!("remember({})", text),
                }
            ),
            (
                prop::sample::select(MEMORY_KEYWORDS),
                prop::sample::select(SELECTORS),
                arb_string_literal()
            )
                .prop_map(|(kw, selector, text)| format!("{} {}{}", kw, selector, text)),
            prop::option::of(arb_string_literal()).prop_map(|topic| match topic {
                Some(topic) => format!("reflect: {}", topic),
                None => "reflect".to_string(),
            }),
            (
                arb_identifier(),
                prop::option::of(prop::collection::vec(arb_expression(), 0..3))
            )
                .prop_map(|(name, args)| match args {
                    Some(args) => format!("plugin {}({})", name, args.join(", ")),
                    None => format!("plugin {}", name),
                }),
            (arb_string_literal(), arb_identifier())
                .prop_map(|(text, action)| format!("intent: {} -> {}", text, action)),
            (prop::sample::select(DEBUG_KEYWORDS), arb_expression())
                .prop_map(|(kw, expr)| format!("{} {}", kw, expr)),
            (arb_identifier(), arb_expression())
                .prop_map(|(name, expr)| format!("{} = {}", name, expr)),
            arb_expression(),
            "[a-z ]{0,20}".prop_map(|text| format!("# {}", text)),
        ]
    }

    /// A statement, possibly a block containing further statements. Block
    /// statements span several lines but are one statement.
    pub fn arb_statement() -> impl Strategy<Value = String> {
        arb_simple_statement().prop_recursive(2, 32, 4, |inner| {
            let body = prop::collection::vec(inner, 0..4);
            prop_oneof![
                (
                    arb_identifier(),
                    prop::collection::vec(arb_identifier(), 0..3),
                    body.clone()
                )
                    .prop_map(|(name, params, body)| {
                        format!("define {}({}):\n{}end", name, params.join(", "), lines(&body))
                    }),
                (arb_expression(), body.clone(), prop::option::of(body.clone())).prop_map(
                    |(cond, then, otherwise)| match otherwise {
                        Some(otherwise) => format!(
                            "if {}:\n{}else:\n{}end",
                            cond,
                            lines(&then),
                            lines(&otherwise)
                        ),
                        None => format!("if {}:\n{}end", cond, lines(&then)),
                    }
                ),
                (
                    prop::sample::select(LOOP_KEYWORDS),
                    arb_expression(),
                    body.clone()
                )
                    .prop_map(|(kw, cond, body)| format!("{} {}\n{}end", kw, cond, lines(&body))),
                (arb_identifier(), arb_expression(), body).prop_map(|(var, iter, body)| {
                    format!("for {} in {}:\n{}end", var, iter, lines(&body))
                }),
            ]
        })
    }

    /// A whole program and its number of top-level statements.
    pub fn arb_program() -> impl Strategy<Value = (String, usize)> {
        prop::collection::vec((arb_statement(), any::<bool>()), 0..10).prop_map(|statements| {
            let count = statements.len();
            let mut source = String::new();
            for (statement, blank_line) in statements {
                source.push_str(&statement);
                source.push('\n');
                if blank_line {
                    source.push('\n');
                }
            }
            (source, count)
        })
    }

    /// A program whose last block is missing its `end`.
    pub fn arb_unclosed_block() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(arb_statement(), 0..3),
            prop::sample::select(BLOCK_HEADERS),
            prop::collection::vec(arb_statement(), 0..3),
        )
            .prop_map(|(before, header, body)| {
                format!("{}{}:\n{}", lines(&before), header, lines(&body))
            })
    }

    /// Join statements one per line, each newline-terminated.
    fn lines(statements: &[String]) -> String {
        statements.iter().map(|s| format!("{}\n", s)).collect()
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Source fixtures for common scenarios.

    pub const GOAL_AND_AGENT: &str =
        "goal: \"improve system performance by 30%\" priority: high\nagent: auto";

    pub const REMEMBER_WITH_TAGS: &str = "remember(\"x\") as \"tag1\"";

    pub const FUNCTION_DEFINITION: &str = "define f():\n  think: \"y\"\nend";

    pub const IF_WITHOUT_ELSE: &str = "if x > 1:\n  debug \"hi\"\nend";

    pub const UNTERMINATED_STRING: &str = "goal: \"unterminated";

    pub const ONLY_COMMENT: &str = "# just a note";

    /// A program touching every statement form.
    pub const KITCHEN_SINK: &str = r#"# Research assistant
goal: "summarize the latest papers" priority: urgent
agent: researcher
model: "gpt-4"
assistant: "You are careful and concise"

remember("transformers scale well") as "ml"
recall tag: "ml"
forget pattern: "draft*"
reflect: "what did we miss?"

define summarize(topic, depth):
  think: "outline first"
  results = search.query(topic, depth)
  for paper in results:
    if paper.score() >= 0.8 and not paper.read():
      learn: "key finding"
      plugin notes(paper, [1, 2, 3])
    else:
      trace paper
    end
  end
end

when inbox.count() > 0:
  summarize("llm", 2)
end

count = 0
while count < 3 # bounded retry
  count = count + 1
end

intent: "publish the digest" -> publish
inspect count * -1
"#;

    /// Every fixture that must parse cleanly.
    pub fn valid_sources() -> Vec<&'static str> {
        vec![
            GOAL_AND_AGENT,
            REMEMBER_WITH_TAGS,
            FUNCTION_DEFINITION,
            IF_WITHOUT_ELSE,
            ONLY_COMMENT,
            KITCHEN_SINK,
        ]
    }
}
