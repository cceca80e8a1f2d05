//! Grammar definition: terminals, rule tags and operator precedence
//!
//! ```text
//! program    := { NEWLINE | statement terminator }
//! terminator := NEWLINE | EOF | COMMENT (not consumed)
//! statement  := goal | agent | model | assistant | think | learn | remember
//!             | recall | forget | reflect | plugin | intent | debug | comment
//!             | function | if | when | for | while | simple
//! goal       := "goal" ":" STRING [ "priority" ":" LEVEL ]
//! agent      := "agent" ":" (IDENT | STRING)
//! model      := "model" ":" (IDENT | STRING)
//! assistant  := "assistant" ":" STRING
//! think      := "think" ":" STRING
//! learn      := "learn" ":" STRING
//! remember   := "remember" "(" STRING ")" [ "as" STRING ]
//! recall     := "recall" selector
//! forget     := "forget" selector
//! selector   := STRING | "tag" ":" STRING | "pattern" ":" STRING
//! reflect    := "reflect" [ ":" STRING ]
//! plugin     := "plugin" (IDENT | STRING) [ "(" [args] ")" ]
//! intent     := "intent" ":" STRING "->" IDENT
//! debug      := ("debug" | "trace" | "inspect") expression
//! function   := "define" IDENT "(" [ IDENT { "," IDENT } ] ")" [":"] NEWLINE body "end"
//! if         := "if" expression [":"] NEWLINE body [ "else" [":"] NEWLINE body ] "end"
//! when       := "when" expression [":"] NEWLINE body "end"
//! for        := "for" IDENT "in" expression [":"] NEWLINE body "end"
//! while      := "while" expression [":"] NEWLINE body "end"
//! simple     := expression [ "=" expression ]
//!
//! expression := or
//! or         := and { "or" and }
//! and        := comparison { "and" comparison }
//! comparison := additive [ ("=="|"!="|"<"|"<="|">"|">=") additive ]
//! additive   := term { ("+"|"-") term }
//! term       := unary { ("*"|"/"|"%") unary }
//! unary      := ("-" | "not") unary | postfix
//! postfix    := atom { "." IDENT "(" [args] ")" }
//! atom       := NUMBER | STRING | "true" | "false" | IDENT [ "(" [args] ")" ]
//!             | "(" expression ")" | "[" [args] "]"
//! args       := expression { "," expression } [","]
//! ```
//!
//! Every statement form is selected by its first token. Declarations are only
//! introduced by `define`, so `name(...)` is always a call. An assignment is
//! recognised by the `=` that follows an already-reduced bare identifier.

use crate::lexer::TokenKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

// ============================================================================
// TERMINALS
// ============================================================================

/// Keyword table, built once. Keywords are matched case-insensitively.
pub static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("goal", TokenKind::Goal),
        ("priority", TokenKind::Priority),
        ("agent", TokenKind::Agent),
        ("model", TokenKind::Model),
        ("assistant", TokenKind::Assistant),
        ("think", TokenKind::Think),
        ("learn", TokenKind::Learn),
        ("remember", TokenKind::Remember),
        ("as", TokenKind::As),
        ("recall", TokenKind::Recall),
        ("forget", TokenKind::Forget),
        ("reflect", TokenKind::Reflect),
        ("plugin", TokenKind::Plugin),
        ("intent", TokenKind::Intent),
        ("debug", TokenKind::Debug),
        ("trace", TokenKind::Trace),
        ("inspect", TokenKind::Inspect),
        ("define", TokenKind::Define),
        ("end", TokenKind::End),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("when", TokenKind::When),
        ("for", TokenKind::For),
        ("in", TokenKind::In),
        ("while", TokenKind::While),
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("not", TokenKind::Not),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
    ])
});

/// Look up a keyword for an identifier-shaped lexeme.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    KEYWORDS.get(ident.to_ascii_lowercase().as_str()).copied()
}

/// Goal priority levels, highest first.
pub const PRIORITY_LEVELS: [&str; 5] = ["critical", "urgent", "high", "medium", "low"];

/// Priority applied to a goal written without a `priority:` clause.
pub const DEFAULT_PRIORITY: &str = "medium";

/// Contextual selector names accepted after `recall` / `forget`.
pub const SELECTOR_TAG: &str = "tag";
pub const SELECTOR_PATTERN: &str = "pattern";

/// Tokens that may begin an expression.
pub const EXPRESSION_START: &[TokenKind] = &[
    TokenKind::Number,
    TokenKind::String,
    TokenKind::Identifier,
    TokenKind::True,
    TokenKind::False,
    TokenKind::LParen,
    TokenKind::LBracket,
    TokenKind::Minus,
    TokenKind::Not,
];

/// Tokens that end a simple statement.
pub const TERMINATORS: &[TokenKind] = &[TokenKind::Newline, TokenKind::Comment, TokenKind::Eof];

/// Leading keywords that select a statement production.
pub const STATEMENT_KEYWORDS: &[TokenKind] = &[
    TokenKind::Goal,
    TokenKind::Agent,
    TokenKind::Model,
    TokenKind::Assistant,
    TokenKind::Think,
    TokenKind::Learn,
    TokenKind::Remember,
    TokenKind::Recall,
    TokenKind::Forget,
    TokenKind::Reflect,
    TokenKind::Plugin,
    TokenKind::Intent,
    TokenKind::Debug,
    TokenKind::Trace,
    TokenKind::Inspect,
    TokenKind::Define,
    TokenKind::If,
    TokenKind::When,
    TokenKind::For,
    TokenKind::While,
];

// ============================================================================
// RULE TAGS
// ============================================================================

/// Grammar production that produced a parse node.
///
/// The transformer matches exhaustively over this enum, so every production
/// has exactly one AST-construction arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Program,

    // Statements
    Goal,
    Agent,
    Model,
    Assistant,
    Think,
    Learn,
    Remember,
    Recall,
    Forget,
    Reflect,
    Plugin,
    Intent,
    Debug,
    Comment,
    Function,
    If,
    ElseClause,
    When,
    For,
    While,
    Assignment,
    ExpressionStatement,

    // Sub-clauses
    Parameters,
    Arguments,

    // Expressions
    Binary,
    Unary,
    MethodCall,
    Call,
    Array,
    Group,
    Literal,
}

impl Rule {
    /// Block production opened by a leading keyword, if any.
    pub fn block_for(kind: TokenKind) -> Option<Rule> {
        match kind {
            TokenKind::Define => Some(Rule::Function),
            TokenKind::If => Some(Rule::If),
            TokenKind::When => Some(Rule::When),
            TokenKind::For => Some(Rule::For),
            TokenKind::While => Some(Rule::While),
            _ => None,
        }
    }

    /// Keyword shown in block-related diagnostics.
    pub fn keyword(self) -> &'static str {
        match self {
            Rule::Function => "define",
            Rule::If => "if",
            Rule::ElseClause => "else",
            Rule::When => "when",
            Rule::For => "for",
            Rule::While => "while",
            _ => "statement",
        }
    }
}

// ============================================================================
// OPERATOR PRECEDENCE
// ============================================================================

/// Binding strength of binary operators, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Or,
    And,
    Comparison,
    Additive,
    Multiplicative,
}

impl Precedence {
    /// Precedence of a binary operator token.
    pub fn of(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Or => Some(Precedence::Or),
            TokenKind::And => Some(Precedence::And),
            TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => Some(Precedence::Comparison),
            TokenKind::Plus | TokenKind::Minus => Some(Precedence::Additive),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
                Some(Precedence::Multiplicative)
            }
            _ => None,
        }
    }

    /// Next tighter level; `None` means operands are unary expressions.
    pub fn tighter(self) -> Option<Self> {
        match self {
            Precedence::Or => Some(Precedence::And),
            Precedence::And => Some(Precedence::Comparison),
            Precedence::Comparison => Some(Precedence::Additive),
            Precedence::Additive => Some(Precedence::Multiplicative),
            Precedence::Multiplicative => None,
        }
    }

    /// Comparisons do not chain: `a < b < c` is a syntax error.
    pub fn is_associative(self) -> bool {
        self != Precedence::Comparison
    }

    /// Operators accepted at this level, for diagnostics.
    pub fn operators(self) -> &'static [TokenKind] {
        match self {
            Precedence::Or => &[TokenKind::Or],
            Precedence::And => &[TokenKind::And],
            Precedence::Comparison => &[
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
            ],
            Precedence::Additive => &[TokenKind::Plus, TokenKind::Minus],
            Precedence::Multiplicative => &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_is_case_insensitive() {
        assert_eq!(keyword("goal"), Some(TokenKind::Goal));
        assert_eq!(keyword("GOAL"), Some(TokenKind::Goal));
        assert_eq!(keyword("End"), Some(TokenKind::End));
        assert_eq!(keyword("goals"), None);
    }

    #[test]
    fn test_keyword_table_matches_token_kinds() {
        for (word, kind) in KEYWORDS.iter() {
            assert!(kind.is_keyword(), "{word} maps to a non-keyword kind");
            assert_eq!(kind.describe(), format!("'{}'", word));
        }
    }

    #[test]
    fn test_operator_sets_are_disjoint() {
        let levels = [
            Precedence::Or,
            Precedence::And,
            Precedence::Comparison,
            Precedence::Additive,
            Precedence::Multiplicative,
        ];
        for level in levels {
            for op in level.operators() {
                assert_eq!(Precedence::of(*op), Some(level));
            }
        }
    }

    #[test]
    fn test_statement_keywords_never_start_expressions() {
        for kind in STATEMENT_KEYWORDS {
            assert!(!EXPRESSION_START.contains(kind), "{kind} overlaps");
        }
    }

    #[test]
    fn test_block_openers() {
        assert_eq!(Rule::block_for(TokenKind::Define), Some(Rule::Function));
        assert_eq!(Rule::block_for(TokenKind::While), Some(Rule::While));
        assert_eq!(Rule::block_for(TokenKind::Goal), None);
        assert_eq!(Rule::Function.keyword(), "define");
    }
}
