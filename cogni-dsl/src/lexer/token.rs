//! Lexer token types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TOKEN KINDS
// ============================================================================

/// Token kinds for the Cogni language.
///
/// Kinds carry no payload: the source text of every token lives in
/// [`Token::lexeme`], so kinds can be compared, copied and listed in
/// "expected one of" sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Statement keywords
    Goal,
    Priority,
    Agent,
    Model,
    Assistant,
    Think,
    Learn,
    Remember,
    As,
    Recall,
    Forget,
    Reflect,
    Plugin,
    Intent,

    // Debug keywords
    Debug,
    Trace,
    Inspect,

    // Block keywords
    Define,
    End,
    If,
    Else,
    When,
    For,
    In,
    While,

    // Word operators and literals
    And,
    Or,
    Not,
    True,
    False,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Dot,
    Arrow,

    // Operators
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Literals
    String,
    Number,
    Identifier,
    Comment,

    // Layout
    Newline,

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Whether this kind is a reserved word.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Goal
                | TokenKind::Priority
                | TokenKind::Agent
                | TokenKind::Model
                | TokenKind::Assistant
                | TokenKind::Think
                | TokenKind::Learn
                | TokenKind::Remember
                | TokenKind::As
                | TokenKind::Recall
                | TokenKind::Forget
                | TokenKind::Reflect
                | TokenKind::Plugin
                | TokenKind::Intent
                | TokenKind::Debug
                | TokenKind::Trace
                | TokenKind::Inspect
                | TokenKind::Define
                | TokenKind::End
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::When
                | TokenKind::For
                | TokenKind::In
                | TokenKind::While
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Goal => "'goal'",
            TokenKind::Priority => "'priority'",
            TokenKind::Agent => "'agent'",
            TokenKind::Model => "'model'",
            TokenKind::Assistant => "'assistant'",
            TokenKind::Think => "'think'",
            TokenKind::Learn => "'learn'",
            TokenKind::Remember => "'remember'",
            TokenKind::As => "'as'",
            TokenKind::Recall => "'recall'",
            TokenKind::Forget => "'forget'",
            TokenKind::Reflect => "'reflect'",
            TokenKind::Plugin => "'plugin'",
            TokenKind::Intent => "'intent'",
            TokenKind::Debug => "'debug'",
            TokenKind::Trace => "'trace'",
            TokenKind::Inspect => "'inspect'",
            TokenKind::Define => "'define'",
            TokenKind::End => "'end'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::When => "'when'",
            TokenKind::For => "'for'",
            TokenKind::In => "'in'",
            TokenKind::While => "'while'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Arrow => "'->'",
            TokenKind::Assign => "'='",
            TokenKind::Eq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::Comment => "comment",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// ============================================================================
// SPANS AND TOKENS
// ============================================================================

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Span {
    /// Span covering `self` through `other`, anchored at `self`'s line/column.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

/// A token with its kind, source text and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    /// Diagnostic description of what was actually found at this position.
    pub fn found(&self) -> String {
        match self.kind {
            TokenKind::String
            | TokenKind::Number
            | TokenKind::Identifier
            | TokenKind::Error => format!("{} `{}`", self.kind, self.lexeme),
            _ => self.kind.describe().to_string(),
        }
    }
}
