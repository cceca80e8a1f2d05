//! Parse tree produced by the parser and consumed by the AST transformer
//!
//! Only semantically relevant tokens are kept (names, literals, operators);
//! punctuation and keywords that merely select a production are dropped.

use crate::grammar::Rule;
use crate::lexer::{Span, Token};

/// A child of a parse node.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseElement {
    Token(Token),
    Node(ParseNode),
}

impl ParseElement {
    pub fn span(&self) -> Span {
        match self {
            ParseElement::Token(token) => token.span,
            ParseElement::Node(node) => node.span,
        }
    }
}

/// A grammar-rule tag with its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub rule: Rule,
    pub span: Span,
    pub children: Vec<ParseElement>,
}

impl ParseNode {
    pub fn new(rule: Rule, span: Span) -> Self {
        Self {
            rule,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(rule: Rule, span: Span, children: Vec<ParseElement>) -> Self {
        Self {
            rule,
            span,
            children,
        }
    }

    pub fn push_token(&mut self, token: Token) {
        self.children.push(ParseElement::Token(token));
    }

    pub fn push_node(&mut self, node: ParseNode) {
        self.children.push(ParseElement::Node(node));
    }
}
