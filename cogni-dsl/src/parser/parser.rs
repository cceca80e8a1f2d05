//! Parser implementation: statement dispatch and the block stack

use super::tree::*;
use crate::error::FrontendError;
use crate::grammar::{self, Rule};
use crate::lexer::*;
use tracing::trace;

// ============================================================================
// PARSER
// ============================================================================

/// Default limit on nested `define`/`if`/`when`/`for`/`while` blocks.
pub const DEFAULT_MAX_BLOCK_DEPTH: usize = 64;

/// Default limit on expression nesting (parentheses, unary chains, arguments).
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 256;

/// Parser for the Cogni language.
///
/// Consumes one token stream and produces the parse tree rooted at
/// [`Rule::Program`]. A parser is single-use; the [`crate::Frontend`] creates
/// one per call.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) max_block_depth: usize,
    pub(crate) max_expression_depth: usize,
    pub(crate) expr_depth: usize,
    /// Token kinds an optional clause would have accepted at `alternatives_pos`.
    alternatives: Vec<TokenKind>,
    alternatives_pos: usize,
}

/// A block whose `end` has not been seen yet.
struct OpenBlock {
    node: ParseNode,
    else_clause: Option<ParseNode>,
    opened_by: Token,
}

impl OpenBlock {
    fn close(self, end: Span) -> ParseNode {
        let mut node = self.node;
        if let Some(else_clause) = self.else_clause {
            node.push_node(else_clause);
        }
        node.span = node.span.to(end);
        node
    }

    fn accepts_else(&self) -> bool {
        self.node.rule == Rule::If && self.else_clause.is_none()
    }
}

impl Parser {
    /// Create a new parser from a vector of tokens.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens
                .last()
                .map(|t| Span {
                    start: t.span.end,
                    end: t.span.end,
                    line: t.span.line,
                    column: t.span.column + t.lexeme.chars().count(),
                })
                .unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                span,
            });
        }
        Self {
            tokens,
            pos: 0,
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
            expr_depth: 0,
            alternatives: Vec::new(),
            alternatives_pos: 0,
        }
    }

    /// Override the nesting limits.
    pub fn with_limits(mut self, max_block_depth: usize, max_expression_depth: usize) -> Self {
        self.max_block_depth = max_block_depth;
        self.max_expression_depth = max_expression_depth;
        self
    }

    /// Parse the tokens into a program parse tree.
    ///
    /// `START -> statement -> START` until end of input; block headers push an
    /// [`OpenBlock`] whose body collects statements until the matching `end`.
    pub fn parse(&mut self) -> Result<ParseNode, FrontendError> {
        if let Some(token) = self.tokens.iter().find(|t| t.kind == TokenKind::Error) {
            return Err(FrontendError::Lex {
                message: format!("invalid token `{}`", token.lexeme),
                span: token.span,
            });
        }

        let mut program = ParseNode::new(Rule::Program, self.current().span);
        let mut stack: Vec<OpenBlock> = Vec::new();

        loop {
            self.skip_newlines();
            let token = self.current().clone();

            match token.kind {
                TokenKind::Eof => {
                    if let Some(open) = stack.last() {
                        let expected: &[TokenKind] = if open.accepts_else() {
                            &[TokenKind::Else, TokenKind::End]
                        } else {
                            &[TokenKind::End]
                        };
                        return Err(FrontendError::syntax(
                            &token,
                            format!(
                                "unclosed '{}' block opened at line {}, expected 'end'",
                                open.node.rule.keyword(),
                                open.opened_by.span.line
                            ),
                            expected,
                        ));
                    }
                    break;
                }

                TokenKind::End => {
                    let Some(open) = stack.pop() else {
                        return Err(FrontendError::syntax(
                            &token,
                            "'end' without an open block",
                            &[],
                        ));
                    };
                    self.advance();
                    self.expect_terminator()?;
                    trace!(rule = ?open.node.rule, depth = stack.len(), "close block");
                    let node = open.close(token.span);
                    Self::container(&mut program, &mut stack).push_node(node);
                }

                TokenKind::Else => match stack.last_mut() {
                    Some(open) if open.accepts_else() => {
                        self.advance();
                        let had_colon = self.optional(TokenKind::Colon);
                        self.expect_block_start(had_colon)?;
                        open.else_clause = Some(ParseNode::new(Rule::ElseClause, token.span));
                    }
                    Some(open) if open.node.rule == Rule::If => {
                        return Err(FrontendError::syntax(
                            &token,
                            format!(
                                "'if' block opened at line {} already has an 'else'",
                                open.opened_by.span.line
                            ),
                            &[TokenKind::End],
                        ));
                    }
                    _ => {
                        return Err(FrontendError::syntax(
                            &token,
                            "'else' without a matching 'if'",
                            &[],
                        ));
                    }
                },

                kind => match Rule::block_for(kind) {
                    Some(rule) => {
                        if stack.len() >= self.max_block_depth {
                            return Err(FrontendError::syntax(
                                &token,
                                format!(
                                    "block nesting exceeds the limit of {}",
                                    self.max_block_depth
                                ),
                                &[],
                            ));
                        }
                        let node = self.parse_block_header(rule)?;
                        trace!(?rule, depth = stack.len() + 1, "open block");
                        stack.push(OpenBlock {
                            node,
                            else_clause: None,
                            opened_by: token,
                        });
                    }
                    None => {
                        let statement = self.parse_statement()?;
                        self.expect_terminator()?;
                        Self::container(&mut program, &mut stack).push_node(statement);
                    }
                },
            }
        }

        program.span = program.span.to(self.current().span);
        Ok(program)
    }

    /// The node currently collecting statements.
    fn container<'s>(program: &'s mut ParseNode, stack: &'s mut [OpenBlock]) -> &'s mut ParseNode {
        match stack.last_mut() {
            Some(open) => match open.else_clause.as_mut() {
                Some(else_clause) => else_clause,
                None => &mut open.node,
            },
            None => program,
        }
    }

    // ========================================================================
    // Block headers
    // ========================================================================

    /// Parse the header of a block statement up to and including its newline.
    fn parse_block_header(&mut self, rule: Rule) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        let mut node = ParseNode::new(rule, keyword.span);

        match rule {
            Rule::Function => {
                let name = self.expect_token(TokenKind::Identifier)?;
                node.push_token(name);
                node.push_node(self.parse_parameters()?);
            }
            Rule::For => {
                let variable = self.expect_token(TokenKind::Identifier)?;
                node.push_token(variable);
                self.expect(TokenKind::In)?;
                node.push_node(self.parse_expression()?);
            }
            _ => node.push_node(self.parse_expression()?),
        }

        let had_colon = self.optional(TokenKind::Colon);
        self.expect_block_start(had_colon)?;
        Ok(node)
    }

    /// Parse `( [IDENT {, IDENT}] )` of a function definition.
    fn parse_parameters(&mut self) -> Result<ParseNode, FrontendError> {
        let open = self.expect_token(TokenKind::LParen)?;
        let mut node = ParseNode::new(Rule::Parameters, open.span);

        while !self.check(TokenKind::RParen) {
            node.push_token(self.expect_token(TokenKind::Identifier)?);
            if !self.optional(TokenKind::Comma) && !self.check(TokenKind::RParen) {
                return Err(FrontendError::unexpected(
                    self.current(),
                    &[TokenKind::Comma, TokenKind::RParen],
                ));
            }
        }

        let close = self.expect_token(TokenKind::RParen)?;
        node.span = node.span.to(close.span);
        Ok(node)
    }

    /// A block body starts on the next line; a trailing comment is allowed
    /// and becomes the first body statement.
    fn expect_block_start(&mut self, had_colon: bool) -> Result<(), FrontendError> {
        match self.current().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Comment => Ok(()),
            _ => {
                let expected: &[TokenKind] = if had_colon {
                    &[TokenKind::Newline]
                } else {
                    &[TokenKind::Colon, TokenKind::Newline]
                };
                Err(self.unexpected(expected))
            }
        }
    }

    // ========================================================================
    // Simple statements
    // ========================================================================

    /// Parse a non-block statement, dispatching on its first token.
    fn parse_statement(&mut self) -> Result<ParseNode, FrontendError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Goal => self.parse_goal(),
            TokenKind::Agent => {
                self.parse_labelled(Rule::Agent, &[TokenKind::Identifier, TokenKind::String])
            }
            TokenKind::Model => {
                self.parse_labelled(Rule::Model, &[TokenKind::Identifier, TokenKind::String])
            }
            TokenKind::Assistant => self.parse_labelled(Rule::Assistant, &[TokenKind::String]),
            TokenKind::Think => self.parse_labelled(Rule::Think, &[TokenKind::String]),
            TokenKind::Learn => self.parse_labelled(Rule::Learn, &[TokenKind::String]),
            TokenKind::Remember => self.parse_remember(),
            TokenKind::Recall => self.parse_memory_operation(Rule::Recall),
            TokenKind::Forget => self.parse_memory_operation(Rule::Forget),
            TokenKind::Reflect => self.parse_reflect(),
            TokenKind::Plugin => self.parse_plugin(),
            TokenKind::Intent => self.parse_intent(),
            TokenKind::Debug | TokenKind::Trace | TokenKind::Inspect => self.parse_debug(),
            TokenKind::Comment => {
                self.advance();
                Ok(ParseNode::with_children(
                    Rule::Comment,
                    token.span,
                    vec![ParseElement::Token(token)],
                ))
            }
            kind if grammar::EXPRESSION_START.contains(&kind) => self.parse_simple(),
            _ => {
                let mut expected = grammar::STATEMENT_KEYWORDS.to_vec();
                expected.push(TokenKind::Comment);
                expected.extend_from_slice(grammar::EXPRESSION_START);
                Err(FrontendError::unexpected(&token, &expected))
            }
        }
    }

    /// `goal: STRING [priority: LEVEL]`
    fn parse_goal(&mut self) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        self.expect(TokenKind::Colon)?;
        let text = self.expect_token(TokenKind::String)?;
        let mut node = ParseNode::new(Rule::Goal, keyword.span.to(text.span));
        node.push_token(text);

        if self.optional(TokenKind::Priority) {
            self.expect(TokenKind::Colon)?;
            let level = self.current().clone();
            let known = level.kind == TokenKind::Identifier
                && grammar::PRIORITY_LEVELS.contains(&level.lexeme.to_ascii_lowercase().as_str());
            if !known {
                return Err(FrontendError::unexpected_with(
                    &level,
                    grammar::PRIORITY_LEVELS
                        .iter()
                        .map(|l| format!("'{}'", l))
                        .collect(),
                ));
            }
            self.advance();
            node.span = node.span.to(level.span);
            node.push_token(level);
        } else {
            self.note_alternatives(&[TokenKind::Priority]);
        }

        Ok(node)
    }

    /// `KEYWORD ":" value` for the single-valued statements.
    fn parse_labelled(&mut self, rule: Rule, accepted: &[TokenKind]) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        self.expect(TokenKind::Colon)?;
        let value = self.expect_one_of(accepted)?;
        Ok(ParseNode::with_children(
            rule,
            keyword.span.to(value.span),
            vec![ParseElement::Token(value)],
        ))
    }

    /// `remember "(" STRING ")" [as STRING]`
    fn parse_remember(&mut self) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        self.expect(TokenKind::LParen)?;
        let content = self.expect_token(TokenKind::String)?;
        let close = self.expect_token(TokenKind::RParen)?;
        let mut node = ParseNode::new(Rule::Remember, keyword.span.to(close.span));
        node.push_token(content);

        if self.optional(TokenKind::As) {
            let tags = self.expect_token(TokenKind::String)?;
            node.span = node.span.to(tags.span);
            node.push_token(tags);
        } else {
            self.note_alternatives(&[TokenKind::As]);
        }

        Ok(node)
    }

    /// `recall selector` / `forget selector`
    fn parse_memory_operation(&mut self, rule: Rule) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        let token = self.current().clone();
        let mut node = ParseNode::new(rule, keyword.span);

        match token.kind {
            TokenKind::String => {
                self.advance();
                node.span = node.span.to(token.span);
                node.push_token(token);
            }
            TokenKind::Identifier if is_selector(&token.lexeme) => {
                self.advance();
                self.expect(TokenKind::Colon)?;
                let value = self.expect_token(TokenKind::String)?;
                node.span = node.span.to(value.span);
                node.push_token(token);
                node.push_token(value);
            }
            _ => {
                return Err(FrontendError::unexpected_with(
                    &token,
                    vec![
                        TokenKind::String.describe().to_string(),
                        format!("'{}'", grammar::SELECTOR_TAG),
                        format!("'{}'", grammar::SELECTOR_PATTERN),
                    ],
                ));
            }
        }

        Ok(node)
    }

    /// `reflect [":" STRING]`
    fn parse_reflect(&mut self) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        let mut node = ParseNode::new(Rule::Reflect, keyword.span);

        if self.optional(TokenKind::Colon) {
            let topic = self.expect_token(TokenKind::String)?;
            node.span = node.span.to(topic.span);
            node.push_token(topic);
        } else {
            self.note_alternatives(&[TokenKind::Colon]);
        }

        Ok(node)
    }

    /// `plugin NAME ["(" [args] ")"]`
    fn parse_plugin(&mut self) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        let name = self.expect_one_of(&[TokenKind::Identifier, TokenKind::String])?;
        let mut node = ParseNode::new(Rule::Plugin, keyword.span.to(name.span));
        node.push_token(name);

        if self.check(TokenKind::LParen) {
            let arguments = self.parse_arguments()?;
            node.span = node.span.to(arguments.span);
            node.push_node(arguments);
        } else {
            self.note_alternatives(&[TokenKind::LParen]);
        }

        Ok(node)
    }

    /// `intent ":" STRING "->" IDENT`
    fn parse_intent(&mut self) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        self.expect(TokenKind::Colon)?;
        let text = self.expect_token(TokenKind::String)?;
        self.expect(TokenKind::Arrow)?;
        let action = self.expect_token(TokenKind::Identifier)?;
        Ok(ParseNode::with_children(
            Rule::Intent,
            keyword.span.to(action.span),
            vec![ParseElement::Token(text), ParseElement::Token(action)],
        ))
    }

    /// `(debug | trace | inspect) expression`
    fn parse_debug(&mut self) -> Result<ParseNode, FrontendError> {
        let keyword = self.bump();
        let expression = self.parse_expression()?;
        Ok(ParseNode::with_children(
            Rule::Debug,
            keyword.span.to(expression.span),
            vec![ParseElement::Token(keyword), ParseElement::Node(expression)],
        ))
    }

    /// `expression ["=" expression]`; the assignment form is chosen only once
    /// the left side has been reduced and `=` is the lookahead.
    fn parse_simple(&mut self) -> Result<ParseNode, FrontendError> {
        let expression = self.parse_expression()?;
        let target = bare_identifier(&expression).cloned();

        if self.check(TokenKind::Assign) {
            let Some(target) = target else {
                return Err(FrontendError::syntax(
                    self.current(),
                    "invalid assignment target, only a bare identifier can be assigned",
                    &[],
                ));
            };
            self.advance();
            let value = self.parse_expression()?;
            return Ok(ParseNode::with_children(
                Rule::Assignment,
                target.span.to(value.span),
                vec![ParseElement::Token(target), ParseElement::Node(value)],
            ));
        }

        if target.is_some() {
            self.note_alternatives(&[TokenKind::Assign]);
        }

        Ok(ParseNode::with_children(
            Rule::ExpressionStatement,
            expression.span,
            vec![ParseElement::Node(expression)],
        ))
    }

    /// A statement ends at a newline, a trailing comment or end of input.
    fn expect_terminator(&mut self) -> Result<(), FrontendError> {
        match self.current().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Comment | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected(grammar::TERMINATORS)),
        }
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Consume the current token and return it.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current().clone();
        self.advance();
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Consume `kind` if it is next.
    pub(crate) fn optional(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<(), FrontendError> {
        self.expect_token(kind).map(|_| ())
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> Result<Token, FrontendError> {
        self.expect_one_of(&[kind])
    }

    pub(crate) fn expect_one_of(&mut self, kinds: &[TokenKind]) -> Result<Token, FrontendError> {
        if kinds.contains(&self.current().kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(kinds))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Record token kinds an optional clause would have accepted here.
    pub(crate) fn note_alternatives(&mut self, kinds: &[TokenKind]) {
        if self.alternatives_pos != self.pos {
            self.alternatives.clear();
            self.alternatives_pos = self.pos;
        }
        for kind in kinds {
            if !self.alternatives.contains(kind) {
                self.alternatives.push(*kind);
            }
        }
    }

    /// Syntax error at the current token: the recorded alternatives for this
    /// position followed by `required`.
    pub(crate) fn unexpected(&self, required: &[TokenKind]) -> FrontendError {
        let mut expected = Vec::new();
        if self.alternatives_pos == self.pos {
            expected.extend_from_slice(&self.alternatives);
        }
        for kind in required {
            if !expected.contains(kind) {
                expected.push(*kind);
            }
        }
        FrontendError::unexpected(self.current(), &expected)
    }
}

/// `tag` / `pattern` selector names (contextual, not reserved).
fn is_selector(lexeme: &str) -> bool {
    let lower = lexeme.to_ascii_lowercase();
    lower == grammar::SELECTOR_TAG || lower == grammar::SELECTOR_PATTERN
}

/// The identifier token if `node` is a bare identifier literal.
fn bare_identifier(node: &ParseNode) -> Option<&Token> {
    match (node.rule, node.children.as_slice()) {
        (Rule::Literal, [ParseElement::Token(token)]) if token.kind == TokenKind::Identifier => {
            Some(token)
        }
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
