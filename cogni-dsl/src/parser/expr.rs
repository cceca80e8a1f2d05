//! Expression parsing by precedence climbing

use super::parser::Parser;
use super::tree::*;
use crate::error::FrontendError;
use crate::grammar::{self, Precedence, Rule};
use crate::lexer::*;

impl Parser {
    /// Parse an expression: `or` > `and` > comparison > additive >
    /// multiplicative > unary > postfix > atom.
    pub(crate) fn parse_expression(&mut self) -> Result<ParseNode, FrontendError> {
        self.nested(|p| p.parse_binary(Precedence::Or))
    }

    /// Run `f` one expression level deeper, enforcing the nesting limit.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, FrontendError>,
    ) -> Result<T, FrontendError> {
        self.deepen()?;
        let result = f(self);
        self.expr_depth -= 1;
        result
    }

    /// Charge one level against the nesting limit, failing at the current token.
    fn deepen(&mut self) -> Result<(), FrontendError> {
        if self.expr_depth >= self.max_expression_depth {
            return Err(FrontendError::syntax(
                self.current(),
                format!(
                    "expression nesting exceeds the limit of {}",
                    self.max_expression_depth
                ),
                &[],
            ));
        }
        self.expr_depth += 1;
        Ok(())
    }

    /// Run a left-folding loop. Every fold in `f` nests the tree one level
    /// deeper, so the charges it makes stay in place until the loop ends.
    fn chained(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<ParseNode, FrontendError>,
    ) -> Result<ParseNode, FrontendError> {
        let depth = self.expr_depth;
        let result = f(self);
        self.expr_depth = depth;
        result
    }

    fn parse_binary(&mut self, level: Precedence) -> Result<ParseNode, FrontendError> {
        self.chained(|p| p.fold_binary(level))
    }

    fn fold_binary(&mut self, level: Precedence) -> Result<ParseNode, FrontendError> {
        let mut left = self.parse_operand(level)?;

        loop {
            if Precedence::of(self.current().kind) != Some(level) {
                self.note_alternatives(level.operators());
                break;
            }

            self.deepen()?;
            let operator = self.bump();
            let right = self.parse_operand(level)?;
            left = ParseNode::with_children(
                Rule::Binary,
                left.span.to(right.span),
                vec![
                    ParseElement::Node(left),
                    ParseElement::Token(operator),
                    ParseElement::Node(right),
                ],
            );

            if !level.is_associative() {
                if Precedence::of(self.current().kind) == Some(level) {
                    return Err(FrontendError::syntax(
                        self.current(),
                        "comparison operators cannot be chained, combine them with 'and'",
                        &[],
                    ));
                }
                break;
            }
        }

        Ok(left)
    }

    fn parse_operand(&mut self, level: Precedence) -> Result<ParseNode, FrontendError> {
        match level.tighter() {
            Some(next) => self.parse_binary(next),
            None => self.parse_unary(),
        }
    }

    fn parse_unary(&mut self) -> Result<ParseNode, FrontendError> {
        match self.current().kind {
            TokenKind::Minus | TokenKind::Not => {
                let operator = self.bump();
                let operand = self.nested(|p| p.parse_unary())?;
                Ok(ParseNode::with_children(
                    Rule::Unary,
                    operator.span.to(operand.span),
                    vec![ParseElement::Token(operator), ParseElement::Node(operand)],
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    /// `atom { "." NAME "(" [args] ")" }`
    fn parse_postfix(&mut self) -> Result<ParseNode, FrontendError> {
        self.chained(|p| p.fold_postfix())
    }

    fn fold_postfix(&mut self) -> Result<ParseNode, FrontendError> {
        let mut node = self.parse_atom()?;

        while self.check(TokenKind::Dot) {
            self.deepen()?;
            self.advance();
            let method = self.expect_method_name()?;
            let arguments = self.parse_arguments()?;
            node = ParseNode::with_children(
                Rule::MethodCall,
                node.span.to(arguments.span),
                vec![
                    ParseElement::Node(node),
                    ParseElement::Token(method),
                    ParseElement::Node(arguments),
                ],
            );
        }
        self.note_alternatives(&[TokenKind::Dot]);

        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<ParseNode, FrontendError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Number | TokenKind::String | TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(ParseNode::with_children(
                    Rule::Literal,
                    token.span,
                    vec![ParseElement::Token(token)],
                ))
            }
            TokenKind::Identifier => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    let arguments = self.parse_arguments()?;
                    Ok(ParseNode::with_children(
                        Rule::Call,
                        token.span.to(arguments.span),
                        vec![ParseElement::Token(token), ParseElement::Node(arguments)],
                    ))
                } else {
                    self.note_alternatives(&[TokenKind::LParen]);
                    Ok(ParseNode::with_children(
                        Rule::Literal,
                        token.span,
                        vec![ParseElement::Token(token)],
                    ))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect_token(TokenKind::RParen)?;
                Ok(ParseNode::with_children(
                    Rule::Group,
                    token.span.to(close.span),
                    vec![ParseElement::Node(inner)],
                ))
            }
            TokenKind::LBracket => {
                self.advance();
                let (elements, close) = self.parse_list(TokenKind::RBracket)?;
                Ok(ParseNode::with_children(
                    Rule::Array,
                    token.span.to(close.span),
                    elements,
                ))
            }
            _ => Err(self.unexpected(grammar::EXPRESSION_START)),
        }
    }

    /// `"(" [args] ")"` as an [`Rule::Arguments`] node.
    pub(crate) fn parse_arguments(&mut self) -> Result<ParseNode, FrontendError> {
        let open = self.expect_token(TokenKind::LParen)?;
        let (arguments, close) = self.parse_list(TokenKind::RParen)?;
        Ok(ParseNode::with_children(
            Rule::Arguments,
            open.span.to(close.span),
            arguments,
        ))
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn parse_list(&mut self, close: TokenKind) -> Result<(Vec<ParseElement>, Token), FrontendError> {
        let mut items = Vec::new();

        while !self.check(close) {
            items.push(ParseElement::Node(self.parse_expression()?));
            if !self.optional(TokenKind::Comma) && !self.check(close) {
                return Err(self.unexpected(&[TokenKind::Comma, close]));
            }
        }

        let close = self.expect_token(close)?;
        Ok((items, close))
    }

    /// Method names may reuse keywords (`memory.recall()`).
    fn expect_method_name(&mut self) -> Result<Token, FrontendError> {
        let kind = self.current().kind;
        if kind == TokenKind::Identifier || kind.is_keyword() {
            let mut token = self.bump();
            token.kind = TokenKind::Identifier;
            Ok(token)
        } else {
            Err(self.unexpected(&[TokenKind::Identifier]))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn expression(source: &str) -> Result<ParseNode, FrontendError> {
        let (tokens, diagnostics) = tokenize(source);
        assert!(diagnostics.is_empty());
        let mut parser = Parser::new(tokens);
        let node = parser.parse_expression()?;
        assert!(parser.is_at_end(), "trailing input in {:?}", source);
        Ok(node)
    }

    /// Compact s-expression rendering of a parse tree.
    fn sexpr(node: &ParseNode) -> String {
        let parts: Vec<String> = node
            .children
            .iter()
            .map(|c| match c {
                ParseElement::Token(t) => t.lexeme.clone(),
                ParseElement::Node(n) => sexpr(n),
            })
            .collect();
        match node.rule {
            Rule::Literal => parts.join(" "),
            Rule::Binary => format!("({} {} {})", parts[1], parts[0], parts[2]),
            _ => format!("({:?} {})", node.rule, parts.join(" ")),
        }
    }

    #[test]
    fn test_precedence_climbing() -> Result<(), FrontendError> {
        assert_eq!(sexpr(&expression("1 + 2 * 3")?), "(+ 1 (* 2 3))");
        assert_eq!(sexpr(&expression("1 - 2 - 3")?), "(- (- 1 2) 3)");
        assert_eq!(
            sexpr(&expression("a > 1 and b or c")?),
            "(or (and (> a 1) b) c)"
        );
        assert_eq!(sexpr(&expression("x + 1 >= y * 2")?), "(>= (+ x 1) (* y 2))");
        Ok(())
    }

    #[test]
    fn test_unary_and_grouping() -> Result<(), FrontendError> {
        assert_eq!(sexpr(&expression("-x * 2")?), "(* (Unary - x) 2)");
        assert_eq!(sexpr(&expression("not (a or b)")?), "(Unary not (Group (or a b)))");
        Ok(())
    }

    #[test]
    fn test_method_calls_chain() -> Result<(), FrontendError> {
        assert_eq!(
            sexpr(&expression("memory.recall(\"k\").first()")?),
            "(MethodCall (MethodCall memory recall (Arguments \"k\")) first (Arguments ))"
        );
        assert_eq!(sexpr(&expression("f(1, [2, 3],)")?), "(Call f (Arguments 1 (Array 2 3)))");
        Ok(())
    }

    #[test]
    fn test_comparisons_do_not_chain() {
        assert!(matches!(
            expression("a < b < c"),
            Err(FrontendError::Syntax { .. })
        ));
    }

    #[test]
    fn test_missing_operand_lists_expression_starts() {
        let Err(FrontendError::Syntax { expected, .. }) = expression("1 +") else {
            panic!("expected syntax error");
        };
        assert!(expected.contains(&"number".to_string()));
        assert!(expected.contains(&"'('".to_string()));
    }

    #[test]
    fn test_expression_depth_limit() {
        let source = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let (tokens, _) = tokenize(&source);
        let mut parser = Parser::new(tokens).with_limits(8, 10);
        assert!(matches!(
            parser.parse_expression(),
            Err(FrontendError::Syntax { .. })
        ));

        let (tokens, _) = tokenize(&source);
        let mut parser = Parser::new(tokens).with_limits(8, 64);
        assert!(parser.parse_expression().is_ok());
    }

    #[test]
    fn test_operator_chain_counts_towards_depth_limit() {
        let source = format!("1{}", " + 1".repeat(20));
        let (tokens, _) = tokenize(&source);
        let mut parser = Parser::new(tokens.clone()).with_limits(8, 10);
        let Err(FrontendError::Syntax { span, .. }) = parser.parse_expression() else {
            panic!("long chain must exceed the limit");
        };
        assert_eq!(tokens.iter().find(|t| t.span == span).map(|t| t.kind), Some(TokenKind::Plus));

        let (tokens, _) = tokenize(&source);
        let mut parser = Parser::new(tokens).with_limits(8, 64);
        assert!(parser.parse_expression().is_ok());
    }

    #[test]
    fn test_method_chain_counts_towards_depth_limit() {
        let source = format!("x{}", ".f()".repeat(20));
        let (tokens, _) = tokenize(&source);
        let mut parser = Parser::new(tokens.clone()).with_limits(8, 10);
        let Err(FrontendError::Syntax { span, .. }) = parser.parse_expression() else {
            panic!("long chain must exceed the limit");
        };
        assert_eq!(tokens.iter().find(|t| t.span == span).map(|t| t.kind), Some(TokenKind::Dot));

        let (tokens, _) = tokenize(&source);
        let mut parser = Parser::new(tokens).with_limits(8, 64);
        assert!(parser.parse_expression().is_ok());
    }

    #[test]
    fn test_depth_budget_is_restored_after_chains() -> Result<(), FrontendError> {
        let (tokens, _) = tokenize("[1 + 2 + 3, a.b().c(), 4 * 5 * 6]");
        let mut parser = Parser::new(tokens).with_limits(8, 5);
        parser.parse_expression()?;
        assert_eq!(parser.expr_depth, 0);
        Ok(())
    }
}
