//! Parse tree to AST fold
//!
//! One arm per [`Rule`]. The fold is pure: the same parse tree always yields
//! the same AST.

use super::{AstNode, NodeType, NodeValue, Scalar};
use crate::error::FrontendError;
use crate::grammar::{self, Rule};
use crate::lexer::{Token, TokenKind};
use crate::parser::{ParseElement, ParseNode};

/// Fold a parse tree into an AST.
pub fn transform(tree: &ParseNode) -> Result<AstNode, FrontendError> {
    fold(tree)
}

fn fold(node: &ParseNode) -> Result<AstNode, FrontendError> {
    let span = node.span;

    match node.rule {
        Rule::Program => Ok(AstNode::new(NodeType::Program, span).with_children(body(node, 0)?)),

        // ====================================================================
        // Directives
        // ====================================================================
        Rule::Goal => {
            let text = string_value(token_at(node, 0)?);
            let priority = match node.children.get(1) {
                Some(_) => token_at(node, 1)?.lexeme.to_ascii_lowercase(),
                None => grammar::DEFAULT_PRIORITY.to_string(),
            };
            Ok(AstNode::new(NodeType::Goal, span)
                .with_text(text)
                .with_meta("priority", priority))
        }

        Rule::Agent => labelled(node, NodeType::Agent),
        Rule::Model => labelled(node, NodeType::Model),
        Rule::Assistant => labelled(node, NodeType::Assistant),
        Rule::Think => labelled(node, NodeType::Think),
        Rule::Learn => labelled(node, NodeType::Learn),

        Rule::Remember => {
            let mut ast = AstNode::new(NodeType::Remember, span)
                .with_text(string_value(token_at(node, 0)?));
            if node.children.len() > 1 {
                ast = ast.with_meta("tags", string_value(token_at(node, 1)?));
            }
            Ok(ast)
        }

        Rule::Recall => memory_operation(node, NodeType::Recall),
        Rule::Forget => memory_operation(node, NodeType::Forget),

        Rule::Reflect => {
            let ast = AstNode::new(NodeType::Reflect, span);
            match node.children.first() {
                Some(_) => Ok(ast.with_text(string_value(token_at(node, 0)?))),
                None => Ok(ast),
            }
        }

        Rule::Plugin => {
            let mut ast = AstNode::new(NodeType::Plugin, span)
                .with_text(string_value(token_at(node, 0)?));
            if node.children.len() > 1 {
                let arguments = arguments(node_at(node, 1)?)?;
                ast = ast
                    .with_meta("arg_count", arguments.len())
                    .with_children(arguments);
            }
            Ok(ast)
        }

        Rule::Intent => Ok(AstNode::new(NodeType::Intent, span)
            .with_text(string_value(token_at(node, 0)?))
            .with_meta("action", token_at(node, 1)?.lexeme.as_str())),

        Rule::Debug => {
            let level = token_at(node, 0)?.lexeme.to_ascii_lowercase();
            Ok(AstNode::new(NodeType::Debug, span)
                .with_meta("level", level)
                .with_children(vec![fold(node_at(node, 1)?)?]))
        }

        Rule::Comment => {
            let lexeme = &token_at(node, 0)?.lexeme;
            let text = lexeme.strip_prefix('#').unwrap_or(lexeme).trim();
            Ok(AstNode::new(NodeType::Comment, span).with_text(text))
        }

        // ====================================================================
        // Blocks
        // ====================================================================
        Rule::Function => {
            let name = &token_at(node, 0)?.lexeme;
            let parameters = parameters(node_at(node, 1)?)?;
            Ok(AstNode::new(NodeType::Function, span)
                .with_text(name.as_str())
                .with_meta("parameters", Scalar::List(parameters))
                .with_children(body(node, 2)?))
        }

        Rule::If => conditional(node, NodeType::If),
        Rule::When => conditional(node, NodeType::When),
        Rule::While => conditional(node, NodeType::While),

        Rule::ElseClause => Ok(AstNode::new(NodeType::ElseBlock, span).with_children(body(node, 0)?)),

        Rule::For => {
            let variable = &token_at(node, 0)?.lexeme;
            let iterable = fold(node_at(node, 1)?)?;
            Ok(AstNode::new(NodeType::For, span)
                .with_expr(iterable)
                .with_meta("variable", variable.as_str())
                .with_children(body(node, 2)?))
        }

        // ====================================================================
        // Simple statements
        // ====================================================================
        Rule::Assignment => Ok(AstNode::new(NodeType::Assignment, span)
            .with_text(token_at(node, 0)?.lexeme.as_str())
            .with_children(vec![fold(node_at(node, 1)?)?])),

        Rule::ExpressionStatement => Ok(AstNode::new(NodeType::ExpressionStatement, span)
            .with_children(vec![fold(node_at(node, 0)?)?])),

        Rule::Parameters | Rule::Arguments => Err(FrontendError::internal(
            format!("{:?} clause outside of its owning production", node.rule),
            span,
        )),

        // ====================================================================
        // Expressions
        // ====================================================================
        Rule::Binary => {
            let left = fold(node_at(node, 0)?)?;
            let operator = token_at(node, 1)?.lexeme.to_ascii_lowercase();
            let right = fold(node_at(node, 2)?)?;
            Ok(AstNode::new(NodeType::Comparison, span)
                .with_meta("operator", operator)
                .with_children(vec![left, right]))
        }

        Rule::Unary => {
            let operator = token_at(node, 0)?;
            let operand = fold(node_at(node, 1)?)?;

            if operator.kind == TokenKind::Minus {
                if let Some(NodeValue::Number(n)) = &operand.value {
                    if operand.node_type == NodeType::Literal {
                        return Ok(number_literal(-n, span));
                    }
                }
            }

            Ok(AstNode::new(NodeType::Comparison, span)
                .with_meta("operator", operator.lexeme.to_ascii_lowercase())
                .with_children(vec![operand]))
        }

        Rule::MethodCall => {
            let receiver = fold(node_at(node, 0)?)?;
            let method = &token_at(node, 1)?.lexeme;
            let arguments = arguments(node_at(node, 2)?)?;
            let arg_count = arguments.len();

            let mut children = Vec::with_capacity(arg_count + 1);
            children.push(receiver);
            children.extend(arguments);

            Ok(AstNode::new(NodeType::MethodCall, span)
                .with_text(method.as_str())
                .with_meta("has_receiver", true)
                .with_meta("arg_count", arg_count)
                .with_children(children))
        }

        Rule::Call => {
            let name = &token_at(node, 0)?.lexeme;
            let arguments = arguments(node_at(node, 1)?)?;
            Ok(AstNode::new(NodeType::MethodCall, span)
                .with_text(name.as_str())
                .with_meta("has_receiver", false)
                .with_meta("arg_count", arguments.len())
                .with_children(arguments))
        }

        Rule::Array => {
            let elements = node
                .children
                .iter()
                .map(|child| fold(as_node(node, child)?))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AstNode::new(NodeType::Array, span).with_children(elements))
        }

        Rule::Group => fold(node_at(node, 0)?),

        Rule::Literal => literal(token_at(node, 0)?),
    }
}

// ============================================================================
// Production helpers
// ============================================================================

/// `agent`/`model`/`assistant`/`think`/`learn`: a single text value.
fn labelled(node: &ParseNode, node_type: NodeType) -> Result<AstNode, FrontendError> {
    Ok(AstNode::new(node_type, node.span).with_text(string_value(token_at(node, 0)?)))
}

/// `recall`/`forget` with a direct, `tag:` or `pattern:` selector.
fn memory_operation(node: &ParseNode, node_type: NodeType) -> Result<AstNode, FrontendError> {
    let ast = AstNode::new(node_type, node.span);

    match node.children.len() {
        1 => Ok(ast
            .with_text(string_value(token_at(node, 0)?))
            .with_meta("type", "direct")),
        2 => {
            let selector = token_at(node, 0)?.lexeme.to_ascii_lowercase();
            let value_token = token_at(node, 1)?;
            let value = string_value(value_token);

            let target = match selector.as_str() {
                grammar::SELECTOR_TAG => AstNode::new(NodeType::RecallTarget, value_token.span)
                    .with_text(value.clone())
                    .with_meta("field", grammar::SELECTOR_TAG),
                grammar::SELECTOR_PATTERN => {
                    AstNode::new(NodeType::MemoryPattern, value_token.span).with_text(value.clone())
                }
                other => {
                    return Err(FrontendError::internal(
                        format!("unknown memory selector '{}'", other),
                        node.span,
                    ))
                }
            };

            Ok(ast
                .with_text(value)
                .with_meta("type", selector)
                .with_children(vec![target]))
        }
        n => Err(malformed(node, format!("{} children", n))),
    }
}

/// `if`/`when`/`while`: condition as the value, body as the children.
fn conditional(node: &ParseNode, node_type: NodeType) -> Result<AstNode, FrontendError> {
    let condition = fold(node_at(node, 0)?)?;
    Ok(AstNode::new(node_type, node.span)
        .with_expr(condition)
        .with_children(body(node, 1)?))
}

fn parameters(node: &ParseNode) -> Result<Vec<Scalar>, FrontendError> {
    expect_rule(node, Rule::Parameters)?;
    node.children
        .iter()
        .map(|child| match child {
            ParseElement::Token(token) => Ok(Scalar::String(token.lexeme.clone())),
            ParseElement::Node(_) => Err(malformed(node, "a nested node".to_string())),
        })
        .collect()
}

fn arguments(node: &ParseNode) -> Result<Vec<AstNode>, FrontendError> {
    expect_rule(node, Rule::Arguments)?;
    node.children
        .iter()
        .map(|child| fold(as_node(node, child)?))
        .collect()
}

/// Fold statement children from index `from` on.
fn body(node: &ParseNode, from: usize) -> Result<Vec<AstNode>, FrontendError> {
    node.children
        .iter()
        .skip(from)
        .map(|child| fold(as_node(node, child)?))
        .collect()
}

fn literal(token: &Token) -> Result<AstNode, FrontendError> {
    let ast = AstNode::new(NodeType::Literal, token.span);

    match token.kind {
        TokenKind::Number => {
            let n = token
                .lexeme
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| {
                    FrontendError::internal(
                        format!("number literal `{}` is not a finite number", token.lexeme),
                        token.span,
                    )
                })?;
            Ok(number_literal(n, token.span))
        }
        TokenKind::String => Ok(ast
            .with_text(string_value(token))
            .with_meta("kind", "string")),
        TokenKind::True | TokenKind::False => Ok(ast
            .with_value(NodeValue::Bool(token.kind == TokenKind::True))
            .with_meta("kind", "boolean")),
        TokenKind::Identifier => Ok(ast
            .with_text(token.lexeme.as_str())
            .with_meta("kind", "identifier")),
        other => Err(FrontendError::internal(
            format!("{} cannot form a literal", other),
            token.span,
        )),
    }
}

fn number_literal(n: f64, span: crate::lexer::Span) -> AstNode {
    AstNode::new(NodeType::Literal, span)
        .with_value(NodeValue::Number(n))
        .with_meta("kind", "number")
}

// ============================================================================
// Strings
// ============================================================================

/// Text of a value token: strings are unquoted and unescaped, names are taken
/// verbatim.
fn string_value(token: &Token) -> String {
    match token.kind {
        TokenKind::String => unescape(strip_quotes(&token.lexeme)),
        _ => token.lexeme.clone(),
    }
}

fn strip_quotes(lexeme: &str) -> &str {
    let mut chars = lexeme.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => chars.as_str(),
        _ => lexeme,
    }
}

/// Resolve escape sequences once. Unknown escapes keep their backslash.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

// ============================================================================
// Shape accessors
// ============================================================================

fn token_at(node: &ParseNode, index: usize) -> Result<&Token, FrontendError> {
    match node.children.get(index) {
        Some(ParseElement::Token(token)) => Ok(token),
        _ => Err(malformed(node, format!("no token at position {}", index))),
    }
}

fn node_at(node: &ParseNode, index: usize) -> Result<&ParseNode, FrontendError> {
    match node.children.get(index) {
        Some(ParseElement::Node(child)) => Ok(child),
        _ => Err(malformed(node, format!("no node at position {}", index))),
    }
}

fn as_node<'a>(parent: &ParseNode, element: &'a ParseElement) -> Result<&'a ParseNode, FrontendError> {
    match element {
        ParseElement::Node(node) => Ok(node),
        ParseElement::Token(token) => Err(malformed(parent, format!("stray token {}", token.found()))),
    }
}

fn expect_rule(node: &ParseNode, rule: Rule) -> Result<(), FrontendError> {
    if node.rule == rule {
        Ok(())
    } else {
        Err(malformed(node, format!("expected a {:?} clause", rule)))
    }
}

fn malformed(node: &ParseNode, detail: String) -> FrontendError {
    FrontendError::internal(format!("malformed {:?} parse node: {}", node.rule, detail), node.span)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{tokenize, Span};
    use crate::parser::Parser;

    fn ast(source: &str) -> Result<AstNode, FrontendError> {
        let (tokens, diagnostics) = tokenize(source);
        assert!(diagnostics.is_empty(), "lex diagnostics: {:?}", diagnostics);
        let tree = Parser::new(tokens).parse()?;
        transform(&tree)
    }

    fn first(source: &str) -> Result<AstNode, FrontendError> {
        let mut program = ast(source)?;
        assert_eq!(program.node_type, NodeType::Program);
        Ok(program.children.remove(0))
    }

    #[test]
    fn test_goal_and_agent() -> Result<(), FrontendError> {
        let program = ast("goal: \"improve system performance by 30%\" priority: high\nagent: auto")?;
        assert_eq!(program.children.len(), 2);

        let goal = &program.children[0];
        assert_eq!(goal.node_type, NodeType::Goal);
        assert_eq!(goal.text(), Some("improve system performance by 30%"));
        assert_eq!(goal.meta_str("priority"), Some("high"));

        let agent = &program.children[1];
        assert_eq!(agent.node_type, NodeType::Agent);
        assert_eq!(agent.text(), Some("auto"));
        Ok(())
    }

    #[test]
    fn test_goal_default_priority() -> Result<(), FrontendError> {
        let goal = first("goal: \"x\"")?;
        assert_eq!(goal.meta_str("priority"), Some("medium"));

        let goal = first("goal: \"x\" priority: URGENT")?;
        assert_eq!(goal.meta_str("priority"), Some("urgent"));
        Ok(())
    }

    #[test]
    fn test_remember_with_tags() -> Result<(), FrontendError> {
        let remember = first("remember(\"x\") as \"tag1\"")?;
        assert_eq!(remember.text(), Some("x"));
        assert_eq!(remember.meta_str("tags"), Some("tag1"));

        let remember = first("remember(\"x\")")?;
        assert_eq!(remember.meta("tags"), None);
        Ok(())
    }

    #[test]
    fn test_recall_selectors() -> Result<(), FrontendError> {
        let direct = first("recall \"x\"")?;
        assert_eq!(direct.meta_str("type"), Some("direct"));
        assert!(direct.children.is_empty());

        let tagged = first("recall tag: \"x\"")?;
        assert_eq!(tagged.meta_str("type"), Some("tag"));
        assert_eq!(tagged.children[0].node_type, NodeType::RecallTarget);
        assert_eq!(tagged.children[0].meta_str("field"), Some("tag"));

        let pattern = first("forget pattern: \"old*\"")?;
        assert_eq!(pattern.node_type, NodeType::Forget);
        assert_eq!(pattern.meta_str("type"), Some("pattern"));
        assert_eq!(pattern.children[0].node_type, NodeType::MemoryPattern);
        assert_eq!(pattern.children[0].text(), Some("old*"));
        Ok(())
    }

    #[test]
    fn test_function_definition() -> Result<(), FrontendError> {
        let function = first("define f():\n  think: \"y\"\nend")?;
        assert_eq!(function.node_type, NodeType::Function);
        assert_eq!(function.text(), Some("f"));
        assert_eq!(function.meta("parameters"), Some(&Scalar::List(vec![])));
        assert_eq!(function.children.len(), 1);
        assert_eq!(function.children[0].node_type, NodeType::Think);
        assert_eq!(function.children[0].text(), Some("y"));

        let function = first("define g(a, b)\nend")?;
        assert_eq!(
            function.meta("parameters"),
            Some(&Scalar::List(vec!["a".into(), "b".into()]))
        );
        Ok(())
    }

    #[test]
    fn test_if_without_else() -> Result<(), FrontendError> {
        let node = first("if x > 1:\n  debug \"hi\"\nend")?;
        assert_eq!(node.node_type, NodeType::If);

        let condition = node.expr().ok_or_else(|| FrontendError::internal("no condition", node.span))?;
        assert_eq!(condition.node_type, NodeType::Comparison);
        assert_eq!(condition.meta_str("operator"), Some(">"));
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].node_type, NodeType::Debug);
        assert!(node.children.iter().all(|c| c.node_type != NodeType::ElseBlock));
        Ok(())
    }

    #[test]
    fn test_else_block_is_last_child() -> Result<(), FrontendError> {
        let node = first("if ok:\n  think: \"a\"\n  learn: \"b\"\nelse:\n  reflect\nend")?;
        assert_eq!(node.children.len(), 3);
        let else_block = &node.children[2];
        assert_eq!(else_block.node_type, NodeType::ElseBlock);
        assert_eq!(else_block.children[0].node_type, NodeType::Reflect);
        Ok(())
    }

    #[test]
    fn test_for_loop() -> Result<(), FrontendError> {
        let node = first("for item in [1, 2]:\n  debug item\nend")?;
        assert_eq!(node.meta_str("variable"), Some("item"));
        assert_eq!(node.expr().map(|e| e.node_type), Some(NodeType::Array));
        Ok(())
    }

    #[test]
    fn test_comment_text_is_stripped() -> Result<(), FrontendError> {
        let program = ast("# just a note")?;
        assert_eq!(program.children.len(), 1);
        assert_eq!(program.children[0].node_type, NodeType::Comment);
        assert_eq!(program.children[0].text(), Some("just a note"));
        Ok(())
    }

    #[test]
    fn test_strings_are_unescaped_once() -> Result<(), FrontendError> {
        let think = first(r#"think: "line\nnext \"quoted\" \\n""#)?;
        assert_eq!(think.text(), Some("line\nnext \"quoted\" \\n"));

        let think = first(r"think: 'it\'s'")?;
        assert_eq!(think.text(), Some("it's"));
        Ok(())
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape(r"a\qb"), r"a\qb");
        assert_eq!(unescape(r"tab\there"), "tab\there");
    }

    #[test]
    fn test_operators_become_comparisons() -> Result<(), FrontendError> {
        let statement = first("x + 2 * 3")?;
        let sum = &statement.children[0];
        assert_eq!(sum.node_type, NodeType::Comparison);
        assert_eq!(sum.meta_str("operator"), Some("+"));
        assert_eq!(sum.children[1].meta_str("operator"), Some("*"));

        let negated = first("not ready")?;
        let not = &negated.children[0];
        assert_eq!(not.meta_str("operator"), Some("not"));
        assert_eq!(not.children.len(), 1);
        Ok(())
    }

    #[test]
    fn test_negative_number_folds() -> Result<(), FrontendError> {
        let statement = first("-(4)")?;
        let literal = &statement.children[0];
        assert_eq!(literal.node_type, NodeType::Literal);
        assert_eq!(literal.value, Some(NodeValue::Number(-4.0)));

        let statement = first("-x")?;
        assert_eq!(statement.children[0].node_type, NodeType::Comparison);
        Ok(())
    }

    #[test]
    fn test_calls_and_method_calls() -> Result<(), FrontendError> {
        let statement = first("memory.search(\"k\", 3)")?;
        let call = &statement.children[0];
        assert_eq!(call.node_type, NodeType::MethodCall);
        assert_eq!(call.text(), Some("search"));
        assert_eq!(call.meta("has_receiver"), Some(&Scalar::Bool(true)));
        assert_eq!(call.meta("arg_count"), Some(&Scalar::Number(2.0)));
        assert_eq!(call.children.len(), 3);

        let statement = first("f(1)")?;
        let call = &statement.children[0];
        assert_eq!(call.meta("has_receiver"), Some(&Scalar::Bool(false)));
        assert_eq!(call.children.len(), 1);
        Ok(())
    }

    #[test]
    fn test_plugin_arguments_absent_when_omitted() -> Result<(), FrontendError> {
        let plugin = first("plugin search")?;
        assert_eq!(plugin.meta("arg_count"), None);
        assert!(plugin.children.is_empty());

        let plugin = first("plugin \"web\"()")?;
        assert_eq!(plugin.text(), Some("web"));
        assert_eq!(plugin.meta("arg_count"), Some(&Scalar::Number(0.0)));
        Ok(())
    }

    #[test]
    fn test_assignment_and_debug_level() -> Result<(), FrontendError> {
        let assignment = first("total = a + 1")?;
        assert_eq!(assignment.text(), Some("total"));
        assert_eq!(assignment.children[0].node_type, NodeType::Comparison);

        let debug = first("INSPECT total")?;
        assert_eq!(debug.meta_str("level"), Some("inspect"));
        assert_eq!(debug.children[0].meta_str("kind"), Some("identifier"));
        Ok(())
    }

    #[test]
    fn test_transform_is_deterministic() -> Result<(), FrontendError> {
        let source = "define f(a):\n  if a:\n    recall tag: \"t\"\n  end\nend\nf(1)\n";
        assert_eq!(ast(source)?, ast(source)?);
        Ok(())
    }

    #[test]
    fn test_malformed_parse_node_is_internal_error() {
        let bad = ParseNode::new(Rule::Goal, Span::default());
        assert!(matches!(transform(&bad), Err(FrontendError::Internal { .. })));

        let stray = ParseNode::new(Rule::Arguments, Span::default());
        assert!(matches!(transform(&stray), Err(FrontendError::Internal { .. })));

        let bad_number = ParseNode::with_children(
            Rule::Literal,
            Span::default(),
            vec![ParseElement::Token(Token {
                kind: TokenKind::Number,
                lexeme: "1.2.3".to_string(),
                span: Span::default(),
            })],
        );
        assert!(matches!(transform(&bad_number), Err(FrontendError::Internal { .. })));
    }

    #[test]
    fn test_overflowing_number_token_is_internal_error() {
        let overflow = ParseNode::with_children(
            Rule::Literal,
            Span::default(),
            vec![ParseElement::Token(Token {
                kind: TokenKind::Number,
                lexeme: format!("1{}", "0".repeat(400)),
                span: Span::default(),
            })],
        );
        assert!(matches!(transform(&overflow), Err(FrontendError::Internal { .. })));
    }
}
