//! Post-parse validation
//!
//! Two passes over a finished AST:
//!
//! - [`check_contracts`] verifies every node against its per-type contract.
//!   A violation means the transformer built something it should not have and
//!   is reported as an internal error.
//! - [`structural_warnings`] reports problems that are legal syntax but likely
//!   mistakes (unused or duplicate functions, empty blocks, unknown tags).

pub mod stats;

pub use stats::Statistics;

use crate::ast::{AstNode, NodeType, NodeValue, Scalar};
use crate::error::{Diagnostic, FrontendError};
use crate::grammar;
use crate::lexer::Span;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Outcome of [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// No error-severity diagnostics were produced.
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// Present when the source parsed.
    pub statistics: Option<Statistics>,
}

impl ValidationReport {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

// ============================================================================
// CONTRACT CHECKS
// ============================================================================

const BINARY_OPERATORS: &[&str] = &[
    "or", "and", "==", "!=", "<", "<=", ">", ">=", "+", "-", "*", "/", "%",
];
const UNARY_OPERATORS: &[&str] = &["-", "not"];
const DEBUG_LEVELS: &[&str] = &["debug", "trace", "inspect"];
const LITERAL_KINDS: &[&str] = &["string", "number", "boolean", "identifier"];

/// Check the whole tree against the node contracts.
pub fn check_contracts(ast: &AstNode) -> Result<(), FrontendError> {
    if ast.node_type != NodeType::Program {
        return Err(violation(ast, "root must be a program node"));
    }
    check_node(ast)
}

fn check_node(node: &AstNode) -> Result<(), FrontendError> {
    match node.node_type {
        NodeType::Program => {
            no_value(node)?;
            statements(node, &node.children)?;
        }

        NodeType::Goal => {
            text(node)?;
            leaf(node)?;
            let priority = meta_str(node, "priority")?;
            if !grammar::PRIORITY_LEVELS.contains(&priority) {
                return Err(violation(node, &format!("unknown priority '{}'", priority)));
            }
        }

        NodeType::Agent
        | NodeType::Model
        | NodeType::Assistant
        | NodeType::Think
        | NodeType::Learn
        | NodeType::MemoryPattern
        | NodeType::Comment => {
            text(node)?;
            leaf(node)?;
        }

        NodeType::Remember => {
            text(node)?;
            leaf(node)?;
            if node.meta("tags").is_some() {
                meta_str(node, "tags")?;
            }
        }

        NodeType::Recall | NodeType::Forget => {
            text(node)?;
            let expected_child = match meta_str(node, "type")? {
                "direct" => None,
                "tag" => Some(NodeType::RecallTarget),
                "pattern" => Some(NodeType::MemoryPattern),
                other => return Err(violation(node, &format!("unknown selector type '{}'", other))),
            };
            let actual: Vec<NodeType> = node.children.iter().map(|c| c.node_type).collect();
            if actual != expected_child.into_iter().collect::<Vec<_>>() {
                return Err(violation(node, "selector child does not match metadata.type"));
            }
            check_children(node)?;
        }

        NodeType::RecallTarget => {
            text(node)?;
            leaf(node)?;
            if meta_str(node, "field")? != grammar::SELECTOR_TAG {
                return Err(violation(node, "recall_target must target the tag field"));
            }
        }

        NodeType::Reflect => {
            if node.value.is_some() {
                text(node)?;
            }
            leaf(node)?;
        }

        NodeType::Plugin => {
            text(node)?;
            expressions(node, &node.children)?;
            match node.meta("arg_count") {
                Some(count) => arg_count(node, count, node.children.len())?,
                None if !node.children.is_empty() => {
                    return Err(violation(node, "arguments without metadata.arg_count"));
                }
                None => {}
            }
        }

        NodeType::Intent => {
            text(node)?;
            leaf(node)?;
            meta_str(node, "action")?;
        }

        NodeType::Debug => {
            no_value(node)?;
            let level = meta_str(node, "level")?;
            if !DEBUG_LEVELS.contains(&level) {
                return Err(violation(node, &format!("unknown debug level '{}'", level)));
            }
            single_expression(node)?;
        }

        NodeType::Function => {
            text(node)?;
            let parameters = node
                .meta("parameters")
                .and_then(Scalar::as_list)
                .ok_or_else(|| violation(node, "metadata.parameters must be a list"))?;
            if parameters.iter().any(|p| p.as_str().is_none()) {
                return Err(violation(node, "parameters must be names"));
            }
            statements(node, &node.children)?;
        }

        NodeType::If => {
            condition(node)?;
            let body = match node.children.split_last() {
                Some((last, rest)) if last.node_type == NodeType::ElseBlock => {
                    check_node(last)?;
                    rest
                }
                _ => node.children.as_slice(),
            };
            statements(node, body)?;
        }

        NodeType::When | NodeType::While => {
            condition(node)?;
            statements(node, &node.children)?;
        }

        NodeType::For => {
            condition(node)?;
            meta_str(node, "variable")?;
            statements(node, &node.children)?;
        }

        NodeType::ElseBlock => {
            no_value(node)?;
            statements(node, &node.children)?;
        }

        NodeType::Assignment => {
            text(node)?;
            single_expression(node)?;
        }

        NodeType::ExpressionStatement => {
            no_value(node)?;
            single_expression(node)?;
        }

        NodeType::Comparison => {
            no_value(node)?;
            let operator = meta_str(node, "operator")?;
            let known = match node.children.len() {
                1 => UNARY_OPERATORS.contains(&operator),
                2 => BINARY_OPERATORS.contains(&operator),
                _ => false,
            };
            if !known {
                return Err(violation(
                    node,
                    &format!("operator '{}' with {} operands", operator, node.children.len()),
                ));
            }
            expressions(node, &node.children)?;
        }

        NodeType::MethodCall => {
            text(node)?;
            let has_receiver = node
                .meta("has_receiver")
                .and_then(Scalar::as_bool)
                .ok_or_else(|| violation(node, "metadata.has_receiver must be a bool"))?;
            let count = node
                .meta("arg_count")
                .ok_or_else(|| violation(node, "missing metadata.arg_count"))?;
            let receivers = usize::from(has_receiver);
            if node.children.len() < receivers {
                return Err(violation(node, "method call without its receiver"));
            }
            arg_count(node, count, node.children.len() - receivers)?;
            expressions(node, &node.children)?;
        }

        NodeType::Array => {
            no_value(node)?;
            expressions(node, &node.children)?;
        }

        NodeType::Literal => {
            leaf(node)?;
            let kind = meta_str(node, "kind")?;
            let matches = match (&node.value, kind) {
                (Some(NodeValue::Text(_)), "string" | "identifier") => true,
                (Some(NodeValue::Number(n)), "number") => n.is_finite(),
                (Some(NodeValue::Bool(_)), "boolean") => true,
                _ => false,
            };
            if !matches || !LITERAL_KINDS.contains(&kind) {
                return Err(violation(node, &format!("value does not fit literal kind '{}'", kind)));
            }
        }
    }

    Ok(())
}

fn violation(node: &AstNode, message: &str) -> FrontendError {
    FrontendError::internal(format!("invalid '{}' node: {}", node.node_type, message), node.span)
}

fn text(node: &AstNode) -> Result<&str, FrontendError> {
    node.text()
        .ok_or_else(|| violation(node, "value must be text"))
}

fn no_value(node: &AstNode) -> Result<(), FrontendError> {
    match node.value {
        None => Ok(()),
        Some(_) => Err(violation(node, "unexpected value")),
    }
}

fn leaf(node: &AstNode) -> Result<(), FrontendError> {
    if node.children.is_empty() {
        Ok(())
    } else {
        Err(violation(node, "unexpected children"))
    }
}

fn meta_str<'a>(node: &'a AstNode, key: &str) -> Result<&'a str, FrontendError> {
    node.meta_str(key)
        .ok_or_else(|| violation(node, &format!("metadata.{} must be a string", key)))
}

fn arg_count(node: &AstNode, count: &Scalar, actual: usize) -> Result<(), FrontendError> {
    if count.as_number() == Some(actual as f64) {
        Ok(())
    } else {
        Err(violation(node, "metadata.arg_count does not match the arguments"))
    }
}

fn condition(node: &AstNode) -> Result<(), FrontendError> {
    let expr = node
        .expr()
        .ok_or_else(|| violation(node, "value must be an expression"))?;
    if !expr.node_type.is_expression() {
        return Err(violation(node, &format!("'{}' is not an expression", expr.node_type)));
    }
    check_node(expr)
}

fn single_expression(node: &AstNode) -> Result<(), FrontendError> {
    if node.children.len() != 1 {
        return Err(violation(node, "expected exactly one expression"));
    }
    expressions(node, &node.children)
}

fn statements(parent: &AstNode, children: &[AstNode]) -> Result<(), FrontendError> {
    kinds(parent, children, NodeType::is_statement, "statement")
}

fn expressions(parent: &AstNode, children: &[AstNode]) -> Result<(), FrontendError> {
    kinds(parent, children, NodeType::is_expression, "expression")
}

fn kinds(
    parent: &AstNode,
    children: &[AstNode],
    accepts: fn(NodeType) -> bool,
    what: &str,
) -> Result<(), FrontendError> {
    for child in children {
        if !accepts(child.node_type) {
            return Err(violation(
                parent,
                &format!("child '{}' is not a {}", child.node_type, what),
            ));
        }
        check_node(child)?;
    }
    Ok(())
}

fn check_children(node: &AstNode) -> Result<(), FrontendError> {
    node.children.iter().try_for_each(check_node)
}

// ============================================================================
// STRUCTURAL WARNINGS
// ============================================================================

/// Names and references gathered in one walk.
#[derive(Default)]
struct Registry<'a> {
    functions: Vec<(&'a str, Span)>,
    called: HashSet<&'a str>,
    tags: HashSet<&'a str>,
    tag_lookups: Vec<(&'a AstNode, &'a str)>,
}

impl<'a> Registry<'a> {
    fn record(&mut self, node: &'a AstNode) {
        match node.node_type {
            NodeType::Function => {
                if let Some(name) = node.text() {
                    self.functions.push((name, node.span));
                }
            }
            NodeType::MethodCall if node.meta("has_receiver") == Some(&Scalar::Bool(false)) => {
                if let Some(name) = node.text() {
                    self.called.insert(name);
                }
            }
            NodeType::Plugin => {
                if let Some(name) = node.text() {
                    self.called.insert(name);
                }
            }
            NodeType::Remember => {
                if let Some(tags) = node.meta_str("tags") {
                    self.tags.extend(tags.split(',').map(str::trim).filter(|t| !t.is_empty()));
                }
            }
            NodeType::Recall | NodeType::Forget if node.meta_str("type") == Some("tag") => {
                if let Some(tag) = node.text() {
                    self.tag_lookups.push((node, tag));
                }
            }
            _ => {}
        }
    }
}

/// Non-fatal findings, ordered by source position.
pub fn structural_warnings(ast: &AstNode) -> Vec<Diagnostic> {
    let mut registry = Registry::default();
    let mut warnings: Vec<FrontendError> = Vec::new();

    ast.walk(&mut |node, _| {
        registry.record(node);
        if let Some(warning) = empty_block(node) {
            warnings.push(warning);
        }
    });

    let mut first_definition: HashMap<&str, Span> = HashMap::new();
    for (name, span) in &registry.functions {
        match first_definition.get(name) {
            Some(first) => warnings.push(FrontendError::structural(
                format!(
                    "function '{}' is already defined at line {}",
                    name, first.line
                ),
                *span,
            )),
            None => {
                first_definition.insert(*name, *span);
                if !registry.called.contains(name) {
                    warnings.push(FrontendError::structural(
                        format!("function '{}' is defined but never called", name),
                        *span,
                    ));
                }
            }
        }
    }

    for (node, tag) in &registry.tag_lookups {
        if !registry.tags.contains(tag) {
            warnings.push(FrontendError::structural(
                format!(
                    "{} of tag '{}' that no 'remember ... as' assigns",
                    node.node_type, tag
                ),
                node.span,
            ));
        }
    }

    warnings.sort_by_key(|w| w.span().start);
    warnings.into_iter().map(Diagnostic::from).collect()
}

fn empty_block(node: &AstNode) -> Option<FrontendError> {
    if !node.node_type.is_block() {
        return None;
    }
    let has_body = node
        .children
        .iter()
        .any(|c| c.node_type != NodeType::ElseBlock);
    if has_body {
        return None;
    }
    let keyword = match node.node_type {
        NodeType::Function => "define",
        NodeType::ElseBlock => "else",
        other => other.as_str(),
    };
    Some(FrontendError::structural(
        format!("empty '{}' block", keyword),
        node.span,
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::Frontend;

    fn node(node_type: NodeType) -> AstNode {
        AstNode::new(node_type, Span::default())
    }

    fn program(children: Vec<AstNode>) -> AstNode {
        node(NodeType::Program).with_children(children)
    }

    fn warnings(source: &str) -> Vec<String> {
        let parsed = match Frontend::new().parse(source) {
            Ok(parsed) => parsed,
            Err(diagnostics) => panic!("parse failed: {}", diagnostics),
        };
        parsed.diagnostics.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_parsed_programs_satisfy_contracts() {
        let source = "goal: \"g\"\nremember(\"a\") as \"t\"\nrecall tag: \"t\"\nforget pattern: \"x*\"\nplugin p(1, [2])\ndefine f(a):\n  if a > 1 and not b:\n    debug a.len()\n  else:\n    x = -3\n  end\nend\nf(1)\n# done\n";
        assert!(Frontend::new().parse(source).is_ok());
    }

    #[test]
    fn test_root_must_be_program() {
        assert!(matches!(
            check_contracts(&node(NodeType::Goal)),
            Err(FrontendError::Internal { .. })
        ));
    }

    #[test]
    fn test_goal_without_priority_is_internal_error() {
        let bad = program(vec![node(NodeType::Goal).with_text("x")]);
        assert!(matches!(check_contracts(&bad), Err(FrontendError::Internal { .. })));

        let good = program(vec![node(NodeType::Goal)
            .with_text("x")
            .with_meta("priority", "low")]);
        assert!(check_contracts(&good).is_ok());
    }

    #[test]
    fn test_expression_in_statement_position_is_internal_error() {
        let bad = program(vec![node(NodeType::Literal)
            .with_text("x")
            .with_meta("kind", "identifier")]);
        assert!(matches!(check_contracts(&bad), Err(FrontendError::Internal { .. })));
    }

    #[test]
    fn test_else_block_only_last_in_if() {
        let else_block = node(NodeType::ElseBlock).with_children(vec![node(NodeType::Reflect)]);
        let condition = node(NodeType::Literal)
            .with_value(NodeValue::Bool(true))
            .with_meta("kind", "boolean");

        let good = program(vec![node(NodeType::If)
            .with_expr(condition.clone())
            .with_children(vec![node(NodeType::Reflect), else_block.clone()])]);
        assert!(check_contracts(&good).is_ok());

        let misplaced = program(vec![node(NodeType::If)
            .with_expr(condition)
            .with_children(vec![else_block, node(NodeType::Reflect)])]);
        assert!(check_contracts(&misplaced).is_err());
    }

    #[test]
    fn test_operator_arity_checked() {
        let operand = node(NodeType::Literal)
            .with_value(NodeValue::Number(1.0))
            .with_meta("kind", "number");
        let bad = program(vec![node(NodeType::ExpressionStatement).with_children(vec![node(
            NodeType::Comparison,
        )
        .with_meta("operator", "*")
        .with_children(vec![operand])])]);
        assert!(check_contracts(&bad).is_err());
    }

    #[test]
    fn test_method_call_arg_count_checked() {
        let bad = program(vec![node(NodeType::ExpressionStatement).with_children(vec![node(
            NodeType::MethodCall,
        )
        .with_text("f")
        .with_meta("has_receiver", false)
        .with_meta("arg_count", 2usize)])]);
        assert!(check_contracts(&bad).is_err());
    }

    #[test]
    fn test_unused_and_duplicate_functions() {
        let messages = warnings("define f()\n  reflect\nend\ndefine f()\n  reflect\nend\n");
        assert_eq!(
            messages,
            vec![
                "function 'f' is defined but never called",
                "function 'f' is already defined at line 1",
            ]
        );

        assert!(warnings("define f()\n  reflect\nend\nf()\n").is_empty());
        assert!(warnings("define search()\n  reflect\nend\nplugin search\n").is_empty());
    }

    #[test]
    fn test_empty_blocks() {
        let messages = warnings("while ready:\nend\nif a:\n  reflect\nelse:\nend\n");
        assert_eq!(messages, vec!["empty 'while' block", "empty 'else' block"]);
    }

    #[test]
    fn test_unknown_tag() {
        let messages = warnings("remember(\"a\") as \"work, home\"\nrecall tag: \"home\"\nforget tag: \"gym\"\n");
        assert_eq!(
            messages,
            vec!["forget of tag 'gym' that no 'remember ... as' assigns"]
        );
    }

    #[test]
    fn test_warnings_are_structural_kind() {
        let parsed = match Frontend::new().parse("when x:\nend\n") {
            Ok(parsed) => parsed,
            Err(diagnostics) => panic!("parse failed: {}", diagnostics),
        };
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::StructuralWarning);
        assert!(!parsed.diagnostics[0].is_error());
    }
}
