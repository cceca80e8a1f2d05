//! Abstract Syntax Tree types
//!
//! Every program is a tree of uniform [`AstNode`]s. The per-type contract
//! (value, children, metadata) is:
//!
//! | node_type | value | children | metadata |
//! |-----------|-------|----------|----------|
//! | program | – | statements | – |
//! | goal | text | – | `priority` |
//! | agent, model, assistant, think, learn | text | – | – |
//! | remember | text | – | optional `tags` |
//! | recall, forget | text | optional `recall_target` / `memory_pattern` | `type` |
//! | recall_target | text | – | `field` |
//! | memory_pattern | text | – | – |
//! | reflect | optional text | – | – |
//! | plugin | text | arguments | `arg_count` when an argument list was written |
//! | intent | text | – | `action` |
//! | debug | – | expression | `level` |
//! | function | text | body | `parameters` |
//! | if | condition | body, optional trailing `else_block` | – |
//! | else_block | – | body | – |
//! | when, while | condition | body | – |
//! | for | iterable | body | `variable` |
//! | assignment | target | expression | – |
//! | expression_statement | – | expression | – |
//! | comparison | – | operands | `operator` |
//! | method_call | method | receiver?, arguments | `has_receiver`, `arg_count` |
//! | array | – | elements | – |
//! | comment | text | – | – |
//! | literal | text / number / bool | – | `kind` |

pub mod transform;

pub use transform::*;

use crate::lexer::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// NODE TYPES
// ============================================================================

/// The closed set of AST node tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Program,
    Goal,
    Agent,
    Model,
    Assistant,
    Think,
    Learn,
    Remember,
    Recall,
    RecallTarget,
    Forget,
    Reflect,
    MemoryPattern,
    Plugin,
    Function,
    If,
    When,
    For,
    While,
    ElseBlock,
    Intent,
    Debug,
    Assignment,
    ExpressionStatement,
    Comparison,
    MethodCall,
    Array,
    Comment,
    Literal,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Program => "program",
            NodeType::Goal => "goal",
            NodeType::Agent => "agent",
            NodeType::Model => "model",
            NodeType::Assistant => "assistant",
            NodeType::Think => "think",
            NodeType::Learn => "learn",
            NodeType::Remember => "remember",
            NodeType::Recall => "recall",
            NodeType::RecallTarget => "recall_target",
            NodeType::Forget => "forget",
            NodeType::Reflect => "reflect",
            NodeType::MemoryPattern => "memory_pattern",
            NodeType::Plugin => "plugin",
            NodeType::Function => "function",
            NodeType::If => "if",
            NodeType::When => "when",
            NodeType::For => "for",
            NodeType::While => "while",
            NodeType::ElseBlock => "else_block",
            NodeType::Intent => "intent",
            NodeType::Debug => "debug",
            NodeType::Assignment => "assignment",
            NodeType::ExpressionStatement => "expression_statement",
            NodeType::Comparison => "comparison",
            NodeType::MethodCall => "method_call",
            NodeType::Array => "array",
            NodeType::Comment => "comment",
            NodeType::Literal => "literal",
        }
    }

    /// Node types that may appear in `program` or a block body.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeType::Goal
                | NodeType::Agent
                | NodeType::Model
                | NodeType::Assistant
                | NodeType::Think
                | NodeType::Learn
                | NodeType::Remember
                | NodeType::Recall
                | NodeType::Forget
                | NodeType::Reflect
                | NodeType::Plugin
                | NodeType::Function
                | NodeType::If
                | NodeType::When
                | NodeType::For
                | NodeType::While
                | NodeType::Intent
                | NodeType::Debug
                | NodeType::Assignment
                | NodeType::ExpressionStatement
                | NodeType::Comment
        )
    }

    /// Node types that evaluate to a value.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeType::Comparison | NodeType::MethodCall | NodeType::Array | NodeType::Literal
        )
    }

    /// Block statements whose children are a statement body.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeType::Function
                | NodeType::If
                | NodeType::When
                | NodeType::For
                | NodeType::While
                | NodeType::ElseBlock
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// Metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Scalar>),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Scalar::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<usize> for Scalar {
    fn from(n: usize) -> Self {
        Scalar::Number(n as f64)
    }
}

/// Node value: a scalar, or an expression for control-flow heads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Expr(Box<AstNode>),
}

// ============================================================================
// AST NODE
// ============================================================================

/// A node of the abstract syntax tree.
///
/// Equality is structural: `span` is ignored, so trees parsed from
/// differently laid-out sources compare equal when they mean the same thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Scalar>,
    #[serde(default)]
    pub span: Span,
}

impl PartialEq for AstNode {
    fn eq(&self, other: &Self) -> bool {
        self.node_type == other.node_type
            && self.value == other.value
            && self.children == other.children
            && self.metadata == other.metadata
    }
}

impl AstNode {
    pub fn new(node_type: NodeType, span: Span) -> Self {
        Self {
            node_type,
            value: None,
            children: Vec::new(),
            metadata: BTreeMap::new(),
            span,
        }
    }

    pub fn with_value(mut self, value: NodeValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_value(NodeValue::Text(text.into()))
    }

    pub fn with_expr(self, expr: AstNode) -> Self {
        self.with_value(NodeValue::Expr(Box::new(expr)))
    }

    pub fn with_children(mut self, children: Vec<AstNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Scalar>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Text value, if the value is text.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(NodeValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Expression value (conditions and iterables).
    pub fn expr(&self) -> Option<&AstNode> {
        match &self.value {
            Some(NodeValue::Expr(node)) => Some(node),
            _ => None,
        }
    }

    pub fn meta(&self, key: &str) -> Option<&Scalar> {
        self.metadata.get(key)
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta(key).and_then(Scalar::as_str)
    }

    /// Depth-first, pre-order traversal. A node's expression value is visited
    /// before its children, matching evaluation order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a AstNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a AstNode, usize)) {
        visit(self, depth);
        if let Some(expr) = self.expr() {
            expr.walk_at(depth + 1, visit);
        }
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_serializes_snake_case() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&NodeType::ElseBlock)?, "\"else_block\"");
        assert_eq!(serde_json::to_string(&NodeType::If)?, "\"if\"");
        assert_eq!(
            serde_json::to_string(&NodeType::ExpressionStatement)?,
            "\"expression_statement\""
        );
        Ok(())
    }

    #[test]
    fn test_unknown_node_type_fails_loudly() {
        let result = serde_json::from_str::<AstNode>(r#"{"node_type": "node_declaration"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_shape() -> Result<(), serde_json::Error> {
        let node = AstNode::new(NodeType::Goal, Span::default())
            .with_text("ship it")
            .with_meta("priority", "high");
        let json = serde_json::to_value(&node)?;
        assert_eq!(json["node_type"], "goal");
        assert_eq!(json["value"], "ship it");
        assert_eq!(json["metadata"]["priority"], "high");
        assert!(json.get("children").is_none());

        let back: AstNode = serde_json::from_value(json)?;
        assert_eq!(back, node);
        Ok(())
    }

    #[test]
    fn test_equality_ignores_span() {
        let a = AstNode::new(NodeType::Reflect, Span::default());
        let b = AstNode::new(
            NodeType::Reflect,
            Span {
                start: 10,
                end: 17,
                line: 3,
                column: 1,
            },
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_walk_visits_condition_before_body() {
        let condition = AstNode::new(NodeType::Literal, Span::default()).with_text("ready");
        let body = AstNode::new(NodeType::Reflect, Span::default());
        let node = AstNode::new(NodeType::While, Span::default())
            .with_expr(condition)
            .with_children(vec![body]);

        let mut seen = Vec::new();
        node.walk(&mut |n, depth| seen.push((n.node_type, depth)));
        assert_eq!(
            seen,
            vec![
                (NodeType::While, 0),
                (NodeType::Literal, 1),
                (NodeType::Reflect, 1)
            ]
        );
    }
}
