//! Read-only statistics over a finished AST

use crate::ast::{AstNode, NodeType};
use serde::{Deserialize, Serialize};

/// Flat counts derived from an AST.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Every node, including `program` and expression nodes held in values.
    pub total_nodes: usize,
    pub functions: usize,
    pub goals: usize,
    /// `remember` + `recall` + `forget` + `reflect`
    pub memory_operations: usize,
    pub agents: usize,
    pub models: usize,
    /// `if` + `when` + `for` + `while`
    pub control_structures: usize,
    pub comments: usize,
    pub plugin_calls: usize,
    /// Depth of the deepest node; the root is at depth 0.
    pub max_depth: usize,
}

impl Statistics {
    pub fn collect(ast: &AstNode) -> Self {
        let mut stats = Self::default();

        ast.walk(&mut |node, depth| {
            stats.total_nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);

            match node.node_type {
                NodeType::Function => stats.functions += 1,
                NodeType::Goal => stats.goals += 1,
                NodeType::Remember | NodeType::Recall | NodeType::Forget | NodeType::Reflect => {
                    stats.memory_operations += 1
                }
                NodeType::Agent => stats.agents += 1,
                NodeType::Model => stats.models += 1,
                NodeType::If | NodeType::When | NodeType::For | NodeType::While => {
                    stats.control_structures += 1
                }
                NodeType::Comment => stats.comments += 1,
                NodeType::Plugin => stats.plugin_calls += 1,
                _ => {}
            }
        });

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    fn leaf(node_type: NodeType) -> AstNode {
        AstNode::new(node_type, Span::default())
    }

    #[test]
    fn test_counts_by_category() {
        let condition = leaf(NodeType::Literal);
        let program = leaf(NodeType::Program).with_children(vec![
            leaf(NodeType::Goal),
            leaf(NodeType::Agent),
            leaf(NodeType::Model),
            leaf(NodeType::Remember),
            leaf(NodeType::Recall),
            leaf(NodeType::Comment),
            leaf(NodeType::Plugin),
            leaf(NodeType::While)
                .with_expr(condition)
                .with_children(vec![leaf(NodeType::Reflect), leaf(NodeType::Forget)]),
        ]);

        let stats = Statistics::collect(&program);
        assert_eq!(stats.total_nodes, 12);
        assert_eq!(stats.goals, 1);
        assert_eq!(stats.agents, 1);
        assert_eq!(stats.models, 1);
        assert_eq!(stats.memory_operations, 4);
        assert_eq!(stats.control_structures, 1);
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.plugin_calls, 1);
        assert_eq!(stats.functions, 0);
        assert_eq!(stats.max_depth, 2);
    }

    #[test]
    fn test_empty_program() {
        let stats = Statistics::collect(&leaf(NodeType::Program));
        assert_eq!(
            stats,
            Statistics {
                total_nodes: 1,
                ..Statistics::default()
            }
        );
    }
}
