//! Pretty printer for Cogni ASTs
//!
//! Renders canonical source: one statement per line, two-space block
//! indentation, explicit goal priorities and the minimum parentheses needed
//! to keep operator structure. Parsing the output yields an equal AST.

use crate::ast::{AstNode, NodeType, NodeValue, Scalar};
use crate::grammar;

const INDENT: &str = "  ";

/// Render an AST back to source text.
pub fn pretty_print(ast: &AstNode) -> String {
    let mut printer = Printer::default();
    match ast.node_type {
        NodeType::Program => printer.statements(&ast.children),
        _ => printer.statement(ast),
    }
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn statements(&mut self, nodes: &[AstNode]) {
        for node in nodes {
            self.statement(node);
        }
    }

    fn block(&mut self, header: String, body: &[AstNode]) {
        self.line(&header);
        self.depth += 1;
        self.statements(body);
        self.depth -= 1;
    }

    fn statement(&mut self, node: &AstNode) {
        let text = node.text().unwrap_or_default();

        match node.node_type {
            NodeType::Goal => {
                let priority = node
                    .meta_str("priority")
                    .unwrap_or(grammar::DEFAULT_PRIORITY);
                self.line(&format!("goal: {} priority: {}", quote(text), priority));
            }
            NodeType::Agent => self.line(&format!("agent: {}", name(text))),
            NodeType::Model => self.line(&format!("model: {}", name(text))),
            NodeType::Assistant => self.line(&format!("assistant: {}", quote(text))),
            NodeType::Think => self.line(&format!("think: {}", quote(text))),
            NodeType::Learn => self.line(&format!("learn: {}", quote(text))),
            NodeType::Remember => match node.meta_str("tags") {
                Some(tags) => self.line(&format!("remember({}) as {}", quote(text), quote(tags))),
                None => self.line(&format!("remember({})", quote(text))),
            },
            NodeType::Recall | NodeType::Forget => {
                let selector = match node.meta_str("type") {
                    Some(kind @ (grammar::SELECTOR_TAG | grammar::SELECTOR_PATTERN)) => {
                        format!("{}: ", kind)
                    }
                    _ => String::new(),
                };
                self.line(&format!("{} {}{}", node.node_type, selector, quote(text)));
            }
            NodeType::Reflect => match node.text() {
                Some(topic) => self.line(&format!("reflect: {}", quote(topic))),
                None => self.line("reflect"),
            },
            NodeType::Plugin => {
                if node.meta("arg_count").is_some() {
                    self.line(&format!("plugin {}({})", name(text), list(&node.children)));
                } else {
                    self.line(&format!("plugin {}", name(text)));
                }
            }
            NodeType::Intent => {
                let action = node.meta_str("action").unwrap_or_default();
                self.line(&format!("intent: {} -> {}", quote(text), action));
            }
            NodeType::Debug => {
                let level = node.meta_str("level").unwrap_or("debug");
                self.line(&format!("{} {}", level, list(&node.children)));
            }
            NodeType::Comment if text.is_empty() => self.line("#"),
            NodeType::Comment => self.line(&format!("# {}", text)),

            NodeType::Function => {
                let parameters: Vec<&str> = node
                    .meta("parameters")
                    .and_then(Scalar::as_list)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(Scalar::as_str)
                    .collect();
                self.block(
                    format!("define {}({}):", text, parameters.join(", ")),
                    &node.children,
                );
                self.line("end");
            }
            NodeType::If => {
                let (body, else_block) = match node.children.split_last() {
                    Some((last, rest)) if last.node_type == NodeType::ElseBlock => (rest, Some(last)),
                    _ => (node.children.as_slice(), None),
                };
                self.block(format!("if {}:", condition(node)), body);
                if let Some(else_block) = else_block {
                    self.block("else:".to_string(), &else_block.children);
                }
                self.line("end");
            }
            NodeType::When | NodeType::While => {
                self.block(format!("{} {}:", node.node_type, condition(node)), &node.children);
                self.line("end");
            }
            NodeType::For => {
                let variable = node.meta_str("variable").unwrap_or_default();
                self.block(
                    format!("for {} in {}:", variable, condition(node)),
                    &node.children,
                );
                self.line("end");
            }
            NodeType::ElseBlock => {
                self.block("else:".to_string(), &node.children);
            }

            NodeType::Assignment => self.line(&format!("{} = {}", text, list(&node.children))),
            NodeType::ExpressionStatement => self.line(&list(&node.children)),

            NodeType::Program => self.statements(&node.children),

            NodeType::RecallTarget
            | NodeType::MemoryPattern
            | NodeType::Comparison
            | NodeType::MethodCall
            | NodeType::Array
            | NodeType::Literal => self.line(&expression(node)),
        }
    }
}

fn condition(node: &AstNode) -> String {
    node.expr().map(expression).unwrap_or_default()
}

// ============================================================================
// Expressions
// ============================================================================

/// Binding strength used to decide where parentheses are needed.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_COMPARISON: u8 = 3;
const PREC_ADDITIVE: u8 = 4;
const PREC_MULTIPLICATIVE: u8 = 5;
const PREC_UNARY: u8 = 6;
const PREC_ATOM: u8 = 7;

fn precedence(node: &AstNode) -> u8 {
    match node.node_type {
        NodeType::Comparison if node.children.len() == 1 => PREC_UNARY,
        NodeType::Comparison => match node.meta_str("operator").unwrap_or_default() {
            "or" => PREC_OR,
            "and" => PREC_AND,
            "+" | "-" => PREC_ADDITIVE,
            "*" | "/" | "%" => PREC_MULTIPLICATIVE,
            _ => PREC_COMPARISON,
        },
        // Negative numbers print with a leading minus.
        NodeType::Literal => match node.value {
            Some(NodeValue::Number(n)) if n.is_sign_negative() => PREC_UNARY,
            _ => PREC_ATOM,
        },
        _ => PREC_ATOM,
    }
}

fn expression(node: &AstNode) -> String {
    match node.node_type {
        NodeType::Comparison => {
            let operator = node.meta_str("operator").unwrap_or_default();
            let level = precedence(node);
            match node.children.as_slice() {
                [operand] => {
                    let operand = operand_at(operand, level, false);
                    if operator == "not" {
                        format!("not {}", operand)
                    } else if operand.starts_with('-') {
                        format!("{} {}", operator, operand)
                    } else {
                        format!("{}{}", operator, operand)
                    }
                }
                [left, right] => {
                    // Comparisons do not chain, so a comparison operand on
                    // either side needs parentheses.
                    let left_strict = level == PREC_COMPARISON;
                    format!(
                        "{} {} {}",
                        operand_at(left, level, left_strict),
                        operator,
                        operand_at(right, level, true)
                    )
                }
                _ => list(&node.children),
            }
        }
        NodeType::MethodCall => {
            let method = node.text().unwrap_or_default();
            if node.meta("has_receiver") == Some(&Scalar::Bool(true)) {
                match node.children.split_first() {
                    Some((receiver, arguments)) => format!(
                        "{}.{}({})",
                        operand_at(receiver, PREC_ATOM, false),
                        method,
                        list(arguments)
                    ),
                    None => format!("{}()", method),
                }
            } else {
                format!("{}({})", method, list(&node.children))
            }
        }
        NodeType::Array => format!("[{}]", list(&node.children)),
        NodeType::Literal => literal(node),
        NodeType::RecallTarget | NodeType::MemoryPattern => quote(node.text().unwrap_or_default()),
        _ => String::new(),
    }
}

/// Render `node` as an operand at `level`, parenthesized when it binds more
/// loosely (or equally, when `strict`).
fn operand_at(node: &AstNode, level: u8, strict: bool) -> String {
    let inner = precedence(node);
    let rendered = expression(node);
    if inner < level || (strict && inner == level) {
        format!("({})", rendered)
    } else {
        rendered
    }
}

fn list(nodes: &[AstNode]) -> String {
    nodes.iter().map(expression).collect::<Vec<_>>().join(", ")
}

fn literal(node: &AstNode) -> String {
    match &node.value {
        Some(NodeValue::Number(n)) => n.to_string(),
        Some(NodeValue::Bool(b)) => b.to_string(),
        Some(NodeValue::Text(text)) if node.meta_str("kind") == Some("identifier") => text.clone(),
        Some(NodeValue::Text(text)) => quote(text),
        Some(NodeValue::Expr(expr)) => expression(expr),
        None => String::new(),
    }
}

// ============================================================================
// Strings and names
// ============================================================================

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Bare name when it lexes as an identifier, quoted string otherwise.
fn name(text: &str) -> String {
    let mut chars = text.chars();
    let starts_ident = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let plain = starts_ident
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && grammar::keyword(text).is_none();
    if plain {
        text.to_string()
    } else {
        quote(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frontend;

    fn round_trip(source: &str) -> String {
        let frontend = Frontend::new();
        let parsed = match frontend.parse(source) {
            Ok(parsed) => parsed,
            Err(diagnostics) => panic!("parse failed: {}", diagnostics),
        };
        let printed = pretty_print(&parsed.ast);
        match frontend.parse(&printed) {
            Ok(reparsed) => assert_eq!(reparsed.ast, parsed.ast, "printed:\n{}", printed),
            Err(diagnostics) => panic!("reparse failed: {}\nprinted:\n{}", diagnostics, printed),
        }
        printed
    }

    #[test]
    fn test_pretty_print_directives() {
        let printed = round_trip("goal: \"ship\"\nagent: \"multi word\"\nmodel: gpt4\nremember(\"x\") as \"t\"\nrecall tag: \"t\"\nreflect\n");
        assert_eq!(
            printed,
            "goal: \"ship\" priority: medium\nagent: \"multi word\"\nmodel: gpt4\nremember(\"x\") as \"t\"\nrecall tag: \"t\"\nreflect\n"
        );
    }

    #[test]
    fn test_pretty_print_blocks() {
        let printed = round_trip("define f(a, b)\nif a > b:\nthink: \"x\"\nelse\nreflect: \"y\"\nend\nend\n");
        assert_eq!(
            printed,
            "define f(a, b):\n  if a > b:\n    think: \"x\"\n  else:\n    reflect: \"y\"\n  end\nend\n"
        );
    }

    #[test]
    fn test_pretty_print_minimal_parentheses() {
        assert_eq!(round_trip("x = (1 + 2) * 3\n"), "x = (1 + 2) * 3\n");
        assert_eq!(round_trip("x = 1 + (2 * 3)\n"), "x = 1 + 2 * 3\n");
        assert_eq!(round_trip("x = a - (b - c)\n"), "x = a - (b - c)\n");
        assert_eq!(round_trip("x = (a < b) == c\n"), "x = (a < b) == c\n");
        assert_eq!(round_trip("x = not (a and b)\n"), "x = not (a and b)\n");
        assert_eq!(round_trip("x = (-5).abs()\n"), "x = (-5).abs()\n");
        assert_eq!(round_trip("x = - -y\n"), "x = - -y\n");
    }

    #[test]
    fn test_pretty_print_escapes_strings() {
        let printed = round_trip("think: \"say \\\"hi\\\"\\n\\\\done\"\n");
        assert_eq!(printed, "think: \"say \\\"hi\\\"\\n\\\\done\"\n");
    }

    #[test]
    fn test_pretty_print_calls_and_plugins() {
        round_trip("plugin search(\"q\", [1, 2.5])\nplugin \"web tool\"\nf()\nmemory.recall(\"k\").first()\n");
    }

    #[test]
    fn test_pretty_print_comments() {
        assert_eq!(round_trip("#   spaced note  \n#\n"), "# spaced note\n#\n");
    }
}
