//! Developer tools
//!
//! [`TreePrinter`] renders a parsed tree one node per line, showing each
//! node's name, output type and span, with captures indented beneath their
//! parent. Grammar levels can be listed with
//! [`Grammar::describe`](super::grammar::Grammar::describe).

use super::ast::{AstNode, NodeKind};
use std::fmt::Write;

/// Parse tree pretty printer
///
/// ```rust
/// use precedent::engine::ast::AstNode;
/// use precedent::engine::debug::TreePrinter;
/// use precedent::engine::types::TypeTag;
///
/// let node = AstNode::identifier("score", TypeTag::Number, 0..5);
/// assert_eq!(TreePrinter::new().print(&node), "identifier score : number @ 0..5\n");
/// ```
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
    /// Whether to print configured fields
    show_fields: bool,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
            show_fields: false,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Also print fields computed by `configure`
    pub fn show_fields(mut self, show: bool) -> Self {
        self.show_fields = show;
        self
    }

    /// Render a tree
    pub fn print(&self, node: &AstNode) -> String {
        let mut output = String::new();
        self.print_node(node, None, 0, &mut output);
        output
    }

    fn print_node(&self, node: &AstNode, label: Option<&str>, depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);

        if let Some(max) = self.max_depth {
            if depth > max {
                let _ = writeln!(output, "{}...", indent);
                return;
            }
        }

        let _ = write!(output, "{}", indent);
        if let Some(label) = label {
            let _ = write!(output, "{}: ", label);
        }
        let _ = match &node.kind {
            NodeKind::Literal(lit) => write!(output, "{} {}", node.name, lit.raw),
            NodeKind::Identifier(name) => write!(output, "{} {}", node.name, name),
            NodeKind::Group | NodeKind::Rule => write!(output, "{}", node.name),
        };
        let _ = writeln!(
            output,
            " : {} @ {}..{}",
            node.output, node.span.start, node.span.end
        );

        if self.show_fields {
            for (name, value) in &node.fields {
                let _ = writeln!(output, "{}{}.{} = {}", indent, self.indent, name, value);
            }
        }

        for capture in &node.captures {
            self.print_node(&capture.node, Some(&capture.name), depth + 1, output);
        }
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}
