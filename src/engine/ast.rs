//! AST types
//!
//! Parsing produces a tree of [`AstNode`]s. Each node is tagged with the name
//! of the definition (or built-in atom) that produced it, carries its output
//! [`TypeTag`], the byte span it covers, its named captures in pattern order
//! and any extra fields computed by the definition's `configure` hook.
//!
//! Children are held behind `Arc`, so cloning a node is shallow and trees can
//! be shared across threads.

use super::types::TypeTag;
use super::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Node name of number literals
pub const NUMBER_NODE: &str = "number";
/// Node name of string literals
pub const STRING_NODE: &str = "string";
/// Node name of `true` / `false`
pub const BOOLEAN_NODE: &str = "boolean";
/// Node name of `null`
pub const NULL_NODE: &str = "null";
/// Node name of `undefined`
pub const UNDEFINED_NODE: &str = "undefined";
/// Node name of identifier references
pub const IDENTIFIER_NODE: &str = "identifier";
/// Node name of constant tokens captured by name
pub const TOKEN_NODE: &str = "token";
/// Node name of parenthesised groups
pub const GROUP_NODE: &str = "group";
/// Capture name of a group's inner expression
pub const GROUP_INNER: &str = "inner";

/// Extra fields computed by a definition's `configure` hook
pub type Fields = BTreeMap<String, Value>;

/// Literal payload: the source text and the value it denotes
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    /// Source text exactly as written (quotes included for strings)
    pub raw: String,
    /// Decoded value
    pub value: Value,
}

/// What produced a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Number, string, keyword or captured constant token
    Literal(Literal),
    /// Identifier reference, resolved against the data bag at evaluation
    Identifier(String),
    /// Parenthesised full expression
    Group,
    /// A user node definition
    Rule,
}

/// A named sub-node
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// Capture name from the pattern
    pub name: String,
    /// The captured subtree
    pub node: Arc<AstNode>,
}

/// A parsed AST node
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    /// Definition or built-in name
    pub name: String,
    /// What produced the node
    pub kind: NodeKind,
    /// Output type tag
    pub output: TypeTag,
    /// Byte range of the input covered by this node
    pub span: Range<usize>,
    /// Named captures in pattern order
    pub captures: Vec<Capture>,
    /// Fields computed by `configure`
    pub fields: Fields,
}

impl AstNode {
    /// Create a literal node
    pub fn literal(
        name: &str,
        output: TypeTag,
        span: Range<usize>,
        raw: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Literal(Literal {
                raw: raw.into(),
                value,
            }),
            output,
            span,
            captures: Vec::new(),
            fields: Fields::new(),
        }
    }

    /// Create an identifier node
    pub fn identifier(ident: impl Into<String>, output: TypeTag, span: Range<usize>) -> Self {
        Self {
            name: IDENTIFIER_NODE.to_string(),
            kind: NodeKind::Identifier(ident.into()),
            output,
            span,
            captures: Vec::new(),
            fields: Fields::new(),
        }
    }

    /// Create a group node around `inner`
    pub fn group(inner: AstNode, span: Range<usize>) -> Self {
        Self {
            name: GROUP_NODE.to_string(),
            kind: NodeKind::Group,
            output: inner.output.clone(),
            span,
            captures: vec![Capture {
                name: GROUP_INNER.to_string(),
                node: Arc::new(inner),
            }],
            fields: Fields::new(),
        }
    }

    /// Get a capture by name
    pub fn capture(&self, name: &str) -> Option<&AstNode> {
        self.captures
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.node.as_ref())
    }

    /// Get a configured field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Literal payload, if this is a literal node
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Identifier name, if this is an identifier node
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// The slice of `input` this node was parsed from
    pub fn source<'i>(&self, input: &'i str) -> &'i str {
        input.get(self.span.clone()).unwrap_or("")
    }

    /// Compact rendering: literals as written, other nodes as `name(child, ...)`
    ///
    /// ```rust
    /// use precedent::engine::ast::AstNode;
    /// use precedent::engine::types::TypeTag;
    /// use precedent::engine::value::Value;
    ///
    /// let one = AstNode::literal("number", TypeTag::Number, 1..2, "1", Value::number(1.0));
    /// assert_eq!(AstNode::group(one, 0..3).to_sexpr(), "group(1)");
    /// ```
    pub fn to_sexpr(&self) -> String {
        match &self.kind {
            NodeKind::Literal(lit) => lit.raw.clone(),
            NodeKind::Identifier(name) => name.clone(),
            NodeKind::Group | NodeKind::Rule => {
                if self.captures.is_empty() {
                    return self.name.clone();
                }
                let children: Vec<String> =
                    self.captures.iter().map(|c| c.node.to_sexpr()).collect();
                format!("{}({})", self.name, children.join(", "))
            }
        }
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self
            .captures
            .iter()
            .map(|c| c.node.node_count())
            .sum::<usize>()
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sexpr())
    }
}
