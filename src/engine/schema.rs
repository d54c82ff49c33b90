//! Pattern and node-definition model
//!
//! A grammar is assembled from [`NodeDefinition`]s. Each definition names a
//! node, gives it a [`Precedence`], and describes its surface syntax as a
//! pattern: a sequence of [`PatternElement`]s built with the free functions
//! in this module.
//!
//! ```rust
//! use precedent::engine::schema::*;
//!
//! let add = NodeDefinition::new("add", 1)
//!     .pattern([lhs_typed("number").named("left"), token("+"), rhs_typed("number").named("right")])
//!     .returns("number");
//! assert_eq!(add.pattern.len(), 3);
//! ```
//!
//! Expression slots come in three roles. `lhs` parses at the next tighter
//! level, `rhs` re-enters the current level (so operators chain to the
//! right), and `full` restarts at the loosest level (for bracketed or
//! delimited sub-expressions).

use super::ast::{Capture, Fields};
use super::context::Context;
use super::evaluator::{Bindings, EvalContext, EvalError};
use super::value::Value;
use std::fmt;
use std::sync::Arc;

/// Default quote characters accepted by [`string`]
pub const DEFAULT_QUOTES: [char; 2] = ['"', '\''];

/// Result type used when a definition declares none
pub const DEFAULT_RESULT_TYPE: &str = "unknown";

// ============================================================================
// Pattern elements
// ============================================================================

/// Where an expression slot re-enters the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Next tighter level (`level + 1`)
    Lhs,
    /// Same level (right-associative chaining)
    Rhs,
    /// Loosest level (level 0)
    Full,
}

impl Role {
    /// Lowercase role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Lhs => "lhs",
            Role::Rhs => "rhs",
            Role::Full => "full",
        }
    }

    /// Level an expression slot with this role parses at, from `level`
    #[inline]
    pub fn target_level(&self, level: usize) -> usize {
        match self {
            Role::Lhs => level + 1,
            Role::Rhs => level,
            Role::Full => 0,
        }
    }
}

/// What a pattern element matches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Decimal number literal
    Number,
    /// Quoted string literal, opened by any of `quotes`
    String {
        /// Accepted opening/closing quote characters
        quotes: Vec<char>,
    },
    /// Identifier reference
    Ident,
    /// Exact token
    Const(String),
    /// `null` keyword
    Null,
    /// `true` / `false` keywords
    Boolean,
    /// `undefined` keyword
    Undefined,
    /// Sub-expression
    Expr {
        /// Where the sub-expression re-enters the grammar
        role: Role,
        /// Optional type descriptor the sub-expression must satisfy
        constraint: Option<String>,
    },
}

impl ElementKind {
    /// Whether this element is a sub-expression slot
    pub fn is_expr(&self) -> bool {
        matches!(self, ElementKind::Expr { .. })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Number => f.write_str("number"),
            ElementKind::String { quotes } => {
                let quotes: String = quotes.iter().collect();
                write!(f, "string[{}]", quotes)
            }
            ElementKind::Ident => f.write_str("ident"),
            ElementKind::Const(token) => write!(f, "'{}'", token),
            ElementKind::Null => f.write_str("null"),
            ElementKind::Boolean => f.write_str("boolean"),
            ElementKind::Undefined => f.write_str("undefined"),
            ElementKind::Expr { role, constraint } => match constraint {
                Some(c) => write!(f, "{}<{}>", role.as_str(), c),
                None => f.write_str(role.as_str()),
            },
        }
    }
}

/// One element of a pattern, optionally captured under a name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternElement {
    /// What the element matches
    pub kind: ElementKind,
    /// Capture name, if the match is kept
    pub name: Option<String>,
}

impl PatternElement {
    /// Create an unnamed element
    pub fn new(kind: ElementKind) -> Self {
        Self { kind, name: None }
    }

    /// Return a copy of this element captured as `name`
    ///
    /// The receiver is left untouched, so a shared element can be named
    /// differently in several patterns.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            kind: self.kind.clone(),
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{}", name, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Number literal element
pub fn number() -> PatternElement {
    PatternElement::new(ElementKind::Number)
}

/// String literal element accepting `"` and `'`
pub fn string() -> PatternElement {
    string_with(DEFAULT_QUOTES)
}

/// String literal element accepting the given quote characters
pub fn string_with(quotes: impl IntoIterator<Item = char>) -> PatternElement {
    PatternElement::new(ElementKind::String {
        quotes: quotes.into_iter().collect(),
    })
}

/// Identifier element
pub fn ident() -> PatternElement {
    PatternElement::new(ElementKind::Ident)
}

/// Exact token element
pub fn token(tok: impl Into<String>) -> PatternElement {
    PatternElement::new(ElementKind::Const(tok.into()))
}

/// `null` keyword element
pub fn null() -> PatternElement {
    PatternElement::new(ElementKind::Null)
}

/// `true` / `false` keyword element
pub fn boolean() -> PatternElement {
    PatternElement::new(ElementKind::Boolean)
}

/// `undefined` keyword element
pub fn undefined() -> PatternElement {
    PatternElement::new(ElementKind::Undefined)
}

fn expr(role: Role, constraint: Option<String>) -> PatternElement {
    PatternElement::new(ElementKind::Expr { role, constraint })
}

/// Sub-expression at the next tighter level
pub fn lhs() -> PatternElement {
    expr(Role::Lhs, None)
}

/// Sub-expression at the same level
pub fn rhs() -> PatternElement {
    expr(Role::Rhs, None)
}

/// Sub-expression at the loosest level
pub fn full() -> PatternElement {
    expr(Role::Full, None)
}

/// [`lhs`] constrained to a type descriptor
pub fn lhs_typed(constraint: impl Into<String>) -> PatternElement {
    expr(Role::Lhs, Some(constraint.into()))
}

/// [`rhs`] constrained to a type descriptor
pub fn rhs_typed(constraint: impl Into<String>) -> PatternElement {
    expr(Role::Rhs, Some(constraint.into()))
}

/// [`full`] constrained to a type descriptor
pub fn full_typed(constraint: impl Into<String>) -> PatternElement {
    expr(Role::Full, Some(constraint.into()))
}

// ============================================================================
// Node definitions
// ============================================================================

/// Precedence key of a definition
///
/// Numeric levels bind looser the lower they are. `Atom` always sorts after
/// every numeric level, including negative ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// Numeric level
    Level(i64),
    /// User atom level, just before the built-in atoms
    Atom,
}

impl From<i64> for Precedence {
    fn from(level: i64) -> Self {
        Precedence::Level(level)
    }
}

impl From<i32> for Precedence {
    fn from(level: i32) -> Self {
        Precedence::Level(level.into())
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precedence::Level(n) => write!(f, "{}", n),
            Precedence::Atom => f.write_str("atom"),
        }
    }
}

/// How a node's output type is determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultType {
    /// A fixed type descriptor
    Static(String),
    /// Union of the output types of the named captures
    UnionOf(Vec<String>),
}

impl Default for ResultType {
    fn default() -> Self {
        ResultType::Static(DEFAULT_RESULT_TYPE.to_string())
    }
}

/// Computes extra node fields from the captures at parse time
pub type ConfigureFn = Arc<dyn Fn(&[Capture], &Context) -> Fields + Send + Sync>;

/// Computes a node's value from its evaluated captures
pub type EvaluateFn = Arc<dyn Fn(&Bindings, &EvalContext<'_>) -> Result<Value, EvalError> + Send + Sync>;

/// A user-declared node: name, precedence, pattern and behaviour
#[derive(Clone)]
pub struct NodeDefinition {
    /// Unique node name
    pub name: String,
    /// Precedence key
    pub precedence: Precedence,
    /// Surface syntax
    pub pattern: Vec<PatternElement>,
    /// Output type rule
    pub result: ResultType,
    /// Parse-time field hook
    pub configure: Option<ConfigureFn>,
    /// Evaluation hook
    pub evaluate: Option<EvaluateFn>,
}

impl NodeDefinition {
    /// Start a definition with an empty pattern and `unknown` result type
    pub fn new(name: impl Into<String>, precedence: impl Into<Precedence>) -> Self {
        Self {
            name: name.into(),
            precedence: precedence.into(),
            pattern: Vec::new(),
            result: ResultType::default(),
            configure: None,
            evaluate: None,
        }
    }

    /// Start a definition at the user atom level
    pub fn atom(name: impl Into<String>) -> Self {
        Self::new(name, Precedence::Atom)
    }

    /// Set the pattern
    pub fn pattern(mut self, elements: impl IntoIterator<Item = PatternElement>) -> Self {
        self.pattern = elements.into_iter().collect();
        self
    }

    /// Set a fixed result type descriptor
    pub fn returns(mut self, descriptor: impl Into<String>) -> Self {
        self.result = ResultType::Static(descriptor.into());
        self
    }

    /// Make the result type the union of the named captures' types
    pub fn union_of<S: Into<String>>(mut self, captures: impl IntoIterator<Item = S>) -> Self {
        self.result = ResultType::UnionOf(captures.into_iter().map(Into::into).collect());
        self
    }

    /// Set the parse-time field hook
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Capture], &Context) -> Fields + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(f));
        self
    }

    /// Set the evaluation hook
    pub fn evaluate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Bindings, &EvalContext<'_>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.evaluate = Some(Arc::new(f));
        self
    }

    /// Names of captured elements, in pattern order
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.pattern.iter().filter_map(|e| e.name.as_deref())
    }

    /// Pattern rendered as space-separated elements
    pub fn pattern_string(&self) -> String {
        self.pattern
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("name", &self.name)
            .field("precedence", &self.precedence)
            .field("pattern", &self.pattern_string())
            .field("result", &self.result)
            .field("configure", &self.configure.is_some())
            .field("evaluate", &self.evaluate.is_some())
            .finish()
    }
}
