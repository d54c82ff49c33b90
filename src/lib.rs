//! Precedent - Runtime Expression Languages with Precedence Climbing
//!
//! Declare a small expression language as a flat list of node definitions
//! (operators, literals, custom constructs) and get back:
//! - A parser that builds typed ASTs by precedence climbing
//! - Type-constrained operator overloading, resolved at parse time
//! - Rich error reporting with positions, snippets and expected/actual detail
//! - An evaluator that walks the AST with per-node evaluation functions
//! - Validation of runtime data against declared identifier types
//! - Optional parallel batch parsing
//!
//! ## Quick Start
//!
//! ```rust
//! use precedent::prelude::*;
//!
//! let parser = create_parser([
//!     NodeDefinition::new("add", 1)
//!         .pattern([lhs_typed("number").named("left"), token("+"), rhs_typed("number").named("right")])
//!         .returns("number")
//!         .evaluate(|b, _| Ok(Value::number(b.number("left")? + b.number("right")?))),
//!     NodeDefinition::new("mul", 2)
//!         .pattern([lhs_typed("number").named("left"), token("*"), rhs_typed("number").named("right")])
//!         .returns("number")
//!         .evaluate(|b, _| Ok(Value::number(b.number("left")? * b.number("right")?))),
//! ])
//! .unwrap();
//!
//! let context = Context::from_descriptors([("x", "number")]).unwrap();
//! let expr = parser.parse("1 + x * 3", &context).unwrap();
//!
//! let mut data = DataBag::new();
//! data.insert("x".to_string(), Value::number(2.0));
//! assert_eq!(expr.evaluate(&data).unwrap(), Value::number(7.0));
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Parse batches on rayon's thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

// Prelude module for convenient imports
pub mod prelude;

pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    // Core types
    AstNode,
    Context,
    Grammar,
    NodeDefinition,
    Parser,
    ParserConfig,
    // Errors
    ErrorKind,
    EvalError,
    GrammarError,
    RichError,
    // Evaluation
    DataBag,
    Evaluator,
    TypeTag,
    Value,
};

/// Assemble a parser from node definitions with the default configuration
///
/// # Errors
/// Returns a [`GrammarError`] for duplicate names, left-recursive patterns,
/// malformed type descriptors and other inconsistent definitions.
pub fn create_parser(
    definitions: impl IntoIterator<Item = NodeDefinition>,
) -> Result<Parser, GrammarError> {
    Parser::new(definitions)
}
