//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions.
//! Importing this module with a wildcard import brings them into scope:
//!
//! ```
//! use precedent::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Defining a language
//! - [`NodeDefinition`] - A node: name, precedence, pattern and behaviour
//! - [`number()`], [`string()`], [`ident()`], [`token()`], [`null()`],
//!   [`boolean()`], [`undefined()`] - Literal and token elements
//! - [`lhs()`], [`rhs()`], [`full()`] and their `_typed` variants - Expression slots
//! - [`create_parser`] / [`Parser`] - Assemble a parser
//!
//! ## Parsing and evaluating
//! - [`Context`] - Identifier type declarations
//! - [`Evaluator`] - A parsed expression bound for evaluation
//! - [`DataBag`] / [`Value`] - Runtime data
//! - [`Bindings`] / [`EvalContext`] - What `evaluate` functions receive
//!
//! ## Errors
//! - [`RichError`] / [`ErrorKind`] - Parse failures
//! - [`EvalError`] - Evaluation failures
//! - [`GrammarError`] - Inconsistent definitions

// ============================================================================
// Defining a Language
// ============================================================================

pub use crate::create_parser;
pub use crate::engine::schema::{
    boolean, full, full_typed, ident, lhs, lhs_typed, null, number, rhs, rhs_typed, string,
    string_with, token, undefined, NodeDefinition, PatternElement, Precedence,
};

// ============================================================================
// Parsing
// ============================================================================

pub use crate::engine::{AstNode, Context, Parser, ParserConfig, TypeTag};

// ============================================================================
// Evaluation
// ============================================================================

pub use crate::engine::{Bindings, DataBag, EvalContext, Evaluator, Value};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{ErrorKind, EvalError, GrammarError, RichError};

// ============================================================================
// Batch Parsing
// ============================================================================

pub use crate::engine::{evaluate_batch, parse_batch};
