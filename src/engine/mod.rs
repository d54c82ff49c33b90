//! Grammar assembly, parsing and evaluation engine
//!
//! # Module Organization
//!
//! ## Defining a language
//! - [`schema`] - Pattern elements and node definitions
//! - [`grammar`] - Precedence levels assembled from definitions
//! - [`grammar_analysis`] - Construction-time checks and ambiguity warnings
//!
//! ## Parsing
//! - [`parser`] - The [`Parser`] front door and its configuration
//! - [`scanner`] - Token scanners for literals and identifiers
//! - [`cache`] - Packrat memo table
//! - [`ast`] - Parsed tree types
//!
//! ## Types and values
//! - [`types`] - Type tags and descriptor syntax
//! - [`validator`] - Descriptor cache and value validation
//! - [`context`] - Identifier declarations
//! - [`value`] - Runtime values
//!
//! ## Evaluation
//! - [`evaluator`] - Tree walker and evaluation errors
//!
//! ## Diagnostics
//! - [`error`] - Rich parse errors
//! - [`source_location`] - Line/column tracking and snippets
//! - [`escape`] - String escape decoding
//! - [`debug`] - Tree printer
//!
//! ## Batches
//! - [`parallel`] - Parse many inputs, optionally in parallel

// ============================================================================
// Module Declarations
// ============================================================================

#[macro_use]
mod logging;

pub mod ast;
pub mod cache;
pub mod context;
pub mod debug;
pub mod error;
pub mod escape;
pub mod evaluator;
pub mod grammar;
pub mod grammar_analysis;
pub mod parser;
pub mod scanner;
pub mod schema;
pub mod source_location;
pub mod types;
pub mod validator;
pub mod value;

// Batch parsing (always available, uses rayon when feature is enabled)
pub mod parallel;

// ============================================================================
// Core Types
// ============================================================================

pub use ast::{AstNode, Capture, Literal, NodeKind};
pub use context::Context;
pub use grammar::{compute_grammar, Grammar, Level};
pub use parser::{Parser, ParserConfig};
pub use schema::{NodeDefinition, PatternElement, Precedence, ResultType, Role};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{ErrorBuilder, ErrorContext, ErrorKind, RichError};
pub use evaluator::EvalError;
pub use grammar_analysis::{GrammarError, GrammarWarning, WarningKind};

// ============================================================================
// Evaluation
// ============================================================================

pub use evaluator::{Bindings, DataBag, EvalContext, Evaluator};
pub use value::Value;

// ============================================================================
// Types and Validation
// ============================================================================

pub use types::{TypeTag, TypeTagError};
pub use validator::{TypeTagValidator, ValidationErrors, ValidationIssue, Validator};

// ============================================================================
// Diagnostics
// ============================================================================

pub use debug::TreePrinter;
pub use escape::decode_escapes;
pub use source_location::{build_snippet, compute_position, SourcePosition};

// ============================================================================
// Batch Parsing
// ============================================================================

pub use parallel::{evaluate_batch, parse_batch};
