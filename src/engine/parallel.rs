//! Batch parsing
//!
//! Parse many independent inputs against one [`Parser`]. With the `parallel`
//! feature the batch is spread over rayon's thread pool; without it the
//! inputs are parsed one after another. Either way results come back in input
//! order.
//!
//! ```toml
//! [dependencies]
//! precedent = { version = "0.1", features = ["parallel"] }
//! ```

use super::context::Context;
use super::error::RichError;
use super::evaluator::{DataBag, EvalError, Evaluator};
use super::parser::Parser;
use super::value::Value;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parse every input, returning one result per input in the same order
///
/// ```rust
/// use precedent::prelude::*;
///
/// let parser = Parser::new(Vec::new()).unwrap();
/// let results = parse_batch(&parser, &["1", "'two'", ")"], &Context::new());
/// assert!(results[0].is_ok() && results[1].is_ok() && results[2].is_err());
/// ```
#[cfg(feature = "rayon")]
pub fn parse_batch<S: AsRef<str> + Sync>(
    parser: &Parser,
    inputs: &[S],
    context: &Context,
) -> Vec<Result<Evaluator, RichError>> {
    inputs
        .par_iter()
        .map(|input| parser.parse(input.as_ref(), context))
        .collect()
}

/// Parse every input, returning one result per input in the same order
///
/// ```rust
/// use precedent::prelude::*;
///
/// let parser = Parser::new(Vec::new()).unwrap();
/// let results = parse_batch(&parser, &["1", "'two'", ")"], &Context::new());
/// assert!(results[0].is_ok() && results[1].is_ok() && results[2].is_err());
/// ```
#[cfg(not(feature = "rayon"))]
pub fn parse_batch<S: AsRef<str> + Sync>(
    parser: &Parser,
    inputs: &[S],
    context: &Context,
) -> Vec<Result<Evaluator, RichError>> {
    inputs
        .iter()
        .map(|input| parser.parse(input.as_ref(), context))
        .collect()
}

/// Parse and evaluate every input against the same data
///
/// Parse failures keep their [`RichError`] through [`EvalError::Parse`].
pub fn evaluate_batch<S: AsRef<str> + Sync>(
    parser: &Parser,
    inputs: &[S],
    context: &Context,
    data: &DataBag,
) -> Vec<Result<Value, EvalError>> {
    parse_batch(parser, inputs, context)
        .into_iter()
        .map(|parsed| match parsed {
            Ok(evaluator) => evaluator.evaluate(data),
            Err(err) => Err(EvalError::Parse(err)),
        })
        .collect()
}
