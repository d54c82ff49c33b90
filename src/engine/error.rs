//! Rich Error Reporting
//!
//! Every diagnostic parse failure is a [`RichError`]: a machine-readable
//! [`ErrorKind`], a human message, the resolved [`SourcePosition`], a short
//! snippet around the failure and, for mismatches, what was expected versus
//! what was found.
//!
//! # Example Output
//!
//! ```text
//! Error at line 1, column 5: unexpected end of input
//! 1 +
//!     ^
//!   expected: expression
//!   near: 1 + →
//! ```

use super::source_location::{
    build_snippet, get_line_at_offset, SourcePosition, DEFAULT_SNIPPET_WINDOW,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable category of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No rule matched at the failure position
    NoMatch,
    /// A rule matched structurally but a sub-expression had the wrong type
    TypeMismatch,
    /// A string literal ran off the end of the input
    UnterminatedString,
    /// A `(` was never closed
    UnclosedParen,
    /// A prefix parsed but input remained
    UnexpectedToken,
    /// Empty or whitespace-only input
    EmptyInput,
    /// Input exceeds the configured size limit
    InputTooLarge,
    /// Nesting exceeds the configured recursion limit
    RecursionLimit,
}

impl ErrorKind {
    /// The snake_case name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoMatch => "no_match",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::UnterminatedString => "unterminated_string",
            ErrorKind::UnclosedParen => "unclosed_paren",
            ErrorKind::UnexpectedToken => "unexpected_token",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::InputTooLarge => "input_too_large",
            ErrorKind::RecursionLimit => "recursion_limit",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected/actual detail attached to an error
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// What the parser was looking for
    pub expected: Option<String>,
    /// What it found instead
    pub actual: Option<String>,
    /// Which part of parsing failed (`expression`, `string literal`, ...)
    pub parsing_stage: Option<String>,
}

impl ErrorContext {
    fn is_empty(&self) -> bool {
        self.expected.is_none() && self.actual.is_none() && self.parsing_stage.is_none()
    }
}

/// A diagnostic parse error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Where the failure happened
    pub position: SourcePosition,
    /// Excerpt of the input around the failure, with a marker
    pub snippet: String,
    /// The full input that was being parsed
    pub input: String,
    /// Expected/actual detail
    pub context: Option<ErrorContext>,
}

impl RichError {
    /// Byte offset of the failure
    pub fn offset(&self) -> usize {
        self.position.offset
    }

    /// Expected description, if any
    pub fn expected(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.expected.as_deref())
    }

    /// Actual description, if any
    pub fn actual(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.actual.as_deref())
    }

    /// Format with the offending source line and a caret under the column
    pub fn format_with_source(&self) -> String {
        let mut output = format!("{}\n", self);

        let line = get_line_at_offset(&self.input, self.position.offset);
        output.push_str(line);
        output.push('\n');
        for _ in 0..self.position.column.saturating_sub(1) {
            output.push(' ');
        }
        output.push_str("^\n");

        if let Some(ctx) = &self.context {
            if let Some(expected) = &ctx.expected {
                output.push_str(&format!("  expected: {}\n", expected));
            }
            if let Some(actual) = &ctx.actual {
                output.push_str(&format!("  actual: {}\n", actual));
            }
        }
        output.push_str(&format!("  near: {}\n", self.snippet));
        output
    }
}

impl fmt::Display for RichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at line {}, column {}: {}",
            self.position.line, self.position.column, self.message
        )
    }
}

impl std::error::Error for RichError {}

/// Builder for [`RichError`]
///
/// Position and snippet are derived from the input and offset at
/// [`build`](ErrorBuilder::build) time.
#[derive(Debug, Clone)]
pub struct ErrorBuilder<'i> {
    kind: ErrorKind,
    input: &'i str,
    offset: usize,
    message: Option<String>,
    context: ErrorContext,
}

impl<'i> ErrorBuilder<'i> {
    /// Start an error of `kind` against `input`
    pub fn new(kind: ErrorKind, input: &'i str) -> Self {
        Self {
            kind,
            input,
            offset: 0,
            message: None,
            context: ErrorContext::default(),
        }
    }

    /// Set the byte offset of the failure
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the message (defaults to the kind name)
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set what was expected
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.context.expected = Some(expected.into());
        self
    }

    /// Set what was found
    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.context.actual = Some(actual.into());
        self
    }

    /// Set the parsing stage
    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.context.parsing_stage = Some(stage.into());
        self
    }

    /// Build the error
    pub fn build(self) -> RichError {
        let position = SourcePosition::from_offset(self.input, self.offset);
        RichError {
            kind: self.kind,
            message: self
                .message
                .unwrap_or_else(|| self.kind.as_str().replace('_', " ")),
            snippet: build_snippet(self.input, position.offset, DEFAULT_SNIPPET_WINDOW),
            position,
            input: self.input.to_string(),
            context: if self.context.is_empty() {
                None
            } else {
                Some(self.context)
            },
        }
    }
}
