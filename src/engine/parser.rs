//! Precedence-climbing parser
//!
//! [`Parser`] is built once from a list of [`NodeDefinition`]s and can then
//! parse any number of inputs, from any number of threads.
//!
//! Parsing starts at level 0 (the loosest). At each level the definitions
//! are tried in registration order; the first whose whole pattern matches
//! wins. If none matches, parsing falls through to the next tighter level,
//! ending with the built-in atoms. Expression slots in a pattern re-enter the
//! grammar by role: `lhs` at the next level, `rhs` at the same level and
//! `full` at level 0.
//!
//! # Example
//!
//! ```rust
//! use precedent::prelude::*;
//!
//! let parser = Parser::new([
//!     NodeDefinition::new("add", 1)
//!         .pattern([lhs().named("left"), token("+"), rhs().named("right")]),
//!     NodeDefinition::new("mul", 2)
//!         .pattern([lhs().named("left"), token("*"), rhs().named("right")]),
//! ])
//! .unwrap();
//!
//! let ast = parser.parse_ast("1 + 2 * 3", &Context::new()).unwrap();
//! assert_eq!(ast.to_sexpr(), "add(1, mul(2, 3))");
//! ```

use super::ast::{
    AstNode, Capture, NodeKind, BOOLEAN_NODE, NULL_NODE, NUMBER_NODE, STRING_NODE, TOKEN_NODE,
    UNDEFINED_NODE,
};
use super::cache::MemoTable;
use super::context::Context;
use super::error::{ErrorBuilder, ErrorKind, RichError};
use super::escape::decode_escapes;
use super::evaluator::{Evaluator, NodeTable};
use super::grammar::{compute_grammar, Grammar, Level};
use super::grammar_analysis::{GrammarAnalyzer, GrammarError, GrammarWarning};
use super::scanner::{
    describe_at, match_token, scan_identifier, scan_number, scan_string, skip_whitespace,
    Keyword, StringScan,
};
use super::schema::{ElementKind, NodeDefinition, ResultType, DEFAULT_QUOTES};
use super::source_location::SourcePosition;
use super::types::TypeTag;
use super::validator;
use super::value::Value;
use std::sync::Arc;

/// Default maximum input size: 10 MB
pub const DEFAULT_MAX_INPUT_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum recursion depth
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Characters of remaining input shown in "no rule matched" messages
const PREVIEW_CHARS: usize = 20;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration options for the parser
///
/// # Example
///
/// ```rust
/// use precedent::engine::parser::ParserConfig;
///
/// let config = ParserConfig::new()
///     .with_max_input_size(64 * 1024)
///     .with_max_recursion_depth(100)
///     .with_memoize(false);
/// assert_eq!(config.max_recursion_depth, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum allowed input size in bytes (0 = no limit)
    pub max_input_size: usize,

    /// Maximum nesting of sub-expression parses (0 = no limit)
    pub max_recursion_depth: usize,

    /// Cache level results per `(level, offset)` during a parse
    pub memoize: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            memoize: true,
        }
    }
}

impl ParserConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum input size
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// Set the maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Enable or disable memoization
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }
}

// ============================================================================
// Parse session
// ============================================================================

/// Failures that end the whole parse at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    EmptyInput,
    InputTooLarge { size: usize, max: usize },
    UnterminatedString(usize),
    UnclosedParen(usize),
    RecursionLimit { at: usize, max: usize },
}

type Parsed = Option<(Arc<AstNode>, usize)>;
type Step<T> = Result<T, Abort>;

#[derive(Debug)]
struct Mismatch {
    at: usize,
    expected: String,
    actual: String,
}

/// The furthest point any attempt reached before failing
#[derive(Debug, Default)]
struct Failure {
    offset: usize,
    expected: Vec<String>,
    mismatch: Option<Mismatch>,
}

impl Failure {
    fn expect(&mut self, offset: usize, what: &str) {
        if offset > self.offset {
            self.offset = offset;
            self.expected.clear();
            self.mismatch = None;
        } else if offset < self.offset {
            return;
        }
        if !self.expected.iter().any(|e| e == what) {
            self.expected.push(what.to_string());
        }
    }

    /// Record a type rejection of the sub-expression at `at` that ended at `reached`
    fn reject(&mut self, reached: usize, at: usize, expected: &str, actual: &TypeTag) {
        if reached > self.offset {
            self.offset = reached;
            self.expected.clear();
            self.mismatch = None;
        } else if reached < self.offset || self.mismatch.is_some() {
            return;
        }
        self.mismatch = Some(Mismatch {
            at,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
}

struct Session<'a> {
    grammar: &'a Grammar,
    context: &'a Context,
    input: &'a str,
    max_depth: usize,
    depth: usize,
    memo: Option<MemoTable>,
    failure: Failure,
}

impl<'a> Session<'a> {
    fn new(parser: &'a ParserInner, input: &'a str, context: &'a Context) -> Self {
        let memo = parser
            .config
            .memoize
            .then(|| MemoTable::for_input(input.len(), parser.grammar.len()));
        Self {
            grammar: &parser.grammar,
            context,
            input,
            max_depth: parser.config.max_recursion_depth,
            depth: 0,
            memo,
            failure: Failure::default(),
        }
    }

    /// Parse at `level`, falling through to tighter levels
    fn parse_level(&mut self, level: usize, pos: usize) -> Step<Parsed> {
        self.depth += 1;
        if self.max_depth > 0 && self.depth > self.max_depth {
            self.depth -= 1;
            return Err(Abort::RecursionLimit {
                at: pos,
                max: self.max_depth,
            });
        }

        let at = skip_whitespace(self.input, pos);
        let mut result = Ok(None);
        for current in level..self.grammar.len() {
            match self.level_cached(current, at) {
                Ok(None) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.depth -= 1;
        result
    }

    fn level_cached(&mut self, level: usize, at: usize) -> Step<Parsed> {
        if let Some(memo) = self.memo.as_mut() {
            if let Some(entry) = memo.get(level, at) {
                return Ok(entry.clone());
            }
        }

        let result = self.try_level(level, at)?;

        if let Some(memo) = self.memo.as_mut() {
            memo.insert(level, at, result.clone());
        }
        Ok(result)
    }

    /// Try only the definitions of `level` itself
    fn try_level(&mut self, level: usize, at: usize) -> Step<Parsed> {
        let grammar = self.grammar;
        match grammar.level(level) {
            Some(Level::Rules { nodes, .. }) => {
                for def in nodes {
                    log_trace!("level {} at {}: trying '{}'", level, at, def.name);
                    if let Some((node, end)) = self.match_pattern(def, level, at)? {
                        log_trace!("'{}' matched {}..{}", def.name, at, end);
                        return Ok(Some((Arc::new(node), end)));
                    }
                }
                Ok(None)
            }
            Some(Level::Builtin) => self.builtin(at),
            None => Ok(None),
        }
    }

    fn match_pattern(
        &mut self,
        def: &NodeDefinition,
        level: usize,
        start: usize,
    ) -> Step<Option<(AstNode, usize)>> {
        let mut cursor = start;
        let mut captures = Vec::with_capacity(def.pattern.len());

        for element in &def.pattern {
            let at = skip_whitespace(self.input, cursor);
            let (node, end) = match &element.kind {
                ElementKind::Expr { role, constraint } => {
                    let Some((node, end)) = self.parse_level(role.target_level(level), at)? else {
                        return Ok(None);
                    };
                    if let Some(constraint) = constraint {
                        if !satisfies(&node.output, constraint) {
                            log_trace!(
                                "'{}' rejects {} at {} (wants {})",
                                def.name,
                                node.output,
                                at,
                                constraint
                            );
                            let reached = skip_whitespace(self.input, end);
                            self.failure.reject(reached, at, constraint, &node.output);
                            return Ok(None);
                        }
                    }
                    (node, end)
                }
                kind => match self.scan_element(kind, at)? {
                    Some((node, end)) => (Arc::new(node), end),
                    None => {
                        self.failure.expect(at, &describe_element(kind));
                        return Ok(None);
                    }
                },
            };

            cursor = end;
            if let Some(name) = &element.name {
                captures.push(Capture {
                    name: name.clone(),
                    node,
                });
            }
        }

        let output = result_type(def, &captures);
        let fields = def
            .configure
            .as_ref()
            .map(|configure| configure(&captures, self.context))
            .unwrap_or_default();

        Ok(Some((
            AstNode {
                name: def.name.clone(),
                kind: NodeKind::Rule,
                output,
                span: start..cursor,
                captures,
                fields,
            },
            cursor,
        )))
    }

    fn scan_element(&self, kind: &ElementKind, at: usize) -> Step<Option<(AstNode, usize)>> {
        let keyword = |name: &str| {
            self.word(at)
                .filter(|(node, _)| node.name == name && node.as_literal().is_some())
        };
        Ok(match kind {
            ElementKind::Number => self.number(at),
            ElementKind::String { quotes } => return self.string(at, quotes),
            ElementKind::Ident => self
                .word(at)
                .filter(|(node, _)| node.as_identifier().is_some()),
            ElementKind::Null => keyword(NULL_NODE),
            ElementKind::Boolean => keyword(BOOLEAN_NODE),
            ElementKind::Undefined => keyword(UNDEFINED_NODE),
            ElementKind::Const(token) => match_token(self.input, at, token).map(|end| {
                let node = AstNode::literal(
                    TOKEN_NODE,
                    TypeTag::String,
                    at..end,
                    token.as_str(),
                    Value::string(token.as_str()),
                );
                (node, end)
            }),
            ElementKind::Expr { .. } => None,
        })
    }

    // ------------------------------------------------------------------------
    // Built-in atoms
    // ------------------------------------------------------------------------

    fn builtin(&mut self, at: usize) -> Step<Parsed> {
        let found = match self.number(at) {
            Some(found) => Some(found),
            None => match self.string(at, &DEFAULT_QUOTES)? {
                Some(found) => Some(found),
                None => match self.word(at) {
                    Some(found) => Some(found),
                    None => self.group(at)?,
                },
            },
        };

        match found {
            Some((node, end)) => Ok(Some((Arc::new(node), end))),
            None => {
                self.failure.expect(at, "expression");
                Ok(None)
            }
        }
    }

    fn number(&self, at: usize) -> Option<(AstNode, usize)> {
        let end = scan_number(self.input, at)?;
        let text = &self.input[at..end];
        let value = text.parse::<f64>().ok()?;
        Some((
            AstNode::literal(NUMBER_NODE, TypeTag::Number, at..end, text, Value::number(value)),
            end,
        ))
    }

    fn string(&self, at: usize, quotes: &[char]) -> Step<Option<(AstNode, usize)>> {
        match scan_string(self.input, at, quotes) {
            StringScan::NoQuote => Ok(None),
            StringScan::Unterminated => Err(Abort::UnterminatedString(at)),
            StringScan::Closed {
                content_start,
                content_end,
                end,
            } => {
                let value = decode_escapes(&self.input[content_start..content_end]);
                Ok(Some((
                    AstNode::literal(
                        STRING_NODE,
                        TypeTag::String,
                        at..end,
                        &self.input[at..end],
                        Value::String(value),
                    ),
                    end,
                )))
            }
        }
    }

    /// Identifier or keyword literal
    fn word(&self, at: usize) -> Option<(AstNode, usize)> {
        let end = scan_identifier(self.input, at)?;
        let text = &self.input[at..end];
        let span = at..end;

        let node = match Keyword::from_word(text) {
            Some(Keyword::Null) => AstNode::literal(NULL_NODE, TypeTag::Null, span, text, Value::Null),
            Some(Keyword::True) => {
                AstNode::literal(BOOLEAN_NODE, TypeTag::Boolean, span, text, Value::Bool(true))
            }
            Some(Keyword::False) => {
                AstNode::literal(BOOLEAN_NODE, TypeTag::Boolean, span, text, Value::Bool(false))
            }
            Some(Keyword::Undefined) => {
                AstNode::literal(UNDEFINED_NODE, TypeTag::Undefined, span, text, Value::Undefined)
            }
            None => {
                let output = self.context.get(text).cloned().unwrap_or(TypeTag::Unknown);
                AstNode::identifier(text, output, span)
            }
        };
        Some((node, end))
    }

    fn group(&mut self, at: usize) -> Step<Option<(AstNode, usize)>> {
        if !self.input[at..].starts_with('(') {
            return Ok(None);
        }
        let Some((inner, end)) = self.parse_level(0, at + 1)? else {
            return Ok(None);
        };

        let close = skip_whitespace(self.input, end);
        if !self.input[close..].starts_with(')') {
            return Err(Abort::UnclosedParen(at));
        }
        let inner = Arc::unwrap_or_clone(inner);
        Ok(Some((AstNode::group(inner, at..close + 1), close + 1)))
    }
}

fn satisfies(output: &TypeTag, constraint: &str) -> bool {
    validator::compile(constraint).is_ok_and(|tag| output.satisfies(&tag))
}

fn result_type(def: &NodeDefinition, captures: &[Capture]) -> TypeTag {
    match &def.result {
        ResultType::Static(descriptor) => validator::compile(descriptor)
            .map(|tag| tag.as_ref().clone())
            .unwrap_or(TypeTag::Unknown),
        ResultType::UnionOf(names) => TypeTag::union(names.iter().filter_map(|name| {
            captures
                .iter()
                .find(|c| &c.name == name)
                .map(|c| c.node.output.clone())
        })),
    }
}

fn describe_element(kind: &ElementKind) -> String {
    match kind {
        ElementKind::Const(token) => format!("'{}'", token),
        ElementKind::Number => "number".to_string(),
        ElementKind::String { .. } => "string".to_string(),
        ElementKind::Ident => "identifier".to_string(),
        ElementKind::Null => "null".to_string(),
        ElementKind::Boolean => "boolean".to_string(),
        ElementKind::Undefined => "undefined".to_string(),
        ElementKind::Expr { .. } => "expression".to_string(),
    }
}

// ============================================================================
// Attempt: one parse, projected to permissive or diagnostic results
// ============================================================================

struct Attempt<'i> {
    input: &'i str,
    step: Step<Parsed>,
    failure: Failure,
}

impl<'i> Attempt<'i> {
    /// Longest prefix parse; the remainder is returned untouched
    fn into_prefix(self) -> Result<(AstNode, &'i str), RichError> {
        match self.step {
            Err(abort) => Err(abort_error(self.input, abort)),
            Ok(None) => Err(failure_error(self.input, &self.failure)),
            Ok(Some((node, end))) => Ok((Arc::unwrap_or_clone(node), &self.input[end..])),
        }
    }

    /// Whole-input parse; only trailing whitespace may remain
    fn into_full(self) -> Result<AstNode, RichError> {
        let input = self.input;
        let (node, end) = match self.step {
            Err(abort) => return Err(abort_error(input, abort)),
            Ok(None) => return Err(failure_error(input, &self.failure)),
            Ok(Some(parsed)) => parsed,
        };

        let rest = skip_whitespace(input, end);
        if rest == input.len() {
            return Ok(Arc::unwrap_or_clone(node));
        }
        if self.failure.offset > rest {
            return Err(failure_error(input, &self.failure));
        }

        let found = describe_at(input, rest);
        Err(ErrorBuilder::new(ErrorKind::UnexpectedToken, input)
            .at(rest)
            .message(format!(
                "unexpected token {} at position {}",
                found,
                SourcePosition::from_offset(input, rest)
            ))
            .expected("end of input")
            .actual(found)
            .stage("full parse")
            .build())
    }
}

fn failure_error(input: &str, failure: &Failure) -> RichError {
    if let Some(mismatch) = &failure.mismatch {
        return ErrorBuilder::new(ErrorKind::TypeMismatch, input)
            .at(mismatch.at)
            .message(format!(
                "type mismatch: expected {} but found {}",
                mismatch.expected, mismatch.actual
            ))
            .expected(mismatch.expected.as_str())
            .actual(mismatch.actual.as_str())
            .stage("type constraint")
            .build();
    }

    let expected = if failure.expected.is_empty() {
        "expression".to_string()
    } else {
        failure.expected.join(" or ")
    };
    let builder = ErrorBuilder::new(ErrorKind::NoMatch, input)
        .at(failure.offset)
        .expected(expected)
        .actual(describe_at(input, failure.offset))
        .stage("expression");

    if failure.offset >= input.len() {
        builder.message("unexpected end of input").build()
    } else {
        builder
            .message(format!(
                "no rule matched at position {} near '{}'",
                SourcePosition::from_offset(input, failure.offset),
                preview(input, failure.offset)
            ))
            .build()
    }
}

fn abort_error(input: &str, abort: Abort) -> RichError {
    match abort {
        Abort::EmptyInput => ErrorBuilder::new(ErrorKind::EmptyInput, input)
            .message("empty input")
            .expected("expression")
            .build(),
        Abort::InputTooLarge { size, max } => ErrorBuilder::new(ErrorKind::InputTooLarge, input)
            .message(format!("input of {} bytes exceeds the limit of {} bytes", size, max))
            .build(),
        Abort::UnterminatedString(at) => ErrorBuilder::new(ErrorKind::UnterminatedString, input)
            .at(at)
            .message("unterminated string literal")
            .expected("closing quote")
            .actual("end of input")
            .stage("string literal")
            .build(),
        Abort::UnclosedParen(at) => ErrorBuilder::new(ErrorKind::UnclosedParen, input)
            .at(at)
            .message("unclosed parenthesis")
            .expected("')'")
            .stage("group")
            .build(),
        Abort::RecursionLimit { at, max } => ErrorBuilder::new(ErrorKind::RecursionLimit, input)
            .at(at)
            .message(format!("expression nesting exceeds the limit of {}", max))
            .build(),
    }
}

fn preview(input: &str, offset: usize) -> String {
    let rest = input.get(offset..).unwrap_or("");
    let line = rest.split('\n').next().unwrap_or("");
    line.chars().take(PREVIEW_CHARS).collect::<String>().trim_end().to_string()
}

// ============================================================================
// Parser
// ============================================================================

struct ParserInner {
    grammar: Grammar,
    order: Vec<Arc<NodeDefinition>>,
    nodes: Arc<NodeTable>,
    config: ParserConfig,
    warnings: Vec<GrammarWarning>,
}

/// A parser assembled from node definitions
///
/// Cloning is cheap; clones share the grammar.
#[derive(Clone)]
pub struct Parser {
    inner: Arc<ParserInner>,
}

impl Parser {
    /// Assemble a parser with the default configuration
    pub fn new(definitions: impl IntoIterator<Item = NodeDefinition>) -> Result<Self, GrammarError> {
        Self::with_config(definitions, ParserConfig::default())
    }

    /// Assemble a parser with a custom configuration
    ///
    /// # Errors
    /// Returns a [`GrammarError`] if the definitions are inconsistent: see
    /// [`GrammarAnalyzer::check`].
    pub fn with_config(
        definitions: impl IntoIterator<Item = NodeDefinition>,
        config: ParserConfig,
    ) -> Result<Self, GrammarError> {
        let order: Vec<Arc<NodeDefinition>> = definitions.into_iter().map(Arc::new).collect();

        let analyzer = GrammarAnalyzer::new(&order);
        analyzer.check()?;
        let grammar = compute_grammar(order.iter().cloned());
        let warnings = analyzer.analyze(&grammar);
        for warning in &warnings {
            log_warn!("{}", warning);
        }

        log_debug!(
            "assembled grammar: {} definitions over {} levels",
            order.len(),
            grammar.len()
        );

        let nodes: NodeTable = order
            .iter()
            .map(|def| (def.name.clone(), Arc::clone(def)))
            .collect();

        Ok(Self {
            inner: Arc::new(ParserInner {
                grammar,
                order,
                nodes: Arc::new(nodes),
                config,
                warnings,
            }),
        })
    }

    /// Parse the whole input and bind the tree for evaluation
    ///
    /// # Errors
    /// Returns a [`RichError`] describing the furthest failure.
    pub fn parse(&self, input: &str, context: &Context) -> Result<Evaluator, RichError> {
        let ast = self.parse_ast(input, context)?;
        Ok(Evaluator::new(ast, context.clone(), Arc::clone(&self.inner.nodes)))
    }

    /// Parse the whole input into a tree
    ///
    /// Trailing whitespace is allowed; anything else left over is an
    /// `unexpected_token` error.
    pub fn parse_ast(&self, input: &str, context: &Context) -> Result<AstNode, RichError> {
        self.attempt(input, context).into_full()
    }

    /// Parse the longest expression at the start of `input`
    ///
    /// Returns the tree and the unconsumed suffix of `input`.
    pub fn parse_partial<'i>(
        &self,
        input: &'i str,
        context: &Context,
    ) -> Result<(AstNode, &'i str), RichError> {
        self.attempt(input, context).into_prefix()
    }

    /// Like [`parse_partial`](Self::parse_partial), discarding the diagnostic
    pub fn parse_prefix<'i>(&self, input: &'i str, context: &Context) -> Option<(AstNode, &'i str)> {
        self.parse_partial(input, context).ok()
    }

    fn attempt<'i>(&self, input: &'i str, context: &Context) -> Attempt<'i> {
        let config = &self.inner.config;

        if config.max_input_size > 0 && input.len() > config.max_input_size {
            return Attempt {
                input,
                step: Err(Abort::InputTooLarge {
                    size: input.len(),
                    max: config.max_input_size,
                }),
                failure: Failure::default(),
            };
        }
        if input.trim().is_empty() {
            return Attempt {
                input,
                step: Err(Abort::EmptyInput),
                failure: Failure::default(),
            };
        }

        let mut session = Session::new(&self.inner, input, context);
        let step = session.parse_level(0, 0);
        if let Some(memo) = &session.memo {
            let (hits, misses, _) = memo.stats();
            log_debug!("parsed {} bytes: memo hits={} misses={}", input.len(), hits, misses);
        }

        Attempt {
            input,
            step,
            failure: session.failure,
        }
    }

    /// Definitions in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.inner.order.iter().map(|def| def.as_ref())
    }

    /// Look up a definition by name
    pub fn node(&self, name: &str) -> Option<&NodeDefinition> {
        self.inner.nodes.get(name).map(|def| def.as_ref())
    }

    /// The assembled grammar
    pub fn grammar(&self) -> &Grammar {
        &self.inner.grammar
    }

    /// Ambiguity warnings found while assembling the grammar
    pub fn warnings(&self) -> &[GrammarWarning] {
        &self.inner.warnings
    }

    /// The configuration
    pub fn config(&self) -> &ParserConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("levels", &self.inner.grammar.len())
            .field("nodes", &self.inner.order.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
