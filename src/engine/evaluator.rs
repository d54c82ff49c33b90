//! AST evaluation
//!
//! An [`Evaluator`] is what a successful [`Parser::parse`](super::parser::Parser::parse)
//! returns: the parsed tree bound to the node definitions that produced it
//! and to the context it was parsed against. Evaluating it against a data bag
//! first validates the data against that context, then walks the tree:
//!
//! - literals yield their decoded value
//! - identifiers are looked up in the data bag
//! - groups yield their inner value
//! - definition nodes evaluate every capture, then call the definition's
//!   `evaluate` function with the resulting [`Bindings`]
//!
//! Faults are returned as [`EvalError`]s; nothing is swallowed.

use super::ast::{AstNode, NodeKind};
use super::context::Context;
use super::error::RichError;
use super::schema::NodeDefinition;
use super::validator::{TypeTagValidator, ValidationErrors, Validator};
use super::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

static UNDEFINED: Value = Value::Undefined;

/// Runtime data for identifiers, by name
pub type DataBag = HashMap<String, Value>;

/// Node definitions by name
pub type NodeTable = HashMap<String, Arc<NodeDefinition>>;

// ============================================================================
// Errors
// ============================================================================

/// An evaluation fault
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The node's definition has no `evaluate` function
    NotEvaluable {
        /// Node name
        node: String,
    },
    /// An `evaluate` function asked for a capture that is not bound
    MissingBinding {
        /// Node name
        node: String,
        /// Requested binding
        name: String,
    },
    /// An identifier has no value in the data bag
    UnknownIdentifier {
        /// Identifier name
        name: String,
    },
    /// The data bag does not match the context
    Validation {
        /// One-line summary of every issue
        summary: String,
    },
    /// A binding had the wrong kind of value
    TypeError {
        /// Node name
        node: String,
        /// What went wrong
        message: String,
    },
    /// Failure raised by an `evaluate` function
    Custom(String),
    /// The input never parsed, so there was nothing to evaluate
    Parse(RichError),
}

impl EvalError {
    /// Build a custom error
    pub fn custom(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::NotEvaluable { node } => {
                write!(f, "node '{}' has no evaluate function", node)
            }
            EvalError::MissingBinding { node, name } => {
                write!(f, "node '{}' has no binding named '{}'", node, name)
            }
            EvalError::UnknownIdentifier { name } => write!(f, "unknown identifier '{}'", name),
            EvalError::Validation { summary } => write!(f, "data validation failed: {}", summary),
            EvalError::TypeError { node, message } => {
                write!(f, "type error in '{}': {}", node, message)
            }
            EvalError::Custom(message) => f.write_str(message),
            EvalError::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvalError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RichError> for EvalError {
    fn from(err: RichError) -> Self {
        EvalError::Parse(err)
    }
}

impl From<ValidationErrors> for EvalError {
    fn from(errors: ValidationErrors) -> Self {
        EvalError::Validation {
            summary: errors.summary(),
        }
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// Evaluated captures of one node, by capture name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    node: String,
    values: BTreeMap<String, Value>,
}

impl Bindings {
    /// Create empty bindings for `node`
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            values: BTreeMap::new(),
        }
    }

    /// Bind a value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Name of the node these bindings belong to
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Look up a binding that must exist
    pub fn value(&self, name: &str) -> Result<&Value, EvalError> {
        self.values.get(name).ok_or_else(|| EvalError::MissingBinding {
            node: self.node.clone(),
            name: name.to_string(),
        })
    }

    /// Look up a numeric binding
    pub fn number(&self, name: &str) -> Result<f64, EvalError> {
        let value = self.value(name)?;
        value.as_number().ok_or_else(|| self.kind_error(name, "number", value))
    }

    /// Look up a string binding
    pub fn string(&self, name: &str) -> Result<&str, EvalError> {
        let value = self.value(name)?;
        value.as_str().ok_or_else(|| self.kind_error(name, "string", value))
    }

    /// Look up a boolean binding
    pub fn boolean(&self, name: &str) -> Result<bool, EvalError> {
        let value = self.value(name)?;
        value.as_bool().ok_or_else(|| self.kind_error(name, "boolean", value))
    }

    /// Iterate over bindings in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn kind_error(&self, name: &str, expected: &str, value: &Value) -> EvalError {
        EvalError::TypeError {
            node: self.node.clone(),
            message: format!("'{}' must be {} (was {})", name, expected, value.type_name()),
        }
    }
}

/// What an `evaluate` function can see besides its bindings
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The caller's data
    pub data: &'a DataBag,
    /// The context the tree was parsed against
    pub schema: &'a Context,
    /// The node being evaluated
    pub node: &'a AstNode,
}

// ============================================================================
// Evaluator
// ============================================================================

/// A parsed expression ready for evaluation
#[derive(Clone)]
pub struct Evaluator {
    ast: Arc<AstNode>,
    schema: Context,
    nodes: Arc<NodeTable>,
    validator: Arc<dyn Validator>,
}

impl Evaluator {
    pub(crate) fn new(ast: AstNode, schema: Context, nodes: Arc<NodeTable>) -> Self {
        Self {
            ast: Arc::new(ast),
            schema,
            nodes,
            validator: Arc::new(TypeTagValidator),
        }
    }

    /// Replace the validator used to check data before evaluation
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// The parsed tree
    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    /// The context the tree was parsed against
    pub fn schema(&self) -> &Context {
        &self.schema
    }

    /// Take the parsed tree
    pub fn into_ast(self) -> AstNode {
        Arc::unwrap_or_clone(self.ast)
    }

    /// Validate `data` against the schema and evaluate the tree
    pub fn evaluate(&self, data: &DataBag) -> Result<Value, EvalError> {
        self.validate(data)?;
        log_debug!("evaluating '{}' ({} nodes)", self.ast.name, self.ast.node_count());
        self.walk(&self.ast, data)
    }

    /// Evaluate against a JSON object of identifier values
    pub fn evaluate_json(&self, data: &serde_json::Value) -> Result<Value, EvalError> {
        let serde_json::Value::Object(members) = data else {
            return Err(EvalError::Validation {
                summary: format!("data must be a JSON object (was {})", json_kind(data)),
            });
        };
        let bag: DataBag = members
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        self.evaluate(&bag)
    }

    fn validate(&self, data: &DataBag) -> Result<(), EvalError> {
        let mut errors = ValidationErrors::default();
        for (name, tag) in self.schema.iter() {
            let value = data.get(name).unwrap_or(&UNDEFINED);
            if let Err(issues) = self.validator.validate(name, tag, value) {
                errors.extend(issues);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    fn walk(&self, node: &AstNode, data: &DataBag) -> Result<Value, EvalError> {
        match &node.kind {
            NodeKind::Literal(lit) => Ok(lit.value.clone()),
            NodeKind::Identifier(name) => {
                data.get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UnknownIdentifier { name: name.clone() })
            }
            NodeKind::Group => match node.captures.first() {
                Some(inner) => self.walk(&inner.node, data),
                None => Ok(Value::Undefined),
            },
            NodeKind::Rule => {
                let evaluate = self
                    .nodes
                    .get(&node.name)
                    .and_then(|def| def.evaluate.as_ref())
                    .ok_or_else(|| EvalError::NotEvaluable {
                        node: node.name.clone(),
                    })?;

                let mut bindings = Bindings::new(node.name.as_str());
                for capture in &node.captures {
                    bindings.insert(capture.name.as_str(), self.walk(&capture.node, data)?);
                }

                let ctx = EvalContext {
                    data,
                    schema: &self.schema,
                    node,
                };
                evaluate(&bindings, &ctx)
            }
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("ast", &self.ast.to_sexpr())
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
