//! Grammar checks and warnings
//!
//! Definitions are checked when a parser is constructed. Problems that would
//! make parsing ill-defined (duplicate names, left recursion, malformed type
//! descriptors) are hard [`GrammarError`]s. Problems that only make part of a
//! grammar unreachable are reported as [`GrammarWarning`]s:
//!
//! - Duplicate patterns (the later definition can never match)
//! - Prefix shadowing (an earlier, shorter pattern always wins)

use super::grammar::{Grammar, Level};
use super::schema::{ElementKind, NodeDefinition, ResultType, Role};
use super::types::TypeTagError;
use super::validator;
use hashbrown::HashSet;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Errors
// ============================================================================

/// A definition set that cannot be turned into a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Two definitions share a name
    DuplicateNode {
        /// The repeated name
        name: String,
    },
    /// A pattern uses a capture name twice
    DuplicateCapture {
        /// Definition name
        node: String,
        /// The repeated capture
        capture: String,
    },
    /// A pattern has no elements
    EmptyPattern {
        /// Definition name
        node: String,
    },
    /// A pattern re-enters its own or an outer level before consuming input
    LeftRecursion {
        /// Definition name
        node: String,
        /// Role of the leading expression slot
        role: Role,
    },
    /// A constant token is the empty string
    EmptyToken {
        /// Definition name
        node: String,
    },
    /// A string element accepts no quote characters
    EmptyQuoteSet {
        /// Definition name
        node: String,
    },
    /// A constraint or result type failed to parse
    InvalidType {
        /// Definition name
        node: String,
        /// The offending descriptor
        descriptor: String,
        /// Parse failure detail
        error: TypeTagError,
    },
    /// A union result names a capture the pattern does not have
    UnknownUnionCapture {
        /// Definition name
        node: String,
        /// The missing capture
        capture: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::DuplicateNode { name } => {
                write!(f, "duplicate node definition '{}'", name)
            }
            GrammarError::DuplicateCapture { node, capture } => {
                write!(f, "node '{}' captures '{}' more than once", node, capture)
            }
            GrammarError::EmptyPattern { node } => write!(f, "node '{}' has an empty pattern", node),
            GrammarError::LeftRecursion { node, role } => write!(
                f,
                "node '{}' is left-recursive: pattern starts with a {} expression",
                node,
                role.as_str()
            ),
            GrammarError::EmptyToken { node } => {
                write!(f, "node '{}' has an empty constant token", node)
            }
            GrammarError::EmptyQuoteSet { node } => {
                write!(f, "node '{}' has a string element with no quote characters", node)
            }
            GrammarError::InvalidType {
                node,
                descriptor,
                error,
            } => write!(
                f,
                "node '{}' has invalid type '{}': {}",
                node, descriptor, error
            ),
            GrammarError::UnknownUnionCapture { node, capture } => write!(
                f,
                "node '{}' result union names unknown capture '{}'",
                node, capture
            ),
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrammarError::InvalidType { error, .. } => Some(error),
            _ => None,
        }
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Kind of grammar warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Two definitions on one level have the same pattern
    ///
    /// The first registered always wins, so the later one is unreachable.
    DuplicatePattern,

    /// An earlier definition's pattern is a strict prefix of a later one
    ///
    /// Whenever the longer pattern could match, the shorter one has already
    /// matched first.
    PrefixShadow,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePattern => write!(f, "duplicate pattern"),
            Self::PrefixShadow => write!(f, "prefix shadow"),
        }
    }
}

/// A grammar warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Level index the warning applies to
    pub level: usize,
    /// The definition that is shadowed
    pub node: String,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for GrammarWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[level {}] {}: {}", self.level, self.kind, self.message)
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Validates definitions and inspects assembled grammars
pub struct GrammarAnalyzer<'a> {
    definitions: &'a [Arc<NodeDefinition>],
}

impl<'a> GrammarAnalyzer<'a> {
    /// Create an analyzer over a definition list
    pub fn new(definitions: &'a [Arc<NodeDefinition>]) -> Self {
        Self { definitions }
    }

    /// Check every definition, stopping at the first error
    pub fn check(&self) -> Result<(), GrammarError> {
        let mut names = HashSet::new();
        for def in self.definitions {
            if !names.insert(def.name.as_str()) {
                return Err(GrammarError::DuplicateNode {
                    name: def.name.clone(),
                });
            }
            check_definition(def)?;
        }
        Ok(())
    }

    /// Collect ambiguity warnings for an assembled grammar
    pub fn analyze(&self, grammar: &Grammar) -> Vec<GrammarWarning> {
        let mut warnings = Vec::new();
        for (index, level) in grammar.levels().iter().enumerate() {
            if let Level::Rules { nodes, .. } = level {
                detect_shadowing(index, nodes, &mut warnings);
            }
        }
        warnings
    }
}

fn check_definition(def: &NodeDefinition) -> Result<(), GrammarError> {
    let node = || def.name.clone();

    let Some(first) = def.pattern.first() else {
        return Err(GrammarError::EmptyPattern { node: node() });
    };
    if let ElementKind::Expr { role, .. } = &first.kind {
        if *role != Role::Lhs {
            return Err(GrammarError::LeftRecursion {
                node: node(),
                role: *role,
            });
        }
    }

    let mut captures = HashSet::new();
    for element in &def.pattern {
        if let Some(name) = &element.name {
            if !captures.insert(name.as_str()) {
                return Err(GrammarError::DuplicateCapture {
                    node: node(),
                    capture: name.clone(),
                });
            }
        }
        match &element.kind {
            ElementKind::Const(token) if token.is_empty() => {
                return Err(GrammarError::EmptyToken { node: node() });
            }
            ElementKind::String { quotes } if quotes.is_empty() => {
                return Err(GrammarError::EmptyQuoteSet { node: node() });
            }
            ElementKind::Expr {
                constraint: Some(descriptor),
                ..
            } => check_descriptor(def, descriptor)?,
            _ => {}
        }
    }

    match &def.result {
        ResultType::Static(descriptor) => check_descriptor(def, descriptor),
        ResultType::UnionOf(names) => {
            for name in names {
                if !captures.contains(name.as_str()) {
                    return Err(GrammarError::UnknownUnionCapture {
                        node: node(),
                        capture: name.clone(),
                    });
                }
            }
            Ok(())
        }
    }
}

fn check_descriptor(def: &NodeDefinition, descriptor: &str) -> Result<(), GrammarError> {
    validator::compile(descriptor)
        .map(drop)
        .map_err(|error| GrammarError::InvalidType {
            node: def.name.clone(),
            descriptor: descriptor.to_string(),
            error,
        })
}

fn detect_shadowing(
    level: usize,
    nodes: &[Arc<NodeDefinition>],
    warnings: &mut Vec<GrammarWarning>,
) {
    let shapes: Vec<Vec<&ElementKind>> = nodes
        .iter()
        .map(|n| n.pattern.iter().map(|e| &e.kind).collect())
        .collect();

    for (later, later_shape) in shapes.iter().enumerate() {
        for (earlier, earlier_shape) in shapes.iter().enumerate().take(later) {
            let earlier_name = &nodes[earlier].name;
            let later_name = &nodes[later].name;

            if earlier_shape == later_shape {
                warnings.push(GrammarWarning {
                    kind: WarningKind::DuplicatePattern,
                    level,
                    node: later_name.clone(),
                    message: format!(
                        "'{}' has the same pattern as '{}' and can never match",
                        later_name, earlier_name
                    ),
                });
                break;
            }
            if earlier_shape.len() < later_shape.len()
                && later_shape.starts_with(earlier_shape)
            {
                warnings.push(GrammarWarning {
                    kind: WarningKind::PrefixShadow,
                    level,
                    node: later_name.clone(),
                    message: format!(
                        "'{}' starts with the full pattern of earlier '{}'",
                        later_name, earlier_name
                    ),
                });
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar::compute_grammar;
    use crate::engine::schema::*;

    fn check(defs: Vec<NodeDefinition>) -> Result<(), GrammarError> {
        let defs: Vec<Arc<NodeDefinition>> = defs.into_iter().map(Arc::new).collect();
        GrammarAnalyzer::new(&defs).check()
    }

    fn binary(name: &str, op: &str) -> NodeDefinition {
        NodeDefinition::new(name, 1).pattern([lhs().named("left"), token(op), rhs().named("right")])
    }

    #[test]
    fn test_valid_definitions() {
        assert!(check(vec![binary("add", "+"), binary("mul", "*")]).is_ok());
    }

    #[test]
    fn test_duplicate_node() {
        let err = check(vec![binary("add", "+"), binary("add", "-")]).unwrap_err();
        assert_eq!(err, GrammarError::DuplicateNode { name: "add".into() });
    }

    #[test]
    fn test_left_recursion() {
        let def = NodeDefinition::new("bad", 0).pattern([rhs(), token("+"), lhs()]);
        assert!(matches!(
            check(vec![def]),
            Err(GrammarError::LeftRecursion { role: Role::Rhs, .. })
        ));

        let def = NodeDefinition::new("bad", 0).pattern([full()]);
        assert!(matches!(
            check(vec![def]),
            Err(GrammarError::LeftRecursion { role: Role::Full, .. })
        ));
    }

    #[test]
    fn test_structural_errors() {
        let empty = NodeDefinition::new("empty", 0);
        assert!(matches!(check(vec![empty]), Err(GrammarError::EmptyPattern { .. })));

        let dup = NodeDefinition::new("dup", 0).pattern([
            lhs().named("x"),
            token("+"),
            rhs().named("x"),
        ]);
        assert!(matches!(check(vec![dup]), Err(GrammarError::DuplicateCapture { .. })));

        let quotes = NodeDefinition::atom("s").pattern([string_with([])]);
        assert!(matches!(check(vec![quotes]), Err(GrammarError::EmptyQuoteSet { .. })));

        let tok = NodeDefinition::atom("t").pattern([token("")]);
        assert!(matches!(check(vec![tok]), Err(GrammarError::EmptyToken { .. })));
    }

    #[test]
    fn test_type_errors() {
        let def = NodeDefinition::new("add", 0)
            .pattern([lhs_typed("numbr"), token("+"), rhs()]);
        let err = check(vec![def]).unwrap_err();
        assert!(err.to_string().contains("invalid type 'numbr'"));
        assert!(std::error::Error::source(&err).is_some());

        let def = NodeDefinition::new("pick", 0)
            .pattern([lhs().named("a"), token("|"), rhs().named("b")])
            .union_of(["a", "c"]);
        assert_eq!(
            check(vec![def]),
            Err(GrammarError::UnknownUnionCapture {
                node: "pick".into(),
                capture: "c".into()
            })
        );
    }

    #[test]
    fn test_shadowing_warnings() {
        let defs: Vec<Arc<NodeDefinition>> = vec![
            binary("add", "+"),
            binary("plus", "+"),
            NodeDefinition::new("short", 1).pattern([lhs(), token("?")]),
            NodeDefinition::new("long", 1).pattern([lhs(), token("?"), rhs()]),
        ]
        .into_iter()
        .map(Arc::new)
        .collect();

        let grammar = compute_grammar(defs.clone());
        let warnings = GrammarAnalyzer::new(&defs).analyze(&grammar);

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::DuplicatePattern);
        assert_eq!(warnings[0].node, "plus");
        assert_eq!(warnings[1].kind, WarningKind::PrefixShadow);
        assert_eq!(warnings[1].node, "long");
    }

    #[test]
    fn test_longer_first_is_not_shadowed() {
        let defs: Vec<Arc<NodeDefinition>> = vec![
            NodeDefinition::new("long", 1).pattern([lhs(), token("?"), rhs()]),
            NodeDefinition::new("short", 1).pattern([lhs(), token("?")]),
        ]
        .into_iter()
        .map(Arc::new)
        .collect();

        let grammar = compute_grammar(defs.clone());
        assert!(GrammarAnalyzer::new(&defs).analyze(&grammar).is_empty());
    }
}
