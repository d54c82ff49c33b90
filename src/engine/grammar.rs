//! Grammar assembly
//!
//! [`compute_grammar`] turns an unordered list of node definitions into an
//! ordered list of precedence levels. Level 0 binds loosest; the user `atom`
//! level comes after every numeric level; the built-in atoms (numbers,
//! strings, identifiers, keywords and parenthesised groups) always form the
//! final level.

use super::schema::{NodeDefinition, Precedence};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// Names of the built-in atoms, in try order
pub const BUILTIN_ATOMS: [&str; 7] = [
    "number",
    "string",
    "null",
    "boolean",
    "undefined",
    "identifier",
    "group",
];

/// One precedence level
#[derive(Debug, Clone)]
pub enum Level {
    /// User definitions sharing one precedence key, in registration order
    Rules {
        /// Shared precedence key
        key: Precedence,
        /// Definitions to try, in order
        nodes: Vec<Arc<NodeDefinition>>,
    },
    /// The built-in atom scanners
    Builtin,
}

impl Level {
    /// Definitions on this level (empty for the built-in level)
    pub fn nodes(&self) -> &[Arc<NodeDefinition>] {
        match self {
            Level::Rules { nodes, .. } => nodes,
            Level::Builtin => &[],
        }
    }

    /// Precedence key, if this is a user level
    pub fn key(&self) -> Option<Precedence> {
        match self {
            Level::Rules { key, .. } => Some(*key),
            Level::Builtin => None,
        }
    }

    /// Whether this is the built-in atom level
    pub fn is_builtin(&self) -> bool {
        matches!(self, Level::Builtin)
    }
}

/// An ordered, immutable grammar
#[derive(Debug, Clone)]
pub struct Grammar {
    levels: Vec<Level>,
}

impl Grammar {
    /// All levels, loosest first; the last is always [`Level::Builtin`]
    #[inline]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Level at `index`
    #[inline]
    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Number of levels, including the built-in level
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether there are no user levels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.len() <= 1
    }

    /// Index of the built-in atom level
    #[inline]
    pub fn builtin_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Find the level a definition was placed on
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.nodes().iter().any(|n| n.name == name))
    }

    /// Human-readable listing of levels and node names in try order
    ///
    /// ```rust
    /// use precedent::engine::grammar::compute_grammar;
    ///
    /// let grammar = compute_grammar(Vec::new());
    /// assert_eq!(
    ///     grammar.describe(),
    ///     "0 [builtin]: number, string, null, boolean, undefined, identifier, group\n"
    /// );
    /// ```
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (index, level) in self.levels.iter().enumerate() {
            match level {
                Level::Rules { key, nodes } => {
                    let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
                    let _ = writeln!(out, "{} [{}]: {}", index, key, names.join(", "));
                }
                Level::Builtin => {
                    let _ = writeln!(out, "{} [builtin]: {}", index, BUILTIN_ATOMS.join(", "));
                }
            }
        }
        out
    }
}

/// Group definitions into ordered precedence levels
///
/// Numeric keys are ascending, `atom` follows them, and the built-in level is
/// appended last. Definitions sharing a key keep their registration order.
pub fn compute_grammar(definitions: impl IntoIterator<Item = Arc<NodeDefinition>>) -> Grammar {
    let mut grouped: BTreeMap<Precedence, Vec<Arc<NodeDefinition>>> = BTreeMap::new();
    for def in definitions {
        grouped.entry(def.precedence).or_default().push(def);
    }

    let mut levels: Vec<Level> = grouped
        .into_iter()
        .map(|(key, nodes)| Level::Rules { key, nodes })
        .collect();
    levels.push(Level::Builtin);

    Grammar { levels }
}
