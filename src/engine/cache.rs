//! Packrat memo table
//!
//! A level's result at a given offset depends only on the level and the
//! offset, so the parser caches it for the rest of the call. Successful
//! entries keep the node and the end offset; failures are cached too so a
//! dead end is explored once.
//!
//! Hard errors (unterminated strings, unclosed parentheses, limits) abort the
//! whole parse and are never stored.

use super::ast::AstNode;
use hashbrown::HashMap;
use std::sync::Arc;

/// A cached level result: the node and the offset after it, or a failure
pub type MemoEntry = Option<(Arc<AstNode>, usize)>;

/// Per-call memo keyed by `(level, offset)`
pub struct MemoTable {
    entries: HashMap<(usize, usize), MemoEntry, ahash::RandomState>,
    hits: u64,
    misses: u64,
}

impl MemoTable {
    /// Create a table sized for an input of `input_len` bytes over `levels` levels
    pub fn for_input(input_len: usize, levels: usize) -> Self {
        // Roughly one probe per token per level; tokens average a few bytes
        let estimated = (input_len / 4).saturating_mul(levels.min(8));
        Self::with_capacity(estimated.clamp(16, 65_536))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, ahash::RandomState::new()),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a cached result
    #[inline]
    pub fn get(&mut self, level: usize, offset: usize) -> Option<&MemoEntry> {
        match self.entries.get(&(level, offset)) {
            Some(entry) => {
                self.hits += 1;
                Some(entry)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a result
    #[inline]
    pub fn insert(&mut self, level: usize, offset: usize, entry: MemoEntry) {
        self.entries.insert((level, offset), entry);
    }

    /// Get cache statistics: hits, misses, hit rate
    pub fn stats(&self) -> (u64, u64, f64) {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        (self.hits, self.misses, hit_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::TypeTag;
    use crate::engine::value::Value;

    #[test]
    fn test_hits_and_misses() {
        let mut memo = MemoTable::for_input(100, 3);
        assert!(memo.get(0, 0).is_none());

        let node = Arc::new(AstNode::literal(
            "number",
            TypeTag::Number,
            0..1,
            "1",
            Value::number(1.0),
        ));
        memo.insert(0, 0, Some((node, 1)));
        memo.insert(1, 4, None);

        assert!(matches!(memo.get(0, 0), Some(Some((_, 1)))));
        assert!(matches!(memo.get(1, 4), Some(None)));
        assert!(memo.get(1, 5).is_none());

        let (hits, misses, rate) = memo.stats();
        assert_eq!((hits, misses), (2, 2));
        assert!((rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(memo.entries.len(), 2);
    }

    #[test]
    fn test_for_input_sizing() {
        let small = MemoTable::for_input(0, 1);
        assert!(small.entries.capacity() >= 16);
        assert_eq!(small.stats(), (0, 0, 0.0));

        let large = MemoTable::for_input(10 * 1024 * 1024, 40);
        assert!(large.entries.capacity() >= 65_536);
        assert!(large.entries.is_empty());
    }
}
