//! Content-addressed memoization of evaluator subresults.
//!
//! Keys are canonical node stringifications, so the same subexpression
//! written with different whitespace or grouping shares one entry. The
//! cache lives as long as its index and never evicts; the key space is
//! bounded by the distinct subexpressions a session ever submits, and each
//! bitset is at most a few kilobytes.

use std::collections::HashMap;
use std::sync::Arc;

use super::eval::NodeResult;

#[derive(Default)]
pub struct NodeCache {
    entries: HashMap<String, Arc<NodeResult>>,
}

impl NodeCache {
    pub fn new() -> NodeCache {
        NodeCache::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<NodeResult>> {
        self.entries.get(key).map(Arc::clone)
    }

    pub fn insert(&mut self, key: String, result: Arc<NodeResult>) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Required when the index underneath changes, e.g.
    /// when the deferred printings payload attaches.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
