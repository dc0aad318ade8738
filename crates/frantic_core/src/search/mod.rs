//! The query-execution subsystem: lexer, parser, indices, evaluator,
//! memoizing node cache, ordering, histograms, and the query editor.
//!
//! [`SearchEngine`] ties the pieces together: it owns the indices, the
//! node cache and the per-process session salt, and turns a query string
//! into the result shape the worker puts on the wire.

use rand::Rng;
use serde::Serialize;

use crate::cards::{CardColumns, PrintingColumns};

pub mod ast;
pub mod bitset;
pub mod cache;
pub mod editor;
pub mod eval;
pub mod histogram;
pub mod index;
pub mod lexer;
pub mod order;
pub mod parser;

#[cfg(test)]
mod tests;

pub use ast::{CompareOp, Query};
pub use cache::NodeCache;
pub use eval::{EvalOutcome, Evaluator, NodeError, NodeResult, UniqueMode};
pub use histogram::Histograms;
pub use index::{CardIndex, PrintingIndex};
pub use lexer::Span;
pub use parser::parse;

/// Per-subexpression breakdown node for the result wire format.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NodeError>,
    pub children: Vec<TreeNode>,
}

impl From<&NodeResult> for TreeNode {
    fn from(result: &NodeResult) -> TreeNode {
        TreeNode {
            label: result.label.clone(),
            count: result.match_count,
            error: result.error,
            children: result.children.iter().map(|c| TreeNode::from(c.as_ref())).collect(),
        }
    }
}

/// Everything a search produces, minus the request id the worker adds.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Ordered canonical face indices, one per matching card.
    pub indices: Vec<u32>,
    /// Ordered printing indices, present when the query imposed printing
    /// conditions (or asked for `unique:prints`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printing_indices: Option<Vec<u32>>,
    pub breakdown: TreeNode,
    pub histograms: Histograms,
    pub has_printing_conditions: bool,
    pub unique_prints: bool,
}

pub struct SearchEngine {
    cards: CardIndex,
    printings: Option<PrintingIndex>,
    cache: NodeCache,
    salt: u32,
}

impl SearchEngine {
    pub fn new(columns: CardColumns) -> SearchEngine {
        SearchEngine::with_salt(columns, rand::thread_rng().gen())
    }

    /// Fixed-salt constructor for reproducible orderings.
    pub fn with_salt(columns: CardColumns, salt: u32) -> SearchEngine {
        SearchEngine {
            cards: CardIndex::new(columns),
            printings: None,
            cache: NodeCache::new(),
            salt,
        }
    }

    pub fn cards(&self) -> &CardIndex {
        &self.cards
    }

    pub fn printings(&self) -> Option<&PrintingIndex> {
        self.printings.as_ref()
    }

    pub fn has_printings(&self) -> bool {
        self.printings.is_some()
    }

    pub fn salt(&self) -> u32 {
        self.salt
    }

    /// Attach the deferred printings payload. Cached results may have been
    /// computed without printing data, so the cache starts over.
    pub fn attach_printings(&mut self, columns: PrintingColumns) {
        self.printings = Some(PrintingIndex::new(columns, self.cards.face_count()));
        self.cache.clear();
    }

    pub fn search(&mut self, query: &str) -> SearchResult {
        let root = parser::parse(query);

        let mut evaluator =
            Evaluator::new(&self.cards, self.printings.as_ref(), &mut self.cache);
        let outcome = evaluator.evaluate(&root);

        let seed = order::fnv1a(query);
        let needles = order::prefix_needles(&root.bare_values());

        let mut indices = self.cards.deduplicate_matches(&outcome.root.faces);
        order::order_faces(&self.cards, &mut indices, &needles, self.salt, seed);

        let has_printing_conditions = outcome.root.in_printing_domain();
        let printing_indices = match (&outcome.root.printings, self.printings.as_ref()) {
            (Some(printing_set), Some(printing_index)) => {
                let mut rows = printing_set.to_indices();
                order::order_printings(
                    &self.cards,
                    printing_index,
                    &mut rows,
                    &needles,
                    self.salt,
                    seed,
                );
                Some(rows)
            }
            _ => None,
        };
        let unique_prints =
            outcome.unique == UniqueMode::Prints && printing_indices.is_some();

        let histograms = histogram::project(&self.cards, &indices);

        SearchResult {
            indices,
            printing_indices,
            breakdown: TreeNode::from(outcome.root.as_ref()),
            histograms,
            has_printing_conditions,
            unique_prints,
        }
    }

    /// Number of memoized subexpression results.
    pub fn cached_nodes(&self) -> usize {
        self.cache.len()
    }
}
