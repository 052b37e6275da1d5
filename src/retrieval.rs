//! Semantic search over schedule documents.
//!
//! [`SemanticSearch`] is the seam for an external retrieval backend.
//! [`LexicalIndex`] is the built-in offline implementation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::describe::{describe_all, Document};
use crate::embedding::{cosine_similarity, LexicalEmbedder};
use crate::knowledge::KnowledgeGraph;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matching document.
    pub document: Document,
    /// Cosine similarity to the query, in `(0, 1]`.
    pub score: f32,
}

/// A searchable document collection.
pub trait SemanticSearch {
    /// Adds documents to the index, after any already indexed.
    fn index(&mut self, docs: Vec<Document>);

    /// Returns at most `limit` hits, best first.
    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit>;
}

/// In-process index using [`LexicalEmbedder`] vectors.
///
/// Only documents with positive similarity are returned. Equal scores keep
/// indexing order.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    embedder: LexicalEmbedder,
    entries: Vec<(Document, Vec<f32>)>,
}

impl LexicalIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(embedder: LexicalEmbedder) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    /// Builds an index over every document [`describe_all`] renders.
    #[must_use]
    pub fn from_graph(graph: &KnowledgeGraph) -> Self {
        let mut index = Self::default();
        index.index(describe_all(graph));
        index
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SemanticSearch for LexicalIndex {
    fn index(&mut self, docs: Vec<Document>) {
        let added = docs.len();
        self.entries.extend(docs.into_iter().map(|doc| {
            let vector = self.embedder.embed(&doc.text);
            (doc, vector)
        }));
        debug!(added, total = self.entries.len(), "documents indexed");
    }

    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        if limit == 0 {
            return Vec::new();
        }
        let query = self.embedder.embed(query);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, vector))| (i, cosine_similarity(&query, vector)))
            .filter(|&(_, score)| score > 0.0)
            .collect();

        // Stable sort keeps indexing order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                document: self.entries[i].0.clone(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::DocumentKind;

    fn doc(id: &str, text: &str) -> Document {
        Document {
            entity_id: id.to_string(),
            kind: DocumentKind::Surgery,
            text: text.to_string(),
        }
    }

    #[test]
    fn best_match_first() {
        let mut index = LexicalIndex::default();
        index.index(vec![
            doc("Hip_Replacement_Surgery", "Surgery: Hip_Replacement_Surgery Theatre: Ortho_Theatre"),
            doc("Brain_Surgery", "Surgery: Brain_Surgery Theatre: Neuro_Theatre"),
        ]);
        let hits = index.search("neuro brain", 5);
        assert_eq!(hits[0].document.entity_id, "Brain_Surgery");
    }

    #[test]
    fn ties_keep_indexing_order() {
        let mut index = LexicalIndex::default();
        index.index(vec![doc("first", "cardiac bypass"), doc("second", "cardiac bypass")]);
        let hits = index.search("cardiac bypass", 2);
        let ids: Vec<&str> = hits.iter().map(|h| h.document.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn limit_and_empty_query() {
        let mut index = LexicalIndex::default();
        index.index(vec![doc("a", "emergency"), doc("b", "emergency surgery")]);
        assert_eq!(index.search("emergency", 1).len(), 1);
        assert!(index.search("emergency", 0).is_empty());
        assert!(index.search("the of", 5).is_empty());
        assert_eq!(index.len(), 2);
    }
}
