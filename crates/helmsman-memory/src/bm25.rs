// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory BM25 lexical index over the memory corpus.
//!
//! Rebuilt from scratch on the first query after any corpus mutation
//! (the corpus is append-only and small enough that rebuilds beat
//! incremental maintenance). Standard Okapi BM25 with k1 = 1.2,
//! b = 0.75 and the non-negative idf formulation.

use std::collections::HashMap;

const K1: f64 = 1.2;
const B: f64 = 0.75;

/// Lowercase alphanumeric tokenization shared by indexing and queries.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Okapi BM25 index over a fixed snapshot of documents.
pub struct Bm25Index {
    /// Per-document term frequencies, indexed by insertion order.
    doc_terms: Vec<HashMap<String, u32>>,
    /// Per-document token counts.
    doc_lens: Vec<usize>,
    /// Number of documents containing each term.
    doc_freq: HashMap<String, u32>,
    /// Average document length.
    avgdl: f64,
}

impl Bm25Index {
    /// Build an index over the given document texts.
    pub fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut doc_terms = Vec::with_capacity(documents.len());
        let mut doc_lens = Vec::with_capacity(documents.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            doc_lens.push(tokens.len());

            let mut terms: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *terms.entry(token).or_insert(0) += 1;
            }
            for term in terms.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            doc_terms.push(terms);
        }

        let avgdl = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / doc_lens.len() as f64
        };

        Self {
            doc_terms,
            doc_lens,
            doc_freq,
            avgdl,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_terms.len()
    }

    /// True if no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.doc_terms.is_empty()
    }

    /// Rank documents against `query`, best first.
    ///
    /// Returns (document index, score) pairs for documents with a
    /// positive score, capped at `top_k`. Ties keep insertion order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(usize, f64)> {
        if self.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let n = self.doc_terms.len() as f64;
        let mut scored: Vec<(usize, f64)> = Vec::new();

        for (idx, terms) in self.doc_terms.iter().enumerate() {
            let dl = self.doc_lens[idx] as f64;
            let mut score = 0.0;

            for term in &query_terms {
                let Some(&tf) = terms.get(term) else {
                    continue;
                };
                let df = f64::from(*self.doc_freq.get(term).expect("term in doc_freq"));
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                let tf = f64::from(tf);
                let norm = K1 * (1.0 - B + B * dl / self.avgdl.max(1e-9));
                score += idf * (tf * (K1 + 1.0)) / (tf + norm);
            }

            if score > 0.0 {
                scored.push((idx, score));
            }
        }

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}
