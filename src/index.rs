//! In-memory knowledge base with lexical retrieval.
//!
//! [`KnowledgeBase`] owns the process-lifetime collections of documents and
//! chunks behind `std::sync::RwLock`s, so a single instance can be shared
//! across request handlers. Ingestion is all-or-nothing per document: the
//! full chunk batch is built before any lock is taken, and a failed
//! ingestion leaves the collections untouched.
//!
//! Scoring is lexical overlap only: the ratio of shared word tokens between
//! the query and a chunk, a fixed bonus when the whole query appears
//! verbatim, and a fixed bonus when more than one token matches.

use std::collections::BTreeSet;
use std::sync::{LazyLock, RwLock};

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::chunk;
use crate::config::ChunkingConfig;
use crate::error::EngineError;
use crate::models::{Chunk, Document, IndexStats, ScoredChunk};

/// Characters kept in a document's display preview.
const PREVIEW_CHARS: usize = 300;

/// Bonus when the full query string appears verbatim in a chunk.
const PHRASE_BONUS: f64 = 0.3;

/// Bonus when more than one query token matches.
const SEQUENCE_BONUS: f64 = 0.2;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

/// The shared in-memory index of all ingested documents.
pub struct KnowledgeBase {
    documents: RwLock<Vec<Document>>,
    chunks: RwLock<Vec<Chunk>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Chunk `text` and add it to the knowledge base under `filename`.
    ///
    /// Returns the generated document id and the number of chunks stored.
    /// Fails with [`EngineError::EmptyContent`] when the trimmed text is
    /// empty or chunking produces nothing; the collections are unchanged
    /// in that case.
    pub fn add_document(
        &self,
        text: &str,
        filename: &str,
        chunking: &ChunkingConfig,
    ) -> Result<(String, usize), EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyContent);
        }

        let records = chunk::chunk_text(text, chunking.chunk_size, chunking.overlap);
        if records.is_empty() {
            return Err(EngineError::EmptyContent);
        }

        let doc_id = Uuid::new_v4().to_string();
        let chunk_batch: Vec<Chunk> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| Chunk {
                id: format!("{}_{}", doc_id, i),
                document_id: doc_id.clone(),
                filename: filename.to_string(),
                ordinal_index: i,
                normalized_text: record.text.to_lowercase(),
                length: record.length,
                sentence_count: record.sentence_count,
                text: record.text,
            })
            .collect();

        let document = Document {
            id: doc_id.clone(),
            filename: filename.to_string(),
            chunk_count: chunk_batch.len(),
            total_chars: text.chars().count(),
            preview: make_preview(text),
            ingested_at: Utc::now(),
        };

        let chunk_count = chunk_batch.len();

        // Batch fully built; publish under both write locks.
        // Lock order is documents then chunks, everywhere.
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        let mut chunks = self.chunks.write().unwrap_or_else(|e| e.into_inner());
        documents.push(document);
        chunks.extend(chunk_batch);

        Ok((doc_id, chunk_count))
    }

    /// Score every chunk against `query` and return the top `max_results`.
    ///
    /// An empty or token-free query yields an empty list. Ties keep
    /// insertion order. Internal failures degrade to an empty list rather
    /// than propagating; search must never abort answer generation.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<ScoredChunk> {
        let query_lower = query.to_lowercase();
        let query_tokens = tokenize(&query_lower);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let chunks = match self.chunks.read() {
            Ok(guard) => guard,
            Err(_) => {
                eprintln!("warning: chunk store unavailable, returning no results");
                return Vec::new();
            }
        };

        let mut scored: Vec<ScoredChunk> = Vec::new();
        for chunk in chunks.iter() {
            let chunk_tokens = tokenize(&chunk.normalized_text);
            let common: Vec<String> = query_tokens
                .intersection(&chunk_tokens)
                .cloned()
                .collect();
            if common.is_empty() {
                continue;
            }

            let base = common.len() as f64 / query_tokens.len() as f64;
            let phrase = if chunk.normalized_text.contains(&query_lower) {
                PHRASE_BONUS
            } else {
                0.0
            };
            let sequence = if common.len() > 1 { SEQUENCE_BONUS } else { 0.0 };

            scored.push(ScoredChunk {
                text: chunk.text.clone(),
                filename: chunk.filename.clone(),
                score: (base + phrase + sequence).min(1.0),
                ordinal_index: chunk.ordinal_index,
                matching_tokens: common,
            });
        }

        // Stable sort: equal scores retain insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(max_results);
        scored
    }

    /// Snapshot of collection sizes and document metadata, insertion order.
    pub fn stats(&self) -> IndexStats {
        let (documents, chunk_count) = match (self.documents.read(), self.chunks.read()) {
            (Ok(docs), Ok(chunks)) => (docs.clone(), chunks.len()),
            _ => {
                eprintln!("warning: index unavailable, reporting empty stats");
                (Vec::new(), 0)
            }
        };
        IndexStats {
            document_count: documents.len(),
            chunk_count,
            documents,
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the set of word tokens from already-lowercased text.
fn tokenize(text: &str) -> BTreeSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn make_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
