//! Core data models used throughout Tutor Harness.
//!
//! These types represent the documents, chunks, and search results that flow
//! through the ingestion and retrieval pipeline, plus the response shapes
//! returned by the answer composer.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata record for an ingested document.
///
/// Created once per successful ingestion and immutable afterwards. The
/// document body itself is not retained; only its chunks are.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Opaque unique identifier (UUID v4), generated at ingestion.
    pub id: String,
    /// Display label; not guaranteed unique.
    pub filename: String,
    /// Number of chunks produced from this document.
    pub chunk_count: usize,
    /// Character count of the extracted text.
    pub total_chars: usize,
    /// First 300 characters of the extracted text, `...` appended when truncated.
    pub preview: String,
    /// When the document was added to the knowledge base.
    pub ingested_at: DateTime<Utc>,
}

/// A sentence-aligned segment of a document's text, the atomic unit of retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `{document_id}_{ordinal_index}`, unique within the process.
    pub id: String,
    /// Owning document.
    pub document_id: String,
    /// Owning document's display name, denormalized for result labeling.
    pub filename: String,
    /// 0-based position within the document's chunk sequence.
    pub ordinal_index: usize,
    /// The segment's cleaned text.
    pub text: String,
    /// Lowercased form of `text`, cached at creation for matching.
    pub normalized_text: String,
    /// Character count of `text`.
    pub length: usize,
    /// Number of sentences in the segment.
    pub sentence_count: usize,
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub text: String,
    pub filename: String,
    /// Lexical overlap score in `(0.0, 1.0]`.
    pub score: f64,
    pub ordinal_index: usize,
    /// Query tokens found in the chunk, lexicographically ordered.
    pub matching_tokens: Vec<String>,
}

/// Snapshot of the knowledge base, documents in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub chunk_count: usize,
    pub documents: Vec<Document>,
}

/// Source attribution attached to a generated answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub filename: String,
    /// The retrieval score of the cited chunk.
    pub confidence: f64,
    /// Up to five of the chunk's matching tokens.
    pub matching_terms: Vec<String>,
}

/// A grounded answer with its citations.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Number of chunks inserted into the generation prompt.
    pub context_used: usize,
}

/// A generated practice quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResponse {
    pub quiz: String,
    /// Distinct filenames of the documents the quiz was built from.
    pub source_documents: Vec<String>,
    pub questions_generated: usize,
}
