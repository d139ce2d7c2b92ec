//! Sentence-boundary text chunker.
//!
//! Splits cleaned document text into [`ChunkRecord`]s that respect a
//! configurable `chunk_size` character target. Splitting occurs only on
//! sentence boundaries (`.`, `!`, `?` followed by whitespace) so no sentence
//! is ever cut in half, and adjacent chunks overlap by carrying the last two
//! sentences of the previous chunk forward.
//!
//! The size target is soft: a single sentence longer than `chunk_size` is
//! emitted as its own oversized chunk.

use std::sync::LazyLock;

use regex::Regex;

/// Any run of whitespace.
static WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Everything outside word characters, whitespace, and common punctuation.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,;:!?()'"-]"#).unwrap());

/// Runs of plain spaces left behind by character stripping.
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());

/// A sentence terminator followed by the whitespace that separates sentences.
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// One emitted chunk: cleaned text plus sizing diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub text: String,
    /// Character count of `text`.
    pub length: usize,
    /// Number of sentences accumulated into `text`.
    pub sentence_count: usize,
}

/// Clean and normalize extracted text before chunking.
///
/// Collapses whitespace runs to single spaces, replaces characters outside
/// the word/whitespace/punctuation whitelist with spaces, collapses the
/// resulting space runs, and trims.
pub fn preprocess(text: &str) -> String {
    let collapsed = WS_RUN.replace_all(text, " ");
    let cleaned = DISALLOWED.replace_all(&collapsed, " ");
    let cleaned = SPACE_RUN.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

/// Split preprocessed text into sentences.
///
/// The terminator stays attached to the preceding sentence; the separating
/// whitespace is discarded. Empty segments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // The terminator is a single ASCII char at the start of the match.
        let end = boundary.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = boundary.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Divide raw text into overlapping, sentence-aligned chunks.
///
/// `overlap` is accepted for interface compatibility but is not consulted:
/// overlap is realized by carrying the last two sentences of a closed chunk
/// into the next one whenever the closed chunk held more than two.
///
/// Empty input (or input that preprocesses to nothing) yields an empty
/// sequence; callers requiring content must treat that as a failure.
pub fn chunk_text(text: &str, chunk_size: usize, _overlap: usize) -> Vec<ChunkRecord> {
    let processed = preprocess(text);
    if processed.is_empty() {
        return Vec::new();
    }

    let sentences = split_sentences(&processed);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut sentence_buffer: Vec<String> = Vec::new();

    for sentence in sentences {
        let projected = current.chars().count() + sentence.chars().count() + 1;

        if projected > chunk_size && !current.is_empty() {
            chunks.push(make_record(&current, sentence_buffer.len()));

            if sentence_buffer.len() > 2 {
                // Seed the new chunk with the last two sentences of the old one.
                let carried = sentence_buffer.split_off(sentence_buffer.len() - 2);
                current = format!("{} {}", carried.join(" "), sentence);
                sentence_buffer = carried;
                sentence_buffer.push(sentence);
            } else {
                current = sentence.clone();
                sentence_buffer = vec![sentence];
            }
        } else {
            if current.is_empty() {
                current = sentence.clone();
            } else {
                current.push(' ');
                current.push_str(&sentence);
            }
            sentence_buffer.push(sentence);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(make_record(&current, sentence_buffer.len()));
    }

    chunks
}

fn make_record(text: &str, sentence_count: usize) -> ChunkRecord {
    let trimmed = text.trim();
    ChunkRecord {
        text: trimmed.to_string(),
        length: trimmed.chars().count(),
        sentence_count,
    }
}
