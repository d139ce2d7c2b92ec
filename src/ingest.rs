//! Document loading for the CLI.
//!
//! Reads PDF or plain-text files from disk and feeds them into the
//! knowledge base, printing a short status line per file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::extract;
use crate::index::KnowledgeBase;

/// Read a document file as text. PDFs go through page-marker extraction;
/// anything else is read as UTF-8.
pub fn load_text(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let text = extract::extract_pdf_text(&bytes)
            .with_context(|| format!("Failed to extract text from {}", path.display()))?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }
}

/// Ingest a single file, returning its document id and chunk count.
pub fn ingest_file(kb: &KnowledgeBase, config: &Config, path: &Path) -> Result<(String, usize)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let text = load_text(path)?;
    let result = kb
        .add_document(&text, &filename, &config.chunking)
        .with_context(|| format!("Failed to add document {}", filename))?;
    Ok(result)
}

/// Ingest a batch of files with per-file status output.
pub fn ingest_files(kb: &KnowledgeBase, config: &Config, files: &[std::path::PathBuf]) -> Result<()> {
    for path in files {
        let (_, chunk_count) = ingest_file(kb, config, path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        println!("added {}: {} chunks", name, chunk_count);
    }
    Ok(())
}
