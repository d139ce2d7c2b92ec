//! Typed error kinds for the retrieval and answering core.
//!
//! Callers branch on variants rather than parsing message strings. Search
//! is deliberately absent here: an empty or unmatched query yields an empty
//! result list, never an error.

/// Failure of the external text-generation call.
#[derive(Debug)]
pub enum GenerationError {
    /// Network-level failure: connect error, timeout, or non-success status.
    Transport(String),
    /// The service answered but the payload was missing expected fields.
    MalformedResponse(String),
    /// Any other failure, including a disabled provider.
    Failed(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::Transport(e) => write!(f, "generation request failed: {}", e),
            GenerationError::MalformedResponse(e) => {
                write!(f, "unexpected generation response: {}", e)
            }
            GenerationError::Failed(e) => write!(f, "generation failed: {}", e),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Errors surfaced by ingestion and answer composition.
#[derive(Debug)]
pub enum EngineError {
    /// No extractable text, or chunking produced zero chunks.
    EmptyContent,
    /// Upstream document parsing failed.
    Extraction(String),
    /// The external generation call failed; the cause is preserved.
    Generation(GenerationError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::EmptyContent => write!(f, "no extractable text content"),
            EngineError::Extraction(e) => write!(f, "text extraction failed: {}", e),
            EngineError::Generation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Generation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GenerationError> for EngineError {
    fn from(e: GenerationError) -> Self {
        EngineError::Generation(e)
    }
}
