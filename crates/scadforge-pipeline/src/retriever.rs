use async_trait::async_trait;

use scadforge_types::Result;

// ---------------------------------------------------------------------------
// ContextRetriever
// ---------------------------------------------------------------------------

/// Supplies reference code snippets for a prompt. Implementations typically
/// sit in front of a vector store; the core only needs the formatted context
/// string back, or `None` when nothing relevant exists.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, prompt: &str, libraries: &[String]) -> Result<Option<String>>;
}

/// Retriever that never finds anything. The loop controller then falls back
/// to the context-free prompt template.
#[derive(Debug, Default)]
pub struct NullRetriever;

#[async_trait]
impl ContextRetriever for NullRetriever {
    async fn retrieve(&self, _prompt: &str, _libraries: &[String]) -> Result<Option<String>> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
