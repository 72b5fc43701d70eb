/*!
 * Translator implementations and the contract the pipeline talks to.
 *
 * This module contains:
 * - `Translator`: the async contract used by the orchestrator
 * - `blocking`: adapter running synchronous translators on a worker pool
 * - `openai`: OpenAI-compatible chat completions client (also used for LM Studio)
 * - `mock`: scripted translator used by tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// What a translator can do, resolved once when the pipeline is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatorCapabilities {
    /// Accepts a document context summary through `set_document_context`
    pub supports_context: bool,
    /// Calls are natively async; `false` means they run on a worker pool
    pub supports_async: bool,
    /// Suggested number of in-flight calls
    pub recommended_concurrency: Option<usize>,
    /// Suggested character budget per batch call
    pub batch_char_budget: Option<usize>,
    /// Largest number of texts per batch call
    pub max_batch_size: Option<usize>,
}

/// Common trait for all translators
///
/// `translate_batch` must return exactly one translation per input text, in
/// input order. Callers treat any other length as a failed batch.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate one text
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Translate several texts in one call
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: &str,
        batch_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError>;

    /// Provide a short summary of the document being translated
    fn set_document_context(&self, _summary: &str) {}

    /// Capability flags and sizing hints
    fn capabilities(&self) -> TranslatorCapabilities {
        TranslatorCapabilities {
            supports_async: true,
            ..Default::default()
        }
    }
}

pub mod blocking;
pub mod mock;
pub mod openai;
