/*!
 * Adapter for synchronous translator clients.
 *
 * Blocking clients are run on tokio's blocking thread pool. A semaphore sized
 * to the configured worker count keeps at most that many calls running, so the
 * adapter behaves like a fixed-size worker pool from the orchestrator's view.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::errors::ProviderError;
use crate::providers::{Translator, TranslatorCapabilities};

/// A translator whose calls block the current thread
pub trait BlockingTranslator: Send + Sync + Debug + 'static {
    fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Defaults to translating each text in turn
    fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: &str,
        batch_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        texts
            .iter()
            .map(|t| self.translate(t, target_language, source_language, batch_context))
            .collect()
    }

    fn set_document_context(&self, _summary: &str) {}

    fn capabilities(&self) -> TranslatorCapabilities {
        TranslatorCapabilities::default()
    }
}

/// Exposes a `BlockingTranslator` through the async `Translator` contract
#[derive(Debug)]
pub struct BlockingTranslatorAdapter<T: BlockingTranslator> {
    inner: Arc<T>,
    workers: Arc<Semaphore>,
    worker_count: usize,
}

impl<T: BlockingTranslator> BlockingTranslatorAdapter<T> {
    /// Wrap `inner`, allowing at most `worker_count` concurrent calls
    pub fn new(inner: T, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            inner: Arc::new(inner),
            workers: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    async fn run<R, F>(&self, job: F) -> Result<R, ProviderError>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> Result<R, ProviderError> + Send + 'static,
    {
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|e| ProviderError::WorkerFailed(e.to_string()))?;
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || job(inner.as_ref()))
            .await
            .map_err(|e| ProviderError::WorkerFailed(e.to_string()))?
    }
}

#[async_trait]
impl<T: BlockingTranslator> Translator for BlockingTranslatorAdapter<T> {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError> {
        let text = text.to_string();
        let target = target_language.to_string();
        let source = source_language.to_string();
        let context = context.map(str::to_string);
        self.run(move |inner| inner.translate(&text, &target, &source, context.as_deref()))
            .await
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: &str,
        batch_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let texts = texts.to_vec();
        let target = target_language.to_string();
        let source = source_language.to_string();
        let context = batch_context.map(str::to_string);
        self.run(move |inner| inner.translate_batch(&texts, &target, &source, context.as_deref()))
            .await
    }

    fn set_document_context(&self, summary: &str) {
        self.inner.set_document_context(summary);
    }

    fn capabilities(&self) -> TranslatorCapabilities {
        let mut capabilities = self.inner.capabilities();
        capabilities.supports_async = false;
        if capabilities.recommended_concurrency.is_none() {
            capabilities.recommended_concurrency = Some(self.worker_count);
        }
        capabilities
    }
}
