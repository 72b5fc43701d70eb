/*!
 * Cache-aware translator wrapper.
 *
 * `CachedTranslator` answers from the `TranslationCache` when it can and only
 * forwards misses to the wrapped translator. In batch calls the misses of a
 * batch are sent together, and the answers are spliced back into input order.
 */

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Translator, TranslatorCapabilities};
use crate::translation::cache::TranslationCache;

/// Translator that consults a cache before calling the wrapped translator
#[derive(Debug, Clone)]
pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    cache: TranslationCache,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, cache: TranslationCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
}

#[async_trait]
impl Translator for CachedTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError> {
        if let Some(hit) = self.cache.get(text, source_language, target_language, context) {
            return Ok(hit);
        }

        let translation = self
            .inner
            .translate(text, target_language, source_language, context)
            .await?;
        self.cache
            .set(text, source_language, target_language, context, &translation);
        Ok(translation)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        source_language: &str,
        batch_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let mut results: Vec<Option<String>> = texts
            .iter()
            .map(|text| self.cache.get(text, source_language, target_language, batch_context))
            .collect();

        let misses: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| i)
            .collect();

        if !misses.is_empty() {
            debug!("Batch of {}: {} cached, {} to translate", texts.len(), texts.len() - misses.len(), misses.len());

            let miss_texts: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            let translations = self
                .inner
                .translate_batch(&miss_texts, target_language, source_language, batch_context)
                .await?;

            if translations.len() != miss_texts.len() {
                return Err(ProviderError::LengthMismatch {
                    expected: miss_texts.len(),
                    actual: translations.len(),
                });
            }

            for (index, translation) in misses.into_iter().zip(translations) {
                self.cache
                    .set(&texts[index], source_language, target_language, batch_context, &translation);
                results[index] = Some(translation);
            }
        }

        Ok(results.into_iter().map(Option::unwrap_or_default).collect())
    }

    fn set_document_context(&self, summary: &str) {
        self.inner.set_document_context(summary);
    }

    fn capabilities(&self) -> TranslatorCapabilities {
        self.inner.capabilities()
    }
}
