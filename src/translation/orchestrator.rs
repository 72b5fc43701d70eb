/*!
 * Concurrent batch execution with in-order application.
 *
 * All batch futures run inside one `FuturesUnordered` polled by the
 * orchestrator, and a semaphore caps the translation calls in flight. Results
 * arrive in any order; they are parked in a pending map keyed by sequence
 * index and applied to the document strictly in sequence order, advancing a
 * low-water mark. The document is only touched from the orchestrator loop.
 *
 * Failure handling:
 * - a single-task batch whose call fails keeps the source text and counts as
 *   a failed batch
 * - a multi-task batch that fails, or returns the wrong number of
 *   translations, is retried task by task, each task keeping its source text
 *   when its own call fails
 */

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::document::{Document, NodeId};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::Translator;
use crate::translation::batch::{Batch, TranslationTask};
use crate::translation::cache::truncate_text;
use crate::translation::reconstruction::{UnresolvedHyperlink, build_translated_paragraph};
use crate::translation::special_chars;

/// Lifecycle of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Pending,
    Dispatched,
    Succeeded,
    /// The batch call failed; its tasks were translated one by one
    Failed,
}

/// Progress callback: (paragraphs applied, paragraphs total)
pub type ProgressCallback<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Statistics of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub paragraphs: usize,
    pub batches: usize,
    pub batch_calls: usize,
    pub single_calls: usize,
    pub failed_batches: usize,
    /// Tasks that kept their source text because translation failed
    pub fallbacks: usize,
    pub twins_inserted: usize,
    /// Tasks whose translation was empty, so no twin was inserted
    pub empty_translations: usize,
    pub skipped_properties: usize,
    pub unresolved_hyperlinks: Vec<UnresolvedHyperlink>,
    pub elapsed_ms: u64,
}

/// What a batch future hands back to the orchestrator loop
#[derive(Debug)]
struct BatchOutcome {
    batch_id: usize,
    state: BatchState,
    tasks: Vec<TranslationTask>,
    batch_calls: usize,
    single_calls: usize,
    fallbacks: usize,
}

/// Runs planned batches against a translator and applies the results
#[derive(Debug)]
pub struct AsyncOrchestrator {
    translator: Arc<dyn Translator>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    source_language: String,
    protect_special_characters: bool,
}

impl AsyncOrchestrator {
    pub fn new(translator: Arc<dyn Translator>, concurrency: usize, source_language: impl Into<String>) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            translator,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            source_language: source_language.into(),
            protect_special_characters: true,
        }
    }

    /// Swap special whitespace for placeholders around each call
    pub fn with_special_char_protection(mut self, enabled: bool) -> Self {
        self.protect_special_characters = enabled;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Translate all batches and insert a twin after each source paragraph.
    ///
    /// Twins are inserted in sequence order whatever order batches complete in.
    /// Only document errors abort the run.
    pub async fn execute(
        &self,
        batches: Vec<Batch>,
        document: &mut Document,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<RunStats, TranslationError> {
        let start = Instant::now();
        let mut stats = RunStats {
            batches: batches.len(),
            ..Default::default()
        };

        let mut apply_order: Vec<usize> = batches
            .iter()
            .flat_map(|b| b.tasks.iter().map(|t| t.sequence_index))
            .collect();
        apply_order.sort_unstable();
        stats.paragraphs = apply_order.len();
        let total = apply_order.len();

        info!(
            "Dispatching {} batches ({} paragraphs) with {} concurrent requests",
            batches.len(),
            total,
            self.concurrency
        );

        let mut states: HashMap<usize, BatchState> = batches.iter().map(|b| (b.id, BatchState::Pending)).collect();
        let mut in_flight = FuturesUnordered::new();
        for batch in batches {
            states.insert(batch.id, BatchState::Dispatched);
            in_flight.push(self.run_batch(batch));
        }

        let mut pending: BTreeMap<usize, (NodeId, String)> = BTreeMap::new();
        let mut next_index_to_apply = 0usize;

        while let Some(outcome) = in_flight.next().await {
            debug!(
                "Batch {} finished as {:?} ({} tasks)",
                outcome.batch_id,
                outcome.state,
                outcome.tasks.len()
            );
            states.insert(outcome.batch_id, outcome.state);
            stats.batch_calls += outcome.batch_calls;
            stats.single_calls += outcome.single_calls;
            stats.fallbacks += outcome.fallbacks;
            if outcome.state == BatchState::Failed {
                stats.failed_batches += 1;
            }

            for task in outcome.tasks {
                let translation = task.result().unwrap_or(task.text()).to_string();
                pending.insert(task.sequence_index, (task.unit.paragraph, translation));
            }

            while let Some(&sequence_index) = apply_order.get(next_index_to_apply) {
                let Some((paragraph, translation)) = pending.remove(&sequence_index) else {
                    break;
                };
                self.apply(document, paragraph, &translation, &mut stats)?;
                next_index_to_apply += 1;
                if let Some(progress) = progress {
                    progress(next_index_to_apply, total);
                }
            }
        }

        debug_assert!(states.values().all(|s| matches!(s, BatchState::Succeeded | BatchState::Failed)));
        debug_assert!(pending.is_empty());

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Applied {} translations ({} twins, {} fallbacks, {} failed batches) in {} ms",
            next_index_to_apply, stats.twins_inserted, stats.fallbacks, stats.failed_batches, stats.elapsed_ms
        );
        Ok(stats)
    }

    fn apply(
        &self,
        document: &mut Document,
        paragraph: NodeId,
        translation: &str,
        stats: &mut RunStats,
    ) -> Result<(), TranslationError> {
        match build_translated_paragraph(document, paragraph, translation)? {
            Some(reconstruction) => {
                stats.twins_inserted += 1;
                stats.skipped_properties += reconstruction.skipped_properties;
                stats.unresolved_hyperlinks.extend(reconstruction.unresolved_hyperlinks);
            }
            None => stats.empty_translations += 1,
        }
        Ok(())
    }

    async fn run_batch(&self, mut batch: Batch) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            batch_id: batch.id,
            state: BatchState::Succeeded,
            tasks: Vec::new(),
            batch_calls: 0,
            single_calls: 0,
            fallbacks: 0,
        };
        let target_language = batch.target_language().to_string();

        if batch.len() == 1 {
            self.translate_individually(&mut batch.tasks, &target_language, &mut outcome)
                .await;
            if outcome.fallbacks > 0 {
                outcome.state = BatchState::Failed;
            }
            outcome.tasks = batch.tasks;
            return outcome;
        }

        let texts: Vec<String> = batch.tasks.iter().map(|t| self.prepare(t.text())).collect();
        outcome.batch_calls += 1;
        let result = self.call_batch(&texts, &target_language).await;

        match result {
            Ok(translations) if translations.len() == texts.len() => {
                for (task, translation) in batch.tasks.iter_mut().zip(translations) {
                    task.set_result(self.finish(&translation));
                }
            }
            Ok(translations) => {
                let error = ProviderError::LengthMismatch {
                    expected: texts.len(),
                    actual: translations.len(),
                };
                warn!("Batch {} failed: {}, translating individually", batch.id, error);
                outcome.state = BatchState::Failed;
            }
            Err(error) => {
                warn!("Batch {} failed: {}, translating individually", batch.id, error);
                outcome.state = BatchState::Failed;
            }
        }

        if outcome.state == BatchState::Failed {
            self.translate_individually(&mut batch.tasks, &target_language, &mut outcome)
                .await;
        }

        outcome.tasks = batch.tasks;
        outcome
    }

    /// Translate each task on its own, keeping the source text on failure
    async fn translate_individually(
        &self,
        tasks: &mut [TranslationTask],
        target_language: &str,
        outcome: &mut BatchOutcome,
    ) {
        for task in tasks.iter_mut() {
            outcome.single_calls += 1;
            let text = self.prepare(task.text());
            let translation = match self.call_single(&text, target_language).await {
                Ok(translation) => self.finish(&translation),
                Err(error) => {
                    warn!(
                        "Translation of '{}' failed: {}, keeping source text",
                        truncate_text(task.text(), 40),
                        error
                    );
                    outcome.fallbacks += 1;
                    task.text().to_string()
                }
            };
            task.set_result(translation);
        }
    }

    async fn call_single(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProviderError::WorkerFailed(e.to_string()))?;
        self.translator
            .translate(text, target_language, &self.source_language, None)
            .await
    }

    async fn call_batch(&self, texts: &[String], target_language: &str) -> Result<Vec<String>, ProviderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProviderError::WorkerFailed(e.to_string()))?;
        self.translator
            .translate_batch(texts, target_language, &self.source_language, None)
            .await
    }

    fn prepare(&self, text: &str) -> String {
        if self.protect_special_characters {
            special_chars::protect(text)
        } else {
            text.to_string()
        }
    }

    fn finish(&self, translation: &str) -> String {
        if self.protect_special_characters {
            special_chars::restore(translation)
        } else {
            translation.to_string()
        }
    }
}
