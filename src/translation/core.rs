/*!
 * Document translation service.
 *
 * `DocumentTranslationService` wires the pipeline together for one document:
 * document context, structural traversal, batch planning, concurrent execution
 * and in-order twin insertion. The translator's capabilities are read once,
 * when the service is built.
 */

use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::document::{ContextCollector, Document};
use crate::errors::TranslationError;
use crate::providers::openai::{OpenAI, OpenAITranslator};
use crate::providers::{Translator, TranslatorCapabilities};
use crate::translation::batch::{BatchPlanner, BatchStats, DispatchOrder, TranslationTask, order_for_dispatch};
use crate::translation::concurrency::{ExecutionProfile, ProfileOverrides};
use crate::translation::context::extract_document_context;
use crate::translation::orchestrator::{AsyncOrchestrator, ProgressCallback, RunStats};

/// Translation options for customizing the translation process
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    pub source_language: String,
    pub target_language: String,

    /// Limits overriding the translator's recommendations
    pub overrides: ProfileOverrides,

    /// Keep body, header and footer paragraphs in separate batches
    pub group_by_location: bool,

    pub dispatch_order: DispatchOrder,

    /// Swap special whitespace for placeholders around each call
    pub protect_special_characters: bool,

    /// Time budget for the whole document
    pub run_timeout: Option<Duration>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            source_language: "NL".to_string(),
            target_language: "EN-US".to_string(),
            overrides: ProfileOverrides::default(),
            group_by_location: true,
            dispatch_order: DispatchOrder::default(),
            protect_special_characters: true,
            run_timeout: None,
        }
    }
}

impl TranslationOptions {
    /// Options from the application configuration.
    ///
    /// Batching limits set in `batching` win over those of the active provider.
    pub fn from_config(config: &Config) -> Self {
        let provider = config.translation.get_active_provider_config();
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            overrides: ProfileOverrides {
                concurrency: provider.and_then(|p| p.concurrent_requests),
                max_chars_per_batch: config
                    .batching
                    .max_chars_per_batch
                    .or_else(|| provider.and_then(|p| p.max_chars_per_request)),
                max_batch_size: config
                    .batching
                    .max_batch_size
                    .or_else(|| provider.and_then(|p| p.max_batch_size)),
            },
            group_by_location: config.batching.group_by_location,
            dispatch_order: config.batching.dispatch_order,
            protect_special_characters: config.protect_special_characters,
            run_timeout: config.run_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Outcome of translating one document
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    /// Units found by the traversal, blank ones included
    pub units_found: usize,
    pub blank_units_skipped: usize,
    pub traversal_warnings: Vec<String>,
    pub batch_stats: BatchStats,
    pub run: RunStats,
    pub document_context: Option<String>,
}

/// Build the translator for the configured provider
pub fn build_translator(config: &TranslationConfig) -> Arc<dyn Translator> {
    let retry_count = config.common.retry_count;
    let retry_backoff_ms = config.common.retry_backoff_ms;
    let rate_limit = config.get_rate_limit();

    let api_key = match config.provider {
        ConfigTranslationProvider::OpenAI => config.get_api_key(),
        ConfigTranslationProvider::LMStudio => {
            // LM Studio often doesn't require an API key; use a default if empty
            let k = config.get_api_key();
            if k.is_empty() { "lm-studio".to_string() } else { k }
        }
    };

    let client = OpenAI::new_with_config(
        api_key,
        config.get_endpoint(),
        config.get_timeout_secs(),
        retry_count,
        retry_backoff_ms,
        rate_limit,
    );

    Arc::new(OpenAITranslator::new(client, config.get_model(), config.common.temperature))
}

/// Translates documents paragraph by paragraph, inserting twins
#[derive(Debug)]
pub struct DocumentTranslationService {
    translator: Arc<dyn Translator>,
    capabilities: TranslatorCapabilities,
    profile: ExecutionProfile,
    options: TranslationOptions,
}

impl DocumentTranslationService {
    /// Create a service around any translator
    pub fn new(translator: Arc<dyn Translator>, options: TranslationOptions) -> Self {
        let capabilities = translator.capabilities();
        let profile = ExecutionProfile::resolve(&capabilities, &options.overrides);
        debug!("Translator capabilities: {:?}, execution profile: {:?}", capabilities, profile);
        Self {
            translator,
            capabilities,
            profile,
            options,
        }
    }

    pub fn profile(&self) -> &ExecutionProfile {
        &self.profile
    }

    pub fn capabilities(&self) -> &TranslatorCapabilities {
        &self.capabilities
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Translate every translatable paragraph of `document` in place.
    ///
    /// On success each non-blank paragraph with a non-empty translation is
    /// followed by its translated twin. A timeout or document error leaves the
    /// document partially translated and must not be saved.
    pub async fn translate_document(
        &self,
        document: &mut Document,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<TranslationReport, TranslationError> {
        let document_context = if self.capabilities.supports_context {
            let summary = extract_document_context(document);
            debug!("Document context:\n{}", summary);
            self.translator.set_document_context(&summary);
            Some(summary)
        } else {
            None
        };

        let traversal = ContextCollector::collect(document);
        let units_found = traversal.units.len();

        let tasks: Vec<TranslationTask> = traversal
            .units
            .into_iter()
            .filter(|unit| !unit.is_blank())
            .enumerate()
            .map(|(index, unit)| TranslationTask::new(index, unit, &self.options.target_language))
            .collect();
        let blank_units_skipped = units_found - tasks.len();

        info!(
            "Found {} paragraphs to translate ({} blank skipped, {} warnings)",
            tasks.len(),
            blank_units_skipped,
            traversal.warnings.len()
        );

        let planner = BatchPlanner::new(self.profile.max_batch_size, self.profile.max_chars_per_batch)
            .with_grouping(self.options.group_by_location);
        let mut batches = planner.plan(tasks);
        let batch_stats = BatchStats::from_batches(&batches);
        debug!("Batch plan: {:?}", batch_stats);
        order_for_dispatch(&mut batches, self.options.dispatch_order);

        let orchestrator = AsyncOrchestrator::new(
            Arc::clone(&self.translator),
            self.profile.concurrency,
            &self.options.source_language,
        )
        .with_special_char_protection(self.options.protect_special_characters);

        let execution = orchestrator.execute(batches, document, progress);
        let run = match self.options.run_timeout {
            Some(limit) => tokio::time::timeout(limit, execution)
                .await
                .map_err(|_| TranslationError::Timeout(limit.as_secs()))??,
            None => execution.await?,
        };

        Ok(TranslationReport {
            units_found,
            blank_units_skipped,
            traversal_warnings: traversal.warnings,
            batch_stats,
            run,
            document_context,
        })
    }
}
