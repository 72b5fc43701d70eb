use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::document::Document;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::Translator;
use crate::translation::core::build_translator;
use crate::translation::{
    CachedTranslator, DocumentTranslationService, TranslationCache, TranslationOptions, TranslationReport,
};

// @module: Application controller for document translation

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate `input_file` with the configured provider.
    ///
    /// The output defaults to `<stem>.<target>.<ext>` next to the input.
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>) -> Result<TranslationReport> {
        let translator = build_translator(&self.config.translation);
        self.run_with_translator(input_file, output_file, translator).await
    }

    /// Translate `input_file` with the given translator
    pub async fn run_with_translator(
        &self,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        translator: Arc<dyn Translator>,
    ) -> Result<TranslationReport> {
        // Start timing the process
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_file
            .unwrap_or_else(|| FileManager::generate_output_path(&input_file, &self.config.target_language));

        let mut document =
            Document::load(&input_file).with_context(|| format!("Failed to load document: {}", input_file.display()))?;
        debug!("Loaded {} nodes from {}", document.node_count(), input_file.display());

        let cache = self.open_cache();
        let translator: Arc<dyn Translator> = match &cache {
            Some(cache) => Arc::new(CachedTranslator::new(translator, cache.clone())),
            None => translator,
        };

        let service = DocumentTranslationService::new(translator, TranslationOptions::from_config(&self.config));

        info!(
            "doctwin: {} - {} ({} -> {})",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model(),
            language_utils::display_name(&self.config.source_language),
            language_utils::display_name(&self.config.target_language)
        );

        let report = self.translate_with_progress(&service, &mut document).await?;

        document
            .save(&output_path)
            .with_context(|| format!("Failed to save document: {}", output_path.display()))?;
        info!("Success: {}", output_path.display());

        if let Some(cache) = &cache {
            self.close_cache(cache);
        }

        Self::log_report(&report);
        info!("Translation completed in {}.", Self::format_duration(start_time.elapsed()));

        Ok(report)
    }

    async fn translate_with_progress(
        &self,
        service: &DocumentTranslationService,
        document: &mut Document,
    ) -> Result<TranslationReport> {
        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} paragraphs ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let on_progress = move |done: usize, total: usize| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        };

        match service.translate_document(document, Some(&on_progress)).await {
            Ok(report) => {
                progress_bar.finish_and_clear();
                Ok(report)
            }
            Err(e) => {
                progress_bar.abandon_with_message("Failed");
                Err(e).context("Translation failed, output not written")
            }
        }
    }

    /// Cache for this run, restored from its snapshot when persistence is on
    fn open_cache(&self) -> Option<TranslationCache> {
        let settings = &self.config.cache;
        if !settings.enabled {
            return None;
        }

        let cache = TranslationCache::with_limits(true, settings.max_entries, settings.expiry_days);
        if settings.persist {
            let path = settings.resolved_path();
            if let Err(e) = cache.restore(&path) {
                warn!("Could not load translation cache from {}: {}", path.display(), e);
            }
        }
        Some(cache)
    }

    fn close_cache(&self, cache: &TranslationCache) {
        let stats = cache.stats();
        info!(
            "Cache: {} hits, {} misses ({:.1}% hit rate), {} entries ({:.1}% full)",
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0,
            stats.entries,
            stats.utilization() * 100.0
        );

        if !self.config.cache.persist {
            return;
        }
        let removed = cache.evict();
        if removed > 0 {
            debug!("Evicted {} cache entries before saving", removed);
        }
        let path = self.config.cache.resolved_path();
        if let Err(e) = cache.snapshot(&path) {
            warn!("Could not save translation cache to {}: {}", path.display(), e);
        }
    }

    fn log_report(report: &TranslationReport) {
        let run = &report.run;
        info!(
            "Paragraphs: {} translated, {} blank skipped, {} kept source text, {} empty translations",
            run.twins_inserted, report.blank_units_skipped, run.fallbacks, run.empty_translations
        );
        info!(
            "Batches: {} ({} failed), {} batch calls, {} single calls",
            run.batches, run.failed_batches, run.batch_calls, run.single_calls
        );
        if run.skipped_properties > 0 {
            warn!("{} formatting properties could not be cloned", run.skipped_properties);
        }
        if !run.unresolved_hyperlinks.is_empty() {
            warn!(
                "{} hyperlinks were not carried into translated paragraphs",
                run.unresolved_hyperlinks.len()
            );
            for link in &run.unresolved_hyperlinks {
                debug!("  {} '{}' -> {}", link.paragraph, link.text, link.url);
            }
        }
        for warning in &report.traversal_warnings {
            debug!("Traversal: {}", warning);
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Output path used when none is given
    pub fn default_output_path(&self, input_file: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, &self.config.target_language)
    }
}
