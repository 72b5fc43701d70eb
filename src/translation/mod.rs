/*!
 * Document translation pipeline.
 *
 * This module contains the core functionality for translating documents
 * paragraph by paragraph. It is split into several submodules:
 *
 * - `core`: Pipeline service tying the stages together
 * - `batch`: Batch planning under size and character limits
 * - `concurrency`: Execution profile from translator capabilities and overrides
 * - `orchestrator`: Concurrent execution with in-order application
 * - `reconstruction`: Mapping translated text onto runs and inserting twins
 * - `formatting`: Run, paragraph and list formatting clone
 * - `special_chars`: Placeholder protection for special whitespace
 * - `cache`: Content-addressed translation cache with persistence
 * - `cached_translator`: Translator wrapper consulting the cache
 * - `context`: Document summary for context-aware translators
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, BatchPlanner, DispatchOrder, TranslationTask};
pub use self::cache::TranslationCache;
pub use self::cached_translator::CachedTranslator;
pub use self::core::{DocumentTranslationService, TranslationOptions, TranslationReport};
pub use self::orchestrator::{AsyncOrchestrator, RunStats};

// Submodules
pub mod batch;
pub mod cache;
pub mod cached_translator;
pub mod concurrency;
pub mod context;
pub mod core;
pub mod formatting;
pub mod orchestrator;
pub mod reconstruction;
pub mod special_chars;
