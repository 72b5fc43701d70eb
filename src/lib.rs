/*!
 * # doctwin - structure-preserving document translation
 *
 * A Rust library for bilingual document translation: every translatable
 * paragraph is followed by a translated twin that keeps its formatting.
 *
 * ## Features
 *
 * - Deterministic traversal of body, tables (nested and merged) and
 *   header/footer parts, visiting shared parts once
 * - Run-level formatting clone with proportional mapping of translated text
 * - Size and character bounded batching, concurrent execution and strictly
 *   ordered insertion of twins
 * - Content-addressed translation cache with expiry and JSON snapshots
 * - OpenAI-compatible provider (OpenAI, LM Studio)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Arena document model and structural traversal
 * - `translation`: Translation pipeline:
 *   - `translation::core`: Pipeline service
 *   - `translation::batch`: Batch planning
 *   - `translation::orchestrator`: Concurrent execution and ordered application
 *   - `translation::reconstruction`: Twin paragraph construction
 *   - `translation::formatting`: Formatting clone
 *   - `translation::cache`: Caching mechanisms for translations
 * - `providers`: Translator contract and implementations
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{Document, NodeId, Paragraph, Run};
pub use errors::{AppError, CacheError, DocumentError, FormatError, ProviderError, TranslationError};
pub use language_utils::{display_name, get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::{Translator, TranslatorCapabilities};
pub use translation::{DocumentTranslationService, TranslationCache, TranslationReport};
