/*!
 * Execution profile for a translation run.
 *
 * Combines what the translator reports about itself (`TranslatorCapabilities`)
 * with user overrides from the configuration into the three numbers the pipeline
 * needs: how many calls may be in flight, how many characters and how many
 * paragraphs go into one batch.
 */

use crate::providers::TranslatorCapabilities;

/// Concurrency used when the translator does not recommend one
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Character budget per batch used when the translator does not report one
pub const DEFAULT_CHARS_PER_BATCH: usize = 12_000;

/// Smallest batch size derived from concurrency
const MIN_DERIVED_BATCH_SIZE: usize = 10;

/// Batches per in-flight slot when deriving the batch size
const BATCH_SIZE_PER_SLOT: usize = 8;

/// User supplied limits, each one optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileOverrides {
    pub concurrency: Option<usize>,
    pub max_chars_per_batch: Option<usize>,
    pub max_batch_size: Option<usize>,
}

/// Resolved limits for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionProfile {
    /// Maximum translation calls in flight
    pub concurrency: usize,
    /// Character budget per batch
    pub max_chars_per_batch: usize,
    /// Maximum paragraphs per batch
    pub max_batch_size: usize,
}

impl Default for ExecutionProfile {
    fn default() -> Self {
        Self::from_capabilities(&TranslatorCapabilities::default())
    }
}

impl ExecutionProfile {
    /// Profile from translator capabilities alone
    pub fn from_capabilities(capabilities: &TranslatorCapabilities) -> Self {
        Self::resolve(capabilities, &ProfileOverrides::default())
    }

    /// Profile from translator capabilities with user overrides taking precedence
    pub fn resolve(capabilities: &TranslatorCapabilities, overrides: &ProfileOverrides) -> Self {
        let concurrency = effective_concurrent_requests(capabilities.recommended_concurrency, overrides.concurrency);

        let max_chars_per_batch = overrides
            .max_chars_per_batch
            .or(capabilities.batch_char_budget)
            .unwrap_or(DEFAULT_CHARS_PER_BATCH)
            .max(1);

        let max_batch_size = overrides
            .max_batch_size
            .or(capabilities.max_batch_size)
            .unwrap_or_else(|| MIN_DERIVED_BATCH_SIZE.max(concurrency * BATCH_SIZE_PER_SLOT))
            .max(1);

        Self {
            concurrency,
            max_chars_per_batch,
            max_batch_size,
        }
    }
}

/// Get effective concurrent requests, respecting any user override
pub fn effective_concurrent_requests(recommended: Option<usize>, user_override: Option<usize>) -> usize {
    user_override
        .or(recommended)
        .unwrap_or(DEFAULT_CONCURRENCY)
        .max(1)
}
