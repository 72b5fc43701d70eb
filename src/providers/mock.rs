/*!
 * Mock translator for tests and benchmarks.
 *
 * `MockTranslator` simulates different behaviors:
 * - `MockTranslator::uppercase()` - Always succeeds, translation is the uppercased text
 * - `MockTranslator::intermittent(n)` - Every n-th call fails
 * - `MockTranslator::failing()` - Every call fails
 * - `MockTranslator::failing_batches()` - Batch calls fail, single calls succeed
 * - `MockTranslator::short_batches()` - Batch calls return one translation too few
 * - `MockTranslator::random_delay(ms)` - Succeeds after a random delay
 *
 * Clones share their call counters.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Translator, TranslatorCapabilities};

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with the uppercased text
    Uppercase,
    /// Fails every Nth call, single or batch
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Batch calls fail, single calls succeed
    FailingBatches,
    /// Batch calls return one translation fewer than requested
    ShortBatches,
    /// Returns empty translations
    Empty,
    /// Succeeds after a fixed delay
    Slow { delay_ms: u64 },
    /// Succeeds after a random delay between 0 and `max_ms`
    RandomDelay { max_ms: u64 },
}

#[derive(Debug, Default)]
struct CallCounters {
    total: AtomicUsize,
    single: AtomicUsize,
    batch: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Scripted translator
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    counters: Arc<CallCounters>,
    capabilities: TranslatorCapabilities,
    document_context: Arc<Mutex<Option<String>>>,
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            counters: Arc::new(CallCounters::default()),
            capabilities: TranslatorCapabilities {
                supports_context: true,
                supports_async: true,
                ..Default::default()
            },
            document_context: Arc::new(Mutex::new(None)),
            custom_response: None,
        }
    }

    pub fn uppercase() -> Self {
        Self::new(MockBehavior::Uppercase)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn failing_batches() -> Self {
        Self::new(MockBehavior::FailingBatches)
    }

    pub fn short_batches() -> Self {
        Self::new(MockBehavior::ShortBatches)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn random_delay(max_ms: u64) -> Self {
        Self::new(MockBehavior::RandomDelay { max_ms })
    }

    /// Replace the capability flags reported to the pipeline
    pub fn with_capabilities(mut self, capabilities: TranslatorCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Use `generator(text, target_language)` instead of uppercasing
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Total number of calls, single and batch
    pub fn call_count(&self) -> usize {
        self.counters.total.load(Ordering::SeqCst)
    }

    pub fn single_call_count(&self) -> usize {
        self.counters.single.load(Ordering::SeqCst)
    }

    pub fn batch_call_count(&self) -> usize {
        self.counters.batch.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    /// Last summary passed to `set_document_context`
    pub fn document_context(&self) -> Option<String> {
        self.document_context.lock().clone()
    }

    fn render(&self, text: &str, target_language: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(text, target_language),
            None => text.to_uppercase(),
        }
    }

    /// Shared behavior of single and batch calls: delays and scripted failures
    async fn simulate_call(&self) -> Result<(), ProviderError> {
        let count = self.counters.total.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let result = match self.behavior {
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(())
            }
            MockBehavior::RandomDelay { max_ms } => {
                tokio::time::sleep(Duration::from_millis(random_delay_ms(max_ms))).await;
                Ok(())
            }
            MockBehavior::Intermittent { fail_every } if fail_every > 0 && count % fail_every == fail_every - 1 => {
                Err(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                    status_code: 503,
                })
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            _ => {
                // Yield so concurrent calls interleave like real requests
                tokio::task::yield_now().await;
                Ok(())
            }
        };

        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn random_delay_ms(max_ms: u64) -> u64 {
    rand::rng().random_range(0..=max_ms)
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        _source_language: &str,
        _context: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.counters.single.fetch_add(1, Ordering::SeqCst);
        self.simulate_call().await?;

        match self.behavior {
            MockBehavior::Empty => Ok(String::new()),
            _ => Ok(self.render(text, target_language)),
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
        _source_language: &str,
        _batch_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        self.counters.batch.fetch_add(1, Ordering::SeqCst);
        self.simulate_call().await?;

        match self.behavior {
            MockBehavior::FailingBatches => Err(ProviderError::ApiError {
                message: "Simulated batch failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::ShortBatches => Ok(texts
                .iter()
                .skip(1)
                .map(|t| self.render(t, target_language))
                .collect()),
            MockBehavior::Empty => Ok(vec![String::new(); texts.len()]),
            _ => Ok(texts.iter().map(|t| self.render(t, target_language)).collect()),
        }
    }

    fn set_document_context(&self, summary: &str) {
        *self.document_context.lock() = Some(summary.to_string());
    }

    fn capabilities(&self) -> TranslatorCapabilities {
        self.capabilities.clone()
    }
}
