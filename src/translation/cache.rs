/*!
 * Translation caching functionality.
 *
 * This module provides a content-addressed cache for translations to avoid
 * redundant API calls across paragraphs and across runs.
 *
 * - Keys are the SHA-256 of the normalized source text (trimmed, lowercased),
 *   the language pair and, when given, the context string.
 * - When full, the entry with the fewest hits is evicted, ties broken by the
 *   oldest access time.
 * - Entries older than the expiry are dropped lazily on lookup and by `evict`.
 * - `snapshot` and `restore` persist entries as a single JSON document written
 *   atomically.
 *
 * All state sits behind one mutex, so lookups, inserts and evictions never
 * interleave.
 */

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::errors::CacheError;
use crate::file_utils::FileManager;

/// Default maximum number of entries
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default entry lifetime in days
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

/// Length of the source preview kept in each entry
const PREVIEW_CHARS: usize = 100;

/// One cached translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub translation: String,
    /// First characters of the source text, for inspection of snapshots
    pub source_preview: String,
    pub source_language: String,
    pub target_language: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub hit_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        now - self.created_at > expiry
    }
}

/// Cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub saves: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Entries at the time the stats were taken
    #[serde(default)]
    pub entries: usize,
    /// Capacity at the time the stats were taken
    #[serde(default)]
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Fraction of the capacity in use
    pub fn utilization(&self) -> f64 {
        if self.capacity > 0 {
            self.entries as f64 / self.capacity as f64
        } else {
            0.0
        }
    }
}

/// On-disk form of the cache
#[derive(Debug, Serialize, Deserialize)]
struct CacheSnapshot {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl CacheState {
    /// Remove the least valuable entry: fewest hits, then least recently used
    fn evict_one(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.hit_count, entry.last_accessed_at))
            .map(|(key, _)| key.clone());

        match victim {
            Some(key) => {
                self.entries.remove(&key);
                self.stats.evictions += 1;
                true
            }
            None => false,
        }
    }

    fn purge_expired(&mut self, now: DateTime<Utc>, expiry: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, expiry));
        let removed = before - self.entries.len();
        self.stats.expirations += removed as u64;
        removed
    }
}

/// Translation cache for storing and retrieving translations.
///
/// Clones share the same storage.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    state: Arc<Mutex<CacheState>>,
    enabled: bool,
    max_entries: usize,
    expiry: Duration,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TranslationCache {
    /// Create a new translation cache with default limits
    pub fn new(enabled: bool) -> Self {
        Self::with_limits(enabled, DEFAULT_MAX_ENTRIES, DEFAULT_EXPIRY_DAYS)
    }

    /// Create a cache holding at most `max_entries` entries for `expiry_days` days
    pub fn with_limits(enabled: bool, max_entries: usize, expiry_days: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            enabled,
            max_entries: max_entries.max(1),
            expiry: Duration::days(expiry_days.max(0)),
        }
    }

    /// Content-addressed key for a lookup
    pub fn cache_key(text: &str, source_language: &str, target_language: &str, context: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize(text).as_bytes());
        hasher.update(b"|");
        hasher.update(source_language.as_bytes());
        hasher.update(b"|");
        hasher.update(target_language.as_bytes());
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            hasher.update(b"|");
            hasher.update(context.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// Get a translation from the cache
    pub fn get(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
    ) -> Option<String> {
        self.get_at(text, source_language, target_language, context, Utc::now())
    }

    fn get_at(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = Self::cache_key(text, source_language, target_language, context);
        let mut state = self.state.lock();

        let expired = match state.entries.get(&key) {
            Some(entry) => entry.is_expired(now, self.expiry),
            None => {
                state.stats.misses += 1;
                debug!("Cache miss for '{}' ({} -> {})", truncate_text(text, 30), source_language, target_language);
                return None;
            }
        };

        if expired {
            state.entries.remove(&key);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            debug!("Cache entry expired for '{}'", truncate_text(text, 30));
            return None;
        }

        state.stats.hits += 1;
        let entry = state.entries.get_mut(&key)?;
        entry.hit_count += 1;
        entry.last_accessed_at = now;
        debug!("Cache hit for '{}' ({} -> {})", truncate_text(text, 30), source_language, target_language);
        Some(entry.translation.clone())
    }

    /// Store a translation in the cache. Blank translations are not stored.
    pub fn set(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
        translation: &str,
    ) {
        self.set_at(text, source_language, target_language, context, translation, Utc::now());
    }

    fn set_at(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        context: Option<&str>,
        translation: &str,
        now: DateTime<Utc>,
    ) {
        if !self.enabled || translation.trim().is_empty() {
            return;
        }

        let key = Self::cache_key(text, source_language, target_language, context);
        let mut state = self.state.lock();

        if !state.entries.contains_key(&key) {
            while state.entries.len() >= self.max_entries {
                if !state.evict_one() {
                    break;
                }
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                translation: translation.to_string(),
                source_preview: text.chars().take(PREVIEW_CHARS).collect(),
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
                created_at: now,
                last_accessed_at: now,
                hit_count: 0,
            },
        );
        state.stats.saves += 1;

        debug!("Cached translation for '{}' ({} -> {})", truncate_text(text, 30), source_language, target_language);
    }

    /// Drop expired entries, then trim to capacity. Returns the number removed.
    pub fn evict(&self) -> usize {
        self.evict_at(Utc::now())
    }

    fn evict_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.lock();
        let mut removed = state.purge_expired(now, self.expiry);
        while state.entries.len() > self.max_entries && state.evict_one() {
            removed += 1;
        }
        removed
    }

    /// Write all entries to `path` as one JSON document, atomically
    pub fn snapshot(&self, path: &Path) -> Result<(), CacheError> {
        let content = {
            let state = self.state.lock();
            let snapshot = CacheSnapshot {
                entries: state.entries.clone(),
                stats: self.stats_of(&state),
                saved_at: Utc::now(),
            };
            serde_json::to_vec_pretty(&snapshot)?
        };

        FileManager::write_atomic(path, &content)
            .map_err(|e| CacheError::Persist(format!("{}: {}", path.display(), e)))?;

        info!("Saved {} cache entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Load entries from a snapshot, skipping expired ones.
    ///
    /// A missing file is an empty cache. Returns the number of entries loaded.
    pub fn restore(&self, path: &Path) -> Result<usize, CacheError> {
        if !path.exists() {
            debug!("No cache snapshot at {}", path.display());
            return Ok(0);
        }

        let content = std::fs::read(path)?;
        let snapshot: CacheSnapshot = serde_json::from_slice(&content)?;
        let now = Utc::now();

        let mut state = self.state.lock();
        let mut loaded = 0usize;
        for (key, entry) in snapshot.entries {
            if entry.is_expired(now, self.expiry) {
                state.stats.expirations += 1;
                continue;
            }
            state.entries.insert(key, entry);
            loaded += 1;
        }
        while state.entries.len() > self.max_entries && state.evict_one() {
            loaded = loaded.saturating_sub(1);
        }

        info!(
            "Loaded {} cache entries from {} (saved {})",
            loaded,
            path.display(),
            snapshot.saved_at.format("%Y-%m-%d %H:%M:%S")
        );
        Ok(loaded)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        self.stats_of(&state)
    }

    fn stats_of(&self, state: &CacheState) -> CacheStats {
        CacheStats {
            entries: state.entries.len(),
            capacity: self.max_entries,
            ..state.stats.clone()
        }
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.stats = CacheStats::default();
        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the cache
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Case and surrounding whitespace do not change the key
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_length).collect();
        format!("{}...", truncated)
    }
}
