/*!
 * Tests for the translation cache
 */

use anyhow::Result;

use doctwin::errors::CacheError;
use doctwin::translation::cache::TranslationCache;

use crate::common;

/// Test that a stored translation is returned
#[test]
fn test_cache_get_withStoredTranslation_shouldHit() {
    let cache = TranslationCache::new(true);
    cache.set("Goedemorgen", "nl", "en", None, "Good morning");

    assert_eq!(cache.get("Goedemorgen", "nl", "en", None).as_deref(), Some("Good morning"));
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.saves, 1);
    assert_eq!(stats.entries, 1);
}

/// Test that a missing key is a miss
#[test]
fn test_cache_get_withMissingKey_shouldReturnNone() {
    let cache = TranslationCache::new(true);

    assert_eq!(cache.get("Onbekend", "nl", "en", None), None);
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.stats().hit_rate(), 0.0);
}

/// Test that the language pair and context are part of the key
#[test]
fn test_cache_get_withOtherLanguageOrContext_shouldMiss() {
    let cache = TranslationCache::new(true);
    cache.set("Hallo", "nl", "en", None, "Hello");

    assert!(cache.get("Hallo", "nl", "fr", None).is_none());
    assert!(cache.get("Hallo", "de", "en", None).is_none());
    assert!(cache.get("Hallo", "nl", "en", Some("legal")).is_none());
    assert!(cache.get("Hallo", "nl", "en", None).is_some());
}

/// Test key normalization of case and surrounding whitespace
#[test]
fn test_cache_key_withCaseAndWhitespace_shouldNormalize() {
    let a = TranslationCache::cache_key("  Hallo Wereld ", "nl", "en", None);
    let b = TranslationCache::cache_key("hallo wereld", "nl", "en", None);
    let c = TranslationCache::cache_key("hallo wereld", "nl", "en", Some("ctx"));

    assert_eq!(a, b);
    assert_ne!(b, c);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

/// Test that blank translations are never stored
#[test]
fn test_cache_set_withBlankTranslation_shouldNotStore() {
    let cache = TranslationCache::new(true);
    cache.set("Tekst", "nl", "en", None, "   ");

    assert!(cache.is_empty());
    assert_eq!(cache.stats().saves, 0);
}

/// Test that a disabled cache stores and returns nothing
#[test]
fn test_cache_withDisabledCache_shouldDoNothing() {
    let cache = TranslationCache::new(false);
    cache.set("Tekst", "nl", "en", None, "Text");

    assert!(!cache.is_enabled());
    assert!(cache.get("Tekst", "nl", "en", None).is_none());
    assert!(cache.is_empty());
}

/// Test that storing the same translation twice keeps one entry
#[test]
fn test_cache_set_withSameKeyTwice_shouldKeepOneEntry() {
    let cache = TranslationCache::new(true);
    cache.set("Tekst", "nl", "en", None, "Text");
    cache.set("Tekst", "nl", "en", None, "Text");

    assert_eq!(cache.len(), 1);
}

/// Test that capacity is never exceeded
#[test]
fn test_cache_set_withFullCache_shouldEvict() {
    let cache = TranslationCache::with_limits(true, 3, 30);
    for i in 0..5 {
        cache.set(&format!("tekst {}", i), "nl", "en", None, &format!("text {}", i));
    }

    let stats = cache.stats();
    assert_eq!(cache.len(), 3);
    assert_eq!(stats.evictions, 2);
    assert_eq!(stats.capacity, 3);
    assert!((stats.utilization() - 1.0).abs() < f64::EPSILON);
}

/// Test that clones share their storage
#[test]
fn test_cache_clone_withSharedState_shouldSeeSameEntries() {
    let cache = TranslationCache::new(true);
    let clone = cache.clone();
    clone.set("Tekst", "nl", "en", None, "Text");

    assert_eq!(cache.get("Tekst", "nl", "en", None).as_deref(), Some("Text"));
}

/// Test a snapshot round trip through a file
#[test]
fn test_cache_snapshot_withEntries_shouldRestoreIntoNewCache() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("cache.json");

    let cache = TranslationCache::new(true);
    cache.set("Hallo", "nl", "en", None, "Hello");
    cache.set("Dag", "nl", "en", Some("greeting"), "Bye");
    cache.snapshot(&path)?;

    let restored = TranslationCache::new(true);
    let loaded = restored.restore(&path)?;

    assert_eq!(loaded, 2);
    assert_eq!(restored.get("Hallo", "nl", "en", None).as_deref(), Some("Hello"));
    assert_eq!(restored.get("Dag", "nl", "en", Some("greeting")).as_deref(), Some("Bye"));
    Ok(())
}

/// Test that restoring twice does not duplicate entries
#[test]
fn test_cache_restore_withSameSnapshotTwice_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cache.json");

    let cache = TranslationCache::new(true);
    cache.set("Hallo", "nl", "en", None, "Hello");
    cache.snapshot(&path)?;

    let restored = TranslationCache::new(true);
    restored.restore(&path)?;
    restored.restore(&path)?;

    assert_eq!(restored.len(), 1);
    Ok(())
}

/// Test that a missing snapshot is an empty cache
#[test]
fn test_cache_restore_withMissingFile_shouldLoadNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let cache = TranslationCache::new(true);
    let loaded = cache.restore(&temp_dir.path().join("absent.json"))?;

    assert_eq!(loaded, 0);
    assert!(cache.is_empty());
    Ok(())
}

/// Test that a corrupt snapshot is reported
#[test]
fn test_cache_restore_withCorruptFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "cache.json", "{ not json")?;

    let cache = TranslationCache::new(true);
    let result = cache.restore(&path);

    assert!(matches!(result, Err(CacheError::Serialization(_))));
    assert!(cache.is_empty());
    Ok(())
}

/// Test that restoring respects the capacity of the new cache
#[test]
fn test_cache_restore_withSmallerCapacity_shouldTrim() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cache.json");

    let cache = TranslationCache::new(true);
    for i in 0..4 {
        cache.set(&format!("tekst {}", i), "nl", "en", None, &format!("text {}", i));
    }
    cache.snapshot(&path)?;

    let small = TranslationCache::with_limits(true, 2, 30);
    let loaded = small.restore(&path)?;

    assert_eq!(small.len(), 2);
    assert_eq!(loaded, 2);
    Ok(())
}

/// Test that clear empties entries and statistics
#[test]
fn test_cache_clear_withEntries_shouldReset() {
    let cache = TranslationCache::new(true);
    cache.set("Tekst", "nl", "en", None, "Text");
    cache.get("Tekst", "nl", "en", None);

    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 0);
}
