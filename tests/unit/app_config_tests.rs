/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::str::FromStr;

use doctwin::app_config::{CacheConfig, Config, LogLevel, ProviderConfig, TranslationProvider};
use doctwin::translation::DispatchOrder;

use crate::common;

fn valid_config() -> Config {
    let mut config = Config::default();
    config.translation.set_api_key("sk-test");
    config
}

/// Test the default configuration values
#[test]
fn test_default_config_withNoInput_shouldUseDutchToAmericanEnglish() {
    let config = Config::default();

    assert_eq!(config.source_language, "NL");
    assert_eq!(config.target_language, "EN-US");
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.get_model(), "gpt-4o-mini");
    assert_eq!(config.translation.get_endpoint(), "https://api.openai.com/v1");
    assert!(config.protect_special_characters);
    assert!(config.cache.enabled);
    assert!(config.batching.group_by_location);
    assert_eq!(config.batching.dispatch_order, DispatchOrder::LargestFirst);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that both providers are available by default
#[test]
fn test_default_config_withNoInput_shouldListBothProviders() {
    let config = Config::default();

    let lmstudio = config
        .translation
        .get_provider_config(&TranslationProvider::LMStudio)
        .expect("lmstudio provider");
    assert_eq!(lmstudio.endpoint, "http://localhost:1234/v1");
    assert_eq!(lmstudio.concurrent_requests, Some(4));
    assert_eq!(lmstudio.timeout_secs, 120);
    assert!(config.translation.get_provider_config(&TranslationProvider::OpenAI).is_some());
}

/// Test validation of a complete configuration
#[test]
fn test_validate_withApiKey_shouldSucceed() {
    assert!(valid_config().validate().is_ok());
}

/// Test that OpenAI requires a key
#[test]
fn test_validate_withoutApiKey_shouldFail() {
    let config = Config::default();

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("API key"));
}

/// Test that LM Studio needs no key
#[test]
fn test_validate_withLmStudioWithoutKey_shouldSucceed() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::LMStudio;

    assert!(config.validate().is_ok());
}

/// Test language validation
#[test]
fn test_validate_withInvalidLanguage_shouldFail() {
    let mut config = valid_config();
    config.target_language = "xx".to_string();

    assert!(config.validate().is_err());
}

/// Test numeric limits validation
#[test]
fn test_validate_withZeroLimits_shouldFail() {
    let mut config = valid_config();
    config.batching.max_batch_size = Some(0);
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.cache.max_entries = 0;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.cache.expiry_days = 0;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.run_timeout_secs = Some(0);
    assert!(config.validate().is_err());
}

/// Test endpoint URL validation
#[test]
fn test_validate_withMalformedEndpoint_shouldFail() {
    let mut config = valid_config();
    if let Some(provider) = config.translation.get_active_provider_config_mut() {
        provider.endpoint = "not a url".to_string();
    }
    assert!(config.validate().is_err());

    if let Some(provider) = config.translation.get_active_provider_config_mut() {
        provider.endpoint = "ftp://example.org/v1".to_string();
    }
    assert!(config.validate().is_err());
}

/// Test that a missing file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.source_language, "NL");
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.target_language, config.target_language);
    Ok(())
}

/// Test a minimal file gets defaults for everything else
#[test]
fn test_load_or_create_withMinimalFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "source_language": "de",
            "target_language": "fr",
            "batching": { "max_batch_size": 12, "dispatch_order": "document" },
            "cache": { "enabled": false },
            "run_timeout_secs": 600
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.source_language, "de");
    assert_eq!(config.batching.max_batch_size, Some(12));
    assert_eq!(config.batching.dispatch_order, DispatchOrder::Document);
    assert!(config.batching.group_by_location);
    assert!(!config.cache.enabled);
    assert!(config.cache.persist);
    assert_eq!(config.run_timeout_secs, Some(600));
    assert_eq!(config.translation.common.retry_count, 3);
    Ok(())
}

/// Test that invalid JSON is reported
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ invalid")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// Test save and reload
#[test]
fn test_save_withModifiedConfig_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    let mut config = valid_config();
    config.target_language = "en-gb".to_string();
    config.translation.provider = TranslationProvider::LMStudio;

    config.save(&path)?;
    let reloaded = Config::load_or_create(&path)?;

    assert_eq!(reloaded.target_language, "en-gb");
    assert_eq!(reloaded.translation.provider, TranslationProvider::LMStudio);
    assert_eq!(reloaded.translation.get_endpoint(), "http://localhost:1234/v1");
    Ok(())
}

/// Test provider name parsing and display
#[test]
fn test_translation_provider_withNames_shouldParseAndDisplay() {
    assert_eq!(TranslationProvider::from_str("OpenAI").unwrap(), TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("lmstudio").unwrap(), TranslationProvider::LMStudio);
    assert!(TranslationProvider::from_str("ollama").is_err());
    assert_eq!(TranslationProvider::LMStudio.to_string(), "lmstudio");
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
}

/// Test provider defaults
#[test]
fn test_provider_config_new_withOpenAI_shouldUseHostedDefaults() {
    let provider = ProviderConfig::new(TranslationProvider::OpenAI);

    assert_eq!(provider.model, "gpt-4o-mini");
    assert_eq!(provider.timeout_secs, 60);
    assert!(provider.concurrent_requests.is_none());
    assert!(provider.api_key.is_empty());
}

/// Test cache path resolution
#[test]
fn test_cache_config_resolved_path_withExplicitPath_shouldUseIt() {
    let mut cache = CacheConfig::default();
    assert!(cache.resolved_path().ends_with(".doctwin/translation_cache.json"));

    cache.path = Some("/tmp/doctwin-cache.json".into());
    assert_eq!(cache.resolved_path(), std::path::PathBuf::from("/tmp/doctwin-cache.json"));
}
