/*!
 * Tests for error types
 */

use doctwin::errors::{AppError, CacheError, DocumentError, ProviderError, TranslationError};

/// Test provider error messages
#[test]
fn test_provider_error_display_withLengthMismatch_shouldShowCounts() {
    let error = ProviderError::LengthMismatch { expected: 5, actual: 4 };

    assert_eq!(error.to_string(), "Batch length mismatch: expected 5, got 4");
}

/// Test API error formatting
#[test]
fn test_provider_error_display_withApiError_shouldShowStatus() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "slow down".to_string(),
    };

    assert_eq!(error.to_string(), "API responded with error: 429 - slow down");
}

/// Test conversion chain into the application error
#[test]
fn test_app_error_from_withTranslationError_shouldWrap() {
    let translation: TranslationError = ProviderError::RequestFailed("offline".to_string()).into();
    let app: AppError = translation.into();

    assert!(matches!(app, AppError::Translation(TranslationError::Provider(_))));
    assert!(app.to_string().contains("offline"));
}

/// Test timeout message
#[test]
fn test_translation_error_display_withTimeout_shouldShowSeconds() {
    assert_eq!(
        TranslationError::Timeout(30).to_string(),
        "Translation timed out after 30 seconds"
    );
}

/// Test I/O conversions
#[test]
fn test_document_error_from_withIoError_shouldWrap() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: DocumentError = io.into();

    assert!(matches!(error, DocumentError::Io(_)));
    assert!(error.to_string().contains("gone"));
}

/// Test cache serialization conversion
#[test]
fn test_cache_error_from_withJsonError_shouldWrap() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: CacheError = json_error.into();

    assert!(matches!(error, CacheError::Serialization(_)));
}

/// Test that errors work with anyhow
#[test]
fn test_errors_withAnyhow_shouldConvert() {
    fn fails() -> anyhow::Result<()> {
        Err(DocumentError::Corrupt("bad grid".to_string()))?;
        Ok(())
    }

    let error = fails().unwrap_err();
    assert!(error.to_string().contains("bad grid"));
    assert!(error.downcast_ref::<DocumentError>().is_some());
}
