/*!
 * Tests for language code utilities
 */

use doctwin::language_utils::{
    LanguageCodeType, display_name, get_language_name, language_codes_match, normalize_to_part2t,
    validate_language_code,
};

/// Test validation of the supported code forms
#[test]
fn test_validate_language_code_withKnownCodes_shouldReturnType() {
    assert!(matches!(validate_language_code("nl"), Ok(LanguageCodeType::Part1)));
    assert!(matches!(validate_language_code("EN-US"), Ok(LanguageCodeType::Part1)));
    assert!(matches!(validate_language_code("deu"), Ok(LanguageCodeType::Part2T)));
    assert!(matches!(validate_language_code("dut"), Ok(LanguageCodeType::Part2B)));
}

/// Test validation failures
#[test]
fn test_validate_language_code_withUnknownCodes_shouldFail() {
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("english").is_err());
}

/// Test normalization to three-letter codes
#[test]
fn test_normalize_to_part2t_withVariants_shouldReturnPart2T() {
    assert_eq!(normalize_to_part2t("NL").unwrap(), "nld");
    assert_eq!(normalize_to_part2t("en_GB").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert!(normalize_to_part2t("zz").is_err());
}

/// Test matching across code forms and regions
#[test]
fn test_language_codes_match_withSameLanguage_shouldMatch() {
    assert!(language_codes_match("nl", "dut"));
    assert!(language_codes_match("EN-US", "en-gb"));
    assert!(language_codes_match("de", "deu"));
    assert!(!language_codes_match("nl", "de"));
    assert!(!language_codes_match("xx", "xx"));
}

/// Test language names
#[test]
fn test_get_language_name_withCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert_eq!(get_language_name("nld").unwrap(), "Dutch");
    assert!(get_language_name("qq").is_err());
}

/// Test display names with regions
#[test]
fn test_display_name_withRegion_shouldUseRegionalName() {
    assert_eq!(display_name("pt-BR"), "Brazilian Portuguese");
    assert_eq!(display_name("EN-US"), "American English");
    assert_eq!(display_name("es"), "Spanish");
}
