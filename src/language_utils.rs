use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for language code handling
///
/// Codes are ISO 639-1 (2-letter) or ISO 639-2 (3-letter) codes, optionally
/// followed by a region subtag (`EN-US`, `pt_BR`). Matching and validation
/// look at the language part only; display names take the region into account.
/// Language code type
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Display names for regional variants
const REGIONAL_NAMES: &[(&str, &str)] = &[
    ("en-us", "American English"),
    ("en-gb", "British English"),
    ("pt-br", "Brazilian Portuguese"),
    ("pt-pt", "European Portuguese"),
    ("zh-cn", "Simplified Chinese"),
    ("zh-tw", "Traditional Chinese"),
    ("es-mx", "Mexican Spanish"),
    ("fr-ca", "Canadian French"),
];

/// Split `EN-US` / `en_us` into the lowercase language and region parts
fn split_region(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().to_lowercase().replace('_', "-");
    match normalized.split_once('-') {
        Some((language, region)) if !region.is_empty() => (language.to_string(), Some(region.to_string())),
        Some((language, _)) => (language.to_string(), None),
        None => (normalized, None),
    }
}

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES.iter().find(|(b, _)| *b == code).map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let (language, _) = split_region(code);

    match language.len() {
        2 if Language::from_639_1(&language).is_some() => return Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&language).is_some() => return Ok(LanguageCodeType::Part2T),
        3 if part2b_to_part2t(&language).is_some() => return Ok(LanguageCodeType::Part2B),
        _ => {}
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format, dropping any region
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let (language, _) = split_region(code);

    if language.len() == 2 {
        if let Some(lang) = Language::from_639_1(&language) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if language.len() == 3 {
        if Language::from_639_3(&language).is_some() {
            return Ok(language);
        }
        if let Some(part2t) = part2b_to_part2t(&language) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes name the same language, ignoring regions
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Name used in prompts: regional name, else language name, else the code itself
pub fn display_name(code: &str) -> String {
    let (language, region) = split_region(code);
    if let Some(region) = region {
        let key = format!("{}-{}", language, region);
        if let Some((_, name)) = REGIONAL_NAMES.iter().find(|(k, _)| *k == key) {
            return name.to_string();
        }
    }
    get_language_name(code).unwrap_or_else(|_| code.to_string())
}
