/*!
 * Tests for special whitespace protection
 */

use doctwin::translation::special_chars::{detect_special_whitespace, normalize_whitespace, protect, restore};

/// Test that protected text carries placeholders only
#[test]
fn test_protect_withSpecialWhitespace_shouldUsePlaceholders() {
    let protected = protect("10\u{00A0}km\tvia\u{200B}weg");

    assert_eq!(protected, "10<NBSP>km<TAB>via<ZWSP>weg");
}

/// Test the round trip over every supported character
#[test]
fn test_restore_withProtectedText_shouldRoundTrip() {
    let original = "a\u{00A0}b\tc\u{2003}d\u{2002}e\u{200B}f\u{00AD}g";

    assert_eq!(restore(&protect(original)), original);
}

/// Test that plain text passes through unchanged
#[test]
fn test_protect_withPlainText_shouldReturnSameText() {
    assert_eq!(protect("Gewone tekst."), "Gewone tekst.");
    assert_eq!(restore("a < b > c"), "a < b > c");
}

/// Test restoring placeholders changed around by a translator
#[test]
fn test_restore_withTranslatedText_shouldRestoreEachPlaceholder() {
    assert_eq!(restore("TEN<NBSP>KM<TAB>END"), "TEN\u{00A0}KM\tEND");
}

/// Test the detection counts
#[test]
fn test_detect_special_whitespace_withMixedText_shouldCountByName() {
    let counts = detect_special_whitespace("a\u{00A0}b\u{00A0}c\td");

    assert_eq!(counts.get("NBSP"), Some(&2));
    assert_eq!(counts.get("TAB"), Some(&1));
    assert_eq!(counts.get("SHY"), None);
}

/// Test collapsing of ordinary spaces only
#[test]
fn test_normalize_whitespace_withRepeatedSpaces_shouldCollapseThem() {
    assert_eq!(normalize_whitespace("a   b\u{00A0}\u{00A0}c"), "a b\u{00A0}\u{00A0}c");
}
