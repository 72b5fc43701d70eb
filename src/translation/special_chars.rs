/*!
 * Protection of whitespace-sensitive characters across a translation call.
 *
 * Language models tend to normalize non-breaking spaces, tabs and invisible
 * characters. Before sending, each such character is replaced by a textual
 * placeholder; after receiving, placeholders are turned back into characters.
 * `restore(protect(s)) == s` holds for any text that does not itself contain
 * a placeholder token.
 */

use std::collections::BTreeMap;

/// Character and placeholder pairs, in replacement order
const PLACEHOLDERS: &[(char, &str)] = &[
    ('\u{00A0}', "<NBSP>"),
    ('\t', "<TAB>"),
    ('\u{2003}', "<EMSP>"),
    ('\u{2002}', "<ENSP>"),
    ('\u{200B}', "<ZWSP>"),
    ('\u{00AD}', "<SHY>"),
];

/// Replace special whitespace with placeholders
pub fn protect(text: &str) -> String {
    if !text.chars().any(is_special) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match placeholder_for(c) {
            Some(token) => out.push_str(token),
            None => out.push(c),
        }
    }
    out
}

/// Turn placeholders back into the characters they stand for
pub fn restore(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    PLACEHOLDERS
        .iter()
        .fold(text.to_string(), |acc, (c, token)| acc.replace(token, &c.to_string()))
}

/// Count occurrences of each special character, keyed by placeholder name
pub fn detect_special_whitespace(text: &str) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for c in text.chars() {
        if let Some(token) = placeholder_for(c) {
            *counts.entry(token.trim_matches(|t: char| t == '<' || t == '>')).or_insert(0) += 1;
        }
    }
    counts
}

/// Collapse runs of ordinary spaces while leaving special whitespace intact
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !previous_space {
                out.push(c);
            }
            previous_space = true;
        } else {
            out.push(c);
            previous_space = false;
        }
    }
    out
}

fn is_special(c: char) -> bool {
    placeholder_for(c).is_some()
}

fn placeholder_for(c: char) -> Option<&'static str> {
    PLACEHOLDERS.iter().find(|(special, _)| *special == c).map(|(_, token)| *token)
}
