/*!
 * Document context summary for context-aware translators.
 *
 * The summary gives the model a hint of domain and style before any paragraph
 * is sent: the first line of each section header, a few sample paragraphs from
 * the start of the body and, when keywords match, a document type.
 */

use crate::document::{Document, HeaderFooterKind, Node};

/// Body paragraphs inspected for samples
const SAMPLE_WINDOW: usize = 10;

/// Samples collected; only the first `SAMPLES_SHOWN` are printed but all feed the type detection
const MAX_SAMPLES: usize = 5;
const SAMPLES_SHOWN: usize = 3;

/// Header lines printed
const HEADERS_SHOWN: usize = 3;

/// Paragraphs of this many characters or fewer are not samples
const MIN_SAMPLE_CHARS: usize = 10;

const FALLBACK_CONTEXT: &str = "General document";

/// Keyword groups checked in order; the first group with a match names the type
const DOCUMENT_TYPES: &[(&str, &[&str])] = &[
    ("Legal/regulatory document", &["artikel", "sectie", "paragraaf", "wet", "verordening"]),
    ("Report/analysis", &["rapport", "analyse", "onderzoek", "conclusie"]),
    ("Contract/agreement", &["contract", "overeenkomst", "partijen"]),
    ("Instructions/manual", &["instructie", "handleiding", "stap", "procedure"]),
];

/// Build a short summary of the document
pub fn extract_document_context(document: &Document) -> String {
    let samples = sample_paragraphs(document);
    let headers = header_lines(document);

    let mut parts = Vec::new();

    if !headers.is_empty() {
        let shown: Vec<&str> = headers.iter().take(HEADERS_SHOWN).map(String::as_str).collect();
        parts.push(format!("Document headers: {}", shown.join(" | ")));
    }

    if !samples.is_empty() {
        let shown: Vec<&str> = samples.iter().take(SAMPLES_SHOWN).map(String::as_str).collect();
        parts.push(format!("Sample content:\n{}", shown.join("\n")));
    }

    if let Some(kind) = detect_document_type(&samples.join(" ")) {
        parts.push(format!("Document type: {}", kind));
    }

    if parts.is_empty() {
        FALLBACK_CONTEXT.to_string()
    } else {
        parts.join("\n")
    }
}

fn sample_paragraphs(document: &Document) -> Vec<String> {
    document
        .child_paragraphs(document.body())
        .unwrap_or_default()
        .into_iter()
        .take(SAMPLE_WINDOW)
        .map(|p| p.text().trim().to_string())
        .filter(|text| text.chars().count() > MIN_SAMPLE_CHARS)
        .take(MAX_SAMPLES)
        .collect()
}

/// First non-empty line of every primary header that is not linked
fn header_lines(document: &Document) -> Vec<String> {
    document
        .sections()
        .iter()
        .filter_map(|section| section.slot(HeaderFooterKind::Header))
        .filter(|id| matches!(document.get(*id), Some(Node::HeaderFooter(part)) if !part.linked_to_previous))
        .filter_map(|id| {
            document
                .child_paragraphs(id)
                .ok()?
                .into_iter()
                .map(|p| p.text().trim().to_string())
                .find(|text| !text.is_empty())
        })
        .collect()
}

fn detect_document_type(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    DOCUMENT_TYPES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(kind, _)| *kind)
}
