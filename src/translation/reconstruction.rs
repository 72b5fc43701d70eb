/*!
 * Reconstruction of translated paragraphs.
 *
 * A translated paragraph (the "twin") is inserted right after its source.
 * The translation is distributed over runs proportionally to the length of
 * the source runs, so each slice keeps the formatting of the run it maps to.
 * The proportional split is a heuristic: word boundaries are not respected
 * and languages that reorder phrases can move emphasis onto other words.
 */

use log::{debug, info};
use serde::Serialize;

use crate::document::{Document, NodeId, Paragraph, Run, RunContent};
use crate::errors::DocumentError;
use crate::translation::formatting::{FormatCloner, ListStructure};

/// A slice of the translated text and the source run whose formatting it takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunChunk {
    /// Index of the source run, `None` when the paragraph has no runs
    pub source_run: Option<usize>,
    pub text: String,
}

/// A hyperlink of the source paragraph that the twin does not carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedHyperlink {
    pub paragraph: NodeId,
    pub url: String,
    pub text: String,
}

/// Result of inserting one twin paragraph
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub twin: NodeId,
    pub list_structure: ListStructure,
    pub unresolved_hyperlinks: Vec<UnresolvedHyperlink>,
    /// Number of formatting properties that could not be cloned
    pub skipped_properties: usize,
}

/// Proportional mapping of translated text onto source runs
pub struct RunSplitter;

impl RunSplitter {
    /// Split `translated` over runs with the given source texts.
    ///
    /// Lengths are counted in characters. Each non-empty source run of length
    /// `L` ending at cumulative `offset + L` (of `total`) claims the translated
    /// text up to `floor((offset + L) * len / total)`. Empty slices are dropped,
    /// and the chunks always concatenate back to `translated`.
    pub fn split(run_texts: &[&str], translated: &str) -> Vec<RunChunk> {
        let chars: Vec<char> = translated.chars().collect();
        let translated_len = chars.len();
        if translated_len == 0 {
            return Vec::new();
        }

        if run_texts.is_empty() {
            return vec![RunChunk {
                source_run: None,
                text: translated.to_string(),
            }];
        }

        let lengths: Vec<usize> = run_texts.iter().map(|t| t.chars().count()).collect();
        let total: usize = lengths.iter().sum();
        if total == 0 {
            return vec![RunChunk {
                source_run: Some(0),
                text: translated.to_string(),
            }];
        }

        let mut chunks: Vec<RunChunk> = Vec::new();
        let mut offset = 0usize;
        let mut consumed = 0usize;

        for (index, &len) in lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            offset += len;
            let limit = ((offset as u128 * translated_len as u128) / total as u128) as usize;
            if limit > consumed {
                chunks.push(RunChunk {
                    source_run: Some(index),
                    text: chars[consumed..limit].iter().collect(),
                });
                consumed = limit;
            }
        }

        if consumed < translated_len {
            let rest: String = chars[consumed..].iter().collect();
            match chunks.last_mut() {
                Some(last) => last.text.push_str(&rest),
                None => chunks.push(RunChunk {
                    source_run: Some(0),
                    text: rest,
                }),
            }
        }

        chunks
    }
}

/// Build the translated twin of `paragraph_id` and insert it right after it.
///
/// Paragraph formatting and list structure are cloned, each run takes the
/// formatting of the source run it maps to and is marked italic. An empty
/// translation inserts nothing.
pub fn build_translated_paragraph(
    document: &mut Document,
    paragraph_id: NodeId,
    translated: &str,
) -> Result<Option<Reconstruction>, DocumentError> {
    let source = document.paragraph(paragraph_id)?.clone();
    if translated.is_empty() {
        debug!("Empty translation for {}, no twin inserted", paragraph_id);
        return Ok(None);
    }

    let mut twin = Paragraph::default();
    let mut report = FormatCloner::clone_paragraph_formatting(&source, &mut twin);
    let list_structure = FormatCloner::clone_list_structure(&source, &mut twin);

    let run_texts: Vec<String> = source.runs.iter().map(Run::text).collect();
    let run_refs: Vec<&str> = run_texts.iter().map(String::as_str).collect();

    let mut twin_run_of: Vec<Option<usize>> = vec![None; source.runs.len()];
    for chunk in RunSplitter::split(&run_refs, translated) {
        let template = chunk
            .source_run
            .and_then(|i| source.runs.get(i))
            .cloned()
            .unwrap_or_default();
        let mut run = Run::new(chunk.text);
        report
            .skipped
            .extend(FormatCloner::clone_run_formatting(&template, &mut run).skipped);
        run.format.italic = Some(true);
        if let Some(slot) = chunk.source_run.and_then(|i| twin_run_of.get_mut(i)) {
            *slot = Some(twin.runs.len());
        }
        twin.runs.push(run);
    }
    carry_unmapped_markers(&source, &twin_run_of, &mut twin);

    let unresolved_hyperlinks = collect_hyperlinks(paragraph_id, &source);
    for link in &unresolved_hyperlinks {
        info!(
            "Hyperlink '{}' ({}) kept on the source paragraph only",
            link.text, link.url
        );
    }

    let twin_id = document.insert_paragraph_after(paragraph_id, twin)?;
    Ok(Some(Reconstruction {
        twin: twin_id,
        list_structure,
        unresolved_hyperlinks,
        skipped_properties: report.skipped.len(),
    }))
}

/// Move tab and break markers of source runs that received no slice of the
/// translation onto the twin run of the closest preceding mapped run, or to
/// the front of the first twin run when none precedes them.
fn carry_unmapped_markers(source: &Paragraph, twin_run_of: &[Option<usize>], twin: &mut Paragraph) {
    let Some(first_mapped) = twin_run_of.iter().flatten().next().copied() else {
        return;
    };
    let mut leading: Vec<RunContent> = Vec::new();
    let mut host: Option<usize> = None;

    for (run, mapped) in source.runs.iter().zip(twin_run_of) {
        if mapped.is_some() {
            host = *mapped;
            continue;
        }
        let markers = run
            .content
            .iter()
            .filter(|c| matches!(c, RunContent::Tab | RunContent::Break))
            .cloned();
        match host.and_then(|i| twin.runs.get_mut(i)) {
            Some(target) => target.content.extend(markers),
            None => leading.extend(markers),
        }
    }

    if !leading.is_empty() {
        if let Some(target) = twin.runs.get_mut(first_mapped) {
            target.content.splice(0..0, leading);
        }
    }
}

/// Hyperlinks of a paragraph: consecutive runs with the same target form one link
fn collect_hyperlinks(paragraph_id: NodeId, paragraph: &Paragraph) -> Vec<UnresolvedHyperlink> {
    let mut links: Vec<UnresolvedHyperlink> = Vec::new();
    let mut previous: Option<&str> = None;

    for run in &paragraph.runs {
        match run.hyperlink.as_deref() {
            Some(url) if previous == Some(url) => {
                if let Some(last) = links.last_mut() {
                    last.text.push_str(&run.text());
                }
            }
            Some(url) => links.push(UnresolvedHyperlink {
                paragraph: paragraph_id,
                url: url.to_string(),
                text: run.text(),
            }),
            None => {}
        }
        previous = run.hyperlink.as_deref();
    }

    links
}
