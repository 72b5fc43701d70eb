/*!
 * Structural traversal of a document into translatable units.
 *
 * The walk is depth-first in document order:
 * - body blocks first, descending into tables cell by cell (row-major)
 *   and into nested tables before moving to the next cell
 * - then, for every section, the six header/footer parts that are not
 *   linked to the previous section
 *
 * Merged cells are visited once, shared header/footer parts are walked once,
 * and the result is de-duplicated by paragraph handle keeping first-seen order.
 * Malformed structure never fails the walk: it is recorded as a warning and
 * the offending subtree is skipped.
 */

use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::model::{Document, HeaderFooterKind, Node, NodeId};

/// Where a paragraph lives in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Body,
    Header,
    HeaderFirstPage,
    HeaderEvenPage,
    Footer,
    FooterFirstPage,
    FooterEvenPage,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Body => "body",
            Location::Header => "header",
            Location::HeaderFirstPage => "header_first_page",
            Location::HeaderEvenPage => "header_even_page",
            Location::Footer => "footer",
            Location::FooterFirstPage => "footer_first_page",
            Location::FooterEvenPage => "footer_even_page",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HeaderFooterKind> for Location {
    fn from(kind: HeaderFooterKind) -> Self {
        match kind {
            HeaderFooterKind::Header => Location::Header,
            HeaderFooterKind::FirstPageHeader => Location::HeaderFirstPage,
            HeaderFooterKind::EvenPageHeader => Location::HeaderEvenPage,
            HeaderFooterKind::Footer => Location::Footer,
            HeaderFooterKind::FirstPageFooter => Location::FooterFirstPage,
            HeaderFooterKind::EvenPageFooter => Location::FooterEvenPage,
        }
    }
}

/// One paragraph to translate, with its position in the document.
///
/// `paragraph` is a handle into the document the unit was collected from;
/// units are meant to be consumed by a single translation run.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatableUnit {
    pub paragraph: NodeId,
    /// Paragraph text at traversal time
    pub text: String,
    pub location: Location,
    /// Section owning the header/footer part, `None` for the body
    pub section_index: Option<usize>,
    /// (row, column) of each enclosing table cell, outermost first
    pub table_path: Vec<(usize, usize)>,
}

impl TranslatableUnit {
    /// Identity of the unit within one traversal
    pub fn identity_key(&self) -> NodeId {
        self.paragraph
    }

    /// Empty or whitespace-only paragraphs are never sent for translation
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Table nesting depth
    pub fn depth(&self) -> usize {
        self.table_path.len()
    }

    /// Number of characters, as counted for batch budgets
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Output of a traversal pass
#[derive(Debug, Clone, Default)]
pub struct TraversalResult {
    pub units: Vec<TranslatableUnit>,
    pub warnings: Vec<String>,
}

/// Collects translatable units from a document
pub struct ContextCollector<'a> {
    document: &'a Document,
    seen_paragraphs: HashSet<NodeId>,
    visited: HashSet<NodeId>,
    active: HashSet<NodeId>,
    result: TraversalResult,
}

impl<'a> ContextCollector<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            seen_paragraphs: HashSet::new(),
            visited: HashSet::new(),
            active: HashSet::new(),
            result: TraversalResult::default(),
        }
    }

    /// Walk the whole document
    pub fn collect(document: &Document) -> TraversalResult {
        ContextCollector::new(document).run()
    }

    fn run(mut self) -> TraversalResult {
        let document = self.document;

        self.walk_container(document.body(), Location::Body, None, &[]);

        for (section_index, section) in document.sections().iter().enumerate() {
            for kind in HeaderFooterKind::ALL {
                let Some(part) = section.slot(kind) else {
                    continue;
                };
                match document.get(part) {
                    Some(Node::HeaderFooter(hf)) => {
                        if hf.linked_to_previous {
                            debug!("Skipping {:?} of section {}: linked to previous", kind, section_index);
                            continue;
                        }
                        self.walk_container(part, Location::from(kind), Some(section_index), &[]);
                    }
                    Some(other) => self.warn(format!(
                        "Section {} {:?} slot points at a {} ({})",
                        section_index,
                        kind,
                        other.kind_name(),
                        part
                    )),
                    None => self.warn(format!(
                        "Section {} {:?} slot points at missing node {}",
                        section_index, kind, part
                    )),
                }
            }
        }

        debug!(
            "Traversal collected {} paragraphs ({} warnings)",
            self.result.units.len(),
            self.result.warnings.len()
        );
        self.result
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.result.warnings.push(message);
    }

    fn walk_container(
        &mut self,
        container: NodeId,
        location: Location,
        section_index: Option<usize>,
        table_path: &[(usize, usize)],
    ) {
        let document = self.document;

        if self.active.contains(&container) {
            self.warn(format!("Container {} contains itself, skipping", container));
            return;
        }
        if !self.visited.insert(container) {
            return;
        }

        let children = match document.get(container) {
            Some(node) => match node.children() {
                Some(children) => children,
                None => {
                    self.warn(format!(
                        "Expected a container at {}, found a {}",
                        container,
                        node.kind_name()
                    ));
                    return;
                }
            },
            None => {
                self.warn(format!("Missing container {}", container));
                return;
            }
        };

        self.active.insert(container);
        for &child in children {
            match document.get(child) {
                Some(Node::Paragraph(paragraph)) => {
                    if self.seen_paragraphs.insert(child) {
                        self.result.units.push(TranslatableUnit {
                            paragraph: child,
                            text: paragraph.text(),
                            location,
                            section_index,
                            table_path: table_path.to_vec(),
                        });
                    }
                }
                Some(Node::Table(_)) => self.walk_table(child, location, section_index, table_path),
                Some(other) => self.warn(format!(
                    "Unexpected {} {} inside container {}",
                    other.kind_name(),
                    child,
                    container
                )),
                None => self.warn(format!("Container {} references missing node {}", container, child)),
            }
        }
        self.active.remove(&container);
    }

    fn walk_table(
        &mut self,
        table_id: NodeId,
        location: Location,
        section_index: Option<usize>,
        table_path: &[(usize, usize)],
    ) {
        let document = self.document;
        if !self.visited.insert(table_id) {
            return;
        }
        let Some(Node::Table(table)) = document.get(table_id) else {
            return;
        };

        for (row_index, row) in table.grid.iter().enumerate() {
            for (column_index, &cell) in row.iter().enumerate() {
                match document.get(cell) {
                    Some(Node::Cell(_)) => {
                        // A merged cell shows up at several coordinates; walk it at the first
                        if self.visited.contains(&cell) {
                            continue;
                        }
                        let mut path = table_path.to_vec();
                        path.push((row_index, column_index));
                        self.walk_container(cell, location, section_index, &path);
                    }
                    Some(other) => self.warn(format!(
                        "Table {} cell ({}, {}) is a {}",
                        table_id,
                        row_index,
                        column_index,
                        other.kind_name()
                    )),
                    None => self.warn(format!(
                        "Table {} cell ({}, {}) references missing node {}",
                        table_id, row_index, column_index, cell
                    )),
                }
            }
        }
    }
}
