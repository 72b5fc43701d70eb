/*!
 * Arena document model for structured word-processing documents.
 *
 * Every node (paragraph, table, cell, header/footer part) lives in a single
 * arena owned by `Document` and is addressed by a `NodeId`. Handles are stable
 * for the lifetime of the document, so traversal can hand them out and the
 * reconstruction step can insert new paragraphs next to them later.
 *
 * Merged table cells are expressed by the grid storing the same `NodeId`
 * at several coordinates.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::DocumentError;
use crate::file_utils::FileManager;

/// Stable handle to a node of a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

/// How `ParagraphFormat::line_spacing` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacingRule {
    Single,
    OnePointFive,
    Double,
    AtLeast,
    Exactly,
    Multiple,
}

/// Character-level formatting of a run.
///
/// Boolean properties are tri-state: `None` means "inherit from the style",
/// which is different from an explicit `Some(false)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFormat {
    pub font_name: Option<String>,
    /// Font size in points
    pub font_size: Option<f32>,
    /// RGB color as six hex digits, e.g. `"1F3864"`
    pub color: Option<String>,
    pub highlight: Option<String>,
    /// Character spacing in twentieths of a point
    pub character_spacing: Option<i32>,
    /// Character style name
    pub style: Option<String>,

    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub all_caps: Option<bool>,
    pub small_caps: Option<bool>,
    pub strike: Option<bool>,
    pub double_strike: Option<bool>,
    pub outline: Option<bool>,
    pub shadow: Option<bool>,
    pub emboss: Option<bool>,
    pub imprint: Option<bool>,
    pub superscript: Option<bool>,
    pub subscript: Option<bool>,
}

/// Paragraph-level formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphFormat {
    pub alignment: Option<Alignment>,
    /// Indents in points
    pub left_indent: Option<f32>,
    pub right_indent: Option<f32>,
    pub first_line_indent: Option<f32>,
    /// Spacing in points
    pub space_before: Option<f32>,
    pub space_after: Option<f32>,
    pub line_spacing: Option<f32>,
    pub line_spacing_rule: Option<LineSpacingRule>,

    pub keep_together: Option<bool>,
    pub keep_with_next: Option<bool>,
    pub page_break_before: Option<bool>,
    pub widow_control: Option<bool>,

    /// Paragraph style name
    pub style: Option<String>,
}

/// Explicit list numbering of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    /// Numbering definition id
    pub num_id: u32,
    /// Indent level, 0-based
    pub level: u8,
}

/// Child content of a run. Tabs and breaks are markers, not characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RunContent {
    Text(String),
    Tab,
    Break,
}

/// A contiguous span of text sharing one character formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub format: RunFormat,
    #[serde(default)]
    pub content: Vec<RunContent>,
    /// Target of the enclosing hyperlink, if the run is part of one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

impl Run {
    /// Create an unformatted run holding `text`
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![RunContent::Text(text)]
        };
        Self {
            format: RunFormat::default(),
            content,
            hyperlink: None,
        }
    }

    /// Set the character formatting
    pub fn with_format(mut self, format: RunFormat) -> Self {
        self.format = format;
        self
    }

    /// Mark the run as part of a hyperlink
    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }

    /// Concatenated text content, markers excluded
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                RunContent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.content.push(RunContent::Text(text));
        }
    }

    pub fn push_tab(&mut self) {
        self.content.push(RunContent::Tab);
    }

    pub fn push_break(&mut self) {
        self.content.push(RunContent::Break);
    }

    pub fn tab_count(&self) -> usize {
        self.content.iter().filter(|c| matches!(c, RunContent::Tab)).count()
    }

    pub fn break_count(&self) -> usize {
        self.content.iter().filter(|c| matches!(c, RunContent::Break)).count()
    }
}

/// A paragraph: formatting, optional list numbering and a sequence of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub format: ParagraphFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingRef>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Create a paragraph with one unformatted run per text slice
    pub fn from_runs<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format: ParagraphFormat::default(),
            numbering: None,
            runs: texts.into_iter().map(Run::new).collect(),
        }
    }

    /// Create a paragraph holding a single unformatted run
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::from_runs([text.into()])
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// A table: a grid of cell handles. Merged cells share one handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub grid: Vec<Vec<NodeId>>,
}

impl Table {
    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    /// Width of the widest row
    pub fn columns(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<NodeId> {
        self.grid.get(row).and_then(|r| r.get(column)).copied()
    }
}

/// A block container: the body or a table cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// A header or footer part of a section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderFooter {
    /// When set, the part reuses the previous section's content
    #[serde(default)]
    pub linked_to_previous: bool,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// Any node stored in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Body(Container),
    Paragraph(Paragraph),
    Table(Table),
    Cell(Container),
    HeaderFooter(HeaderFooter),
}

impl Node {
    /// Human readable node kind, used in errors and warnings
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Body(_) => "body",
            Node::Paragraph(_) => "paragraph",
            Node::Table(_) => "table",
            Node::Cell(_) => "cell",
            Node::HeaderFooter(_) => "header/footer",
        }
    }

    /// Children of block containers
    pub fn children(&self) -> Option<&[NodeId]> {
        match self {
            Node::Body(c) | Node::Cell(c) => Some(&c.children),
            Node::HeaderFooter(h) => Some(&h.children),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Node::Body(c) | Node::Cell(c) => Some(&mut c.children),
            Node::HeaderFooter(h) => Some(&mut h.children),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<NodeId>,
    node: Node,
}

/// The six header/footer slots of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFooterKind {
    Header,
    FirstPageHeader,
    EvenPageHeader,
    Footer,
    FirstPageFooter,
    EvenPageFooter,
}

impl HeaderFooterKind {
    /// All slots in the order they are walked
    pub const ALL: [HeaderFooterKind; 6] = [
        HeaderFooterKind::Header,
        HeaderFooterKind::FirstPageHeader,
        HeaderFooterKind::EvenPageHeader,
        HeaderFooterKind::Footer,
        HeaderFooterKind::FirstPageFooter,
        HeaderFooterKind::EvenPageFooter,
    ];

    pub fn is_header(self) -> bool {
        matches!(
            self,
            HeaderFooterKind::Header | HeaderFooterKind::FirstPageHeader | HeaderFooterKind::EvenPageHeader
        )
    }
}

/// A document section with its header/footer slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub header: Option<NodeId>,
    pub first_page_header: Option<NodeId>,
    pub even_page_header: Option<NodeId>,
    pub footer: Option<NodeId>,
    pub first_page_footer: Option<NodeId>,
    pub even_page_footer: Option<NodeId>,
}

impl Section {
    pub fn slot(&self, kind: HeaderFooterKind) -> Option<NodeId> {
        match kind {
            HeaderFooterKind::Header => self.header,
            HeaderFooterKind::FirstPageHeader => self.first_page_header,
            HeaderFooterKind::EvenPageHeader => self.even_page_header,
            HeaderFooterKind::Footer => self.footer,
            HeaderFooterKind::FirstPageFooter => self.first_page_footer,
            HeaderFooterKind::EvenPageFooter => self.even_page_footer,
        }
    }

    pub fn set_slot(&mut self, kind: HeaderFooterKind, part: Option<NodeId>) {
        let slot = match kind {
            HeaderFooterKind::Header => &mut self.header,
            HeaderFooterKind::FirstPageHeader => &mut self.first_page_header,
            HeaderFooterKind::EvenPageHeader => &mut self.even_page_header,
            HeaderFooterKind::Footer => &mut self.footer,
            HeaderFooterKind::FirstPageFooter => &mut self.first_page_footer,
            HeaderFooterKind::EvenPageFooter => &mut self.even_page_footer,
        };
        *slot = part;
    }
}

/// A structured document: arena of nodes, the body root and the sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    body: NodeId,
    #[serde(default)]
    sections: Vec<Section>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with an empty body and no sections
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeEntry {
                parent: None,
                node: Node::Body(Container::default()),
            }],
            body: NodeId(0),
            sections: Vec::new(),
        }
    }

    /// Handle of the body container
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of nodes in the arena, including unreachable ones
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).map(|e| &e.node)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.get(id).ok_or(DocumentError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id.0)
            .map(|e| &mut e.node)
            .ok_or(DocumentError::UnknownNode(id))
    }

    /// Container the node was inserted into
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|e| e.parent)
    }

    pub fn paragraph(&self, id: NodeId) -> Result<&Paragraph, DocumentError> {
        match self.node(id)? {
            Node::Paragraph(p) => Ok(p),
            _ => Err(DocumentError::WrongNodeKind { node: id, expected: "paragraph" }),
        }
    }

    pub fn paragraph_mut(&mut self, id: NodeId) -> Result<&mut Paragraph, DocumentError> {
        match self.node_mut(id)? {
            Node::Paragraph(p) => Ok(p),
            _ => Err(DocumentError::WrongNodeKind { node: id, expected: "paragraph" }),
        }
    }

    pub fn table(&self, id: NodeId) -> Result<&Table, DocumentError> {
        match self.node(id)? {
            Node::Table(t) => Ok(t),
            _ => Err(DocumentError::WrongNodeKind { node: id, expected: "table" }),
        }
    }

    /// Children of a block container (body, cell or header/footer)
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], DocumentError> {
        self.node(id)?
            .children()
            .ok_or(DocumentError::WrongNodeKind { node: id, expected: "container" })
    }

    /// Paragraphs directly inside a container, in order
    pub fn child_paragraphs(&self, container: NodeId) -> Result<Vec<&Paragraph>, DocumentError> {
        Ok(self
            .children(container)?
            .iter()
            .filter_map(|id| match self.get(*id) {
                Some(Node::Paragraph(p)) => Some(p),
                _ => None,
            })
            .collect())
    }

    fn push_node(&mut self, parent: Option<NodeId>, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry { parent, node });
        id
    }

    fn attach(&mut self, container: NodeId, node: Node) -> Result<NodeId, DocumentError> {
        // Validate before allocating so a failed attach leaves the arena untouched
        if self.node(container)?.children().is_none() {
            return Err(DocumentError::WrongNodeKind { node: container, expected: "container" });
        }
        let id = self.push_node(Some(container), node);
        if let Some(children) = self.node_mut(container)?.children_mut() {
            children.push(id);
        }
        Ok(id)
    }

    /// Append a paragraph at the end of a container
    pub fn append_paragraph(&mut self, container: NodeId, paragraph: Paragraph) -> Result<NodeId, DocumentError> {
        self.attach(container, Node::Paragraph(paragraph))
    }

    /// Append a `rows` x `columns` table of empty cells at the end of a container
    pub fn append_table(&mut self, container: NodeId, rows: usize, columns: usize) -> Result<NodeId, DocumentError> {
        let table_id = self.attach(container, Node::Table(Table::default()))?;
        let mut grid = Vec::with_capacity(rows);
        for _ in 0..rows {
            let row = (0..columns)
                .map(|_| self.push_node(Some(table_id), Node::Cell(Container::default())))
                .collect();
            grid.push(row);
        }
        if let Node::Table(table) = self.node_mut(table_id)? {
            table.grid = grid;
        }
        Ok(table_id)
    }

    /// Handle of the cell at (row, column)
    pub fn table_cell(&self, table: NodeId, row: usize, column: usize) -> Result<NodeId, DocumentError> {
        self.table(table)?
            .cell_at(row, column)
            .ok_or(DocumentError::CellOutOfRange { row, column })
    }

    /// Merge the rectangle spanned by two corners into the top-left cell.
    ///
    /// Every grid coordinate of the rectangle points at the surviving cell
    /// afterwards; the cells it replaces stay in the arena unreachable.
    pub fn merge_cells(
        &mut self,
        table: NodeId,
        top_left: (usize, usize),
        bottom_right: (usize, usize),
    ) -> Result<NodeId, DocumentError> {
        let (r0, c0) = top_left;
        let (r1, c1) = bottom_right;
        let keep = self.table_cell(table, r0, c0)?;
        // Checks the far corner, and with it the whole rectangle for rectangular grids
        self.table_cell(table, r1, c1)?;
        if let Node::Table(t) = self.node_mut(table)? {
            for row in r0..=r1 {
                for column in c0..=c1 {
                    let slot = t
                        .grid
                        .get_mut(row)
                        .and_then(|r| r.get_mut(column))
                        .ok_or(DocumentError::CellOutOfRange { row, column })?;
                    *slot = keep;
                }
            }
        }
        Ok(keep)
    }

    /// Create a detached header/footer part to be referenced from sections
    pub fn add_header_footer(&mut self, linked_to_previous: bool) -> NodeId {
        self.push_node(
            None,
            Node::HeaderFooter(HeaderFooter {
                linked_to_previous,
                children: Vec::new(),
            }),
        )
    }

    /// Append a section, returning its index
    pub fn add_section(&mut self, section: Section) -> usize {
        self.sections.push(section);
        self.sections.len() - 1
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)
    }

    /// Insert `paragraph` into the anchor's container right after the anchor
    pub fn insert_paragraph_after(&mut self, anchor: NodeId, paragraph: Paragraph) -> Result<NodeId, DocumentError> {
        self.node(anchor)?;
        let container = self.parent(anchor).ok_or(DocumentError::Detached(anchor))?;
        let position = self
            .children(container)?
            .iter()
            .position(|c| *c == anchor)
            .ok_or(DocumentError::Detached(anchor))?;

        let id = self.push_node(Some(container), Node::Paragraph(paragraph));
        if let Some(children) = self.node_mut(container)?.children_mut() {
            children.insert(position + 1, id);
        }
        Ok(id)
    }

    /// Parse a document from its JSON form
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: Document =
            serde_json::from_str(json).map_err(|e| DocumentError::Corrupt(e.to_string()))?;
        document.check_integrity()?;
        Ok(document)
    }

    /// Serialize the document to pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Corrupt(e.to_string()))
    }

    /// Load a document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Save the document to a JSON file, atomically replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let json = self.to_json()?;
        FileManager::write_atomic(path.as_ref(), json.as_bytes())?;
        Ok(())
    }

    /// Structural checks run after deserialization.
    ///
    /// Only handle ranges and the body root are verified here; node kinds
    /// referenced from containers and grids are checked during traversal.
    fn check_integrity(&self) -> Result<(), DocumentError> {
        let in_range = |id: NodeId| id.0 < self.nodes.len();

        match self.get(self.body) {
            Some(Node::Body(_)) => {}
            Some(other) => {
                return Err(DocumentError::Corrupt(format!(
                    "body root {} is a {}",
                    self.body,
                    other.kind_name()
                )));
            }
            None => return Err(DocumentError::Corrupt(format!("body root {} is missing", self.body))),
        }

        for (index, entry) in self.nodes.iter().enumerate() {
            let referenced: Vec<NodeId> = match &entry.node {
                Node::Table(t) => t.grid.iter().flatten().copied().collect(),
                other => other.children().map(<[NodeId]>::to_vec).unwrap_or_default(),
            };
            if let Some(bad) = referenced.into_iter().chain(entry.parent).find(|id| !in_range(*id)) {
                return Err(DocumentError::Corrupt(format!("node #{} references missing node {}", index, bad)));
            }
        }

        for (index, section) in self.sections.iter().enumerate() {
            for kind in HeaderFooterKind::ALL {
                if let Some(part) = section.slot(kind) {
                    if !in_range(part) {
                        return Err(DocumentError::Corrupt(format!(
                            "section {} references missing part {}",
                            index, part
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
