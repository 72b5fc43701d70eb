/*!
 * Document model and structural traversal.
 *
 * - `model`: arena document with stable node handles, formatting and JSON persistence
 * - `traversal`: order-stable collection of translatable paragraphs
 */

pub mod model;
pub mod traversal;

pub use model::{
    Alignment, Container, Document, HeaderFooter, HeaderFooterKind, LineSpacingRule, Node, NodeId,
    NumberingRef, Paragraph, ParagraphFormat, Run, RunContent, RunFormat, Section, Table,
};
pub use traversal::{ContextCollector, Location, TranslatableUnit, TraversalResult};
