/*!
 * Formatting cloning between source and translated paragraphs.
 *
 * Tri-state flags are copied verbatim, including "inherit" (`None`).
 * Scalar properties are copied only when the source sets them and the value
 * is one a document can hold. Each property is handled on its own: a rejected
 * value is logged and reported, and cloning moves on to the next property.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{NumberingRef, Paragraph, Run};
use crate::errors::FormatError;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i:[0-9a-f]{6}|auto)$").unwrap());

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)$").unwrap());

const HIGHLIGHT_COLORS: &[&str] = &[
    "black", "blue", "cyan", "green", "magenta", "red", "yellow", "white", "darkblue",
    "darkcyan", "darkgreen", "darkmagenta", "darkred", "darkyellow", "darkgray", "lightgray",
    "none",
];

/// Largest font size a document accepts, in points
const MAX_FONT_SIZE: f32 = 1638.0;
/// Largest indent magnitude, in points (22 inches)
const MAX_INDENT: f32 = 1584.0;
/// Character spacing bound, in twentieths of a point
const MAX_CHARACTER_SPACING: i32 = 31680;

/// Properties that could not be cloned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloneReport {
    pub skipped: Vec<FormatError>,
}

impl CloneReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn record(&mut self, result: Result<(), FormatError>) {
        if let Err(error) = result {
            warn!("Skipping formatting property: {}", error);
            self.skipped.push(error);
        }
    }
}

/// How the list structure of a paragraph was carried over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStructure {
    /// Explicit numbering copied as-is
    Numbered(NumberingRef),
    /// No numbering, but a list-like style; the level is inferred from its name
    StyleFallback { style: String, level: u8 },
    /// The source paragraph is not a list item
    NotAList,
}

/// Copies formatting from source paragraphs and runs onto their translations
pub struct FormatCloner;

impl FormatCloner {
    /// Copy every character property of `source` onto `target`, then
    /// append as many tab and break markers as `source` holds.
    pub fn clone_run_formatting(source: &Run, target: &mut Run) -> CloneReport {
        let mut report = CloneReport::default();
        let src = &source.format;
        let dst = &mut target.format;

        dst.bold = src.bold;
        dst.italic = src.italic;
        dst.underline = src.underline;
        dst.all_caps = src.all_caps;
        dst.small_caps = src.small_caps;
        dst.strike = src.strike;
        dst.double_strike = src.double_strike;
        dst.outline = src.outline;
        dst.shadow = src.shadow;
        dst.emboss = src.emboss;
        dst.imprint = src.imprint;
        dst.superscript = src.superscript;
        dst.subscript = src.subscript;

        report.record(copy_checked("font name", &src.font_name, &mut dst.font_name, |name| {
            (!name.trim().is_empty()).then_some(()).ok_or_else(|| invalid("font name", name))
        }));
        report.record(copy_checked("font size", &src.font_size, &mut dst.font_size, |size| {
            (size.is_finite() && *size > 0.0 && *size <= MAX_FONT_SIZE)
                .then_some(())
                .ok_or_else(|| invalid("font size", size))
        }));
        report.record(copy_checked("color", &src.color, &mut dst.color, |color| {
            HEX_COLOR.is_match(color).then_some(()).ok_or_else(|| invalid("color", color))
        }));
        report.record(copy_checked("highlight", &src.highlight, &mut dst.highlight, |name| {
            HIGHLIGHT_COLORS
                .contains(&name.to_lowercase().as_str())
                .then_some(())
                .ok_or_else(|| invalid("highlight", name))
        }));
        report.record(copy_checked(
            "character spacing",
            &src.character_spacing,
            &mut dst.character_spacing,
            |spacing| {
                (spacing.abs() <= MAX_CHARACTER_SPACING)
                    .then_some(())
                    .ok_or_else(|| invalid("character spacing", spacing))
            },
        ));
        report.record(copy_checked("run style", &src.style, &mut dst.style, |_| Ok(())));

        for _ in 0..source.tab_count() {
            target.push_tab();
        }
        for _ in 0..source.break_count() {
            target.push_break();
        }

        report
    }

    /// Copy paragraph-level properties of `source` onto `target`
    pub fn clone_paragraph_formatting(source: &Paragraph, target: &mut Paragraph) -> CloneReport {
        let mut report = CloneReport::default();
        let src = &source.format;
        let dst = &mut target.format;

        dst.keep_together = src.keep_together;
        dst.keep_with_next = src.keep_with_next;
        dst.page_break_before = src.page_break_before;
        dst.widow_control = src.widow_control;

        report.record(copy_checked("alignment", &src.alignment, &mut dst.alignment, |_| Ok(())));
        for (property, value, slot) in [
            ("left indent", &src.left_indent, &mut dst.left_indent),
            ("right indent", &src.right_indent, &mut dst.right_indent),
            ("first line indent", &src.first_line_indent, &mut dst.first_line_indent),
        ] {
            report.record(copy_checked(property, value, slot, |indent| {
                (indent.is_finite() && indent.abs() <= MAX_INDENT)
                    .then_some(())
                    .ok_or_else(|| invalid(property, indent))
            }));
        }
        for (property, value, slot) in [
            ("space before", &src.space_before, &mut dst.space_before),
            ("space after", &src.space_after, &mut dst.space_after),
        ] {
            report.record(copy_checked(property, value, slot, |space| {
                (space.is_finite() && *space >= 0.0)
                    .then_some(())
                    .ok_or_else(|| invalid(property, space))
            }));
        }
        report.record(copy_checked("line spacing", &src.line_spacing, &mut dst.line_spacing, |spacing| {
            (spacing.is_finite() && *spacing > 0.0)
                .then_some(())
                .ok_or_else(|| invalid("line spacing", spacing))
        }));
        report.record(copy_checked(
            "line spacing rule",
            &src.line_spacing_rule,
            &mut dst.line_spacing_rule,
            |_| Ok(()),
        ));
        report.record(copy_checked("paragraph style", &src.style, &mut dst.style, |_| Ok(())));

        report
    }

    /// Carry list numbering over to `target`.
    ///
    /// Explicit numbering wins; otherwise a list-like style is copied and its
    /// level inferred from the trailing number of the style name.
    pub fn clone_list_structure(source: &Paragraph, target: &mut Paragraph) -> ListStructure {
        if let Some(numbering) = source.numbering {
            target.numbering = Some(numbering);
            debug!("Copied list numbering {} level {}", numbering.num_id, numbering.level);
            return ListStructure::Numbered(numbering);
        }

        match source.format.style.as_deref() {
            Some(style) if Self::is_list_style(style) => {
                target.format.style = Some(style.to_string());
                let level = Self::infer_list_level(style);
                debug!("List style fallback '{}' at level {}", style, level);
                ListStructure::StyleFallback {
                    style: style.to_string(),
                    level,
                }
            }
            _ => ListStructure::NotAList,
        }
    }

    /// Whether a style name suggests a list paragraph
    pub fn is_list_style(style: &str) -> bool {
        let lower = style.to_lowercase();
        ["list", "bullet", "number"].iter().any(|k| lower.contains(k))
    }

    /// Level from the trailing number of a style name (`"List Bullet 2"` is level 1)
    pub fn infer_list_level(style: &str) -> u8 {
        TRAILING_NUMBER
            .captures(style)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(|n| n.saturating_sub(1).min(u8::MAX as u32) as u8)
            .unwrap_or(0)
    }
}

fn invalid(property: &'static str, value: impl std::fmt::Debug) -> FormatError {
    FormatError::InvalidValue {
        property,
        value: format!("{:?}", value),
    }
}

fn copy_checked<T: Clone>(
    property: &'static str,
    source: &Option<T>,
    target: &mut Option<T>,
    check: impl Fn(&T) -> Result<(), FormatError>,
) -> Result<(), FormatError> {
    if let Some(value) = source {
        check(value)?;
        *target = Some(value.clone());
        log::trace!("Cloned {}", property);
    }
    Ok(())
}
