//! Structural classification.
//!
//! The classifier walks the top-level paragraphs and tables of a document
//! once and produces an ordered list of [`TypedElement`]s. Paragraph
//! positions come from a counter that advances for every paragraph,
//! including blank ones that are not classified, so a position always
//! equals the index of the same paragraph in [`Document::paragraphs`].
//!
//! # Example
//!
//! ```no_run
//! use docxstyle::classify::{Classifier, ElementKind};
//! use docxstyle::package::DocxPackage;
//!
//! let package = DocxPackage::open("report.docx").unwrap();
//! let elements = Classifier::new().classify(package.document());
//! let headings = elements.iter().filter(|e| e.kind == ElementKind::Heading).count();
//! println!("{} headings", headings);
//! ```

mod index;
mod refine;

pub use index::PositionIndex;
pub use refine::{refine_elements, LayoutRefiner, PassthroughRefiner, Refinement};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::Document;

/// Structural role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementKind {
    /// Paragraph styled `Title`
    Title,
    /// Paragraph whose style name contains `Heading`
    Heading,
    /// Any other non-blank paragraph
    Paragraph,
    /// Top-level table
    Table,
}

impl ElementKind {
    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Title => "TITLE",
            ElementKind::Heading => "HEADING",
            ElementKind::Paragraph => "PARAGRAPH",
            ElementKind::Table => "TABLE",
        }
    }

    /// Whether elements of this kind address a paragraph.
    pub fn is_paragraph_kind(&self) -> bool {
        !matches!(self, ElementKind::Table)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a classified block: exactly one of a paragraph index or a
/// table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    /// 0-based index over all top-level paragraphs
    Paragraph {
        /// Paragraph index
        para_idx: usize,
    },
    /// 0-based index over top-level tables
    Table {
        /// Table index
        table_idx: usize,
    },
}

/// A classified block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedElement {
    /// Structural kind
    #[serde(rename = "type")]
    pub kind: ElementKind,

    /// Position in the document
    #[serde(flatten)]
    pub position: Position,

    /// Source text at classification time (diagnostic only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Heading level from the style name (`Heading 2` → 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl TypedElement {
    /// A paragraph-level element.
    pub fn paragraph(kind: ElementKind, para_idx: usize) -> Self {
        Self {
            kind,
            position: Position::Paragraph { para_idx },
            text: None,
            level: None,
        }
    }

    /// A table element.
    pub fn table(table_idx: usize) -> Self {
        Self {
            kind: ElementKind::Table,
            position: Position::Table { table_idx },
            text: None,
            level: None,
        }
    }

    /// Attach a text snapshot.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach a heading level.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Paragraph index, if this element addresses a paragraph.
    pub fn paragraph_index(&self) -> Option<usize> {
        match self.position {
            Position::Paragraph { para_idx } => Some(para_idx),
            Position::Table { .. } => None,
        }
    }

    /// Table index, if this element addresses a table.
    pub fn table_index(&self) -> Option<usize> {
        match self.position {
            Position::Table { table_idx } => Some(table_idx),
            Position::Paragraph { .. } => None,
        }
    }

    /// Whether the kind matches the position form: tables carry a table
    /// index, everything else a paragraph index.
    pub fn is_consistent(&self) -> bool {
        self.kind.is_paragraph_kind() == matches!(self.position, Position::Paragraph { .. })
    }
}

/// Style-name based classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    capture_text: bool,
    level_pattern: Regex,
}

impl Classifier {
    /// Create a classifier that records positions only.
    pub fn new() -> Self {
        Self {
            capture_text: false,
            level_pattern: Regex::new(r"(\d+)\s*$").unwrap(),
        }
    }

    /// Record text snapshots on the produced elements.
    pub fn with_text(mut self, capture: bool) -> Self {
        self.capture_text = capture;
        self
    }

    /// Kind for a non-blank paragraph with this style name.
    ///
    /// `Title` must match exactly; any name containing `Heading` is a
    /// heading. Comparison is case-sensitive.
    pub fn kind_for_style(style_name: &str) -> ElementKind {
        if style_name == "Title" {
            ElementKind::Title
        } else if style_name.contains("Heading") {
            ElementKind::Heading
        } else {
            ElementKind::Paragraph
        }
    }

    /// Classify the top-level blocks of a document.
    pub fn classify(&self, doc: &Document) -> Vec<TypedElement> {
        let mut elements = Vec::new();

        for (para_idx, paragraph) in doc.paragraphs().enumerate() {
            let text = paragraph.text();
            if text.trim().is_empty() {
                continue;
            }

            let style_name = doc.style_name(&paragraph);
            let kind = Self::kind_for_style(&style_name);
            let mut element = TypedElement::paragraph(kind, para_idx);
            if kind == ElementKind::Heading {
                if let Some(level) = self.heading_level(&style_name) {
                    element = element.with_level(level);
                }
            }
            if self.capture_text {
                element = element.with_text(text);
            }
            elements.push(element);
        }

        for (table_idx, table) in doc.tables().enumerate() {
            let mut element = TypedElement::table(table_idx);
            if self.capture_text {
                element = element.with_text(table.plain_text());
            }
            elements.push(element);
        }

        log::debug!(
            "Classified {} elements ({} paragraphs, {} tables)",
            elements.len(),
            doc.paragraph_count(),
            doc.table_count()
        );
        elements
    }

    fn heading_level(&self, style_name: &str) -> Option<u8> {
        self.level_pattern
            .captures(style_name)
            .and_then(|caps| caps[1].parse().ok())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a document with the default classifier.
pub fn classify(doc: &Document) -> Vec<TypedElement> {
    Classifier::new().classify(doc)
}
