//! Document-level types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::paragraph::{Paragraph, ParagraphMut};
use super::styles::StyleSheet;
use super::table::{Table, TableMut};
use crate::error::{Error, Result};
use crate::xml::{ns, Element, XmlDocument};

/// The main document part of a word-processing package.
///
/// Paragraphs and tables are the direct children of `w:body`, addressed by
/// their 0-based position in document order. Content nested in tables,
/// text boxes or content controls is not part of either collection.
#[derive(Debug, Clone)]
pub struct Document {
    xml: XmlDocument,
    styles: StyleSheet,

    /// Core properties (title, author, etc.)
    pub metadata: Metadata,
}

impl Document {
    /// Parse the main document part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let xml = XmlDocument::parse(data)?;
        let root = xml.root();
        if !root.is(ns::W, "document") {
            return Err(Error::DocumentParse(format!(
                "unexpected root element <{}>",
                root.name()
            )));
        }
        if root.child(ns::W, "body").is_none() {
            return Err(Error::DocumentParse("document has no body".into()));
        }

        Ok(Self {
            xml,
            styles: StyleSheet::empty(),
            metadata: Metadata::default(),
        })
    }

    /// Attach the stylesheet used for style-name resolution.
    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    /// The stylesheet.
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Serialize the main document part.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        self.xml.to_bytes()
    }

    fn body(&self) -> &Element {
        // Presence is checked in `parse`; fall back to the root so the
        // collections are simply empty.
        let root = self.xml.root();
        root.child(ns::W, "body").unwrap_or(root)
    }

    fn body_mut(&mut self) -> &mut Element {
        let root = self.xml.root_mut();
        if root.child(ns::W, "body").is_some() {
            root.child_or_insert(ns::W, "body", |_| false)
        } else {
            root
        }
    }

    /// Top-level paragraphs in document order, blank ones included.
    pub fn paragraphs(&self) -> impl Iterator<Item = Paragraph<'_>> {
        self.body().children_named(ns::W, "p").map(Paragraph::new)
    }

    /// Top-level paragraphs, mutably.
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = ParagraphMut<'_>> {
        self.body_mut()
            .elements_mut()
            .filter(|e| e.is(ns::W, "p"))
            .map(ParagraphMut::new)
    }

    /// Get a paragraph by index.
    pub fn paragraph(&self, index: usize) -> Option<Paragraph<'_>> {
        self.paragraphs().nth(index)
    }

    /// Get the number of top-level paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Top-level tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = Table<'_>> {
        self.body().children_named(ns::W, "tbl").map(Table::new)
    }

    /// Get a table by index.
    pub fn table(&self, index: usize) -> Option<Table<'_>> {
        self.tables().nth(index)
    }

    /// Get a table by index, mutably.
    pub fn table_mut(&mut self, index: usize) -> Option<TableMut<'_>> {
        self.body_mut()
            .elements_mut()
            .filter(|e| e.is(ns::W, "tbl"))
            .nth(index)
            .map(TableMut::new)
    }

    /// Get the number of top-level tables.
    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Resolved style name of a paragraph.
    pub fn style_name(&self, paragraph: &Paragraph<'_>) -> String {
        self.styles
            .paragraph_style_name(paragraph.style_id().as_deref())
    }

    /// Number of embedded drawings anywhere in the body.
    pub fn image_count(&self) -> usize {
        self.body().count(ns::W, "drawing")
    }

    /// Check if the document has no paragraphs and no tables.
    pub fn is_empty(&self) -> bool {
        self.paragraphs().next().is_none() && self.tables().next().is_none()
    }

    /// Get plain text content of the top-level paragraphs.
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Document core properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Description / comments
    pub description: Option<String>,

    /// Last author to save the document
    pub last_modified_by: Option<String>,

    /// Revision number
    pub revision: Option<u32>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Parse the core properties part (`docProps/core.xml`).
    pub fn parse_core(data: &[u8]) -> Result<Self> {
        let xml = XmlDocument::parse(data)?;
        let root = xml.root();

        let text = |uri: &str, local: &str| {
            root.child(uri, local)
                .map(|e| e.text().trim().to_string())
                .filter(|t| !t.is_empty())
        };
        let date = |local: &str| {
            text(ns::DCTERMS, local).and_then(|value| match parse_w3c_date(&value) {
                Some(date) => Some(date),
                None => {
                    log::debug!("Ignoring unparseable {} date: {}", local, value);
                    None
                }
            })
        };

        Ok(Self {
            title: text(ns::DC, "title"),
            subject: text(ns::DC, "subject"),
            author: text(ns::DC, "creator"),
            keywords: text(ns::CP, "keywords"),
            description: text(ns::DC, "description"),
            last_modified_by: text(ns::CP, "lastModifiedBy"),
            revision: text(ns::CP, "revision").and_then(|r| r.parse().ok()),
            created: date("created"),
            modified: date("modified"),
        })
    }

    /// Check if no property is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse a W3CDTF timestamp. Date-only values are taken as midnight UTC.
fn parse_w3c_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
