//! Package relationships (`_rels/*.rels`).

use crate::error::Result;
use crate::xml::{ns, XmlDocument};

/// Relationship type of the main document part.
pub const OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
/// Strict-conformance spelling of the main document relationship.
pub const OFFICE_DOCUMENT_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument";
/// Relationship type of the styles part.
pub const STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
/// Relationship type of the core properties part.
pub const CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// A single relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id (`rId1`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target as written
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// Relationships of one source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Parse a relationships part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let xml = XmlDocument::parse(data)?;
        let items = xml
            .root()
            .children_named(ns::PKG_REL, "Relationship")
            .filter_map(|e| {
                Some(Relationship {
                    id: e.attribute("Id")?.into_owned(),
                    rel_type: e.attribute("Type")?.into_owned(),
                    target: e.attribute("Target")?.into_owned(),
                    external: e.attribute("TargetMode").as_deref() == Some("External"),
                })
            })
            .collect();
        Ok(Self { items })
    }

    /// All relationships in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// First internal relationship of one of the given types.
    pub fn find_by_type(&self, types: &[&str]) -> Option<&Relationship> {
        self.items
            .iter()
            .find(|r| !r.external && types.contains(&r.rel_type.as_str()))
    }
}

/// Path of the relationships part for `part` (`word/document.xml` →
/// `word/_rels/document.xml.rels`).
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
/// Returns a zip entry name without a leading slash.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/').collect());
    }
    let mut segments: Vec<&str> = source_part
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    segments.extend(target.split('/'));
    normalize(segments)
}

fn normalize(segments: Vec<&str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}
