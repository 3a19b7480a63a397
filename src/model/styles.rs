//! Paragraph style name resolution.

use std::collections::HashMap;

use crate::error::Result;
use crate::xml::{ns, XmlDocument};

/// Built-in styles whose stored names differ from the names shown to users.
const UI_ALIASES: &[(&str, &str)] = &[
    ("caption", "Caption"),
    ("footer", "Footer"),
    ("header", "Header"),
    ("heading 1", "Heading 1"),
    ("heading 2", "Heading 2"),
    ("heading 3", "Heading 3"),
    ("heading 4", "Heading 4"),
    ("heading 5", "Heading 5"),
    ("heading 6", "Heading 6"),
    ("heading 7", "Heading 7"),
    ("heading 8", "Heading 8"),
    ("heading 9", "Heading 9"),
];

const FALLBACK_STYLE: &str = "Normal";

/// Paragraph styles declared by the styles part.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    /// style id -> stored name
    paragraph_styles: HashMap<String, Option<String>>,
    default_paragraph: Option<String>,
    loaded: bool,
}

impl StyleSheet {
    /// A stylesheet for packages without a styles part. Style ids are used
    /// as names.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the styles part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let xml = XmlDocument::parse(data)?;
        let mut sheet = Self {
            loaded: true,
            ..Self::default()
        };

        for style in xml.root().children_named(ns::W, "style") {
            // A missing w:type means paragraph.
            if !matches!(
                style.attribute_ns(ns::W, "type").as_deref(),
                None | Some("paragraph")
            ) {
                continue;
            }
            let Some(id) = style.attribute_ns(ns::W, "styleId") else {
                continue;
            };
            let name = style
                .child(ns::W, "name")
                .and_then(|n| n.attribute_ns(ns::W, "val"))
                .map(|v| v.into_owned());
            let is_default = matches!(
                style.attribute_ns(ns::W, "default").as_deref(),
                Some("1") | Some("true") | Some("on")
            );
            sheet.add_paragraph_style(&id, name.as_deref(), is_default);
        }

        log::debug!(
            "Loaded {} paragraph styles (default: {:?})",
            sheet.paragraph_styles.len(),
            sheet.default_paragraph
        );
        Ok(sheet)
    }

    /// Register a paragraph style.
    pub fn add_paragraph_style(&mut self, id: &str, name: Option<&str>, is_default: bool) {
        self.loaded = true;
        self.paragraph_styles
            .insert(id.to_string(), name.map(str::to_string));
        if is_default {
            self.default_paragraph = Some(id.to_string());
        }
    }

    /// Whether a styles part was loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of known paragraph styles.
    pub fn len(&self) -> usize {
        self.paragraph_styles.len()
    }

    /// Check if no paragraph styles are known.
    pub fn is_empty(&self) -> bool {
        self.paragraph_styles.is_empty()
    }

    /// User-facing name of the paragraph style referenced by `style_id`.
    ///
    /// Missing or unknown ids resolve to the default paragraph style.
    pub fn paragraph_style_name(&self, style_id: Option<&str>) -> String {
        if !self.loaded {
            return style_id.unwrap_or(FALLBACK_STYLE).to_string();
        }

        let resolved = style_id
            .filter(|id| self.paragraph_styles.contains_key(*id))
            .or(self.default_paragraph.as_deref());

        match resolved {
            Some(id) => {
                let stored = self
                    .paragraph_styles
                    .get(id)
                    .and_then(|name| name.as_deref())
                    .unwrap_or(id);
                ui_name(stored).to_string()
            }
            None => FALLBACK_STYLE.to_string(),
        }
    }
}

fn ui_name(stored: &str) -> &str {
    UI_ALIASES
        .iter()
        .find(|(internal, _)| *internal == stored)
        .map(|(_, ui)| *ui)
        .unwrap_or(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="Quote1"><w:name w:val="Intense Quote"/></w:style>
  <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
</w:styles>"#;

    #[test]
    fn test_resolve_names() {
        let sheet = StyleSheet::parse(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.len(), 4);
        assert_eq!(sheet.paragraph_style_name(Some("Title")), "Title");
        assert_eq!(sheet.paragraph_style_name(Some("Heading1")), "Heading 1");
        assert_eq!(sheet.paragraph_style_name(Some("Quote1")), "Intense Quote");
    }

    #[test]
    fn test_default_fallback() {
        let sheet = StyleSheet::parse(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.paragraph_style_name(None), "Normal");
        assert_eq!(sheet.paragraph_style_name(Some("Missing")), "Normal");
        // Character styles are not paragraph styles.
        assert_eq!(sheet.paragraph_style_name(Some("Strong")), "Normal");
    }

    #[test]
    fn test_untyped_style_is_paragraph() {
        let styles = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
</w:styles>"#;
        let sheet = StyleSheet::parse(styles.as_bytes()).unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.paragraph_style_name(Some("Heading1")), "Heading 1");
    }

    #[test]
    fn test_without_styles_part() {
        let sheet = StyleSheet::empty();
        assert!(!sheet.is_loaded());
        assert_eq!(sheet.paragraph_style_name(Some("Heading2")), "Heading2");
        assert_eq!(sheet.paragraph_style_name(None), "Normal");
    }
}
