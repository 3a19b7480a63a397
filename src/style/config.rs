//! Style configuration.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::classify::ElementKind;
use crate::error::{Error, Result};
use crate::model::HighlightColor;

/// Largest font size a run can carry, in points.
pub const MAX_FONT_SIZE: u32 = 1638;

/// Largest line width a shape outline can carry, in points.
pub const MAX_BORDER_PT: f64 = 1584.0;

/// Default image border width in points.
pub const DEFAULT_BORDER_PT: f64 = 0.25;

/// Formatting applied per structural kind.
///
/// Field names match the upload form. Sizes are whole points and may be
/// given as JSON integers or integer strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Font family for titles
    pub title_font: String,

    /// Font size for titles
    #[serde(deserialize_with = "deserialize_size")]
    pub title_size: u32,

    /// Font family for headings
    pub heading_font: String,

    /// Font size for headings
    #[serde(deserialize_with = "deserialize_size")]
    pub heading_size: u32,

    /// Font family for body paragraphs
    pub para_font: String,

    /// Font size for body paragraphs
    #[serde(deserialize_with = "deserialize_size")]
    pub para_size: u32,

    /// Whether title runs are bold
    pub bold_titles: bool,

    /// Global highlight switch
    pub highlight: bool,

    /// Kind to highlight color table
    pub highlight_colors: HighlightPolicy,

    /// Image border width in points
    pub image_border_pt: f64,
}

impl StyleConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the title font.
    pub fn with_title_font(mut self, name: impl Into<String>, size: u32) -> Self {
        self.title_font = name.into();
        self.title_size = size;
        self
    }

    /// Set the heading font.
    pub fn with_heading_font(mut self, name: impl Into<String>, size: u32) -> Self {
        self.heading_font = name.into();
        self.heading_size = size;
        self
    }

    /// Set the body paragraph font.
    pub fn with_para_font(mut self, name: impl Into<String>, size: u32) -> Self {
        self.para_font = name.into();
        self.para_size = size;
        self
    }

    /// Enable or disable bold titles.
    pub fn with_bold_titles(mut self, bold: bool) -> Self {
        self.bold_titles = bold;
        self
    }

    /// Enable or disable highlighting.
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// Set the highlight color table.
    pub fn with_highlight_colors(mut self, policy: HighlightPolicy) -> Self {
        self.highlight_colors = policy;
        self
    }

    /// Set the image border width in points.
    pub fn with_image_border(mut self, points: f64) -> Self {
        self.image_border_pt = points;
        self
    }

    /// Font family and size for a paragraph kind. Tables have none; their
    /// text keeps its own font.
    pub fn font_for(&self, kind: ElementKind) -> Option<(&str, u32)> {
        match kind {
            ElementKind::Title => Some((self.title_font.as_str(), self.title_size)),
            ElementKind::Heading => Some((self.heading_font.as_str(), self.heading_size)),
            ElementKind::Paragraph => Some((self.para_font.as_str(), self.para_size)),
            ElementKind::Table => None,
        }
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        let fonts = [
            ("title", &self.title_font, self.title_size),
            ("heading", &self.heading_font, self.heading_size),
            ("para", &self.para_font, self.para_size),
        ];
        for (field, font, size) in fonts {
            if font.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{field}_font must not be empty")));
            }
            if size == 0 || size > MAX_FONT_SIZE {
                return Err(Error::InvalidConfig(format!(
                    "{field}_size must be between 1 and {MAX_FONT_SIZE}, got {size}"
                )));
            }
        }

        if !self.image_border_pt.is_finite()
            || self.image_border_pt < 0.0
            || self.image_border_pt > MAX_BORDER_PT
        {
            return Err(Error::InvalidConfig(format!(
                "image_border_pt must be between 0 and {MAX_BORDER_PT}, got {}",
                self.image_border_pt
            )));
        }
        Ok(())
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            title_font: "Times New Roman".to_string(),
            title_size: 26,
            heading_font: "Calibri".to_string(),
            heading_size: 18,
            para_font: "Calibri".to_string(),
            para_size: 12,
            bold_titles: true,
            highlight: true,
            highlight_colors: HighlightPolicy::default(),
            image_border_pt: DEFAULT_BORDER_PT,
        }
    }
}

/// Highlight colors per structural kind.
///
/// A kind without a color keeps its existing highlight. Table cells use
/// `table` regardless of the paragraph colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightPolicy {
    /// Title runs
    pub title: Option<HighlightColor>,
    /// Heading runs
    pub heading: Option<HighlightColor>,
    /// Body paragraph runs
    pub paragraph: Option<HighlightColor>,
    /// Table cell runs
    pub table: Option<HighlightColor>,
    /// Remove explicit text color from highlighted paragraph runs
    pub clear_text_color: bool,
}

impl HighlightPolicy {
    /// Formatter colors: yellow titles, bright green headings, gray body
    /// text, yellow tables.
    pub fn formatter() -> Self {
        Self {
            title: Some(HighlightColor::Yellow),
            heading: Some(HighlightColor::Green),
            paragraph: Some(HighlightColor::LightGray),
            table: Some(HighlightColor::Yellow),
            clear_text_color: false,
        }
    }

    /// Analyzer colors: red titles, violet headings, bright green body
    /// text, yellow tables, text color cleared.
    pub fn analyzer() -> Self {
        Self {
            title: Some(HighlightColor::Red),
            heading: Some(HighlightColor::DarkMagenta),
            paragraph: Some(HighlightColor::Green),
            table: Some(HighlightColor::Yellow),
            clear_text_color: true,
        }
    }

    /// Color for a kind.
    pub fn color_for(&self, kind: ElementKind) -> Option<HighlightColor> {
        match kind {
            ElementKind::Title => self.title,
            ElementKind::Heading => self.heading,
            ElementKind::Paragraph => self.paragraph,
            ElementKind::Table => self.table,
        }
    }
}

impl Default for HighlightPolicy {
    fn default() -> Self {
        Self::formatter()
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct SizeVisitor;

    impl Visitor<'_> for SizeVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a whole number of points")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("font size {v} is too large")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("font size {v} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<u32, E> {
            Err(E::custom(format!("font size must be an integer, got {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u32, E> {
            v.trim()
                .parse::<u32>()
                .map_err(|_| E::custom(format!("font size must be an integer, got {v:?}")))
        }
    }

    deserializer.deserialize_any(SizeVisitor)
}
