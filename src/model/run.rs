//! Run-level types and run property editing.

use serde::{Deserialize, Serialize};

use crate::xml::{ns, Element};

/// Schema order of the children of `w:rPr`. New properties are inserted at
/// their position in this sequence; word processors reject out-of-order
/// run properties.
const RPR_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

fn rpr_rank(local: &str) -> usize {
    RPR_ORDER
        .iter()
        .position(|name| *name == local)
        .unwrap_or(RPR_ORDER.len())
}

/// Text highlight colors supported by word processors.
///
/// Serialized names are the values written to `w:highlight`; the aliases
/// accept the names office automation libraries use for the same colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightColor {
    /// Black
    Black,
    /// Blue
    Blue,
    /// Turquoise
    #[serde(alias = "turquoise")]
    Cyan,
    /// Bright green
    #[serde(alias = "brightGreen", alias = "bright_green")]
    Green,
    /// Pink
    #[serde(alias = "pink")]
    Magenta,
    /// Red
    Red,
    /// Yellow
    Yellow,
    /// White
    White,
    /// Dark blue
    #[serde(alias = "dark_blue")]
    DarkBlue,
    /// Teal
    #[serde(alias = "teal")]
    DarkCyan,
    /// Green
    #[serde(alias = "dark_green")]
    DarkGreen,
    /// Violet
    #[serde(alias = "violet")]
    DarkMagenta,
    /// Dark red
    #[serde(alias = "dark_red")]
    DarkRed,
    /// Dark yellow
    #[serde(alias = "dark_yellow")]
    DarkYellow,
    /// Gray 50%
    #[serde(alias = "gray50", alias = "gray_50")]
    DarkGray,
    /// Gray 25%
    #[serde(alias = "gray25", alias = "gray_25")]
    LightGray,
}

impl HighlightColor {
    /// All colors.
    pub const ALL: [HighlightColor; 16] = [
        HighlightColor::Black,
        HighlightColor::Blue,
        HighlightColor::Cyan,
        HighlightColor::Green,
        HighlightColor::Magenta,
        HighlightColor::Red,
        HighlightColor::Yellow,
        HighlightColor::White,
        HighlightColor::DarkBlue,
        HighlightColor::DarkCyan,
        HighlightColor::DarkGreen,
        HighlightColor::DarkMagenta,
        HighlightColor::DarkRed,
        HighlightColor::DarkYellow,
        HighlightColor::DarkGray,
        HighlightColor::LightGray,
    ];

    /// Attribute value for `w:highlight`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Black => "black",
            HighlightColor::Blue => "blue",
            HighlightColor::Cyan => "cyan",
            HighlightColor::Green => "green",
            HighlightColor::Magenta => "magenta",
            HighlightColor::Red => "red",
            HighlightColor::Yellow => "yellow",
            HighlightColor::White => "white",
            HighlightColor::DarkBlue => "darkBlue",
            HighlightColor::DarkCyan => "darkCyan",
            HighlightColor::DarkGreen => "darkGreen",
            HighlightColor::DarkMagenta => "darkMagenta",
            HighlightColor::DarkRed => "darkRed",
            HighlightColor::DarkYellow => "darkYellow",
            HighlightColor::DarkGray => "darkGray",
            HighlightColor::LightGray => "lightGray",
        }
    }

    /// Parse a `w:highlight` attribute value.
    pub fn from_attr(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run (`w:r`): the smallest span sharing one set of formatting.
#[derive(Debug, Clone, Copy)]
pub struct Run<'a> {
    element: &'a Element,
}

impl<'a> Run<'a> {
    pub(crate) fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// The underlying element.
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// Text of the run, with tabs and breaks as whitespace.
    pub fn text(&self) -> String {
        run_text(self.element)
    }

    /// Whether the run carries embedded drawing content.
    pub fn has_drawing(&self) -> bool {
        self.element.contains(ns::W, "drawing")
    }

    fn property(&self, local: &str) -> Option<&'a Element> {
        self.element.child(ns::W, "rPr")?.child(ns::W, local)
    }

    /// Explicit ASCII font of the run.
    pub fn font_name(&self) -> Option<String> {
        self.property("rFonts")?
            .attribute_ns(ns::W, "ascii")
            .map(|v| v.into_owned())
    }

    /// Explicit font size in points.
    pub fn font_size(&self) -> Option<f32> {
        self.property("sz")?
            .attribute_ns(ns::W, "val")?
            .parse::<f32>()
            .ok()
            .map(|half_points| half_points / 2.0)
    }

    /// Explicit bold setting; `None` when the run inherits it.
    pub fn bold(&self) -> Option<bool> {
        self.property("b").map(|b| {
            b.attribute_ns(ns::W, "val")
                .map_or(true, |v| !matches!(v.as_ref(), "0" | "false" | "off"))
        })
    }

    /// Explicit highlight color.
    pub fn highlight(&self) -> Option<HighlightColor> {
        self.property("highlight")?
            .attribute_ns(ns::W, "val")
            .and_then(|v| HighlightColor::from_attr(&v))
    }

    /// Explicit text color (hex or `auto`).
    pub fn color(&self) -> Option<String> {
        self.property("color")?
            .attribute_ns(ns::W, "val")
            .map(|v| v.into_owned())
    }
}

/// Mutable access to a run.
#[derive(Debug)]
pub struct RunMut<'a> {
    element: &'a mut Element,
}

impl<'a> RunMut<'a> {
    pub(crate) fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    /// Read-only view of the run.
    pub fn as_run(&self) -> Run<'_> {
        Run::new(self.element)
    }

    /// The underlying element.
    pub fn element_mut(&mut self) -> &mut Element {
        self.element
    }

    /// Whether the run carries embedded drawing content.
    pub fn has_drawing(&self) -> bool {
        self.as_run().has_drawing()
    }

    fn properties(&mut self) -> &mut Element {
        // w:rPr is always the first child of w:r.
        self.element.child_or_insert(ns::W, "rPr", |_| true)
    }

    fn property(&mut self, local: &str) -> &mut Element {
        let rank = rpr_rank(local);
        self.properties()
            .child_or_insert(ns::W, local, |e| rpr_rank(e.local_name()) > rank)
    }

    /// Set the ASCII and high-ANSI font of the run.
    pub fn set_font_name(&mut self, name: &str) {
        let fonts = self.property("rFonts");
        fonts.set_attribute_ns(ns::W, "ascii", name);
        fonts.set_attribute_ns(ns::W, "hAnsi", name);
        // Theme fonts take precedence over explicit names.
        fonts.remove_attribute_ns(ns::W, "asciiTheme");
        fonts.remove_attribute_ns(ns::W, "hAnsiTheme");
    }

    /// Set the font size in whole points.
    pub fn set_font_size(&mut self, points: u32) {
        let half_points = points.saturating_mul(2).to_string();
        self.property("sz")
            .set_attribute_ns(ns::W, "val", &half_points);
    }

    /// Set bold explicitly on or off.
    pub fn set_bold(&mut self, bold: bool) {
        let b = self.property("b");
        if bold {
            b.remove_attribute_ns(ns::W, "val");
        } else {
            b.set_attribute_ns(ns::W, "val", "0");
        }
    }

    /// Set the highlight color.
    pub fn set_highlight(&mut self, color: HighlightColor) {
        self.property("highlight")
            .set_attribute_ns(ns::W, "val", color.as_str());
    }

    /// Drop any explicit text color so the run falls back to its style.
    pub fn clear_color(&mut self) -> bool {
        match self.element.child_mut(ns::W, "rPr") {
            Some(rpr) => rpr.remove_children(ns::W, "color") > 0,
            None => false,
        }
    }
}

pub(crate) fn run_text(run: &Element) -> String {
    let mut text = String::new();
    for child in run.elements() {
        if child.namespace() != Some(ns::W) {
            continue;
        }
        match child.local_name() {
            "t" => text.push_str(&child.text()),
            "tab" | "ptab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}
