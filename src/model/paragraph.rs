//! Paragraph views.

use std::borrow::Cow;

use super::run::{run_text, Run, RunMut};
use crate::xml::{ns, Element};

/// A paragraph (`w:p`).
#[derive(Debug, Clone, Copy)]
pub struct Paragraph<'a> {
    element: &'a Element,
}

impl<'a> Paragraph<'a> {
    pub(crate) fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// The underlying element.
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// Style id referenced by `w:pPr/w:pStyle`, if any.
    pub fn style_id(&self) -> Option<Cow<'a, str>> {
        self.element
            .child(ns::W, "pPr")?
            .child(ns::W, "pStyle")?
            .attribute_ns(ns::W, "val")
    }

    /// Runs that are direct children of the paragraph.
    ///
    /// Runs nested in hyperlinks or content controls are not included.
    pub fn runs(&self) -> impl Iterator<Item = Run<'a>> + 'a {
        self.element.children_named(ns::W, "r").map(Run::new)
    }

    /// Number of direct runs.
    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Paragraph text: direct runs plus hyperlink runs, in order.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in self.element.elements() {
            if child.is(ns::W, "r") {
                text.push_str(&run_text(child));
            } else if child.is(ns::W, "hyperlink") {
                for run in child.children_named(ns::W, "r") {
                    text.push_str(&run_text(run));
                }
            }
        }
        text
    }

    /// Whether the paragraph text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Whether any run of the paragraph carries a drawing.
    pub fn has_drawing(&self) -> bool {
        self.runs().any(|r| r.has_drawing())
    }
}

/// Mutable access to a paragraph.
#[derive(Debug)]
pub struct ParagraphMut<'a> {
    element: &'a mut Element,
}

impl<'a> ParagraphMut<'a> {
    pub(crate) fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    /// Read-only view of the paragraph.
    pub fn as_paragraph(&self) -> Paragraph<'_> {
        Paragraph::new(self.element)
    }

    /// Direct runs, mutably.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = RunMut<'_>> {
        self.element
            .elements_mut()
            .filter(|e| e.is(ns::W, "r"))
            .map(RunMut::new)
    }
}
