//! Table views.
//!
//! Only the top-level structure is exposed: rows of the table, cells of
//! each row, paragraphs of each cell. Tables nested inside cells are not
//! reachable through these views.

use super::paragraph::Paragraph;
use super::run::RunMut;
use crate::xml::{ns, Element};

/// A table (`w:tbl`).
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    element: &'a Element,
}

impl<'a> Table<'a> {
    pub(crate) fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// The underlying element.
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// Rows in document order.
    pub fn rows(&self) -> impl Iterator<Item = TableRow<'a>> + 'a {
        self.element.children_named(ns::W, "tr").map(TableRow::new)
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// Get the number of columns (based on first row).
    pub fn column_count(&self) -> usize {
        self.rows().next().map(|r| r.cells().count()).unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows().next().is_none()
    }

    /// Plain text: cells joined with ` | `, rows with newlines.
    pub fn plain_text(&self) -> String {
        self.rows()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row (`w:tr`).
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    element: &'a Element,
}

impl<'a> TableRow<'a> {
    fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// Cells in the row.
    pub fn cells(&self) -> impl Iterator<Item = TableCell<'a>> + 'a {
        self.element.children_named(ns::W, "tc").map(TableCell::new)
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// A table cell (`w:tc`).
#[derive(Debug, Clone, Copy)]
pub struct TableCell<'a> {
    element: &'a Element,
}

impl<'a> TableCell<'a> {
    fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// Paragraphs directly inside the cell.
    pub fn paragraphs(&self) -> impl Iterator<Item = Paragraph<'a>> + 'a {
        self.element.children_named(ns::W, "p").map(Paragraph::new)
    }

    /// Get plain text content; paragraphs are separated by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }
}

/// Mutable access to a table.
#[derive(Debug)]
pub struct TableMut<'a> {
    element: &'a mut Element,
}

impl<'a> TableMut<'a> {
    pub(crate) fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    /// Read-only view of the table.
    pub fn as_table(&self) -> Table<'_> {
        Table::new(self.element)
    }

    /// Every run of every cell paragraph, row by row.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = RunMut<'_>> {
        self.element
            .elements_mut()
            .filter(|e| e.is(ns::W, "tr"))
            .flat_map(|row| row.elements_mut().filter(|e| e.is(ns::W, "tc")))
            .flat_map(|cell| cell.elements_mut().filter(|e| e.is(ns::W, "p")))
            .flat_map(|paragraph| paragraph.elements_mut().filter(|e| e.is(ns::W, "r")))
            .map(RunMut::new)
    }
}
