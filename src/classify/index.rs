//! Position index built from classified elements.

use std::collections::HashMap;

use super::{ElementKind, Position, TypedElement};

/// Lookup from document position to element kind.
///
/// Built once from the classifier output and queried during formatting;
/// the formatting pass never re-derives kinds from the document.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    paragraphs: HashMap<usize, ElementKind>,
    tables: Vec<usize>,
}

impl PositionIndex {
    /// Build the index. Later entries for the same paragraph replace earlier
    /// ones; elements whose kind does not match their position form are
    /// ignored.
    pub fn new(elements: &[TypedElement]) -> Self {
        let mut index = Self::default();

        for element in elements {
            if !element.is_consistent() {
                log::warn!(
                    "Ignoring {} element with mismatched position {:?}",
                    element.kind,
                    element.position
                );
                continue;
            }
            match element.position {
                Position::Paragraph { para_idx } => {
                    index.paragraphs.insert(para_idx, element.kind);
                }
                Position::Table { table_idx } => {
                    if !index.tables.contains(&table_idx) {
                        index.tables.push(table_idx);
                    }
                }
            }
        }

        index
    }

    /// Kind recorded for a paragraph.
    pub fn paragraph_kind(&self, para_idx: usize) -> Option<ElementKind> {
        self.paragraphs.get(&para_idx).copied()
    }

    /// Table indices in element order.
    pub fn tables(&self) -> &[usize] {
        &self.tables
    }

    /// Highest paragraph index referenced.
    pub fn max_paragraph_index(&self) -> Option<usize> {
        self.paragraphs.keys().copied().max()
    }

    /// Number of indexed paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Check if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty() && self.tables.is_empty()
    }
}
