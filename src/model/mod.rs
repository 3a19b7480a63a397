//! Typed views over a word-processing document tree.
//!
//! The views borrow into the parsed main document part. Read-only views
//! (`Paragraph`, `Run`, `Table`) are `Copy`; the `*Mut` counterparts edit
//! run properties in place.

mod document;
mod paragraph;
mod run;
mod styles;
mod table;

pub use document::{Document, Metadata};
pub use paragraph::{Paragraph, ParagraphMut};
pub use run::{HighlightColor, Run, RunMut};
pub use styles::StyleSheet;
pub use table::{Table, TableCell, TableMut, TableRow};
