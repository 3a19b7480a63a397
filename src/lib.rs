//! # docxstyle
//!
//! Structural classification and style application for DOCX documents.
//!
//! The library classifies the top-level blocks of a word-processing
//! document as titles, headings, body paragraphs and tables, then applies a
//! configurable font, weight and highlight policy to each kind and borders
//! every embedded picture.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docxstyle::{classify_file, format_file, StyleConfig};
//!
//! fn main() -> docxstyle::Result<()> {
//!     let elements = classify_file("report.docx")?;
//!
//!     let config = StyleConfig::new()
//!         .with_title_font("Georgia", 24)
//!         .with_highlight(false);
//!     let stats = format_file("report.docx", &elements, "report_formatted.docx", &config)?;
//!     println!("{} runs formatted", stats.runs_formatted);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Lossless package handling**: only the main document part is
//!   rewritten; images, headers and every other part are copied as-is
//! - **Style-name classification**: resolves style ids the way a word
//!   processor does, including the default paragraph style
//! - **Configurable highlight policy**: per-kind highlight colors with
//!   formatter and analyzer presets
//! - **Idempotent image borders**: inline and anchored pictures alike
//! - **Request pipeline**: request-scoped temporary storage, optional
//!   preview rendering and layout refinement that never abort a request

pub mod classify;
pub mod detect;
pub mod error;
pub mod model;
pub mod package;
pub mod pipeline;
pub mod preview;
pub mod style;
pub mod xml;

// Re-export commonly used types
pub use classify::{
    refine_elements, Classifier, ElementKind, LayoutRefiner, PassthroughRefiner, Position,
    PositionIndex, Refinement, TypedElement,
};
pub use detect::{has_docx_extension, is_docx, is_docx_bytes};
pub use error::{Error, Result};
pub use model::{
    Document, HighlightColor, Metadata, Paragraph, Run, StyleSheet, Table, TableCell, TableRow,
};
pub use package::{DocxPackage, ErrorMode, OpenOptions};
pub use pipeline::{FormatRequest, FormatResponse, Pipeline};
pub use preview::{ExternalConverter, PreviewImage, PreviewRenderer};
pub use style::{ApplyStats, HighlightPolicy, StyleApplicator, StyleConfig};

use std::path::Path;

/// Open a DOCX package.
///
/// # Example
///
/// ```no_run
/// let package = docxstyle::open("report.docx").unwrap();
/// println!("Paragraphs: {}", package.document().paragraph_count());
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> Result<DocxPackage> {
    DocxPackage::open(path)
}

/// Classify the top-level blocks of a DOCX file.
///
/// Failures to open the file are reported as [`Error::DocumentParse`].
///
/// # Example
///
/// ```no_run
/// use docxstyle::classify_file;
///
/// for element in classify_file("report.docx").unwrap() {
///     println!("{:?}", element);
/// }
/// ```
pub fn classify_file<P: AsRef<Path>>(path: P) -> Result<Vec<TypedElement>> {
    let package = DocxPackage::open(path).map_err(Error::into_parse_error)?;
    Ok(classify::classify(package.document()))
}

/// Format a DOCX file with previously classified elements.
///
/// See [`style::format_file`].
pub fn format_file<P, Q>(
    input: P,
    elements: &[TypedElement],
    output: Q,
    config: &StyleConfig,
) -> Result<ApplyStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    style::format_file(input, elements, output, config)
}

/// Classify and format a DOCX payload in memory.
///
/// # Example
///
/// ```no_run
/// use docxstyle::{format_bytes, StyleConfig};
///
/// let data = std::fs::read("report.docx").unwrap();
/// let formatted = format_bytes(data, &StyleConfig::default()).unwrap();
/// std::fs::write("report_formatted.docx", formatted).unwrap();
/// ```
pub fn format_bytes(data: Vec<u8>, config: &StyleConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let mut package = DocxPackage::from_bytes(data).map_err(Error::into_parse_error)?;
    let elements = classify::classify(package.document());

    StyleApplicator::new(config)
        .apply(package.document_mut(), &elements)
        .and_then(|_| package.to_bytes())
        .map_err(Error::into_formatting_error)
}
