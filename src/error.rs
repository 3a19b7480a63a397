//! Error types for docxstyle library.

use std::io;
use thiserror::Error;

/// Result type alias for docxstyle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document processing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The payload is not a word-processing package.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The request was rejected before any document was opened.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The style configuration is malformed or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error reading or writing the zip container.
    #[error("Package error: {0}")]
    Package(String),

    /// Malformed XML inside a package part.
    #[error("XML error: {0}")]
    Xml(String),

    /// A part required by the package is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The document tree could not be opened.
    #[error("Document parse error: {0}")]
    DocumentParse(String),

    /// The mutate/save pass failed; no output was written.
    #[error("Formatting failed: {0}")]
    Formatting(String),

    /// A classified paragraph position no longer exists in the tree.
    #[error("Paragraph index {index} is out of range (document has {paragraphs} paragraphs)")]
    StaleIndex {
        /// Offending paragraph index
        index: usize,
        /// Paragraph count at formatting time
        paragraphs: usize,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by
    /// processing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::InvalidConfig(_) | Error::UnknownFormat
        )
    }

    /// Report a failure to open a document as `DocumentParse`. Caller
    /// errors are kept as they are.
    pub fn into_parse_error(self) -> Self {
        match self {
            e @ (Error::DocumentParse(_)
            | Error::InvalidInput(_)
            | Error::InvalidConfig(_)
            | Error::UnknownFormat) => e,
            e => Error::DocumentParse(e.to_string()),
        }
    }

    /// Report a failure of the mutate/save pass as `Formatting`.
    pub fn into_formatting_error(self) -> Self {
        match self {
            e @ Error::Formatting(_) => e,
            e => Error::Formatting(e.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::MissingPart(err.to_string()),
            _ => Error::Package(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
