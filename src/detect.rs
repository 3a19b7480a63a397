//! DOCX format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Zip local file header: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// File extension of word-processing packages.
pub const DOCX_EXTENSION: &str = "docx";

/// Check that bytes start with a zip local file header.
///
/// # Returns
/// * `Ok(())` if the data looks like a package
/// * `Err(Error::UnknownFormat)` otherwise
pub fn check_magic(data: &[u8]) -> Result<()> {
    if data.starts_with(ZIP_MAGIC) {
        Ok(())
    } else {
        Err(Error::UnknownFormat)
    }
}

/// Check the signature of a file.
///
/// # Example
/// ```no_run
/// use docxstyle::detect::check_magic_from_path;
///
/// check_magic_from_path("report.docx").unwrap();
/// ```
pub fn check_magic_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header) {
        Ok(()) => check_magic(&header),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::UnknownFormat),
        Err(e) => Err(e.into()),
    }
}

/// Check if bytes start like a DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    check_magic(data).is_ok()
}

/// Check if a file starts like a DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    check_magic_from_path(path).is_ok()
}

/// Check if a file name ends with `.docx`, ignoring case.
pub fn has_docx_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCX_EXTENSION))
}
