//! Word-processing package I/O.
//!
//! A package is a zip container of XML parts linked by relationship parts.
//! [`DocxPackage`] parses the main document part (plus styles and core
//! properties) into a [`Document`] and keeps the original container bytes,
//! so that saving rewrites the main part only and copies every other entry
//! unchanged.

mod options;
mod rels;

pub use options::{ErrorMode, OpenOptions, DEFAULT_MAX_PART_SIZE};
pub use rels::{rels_path_for, resolve_target, Relationship, Relationships};

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::detect;
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, StyleSheet};

const ROOT_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const DEFAULT_STYLES_PART: &str = "word/styles.xml";
const DEFAULT_CORE_PART: &str = "docProps/core.xml";

/// An opened word-processing package.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    data: Vec<u8>,
    part_names: Vec<String>,
    main_part: String,
    document: Document,
    options: OpenOptions,
}

impl DocxPackage {
    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    /// Open a package from a file path with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening package {}", path.display());
        let data = fs::read(path)?;
        Self::from_bytes_with_options(data, options)
    }

    /// Open a package from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(data, OpenOptions::default())
    }

    /// Open a package from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open a package from bytes with custom options.
    pub fn from_bytes_with_options(data: Vec<u8>, options: OpenOptions) -> Result<Self> {
        detect::check_magic(&data)?;

        let (part_names, main_part, document) = {
            let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))?;
            let part_names: Vec<String> = archive.file_names().map(str::to_string).collect();

            let root_rels = match read_entry(&mut archive, ROOT_RELS, &options)? {
                Some(xml) => Relationships::parse(&xml)?,
                None => Relationships::default(),
            };
            let main_part = root_rels
                .find_by_type(&[rels::OFFICE_DOCUMENT, rels::OFFICE_DOCUMENT_STRICT])
                .map(|r| resolve_target("", &r.target))
                .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

            let main_xml = read_entry(&mut archive, &main_part, &options)?
                .ok_or_else(|| Error::MissingPart(main_part.clone()))?;
            let mut document = Document::parse(&main_xml)?;

            let styles = load_styles(&mut archive, &main_part, &options)?;
            document = document.with_styles(styles);

            if options.read_metadata {
                let core_part = root_rels
                    .find_by_type(&[rels::CORE_PROPERTIES])
                    .map(|r| resolve_target("", &r.target))
                    .unwrap_or_else(|| DEFAULT_CORE_PART.to_string());
                document.metadata = load_metadata(&mut archive, &core_part, &options)?;
            }

            (part_names, main_part, document)
        };

        log::debug!(
            "Opened package: main part {}, {} parts, {} paragraphs, {} tables",
            main_part,
            part_names.len(),
            document.paragraph_count(),
            document.table_count()
        );

        Ok(Self {
            data,
            part_names,
            main_part,
            document,
            options,
        })
    }

    /// The parsed main document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The parsed main document, mutably.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Entry name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Entry names in container order.
    pub fn part_names(&self) -> &[String] {
        &self.part_names
    }

    /// Read the original bytes of a part. Returns `None` if absent.
    pub fn read_part(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        read_entry(&mut archive, name, &self.options)
    }

    /// Serialize the package. The main part is written from the current
    /// document tree; all other entries are copied without recompression.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let main_xml = self.document.to_xml()?;
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.data.len())));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.name() == self.main_part {
                let name = entry.name().to_string();
                drop(entry);
                writer.start_file(name, deflated)?;
                writer.write_all(&main_xml)?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the package to `path`.
    ///
    /// The bytes go to a temporary file next to the target which is then
    /// renamed over it; on failure the target is left untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        log::debug!("Saved package to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    options: &OpenOptions,
) -> Result<Option<Vec<u8>>> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if !options.allows(entry.size()) {
        return Err(Error::Package(format!(
            "part {} is {} bytes, above the {} byte limit",
            name,
            entry.size(),
            options.max_part_size
        )));
    }

    let mut buf = Vec::with_capacity(entry.size() as usize);
    // The declared size is not trusted; cap what is actually inflated.
    let limit = if options.max_part_size == 0 {
        u64::MAX
    } else {
        options.max_part_size + 1
    };
    entry.take(limit).read_to_end(&mut buf)?;
    if !options.allows(buf.len() as u64) {
        return Err(Error::Package(format!(
            "part {} exceeds the {} byte limit",
            name, options.max_part_size
        )));
    }
    Ok(Some(buf))
}

fn load_styles<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    main_part: &str,
    options: &OpenOptions,
) -> Result<StyleSheet> {
    let styles_part = match read_entry(archive, &rels_path_for(main_part), options)? {
        Some(xml) => Relationships::parse(&xml)?
            .find_by_type(&[rels::STYLES])
            .map(|r| resolve_target(main_part, &r.target)),
        None => None,
    }
    .unwrap_or_else(|| DEFAULT_STYLES_PART.to_string());

    let result = read_entry(archive, &styles_part, options).and_then(|xml| match xml {
        Some(xml) => StyleSheet::parse(&xml),
        None => {
            log::debug!("No styles part; style ids are used as names");
            Ok(StyleSheet::empty())
        }
    });

    match (result, options.error_mode) {
        (Ok(styles), _) => Ok(styles),
        (Err(e), ErrorMode::Lenient) => {
            log::warn!("Ignoring unreadable styles part {}: {}", styles_part, e);
            Ok(StyleSheet::empty())
        }
        (Err(e), ErrorMode::Strict) => Err(e),
    }
}

fn load_metadata<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    core_part: &str,
    options: &OpenOptions,
) -> Result<Metadata> {
    let result = read_entry(archive, core_part, options).and_then(|xml| match xml {
        Some(xml) => Metadata::parse_core(&xml),
        None => Ok(Metadata::default()),
    });

    match (result, options.error_mode) {
        (Ok(metadata), _) => Ok(metadata),
        (Err(e), ErrorMode::Lenient) => {
            log::warn!("Ignoring unreadable core properties {}: {}", core_part, e);
            Ok(Metadata::default())
        }
        (Err(e), ErrorMode::Strict) => Err(e),
    }
}
