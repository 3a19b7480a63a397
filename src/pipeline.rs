//! Request-scoped formatting pipeline.
//!
//! One request carries an uploaded document and a style configuration.
//! The pipeline validates the request before touching the document, then
//! works inside a temporary directory owned by the request:
//!
//! 1. write the upload to `<request-id>-input.docx`
//! 2. open and classify it
//! 3. optionally render a preview and refine the classification
//! 4. format and save to `<request-id>-output.docx`
//! 5. read the output back and drop the directory
//!
//! The directory is removed on every exit path, and no output is returned
//! unless every step succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;
use uuid::Uuid;

use crate::classify::{refine_elements, Classifier, LayoutRefiner, Refinement, TypedElement};
use crate::detect;
use crate::error::{Error, Result};
use crate::package::{DocxPackage, OpenOptions};
use crate::preview::PreviewRenderer;
use crate::style::{ApplyStats, StyleApplicator, StyleConfig};

/// Suffix added to the base name of formatted downloads.
pub const OUTPUT_SUFFIX: &str = "_formatted";

/// A formatting request.
#[derive(Debug, Clone)]
pub struct FormatRequest {
    /// Name of the uploaded file
    pub file_name: String,
    /// Uploaded bytes
    pub data: Vec<u8>,
    /// Style configuration
    pub config: StyleConfig,
}

impl FormatRequest {
    /// Create a request.
    pub fn new(file_name: impl Into<String>, data: Vec<u8>, config: StyleConfig) -> Self {
        Self {
            file_name: file_name.into(),
            data,
            config,
        }
    }

    /// Create a request with a JSON configuration, as sent by the upload
    /// form.
    pub fn from_form(file_name: impl Into<String>, data: Vec<u8>, config_json: &str) -> Result<Self> {
        let config: StyleConfig = serde_json::from_str(config_json)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self::new(file_name, data, config))
    }
}

/// Result of a successful request.
#[derive(Debug, Clone, Serialize)]
pub struct FormatResponse {
    /// Formatted document bytes
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Suggested download name
    pub download_name: String,
    /// Elements the formatting pass used
    pub elements: Vec<TypedElement>,
    /// Whether layout refinement changed the element source
    pub refined: bool,
    /// Request identifier
    pub request_id: Uuid,
    /// What the formatting pass changed
    pub stats: ApplyStats,
}

/// Formatting pipeline with optional preview and refinement
/// collaborators.
pub struct Pipeline {
    classifier: Classifier,
    open_options: OpenOptions,
    preview: Option<Box<dyn PreviewRenderer>>,
    refiner: Option<Box<dyn LayoutRefiner>>,
    temp_root: Option<PathBuf>,
}

impl Pipeline {
    /// Create a pipeline without preview or refinement.
    pub fn new() -> Self {
        Self {
            classifier: Classifier::new(),
            open_options: OpenOptions::default(),
            preview: None,
            refiner: None,
            temp_root: None,
        }
    }

    /// Set the classifier.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set package open options.
    pub fn with_open_options(mut self, options: OpenOptions) -> Self {
        self.open_options = options;
        self
    }

    /// Set the preview renderer used to feed the refiner.
    pub fn with_preview(mut self, renderer: impl PreviewRenderer + 'static) -> Self {
        self.preview = Some(Box::new(renderer));
        self
    }

    /// Set the layout refiner.
    pub fn with_refiner(mut self, refiner: impl LayoutRefiner + 'static) -> Self {
        self.refiner = Some(Box::new(refiner));
        self
    }

    /// Create request directories under `root` instead of the system
    /// temporary directory.
    pub fn with_temp_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Check a request without opening the document.
    pub fn validate(&self, request: &FormatRequest) -> Result<()> {
        if request.file_name.trim().is_empty() {
            return Err(Error::InvalidInput("no file name".into()));
        }
        if !detect::has_docx_extension(&request.file_name) {
            return Err(Error::InvalidInput(format!(
                "{} is not a .docx file",
                request.file_name
            )));
        }
        if request.data.is_empty() {
            return Err(Error::InvalidInput("uploaded file is empty".into()));
        }
        if !detect::is_docx_bytes(&request.data) {
            return Err(Error::InvalidInput(format!(
                "{} is not a DOCX package",
                request.file_name
            )));
        }
        request.config.validate()
    }

    /// Run a request.
    pub fn run(&self, request: &FormatRequest) -> Result<FormatResponse> {
        self.validate(request)?;

        let request_id = Uuid::new_v4();
        let workspace = self.workspace()?;
        log::info!(
            "Request {}: formatting {} ({} bytes)",
            request_id,
            request.file_name,
            request.data.len()
        );

        let result = self.process(request, request_id, workspace.path());

        if let Err(e) = workspace.close() {
            log::warn!("Request {}: failed to remove workspace: {}", request_id, e);
        }
        match &result {
            Ok(response) => log::info!(
                "Request {}: done, {} elements, {} bytes",
                request_id,
                response.elements.len(),
                response.data.len()
            ),
            Err(e) => log::error!("Request {}: {}", request_id, e),
        }
        result
    }

    fn workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docxstyle-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn process(&self, request: &FormatRequest, request_id: Uuid, dir: &Path) -> Result<FormatResponse> {
        let input_path = dir.join(format!("{request_id}-input.docx"));
        let output_path = dir.join(format!("{request_id}-output.docx"));
        fs::write(&input_path, &request.data)?;

        let mut package = DocxPackage::open_with_options(&input_path, self.open_options.clone())
            .map_err(Error::into_parse_error)?;

        let heuristic = self.classifier.classify(package.document());
        let (elements, refined) = match &self.refiner {
            Some(refiner) => {
                let preview = self
                    .preview
                    .as_ref()
                    .and_then(|renderer| renderer.render(&input_path));
                let refinement = refine_elements(refiner.as_ref(), preview.as_ref(), &heuristic);
                let refined = refinement.is_refined();
                (refinement.into_elements(heuristic), refined)
            }
            None => (Refinement::Unavailable.into_elements(heuristic), false),
        };

        let stats = StyleApplicator::new(&request.config)
            .apply(package.document_mut(), &elements)
            .and_then(|stats| package.save(&output_path).map(|()| stats))
            .map_err(Error::into_formatting_error)?;
        let data = fs::read(&output_path).map_err(|e| Error::from(e).into_formatting_error())?;

        Ok(FormatResponse {
            data,
            download_name: download_name(&request.file_name),
            elements,
            refined,
            request_id,
            stats,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classifier", &self.classifier)
            .field("open_options", &self.open_options)
            .field("preview", &self.preview.is_some())
            .field("refiner", &self.refiner.is_some())
            .field("temp_root", &self.temp_root)
            .finish()
    }
}

/// Download name for a formatted upload: `<base>_formatted.docx`.
pub fn download_name(file_name: &str) -> String {
    format!("{}{}.docx", sanitize_file_name(file_name), OUTPUT_SUFFIX)
}

/// Reduce an uploaded file name to a safe base name without extension.
///
/// Directory components are dropped, whitespace becomes `_`, and anything
/// outside ASCII letters, digits, `.`, `_` and `-` is removed.
pub fn sanitize_file_name(file_name: &str) -> String {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let base = match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(detect::DOCX_EXTENSION) => stem,
        _ => name,
    };

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}
