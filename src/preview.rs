//! Raster previews of documents.
//!
//! A preview is only ever an input to optional layout refinement. Every
//! failure here degrades to "no preview": renderers return `Option`, never
//! an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// A rendered page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    data: Vec<u8>,
    mime_type: Option<&'static str>,
}

impl PreviewImage {
    /// Wrap image bytes, detecting the format from magic bytes.
    pub fn new(data: Vec<u8>) -> Self {
        let mime_type = detect_mime_type(&data);
        Self { data, mime_type }
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the preview, returning its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Detected MIME type.
    pub fn mime_type(&self) -> Option<&'static str> {
        self.mime_type
    }

    /// Get the data size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if the preview holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Detect an image MIME type from magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // TIFF, little- or big-endian
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Some("image/tiff");
    }

    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}

/// Renders a document to a single preview image.
pub trait PreviewRenderer: Send + Sync {
    /// Render the first page of the document at `path`. Returns `None` on
    /// any failure.
    fn render(&self, path: &Path) -> Option<PreviewImage>;
}

/// Placeholder in converter arguments replaced by the output directory.
pub const OUTDIR_PLACEHOLDER: &str = "{outdir}";
/// Placeholder in converter arguments replaced by the input document.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Preview renderer backed by an external office converter.
///
/// The converter runs headless with a bounded wait; a converter that does
/// not finish in time is killed.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalConverter {
    /// Default converter program.
    pub const DEFAULT_PROGRAM: &'static str = "soffice";
    /// Default time limit.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Create a converter invoking `soffice --headless --convert-to png`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(Self::DEFAULT_PROGRAM),
            args: [
                "--headless",
                "--convert-to",
                "png",
                "--outdir",
                OUTDIR_PLACEHOLDER,
                INPUT_PLACEHOLDER,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the converter program.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the argument template. `{outdir}` and `{input}` are
    /// substituted per invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured time limit.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn convert(&self, input: &Path) -> Result<PreviewImage> {
        let outdir = tempfile::tempdir()?;
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace(OUTDIR_PLACEHOLDER, &outdir.path().to_string_lossy())
                    .replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
            })
            .collect();

        log::debug!("Running preview converter: {:?} {:?}", self.program, args);
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                // Kill can fail if the process exited in the meantime.
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Other(format!(
                    "preview converter timed out after {:?}",
                    self.timeout
                )));
            }
            thread::sleep(Self::POLL_INTERVAL);
        };

        if !status.success() {
            return Err(Error::Other(format!("preview converter exited with {status}")));
        }

        let image_path = find_image(outdir.path(), input)?;
        let data = fs::read(&image_path)?;
        if data.is_empty() {
            return Err(Error::Other("preview converter produced an empty image".into()));
        }
        Ok(PreviewImage::new(data))
    }
}

impl Default for ExternalConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewRenderer for ExternalConverter {
    fn render(&self, path: &Path) -> Option<PreviewImage> {
        match self.convert(path) {
            Ok(image) => {
                log::debug!("Rendered preview: {} bytes", image.size());
                Some(image)
            }
            Err(e) => {
                log::warn!("Preview unavailable for {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Locate the converter output: `<stem>.png` if present, else the first
/// PNG in the directory.
fn find_image(outdir: &Path, input: &Path) -> Result<PathBuf> {
    if let Some(stem) = input.file_stem() {
        let expected = outdir.join(format!("{}.png", stem.to_string_lossy()));
        if expected.is_file() {
            return Ok(expected);
        }
    }

    for entry in fs::read_dir(outdir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png {
            return Ok(path);
        }
    }

    Err(Error::Other("preview converter produced no image".into()))
}
