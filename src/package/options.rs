//! Package open options.

/// Default cap for a single uncompressed part: 256 MiB.
pub const DEFAULT_MAX_PART_SIZE: u64 = 256 * 1024 * 1024;

/// Options for opening word-processing packages.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Error handling mode for auxiliary parts
    pub error_mode: ErrorMode,

    /// Largest uncompressed part that will be read, in bytes (0 = unlimited)
    pub max_part_size: u64,

    /// Whether to read the core properties part
    pub read_metadata: bool,
}

impl OpenOptions {
    /// Create new open options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (tolerate unreadable styles and properties).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the part size cap in bytes.
    pub fn with_max_part_size(mut self, bytes: u64) -> Self {
        self.max_part_size = bytes;
        self
    }

    /// Enable or disable reading core properties.
    pub fn with_metadata(mut self, read: bool) -> Self {
        self.read_metadata = read;
        self
    }

    pub(crate) fn allows(&self, size: u64) -> bool {
        self.max_part_size == 0 || size <= self.max_part_size
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            read_metadata: true,
        }
    }
}

/// Error handling mode for parts other than the main document.
///
/// The main document part is always required; a broken main part fails
/// the open in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Log and skip unreadable auxiliary parts
    Lenient,
}
