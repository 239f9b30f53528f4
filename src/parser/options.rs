//! Parsing options and configuration.

/// Options for parsing persisted documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Keep elements the model does not interpret as raw HTML blocks
    pub preserve_unknown: bool,

    /// Read the title and `<meta>` author and dates into the metadata
    pub extract_metadata: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (repair structure instead of failing).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable strict mode (fail on any structural problem).
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Keep or drop elements the model does not interpret.
    pub fn with_preserve_unknown(mut self, preserve: bool) -> Self {
        self.preserve_unknown = preserve;
        self
    }

    /// Enable or disable metadata extraction.
    pub fn with_metadata(mut self, extract: bool) -> Self {
        self.extract_metadata = extract;
        self
    }

    /// Check if structural problems are repaired instead of reported.
    pub fn is_lenient(&self) -> bool {
        self.error_mode == ErrorMode::Lenient
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            preserve_unknown: true,
            extract_metadata: true,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any structural problem
    #[default]
    Strict,
    /// Wrap stray content in pages and reassign duplicate ids
    Lenient,
}
