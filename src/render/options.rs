//! Rendering options configuration.

/// Options for rendering documents to HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Alt text for pictures without a `wp:docPr` description
    pub default_alt_text: String,

    /// Maximum heading level (1-6); deeper headings are capped
    pub max_heading_level: u8,

    /// Emit `<p></p>` for paragraphs without text or images
    pub include_empty_paragraphs: bool,

    /// Normalize text to Unicode NFC
    pub normalize_unicode: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_alt_text: String::new(),
            max_heading_level: 6,
            include_empty_paragraphs: false,
            normalize_unicode: true,
        }
    }
}

impl RenderOptions {
    /// Create new render options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alt text used when a picture has none.
    pub fn with_default_alt_text(mut self, alt: impl Into<String>) -> Self {
        self.default_alt_text = alt.into();
        self
    }

    /// Set maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    pub fn with_empty_paragraphs(mut self, include: bool) -> Self {
        self.include_empty_paragraphs = include;
        self
    }

    pub fn with_unicode_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }
}
