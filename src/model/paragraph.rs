//! Paragraph and text run models.

use super::InlineImage;
use serde::Serialize;

/// Heading level (h1-h6 or none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    #[default]
    None,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// Create a heading level from a number (1-6).
    pub fn from_number(n: u8) -> Self {
        match n {
            1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            6 => HeadingLevel::H6,
            _ => HeadingLevel::None,
        }
    }

    /// Get the numeric level (0 for none, 1-6 for headings).
    pub fn level(&self) -> u8 {
        match self {
            HeadingLevel::None => 0,
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        }
    }

    pub fn is_heading(&self) -> bool {
        !matches!(self, HeadingLevel::None)
    }
}

/// List type for paragraphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    /// Unordered (bulleted) list
    #[default]
    Bullet,
    /// Ordered (numbered) list
    Numbered,
}

/// List membership of a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListInfo {
    /// Numbering instance (`w:numId`)
    pub num_id: String,
    pub list_type: ListType,
    /// Nesting level (0 = top level)
    pub level: u8,
}

/// Character formatting carried into HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub superscript: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub subscript: bool,
}

impl TextStyle {
    pub fn has_formatting(&self) -> bool {
        self.bold
            || self.italic
            || self.underline
            || self.strikethrough
            || self.superscript
            || self.subscript
    }
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,

    #[serde(skip_serializing_if = "is_default_style")]
    pub style: TextStyle,

    /// Hyperlink URL (if this run is a link)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

fn is_default_style(style: &TextStyle) -> bool {
    *style == TextStyle::default()
}

impl TextRun {
    /// Create a plain text run with no styling.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a styled text run.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            hyperlink: None,
        }
    }

    /// Same style and link target, so the two runs can be joined.
    fn continues(&self, other: &TextRun) -> bool {
        self.style == other.style && self.hyperlink == other.hyperlink
    }
}

/// Paragraph content in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inline {
    Text(TextRun),
    Image(InlineImage),
    Break,
}

/// A paragraph of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub content: Vec<Inline>,

    #[serde(skip_serializing_if = "HeadingLevel::is_none")]
    pub heading: HeadingLevel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_info: Option<ListInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
}

impl HeadingLevel {
    fn is_none(&self) -> bool {
        matches!(self, HeadingLevel::None)
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with the given text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Inline::Text(TextRun::plain(text))],
            ..Default::default()
        }
    }

    /// Append a text run, joining it to the previous run when formatting matches.
    ///
    /// Word splits text into many runs (spell-check marks, revision ids); joined
    /// runs keep the HTML free of repeated `<strong></strong>` pairs.
    pub fn push_run(&mut self, run: TextRun) {
        if run.text.is_empty() {
            return;
        }
        if let Some(Inline::Text(last)) = self.content.last_mut() {
            if last.continues(&run) {
                last.text.push_str(&run.text);
                return;
            }
        }
        self.content.push(Inline::Text(run));
    }

    pub fn push_image(&mut self, image: InlineImage) {
        self.content.push(Inline::Image(image));
    }

    pub fn push_break(&mut self) {
        self.content.push(Inline::Break);
    }

    /// Images in this paragraph, in order.
    pub fn images(&self) -> impl Iterator<Item = &InlineImage> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Image(image) => Some(image),
            _ => None,
        })
    }

    /// Get the plain text content.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|inline| match inline {
                Inline::Text(run) => run.text.as_str(),
                Inline::Break => "\n",
                Inline::Image(_) => "",
            })
            .collect()
    }

    /// No text and no images.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|inline| match inline {
            Inline::Text(run) => run.text.trim().is_empty(),
            Inline::Break => true,
            Inline::Image(_) => false,
        })
    }

    pub fn is_list_item(&self) -> bool {
        self.list_info.is_some()
    }
}
