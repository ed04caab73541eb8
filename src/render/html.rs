//! HTML renderer implementation.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::crop::CroppedArtifact;
use crate::model::{
    Block, Document, ImageReference, Inline, InlineImage, ListType, Paragraph, Table, TextRun,
};

use super::options::RenderOptions;

/// Supplies the `src` of each image placeholder.
///
/// Called exactly once per placeholder, in document order.
pub trait ImageResolver {
    /// A data URI for the placeholder, or `None` when no artifact exists.
    fn resolve(&mut self, image: &ImageReference) -> Option<String>;
}

/// Resolves placeholders against the cropper's output by artifact name.
#[derive(Debug)]
pub struct ArtifactMap<'a> {
    artifacts: HashMap<&'a str, &'a CroppedArtifact>,
    missing: usize,
}

impl<'a> ArtifactMap<'a> {
    pub fn new(artifacts: &'a [(String, CroppedArtifact)]) -> Self {
        Self {
            artifacts: artifacts
                .iter()
                .map(|(name, artifact)| (name.as_str(), artifact))
                .collect(),
            missing: 0,
        }
    }

    /// Placeholders that had no artifact so far.
    pub fn missing(&self) -> usize {
        self.missing
    }
}

impl ImageResolver for ArtifactMap<'_> {
    fn resolve(&mut self, image: &ImageReference) -> Option<String> {
        let found = image
            .key
            .as_deref()
            .and_then(|name| self.artifacts.get(name));
        match found {
            Some(artifact) => Some(data_uri(artifact.mime_type, &artifact.bytes)),
            None => {
                self.missing += 1;
                None
            }
        }
    }
}

/// Encode bytes as a base64 `data:` URI.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Convert a Document to an HTML body fragment.
pub fn to_html<R: ImageResolver>(
    doc: &Document,
    resolver: &mut R,
    options: &RenderOptions,
) -> String {
    let mut writer = HtmlWriter {
        out: String::new(),
        resolver,
        options,
        lists: Vec::new(),
        unresolved: 0,
    };

    for block in &doc.blocks {
        match block {
            Block::Paragraph(para) => writer.block_paragraph(para),
            Block::Table(table) => {
                writer.close_lists();
                writer.table(table);
            }
        }
    }
    writer.close_lists();

    if writer.unresolved > 0 {
        warn!(
            "{} more image placeholders than produced artifacts",
            writer.unresolved
        );
    }
    writer.out
}

struct HtmlWriter<'w, R> {
    out: String,
    resolver: &'w mut R,
    options: &'w RenderOptions,
    /// Open list elements, outermost first; each has an open `<li>`
    lists: Vec<ListType>,
    unresolved: usize,
}

impl<R: ImageResolver> HtmlWriter<'_, R> {
    fn block_paragraph(&mut self, para: &Paragraph) {
        match &para.list_info {
            Some(info) => self.list_item(para, info.list_type, usize::from(info.level)),
            None => {
                self.close_lists();
                self.paragraph(para);
            }
        }
    }

    fn paragraph(&mut self, para: &Paragraph) {
        if para.is_empty() && !self.options.include_empty_paragraphs {
            return;
        }

        let tag = if para.heading.is_heading() {
            let level = para.heading.level().min(self.options.max_heading_level);
            format!("h{level}")
        } else {
            "p".to_string()
        };
        self.out.push_str(&format!("<{tag}>"));
        self.inlines(&para.content);
        self.out.push_str(&format!("</{tag}>\n"));
    }

    fn list_item(&mut self, para: &Paragraph, list_type: ListType, level: usize) {
        // Nesting deepens one level at a time
        let level = level.min(self.lists.len());

        while self.lists.len() > level + 1 {
            self.close_list();
        }
        if self.lists.len() == level + 1 && self.lists[level] != list_type {
            self.close_list();
        }

        if self.lists.len() == level + 1 {
            self.out.push_str("</li>\n");
        } else {
            self.out.push_str(list_tag(list_type).0);
            self.out.push('\n');
            self.lists.push(list_type);
        }

        self.out.push_str("<li>");
        self.inlines(&para.content);
    }

    fn close_list(&mut self) {
        if let Some(list_type) = self.lists.pop() {
            self.out.push_str("</li>\n");
            self.out.push_str(list_tag(list_type).1);
            self.out.push('\n');
        }
    }

    fn close_lists(&mut self) {
        while !self.lists.is_empty() {
            self.close_list();
        }
    }

    fn inlines(&mut self, content: &[Inline]) {
        for inline in content {
            match inline {
                Inline::Text(run) => {
                    let html = self.run(run);
                    self.out.push_str(&html);
                }
                Inline::Break => self.out.push_str("<br>"),
                Inline::Image(image) => self.image(image),
            }
        }
    }

    fn run(&self, run: &TextRun) -> String {
        let text = if self.options.normalize_unicode {
            run.text.nfc().collect::<String>()
        } else {
            run.text.clone()
        };
        let mut html = escape(&text);

        // Innermost first
        let style = &run.style;
        if style.superscript {
            html = format!("<sup>{html}</sup>");
        } else if style.subscript {
            html = format!("<sub>{html}</sub>");
        }
        if style.strikethrough {
            html = format!("<s>{html}</s>");
        }
        if style.underline {
            html = format!("<u>{html}</u>");
        }
        if style.italic {
            html = format!("<em>{html}</em>");
        }
        if style.bold {
            html = format!("<strong>{html}</strong>");
        }

        match run.hyperlink {
            Some(ref url) if is_safe_href(url) => {
                html = format!("<a href=\"{}\">{html}</a>", escape(url));
            }
            Some(ref url) => debug!("Dropping link with unsupported target: {}", url),
            None => {}
        }
        html
    }

    fn image(&mut self, image: &InlineImage) {
        let alt = image
            .alt_text
            .as_deref()
            .unwrap_or(self.options.default_alt_text.as_str());
        let src = match self.resolver.resolve(&image.reference) {
            Some(src) => src,
            None => {
                debug!(
                    "No artifact for image {}",
                    image
                        .reference
                        .key
                        .as_deref()
                        .unwrap_or(&image.reference.relationship_id)
                );
                self.unresolved += 1;
                String::new()
            }
        };
        self.out
            .push_str(&format!("<img src=\"{}\" alt=\"{}\">", src, escape(alt)));
    }

    fn table(&mut self, table: &Table) {
        let spans = row_spans(table);
        self.out.push_str("<table>\n");
        for (r, row) in table.rows.iter().enumerate() {
            self.out.push_str("<tr>");
            for (c, cell) in row.cells.iter().enumerate() {
                if cell.merged_continuation {
                    continue;
                }
                let tag = if row.is_header { "th" } else { "td" };
                let mut attrs = String::new();
                if cell.col_span > 1 {
                    attrs.push_str(&format!(" colspan=\"{}\"", cell.col_span));
                }
                if spans[r][c] > 1 {
                    attrs.push_str(&format!(" rowspan=\"{}\"", spans[r][c]));
                }
                self.out.push_str(&format!("<{tag}{attrs}>"));
                for para in &cell.content {
                    self.block_paragraph(para);
                }
                self.close_lists();
                self.out.push_str(&format!("</{tag}>"));
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</table>\n");
    }
}

fn list_tag(list_type: ListType) -> (&'static str, &'static str) {
    match list_type {
        ListType::Bullet => ("<ul>", "</ul>"),
        ListType::Numbered => ("<ol>", "</ol>"),
    }
}

/// Row span of every cell, from the vertical merges below it.
fn row_spans(table: &Table) -> Vec<Vec<usize>> {
    // Grid column where each cell starts
    let starts: Vec<Vec<u32>> = table
        .rows
        .iter()
        .map(|row| {
            let mut col = 0u32;
            row.cells
                .iter()
                .map(|cell| {
                    let start = col;
                    col = col.saturating_add(cell.col_span);
                    start
                })
                .collect()
        })
        .collect();

    table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    if cell.merged_continuation {
                        return 1;
                    }
                    let col = starts[r][c];
                    let continued = (r + 1..table.rows.len())
                        .take_while(|&below| {
                            table.rows[below]
                                .cells
                                .iter()
                                .zip(&starts[below])
                                .any(|(other, &start)| start == col && other.merged_continuation)
                        })
                        .count();
                    1 + continued
                })
                .collect()
        })
        .collect()
}

/// Link targets kept as `<a href>`: web and mail URLs, and in-document anchors.
fn is_safe_href(url: &str) -> bool {
    let url = url.trim_matches(|c: char| c.is_whitespace() || c.is_control());
    if url.starts_with('#') {
        return true;
    }
    let lower = url.to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Escape text for HTML content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
