//! Document model structures.

use super::{ImageReference, Paragraph, Table};
use serde::Serialize;

/// Document metadata from docProps/core.xml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Document language (e.g. "fr-FR")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A content block of the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// A parsed document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub metadata: Metadata,

    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// All paragraphs, including those inside table cells, in document order.
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(para) => out.push(para),
                Block::Table(table) => out.extend(table.paragraphs()),
            }
        }
        out
    }

    /// Every image reference in document order.
    pub fn image_references(&self) -> Vec<&ImageReference> {
        self.paragraphs()
            .into_iter()
            .flat_map(|para| para.images().map(|image| &image.reference))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Extract all text content as a single string.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(para) => text.push_str(&para.plain_text()),
                Block::Table(table) => text.push_str(&table.plain_text()),
            }
            text.push('\n');
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, InlineImage, Row};

    fn image_paragraph(rel_id: &str) -> Paragraph {
        let mut para = Paragraph::new();
        para.push_image(InlineImage {
            reference: ImageReference::new(rel_id),
            alt_text: None,
        });
        para
    }

    #[test]
    fn test_image_references_follow_document_order() {
        let mut doc = Document::new();
        doc.add_block(Block::Paragraph(image_paragraph("rId1")));

        let mut table = Table::new();
        table.add_row(Row {
            cells: vec![Cell {
                content: vec![image_paragraph("rId2")],
                ..Cell::new()
            }],
            is_header: false,
        });
        doc.add_block(Block::Table(table));
        doc.add_block(Block::Paragraph(image_paragraph("rId3")));

        let ids: Vec<&str> = doc
            .image_references()
            .iter()
            .map(|r| r.relationship_id.as_str())
            .collect();
        assert_eq!(ids, vec!["rId1", "rId2", "rId3"]);
    }

    #[test]
    fn test_plain_text_extraction() {
        let mut doc = Document::new();
        assert!(doc.is_empty());
        doc.add_block(Block::Paragraph(Paragraph::with_text("Horaires")));
        doc.add_block(Block::Paragraph(Paragraph::with_text("des messes")));
        assert_eq!(doc.plain_text(), "Horaires\ndes messes");
    }

    #[test]
    fn test_metadata_serialization() {
        let meta = Metadata {
            title: Some("Bulletin".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("Bulletin"));
        assert!(!json.contains("subject"));
    }
}
