//! DOCX styles parsing.
//!
//! Only what the HTML output needs: heading levels of paragraph styles and
//! bold/italic of character styles, with `w:basedOn` inheritance.

use super::{attr_value, bool_attr};
use crate::error::{Error, Result};
use crate::model::{HeadingLevel, TextStyle};
use std::collections::HashMap;

/// A parsed style definition.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Style name (e.g., "heading 1")
    pub name: String,
    pub based_on: Option<String>,
    /// Outline level from `w:pPr/w:outlineLvl` (0 = top)
    pub outline_level: Option<u8>,
    pub run_props: RunProps,
}

/// Run-level properties declared by a style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProps {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
}

impl RunProps {
    /// Merge with another RunProps (other takes precedence).
    pub fn merge(&mut self, other: &RunProps) {
        self.bold = other.bold.or(self.bold);
        self.italic = other.italic.or(self.italic);
        self.underline = other.underline.or(self.underline);
        self.strike = other.strike.or(self.strike);
    }

    /// Apply the declared properties on top of a run style.
    pub fn apply_to(&self, style: &mut TextStyle) {
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(italic) = self.italic {
            style.italic = italic;
        }
        if let Some(underline) = self.underline {
            style.underline = underline;
        }
        if let Some(strike) = self.strike {
            style.strikethrough = strike;
        }
    }
}

/// Collection of styles from styles.xml.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    pub styles: HashMap<String, Style>,
}

impl StyleMap {
    /// Parse styles from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut map = StyleMap::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current: Option<Style> = None;
        let mut in_ppr = false;
        let mut in_rpr = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"w:style" => {
                        current = Some(Style {
                            id: attr_value(&e, b"w:styleId").unwrap_or_default(),
                            ..Default::default()
                        });
                    }
                    b"w:pPr" if current.is_some() => in_ppr = true,
                    b"w:rPr" if current.is_some() => in_rpr = true,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(e)) => {
                    if let Some(style) = current.as_mut() {
                        match e.name().as_ref() {
                            b"w:name" => {
                                style.name = attr_value(&e, b"w:val").unwrap_or_default()
                            }
                            b"w:basedOn" => style.based_on = attr_value(&e, b"w:val"),
                            b"w:outlineLvl" if in_ppr => {
                                style.outline_level =
                                    attr_value(&e, b"w:val").and_then(|v| v.parse().ok());
                            }
                            b"w:b" if in_rpr => style.run_props.bold = Some(bool_attr(&e)),
                            b"w:i" if in_rpr => style.run_props.italic = Some(bool_attr(&e)),
                            b"w:strike" if in_rpr => {
                                style.run_props.strike = Some(bool_attr(&e))
                            }
                            b"w:u" if in_rpr => {
                                style.run_props.underline =
                                    Some(attr_value(&e, b"w:val").as_deref() != Some("none"));
                            }
                            _ => {}
                        }
                    }
                }
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"w:style" => {
                        if let Some(style) = current.take() {
                            if !style.id.is_empty() {
                                map.styles.insert(style.id.clone(), style);
                            }
                        }
                    }
                    b"w:pPr" => in_ppr = false,
                    b"w:rPr" => in_rpr = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Get a style by ID, resolving inheritance.
    pub fn get_resolved(&self, id: &str) -> Option<Style> {
        let mut style = self.styles.get(id)?.clone();

        // basedOn chains are short; the bound guards against cycles
        let mut depth = 0;
        let mut current_based_on = style.based_on.clone();
        while let Some(ref base_id) = current_based_on {
            if depth > 10 {
                break;
            }
            let Some(base) = self.styles.get(base_id) else {
                break;
            };
            let mut merged_run = base.run_props.clone();
            merged_run.merge(&style.run_props);
            style.run_props = merged_run;

            if style.outline_level.is_none() {
                style.outline_level = base.outline_level;
            }

            current_based_on = base.based_on.clone();
            depth += 1;
        }

        Some(style)
    }

    /// Get the heading level for a paragraph style ID.
    pub fn heading_level(&self, style_id: &str) -> HeadingLevel {
        let Some(style) = self.get_resolved(style_id) else {
            return heading_from_name(style_id);
        };
        if let Some(level) = style.outline_level {
            return HeadingLevel::from_number(level.saturating_add(1));
        }
        heading_from_name(&style.name)
    }

    /// Run properties of a character style.
    pub fn run_props(&self, style_id: &str) -> Option<RunProps> {
        self.get_resolved(style_id).map(|style| style.run_props)
    }
}

/// Heading level from built-in style names ("heading 2", "Heading2", "Title").
fn heading_from_name(name: &str) -> HeadingLevel {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "title" => HeadingLevel::H1,
        "subtitle" => HeadingLevel::H2,
        _ => lower
            .strip_prefix("heading")
            .map(str::trim)
            .and_then(|n| n.parse::<u8>().ok())
            .map(HeadingLevel::from_number)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Titre1">
    <w:name w:val="heading 1"/>
    <w:pPr><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Sous-titre">
    <w:name w:val="Subtitle"/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Annonce">
    <w:name w:val="Annonce"/>
    <w:basedOn w:val="Titre1"/>
    <w:rPr><w:i/><w:b w:val="0"/></w:rPr>
  </w:style>
  <w:style w:type="character" w:styleId="Accentuation">
    <w:name w:val="Emphasis"/>
    <w:rPr><w:i/></w:rPr>
  </w:style>
</w:styles>"#;

    #[test]
    fn test_heading_levels() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.heading_level("Titre1"), HeadingLevel::H1);
        assert_eq!(map.heading_level("Sous-titre"), HeadingLevel::H2);
        // Inherits the outline level of its base style
        assert_eq!(map.heading_level("Annonce"), HeadingLevel::H1);
        assert_eq!(map.heading_level("Normal"), HeadingLevel::None);
        // Styles missing from styles.xml fall back to built-in ids
        assert_eq!(map.heading_level("Heading3"), HeadingLevel::H3);
    }

    #[test]
    fn test_run_props_inheritance() {
        let map = StyleMap::parse(STYLES).unwrap();
        let props = map.run_props("Annonce").unwrap();
        assert_eq!(props.bold, Some(false));
        assert_eq!(props.italic, Some(true));

        let mut style = TextStyle::default();
        map.run_props("Accentuation").unwrap().apply_to(&mut style);
        assert!(style.italic);
        assert!(!style.bold);
    }

    #[test]
    fn test_empty_styles() {
        let map = StyleMap::parse("  ").unwrap();
        assert!(map.styles.is_empty());
    }
}
