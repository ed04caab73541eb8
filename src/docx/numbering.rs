//! DOCX numbering (list) parsing.

use super::attr_value;
use crate::error::{Error, Result};
use crate::model::ListType;
use std::collections::HashMap;

/// Number formats of each level of one abstract numbering definition.
#[derive(Debug, Clone, Default)]
struct AbstractNum {
    formats: HashMap<u8, String>,
}

/// List definitions from numbering.xml.
#[derive(Debug, Clone, Default)]
pub struct NumberingMap {
    abstract_nums: HashMap<String, AbstractNum>,
    /// `w:numId` -> `w:abstractNumId`
    instances: HashMap<String, String>,
}

impl NumberingMap {
    /// Parse numbering from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut map = NumberingMap::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_abstract: Option<(String, AbstractNum)> = None;
        let mut current_level: Option<u8> = None;
        let mut current_num: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => {
                        let id = attr_value(&e, b"w:abstractNumId").unwrap_or_default();
                        current_abstract = Some((id, AbstractNum::default()));
                    }
                    b"w:lvl" if current_abstract.is_some() => {
                        current_level = attr_value(&e, b"w:ilvl").and_then(|v| v.parse().ok());
                    }
                    b"w:num" => current_num = attr_value(&e, b"w:numId"),
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(e)) => match e.name().as_ref() {
                    b"w:numFmt" => {
                        if let (Some((_, abs)), Some(level)) =
                            (current_abstract.as_mut(), current_level)
                        {
                            if let Some(fmt) = attr_value(&e, b"w:val") {
                                abs.formats.insert(level, fmt);
                            }
                        }
                    }
                    b"w:abstractNumId" => {
                        if let (Some(num_id), Some(abs_id)) =
                            (current_num.as_ref(), attr_value(&e, b"w:val"))
                        {
                            map.instances.insert(num_id.clone(), abs_id);
                        }
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => {
                        if let Some((id, abs)) = current_abstract.take() {
                            map.abstract_nums.insert(id, abs);
                        }
                    }
                    b"w:lvl" => current_level = None,
                    b"w:num" => current_num = None,
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

    /// List type of a numbering instance at a level.
    ///
    /// Returns `None` for `w:numId="0"` (numbering removed) and unknown ids.
    pub fn list_type(&self, num_id: &str, level: u8) -> Option<ListType> {
        if num_id == "0" {
            return None;
        }
        let abstract_id = self.instances.get(num_id)?;
        let format = self
            .abstract_nums
            .get(abstract_id)
            .and_then(|abs| abs.formats.get(&level));
        Some(match format.map(String::as_str) {
            Some("bullet") | Some("none") | None => ListType::Bullet,
            Some(_) => ListType::Numbered,
        })
    }
}
