//! Relationship parsing and the media relationship table.

use crate::container::{decode_xml_bytes, DOCUMENT_PART};
use crate::error::{PackageError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};

/// A relationship entry from a .rels part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target as written in the part
    pub target: String,
    /// Whether the target is external (`TargetMode="External"`)
    pub external: bool,
}

/// All relationships of the main document part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    /// Parse a relationships part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let content = decode_xml_bytes(bytes);
        let malformed = |reason: String| PackageError::MalformedRelationships(reason);

        let mut rels = Relationships::default();
        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut saw_root = false;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationships" =>
                {
                    saw_root = true;
                }
                Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };

                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| malformed(err.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|err| malformed(err.to_string()))?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }

                    if !rel.id.is_empty() {
                        rels.by_id.insert(rel.id.clone(), rel);
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(malformed(e.to_string()).into()),
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(malformed("no Relationships element".to_string()).into());
        }

        Ok(rels)
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Target URL of an external hyperlink relationship.
    pub fn hyperlink(&self, id: &str) -> Option<&str> {
        self.get(id)
            .filter(|rel| rel.external || rel.rel_type.ends_with("/hyperlink"))
            .map(|rel| rel.target.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Relationship id to media part path, for the main document.
///
/// Only internal targets that resolve under a `media/` directory are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipTable {
    media: BTreeMap<String, String>,
}

impl RelationshipTable {
    /// Build the table from raw relationships XML.
    ///
    /// # Example
    ///
    /// ```
    /// use inlinedoc::RelationshipTable;
    ///
    /// let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    ///   <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
    ///   <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
    /// </Relationships>"#;
    /// let table = RelationshipTable::build(xml)?;
    /// assert_eq!(table.resolve("rId4"), Some("word/media/image1.png"));
    /// assert_eq!(table.resolve("rId5"), None);
    /// # Ok::<(), inlinedoc::Error>(())
    /// ```
    pub fn build(rels_bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_relationships(&Relationships::parse(rels_bytes)?))
    }

    /// Keep the media entries of an already parsed relationship set.
    pub fn from_relationships(rels: &Relationships) -> Self {
        let media = rels
            .by_id
            .values()
            .filter(|rel| !rel.external)
            .filter_map(|rel| {
                let path = resolve_path(DOCUMENT_PART, &rel.target);
                is_media_path(&path).then(|| (rel.id.clone(), path))
            })
            .collect();
        Self { media }
    }

    /// Look up the media path for a relationship id.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.media.get(id).map(String::as_str)
    }

    /// File name of the media part behind a relationship id.
    pub fn basename(&self, id: &str) -> Option<&str> {
        self.resolve(id).map(basename)
    }

    /// Entries sorted by relationship id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.media.iter().map(|(id, path)| (id.as_str(), path.as_str()))
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Last path segment of a part name.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_media_path(path: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    segments.contains(&"media")
}

/// Resolve a relationship target relative to the part that owns it.
pub fn resolve_path(base: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        return stripped.to_string();
    }

    let base_dir = Path::new(base).parent().unwrap_or(Path::new(""));

    let mut result = base_dir.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(c) => result.push(c),
            _ => {}
        }
    }

    result.to_string_lossy().replace('\\', "/")
}
