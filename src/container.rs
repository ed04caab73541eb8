//! ZIP package access for Word documents.

use crate::error::{PackageError, Result};
use crate::model::Metadata;
use std::cell::RefCell;
use std::io::{Cursor, Read};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Relationships part of the main document.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// After decoding UTF-16 into a Rust string the declaration still claims
/// UTF-16, which makes quick-xml reinterpret the text.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling UTF-8 (with or without BOM) and UTF-16 LE/BE.
pub fn decode_xml_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return fix_xml_encoding_declaration(&decode_utf16(rest, u16::from_le_bytes));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return fix_xml_encoding_declaration(&decode_utf16(rest, u16::from_be_bytes));
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // No BOM: ASCII in UTF-16 leaves null bytes at odd (LE) or even (BE) offsets
        Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => {
            fix_xml_encoding_declaration(&decode_utf16(bytes, u16::from_le_bytes))
        }
        Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => {
            fix_xml_encoding_declaration(&decode_utf16(bytes, u16::from_be_bytes))
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// An opened Word package.
///
/// Holds the archive for the duration of one conversion and only ever reads
/// from it.
pub struct Package {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl Package {
    /// Open a package from its raw bytes.
    ///
    /// Fails unless the bytes are a zip archive containing both the main
    /// document part and its relationships part.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use inlinedoc::Package;
    ///
    /// let bytes = std::fs::read("bulletin.docx")?;
    /// let package = Package::open(bytes)?;
    /// let body = package.read_part("word/document.xml")?;
    /// # Ok::<(), inlinedoc::Error>(())
    /// ```
    pub fn open(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| PackageError::NotAZip(e.to_string()))?;
        let package = Self {
            archive: RefCell::new(archive),
        };

        for required in [DOCUMENT_PART, DOCUMENT_RELS_PART] {
            if !package.exists(required) {
                return Err(PackageError::MissingPart(required.to_string()).into());
            }
        }

        Ok(package)
    }

    /// Read a part's raw bytes.
    pub fn read_part(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(name)
            .map_err(|_| PackageError::MissingPart(name.to_string()))?;
        // Declared entry sizes are untrusted
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read an XML part as a string, whatever its Unicode encoding.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        let bytes = self.read_part(name)?;
        Ok(decode_xml_bytes(&bytes))
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, name: &str) -> bool {
        self.archive.borrow().file_names().any(|n| n == name)
    }

    /// List all parts, sorted by name.
    pub fn list_parts(&self) -> Vec<String> {
        let mut parts: Vec<String> = self.archive.borrow().file_names().map(String::from).collect();
        parts.sort();
        parts
    }

    /// List parts whose name starts with `prefix`, sorted by name.
    pub fn list_parts_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.list_parts()
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .collect()
    }

    /// Parse core metadata from docProps/core.xml.
    ///
    /// The part is optional; anything unreadable yields empty metadata.
    pub fn core_metadata(&self) -> Metadata {
        let mut meta = Metadata::default();
        let Ok(xml) = self.read_xml("docProps/core.xml") else {
            return meta;
        };

        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_element: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => {
                    current_element =
                        Some(String::from_utf8_lossy(e.name().local_name().as_ref()).to_string());
                }
                Ok(quick_xml::events::Event::Text(e)) => {
                    if let Some(ref elem) = current_element {
                        let text = e.unescape().unwrap_or_default().to_string();
                        match elem.as_str() {
                            "title" => meta.title = Some(text),
                            "creator" => meta.author = Some(text),
                            "subject" => meta.subject = Some(text),
                            "description" => meta.description = Some(text),
                            "language" => meta.language = Some(text),
                            _ => {}
                        }
                    }
                }
                Ok(quick_xml::events::Event::End(_)) => current_element = None,
                Ok(quick_xml::events::Event::Eof) | Err(_) => break,
                _ => {}
            }
            buf.clear();
        }

        meta
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.archive.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_support::PackageBuilder;

    #[test]
    fn test_open_valid_package() {
        let bytes = PackageBuilder::new().body("<w:p/>").build();
        let package = Package::open(bytes).unwrap();
        assert!(package.exists(DOCUMENT_PART));
        assert!(package.exists(DOCUMENT_RELS_PART));
        assert!(!package.exists("word/styles.xml"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::open(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Package(PackageError::NotAZip(_))));
    }

    #[test]
    fn test_missing_relationships_part() {
        let bytes = PackageBuilder::new().without_relationships().build();
        let err = Package::open(bytes).unwrap_err();
        match err {
            Error::Package(PackageError::MissingPart(name)) => {
                assert_eq!(name, DOCUMENT_RELS_PART)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_missing_part() {
        let bytes = PackageBuilder::new().build();
        let package = Package::open(bytes).unwrap();
        let err = package.read_part("word/media/nope.png").unwrap_err();
        assert!(matches!(err, Error::Package(PackageError::MissingPart(_))));
    }

    #[test]
    fn test_list_parts_with_prefix() {
        let bytes = PackageBuilder::new()
            .media("word/media/image2.png", vec![1, 2, 3])
            .media("word/media/image1.png", vec![4])
            .build();
        let package = Package::open(bytes).unwrap();
        assert_eq!(
            package.list_parts_with_prefix("word/media/"),
            vec!["word/media/image1.png", "word/media/image2.png"]
        );
        assert_eq!(package.read_part("word/media/image2.png").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        let name = "word/media/big.png";
        let mut bytes = PackageBuilder::new().media(name, vec![7; 16]).build();

        // Claim a near-4GiB uncompressed size in the central directory entry
        let entry = bytes
            .windows(4)
            .enumerate()
            .filter(|(_, w)| *w == b"PK\x01\x02")
            .map(|(pos, _)| pos)
            .find(|&pos| bytes[pos + 46..].starts_with(name.as_bytes()))
            .unwrap();
        bytes[entry + 24..entry + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        let package = Package::open(bytes).unwrap();
        let data = package.read_part(name).unwrap();
        assert_eq!(data, vec![7; 16]);
        assert!(data.capacity() <= 64 * 1024);
    }

    #[test]
    fn test_core_metadata() {
        let bytes = PackageBuilder::new()
            .part(
                "docProps/core.xml",
                r#"<?xml version="1.0"?><cp:coreProperties xmlns:cp="c" xmlns:dc="d"><dc:title>Bulletin paroissial</dc:title><dc:creator>Secr&#233;tariat</dc:creator></cp:coreProperties>"#,
            )
            .build();
        let package = Package::open(bytes).unwrap();
        let meta = package.core_metadata();
        assert_eq!(meta.title.as_deref(), Some("Bulletin paroissial"));
        assert_eq!(meta.author.as_deref(), Some("Secrétariat"));
    }

    #[test]
    fn test_decode_xml_bytes() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom), "<?xml>");

        assert_eq!(decode_xml_bytes(b"<?xml>"), "<?xml>");
    }

    #[test]
    fn test_utf16_declaration_rewritten() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><a/>";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in xml.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_xml_bytes(&bytes);
        assert!(decoded.contains("encoding=\"UTF-8\""));
        assert!(decoded.ends_with("<a/>"));
    }
}
