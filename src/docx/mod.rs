//! DOCX body parsing.
//!
//! Turns `word/document.xml` into the [`Document`](crate::model::Document)
//! model. Styles and numbering are consulted for headings and lists; every
//! picture becomes an image placeholder carrying its crop geometry.

mod names;
mod numbering;
mod parser;
mod styles;

pub use names::ArtifactNamer;
pub use numbering::NumberingMap;
pub use parser::DocxParser;
pub use styles::{RunProps, Style, StyleMap};

use quick_xml::events::BytesStart;

/// Unescaped value of an attribute, looked up by qualified name.
pub(crate) fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// OOXML on/off property: absent `w:val` means on.
pub(crate) fn bool_attr(e: &BytesStart) -> bool {
    !matches!(
        attr_value(e, b"w:val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}
