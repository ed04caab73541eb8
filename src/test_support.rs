//! In-memory package fixtures for unit tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub(crate) const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:v="urn:schemas-microsoft-com:vml""#
);

const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Wrap body content in a complete document part.
pub(crate) fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NAMESPACES}><w:body>{body}</w:body></w:document>"#
    )
}

/// A paragraph holding one inline picture.
pub(crate) fn picture(rel_id: &str, src_rect: Option<&str>, with_xfrm: bool) -> String {
    let src_rect = src_rect.unwrap_or("");
    let xfrm = if with_xfrm {
        r#"<a:xfrm><a:off x="0" y="0"/><a:ext cx="952500" cy="762000"/></a:xfrm>"#
    } else {
        ""
    };
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="952500" cy="762000"/><wp:docPr id="1" name="Picture 1" descr="photo {rel_id}"/><a:graphic><a:graphicData><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="p.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel_id}"/>{src_rect}<a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr>{xfrm}<a:prstGeom prst="rect"/></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    )
}

/// Encode a solid-color PNG of the given size.
pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Builder for small Word packages.
pub(crate) struct PackageBuilder {
    body: String,
    relationships: Vec<(String, String, String, bool)>,
    parts: Vec<(String, Vec<u8>)>,
    include_relationships: bool,
}

impl PackageBuilder {
    pub(crate) fn new() -> Self {
        Self {
            body: String::new(),
            relationships: Vec::new(),
            parts: Vec::new(),
            include_relationships: true,
        }
    }

    pub(crate) fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub(crate) fn image_rel(mut self, id: &str, target: &str) -> Self {
        self.relationships
            .push((id.to_string(), IMAGE_REL.to_string(), target.to_string(), false));
        self
    }

    pub(crate) fn rel(mut self, id: &str, rel_type: &str, target: &str, external: bool) -> Self {
        self.relationships
            .push((id.to_string(), rel_type.to_string(), target.to_string(), external));
        self
    }

    pub(crate) fn media(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.parts.push((path.to_string(), bytes));
        self
    }

    pub(crate) fn part(mut self, path: &str, content: &str) -> Self {
        self.parts.push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    pub(crate) fn without_relationships(mut self) -> Self {
        self.include_relationships = false;
        self
    }

    pub(crate) fn relationships_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, rel_type, target, external) in &self.relationships {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            xml.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"{mode}/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
                .unwrap();

            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(document_xml(&self.body).as_bytes()).unwrap();

            if self.include_relationships {
                zip.start_file("word/_rels/document.xml.rels", options).unwrap();
                zip.write_all(self.relationships_xml().as_bytes()).unwrap();
            }

            for (path, bytes) in &self.parts {
                zip.start_file(path.as_str(), options).unwrap();
                zip.write_all(bytes).unwrap();
            }

            zip.finish().unwrap();
        }
        buffer
    }
}
