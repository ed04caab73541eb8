//! Synthetic Word packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// A raster picture with optional crop insets and placement.
pub struct Picture<'a> {
    pub rel_id: &'a str,
    pub src_rect: Option<(i64, i64, i64, i64)>,
    pub with_xfrm: bool,
    pub alt: &'a str,
}

impl Picture<'_> {
    pub fn xml(&self) -> String {
        let src_rect = self
            .src_rect
            .map(|(l, r, t, b)| format!(r#"<a:srcRect l="{l}" r="{r}" t="{t}" b="{b}"/>"#))
            .unwrap_or_default();
        let xfrm = if self.with_xfrm {
            r#"<a:xfrm><a:off x="0" y="0"/><a:ext cx="1905000" cy="1524000"/></a:xfrm>"#
        } else {
            ""
        };
        format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="1905000" cy="1524000"/>"#,
                r#"<wp:docPr id="1" name="Image" descr="{alt}"/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="image"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel_id}"/>{src_rect}<a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
            ),
            alt = self.alt,
            rel_id = self.rel_id,
            src_rect = src_rect,
            xfrm = xfrm,
        )
    }
}

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// PNG with a distinct color per pixel position.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 251) as u8, (y % 241) as u8, ((x + y) % 7) as u8 * 30, 255])
    });
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Builder for complete `.docx` packages.
#[derive(Default)]
pub struct Docx {
    body: String,
    rels: Vec<(String, String)>,
    media: Vec<(String, Vec<u8>)>,
    title: Option<String>,
}

impl Docx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Add `word/media/<name>` with an image relationship `id`.
    pub fn image(mut self, id: &str, name: &str, bytes: Vec<u8>) -> Self {
        self.rels.push((id.to_string(), format!("media/{name}")));
        self.media.push((format!("word/media/{name}"), bytes));
        self
    }

    /// Relationship to a media part that is not in the package.
    pub fn broken_image(mut self, id: &str, name: &str) -> Self {
        self.rels.push((id.to_string(), format!("media/{name}")));
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
        )
        .unwrap();

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
        )
        .unwrap();

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        for (id, target) in &self.rels {
            rels.push_str(&format!(
                r#"
  <Relationship Id="{id}" Type="{IMAGE_REL}" Target="{target}"/>"#
            ));
        }
        rels.push_str("\n</Relationships>");
        zip.start_file("word/_rels/document.xml.rels", options)
            .unwrap();
        zip.write_all(rels.as_bytes()).unwrap();

        let document = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<w:body>{}<w:sectPr/></w:body></w:document>"#
            ),
            self.body
        );
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();

        if let Some(title) = &self.title {
            zip.start_file("docProps/core.xml", options).unwrap();
            zip.write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{title}</dc:title></cp:coreProperties>"#
                )
                .as_bytes(),
            )
            .unwrap();
        }

        for (path, bytes) in &self.media {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(bytes).unwrap();
        }

        zip.finish().unwrap();
        buffer
    }
}
