//! # inlinedoc
//!
//! Word documents to self-contained HTML.
//!
//! A `.docx` package is converted into a single HTML page whose pictures
//! are cropped the way Word displays them and embedded as base64 `data:`
//! URIs, so the page renders with no other files around it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inlinedoc::{convert_file, ConversionOptions, FallbackImage};
//!
//! let options = ConversionOptions::new()
//!     .with_fallback_image(FallbackImage::from_path("logo.png")?);
//!
//! let result = convert_file("bulletin.docx", "bulletin.html", &options)?;
//! println!("{} images, {} warnings",
//!     result.artifacts().len(),
//!     result.diagnostics().warnings());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipeline
//!
//! - [`Package`] opens the zip container and reads parts.
//! - [`RelationshipTable`] maps relationship ids to media parts.
//! - [`docx::DocxParser`] walks the body into a [`Document`], recording every
//!   picture with its crop geometry.
//! - [`crop::extract_images`] produces one artifact per picture.
//! - [`render::to_html`] and [`render::assemble`] build the page, and
//!   [`storage::persist_atomic`] writes it.
//!
//! [`ConversionJob`] drives these steps for one request.

pub mod container;
pub mod crop;
pub mod diagnostics;
pub mod docx;
pub mod error;
pub mod media;
pub mod model;
pub mod pipeline;
pub mod relationships;
pub mod render;
pub mod storage;

#[cfg(test)]
mod test_support;

// Re-exports
pub use container::Package;
pub use crop::{ArtifactKind, CroppedArtifact, FallbackImage};
pub use diagnostics::Diagnostics;
pub use error::{Error, GeometryIssue, ImageDecodeFailure, PackageError, Result};
pub use media::{MediaEntry, MediaFormat};
pub use model::{
    Block, Cell, CropBox, CropRect, Document, HeadingLevel, ImageReference, Inline, InlineImage,
    ListInfo, ListType, Metadata, Paragraph, Row, SizeTransform, Table, TextRun, TextStyle,
};
pub use pipeline::{
    convert, convert_bytes, convert_file, ConversionJob, ConversionOptions, ConversionResult,
    JobFailure, JobStage,
};
pub use relationships::{Relationship, RelationshipTable, Relationships};
pub use render::RenderOptions;
pub use storage::{persist_atomic, DirectorySink, StorageSink};

/// Parse a package into the document model without processing images.
///
/// # Example
///
/// ```no_run
/// use inlinedoc::parse_bytes;
///
/// let data = std::fs::read("bulletin.docx")?;
/// let doc = parse_bytes(data)?;
/// println!("{} pictures", doc.image_references().len());
/// # Ok::<(), inlinedoc::Error>(())
/// ```
pub fn parse_bytes(data: Vec<u8>) -> Result<Document> {
    let package = Package::open(data)?;
    let relationships =
        Relationships::parse(&package.read_part(container::DOCUMENT_RELS_PART)?)?;
    let media = RelationshipTable::from_relationships(&relationships);
    docx::DocxParser::from_package(&package, &relationships, &media).parse(&package)
}
