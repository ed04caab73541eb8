//! Output rendering for documents.
//!
//! [`to_html`] turns a [`Document`](crate::model::Document) into an HTML body
//! fragment, asking an [`ImageResolver`] for the source of every picture.
//! [`assemble`] wraps the fragment into a page that renders offline.
//!
//! # Example
//!
//! ```
//! use inlinedoc::model::{Block, Document, Paragraph};
//! use inlinedoc::render::{assemble, to_html, ArtifactMap, RenderOptions};
//!
//! let mut doc = Document::new();
//! doc.add_block(Block::Paragraph(Paragraph::with_text("Bonjour")));
//!
//! let mut images = ArtifactMap::new(&[]);
//! let body = to_html(&doc, &mut images, &RenderOptions::default());
//! let page = assemble(&body, &doc.metadata);
//! assert!(page.contains("<p>Bonjour</p>"));
//! ```

mod html;
mod options;
mod template;

pub use html::{data_uri, escape, to_html, ArtifactMap, ImageResolver};
pub use options::RenderOptions;
pub use template::{assemble, DEFAULT_TITLE};
