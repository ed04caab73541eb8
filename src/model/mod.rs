//! Intermediate document model.
//!
//! The body parser turns `word/document.xml` into these structures and the
//! HTML renderer turns them into markup. Image placeholders carry their
//! [`ImageReference`] so the cropper and the renderer agree on artifact names.

mod document;
mod image;
mod paragraph;
mod table;

pub use document::*;
pub use image::*;
pub use paragraph::*;
pub use table::*;
