//! Error types for the inlinedoc library.
//!
//! Fatal errors abort a conversion and are returned as [`Error`]. Problems
//! confined to a single image never abort anything; they are described by
//! [`ImageDecodeFailure`] and [`GeometryIssue`] and recovered by the cropper.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for inlinedoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Problems with the input package itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    /// The bytes are not a readable zip archive.
    #[error("input is not a zip archive: {0}")]
    NotAZip(String),

    /// A required part is absent from the archive.
    #[error("missing package part: {0}")]
    MissingPart(String),

    /// The document relationships part could not be parsed.
    #[error("malformed relationships part: {0}")]
    MalformedRelationships(String),
}

/// Errors that abort a conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input package is invalid.
    #[error(transparent)]
    Package(#[from] PackageError),

    /// The document body could not be converted.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Error parsing an auxiliary XML part (styles, numbering).
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Error encoding an image artifact.
    #[error("image error: {0}")]
    Image(String),

    /// Writing the output document failed. Nothing was left at `path`.
    #[error("failed to write '{}': {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Caller-facing description of the failure class.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Package(_) => "invalid input document",
            Error::Conversion(_) | Error::XmlParse(_) => "unprocessable document",
            Error::StorageWrite { .. } => "could not store the converted document",
            Error::Io(_) | Error::Image(_) => "internal conversion failure",
        }
    }

    /// Whether retrying the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageWrite { .. })
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Package(PackageError::NotAZip(err.to_string()))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

/// A raster image whose bytes could not be decoded.
///
/// Recovered by passing the original bytes through unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not decode '{path}': {reason}")]
pub struct ImageDecodeFailure {
    pub path: String,
    pub reason: String,
}

/// Why a decoded image was not cropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryIssue {
    /// The reference lacks a crop box, a size transform, or both.
    #[error("crop box or size transform missing")]
    Missing,

    /// The crop box collapses to an empty rectangle.
    #[error("crop box yields an empty rectangle")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Package(PackageError::MissingPart("word/document.xml".into()));
        assert_eq!(err.to_string(), "missing package part: word/document.xml");

        let err = Error::Conversion("unexpected end".to_string());
        assert_eq!(err.to_string(), "conversion error: unexpected end");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_user_messages() {
        let err: Error = PackageError::NotAZip("bad".into()).into();
        assert_eq!(err.user_message(), "invalid input document");
        assert!(!err.is_retryable());

        let err = Error::Conversion("bad".into());
        assert_eq!(err.user_message(), "unprocessable document");

        let err = Error::StorageWrite {
            path: PathBuf::from("/tmp/out.html"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_retryable());
    }
}
