//! Media part classification.

use serde::Serialize;

/// How a media part is handled, decided by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Bitmap formats that can be decoded and cropped
    Raster,
    /// Windows metafiles; replaced by the configured fallback image
    LegacyVector,
    /// Anything else; produces no artifact
    Unrecognized,
}

const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];
const LEGACY_VECTOR_EXTENSIONS: &[&str] = &["wmf", "emf"];

impl MediaFormat {
    /// Classify a part name by extension (case-insensitive).
    pub fn classify(path: &str) -> Self {
        let Some(ext) = extension(path) else {
            return MediaFormat::Unrecognized;
        };
        let ext = ext.to_ascii_lowercase();
        if RASTER_EXTENSIONS.contains(&ext.as_str()) {
            MediaFormat::Raster
        } else if LEGACY_VECTOR_EXTENSIONS.contains(&ext.as_str()) {
            MediaFormat::LegacyVector
        } else {
            MediaFormat::Unrecognized
        }
    }
}

/// A media part read from the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Package path (e.g. "word/media/image1.png")
    pub path: String,
    pub bytes: Vec<u8>,
    pub format: MediaFormat,
}

impl MediaEntry {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let format = MediaFormat::classify(&path);
        Self {
            path,
            bytes,
            format,
        }
    }
}

/// Extension of a file name, without the dot.
pub fn extension(name: &str) -> Option<&str> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = file.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

/// File name without its extension.
pub fn stem(name: &str) -> &str {
    let file = name.rsplit('/').next().unwrap_or(name);
    match extension(file) {
        Some(ext) => &file[..file.len() - ext.len() - 1],
        None => file,
    }
}

/// MIME type for an image file name.
pub fn mime_from_filename(filename: &str) -> &'static str {
    let ext = extension(filename).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("wmf") => "image/x-wmf",
        Some("emf") => "image/x-emf",
        _ => "application/octet-stream",
    }
}

/// `image` crate format able to encode a re-cropped file with this name.
pub fn encoder_format(filename: &str) -> Option<image::ImageFormat> {
    let ext = extension(filename)?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(image::ImageFormat::Png),
        "jpg" | "jpeg" => Some(image::ImageFormat::Jpeg),
        "gif" => Some(image::ImageFormat::Gif),
        "bmp" => Some(image::ImageFormat::Bmp),
        "tif" | "tiff" => Some(image::ImageFormat::Tiff),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(MediaFormat::classify("word/media/image1.png"), MediaFormat::Raster);
        assert_eq!(MediaFormat::classify("word/media/image1.JPEG"), MediaFormat::Raster);
        assert_eq!(MediaFormat::classify("word/media/image2.wmf"), MediaFormat::LegacyVector);
        assert_eq!(MediaFormat::classify("word/media/image3.EMF"), MediaFormat::LegacyVector);
        assert_eq!(MediaFormat::classify("word/media/image4.svg"), MediaFormat::Unrecognized);
        assert_eq!(MediaFormat::classify("word/media/video.mp4"), MediaFormat::Unrecognized);
        assert_eq!(MediaFormat::classify("word/media/noext"), MediaFormat::Unrecognized);
    }

    #[test]
    fn test_name_helpers() {
        assert_eq!(extension("word/media/image1.png"), Some("png"));
        assert_eq!(extension(".hidden"), None);
        assert_eq!(stem("word/media/image1.png"), "image1");
        assert_eq!(stem("archive.tar.gz"), "archive.tar");
        assert_eq!(stem("noext"), "noext");
    }

    #[test]
    fn test_mime_from_filename() {
        assert_eq!(mime_from_filename("image1_cropped.png"), "image/png");
        assert_eq!(mime_from_filename("photo.JPG"), "image/jpeg");
        assert_eq!(mime_from_filename("logo.wmf"), "image/x-wmf");
        assert_eq!(mime_from_filename("blob"), "application/octet-stream");
    }

    #[test]
    fn test_encoder_format() {
        assert_eq!(encoder_format("a.jpeg"), Some(image::ImageFormat::Jpeg));
        assert_eq!(encoder_format("a.webp"), None);
    }

    #[test]
    fn test_media_entry_classifies() {
        let entry = MediaEntry::new("word/media/image9.gif", vec![0]);
        assert_eq!(entry.format, MediaFormat::Raster);
    }
}
