//! Image extraction and cropping.
//!
//! Every image placeholder of the body is turned into at most one artifact:
//! the picture cropped the way Word displays it, the original bytes when
//! cropping does not apply, or the configured fallback image for Windows
//! metafiles. Artifacts are written into the job directory and returned in
//! document order.

use crate::container::Package;
use crate::diagnostics::Diagnostics;
use crate::docx::ArtifactNamer;
use crate::error::{Error, GeometryIssue, ImageDecodeFailure, PackageError, Result};
use crate::media::{self, MediaFormat};
use crate::model::{CropBox, ImageReference};
use crate::relationships::RelationshipTable;
use image::DynamicImage;
use rayon::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stand-in image used for Windows metafiles.
#[derive(Clone, PartialEq, Eq)]
pub struct FallbackImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FallbackImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Load the fallback image from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "fallback.png".to_string());
        Ok(Self { file_name, bytes })
    }
}

impl fmt::Debug for FallbackImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackImage")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// How an artifact relates to the media part it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Re-encoded after applying the crop box
    Cropped,
    /// The media bytes, unmodified
    PassThrough,
    /// The configured fallback image
    Fallback,
}

/// One processed image, persisted in the job directory.
#[derive(Clone, PartialEq, Eq)]
pub struct CroppedArtifact {
    pub kind: ArtifactKind,
    /// File name inside the job directory
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub path: PathBuf,
}

impl fmt::Debug for CroppedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CroppedArtifact")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("path", &self.path)
            .finish()
    }
}

/// Output of [`extract_images`].
#[derive(Debug, Default)]
pub struct Extraction {
    /// `(image name, artifact)` in document order
    pub artifacts: Vec<(String, CroppedArtifact)>,
    pub diagnostics: Diagnostics,
}

/// A reference whose media bytes were read from the package.
struct Job<'r> {
    name: String,
    path: String,
    bytes: Vec<u8>,
    format: MediaFormat,
    reference: &'r ImageReference,
}

/// Why a reference produced no artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Dangling,
    Unrecognized,
}

/// What was recovered along the way to an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Note {
    DecodeFailure(ImageDecodeFailure),
    Geometry(GeometryIssue),
    LegacyFallback,
    LegacyWithoutFallback,
}

/// An artifact before it is written to the job directory.
struct Produced {
    name: String,
    kind: ArtifactKind,
    file_name: String,
    bytes: Vec<u8>,
    note: Option<Note>,
}

enum Outcome {
    Produced(Produced),
    Skipped(Skip),
}

/// Process every image reference into an artifact inside `out_dir`.
///
/// References are handled on rayon's pool; the returned list follows the
/// order of `references`. Per-image problems are counted in the returned
/// diagnostics and never fail the call.
pub fn extract_images(
    package: &Package,
    media: &RelationshipTable,
    references: &[&ImageReference],
    fallback: Option<&FallbackImage>,
    out_dir: &Path,
) -> Result<Extraction> {
    // The archive reader is single-threaded; only decoding fans out
    let mut prepared = Vec::with_capacity(references.len());
    for reference in references {
        prepared.push(read_media(package, media, reference)?);
    }

    let outcomes: Vec<Outcome> = prepared
        .into_par_iter()
        .map(|job| match job {
            Ok(job) => process(job, fallback),
            Err(skip) => Outcome::Skipped(skip),
        })
        .collect();

    let mut extraction = Extraction {
        diagnostics: Diagnostics {
            image_references: references.len(),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut files = ArtifactNamer::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Skipped(Skip::Dangling) => extraction.diagnostics.dangling_references += 1,
            Outcome::Skipped(Skip::Unrecognized) => extraction.diagnostics.unrecognized_media += 1,
            Outcome::Produced(produced) => {
                record(&mut extraction.diagnostics, produced.note.as_ref());
                let file_name = files.assign(&produced.file_name);
                let path = out_dir.join(&file_name);
                std::fs::write(&path, &produced.bytes).map_err(|source| Error::StorageWrite {
                    path: path.clone(),
                    source,
                })?;
                debug!("Stored {:?} artifact {}", produced.kind, path.display());

                let artifact = CroppedArtifact {
                    kind: produced.kind,
                    mime_type: media::mime_from_filename(&file_name),
                    file_name,
                    bytes: produced.bytes,
                    path,
                };
                extraction.artifacts.push((produced.name, artifact));
            }
        }
    }
    extraction.diagnostics.artifacts = extraction.artifacts.len();

    Ok(extraction)
}

fn read_media<'r>(
    package: &Package,
    media: &RelationshipTable,
    reference: &'r ImageReference,
) -> Result<std::result::Result<Job<'r>, Skip>> {
    let id = &reference.relationship_id;
    let (Some(name), Some(path)) = (reference.key.as_ref(), media.resolve(id)) else {
        debug!("Relationship {} does not resolve to a media part", id);
        return Ok(Err(Skip::Dangling));
    };

    let bytes = match package.read_part(path) {
        Ok(bytes) => bytes,
        Err(Error::Package(PackageError::MissingPart(_))) => {
            debug!("Relationship {} targets missing part {}", id, path);
            return Ok(Err(Skip::Dangling));
        }
        Err(e) => return Err(e),
    };

    Ok(Ok(Job {
        name: name.clone(),
        path: path.to_string(),
        bytes,
        format: MediaFormat::classify(path),
        reference,
    }))
}

fn process(job: Job<'_>, fallback: Option<&FallbackImage>) -> Outcome {
    match job.format {
        MediaFormat::LegacyVector => legacy_vector(job, fallback),
        MediaFormat::Raster => raster(job),
        MediaFormat::Unrecognized => {
            debug!("Skipping unrecognized media {}", job.path);
            Outcome::Skipped(Skip::Unrecognized)
        }
    }
}

/// Metafiles are always replaced by the fallback image when one is configured.
fn legacy_vector(job: Job<'_>, fallback: Option<&FallbackImage>) -> Outcome {
    let Some(fallback) = fallback else {
        debug!("No fallback image configured for {}", job.path);
        return pass_through(job, Some(Note::LegacyWithoutFallback));
    };

    let file_name = match media::extension(&fallback.file_name) {
        Some(ext) => format!("{}.{}", media::stem(&job.name), ext),
        None => media::stem(&job.name).to_string(),
    };
    Outcome::Produced(Produced {
        name: job.name,
        kind: ArtifactKind::Fallback,
        file_name,
        bytes: fallback.bytes.clone(),
        note: Some(Note::LegacyFallback),
    })
}

fn raster(job: Job<'_>) -> Outcome {
    let img = match image::load_from_memory(&job.bytes) {
        Ok(img) => img,
        Err(e) => {
            let failure = ImageDecodeFailure {
                path: job.path.clone(),
                reason: e.to_string(),
            };
            warn!("{}; passing original bytes through", failure);
            return pass_through(job, Some(Note::DecodeFailure(failure)));
        }
    };

    let crop = match (job.reference.crop, job.reference.transform) {
        (Some(crop), Some(_)) => crop,
        _ => {
            debug!("{}: {}", job.path, GeometryIssue::Missing);
            return pass_through(job, Some(Note::Geometry(GeometryIssue::Missing)));
        }
    };

    match crop_image(&img, crop, &job.name) {
        Ok(Some((file_name, bytes))) => Outcome::Produced(Produced {
            name: job.name,
            kind: ArtifactKind::Cropped,
            file_name,
            bytes,
            note: None,
        }),
        Ok(None) => pass_through(job, None),
        Err(issue) => {
            debug!("{}: {}", job.path, issue);
            pass_through(job, Some(Note::Geometry(issue)))
        }
    }
}

/// Apply a crop box; `Ok(None)` for an identity crop.
fn crop_image(
    img: &DynamicImage,
    crop: CropBox,
    name: &str,
) -> std::result::Result<Option<(String, Vec<u8>)>, GeometryIssue> {
    let (width, height) = (img.width(), img.height());
    let rect = crop.pixel_rect(width, height).ok_or(GeometryIssue::Empty)?;
    if rect.is_full(width, height) {
        return Ok(None);
    }

    let cropped = img.crop_imm(rect.x1, rect.y1, rect.width(), rect.height());
    let stem = media::stem(name);

    if let Some(format) = media::encoder_format(name) {
        if let Some(bytes) = encode(&cropped, format) {
            let ext = media::extension(name).unwrap_or("png");
            return Ok(Some((format!("{stem}_cropped.{ext}"), bytes)));
        }
    }
    match encode(&cropped, image::ImageFormat::Png) {
        Some(bytes) => Ok(Some((format!("{stem}_cropped.png"), bytes))),
        // Encoding a freshly decoded buffer as PNG does not fail in practice
        None => Err(GeometryIssue::Empty),
    }
}

fn encode(img: &DynamicImage, format: image::ImageFormat) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let result = match format {
        // JPEG has no alpha channel
        image::ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format),
        _ => img.write_to(&mut Cursor::new(&mut buf), format),
    };
    match result {
        Ok(()) => Some(buf),
        Err(e) => {
            debug!("Encoding as {:?} failed: {}", format, e);
            None
        }
    }
}

fn pass_through(job: Job<'_>, note: Option<Note>) -> Outcome {
    Outcome::Produced(Produced {
        file_name: job.name.clone(),
        name: job.name,
        kind: ArtifactKind::PassThrough,
        bytes: job.bytes,
        note,
    })
}

fn record(diagnostics: &mut Diagnostics, note: Option<&Note>) {
    match note {
        Some(Note::DecodeFailure(_)) => diagnostics.decode_failures += 1,
        Some(Note::Geometry(GeometryIssue::Missing)) => diagnostics.missing_geometry += 1,
        Some(Note::Geometry(GeometryIssue::Empty)) => diagnostics.invalid_geometry += 1,
        Some(Note::LegacyFallback) => diagnostics.legacy_fallbacks += 1,
        Some(Note::LegacyWithoutFallback) => diagnostics.legacy_without_fallback += 1,
        None => {}
    }
}
