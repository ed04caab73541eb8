//! End-to-end conversion of one package.
//!
//! A [`ConversionJob`] walks a package through the stages of
//! [`JobStage`], owning a private temporary directory for the image
//! artifacts it produces. The directory lives as long as the returned
//! [`ConversionResult`] and is removed when either is dropped, including on
//! failure.

use crate::container::{Package, DOCUMENT_RELS_PART};
use crate::crop::{extract_images, CroppedArtifact, FallbackImage};
use crate::diagnostics::Diagnostics;
use crate::docx::DocxParser;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::relationships::{RelationshipTable, Relationships};
use crate::render::{assemble, to_html, ArtifactMap, RenderOptions};
use crate::storage::persist_atomic;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

/// Per-job configuration.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Substitute for Windows metafiles
    pub fallback_image: Option<FallbackImage>,
    /// Parent of job directories; the system temp dir when unset
    pub work_root: Option<PathBuf>,
    pub render: RenderOptions,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_image(mut self, image: FallbackImage) -> Self {
        self.fallback_image = Some(image);
        self
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

/// Progress of a job, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Received,
    Unpacked,
    ImagesExtracted,
    Rendered,
    Assembled,
    Persisted,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Received => "received",
            JobStage::Unpacked => "unpacked",
            JobStage::ImagesExtracted => "images extracted",
            JobStage::Rendered => "rendered",
            JobStage::Assembled => "assembled",
            JobStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// A job that stopped; `stage` is the last stage it completed.
#[derive(Error, Debug)]
#[error("conversion failed after stage '{stage}': {error}")]
pub struct JobFailure {
    pub stage: JobStage,
    #[source]
    pub error: Error,
}

impl JobFailure {
    /// Caller-facing description, see [`Error::user_message`].
    pub fn user_message(&self) -> &'static str {
        self.error.user_message()
    }
}

impl From<JobFailure> for Error {
    fn from(failure: JobFailure) -> Self {
        failure.error
    }
}

/// Everything a finished job produced.
#[derive(Debug)]
pub struct ConversionResult {
    artifacts: Vec<(String, CroppedArtifact)>,
    document: Document,
    body: String,
    html: String,
    diagnostics: Diagnostics,
    stage: JobStage,
    work_dir: TempDir,
}

impl ConversionResult {
    /// `(image name, artifact)` pairs in document order.
    pub fn artifacts(&self) -> &[(String, CroppedArtifact)] {
        &self.artifacts
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The rendered body fragment.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The assembled page.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    /// Job directory holding the artifacts until the result is dropped.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Copy every artifact into `dir`, returning the written paths.
    pub fn write_artifacts(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| Error::StorageWrite {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.artifacts.len());
        for (_, artifact) in &self.artifacts {
            let dest = dir.join(&artifact.file_name);
            persist_atomic(&artifact.bytes, &dest)?;
            written.push(dest);
        }
        Ok(written)
    }
}

/// One conversion request.
pub struct ConversionJob<'o> {
    options: &'o ConversionOptions,
    stage: JobStage,
    work_dir: TempDir,
}

impl<'o> ConversionJob<'o> {
    /// Accept a request, creating its job directory.
    pub fn new(options: &'o ConversionOptions) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("inlinedoc-");
        let work_dir = match &options.work_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        debug!("Job directory {}", work_dir.path().display());

        Ok(Self {
            options,
            stage: JobStage::Received,
            work_dir,
        })
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Convert a package up to the assembled page, without persisting it.
    pub fn run(self, bytes: Vec<u8>) -> std::result::Result<ConversionResult, JobFailure> {
        let mut job = self;
        match job.convert(bytes) {
            Ok(parts) => Ok(job.finish(parts)),
            Err(error) => Err(JobFailure {
                stage: job.stage,
                error,
            }),
        }
    }

    /// Convert a package and persist the page atomically at `dest`.
    pub fn run_to(
        self,
        bytes: Vec<u8>,
        dest: &Path,
    ) -> std::result::Result<ConversionResult, JobFailure> {
        let mut result = self.run(bytes)?;
        if let Err(error) = persist_atomic(result.html.as_bytes(), dest) {
            return Err(JobFailure {
                stage: result.stage,
                error,
            });
        }
        result.stage = JobStage::Persisted;
        info!("Wrote {}", dest.display());
        Ok(result)
    }

    fn advance(&mut self, stage: JobStage) {
        debug!("Job stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn convert(&mut self, bytes: Vec<u8>) -> Result<Parts> {
        let package = Package::open(bytes)?;
        let relationships = Relationships::parse(&package.read_part(DOCUMENT_RELS_PART)?)?;
        let media = RelationshipTable::from_relationships(&relationships);
        self.advance(JobStage::Unpacked);

        let document = DocxParser::from_package(&package, &relationships, &media).parse(&package)?;
        let references = document.image_references();
        let extraction = extract_images(
            &package,
            &media,
            &references,
            self.options.fallback_image.as_ref(),
            self.work_dir.path(),
        )?;
        self.advance(JobStage::ImagesExtracted);

        let mut diagnostics = extraction.diagnostics;
        let (body, missing) = {
            let mut resolver = ArtifactMap::new(&extraction.artifacts);
            let body = to_html(&document, &mut resolver, &self.options.render);
            (body, resolver.missing())
        };
        diagnostics.missing_artifacts = missing;
        self.advance(JobStage::Rendered);

        let html = assemble(&body, &document.metadata);
        self.advance(JobStage::Assembled);

        info!(
            "Converted document: {} images, {} artifacts, {} warnings",
            diagnostics.image_references,
            diagnostics.artifacts,
            diagnostics.warnings()
        );

        Ok(Parts {
            artifacts: extraction.artifacts,
            document,
            body,
            html,
            diagnostics,
        })
    }

    fn finish(self, parts: Parts) -> ConversionResult {
        ConversionResult {
            artifacts: parts.artifacts,
            document: parts.document,
            body: parts.body,
            html: parts.html,
            diagnostics: parts.diagnostics,
            stage: self.stage,
            work_dir: self.work_dir,
        }
    }
}

struct Parts {
    artifacts: Vec<(String, CroppedArtifact)>,
    document: Document,
    body: String,
    html: String,
    diagnostics: Diagnostics,
}

/// Convert package bytes without writing the page anywhere.
pub fn convert(
    bytes: Vec<u8>,
    options: &ConversionOptions,
) -> std::result::Result<ConversionResult, JobFailure> {
    let job = ConversionJob::new(options).map_err(|error| JobFailure {
        stage: JobStage::Received,
        error,
    })?;
    job.run(bytes)
}

/// Convert package bytes and persist the page at `dest`.
///
/// # Example
///
/// ```no_run
/// use inlinedoc::{convert_bytes, ConversionOptions};
///
/// let bytes = std::fs::read("bulletin.docx")?;
/// let result = convert_bytes(bytes, "bulletin.html".as_ref(), &ConversionOptions::new())?;
/// println!("{} images inlined", result.artifacts().len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_bytes(
    bytes: Vec<u8>,
    dest: &Path,
    options: &ConversionOptions,
) -> std::result::Result<ConversionResult, JobFailure> {
    let job = ConversionJob::new(options).map_err(|error| JobFailure {
        stage: JobStage::Received,
        error,
    })?;
    job.run_to(bytes, dest)
}

/// Read a package from disk and persist the page at `dest`.
pub fn convert_file(
    input: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: &ConversionOptions,
) -> std::result::Result<ConversionResult, JobFailure> {
    let bytes = std::fs::read(input.as_ref()).map_err(|e| JobFailure {
        stage: JobStage::Received,
        error: e.into(),
    })?;
    convert_bytes(bytes, dest.as_ref(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackageError;
    use crate::test_support::{picture, png, PackageBuilder};

    fn sample() -> Vec<u8> {
        PackageBuilder::new()
            .body(&format!(
                "<w:p><w:r><w:t>Bienvenue</w:t></w:r></w:p>{}",
                picture(
                    "rId4",
                    Some(r#"<a:srcRect l="10000" t="5000" r="10000" b="5000"/>"#),
                    true
                )
            ))
            .image_rel("rId4", "media/image1.png")
            .media("word/media/image1.png", png(100, 80))
            .part(
                "docProps/core.xml",
                r#"<cp:coreProperties xmlns:cp="cp" xmlns:dc="dc"><dc:title>Bulletin</dc:title></cp:coreProperties>"#,
            )
            .build()
    }

    #[test]
    fn test_job_stages() {
        let options = ConversionOptions::new();
        let job = ConversionJob::new(&options).unwrap();
        assert_eq!(job.stage(), JobStage::Received);
        assert!(job.work_dir().is_dir());

        let result = job.run(sample()).unwrap();
        assert_eq!(result.stage(), JobStage::Assembled);
        assert_eq!(result.artifacts().len(), 1);
        assert!(result.html().contains("<title>Bulletin</title>"));
        assert!(result.body().contains("<p>Bienvenue</p>"));
        assert!(result.body().contains("src=\"data:image/png;base64,"));
        assert!(result.diagnostics().is_clean());
    }

    #[test]
    fn test_convert_bytes_persists() {
        let out = TempDir::new().unwrap();
        let dest = out.path().join("bulletin.html");
        let result = convert_bytes(sample(), &dest, &ConversionOptions::new()).unwrap();

        assert_eq!(result.stage(), JobStage::Persisted);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), result.html());
    }

    #[test]
    fn test_failure_reports_stage() {
        let failure = convert(b"not a zip".to_vec(), &ConversionOptions::new()).unwrap_err();
        assert_eq!(failure.stage, JobStage::Received);
        assert!(matches!(
            failure.error,
            Error::Package(PackageError::NotAZip(_))
        ));
        assert_eq!(failure.user_message(), "invalid input document");

        let bytes = PackageBuilder::new().body("<w:p><w:r>").build();
        let failure = convert(bytes, &ConversionOptions::new()).unwrap_err();
        assert_eq!(failure.stage, JobStage::Unpacked);
        assert!(matches!(failure.error, Error::Conversion(_)));
    }

    #[test]
    fn test_malformed_styles_do_not_fail_the_job() {
        let bytes = PackageBuilder::new()
            .body("<w:p><w:r><w:t>hi</w:t></w:r></w:p>")
            .part("word/styles.xml", "<w:styles><w:style></w:styles>")
            .build();
        let result = convert(bytes, &ConversionOptions::new()).unwrap();
        assert_eq!(result.stage(), JobStage::Assembled);
        assert!(result.body().contains("<p>hi</p>"));
    }

    #[test]
    fn test_storage_failure_leaves_nothing() {
        let out = TempDir::new().unwrap();
        let dest = out.path().join("missing-dir").join("bulletin.html");
        let failure = convert_bytes(sample(), &dest, &ConversionOptions::new()).unwrap_err();

        assert_eq!(failure.stage, JobStage::Assembled);
        assert!(failure.error.is_retryable());
        assert!(!dest.exists());
    }

    #[test]
    fn test_work_dir_released() {
        let root = TempDir::new().unwrap();
        let options = ConversionOptions::new().with_work_root(root.path());

        let result = convert(sample(), &options).unwrap();
        let work_dir = result.work_dir().to_path_buf();
        assert!(work_dir.starts_with(root.path()));
        assert!(work_dir.join("image1_cropped.png").is_file());
        drop(result);
        assert!(!work_dir.exists());

        // Failed jobs clean up too
        let _ = convert(PackageBuilder::new().body("<w:p>").build(), &options).unwrap_err();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_artifacts() {
        let result = convert(sample(), &ConversionOptions::new()).unwrap();
        let out = TempDir::new().unwrap();
        let written = result.write_artifacts(out.path().join("images")).unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("image1_cropped.png"));
        assert_eq!(
            std::fs::read(&written[0]).unwrap(),
            result.artifacts()[0].1.bytes
        );
    }
}
