//! inlinedoc CLI - Word documents to self-contained HTML
//!
//! Converts DOCX files into a single HTML page with cropped, inlined images.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use inlinedoc::container::DOCUMENT_RELS_PART;
use inlinedoc::docx::DocxParser;
use inlinedoc::render::RenderOptions;
use inlinedoc::{
    ConversionOptions, ConversionResult, DirectorySink, Document, FallbackImage, MediaFormat,
    Package, RelationshipTable, Relationships, StorageSink,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Word documents to self-contained HTML
#[derive(Parser)]
#[command(
    name = "inlinedoc",
    author = "iyulab",
    version,
    about = "Convert Word documents to self-contained HTML",
    long_about = "inlinedoc - Word documents to self-contained HTML.\n\n\
                  Pictures are cropped the way Word displays them and embedded \
                  as data URIs, so the page needs no other files."
)]
struct Cli {
    /// Show debug logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to a standalone HTML page
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: input with .html extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image used in place of WMF/EMF pictures
        #[arg(long)]
        fallback_image: Option<PathBuf>,

        /// Parent directory for the temporary job directory
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Also archive the page into this directory
        #[arg(long)]
        archive_dir: Option<PathBuf>,

        /// Alt text for pictures without a description
        #[arg(long, default_value = "")]
        default_alt: String,

        /// Print conversion diagnostics as JSON to stdout
        #[arg(long)]
        report: bool,
    },

    /// Show relationships and pictures of a document
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// Write the processed images of a document to a directory
    Extract {
        /// Input file path
        input: PathBuf,

        /// Output directory for images
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Image used in place of WMF/EMF pictures
        #[arg(long)]
        fallback_image: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            fallback_image,
            work_dir,
            archive_dir,
            default_alt,
            report,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("html"));
            let mut options = conversion_options(fallback_image.as_deref())?
                .with_render_options(RenderOptions::new().with_default_alt_text(default_alt));
            if let Some(dir) = work_dir {
                options = options.with_work_root(dir);
            }

            let pb = create_spinner("Converting document...");
            let result = inlinedoc::convert_file(&input, &output, &options);
            pb.finish_and_clear();

            let result = match result {
                Ok(result) => result,
                Err(failure) => {
                    return Err(format!("{} ({})", failure.user_message(), failure).into())
                }
            };

            if let Some(dir) = archive_dir {
                let name = output
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document.html".to_string());
                DirectorySink::new(&dir).store(&output, &name)?;
                println!(
                    "{} Archived to {}",
                    "✓".green().bold(),
                    dir.join(&name).display()
                );
            }

            if report {
                println!("{}", serde_json::to_string_pretty(result.diagnostics())?);
            } else {
                print_summary(&result, &output);
            }
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing document...");
            let analyzed = analyze(&input);
            pb.finish_and_clear();
            let (doc, media) = analyzed?;

            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            if let Some(ref title) = doc.metadata.title {
                println!("{}: {}", "Title".bold(), title);
            }
            if let Some(ref author) = doc.metadata.author {
                println!("{}: {}", "Author".bold(), author);
            }
            if let Some(ref language) = doc.metadata.language {
                println!("{}: {}", "Language".bold(), language);
            }

            println!("\n{}", "Media Relationships".cyan().bold());
            println!("{}", "─".repeat(40));
            for (id, path) in media.iter() {
                println!("{:>8}  {}  {:?}", id, path, MediaFormat::classify(path));
            }

            let references = doc.image_references();
            println!("\n{} ({})", "Pictures".cyan().bold(), references.len());
            println!("{}", "─".repeat(40));
            for reference in references {
                let crop = reference
                    .crop
                    .map(|c| format!("l={} r={} t={} b={}", c.l, c.r, c.t, c.b))
                    .unwrap_or_else(|| "-".to_string());
                let extent = reference
                    .transform
                    .map(|t| format!("{}x{} EMU", t.cx, t.cy))
                    .unwrap_or_else(|| "-".to_string());
                let name = reference
                    .key
                    .as_deref()
                    .map(|k| k.normal())
                    .unwrap_or_else(|| "(dangling)".yellow());
                println!(
                    "{:>8}  {}  crop: {}  extent: {}",
                    reference.relationship_id, name, crop, extent
                );
            }
        }

        Commands::Extract {
            input,
            output,
            fallback_image,
        } => {
            let options = conversion_options(fallback_image.as_deref())?;

            let pb = create_spinner("Extracting images...");
            let extracted = extract(&input, &output, &options);
            pb.finish_and_clear();
            let written = extracted?;

            if written.is_empty() {
                println!("{} No images found in document", "!".yellow().bold());
            } else {
                println!(
                    "{} Extracted {} images to {}",
                    "✓".green().bold(),
                    written.len(),
                    output.display()
                );
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn conversion_options(
    fallback_image: Option<&Path>,
) -> Result<ConversionOptions, Box<dyn std::error::Error>> {
    let mut options = ConversionOptions::new();
    if let Some(path) = fallback_image {
        options = options.with_fallback_image(FallbackImage::from_path(path)?);
    }
    Ok(options)
}

fn print_summary(result: &ConversionResult, output: &Path) {
    let diagnostics = result.diagnostics();
    println!(
        "{} Converted to HTML: {} ({} images)",
        "✓".green().bold(),
        output.display(),
        result.artifacts().len()
    );
    if diagnostics.warnings() > 0 {
        println!(
            "{} {} warnings (run with --report for details)",
            "!".yellow().bold(),
            diagnostics.warnings()
        );
    }
}

fn print_version() {
    println!("{} {}", "inlinedoc".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Word documents to self-contained HTML with cropped, inlined images");
}

/// Parse a package and its media table for `info`.
fn analyze(input: &Path) -> Result<(Document, RelationshipTable), Box<dyn std::error::Error>> {
    let package = Package::open(std::fs::read(input)?)?;
    let relationships = Relationships::parse(&package.read_part(DOCUMENT_RELS_PART)?)?;
    let media = RelationshipTable::from_relationships(&relationships);
    let doc = DocxParser::from_package(&package, &relationships, &media).parse(&package)?;
    Ok((doc, media))
}

fn extract(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let result = inlinedoc::convert(bytes, options)?;
    Ok(result.write_artifacts(output)?)
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
