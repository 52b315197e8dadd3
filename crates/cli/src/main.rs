//! CLI tool for digesting slide decks and PDFs into a single text report.

use anyhow::{Context, Result};
use clap::Parser;
use digest_core::{Catalog, LogSink, Pipeline, PipelineConfig};
use digest_pdf::PdfExtractor;
use digest_pptx::PptxExtractor;
use std::path::PathBuf;

/// Extract text and images from .pptx and .pdf files into one report.
#[derive(Parser, Debug)]
#[command(name = "doc-digest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input files, processed in the order given (titled by file name)
    #[arg(required_unless_present = "catalog", conflicts_with = "catalog")]
    input: Vec<PathBuf>,

    /// JSON catalog of documents with display titles
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Report file to write (overwritten on each run)
    #[arg(short, long, default_value = "report.txt")]
    output: PathBuf,

    /// Directory that receives one image folder per document
    #[arg(short, long, default_value = "images")]
    images: PathBuf,

    /// Prefix for per-document image folders (entry N uses <prefix><N>)
    #[arg(long, default_value = "doc")]
    dir_prefix: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::from_paths(args.input.iter().cloned()),
    };
    log::debug!("Catalog has {} documents", catalog.len());

    let config = PipelineConfig {
        output: args.output,
        image_root: args.images,
        dir_prefix: args.dir_prefix,
    };
    let pipeline = Pipeline::new(config, PptxExtractor::new(), PdfExtractor::new());

    let report = pipeline
        .run(&catalog, &LogSink)
        .with_context(|| format!("Failed to write {}", pipeline.config().output.display()))?;

    log::info!("Content extracted successfully!");
    log::info!("  - Text saved to: {}", pipeline.config().output.display());
    log::info!("  - Total images extracted: {}", report.total_images);
    log::info!(
        "  - Images saved in: {}/",
        pipeline.config().image_root.display()
    );

    Ok(())
}
