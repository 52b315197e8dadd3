//! Report assembly.
//!
//! [`assemble`] walks the catalog in order, skips missing files, and asks a
//! dispatch function for each document's [`ExtractionResult`]. [`Pipeline`]
//! is the usual dispatch: it routes by [`DocumentKind`] to a slide-deck or
//! page-document [`UnitExtractor`] and turns extractor errors into an error
//! line in the document's section.

use crate::{
    Catalog, DocumentDescriptor, DocumentKind, ImageDir, Progress, ProgressSink, ReportFormatter,
    Result, Unit, UnitKind,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Something that can split a document into units, writing images on the way.
pub trait UnitExtractor {
    /// The unit kind this extractor produces.
    fn unit_kind(&self) -> UnitKind;

    /// Extract every unit of the document at `path`.
    ///
    /// Per-image failures are reported to `sink` and skipped; an `Err`
    /// means the document as a whole could not be read.
    fn extract_units(
        &self,
        path: &Path,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Unit>>;
}

/// The outcome of extracting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Rendered unit blocks, or a single error line.
    pub text: String,

    /// Images written for this document.
    pub image_count: usize,
}

impl ExtractionResult {
    /// Render extracted units.
    pub fn from_units(kind: UnitKind, units: &[Unit], formatter: &ReportFormatter) -> Self {
        Self {
            text: formatter.format_units(kind, units),
            image_count: units.iter().map(|u| u.image_refs.len()).sum(),
        }
    }

    /// A document that could not be read at all.
    pub fn failed(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error extracting from {}: {}", path.display(), reason),
            image_count: 0,
        }
    }

    /// A document whose extension we do not handle.
    pub fn unknown(path: &Path) -> Self {
        Self {
            text: format!("Unknown file format: {}", path.display()),
            image_count: 0,
        }
    }
}

/// One document's contribution to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// The assembled report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Sections in catalog order.
    pub sections: Vec<Section>,

    /// Images written across all documents.
    pub total_images: usize,

    formatter: ReportFormatter,
}

impl Report {
    pub fn new(formatter: ReportFormatter) -> Self {
        Self {
            sections: Vec::new(),
            total_images: 0,
            formatter,
        }
    }

    fn push(&mut self, title: &str, result: ExtractionResult) {
        self.total_images += result.image_count;
        self.sections.push(Section {
            title: title.to_string(),
            body: result.text,
        });
    }

    /// The whole report as one buffer.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        for section in &self.sections {
            parts.extend(self.formatter.section_header(&section.title));
            parts.push(section.body.clone());
        }
        parts.join("\n")
    }

    /// Write the report, replacing any previous file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }
}

/// Assemble a report from `catalog`, calling `dispatch` for every document that exists.
///
/// `dispatch` receives the 1-based catalog position alongside the descriptor.
pub fn assemble<F>(
    catalog: &Catalog,
    formatter: &ReportFormatter,
    sink: &dyn ProgressSink,
    mut dispatch: F,
) -> Report
where
    F: FnMut(usize, &DocumentDescriptor) -> ExtractionResult,
{
    let mut report = Report::new(formatter.clone());

    for (index, descriptor) in catalog.iter() {
        if !descriptor.path.exists() {
            sink.emit(Progress::DocumentMissing {
                path: descriptor.path.clone(),
            });
            continue;
        }

        sink.emit(Progress::DocumentStarted {
            title: descriptor.title.clone(),
            path: descriptor.path.clone(),
        });

        let result = dispatch(index, descriptor);

        sink.emit(Progress::DocumentFinished {
            title: descriptor.title.clone(),
            images: result.image_count,
        });

        report.push(&descriptor.title, result);
    }

    report
}

/// Where the pipeline writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Report file path.
    pub output: PathBuf,

    /// Parent of the per-document image directories.
    pub image_root: PathBuf,

    /// Per-document directory prefix; entry N uses `<prefix><N>`.
    pub dir_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("report.txt"),
            image_root: PathBuf::from("images"),
            dir_prefix: "doc".to_string(),
        }
    }
}

/// Catalog-to-report pipeline with one extractor per document kind.
pub struct Pipeline {
    config: PipelineConfig,
    formatter: ReportFormatter,
    slide_deck: Box<dyn UnitExtractor>,
    page_document: Box<dyn UnitExtractor>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        slide_deck: impl UnitExtractor + 'static,
        page_document: impl UnitExtractor + 'static,
    ) -> Self {
        Self {
            config,
            formatter: ReportFormatter::new(),
            slide_deck: Box::new(slide_deck),
            page_document: Box::new(page_document),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract one document. Never fails; errors become the section body.
    pub fn extract_document(
        &self,
        index: usize,
        descriptor: &DocumentDescriptor,
        sink: &dyn ProgressSink,
    ) -> ExtractionResult {
        let extractor: &dyn UnitExtractor = match descriptor.kind {
            DocumentKind::SlideDeck => self.slide_deck.as_ref(),
            DocumentKind::PageDocument => self.page_document.as_ref(),
            DocumentKind::Unknown => return ExtractionResult::unknown(&descriptor.path),
        };

        let kind = extractor.unit_kind();
        let images = ImageDir::for_document(
            &self.config.image_root,
            &self.config.dir_prefix,
            index,
            kind,
        );

        let units = images
            .prepare()
            .and_then(|()| extractor.extract_units(&descriptor.path, &images, sink));

        match units {
            Ok(units) => ExtractionResult::from_units(kind, &units, &self.formatter),
            Err(e) => {
                sink.emit(Progress::DocumentFailed {
                    path: descriptor.path.clone(),
                    reason: e.to_string(),
                });
                ExtractionResult::failed(&descriptor.path, e)
            }
        }
    }

    /// Build the report in memory without writing it.
    pub fn assemble(&self, catalog: &Catalog, sink: &dyn ProgressSink) -> Report {
        assemble(catalog, &self.formatter, sink, |index, descriptor| {
            self.extract_document(index, descriptor, sink)
        })
    }

    /// Build the report and write it to the configured output path.
    pub fn run(&self, catalog: &Catalog, sink: &dyn ProgressSink) -> Result<Report> {
        let report = self.assemble(catalog, sink);
        report.write_to(&self.config.output)?;

        sink.emit(Progress::ReportWritten {
            path: self.config.output.clone(),
            sections: report.sections.len(),
            total_images: report.total_images,
        });

        Ok(report)
    }
}
