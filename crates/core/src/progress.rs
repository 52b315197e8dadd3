//! Progress and diagnostics sink.
//!
//! Extraction code never logs progress directly; it reports [`Progress`]
//! events to whatever [`ProgressSink`] the caller hands in.

use crate::UnitKind;
use std::cell::RefCell;
use std::path::PathBuf;

/// A line-oriented status event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A document is about to be extracted.
    DocumentStarted { title: String, path: PathBuf },

    /// A document finished (successfully or not) with this many images.
    DocumentFinished { title: String, images: usize },

    /// A catalog entry points at a file that does not exist.
    DocumentMissing { path: PathBuf },

    /// The whole document could not be read.
    DocumentFailed { path: PathBuf, reason: String },

    /// One image could not be extracted or written.
    ImageFailed {
        unit_kind: UnitKind,
        unit: usize,
        sequence: usize,
        reason: String,
    },

    /// Text extraction failed for one unit; the placeholder is used instead.
    TextUnavailable {
        unit_kind: UnitKind,
        unit: usize,
        reason: String,
    },

    /// The report file has been written.
    ReportWritten {
        path: PathBuf,
        sections: usize,
        total_images: usize,
    },
}

/// Receives progress events.
pub trait ProgressSink {
    fn emit(&self, event: Progress);
}

/// Forwards progress events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: Progress) {
        match event {
            Progress::DocumentStarted { title, path } => {
                log::info!("Extracting {} ({})...", title, path.display());
            }
            Progress::DocumentFinished { title, images } => {
                log::info!("  {}: extracted {} images", title, images);
            }
            Progress::DocumentMissing { path } => {
                log::warn!("{} not found, skipping...", path.display());
            }
            Progress::DocumentFailed { path, reason } => {
                log::error!("Error extracting from {}: {}", path.display(), reason);
            }
            Progress::ImageFailed {
                unit_kind,
                unit,
                sequence,
                reason,
            } => {
                log::error!(
                    "Error extracting image {} from {} {}: {}",
                    sequence,
                    unit_kind.noun(),
                    unit,
                    reason
                );
            }
            Progress::TextUnavailable {
                unit_kind,
                unit,
                reason,
            } => {
                log::warn!("No text from {} {}: {}", unit_kind.noun(), unit, reason);
            }
            Progress::ReportWritten {
                path,
                sections,
                total_images,
            } => {
                log::info!(
                    "Wrote {} sections to {} ({} images total)",
                    sections,
                    path.display(),
                    total_images
                );
            }
        }
    }
}

/// Records events in memory. Useful in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<Progress>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Progress> {
        self.events.borrow().clone()
    }

    /// Number of image failures seen.
    pub fn image_failures(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Progress::ImageFailed { .. }))
            .count()
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, event: Progress) {
        self.events.borrow_mut().push(event);
    }
}
