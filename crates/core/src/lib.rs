//! Core domain types, catalog, image storage, and report assembly for
//! turning slide decks and page documents into a single text digest.

pub mod catalog;
pub mod error;
pub mod images;
pub mod layout;
pub mod progress;
pub mod report;
pub mod types;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use images::ImageDir;
pub use layout::ReportFormatter;
pub use progress::{LogSink, MemorySink, Progress, ProgressSink};
pub use report::{
    assemble, ExtractionResult, Pipeline, PipelineConfig, Report, Section, UnitExtractor,
};
pub use types::{DocumentDescriptor, DocumentKind, ExtractedImage, Unit, UnitKind};
