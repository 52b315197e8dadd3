//! PPTX (Office Open XML) slide-deck extractor.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents,
//! collecting each slide's text and writing its embedded pictures.

pub mod extractor;
pub mod parser;

pub use extractor::PptxExtractor;
pub use parser::{PptxPackage, PptxParser, Shape};
