//! PDF page-document extractor.
//!
//! Walks pages in order, pulling page text with lopdf and re-encoding each
//! image XObject reachable from the page (including Resources inherited from
//! the page tree) as PNG.

pub mod extractor;
pub mod raster;

pub use extractor::PdfExtractor;
pub use raster::{ColorSpace, ImageSamples, SampleFilter};
