//! Page-document extractor.

use crate::raster::ImageSamples;
use digest_core::{
    Error, ExtractedImage, ImageDir, Progress, ProgressSink, Result, Unit, UnitExtractor,
    UnitKind,
};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::path::Path;

/// Extracts page text and images from .pdf files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every page of an in-memory PDF.
    pub fn extract_from_bytes(
        &self,
        bytes: &[u8],
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Unit>> {
        let document = Document::load_mem(bytes)
            .map_err(|e| Error::PdfParseError(format!("Failed to load PDF: {}", e)))?;
        Ok(self.extract_document(&document, images, sink))
    }

    /// Extract every page of a loaded document.
    pub fn extract_document(
        &self,
        document: &Document,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Vec<Unit> {
        let pages = document.get_pages();
        log::debug!("Found {} pages", pages.len());

        pages
            .into_iter()
            .enumerate()
            .map(|(index, (page_number, page_id))| {
                let mut unit = Unit::new(index + 1);
                self.collect_text(document, page_number, &mut unit, sink);
                self.collect_images(document, page_id, &mut unit, images, sink);
                unit
            })
            .collect()
    }

    fn collect_text(
        &self,
        document: &Document,
        page_number: u32,
        unit: &mut Unit,
        sink: &dyn ProgressSink,
    ) {
        match document.extract_text(&[page_number]) {
            Ok(text) => unit.add_text(text),
            Err(e) => sink.emit(Progress::TextUnavailable {
                unit_kind: UnitKind::Page,
                unit: unit.number,
                reason: e.to_string(),
            }),
        }
    }

    fn collect_images(
        &self,
        document: &Document,
        page_id: ObjectId,
        unit: &mut Unit,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) {
        let xobjects = match page_xobjects(document, page_id) {
            Ok(Some(xobjects)) => xobjects,
            Ok(None) => return,
            Err(e) => {
                log::warn!("Cannot read images on page {}: {}", unit.number, e);
                return;
            }
        };

        let mut sequence = 0;
        for (name, value) in xobjects.iter() {
            let stream = match image_stream(document, value) {
                Ok(Some(stream)) => Ok(stream),
                Ok(None) => {
                    log::debug!("Skipping non-image XObject {}", String::from_utf8_lossy(name));
                    continue;
                }
                Err(e) => Err(e),
            };
            sequence += 1;

            let saved = stream
                .and_then(|stream| ImageSamples::from_stream(document, stream))
                .and_then(|samples| samples.to_png())
                .and_then(|png| {
                    let image = ExtractedImage::new(unit.number, sequence, png, "png");
                    images.persist(&image)
                });

            match saved {
                Ok(file_name) => unit.add_image_ref(images.reference(&file_name)),
                Err(e) => sink.emit(Progress::ImageFailed {
                    unit_kind: UnitKind::Page,
                    unit: unit.number,
                    sequence,
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// The page's XObject dictionary, honoring Resources inherited from the page tree.
fn page_xobjects(document: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>> {
    let mut seen = HashSet::new();
    let mut node_id = page_id;

    let resources = loop {
        if !seen.insert(node_id) {
            return Err(Error::PdfParseError(format!(
                "Page tree cycle at object {} {}",
                node_id.0, node_id.1
            )));
        }
        let node = document
            .get_dictionary(node_id)
            .map_err(|e| Error::PdfParseError(e.to_string()))?;
        if let Ok(resources) = document.get_dict_in_dict(node, b"Resources") {
            break resources;
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node_id = parent,
            Err(_) => return Ok(None),
        }
    };

    match document.get_dict_in_dict(resources, b"XObject") {
        Ok(xobjects) => Ok(Some(xobjects)),
        Err(lopdf::Error::DictKey(_)) => Ok(None),
        Err(e) => Err(Error::PdfParseError(e.to_string())),
    }
}

/// Resolve one XObject entry; `None` for forms and other non-image kinds.
fn image_stream<'d>(document: &'d Document, value: &'d Object) -> Result<Option<&'d Stream>> {
    let (_, object) = document
        .dereference(value)
        .map_err(|e| Error::ImageError(format!("Unresolvable XObject: {}", e)))?;
    let stream = object
        .as_stream()
        .map_err(|_| Error::ImageError("XObject is not a stream".to_string()))?;

    match stream.dict.get(b"Subtype").and_then(Object::as_name) {
        Ok(b"Image") => Ok(Some(stream)),
        Ok(_) => Ok(None),
        Err(_) => Err(Error::ImageError("XObject has no /Subtype".to_string())),
    }
}

impl UnitExtractor for PdfExtractor {
    fn unit_kind(&self) -> UnitKind {
        UnitKind::Page
    }

    fn extract_units(
        &self,
        path: &Path,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Unit>> {
        let document = Document::load(path)
            .map_err(|e| Error::PdfParseError(format!("Failed to load PDF: {}", e)))?;
        Ok(self.extract_document(&document, images, sink))
    }
}
