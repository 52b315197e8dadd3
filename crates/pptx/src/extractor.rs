//! Slide-deck extractor.

use crate::parser::{ParsedSlide, PptxPackage, PptxParser, Shape};
use digest_core::{
    Error, ExtractedImage, ImageDir, Progress, ProgressSink, Result, Unit, UnitExtractor,
    UnitKind,
};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Extracts slide text and pictures from .pptx files.
#[derive(Default)]
pub struct PptxExtractor {
    parser: PptxParser,
}

impl PptxExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every slide from an already-open reader.
    pub fn extract_from<R: Read + Seek>(
        &self,
        reader: R,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Unit>> {
        let mut package = self.parser.open(reader)?;
        let mut units = Vec::with_capacity(package.slide_count());

        for index in 0..package.slide_count() {
            let slide = package.slide(index)?;
            units.push(self.extract_slide(&mut package, &slide, images, sink));
        }

        Ok(units)
    }

    fn extract_slide<R: Read + Seek>(
        &self,
        package: &mut PptxPackage<R>,
        slide: &ParsedSlide,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Unit {
        let mut unit = Unit::new(slide.number);
        let mut sequence = 0;

        for shape in &slide.shapes {
            match shape {
                Shape::Text(text) => unit.add_text(text),
                Shape::Picture { embed } => {
                    // Numbering advances on failure too, so names stay stable.
                    sequence += 1;
                    match save_picture(package, slide, embed.as_deref(), sequence, images) {
                        Ok(reference) => unit.add_image_ref(reference),
                        Err(e) => sink.emit(Progress::ImageFailed {
                            unit_kind: UnitKind::Slide,
                            unit: slide.number,
                            sequence,
                            reason: e.to_string(),
                        }),
                    }
                }
            }
        }

        log::debug!(
            "Slide {}: {} text shapes, {} images",
            slide.number,
            unit.text.len(),
            unit.image_refs.len()
        );
        unit
    }
}

/// Read one picture's bytes and write them to the image directory.
fn save_picture<R: Read + Seek>(
    package: &mut PptxPackage<R>,
    slide: &ParsedSlide,
    embed: Option<&str>,
    sequence: usize,
    images: &ImageDir,
) -> Result<String> {
    let rel_id = embed.ok_or_else(|| {
        Error::PptxParseError("Picture has no embedded image reference".to_string())
    })?;

    let media = package.read_media(slide, rel_id)?;
    let image = ExtractedImage::new(slide.number, sequence, media.bytes, media.extension);
    let file_name = images.persist(&image)?;

    Ok(images.reference(&file_name))
}

impl UnitExtractor for PptxExtractor {
    fn unit_kind(&self) -> UnitKind {
        UnitKind::Slide
    }

    fn extract_units(
        &self,
        path: &Path,
        images: &ImageDir,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Unit>> {
        let file = File::open(path)?;
        self.extract_from(BufReader::new(file), images, sink)
    }
}
