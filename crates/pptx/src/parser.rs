//! PPTX archive parser.
//!
//! Reads slide order, per-slide shapes, and relationship targets out of the
//! OOXML package. Image bytes are read lazily, one picture at a time, so a
//! broken media part only affects that picture.

use digest_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open a PPTX package and resolve its slide order.
    pub fn open<R: Read + Seek>(&self, reader: R) -> Result<PptxPackage<R>> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut package = PptxPackage {
            archive,
            slide_paths: Vec::new(),
        };
        package.slide_paths = package.slide_order()?;
        log::debug!("Found {} slides", package.slide_paths.len());

        Ok(package)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// An opened PPTX package.
pub struct PptxPackage<R> {
    archive: ZipArchive<R>,
    slide_paths: Vec<String>,
}

/// A shape on a slide, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A text-bearing shape; paragraphs are joined with newlines.
    Text(String),
    /// A picture; `embed` is the relationship id of its image, if any.
    Picture { embed: Option<String> },
}

/// A relationship from one package part to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Archive path of the target, resolved against the source part.
    pub target: String,
    /// Whether the target lives outside the package.
    pub external: bool,
}

/// One parsed slide.
#[derive(Debug, Clone)]
pub struct ParsedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Archive path of the slide part.
    pub part: String,

    /// Shapes in document order.
    pub shapes: Vec<Shape>,

    relationships: HashMap<String, Relationship>,
}

impl ParsedSlide {
    /// Look up a relationship declared by this slide.
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }
}

/// Raw bytes of a media part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    pub bytes: Vec<u8>,
    /// Lower-case file extension, `jpeg` normalized to `jpg`.
    pub extension: String,
}

impl<R: Read + Seek> PptxPackage<R> {
    /// Number of slides in presentation order.
    pub fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    /// Parse the slide at `index` (0-based).
    pub fn slide(&mut self, index: usize) -> Result<ParsedSlide> {
        let part = self
            .slide_paths
            .get(index)
            .cloned()
            .ok_or_else(|| Error::PptxParseError(format!("No slide at index {}", index)))?;

        let content = self.read_text(&part)?;
        let shapes = extract_shapes_from_xml(&content)?;

        let relationships = match self.read_text(&rels_path_for(&part)) {
            Ok(rels) => parse_relationships(&rels, part_dir(&part))?
                .into_iter()
                .map(|rel| (rel.id.clone(), rel))
                .collect(),
            Err(e) => {
                log::debug!("No relationships for {}: {}", part, e);
                HashMap::new()
            }
        };

        Ok(ParsedSlide {
            number: index + 1,
            part,
            shapes,
            relationships,
        })
    }

    /// Read the image behind a picture's relationship id.
    pub fn read_media(&mut self, slide: &ParsedSlide, rel_id: &str) -> Result<MediaPart> {
        let rel = slide.relationship(rel_id).ok_or_else(|| {
            Error::PptxParseError(format!(
                "Relationship '{}' not declared by {}",
                rel_id, slide.part
            ))
        })?;

        if rel.external {
            return Err(Error::PptxParseError(format!(
                "Image '{}' is linked, not embedded",
                rel.target
            )));
        }

        let bytes = self.read_bytes(&rel.target)?;
        Ok(MediaPart {
            bytes,
            extension: media_extension(&rel.target),
        })
    }

    /// Get the ordered list of slide paths.
    ///
    /// Uses `p:sldIdLst` from presentation.xml; falls back to the numeric
    /// order of the slide relationships when that list is absent.
    fn slide_order(&mut self) -> Result<Vec<String>> {
        let rels_content = self.read_text(PRESENTATION_RELS_PATH)?;
        let slide_rels: Vec<Relationship> = parse_relationships(&rels_content, "ppt")?
            .into_iter()
            .filter(|rel| is_slide_relationship(&rel.rel_type))
            .collect();

        let listed = match self.read_text(PRESENTATION_PATH) {
            Ok(content) => slide_id_list(&content)?,
            Err(e) => {
                log::debug!("Falling back to relationship order: {}", e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let by_id: HashMap<&str, &str> = slide_rels
                .iter()
                .map(|rel| (rel.id.as_str(), rel.target.as_str()))
                .collect();

            return listed
                .iter()
                .map(|id| {
                    by_id.get(id.as_str()).map(|t| t.to_string()).ok_or_else(|| {
                        Error::PptxParseError(format!("Slide id list references unknown '{}'", id))
                    })
                })
                .collect();
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .into_iter()
            .map(|rel| {
                let order = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
                (rel.target, order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Read a UTF-8 part from the ZIP archive.
    fn read_text(&mut self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ZipError(format!("'{}' is not valid UTF-8: {}", path, e)))
    }

    /// Read a binary part from the ZIP archive.
    fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

/// Parse a `.rels` part, resolving targets against `base_dir`.
fn parse_relationships(xml: &str, base_dir: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut external = false;

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                        _ => {}
                    }
                }

                let target = if external {
                    target
                } else {
                    resolve_target(base_dir, &target)
                };

                relationships.push(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids from `p:sldIdLst`, in presentation order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = relationship_attr(e, b"id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract text shapes and pictures from slide XML, in document order.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<Shape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    // Run text keeps its own spacing; only `a:t` content is collected.
    reader.trim_text(false);

    let mut current: Option<Shape> = None;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut in_run_text = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    current = Some(Shape::Text(String::new()));
                    current_text.clear();
                }
                b"pic" => {
                    current = Some(Shape::Picture { embed: None });
                }
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    in_paragraph = true;
                    if !current_text.is_empty() {
                        current_text.push('\n');
                    }
                }
                b"t" if in_paragraph => in_run_text = true,
                b"blip" => record_blip(&mut current, e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"p" if in_text_body => {
                    if !current_text.is_empty() {
                        current_text.push('\n');
                    }
                }
                b"br" if in_paragraph => current_text.push('\n'),
                b"blip" => record_blip(&mut current, e),
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_run_text {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad text in slide: {}", e)))?;
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    if let Some(Shape::Text(_)) = current.take() {
                        shapes.push(Shape::Text(current_text.trim().to_string()));
                    }
                    current_text.clear();
                    in_text_body = false;
                    in_paragraph = false;
                    in_run_text = false;
                }
                b"pic" => {
                    if let Some(shape @ Shape::Picture { .. }) = current.take() {
                        shapes.push(shape);
                    }
                }
                b"txBody" => in_text_body = false,
                b"p" => in_paragraph = false,
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Record an `a:blip r:embed` on the picture being parsed.
fn record_blip(current: &mut Option<Shape>, e: &BytesStart) {
    if let Some(Shape::Picture { embed }) = current {
        if embed.is_none() {
            *embed = relationship_attr(e, b"embed");
        }
    }
}

/// Value of a namespaced attribute such as `r:id` or `r:embed`.
///
/// Unprefixed attributes with the same local name are ignored.
fn relationship_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        let key = attr.key.as_ref();
        if key.contains(&b':') && local_name(key) == name {
            Some(String::from_utf8_lossy(&attr.value).to_string())
        } else {
            None
        }
    })
}

fn is_slide_relationship(rel_type: &str) -> bool {
    rel_type.ends_with("/slide")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Directory part of an archive path, e.g. `ppt/slides` for `ppt/slides/slide1.xml`.
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// `.rels` part for a package part, e.g. `ppt/slides/_rels/slide1.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn media_extension(target: &str) -> String {
    let file = target.rsplit('/').next().unwrap_or(target);
    match file.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => match ext.to_lowercase().as_str() {
            "jpeg" => "jpg".to_string(),
            other => other.to_string(),
        },
        _ => "bin".to_string(),
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("ppt/slides", "../media/image1.png"), "ppt/media/image1.png");
        assert_eq!(resolve_target("ppt/slides", "/ppt/media/x.gif"), "ppt/media/x.gif");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("ppt/slides/slide7.xml"),
            "ppt/slides/_rels/slide7.xml.rels"
        );
    }

    #[test]
    fn test_media_extension() {
        assert_eq!(media_extension("ppt/media/image1.PNG"), "png");
        assert_eq!(media_extension("ppt/media/image2.jpeg"), "jpg");
        assert_eq!(media_extension("ppt/media/blob"), "bin");
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="http://example.com/a.png" TargetMode="External"/>
</Relationships>"#;

        let rels = parse_relationships(xml, "ppt/slides").unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels[1].target, "ppt/media/image1.png");
        assert!(!rels[1].external);
        assert_eq!(rels[2].target, "http://example.com/a.png");
        assert!(rels[2].external);
        assert!(!is_slide_relationship(&rels[0].rel_type));
    }

    #[test]
    fn test_slide_id_list_ignores_plain_id() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r">
  <p:sldIdLst><p:sldId id="257" r:id="rId7"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst>
</p:presentation>"#;
        assert_eq!(slide_id_list(xml).unwrap(), vec!["rId7", "rId2"]);
    }

    #[test]
    fn test_extract_shapes_in_order() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld><p:spTree>
  <p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Gradient </a:t></a:r><a:r><a:t>descent</a:t></a:r></a:p></p:txBody></p:sp>
  <p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3"/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>
  <p:sp><p:txBody><a:p><a:r><a:t>line one</a:t></a:r><a:br/><a:r><a:t>line two</a:t></a:r></a:p><a:p/><a:p><a:r><a:t>R &amp; D</a:t></a:r></a:p></p:txBody></p:sp>
  <p:sp><p:spPr/></p:sp>
</p:spTree></p:cSld></p:sld>"#;

        let shapes = extract_shapes_from_xml(xml).unwrap();
        assert_eq!(
            shapes,
            vec![
                Shape::Text("Gradient descent".to_string()),
                Shape::Picture {
                    embed: Some("rId2".to_string())
                },
                Shape::Text("line one\nline two\n\nR & D".to_string()),
                Shape::Text(String::new()),
            ]
        );
    }

    #[test]
    fn test_malformed_slide_xml_is_an_error() {
        let xml = "<p:sld><p:sp><a:t>unclosed</p:sld>";
        assert!(extract_shapes_from_xml(xml).is_err());
    }
}
