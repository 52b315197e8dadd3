// End-to-end tests: real .pptx and .pdf files built in a temp directory,
// run through the same pipeline the binary wires up.

use digest_core::{Catalog, MemorySink, Pipeline, PipelineConfig, Progress};
use digest_pdf::PdfExtractor;
use digest_pptx::PptxExtractor;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;
const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

// ── fixtures ─────────────────────────────────────────────────────────────────

/// Two slides: "Intro" text, then a single picture.
fn intro_deck() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    let mut part = |name: &str, body: String| {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    };

    part(
        "ppt/presentation.xml",
        format!(
            r#"<p:presentation {NS}><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst></p:presentation>"#
        ),
    );
    part(
        "ppt/_rels/presentation.xml.rels",
        format!(
            r#"<Relationships><Relationship Id="rId2" Type="{SLIDE_REL}" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="{SLIDE_REL}" Target="slides/slide2.xml"/></Relationships>"#
        ),
    );
    part(
        "ppt/slides/slide1.xml",
        format!(
            r#"<p:sld {NS}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Intro</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        ),
    );
    part(
        "ppt/slides/slide2.xml",
        format!(
            r#"<p:sld {NS}><p:cSld><p:spTree><p:pic><p:blipFill><a:blip r:embed="rId5"/></p:blipFill></p:pic></p:spTree></p:cSld></p:sld>"#
        ),
    );
    part(
        "ppt/slides/_rels/slide2.xml.rels",
        format!(
            r#"<Relationships><Relationship Id="rId5" Type="{IMAGE_REL}" Target="../media/image1.png"/></Relationships>"#
        ),
    );
    part("ppt/media/image1.png", "not really a png".to_string());

    zip.finish().unwrap().into_inner()
}

/// One page with the text "Summary" and no images.
fn summary_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Summary")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn pipeline(root: &Path) -> Pipeline {
    let config = PipelineConfig {
        output: root.join("course_content.txt"),
        image_root: root.join("images"),
        dir_prefix: "course".to_string(),
    };
    Pipeline::new(config, PptxExtractor::new(), PdfExtractor::new())
}

// ── tests ────────────────────────────────────────────────────────────────────

#[test]
fn deck_and_pdf_produce_two_sections_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let deck = write(tmp.path(), "curs1.pptx", &intro_deck());
    let pdf = write(tmp.path(), "curs2.pdf", &summary_pdf());

    let catalog = Catalog::from_pairs([(deck, "Course 1: Intro"), (pdf, "Course 2: Summary")]);
    let pipeline = pipeline(tmp.path());
    let report = pipeline.run(&catalog, &MemorySink::new()).unwrap();

    assert_eq!(report.sections.len(), 2);
    assert_eq!(report.total_images, 1);

    let text = std::fs::read_to_string(tmp.path().join("course_content.txt")).unwrap();
    let first = text.find("COURSE 1: INTRO").unwrap();
    let second = text.find("COURSE 2: SUMMARY").unwrap();
    assert!(first < second);

    let deck_section = &text[first..second];
    assert!(deck_section.contains("SLIDE 1"));
    assert!(deck_section.contains("Intro"));
    assert!(deck_section.contains("SLIDE 2"));
    assert!(deck_section.contains("[No text on this slide]"));
    assert!(deck_section.contains("images/course1/slide2_img1.png"));

    let pdf_section = &text[second..];
    assert!(pdf_section.contains("PAGE 1"));
    assert!(pdf_section.contains("Summary"));
    assert!(!pdf_section.contains("Images on this page"));

    let image = tmp.path().join("images/course1/slide2_img1.png");
    assert_eq!(std::fs::read(image).unwrap(), b"not really a png");
}

#[test]
fn missing_file_is_skipped_with_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let pdf = write(tmp.path(), "curs6 - optimizers.pdf", &summary_pdf());
    let missing = tmp.path().join("curs5.pptx");

    let catalog = Catalog::from_pairs([
        (missing.clone(), "Course 5: Overfitting"),
        (pdf, "Course 6: Optimizers"),
    ]);
    let sink = MemorySink::new();
    let report = pipeline(tmp.path()).run(&catalog, &sink).unwrap();

    assert_eq!(report.sections.len(), 1);
    assert_eq!(report.sections[0].title, "Course 6: Optimizers");
    assert!(sink
        .events()
        .contains(&Progress::DocumentMissing { path: missing }));

    let text = std::fs::read_to_string(tmp.path().join("course_content.txt")).unwrap();
    assert!(!text.contains("OVERFITTING"));
    // Entry 2 keeps its catalog position in the image directory name.
    assert!(tmp.path().join("images/course2").is_dir());
}

#[test]
fn corrupt_and_unknown_documents_do_not_stop_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let broken = write(tmp.path(), "broken.pptx", b"this is not a zip archive");
    let notes = write(tmp.path(), "notes.txt", b"plain text");
    let deck = write(tmp.path(), "curs1.pptx", &intro_deck());

    let catalog = Catalog::from_pairs([
        (broken.clone(), "Broken"),
        (notes.clone(), "Notes"),
        (deck, "Deck"),
    ]);
    let report = pipeline(tmp.path()).run(&catalog, &MemorySink::new()).unwrap();

    assert_eq!(report.sections.len(), 3);
    assert!(report.sections[0]
        .body
        .starts_with(&format!("Error extracting from {}", broken.display())));
    assert_eq!(
        report.sections[1].body,
        format!("Unknown file format: {}", notes.display())
    );
    assert!(report.sections[2].body.contains("images/course3/slide2_img1.png"));
    assert_eq!(report.total_images, 1);
}

#[test]
fn rerun_is_byte_identical() {
    let tmp = tempfile::tempdir().unwrap();
    let deck = write(tmp.path(), "curs1.pptx", &intro_deck());
    let pdf = write(tmp.path(), "curs2.pdf", &summary_pdf());
    let catalog = Catalog::from_pairs([(deck, "One"), (pdf, "Two")]);
    let pipeline = pipeline(tmp.path());
    let output = tmp.path().join("course_content.txt");

    pipeline.run(&catalog, &MemorySink::new()).unwrap();
    let first = std::fs::read(&output).unwrap();

    pipeline.run(&catalog, &MemorySink::new()).unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first, second);
    let files = std::fs::read_dir(tmp.path().join("images/course1"))
        .unwrap()
        .count();
    assert_eq!(files, 1);
}
