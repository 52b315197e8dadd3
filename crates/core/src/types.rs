//! Domain types for representing documents and their extracted content.

use std::path::{Path, PathBuf};

/// The kind of document, resolved once from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Slide deck (PPTX, Office Open XML).
    SlideDeck,
    /// Fixed-layout page document (PDF).
    PageDocument,
    /// Anything we do not know how to read.
    Unknown,
}

impl DocumentKind {
    /// Detect the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pptx" => Self::SlideDeck,
            "pdf" => Self::PageDocument,
            _ => Self::Unknown,
        }
    }

    /// Detect the kind from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

/// One document to process, as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDescriptor {
    /// Location of the document on disk.
    pub path: PathBuf,

    /// Display title used for the section banner.
    pub title: String,

    /// Kind inferred from the path.
    pub kind: DocumentKind,
}

impl DocumentDescriptor {
    /// Create a descriptor, inferring its kind from the path.
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        let path = path.into();
        let kind = DocumentKind::from_path(&path);
        Self {
            path,
            title: title.into(),
            kind,
        }
    }
}

/// The ordered subdivision of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Slide,
    Page,
}

impl UnitKind {
    /// Heading label, e.g. `SLIDE`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Slide => "SLIDE",
            Self::Page => "PAGE",
        }
    }

    /// Prefix used in generated image filenames.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::Slide => "slide",
            Self::Page => "page",
        }
    }

    /// Lower-case noun used in prose lines.
    pub fn noun(self) -> &'static str {
        self.file_prefix()
    }

    /// Placeholder emitted when a unit carries no text.
    pub fn no_text_placeholder(self) -> &'static str {
        match self {
            Self::Slide => "[No text on this slide]",
            Self::Page => "[No text on this page]",
        }
    }
}

/// A single slide or page after extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unit {
    /// 1-based unit number.
    pub number: usize,

    /// Text fragments in reading order.
    pub text: Vec<String>,

    /// References to images that were written for this unit.
    pub image_refs: Vec<String>,
}

impl Unit {
    /// Create an empty unit with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Add a text fragment, skipping blank ones.
    pub fn add_text(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref().trim();
        if !text.is_empty() {
            self.text.push(text.to_string());
        }
    }

    /// Record a reference to a persisted image.
    pub fn add_image_ref(&mut self, reference: impl Into<String>) {
        self.image_refs.push(reference.into());
    }

    /// Whether any text was collected.
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Image bytes pulled out of a unit, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Number of the owning unit (1-based).
    pub unit: usize,

    /// Position among the unit's images (1-based).
    pub sequence: usize,

    /// Encoded image data.
    pub bytes: Vec<u8>,

    /// File extension without the dot, e.g. `png`.
    pub extension: String,
}

impl ExtractedImage {
    pub fn new(unit: usize, sequence: usize, bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            unit,
            sequence,
            bytes,
            extension: extension.into(),
        }
    }

    /// Deterministic filename, e.g. `slide3_img2.png`.
    pub fn file_name(&self, kind: UnitKind) -> String {
        format!(
            "{}{}_img{}.{}",
            kind.file_prefix(),
            self.unit,
            self.sequence,
            self.extension
        )
    }
}
