//! The ordered list of documents to process.
//!
//! A catalog file is JSON, either an object with a `documents` array or a
//! bare array:
//!
//! ```json
//! { "documents": [
//!     { "path": "curs1 RN 2025.pptx", "title": "Course 1: RN 2025" },
//!     { "path": "curs6 - optimizers.pdf" }
//! ] }
//! ```
//!
//! Entries without a title use the file stem.

use crate::{DocumentDescriptor, Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Ordered document descriptors; processing order is report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    documents: Vec<DocumentDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { documents: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    path: PathBuf,
    #[serde(default)]
    title: Option<String>,
}

impl Catalog {
    pub fn new(documents: Vec<DocumentDescriptor>) -> Self {
        Self { documents }
    }

    /// Build a catalog from `(path, title)` pairs.
    pub fn from_pairs<P, T>(pairs: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<PathBuf>,
        T: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(path, title)| DocumentDescriptor::new(path, title))
                .collect(),
        )
    }

    /// Build a catalog from bare paths, titled by file stem.
    pub fn from_paths<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self::new(
            paths
                .into_iter()
                .map(|path| {
                    let path = path.into();
                    let title = default_title(&path);
                    DocumentDescriptor::new(path, title)
                })
                .collect(),
        )
    }

    /// Parse a catalog from JSON text.
    ///
    /// Relative paths are resolved against `base` when given.
    pub fn from_json(json: &str, base: Option<&Path>) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| Error::CatalogError(format!("Invalid catalog JSON: {}", e)))?;

        let entries = match file {
            CatalogFile::Wrapped { documents } => documents,
            CatalogFile::Bare(documents) => documents,
        };
        if entries.is_empty() {
            return Err(Error::CatalogError("Catalog lists no documents".to_string()));
        }

        let documents = entries
            .into_iter()
            .map(|entry| {
                let path = match base {
                    Some(base) if entry.path.is_relative() => base.join(&entry.path),
                    _ => entry.path,
                };
                let title = entry.title.unwrap_or_else(|| default_title(&path));
                DocumentDescriptor::new(path, title)
            })
            .collect();

        Ok(Self { documents })
    }

    /// Load a catalog file; relative entries resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::CatalogError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json, path.parent())
    }

    pub fn documents(&self) -> &[DocumentDescriptor] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate descriptors with their 1-based catalog position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DocumentDescriptor)> {
        self.documents.iter().enumerate().map(|(i, d)| (i + 1, d))
    }
}

fn default_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentKind;

    #[test]
    fn test_from_json_wrapped() {
        let json = r#"{"documents": [
            {"path": "curs1.pptx", "title": "Course 1"},
            {"path": "curs6 - optimizers.pdf"}
        ]}"#;
        let catalog = Catalog::from_json(json, None).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.documents()[0].title, "Course 1");
        assert_eq!(catalog.documents()[0].kind, DocumentKind::SlideDeck);
        assert_eq!(catalog.documents()[1].title, "curs6 - optimizers");
        assert_eq!(catalog.documents()[1].kind, DocumentKind::PageDocument);
    }

    #[test]
    fn test_from_json_bare_array_with_base() {
        let json = r#"[{"path": "a.pdf", "title": "A"}, {"path": "/abs/b.pptx", "title": "B"}]"#;
        let catalog = Catalog::from_json(json, Some(Path::new("decks"))).unwrap();

        assert_eq!(catalog.documents()[0].path, PathBuf::from("decks/a.pdf"));
        assert_eq!(catalog.documents()[1].path, PathBuf::from("/abs/b.pptx"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = Catalog::from_json("{\"files\": 3}", None).unwrap_err();
        assert!(matches!(err, Error::CatalogError(_)));
    }

    #[test]
    fn test_from_json_rejects_empty_list() {
        for json in ["[]", r#"{"documents": []}"#] {
            let err = Catalog::from_json(json, None).unwrap_err();
            assert!(matches!(err, Error::CatalogError(_)));
        }
    }

    #[test]
    fn test_iter_is_one_based() {
        let catalog = Catalog::from_pairs([("a.pptx", "A"), ("b.pdf", "B")]);
        let indices: Vec<usize> = catalog.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_from_paths_uses_stem() {
        let catalog = Catalog::from_paths(["slides/intro.pptx"]);
        assert_eq!(catalog.documents()[0].title, "intro");
    }
}
