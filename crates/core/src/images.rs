//! Per-document image directories.
//!
//! Persisting image bytes and formatting the reference line that points at
//! them are separate steps: callers record a reference only once
//! [`ImageDir::persist`] has succeeded.

use crate::{ExtractedImage, Result, UnitKind};
use std::fs;
use std::path::{Path, PathBuf};

/// The directory owned by one document, e.g. `images/doc3`.
#[derive(Debug, Clone)]
pub struct ImageDir {
    path: PathBuf,
    kind: UnitKind,
}

impl ImageDir {
    /// Image directory for catalog entry `index` (1-based).
    pub fn for_document(root: &Path, prefix: &str, index: usize, kind: UnitKind) -> Self {
        Self {
            path: root.join(format!("{}{}", prefix, index)),
            kind,
        }
    }

    /// Directory path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if needed.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Write an image, overwriting any earlier file of the same name.
    ///
    /// Returns the generated filename.
    pub fn persist(&self, image: &ExtractedImage) -> Result<String> {
        let file_name = image.file_name(self.kind);
        fs::write(self.path.join(&file_name), &image.bytes)?;
        log::debug!(
            "Wrote {} ({} bytes) to {}",
            file_name,
            image.bytes.len(),
            self.path.display()
        );
        Ok(file_name)
    }

    /// Reference line target for a file in this directory, e.g. `images/doc1/slide2_img1.png`.
    pub fn reference(&self, file_name: &str) -> String {
        let dir = self.path.to_string_lossy().replace('\\', "/");
        format!("{}/{}", dir.trim_end_matches('/'), file_name)
    }
}
