use std::path::{Path, PathBuf};

use log::debug;

use crate::error::DocumentError;

/// An open PDF document. Wraps the lopdf representation together with
/// its source path and a modification flag. One handle is owned by
/// exactly one pipeline run at a time; handles never cross threads.
pub struct PdfDocument {
    path: PathBuf,
    doc: lopdf::Document,
    modified: bool,
}

impl PdfDocument {
    /// Opens a PDF from disk. The extension check runs before any I/O so
    /// an obviously wrong input fails with a clear message instead of a
    /// parse error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();

        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(DocumentError::NotAPdf(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|e| DocumentError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = lopdf::Document::load_mem(&bytes).map_err(|e| DocumentError::ParsePdf {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!("Opened document: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            doc,
            modified: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Read-only access to the underlying engine document. Used by
    /// operation `validate` implementations, which must not mutate.
    pub fn inner(&self) -> &lopdf::Document {
        &self.doc
    }

    /// Mutable access for operation `execute` implementations. Callers
    /// are responsible for calling `mark_modified` once the effect is
    /// applied.
    pub fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.doc
    }

    /// Persists the in-memory document to `path`, creating parent
    /// directories as needed. Returns the size of the written file.
    pub fn save_to<P: AsRef<Path>>(&mut self, path: P) -> Result<u64, DocumentError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| DocumentError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        self.doc
            .save(path)
            .map_err(|e| DocumentError::SaveDocument {
                path: path.to_path_buf(),
                source: lopdf::Error::IO(e),
            })?;

        let size = std::fs::metadata(path)
            .map_err(|e| DocumentError::ReadDocument {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();

        debug!("Saved document: {} ({} bytes)", path.display(), size);
        Ok(size)
    }
}
