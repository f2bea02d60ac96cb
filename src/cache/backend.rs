//! Storage backends for the explanation cache
//!
//! The cache document is a JSON object keyed by cache key. Its freshness
//! lives outside the document: the file modification time for
//! [`FileBackend`], a plain timestamp for [`MemoryBackend`].

use crate::error::CacheError;
use crate::explanation::ExplanationRecord;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::debug;

/// Cache document, ordered by key
pub type Document = BTreeMap<String, ExplanationRecord>;

/// Where the cache document lives
pub trait StoreBackend {
    /// Read the whole document. Missing storage reads as empty.
    fn load(&self) -> Result<Document, CacheError>;

    /// Replace the whole document in one step
    fn save(&mut self, document: &Document) -> Result<(), CacheError>;

    /// Time of the last write or touch, `None` if nothing is stored yet
    fn last_modified(&self) -> Result<Option<SystemTime>, CacheError>;

    /// Mark the store as fresh without rewriting it
    fn touch(&mut self) -> Result<(), CacheError>;
}

/// JSON file on disk, written atomically via a scratch file + rename
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scratch_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl StoreBackend for FileBackend {
    fn load(&self) -> Result<Document, CacheError> {
        if !self.path.exists() {
            return Ok(Document::new());
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| CacheError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&mut self, document: &Document) -> Result<(), CacheError> {
        let dir = self.scratch_dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let content = serde_json::to_string_pretty(document)?;

        // Scratch file is removed on drop if we bail out before persisting
        let mut scratch = NamedTempFile::new_in(&dir).map_err(|e| CacheError::io(&dir, e))?;
        scratch
            .write_all(content.as_bytes())
            .and_then(|_| scratch.as_file().sync_all())
            .map_err(|e| CacheError::io(scratch.path(), e))?;
        scratch
            .persist(&self.path)
            .map_err(|e| CacheError::io(&self.path, e.error))?;

        debug!(
            "Wrote {} cache entries to {}",
            document.len(),
            self.path.display()
        );
        Ok(())
    }

    fn last_modified(&self) -> Result<Option<SystemTime>, CacheError> {
        match fs::metadata(&self.path) {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|e| CacheError::io(&self.path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(&self.path, e)),
        }
    }

    fn touch(&mut self) -> Result<(), CacheError> {
        let file = fs::File::options()
            .write(true)
            .open(&self.path)
            .map_err(|e| CacheError::io(&self.path, e))?;
        file.set_modified(SystemTime::now())
            .map_err(|e| CacheError::io(&self.path, e))
    }
}

/// In-process document, used by tests
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    document: Document,
    modified: Option<SystemTime>,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the store was last written at `at`
    pub fn set_modified(&mut self, at: SystemTime) {
        self.modified = Some(at);
    }

    /// Number of whole-document writes so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<Document, CacheError> {
        Ok(self.document.clone())
    }

    fn save(&mut self, document: &Document) -> Result<(), CacheError> {
        self.document = document.clone();
        self.modified = Some(SystemTime::now());
        self.writes += 1;
        Ok(())
    }

    fn last_modified(&self) -> Result<Option<SystemTime>, CacheError> {
        Ok(self.modified)
    }

    fn touch(&mut self) -> Result<(), CacheError> {
        self.modified = Some(SystemTime::now());
        Ok(())
    }
}
