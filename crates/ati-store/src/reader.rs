use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::StoreError;

/// Raw access to a source's text, keyed by source identifier.
pub trait SourceReader: Send + Sync {
    /// Read the full text of `source_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SourceNotFound`] when the source does not exist
    /// and [`StoreError::Io`] for any other read failure.
    fn read(&self, source_id: &str) -> Result<String, StoreError>;
}

/// Reads sources from the filesystem, treating the identifier as a path.
///
/// Relative identifiers resolve against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsReader {
    root: Option<PathBuf>,
}

impl FsReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source_id: &str) -> PathBuf {
        let path = PathBuf::from(source_id);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl SourceReader for FsReader {
    fn read(&self, source_id: &str) -> Result<String, StoreError> {
        let path = self.resolve(source_id);
        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::SourceNotFound {
                    source_id: source_id.to_string(),
                }
            } else {
                StoreError::Io {
                    source_id: source_id.to_string(),
                    source: e,
                }
            }
        })
    }
}

/// In-memory sources, for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    sources: HashMap<String, String>,
}

impl MemoryReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, source_id: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.insert(source_id.into(), content.into());
        self
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, source_id: &str) -> Result<String, StoreError> {
        self.sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| StoreError::SourceNotFound {
                source_id: source_id.to_string(),
            })
    }
}
