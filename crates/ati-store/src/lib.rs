//! Record store for per-post feature files.
//!
//! Parses CSV sources into typed [`ati_core::PostRecord`]s and
//! memoizes each parsed source for the lifetime of the [`RecordStore`].
//! Rows whose field count is off by more than one are skipped and counted
//! rather than failing the load.

mod cache;
mod parse;
mod reader;

use thiserror::Error;

pub use cache::{LoadedSource, RecordStore};
pub use parse::{parse_posts, ParsedSource, MAX_ROW_WARNINGS};
pub use reader::{FsReader, MemoryReader, SourceReader};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("source not found: {source_id}")]
    SourceNotFound { source_id: String },

    #[error("failed to read source {source_id}: {source}")]
    Io {
        source_id: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::SourceNotFound { .. })
    }
}
