use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ati_core::PostRecord;

use crate::parse::parse_posts;
use crate::reader::SourceReader;
use crate::StoreError;

/// A fully parsed source as held by the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    pub source_id: String,
    pub records: Vec<PostRecord>,
    pub skipped_rows: usize,
}

type Slot = Arc<Mutex<Option<Arc<LoadedSource>>>>;

/// Memoizing record store.
///
/// Each source is read and parsed at most once until it is invalidated.
/// Concurrent first loads of the same source wait on a per-source slot, so
/// only one caller touches the reader; other sources load independently.
/// Failed loads are not cached.
pub struct RecordStore {
    reader: Arc<dyn SourceReader>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RecordStore {
    pub fn new(reader: impl SourceReader + 'static) -> Self {
        Self::with_reader(Arc::new(reader))
    }

    #[must_use]
    pub fn with_reader(reader: Arc<dyn SourceReader>) -> Self {
        Self {
            reader,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Load `source_id`, reading it only if no cached copy exists.
    ///
    /// # Errors
    ///
    /// Propagates the reader's [`StoreError`] unchanged; nothing is cached
    /// on failure.
    pub fn load(&self, source_id: &str) -> Result<Arc<LoadedSource>, StoreError> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(source_id.to_string()).or_default())
        };

        let mut guard = lock(&*slot);
        if let Some(loaded) = guard.as_ref() {
            return Ok(Arc::clone(loaded));
        }

        let content = self.reader.read(source_id)?;
        let parsed = parse_posts(source_id, &content);
        tracing::info!(
            source = source_id,
            records = parsed.records.len(),
            skipped = parsed.skipped_rows,
            "loaded source"
        );

        let loaded = Arc::new(LoadedSource {
            source_id: source_id.to_string(),
            records: parsed.records,
            skipped_rows: parsed.skipped_rows,
        });
        *guard = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Load the first candidate that exists.
    ///
    /// Candidates that are not found are passed over; any other error stops
    /// the search.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SourceNotFound`] naming every candidate when none
    /// exists, or the first non-not-found error encountered.
    pub fn load_first<S: AsRef<str>>(
        &self,
        candidates: &[S],
    ) -> Result<Arc<LoadedSource>, StoreError> {
        for candidate in candidates {
            match self.load(candidate.as_ref()) {
                Ok(loaded) => return Ok(loaded),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(source = candidate.as_ref(), "source candidate not found");
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::SourceNotFound {
            source_id: candidates
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    #[must_use]
    pub fn is_cached(&self, source_id: &str) -> bool {
        let slot = lock(&self.slots).get(source_id).cloned();
        slot.is_some_and(|slot| lock(&*slot).is_some())
    }

    /// Drop the cached copy of `source_id`; the next load re-reads it.
    pub fn invalidate(&self, source_id: &str) {
        lock(&self.slots).remove(source_id);
    }

    pub fn invalidate_all(&self) {
        lock(&self.slots).clear();
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached: Vec<String> = lock(&self.slots).keys().cloned().collect();
        f.debug_struct("RecordStore")
            .field("sources", &cached)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::MemoryReader;

    const CSV: &str = "brand,ATI_final,DS_final,y\nnike,80,0.2,0.1\nadidas,20,0.6,0.3\n";

    struct CountingReader {
        inner: MemoryReader,
        reads: AtomicUsize,
    }

    impl CountingReader {
        fn new(inner: MemoryReader) -> Self {
            Self {
                inner,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl SourceReader for CountingReader {
        fn read(&self, source_id: &str) -> Result<String, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(source_id)
        }
    }

    fn counting_store() -> (RecordStore, Arc<CountingReader>) {
        let reader = Arc::new(CountingReader::new(
            MemoryReader::new().with_source("test", CSV),
        ));
        let store = RecordStore::with_reader(Arc::clone(&reader) as Arc<dyn SourceReader>);
        (store, reader)
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let (store, reader) = counting_store();
        let first = store.load("test").expect("first load");
        let second = store.load("test").expect("second load");

        assert_eq!(first.records, second.records);
        assert_eq!(first.records.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_loads_read_once() {
        let (store, reader) = counting_store();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let loaded = store.load("test").expect("load");
                    assert_eq!(loaded.records.len(), 2);
                });
            }
        });
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_source_is_an_error_and_not_cached() {
        let (store, reader) = counting_store();
        let err = store.load("train").unwrap_err();
        assert!(err.is_not_found(), "expected SourceNotFound, got {err:?}");
        assert!(!store.is_cached("train"));

        let _ = store.load("train");
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_forces_reread() {
        let (store, reader) = counting_store();
        store.load("test").expect("load");
        assert!(store.is_cached("test"));

        store.invalidate("test");
        assert!(!store.is_cached("test"));
        store.load("test").expect("reload");
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);

        store.invalidate_all();
        store.load("test").expect("reload after clear");
        assert_eq!(reader.reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn load_first_falls_through_missing_candidates() {
        let (store, _reader) = counting_store();
        let loaded = store
            .load_first(&["results/test.csv", "test"])
            .expect("second candidate exists");
        assert_eq!(loaded.source_id, "test");
    }

    #[test]
    fn load_first_reports_all_candidates_when_none_exist() {
        let (store, _reader) = counting_store();
        let err = store.load_first(&["a.csv", "b.csv"]).unwrap_err();
        match err {
            StoreError::SourceNotFound { source_id } => assert_eq!(source_id, "a.csv, b.csv"),
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn skipped_rows_are_reported_on_the_loaded_source() {
        let store = RecordStore::new(
            MemoryReader::new().with_source("bad", "brand,ATI_final,DS_final,y\nnike\n"),
        );
        let loaded = store.load("bad").expect("load");
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.skipped_rows, 1);
    }
}
