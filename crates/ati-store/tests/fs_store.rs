//! Filesystem-backed record store tests.

use std::path::PathBuf;

use ati_store::{FsReader, RecordStore, StoreError};

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("ati-store-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self(path)
    }

    fn write(&self, name: &str, content: &str) -> String {
        let path = self.0.join(name);
        std::fs::write(&path, content).expect("write fixture");
        path.display().to_string()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

const POSTS: &str = "brand,count_like,count_comment,followers,y,ATI_final,DS_final,caption,ftime_parsed\n\
nike,100,5,1000,0.125,72.5,0.31,\"Line one\nline two, with comma\",2025-04-01 09:00:00\n\
adidas,50,1,800,0.069,41,0.52,Plain caption\n\
broken,row\n\
\n\
puma,10,0,0,0,55,0.4,\"\",test\n";

#[test]
fn loads_quoted_multiline_rows_from_disk() {
    let dir = TempDir::new();
    let path = dir.write("posts_test.csv", POSTS);

    let store = RecordStore::new(FsReader::new());
    let loaded = store.load(&path).expect("load posts");

    assert_eq!(loaded.records.len(), 3);
    assert_eq!(loaded.skipped_rows, 1);

    let nike = &loaded.records[0];
    assert_eq!(nike.brand, "nike");
    assert_eq!(nike.caption, "Line one\nline two, with comma");
    assert!(nike.posted_at.is_some());

    // One short field: padded rather than rejected.
    let adidas = &loaded.records[1];
    assert_eq!(adidas.caption, "Plain caption");
    assert!(adidas.posted_at.is_none());

    let puma = &loaded.records[2];
    assert_eq!(puma.followers, 0);
    assert!(puma.posted_at.is_none(), "\"test\" is not a timestamp");
}

#[test]
fn relative_ids_resolve_against_root() {
    let dir = TempDir::new();
    dir.write("posts_test.csv", POSTS);

    let store = RecordStore::new(FsReader::with_root(&dir.0));
    let loaded = store.load("posts_test.csv").expect("load relative");
    assert_eq!(loaded.records.len(), 3);
}

#[test]
fn missing_file_reports_source_not_found() {
    let dir = TempDir::new();
    let missing = dir.0.join("nope.csv").display().to_string();

    let store = RecordStore::new(FsReader::new());
    let err = store.load(&missing).unwrap_err();
    assert!(
        matches!(err, StoreError::SourceNotFound { ref source_id } if *source_id == missing),
        "expected SourceNotFound, got {err:?}"
    );
}

#[test]
fn cached_copy_survives_file_removal_until_invalidated() {
    let dir = TempDir::new();
    let path = dir.write("posts_test.csv", POSTS);

    let store = RecordStore::new(FsReader::new());
    store.load(&path).expect("initial load");
    std::fs::remove_file(&path).expect("remove fixture");

    let cached = store.load(&path).expect("served from cache");
    assert_eq!(cached.records.len(), 3);

    store.invalidate(&path);
    assert!(store.load(&path).unwrap_err().is_not_found());
}
