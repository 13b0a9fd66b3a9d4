//! Tests for the reference resolver

use tempfile::TempDir;

use crate::test::{FILE_HEADER, LogDir, append, uuid};
use crate::{Category, ReferenceResolver, SourceError};

fn setup() -> (TempDir, LogDir) {
    let tmp = TempDir::new().unwrap();
    let dir = LogDir::create(tmp.path()).unwrap();
    (tmp, dir)
}

#[tokio::test]
async fn test_index_zero_never_opens_file() {
    let tmp = TempDir::new().unwrap();
    let mut resolver = ReferenceResolver::new(tmp.path().join("missing.lgf"));

    assert_eq!(resolver.value(Category::Computers, 0).await.unwrap(), "");
    assert_eq!(
        resolver.referenced_value(Category::Users, 0).await.unwrap(),
        (String::new(), String::new())
    );
    assert_eq!(resolver.position(), 0);
}

#[tokio::test]
async fn test_user_entry_with_quoted_uuid() {
    let (_tmp, dir) = setup();
    append(
        &dir.reference_path(),
        "{1,\"10000000-0000-0000-0000-000000000001\",\"Alice\",7},\r\n",
    )
    .unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());
    let (name, id) = resolver.referenced_value(Category::Users, 7).await.unwrap();

    assert_eq!(name, "Alice");
    assert_eq!(id, "10000000-0000-0000-0000-000000000001");
}

#[tokio::test]
async fn test_plain_and_uuid_categories() {
    let (_tmp, dir) = setup();
    dir.append_reference(&[
        LogDir::plain(2, 1, "WS-042"),
        LogDir::metadata(3, "Document.Invoice"),
        LogDir::plain(7, 1, "1541"),
    ])
    .unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());

    // Looking up a later entry caches the earlier ones on the way
    assert_eq!(resolver.value(Category::MainPorts, 1).await.unwrap(), "1541");
    assert_eq!(resolver.value(Category::Computers, 1).await.unwrap(), "WS-042");
    assert_eq!(
        resolver.referenced_value(Category::Metadata, 3).await.unwrap(),
        ("Document.Invoice".to_string(), uuid(3))
    );
}

#[tokio::test]
async fn test_unknown_categories_are_skipped() {
    let (_tmp, dir) = setup();
    append(
        &dir.reference_path(),
        "{0,\"none\",1},\r\n{11,\"future\",1},\r\n{13,{1,2},\"shape\",4},\r\n",
    )
    .unwrap();
    dir.append_reference(&[LogDir::plain(4, 1, "_$Session$_.Start")]).unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());
    assert_eq!(
        resolver.value(Category::Events, 1).await.unwrap(),
        "_$Session$_.Start"
    );
}

#[tokio::test]
async fn test_missing_index_is_lookup_error() {
    let (_tmp, dir) = setup();
    dir.append_reference(&[LogDir::user(1, "Alice")]).unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());
    let err = resolver.value(Category::Users, 2).await.unwrap_err();

    assert!(matches!(
        err,
        SourceError::ResolverLookup {
            category: Category::Users,
            index: 2
        }
    ));
}

#[tokio::test]
async fn test_reads_entries_appended_later() {
    let (_tmp, dir) = setup();
    dir.append_reference(&[LogDir::user(1, "Alice")]).unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());
    assert_eq!(resolver.value(Category::Users, 1).await.unwrap(), "Alice");
    let before = resolver.position();

    dir.append_reference(&[LogDir::user(2, "Bob")]).unwrap();
    assert_eq!(resolver.value(Category::Users, 2).await.unwrap(), "Bob");
    assert!(resolver.position() > before);
}

#[tokio::test]
async fn test_partial_entry_waits_for_writer() {
    let (_tmp, dir) = setup();
    append(&dir.reference_path(), "{2,\"WS-0").unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());
    assert!(resolver.value(Category::Computers, 1).await.is_err());

    append(&dir.reference_path(), "42\",1},\r\n").unwrap();
    assert_eq!(resolver.value(Category::Computers, 1).await.unwrap(), "WS-042");
}

#[tokio::test]
async fn test_seek_rebuilds_cache_up_to_offset() {
    let (_tmp, dir) = setup();
    let first = LogDir::user(1, "Alice");
    let second = LogDir::user(2, "Bob");
    dir.append_reference(&[first.clone(), second]).unwrap();

    let offset = (FILE_HEADER.len() + first.len()) as u64;
    let mut resolver = ReferenceResolver::new(dir.reference_path());
    resolver.seek(offset).await.unwrap();

    assert_eq!(resolver.position(), offset);
    assert_eq!(resolver.value(Category::Users, 1).await.unwrap(), "Alice");
    assert_eq!(resolver.value(Category::Users, 2).await.unwrap(), "Bob");
}

#[tokio::test]
async fn test_missing_reference_file() {
    let tmp = TempDir::new().unwrap();
    let mut resolver = ReferenceResolver::new(tmp.path().join("1Cv8.lgf"));

    let err = resolver.value(Category::Users, 1).await.unwrap_err();
    assert!(matches!(err, SourceError::ReferenceMissing(_)));
}

#[tokio::test]
async fn test_malformed_entry_is_format_error() {
    let (_tmp, dir) = setup();
    append(&dir.reference_path(), "{2,\"WS\",notanumber},\r\n").unwrap();

    let mut resolver = ReferenceResolver::new(dir.reference_path());
    let err = resolver.value(Category::Computers, 1).await.unwrap_err();
    assert!(matches!(err, SourceError::Format { .. }));
}
