//! Integration tests reading stored documents lazily.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use libearth_core::Error;
use libearth_repository::{from_url, read_document, FileSystemRepository, Repository};
use libearth_schema::{Descriptor, DocumentType, ElementType};
use tempfile::TempDir;

fn feed_type() -> DocumentType {
    let entry = ElementType::builder("Entry")
        .field("id", Descriptor::text("id").required())
        .field("title", Descriptor::text("title"))
        .build()
        .expect("entry type");
    let feed = ElementType::builder("Feed")
        .field("title", Descriptor::text("title").required())
        .field("entries", Descriptor::child("entry", entry).multiple())
        .build()
        .expect("feed type");
    DocumentType::new("feed", feed).expect("feed document")
}

fn feed_xml(entries: usize) -> String {
    let mut xml = String::from("<feed><title>Stored</title>");
    for i in 0..entries {
        xml.push_str(&format!("<entry><id>urn:{i}</id><title>Entry {i}</title></entry>"));
    }
    xml.push_str("</feed>");
    xml
}

#[test]
fn test_read_stored_document() {
    let dir = TempDir::new().unwrap();
    let repo = FileSystemRepository::new(dir.path(), false)
        .unwrap()
        .with_chunk_size(16);
    repo.write_bytes(&["feeds", "stored.xml"], feed_xml(50).as_bytes())
        .unwrap();

    let doc = read_document(&repo, &["feeds", "stored.xml"], &feed_type()).unwrap();
    let feed = doc.root();
    assert_eq!(feed.text("title").unwrap().as_deref(), Some("Stored"));

    let entries = feed.children("entries").unwrap();
    let third = entries.get(2).unwrap().unwrap();
    assert_eq!(third.text("id").unwrap().as_deref(), Some("urn:2"));
    assert!(!entries.consumes_all());
    assert_eq!(entries.len().unwrap(), 50);
    assert!(doc.is_complete());
}

#[test]
fn test_read_missing_document() {
    let dir = TempDir::new().unwrap();
    let repo = FileSystemRepository::new(dir.path(), false).unwrap();
    let err = read_document(&repo, &["missing.xml"], &feed_type()).unwrap_err();
    assert!(matches!(err, Error::RepositoryKey { .. }));
}

#[test]
fn test_read_wrong_document_element() {
    let dir = TempDir::new().unwrap();
    let repo = FileSystemRepository::new(dir.path(), false).unwrap();
    repo.write_bytes(&["other.xml"], b"<rss><channel/></rss>").unwrap();
    let err = read_document(&repo, &["other.xml"], &feed_type()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Syntax error: document element must be feed, not rss"
    );
}

#[test]
fn test_round_trip_through_url() {
    let dir = TempDir::new().unwrap();
    let first = FileSystemRepository::new(dir.path().join("repo"), true).unwrap();
    first.write_bytes(&["a.xml"], feed_xml(1).as_bytes()).unwrap();

    let reopened = from_url(&first.to_url("file").unwrap()).unwrap();
    assert!(reopened.exists(&["a.xml"]));
    let doc = read_document(reopened.as_ref(), &["a.xml"], &feed_type()).unwrap();
    let entry = doc.root().children("entries").unwrap().get(0).unwrap().unwrap();
    assert_eq!(entry.text("title").unwrap().as_deref(), Some("Entry 0"));
}
