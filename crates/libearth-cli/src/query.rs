//! Reading document values by attribute path.
//!
//! A path is a dot-separated list of attribute names, with list indices
//! after `multiple` attributes: `entries.0.title`. Only the part of the
//! document needed to answer a path is read.

use crate::error::{Error, Result};
use libearth_schema::{Document, DocumentType, Element, Value};
use serde_json::{Map, Value as Json};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Converts an element and everything below it to JSON.
///
/// Every declared attribute becomes a key; absent single values are `null`.
/// A required child that turns out to be missing is logged and rendered as
/// `null` so the rest of the document can still be shown.
///
/// # Errors
///
/// Stream and syntax errors from reading the document.
pub fn element_to_json(element: &Element<'_>) -> Result<Json> {
    let element_type = element.element_type();
    let mut object = Map::new();
    if let Some(content) = element_type.content_attribute() {
        object.insert(content.to_string(), Json::String(element.content()?));
    }
    for (attribute, _) in element_type.descriptors() {
        let json = match element.value(attribute) {
            Ok(value) => value_to_json(value)?,
            Err(libearth_core::Error::MissingRequired { element: name, tag }) => {
                tracing::warn!(element = %name, %tag, "required element is missing");
                Json::Null
            }
            Err(e) => return Err(e.into()),
        };
        object.insert(attribute.to_string(), json);
    }
    Ok(Json::Object(object))
}

fn value_to_json(value: Value<'_>) -> Result<Json> {
    Ok(match value {
        Value::Text(text) => text.map_or(Json::Null, Json::String),
        Value::Content(text) => Json::String(text),
        Value::Child(Some(child)) => element_to_json(&child)?,
        Value::Child(None) => Json::Null,
        Value::Texts(list) => Json::Array(
            list.iter()
                .map(|text| text.map(Json::String))
                .collect::<libearth_core::Result<_>>()?,
        ),
        Value::Children(list) => {
            let mut items = Vec::new();
            for child in &list {
                items.push(element_to_json(&child?)?);
            }
            Json::Array(items)
        }
    })
}

/// Follows `path` from `root` and returns the value found there.
///
/// # Errors
///
/// [`Error::Query`] when a segment names no attribute, indexes a single
/// value, or is out of range; stream errors from reading the document.
pub fn resolve_path(root: Element<'_>, path: &str) -> Result<Json> {
    let mut segments = path.split('.').filter(|s| !s.is_empty()).peekable();
    let mut current = root;
    while let Some(attribute) = segments.next() {
        if current.element_type().descriptor(attribute).is_none()
            && current.element_type().content_attribute() != Some(attribute)
        {
            return Err(Error::query(
                path,
                format!("{} has no attribute {attribute:?}", current.element_type().name()),
            ));
        }
        let value = current.value(attribute)?;
        let index = match segments.peek().map(|s| s.parse::<usize>()) {
            Some(Ok(index)) => {
                segments.next();
                Some(index)
            }
            _ => None,
        };
        let last = segments.peek().is_none();
        let next = match (value, index) {
            (value, None) if last => return value_to_json(value),
            (Value::Child(Some(child)), None) => child,
            (Value::Children(list), Some(index)) => list
                .get(index)?
                .ok_or_else(|| Error::query(path, format!("{attribute}.{index} is out of range")))?,
            (Value::Texts(list), Some(index)) if last => {
                return list.get(index)?.map(Json::String).ok_or_else(|| {
                    Error::query(path, format!("{attribute}.{index} is out of range"))
                });
            }
            (Value::Child(None), None) => {
                return Err(Error::query(path, format!("<{attribute}> is absent")));
            }
            (_, Some(_)) => {
                return Err(Error::query(path, format!("{attribute} is not a list")));
            }
            (_, None) => {
                return Err(Error::query(path, format!("{attribute} has no attributes")));
            }
        };
        current = next;
    }
    element_to_json(&current)
}

/// Reads `file` against the schema and writes the values at `paths`, or
/// the whole document as JSON when no path is given.
///
/// String results are written raw, one per line; everything else as JSON.
///
/// # Errors
///
/// Schema, stream, and query errors, and failures writing to `out`.
pub fn run_query(
    doc_type: &DocumentType,
    file: &Path,
    paths: &[String],
    chunk_size: usize,
    out: &mut dyn Write,
) -> Result<()> {
    let reader = BufReader::with_capacity(chunk_size, File::open(file)?);
    let document = Document::from_reader(doc_type, reader)?;
    tracing::debug!(file = %file.display(), paths = paths.len(), "querying document");

    if paths.is_empty() {
        let json = element_to_json(&document.root())?;
        serde_json::to_writer_pretty(&mut *out, &json)?;
        writeln!(out)?;
        return Ok(());
    }
    for path in paths {
        match resolve_path(document.root(), path)? {
            Json::String(text) => writeln!(out, "{text}")?,
            json => writeln!(out, "{json}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use libearth_schema::{Descriptor, ElementType};

    const FEED: &str = "<feed><title>Earth</title>\
        <category>a</category><category>b</category>\
        <entry><id>1</id><title>One</title><content>Hi</content></entry>\
        <entry><id>2</id></entry></feed>";

    fn feed_type() -> DocumentType {
        let text = ElementType::builder("Text").content("value").build().unwrap();
        let entry = ElementType::builder("Entry")
            .field("id", Descriptor::text("id").required())
            .field("title", Descriptor::text("title"))
            .field("content", Descriptor::child("content", text))
            .build()
            .unwrap();
        let feed = ElementType::builder("Feed")
            .field("title", Descriptor::text("title"))
            .field("categories", Descriptor::text("category").multiple())
            .field("entries", Descriptor::child("entry", entry).multiple())
            .build()
            .unwrap();
        DocumentType::new("feed", feed).unwrap()
    }

    fn query(path: &str) -> Result<Json> {
        let doc = Document::parse(&feed_type(), vec![FEED]).unwrap();
        resolve_path(doc.root(), path)
    }

    // ------------------------------------------------------------------------
    // resolve_path tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_text() {
        assert_eq!(query("title").unwrap(), Json::from("Earth"));
        assert_eq!(query("entries.0.title").unwrap(), Json::from("One"));
        assert_eq!(query("entries.1.title").unwrap(), Json::Null);
    }

    #[test]
    fn test_resolve_lists() {
        assert_eq!(query("categories").unwrap(), serde_json::json!(["a", "b"]));
        assert_eq!(query("categories.1").unwrap(), Json::from("b"));
        assert_eq!(query("entries").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_nested_content() {
        assert_eq!(query("entries.0.content.value").unwrap(), Json::from("Hi"));
        assert_eq!(
            query("entries.0.content").unwrap(),
            serde_json::json!({"value": "Hi"})
        );
    }

    #[test]
    fn test_resolve_errors() {
        let err = query("entries.9.title").unwrap_err();
        assert!(err.to_string().contains("entries.9 is out of range"));
        let err = query("entries.9").unwrap_err();
        assert!(err.to_string().contains("entries.9 is out of range"));
        let err = query("categories.5").unwrap_err();
        assert!(err.to_string().contains("categories.5 is out of range"));
        let err = query("nope").unwrap_err();
        assert!(err.to_string().contains("no attribute"));
        let err = query("title.0").unwrap_err();
        assert!(err.to_string().contains("not a list"));
        let err = query("entries.1.content.value").unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    // ------------------------------------------------------------------------
    // element_to_json tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_whole_document_json() {
        let doc = Document::parse(&feed_type(), vec![FEED]).unwrap();
        let json = element_to_json(&doc.root()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Earth",
                "categories": ["a", "b"],
                "entries": [
                    {"id": "1", "title": "One", "content": {"value": "Hi"}},
                    {"id": "2", "title": null, "content": null},
                ],
            })
        );
    }

    #[test]
    fn test_missing_required_renders_null() {
        let xml = "<feed><entry><title>x</title></entry></feed>";
        let doc = Document::parse(&feed_type(), vec![xml]).unwrap();
        let json = element_to_json(&doc.root()).unwrap();
        assert_eq!(json["entries"][0]["id"], Json::Null);
        assert_eq!(json["entries"][0]["title"], Json::from("x"));
    }

    // ------------------------------------------------------------------------
    // run_query tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_run_query_writes_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("feed.xml");
        std::fs::write(&file, FEED).unwrap();

        let mut out = Vec::new();
        let paths = vec!["title".to_string(), "categories".to_string()];
        run_query(&feed_type(), &file, &paths, 8, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Earth\n[\"a\",\"b\"]\n");
    }

    #[test]
    fn test_run_query_missing_file() {
        let mut out = Vec::new();
        let err = run_query(&feed_type(), Path::new("/nonexistent.xml"), &[], 8, &mut out);
        assert!(matches!(err, Err(Error::Io(_))));
    }
}
