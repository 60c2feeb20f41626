//! Declarative schema for a pulling DOM parser of XML.
//!
//! There are two well-known ways to parse XML. A DOM parser reads the whole
//! document into a tree: easy to traverse, but nothing can be streamed and
//! memory is spent on data nobody looks at. A SAX parser emits events: cheap,
//! but the caller is left with unstructured data.
//!
//! This crate mixes them. A document is exposed as a tree, but the stream
//! behind it is consumed just in time, when a child that has not been read
//! yet is requested. That only works when the parser knows the shape of the
//! document in advance, so each document is declared with a schema, a bit
//! like an ORM for XML.
//!
//! # Modules
//!
//! - [`descriptor`]: Declarations of possible children
//! - [`element_type`]: Element and document declarations
//! - [`document`]: Lazily parsed documents and element handles
//! - [`list`]: Lazy lists for multiple children
//! - [`source`]: Chunked byte sources
//!
//! # Example
//!
//! Given a small document:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <person>
//!   <name>Hong Minhee</name>
//!   <url>http://dahlia.kr/</url>
//!   <url>https://github.com/dahlia</url>
//!   <dob>1988-08-04</dob>
//! </person>
//! ```
//!
//! its schema and lazy reading look like this:
//!
//! ```rust
//! use libearth_schema::{Descriptor, Document, DocumentType, ElementType};
//!
//! let url = ElementType::builder("Url").content("value").build().unwrap();
//! let date = ElementType::builder("Date").content("value").build().unwrap();
//! let person = ElementType::builder("Person")
//!     .field("name", Descriptor::text("name"))
//!     .field("url", Descriptor::child("url", url).multiple())
//!     .field("dob", Descriptor::child("dob", date))
//!     .build()
//!     .unwrap();
//! let doc_type = DocumentType::new("person", person).unwrap();
//!
//! let xml = "<person><name>Hong Minhee</name>\
//!            <url>http://dahlia.kr/</url><url>https://github.com/dahlia</url>\
//!            <dob>1988-08-04</dob></person>";
//! // Feed it in 16-byte chunks; only what is needed gets read.
//! let chunks: Vec<&[u8]> = xml.as_bytes().chunks(16).collect();
//! let doc = Document::parse(&doc_type, chunks).unwrap();
//!
//! let person = doc.root();
//! assert_eq!(person.text("name").unwrap().as_deref(), Some("Hong Minhee"));
//! assert_eq!(person.children("url").unwrap().len().unwrap(), 2);
//! let dob = person.child("dob").unwrap().unwrap();
//! assert_eq!(dob.content().unwrap(), "1988-08-04");
//! ```

pub mod descriptor;
pub mod document;
pub mod element_type;
mod handler;
pub mod list;
mod proptests;
pub mod source;

pub use descriptor::{Descriptor, DescriptorKind};
pub use document::{Document, Element, Value};
pub use element_type::{DocumentType, ElementType, ElementTypeBuilder};
pub use list::{ElementList, Iter, ListItem};
pub use source::ChunkReader;
