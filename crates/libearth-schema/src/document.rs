//! Lazily parsed documents and element handles.
//!
//! A [`Document`] owns the XML stream and the element tree built from it so
//! far. Nothing is read up front except the start of the document element;
//! every accessor on [`Element`] pulls events from the stream only until the
//! requested value is available or its element has ended.
//!
//! # Example
//!
//! ```rust
//! use libearth_schema::{Descriptor, Document, DocumentType, ElementType};
//!
//! let url = ElementType::builder("Url").content("value").build().unwrap();
//! let person = ElementType::builder("Person")
//!     .field("name", Descriptor::text("name"))
//!     .field("url", Descriptor::child("url", url).multiple())
//!     .build()
//!     .unwrap();
//! let doc_type = DocumentType::new("person", person).unwrap();
//!
//! let chunks = vec![
//!     "<person><name>Hong Minhee</name>",
//!     "<url>http://dahlia.kr/</url>",
//!     "<url>https://github.com/dahlia</url></person>",
//! ];
//! let doc = Document::parse(&doc_type, chunks).unwrap();
//! let root = doc.root();
//!
//! assert_eq!(root.text("name").unwrap().as_deref(), Some("Hong Minhee"));
//! let urls = root.children("url").unwrap();
//! assert_eq!(urls.get(1).unwrap().unwrap().content().unwrap(), "https://github.com/dahlia");
//! assert_eq!(urls.len().unwrap(), 2);
//! ```

use crate::descriptor::{Descriptor, DescriptorKind};
use crate::element_type::{accepts, DocumentType, ElementType};
use crate::handler::{Node, NodeId, Slot, Tree, XmlEvent, ROOT};
use crate::list::ElementList;
use crate::source::ChunkReader;
use libearth_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead};
use std::sync::Arc;

// ============================================================================
// Event source
// ============================================================================

/// quick-xml reader translating its events into [`XmlEvent`]s.
struct EventSource<'s> {
    reader: Reader<Box<dyn BufRead + 's>>,
    buf: Vec<u8>,
    // End event owed for an empty-element tag
    pending: Option<XmlEvent>,
}

impl<'s> EventSource<'s> {
    fn new(input: Box<dyn BufRead + 's>) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            pending: None,
        }
    }

    fn next_event(&mut self) -> Result<XmlEvent> {
        if let Some(event) = self.pending.take() {
            return Ok(event);
        }
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => XmlEvent::Start(decode_name(start.name().as_ref())?),
                Event::End(end) => XmlEvent::End(decode_name(end.name().as_ref())?),
                Event::Empty(empty) => {
                    let name = decode_name(empty.name().as_ref())?;
                    self.pending = Some(XmlEvent::End(name.clone()));
                    XmlEvent::Start(name)
                }
                Event::Text(text) => XmlEvent::Text(text.unescape()?.into_owned()),
                Event::CData(cdata) => {
                    let bytes = cdata.into_inner().into_owned();
                    XmlEvent::Text(String::from_utf8(bytes).map_err(|e| {
                        Error::syntax(format!("CDATA section is not valid UTF-8: {e}"))
                    })?)
                }
                Event::Eof => XmlEvent::Eof,
                // Declarations, comments, processing instructions, doctypes
                _ => continue,
            };
            return Ok(event);
        }
    }
}

fn decode_name(name: &[u8]) -> Result<String> {
    std::str::from_utf8(name)
        .map(str::to_string)
        .map_err(|e| Error::syntax(format!("tag name is not valid UTF-8: {e}")))
}

// ============================================================================
// Document
// ============================================================================

/// Access to the shared parse state, independent of the source lifetime.
pub(crate) trait Pull {
    fn tree(&self) -> &RefCell<Tree>;

    /// Reads and applies one event. Returns `false` once the stream has
    /// ended.
    fn pull(&self) -> Result<bool>;
}

/// An XML document read lazily against a [`DocumentType`].
///
/// Documents are single-threaded: element handles borrow the document and
/// reading through them advances the shared stream.
pub struct Document<'s> {
    doc_type: DocumentType,
    tree: RefCell<Tree>,
    source: RefCell<Option<EventSource<'s>>>,
}

impl<'s> Document<'s> {
    /// Starts reading a document from an iterable of byte chunks.
    ///
    /// Chunks can be anything byte-like (`&str`, `String`, `Vec<u8>`, ...).
    /// Only the chunks up to the start of the document element are consumed
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if the stream ends before a document element
    /// appears or the document element has the wrong tag.
    pub fn parse<I, T>(doc_type: &DocumentType, chunks: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 's,
        T: AsRef<[u8]> + 's,
    {
        let chunks = chunks.into_iter().map(Ok::<T, io::Error>);
        Self::from_reader(doc_type, ChunkReader::new(chunks))
    }

    /// Starts reading a document from chunks that may fail, such as a
    /// repository read.
    ///
    /// # Errors
    ///
    /// Same as [`Document::parse`], plus I/O errors from the first chunks.
    pub fn parse_fallible<I, T>(doc_type: &DocumentType, chunks: I) -> Result<Self>
    where
        I: IntoIterator<Item = io::Result<T>>,
        I::IntoIter: 's,
        T: AsRef<[u8]> + 's,
    {
        Self::from_reader(doc_type, ChunkReader::new(chunks.into_iter()))
    }

    /// Starts reading a document from any buffered reader.
    ///
    /// # Errors
    ///
    /// Same as [`Document::parse`].
    pub fn from_reader<R>(doc_type: &DocumentType, reader: R) -> Result<Self>
    where
        R: BufRead + 's,
    {
        let document = Self {
            doc_type: doc_type.clone(),
            tree: RefCell::new(Tree::new(doc_type)),
            source: RefCell::new(Some(EventSource::new(Box::new(reader)))),
        };
        while !document.tree.borrow().root_started() {
            if !document.pull()? {
                break;
            }
        }
        log::debug!("opened <{}> document", doc_type.tag());
        Ok(document)
    }

    /// Creates a document without a stream, for building elements in code.
    pub fn empty(doc_type: &DocumentType) -> Document<'static> {
        Document {
            doc_type: doc_type.clone(),
            tree: RefCell::new(Tree::detached(doc_type)),
            source: RefCell::new(None),
        }
    }

    /// The document element.
    pub fn root(&self) -> Element<'_> {
        Element {
            doc: self,
            id: ROOT,
        }
    }

    /// The declaration this document is read against.
    pub fn doc_type(&self) -> &DocumentType {
        &self.doc_type
    }

    /// Whether the whole stream has been consumed.
    pub fn is_complete(&self) -> bool {
        self.tree.borrow().is_finished()
    }

    /// Consumes the rest of the stream, validating the whole document.
    ///
    /// # Errors
    ///
    /// Returns the first syntax or I/O error found in the remaining stream.
    pub fn read_to_end(&self) -> Result<()> {
        while self.pull()? {}
        Ok(())
    }
}

impl<'s> Pull for Document<'s> {
    fn tree(&self) -> &RefCell<Tree> {
        &self.tree
    }

    fn pull(&self) -> Result<bool> {
        {
            let tree = self.tree.borrow();
            if let Some(message) = tree.halted() {
                return Err(Error::Halted {
                    message: message.to_string(),
                });
            }
            if tree.is_finished() {
                return Ok(false);
            }
        }

        let mut source = self.source.borrow_mut();
        let Some(events) = source.as_mut() else {
            return Ok(false);
        };

        let mut step = || {
            events.next_event().and_then(|event| {
                log::trace!(
                    "event {event:?} at depth {}",
                    self.tree.borrow().depth()
                );
                self.tree.borrow_mut().handle(event)
            })
        };
        let mut result = step();
        // Once the document element is closed only trailing misc remains, so
        // read through to the end and release the stream.
        while result.is_ok() {
            let tree = self.tree.borrow();
            if !tree.root_closed() || tree.is_finished() {
                break;
            }
            drop(tree);
            result = step();
        }
        match result {
            Ok(()) => {
                if self.tree.borrow().is_finished() {
                    log::debug!("<{}> document fully read", self.doc_type.tag());
                    *source = None;
                }
                Ok(true)
            }
            Err(err) => {
                log::warn!("<{}> document halted: {err}", self.doc_type.tag());
                self.tree.borrow_mut().halt(err.to_string());
                *source = None;
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("tag", &self.doc_type.tag())
            .field("complete", &self.is_complete())
            .finish()
    }
}

// ============================================================================
// Element
// ============================================================================

/// Dynamically typed value of one attribute, see [`Element::value`].
#[derive(Debug)]
pub enum Value<'d> {
    /// Single text child.
    Text(Option<String>),
    /// Multiple text children.
    Texts(ElementList<'d, String>),
    /// Single element child.
    Child(Option<Element<'d>>),
    /// Multiple element children.
    Children(ElementList<'d, Element<'d>>),
    /// Character data of the element itself.
    Content(String),
}

/// Handle to an element of a [`Document`].
///
/// Handles are cheap to copy. Reading through a handle may advance the
/// document's stream.
#[derive(Clone, Copy)]
pub struct Element<'d> {
    doc: &'d (dyn Pull + 'd),
    id: NodeId,
}

impl<'d> Element<'d> {
    fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        f(self.doc.tree().borrow().node(self.id))
    }

    fn with_node_mut<R>(&self, f: impl FnOnce(&mut Node) -> R) -> R {
        f(self.doc.tree().borrow_mut().node_mut(self.id))
    }

    /// The element's declaration.
    pub fn element_type(&self) -> Arc<ElementType> {
        self.with_node(|node| node.element_type.clone())
    }

    /// The parent element, `None` for the document element.
    pub fn parent(&self) -> Option<Element<'d>> {
        self.with_node(|node| node.parent).map(|id| Element { doc: self.doc, id })
    }

    /// Whether the element has been completely read.
    pub fn is_closed(&self) -> bool {
        self.with_node(|node| node.closed)
    }

    /// Whether both handles belong to the same document.
    fn same_document(&self, other: &Element<'_>) -> bool {
        std::ptr::eq(self.doc.tree(), other.doc.tree())
    }

    fn descriptor(&self, attribute: &str) -> Result<Descriptor> {
        let element_type = self.element_type();
        element_type
            .descriptor(attribute)
            .cloned()
            .ok_or_else(|| Error::UnknownAttribute {
                element: element_type.name().to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn expect_kind(
        &self,
        attribute: &str,
        descriptor: &Descriptor,
        text: bool,
        multiple: bool,
    ) -> Result<()> {
        let is_text = matches!(descriptor.kind(), DescriptorKind::Text);
        if is_text == text && descriptor.is_multiple() == multiple {
            return Ok(());
        }
        let arity = if multiple { "multiple " } else { "" };
        let kind = if text { "Text" } else { "Child" };
        Err(Error::type_mismatch(
            format!("{arity}{kind} descriptor"),
            format!(
                "{}.{attribute} declared as {}",
                self.element_type().name(),
                descriptor.describe()
            ),
        ))
    }

    /// Advances the stream one event. Used by lazy lists.
    pub(crate) fn pull(&self) -> Result<bool> {
        self.doc.pull()
    }

    /// Pulls events until `ready` holds, the element is closed, or the
    /// stream has ended.
    fn wait(&self, ready: impl Fn(&Node) -> bool) -> Result<()> {
        loop {
            if self.with_node(|node| node.closed || ready(node)) {
                return Ok(());
            }
            if !self.doc.pull()? {
                return Ok(());
            }
        }
    }

    fn check_required(&self, attribute: &str, descriptor: &Descriptor) -> Result<()> {
        let missing = self.with_node(|node| node.closed && !node.data.contains_key(attribute));
        if descriptor.is_required() && missing {
            return Err(Error::MissingRequired {
                element: self.element_type().name().to_string(),
                tag: descriptor.tag().to_string(),
            });
        }
        Ok(())
    }

    /// Reads a single text child.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] or [`Error::Type`] when `attribute` is not
    /// a single text descriptor, [`Error::MissingRequired`] when a required
    /// child is absent, and any stream error met while reading.
    pub fn text(&self, attribute: &str) -> Result<Option<String>> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, true, false)?;
        self.wait(|node| node.data.contains_key(attribute))?;
        self.check_required(attribute, &descriptor)?;
        Ok(self.with_node(|node| match node.data.get(attribute) {
            Some(Slot::Text(text)) => Some(text.clone()),
            _ => None,
        }))
    }

    /// Reads a single element child.
    ///
    /// The handle is returned as soon as the child's start tag is read; its
    /// own children are read lazily.
    ///
    /// # Errors
    ///
    /// Same as [`Element::text`].
    pub fn child(&self, attribute: &str) -> Result<Option<Element<'d>>> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, false, false)?;
        self.wait(|node| node.data.contains_key(attribute))?;
        self.check_required(attribute, &descriptor)?;
        Ok(self.slot_child(attribute, 0))
    }

    /// Lazy list of multiple element children.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] or [`Error::Type`] when `attribute` is not
    /// a multiple child descriptor.
    pub fn children(&self, attribute: &str) -> Result<ElementList<'d, Element<'d>>> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, false, true)?;
        Ok(ElementList::new(*self, attribute))
    }

    /// Lazy list of multiple text children.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] or [`Error::Type`] when `attribute` is not
    /// a multiple text descriptor.
    pub fn texts(&self, attribute: &str) -> Result<ElementList<'d, String>> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, true, true)?;
        Ok(ElementList::new(*self, attribute))
    }

    /// Character data directly inside the element, `""` when there is none.
    ///
    /// Reads until the element's end tag.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] when the element type declares no content
    /// attribute, and any stream error met while reading.
    pub fn content(&self) -> Result<String> {
        let element_type = self.element_type();
        if !element_type.has_content() {
            return Err(Error::UnknownAttribute {
                element: element_type.name().to_string(),
                attribute: "<content>".to_string(),
            });
        }
        self.wait(|node| node.content.is_some())?;
        Ok(self.with_node(|node| node.content.clone().unwrap_or_default()))
    }

    /// Reads any attribute, including the content attribute.
    ///
    /// # Errors
    ///
    /// Same as the typed accessors.
    pub fn value(&self, attribute: &str) -> Result<Value<'d>> {
        let element_type = self.element_type();
        if element_type.content_attribute() == Some(attribute) {
            return self.content().map(Value::Content);
        }
        let descriptor = self.descriptor(attribute)?;
        let text = matches!(descriptor.kind(), DescriptorKind::Text);
        Ok(match (text, descriptor.is_multiple()) {
            (true, false) => Value::Text(self.text(attribute)?),
            (true, true) => Value::Texts(self.texts(attribute)?),
            (false, false) => Value::Child(self.child(attribute)?),
            (false, true) => Value::Children(self.children(attribute)?),
        })
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    /// Sets a single text child.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] or [`Error::Type`] when `attribute` is not
    /// a single text descriptor.
    pub fn set_text(&self, attribute: &str, value: impl Into<String>) -> Result<()> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, true, false)?;
        let value = value.into();
        self.with_node_mut(|node| {
            node.data.insert(attribute.to_string(), Slot::Text(value));
        });
        Ok(())
    }

    /// Replaces multiple text children.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] or [`Error::Type`] when `attribute` is not
    /// a multiple text descriptor.
    pub fn set_texts<I, S>(&self, attribute: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, true, true)?;
        let values = values.into_iter().map(Into::into).collect();
        self.with_node_mut(|node| {
            node.data.insert(attribute.to_string(), Slot::Texts(values));
        });
        Ok(())
    }

    /// Sets the element's character data.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] when the element type declares no content
    /// attribute.
    pub fn set_content(&self, value: impl Into<String>) -> Result<()> {
        let element_type = self.element_type();
        if !element_type.has_content() {
            return Err(Error::UnknownAttribute {
                element: element_type.name().to_string(),
                attribute: "<content>".to_string(),
            });
        }
        let value = value.into();
        self.with_node_mut(|node| node.content = Some(value));
        Ok(())
    }

    /// Creates a detached element of the type `attribute` declares, for use
    /// with [`Element::set_child`] or [`Element::set_children`].
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAttribute`] or [`Error::Type`] when `attribute` is not
    /// a child descriptor.
    pub fn new_child(&self, attribute: &str) -> Result<Element<'d>> {
        let descriptor = self.descriptor(attribute)?;
        let Some(element_type) = descriptor.element_type().cloned() else {
            return Err(Error::type_mismatch(
                "Child descriptor",
                format!("{}.{attribute} declared as Text", self.element_type().name()),
            ));
        };
        let id = self
            .doc
            .tree()
            .borrow_mut()
            .insert_detached(element_type, Some(self.id));
        Ok(Element { doc: self.doc, id })
    }

    fn check_child(&self, descriptor: &Descriptor, child: &Element<'_>) -> Result<()> {
        if !self.same_document(child) {
            return Err(Error::type_mismatch(
                "an element of the same document",
                "an element of another document",
            ));
        }
        let child_type = child.element_type();
        if !accepts(descriptor.kind(), &child_type) {
            return Err(Error::type_mismatch(
                descriptor.describe(),
                child_type.name().to_string(),
            ));
        }
        Ok(())
    }

    fn adopt(&self, child: &Element<'d>) {
        let parent = self.id;
        child.with_node_mut(|node| node.parent = Some(parent));
    }

    /// Sets a single element child.
    ///
    /// # Errors
    ///
    /// [`Error::Type`] when `child` is not of the declared element type or
    /// belongs to another document.
    pub fn set_child(&self, attribute: &str, child: Element<'d>) -> Result<()> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, false, false)?;
        self.check_child(&descriptor, &child)?;
        self.adopt(&child);
        self.with_node_mut(|node| {
            node.data.insert(attribute.to_string(), Slot::Child(child.id));
        });
        Ok(())
    }

    /// Replaces multiple element children.
    ///
    /// # Errors
    ///
    /// [`Error::Type`] when any child is not of the declared element type.
    pub fn set_children(&self, attribute: &str, children: &[Element<'d>]) -> Result<()> {
        let descriptor = self.descriptor(attribute)?;
        self.expect_kind(attribute, &descriptor, false, true)?;
        for child in children {
            self.check_child(&descriptor, child)?;
        }
        for child in children {
            self.adopt(child);
        }
        let ids = children.iter().map(|child| child.id).collect();
        self.with_node_mut(|node| {
            node.data.insert(attribute.to_string(), Slot::Children(ids));
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Slot access for lazy lists
    // ------------------------------------------------------------------------

    pub(crate) fn slot_len(&self, attribute: &str) -> usize {
        self.with_node(|node| node.data.get(attribute).map_or(0, Slot::len))
    }

    pub(crate) fn slot_child(&self, attribute: &str, index: usize) -> Option<Element<'d>> {
        let id = self.with_node(|node| match node.data.get(attribute) {
            Some(Slot::Child(id)) if index == 0 => Some(*id),
            Some(Slot::Children(ids)) => ids.get(index).copied(),
            _ => None,
        })?;
        Some(Element { doc: self.doc, id })
    }

    pub(crate) fn slot_text(&self, attribute: &str, index: usize) -> Option<String> {
        self.with_node(|node| match node.data.get(attribute) {
            Some(Slot::Text(text)) if index == 0 => Some(text.clone()),
            Some(Slot::Texts(texts)) => texts.get(index).cloned(),
            _ => None,
        })
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.element_type().name())
            .field("id", &self.id)
            .finish()
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.same_document(other)
    }
}

impl Eq for Element<'_> {}
