//! Event handler that grows the element tree as XML events arrive.
//!
//! The handler keeps a stack of parser contexts, one per open element. Each
//! context remembers which descriptor opened it and what value it reserved:
//! the new child element for `Child` descriptors, the owning element for
//! `Text` descriptors. Character data is buffered in the innermost context
//! and handed to the descriptor when the element ends.
//!
//! Elements live in an arena (`Tree::nodes`) and refer to each other by
//! index, which keeps parent links free of reference cycles.

use crate::descriptor::DescriptorKind;
use crate::element_type::{DocumentType, ElementType};
use libearth_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Index of an element in the arena.
pub(crate) type NodeId = usize;

/// The document element always occupies the first slot.
pub(crate) const ROOT: NodeId = 0;

/// Tokenizer-independent XML event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum XmlEvent {
    Start(String),
    End(String),
    Text(String),
    Eof,
}

/// Value stored for one attribute of an element.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Text(String),
    Texts(Vec<String>),
    Child(NodeId),
    Children(Vec<NodeId>),
}

impl Slot {
    pub(crate) fn len(&self) -> usize {
        match self {
            Slot::Text(_) | Slot::Child(_) => 1,
            Slot::Texts(texts) => texts.len(),
            Slot::Children(children) => children.len(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) element_type: Arc<ElementType>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) content: Option<String>,
    pub(crate) data: HashMap<String, Slot>,
    /// Set once the end tag was read, or immediately for elements that do
    /// not come from the stream.
    pub(crate) closed: bool,
}

impl Node {
    fn new(element_type: Arc<ElementType>, parent: Option<NodeId>) -> Self {
        Self {
            element_type,
            parent,
            content: None,
            data: HashMap::new(),
            closed: false,
        }
    }
}

/// What an open element context is filling in.
#[derive(Debug)]
enum Frame {
    Element(NodeId),
    Text {
        owner: NodeId,
        attribute: String,
        multiple: bool,
    },
    /// Nested inside a text-only child; dropped with its character data.
    Ignored,
}

#[derive(Debug)]
struct ParserContext {
    tag: String,
    frame: Frame,
    content_buffer: String,
}

/// Element arena plus the parser context stack.
#[derive(Debug)]
pub(crate) struct Tree {
    document_tag: String,
    nodes: Vec<Node>,
    stack: Vec<ParserContext>,
    root_started: bool,
    root_closed: bool,
    finished: bool,
    halted: Option<String>,
}

impl Tree {
    /// Creates a tree waiting for the document element.
    pub(crate) fn new(doc_type: &DocumentType) -> Self {
        Self {
            document_tag: doc_type.tag().to_string(),
            nodes: vec![Node::new(doc_type.root().clone(), None)],
            stack: Vec::new(),
            root_started: false,
            root_closed: false,
            finished: false,
            halted: None,
        }
    }

    /// Creates a tree that will never receive events.
    pub(crate) fn detached(doc_type: &DocumentType) -> Self {
        let mut tree = Self::new(doc_type);
        tree.nodes[ROOT].closed = true;
        tree.root_started = true;
        tree.root_closed = true;
        tree.finished = true;
        tree
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Adds an element that is not part of the stream.
    pub(crate) fn insert_detached(
        &mut self,
        element_type: Arc<ElementType>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let mut node = Node::new(element_type, parent);
        node.closed = true;
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn root_started(&self) -> bool {
        self.root_started
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn halted(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub(crate) fn halt(&mut self, message: String) {
        self.halted = Some(message);
    }

    /// Number of currently open elements.
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Applies one event.
    pub(crate) fn handle(&mut self, event: XmlEvent) -> Result<()> {
        match event {
            XmlEvent::Start(name) => self.start_element(name),
            XmlEvent::Text(text) => self.characters(&text),
            XmlEvent::End(name) => self.end_element(&name),
            XmlEvent::Eof => self.end_document(),
        }
    }

    fn start_element(&mut self, name: String) -> Result<()> {
        let parent = match self.stack.last().map(|context| &context.frame) {
            None => return self.start_document_element(name),
            Some(Frame::Element(id)) => *id,
            Some(Frame::Text { .. } | Frame::Ignored) => {
                log::trace!("ignoring <{name}> inside text-only element");
                self.push(name, Frame::Ignored);
                return Ok(());
            }
        };

        let element_type = self.nodes[parent].element_type.clone();
        let Some((attribute, descriptor)) = element_type.lookup_tag(&name) else {
            return Err(Error::syntax(format!("unexpected element: {name}")));
        };

        let frame = match descriptor.kind() {
            DescriptorKind::Child(child_type) => {
                self.nodes.push(Node::new(child_type.clone(), Some(parent)));
                let child = self.nodes.len() - 1;
                let data = &mut self.nodes[parent].data;
                if descriptor.is_multiple() {
                    match data
                        .entry(attribute.to_string())
                        .or_insert_with(|| Slot::Children(Vec::new()))
                    {
                        Slot::Children(children) => children.push(child),
                        other => *other = Slot::Children(vec![child]),
                    }
                } else {
                    data.insert(attribute.to_string(), Slot::Child(child));
                }
                Frame::Element(child)
            }
            DescriptorKind::Text => Frame::Text {
                owner: parent,
                attribute: attribute.to_string(),
                multiple: descriptor.is_multiple(),
            },
        };

        log::trace!("<{name}> opened at depth {}", self.stack.len());
        self.push(name, frame);
        Ok(())
    }

    fn start_document_element(&mut self, name: String) -> Result<()> {
        if self.root_closed {
            return Err(Error::syntax(format!(
                "junk after document element: <{name}>"
            )));
        }
        if name != self.document_tag {
            return Err(Error::syntax(format!(
                "document element must be {}, not {name}",
                self.document_tag
            )));
        }
        log::debug!("document element <{name}> opened");
        self.root_started = true;
        self.push(name, Frame::Element(ROOT));
        Ok(())
    }

    fn push(&mut self, tag: String, frame: Frame) {
        self.stack.push(ParserContext {
            tag,
            frame,
            content_buffer: String::new(),
        });
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        let Some(context) = self.stack.last_mut() else {
            // Only whitespace may surround the document element
            let junk = text.trim();
            if junk.is_empty() {
                return Ok(());
            }
            let place = if self.root_closed { "after" } else { "before" };
            return Err(Error::syntax(format!(
                "junk {place} document element: {junk:?}"
            )));
        };
        if !matches!(context.frame, Frame::Ignored) {
            context.content_buffer.push_str(text);
        }
        Ok(())
    }

    /// Whether the document element's end tag has been read.
    pub(crate) fn root_closed(&self) -> bool {
        self.root_closed
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        let Some(context) = self.stack.pop() else {
            return Err(Error::syntax(format!("unexpected end tag: </{name}>")));
        };
        if context.tag != name {
            return Err(Error::syntax(format!(
                "expected </{}>, not </{name}>",
                context.tag
            )));
        }

        match context.frame {
            Frame::Element(id) => {
                let node = &mut self.nodes[id];
                if node.element_type.has_content() {
                    node.content = Some(context.content_buffer);
                }
                node.closed = true;
                if id == ROOT {
                    log::debug!("document element </{name}> closed");
                    self.root_closed = true;
                }
            }
            Frame::Text {
                owner,
                attribute,
                multiple,
            } => {
                let text = context.content_buffer;
                let data = &mut self.nodes[owner].data;
                if multiple {
                    match data
                        .entry(attribute)
                        .or_insert_with(|| Slot::Texts(Vec::new()))
                    {
                        Slot::Texts(texts) => texts.push(text),
                        other => *other = Slot::Texts(vec![text]),
                    }
                } else {
                    data.insert(attribute, Slot::Text(text));
                }
            }
            Frame::Ignored => {}
        }
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.finished = true;
        if let Some(open) = self.stack.last() {
            return Err(Error::syntax(format!(
                "unexpected end of document: <{}> is not closed",
                open.tag
            )));
        }
        if !self.root_started {
            return Err(Error::syntax(format!(
                "missing document element <{}>",
                self.document_tag
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    fn doc_type() -> DocumentType {
        let url = ElementType::builder("Url").content("value").build().unwrap();
        let person = ElementType::builder("Person")
            .field("name", Descriptor::text("name"))
            .field("nick", Descriptor::text("nick").multiple())
            .field("url", Descriptor::child("url", url).multiple())
            .content("note")
            .build()
            .unwrap();
        DocumentType::new("person", person).unwrap()
    }

    fn start(name: &str) -> XmlEvent {
        XmlEvent::Start(name.to_string())
    }

    fn end(name: &str) -> XmlEvent {
        XmlEvent::End(name.to_string())
    }

    fn text(value: &str) -> XmlEvent {
        XmlEvent::Text(value.to_string())
    }

    fn feed(tree: &mut Tree, events: Vec<XmlEvent>) -> Result<()> {
        for event in events {
            tree.handle(event)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Document element
    // ------------------------------------------------------------------------

    #[test]
    fn test_wrong_document_element() {
        let mut tree = Tree::new(&doc_type());
        let err = tree.handle(start("people")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error: document element must be person, not people"
        );
    }

    #[test]
    fn test_root_content_and_close() {
        let mut tree = Tree::new(&doc_type());
        feed(
            &mut tree,
            vec![start("person"), text("hello "), text("world"), end("person")],
        )
        .unwrap();
        let root = tree.node(ROOT);
        assert!(root.closed);
        assert_eq!(root.content.as_deref(), Some("hello world"));
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_second_document_element_rejected() {
        let mut tree = Tree::new(&doc_type());
        feed(&mut tree, vec![start("person"), end("person")]).unwrap();
        let err = tree.handle(start("person")).unwrap_err();
        assert!(err.to_string().contains("junk after document element"));
    }

    #[test]
    fn test_text_after_document_element_rejected() {
        let mut tree = Tree::new(&doc_type());
        feed(&mut tree, vec![start("person"), end("person"), text("\n  ")]).unwrap();
        let err = tree.handle(text("trailing junk\n")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error: junk after document element: \"trailing junk\""
        );
    }

    #[test]
    fn test_text_before_document_element_rejected() {
        let mut tree = Tree::new(&doc_type());
        tree.handle(text("\n")).unwrap();
        let err = tree.handle(text("hello")).unwrap_err();
        assert!(err.to_string().contains("junk before document element"));
    }

    #[test]
    fn test_eof_without_document_element() {
        let mut tree = Tree::new(&doc_type());
        let err = tree.handle(XmlEvent::Eof).unwrap_err();
        assert!(err.to_string().contains("missing document element <person>"));
        assert!(tree.is_finished());
    }

    #[test]
    fn test_eof_with_open_elements() {
        let mut tree = Tree::new(&doc_type());
        feed(&mut tree, vec![start("person"), start("name")]).unwrap();
        let err = tree.handle(XmlEvent::Eof).unwrap_err();
        assert!(err.to_string().contains("<name> is not closed"));
    }

    // ------------------------------------------------------------------------
    // Descriptors
    // ------------------------------------------------------------------------

    #[test]
    fn test_unexpected_element() {
        let mut tree = Tree::new(&doc_type());
        tree.handle(start("person")).unwrap();
        let err = tree.handle(start("email")).unwrap_err();
        assert_eq!(err.to_string(), "Syntax error: unexpected element: email");
    }

    #[test]
    fn test_text_descriptor_stores_on_end() {
        let mut tree = Tree::new(&doc_type());
        feed(&mut tree, vec![start("person"), start("name"), text("Hong")]).unwrap();
        assert!(tree.node(ROOT).data.get("name").is_none());
        tree.handle(end("name")).unwrap();
        assert!(matches!(
            tree.node(ROOT).data.get("name"),
            Some(Slot::Text(name)) if name == "Hong"
        ));
    }

    #[test]
    fn test_multiple_text_appends() {
        let mut tree = Tree::new(&doc_type());
        feed(
            &mut tree,
            vec![
                start("person"),
                start("nick"),
                text("a"),
                end("nick"),
                start("nick"),
                text("b"),
                end("nick"),
            ],
        )
        .unwrap();
        let Some(Slot::Texts(nicks)) = tree.node(ROOT).data.get("nick") else {
            unreachable!("Expected texts slot");
        };
        assert_eq!(nicks, &vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_child_created_on_start() {
        let mut tree = Tree::new(&doc_type());
        feed(&mut tree, vec![start("person"), start("url")]).unwrap();
        let Some(Slot::Children(children)) = tree.node(ROOT).data.get("url") else {
            unreachable!("Expected children slot");
        };
        assert_eq!(children.len(), 1);
        let child = tree.node(children[0]);
        assert_eq!(child.parent, Some(ROOT));
        assert!(!child.closed);

        feed(&mut tree, vec![text("http://example.com/"), end("url")]).unwrap();
        let child = tree.node(1);
        assert!(child.closed);
        assert_eq!(child.content.as_deref(), Some("http://example.com/"));
    }

    #[test]
    fn test_nested_elements_in_text_are_ignored() {
        let mut tree = Tree::new(&doc_type());
        feed(
            &mut tree,
            vec![
                start("person"),
                start("name"),
                text("Hong "),
                start("b"),
                text("bold"),
                end("b"),
                text("Minhee"),
                end("name"),
            ],
        )
        .unwrap();
        assert!(matches!(
            tree.node(ROOT).data.get("name"),
            Some(Slot::Text(name)) if name == "Hong Minhee"
        ));
    }

    #[test]
    fn test_root_text_excludes_child_text() {
        let mut tree = Tree::new(&doc_type());
        feed(
            &mut tree,
            vec![
                start("person"),
                text("a"),
                start("name"),
                text("x"),
                end("name"),
                text("b"),
                end("person"),
            ],
        )
        .unwrap();
        assert_eq!(tree.node(ROOT).content.as_deref(), Some("ab"));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut tree = Tree::new(&doc_type());
        feed(&mut tree, vec![start("person"), start("name")]).unwrap();
        let err = tree.handle(end("person")).unwrap_err();
        assert!(err.to_string().contains("expected </name>, not </person>"));
    }

    #[test]
    fn test_detached_tree_is_closed() {
        let tree = Tree::detached(&doc_type());
        assert!(tree.is_finished());
        assert!(tree.node(ROOT).closed);
    }
}
