//! Element type declarations.
//!
//! An [`ElementType`] is the declarative half of the pulling parser: it
//! lists the children an element may have, keyed by attribute name, and
//! optionally an attribute exposing the element's own character data.
//! A [`DocumentType`] adds the tag the document element must carry.
//!
//! Element types are immutable once built and shared through [`Arc`], so a
//! single declaration serves any number of documents.
//!
//! # Example
//!
//! ```rust
//! use libearth_schema::{Descriptor, DocumentType, ElementType};
//!
//! let url = ElementType::builder("Url").content("value").build().unwrap();
//! let date = ElementType::builder("Date").content("value").build().unwrap();
//! let person = ElementType::builder("Person")
//!     .field("name", Descriptor::text("name"))
//!     .field("url", Descriptor::child("url", url).multiple())
//!     .field("dob", Descriptor::child("dob", date))
//!     .build()
//!     .unwrap();
//!
//! let doc_type = DocumentType::new("person", person).unwrap();
//! assert_eq!(doc_type.tag(), "person");
//! assert_eq!(doc_type.root().lookup_tag("url").unwrap().0, "url");
//! ```

use crate::descriptor::{Descriptor, DescriptorKind};
use libearth_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Declaration of an element: its children and its content attribute.
#[derive(Debug)]
pub struct ElementType {
    name: String,
    descriptors: Vec<(String, Descriptor)>,
    content: Option<String>,
    // tag -> index into `descriptors`
    child_tags: HashMap<String, usize>,
    // attribute -> index into `descriptors`
    attributes: HashMap<String, usize>,
}

impl ElementType {
    /// Starts declaring an element type with the given name.
    pub fn builder(name: impl Into<String>) -> ElementTypeBuilder {
        ElementTypeBuilder {
            name: name.into(),
            descriptors: Vec::new(),
            content: None,
        }
    }

    /// Name of the element type, used in diagnostics and type checks.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute exposing the element's character data, if declared.
    pub fn content_attribute(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Whether the element's character data is kept.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Iterates over `(attribute, descriptor)` pairs in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.descriptors
            .iter()
            .map(|(attr, desc)| (attr.as_str(), desc))
    }

    /// Looks up a descriptor by attribute name.
    pub fn descriptor(&self, attribute: &str) -> Option<&Descriptor> {
        self.attributes
            .get(attribute)
            .map(|&index| &self.descriptors[index].1)
    }

    /// Looks up the `(attribute, descriptor)` pair declared for a child tag.
    pub fn lookup_tag(&self, tag: &str) -> Option<(&str, &Descriptor)> {
        self.child_tags.get(tag).map(|&index| {
            let (attr, desc) = &self.descriptors[index];
            (attr.as_str(), desc)
        })
    }
}

/// Builder for [`ElementType`].
#[derive(Debug)]
pub struct ElementTypeBuilder {
    name: String,
    descriptors: Vec<(String, Descriptor)>,
    content: Option<String>,
}

impl ElementTypeBuilder {
    /// Declares a child under the given attribute name.
    pub fn field(mut self, attribute: impl Into<String>, descriptor: Descriptor) -> Self {
        self.descriptors.push((attribute.into(), descriptor));
        self
    }

    /// Declares the attribute that exposes the element's character data.
    pub fn content(mut self, attribute: impl Into<String>) -> Self {
        self.content = Some(attribute.into());
        self
    }

    /// Validates the declaration and indexes descriptors by tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when the name is empty, a descriptor is
    /// both required and multiple, or tags or attribute names collide.
    pub fn build(self) -> Result<Arc<ElementType>> {
        if self.name.trim().is_empty() {
            return Err(Error::schema("element type name must not be empty"));
        }

        let mut child_tags = HashMap::new();
        let mut attributes = HashMap::new();
        for (index, (attr, desc)) in self.descriptors.iter().enumerate() {
            if attr.is_empty() {
                return Err(Error::schema(format!(
                    "{}: attribute name must not be empty",
                    self.name
                )));
            }
            if desc.tag().is_empty() {
                return Err(Error::schema(format!(
                    "{}.{attr}: tag must not be empty",
                    self.name
                )));
            }
            if desc.is_required() && desc.is_multiple() {
                return Err(Error::schema(format!(
                    "{}.{attr}: required and multiple are exclusive",
                    self.name
                )));
            }
            if attributes.insert(attr.clone(), index).is_some() {
                return Err(Error::schema(format!(
                    "{}: attribute {attr:?} declared twice",
                    self.name
                )));
            }
            if child_tags.insert(desc.tag().to_string(), index).is_some() {
                return Err(Error::schema(format!(
                    "{}: tag <{}> declared twice",
                    self.name,
                    desc.tag()
                )));
            }
        }

        if let Some(content) = &self.content {
            if content.is_empty() {
                return Err(Error::schema(format!(
                    "{}: content attribute name must not be empty",
                    self.name
                )));
            }
            if attributes.contains_key(content) {
                return Err(Error::schema(format!(
                    "{}: attribute {content:?} declared twice",
                    self.name
                )));
            }
        }

        log::trace!(
            "built element type {} with {} descriptors",
            self.name,
            self.descriptors.len()
        );

        Ok(Arc::new(ElementType {
            name: self.name,
            descriptors: self.descriptors,
            content: self.content,
            child_tags,
            attributes,
        }))
    }
}

/// Declaration of a whole document: the root element type and its tag.
#[derive(Clone, Debug)]
pub struct DocumentType {
    tag: String,
    root: Arc<ElementType>,
}

impl DocumentType {
    /// Declares a document whose document element is `<tag>` of type `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if `tag` is empty; every document type has
    /// to define its root tag name.
    pub fn new(tag: impl Into<String>, root: Arc<ElementType>) -> Result<Self> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(Error::schema(format!(
                "document tag for {} is not defined",
                root.name()
            )));
        }
        Ok(Self { tag, root })
    }

    /// Tag name of the document element.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Element type of the document element.
    pub fn root(&self) -> &Arc<ElementType> {
        &self.root
    }
}

/// Returns true when both handles refer to the same declaration.
pub(crate) fn same_type(a: &Arc<ElementType>, b: &Arc<ElementType>) -> bool {
    Arc::ptr_eq(a, b)
}

/// Returns true when `kind` accepts elements of `element_type`.
pub(crate) fn accepts(kind: &DescriptorKind, element_type: &Arc<ElementType>) -> bool {
    match kind {
        DescriptorKind::Child(expected) => same_type(expected, element_type),
        DescriptorKind::Text => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url_type() -> Arc<ElementType> {
        ElementType::builder("Url").content("value").build().unwrap()
    }

    // ------------------------------------------------------------------------
    // ElementTypeBuilder validation
    // ------------------------------------------------------------------------

    #[test]
    fn test_build_indexes_tags() {
        let person = ElementType::builder("Person")
            .field("name", Descriptor::text("name"))
            .field("homepage", Descriptor::child("url", url_type()))
            .build()
            .unwrap();

        let (attr, desc) = person.lookup_tag("url").unwrap();
        assert_eq!(attr, "homepage");
        assert_eq!(desc.element_type().unwrap().name(), "Url");
        assert!(person.lookup_tag("homepage").is_none());
        assert!(person.descriptor("homepage").is_some());
        assert!(person.descriptor("url").is_none());
    }

    #[test]
    fn test_build_preserves_declaration_order() {
        let person = ElementType::builder("Person")
            .field("b", Descriptor::text("b"))
            .field("a", Descriptor::text("a"))
            .build()
            .unwrap();
        let attrs: Vec<&str> = person.descriptors().map(|(attr, _)| attr).collect();
        assert_eq!(attrs, vec!["b", "a"]);
    }

    #[test]
    fn test_required_and_multiple_are_exclusive() {
        let err = ElementType::builder("Person")
            .field("name", Descriptor::text("name").required().multiple())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("required and multiple are exclusive"));
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let err = ElementType::builder("Person")
            .field("a", Descriptor::text("name"))
            .field("b", Descriptor::text("name"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("<name> declared twice"));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let err = ElementType::builder("Person")
            .field("a", Descriptor::text("x"))
            .field("a", Descriptor::text("y"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_content_attribute_collision_rejected() {
        let err = ElementType::builder("Person")
            .field("value", Descriptor::text("value"))
            .content("value")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(ElementType::builder("  ").build().is_err());
        assert!(
            ElementType::builder("Person")
                .field("name", Descriptor::text(""))
                .build()
                .is_err()
        );
    }

    // ------------------------------------------------------------------------
    // DocumentType
    // ------------------------------------------------------------------------

    #[test]
    fn test_document_type_requires_tag() {
        let err = DocumentType::new("", url_type()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error: document tag for Url is not defined"
        );
    }

    #[test]
    fn test_same_type_is_identity() {
        let a = url_type();
        let b = url_type();
        assert!(same_type(&a, &a.clone()));
        assert!(!same_type(&a, &b));
        assert!(accepts(&DescriptorKind::Child(a.clone()), &a));
        assert!(!accepts(&DescriptorKind::Text, &a));
    }
}
