//! Descriptors declare the possible children of an element type.
//!
//! A descriptor pairs a child tag with the way its data is exposed:
//!
//! - [`DescriptorKind::Text`]: the child consists only of character data.
//!   Its attributes and nested child nodes are ignored.
//! - [`DescriptorKind::Child`]: the child is itself an element of a declared
//!   [`ElementType`], read lazily like its parent.
//!
//! # Example
//!
//! ```rust
//! use libearth_schema::{Descriptor, ElementType};
//!
//! let url = ElementType::builder("Url").content("value").build().unwrap();
//!
//! let name = Descriptor::text("name").required();
//! let urls = Descriptor::child("url", url).multiple();
//!
//! assert!(name.is_required());
//! assert!(urls.is_multiple());
//! ```

use crate::element_type::ElementType;
use std::fmt;
use std::sync::Arc;

/// What a descriptor reads from its child element.
#[derive(Clone)]
pub enum DescriptorKind {
    /// Character data only.
    Text,
    /// An element of the given type.
    Child(Arc<ElementType>),
}

impl fmt::Debug for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorKind::Text => f.write_str("Text"),
            DescriptorKind::Child(element_type) => {
                f.debug_tuple("Child").field(&element_type.name()).finish()
            }
        }
    }
}

/// Declaration of a possible child element.
///
/// `required` and `multiple` are exclusive; the combination is rejected when
/// the owning [`ElementType`] is built.
#[derive(Clone, Debug)]
pub struct Descriptor {
    tag: String,
    kind: DescriptorKind,
    required: bool,
    multiple: bool,
}

impl Descriptor {
    /// Declares a child that only consists of character data.
    pub fn text(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            kind: DescriptorKind::Text,
            required: false,
            multiple: false,
        }
    }

    /// Declares a child element of `element_type`.
    pub fn child(tag: impl Into<String>, element_type: Arc<ElementType>) -> Self {
        Self {
            tag: tag.into(),
            kind: DescriptorKind::Child(element_type),
            required: false,
            multiple: false,
        }
    }

    /// Marks the child as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the child as zero-or-more.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// The tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// What the descriptor reads.
    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    /// Whether the child is required for the element.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the child can be zero or more for the element.
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// The element type of a [`DescriptorKind::Child`] descriptor.
    pub fn element_type(&self) -> Option<&Arc<ElementType>> {
        match &self.kind {
            DescriptorKind::Child(element_type) => Some(element_type),
            DescriptorKind::Text => None,
        }
    }

    /// Short description used in type errors, e.g. `multiple Child(Url)`.
    pub(crate) fn describe(&self) -> String {
        let arity = if self.multiple { "multiple " } else { "" };
        match &self.kind {
            DescriptorKind::Text => format!("{arity}Text"),
            DescriptorKind::Child(element_type) => {
                format!("{arity}Child({})", element_type.name())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url_type() -> Arc<ElementType> {
        ElementType::builder("Url").content("value").build().unwrap()
    }

    #[test]
    fn test_text_defaults() {
        let desc = Descriptor::text("name");
        assert_eq!(desc.tag(), "name");
        assert!(!desc.is_required());
        assert!(!desc.is_multiple());
        assert!(desc.element_type().is_none());
    }

    #[test]
    fn test_child_carries_element_type() {
        let desc = Descriptor::child("url", url_type()).multiple();
        assert!(desc.is_multiple());
        assert_eq!(desc.element_type().unwrap().name(), "Url");
    }

    #[test]
    fn test_describe() {
        assert_eq!(Descriptor::text("a").describe(), "Text");
        assert_eq!(Descriptor::text("a").multiple().describe(), "multiple Text");
        assert_eq!(
            Descriptor::child("url", url_type()).describe(),
            "Child(Url)"
        );
    }

    #[test]
    fn test_kind_debug_shows_type_name() {
        let desc = Descriptor::child("url", url_type());
        assert_eq!(format!("{:?}", desc.kind()), "Child(\"Url\")");
    }
}
