//! Document schemas declared in TOML.
//!
//! ```toml
//! [document]
//! tag = "person"
//! type = "Person"
//!
//! [types.Url]
//! content = "value"
//!
//! [types.Person]
//! [[types.Person.fields]]
//! attr = "name"
//! tag = "name"
//! kind = "text"
//! required = true
//!
//! [[types.Person.fields]]
//! attr = "urls"
//! tag = "url"
//! kind = "child"
//! type = "Url"
//! multiple = true
//! ```
//!
//! Types may refer to each other in any order; they are built dependencies
//! first. A type that reaches itself is rejected.

use libearth_core::{Error, Result};
use libearth_schema::{Descriptor, DocumentType, ElementType};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Parsed schema file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    document: DocumentSection,
    #[serde(default)]
    types: BTreeMap<String, TypeSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentSection {
    tag: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeSection {
    content: Option<String>,
    #[serde(default)]
    fields: Vec<FieldSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSection {
    attr: String,
    tag: String,
    kind: FieldKind,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    multiple: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FieldKind {
    Text,
    Child,
}

impl SchemaFile {
    /// Parses a schema from TOML text.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] when the text is not a valid schema file.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::schema(format!("invalid schema file: {e}")))
    }

    /// Reads and parses a schema file.
    ///
    /// # Errors
    ///
    /// I/O errors and the errors of [`SchemaFile::parse`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Builds the declared document type.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] for unknown or recursive types, fields whose `type`
    /// does not match their `kind`, and every declaration error the schema
    /// builders report.
    pub fn document_type(&self) -> Result<DocumentType> {
        let mut built = BTreeMap::new();
        let mut visiting = Vec::new();
        let root = self.resolve(&self.document.type_name, &mut built, &mut visiting)?;
        DocumentType::new(self.document.tag.as_str(), root)
    }

    fn resolve(
        &self,
        name: &str,
        built: &mut BTreeMap<String, Arc<ElementType>>,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<ElementType>> {
        if let Some(element_type) = built.get(name) {
            return Ok(element_type.clone());
        }
        if visiting.iter().any(|v| v == name) {
            visiting.push(name.to_string());
            return Err(Error::schema(format!(
                "recursive types are not supported: {}",
                visiting.join(" -> ")
            )));
        }
        let section = self
            .types
            .get(name)
            .ok_or_else(|| Error::schema(format!("unknown type {name:?}")))?;

        visiting.push(name.to_string());
        let mut builder = ElementType::builder(name);
        if let Some(content) = &section.content {
            builder = builder.content(content.as_str());
        }
        for field in &section.fields {
            let mut descriptor = match (field.kind, &field.type_name) {
                (FieldKind::Text, None) => Descriptor::text(field.tag.as_str()),
                (FieldKind::Child, Some(type_name)) => {
                    let child = self.resolve(type_name, built, visiting)?;
                    Descriptor::child(field.tag.as_str(), child)
                }
                (FieldKind::Text, Some(_)) => {
                    return Err(Error::schema(format!(
                        "{name}.{}: text fields take no type",
                        field.attr
                    )));
                }
                (FieldKind::Child, None) => {
                    return Err(Error::schema(format!(
                        "{name}.{}: child fields need a type",
                        field.attr
                    )));
                }
            };
            if field.required {
                descriptor = descriptor.required();
            }
            if field.multiple {
                descriptor = descriptor.multiple();
            }
            builder = builder.field(field.attr.as_str(), descriptor);
        }
        visiting.pop();

        let element_type = builder.build()?;
        tracing::debug!(name, "built element type");
        built.insert(name.to_string(), element_type.clone());
        Ok(element_type)
    }
}
