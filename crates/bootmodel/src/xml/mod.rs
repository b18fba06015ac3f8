//! The already-parsed XML mapping document model.
//!
//! Parsing XML text is a collaborator concern; documents arrive here as data.
//! Every element type is serde-deserializable so fixtures can be
//! materialized from literals.

pub mod preprocess;
pub mod process;

use crate::types::{AccessType, AttributeNature, CallbackKind, CascadeType, InheritanceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// XmlError
///

#[derive(Debug, ThisError)]
pub enum XmlError {
    #[error("mapping element declares neither a class nor an entity name")]
    UnnamedElement,

    #[error("metadata-complete mapping for '{class}' references unknown member '{member}'")]
    UnknownMember { class: String, member: String },

    #[error("secondary table declared on '{class}' has no name")]
    MissingTableName { class: String },

    #[error(transparent)]
    Source(#[from] bootmodel_source::SourceError),
}

///
/// MappingDocument
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MappingDocument {
    pub defaults: DocumentDefaults,
    pub entities: Vec<ManagedTypeElement>,
    pub mapped_superclasses: Vec<ManagedTypeElement>,
    pub embeddables: Vec<ManagedTypeElement>,
    pub named_queries: Vec<NamedQueryElement>,
    pub converters: Vec<ConverterElement>,
    pub java_type_registrations: Vec<JavaTypeRegistrationElement>,
    pub jdbc_type_registrations: Vec<JdbcTypeRegistrationElement>,
    pub user_type_registrations: Vec<UserTypeRegistrationElement>,
    pub filter_defs: Vec<FilterDefElement>,
    pub entity_listeners: Vec<String>,
}

///
/// DocumentDefaults
///
/// The persistence-unit-scoped defaults section of one document.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentDefaults {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub access: Option<AccessType>,
    pub access_strategy: Option<String>,
    pub cascades: BTreeSet<CascadeType>,
    pub metadata_complete: bool,
    pub quoted_identifiers: bool,
}

///
/// ManagedTypeElement
///
/// An entity, mapped-superclass or embeddable element. `class` is absent for
/// dynamic ("entity-name") models; `metadata_complete` is tri-state, with
/// `None` deferring to the unit-wide flag.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagedTypeElement {
    pub class: Option<String>,
    pub name: Option<String>,
    pub metadata_complete: Option<bool>,
    pub extends: Option<String>,
    pub table: Option<TableElement>,
    pub secondary_tables: Vec<TableElement>,
    pub inheritance: Option<InheritanceKind>,
    pub discriminator_column: Option<String>,
    pub cacheable: Option<bool>,
    pub listeners: Vec<String>,
    pub callbacks: Vec<CallbackElement>,
    pub attributes: Vec<AttributeElement>,
}

impl ManagedTypeElement {
    /// The registry key this element addresses: class name, else entity name.
    pub fn target(&self) -> Result<&str, XmlError> {
        self.class
            .as_deref()
            .or(self.name.as_deref())
            .ok_or(XmlError::UnnamedElement)
    }

    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        self.class.is_none()
    }
}

///
/// AttributeElement
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AttributeElement {
    pub name: String,
    pub nature: Option<AttributeNature>,
    pub declared_type: Option<String>,
    pub target_entity: Option<String>,
    pub is_id: bool,
    pub is_embedded_id: bool,
    pub is_version: bool,
    pub is_tenant_id: bool,
    pub column: Option<ColumnElement>,
    pub access: Option<AccessType>,
}

///
/// ColumnElement
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnElement {
    pub name: Option<String>,
    pub nullable: Option<bool>,
    pub unique: Option<bool>,
    pub length: Option<i64>,
    pub table: Option<String>,
}

///
/// TableElement
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TableElement {
    pub name: Option<String>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

///
/// CallbackElement
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CallbackElement {
    pub kind: CallbackKind,
    pub method: String,
}

///
/// Global declaration elements
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NamedQueryElement {
    pub name: String,
    pub query: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConverterElement {
    pub class: String,
    pub auto_apply: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JavaTypeRegistrationElement {
    pub java_type: String,
    pub descriptor: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JdbcTypeRegistrationElement {
    pub type_code: i64,
    pub descriptor: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserTypeRegistrationElement {
    pub basic_class: String,
    pub user_type: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterDefElement {
    pub name: String,
    pub condition: Option<String>,
    pub parameters: Vec<FilterParamElement>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FilterParamElement {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}
