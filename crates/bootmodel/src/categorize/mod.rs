//! Domain categorization: consumes the unified class view (post XML merge)
//! and produces entity hierarchies plus global registrations.

pub mod callbacks;
pub mod globals;
pub mod hierarchy;
pub mod overrides;

use crate::{
    types::{AccessType, AttributeNature, CallbackKind, InheritanceKind},
    xml::process::XmlProcessingResult,
};
use bootmodel_source::prelude::*;
use derive_more::Display;
use globals::GlobalRegistrations;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;
use tracing::debug;

///
/// CategorizationError
///
/// Every failure aborts categorization of the whole model; there is no
/// partial result.
///

#[derive(Debug, ThisError)]
pub enum CategorizationError {
    #[error("entity hierarchy rooted at '{root}' declares no identifier attribute")]
    MissingIdentifier { root: ClassName },

    #[error("hierarchy rooted at '{root}' mixes embedded-id and simple id attributes")]
    MixedIdPlacement { root: ClassName },

    #[error("hierarchy rooted at '{root}' declares multiple embedded-id attributes")]
    MultipleEmbeddedIds { root: ClassName },

    #[error(
        "hierarchy rooted at '{root}' declares {count} id attributes but no id-class"
    )]
    MissingIdClass { root: ClassName, count: usize },

    #[error(
        "duplicate version attribute in hierarchy rooted at '{root}': '{first}' and '{second}'"
    )]
    DuplicateVersion {
        root: ClassName,
        first: String,
        second: String,
    },

    #[error(
        "duplicate tenant-id attribute in hierarchy rooted at '{root}': '{first}' and '{second}'"
    )]
    DuplicateTenantId {
        root: ClassName,
        first: String,
        second: String,
    },

    #[error("XML override for '{class}' references unknown attribute '{attribute}'")]
    UnknownOverrideAttribute { class: String, attribute: String },

    #[error("XML override references unknown class '{class}'")]
    UnknownOverrideClass { class: String },

    #[error(transparent)]
    Source(#[from] SourceError),
}

///
/// ManagedTypeKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum ManagedTypeKind {
    Entity,
    MappedSuperclass,
}

///
/// AttributeRef
///
/// An attribute addressed by owning class and name.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AttributeRef {
    pub owner: ClassName,
    pub name: String,
}

///
/// IdMapping
///

#[derive(Clone, Debug, Serialize)]
pub enum IdMapping {
    Simple {
        attribute: AttributeRef,
    },
    Aggregated {
        attribute: AttributeRef,
        embeddable: Option<ClassName>,
    },
    NonAggregated {
        attributes: Vec<AttributeRef>,
        id_class: ClassName,
    },
}

impl IdMapping {
    /// Identifier attribute names, declaration order.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        match self {
            Self::Simple { attribute } | Self::Aggregated { attribute, .. } => {
                vec![attribute.name.as_str()]
            }
            Self::NonAggregated { attributes, .. } => {
                attributes.iter().map(|a| a.name.as_str()).collect()
            }
        }
    }
}

///
/// Caching
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Caching {
    pub enabled: bool,
    pub region: Option<String>,
    pub usage: Option<String>,
}

///
/// CallbackSource / CallbackBinding
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum CallbackSource {
    Listener(ClassName),
    Declared(ClassName),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CallbackBinding {
    pub kind: CallbackKind,
    pub source: CallbackSource,
    pub method: String,
}

///
/// ExplicitTable / SecondaryTableMetadata
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct ExplicitTable {
    pub name: Option<String>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SecondaryTableMetadata {
    pub name: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

///
/// AttributeMetadata
///
/// A persistent attribute: name, owning member snapshot, and its nature.
/// One tagged value, not a type hierarchy.
///

#[derive(Clone, Debug, Serialize)]
pub struct AttributeMetadata {
    pub name: String,
    pub nature: AttributeNature,

    /// Effective access type: explicit on the member, else the declaring
    /// class, else the persistence-unit default.
    pub access: Option<AccessType>,

    pub member: MemberDetails,
}

impl AttributeMetadata {
    #[must_use]
    pub fn new(member: MemberDetails) -> Self {
        Self {
            name: member.name().to_string(),
            nature: classify_nature(&member),
            access: None,
            member,
        }
    }

    /// Re-derive the nature after an XML override mutated the member.
    pub(crate) fn refresh_nature(&mut self) {
        self.nature = classify_nature(&self.member);
    }

    #[must_use]
    pub fn is_id(&self) -> bool {
        self.member.has_annotation(&descriptor::ID)
    }

    #[must_use]
    pub fn is_embedded_id(&self) -> bool {
        self.member.has_annotation(&descriptor::EMBEDDED_ID)
    }

    #[must_use]
    pub fn is_version(&self) -> bool {
        self.member.has_annotation(&descriptor::VERSION)
    }

    #[must_use]
    pub fn is_tenant_id(&self) -> bool {
        self.member.has_annotation(&descriptor::TENANT_ID)
    }

    #[must_use]
    pub fn column_annotation(&self) -> Option<&AnnotationUsage> {
        self.member.annotation(&descriptor::COLUMN)
    }
}

/// Explicit `Access` declaration on a member or class, if any.
pub(crate) fn explicit_access(
    usage: Option<&AnnotationUsage>,
) -> Result<Option<AccessType>, SourceError> {
    match usage {
        Some(usage) => usage.enum_attribute::<AccessType>("value"),
        None => Ok(None),
    }
}

#[must_use]
pub(crate) fn classify_nature(member: &MemberDetails) -> AttributeNature {
    if member.has_annotation(&descriptor::MANY_TO_ONE)
        || member.has_annotation(&descriptor::ONE_TO_ONE)
    {
        AttributeNature::ToOne
    } else if member.has_annotation(&descriptor::ONE_TO_MANY)
        || member.has_annotation(&descriptor::MANY_TO_MANY)
    {
        AttributeNature::ToMany
    } else if member.has_annotation(&descriptor::ELEMENT_COLLECTION) {
        AttributeNature::ElementCollection
    } else if member.has_annotation(&descriptor::ANY) {
        AttributeNature::Any
    } else if member.has_annotation(&descriptor::EMBEDDED)
        || member.has_annotation(&descriptor::EMBEDDED_ID)
    {
        AttributeNature::Embedded
    } else {
        AttributeNature::Basic
    }
}

///
/// IdentifiableTypeMetadata
///
/// Per-class categorized facts. Entity-only facts (entity name, tables) are
/// populated for `ManagedTypeKind::Entity`; `callbacks` is the fully
/// resolved root-to-leaf chain ending at this type.
///

#[derive(Clone, Debug, Serialize)]
pub struct IdentifiableTypeMetadata {
    pub class: ClassName,
    pub kind: ManagedTypeKind,
    pub is_abstract: bool,
    pub entity_name: String,
    pub super_class: Option<ClassName>,
    pub attributes: Vec<AttributeMetadata>,
    pub callbacks: Vec<CallbackBinding>,
    pub caching: Option<Caching>,
    pub table: Option<ExplicitTable>,
    pub secondary_tables: Vec<SecondaryTableMetadata>,
}

impl IdentifiableTypeMetadata {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub(crate) fn attribute_mut(&mut self, name: &str) -> Option<&mut AttributeMetadata> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self.kind, ManagedTypeKind::Entity)
    }
}

///
/// EntityHierarchy
///
/// One maximal set of entity/mapped-superclass types connected by
/// super-type edges. `types` is topologically ordered, root-most first:
/// mapped-superclasses above the root entity precede it.
///

#[derive(Clone, Debug, Serialize)]
pub struct EntityHierarchy {
    pub root: ClassName,
    pub inheritance: InheritanceKind,
    pub id_mapping: IdMapping,
    pub version_attribute: Option<AttributeRef>,
    pub tenant_id_attribute: Option<AttributeRef>,
    pub caching: Option<Caching>,
    pub discriminator_column: String,
    pub types: Vec<IdentifiableTypeMetadata>,
}

impl EntityHierarchy {
    /// The root entity's categorized facts.
    #[must_use]
    pub fn root_type(&self) -> &IdentifiableTypeMetadata {
        // The root entity always exists; construction guarantees it.
        self.types
            .iter()
            .find(|t| t.class == self.root)
            .unwrap_or(&self.types[0])
    }

    #[must_use]
    pub fn type_of(&self, class: &str) -> Option<&IdentifiableTypeMetadata> {
        self.types.iter().find(|t| t.class.as_str() == class)
    }

    pub(crate) fn type_mut(&mut self, class: &str) -> Option<&mut IdentifiableTypeMetadata> {
        self.types.iter_mut().find(|t| t.class.as_str() == class)
    }

    /// Entities in root-to-leaf order.
    pub fn entities(&self) -> impl Iterator<Item = &IdentifiableTypeMetadata> {
        self.types.iter().filter(|t| t.is_entity())
    }

    /// The nearest entity ancestor of a type, if any.
    #[must_use]
    pub fn super_entity_of(&self, class: &str) -> Option<&IdentifiableTypeMetadata> {
        let mut current = self.type_of(class)?.super_class.clone();

        while let Some(super_class) = current {
            let Some(super_type) = self.type_of(super_class.as_str()) else {
                return None;
            };
            if super_type.is_entity() {
                return Some(super_type);
            }
            current = super_type.super_class.clone();
        }

        None
    }

    /// Attributes of a type plus everything inherited above it, root-most
    /// declarations first.
    #[must_use]
    pub fn inherited_attributes(&self, class: &str) -> Vec<&AttributeMetadata> {
        let mut chain = Vec::new();
        let mut current = self.type_of(class);

        while let Some(t) = current {
            chain.push(t);
            current = t
                .super_class
                .as_ref()
                .and_then(|s| self.type_of(s.as_str()));
        }

        chain
            .iter()
            .rev()
            .flat_map(|t| t.attributes.iter())
            .collect()
    }
}

///
/// CategorizedDomainModel
///

#[derive(Debug, Serialize)]
pub struct CategorizedDomainModel {
    hierarchies: Vec<EntityHierarchy>,
    global_registrations: GlobalRegistrations,
}

impl CategorizedDomainModel {
    #[must_use]
    pub fn hierarchies(&self) -> &[EntityHierarchy] {
        &self.hierarchies
    }

    #[must_use]
    pub fn hierarchy_of(&self, class: &str) -> Option<&EntityHierarchy> {
        self.hierarchies
            .iter()
            .find(|h| h.type_of(class).is_some())
    }

    #[must_use]
    pub const fn global_registrations(&self) -> &GlobalRegistrations {
        &self.global_registrations
    }
}

/// Build the categorized model from the merged class view, the deferred XML
/// override queue, and the already-collected global registrations.
/// `default_access` is the persistence-unit default applied to attributes
/// with no explicit declaration.
pub fn categorize(
    registry: &mut ClassDetailsRegistry,
    managed_classes: &[String],
    xml: &XmlProcessingResult,
    global_registrations: GlobalRegistrations,
    default_access: Option<AccessType>,
) -> Result<CategorizedDomainModel, CategorizationError> {
    let snapshot = resolve_closure(registry, managed_classes)?;
    let mut hierarchies = hierarchy::build_hierarchies(&snapshot)?;

    overrides::apply(&mut hierarchies, &xml.overrides)?;

    if let Some(default_access) = default_access {
        for hierarchy in &mut hierarchies {
            for metadata in &mut hierarchy.types {
                for attribute in &mut metadata.attributes {
                    attribute.access.get_or_insert(default_access);
                }
            }
        }
    }

    debug!(hierarchies = hierarchies.len(), "categorized domain model");

    Ok(CategorizedDomainModel {
        hierarchies,
        global_registrations,
    })
}

/// Snapshot of every class the categorization needs: the managed classes,
/// their super-type chains, entity-listener classes and id-class references.
/// Resolution is transitive; an unresolvable name aborts the run.
pub(crate) fn resolve_closure(
    registry: &mut ClassDetailsRegistry,
    managed_classes: &[String],
) -> Result<BTreeMap<ClassName, ClassDetails>, CategorizationError> {
    let mut snapshot: BTreeMap<ClassName, ClassDetails> = BTreeMap::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut worklist: Vec<String> = managed_classes.to_vec();

    // Dynamic classes only exist in the registry, never in a backing source.
    worklist.extend(
        registry
            .classes()
            .filter(|c| c.is_dynamic())
            .map(|c| c.name().as_str().to_string()),
    );

    while let Some(name) = worklist.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }

        let details = registry.resolve(&name)?.clone();

        if let Some(super_class) = details.super_class() {
            worklist.push(super_class.as_str().to_string());
        }
        if let Some(listeners) = details.annotation(&descriptor::ENTITY_LISTENERS) {
            for listener in listeners.class_list("value")? {
                worklist.push(listener.as_str().to_string());
            }
        }
        if let Some(id_class) = details.annotation(&descriptor::ID_CLASS) {
            if let Some(class) = id_class.class_attribute("value")? {
                worklist.push(class.as_str().to_string());
            }
        }

        snapshot.insert(details.name().clone(), details);
    }

    Ok(snapshot)
}
