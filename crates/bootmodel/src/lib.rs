pub mod bind;
pub mod categorize;
pub mod types;
pub mod xml;

use crate::{
    bind::{BindingContext, BindingError, BindingOptions, BindingState},
    categorize::{CategorizationError, CategorizedDomainModel, globals::GlobalRegistrations},
    xml::{MappingDocument, XmlError},
};
use bootmodel_source::prelude::{ClassDetailsRegistry, SourceError};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::debug;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        BootModel, Error, boot,
        bind::{
            BindingContext, BindingError, BindingOptions, BindingState, ColumnBinding,
            DenormalizedTable, EntityBinder, Identifier, JdbcMapping, KeyReference, NamingStrategy,
            PhysicalTable, SecondaryTable, SnakeCaseNaming, StandardTypeConfiguration,
            TableReference, TypeConfiguration,
        },
        categorize::{
            AttributeMetadata, AttributeRef, Caching, CallbackBinding, CallbackSource,
            CategorizationError, CategorizedDomainModel, EntityHierarchy, IdMapping,
            IdentifiableTypeMetadata, ManagedTypeKind, categorize,
            globals::{FilterDefinition, GlobalRegistrations, NamedQueryRegistration},
        },
        types::{AccessType, AttributeNature, CallbackKind, CascadeType, InheritanceKind},
        xml::{MappingDocument, XmlError},
    };
    pub use bootmodel_source::prelude::*;
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    SourceError(#[from] SourceError),

    #[error(transparent)]
    XmlError(#[from] XmlError),

    #[error(transparent)]
    CategorizationError(#[from] CategorizationError),

    #[error(transparent)]
    BindingError(#[from] BindingError),
}

///
/// BootModel
///
/// The categorized model plus the bound table topology, as produced by one
/// full pipeline run.
///

#[derive(Debug, Serialize)]
pub struct BootModel {
    pub model: CategorizedDomainModel,
    pub bindings: BindingState,
}

/// Run the whole pipeline: collect annotation-sourced globals, merge XML
/// mapping documents into the class view, categorize, and bind.
///
/// Annotation globals are collected before XML processing so that XML
/// registrations win last-per-key. Unit-level XML defaults (catalog, schema,
/// delimited identifiers) feed into the binding options; explicit options
/// take precedence.
pub fn boot(
    registry: &mut ClassDetailsRegistry,
    managed_classes: &[String],
    documents: Vec<MappingDocument>,
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<BootModel, Error> {
    let mut globals = GlobalRegistrations::default();
    for name in managed_classes {
        let details = registry.resolve(name)?.clone();
        categorize::globals::collect_class_annotations(&details, &mut globals)?;
    }

    let pre = xml::preprocess::preprocess(documents);
    let merged = xml::process::process(&pre, &mut globals, registry)?;

    let model = categorize::categorize(
        registry,
        managed_classes,
        &merged,
        globals,
        pre.metadata.default_access(),
    )?;

    let effective = BindingOptions {
        default_catalog: options
            .default_catalog
            .clone()
            .or_else(|| pre.metadata.default_catalog().map(str::to_string)),
        default_schema: options
            .default_schema
            .clone()
            .or_else(|| pre.metadata.default_schema().map(str::to_string)),
        quoted_identifiers: options.quoted_identifiers || pre.metadata.use_quoted_identifiers(),
    };
    let bindings = bind::bind(&model, &effective, context)?;

    debug!(
        hierarchies = model.hierarchies().len(),
        tables = bindings.tables().len(),
        "boot model complete"
    );

    Ok(BootModel { model, bindings })
}
