//! Entity hierarchy formation and hierarchy-wide fact resolution.

use crate::{
    categorize::{
        AttributeMetadata, AttributeRef, Caching, CategorizationError, EntityHierarchy,
        ExplicitTable, IdMapping, IdentifiableTypeMetadata, ManagedTypeKind,
        SecondaryTableMetadata, callbacks,
    },
    types::InheritanceKind,
};
use bootmodel_source::{annotation::value::AnnotationValue as Value, prelude::*};
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) type Snapshot = BTreeMap<ClassName, ClassDetails>;

/// Build one `EntityHierarchy` per root entity: an entity whose super-type
/// chain contains no other entity (mapped-superclasses may intervene).
pub(crate) fn build_hierarchies(
    snapshot: &Snapshot,
) -> Result<Vec<EntityHierarchy>, CategorizationError> {
    let mut children: BTreeMap<&ClassName, Vec<&ClassName>> = BTreeMap::new();
    for details in snapshot.values() {
        if let Some(super_class) = details.super_class() {
            children.entry(super_class).or_default().push(details.name());
        }
    }

    let mut hierarchies = Vec::new();

    for details in snapshot.values() {
        if !details.has_annotation(&descriptor::ENTITY) || has_entity_ancestor(snapshot, details) {
            continue;
        }

        hierarchies.push(build_hierarchy(snapshot, &children, details)?);
    }

    Ok(hierarchies)
}

fn is_managed(details: &ClassDetails) -> bool {
    details.has_annotation(&descriptor::ENTITY)
        || details.has_annotation(&descriptor::MAPPED_SUPERCLASS)
}

fn has_entity_ancestor(snapshot: &Snapshot, details: &ClassDetails) -> bool {
    let mut current = details.super_class();

    while let Some(name) = current {
        let Some(super_details) = snapshot.get(name) else {
            return false;
        };
        if super_details.has_annotation(&descriptor::ENTITY) {
            return true;
        }
        current = super_details.super_class();
    }

    false
}

fn build_hierarchy(
    snapshot: &Snapshot,
    children: &BTreeMap<&ClassName, Vec<&ClassName>>,
    root: &ClassDetails,
) -> Result<EntityHierarchy, CategorizationError> {
    // Root-most first: mapped-superclass ancestors, the root entity, then
    // every managed subtype in depth-first pre-order.
    let mut ordered: Vec<&ClassDetails> = Vec::new();

    let mut ancestors = Vec::new();
    let mut current = root.super_class();
    while let Some(name) = current {
        let Some(details) = snapshot.get(name) else {
            break;
        };
        if !details.has_annotation(&descriptor::MAPPED_SUPERCLASS) {
            break;
        }
        ancestors.push(details);
        current = details.super_class();
    }
    ordered.extend(ancestors.into_iter().rev());
    ordered.push(root);
    descend(snapshot, children, root.name(), &mut ordered);

    let inheritance = resolve_inheritance(&ordered)?;
    let discriminator_column = resolve_discriminator(&ordered)?;

    let mut types = Vec::with_capacity(ordered.len());
    for details in &ordered {
        types.push(build_type(details)?);
    }

    let root_index = types
        .iter()
        .position(|t| t.class == *root.name())
        .unwrap_or(0);
    let root_entity_name = types[root_index].entity_name.clone();

    // Caching: the root establishes the hierarchy descriptor; subtypes may
    // override cacheability without discarding the region.
    let root_caching = resolve_caching(root, None, &root_entity_name)?;
    for (index, details) in ordered.iter().enumerate() {
        types[index].caching = if index == root_index {
            root_caching.clone()
        } else {
            resolve_caching(details, root_caching.as_ref(), &root_entity_name)?
        };
    }

    // Lifecycle callbacks, root-to-leaf, listener classes before own methods.
    for (index, details) in ordered.iter().enumerate() {
        let chain = chain_of(snapshot, &ordered, details);
        types[index].callbacks = callbacks::collect(&chain, snapshot)?;
    }

    let id_mapping = resolve_id_mapping(root.name(), &ordered, &types)?;
    let version_attribute = resolve_single_marker(
        root.name(),
        &types,
        AttributeMetadata::is_version,
        |root, first, second| CategorizationError::DuplicateVersion {
            root,
            first,
            second,
        },
    )?;
    let tenant_id_attribute = resolve_single_marker(
        root.name(),
        &types,
        AttributeMetadata::is_tenant_id,
        |root, first, second| CategorizationError::DuplicateTenantId {
            root,
            first,
            second,
        },
    )?;

    debug!(
        root = %root.name(),
        types = types.len(),
        strategy = %inheritance,
        "formed entity hierarchy"
    );

    Ok(EntityHierarchy {
        root: root.name().clone(),
        inheritance,
        id_mapping,
        version_attribute,
        tenant_id_attribute,
        caching: root_caching,
        discriminator_column,
        types,
    })
}

fn descend<'a>(
    snapshot: &'a Snapshot,
    children: &BTreeMap<&ClassName, Vec<&ClassName>>,
    parent: &ClassName,
    ordered: &mut Vec<&'a ClassDetails>,
) {
    let Some(child_names) = children.get(parent) else {
        return;
    };

    for name in child_names {
        let Some(details) = snapshot.get(*name) else {
            continue;
        };
        if !is_managed(details) {
            continue;
        }
        ordered.push(details);
        descend(snapshot, children, name, ordered);
    }
}

/// The super-type chain from the hierarchy's root-most type down to (and
/// including) the given type.
fn chain_of<'a>(
    snapshot: &'a Snapshot,
    ordered: &[&'a ClassDetails],
    target: &'a ClassDetails,
) -> Vec<&'a ClassDetails> {
    let in_hierarchy =
        |name: &ClassName| ordered.iter().any(|details| details.name() == name);

    let mut chain = vec![target];
    let mut current = target.super_class();

    while let Some(name) = current {
        if !in_hierarchy(name) {
            break;
        }
        let Some(details) = snapshot.get(name) else {
            break;
        };
        chain.push(details);
        current = details.super_class();
    }

    chain.reverse();
    chain
}

fn build_type(details: &ClassDetails) -> Result<IdentifiableTypeMetadata, CategorizationError> {
    let kind = if details.has_annotation(&descriptor::ENTITY) {
        ManagedTypeKind::Entity
    } else {
        ManagedTypeKind::MappedSuperclass
    };

    let entity_name = match details.annotation(&descriptor::ENTITY) {
        Some(usage) => usage.non_empty_string("name")?,
        None => None,
    }
    .unwrap_or_else(|| details.name().simple_name().to_string());

    let class_access =
        crate::categorize::explicit_access(details.annotation(&descriptor::ACCESS))?;

    let mut attributes = Vec::new();
    for member in details.members() {
        if !member.is_persistable() || member.has_annotation(&descriptor::TRANSIENT) {
            continue;
        }
        let mut metadata = AttributeMetadata::new(member.clone());
        metadata.access =
            crate::categorize::explicit_access(member.annotation(&descriptor::ACCESS))?
                .or(class_access);
        attributes.push(metadata);
    }

    let table = match details.annotation(&descriptor::TABLE) {
        Some(usage) => Some(ExplicitTable {
            name: usage.non_empty_string("name")?,
            catalog: usage.non_empty_string("catalog")?,
            schema: usage.non_empty_string("schema")?,
        }),
        None => None,
    };

    let mut secondary_tables = Vec::new();
    for usage in details.repeated_annotations(&descriptor::SECONDARY_TABLE) {
        let name = usage
            .string_attribute("name")?
            .ok_or_else(|| SourceError::UnsetAttribute {
                annotation: "SecondaryTable",
                attribute: "name".to_string(),
            })?;
        secondary_tables.push(SecondaryTableMetadata {
            name,
            catalog: usage.non_empty_string("catalog")?,
            schema: usage.non_empty_string("schema")?,
        });
    }

    Ok(IdentifiableTypeMetadata {
        class: details.name().clone(),
        kind,
        is_abstract: details.is_abstract(),
        entity_name,
        super_class: details.super_class().cloned(),
        attributes,
        callbacks: Vec::new(),
        caching: None,
        table,
        secondary_tables,
    })
}

/// Nearest explicit declaration walking root to leaf; `SINGLE_TABLE` when
/// nothing declares one.
fn resolve_inheritance(
    ordered: &[&ClassDetails],
) -> Result<InheritanceKind, CategorizationError> {
    for details in ordered {
        if let Some(usage) = details.annotation(&descriptor::INHERITANCE) {
            return Ok(usage
                .enum_attribute::<InheritanceKind>("strategy")?
                .unwrap_or_default());
        }
    }

    Ok(InheritanceKind::default())
}

fn resolve_discriminator(ordered: &[&ClassDetails]) -> Result<String, CategorizationError> {
    for details in ordered {
        if let Some(usage) = details.annotation(&descriptor::DISCRIMINATOR_COLUMN) {
            if let Some(name) = usage.non_empty_string("name")? {
                return Ok(name);
            }
        }
    }

    Ok("DTYPE".to_string())
}

fn resolve_caching(
    details: &ClassDetails,
    root_caching: Option<&Caching>,
    root_entity_name: &str,
) -> Result<Option<Caching>, CategorizationError> {
    let cacheable = match details.annotation(&descriptor::CACHEABLE) {
        Some(usage) => usage.bool_attribute("value")?,
        None => None,
    };
    let cache = details.annotation(&descriptor::CACHE);

    if cacheable.is_none() && cache.is_none() {
        return Ok(root_caching.cloned());
    }

    let mut caching = root_caching.cloned().unwrap_or(Caching {
        enabled: true,
        region: None,
        usage: None,
    });

    if let Some(usage) = cache {
        if let Some(region) = usage.non_empty_string("region")? {
            caching.region = Some(region);
        }
        if let Some(Value::Enum(access) | Value::Str(access)) = usage.attribute("usage")? {
            caching.usage = Some(access);
        }
    }
    if let Some(enabled) = cacheable {
        caching.enabled = enabled;
    }
    if caching.region.is_none() {
        caching.region = Some(root_entity_name.to_string());
    }

    Ok(Some(caching))
}

/// Identifier resolution is hierarchy-wide: every id-annotated member across
/// the whole chain participates, not just the root's.
fn resolve_id_mapping(
    root: &ClassName,
    ordered: &[&ClassDetails],
    types: &[IdentifiableTypeMetadata],
) -> Result<IdMapping, CategorizationError> {
    let mut simple = Vec::new();
    let mut embedded = Vec::new();

    for metadata in types {
        for attribute in &metadata.attributes {
            let reference = AttributeRef {
                owner: metadata.class.clone(),
                name: attribute.name.clone(),
            };
            if attribute.is_embedded_id() {
                embedded.push((reference, attribute.member.declared_type().cloned()));
            } else if attribute.is_id() {
                simple.push(reference);
            }
        }
    }

    if embedded.len() > 1 {
        return Err(CategorizationError::MultipleEmbeddedIds { root: root.clone() });
    }
    if let Some((attribute, embeddable)) = embedded.into_iter().next() {
        if simple.is_empty() {
            return Ok(IdMapping::Aggregated {
                attribute,
                embeddable,
            });
        }
        return Err(CategorizationError::MixedIdPlacement { root: root.clone() });
    }

    if simple.is_empty() {
        return Err(CategorizationError::MissingIdentifier { root: root.clone() });
    }

    // A declared id-class routes every id attribute through it, even a
    // lone one.
    if let Some(id_class) = declared_id_class(ordered)? {
        return Ok(IdMapping::NonAggregated {
            attributes: simple,
            id_class,
        });
    }

    match simple.len() {
        1 => Ok(IdMapping::Simple {
            attribute: simple.remove(0),
        }),
        count => Err(CategorizationError::MissingIdClass {
            root: root.clone(),
            count,
        }),
    }
}

fn declared_id_class(ordered: &[&ClassDetails]) -> Result<Option<ClassName>, CategorizationError> {
    for details in ordered {
        if let Some(usage) = details.annotation(&descriptor::ID_CLASS) {
            if let Some(id_class) = usage.class_attribute("value")? {
                return Ok(Some(id_class));
            }
        }
    }

    Ok(None)
}

/// First match searched from the defining super-type nearest the root; a
/// second occurrence anywhere in the hierarchy is a placement error.
fn resolve_single_marker(
    root: &ClassName,
    types: &[IdentifiableTypeMetadata],
    matches: impl Fn(&AttributeMetadata) -> bool,
    duplicate: impl FnOnce(ClassName, String, String) -> CategorizationError,
) -> Result<Option<AttributeRef>, CategorizationError> {
    let mut found: Option<AttributeRef> = None;

    for metadata in types {
        for attribute in &metadata.attributes {
            if !matches(attribute) {
                continue;
            }
            if let Some(first) = &found {
                return Err(duplicate(
                    root.clone(),
                    first.name.clone(),
                    attribute.name.clone(),
                ));
            }
            found = Some(AttributeRef {
                owner: metadata.class.clone(),
                name: attribute.name.clone(),
            });
        }
    }

    Ok(found)
}
