//! Binding coordination: walks categorized hierarchies root-to-leaf, applies
//! the inheritance-strategy table topology, and binds unit-level globals.

use crate::{
    bind::{
        BindingContext, BindingError, BindingOptions, BindingState, BoundFilterDefinition,
        ColumnBinding, DenormalizedTable, EntityBinder, Identifier, KeyReference, PhysicalTable,
        SecondaryTable, TableReference,
    },
    categorize::{
        AttributeMetadata, CategorizedDomainModel, EntityHierarchy, IdentifiableTypeMetadata,
        globals::GlobalRegistrations,
    },
    types::{AttributeNature, InheritanceKind},
};
use std::collections::BTreeMap;
use tracing::debug;

/// Produce the binding state for a categorized model.
pub fn bind(
    model: &CategorizedDomainModel,
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<BindingState, BindingError> {
    let mut state = BindingState::default();

    for hierarchy in model.hierarchies() {
        bind_hierarchy(&mut state, hierarchy, options, context)?;
    }

    bind_filter_definitions(&mut state, model.global_registrations(), context)?;
    bind_named_queries(&mut state, model.global_registrations())?;

    debug!(tables = state.tables().len(), "binding complete");

    Ok(state)
}

fn bind_hierarchy(
    state: &mut BindingState,
    hierarchy: &EntityHierarchy,
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<(), BindingError> {
    let primary_key = primary_key_columns(hierarchy, options, context)?;

    match hierarchy.inheritance {
        InheritanceKind::SingleTable => {
            bind_single_table(state, hierarchy, &primary_key, options, context)?;
        }
        InheritanceKind::Joined => {
            bind_joined(state, hierarchy, &primary_key, options, context)?;
        }
        InheritanceKind::TablePerClass => {
            bind_table_per_class(state, hierarchy, &primary_key, options, context)?;
        }
    }

    // Secondary tables are owner-scoped regardless of strategy.
    for entity in hierarchy.entities() {
        for secondary in &entity.secondary_tables {
            let table = PhysicalTable {
                logical_name: ident(&secondary.name, options),
                physical_name: ident(&context.naming.to_physical(&secondary.name), options),
                catalog: namespace(secondary.catalog.as_deref(), &options.default_catalog, options),
                schema: namespace(secondary.schema.as_deref(), &options.default_schema, options),
                primary_key: primary_key.clone(),
                columns: Vec::new(),
                key_reference: None,
            };
            state.add_table(
                entity.class.clone(),
                TableReference::Secondary(SecondaryTable {
                    owner: entity.class.clone(),
                    table,
                }),
            )?;
        }
    }

    Ok(())
}

///
/// SINGLE_TABLE: one shared relation for the whole hierarchy plus a
/// discriminator column; every entity binds to the root's table.
///

fn bind_single_table(
    state: &mut BindingState,
    hierarchy: &EntityHierarchy,
    primary_key: &[Identifier],
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<(), BindingError> {
    let root = hierarchy.root_type();
    let names = resolve_table_names(root, options, context);

    let mut columns = Vec::new();
    for t in &hierarchy.types {
        for attr in t.attributes.iter().filter(|a| is_column_backed(a)) {
            push_column(&mut columns, column_binding(attr, options, context)?);
        }
    }
    columns.push(ColumnBinding {
        name: ident(&hierarchy.discriminator_column, options),
        attribute: None,
        nullable: false,
        unique: false,
        length: None,
    });

    state.add_table(
        root.class.clone(),
        TableReference::Physical(PhysicalTable {
            logical_name: names.logical.clone(),
            physical_name: names.physical,
            catalog: names.catalog,
            schema: names.schema,
            primary_key: primary_key.to_vec(),
            columns,
            key_reference: None,
        }),
    )?;

    for entity in hierarchy.entities() {
        state.add_binder(EntityBinder {
            class: entity.class.clone(),
            entity_name: entity.entity_name.clone(),
            super_entity: hierarchy
                .super_entity_of(entity.class.as_str())
                .map(|s| s.class.clone()),
            table: names.logical.clone(),
            key_columns: primary_key.to_vec(),
            discriminator_value: Some(entity.entity_name.clone()),
        });
    }

    Ok(())
}

///
/// JOINED: one relation per entity; each subtype table carries the hierarchy
/// key plus a key reference to its super-type's table.
///

fn bind_joined(
    state: &mut BindingState,
    hierarchy: &EntityHierarchy,
    primary_key: &[Identifier],
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<(), BindingError> {
    for entity in hierarchy.entities() {
        let names = resolve_table_names(entity, options, context);
        let super_entity = hierarchy.super_entity_of(entity.class.as_str());

        let mut columns = Vec::new();
        if super_entity.is_some() {
            for key in primary_key {
                columns.push(ColumnBinding {
                    name: key.clone(),
                    attribute: None,
                    nullable: false,
                    unique: false,
                    length: None,
                });
            }
        }
        for attr in declared_segment(hierarchy, entity)
            .into_iter()
            .filter(|a| is_column_backed(a))
        {
            push_column(&mut columns, column_binding(attr, options, context)?);
        }

        let key_reference = super_entity.map(|s| KeyReference {
            target_table: resolve_table_names(s, options, context).logical,
            columns: primary_key.to_vec(),
        });

        state.add_table(
            entity.class.clone(),
            TableReference::Physical(PhysicalTable {
                logical_name: names.logical.clone(),
                physical_name: names.physical,
                catalog: names.catalog,
                schema: names.schema,
                primary_key: primary_key.to_vec(),
                columns,
                key_reference,
            }),
        )?;

        state.add_binder(EntityBinder {
            class: entity.class.clone(),
            entity_name: entity.entity_name.clone(),
            super_entity: super_entity.map(|s| s.class.clone()),
            table: names.logical,
            key_columns: primary_key.to_vec(),
            discriminator_value: None,
        });
    }

    Ok(())
}

///
/// TABLE_PER_CLASS: one physically distinct relation per concrete entity,
/// each duplicating the full inherited column set and the root's primary
/// key. Abstract entities get no table.
///

fn bind_table_per_class(
    state: &mut BindingState,
    hierarchy: &EntityHierarchy,
    primary_key: &[Identifier],
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<(), BindingError> {
    let root = hierarchy.root_type();
    let root_names = resolve_table_names(root, options, context);

    for entity in hierarchy.entities() {
        let concrete = !entity.is_abstract;
        let names = resolve_table_names(entity, options, context);

        if concrete {
            let mut columns = Vec::new();
            for attr in hierarchy
                .inherited_attributes(entity.class.as_str())
                .into_iter()
                .filter(|a| is_column_backed(a))
            {
                push_column(&mut columns, column_binding(attr, options, context)?);
            }

            let table = PhysicalTable {
                logical_name: names.logical.clone(),
                physical_name: names.physical,
                catalog: names.catalog,
                schema: names.schema,
                primary_key: primary_key.to_vec(),
                columns,
                key_reference: None,
            };
            let reference = if entity.class == hierarchy.root {
                TableReference::Physical(table)
            } else {
                TableReference::Denormalized(DenormalizedTable {
                    table,
                    base: root_names.logical.clone(),
                })
            };
            state.add_table(entity.class.clone(), reference)?;
        }

        state.add_binder(EntityBinder {
            class: entity.class.clone(),
            entity_name: entity.entity_name.clone(),
            super_entity: hierarchy
                .super_entity_of(entity.class.as_str())
                .map(|s| s.class.clone()),
            table: if concrete {
                names.logical
            } else {
                root_names.logical.clone()
            },
            key_columns: primary_key.to_vec(),
            discriminator_value: None,
        });
    }

    Ok(())
}

fn bind_filter_definitions(
    state: &mut BindingState,
    globals: &GlobalRegistrations,
    context: &BindingContext,
) -> Result<(), BindingError> {
    for def in globals.filter_defs() {
        let mut parameters = BTreeMap::new();
        for (name, type_name) in &def.parameters {
            let mapping = context.types.basic_type(type_name).ok_or_else(|| {
                BindingError::UnresolvableFilterParamType {
                    filter: def.name.clone(),
                    parameter: name.clone(),
                    type_name: type_name.clone(),
                }
            })?;
            parameters.insert(name.clone(), mapping);
        }

        state.add_filter(BoundFilterDefinition {
            name: def.name.clone(),
            condition: def.condition.clone(),
            parameters,
        });
    }

    Ok(())
}

fn bind_named_queries(
    state: &mut BindingState,
    globals: &GlobalRegistrations,
) -> Result<(), BindingError> {
    for query in globals.named_queries() {
        state.add_named_query(query.name.clone(), query.query.clone())?;
    }

    Ok(())
}

struct TableNames {
    logical: Identifier,
    physical: Identifier,
    catalog: Option<Identifier>,
    schema: Option<Identifier>,
}

/// Logical name is the explicit table name when present, otherwise the
/// naming-strategy-applied entity name. The physical name always passes
/// through the strategy; catalog and schema fall back to unit defaults.
fn resolve_table_names(
    entity: &IdentifiableTypeMetadata,
    options: &BindingOptions,
    context: &BindingContext,
) -> TableNames {
    let explicit = entity.table.as_ref();
    let logical = explicit
        .and_then(|t| t.name.clone())
        .unwrap_or_else(|| context.naming.to_physical(&entity.entity_name));

    TableNames {
        physical: ident(&context.naming.to_physical(&logical), options),
        logical: ident(&logical, options),
        catalog: namespace(
            explicit.and_then(|t| t.catalog.as_deref()),
            &options.default_catalog,
            options,
        ),
        schema: namespace(
            explicit.and_then(|t| t.schema.as_deref()),
            &options.default_schema,
            options,
        ),
    }
}

/// Hierarchy key columns, resolved against the id attributes' column
/// mappings.
fn primary_key_columns(
    hierarchy: &EntityHierarchy,
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<Vec<Identifier>, BindingError> {
    let attrs = hierarchy.inherited_attributes(hierarchy.root.as_str());
    let mut columns = Vec::new();

    for name in hierarchy.id_mapping.attribute_names() {
        let explicit = attrs
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.column_annotation())
            .map(|c| c.non_empty_string("name"))
            .transpose()?
            .flatten();
        let text = explicit.unwrap_or_else(|| context.naming.to_physical(name));
        columns.push(ident(&text, options));
    }

    Ok(columns)
}

/// Attributes a joined-subclass table contributes itself: the entity's own
/// plus those of mapped superclasses between it and the next entity up.
fn declared_segment<'a>(
    hierarchy: &'a EntityHierarchy,
    entity: &'a IdentifiableTypeMetadata,
) -> Vec<&'a AttributeMetadata> {
    let mut segment = Vec::new();
    let mut current = hierarchy.type_of(entity.class.as_str());

    while let Some(t) = current {
        if t.class != entity.class && t.is_entity() {
            break;
        }
        segment.push(t);
        current = t
            .super_class
            .as_ref()
            .and_then(|s| hierarchy.type_of(s.as_str()));
    }

    segment
        .iter()
        .rev()
        .flat_map(|t| t.attributes.iter())
        .collect()
}

fn column_binding(
    attr: &AttributeMetadata,
    options: &BindingOptions,
    context: &BindingContext,
) -> Result<ColumnBinding, BindingError> {
    let column = attr.column_annotation();

    let name = column
        .map(|c| c.non_empty_string("name"))
        .transpose()?
        .flatten()
        .unwrap_or_else(|| context.naming.to_physical(&attr.name));
    let nullable = column
        .map(|c| c.bool_attribute("nullable"))
        .transpose()?
        .flatten()
        .unwrap_or(true);
    let unique = column
        .map(|c| c.bool_attribute("unique"))
        .transpose()?
        .flatten()
        .unwrap_or(false);
    let length = column.map(|c| c.int_attribute("length")).transpose()?.flatten();

    let key = attr.is_id() || attr.is_embedded_id();

    Ok(ColumnBinding {
        name: ident(&name, options),
        attribute: Some(attr.name.clone()),
        nullable: nullable && !key,
        unique,
        length,
    })
}

/// Collection-valued attributes live in their own tables, which are out of
/// scope here.
fn is_column_backed(attr: &AttributeMetadata) -> bool {
    matches!(
        attr.nature,
        AttributeNature::Basic
            | AttributeNature::ToOne
            | AttributeNature::Embedded
            | AttributeNature::Any
    )
}

/// Dedup by column name; the first declaration wins.
fn push_column(columns: &mut Vec<ColumnBinding>, column: ColumnBinding) {
    if !columns.iter().any(|c| c.name == column.name) {
        columns.push(column);
    }
}

fn ident(text: &str, options: &BindingOptions) -> Identifier {
    Identifier::new(text, options.quoted_identifiers)
}

fn namespace(
    explicit: Option<&str>,
    default: &Option<String>,
    options: &BindingOptions,
) -> Option<Identifier> {
    explicit
        .map(str::to_string)
        .or_else(|| default.clone())
        .map(|text| ident(&text, options))
}
