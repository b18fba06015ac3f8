use crate::{
    categorize::globals::{FilterDefinition, GlobalRegistrations},
    xml::{
        AttributeElement, ManagedTypeElement, MappingDocument, XmlError,
        preprocess::XmlPreProcessingResult,
    },
};
use bootmodel_source::prelude::*;
use tracing::debug;

///
/// OverrideTuple
///
/// A deferred (document, element) pair, applied onto the categorized
/// baseline in a second pass so XML can override individual attributes.
///

#[derive(Clone, Debug)]
pub struct OverrideTuple {
    pub document_index: usize,
    pub element: ManagedTypeElement,
}

///
/// XmlProcessingResult
///

#[derive(Debug, Default)]
pub struct XmlProcessingResult {
    pub overrides: Vec<OverrideTuple>,
}

/// Process every document in registration order: global declarations go to
/// the collector immediately; managed-type elements either apply now (when
/// effectively metadata-complete) or queue as override tuples.
pub fn process(
    pre: &XmlPreProcessingResult,
    collector: &mut GlobalRegistrations,
    registry: &mut ClassDetailsRegistry,
) -> Result<XmlProcessingResult, XmlError> {
    let unit_complete = pre.metadata.xml_mappings_complete();
    let mut result = XmlProcessingResult::default();

    for (document_index, document) in pre.documents.iter().enumerate() {
        apply_globals(document, collector);

        let document_complete = unit_complete || document.defaults.metadata_complete;

        // Embeddables join no hierarchy, so deferral buys nothing: apply
        // them straight onto the unified view.
        for element in &document.embeddables {
            apply_element(registry, element, &descriptor::EMBEDDABLE, document_complete)?;
        }

        let elements = document
            .entities
            .iter()
            .map(|e| (e, &descriptor::ENTITY))
            .chain(
                document
                    .mapped_superclasses
                    .iter()
                    .map(|e| (e, &descriptor::MAPPED_SUPERCLASS)),
            );

        for (element, marker) in elements {
            let effective_complete =
                document_complete || element.metadata_complete.unwrap_or(false);

            // Dynamic elements carry no annotation baseline to override;
            // they always apply now.
            if effective_complete || element.is_dynamic() {
                apply_element(registry, element, marker, document_complete)?;
            } else {
                debug!(
                    target = element.target()?,
                    document_index, "queueing deferred XML override"
                );
                result.overrides.push(OverrideTuple {
                    document_index,
                    element: element.clone(),
                });
            }
        }
    }

    Ok(result)
}

fn apply_globals(document: &MappingDocument, collector: &mut GlobalRegistrations) {
    for query in &document.named_queries {
        collector.register_named_query(&query.name, &query.query);
    }
    for converter in &document.converters {
        collector.register_converter(ClassName::new(&converter.class), converter.auto_apply);
    }
    for reg in &document.java_type_registrations {
        collector.register_java_type(&reg.java_type, ClassName::new(&reg.descriptor));
    }
    for reg in &document.jdbc_type_registrations {
        collector.register_jdbc_type(reg.type_code, ClassName::new(&reg.descriptor));
    }
    for reg in &document.user_type_registrations {
        collector.register_user_type(&reg.basic_class, ClassName::new(&reg.user_type));
    }
    for def in &document.filter_defs {
        collector.register_filter_def(FilterDefinition {
            name: def.name.clone(),
            condition: def.condition.clone(),
            parameters: def
                .parameters
                .iter()
                .map(|p| (p.name.clone(), p.type_name.clone()))
                .collect(),
        });
    }
    for listener in &document.entity_listeners {
        collector.register_entity_listener(ClassName::new(listener));
    }
}

/// Apply a metadata-complete element onto the unified view. `replace` (the
/// document declares completeness) discards annotation-sourced mapping
/// state the element does not mention; otherwise XML augments.
fn apply_element(
    registry: &mut ClassDetailsRegistry,
    element: &ManagedTypeElement,
    marker: &'static AnnotationDescriptor,
    replace: bool,
) -> Result<(), XmlError> {
    let target = element.target()?.to_string();

    let details = if element.is_dynamic() {
        registry.synthesize_dynamic(&target, element.extends.clone().map(ClassName::new))
    } else {
        registry.resolve_mut(&target)?
    };

    if replace {
        strip_mapping_annotations(details);
    }

    let mut type_marker = AnnotationUsage::new(marker);
    if marker == &descriptor::ENTITY
        && let Some(name) = &element.name
    {
        type_marker = type_marker.with("name", name.as_str());
    }
    details.apply_annotation(type_marker);

    if let Some(table) = &element.table {
        let mut usage = AnnotationUsage::new(&descriptor::TABLE);
        if let Some(name) = &table.name {
            usage = usage.with("name", name.as_str());
        }
        if let Some(catalog) = &table.catalog {
            usage = usage.with("catalog", catalog.as_str());
        }
        if let Some(schema) = &table.schema {
            usage = usage.with("schema", schema.as_str());
        }
        details.apply_annotation(usage);
    }

    for secondary in &element.secondary_tables {
        let Some(name) = &secondary.name else {
            return Err(XmlError::MissingTableName {
                class: target.clone(),
            });
        };
        let mut usage =
            AnnotationUsage::new(&descriptor::SECONDARY_TABLE).with("name", name.as_str());
        if let Some(catalog) = &secondary.catalog {
            usage = usage.with("catalog", catalog.as_str());
        }
        if let Some(schema) = &secondary.schema {
            usage = usage.with("schema", schema.as_str());
        }
        details.apply_annotation(usage);
    }

    if let Some(kind) = element.inheritance {
        details.apply_annotation(
            AnnotationUsage::new(&descriptor::INHERITANCE)
                .with("strategy", AnnotationValue::Enum(kind.as_constant().to_string())),
        );
    }

    if let Some(column) = &element.discriminator_column {
        details.apply_annotation(
            AnnotationUsage::new(&descriptor::DISCRIMINATOR_COLUMN).with("name", column.as_str()),
        );
    }

    if let Some(cacheable) = element.cacheable {
        details.apply_annotation(AnnotationUsage::new(&descriptor::CACHEABLE).with("value", cacheable));
    }

    if !element.listeners.is_empty() {
        let listeners = element
            .listeners
            .iter()
            .map(|l| AnnotationValue::Class(ClassName::new(l)))
            .collect();
        details.apply_annotation(
            AnnotationUsage::new(&descriptor::ENTITY_LISTENERS)
                .with("value", AnnotationValue::List(listeners)),
        );
    }

    for callback in &element.callbacks {
        let usage = AnnotationUsage::new(callback.kind.marker());
        if let Some(member) = details.member_mut(&callback.method) {
            member.apply_annotation(usage);
        } else {
            let mut annotations = AnnotationList::default();
            annotations.attach(usage);
            details.add_member(MemberDetails::new(
                callback.method.clone(),
                None,
                MemberKind::Getter,
                false,
                annotations,
            ));
        }
    }

    for attribute in &element.attributes {
        if details.member_mut(&attribute.name).is_none() {
            if details.is_dynamic() {
                details.add_member(MemberDetails::new(
                    attribute.name.clone(),
                    attribute.declared_type.clone().map(ClassName::new),
                    MemberKind::Field,
                    true,
                    AnnotationList::default(),
                ));
            } else {
                return Err(XmlError::UnknownMember {
                    class: target.clone(),
                    member: attribute.name.clone(),
                });
            }
        }

        if let Some(member) = details.member_mut(&attribute.name) {
            apply_attribute_element(member, attribute);
        }
    }

    Ok(())
}

/// Attach the usages one attribute element describes onto a member,
/// overwriting only what the element specifies. Shared with the deferred
/// override pass.
pub(crate) fn apply_attribute_element(member: &mut MemberDetails, attribute: &AttributeElement) {
    use crate::types::AttributeNature;

    if attribute.is_id {
        member.apply_annotation(AnnotationUsage::new(&descriptor::ID));
    }
    if attribute.is_embedded_id {
        member.apply_annotation(AnnotationUsage::new(&descriptor::EMBEDDED_ID));
    }
    if attribute.is_version {
        member.apply_annotation(AnnotationUsage::new(&descriptor::VERSION));
    }
    if attribute.is_tenant_id {
        member.apply_annotation(AnnotationUsage::new(&descriptor::TENANT_ID));
    }

    if let Some(nature) = attribute.nature {
        let usage = match nature {
            AttributeNature::Basic => AnnotationUsage::new(&descriptor::BASIC),
            AttributeNature::Embedded => AnnotationUsage::new(&descriptor::EMBEDDED),
            AttributeNature::Any => AnnotationUsage::new(&descriptor::ANY),
            AttributeNature::ElementCollection => {
                AnnotationUsage::new(&descriptor::ELEMENT_COLLECTION)
            }
            AttributeNature::ToOne => with_target(
                AnnotationUsage::new(&descriptor::MANY_TO_ONE),
                attribute.target_entity.as_deref(),
            ),
            AttributeNature::ToMany => with_target(
                AnnotationUsage::new(&descriptor::ONE_TO_MANY),
                attribute.target_entity.as_deref(),
            ),
        };
        member.apply_annotation(usage);
    }

    if let Some(column) = &attribute.column {
        let mut usage = AnnotationUsage::new(&descriptor::COLUMN);
        if let Some(name) = &column.name {
            usage = usage.with("name", name.as_str());
        }
        if let Some(nullable) = column.nullable {
            usage = usage.with("nullable", nullable);
        }
        if let Some(unique) = column.unique {
            usage = usage.with("unique", unique);
        }
        if let Some(length) = column.length {
            usage = usage.with("length", length);
        }
        if let Some(table) = &column.table {
            usage = usage.with("table", table.as_str());
        }
        member.apply_annotation(usage);
    }

    if let Some(access) = attribute.access {
        member.apply_annotation(
            AnnotationUsage::new(&descriptor::ACCESS)
                .with("value", AnnotationValue::Enum(access.to_string())),
        );
    }
}

fn with_target(usage: AnnotationUsage, target: Option<&str>) -> AnnotationUsage {
    match target {
        Some(target) => usage.with("target_entity", ClassName::new(target)),
        None => usage,
    }
}

fn strip_mapping_annotations(details: &mut ClassDetails) {
    for kind in [
        &descriptor::TABLE,
        &descriptor::SECONDARY_TABLE,
        &descriptor::INHERITANCE,
        &descriptor::DISCRIMINATOR_COLUMN,
        &descriptor::CACHEABLE,
        &descriptor::CACHE,
        &descriptor::ENTITY_LISTENERS,
    ] {
        details.remove_annotation(kind);
    }

    let member_names: Vec<String> = details
        .members()
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    for name in member_names {
        if let Some(member) = details.member_mut(&name) {
            member.clear_annotations();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{ColumnElement, DocumentDefaults, preprocess::preprocess};

    fn indexed_person() -> ClassDetailsRegistry {
        let source = StaticClassSource::new(ClassOrigin::Indexed).with_class(
            "org.example.Person",
            RawClass {
                members: vec![
                    RawMember::field("id", Some("long"))
                        .with_annotation(AnnotationUsage::new(&descriptor::ID)),
                    RawMember::field("name", Some("java.lang.String")).with_annotation(
                        AnnotationUsage::new(&descriptor::COLUMN).with("name", "full_name"),
                    ),
                ],
                annotations: vec![AnnotationUsage::new(&descriptor::ENTITY)],
                ..RawClass::default()
            },
        );

        ClassDetailsRegistry::new().with_source(source)
    }

    fn entity_element(class: Option<&str>, name: Option<&str>) -> ManagedTypeElement {
        ManagedTypeElement {
            class: class.map(ToString::to_string),
            name: name.map(ToString::to_string),
            ..ManagedTypeElement::default()
        }
    }

    #[test]
    fn dynamic_entity_is_synthesized_with_members() {
        let mut registry = ClassDetailsRegistry::new();
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(None, Some("Order"));
        element.metadata_complete = Some(true);
        element.attributes = vec![AttributeElement {
            name: "total".to_string(),
            declared_type: Some("java.math.BigDecimal".to_string()),
            is_id: true,
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            entities: vec![element],
            ..MappingDocument::default()
        }]);
        let result = process(&pre, &mut globals, &mut registry).unwrap();

        assert!(result.overrides.is_empty());
        let order = registry.try_get("Order").unwrap();
        assert!(order.is_dynamic());
        assert!(order.has_annotation(&descriptor::ENTITY));
        assert!(order.member("total").unwrap().has_annotation(&descriptor::ID));
    }

    #[test]
    fn incomplete_dynamic_entity_is_applied_immediately() {
        let mut registry = ClassDetailsRegistry::new();
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(None, Some("Order"));
        element.attributes = vec![AttributeElement {
            name: "total".to_string(),
            declared_type: Some("java.math.BigDecimal".to_string()),
            is_id: true,
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            entities: vec![element],
            ..MappingDocument::default()
        }]);
        let result = process(&pre, &mut globals, &mut registry).unwrap();

        assert!(result.overrides.is_empty());
        let order = registry.try_get("Order").unwrap();
        assert!(order.is_dynamic());
        assert!(order.member("total").unwrap().has_annotation(&descriptor::ID));
    }

    #[test]
    fn incomplete_embeddable_applies_without_deferral() {
        let source = StaticClassSource::new(ClassOrigin::Indexed).with_class(
            "com.acme.Address",
            RawClass {
                members: vec![RawMember::field("street", Some("java.lang.String"))],
                annotations: vec![AnnotationUsage::new(&descriptor::EMBEDDABLE)],
                ..RawClass::default()
            },
        );
        let mut registry = ClassDetailsRegistry::new().with_source(source);
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(Some("com.acme.Address"), None);
        element.attributes = vec![AttributeElement {
            name: "street".to_string(),
            column: Some(ColumnElement {
                name: Some("street_line".to_string()),
                ..ColumnElement::default()
            }),
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            embeddables: vec![element],
            ..MappingDocument::default()
        }]);
        let result = process(&pre, &mut globals, &mut registry).unwrap();

        assert!(result.overrides.is_empty());
        let address = registry.try_get("com.acme.Address").unwrap();
        assert!(address.has_annotation(&descriptor::EMBEDDABLE));
        assert_eq!(
            address
                .member("street")
                .unwrap()
                .annotation(&descriptor::COLUMN)
                .unwrap()
                .string_attribute("name")
                .unwrap(),
            Some("street_line".to_string())
        );
    }

    #[test]
    fn document_completeness_discards_unmentioned_member_annotations() {
        let mut registry = indexed_person();
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(Some("org.example.Person"), None);
        element.attributes = vec![AttributeElement {
            name: "id".to_string(),
            is_id: true,
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            defaults: DocumentDefaults {
                metadata_complete: true,
                ..DocumentDefaults::default()
            },
            entities: vec![element],
            ..MappingDocument::default()
        }]);
        process(&pre, &mut globals, &mut registry).unwrap();

        let person = registry.try_get("org.example.Person").unwrap();
        assert!(person.member("id").unwrap().has_annotation(&descriptor::ID));
        // "name" was not mentioned by the complete document: its Column is gone.
        assert!(!person.member("name").unwrap().has_annotation(&descriptor::COLUMN));
    }

    #[test]
    fn element_level_completeness_augments_instead_of_replacing() {
        let mut registry = indexed_person();
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(Some("org.example.Person"), None);
        element.metadata_complete = Some(true);
        element.attributes = vec![AttributeElement {
            name: "id".to_string(),
            column: Some(ColumnElement {
                name: Some("person_id".to_string()),
                ..ColumnElement::default()
            }),
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            entities: vec![element],
            ..MappingDocument::default()
        }]);
        process(&pre, &mut globals, &mut registry).unwrap();

        let person = registry.try_get("org.example.Person").unwrap();
        // The untouched member keeps its annotation-sourced Column.
        assert!(person.member("name").unwrap().has_annotation(&descriptor::COLUMN));
        assert_eq!(
            person
                .member("id")
                .unwrap()
                .annotation(&descriptor::COLUMN)
                .unwrap()
                .string_attribute("name")
                .unwrap(),
            Some("person_id".to_string())
        );
    }

    #[test]
    fn incomplete_element_is_queued_not_applied() {
        let mut registry = indexed_person();
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(Some("org.example.Person"), None);
        element.attributes = vec![AttributeElement {
            name: "name".to_string(),
            column: Some(ColumnElement {
                name: Some("description".to_string()),
                ..ColumnElement::default()
            }),
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            entities: vec![element],
            ..MappingDocument::default()
        }]);
        let result = process(&pre, &mut globals, &mut registry).unwrap();

        assert_eq!(result.overrides.len(), 1);
        // Baseline untouched until the overlay pass; resolve materializes
        // the class without the deferred element being applied.
        let person = registry.resolve("org.example.Person").unwrap();
        assert_eq!(
            person
                .member("name")
                .unwrap()
                .annotation(&descriptor::COLUMN)
                .unwrap()
                .string_attribute("name")
                .unwrap(),
            Some("full_name".to_string())
        );
    }

    #[test]
    fn complete_mapping_for_unknown_member_of_backed_class_fails() {
        let mut registry = indexed_person();
        let mut globals = GlobalRegistrations::default();

        let mut element = entity_element(Some("org.example.Person"), None);
        element.metadata_complete = Some(true);
        element.attributes = vec![AttributeElement {
            name: "ghost".to_string(),
            ..AttributeElement::default()
        }];

        let pre = preprocess(vec![MappingDocument {
            entities: vec![element],
            ..MappingDocument::default()
        }]);
        let err = process(&pre, &mut globals, &mut registry).unwrap_err();

        assert!(matches!(err, XmlError::UnknownMember { .. }));
    }

    #[test]
    fn global_declarations_apply_even_when_elements_are_deferred() {
        let mut registry = indexed_person();
        let mut globals = GlobalRegistrations::default();

        let pre = preprocess(vec![MappingDocument {
            entities: vec![entity_element(Some("org.example.Person"), None)],
            named_queries: vec![crate::xml::NamedQueryElement {
                name: "Person.all".to_string(),
                query: "from Person".to_string(),
            }],
            ..MappingDocument::default()
        }]);
        let result = process(&pre, &mut globals, &mut registry).unwrap();

        assert_eq!(result.overrides.len(), 1);
        assert_eq!(globals.named_queries().len(), 1);
    }
}
