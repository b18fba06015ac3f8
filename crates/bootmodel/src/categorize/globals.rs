use bootmodel_source::prelude::{
    AnnotationUsage, ClassDetails, ClassName, SourceError, descriptor,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

///
/// FilterDefinition
///
/// Parameter types are declared type names; binding resolves them to
/// concrete JDBC mappings.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterDefinition {
    pub name: String,
    pub condition: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

///
/// ConverterRegistration
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConverterRegistration {
    pub class: ClassName,
    pub auto_apply: bool,
}

///
/// NamedQueryRegistration
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedQueryRegistration {
    pub name: String,
    pub query: String,
}

///
/// GlobalRegistrations
///
/// Persistence-unit-scoped registrations collected from annotations and XML.
/// Registrations are add-only with last-registered-per-key wins, except
/// filter-definition parameter maps, which merge per parameter name. Named
/// queries keep registration order; name uniqueness is a binding-time
/// concern.
///

#[derive(Debug, Default, Serialize)]
pub struct GlobalRegistrations {
    java_types: BTreeMap<String, ClassName>,
    jdbc_types: BTreeMap<i64, ClassName>,
    user_types: BTreeMap<String, ClassName>,
    converters: BTreeMap<String, ConverterRegistration>,
    filter_defs: BTreeMap<String, FilterDefinition>,
    entity_listeners: BTreeSet<ClassName>,
    named_queries: Vec<NamedQueryRegistration>,
}

impl GlobalRegistrations {
    pub fn register_java_type(&mut self, java_type: impl Into<String>, descriptor: ClassName) {
        self.java_types.insert(java_type.into(), descriptor);
    }

    pub fn register_jdbc_type(&mut self, type_code: i64, descriptor: ClassName) {
        self.jdbc_types.insert(type_code, descriptor);
    }

    pub fn register_user_type(&mut self, basic_class: impl Into<String>, user_type: ClassName) {
        self.user_types.insert(basic_class.into(), user_type);
    }

    pub fn register_converter(&mut self, class: ClassName, auto_apply: bool) {
        self.converters.insert(
            class.as_str().to_string(),
            ConverterRegistration { class, auto_apply },
        );
    }

    /// Last registration wins for the condition; parameter maps merge
    /// per-name instead of being replaced wholesale.
    pub fn register_filter_def(&mut self, def: FilterDefinition) {
        debug!(name = %def.name, "registering filter definition");

        let entry = self.filter_defs.entry(def.name.clone()).or_default();
        entry.name = def.name;
        if def.condition.is_some() {
            entry.condition = def.condition;
        }
        entry.parameters.extend(def.parameters);
    }

    pub fn register_entity_listener(&mut self, class: ClassName) {
        self.entity_listeners.insert(class);
    }

    pub fn register_named_query(&mut self, name: impl Into<String>, query: impl Into<String>) {
        self.named_queries.push(NamedQueryRegistration {
            name: name.into(),
            query: query.into(),
        });
    }

    #[must_use]
    pub fn java_type(&self, java_type: &str) -> Option<&ClassName> {
        self.java_types.get(java_type)
    }

    #[must_use]
    pub fn jdbc_type(&self, type_code: i64) -> Option<&ClassName> {
        self.jdbc_types.get(&type_code)
    }

    #[must_use]
    pub fn user_type(&self, basic_class: &str) -> Option<&ClassName> {
        self.user_types.get(basic_class)
    }

    #[must_use]
    pub fn converter(&self, class: &str) -> Option<&ConverterRegistration> {
        self.converters.get(class)
    }

    #[must_use]
    pub fn filter_def(&self, name: &str) -> Option<&FilterDefinition> {
        self.filter_defs.get(name)
    }

    pub fn filter_defs(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.filter_defs.values()
    }

    #[must_use]
    pub const fn entity_listeners(&self) -> &BTreeSet<ClassName> {
        &self.entity_listeners
    }

    #[must_use]
    pub fn named_queries(&self) -> &[NamedQueryRegistration] {
        &self.named_queries
    }
}

/// Collect class-level global registration annotations into the collector.
/// Runs before XML processing so XML declarations win per-key.
pub fn collect_class_annotations(
    details: &ClassDetails,
    collector: &mut GlobalRegistrations,
) -> Result<(), SourceError> {
    for usage in details.repeated_annotations(&descriptor::NAMED_QUERY) {
        collector.register_named_query(
            require_string(usage, "name")?,
            require_string(usage, "query")?,
        );
    }

    for usage in details.repeated_annotations(&descriptor::FILTER_DEF) {
        let mut parameters = BTreeMap::new();
        for param in usage.nested_list("parameters")? {
            parameters.insert(
                require_string(&param, "name")?,
                require_string(&param, "type")?,
            );
        }
        collector.register_filter_def(FilterDefinition {
            name: require_string(usage, "name")?,
            condition: usage.non_empty_string("default_condition")?,
            parameters,
        });
    }

    for usage in details.repeated_annotations(&descriptor::JAVA_TYPE_REGISTRATION) {
        collector.register_java_type(
            require_class(usage, "java_type")?.as_str().to_string(),
            require_class(usage, "descriptor")?,
        );
    }

    for usage in details.repeated_annotations(&descriptor::JDBC_TYPE_REGISTRATION) {
        let type_code = usage.int_attribute("register_under")?.unwrap_or(0);
        collector.register_jdbc_type(type_code, require_class(usage, "descriptor")?);
    }

    for usage in details.repeated_annotations(&descriptor::TYPE_REGISTRATION) {
        collector.register_user_type(
            require_class(usage, "basic_class")?.as_str().to_string(),
            require_class(usage, "user_type")?,
        );
    }

    if let Some(usage) = details.annotation(&descriptor::CONVERTER) {
        collector.register_converter(
            require_class(usage, "value")?,
            usage.bool_attribute("auto_apply")?.unwrap_or(false),
        );
    }

    Ok(())
}

fn require_string(usage: &AnnotationUsage, attribute: &'static str) -> Result<String, SourceError> {
    usage
        .string_attribute(attribute)?
        .ok_or_else(|| SourceError::UnsetAttribute {
            annotation: usage.descriptor().name,
            attribute: attribute.to_string(),
        })
}

fn require_class(
    usage: &AnnotationUsage,
    attribute: &'static str,
) -> Result<ClassName, SourceError> {
    usage
        .class_attribute(attribute)?
        .ok_or_else(|| SourceError::UnsetAttribute {
            annotation: usage.descriptor().name,
            attribute: attribute.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_registration_is_last_wins_per_class() {
        let mut globals = GlobalRegistrations::default();
        globals.register_converter(ClassName::new("conv.Money"), false);
        globals.register_converter(ClassName::new("conv.Money"), true);

        assert!(globals.converter("conv.Money").unwrap().auto_apply);
    }

    #[test]
    fn filter_def_parameters_merge_per_name() {
        let mut globals = GlobalRegistrations::default();
        globals.register_filter_def(FilterDefinition {
            name: "region".to_string(),
            condition: Some("region = :code".to_string()),
            parameters: [("code".to_string(), "string".to_string())].into(),
        });
        globals.register_filter_def(FilterDefinition {
            name: "region".to_string(),
            condition: None,
            parameters: [("zone".to_string(), "int".to_string())].into(),
        });

        let def = globals.filter_def("region").unwrap();
        assert_eq!(def.condition.as_deref(), Some("region = :code"));
        assert_eq!(def.parameters.len(), 2);
    }
}
