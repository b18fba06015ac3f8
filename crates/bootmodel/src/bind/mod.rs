pub mod coordinator;
pub mod table;

pub use coordinator::bind;
pub use table::{
    ColumnBinding, DenormalizedTable, Identifier, InlineView, KeyReference, PhysicalTable,
    SecondaryTable, TableReference,
};

use bootmodel_source::prelude::{ClassName, SourceError};
use convert_case::{Case, Casing};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// BindingError
///

#[derive(Debug, ThisError)]
pub enum BindingError {
    #[error("filter definition '{filter}': parameter '{parameter}' has unresolvable type '{type_name}'")]
    UnresolvableFilterParamType {
        filter: String,
        parameter: String,
        type_name: String,
    },

    #[error("duplicate named query '{name}'")]
    DuplicateNamedQuery { name: String },

    #[error("table '{table}' is bound to '{existing}' and cannot also be bound to '{requested}'")]
    TableOwnerConflict {
        table: String,
        existing: ClassName,
        requested: ClassName,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

///
/// BindingOptions
///
/// Unit-level defaults feeding physical name resolution. Catalog and schema
/// fall back to these when a mapping carries no explicit value.
///

#[derive(Clone, Debug, Default)]
pub struct BindingOptions {
    pub default_catalog: Option<String>,
    pub default_schema: Option<String>,
    pub quoted_identifiers: bool,
}

///
/// NamingStrategy
///
/// Maps logical names onto physical ones. The standard strategy lowers
/// CamelCase to snake_case.
///

pub trait NamingStrategy {
    fn to_physical(&self, logical: &str) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SnakeCaseNaming;

impl NamingStrategy for SnakeCaseNaming {
    fn to_physical(&self, logical: &str) -> String {
        logical.to_case(Case::Snake)
    }
}

///
/// JdbcMapping
///
/// The resolved descriptor pair for a basic type name.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct JdbcMapping {
    pub type_name: String,
    pub jdbc_code: i32,
}

///
/// TypeConfiguration
///
/// Resolves basic type names to JDBC mappings. Filter definition parameter
/// types must resolve here or binding fails.
///

pub trait TypeConfiguration {
    fn basic_type(&self, name: &str) -> Option<JdbcMapping>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardTypeConfiguration;

impl TypeConfiguration for StandardTypeConfiguration {
    fn basic_type(&self, name: &str) -> Option<JdbcMapping> {
        let code = match name {
            "boolean" | "java.lang.Boolean" => 16,
            "int" | "integer" | "java.lang.Integer" => 4,
            "long" | "java.lang.Long" => -5,
            "short" | "java.lang.Short" => 5,
            "float" | "java.lang.Float" => 6,
            "double" | "java.lang.Double" => 8,
            "big_decimal" | "java.math.BigDecimal" => 3,
            "string" | "java.lang.String" => 12,
            "date" | "java.time.LocalDate" => 91,
            "time" | "java.time.LocalTime" => 92,
            "timestamp" | "java.time.Instant" | "java.time.LocalDateTime" => 93,
            "uuid" | "java.util.UUID" => 1111,
            "binary" | "byte[]" => -2,
            _ => return None,
        };

        Some(JdbcMapping {
            type_name: name.to_string(),
            jdbc_code: code,
        })
    }
}

///
/// BindingContext
///
/// The pluggable services a binding run consults.
///

#[derive(Clone, Copy)]
pub struct BindingContext<'a> {
    pub naming: &'a dyn NamingStrategy,
    pub types: &'a dyn TypeConfiguration,
}

impl BindingContext<'_> {
    /// Snake-case naming plus the standard basic-type table.
    #[must_use]
    pub fn standard() -> BindingContext<'static> {
        BindingContext {
            naming: &SnakeCaseNaming,
            types: &StandardTypeConfiguration,
        }
    }
}

impl Default for BindingContext<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

///
/// EntityBinder
///
/// Per-entity binding record, addressable by class and by super-type.
///

#[derive(Clone, Debug, Serialize)]
pub struct EntityBinder {
    pub class: ClassName,
    pub entity_name: String,
    pub super_entity: Option<ClassName>,

    /// Logical name of the entity's primary table.
    pub table: Identifier,

    /// Primary key column names, as rendered into the table.
    pub key_columns: Vec<Identifier>,

    /// Discriminator value this entity maps to, when the hierarchy carries a
    /// discriminator column.
    pub discriminator_value: Option<String>,
}

///
/// BoundFilterDefinition
///

#[derive(Clone, Debug, Serialize)]
pub struct BoundFilterDefinition {
    pub name: String,
    pub condition: Option<String>,
    pub parameters: BTreeMap<String, JdbcMapping>,
}

///
/// BindingState
///
/// Everything a binding run produces: the table topology, per-entity
/// binders, bound filter definitions, and the named query catalog.
///

#[derive(Debug, Default, Serialize)]
pub struct BindingState {
    tables: Vec<TableReference>,
    by_name: BTreeMap<String, usize>,
    by_owner: BTreeMap<ClassName, Vec<usize>>,
    binders: BTreeMap<ClassName, EntityBinder>,
    filters: BTreeMap<String, BoundFilterDefinition>,
    named_queries: BTreeMap<String, String>,
}

impl BindingState {
    #[must_use]
    pub fn tables(&self) -> &[TableReference] {
        &self.tables
    }

    #[must_use]
    pub fn table_by_name(&self, logical: &str) -> Option<&TableReference> {
        self.by_name.get(logical).map(|&i| &self.tables[i])
    }

    #[must_use]
    pub fn tables_of(&self, owner: &ClassName) -> Vec<&TableReference> {
        self.by_owner
            .get(owner)
            .map(|ixs| ixs.iter().map(|&i| &self.tables[i]).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn binder(&self, class: &ClassName) -> Option<&EntityBinder> {
        self.binders.get(class)
    }

    pub fn binders(&self) -> impl Iterator<Item = &EntityBinder> {
        self.binders.values()
    }

    /// All binders whose direct super-entity is `class`.
    #[must_use]
    pub fn binders_by_super(&self, class: &ClassName) -> Vec<&EntityBinder> {
        self.binders
            .values()
            .filter(|b| b.super_entity.as_ref() == Some(class))
            .collect()
    }

    #[must_use]
    pub fn filter_definition(&self, name: &str) -> Option<&BoundFilterDefinition> {
        self.filters.get(name)
    }

    #[must_use]
    pub const fn filter_definitions(&self) -> &BTreeMap<String, BoundFilterDefinition> {
        &self.filters
    }

    #[must_use]
    pub const fn named_queries(&self) -> &BTreeMap<String, String> {
        &self.named_queries
    }

    pub(crate) fn add_table(
        &mut self,
        owner: ClassName,
        table: TableReference,
    ) -> Result<usize, BindingError> {
        let logical = table.logical_name().text.clone();
        if let Some(&existing) = self.by_name.get(&logical) {
            let holder = self
                .by_owner
                .iter()
                .find(|(_, ixs)| ixs.contains(&existing))
                .map(|(class, _)| class.clone());
            if let Some(holder) = holder
                && holder != owner
            {
                return Err(BindingError::TableOwnerConflict {
                    table: logical,
                    existing: holder,
                    requested: owner,
                });
            }
        }

        let index = self.tables.len();
        self.tables.push(table);
        self.by_name.insert(logical, index);
        self.by_owner.entry(owner).or_default().push(index);

        Ok(index)
    }

    pub(crate) fn add_binder(&mut self, binder: EntityBinder) {
        self.binders.insert(binder.class.clone(), binder);
    }

    pub(crate) fn add_filter(&mut self, filter: BoundFilterDefinition) {
        self.filters.insert(filter.name.clone(), filter);
    }

    pub(crate) fn add_named_query(
        &mut self,
        name: String,
        query: String,
    ) -> Result<(), BindingError> {
        if self.named_queries.contains_key(&name) {
            return Err(BindingError::DuplicateNamedQuery { name });
        }
        self.named_queries.insert(name, query);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physical(logical: &str) -> TableReference {
        TableReference::Physical(PhysicalTable {
            logical_name: Identifier::new(logical, false),
            physical_name: Identifier::new(logical, false),
            catalog: None,
            schema: None,
            primary_key: vec![Identifier::new("id", false)],
            columns: Vec::new(),
            key_reference: None,
        })
    }

    #[test]
    fn snake_case_naming_lowers_camel_case() {
        let naming = SnakeCaseNaming;

        assert_eq!(naming.to_physical("OrderLine"), "order_line");
        assert_eq!(naming.to_physical("customer"), "customer");
    }

    #[test]
    fn standard_types_resolve_common_names() {
        let types = StandardTypeConfiguration;

        assert_eq!(
            types.basic_type("java.lang.String").map(|m| m.jdbc_code),
            Some(12)
        );
        assert!(types.basic_type("com.acme.Opaque").is_none());
    }

    #[test]
    fn quoted_identifier_renders_with_quotes() {
        assert_eq!(Identifier::new("order", true).render(), "\"order\"");
        assert_eq!(Identifier::new("order", false).render(), "order");
    }

    #[test]
    fn table_name_collision_across_owners_fails() {
        let mut state = BindingState::default();
        let a = ClassName::new("com.acme.A");
        let b = ClassName::new("com.acme.B");

        state.add_table(a, physical("shared")).unwrap();
        let err = state.add_table(b, physical("shared")).unwrap_err();

        assert!(matches!(err, BindingError::TableOwnerConflict { .. }));
    }

    #[test]
    fn duplicate_named_query_fails() {
        let mut state = BindingState::default();

        state
            .add_named_query("byName".to_string(), "from A".to_string())
            .unwrap();
        let err = state
            .add_named_query("byName".to_string(), "from B".to_string())
            .unwrap_err();

        assert!(matches!(err, BindingError::DuplicateNamedQuery { .. }));
    }
}
