use crate::{
    types::{AccessType, CascadeType},
    xml::MappingDocument,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

///
/// PersistenceUnitMetadata
///
/// Aggregate over all documents. Booleans are monotonic (once true, stays
/// true), scalars are last-applied-wins, cascade defaults are a set union.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct PersistenceUnitMetadata {
    xml_mappings_complete: bool,
    use_quoted_identifiers: bool,
    default_catalog: Option<String>,
    default_schema: Option<String>,
    default_access: Option<AccessType>,
    default_access_strategy: Option<String>,
    default_cascades: BTreeSet<CascadeType>,
}

impl PersistenceUnitMetadata {
    pub fn add_document(&mut self, document: &MappingDocument) {
        let defaults = &document.defaults;

        self.xml_mappings_complete |= defaults.metadata_complete;
        self.use_quoted_identifiers |= defaults.quoted_identifiers;

        if let Some(catalog) = &defaults.catalog {
            self.default_catalog = Some(catalog.clone());
        }
        if let Some(schema) = &defaults.schema {
            self.default_schema = Some(schema.clone());
        }
        if let Some(access) = defaults.access {
            self.default_access = Some(access);
        }
        if let Some(strategy) = &defaults.access_strategy {
            self.default_access_strategy = Some(strategy.clone());
        }

        self.default_cascades.extend(defaults.cascades.iter().copied());
    }

    #[must_use]
    pub const fn xml_mappings_complete(&self) -> bool {
        self.xml_mappings_complete
    }

    #[must_use]
    pub const fn use_quoted_identifiers(&self) -> bool {
        self.use_quoted_identifiers
    }

    #[must_use]
    pub fn default_catalog(&self) -> Option<&str> {
        self.default_catalog.as_deref()
    }

    #[must_use]
    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    #[must_use]
    pub const fn default_access(&self) -> Option<AccessType> {
        self.default_access
    }

    #[must_use]
    pub fn default_access_strategy(&self) -> Option<&str> {
        self.default_access_strategy.as_deref()
    }

    #[must_use]
    pub const fn default_cascades(&self) -> &BTreeSet<CascadeType> {
        &self.default_cascades
    }
}

///
/// XmlPreProcessingResult
///

#[derive(Debug)]
pub struct XmlPreProcessingResult {
    pub metadata: PersistenceUnitMetadata,
    pub documents: Vec<MappingDocument>,
}

/// Aggregate every document's persistence-unit defaults, preserving
/// registration order. Pure aggregation: no element classification and no
/// conflict detection happen here.
#[must_use]
pub fn preprocess(documents: Vec<MappingDocument>) -> XmlPreProcessingResult {
    let mut metadata = PersistenceUnitMetadata::default();

    for document in &documents {
        metadata.add_document(document);
    }

    debug!(
        documents = documents.len(),
        complete = metadata.xml_mappings_complete,
        "aggregated persistence-unit metadata"
    );

    XmlPreProcessingResult {
        metadata,
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::DocumentDefaults;

    fn doc(defaults: DocumentDefaults) -> MappingDocument {
        MappingDocument {
            defaults,
            ..MappingDocument::default()
        }
    }

    #[test]
    fn mappings_complete_is_monotonic() {
        let mut metadata = PersistenceUnitMetadata::default();

        metadata.add_document(&doc(DocumentDefaults {
            metadata_complete: true,
            ..DocumentDefaults::default()
        }));
        metadata.add_document(&doc(DocumentDefaults::default()));

        assert!(metadata.xml_mappings_complete());
    }

    #[test]
    fn scalar_defaults_are_last_applied_wins() {
        let a = doc(DocumentDefaults {
            catalog: Some("cat_a".to_string()),
            ..DocumentDefaults::default()
        });
        let b = doc(DocumentDefaults {
            catalog: Some("cat_b".to_string()),
            ..DocumentDefaults::default()
        });

        let ab = preprocess(vec![a.clone(), b.clone()]);
        let ba = preprocess(vec![b, a]);

        assert_eq!(ab.metadata.default_catalog(), Some("cat_b"));
        assert_eq!(ba.metadata.default_catalog(), Some("cat_a"));
    }

    #[test]
    fn document_without_a_scalar_keeps_the_previous_value() {
        let mut metadata = PersistenceUnitMetadata::default();

        metadata.add_document(&doc(DocumentDefaults {
            schema: Some("s1".to_string()),
            ..DocumentDefaults::default()
        }));
        metadata.add_document(&doc(DocumentDefaults::default()));

        assert_eq!(metadata.default_schema(), Some("s1"));
    }

    #[test]
    fn cascade_defaults_union_across_documents() {
        let mut metadata = PersistenceUnitMetadata::default();

        metadata.add_document(&doc(DocumentDefaults {
            cascades: [CascadeType::Persist].into(),
            ..DocumentDefaults::default()
        }));
        metadata.add_document(&doc(DocumentDefaults {
            cascades: [CascadeType::Merge].into(),
            ..DocumentDefaults::default()
        }));

        assert_eq!(
            metadata.default_cascades().iter().copied().collect::<Vec<_>>(),
            vec![CascadeType::Merge, CascadeType::Persist]
        );
    }
}
