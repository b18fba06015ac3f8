//! Deferred XML override application.
//!
//! Override tuples queued during XML processing are overlaid onto the
//! categorized baseline: only what an element explicitly specifies is
//! replaced, everything else on the attribute survives.

use crate::{
    categorize::{Caching, CategorizationError, EntityHierarchy},
    xml::process::{OverrideTuple, apply_attribute_element},
};
use tracing::debug;

pub(crate) fn apply(
    hierarchies: &mut [EntityHierarchy],
    overrides: &[OverrideTuple],
) -> Result<(), CategorizationError> {
    for tuple in overrides {
        let element = &tuple.element;
        let target = element
            .class
            .as_deref()
            .or(element.name.as_deref())
            .ok_or_else(|| CategorizationError::UnknownOverrideClass {
                class: "<unnamed>".to_string(),
            })?;

        let Some(metadata) = hierarchies.iter_mut().find_map(|h| h.type_mut(target)) else {
            return Err(CategorizationError::UnknownOverrideClass {
                class: target.to_string(),
            });
        };

        debug!(class = target, "applying deferred XML override");

        if let Some(table) = &element.table {
            let explicit = metadata.table.get_or_insert_with(Default::default);
            if table.name.is_some() {
                explicit.name = table.name.clone();
            }
            if table.catalog.is_some() {
                explicit.catalog = table.catalog.clone();
            }
            if table.schema.is_some() {
                explicit.schema = table.schema.clone();
            }
        }

        if let Some(enabled) = element.cacheable {
            match &mut metadata.caching {
                Some(caching) => caching.enabled = enabled,
                None => {
                    metadata.caching = Some(Caching {
                        enabled,
                        region: Some(metadata.entity_name.clone()),
                        usage: None,
                    });
                }
            }
        }

        for attribute_element in &element.attributes {
            let Some(attribute) = metadata.attribute_mut(&attribute_element.name) else {
                return Err(CategorizationError::UnknownOverrideAttribute {
                    class: target.to_string(),
                    attribute: attribute_element.name.clone(),
                });
            };

            apply_attribute_element(&mut attribute.member, attribute_element);
            attribute.refresh_nature();
            if let Some(access) = attribute_element.access {
                attribute.access = Some(access);
            }
        }
    }

    Ok(())
}
