//! JPA lifecycle callback collection.

use crate::{
    categorize::{CallbackBinding, CallbackSource, CategorizationError, hierarchy::Snapshot},
    types::CallbackKind,
};
use bootmodel_source::prelude::*;

/// Collect callbacks along a super-type chain, root-most type first. For
/// each type, listener-class callbacks precede the type's own callback
/// methods. A callback kind already contributed by the same class (through
/// inheritance) is not re-added.
pub(crate) fn collect(
    chain: &[&ClassDetails],
    snapshot: &Snapshot,
) -> Result<Vec<CallbackBinding>, CategorizationError> {
    let mut bindings: Vec<CallbackBinding> = Vec::new();

    for details in chain {
        if let Some(listeners) = details.annotation(&descriptor::ENTITY_LISTENERS) {
            for listener in listeners.class_list("value")? {
                let listener_details =
                    snapshot
                        .get(&listener)
                        .ok_or_else(|| SourceError::UnknownClass {
                            name: listener.as_str().to_string(),
                        })?;

                append_methods(
                    &mut bindings,
                    listener_details,
                    CallbackSource::Listener(listener.clone()),
                );
            }
        }

        append_methods(
            &mut bindings,
            details,
            CallbackSource::Declared(details.name().clone()),
        );
    }

    Ok(bindings)
}

fn append_methods(
    bindings: &mut Vec<CallbackBinding>,
    details: &ClassDetails,
    source: CallbackSource,
) {
    for member in details.members() {
        for kind in CallbackKind::ALL {
            if !member.has_annotation(kind.marker()) {
                continue;
            }

            let binding = CallbackBinding {
                kind,
                source: source.clone(),
                method: member.name().to_string(),
            };
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }
    }
}
