pub mod descriptor;
pub mod value;

use crate::{
    annotation::{
        descriptor::AnnotationDescriptor,
        value::AnnotationValue,
    },
    class::ClassName,
    error::SourceError,
    prelude::Serialize,
};
use std::{collections::BTreeMap, str::FromStr};

///
/// AnnotationUsage
///
/// One use of an annotation kind: the descriptor plus the attribute values
/// the source actually set. Unset attributes fall back to the descriptor's
/// declared default; a name the descriptor never declared is an error.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotationUsage {
    descriptor: &'static AnnotationDescriptor,
    values: BTreeMap<String, AnnotationValue>,
}

impl AnnotationUsage {
    #[must_use]
    pub const fn new(descriptor: &'static AnnotationDescriptor) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style attribute assignment. The attribute name must be
    /// declared by the descriptor; violating that is a caller bug.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<AnnotationValue>) -> Self {
        assert!(
            self.descriptor.declares(name),
            "annotation '{}' declares no attribute '{name}'",
            self.descriptor.name,
        );
        self.values.insert(name.to_string(), value.into());

        self
    }

    #[must_use]
    pub const fn descriptor(&self) -> &'static AnnotationDescriptor {
        self.descriptor
    }

    #[must_use]
    pub fn is(&self, kind: &AnnotationDescriptor) -> bool {
        self.descriptor == kind
    }

    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set value, else declared default, else `None`. Fails only when the
    /// name itself is not declared by the annotation kind.
    pub fn attribute(&self, name: &str) -> Result<Option<AnnotationValue>, SourceError> {
        let Some(spec) = self.descriptor.attribute_spec(name) else {
            return Err(SourceError::UnknownAttribute {
                annotation: self.descriptor.name,
                attribute: name.to_string(),
            });
        };

        if let Some(value) = self.values.get(name) {
            return Ok(Some(value.clone()));
        }

        Ok(spec.default.map(value::DefaultValue::to_value))
    }

    /// Like [`Self::attribute`] but a missing value is an error.
    pub fn require(&self, name: &str) -> Result<AnnotationValue, SourceError> {
        self.attribute(name)?
            .ok_or_else(|| SourceError::UnsetAttribute {
                annotation: self.descriptor.name,
                attribute: name.to_string(),
            })
    }

    pub fn bool_attribute(&self, name: &str) -> Result<Option<bool>, SourceError> {
        match self.attribute(name)? {
            None => Ok(None),
            Some(AnnotationValue::Bool(v)) => Ok(Some(v)),
            Some(other) => Err(self.type_error(name, "bool", &other)),
        }
    }

    pub fn int_attribute(&self, name: &str) -> Result<Option<i64>, SourceError> {
        match self.attribute(name)? {
            None => Ok(None),
            Some(AnnotationValue::Int(v)) => Ok(Some(v)),
            Some(other) => Err(self.type_error(name, "int", &other)),
        }
    }

    pub fn string_attribute(&self, name: &str) -> Result<Option<String>, SourceError> {
        match self.attribute(name)? {
            None => Ok(None),
            Some(AnnotationValue::Str(v)) => Ok(Some(v)),
            Some(other) => Err(self.type_error(name, "string", &other)),
        }
    }

    /// String attribute where the declared default is the empty string,
    /// meaning "not specified".
    pub fn non_empty_string(&self, name: &str) -> Result<Option<String>, SourceError> {
        Ok(self.string_attribute(name)?.filter(|v| !v.is_empty()))
    }

    pub fn class_attribute(&self, name: &str) -> Result<Option<ClassName>, SourceError> {
        match self.attribute(name)? {
            None => Ok(None),
            Some(AnnotationValue::Class(v)) => Ok(Some(v)),
            Some(other) => Err(self.type_error(name, "class reference", &other)),
        }
    }

    /// Parse a symbolic enum constant into a typed enum. Plain strings are
    /// accepted as well, since XML sources carry constants as text.
    pub fn enum_attribute<E: FromStr>(&self, name: &str) -> Result<Option<E>, SourceError> {
        let text = match self.attribute(name)? {
            None => return Ok(None),
            Some(AnnotationValue::Enum(v) | AnnotationValue::Str(v)) => v,
            Some(other) => return Err(self.type_error(name, "enum constant", &other)),
        };

        E::from_str(&text)
            .map(Some)
            .map_err(|_| SourceError::EnumParse {
                annotation: self.descriptor.name,
                attribute: name.to_string(),
                value: text,
            })
    }

    /// A list-valued attribute whose elements are nested annotation usages.
    pub fn nested_list(&self, name: &str) -> Result<Vec<AnnotationUsage>, SourceError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(Vec::new());
        };
        let AnnotationValue::List(items) = value else {
            return Err(self.type_error(name, "list", &value));
        };

        items
            .into_iter()
            .map(|item| match item {
                AnnotationValue::Nested(usage) => Ok(*usage),
                other => Err(self.type_error(name, "nested annotation", &other)),
            })
            .collect()
    }

    /// A list-valued attribute whose elements are class references.
    pub fn class_list(&self, name: &str) -> Result<Vec<ClassName>, SourceError> {
        let Some(value) = self.attribute(name)? else {
            return Ok(Vec::new());
        };
        let AnnotationValue::List(items) = value else {
            return Err(self.type_error(name, "list", &value));
        };

        items
            .into_iter()
            .map(|item| match item {
                AnnotationValue::Class(class) => Ok(class),
                other => Err(self.type_error(name, "class reference", &other)),
            })
            .collect()
    }

    fn type_error(
        &self,
        attribute: &str,
        expected: &'static str,
        actual: &AnnotationValue,
    ) -> SourceError {
        SourceError::AttributeType {
            annotation: self.descriptor.name,
            attribute: attribute.to_string(),
            expected,
            actual: actual.kind(),
        }
    }
}

///
/// AnnotationList
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnnotationList(Vec<AnnotationUsage>);

impl AnnotationList {
    #[must_use]
    pub fn new(usages: Vec<AnnotationUsage>) -> Self {
        Self(usages)
    }

    #[must_use]
    pub fn get(&self, kind: &AnnotationDescriptor) -> Option<&AnnotationUsage> {
        self.0.iter().find(|usage| usage.is(kind))
    }

    pub fn get_repeated<'a>(
        &'a self,
        kind: &'a AnnotationDescriptor,
    ) -> impl Iterator<Item = &'a AnnotationUsage> {
        self.0.iter().filter(move |usage| usage.is(kind))
    }

    #[must_use]
    pub fn has(&self, kind: &AnnotationDescriptor) -> bool {
        self.get(kind).is_some()
    }

    /// Attach a usage. Non-repeatable kinds replace an existing usage of the
    /// same kind in place; repeatable kinds append.
    pub fn attach(&mut self, usage: AnnotationUsage) {
        if !usage.descriptor().repeatable
            && let Some(existing) = self.0.iter_mut().find(|u| u.is(usage.descriptor()))
        {
            *existing = usage;
            return;
        }

        self.0.push(usage);
    }

    /// Drop every usage of the given kind.
    pub fn remove(&mut self, kind: &AnnotationDescriptor) {
        self.0.retain(|usage| !usage.is(kind));
    }

    /// Drop every usage whose kind matches the predicate.
    pub fn retain(&mut self, keep: impl Fn(&AnnotationUsage) -> bool) {
        self.0.retain(|usage| keep(usage));
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationUsage> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a AnnotationList {
    type Item = &'a AnnotationUsage;
    type IntoIter = std::slice::Iter<'a, AnnotationUsage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
