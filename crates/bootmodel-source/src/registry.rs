use crate::{
    annotation::{AnnotationList, AnnotationUsage},
    class::{ClassDetails, ClassName, ClassOrigin, MemberDetails, MemberKind},
    error::SourceError,
};
use std::collections::BTreeMap;

///
/// RawClass
///
/// Uninterpreted payload a backing source hands to the registry. The
/// registry turns it into a `ClassDetails` tagged with the source's origin.
///

#[derive(Clone, Debug, Default)]
pub struct RawClass {
    pub is_abstract: bool,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub members: Vec<RawMember>,
    pub annotations: Vec<AnnotationUsage>,
}

///
/// RawMember
///

#[derive(Clone, Debug)]
pub struct RawMember {
    pub name: String,
    pub declared_type: Option<String>,
    pub kind: MemberKind,
    pub persistable: bool,
    pub annotations: Vec<AnnotationUsage>,
}

impl RawMember {
    #[must_use]
    pub fn field(name: impl Into<String>, declared_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.map(ToString::to_string),
            kind: MemberKind::Field,
            persistable: true,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_annotation(mut self, usage: AnnotationUsage) -> Self {
        self.annotations.push(usage);
        self
    }
}

///
/// ClassDetailsSource
///
/// The narrow access contract a backing format implements: resolve a name
/// to a raw class, or report that it cannot. The reflective and indexed
/// backends differ only in where the payload comes from.
///

pub trait ClassDetailsSource {
    fn origin(&self) -> ClassOrigin;

    fn lookup(&self, name: &str) -> Option<RawClass>;
}

///
/// StaticClassSource
///
/// An in-memory source over pre-materialized raw classes. The embedding
/// bootstrap fills one of these from loaded classes or from a bytecode
/// annotation index; tests fill them directly.
///

pub struct StaticClassSource {
    origin: ClassOrigin,
    classes: BTreeMap<String, RawClass>,
}

impl StaticClassSource {
    #[must_use]
    pub const fn new(origin: ClassOrigin) -> Self {
        Self {
            origin,
            classes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_class(mut self, name: impl Into<String>, raw: RawClass) -> Self {
        self.classes.insert(name.into(), raw);
        self
    }
}

impl ClassDetailsSource for StaticClassSource {
    fn origin(&self) -> ClassOrigin {
        self.origin
    }

    fn lookup(&self, name: &str) -> Option<RawClass> {
        self.classes.get(name).cloned()
    }
}

///
/// ClassDetailsRegistry
///
/// At most one `ClassDetails` per distinct name within one building context,
/// so name equality doubles as identity for graph walks. Resolution is lazy:
/// a name that is not yet registered is pulled from the source chain on
/// demand, which lets forward references (XML naming a not-yet-seen
/// super-type) resolve without a second construction pass.
///

pub struct ClassDetailsRegistry {
    classes: BTreeMap<ClassName, ClassDetails>,
    sources: Vec<Box<dyn ClassDetailsSource>>,
}

impl ClassDetailsRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            classes: BTreeMap::new(),
            sources: Vec::new(),
        }
    }

    pub fn add_source(&mut self, source: impl ClassDetailsSource + 'static) {
        self.sources.push(Box::new(source));
    }

    #[must_use]
    pub fn with_source(mut self, source: impl ClassDetailsSource + 'static) -> Self {
        self.add_source(source);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(&ClassName::new(name))
    }

    #[must_use]
    pub fn try_get(&self, name: &str) -> Option<&ClassDetails> {
        self.classes.get(&ClassName::new(name))
    }

    /// Resolve a name, constructing the details from the first source that
    /// knows it if it is not registered yet.
    pub fn resolve(&mut self, name: &str) -> Result<&ClassDetails, SourceError> {
        let key = ClassName::new(name);

        if !self.classes.contains_key(&key) {
            let details = self.construct(name)?;
            self.classes.insert(key.clone(), details);
        }

        self.classes
            .get(&key)
            .ok_or_else(|| SourceError::UnknownClass {
                name: name.to_string(),
            })
    }

    /// Mutable access for the XML merge phase. Resolves lazily like
    /// [`Self::resolve`].
    pub fn resolve_mut(&mut self, name: &str) -> Result<&mut ClassDetails, SourceError> {
        let key = ClassName::new(name);

        if !self.classes.contains_key(&key) {
            let details = self.construct(name)?;
            self.classes.insert(key.clone(), details);
        }

        self.classes
            .get_mut(&key)
            .ok_or_else(|| SourceError::UnknownClass {
                name: name.to_string(),
            })
    }

    /// Create (or return) an XML-only class with no backing compiled class.
    pub fn synthesize_dynamic(
        &mut self,
        name: &str,
        super_class: Option<ClassName>,
    ) -> &mut ClassDetails {
        let key = ClassName::new(name);

        self.classes.entry(key.clone()).or_insert_with(|| {
            ClassDetails::new(
                key,
                None,
                ClassOrigin::Dynamic,
                false,
                super_class,
                Vec::new(),
                Vec::new(),
                AnnotationList::default(),
            )
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDetails> {
        self.classes.values()
    }

    fn construct(&self, name: &str) -> Result<ClassDetails, SourceError> {
        for source in &self.sources {
            let Some(raw) = source.lookup(name) else {
                continue;
            };

            let members = raw
                .members
                .into_iter()
                .map(|m| {
                    MemberDetails::new(
                        m.name,
                        m.declared_type.map(ClassName::new),
                        m.kind,
                        m.persistable,
                        AnnotationList::new(m.annotations),
                    )
                })
                .collect();

            return Ok(ClassDetails::new(
                ClassName::new(name),
                Some(name.to_string()),
                source.origin(),
                raw.is_abstract,
                raw.super_class.map(ClassName::new),
                raw.interfaces.into_iter().map(ClassName::new).collect(),
                members,
                AnnotationList::new(raw.annotations),
            ));
        }

        Err(SourceError::UnknownClass {
            name: name.to_string(),
        })
    }
}

impl Default for ClassDetailsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::descriptor::ENTITY;

    fn registry() -> ClassDetailsRegistry {
        let source = StaticClassSource::new(ClassOrigin::Indexed)
            .with_class(
                "org.example.Child",
                RawClass {
                    super_class: Some("org.example.Parent".to_string()),
                    annotations: vec![AnnotationUsage::new(&ENTITY)],
                    ..RawClass::default()
                },
            )
            .with_class(
                "org.example.Parent",
                RawClass {
                    annotations: vec![AnnotationUsage::new(&ENTITY)],
                    ..RawClass::default()
                },
            );

        ClassDetailsRegistry::new().with_source(source)
    }

    #[test]
    fn forward_super_type_reference_resolves_on_demand() {
        let mut registry = registry();

        let super_name = registry
            .resolve("org.example.Child")
            .unwrap()
            .super_class()
            .cloned()
            .unwrap();
        assert!(!registry.contains(super_name.as_str()));

        let parent = registry.resolve(super_name.as_str()).unwrap();
        assert!(parent.has_annotation(&ENTITY));
    }

    #[test]
    fn at_most_one_details_per_name() {
        let mut registry = registry();

        registry.resolve("org.example.Parent").unwrap();
        registry.resolve("org.example.Parent").unwrap();

        assert_eq!(registry.classes().count(), 1);
    }

    #[test]
    fn unknown_name_fails_with_unknown_class() {
        let mut registry = registry();
        let err = registry.resolve("org.example.Ghost").unwrap_err();

        assert!(matches!(err, SourceError::UnknownClass { .. }));
    }

    #[test]
    fn synthesize_dynamic_is_idempotent_per_name() {
        let mut registry = ClassDetailsRegistry::new();
        registry.synthesize_dynamic("Order", None);
        registry.synthesize_dynamic("Order", None);

        assert_eq!(registry.classes().count(), 1);
        assert!(registry.try_get("Order").unwrap().is_dynamic());
    }
}
