use crate::{
    annotation::{AnnotationList, AnnotationUsage, descriptor::AnnotationDescriptor},
    prelude::Serialize,
};
use derive_more::Display;

///
/// ClassName
///
/// Identity key for a class within one building context: the qualified name
/// of a compiled class, or the logical entity name of a dynamic model.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ClassName(String);

impl ClassName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The unqualified trailing segment, used as the default entity name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

///
/// ClassOrigin
///
/// Which backing produced a `ClassDetails`. All origins expose the same read
/// contract; `Dynamic` additionally implies there is no compiled class.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum ClassOrigin {
    Reflective,
    Indexed,
    Dynamic,
}

///
/// ClassDetails
///

#[derive(Clone, Debug, Serialize)]
pub struct ClassDetails {
    name: ClassName,

    #[serde(skip_serializing_if = "Option::is_none")]
    class_name: Option<String>,

    origin: ClassOrigin,
    is_abstract: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    super_class: Option<ClassName>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    interfaces: Vec<ClassName>,

    members: Vec<MemberDetails>,
    annotations: AnnotationList,
}

impl ClassDetails {
    #[must_use]
    pub fn new(
        name: ClassName,
        class_name: Option<String>,
        origin: ClassOrigin,
        is_abstract: bool,
        super_class: Option<ClassName>,
        interfaces: Vec<ClassName>,
        members: Vec<MemberDetails>,
        annotations: AnnotationList,
    ) -> Self {
        Self {
            name,
            class_name,
            origin,
            is_abstract,
            super_class,
            interfaces,
            members,
            annotations,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &ClassName {
        &self.name
    }

    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    #[must_use]
    pub const fn origin(&self) -> ClassOrigin {
        self.origin
    }

    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self.origin, ClassOrigin::Dynamic)
    }

    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Name-keyed weak back-reference; resolve it through the registry.
    #[must_use]
    pub const fn super_class(&self) -> Option<&ClassName> {
        self.super_class.as_ref()
    }

    #[must_use]
    pub fn interfaces(&self) -> &[ClassName] {
        &self.interfaces
    }

    #[must_use]
    pub fn members(&self) -> &[MemberDetails] {
        &self.members
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberDetails> {
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut MemberDetails> {
        self.members.iter_mut().find(|m| m.name() == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &MemberDetails> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind(), MemberKind::Field))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MemberDetails> {
        self.members
            .iter()
            .filter(|m| !matches!(m.kind(), MemberKind::Field))
    }

    #[must_use]
    pub const fn annotations(&self) -> &AnnotationList {
        &self.annotations
    }

    #[must_use]
    pub fn annotation(&self, kind: &AnnotationDescriptor) -> Option<&AnnotationUsage> {
        self.annotations.get(kind)
    }

    #[must_use]
    pub fn has_annotation(&self, kind: &AnnotationDescriptor) -> bool {
        self.annotations.has(kind)
    }

    pub fn repeated_annotations<'a>(
        &'a self,
        kind: &'a AnnotationDescriptor,
    ) -> impl Iterator<Item = &'a AnnotationUsage> {
        self.annotations.get_repeated(kind)
    }

    // Mutation below is reserved for the XML merge phase; the categorized
    // model never writes back.

    pub fn apply_annotation(&mut self, usage: AnnotationUsage) {
        self.annotations.attach(usage);
    }

    pub fn remove_annotation(&mut self, kind: &AnnotationDescriptor) {
        self.annotations.remove(kind);
    }

    pub fn add_member(&mut self, member: MemberDetails) {
        self.members.push(member);
    }

    pub fn retain_members(&mut self, keep: impl Fn(&MemberDetails) -> bool) {
        self.members.retain(|m| keep(m));
    }
}

///
/// MemberKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum MemberKind {
    Field,
    Getter,
    Setter,
}

///
/// MemberDetails
///
/// A field or accessor on a class. Two members are the same attribute across
/// XML and annotation sources when they share owning class and name.
///

#[derive(Clone, Debug, Serialize)]
pub struct MemberDetails {
    name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    declared_type: Option<ClassName>,

    kind: MemberKind,
    persistable: bool,
    annotations: AnnotationList,
}

impl MemberDetails {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        declared_type: Option<ClassName>,
        kind: MemberKind,
        persistable: bool,
        annotations: AnnotationList,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            kind,
            persistable,
            annotations,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn declared_type(&self) -> Option<&ClassName> {
        self.declared_type.as_ref()
    }

    #[must_use]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        self.persistable
    }

    #[must_use]
    pub const fn annotations(&self) -> &AnnotationList {
        &self.annotations
    }

    #[must_use]
    pub fn annotation(&self, kind: &AnnotationDescriptor) -> Option<&AnnotationUsage> {
        self.annotations.get(kind)
    }

    #[must_use]
    pub fn has_annotation(&self, kind: &AnnotationDescriptor) -> bool {
        self.annotations.has(kind)
    }

    pub fn apply_annotation(&mut self, usage: AnnotationUsage) {
        self.annotations.attach(usage);
    }

    pub fn clear_annotations(&mut self) {
        self.annotations = AnnotationList::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::descriptor::{ENTITY, ID};

    fn person() -> ClassDetails {
        let mut annotations = AnnotationList::default();
        annotations.attach(AnnotationUsage::new(&ENTITY));

        let mut id_annotations = AnnotationList::default();
        id_annotations.attach(AnnotationUsage::new(&ID));

        ClassDetails::new(
            ClassName::new("org.example.Person"),
            Some("org.example.Person".to_string()),
            ClassOrigin::Reflective,
            false,
            None,
            Vec::new(),
            vec![
                MemberDetails::new(
                    "id",
                    Some(ClassName::new("java.lang.Long")),
                    MemberKind::Field,
                    true,
                    id_annotations,
                ),
                MemberDetails::new("name", None, MemberKind::Field, true, AnnotationList::default()),
            ],
            annotations,
        )
    }

    #[test]
    fn simple_name_strips_package_qualifier() {
        assert_eq!(person().name().simple_name(), "Person");
    }

    #[test]
    fn member_lookup_by_name() {
        let class = person();

        assert!(class.member("id").unwrap().has_annotation(&ID));
        assert!(class.member("missing").is_none());
    }

    #[test]
    fn serializes_annotations_as_descriptor_names() {
        let json = serde_json::to_value(person()).unwrap();

        assert_eq!(json["name"], "org.example.Person");
        assert_eq!(json["members"][0]["annotations"][0]["descriptor"], "Id");
    }

    #[test]
    fn dynamic_origin_has_no_class_name() {
        let class = ClassDetails::new(
            ClassName::new("Order"),
            None,
            ClassOrigin::Dynamic,
            false,
            None,
            Vec::new(),
            Vec::new(),
            AnnotationList::default(),
        );

        assert!(class.is_dynamic());
        assert!(class.class_name().is_none());
    }
}
