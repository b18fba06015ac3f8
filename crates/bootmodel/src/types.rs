use bootmodel_source::prelude::{AnnotationDescriptor, descriptor};
use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// AccessType
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, PartialEq, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    Field,
    Property,
}

///
/// CascadeType
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[remain::sorted]
pub enum CascadeType {
    All,
    Detach,
    Merge,
    Persist,
    Refresh,
    Remove,
}

///
/// InheritanceKind
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InheritanceKind {
    #[default]
    SingleTable,
    Joined,
    TablePerClass,
}

impl InheritanceKind {
    /// Symbolic constant form, as carried by annotation attribute values.
    #[must_use]
    pub const fn as_constant(self) -> &'static str {
        match self {
            Self::SingleTable => "SINGLE_TABLE",
            Self::Joined => "JOINED",
            Self::TablePerClass => "TABLE_PER_CLASS",
        }
    }
}

impl std::str::FromStr for InheritanceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SINGLE_TABLE" => Ok(Self::SingleTable),
            "JOINED" => Ok(Self::Joined),
            "TABLE_PER_CLASS" => Ok(Self::TablePerClass),
            _ => Err(()),
        }
    }
}

///
/// CallbackKind
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackKind {
    PrePersist,
    PostPersist,
    PreUpdate,
    PostUpdate,
    PreRemove,
    PostRemove,
    PostLoad,
}

impl CallbackKind {
    /// Canonical scan order for callback collection.
    pub const ALL: [Self; 7] = [
        Self::PrePersist,
        Self::PostPersist,
        Self::PreUpdate,
        Self::PostUpdate,
        Self::PreRemove,
        Self::PostRemove,
        Self::PostLoad,
    ];

    /// The marker annotation identifying this callback kind.
    #[must_use]
    pub const fn marker(self) -> &'static AnnotationDescriptor {
        match self {
            Self::PrePersist => &descriptor::PRE_PERSIST,
            Self::PostPersist => &descriptor::POST_PERSIST,
            Self::PreUpdate => &descriptor::PRE_UPDATE,
            Self::PostUpdate => &descriptor::POST_UPDATE,
            Self::PreRemove => &descriptor::PRE_REMOVE,
            Self::PostRemove => &descriptor::POST_REMOVE,
            Self::PostLoad => &descriptor::POST_LOAD,
        }
    }
}

impl std::str::FromStr for CallbackKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRE_PERSIST" => Ok(Self::PrePersist),
            "POST_PERSIST" => Ok(Self::PostPersist),
            "PRE_UPDATE" => Ok(Self::PreUpdate),
            "POST_UPDATE" => Ok(Self::PostUpdate),
            "PRE_REMOVE" => Ok(Self::PreRemove),
            "POST_REMOVE" => Ok(Self::PostRemove),
            "POST_LOAD" => Ok(Self::PostLoad),
            _ => Err(()),
        }
    }
}

///
/// AttributeNature
///
/// Tagged classification of a persistent attribute, not a class hierarchy.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeNature {
    Any,
    #[default]
    Basic,
    ElementCollection,
    Embedded,
    ToMany,
    ToOne,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inheritance_constants_round_trip() {
        for kind in [
            InheritanceKind::SingleTable,
            InheritanceKind::Joined,
            InheritanceKind::TablePerClass,
        ] {
            assert_eq!(kind.as_constant().parse::<InheritanceKind>(), Ok(kind));
        }
    }

    #[test]
    fn callback_kinds_map_to_distinct_markers() {
        let names: std::collections::BTreeSet<_> =
            CallbackKind::ALL.iter().map(|k| k.marker().name).collect();

        assert_eq!(names.len(), CallbackKind::ALL.len());
    }
}
