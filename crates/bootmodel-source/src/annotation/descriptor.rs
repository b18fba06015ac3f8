//! Static descriptors for every annotation kind the pipeline understands.
//!
//! A descriptor declares which attributes an annotation kind carries and
//! which of those have declared defaults. Attribute lookup against a usage
//! distinguishes "declared but unset" from "never declared" through these
//! tables.

use crate::annotation::value::DefaultValue;
use serde::{Serialize, Serializer};

///
/// AnnotationDescriptor
///

#[derive(Debug)]
pub struct AnnotationDescriptor {
    pub name: &'static str,
    pub repeatable: bool,
    pub attributes: &'static [AttributeSpec],
}

impl AnnotationDescriptor {
    #[must_use]
    pub fn attribute_spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.name == name)
    }

    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.attribute_spec(name).is_some()
    }
}

impl PartialEq for AnnotationDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AnnotationDescriptor {}

impl Serialize for AnnotationDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

///
/// AttributeSpec
///

#[derive(Debug)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub default: Option<DefaultValue>,
}

const fn attr(name: &'static str, default: DefaultValue) -> AttributeSpec {
    AttributeSpec {
        name,
        default: Some(default),
    }
}

const fn required(name: &'static str) -> AttributeSpec {
    AttributeSpec {
        name,
        default: None,
    }
}

const fn simple(name: &'static str) -> AnnotationDescriptor {
    AnnotationDescriptor {
        name,
        repeatable: false,
        attributes: &[],
    }
}

// Managed-type markers.
pub static ENTITY: AnnotationDescriptor = AnnotationDescriptor {
    name: "Entity",
    repeatable: false,
    attributes: &[attr("name", DefaultValue::Str(""))],
};
pub static MAPPED_SUPERCLASS: AnnotationDescriptor = simple("MappedSuperclass");
pub static EMBEDDABLE: AnnotationDescriptor = simple("Embeddable");

// Identifier, version, tenancy.
pub static ID: AnnotationDescriptor = simple("Id");
pub static EMBEDDED_ID: AnnotationDescriptor = simple("EmbeddedId");
pub static ID_CLASS: AnnotationDescriptor = AnnotationDescriptor {
    name: "IdClass",
    repeatable: false,
    attributes: &[required("value")],
};
pub static VERSION: AnnotationDescriptor = simple("Version");
pub static TENANT_ID: AnnotationDescriptor = simple("TenantId");

// Attribute natures.
pub static BASIC: AnnotationDescriptor = AnnotationDescriptor {
    name: "Basic",
    repeatable: false,
    attributes: &[
        attr("optional", DefaultValue::Bool(true)),
        attr("fetch", DefaultValue::Enum("EAGER")),
    ],
};
pub static EMBEDDED: AnnotationDescriptor = simple("Embedded");
pub static TRANSIENT: AnnotationDescriptor = simple("Transient");
pub static ANY: AnnotationDescriptor = simple("Any");
pub static MANY_TO_ONE: AnnotationDescriptor = AnnotationDescriptor {
    name: "ManyToOne",
    repeatable: false,
    attributes: &[
        required("target_entity"),
        attr("optional", DefaultValue::Bool(true)),
        attr("fetch", DefaultValue::Enum("EAGER")),
    ],
};
pub static ONE_TO_ONE: AnnotationDescriptor = AnnotationDescriptor {
    name: "OneToOne",
    repeatable: false,
    attributes: &[
        required("target_entity"),
        attr("mapped_by", DefaultValue::Str("")),
        attr("optional", DefaultValue::Bool(true)),
        attr("fetch", DefaultValue::Enum("EAGER")),
    ],
};
pub static ONE_TO_MANY: AnnotationDescriptor = AnnotationDescriptor {
    name: "OneToMany",
    repeatable: false,
    attributes: &[
        required("target_entity"),
        attr("mapped_by", DefaultValue::Str("")),
        attr("fetch", DefaultValue::Enum("LAZY")),
    ],
};
pub static MANY_TO_MANY: AnnotationDescriptor = AnnotationDescriptor {
    name: "ManyToMany",
    repeatable: false,
    attributes: &[
        required("target_entity"),
        attr("mapped_by", DefaultValue::Str("")),
        attr("fetch", DefaultValue::Enum("LAZY")),
    ],
};
pub static ELEMENT_COLLECTION: AnnotationDescriptor = AnnotationDescriptor {
    name: "ElementCollection",
    repeatable: false,
    attributes: &[attr("fetch", DefaultValue::Enum("LAZY"))],
};

// Physical mapping.
pub static COLUMN: AnnotationDescriptor = AnnotationDescriptor {
    name: "Column",
    repeatable: false,
    attributes: &[
        attr("name", DefaultValue::Str("")),
        attr("nullable", DefaultValue::Bool(true)),
        attr("unique", DefaultValue::Bool(false)),
        attr("length", DefaultValue::Int(255)),
        attr("table", DefaultValue::Str("")),
    ],
};
pub static TABLE: AnnotationDescriptor = AnnotationDescriptor {
    name: "Table",
    repeatable: false,
    attributes: &[
        attr("name", DefaultValue::Str("")),
        attr("catalog", DefaultValue::Str("")),
        attr("schema", DefaultValue::Str("")),
    ],
};
pub static SECONDARY_TABLE: AnnotationDescriptor = AnnotationDescriptor {
    name: "SecondaryTable",
    repeatable: true,
    attributes: &[
        required("name"),
        attr("catalog", DefaultValue::Str("")),
        attr("schema", DefaultValue::Str("")),
    ],
};
pub static INHERITANCE: AnnotationDescriptor = AnnotationDescriptor {
    name: "Inheritance",
    repeatable: false,
    attributes: &[attr("strategy", DefaultValue::Enum("SINGLE_TABLE"))],
};
pub static DISCRIMINATOR_COLUMN: AnnotationDescriptor = AnnotationDescriptor {
    name: "DiscriminatorColumn",
    repeatable: false,
    attributes: &[
        attr("name", DefaultValue::Str("DTYPE")),
        attr("discriminator_type", DefaultValue::Enum("STRING")),
        attr("length", DefaultValue::Int(31)),
    ],
};

// Caching.
pub static CACHEABLE: AnnotationDescriptor = AnnotationDescriptor {
    name: "Cacheable",
    repeatable: false,
    attributes: &[attr("value", DefaultValue::Bool(true))],
};
pub static CACHE: AnnotationDescriptor = AnnotationDescriptor {
    name: "Cache",
    repeatable: false,
    attributes: &[
        attr("region", DefaultValue::Str("")),
        attr("usage", DefaultValue::Enum("READ_WRITE")),
    ],
};

// Access and lifecycle.
pub static ACCESS: AnnotationDescriptor = AnnotationDescriptor {
    name: "Access",
    repeatable: false,
    attributes: &[required("value")],
};
pub static ENTITY_LISTENERS: AnnotationDescriptor = AnnotationDescriptor {
    name: "EntityListeners",
    repeatable: false,
    attributes: &[attr("value", DefaultValue::EmptyList)],
};
pub static PRE_PERSIST: AnnotationDescriptor = simple("PrePersist");
pub static POST_PERSIST: AnnotationDescriptor = simple("PostPersist");
pub static PRE_UPDATE: AnnotationDescriptor = simple("PreUpdate");
pub static POST_UPDATE: AnnotationDescriptor = simple("PostUpdate");
pub static PRE_REMOVE: AnnotationDescriptor = simple("PreRemove");
pub static POST_REMOVE: AnnotationDescriptor = simple("PostRemove");
pub static POST_LOAD: AnnotationDescriptor = simple("PostLoad");

// Global registrations.
pub static CONVERTER: AnnotationDescriptor = AnnotationDescriptor {
    name: "Converter",
    repeatable: false,
    attributes: &[
        required("value"),
        attr("auto_apply", DefaultValue::Bool(false)),
    ],
};
pub static JAVA_TYPE_REGISTRATION: AnnotationDescriptor = AnnotationDescriptor {
    name: "JavaTypeRegistration",
    repeatable: true,
    attributes: &[required("java_type"), required("descriptor")],
};
pub static JDBC_TYPE_REGISTRATION: AnnotationDescriptor = AnnotationDescriptor {
    name: "JdbcTypeRegistration",
    repeatable: true,
    attributes: &[attr("register_under", DefaultValue::Int(0)), required("descriptor")],
};
pub static TYPE_REGISTRATION: AnnotationDescriptor = AnnotationDescriptor {
    name: "TypeRegistration",
    repeatable: true,
    attributes: &[required("basic_class"), required("user_type")],
};
pub static FILTER_DEF: AnnotationDescriptor = AnnotationDescriptor {
    name: "FilterDef",
    repeatable: true,
    attributes: &[
        required("name"),
        attr("default_condition", DefaultValue::Str("")),
        attr("parameters", DefaultValue::EmptyList),
    ],
};
pub static PARAM_DEF: AnnotationDescriptor = AnnotationDescriptor {
    name: "ParamDef",
    repeatable: false,
    attributes: &[required("name"), required("type")],
};
pub static NAMED_QUERY: AnnotationDescriptor = AnnotationDescriptor {
    name: "NamedQuery",
    repeatable: true,
    attributes: &[required("name"), required("query")],
};
