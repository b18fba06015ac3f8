use crate::{annotation::AnnotationUsage, class::ClassName, prelude::Serialize};

///
/// AnnotationValue
///
/// Typed attribute value carried by an annotation usage. The shape set is
/// closed: primitives, symbolic enum constants, class references (name-keyed,
/// resolved through the registry), nested usages and lists.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Enum(String),
    Class(ClassName),
    Nested(Box<AnnotationUsage>),
    List(Vec<AnnotationValue>),
}

impl AnnotationValue {
    /// Shape label used in coercion error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Enum(_) => "enum constant",
            Self::Class(_) => "class reference",
            Self::Nested(_) => "nested annotation",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub fn nested(usage: AnnotationUsage) -> Self {
        Self::Nested(Box::new(usage))
    }
}

impl From<bool> for AnnotationValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AnnotationValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for AnnotationValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ClassName> for AnnotationValue {
    fn from(v: ClassName) -> Self {
        Self::Class(v)
    }
}

///
/// DefaultValue
///
/// Const-constructible declared default for an annotation attribute, kept
/// separate from `AnnotationValue` so descriptor tables can live in statics.
///

#[derive(Clone, Copy, Debug)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Str(&'static str),
    Enum(&'static str),
    EmptyList,
}

impl DefaultValue {
    #[must_use]
    pub fn to_value(self) -> AnnotationValue {
        match self {
            Self::Bool(v) => AnnotationValue::Bool(v),
            Self::Int(v) => AnnotationValue::Int(v),
            Self::Str(v) => AnnotationValue::Str(v.to_string()),
            Self::Enum(v) => AnnotationValue::Enum(v.to_string()),
            Self::EmptyList => AnnotationValue::List(Vec::new()),
        }
    }
}
