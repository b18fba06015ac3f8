use thiserror::Error as ThisError;

///
/// SourceError
///
/// Failures raised by the source model itself: attribute access against an
/// annotation kind that never declared the attribute, coercion to the wrong
/// value shape, and class names no backing source can resolve.
///

#[derive(Debug, ThisError)]
pub enum SourceError {
    #[error("annotation '{annotation}' declares no attribute '{attribute}'")]
    UnknownAttribute {
        annotation: &'static str,
        attribute: String,
    },

    #[error("annotation '{annotation}' attribute '{attribute}' is required but unset")]
    UnsetAttribute {
        annotation: &'static str,
        attribute: String,
    },

    #[error(
        "annotation '{annotation}' attribute '{attribute}': expected {expected}, found {actual}"
    )]
    AttributeType {
        annotation: &'static str,
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("annotation '{annotation}' attribute '{attribute}': cannot parse '{value}'")]
    EnumParse {
        annotation: &'static str,
        attribute: String,
        value: String,
    },

    #[error("unknown class '{name}': no registered source can resolve it")]
    UnknownClass { name: String },

    #[error("class '{name}' has no member '{member}'")]
    UnknownMember { name: String, member: String },
}
