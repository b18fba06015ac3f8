//! Uniform view of classes, members and annotation usages, independent of
//! whether a fact came from loaded runtime type information, a build-time
//! annotation index, or an XML-synthesized dynamic model.

pub mod annotation;
pub mod class;
pub mod error;
pub mod registry;

pub use error::SourceError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        annotation::{
            AnnotationList, AnnotationUsage,
            descriptor::{self, AnnotationDescriptor},
            value::AnnotationValue,
        },
        class::{ClassDetails, ClassName, ClassOrigin, MemberDetails, MemberKind},
        error::SourceError,
        registry::{ClassDetailsRegistry, ClassDetailsSource, RawClass, RawMember, StaticClassSource},
    };
    pub(crate) use serde::Serialize;
}
