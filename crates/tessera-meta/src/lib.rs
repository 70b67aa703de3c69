//! Tessera Meta -- runtime reflection for generic JSON (de)serialization.
//!
//! Types describe themselves through a [`MetaType`]: a primitive, a class
//! (named, offset-addressed fields), an array (`Vec<T>`) or a pointer
//! (`Option<Box<T>>`). Class descriptors are declared with
//! [`reflect_class!`] and collected into a process-wide [`MetaRegistry`]
//! that is installed once at startup and looked up by name afterwards.
//!
//! # Quick Start
//!
//! ```
//! use tessera_meta::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Stats {
//!     level: i32,
//!     speed: f32,
//!     title: String,
//! }
//!
//! tessera_meta::reflect_class!(Stats as "Stats" {
//!     level => "Level",
//!     speed => "Speed",
//!     title => "Title",
//! });
//!
//! let class = get_meta_class::<Stats>().unwrap();
//! let mut stats = Stats::default();
//! class
//!     .deserialize(&mut stats, &serde_json::json!({ "Level": 3, "Speed": 1.5, "Title": "scout" }))
//!     .unwrap();
//! assert_eq!(stats, Stats { level: 3, speed: 1.5, title: "scout".to_owned() });
//! ```

#![deny(unsafe_code)]

#[allow(unsafe_code)]
pub mod class;
#[allow(unsafe_code)]
pub mod container;
#[allow(unsafe_code)]
pub mod meta_type;
#[allow(unsafe_code)]
pub mod primitive;
pub mod registry;

mod macros;

pub use class::{MetaBase, MetaClass, MetaField};
pub use meta_type::{Category, MetaArray, MetaPointer, MetaType};
pub use registry::{find_meta_class, registry, MetaRegistry};

// ---------------------------------------------------------------------------
// Reflect
// ---------------------------------------------------------------------------

/// A type with a reflection descriptor.
///
/// Implemented for the supported primitives, for `Vec<T>` and
/// `Option<Box<T>>` over reflected element types, and for any struct declared
/// with [`reflect_class!`].
pub trait Reflect: 'static {
    /// The descriptor for `Self`. Always returns the same instance.
    fn meta_type() -> &'static MetaType;
}

/// Resolve the descriptor for `T`.
pub fn get_meta_type<T: Reflect>() -> &'static MetaType {
    T::meta_type()
}

/// Resolve the class descriptor for `T`, or `None` if `T` is not a class.
pub fn get_meta_class<T: Reflect>() -> Option<&'static MetaClass> {
    T::meta_type().as_meta_class()
}

/// Serialize any reflected value into a JSON tree.
pub fn serialize<T: Reflect>(instance: &T) -> Result<serde_json::Value, MetaError> {
    T::meta_type().serialize_any(instance)
}

/// Deserialize a JSON tree into an existing reflected value.
///
/// Keys absent from `value` leave the corresponding fields untouched.
pub fn deserialize<T: Reflect>(
    instance: &mut T,
    value: &serde_json::Value,
) -> Result<(), MetaError> {
    T::meta_type().deserialize_any(instance, value)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while reading or writing reflected values.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// A JSON node had the wrong shape for the target type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: &'static str,
    },

    /// A numeric JSON node does not fit in the target integer type.
    #[error("value {value} is out of range for {type_name}")]
    OutOfRange {
        type_name: &'static str,
        value: String,
    },

    /// A descriptor was applied to an instance of a different Rust type.
    #[error("descriptor '{descriptor}' cannot be applied to an instance of {instance}")]
    InstanceMismatch {
        descriptor: String,
        instance: &'static str,
    },

    /// A type was registered as a class but describes something else.
    #[error("type '{0}' is not a class")]
    NotAClass(String),

    /// One or more fields of a class failed to deserialize. The remaining
    /// fields were still applied.
    #[error("{} field(s) of '{class}' failed to deserialize", .errors.len())]
    Fields {
        class: String,
        errors: Vec<(String, MetaError)>,
    },

    /// An element of an array failed to deserialize.
    #[error("element {index} of {array}: {source}")]
    Element {
        array: String,
        index: usize,
        source: Box<MetaError>,
    },

    /// The process-wide registry was installed more than once.
    #[error("the reflection registry has already been installed")]
    AlreadyInstalled,
}

/// Short description of a JSON node's shape, for diagnostics.
pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[doc(hidden)]
pub mod __private {
    pub use crate::class::{base, field};
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::class::{MetaBase, MetaClass, MetaField};
    pub use crate::meta_type::{Category, MetaType};
    pub use crate::registry::{find_meta_class, MetaRegistry};
    pub use crate::{get_meta_class, get_meta_type, MetaError, Reflect};
}
