//! Type-erased type descriptors.
//!
//! A [`MetaType`] knows a type's name, size and category, and carries the
//! functions that read and write an instance of that type through a raw
//! pointer. The raw entry points are `unsafe`; the `*_any` methods check the
//! instance's `TypeId` against the descriptor before touching memory.

use std::any::{Any, TypeId};
use std::fmt;

use serde_json::Value;

use crate::class::MetaClass;
use crate::MetaError;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The shape of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Scalar read/written directly against a JSON node.
    Primitive,
    /// Struct with named, offset-addressed fields.
    Class,
    /// Homogeneous growable sequence (`Vec<T>`).
    Array,
    /// One level of optional owned indirection (`Option<Box<T>>`).
    Pointer,
}

// ---------------------------------------------------------------------------
// Function signatures
// ---------------------------------------------------------------------------

/// Reads the instance at `instance` into a JSON tree.
///
/// `instance` must point to a live value of the type `meta` describes.
pub type SerializeFn = unsafe fn(instance: *const u8, meta: &MetaType) -> Value;

/// Writes `value` into the instance at `instance`.
///
/// `instance` must point to a live, initialized value of the type `meta`
/// describes; the previous value is dropped in place where overwritten.
pub type DeserializeFn =
    unsafe fn(instance: *mut u8, meta: &MetaType, value: &Value) -> Result<(), MetaError>;

// ---------------------------------------------------------------------------
// Category payloads
// ---------------------------------------------------------------------------

/// Array-specific descriptor data.
#[derive(Debug)]
pub struct MetaArray {
    element: &'static MetaType,
}

impl MetaArray {
    pub(crate) fn new(element: &'static MetaType) -> Self {
        Self { element }
    }

    /// Descriptor of the element type.
    pub fn element_type(&self) -> &'static MetaType {
        self.element
    }
}

/// Pointer-specific descriptor data.
#[derive(Debug)]
pub struct MetaPointer {
    pointee: &'static MetaType,
}

impl MetaPointer {
    pub(crate) fn new(pointee: &'static MetaType) -> Self {
        Self { pointee }
    }

    /// Descriptor of the pointed-to type.
    pub fn pointee_type(&self) -> &'static MetaType {
        self.pointee
    }
}

#[derive(Debug)]
pub(crate) enum Detail {
    Primitive,
    Class(MetaClass),
    Array(MetaArray),
    Pointer(MetaPointer),
}

// ---------------------------------------------------------------------------
// MetaType
// ---------------------------------------------------------------------------

/// Descriptor for one reflected Rust type.
pub struct MetaType {
    name: String,
    size: usize,
    type_id: TypeId,
    serialize_fn: SerializeFn,
    deserialize_fn: DeserializeFn,
    detail: Detail,
}

impl MetaType {
    /// Build a descriptor for `T`. The `TypeId` is always taken from `T` so a
    /// descriptor can never claim to describe some other type.
    pub(crate) fn new<T: 'static>(
        name: impl Into<String>,
        serialize_fn: SerializeFn,
        deserialize_fn: DeserializeFn,
        detail: Detail,
    ) -> Self {
        Self {
            name: name.into(),
            size: std::mem::size_of::<T>(),
            type_id: TypeId::of::<T>(),
            serialize_fn,
            deserialize_fn,
            detail,
        }
    }

    /// Descriptor for a class type built with [`MetaClass::builder`].
    ///
    /// # Panics
    ///
    /// Panics if `class` was built for a type other than `T`.
    pub fn class<T: 'static>(class: MetaClass) -> Self {
        assert!(
            class.type_id() == TypeId::of::<T>(),
            "class '{}' does not describe {}",
            class.name(),
            std::any::type_name::<T>()
        );
        let name = class.name().to_owned();
        Self::new::<T>(
            name,
            crate::class::serialize_class,
            crate::class::deserialize_class,
            Detail::Class(class),
        )
    }

    /// Human-readable type name (`"i32"`, `"Transform"`, `"Vec<f32>"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `std::mem::size_of` of the described type.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The Rust `TypeId` of the described type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Which kind of type this describes.
    pub fn category(&self) -> Category {
        match self.detail {
            Detail::Primitive => Category::Primitive,
            Detail::Class(_) => Category::Class,
            Detail::Array(_) => Category::Array,
            Detail::Pointer(_) => Category::Pointer,
        }
    }

    /// The class detail, for class types.
    pub fn as_meta_class(&self) -> Option<&MetaClass> {
        match &self.detail {
            Detail::Class(class) => Some(class),
            _ => None,
        }
    }

    /// The element detail, for `Vec<T>` types.
    pub fn as_meta_array(&self) -> Option<&MetaArray> {
        match &self.detail {
            Detail::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The pointee detail, for `Option<Box<T>>` types.
    pub fn as_meta_pointer(&self) -> Option<&MetaPointer> {
        match &self.detail {
            Detail::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    /// Serialize the instance at `instance`.
    ///
    /// # Safety
    ///
    /// `instance` must point to a live value of the type this descriptor
    /// describes.
    pub unsafe fn serialize_raw(&self, instance: *const u8) -> Value {
        (self.serialize_fn)(instance, self)
    }

    /// Deserialize `value` into the instance at `instance`.
    ///
    /// # Safety
    ///
    /// `instance` must point to a live, initialized value of the type this
    /// descriptor describes, and no other reference to it may be active.
    pub unsafe fn deserialize_raw(&self, instance: *mut u8, value: &Value) -> Result<(), MetaError> {
        (self.deserialize_fn)(instance, self, value)
    }

    /// Serialize a type-erased instance, checking that it really is the
    /// described type.
    pub fn serialize_any(&self, instance: &dyn Any) -> Result<Value, MetaError> {
        self.check_instance(instance.type_id())?;
        // SAFETY: the TypeId matches, so the data pointer of `instance`
        // points to a live value of the described type.
        Ok(unsafe { self.serialize_raw(instance as *const dyn Any as *const u8) })
    }

    /// Deserialize into a type-erased instance, checking that it really is
    /// the described type.
    pub fn deserialize_any(&self, instance: &mut dyn Any, value: &Value) -> Result<(), MetaError> {
        self.check_instance((*instance).type_id())?;
        // SAFETY: the TypeId matches and `instance` is a unique borrow.
        unsafe { self.deserialize_raw(instance as *mut dyn Any as *mut u8, value) }
    }

    fn check_instance(&self, instance: TypeId) -> Result<(), MetaError> {
        if instance == self.type_id {
            Ok(())
        } else {
            Err(MetaError::InstanceMismatch {
                descriptor: self.name.clone(),
                instance: "a different type",
            })
        }
    }
}

impl fmt::Debug for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaType")
            .field("name", &self.name)
            .field("category", &self.category())
            .field("size", &self.size)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;
    use serde_json::json;

    #[test]
    fn categories_and_accessors() {
        let int = i32::meta_type();
        assert_eq!(int.category(), Category::Primitive);
        assert!(int.as_meta_class().is_none());
        assert!(int.as_meta_array().is_none());
        assert_eq!(int.size(), 4);

        let array = <Vec<f32>>::meta_type();
        assert_eq!(array.category(), Category::Array);
        assert_eq!(array.as_meta_array().unwrap().element_type().name(), "f32");

        let pointer = <Option<Box<String>>>::meta_type();
        assert_eq!(pointer.category(), Category::Pointer);
        assert_eq!(
            pointer.as_meta_pointer().unwrap().pointee_type().name(),
            "String"
        );
    }

    #[test]
    fn any_entry_points_reject_other_types() {
        let meta = i32::meta_type();
        let wrong = 1.5f64;
        assert!(matches!(
            meta.serialize_any(&wrong),
            Err(MetaError::InstanceMismatch { .. })
        ));

        let mut wrong = String::new();
        assert!(matches!(
            meta.deserialize_any(&mut wrong, &json!(1)),
            Err(MetaError::InstanceMismatch { .. })
        ));
    }

    #[derive(Debug, Default)]
    struct Wide {
        text: String,
    }

    #[test]
    #[should_panic(expected = "class 'Wide' does not describe u8")]
    fn class_descriptor_for_another_type_is_rejected() {
        // SAFETY: the offset is taken from the field the accessor reads.
        let text = unsafe {
            crate::class::field::<Wide, String, _>(
                "Text",
                std::mem::offset_of!(Wide, text),
                |wide| &wide.text,
            )
        };
        let class = crate::MetaClass::builder::<Wide>("Wide").field(text).build();
        let _ = MetaType::class::<u8>(class);
    }

    #[test]
    fn any_entry_points_accept_matching_type() {
        let meta = i32::meta_type();
        let mut value = 0i32;
        meta.deserialize_any(&mut value, &json!(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(meta.serialize_any(&value).unwrap(), json!(42));
    }
}
