//! Composed descriptors: arrays (`Vec<T>`) and pointers (`Option<Box<T>>`).
//!
//! Generic types cannot own a `static`, so composed descriptors are built on
//! first request and cached per `TypeId` for the life of the process.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::meta_type::{Detail, MetaArray, MetaPointer, MetaType};
use crate::{value_kind, MetaError, Reflect};

static COMPOSED: OnceLock<RwLock<HashMap<TypeId, &'static MetaType>>> = OnceLock::new();

/// Fetch or build the cached descriptor for `T`.
///
/// `build` runs without the cache lock held because it resolves element
/// descriptors, which may themselves be composed.
fn composed<T: 'static>(build: impl FnOnce() -> MetaType) -> &'static MetaType {
    let cache = COMPOSED.get_or_init(Default::default);
    let key = TypeId::of::<T>();
    if let Some(meta) = cache.read().get(&key).copied() {
        return meta;
    }
    let built = build();
    let mut cache = cache.write();
    *cache
        .entry(key)
        .or_insert_with(|| &*Box::leak(Box::new(built)))
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

unsafe fn serialize_array<T: Reflect>(instance: *const u8, _meta: &MetaType) -> Value {
    let items = &*instance.cast::<Vec<T>>();
    let element = T::meta_type();
    Value::Array(
        items
            .iter()
            .map(|item| element.serialize_raw((item as *const T).cast()))
            .collect(),
    )
}

unsafe fn deserialize_array<T: Reflect + Default>(
    instance: *mut u8,
    meta: &MetaType,
    value: &Value,
) -> Result<(), MetaError> {
    let nodes = value.as_array().ok_or_else(|| MetaError::TypeMismatch {
        expected: meta.name().to_owned(),
        found: value_kind(value),
    })?;
    // Built aside and committed only once every element has been read.
    let mut items: Vec<T> = Vec::with_capacity(nodes.len());
    items.resize_with(nodes.len(), T::default);

    let element = T::meta_type();
    for (index, (item, node)) in items.iter_mut().zip(nodes).enumerate() {
        element
            .deserialize_raw((item as *mut T).cast(), node)
            .map_err(|source| MetaError::Element {
                array: meta.name().to_owned(),
                index,
                source: Box::new(source),
            })?;
    }
    *instance.cast::<Vec<T>>() = items;
    Ok(())
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn meta_type() -> &'static MetaType {
        composed::<Self>(|| {
            let element = T::meta_type();
            MetaType::new::<Self>(
                format!("Vec<{}>", element.name()),
                serialize_array::<T>,
                deserialize_array::<T>,
                Detail::Array(MetaArray::new(element)),
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

unsafe fn serialize_pointer<T: Reflect>(instance: *const u8, _meta: &MetaType) -> Value {
    match &*instance.cast::<Option<Box<T>>>() {
        Some(pointee) => T::meta_type().serialize_raw((&**pointee as *const T).cast()),
        None => Value::Null,
    }
}

unsafe fn deserialize_pointer<T: Reflect + Default>(
    instance: *mut u8,
    _meta: &MetaType,
    value: &Value,
) -> Result<(), MetaError> {
    let slot = &mut *instance.cast::<Option<Box<T>>>();
    if value.is_null() {
        *slot = None;
        return Ok(());
    }
    // An existing pointee is updated in place, like a nested field.
    if let Some(pointee) = slot.as_deref_mut() {
        return T::meta_type().deserialize_raw((pointee as *mut T).cast(), value);
    }
    let mut pointee = Box::<T>::default();
    T::meta_type().deserialize_raw((&mut *pointee as *mut T).cast(), value)?;
    *slot = Some(pointee);
    Ok(())
}

impl<T: Reflect + Default> Reflect for Option<Box<T>> {
    fn meta_type() -> &'static MetaType {
        composed::<Self>(|| {
            let pointee = T::meta_type();
            MetaType::new::<Self>(
                format!("*{}", pointee.name()),
                serialize_pointer::<T>,
                deserialize_pointer::<T>,
                Detail::Pointer(MetaPointer::new(pointee)),
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
