//! Class descriptors: named structs with offset-addressed fields.
//!
//! A [`MetaClass`] lists its fields in declaration order. Each [`MetaField`]
//! records the byte offset of the field inside the owning struct together
//! with the field's own [`MetaType`], so a class can be read and written
//! without any per-type code. A class may derive from one base class whose
//! value is embedded at a known offset; base fields are serialized into the
//! same JSON object and are always applied before the derived fields.
//!
//! Classes are normally declared with [`reflect_class!`](crate::reflect_class),
//! which computes offsets with `core::mem::offset_of!`.

use std::any::{Any, TypeId};
use std::fmt;

use serde_json::{Map, Value};

use crate::meta_type::MetaType;
use crate::{value_kind, MetaError, Reflect};

// ---------------------------------------------------------------------------
// MetaField
// ---------------------------------------------------------------------------

/// One named field of a class.
pub struct MetaField {
    name: &'static str,
    /// The struct this field belongs to.
    owner: TypeId,
    offset: usize,
    meta_type: &'static MetaType,
}

impl MetaField {
    /// Name of the field in JSON documents.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Byte offset of the field within the struct that declares it.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Descriptor of the field's type.
    pub fn meta_type(&self) -> &'static MetaType {
        self.meta_type
    }
}

impl fmt::Debug for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaField")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("type", &self.meta_type.name())
            .finish()
    }
}

/// Build a field descriptor. Used by [`reflect_class!`](crate::reflect_class).
///
/// The accessor is never called; it only pins down the field type `F`.
///
/// # Safety
///
/// `offset` must be the offset of a field of type `F` inside `C`, as
/// returned by `core::mem::offset_of!` for the field `accessor` reads.
///
/// # Panics
///
/// Panics if the field would not fit inside `C` at `offset`.
pub unsafe fn field<C, F, A>(name: &'static str, offset: usize, accessor: A) -> MetaField
where
    C: 'static,
    F: Reflect,
    A: for<'a> Fn(&'a C) -> &'a F,
{
    let _ = accessor;
    assert!(
        offset + std::mem::size_of::<F>() <= std::mem::size_of::<C>(),
        "field '{name}' at offset {offset} does not fit in {}",
        std::any::type_name::<C>()
    );
    let meta_type = F::meta_type();
    assert_eq!(
        meta_type.type_id(),
        TypeId::of::<F>(),
        "descriptor for field '{name}' does not describe its type"
    );
    MetaField {
        name,
        owner: TypeId::of::<C>(),
        offset,
        meta_type,
    }
}

// ---------------------------------------------------------------------------
// MetaBase
// ---------------------------------------------------------------------------

/// The single base class a class derives from, embedded at `offset`.
#[derive(Debug, Clone, Copy)]
pub struct MetaBase {
    class: &'static MetaClass,
    /// The derived struct embedding the base.
    owner: TypeId,
    offset: usize,
}

impl MetaBase {
    /// The base class descriptor.
    pub fn class(&self) -> &'static MetaClass {
        self.class
    }

    /// Byte offset of the base value within the derived struct.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Build a base descriptor. Used by [`reflect_class!`](crate::reflect_class).
///
/// # Safety
///
/// `offset` must be the offset of a field of type `B` inside `C`, as
/// returned by `core::mem::offset_of!` for the field `accessor` reads.
///
/// # Panics
///
/// Panics if `B` is not a class, derives from a base itself, or would not
/// fit inside `C` at `offset`.
pub unsafe fn base<C, B, A>(offset: usize, accessor: A) -> MetaBase
where
    C: 'static,
    B: Reflect,
    A: for<'a> Fn(&'a C) -> &'a B,
{
    let _ = accessor;
    assert!(
        offset + std::mem::size_of::<B>() <= std::mem::size_of::<C>(),
        "base at offset {offset} does not fit in {}",
        std::any::type_name::<C>()
    );
    let class = B::meta_type().as_meta_class().unwrap_or_else(|| {
        panic!(
            "base type {} of {} is not a reflected class",
            B::meta_type().name(),
            std::any::type_name::<C>()
        )
    });
    assert!(
        class.base.is_none(),
        "class '{}' already derives from a base; only one level is supported",
        class.name
    );
    MetaBase {
        class,
        owner: TypeId::of::<C>(),
        offset,
    }
}

// ---------------------------------------------------------------------------
// MetaClass
// ---------------------------------------------------------------------------

/// Descriptor for a reflected struct.
pub struct MetaClass {
    name: &'static str,
    type_id: TypeId,
    base: Option<MetaBase>,
    fields: Vec<MetaField>,
    create: fn() -> Box<dyn Any>,
}

impl MetaClass {
    /// Start describing `T` under `name`.
    pub fn builder<T: Default + 'static>(name: &'static str) -> MetaClassBuilder {
        MetaClassBuilder {
            class: MetaClass {
                name,
                type_id: TypeId::of::<T>(),
                base: None,
                fields: Vec::new(),
                create: || Box::new(T::default()),
            },
        }
    }

    /// Class name, used as the registry and template key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the described struct.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The base class, if any.
    pub fn base(&self) -> Option<&MetaBase> {
        self.base.as_ref()
    }

    /// Fields declared directly on this class, in declaration order.
    pub fn fields(&self) -> &[MetaField] {
        &self.fields
    }

    /// Every field including inherited ones, base first, paired with its
    /// offset from the start of this class.
    pub fn fields_with_base(&self) -> Vec<(usize, &MetaField)> {
        let mut all = Vec::new();
        if let Some(base) = &self.base {
            all.extend(
                base.class
                    .fields
                    .iter()
                    .map(|field| (base.offset + field.offset, field)),
            );
        }
        all.extend(self.fields.iter().map(|field| (field.offset, field)));
        all
    }

    /// Look up a field (own or inherited) by its exact name.
    pub fn find_field(&self, name: &str) -> Option<&MetaField> {
        self.fields_with_base()
            .into_iter()
            .map(|(_, field)| field)
            .find(|field| field.name == name)
    }

    /// Whether this class is `other` or derives from it.
    pub fn is_a(&self, other: &MetaClass) -> bool {
        self.type_id == other.type_id
            || self
                .base
                .as_ref()
                .is_some_and(|base| base.class.type_id == other.type_id)
    }

    /// Default-construct a fresh instance of the described type.
    pub fn create(&self) -> Box<dyn Any> {
        (self.create)()
    }

    /// Serialize `instance` into a JSON object keyed by field name.
    pub fn serialize<T: Any>(&self, instance: &T) -> Result<Value, MetaError> {
        self.serialize_any(instance)
    }

    /// Like [`serialize`](Self::serialize), for a type-erased instance.
    pub fn serialize_any(&self, instance: &dyn Any) -> Result<Value, MetaError> {
        self.check_instance(instance.type_id())?;
        // SAFETY: the TypeId matches, so the fields are at the recorded offsets.
        Ok(unsafe { self.serialize_fields(instance as *const dyn Any as *const u8) })
    }

    /// Deserialize a JSON object into `instance`, field by field.
    ///
    /// Keys that do not name a field are ignored and fields without a key are
    /// left untouched. A field whose node has the wrong shape keeps its
    /// previous value; all such failures are returned together in
    /// [`MetaError::Fields`] after every other field has been applied.
    pub fn deserialize<T: Any>(&self, instance: &mut T, value: &Value) -> Result<(), MetaError> {
        self.deserialize_any(instance, value)
    }

    /// Like [`deserialize`](Self::deserialize), for a type-erased instance.
    pub fn deserialize_any(&self, instance: &mut dyn Any, value: &Value) -> Result<(), MetaError> {
        self.check_instance((*instance).type_id())?;
        // SAFETY: the TypeId matches and `instance` is a unique borrow.
        unsafe { self.deserialize_fields(instance as *mut dyn Any as *mut u8, value) }
    }

    fn check_instance(&self, instance: TypeId) -> Result<(), MetaError> {
        if instance == self.type_id {
            Ok(())
        } else {
            Err(MetaError::InstanceMismatch {
                descriptor: self.name.to_owned(),
                instance: "a different type",
            })
        }
    }

    unsafe fn serialize_fields(&self, instance: *const u8) -> Value {
        let mut object = Map::new();
        for (offset, field) in self.fields_with_base() {
            object.insert(
                field.name.to_owned(),
                field.meta_type.serialize_raw(instance.add(offset)),
            );
        }
        Value::Object(object)
    }

    unsafe fn deserialize_fields(&self, instance: *mut u8, value: &Value) -> Result<(), MetaError> {
        let object = value.as_object().ok_or_else(|| MetaError::TypeMismatch {
            expected: format!("an object for class '{}'", self.name),
            found: value_kind(value),
        })?;

        let mut errors = Vec::new();
        for (offset, field) in self.fields_with_base() {
            let Some(node) = object.get(field.name) else {
                continue;
            };
            if let Err(error) = field.meta_type.deserialize_raw(instance.add(offset), node) {
                errors.push((field.name.to_owned(), error));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MetaError::Fields {
                class: self.name.to_owned(),
                errors,
            })
        }
    }
}

impl fmt::Debug for MetaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaClass")
            .field("name", &self.name)
            .field("base", &self.base.map(|base| base.class.name))
            .field("fields", &self.fields)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// MetaClassBuilder
// ---------------------------------------------------------------------------

/// Incrementally assembles a [`MetaClass`].
pub struct MetaClassBuilder {
    class: MetaClass,
}

impl MetaClassBuilder {
    /// # Panics
    ///
    /// Panics if `base` was built for a different struct.
    pub fn base(mut self, base: MetaBase) -> Self {
        assert!(
            base.owner == self.class.type_id,
            "base '{}' was not built for class '{}'",
            base.class.name,
            self.class.name
        );
        self.class.base = Some(base);
        self
    }

    /// Append a field.
    ///
    /// # Panics
    ///
    /// Panics if `field` was built for a different struct, or if a field
    /// (own or inherited) already uses the same name.
    pub fn field(mut self, field: MetaField) -> Self {
        assert!(
            field.owner == self.class.type_id,
            "field '{}' was not built for class '{}'",
            field.name,
            self.class.name
        );
        assert!(
            self.class.find_field(field.name).is_none(),
            "class '{}' declares field '{}' twice",
            self.class.name,
            field.name
        );
        self.class.fields.push(field);
        self
    }

    /// Finish the class descriptor.
    pub fn build(self) -> MetaClass {
        self.class
    }
}

// ---------------------------------------------------------------------------
// Type-erased entry points used by class MetaTypes
// ---------------------------------------------------------------------------

pub(crate) unsafe fn serialize_class(instance: *const u8, meta: &MetaType) -> Value {
    match meta.as_meta_class() {
        Some(class) => class.serialize_fields(instance),
        None => Value::Null,
    }
}

pub(crate) unsafe fn deserialize_class(
    instance: *mut u8,
    meta: &MetaType,
    value: &Value,
) -> Result<(), MetaError> {
    match meta.as_meta_class() {
        Some(class) => class.deserialize_fields(instance, value),
        None => Err(MetaError::NotAClass(meta.name().to_owned())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[derive(Debug, Default, PartialEq)]
    struct Shape {
        label: String,
        visible: bool,
    }

    crate::reflect_class!(Shape as "Shape" {
        label => "Label",
        visible => "Visible",
    });

    #[derive(Debug, Default, PartialEq)]
    struct Sprite {
        shape: Shape,
        texture: PathBuf,
        frames: Vec<u32>,
        tint: Option<Box<Shape>>,
    }

    crate::reflect_class!(Sprite as "Sprite" : shape {
        texture => "Texture",
        frames => "Frames",
        tint => "Tint",
    });

    #[test]
    fn derived_class_serializes_base_fields_first() {
        let class = Sprite::meta_type().as_meta_class().unwrap();
        let names: Vec<_> = class
            .fields_with_base()
            .into_iter()
            .map(|(_, field)| field.name())
            .collect();
        assert_eq!(names, vec!["Label", "Visible", "Texture", "Frames", "Tint"]);

        let sprite = Sprite {
            shape: Shape {
                label: "hero".to_owned(),
                visible: true,
            },
            texture: PathBuf::from("hero.png"),
            frames: vec![1, 2, 3],
            tint: None,
        };
        let tree = class.serialize(&sprite).unwrap();
        let keys: Vec<_> = tree.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Label", "Visible", "Texture", "Frames", "Tint"]);
        assert_eq!(tree["Label"], json!("hero"));
        assert_eq!(tree["Frames"], json!([1, 2, 3]));
        assert_eq!(tree["Tint"], Value::Null);
    }

    #[test]
    fn derived_class_round_trip() {
        let class = Sprite::meta_type().as_meta_class().unwrap();
        let original = Sprite {
            shape: Shape {
                label: "crate".to_owned(),
                visible: false,
            },
            texture: PathBuf::from("crate.png"),
            frames: vec![4],
            tint: Some(Box::new(Shape {
                label: "red".to_owned(),
                visible: true,
            })),
        };
        let tree = class.serialize(&original).unwrap();

        let fresh = class.create();
        let mut fresh = fresh.downcast::<Sprite>().unwrap();
        class.deserialize(&mut *fresh, &tree).unwrap();
        assert_eq!(*fresh, original);
    }

    #[test]
    fn unknown_keys_ignored_and_missing_keys_untouched() {
        let class = Shape::meta_type().as_meta_class().unwrap();
        let mut shape = Shape {
            label: "keep".to_owned(),
            visible: false,
        };
        class
            .deserialize(&mut shape, &json!({ "Visible": true, "Colour": "blue" }))
            .unwrap();
        assert_eq!(shape.label, "keep");
        assert!(shape.visible);
    }

    #[test]
    fn bad_fields_are_collected_and_good_ones_applied() {
        let class = Sprite::meta_type().as_meta_class().unwrap();
        let mut sprite = Sprite::default();
        let err = class
            .deserialize(
                &mut sprite,
                &json!({ "Label": 12, "Texture": "ok.png", "Frames": "bad" }),
            )
            .unwrap_err();
        match err {
            MetaError::Fields { class, errors } => {
                assert_eq!(class, "Sprite");
                let names: Vec<_> = errors.iter().map(|(name, _)| name.as_str()).collect();
                assert_eq!(names, vec!["Label", "Frames"]);
            }
            other => panic!("expected Fields error, got {other:?}"),
        }
        assert_eq!(sprite.texture, PathBuf::from("ok.png"));
        assert_eq!(sprite.shape.label, "");
    }

    #[test]
    fn non_object_node_is_a_mismatch() {
        let class = Shape::meta_type().as_meta_class().unwrap();
        let mut shape = Shape::default();
        let err = class.deserialize(&mut shape, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, MetaError::TypeMismatch { found: "an array", .. }));
    }

    #[test]
    fn wrong_instance_type_is_rejected() {
        let class = Shape::meta_type().as_meta_class().unwrap();
        let mut not_a_shape = 5u32;
        assert!(matches!(
            class.deserialize(&mut not_a_shape, &json!({})),
            Err(MetaError::InstanceMismatch { .. })
        ));
    }

    #[test]
    fn find_field_and_is_a() {
        let sprite = Sprite::meta_type().as_meta_class().unwrap();
        let shape = Shape::meta_type().as_meta_class().unwrap();
        assert_eq!(sprite.find_field("Label").unwrap().meta_type().name(), "String");
        assert_eq!(sprite.find_field("Frames").unwrap().meta_type().name(), "Vec<u32>");
        assert!(sprite.find_field("label").is_none(), "names are case-sensitive");
        assert!(sprite.is_a(shape));
        assert!(!shape.is_a(sprite));
        assert_eq!(sprite.base().unwrap().class().name(), "Shape");
    }

    #[derive(Debug, Default)]
    struct Wide {
        text: String,
    }

    #[test]
    #[should_panic(expected = "field 'Text' was not built for class 'Narrow'")]
    fn builder_rejects_fields_of_another_struct() {
        // SAFETY: the offset is taken from the field the accessor reads.
        let text = unsafe {
            field::<Wide, String, _>("Text", std::mem::offset_of!(Wide, text), |wide| &wide.text)
        };
        let _ = MetaClass::builder::<u8>("Narrow").field(text);
    }

    #[test]
    #[should_panic(expected = "base 'Shape' was not built for class 'Narrow'")]
    fn builder_rejects_bases_of_another_struct() {
        // SAFETY: the offset is taken from the field the accessor reads.
        let shape = unsafe {
            base::<Sprite, Shape, _>(std::mem::offset_of!(Sprite, shape), |sprite| &sprite.shape)
        };
        let _ = MetaClass::builder::<u8>("Narrow").base(shape);
    }

    #[test]
    fn field_offsets_match_layout() {
        let class = Shape::meta_type().as_meta_class().unwrap();
        let label = class.find_field("Label").unwrap();
        assert_eq!(label.offset(), std::mem::offset_of!(Shape, label));
    }
}
