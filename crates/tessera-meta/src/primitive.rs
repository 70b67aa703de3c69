//! Primitive descriptors: integers, floats, booleans, strings and paths.
//!
//! Each primitive maps onto exactly one JSON scalar shape. Integers are
//! range-checked on the way in; floats accept any JSON number.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde_json::Value;

use crate::meta_type::{Detail, MetaType};
use crate::{value_kind, MetaError, Reflect};

/// A scalar with a direct JSON encoding.
pub(crate) trait Primitive: Sized + 'static {
    const NAME: &'static str;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self, MetaError>;
}

fn mismatch(expected: &str, value: &Value) -> MetaError {
    MetaError::TypeMismatch {
        expected: expected.to_owned(),
        found: value_kind(value),
    }
}

macro_rules! signed_primitive {
    ($ty:ty, $name:literal) => {
        impl Primitive for $ty {
            const NAME: &'static str = $name;

            fn to_value(&self) -> Value {
                Value::from(i64::from(*self))
            }

            fn from_value(value: &Value) -> Result<Self, MetaError> {
                let wide = value.as_i64().ok_or_else(|| mismatch("an integer", value))?;
                <$ty>::try_from(wide).map_err(|_| MetaError::OutOfRange {
                    type_name: $name,
                    value: wide.to_string(),
                })
            }
        }
    };
}

macro_rules! unsigned_primitive {
    ($ty:ty, $name:literal) => {
        impl Primitive for $ty {
            const NAME: &'static str = $name;

            fn to_value(&self) -> Value {
                Value::from(u64::from(*self))
            }

            fn from_value(value: &Value) -> Result<Self, MetaError> {
                if let Some(negative) = value.as_i64().filter(|v| *v < 0) {
                    return Err(MetaError::OutOfRange {
                        type_name: $name,
                        value: negative.to_string(),
                    });
                }
                let wide = value
                    .as_u64()
                    .ok_or_else(|| mismatch("an unsigned integer", value))?;
                <$ty>::try_from(wide).map_err(|_| MetaError::OutOfRange {
                    type_name: $name,
                    value: wide.to_string(),
                })
            }
        }
    };
}

signed_primitive!(i32, "i32");
signed_primitive!(i64, "i64");
unsigned_primitive!(u32, "u32");
unsigned_primitive!(u64, "u64");

impl Primitive for f32 {
    const NAME: &'static str = "f32";

    fn to_value(&self) -> Value {
        Value::from(f64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self, MetaError> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch("a number", value))
    }
}

impl Primitive for f64 {
    const NAME: &'static str = "f64";

    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: &Value) -> Result<Self, MetaError> {
        value.as_f64().ok_or_else(|| mismatch("a number", value))
    }
}

impl Primitive for bool {
    const NAME: &'static str = "bool";

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self, MetaError> {
        value.as_bool().ok_or_else(|| mismatch("a boolean", value))
    }
}

impl Primitive for String {
    const NAME: &'static str = "String";

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self, MetaError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("a string", value))
    }
}

impl Primitive for PathBuf {
    const NAME: &'static str = "Path";

    fn to_value(&self) -> Value {
        Value::String(self.to_string_lossy().into_owned())
    }

    fn from_value(value: &Value) -> Result<Self, MetaError> {
        value
            .as_str()
            .map(PathBuf::from)
            .ok_or_else(|| mismatch("a path string", value))
    }
}

// ---------------------------------------------------------------------------
// Type-erased entry points
// ---------------------------------------------------------------------------

unsafe fn serialize_primitive<P: Primitive>(instance: *const u8, _meta: &MetaType) -> Value {
    (*instance.cast::<P>()).to_value()
}

unsafe fn deserialize_primitive<P: Primitive>(
    instance: *mut u8,
    _meta: &MetaType,
    value: &Value,
) -> Result<(), MetaError> {
    // Parse first so a malformed node leaves the old value in place.
    let parsed = P::from_value(value)?;
    *instance.cast::<P>() = parsed;
    Ok(())
}

fn primitive_meta_type<P: Primitive>() -> MetaType {
    MetaType::new::<P>(
        P::NAME,
        serialize_primitive::<P>,
        deserialize_primitive::<P>,
        Detail::Primitive,
    )
}

macro_rules! reflect_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn meta_type() -> &'static MetaType {
                    static META: OnceLock<MetaType> = OnceLock::new();
                    META.get_or_init(primitive_meta_type::<$ty>)
                }
            }
        )*
    };
}

reflect_primitive!(i32, i64, u32, u64, f32, f64, bool, String, PathBuf);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptors_are_singletons() {
        assert!(std::ptr::eq(i32::meta_type(), i32::meta_type()));
        assert!(!std::ptr::eq(
            i32::meta_type() as *const MetaType,
            u32::meta_type() as *const MetaType
        ));
    }

    #[test]
    fn integers_are_range_checked() {
        let mut small = 0i32;
        let err = crate::deserialize(&mut small, &json!(i64::MAX)).unwrap_err();
        assert!(matches!(err, MetaError::OutOfRange { type_name: "i32", .. }));
        assert_eq!(small, 0, "failed write must not clobber the field");

        let mut unsigned = 0u32;
        let err = crate::deserialize(&mut unsigned, &json!(-1)).unwrap_err();
        assert!(matches!(err, MetaError::OutOfRange { type_name: "u32", .. }));

        crate::deserialize(&mut unsigned, &json!(7)).unwrap();
        assert_eq!(unsigned, 7);
    }

    #[test]
    fn floats_accept_integers() {
        let mut value = 0.0f32;
        crate::deserialize(&mut value, &json!(3)).unwrap();
        assert_eq!(value, 3.0);
    }

    #[test]
    fn wrong_shape_is_reported() {
        let mut flag = false;
        let err = crate::deserialize(&mut flag, &json!("yes")).unwrap_err();
        assert_eq!(err.to_string(), "expected a boolean, found a string");
    }

    #[test]
    fn strings_and_paths() {
        let mut name = String::from("old");
        crate::deserialize(&mut name, &json!("new")).unwrap();
        assert_eq!(name, "new");

        let mut path = PathBuf::new();
        crate::deserialize(&mut path, &json!("assets/player.json")).unwrap();
        assert_eq!(path, PathBuf::from("assets/player.json"));
        assert_eq!(crate::serialize(&path).unwrap(), json!("assets/player.json"));
    }

    #[test]
    fn non_finite_floats_serialize_as_null() {
        assert_eq!(crate::serialize(&f32::NAN).unwrap(), Value::Null);
    }
}
