/// Declare the reflection descriptor for a struct.
///
/// Each entry maps a Rust field to the name it has in JSON. Field types are
/// inferred and must implement [`Reflect`](crate::Reflect). The struct must
/// implement `Default`, which backs [`MetaClass::create`](crate::MetaClass::create).
///
/// A single base class can be named after a colon; it must be a field of
/// the struct whose type is itself a reflected class.
///
/// ```
/// #[derive(Default)]
/// struct Named { name: String }
/// tessera_meta::reflect_class!(Named as "Named" { name => "Name" });
///
/// #[derive(Default)]
/// struct Door { named: Named, locked: bool }
/// tessera_meta::reflect_class!(Door as "Door" : named { locked => "Locked" });
///
/// let door = tessera_meta::get_meta_class::<Door>().unwrap();
/// assert_eq!(door.base().unwrap().class().name(), "Named");
/// assert!(door.find_field("Name").is_some());
/// ```
#[macro_export]
macro_rules! reflect_class {
    (
        $ty:ty as $name:literal $( : $base:ident )? {
            $( $field:ident => $field_name:literal ),* $(,)?
        }
    ) => {
        #[allow(unsafe_code)]
        impl $crate::Reflect for $ty {
            fn meta_type() -> &'static $crate::MetaType {
                static META: ::std::sync::OnceLock<$crate::MetaType> = ::std::sync::OnceLock::new();
                META.get_or_init(|| {
                    let builder = $crate::MetaClass::builder::<$ty>($name);
                    $(
                        // SAFETY: the offset comes from `offset_of!` on the
                        // field the accessor reads.
                        let builder = builder.base(unsafe {
                            $crate::__private::base::<$ty, _, _>(
                                ::core::mem::offset_of!($ty, $base),
                                |instance: &$ty| &instance.$base,
                            )
                        });
                    )?
                    $(
                        // SAFETY: the offset comes from `offset_of!` on the
                        // field the accessor reads.
                        let builder = builder.field(unsafe {
                            $crate::__private::field::<$ty, _, _>(
                                $field_name,
                                ::core::mem::offset_of!($ty, $field),
                                |instance: &$ty| &instance.$field,
                            )
                        });
                    )*
                    $crate::MetaType::class::<$ty>(builder.build())
                })
            }
        }
    };
}
