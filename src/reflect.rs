//! Runtime type descriptors.
//!
//! Rust has no runtime reflection, so every convertible type describes itself
//! through [`Reflect`]. A descriptor carries the type's identity and its
//! `Kind`; composite kinds also carry the handful of monomorphic functions the
//! converters need to write into a destination they only see as `&mut dyn Any`.
//!
//! Element and field types are referenced through `fn() -> TypeDescriptor`
//! rather than by value, which is what lets a record mention itself.
use std::any::{Any, TypeId};
use indexmap::IndexMap;

use crate::value::Value;

pub type DescriptorFn = fn() -> TypeDescriptor;
pub type Access = fn(&mut dyn Any) -> &mut dyn Any;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub trait Reflect: Any + Default {
    fn descriptor() -> TypeDescriptor;
}

#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    /// Fully-qualified name; doubles as the compile cache key.
    pub name: &'static str,
    pub type_id: TypeId,
    pub kind: Kind,
}

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Scalar(ScalarKind),
    /// `Option<Box<T>>`
    Optional(OptionalShape),
    /// `Vec<T>`
    Sequence(SequenceShape),
    /// `IndexMap<String, T>`
    Map(MapShape),
    /// The source [`Value`] itself.
    Dynamic,
    Record(RecordShape),
    /// A type with no conversion strategy.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8, I16, I32, I64, Isize,
    U8, U16, U32, U64, Usize,
    F32, F64,
    Bool,
    String,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionalShape {
    pub elem: DescriptorFn,
    /// Make sure the slot holds a value and return it.
    pub fill: Access,
}

#[derive(Debug, Clone, Copy)]
pub struct SequenceShape {
    pub elem: DescriptorFn,
    /// Replace the contents with `len` default elements.
    pub reset: fn(&mut dyn Any, usize),
    pub index: fn(&mut dyn Any, usize) -> &mut dyn Any,
}

#[derive(Debug, Clone, Copy)]
pub struct MapShape {
    pub value: DescriptorFn,
    /// Slot for `key`, inserting a default value when absent.
    pub entry: fn(&mut dyn Any, String) -> &mut dyn Any,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordShape {
    pub fields: &'static [FieldDescriptor],
    pub new: fn() -> Box<dyn Any>,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Raw `map_to` annotation, empty when the field has none.
    pub annotation: &'static str,
    pub descriptor: DescriptorFn,
    pub access: Access,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeDescriptor {
    pub fn of<T: Any>(kind: Kind) -> Self {
        TypeDescriptor {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            kind,
        }
    }

    pub fn record<T: Reflect>(fields: &'static [FieldDescriptor]) -> Self {
        Self::of::<T>(Kind::Record(RecordShape { fields, new: new_boxed::<T> }))
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, Kind::Record(_))
    }
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
        }
    }
}

/// Borrow a destination slot as its concrete type.
///
/// A mismatch means the compiled plan disagrees with the value it is applied
/// to, which is a bug in the caller, not bad input.
pub fn downcast_slot<T: Any>(slot: &mut dyn Any) -> &mut T {
    match slot.downcast_mut::<T>() {
        Some(slot) => slot,
        None => panic!("destination is not a `{}`", std::any::type_name::<T>()),
    }
}

/// Same contract as [`downcast_slot`], for converters that only know the
/// destination's descriptor.
pub fn check_slot(slot: &dyn Any, expected: &TypeDescriptor) {
    if <dyn Any as Any>::type_id(slot) != expected.type_id {
        panic!("destination is not a `{}`", expected.name);
    }
}

fn new_boxed<T: Reflect>() -> Box<dyn Any> {
    Box::new(T::default())
}

// -------------------------------- Scalars --------------------------------- //

macro_rules! reflect_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::of::<$ty>(Kind::Scalar(ScalarKind::$kind))
                }
            }
        )*
    };
}

reflect_scalar! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize,
    f32 => F32, f64 => F64,
    bool => Bool,
    String => String,
}

impl Reflect for Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Value>(Kind::Dynamic)
    }
}

// ------------------------------- Containers ------------------------------- //

impl<T: Reflect> Reflect for Option<Box<T>> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(Kind::Optional(OptionalShape {
            elem: T::descriptor,
            fill: fill_optional::<T>,
        }))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(Kind::Sequence(SequenceShape {
            elem: T::descriptor,
            reset: reset_sequence::<T>,
            index: index_sequence::<T>,
        }))
    }
}

impl<T: Reflect> Reflect for IndexMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(Kind::Map(MapShape {
            value: T::descriptor,
            entry: map_entry::<T>,
        }))
    }
}

fn fill_optional<T: Reflect>(slot: &mut dyn Any) -> &mut dyn Any {
    let inner: &mut T = downcast_slot::<Option<Box<T>>>(slot).get_or_insert_with(Box::default);
    inner
}

fn reset_sequence<T: Reflect>(slot: &mut dyn Any, len: usize) {
    let items = downcast_slot::<Vec<T>>(slot);
    items.clear();
    items.resize_with(len, T::default);
}

fn index_sequence<T: Reflect>(slot: &mut dyn Any, index: usize) -> &mut dyn Any {
    &mut downcast_slot::<Vec<T>>(slot)[index]
}

fn map_entry<T: Reflect>(slot: &mut dyn Any, key: String) -> &mut dyn Any {
    downcast_slot::<IndexMap<String, T>>(slot).entry(key).or_default()
}

// --------------------------------- Records -------------------------------- //

/// Declare a struct and implement [`Reflect`] for it.
///
/// Fields take an optional `#[map_to = "..."]` annotation: `"key"`, `"key!"`
/// for a required key, or `"<-"` to embed. Fields without one are ignored by
/// conversion. Any other field attribute (doc comments, `#[serde(...)]`) is
/// kept on the field. The struct must implement `Default`.
///
/// ```
/// mapto::record! {
///     #[derive(Debug, Default)]
///     pub struct Info {
///         /// Schema version.
///         #[map_to = "version!"]
///         pub version: f64,
///         pub scratch: u32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::__record! {
            @field [$(#[$meta])* $vis struct $name] [] [] [] [] $($body)*
        }
    };
}

/// Field muncher behind [`record!`]. State: struct head, emitted fields,
/// field descriptors, then the pending field's kept attributes and tag.
#[doc(hidden)]
#[macro_export]
macro_rules! __record {
    (
        @field $head:tt [$($fields:tt)*] [$($descs:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        #[map_to = $t:literal] $($rest:tt)*
    ) => {
        $crate::__record! {
            @field $head [$($fields)*] [$($descs)*] [$($attrs)*] [$t] $($rest)*
        }
    };
    (
        @field $head:tt [$($fields:tt)*] [$($descs:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        #[$attr:meta] $($rest:tt)*
    ) => {
        $crate::__record! {
            @field $head [$($fields)*] [$($descs)*] [$($attrs)* #[$attr]] [$($tag)*] $($rest)*
        }
    };
    (
        @field $head:tt [$($fields:tt)*] [$($descs:tt)*] [$($attrs:tt)*] [$($tag:tt)*]
        $fvis:vis $field:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::__record! {
            @field $head
            [$($fields)* $($attrs)* $fvis $field : $ty,]
            [$($descs)* { $field, $ty, [$($tag)*] }]
            [] []
            $($($rest)*)?
        }
    };
    (
        @field [$(#[$meta:meta])* $vis:vis struct $name:ident]
        [$($fields:tt)*] [$({ $field:ident, $ty:ty, [$($tag:tt)*] })*] [] []
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fields)*
        }

        impl $crate::reflect::Reflect for $name {
            fn descriptor() -> $crate::reflect::TypeDescriptor {
                const FIELDS: &[$crate::reflect::FieldDescriptor] = &[
                    $(
                        $crate::reflect::FieldDescriptor {
                            name: ::core::stringify!($field),
                            annotation: $crate::__map_to!($($tag)*),
                            descriptor: <$ty as $crate::reflect::Reflect>::descriptor,
                            access: {
                                fn access(slot: &mut dyn ::core::any::Any) -> &mut dyn ::core::any::Any {
                                    &mut $crate::reflect::downcast_slot::<$name>(slot).$field
                                }
                                access
                            },
                        }
                    ),*
                ];
                $crate::reflect::TypeDescriptor::record::<$name>(FIELDS)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __map_to {
    () => { "" };
    ($tag:literal) => { $tag };
}

// ------------------------------- Tests ------------------------------------ //
