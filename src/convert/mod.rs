//! Type conversion between wire values and native property types
//!
//! Wire values arrive as `serde_json::Value`. Conversion happens in two steps:
//!
//! 1. [`convert_scalar`] / [`convert_structured`] coerce the raw value into the
//!    canonical JSON form of the target [`PropertyType`] (`"12"` becomes `12`
//!    for an integer target, `"published"` becomes `"Published"` for an enum).
//! 2. The descriptor's typed setter decodes that canonical value into the
//!    native Rust type with serde ([`decode_into`]).
//!
//! The canonical value from step 1 is also what the binding session records
//! for the persistence layer.

pub mod scalar;
pub mod structured;

pub use scalar::convert_scalar;
pub use structured::{convert_structured, to_snake_case};

use crate::error::{BindError, Result};
use crate::registry::Resource;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Integer widths with their accepted ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntWidth::I8 => (i8::MIN as i128, i8::MAX as i128),
            IntWidth::I16 => (i16::MIN as i128, i16::MAX as i128),
            IntWidth::I32 => (i32::MIN as i128, i32::MAX as i128),
            IntWidth::I64 => (i64::MIN as i128, i64::MAX as i128),
            IntWidth::U8 => (0, u8::MAX as i128),
            IntWidth::U16 => (0, u16::MAX as i128),
            IntWidth::U32 => (0, u32::MAX as i128),
            IntWidth::U64 => (0, u64::MAX as i128),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::U8 => "u8",
            IntWidth::U16 => "u16",
            IntWidth::U32 => "u32",
            IntWidth::U64 => "u64",
        }
    }
}

/// Floating-point widths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    /// Largest finite magnitude the width can hold
    pub fn max(self) -> f64 {
        match self {
            FloatWidth::F32 => f64::from(f32::MAX),
            FloatWidth::F64 => f64::MAX,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FloatWidth::F32 => "f32",
            FloatWidth::F64 => "f64",
        }
    }
}

/// Declared type of a native property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    Bool,
    Int(IntWidth),
    Float(FloatWidth),
    String,
    /// Unit enum, listed by variant name
    Enum(&'static [&'static str]),
    /// Calendar date, canonical form `YYYY-MM-DD`
    Date,
    /// UTC timestamp, canonical form RFC 3339
    DateTime,
    /// Nested object or array decoded as a whole
    Structured,
    Nullable(Box<PropertyType>),
}

impl PropertyType {
    pub fn nullable(inner: PropertyType) -> Self {
        match inner {
            PropertyType::Nullable(_) => inner,
            other => PropertyType::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, PropertyType::Nullable(_))
    }

    /// Human-readable name used in conversion errors
    pub fn name(&self) -> String {
        match self {
            PropertyType::Bool => "bool".to_string(),
            PropertyType::Int(width) => width.name().to_string(),
            PropertyType::Float(width) => width.name().to_string(),
            PropertyType::String => "string".to_string(),
            PropertyType::Enum(variants) => format!("enum [{}]", variants.join(", ")),
            PropertyType::Date => "date".to_string(),
            PropertyType::DateTime => "date-time".to_string(),
            PropertyType::Structured => "structured value".to_string(),
            PropertyType::Nullable(inner) => format!("nullable {}", inner.name()),
        }
    }
}

/// Native types that know their own [`PropertyType`]
///
/// Enums and user-defined structs register through `Attr::with_type` instead.
pub trait Property: DeserializeOwned {
    fn property_type() -> PropertyType;
}

macro_rules! impl_int_property {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl Property for $ty {
                fn property_type() -> PropertyType {
                    PropertyType::Int(IntWidth::$width)
                }
            }
        )*
    };
}

impl_int_property!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
);

impl Property for bool {
    fn property_type() -> PropertyType {
        PropertyType::Bool
    }
}

impl Property for f32 {
    fn property_type() -> PropertyType {
        PropertyType::Float(FloatWidth::F32)
    }
}

impl Property for f64 {
    fn property_type() -> PropertyType {
        PropertyType::Float(FloatWidth::F64)
    }
}

impl Property for String {
    fn property_type() -> PropertyType {
        PropertyType::String
    }
}

impl Property for NaiveDate {
    fn property_type() -> PropertyType {
        PropertyType::Date
    }
}

impl Property for DateTime<Utc> {
    fn property_type() -> PropertyType {
        PropertyType::DateTime
    }
}

impl Property for Value {
    fn property_type() -> PropertyType {
        PropertyType::Structured
    }
}

impl<T: DeserializeOwned> Property for Vec<T> {
    fn property_type() -> PropertyType {
        PropertyType::Structured
    }
}

impl<T: DeserializeOwned> Property for BTreeMap<String, T> {
    fn property_type() -> PropertyType {
        PropertyType::Structured
    }
}

impl<T: DeserializeOwned> Property for HashMap<String, T> {
    fn property_type() -> PropertyType {
        PropertyType::Structured
    }
}

impl<T: Property> Property for Option<T> {
    fn property_type() -> PropertyType {
        PropertyType::nullable(T::property_type())
    }
}

/// Typed decode of a canonical value into the native property type
pub fn decode_into<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value)
        .map_err(|e| BindError::conversion_with(value, std::any::type_name::<T>(), e))
}

/// Recover the native type behind a boxed resource
pub fn downcast<T: Resource>(resource: Box<dyn Resource>) -> Result<T> {
    let found = resource.native_name();
    resource
        .into_any()
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| BindError::TypeConversionFailed {
            raw: found.to_string(),
            target: std::any::type_name::<T>().to_string(),
            source: None,
        })
}

/// Borrow the native type behind a resource for mutation
pub fn downcast_mut<T: Resource>(resource: &mut dyn Resource) -> Result<&mut T> {
    let found = resource.native_name();
    resource
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or_else(|| BindError::TypeConversionFailed {
            raw: found.to_string(),
            target: std::any::type_name::<T>().to_string(),
            source: None,
        })
}

/// Materialize a native collection from resolved related entities, in order
pub fn convert_collection<C>(related: impl IntoIterator<Item = Box<dyn Resource>>) -> Result<C>
where
    C: IntoIterator + FromIterator<<C as IntoIterator>::Item>,
    <C as IntoIterator>::Item: Resource,
{
    related.into_iter().map(downcast::<C::Item>).collect()
}
