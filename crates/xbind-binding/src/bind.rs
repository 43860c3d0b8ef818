//! The [`XmlBind`] trait and its implementations for built-in types.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use url::Url;
use uuid::Uuid;
use xbind_core::{DataHandle, HexBinary, QName, XmlDuration};
use xbind_xml::DynamicElement;

use crate::descriptor::{LeafKind, Shape, TypeDescriptor, TypeKey};
use crate::error::{BindError, BindResult};
use crate::value::{AnyAttributes, UntypedList, Value, mismatch};

/// A Rust type that can be bound to XML.
///
/// Implementations describe the type once and convert instances to and
/// from the dynamic [`Value`] model the skeletons operate on. Structures
/// lower to [`Value::Object`]:
///
/// ```
/// use xbind_binding::{BindResult, Object, TypeDescriptor, Value, XmlBind};
///
/// #[derive(Debug, Default)]
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// impl XmlBind for Person {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::structure::<Self>()
///             .namespace("urn:example")
///             .root_element("person")
///             .element::<String>("name")
///             .element::<i32>("age")
///             .build()
///     }
///
///     fn to_value(&self) -> Value {
///         Object::of::<Self>()
///             .with("name", self.name.to_value())
///             .with("age", self.age.to_value())
///             .into()
///     }
///
///     fn from_value(value: Value) -> BindResult<Self> {
///         let mut object = value.into_object()?;
///         Ok(Self {
///             name: object.take("name")?,
///             age: object.take("age")?,
///         })
///     }
/// }
/// ```
pub trait XmlBind: Sized + 'static {
    /// Describe the type.
    fn describe() -> TypeDescriptor;

    /// Lower an instance.
    fn to_value(&self) -> Value;

    /// Lift an instance.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Unmarshal`] if the value has the wrong shape.
    fn from_value(value: Value) -> BindResult<Self>;
}

fn copied<T: Copy>(v: &T) -> T {
    *v
}

macro_rules! impl_leaf {
    (copy $ty:ty => $variant:ident, $kind:ident) => {
        impl_leaf!(@impl $ty, $variant, $kind, copied, Ok(<$ty>::default()));
    };
    (clone $ty:ty => $variant:ident, $kind:ident) => {
        impl_leaf!(@impl $ty, $variant, $kind, Clone::clone, Ok(<$ty>::default()));
    };
    (required $ty:ty => $variant:ident, $kind:ident) => {
        impl_leaf!(
            @impl $ty, $variant, $kind, Clone::clone,
            Err(BindError::Unmarshal(format!("missing {} value", LeafKind::$kind.schema_name())))
        );
    };
    (@impl $ty:ty, $variant:ident, $kind:ident, $lower:path, $absent:expr) => {
        impl XmlBind for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::leaf::<Self>(LeafKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::$variant($lower(self))
            }

            fn from_value(value: Value) -> BindResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    Value::Null => $absent,
                    other => Err(mismatch(LeafKind::$kind.schema_name(), &other)),
                }
            }
        }
    };
}

impl_leaf!(copy bool => Boolean, Boolean);
impl_leaf!(copy i8 => Byte, Byte);
impl_leaf!(copy i16 => Short, Short);
impl_leaf!(copy i32 => Int, Int);
impl_leaf!(copy i64 => Long, Long);
impl_leaf!(copy u8 => UnsignedByte, UnsignedByte);
impl_leaf!(copy u16 => UnsignedShort, UnsignedShort);
impl_leaf!(copy u32 => UnsignedInt, UnsignedInt);
impl_leaf!(copy u64 => UnsignedLong, UnsignedLong);
impl_leaf!(copy f32 => Float, Float);
impl_leaf!(copy f64 => Double, Double);
impl_leaf!(copy char => Char, Char);
impl_leaf!(clone String => String, String);
impl_leaf!(clone BigDecimal => Decimal, Decimal);
impl_leaf!(clone BigInt => Integer, Integer);
impl_leaf!(copy DateTime<Utc> => DateTime, DateTime);
impl_leaf!(copy NaiveDate => Date, Date);
impl_leaf!(copy NaiveTime => Time, Time);
impl_leaf!(copy XmlDuration => Duration, Duration);
impl_leaf!(clone Bytes => Binary, Base64Binary);
impl_leaf!(clone HexBinary => HexBinary, HexBinary);
impl_leaf!(required Url => Uri, AnyUri);
impl_leaf!(copy Uuid => Uuid, Uuid);
impl_leaf!(clone QName => QName, QName);
impl_leaf!(clone DataHandle => DataHandle, DataHandle);

impl<T: XmlBind> XmlBind for Option<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, XmlBind::to_value)
    }

    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

impl<T: XmlBind> XmlBind for Box<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }

    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        T::from_value(value).map(Box::new)
    }
}

fn list_items(value: Value) -> BindResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(mismatch("list", &other)),
    }
}

fn map_entries(value: Value) -> BindResult<Vec<(Value, Value)>> {
    match value {
        Value::Map(entries) => Ok(entries),
        Value::Null => Ok(Vec::new()),
        other => Err(mismatch("map", &other)),
    }
}

impl<T: XmlBind> XmlBind for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::List(Some(T::describe)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(XmlBind::to_value).collect())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        list_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<T: XmlBind, const N: usize> XmlBind for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Array(T::describe),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(XmlBind::to_value).collect())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        let items = list_items(value)?
            .into_iter()
            .map(T::from_value)
            .collect::<BindResult<Vec<T>>>()?;
        <[T; N]>::try_from(items).map_err(|items| {
            BindError::Unmarshal(format!("expected {N} items, found {}", items.len()))
        })
    }
}

impl<T: XmlBind + Ord> XmlBind for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Collection(Some(T::describe)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(XmlBind::to_value).collect())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        list_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<T: XmlBind + Eq + Hash> XmlBind for HashSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Collection(Some(T::describe)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(XmlBind::to_value).collect())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        list_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<K: XmlBind + Ord, V: XmlBind> XmlBind for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Map(vec![K::describe, V::describe]),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K: XmlBind + Eq + Hash, V: XmlBind> XmlBind for HashMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Map(vec![K::describe, V::describe]),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl XmlBind for UntypedList {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::List(None),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.0.clone())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        list_items(value).map(Self)
    }
}

impl XmlBind for AnyAttributes {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Map(vec![QName::describe, String::describe]),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.0
                .iter()
                .map(|(name, text)| (Value::QName(name.clone()), Value::String(text.clone())))
                .collect(),
        )
    }

    fn from_value(value: Value) -> BindResult<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(name, text)| Ok((QName::from_value(name)?, String::from_value(text)?)))
            .collect::<BindResult<Vec<_>>>()
            .map(Self)
    }
}

impl XmlBind for Value {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Any,
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> BindResult<Self> {
        Ok(value)
    }
}

impl XmlBind for DynamicElement {
    fn describe() -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::of::<Self>(),
            shape: Shape::Any,
        }
    }

    fn to_value(&self) -> Value {
        Value::Dynamic(self.clone())
    }

    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Dynamic(e) => Ok(e),
            other => Err(mismatch("element", &other)),
        }
    }
}

/// Implement [`XmlBind`] for a fieldless enum, mapping each variant to its
/// lexical constant.
///
/// ```
/// use xbind_binding::{Value, XmlBind, bind_enum};
///
/// #[derive(Debug, PartialEq)]
/// enum Color {
///     Red,
///     Green,
/// }
///
/// bind_enum!(Color { Red => "RED", Green => "GREEN" });
///
/// assert_eq!(Color::Green.to_value(), Value::Enum("GREEN".to_owned()));
/// ```
#[macro_export]
macro_rules! bind_enum {
    ($ty:ident { $($variant:ident => $lexical:literal),+ $(,)? }) => {
        impl $crate::XmlBind for $ty {
            fn describe() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::enumeration::<Self>(&[$($lexical),+])
            }

            fn to_value(&self) -> $crate::Value {
                match self {
                    $(Self::$variant => $crate::Value::Enum($lexical.to_owned()),)+
                }
            }

            fn from_value(value: $crate::Value) -> $crate::BindResult<Self> {
                match value {
                    $crate::Value::Enum(s) => match s.as_str() {
                        $($lexical => Ok(Self::$variant),)+
                        other => Err($crate::BindError::InvalidLexicalValue(
                            $crate::LexicalError::new(
                                "enum",
                                other,
                                concat!("not a constant of ", stringify!($ty)),
                            ),
                        )),
                    },
                    other => Err($crate::BindError::Unmarshal(format!(
                        "expected enum, found {}",
                        other.kind_name()
                    ))),
                }
            }
        }
    };
}
