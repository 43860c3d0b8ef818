//! Dynamic values exchanged between Rust types and skeletons.
//!
//! Skeletons never see user types. [`XmlBind::to_value`] lowers a Rust
//! value into a [`Value`] tree, and [`XmlBind::from_value`] lifts one back.
//! Structures lower to an [`Object`], which carries an [`ObjectId`] so the
//! binder can associate it with a DOM node across rewrites.
//!
//! [`XmlBind::to_value`]: crate::XmlBind::to_value
//! [`XmlBind::from_value`]: crate::XmlBind::from_value

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use url::Url;
use uuid::Uuid;
use xbind_core::{DataHandle, HexBinary, QName, XmlDuration};
use xbind_xml::DynamicElement;

use crate::bind::XmlBind;
use crate::descriptor::{TypeDescriptor, TypeFn, TypeKey};
use crate::error::{BindError, BindResult};

/// A bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or nil.
    Null,
    /// `xs:boolean`
    Boolean(bool),
    /// `xs:byte`
    Byte(i8),
    /// `xs:short`
    Short(i16),
    /// `xs:int`
    Int(i32),
    /// `xs:long`
    Long(i64),
    /// `xs:unsignedByte`
    UnsignedByte(u8),
    /// `xs:unsignedShort`
    UnsignedShort(u16),
    /// `xs:unsignedInt`
    UnsignedInt(u32),
    /// `xs:unsignedLong`
    UnsignedLong(u64),
    /// `xs:float`
    Float(f32),
    /// `xs:double`
    Double(f64),
    /// A single character.
    Char(char),
    /// `xs:string`
    String(String),
    /// `xs:decimal`
    Decimal(BigDecimal),
    /// `xs:integer`
    Integer(BigInt),
    /// `xs:dateTime`, normalized to UTC.
    DateTime(DateTime<Utc>),
    /// `xs:date`
    Date(NaiveDate),
    /// `xs:time`
    Time(NaiveTime),
    /// `xs:duration`
    Duration(XmlDuration),
    /// `xs:base64Binary`
    Binary(Bytes),
    /// `xs:hexBinary`
    HexBinary(HexBinary),
    /// `xs:anyURI`
    Uri(Url),
    /// A UUID.
    Uuid(Uuid),
    /// `xs:QName`
    QName(QName),
    /// A binary payload with content type.
    DataHandle(DataHandle),
    /// The lexical form of an enumeration constant.
    Enum(String),
    /// Items of an array, list or collection.
    List(Vec<Value>),
    /// Map entries in iteration order.
    Map(Vec<(Value, Value)>),
    /// An instance of a bound structure.
    Object(Object),
    /// A value wrapped with an explicit element name.
    Named(Box<NamedValue>),
    /// An untyped element tree.
    Dynamic(DynamicElement),
}

impl Value {
    /// A short name of the variant, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::UnsignedByte(_) => "unsignedByte",
            Self::UnsignedShort(_) => "unsignedShort",
            Self::UnsignedInt(_) => "unsignedInt",
            Self::UnsignedLong(_) => "unsignedLong",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Decimal(_) => "decimal",
            Self::Integer(_) => "integer",
            Self::DateTime(_) => "dateTime",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Duration(_) => "duration",
            Self::Binary(_) => "base64Binary",
            Self::HexBinary(_) => "hexBinary",
            Self::Uri(_) => "anyURI",
            Self::Uuid(_) => "uuid",
            Self::QName(_) => "QName",
            Self::DataHandle(_) => "dataHandle",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Named(_) => "named value",
            Self::Dynamic(_) => "element",
        }
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The identity of the object this value denotes, looking through a
    /// [`NamedValue`] wrapper.
    #[must_use]
    pub fn identity(&self) -> Option<ObjectId> {
        match self {
            Self::Object(o) => Some(o.id()),
            Self::Named(n) => n.value.identity(),
            _ => None,
        }
    }

    /// Unwrap an object, looking through a [`NamedValue`] wrapper.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Unmarshal`] for any other variant.
    pub fn into_object(self) -> BindResult<Object> {
        match self {
            Self::Object(o) => Ok(o),
            Self::Named(n) => n.value.into_object(),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<NamedValue> for Value {
    fn from(named: NamedValue) -> Self {
        Self::Named(Box::new(named))
    }
}

pub(crate) fn mismatch(expected: &str, found: &Value) -> BindError {
    BindError::Unmarshal(format!("expected {expected}, found {}", found.kind_name()))
}

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`Object`]. Clones share it; every new object gets a
/// fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An instance of a bound structure: its type and named field values.
///
/// Equality compares type and fields, not identity.
#[derive(Debug, Clone)]
pub struct Object {
    id: ObjectId,
    key: TypeKey,
    describe: TypeFn,
    fields: BTreeMap<String, Value>,
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.fields == other.fields
    }
}

impl Object {
    /// An empty instance of `T`.
    #[must_use]
    pub fn of<T: XmlBind>() -> Self {
        Self::with_type(TypeKey::of::<T>(), T::describe)
    }

    /// An empty instance of the type described by `describe`.
    #[must_use]
    pub fn with_type(key: TypeKey, describe: TypeFn) -> Self {
        Self {
            id: ObjectId::next(),
            key,
            describe,
            fields: BTreeMap::new(),
        }
    }

    /// This object's identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The runtime type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The runtime type's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> TypeDescriptor {
        (self.describe)()
    }

    pub(crate) fn describe_fn(&self) -> TypeFn {
        self.describe
    }

    /// Set a field, builder style.
    #[must_use]
    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field.
    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_owned(), value);
    }

    /// Borrow a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Remove a field, yielding [`Value::Null`] when it is absent.
    pub fn remove(&mut self, field: &str) -> Value {
        self.fields.remove(field).unwrap_or(Value::Null)
    }

    /// Remove a field and convert it.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of `T::from_value`.
    pub fn take<T: XmlBind>(&mut self, field: &str) -> BindResult<T> {
        T::from_value(self.remove(field))
            .map_err(|e| BindError::Unmarshal(format!("field '{field}' of {}: {e}", self.key)))
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A value paired with the element name it is written as.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// The element name.
    pub name: QName,
    /// The content.
    pub value: Value,
}

impl NamedValue {
    /// Pair a value with an element name.
    #[must_use]
    pub fn new(name: QName, value: Value) -> Self {
        Self { name, value }
    }
}

/// A typed value paired with the element name it is written as.
#[derive(Debug, Clone, PartialEq)]
pub struct Named<T> {
    /// The element name.
    pub name: QName,
    /// The content.
    pub value: T,
}

impl<T: XmlBind> Named<T> {
    /// Pair a value with an element name.
    #[must_use]
    pub fn new(name: QName, value: T) -> Self {
        Self { name, value }
    }

    /// Lower to a [`Value::Named`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        NamedValue::new(self.name.clone(), self.value.to_value()).into()
    }

    /// Lift a [`NamedValue`].
    ///
    /// # Errors
    ///
    /// Returns the conversion error of `T::from_value`.
    pub fn from_named(named: NamedValue) -> BindResult<Self> {
        Ok(Self {
            name: named.name,
            value: T::from_value(named.value)?,
        })
    }
}

/// A list whose items are not typed statically. Items unmarshal as
/// registered objects when their element is a known root, and as
/// [`Value::Dynamic`] trees otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UntypedList(pub Vec<Value>);

/// Attributes of an element that no declared attribute property claims,
/// in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnyAttributes(pub Vec<(QName, String)>);

impl AnyAttributes {
    /// The value of an attribute by name.
    #[must_use]
    pub fn get(&self, name: &QName) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
