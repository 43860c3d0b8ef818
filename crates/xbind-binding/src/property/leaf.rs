//! Built-in simple types.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use url::Url;
use uuid::Uuid;
use xbind_core::{
    DataHandle, DatatypeConverter, HexBinary, NamespaceContext, QName, XML_MIME_NS, XmlDuration,
};
use xbind_xml::{XmlCursor, XmlSink};

use crate::descriptor::LeafKind;
use crate::error::{BindError, BindResult};
use crate::value::Value;

static LEAF_TYPES: LazyLock<HashMap<TypeId, LeafKind>> = LazyLock::new(|| {
    HashMap::from([
        (TypeId::of::<bool>(), LeafKind::Boolean),
        (TypeId::of::<i8>(), LeafKind::Byte),
        (TypeId::of::<i16>(), LeafKind::Short),
        (TypeId::of::<i32>(), LeafKind::Int),
        (TypeId::of::<i64>(), LeafKind::Long),
        (TypeId::of::<u8>(), LeafKind::UnsignedByte),
        (TypeId::of::<u16>(), LeafKind::UnsignedShort),
        (TypeId::of::<u32>(), LeafKind::UnsignedInt),
        (TypeId::of::<u64>(), LeafKind::UnsignedLong),
        (TypeId::of::<f32>(), LeafKind::Float),
        (TypeId::of::<f64>(), LeafKind::Double),
        (TypeId::of::<char>(), LeafKind::Char),
        (TypeId::of::<String>(), LeafKind::String),
        (TypeId::of::<BigDecimal>(), LeafKind::Decimal),
        (TypeId::of::<BigInt>(), LeafKind::Integer),
        (TypeId::of::<DateTime<Utc>>(), LeafKind::DateTime),
        (TypeId::of::<NaiveDate>(), LeafKind::Date),
        (TypeId::of::<NaiveTime>(), LeafKind::Time),
        (TypeId::of::<XmlDuration>(), LeafKind::Duration),
        (TypeId::of::<Bytes>(), LeafKind::Base64Binary),
        (TypeId::of::<HexBinary>(), LeafKind::HexBinary),
        (TypeId::of::<Url>(), LeafKind::AnyUri),
        (TypeId::of::<Uuid>(), LeafKind::Uuid),
        (TypeId::of::<QName>(), LeafKind::QName),
        (TypeId::of::<DataHandle>(), LeafKind::DataHandle),
    ])
});

/// The leaf kind of a built-in type, if it is one.
pub(crate) fn builtin_kind(id: TypeId) -> Option<LeafKind> {
    LEAF_TYPES.get(&id).copied()
}

/// The leaf kind a runtime value would be written as.
pub(crate) fn kind_of(value: &Value) -> Option<LeafKind> {
    Some(match value {
        Value::Boolean(_) => LeafKind::Boolean,
        Value::Byte(_) => LeafKind::Byte,
        Value::Short(_) => LeafKind::Short,
        Value::Int(_) => LeafKind::Int,
        Value::Long(_) => LeafKind::Long,
        Value::UnsignedByte(_) => LeafKind::UnsignedByte,
        Value::UnsignedShort(_) => LeafKind::UnsignedShort,
        Value::UnsignedInt(_) => LeafKind::UnsignedInt,
        Value::UnsignedLong(_) => LeafKind::UnsignedLong,
        Value::Float(_) => LeafKind::Float,
        Value::Double(_) => LeafKind::Double,
        Value::Char(_) => LeafKind::Char,
        Value::String(_) | Value::Enum(_) => LeafKind::String,
        Value::Decimal(_) => LeafKind::Decimal,
        Value::Integer(_) => LeafKind::Integer,
        Value::DateTime(_) => LeafKind::DateTime,
        Value::Date(_) => LeafKind::Date,
        Value::Time(_) => LeafKind::Time,
        Value::Duration(_) => LeafKind::Duration,
        Value::Binary(_) => LeafKind::Base64Binary,
        Value::HexBinary(_) => LeafKind::HexBinary,
        Value::Uri(_) => LeafKind::AnyUri,
        Value::Uuid(_) => LeafKind::Uuid,
        Value::QName(_) => LeafKind::QName,
        Value::DataHandle(_) => LeafKind::DataHandle,
        Value::Null
        | Value::List(_)
        | Value::Map(_)
        | Value::Object(_)
        | Value::Named(_)
        | Value::Dynamic(_) => return None,
    })
}

/// A simple-typed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafProperty {
    /// The datatype.
    pub kind: LeafKind,
    /// Expected content type for binary payloads.
    pub mime_type: Option<String>,
}

impl LeafProperty {
    /// Create a leaf property.
    #[must_use]
    pub fn new(kind: LeafKind, mime_type: Option<&str>) -> Self {
        Self {
            kind,
            mime_type: mime_type.map(str::to_owned),
        }
    }

    pub(crate) fn write_element(
        &self,
        conv: DatatypeConverter,
        sink: &mut dyn XmlSink,
        value: &Value,
        name: &QName,
    ) -> BindResult<()> {
        sink.start_element(name)?;
        if let Value::DataHandle(handle) = value {
            if let Some(content_type) = &handle.content_type {
                sink.attribute(&content_type_name(), content_type)?;
            }
        }
        let text = print(self.kind, conv, sink, value)?;
        sink.text(&text)?;
        sink.end_element()?;
        Ok(())
    }

    pub(crate) fn read_element(
        &self,
        conv: DatatypeConverter,
        cursor: &mut dyn XmlCursor,
    ) -> BindResult<Value> {
        match self.kind {
            LeafKind::QName => {
                let scope = cursor.namespace_snapshot();
                let text = cursor.element_text()?;
                parse(self.kind, conv, &text, &scope)
            }
            LeafKind::DataHandle => {
                let content_type = cursor
                    .attribute(&content_type_name())
                    .map(str::to_owned)
                    .or_else(|| self.mime_type.clone());
                let text = cursor.element_text()?;
                let data = conv.parse_base64_binary(&text)?;
                Ok(Value::DataHandle(DataHandle::new(content_type.as_deref(), data)))
            }
            kind => {
                let text = cursor.element_text()?;
                parse(kind, conv, &text, cursor.namespaces())
            }
        }
    }
}

fn content_type_name() -> QName {
    QName::new(XML_MIME_NS, "contentType").with_prefix("xmime")
}

/// Parse the lexical form of a leaf.
pub(crate) fn parse(
    kind: LeafKind,
    conv: DatatypeConverter,
    text: &str,
    namespaces: &dyn NamespaceContext,
) -> BindResult<Value> {
    Ok(match kind {
        LeafKind::Boolean => Value::Boolean(conv.parse_boolean(text)?),
        LeafKind::Byte => Value::Byte(conv.parse_byte(text)?),
        LeafKind::Short => Value::Short(conv.parse_short(text)?),
        LeafKind::Int => Value::Int(conv.parse_int(text)?),
        LeafKind::Long => Value::Long(conv.parse_long(text)?),
        LeafKind::UnsignedByte => Value::UnsignedByte(conv.parse_unsigned_byte(text)?),
        LeafKind::UnsignedShort => Value::UnsignedShort(conv.parse_unsigned_short(text)?),
        LeafKind::UnsignedInt => Value::UnsignedInt(conv.parse_unsigned_int(text)?),
        LeafKind::UnsignedLong => Value::UnsignedLong(conv.parse_unsigned_long(text)?),
        LeafKind::Float => Value::Float(conv.parse_float(text)?),
        LeafKind::Double => Value::Double(conv.parse_double(text)?),
        LeafKind::Char => Value::Char(conv.parse_char(text)?),
        LeafKind::String => Value::String(conv.parse_string(text)),
        LeafKind::Decimal => Value::Decimal(conv.parse_decimal(text)?),
        LeafKind::Integer => Value::Integer(conv.parse_integer(text)?),
        LeafKind::DateTime => Value::DateTime(conv.parse_date_time(text)?),
        LeafKind::Date => Value::Date(conv.parse_date(text)?),
        LeafKind::Time => Value::Time(conv.parse_time(text)?),
        LeafKind::Duration => Value::Duration(conv.parse_duration(text)?),
        LeafKind::Base64Binary => Value::Binary(Bytes::from(conv.parse_base64_binary(text)?)),
        LeafKind::HexBinary => Value::HexBinary(HexBinary(conv.parse_hex_binary(text)?)),
        LeafKind::AnyUri => Value::Uri(conv.parse_any_uri(text)?),
        LeafKind::Uuid => Value::Uuid(conv.parse_uuid(text)?),
        LeafKind::QName => Value::QName(conv.parse_qname(text, namespaces)?),
        LeafKind::DataHandle => {
            Value::DataHandle(DataHandle::new(None, conv.parse_base64_binary(text)?))
        }
    })
}

/// Print the lexical form of a leaf. `QName` values get their namespace
/// bound on the open element first.
pub(crate) fn print(
    kind: LeafKind,
    conv: DatatypeConverter,
    sink: &mut dyn XmlSink,
    value: &Value,
) -> BindResult<String> {
    Ok(match (kind, value) {
        (LeafKind::Boolean, Value::Boolean(v)) => conv.print_boolean(*v),
        (LeafKind::Byte, Value::Byte(v)) => conv.print_byte(*v),
        (LeafKind::Short, Value::Short(v)) => conv.print_short(*v),
        (LeafKind::Int, Value::Int(v)) => conv.print_int(*v),
        (LeafKind::Long, Value::Long(v)) => conv.print_long(*v),
        (LeafKind::UnsignedByte, Value::UnsignedByte(v)) => conv.print_unsigned_byte(*v),
        (LeafKind::UnsignedShort, Value::UnsignedShort(v)) => conv.print_unsigned_short(*v),
        (LeafKind::UnsignedInt, Value::UnsignedInt(v)) => conv.print_unsigned_int(*v),
        (LeafKind::UnsignedLong, Value::UnsignedLong(v)) => conv.print_unsigned_long(*v),
        (LeafKind::Float, Value::Float(v)) => conv.print_float(*v),
        (LeafKind::Double, Value::Double(v)) => conv.print_double(*v),
        (LeafKind::Char, Value::Char(v)) => conv.print_char(*v),
        (LeafKind::String, Value::String(v) | Value::Enum(v)) => conv.print_string(v),
        (LeafKind::Decimal, Value::Decimal(v)) => conv.print_decimal(v),
        (LeafKind::Integer, Value::Integer(v)) => conv.print_integer(v),
        (LeafKind::DateTime, Value::DateTime(v)) => conv.print_date_time(v),
        (LeafKind::Date, Value::Date(v)) => conv.print_date(v),
        (LeafKind::Time, Value::Time(v)) => conv.print_time(v),
        (LeafKind::Duration, Value::Duration(v)) => conv.print_duration(v),
        (LeafKind::Base64Binary, Value::Binary(v)) => conv.print_base64_binary(v),
        (LeafKind::HexBinary, Value::HexBinary(v)) => conv.print_hex_binary(v.as_bytes()),
        (LeafKind::AnyUri, Value::Uri(v)) => conv.print_any_uri(v),
        (LeafKind::Uuid, Value::Uuid(v)) => conv.print_uuid(v),
        (LeafKind::QName, Value::QName(v)) => print_qname(sink, v)?,
        (LeafKind::DataHandle, Value::DataHandle(v)) => conv.print_base64_binary(&v.data),
        (kind, other) => {
            return Err(BindError::Marshal(format!(
                "expected {} value, found {}",
                kind.schema_name(),
                other.kind_name()
            )));
        }
    })
}

/// Print a `QName`, declaring its namespace on the open element when no
/// usable prefix is in scope.
pub(crate) fn print_qname(sink: &mut dyn XmlSink, name: &QName) -> BindResult<String> {
    let Some(ns) = name.namespace() else {
        return Ok(name.local_part().to_owned());
    };
    let in_scope = sink
        .namespaces()
        .prefix(ns)
        .filter(|p| name.prefix().is_none_or(|wanted| wanted == *p))
        .map(str::to_owned);
    let prefix = match in_scope {
        Some(p) => p,
        None => sink.bind_namespace(name.prefix(), ns)?,
    };
    if prefix.is_empty() {
        Ok(name.local_part().to_owned())
    } else {
        Ok(format!("{prefix}:{}", name.local_part()))
    }
}
