//! Maps, written as `entry` elements holding a `key` and a `value`.

use xbind_core::QName;
use xbind_xml::{CursorEvent, XmlCursor, XmlSink};

use super::{Property, is_nil, write_nil};
use crate::error::{BindError, BindResult};
use crate::session::{ReadContext, WriteContext};
use crate::value::Value;

fn child(name: &QName, local: &str) -> QName {
    QName::with_namespace(name.namespace(), local)
}

pub(super) fn write(
    key: &Property,
    value: &Property,
    ctx: &mut WriteContext<'_>,
    sink: &mut dyn XmlSink,
    map: &Value,
    name: &QName,
) -> BindResult<()> {
    let entries = match map {
        Value::Map(entries) => entries,
        other => {
            return Err(BindError::Marshal(format!(
                "expected a map for {name}, found {}",
                other.kind_name()
            )));
        }
    };
    let (entry_name, key_name, value_name) =
        (child(name, "entry"), child(name, "key"), child(name, "value"));

    sink.start_element(name)?;
    for (k, v) in entries {
        sink.start_element(&entry_name)?;
        key.write_element(ctx, sink, k, &key_name)?;
        if v.is_null() {
            write_nil(sink, &value_name)?;
        } else {
            value.write_element(ctx, sink, v, &value_name)?;
        }
        sink.end_element()?;
    }
    sink.end_element()?;
    Ok(())
}

pub(super) fn read(
    key: &Property,
    value: &Property,
    ctx: &mut ReadContext<'_>,
    cursor: &mut dyn XmlCursor,
) -> BindResult<Value> {
    let mut entries = Vec::new();
    cursor.next_tag()?;
    while cursor.event() == CursorEvent::StartElement {
        if cursor.require_start()?.local_part() != "entry" {
            cursor.skip_element()?;
            continue;
        }
        cursor.next_tag()?;
        let (mut k, mut v) = (Value::Null, Value::Null);
        while cursor.event() == CursorEvent::StartElement {
            let part = cursor.require_start()?;
            match part.local_part() {
                _ if is_nil(cursor) => cursor.skip_element()?,
                "key" => k = key.read_element(ctx, cursor, Value::Null)?,
                "value" => v = value.read_element(ctx, cursor, Value::Null)?,
                _ => cursor.skip_element()?,
            }
        }
        cursor.next_tag()?;
        entries.push((k, v));
    }
    cursor.next_tag()?;
    Ok(Value::Map(entries))
}
