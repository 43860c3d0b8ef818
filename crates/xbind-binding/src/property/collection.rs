//! Arrays, lists and collections, element-per-item or as one text value.

use xbind_core::{DatatypeConverter, NamespaceContext, QName};
use xbind_xml::{CursorEvent, XmlCursor, XmlSink};

use super::{Property, is_nil, write_nil};
use crate::error::{BindError, BindResult};
use crate::session::{ReadContext, WriteContext};
use crate::value::Value;

fn items<'v>(value: &'v Value, name: &QName) -> BindResult<&'v [Value]> {
    match value {
        Value::List(items) => Ok(items),
        Value::Null => Ok(&[]),
        other => Err(BindError::Marshal(format!(
            "expected a sequence for {name}, found {}",
            other.kind_name()
        ))),
    }
}

pub(super) fn write_repeated(
    item: &Property,
    ctx: &mut WriteContext<'_>,
    sink: &mut dyn XmlSink,
    value: &Value,
    name: &QName,
) -> BindResult<()> {
    for v in items(value, name)? {
        if v.is_null() {
            write_nil(sink, name)?;
        } else {
            item.write_element(ctx, sink, v, name)?;
        }
    }
    Ok(())
}

/// Read every consecutive sibling named like the current element and
/// append the items to `current`.
pub(super) fn read_repeated(
    item: &Property,
    ctx: &mut ReadContext<'_>,
    cursor: &mut dyn XmlCursor,
    current: Value,
) -> BindResult<Value> {
    let mut values = match current {
        Value::List(values) => values,
        _ => Vec::new(),
    };
    let name = cursor.require_start()?;
    while cursor.event() == CursorEvent::StartElement && cursor.name() == Some(&name) {
        if is_nil(cursor) {
            cursor.skip_element()?;
            values.push(Value::Null);
        } else {
            values.push(item.read_element(ctx, cursor, Value::Null)?);
        }
    }
    Ok(Value::List(values))
}

pub(super) fn print_list(
    item: &Property,
    conv: DatatypeConverter,
    sink: &mut dyn XmlSink,
    value: &Value,
) -> BindResult<String> {
    let mut out = Vec::new();
    for v in items(value, &QName::local("list"))? {
        out.push(item.print_text(conv, sink, v)?);
    }
    Ok(out.join(" "))
}

pub(super) fn parse_list(
    item: &Property,
    conv: DatatypeConverter,
    text: &str,
    namespaces: &dyn NamespaceContext,
) -> BindResult<Value> {
    text.split_whitespace()
        .map(|token| item.parse_text(conv, token, namespaces))
        .collect::<BindResult<Vec<_>>>()
        .map(Value::List)
}
