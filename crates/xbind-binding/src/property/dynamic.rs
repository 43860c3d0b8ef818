//! Untyped content.
//!
//! Writing dispatches on the runtime value: dynamic trees are copied
//! verbatim, objects go through their skeleton, and simple values carry an
//! `xsi:type` so they can be read back. Reading honors `xsi:type` for
//! built-in and registered types, resolves registered root elements when
//! lax, and otherwise captures the subtree.

use xbind_core::{QName, XML_SCHEMA_NS};
use xbind_xml::{XmlCursor, XmlSink};

use super::{is_nil, leaf, print_qname, xsi, xsi_type};
use crate::descriptor::LeafKind;
use crate::error::{BindError, BindResult};
use crate::session::{ReadContext, WriteContext};
use crate::value::Value;

pub(super) fn write(
    ctx: &mut WriteContext<'_>,
    sink: &mut dyn XmlSink,
    value: &Value,
    name: &QName,
) -> BindResult<()> {
    let registry = ctx.registry;
    match value {
        Value::Null => Ok(()),
        Value::Dynamic(element) => Ok(element.write_to(sink)?),
        Value::Named(named) => write(ctx, sink, &named.value, &named.name),
        Value::Object(object) => {
            let skeleton = registry
                .find_skeleton_for_type(object.key(), object.describe_fn())
                .ok_or_else(|| {
                    BindError::Marshal(format!("no binding registered for {}", object.key()))
                })?;
            match skeleton.element_name() {
                Some(root) => skeleton.write(ctx, sink, value, Some(root), false),
                None => skeleton.write(ctx, sink, value, Some(name), true),
            }
        }
        Value::Enum(text) => {
            sink.start_element(name)?;
            sink.text(text)?;
            sink.end_element()?;
            Ok(())
        }
        Value::List(_) | Value::Map(_) => Err(BindError::Marshal(format!(
            "cannot write a {} as untyped content of {name}",
            value.kind_name()
        ))),
        simple => {
            let kind = leaf::kind_of(simple).ok_or_else(|| {
                BindError::Marshal(format!("cannot write a {} value", simple.kind_name()))
            })?;
            sink.start_element(name)?;
            let type_name = QName::new(XML_SCHEMA_NS, kind.schema_name()).with_prefix("xs");
            let type_text = print_qname(sink, &type_name)?;
            sink.attribute(&xsi("type"), &type_text)?;
            let text = leaf::print(kind, ctx.converter, sink, simple)?;
            sink.text(&text)?;
            sink.end_element()?;
            Ok(())
        }
    }
}

pub(super) fn read(
    lax: bool,
    ctx: &mut ReadContext<'_>,
    cursor: &mut dyn XmlCursor,
) -> BindResult<Value> {
    let registry = ctx.registry;
    let name = cursor.require_start()?;
    if is_nil(cursor) {
        cursor.skip_element()?;
        return Ok(Value::Null);
    }
    if let Some(type_name) = xsi_type(ctx.converter, cursor)? {
        if type_name.namespace() == Some(XML_SCHEMA_NS) {
            if let Some(kind) = LeafKind::from_schema_name(type_name.local_part()) {
                return leaf::LeafProperty::new(kind, None).read_element(ctx.converter, cursor);
            }
        }
        if let Some(skeleton) = registry.skeleton_for_type_name(&type_name) {
            return skeleton.read(ctx, cursor, None);
        }
    }
    if lax {
        if let Some(skeleton) = registry.root_skeleton(&name) {
            return skeleton.read(ctx, cursor, None);
        }
    }
    Ok(Value::Dynamic(cursor.read_subtree()?))
}
