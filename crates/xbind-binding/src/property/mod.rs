//! Properties: how a value of one declared type is written and read.
//!
//! A [`Property`] is built once per declared type by the registry and is
//! immutable afterwards. Element-form operations start at the element's
//! start tag and leave the cursor on the tag after its end; repeated
//! properties consume every consecutive sibling with the same name.

mod collection;
mod dynamic;
mod enumeration;
mod factory;
mod leaf;
mod map;

use std::sync::Arc;

use xbind_core::{DatatypeConverter, NamespaceContext, QName, XML_SCHEMA_INSTANCE_NS};
use xbind_xml::{XmlCursor, XmlSink};

use crate::context::SkeletonId;
use crate::error::{BindError, BindResult};
use crate::session::{ReadContext, WriteContext};
use crate::value::Value;

pub use enumeration::EnumInfo;
pub(crate) use factory::{Lookup, SkeletonSource, build_property, enum_type_name};
pub use factory::PropertyFlags;
pub use leaf::LeafProperty;
pub(crate) use leaf::{builtin_kind, print_qname};

/// A compiled property.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// A built-in simple type.
    Leaf(LeafProperty),
    /// One element per item of a fixed-size array.
    Array(Box<Property>),
    /// One element per item of a list.
    List(Box<Property>),
    /// One element per item of an unordered collection.
    Collection(Box<Property>),
    /// All items in one whitespace-separated text value.
    XmlList(Box<Property>),
    /// One element containing `entry` elements with `key` and `value`.
    Map {
        /// The key property.
        key: Box<Property>,
        /// The value property.
        value: Box<Property>,
    },
    /// An enumeration constant.
    Enum(Arc<EnumInfo>),
    /// A bound structure.
    Nested(SkeletonId),
    /// Untyped content. `lax` resolves registered root elements to objects.
    Dynamic {
        /// Resolve registered root elements.
        lax: bool,
    },
}

impl Property {
    /// Whether values can be written as plain text: simple leaves and
    /// enumerations.
    #[must_use]
    pub fn is_text_capable(&self) -> bool {
        matches!(self, Self::Leaf(_) | Self::Enum(_))
    }

    /// Whether the property can be an attribute or element text.
    #[must_use]
    pub fn has_text_form(&self) -> bool {
        self.is_text_capable() || matches!(self, Self::XmlList(_))
    }

    /// Whether the property spans consecutive sibling elements.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        matches!(self, Self::Array(_) | Self::List(_) | Self::Collection(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Array(_) => "array",
            Self::List(_) => "list",
            Self::Collection(_) => "collection",
            Self::XmlList(_) => "xml list",
            Self::Map { .. } => "map",
            Self::Enum(_) => "enum",
            Self::Nested(_) => "structure",
            Self::Dynamic { .. } => "untyped",
        }
    }

    pub(crate) fn write_element(
        &self,
        ctx: &mut WriteContext<'_>,
        sink: &mut dyn XmlSink,
        value: &Value,
        name: &QName,
    ) -> BindResult<()> {
        match self {
            Self::Leaf(leaf) => leaf.write_element(ctx.converter, sink, value, name),
            Self::Enum(info) => {
                let text = info.print(value)?;
                sink.start_element(name)?;
                sink.text(&text)?;
                sink.end_element()?;
                Ok(())
            }
            Self::Array(item) | Self::List(item) | Self::Collection(item) => {
                collection::write_repeated(item, ctx, sink, value, name)
            }
            Self::XmlList(item) => {
                sink.start_element(name)?;
                let text = collection::print_list(item, ctx.converter, sink, value)?;
                sink.text(&text)?;
                sink.end_element()?;
                Ok(())
            }
            Self::Map { key, value: v } => map::write(key, v, ctx, sink, value, name),
            Self::Nested(id) => {
                let registry = ctx.registry;
                registry.skeleton_at(*id).write_nested(ctx, sink, value, name)
            }
            Self::Dynamic { .. } => dynamic::write(ctx, sink, value, name),
        }
    }

    pub(crate) fn read_element(
        &self,
        ctx: &mut ReadContext<'_>,
        cursor: &mut dyn XmlCursor,
        current: Value,
    ) -> BindResult<Value> {
        match self {
            Self::Leaf(leaf) => leaf.read_element(ctx.converter, cursor),
            Self::Enum(info) => {
                let text = cursor.element_text()?;
                info.parse(&text)
            }
            Self::Array(item) | Self::List(item) | Self::Collection(item) => {
                collection::read_repeated(item, ctx, cursor, current)
            }
            Self::XmlList(item) => {
                let scope = cursor.namespace_snapshot();
                let text = cursor.element_text()?;
                collection::parse_list(item, ctx.converter, &text, &scope)
            }
            Self::Map { key, value } => map::read(key, value, ctx, cursor),
            Self::Nested(id) => {
                let registry = ctx.registry;
                registry.skeleton_at(*id).read_nested(ctx, cursor, current)
            }
            Self::Dynamic { lax } => dynamic::read(*lax, ctx, cursor),
        }
    }

    pub(crate) fn print_text(
        &self,
        conv: DatatypeConverter,
        sink: &mut dyn XmlSink,
        value: &Value,
    ) -> BindResult<String> {
        match self {
            Self::Leaf(leaf) => leaf::print(leaf.kind, conv, sink, value),
            Self::Enum(info) => info.print(value),
            Self::XmlList(item) => collection::print_list(item, conv, sink, value),
            other => Err(BindError::Marshal(format!(
                "a {} property has no text form",
                other.label()
            ))),
        }
    }

    pub(crate) fn parse_text(
        &self,
        conv: DatatypeConverter,
        text: &str,
        namespaces: &dyn NamespaceContext,
    ) -> BindResult<Value> {
        match self {
            Self::Leaf(leaf) => leaf::parse(leaf.kind, conv, text, namespaces),
            Self::Enum(info) => info.parse(text),
            Self::XmlList(item) => collection::parse_list(item, conv, text, namespaces),
            other => Err(BindError::Unmarshal(format!(
                "a {} property has no text form",
                other.label()
            ))),
        }
    }
}

/// Write a simple value under an explicit name, choosing the leaf from the
/// value itself.
pub(crate) fn write_runtime_leaf(
    conv: DatatypeConverter,
    sink: &mut dyn XmlSink,
    value: &Value,
    name: &QName,
) -> BindResult<()> {
    let kind = leaf::kind_of(value).ok_or_else(|| {
        BindError::Marshal(format!("cannot write a {} value as {name}", value.kind_name()))
    })?;
    LeafProperty::new(kind, None).write_element(conv, sink, value, name)
}

pub(crate) fn xsi(local: &str) -> QName {
    QName::new(XML_SCHEMA_INSTANCE_NS, local).with_prefix("xsi")
}

pub(crate) fn is_nil(cursor: &dyn XmlCursor) -> bool {
    cursor
        .attribute(&xsi("nil"))
        .is_some_and(|v| matches!(v.trim(), "true" | "1"))
}

pub(crate) fn write_nil(sink: &mut dyn XmlSink, name: &QName) -> BindResult<()> {
    sink.start_element(name)?;
    sink.attribute(&xsi("nil"), "true")?;
    sink.end_element()?;
    Ok(())
}

/// The resolved `xsi:type` of the current start tag.
pub(crate) fn xsi_type(
    conv: DatatypeConverter,
    cursor: &dyn XmlCursor,
) -> BindResult<Option<QName>> {
    cursor
        .attribute(&xsi("type"))
        .map(|text| conv.parse_qname(text, cursor.namespaces()))
        .transpose()
        .map_err(Into::into)
}
