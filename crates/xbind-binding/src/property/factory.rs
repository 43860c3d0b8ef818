//! Property construction from type descriptors.

use std::sync::Arc;

use xbind_core::{QName, identifier_to_xml_name};

use super::{EnumInfo, LeafProperty, Property};
use crate::context::{BindingContext, SkeletonId};
use crate::descriptor::{EnumDescriptor, Shape, TypeFn, TypeKey};
use crate::error::{BindError, BindResult};

/// Modifiers that change which property a type compiles to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFlags {
    /// Accept any registered root element.
    pub any_type: bool,
    /// Expected content type for binary payloads.
    pub mime_type: Option<String>,
    /// Write a sequence as one whitespace-separated value.
    pub xml_list: bool,
    /// The property is the element's text content.
    pub xml_value: bool,
}

/// Where nested structures and enumerations come from while compiling a
/// property: the registry itself during discovery, or a read-only lookup
/// afterwards.
pub(crate) trait SkeletonSource {
    fn context(&self) -> &BindingContext;

    fn skeleton_for(&mut self, describe: TypeFn) -> BindResult<SkeletonId>;

    fn enum_info(&mut self, key: TypeKey, desc: &EnumDescriptor) -> Arc<EnumInfo>;
}

pub(crate) fn enum_type_name(context: &BindingContext, key: TypeKey, desc: &EnumDescriptor) -> QName {
    let local = desc
        .type_name
        .clone()
        .unwrap_or_else(|| identifier_to_xml_name(key.name()));
    QName::with_namespace(context.config().target_namespace.as_deref(), local)
}

/// Resolves against a finished registry without registering anything.
pub(crate) struct Lookup<'a>(pub &'a BindingContext);

impl SkeletonSource for Lookup<'_> {
    fn context(&self) -> &BindingContext {
        self.0
    }

    fn skeleton_for(&mut self, describe: TypeFn) -> BindResult<SkeletonId> {
        let key = describe().key;
        self.0
            .skeleton_for_key(key)
            .map(crate::skeleton::Skeleton::id)
            .ok_or_else(|| BindError::Configuration(format!("{key} is not registered")))
    }

    fn enum_info(&mut self, key: TypeKey, desc: &EnumDescriptor) -> Arc<EnumInfo> {
        self.0.enum_for_key(key).unwrap_or_else(|| {
            Arc::new(EnumInfo::new(
                key,
                enum_type_name(self.0, key, desc),
                desc.constants.clone(),
            ))
        })
    }
}

/// Compile the property for a declared type.
pub(crate) fn build_property<S: SkeletonSource + ?Sized>(
    source: &mut S,
    describe: TypeFn,
    flags: &PropertyFlags,
) -> BindResult<Property> {
    let desc = describe();
    if let Some(leaf) = source
        .context()
        .get_leaf_property(desc.key, flags.mime_type.as_deref())
    {
        return checked_leaf(leaf, desc.key, flags);
    }
    match desc.shape {
        Shape::Leaf(kind) => checked_leaf(
            Property::Leaf(LeafProperty::new(kind, flags.mime_type.as_deref())),
            desc.key,
            flags,
        ),
        Shape::Array(item) => sequence(source, item, flags, Property::Array),
        Shape::List(Some(item)) => sequence(source, item, flags, Property::List),
        Shape::Collection(Some(item)) => sequence(source, item, flags, Property::Collection),
        Shape::List(None) | Shape::Collection(None) if flags.xml_list => Err(
            BindError::Configuration(format!("{} has untyped items and cannot be an xml list", desc.key)),
        ),
        Shape::List(None) => Ok(Property::List(Box::new(Property::Dynamic { lax: true }))),
        Shape::Collection(None) => Ok(Property::Collection(Box::new(Property::Dynamic {
            lax: true,
        }))),
        Shape::Map(params) => {
            let [key, value] = params.as_slice() else {
                return Err(BindError::Configuration(format!(
                    "{} must have exactly two type arguments, found {}",
                    desc.key,
                    params.len()
                )));
            };
            let plain = PropertyFlags::default();
            Ok(Property::Map {
                key: Box::new(build_property(source, *key, &plain)?),
                value: Box::new(build_property(source, *value, &plain)?),
            })
        }
        Shape::Enum(enum_desc) => Ok(Property::Enum(source.enum_info(desc.key, &enum_desc))),
        Shape::Struct(_) if flags.any_type => Ok(Property::Dynamic { lax: true }),
        Shape::Struct(_) => Ok(Property::Nested(source.skeleton_for(describe)?)),
        Shape::Any => Ok(Property::Dynamic {
            lax: flags.any_type,
        }),
        Shape::Parameter(name) => Err(BindError::Configuration(format!(
            "unresolved type parameter {name} in {}",
            desc.key
        ))),
    }
}

fn checked_leaf(leaf: Property, key: TypeKey, flags: &PropertyFlags) -> BindResult<Property> {
    if flags.xml_list && !flags.xml_value {
        if let Property::Leaf(LeafProperty { kind, .. }) = &leaf {
            if kind.is_binary() {
                return Err(BindError::Configuration(format!(
                    "{key} is a binary value and cannot be an xml list"
                )));
            }
        }
    }
    Ok(leaf)
}

fn sequence<S: SkeletonSource + ?Sized>(
    source: &mut S,
    item: TypeFn,
    flags: &PropertyFlags,
    wrap: fn(Box<Property>) -> Property,
) -> BindResult<Property> {
    let item_flags = PropertyFlags {
        xml_list: false,
        ..flags.clone()
    };
    let item = build_property(source, item, &item_flags)?;
    if item.is_repeated() || matches!(item, Property::XmlList(_)) {
        return Err(BindError::Configuration(format!(
            "sequence items cannot themselves be a {}; wrap the inner sequence in a bound type",
            item.label()
        )));
    }
    if flags.xml_list {
        if !item.is_text_capable() {
            return Err(BindError::Configuration(format!(
                "xml list items must be simple values, found a {} property",
                item.label()
            )));
        }
        return Ok(Property::XmlList(Box::new(item)));
    }
    Ok(wrap(Box::new(item)))
}
