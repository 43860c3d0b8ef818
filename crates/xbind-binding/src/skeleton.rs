//! Per-structure read/write plans.
//!
//! A [`Skeleton`] is created once per bound structure. It moves through
//! [`SkeletonState`] during discovery and is immutable once the registry
//! finishes post-processing, so marshalling only ever reads it.

use std::collections::HashMap;

use xbind_core::{QName, XML_SCHEMA_INSTANCE_NS};
use xbind_xml::{CursorEvent, XmlCursor, XmlSink};

use crate::context::{BindingContext, SkeletonId};
use crate::descriptor::{FactoryFn, PropertyKind, TypeFn, TypeKey};
use crate::error::{BindError, BindResult};
use crate::property::{Property, is_nil, print_qname, write_nil, xsi, xsi_type};
use crate::session::{ReadContext, WriteContext};
use crate::value::{Object, Value};

/// Lifecycle of a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkeletonState {
    /// Allocated, nothing introspected yet.
    Uninitialized,
    /// Properties are being compiled. Recursive references may observe
    /// this state.
    Initializing,
    /// All properties compiled.
    Ready,
    /// Name indices built; usable for marshalling.
    PostProcessed,
}

/// A property bound to a field of a structure.
#[derive(Debug, Clone)]
pub struct BoundProperty {
    pub(crate) field: String,
    pub(crate) name: QName,
    pub(crate) kind: PropertyKind,
    pub(crate) property: Property,
    pub(crate) required: bool,
    pub(crate) nillable: bool,
}

impl BoundProperty {
    /// Field name in the value object.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// XML name.
    #[must_use]
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Where the property appears.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// The compiled property.
    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// Whether unmarshalling requires the property.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether nulls are written with `xsi:nil`.
    #[must_use]
    pub fn is_nillable(&self) -> bool {
        self.nillable
    }
}

/// The read/write plan of one bound structure.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub(crate) id: SkeletonId,
    pub(crate) key: TypeKey,
    pub(crate) describe: TypeFn,
    pub(crate) state: SkeletonState,
    pub(crate) type_name: QName,
    pub(crate) element_name: Option<QName>,
    pub(crate) parent: Option<SkeletonId>,
    pub(crate) is_abstract: bool,
    pub(crate) factory: Option<FactoryFn>,
    pub(crate) attributes: Vec<BoundProperty>,
    pub(crate) elements: Vec<BoundProperty>,
    pub(crate) value: Option<BoundProperty>,
    pub(crate) any_element: Option<BoundProperty>,
    pub(crate) any_attribute: Option<BoundProperty>,
    element_index: HashMap<QName, usize>,
}

impl Skeleton {
    pub(crate) fn new(id: SkeletonId, key: TypeKey, describe: TypeFn) -> Self {
        Self {
            id,
            key,
            describe,
            state: SkeletonState::Uninitialized,
            type_name: QName::local(key.name()),
            element_name: None,
            parent: None,
            is_abstract: false,
            factory: None,
            attributes: Vec::new(),
            elements: Vec::new(),
            value: None,
            any_element: None,
            any_attribute: None,
            element_index: HashMap::new(),
        }
    }

    /// Registry handle.
    #[must_use]
    pub fn id(&self) -> SkeletonId {
        self.id
    }

    /// The bound Rust type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> SkeletonState {
        self.state
    }

    /// Schema type name.
    #[must_use]
    pub fn type_name(&self) -> &QName {
        &self.type_name
    }

    /// Root element name, when the type is a document element.
    #[must_use]
    pub fn element_name(&self) -> Option<&QName> {
        self.element_name.as_ref()
    }

    /// The bound supertype.
    #[must_use]
    pub fn parent(&self) -> Option<SkeletonId> {
        self.parent
    }

    /// Whether the type is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Own attribute properties, in order.
    #[must_use]
    pub fn attributes(&self) -> &[BoundProperty] {
        &self.attributes
    }

    /// Own element properties, in order.
    #[must_use]
    pub fn elements(&self) -> &[BoundProperty] {
        &self.elements
    }

    /// Own text-content property.
    #[must_use]
    pub fn value_property(&self) -> Option<&BoundProperty> {
        self.value.as_ref()
    }

    /// Own catch-all element property.
    #[must_use]
    pub fn any_element(&self) -> Option<&BoundProperty> {
        self.any_element.as_ref()
    }

    /// Own catch-all attribute property.
    #[must_use]
    pub fn any_attribute(&self) -> Option<&BoundProperty> {
        self.any_attribute.as_ref()
    }

    /// Build the element-name index. Runs once, after discovery.
    pub(crate) fn post_process(&mut self) -> BindResult<()> {
        if self.state == SkeletonState::PostProcessed {
            return Ok(());
        }
        if self.state != SkeletonState::Ready {
            return Err(BindError::Configuration(format!(
                "{} did not finish initializing ({:?})",
                self.key, self.state
            )));
        }
        self.element_index.clear();
        for (i, p) in self.elements.iter().enumerate() {
            if self.element_index.insert(p.name.clone(), i).is_some() {
                return Err(BindError::Configuration(format!(
                    "{} declares element {} more than once",
                    self.key, p.name
                )));
            }
        }
        self.state = SkeletonState::PostProcessed;
        Ok(())
    }

    /// This skeleton and its supertypes, outermost supertype first.
    pub(crate) fn chain<'r>(&'r self, registry: &'r BindingContext) -> Vec<&'r Skeleton> {
        let mut chain = vec![self];
        let mut current = self.parent;
        while let Some(id) = current {
            let parent = registry.skeleton_at(id);
            chain.push(parent);
            current = parent.parent;
        }
        chain.reverse();
        chain
    }

    /// Whether this skeleton is `ancestor` or derives from it.
    pub(crate) fn derives_from(&self, registry: &BindingContext, ancestor: SkeletonId) -> bool {
        self.chain(registry).iter().any(|s| s.id == ancestor)
    }

    fn element(&self, name: &QName) -> Option<&BoundProperty> {
        match self.element_index.get(name) {
            Some(&i) => self.elements.get(i),
            None if self.state != SkeletonState::PostProcessed => {
                self.elements.iter().find(|p| &p.name == name)
            }
            None => None,
        }
    }

    fn instantiate(&self) -> Object {
        match self.factory.map(|factory| factory()) {
            Some(Value::Object(object)) => object,
            _ => Object::with_type(self.key, self.describe),
        }
    }

    /// Write `value` as an element named `name`, falling back to the root
    /// element name and then the type name.
    pub(crate) fn write(
        &self,
        ctx: &mut WriteContext<'_>,
        sink: &mut dyn XmlSink,
        value: &Value,
        name: Option<&QName>,
        with_type: bool,
    ) -> BindResult<()> {
        let Value::Object(object) = value else {
            return Err(BindError::Marshal(format!(
                "expected an instance of {}, found {}",
                self.key,
                value.kind_name()
            )));
        };
        let element = name
            .or(self.element_name.as_ref())
            .unwrap_or(&self.type_name);
        let registry = ctx.registry;
        let conv = ctx.converter;
        let chain = self.chain(registry);

        ctx.before(object);
        sink.start_element(element)?;
        if let (Some(table), Some(node)) = (ctx.binder.as_deref_mut(), sink.current_node()) {
            table.bind(object.id(), node);
        }
        if with_type {
            let type_text = print_qname(sink, &self.type_name)?;
            sink.attribute(&xsi("type"), &type_text)?;
        }

        for p in chain.iter().flat_map(|s| &s.attributes) {
            let v = field(object, &p.field);
            if !v.is_null() {
                let text = p.property.print_text(conv, sink, v)?;
                sink.attribute(&p.name, &text)?;
            }
        }
        if let Some(p) = chain.iter().rev().find_map(|s| s.any_attribute.as_ref()) {
            if let Value::Map(entries) = field(object, &p.field) {
                for (name, text) in entries {
                    let (Value::QName(name), Value::String(text)) = (name, text) else {
                        return Err(BindError::Marshal(format!(
                            "{} of {} must map names to strings",
                            p.field, self.key
                        )));
                    };
                    sink.attribute(name, text)?;
                }
            }
        }

        if let Some(p) = chain.iter().rev().find_map(|s| s.value.as_ref()) {
            let v = field(object, &p.field);
            if !v.is_null() {
                let text = p.property.print_text(conv, sink, v)?;
                sink.text(&text)?;
            }
        } else {
            for p in chain.iter().flat_map(|s| &s.elements) {
                let v = field(object, &p.field);
                if v.is_null() {
                    if p.nillable {
                        write_nil(sink, &p.name)?;
                    }
                    continue;
                }
                p.property.write_element(ctx, sink, v, &p.name)?;
            }
            if let Some(p) = chain.iter().rev().find_map(|s| s.any_element.as_ref()) {
                p.property
                    .write_element(ctx, sink, field(object, &p.field), &p.name)?;
            }
        }

        sink.end_element()?;
        ctx.after(object);
        Ok(())
    }

    /// Write a property value whose declared type is this skeleton. A
    /// value of a registered subtype is written by the subtype's skeleton
    /// with an `xsi:type`.
    pub(crate) fn write_nested(
        &self,
        ctx: &mut WriteContext<'_>,
        sink: &mut dyn XmlSink,
        value: &Value,
        name: &QName,
    ) -> BindResult<()> {
        let registry = ctx.registry;
        if let Value::Object(object) = value {
            if object.key() != self.key {
                if let Some(sub) = registry.skeleton_for_key(object.key()) {
                    return sub.write(ctx, sink, value, Some(name), true);
                }
            }
        }
        self.write(ctx, sink, value, Some(name), false)
    }

    /// Read the element at the cursor into `existing` or a fresh instance.
    pub(crate) fn read(
        &self,
        ctx: &mut ReadContext<'_>,
        cursor: &mut dyn XmlCursor,
        existing: Option<Object>,
    ) -> BindResult<Value> {
        let name = cursor.require_start()?;
        if is_nil(cursor) {
            cursor.skip_element()?;
            return Ok(Value::Null);
        }
        if self.is_abstract && existing.is_none() {
            return Err(BindError::Unmarshal(format!(
                "cannot instantiate abstract type {} for element {name}",
                self.type_name
            )));
        }
        let registry = ctx.registry;
        let conv = ctx.converter;
        let chain = self.chain(registry);
        let node = cursor.node();

        let mut object = existing.unwrap_or_else(|| self.instantiate());
        for p in chain.iter().flat_map(|s| s.elements.iter().chain(&s.any_element)) {
            if p.property.is_repeated() {
                object.remove(&p.field);
            }
        }
        ctx.before(&object);

        for p in chain.iter().flat_map(|s| &s.attributes) {
            if let Some(text) = cursor.attribute(&p.name) {
                let v = p.property.parse_text(conv, text, cursor.namespaces())?;
                object.set(&p.field, v);
            }
        }
        if let Some(p) = chain.iter().rev().find_map(|s| s.any_attribute.as_ref()) {
            let declared: Vec<&QName> = chain
                .iter()
                .flat_map(|s| &s.attributes)
                .map(|p| &p.name)
                .collect();
            let extra = cursor
                .attributes()
                .iter()
                .filter(|a| a.name.namespace() != Some(XML_SCHEMA_INSTANCE_NS))
                .filter(|a| !declared.contains(&&a.name))
                .map(|a| (Value::QName(a.name.clone()), Value::String(a.value.clone())))
                .collect();
            object.set(&p.field, Value::Map(extra));
        }

        if let Some(p) = chain.iter().rev().find_map(|s| s.value.as_ref()) {
            let scope = cursor.namespace_snapshot();
            let text = cursor.element_text()?;
            object.set(&p.field, p.property.parse_text(conv, &text, &scope)?);
        } else {
            cursor.next_tag()?;
            while cursor.event() == CursorEvent::StartElement {
                let child = cursor.require_start()?;
                if let Some(p) = chain.iter().find_map(|s| s.element(&child)) {
                    let current = object.remove(&p.field);
                    let v = if !p.property.is_repeated() && is_nil(cursor) {
                        cursor.skip_element()?;
                        Value::Null
                    } else {
                        p.property.read_element(ctx, cursor, current)?
                    };
                    object.set(&p.field, v);
                } else if let Some(p) = chain.iter().rev().find_map(|s| s.any_element.as_ref()) {
                    let current = object.remove(&p.field);
                    let v = p.property.read_element(ctx, cursor, current)?;
                    object.set(&p.field, v);
                } else {
                    tracing::warn!(element = %child, owner = %self.type_name, "skipping unexpected element");
                    cursor.skip_element()?;
                }
            }
            cursor.next_tag()?;
        }

        let required = chain.iter().flat_map(|s| {
            s.attributes
                .iter()
                .chain(&s.elements)
                .chain(&s.value)
                .filter(|p| p.required)
        });
        for p in required {
            if field(&object, &p.field).is_null() {
                return Err(BindError::Unmarshal(format!(
                    "missing required {} in {name}",
                    p.name
                )));
            }
        }

        if let (Some(table), Some(node)) = (ctx.binder.as_deref_mut(), node) {
            table.bind(object.id(), node);
        }
        ctx.after(&object);
        Ok(Value::Object(object))
    }

    /// Read a property value whose declared type is this skeleton,
    /// honoring an `xsi:type` that names a registered subtype.
    pub(crate) fn read_nested(
        &self,
        ctx: &mut ReadContext<'_>,
        cursor: &mut dyn XmlCursor,
        current: Value,
    ) -> BindResult<Value> {
        let registry = ctx.registry;
        let target = match xsi_type(ctx.converter, cursor)? {
            Some(type_name) => registry
                .skeleton_for_type_name(&type_name)
                .filter(|s| s.derives_from(registry, self.id))
                .unwrap_or(self),
            None => self,
        };
        let existing = match current {
            Value::Object(object) if object.key() == target.key => Some(object),
            _ => None,
        };
        target.read(ctx, cursor, existing)
    }
}

static NULL: Value = Value::Null;

fn field<'o>(object: &'o Object, name: &str) -> &'o Value {
    object.get(name).unwrap_or(&NULL)
}
