//! The binding registry.
//!
//! A [`BindingContext`] owns one [`Skeleton`] per bound structure and the
//! lookup tables that map Rust types, schema type names and root element
//! names to them. It is built in two phases:
//!
//! 1. **Discovery**: [`create_skeleton`](BindingContext::create_skeleton)
//!    introspects a type and, recursively, every type its properties
//!    reference. Recursive references resolve to the skeleton already
//!    allocated for the type.
//! 2. **Post-processing**: [`finish_discovery`](BindingContext::finish_discovery)
//!    builds name indices and freezes the registry.
//!
//! After that the context is read-only and can be shared freely between
//! threads; marshallers and unmarshallers borrow it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use xbind_core::{BindingConfig, DatatypeConverter, QName, identifier_to_xml_name};

use crate::binder::Binder;
use crate::bind::XmlBind;
use crate::descriptor::{
    AccessorOrder, ElementForm, EnumDescriptor, PropertyDescriptor, PropertyKind, Shape,
    StructDescriptor, TypeFn, TypeKey,
};
use crate::error::{BindError, BindResult};
use crate::marshaller::Marshaller;
use crate::property::{
    EnumInfo, LeafProperty, Property, PropertyFlags, SkeletonSource, build_property, builtin_kind,
    enum_type_name,
};
use crate::skeleton::{BoundProperty, Skeleton, SkeletonState};
use crate::unmarshaller::Unmarshaller;
use crate::value::AnyAttributes;

/// Handle of a skeleton inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkeletonId(pub(crate) usize);

/// The binding registry.
#[derive(Debug)]
pub struct BindingContext {
    config: BindingConfig,
    converter: DatatypeConverter,
    skeletons: Vec<Skeleton>,
    by_type: HashMap<TypeKey, SkeletonId>,
    roots: BTreeMap<QName, SkeletonId>,
    type_names: HashMap<QName, SkeletonId>,
    enums: Vec<Arc<EnumInfo>>,
    pending: HashSet<TypeKey>,
    discovery_finished: bool,
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::new(BindingConfig::default())
    }
}

impl BindingContext {
    /// Create an empty registry in discovery mode.
    #[must_use]
    pub fn new(config: BindingConfig) -> Self {
        Self {
            config,
            converter: DatatypeConverter::new(),
            skeletons: Vec::new(),
            by_type: HashMap::new(),
            roots: BTreeMap::new(),
            type_names: HashMap::new(),
            enums: Vec::new(),
            pending: HashSet::new(),
            discovery_finished: false,
        }
    }

    /// Start building a registry.
    #[must_use]
    pub fn builder() -> BindingContextBuilder {
        BindingContextBuilder::default()
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// The datatype converter shared by every property.
    #[must_use]
    pub fn converter(&self) -> DatatypeConverter {
        self.converter
    }

    /// Create a marshaller.
    #[must_use]
    pub fn marshaller(&self) -> Marshaller<'_> {
        Marshaller::new(self)
    }

    /// Create an unmarshaller.
    #[must_use]
    pub fn unmarshaller(&self) -> Unmarshaller<'_> {
        Unmarshaller::new(self)
    }

    /// Create a binder with an empty association table.
    #[must_use]
    pub fn binder(&self) -> Binder<'_> {
        Binder::new(self)
    }

    /// Whether post-processing has run.
    #[must_use]
    pub fn is_discovery_finished(&self) -> bool {
        self.discovery_finished
    }

    /// Whether a type's skeleton is still being introspected.
    #[must_use]
    pub fn is_pending(&self, key: TypeKey) -> bool {
        self.pending.contains(&key)
    }

    /// Return the skeleton of a structure type, introspecting it (and the
    /// types it references) on first use. Idempotent per type.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if the type is not a structure,
    /// one of its properties cannot be bound, a name collides with another
    /// type, or discovery has already finished.
    pub fn create_skeleton(&mut self, describe: TypeFn) -> BindResult<SkeletonId> {
        let desc = describe();
        if let Some(&id) = self.by_type.get(&desc.key) {
            return Ok(id);
        }
        if self.discovery_finished {
            return Err(BindError::Configuration(format!(
                "cannot register {} after discovery has finished",
                desc.key
            )));
        }
        let Shape::Struct(structure) = desc.shape else {
            return Err(BindError::Configuration(format!(
                "{} is not a structure and has no skeleton",
                desc.key
            )));
        };

        let id = SkeletonId(self.skeletons.len());
        let enums = self.enums.len();
        self.skeletons.push(Skeleton::new(id, desc.key, describe));
        self.by_type.insert(desc.key, id);
        self.pending.insert(desc.key);
        tracing::debug!(type_name = desc.key.name(), "introspecting type");

        let result = self.introspect(id, desc.key, structure);
        self.pending.remove(&desc.key);
        if let Err(e) = result {
            self.roll_back(id, enums);
            return Err(e);
        }
        Ok(id)
    }

    /// Forget every skeleton from `first` on and every enumeration past
    /// `enums`, with their index entries.
    fn roll_back(&mut self, first: SkeletonId, enums: usize) {
        let kept = |id: &SkeletonId| *id < first;
        self.by_type.retain(|_, id| kept(id));
        self.type_names.retain(|_, id| kept(id));
        self.roots.retain(|_, id| kept(id));
        for skeleton in &self.skeletons[first.0..] {
            self.pending.remove(&skeleton.key);
        }
        tracing::debug!(
            discarded = self.skeletons.len() - first.0,
            "rolled back failed introspection"
        );
        self.skeletons.truncate(first.0);
        self.enums.truncate(enums);
    }

    fn introspect(
        &mut self,
        id: SkeletonId,
        key: TypeKey,
        structure: StructDescriptor,
    ) -> BindResult<()> {
        self.skeletons[id.0].state = SkeletonState::Initializing;

        let namespace = structure
            .namespace
            .clone()
            .or_else(|| self.config.target_namespace.clone());
        let ns = namespace.as_deref();
        let local = structure
            .type_name
            .clone()
            .unwrap_or_else(|| identifier_to_xml_name(key.name()));
        let type_name = QName::with_namespace(ns, local);
        self.skeletons[id.0].type_name = type_name.clone();
        self.add_type_name(id, type_name)?;

        let parent = match structure.supertype {
            Some(supertype) => Some(self.create_skeleton(supertype)?),
            None => None,
        };
        if let Some(root) = &structure.root_element {
            self.add_root_element(id, QName::with_namespace(ns, root.clone()))?;
        }

        let properties = order_properties(
            key,
            structure.properties,
            structure.prop_order,
            structure.accessor_order,
        )?;
        let mut attributes = Vec::new();
        let mut elements = Vec::new();
        let mut value: Option<BoundProperty> = None;
        let mut any_element: Option<BoundProperty> = None;
        let mut any_attribute: Option<BoundProperty> = None;
        for descriptor in properties {
            let bound = self.bind_property(key, ns, structure.element_form, descriptor)?;
            let slot = match bound.kind {
                PropertyKind::Attribute => {
                    attributes.push(bound);
                    continue;
                }
                PropertyKind::Element => {
                    elements.push(bound);
                    continue;
                }
                PropertyKind::Value => &mut value,
                PropertyKind::AnyElement => &mut any_element,
                PropertyKind::AnyAttribute => &mut any_attribute,
            };
            if let Some(existing) = slot.replace(bound) {
                return Err(BindError::Configuration(format!(
                    "{key} declares more than one {:?} property (second after '{}')",
                    existing.kind, existing.field
                )));
            }
        }
        if value.is_some() && (!elements.is_empty() || any_element.is_some()) {
            return Err(BindError::Configuration(format!(
                "{key} has a text value property and cannot also have element properties"
            )));
        }

        let skeleton = &mut self.skeletons[id.0];
        skeleton.parent = parent;
        skeleton.is_abstract = structure.is_abstract;
        skeleton.factory = structure.factory;
        skeleton.attributes = attributes;
        skeleton.elements = elements;
        skeleton.value = value;
        skeleton.any_element = any_element;
        skeleton.any_attribute = any_attribute;
        skeleton.state = SkeletonState::Ready;
        Ok(())
    }

    fn bind_property(
        &mut self,
        owner: TypeKey,
        namespace: Option<&str>,
        form: ElementForm,
        descriptor: PropertyDescriptor,
    ) -> BindResult<BoundProperty> {
        let local = descriptor
            .xml_name
            .clone()
            .unwrap_or_else(|| identifier_to_xml_name(&descriptor.field));
        let element_ns = match form {
            ElementForm::Qualified => namespace,
            ElementForm::Unqualified => None,
        };
        let name = match descriptor.kind {
            PropertyKind::Element | PropertyKind::AnyElement => {
                QName::with_namespace(descriptor.namespace.as_deref().or(element_ns), local)
            }
            PropertyKind::Attribute => {
                QName::with_namespace(descriptor.namespace.as_deref(), local)
            }
            PropertyKind::Value | PropertyKind::AnyAttribute => QName::local(local),
        };

        let property = match descriptor.kind {
            PropertyKind::AnyElement => Property::List(Box::new(Property::Dynamic { lax: true })),
            PropertyKind::AnyAttribute => {
                self.create_property(AnyAttributes::describe, &PropertyFlags::default())?
            }
            kind => {
                let flags = PropertyFlags {
                    any_type: descriptor.any_type,
                    mime_type: descriptor.mime_type.clone(),
                    xml_list: descriptor.xml_list,
                    xml_value: kind == PropertyKind::Value,
                };
                self.create_property(descriptor.ty, &flags)?
            }
        };
        if matches!(descriptor.kind, PropertyKind::Attribute | PropertyKind::Value)
            && !property.has_text_form()
        {
            return Err(BindError::Configuration(format!(
                "{owner}.{} must be a simple value to be bound as {:?}",
                descriptor.field, descriptor.kind
            )));
        }

        Ok(BoundProperty {
            field: descriptor.field,
            name,
            kind: descriptor.kind,
            property,
            required: descriptor.required,
            nillable: descriptor.nillable,
        })
    }

    /// Register `name` as a document element of the skeleton `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if the name is already bound to
    /// a different type, whether or not that type is still being
    /// introspected.
    pub fn add_root_element(&mut self, id: SkeletonId, name: QName) -> BindResult<()> {
        if let Some(&existing) = self.roots.get(&name) {
            if existing != id {
                let other = self.skeletons[existing.0].key;
                let pending = if self.pending.contains(&other) {
                    " (still being introspected)"
                } else {
                    ""
                };
                return Err(BindError::Configuration(format!(
                    "root element {name} of {} is already bound to {other}{pending}",
                    self.skeletons[id.0].key
                )));
            }
            return Ok(());
        }
        let skeleton = &mut self.skeletons[id.0];
        if skeleton.element_name.is_none() {
            skeleton.element_name = Some(name.clone());
        }
        tracing::debug!(element = %name, type_name = skeleton.key.name(), "registered root element");
        self.roots.insert(name, id);
        Ok(())
    }

    /// Register `name` as the schema type name of the skeleton `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if the name is already used by
    /// a different type.
    pub fn add_type_name(&mut self, id: SkeletonId, name: QName) -> BindResult<()> {
        match self.type_names.get(&name) {
            Some(&existing) if existing != id => Err(BindError::Configuration(format!(
                "type name {name} of {} is already used by {}",
                self.skeletons[id.0].key, self.skeletons[existing.0].key
            ))),
            Some(_) => Ok(()),
            None => {
                self.type_names.insert(name, id);
                Ok(())
            }
        }
    }

    /// The leaf property for a built-in simple type.
    #[must_use]
    pub fn get_leaf_property(&self, key: TypeKey, mime_type: Option<&str>) -> Option<Property> {
        builtin_kind(key.type_id()).map(|kind| Property::Leaf(LeafProperty::new(kind, mime_type)))
    }

    /// Compile the property for a declared type, registering any
    /// structures and enumerations it references.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] for unsupported shapes: maps
    /// without exactly two type arguments, unresolved type parameters,
    /// xml lists of non-simple items, and binary leaves as xml lists.
    pub fn create_property(&mut self, describe: TypeFn, flags: &PropertyFlags) -> BindResult<Property> {
        build_property(self, describe, flags)
    }

    fn register_enum(&mut self, key: TypeKey, desc: &EnumDescriptor) -> Arc<EnumInfo> {
        if let Some(existing) = self.enum_for_key(key) {
            return existing;
        }
        let info = Arc::new(EnumInfo::new(
            key,
            enum_type_name(self, key, desc),
            desc.constants.clone(),
        ));
        self.enums.push(Arc::clone(&info));
        info
    }

    /// Build name indices and freeze the registry. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if a skeleton failed to
    /// initialize or declares an element name twice.
    pub fn finish_discovery(&mut self) -> BindResult<()> {
        if self.discovery_finished {
            return Ok(());
        }
        for skeleton in &mut self.skeletons {
            skeleton.post_process()?;
        }
        self.discovery_finished = true;
        tracing::info!(
            skeletons = self.skeletons.len(),
            root_elements = self.roots.len(),
            enums = self.enums.len(),
            "binding context ready"
        );
        Ok(())
    }

    /// Look up a skeleton by handle.
    #[must_use]
    pub fn skeleton(&self, id: SkeletonId) -> Option<&Skeleton> {
        self.skeletons.get(id.0)
    }

    pub(crate) fn skeleton_at(&self, id: SkeletonId) -> &Skeleton {
        &self.skeletons[id.0]
    }

    /// All skeletons in registration order.
    pub fn skeletons(&self) -> impl Iterator<Item = &Skeleton> {
        self.skeletons.iter()
    }

    /// The skeleton registered for exactly this type.
    #[must_use]
    pub fn skeleton_for_key(&self, key: TypeKey) -> Option<&Skeleton> {
        self.by_type.get(&key).map(|id| self.skeleton_at(*id))
    }

    /// The skeleton for a runtime type, falling back to its nearest bound
    /// supertype.
    #[must_use]
    pub fn find_skeleton_for_type(&self, key: TypeKey, describe: TypeFn) -> Option<&Skeleton> {
        if let Some(skeleton) = self.skeleton_for_key(key) {
            return Some(skeleton);
        }
        let mut current = describe;
        loop {
            let Shape::Struct(structure) = current().shape else {
                return None;
            };
            current = structure.supertype?;
            if let Some(skeleton) = self.skeleton_for_key(current().key) {
                return Some(skeleton);
            }
        }
    }

    /// The skeleton registered for a root element name.
    #[must_use]
    pub fn root_skeleton(&self, name: &QName) -> Option<&Skeleton> {
        self.roots.get(name).map(|id| self.skeleton_at(*id))
    }

    /// The skeleton registered for a schema type name.
    #[must_use]
    pub fn skeleton_for_type_name(&self, name: &QName) -> Option<&Skeleton> {
        self.type_names.get(name).map(|id| self.skeleton_at(*id))
    }

    /// Whether a root element name is registered.
    #[must_use]
    pub fn has_root_element(&self, name: &QName) -> bool {
        self.roots.contains_key(name)
    }

    /// Whether a schema type name is registered.
    #[must_use]
    pub fn has_type_name(&self, name: &QName) -> bool {
        self.type_names.contains_key(name)
    }

    /// Registered root elements in name order.
    pub fn root_elements(&self) -> impl Iterator<Item = (&QName, SkeletonId)> {
        self.roots.iter().map(|(name, id)| (name, *id))
    }

    /// Root elements whose type is `key` or one of its bound subtypes.
    #[must_use]
    pub fn root_elements_assignable_to(&self, key: TypeKey) -> Vec<&QName> {
        let Some(&target) = self.by_type.get(&key) else {
            return Vec::new();
        };
        self.roots
            .iter()
            .filter(|(_, id)| self.skeleton_at(**id).derives_from(self, target))
            .map(|(name, _)| name)
            .collect()
    }

    /// Registered enumerations in registration order.
    #[must_use]
    pub fn enums(&self) -> &[Arc<EnumInfo>] {
        &self.enums
    }

    pub(crate) fn enum_for_key(&self, key: TypeKey) -> Option<Arc<EnumInfo>> {
        self.enums.iter().find(|e| e.key() == key).cloned()
    }
}

impl SkeletonSource for BindingContext {
    fn context(&self) -> &BindingContext {
        self
    }

    fn skeleton_for(&mut self, describe: TypeFn) -> BindResult<SkeletonId> {
        self.create_skeleton(describe)
    }

    fn enum_info(&mut self, key: TypeKey, desc: &EnumDescriptor) -> Arc<EnumInfo> {
        self.register_enum(key, desc)
    }
}

fn order_properties(
    owner: TypeKey,
    mut properties: Vec<PropertyDescriptor>,
    order: Option<Vec<String>>,
    accessor_order: AccessorOrder,
) -> BindResult<Vec<PropertyDescriptor>> {
    let Some(order) = order else {
        if accessor_order == AccessorOrder::Alphabetical {
            properties.sort_by(|a, b| a.field.cmp(&b.field));
        }
        return Ok(properties);
    };
    let mut ordered = Vec::with_capacity(properties.len());
    for field in &order {
        let position = properties
            .iter()
            .position(|p| p.kind == PropertyKind::Element && &p.field == field)
            .ok_or_else(|| {
                BindError::Configuration(format!(
                    "prop_order of {owner} names '{field}', which is not an element property"
                ))
            })?;
        ordered.push(properties.remove(position));
    }
    if let Some(missing) = properties.iter().find(|p| p.kind == PropertyKind::Element) {
        return Err(BindError::Configuration(format!(
            "prop_order of {owner} does not list element property '{}'",
            missing.field
        )));
    }
    ordered.extend(properties);
    Ok(ordered)
}

/// Builder for a [`BindingContext`].
#[derive(Debug, Default)]
pub struct BindingContextBuilder {
    config: Option<BindingConfig>,
    types: Vec<TypeFn>,
    roots: Vec<(TypeFn, QName)>,
}

impl BindingContextBuilder {
    /// Use this configuration instead of the default.
    #[must_use]
    pub fn config(mut self, config: BindingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a structure and everything it references.
    #[must_use]
    pub fn register<T: XmlBind>(mut self) -> Self {
        self.types.push(T::describe);
        self
    }

    /// Declare an additional root element for a structure.
    #[must_use]
    pub fn root_element<T: XmlBind>(mut self, name: QName) -> Self {
        self.roots.push((T::describe, name));
        self
    }

    /// Introspect every registered type and finish discovery.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if any type cannot be bound.
    pub fn build(self) -> BindResult<BindingContext> {
        let mut context = BindingContext::new(self.config.unwrap_or_default());
        for describe in self.types {
            context.create_skeleton(describe)?;
        }
        for (describe, name) in self.roots {
            let id = context.create_skeleton(describe)?;
            context.add_root_element(id, name)?;
        }
        context.finish_discovery()?;
        Ok(context)
    }
}
