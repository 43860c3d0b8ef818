//! XML Schema output.
//!
//! One `xsd:schema` document describes the whole registry: each skeleton
//! becomes a complex type (a simple type when it only carries text),
//! preceded by an `xsd:element` when it is a document element, and each
//! enumeration becomes a simple type restricting `xsd:string`.

use std::io::Write;

use xbind_core::{QName, XML_SCHEMA_NS};
use xbind_xml::{StreamWriter, XmlSink};

use crate::context::BindingContext;
use crate::error::{BindError, BindResult};
use crate::property::{EnumInfo, Property, print_qname};
use crate::skeleton::{BoundProperty, Skeleton};

const TARGET_PREFIX: &str = "tns";

fn xsd(local: &str) -> QName {
    QName::new(XML_SCHEMA_NS, local).with_prefix("xsd")
}

impl BindingContext {
    /// Write the schema of every registered type.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Configuration`] if discovery has not finished,
    /// and [`BindError::Xml`] if the output cannot be written.
    pub fn generate_schema<W: Write>(&self, out: W) -> BindResult<()> {
        if !self.is_discovery_finished() {
            return Err(BindError::Configuration(
                "schema generation requires finished discovery".to_owned(),
            ));
        }
        let mut sink = StreamWriter::new_indented(out);
        SchemaWriter {
            context: self,
            sink: &mut sink,
        }
        .write()
    }

    /// The schema as a string.
    ///
    /// # Errors
    ///
    /// Fails as [`generate_schema`](Self::generate_schema).
    pub fn schema_to_string(&self) -> BindResult<String> {
        let mut out = Vec::new();
        self.generate_schema(&mut out)?;
        String::from_utf8(out).map_err(|e| BindError::Configuration(e.to_string()))
    }
}

struct SchemaWriter<'a> {
    context: &'a BindingContext,
    sink: &'a mut dyn XmlSink,
}

impl SchemaWriter<'_> {
    fn write(mut self) -> BindResult<()> {
        let target = self.target_namespace();
        self.sink.start_document("UTF-8")?;
        self.sink.start_element(&xsd("schema"))?;
        self.sink.attribute(&QName::local("version"), "1.0")?;
        if let Some(ns) = &target {
            self.sink.attribute(&QName::local("targetNamespace"), ns)?;
            self.sink
                .attribute(&QName::local("elementFormDefault"), "qualified")?;
            self.sink.bind_namespace(Some(TARGET_PREFIX), ns)?;
        }

        let context = self.context;
        for skeleton in context.skeletons() {
            self.skeleton(skeleton)?;
        }
        for info in context.enums() {
            self.enumeration(info)?;
        }

        self.sink.end_element()?;
        self.sink.end_document()?;
        Ok(())
    }

    fn target_namespace(&self) -> Option<String> {
        self.context.config().target_namespace.clone().or_else(|| {
            self.context
                .skeletons()
                .find_map(|s| s.type_name().namespace().map(str::to_owned))
        })
    }

    fn name_attribute(&mut self, name: &str) -> BindResult<()> {
        self.sink.attribute(&QName::local("name"), name)?;
        Ok(())
    }

    fn type_attribute(&mut self, attribute: &str, type_name: &QName) -> BindResult<()> {
        let text = print_qname(&mut *self.sink, type_name)?;
        self.sink.attribute(&QName::local(attribute), &text)?;
        Ok(())
    }

    fn skeleton(&mut self, skeleton: &Skeleton) -> BindResult<()> {
        if let Some(element) = skeleton.element_name() {
            self.sink.start_element(&xsd("element"))?;
            self.name_attribute(element.local_part())?;
            self.type_attribute("type", skeleton.type_name())?;
            self.sink.end_element()?;
        }

        let context = self.context;
        let value = skeleton
            .chain(context)
            .into_iter()
            .rev()
            .find_map(Skeleton::value_property);
        if let Some(value) = value {
            return self.simple_content(skeleton, value);
        }

        self.sink.start_element(&xsd("complexType"))?;
        self.name_attribute(skeleton.type_name().local_part())?;
        if skeleton.is_abstract() {
            self.sink.attribute(&QName::local("abstract"), "true")?;
        }
        let parent = skeleton.parent().map(|id| context.skeleton_at(id));
        if let Some(parent) = parent {
            self.sink.start_element(&xsd("complexContent"))?;
            self.sink.start_element(&xsd("extension"))?;
            self.type_attribute("base", parent.type_name())?;
        }

        self.sink.start_element(&xsd("sequence"))?;
        for p in skeleton.elements() {
            self.element(p)?;
        }
        if skeleton.any_element().is_some() {
            self.sink.start_element(&xsd("any"))?;
            self.sink
                .attribute(&QName::local("processContents"), "lax")?;
            self.occurs(true, true)?;
            self.sink.end_element()?;
        }
        self.sink.end_element()?;
        for p in skeleton.attributes() {
            self.attribute(p)?;
        }
        if skeleton.any_attribute().is_some() {
            self.any_attribute()?;
        }

        if parent.is_some() {
            self.sink.end_element()?;
            self.sink.end_element()?;
        }
        self.sink.end_element()?;
        Ok(())
    }

    /// Text-only types: a simple type, or a complex type with simple
    /// content when attributes are present.
    fn simple_content(&mut self, skeleton: &Skeleton, value: &BoundProperty) -> BindResult<()> {
        let context = self.context;
        let attributes: Vec<&BoundProperty> = skeleton
            .chain(context)
            .into_iter()
            .flat_map(Skeleton::attributes)
            .collect();
        let any_attribute = skeleton
            .chain(context)
            .into_iter()
            .any(|s| s.any_attribute().is_some());
        if attributes.is_empty() && !any_attribute {
            self.sink.start_element(&xsd("simpleType"))?;
            self.name_attribute(skeleton.type_name().local_part())?;
            self.simple_derivation(value.property())?;
            self.sink.end_element()?;
            return Ok(());
        }

        self.sink.start_element(&xsd("complexType"))?;
        self.name_attribute(skeleton.type_name().local_part())?;
        self.sink.start_element(&xsd("simpleContent"))?;
        self.sink.start_element(&xsd("extension"))?;
        let base = self
            .type_ref(value.property())
            .unwrap_or_else(|| xsd("string"));
        self.type_attribute("base", &base)?;
        for p in attributes {
            self.attribute(p)?;
        }
        if any_attribute {
            self.any_attribute()?;
        }
        self.sink.end_element()?;
        self.sink.end_element()?;
        self.sink.end_element()?;
        Ok(())
    }

    fn any_attribute(&mut self) -> BindResult<()> {
        self.sink.start_element(&xsd("anyAttribute"))?;
        self.sink
            .attribute(&QName::local("processContents"), "lax")?;
        self.sink.end_element()?;
        Ok(())
    }

    fn simple_derivation(&mut self, property: &Property) -> BindResult<()> {
        match property {
            Property::XmlList(item) => {
                self.sink.start_element(&xsd("list"))?;
                let item_type = self.type_ref(item).unwrap_or_else(|| xsd("string"));
                self.type_attribute("itemType", &item_type)?;
            }
            other => {
                self.sink.start_element(&xsd("restriction"))?;
                let base = self.type_ref(other).unwrap_or_else(|| xsd("string"));
                self.type_attribute("base", &base)?;
            }
        }
        self.sink.end_element()?;
        Ok(())
    }

    fn type_ref(&self, property: &Property) -> Option<QName> {
        match property {
            Property::Leaf(leaf) => Some(xsd(leaf.kind.schema_name())),
            Property::Enum(info) => Some(info.type_name().clone()),
            Property::Nested(id) => Some(self.context.skeleton_at(*id).type_name().clone()),
            Property::Dynamic { .. } => Some(xsd("anyType")),
            Property::Array(item) | Property::List(item) | Property::Collection(item) => {
                self.type_ref(item)
            }
            Property::XmlList(_) | Property::Map { .. } => None,
        }
    }

    fn occurs(&mut self, optional: bool, repeated: bool) -> BindResult<()> {
        if optional {
            self.sink.attribute(&QName::local("minOccurs"), "0")?;
        }
        if repeated {
            self.sink
                .attribute(&QName::local("maxOccurs"), "unbounded")?;
        }
        Ok(())
    }

    fn element(&mut self, p: &BoundProperty) -> BindResult<()> {
        self.sink.start_element(&xsd("element"))?;
        self.name_attribute(p.name().local_part())?;
        let property = p.property();
        if let Some(type_name) = self.type_ref(property) {
            self.type_attribute("type", &type_name)?;
        }
        self.occurs(!p.is_required() || property.is_repeated(), property.is_repeated())?;
        if p.is_nillable() {
            self.sink.attribute(&QName::local("nillable"), "true")?;
        }
        match property {
            Property::XmlList(_) => {
                self.sink.start_element(&xsd("simpleType"))?;
                self.simple_derivation(property)?;
                self.sink.end_element()?;
            }
            Property::Map { key, value } => self.map_type(key, value)?,
            _ => {}
        }
        self.sink.end_element()?;
        Ok(())
    }

    fn map_type(&mut self, key: &Property, value: &Property) -> BindResult<()> {
        self.sink.start_element(&xsd("complexType"))?;
        self.sink.start_element(&xsd("sequence"))?;
        self.sink.start_element(&xsd("element"))?;
        self.name_attribute("entry")?;
        self.occurs(true, true)?;
        self.sink.start_element(&xsd("complexType"))?;
        self.sink.start_element(&xsd("sequence"))?;
        for (name, part) in [("key", key), ("value", value)] {
            self.sink.start_element(&xsd("element"))?;
            self.name_attribute(name)?;
            if let Some(type_name) = self.type_ref(part) {
                self.type_attribute("type", &type_name)?;
            }
            self.occurs(true, false)?;
            self.sink.end_element()?;
        }
        for _ in 0..4 {
            self.sink.end_element()?;
        }
        Ok(())
    }

    fn attribute(&mut self, p: &BoundProperty) -> BindResult<()> {
        self.sink.start_element(&xsd("attribute"))?;
        self.name_attribute(p.name().local_part())?;
        match p.property() {
            Property::XmlList(_) => {
                self.sink.start_element(&xsd("simpleType"))?;
                self.simple_derivation(p.property())?;
                self.sink.end_element()?;
            }
            other => {
                let type_name = self.type_ref(other).unwrap_or_else(|| xsd("string"));
                self.type_attribute("type", &type_name)?;
            }
        }
        if p.is_required() {
            self.sink.attribute(&QName::local("use"), "required")?;
        }
        self.sink.end_element()?;
        Ok(())
    }

    fn enumeration(&mut self, info: &EnumInfo) -> BindResult<()> {
        self.sink.start_element(&xsd("simpleType"))?;
        self.name_attribute(info.type_name().local_part())?;
        self.sink.start_element(&xsd("restriction"))?;
        self.type_attribute("base", &xsd("string"))?;
        for constant in info.constants() {
            self.sink.start_element(&xsd("enumeration"))?;
            self.sink.attribute(&QName::local("value"), constant)?;
            self.sink.end_element()?;
        }
        self.sink.end_element()?;
        self.sink.end_element()?;
        Ok(())
    }
}
