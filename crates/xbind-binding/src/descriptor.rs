//! Runtime type descriptions.
//!
//! A bindable type describes itself once through [`XmlBind::describe`]: its
//! [`TypeKey`], and a [`Shape`] saying whether it is a built-in leaf, a
//! container, an enumeration, a structure with named properties, or
//! untyped content. The registry turns descriptors into skeletons and
//! properties; nothing else inspects them.
//!
//! [`XmlBind::describe`]: crate::XmlBind::describe

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::bind::XmlBind;
use crate::value::Value;

/// Identity of a Rust type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The Rust type name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The underlying [`TypeId`].
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A deferred type description. Descriptors refer to other types through
/// these so that recursive types can be described.
pub type TypeFn = fn() -> TypeDescriptor;

/// Produces a fresh instance for unmarshalling.
pub type FactoryFn = fn() -> Value;

/// The description of one bindable type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// The described type.
    pub key: TypeKey,
    /// How the type maps to XML.
    pub shape: Shape,
}

impl TypeDescriptor {
    /// Describe `T` as a built-in leaf.
    #[must_use]
    pub fn leaf<T: 'static>(kind: LeafKind) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape: Shape::Leaf(kind),
        }
    }

    /// Start describing `T` as a structure.
    #[must_use]
    pub fn structure<T: XmlBind>() -> StructBuilder {
        StructBuilder {
            key: TypeKey::of::<T>(),
            desc: StructDescriptor::default(),
        }
    }

    /// Describe `T` as an enumeration with the given lexical constants.
    #[must_use]
    pub fn enumeration<T: 'static>(constants: &[&'static str]) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            shape: Shape::Enum(EnumDescriptor {
                type_name: None,
                constants: constants.to_vec(),
            }),
        }
    }
}

/// How a type maps to XML.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A built-in simple type.
    Leaf(LeafKind),
    /// A fixed-size array of items.
    Array(TypeFn),
    /// A growable list of items. `None` for untyped items.
    List(Option<TypeFn>),
    /// An unordered collection of items. `None` for untyped items.
    Collection(Option<TypeFn>),
    /// A key/value map. Must carry exactly two type arguments.
    Map(Vec<TypeFn>),
    /// An enumeration.
    Enum(EnumDescriptor),
    /// A structure with named properties.
    Struct(StructDescriptor),
    /// Untyped content.
    Any,
    /// An unresolved generic parameter. Always rejected.
    Parameter(&'static str),
}

/// The built-in simple types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// `xs:byte` (`i8`)
    Byte,
    /// `xs:short` (`i16`)
    Short,
    /// `xs:int` (`i32`)
    Int,
    /// `xs:long` (`i64`)
    Long,
    /// `xs:unsignedByte` (`u8`)
    UnsignedByte,
    /// `xs:unsignedShort` (`u16`)
    UnsignedShort,
    /// `xs:unsignedInt` (`u32`)
    UnsignedInt,
    /// `xs:unsignedLong` (`u64`)
    UnsignedLong,
    /// `xs:float` (`f32`)
    Float,
    /// `xs:double` (`f64`)
    Double,
    /// `xs:boolean`
    Boolean,
    /// A single character, written as a one-character string.
    Char,
    /// `xs:string`
    String,
    /// `xs:decimal`
    Decimal,
    /// `xs:integer`
    Integer,
    /// `xs:dateTime`
    DateTime,
    /// `xs:date`
    Date,
    /// `xs:time`
    Time,
    /// `xs:duration`
    Duration,
    /// `xs:base64Binary`
    Base64Binary,
    /// `xs:hexBinary`
    HexBinary,
    /// `xs:anyURI`
    AnyUri,
    /// A UUID, written in hyphenated form.
    Uuid,
    /// `xs:QName`
    QName,
    /// A binary payload with an optional content type.
    DataHandle,
}

impl LeafKind {
    /// Local name of the XML Schema type this leaf is written as.
    #[must_use]
    pub fn schema_name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::UnsignedByte => "unsignedByte",
            Self::UnsignedShort => "unsignedShort",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedLong => "unsignedLong",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Char | Self::String | Self::Uuid => "string",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::DateTime => "dateTime",
            Self::Date => "date",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Base64Binary | Self::DataHandle => "base64Binary",
            Self::HexBinary => "hexBinary",
            Self::AnyUri => "anyURI",
            Self::QName => "QName",
        }
    }

    /// The leaf that reads an `xsi:type` of the given schema type.
    #[must_use]
    pub fn from_schema_name(local: &str) -> Option<Self> {
        Some(match local {
            "byte" => Self::Byte,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "unsignedByte" => Self::UnsignedByte,
            "unsignedShort" => Self::UnsignedShort,
            "unsignedInt" => Self::UnsignedInt,
            "unsignedLong" => Self::UnsignedLong,
            "float" => Self::Float,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "dateTime" => Self::DateTime,
            "date" => Self::Date,
            "time" => Self::Time,
            "duration" => Self::Duration,
            "base64Binary" => Self::Base64Binary,
            "hexBinary" => Self::HexBinary,
            "anyURI" => Self::AnyUri,
            "QName" => Self::QName,
            _ => return None,
        })
    }

    /// Whether the leaf holds a binary blob.
    #[must_use]
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Base64Binary | Self::HexBinary | Self::DataHandle)
    }
}

/// An enumeration: its XML type name and the lexical form of each constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// Schema type name. Derived from the Rust name when absent.
    pub type_name: Option<String>,
    /// Lexical constants in declaration order.
    pub constants: Vec<&'static str>,
}

/// Whether element names of a structure are qualified by its namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementForm {
    /// Child elements are in the structure's namespace.
    #[default]
    Qualified,
    /// Child elements have no namespace.
    Unqualified,
}

/// Where a property appears in XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A child element (or repeated child elements).
    Element,
    /// An attribute.
    Attribute,
    /// The text content of the element itself.
    Value,
    /// Catch-all for child elements no other property claims.
    AnyElement,
    /// Catch-all for attributes no other property claims.
    AnyAttribute,
}

/// One property of a structure.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Field name in the value object.
    pub field: String,
    /// XML local name. Derived from the field name when absent.
    pub xml_name: Option<String>,
    /// Namespace override.
    pub namespace: Option<String>,
    /// Where the property appears.
    pub kind: PropertyKind,
    /// The property's type.
    pub ty: TypeFn,
    /// Accept any registered element in place of the declared type.
    pub any_type: bool,
    /// Write a sequence as one whitespace-separated text value.
    pub xml_list: bool,
    /// Expected content type for binary payloads.
    pub mime_type: Option<String>,
    /// Unmarshalling fails when the property is absent.
    pub required: bool,
    /// A null value is written as an empty element with `xsi:nil`.
    pub nillable: bool,
}

impl PropertyDescriptor {
    fn new<T: XmlBind>(field: &str, kind: PropertyKind) -> Self {
        Self {
            field: field.to_owned(),
            xml_name: None,
            namespace: None,
            kind,
            ty: T::describe,
            any_type: false,
            xml_list: false,
            mime_type: None,
            required: false,
            nillable: false,
        }
    }

    /// An element property.
    #[must_use]
    pub fn element<T: XmlBind>(field: &str) -> Self {
        Self::new::<T>(field, PropertyKind::Element)
    }

    /// An attribute property.
    #[must_use]
    pub fn attribute<T: XmlBind>(field: &str) -> Self {
        Self::new::<T>(field, PropertyKind::Attribute)
    }

    /// A text-content property.
    #[must_use]
    pub fn value<T: XmlBind>(field: &str) -> Self {
        Self::new::<T>(field, PropertyKind::Value)
    }

    /// A catch-all property collecting unclaimed child elements into a
    /// list of dynamic values.
    #[must_use]
    pub fn any_element(field: &str) -> Self {
        Self::new::<Vec<Value>>(field, PropertyKind::AnyElement)
    }

    /// A catch-all property collecting unclaimed attributes into
    /// [`AnyAttributes`](crate::AnyAttributes).
    #[must_use]
    pub fn any_attribute(field: &str) -> Self {
        Self::new::<crate::AnyAttributes>(field, PropertyKind::AnyAttribute)
    }

    /// Use an explicit XML local name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.xml_name = Some(name.into());
        self
    }

    /// Put the element or attribute in an explicit namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Mark the property as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Write nulls with `xsi:nil`.
    #[must_use]
    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    /// Write a sequence as a single whitespace-separated value.
    #[must_use]
    pub fn xml_list(mut self) -> Self {
        self.xml_list = true;
        self
    }

    /// Accept any registered root element.
    #[must_use]
    pub fn any_type(mut self) -> Self {
        self.any_type = true;
        self
    }

    /// Declare the expected content type of a binary payload.
    #[must_use]
    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }
}

/// A structure: names, inheritance, construction and properties.
#[derive(Debug, Clone, Default)]
pub struct StructDescriptor {
    /// Schema type local name. Derived from the Rust name when absent.
    pub type_name: Option<String>,
    /// Namespace of the type and, when qualified, its elements.
    pub namespace: Option<String>,
    /// Root element local name, when the type is a document element.
    pub root_element: Option<String>,
    /// Qualification of child element names.
    pub element_form: ElementForm,
    /// The bound supertype whose properties come first.
    pub supertype: Option<TypeFn>,
    /// Abstract types are never instantiated from XML.
    pub is_abstract: bool,
    /// Fresh instance for unmarshalling. An empty object when absent.
    pub factory: Option<FactoryFn>,
    /// Properties in declaration order.
    pub properties: Vec<PropertyDescriptor>,
    /// Explicit element order by field name.
    pub prop_order: Option<Vec<String>>,
    /// Element order when `prop_order` is absent.
    pub accessor_order: AccessorOrder,
}

/// Order of element properties without an explicit `prop_order`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessorOrder {
    /// Declaration order.
    #[default]
    Undefined,
    /// Sorted by field name.
    Alphabetical,
}

/// Builder returned by [`TypeDescriptor::structure`].
#[derive(Debug, Clone)]
pub struct StructBuilder {
    key: TypeKey,
    desc: StructDescriptor,
}

impl StructBuilder {
    /// Set the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.desc.namespace = Some(namespace.into());
        self
    }

    /// Override the schema type name.
    #[must_use]
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.desc.type_name = Some(name.into());
        self
    }

    /// Declare the type as a document element with this local name.
    #[must_use]
    pub fn root_element(mut self, name: impl Into<String>) -> Self {
        self.desc.root_element = Some(name.into());
        self
    }

    /// Set element name qualification.
    #[must_use]
    pub fn element_form(mut self, form: ElementForm) -> Self {
        self.desc.element_form = form;
        self
    }

    /// Extend a bound supertype.
    #[must_use]
    pub fn extends<B: XmlBind>(mut self) -> Self {
        self.desc.supertype = Some(B::describe);
        self
    }

    /// Mark the type abstract.
    #[must_use]
    pub fn is_abstract(mut self) -> Self {
        self.desc.is_abstract = true;
        self
    }

    /// Set the instance factory.
    #[must_use]
    pub fn factory(mut self, factory: FactoryFn) -> Self {
        self.desc.factory = Some(factory);
        self
    }

    /// Fix the order of element properties by field name.
    #[must_use]
    pub fn prop_order(mut self, fields: &[&str]) -> Self {
        self.desc.prop_order = Some(fields.iter().map(|f| (*f).to_owned()).collect());
        self
    }

    /// Order element properties without an explicit `prop_order`.
    #[must_use]
    pub fn accessor_order(mut self, order: AccessorOrder) -> Self {
        self.desc.accessor_order = order;
        self
    }

    /// Add an element property of type `T`.
    #[must_use]
    pub fn element<T: XmlBind>(self, field: &str) -> Self {
        self.property(PropertyDescriptor::element::<T>(field))
    }

    /// Add an attribute property of type `T`.
    #[must_use]
    pub fn attribute<T: XmlBind>(self, field: &str) -> Self {
        self.property(PropertyDescriptor::attribute::<T>(field))
    }

    /// Add the text-content property.
    #[must_use]
    pub fn value<T: XmlBind>(self, field: &str) -> Self {
        self.property(PropertyDescriptor::value::<T>(field))
    }

    /// Add a catch-all property for unclaimed child elements.
    #[must_use]
    pub fn any_element(self, field: &str) -> Self {
        self.property(PropertyDescriptor::any_element(field))
    }

    /// Add a catch-all property for unclaimed attributes.
    #[must_use]
    pub fn any_attribute(self, field: &str) -> Self {
        self.property(PropertyDescriptor::any_attribute(field))
    }

    /// Add a fully configured property.
    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.desc.properties.push(property);
        self
    }

    /// Finish the description.
    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            key: self.key,
            shape: Shape::Struct(self.desc),
        }
    }
}
