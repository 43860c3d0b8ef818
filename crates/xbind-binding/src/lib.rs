//! Declarative XML data binding.
//!
//! Types describe their XML shape once through [`XmlBind`]. A
//! [`BindingContext`] introspects those descriptions into skeletons and
//! properties, after which it converts between [`Value`] graphs and XML:
//!
//! - [`Marshaller`] writes values to any `Write` or [`XmlSink`]
//! - [`Unmarshaller`] reads values from any `BufRead` or [`XmlCursor`]
//! - [`Binder`] keeps objects associated with the nodes of a [`Document`]
//!   so either side can be updated from the other
//! - [`BindingContext::generate_schema`] writes an XML Schema for every
//!   registered type
//!
//! # Example
//!
//! ```
//! use xbind_binding::{BindResult, BindingContext, Object, TypeDescriptor, Value, XmlBind};
//!
//! struct Greeting {
//!     text: String,
//! }
//!
//! impl XmlBind for Greeting {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::structure::<Self>()
//!             .root_element("greeting")
//!             .element::<String>("text")
//!             .build()
//!     }
//!
//!     fn to_value(&self) -> Value {
//!         Object::of::<Self>().with("text", self.text.to_value()).into()
//!     }
//!
//!     fn from_value(value: Value) -> BindResult<Self> {
//!         let mut object = value.into_object()?;
//!         Ok(Self { text: object.take("text")? })
//!     }
//! }
//!
//! let context = BindingContext::builder().register::<Greeting>().build()?;
//! let mut marshaller = context.marshaller();
//! marshaller.set_fragment(true);
//! let xml = marshaller.marshal_to_string(&Greeting { text: "hi".to_owned() }.to_value())?;
//! assert_eq!(xml, "<greeting><text>hi</text></greeting>");
//! # Ok::<(), xbind_binding::BindError>(())
//! ```
//!
//! [`XmlSink`]: xbind_xml::XmlSink
//! [`XmlCursor`]: xbind_xml::XmlCursor
//! [`Document`]: xbind_xml::Document

mod bind;
pub mod binder;
pub mod context;
pub mod descriptor;
mod error;
mod listener;
pub mod marshaller;
pub mod property;
mod schema;
mod session;
pub mod skeleton;
pub mod unmarshaller;
mod value;

pub use bind::XmlBind;
pub use binder::{Binder, BindingTable};
pub use context::{BindingContext, BindingContextBuilder, SkeletonId};
pub use descriptor::{
    AccessorOrder, ElementForm, EnumDescriptor, FactoryFn, LeafKind, PropertyDescriptor,
    PropertyKind, Shape, StructBuilder, StructDescriptor, TypeDescriptor, TypeFn, TypeKey,
};
pub use error::{BindError, BindResult};
pub use listener::{MarshalListener, UnmarshalListener};
pub use marshaller::Marshaller;
pub use property::{EnumInfo, LeafProperty, Property, PropertyFlags};
pub use skeleton::{BoundProperty, Skeleton, SkeletonState};
pub use unmarshaller::Unmarshaller;
pub use value::{AnyAttributes, Named, NamedValue, Object, ObjectId, UntypedList, Value};
pub use xbind_core::{
    BindingConfig, DataHandle, DatatypeConverter, HexBinary, LexicalError, QName, XmlDuration,
};
pub use xbind_xml::{Document, DynamicElement, NodeId};
