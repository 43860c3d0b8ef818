//! Core types, datatype converters, and configuration for xbind.
//!
//! This crate provides the foundational building blocks shared by the XML
//! layer and the binding engine: qualified names and namespace scoping, the
//! lexical converters for XML Schema primitives, the value types that have no
//! direct std/ecosystem counterpart (`xs:duration`, `xs:hexBinary`, data
//! handles), and the binding configuration.

mod config;
pub mod datatype;
mod error;
mod namespace;
mod naming;
mod qname;
mod types;

pub use config::BindingConfig;
pub use datatype::DatatypeConverter;
pub use error::{LexicalError, LexicalResult};
pub use namespace::{NamespaceContext, NamespaceScope, XML_NAMESPACE, XMLNS_NAMESPACE};
pub use naming::identifier_to_xml_name;
pub use qname::QName;
pub use types::{DataHandle, HexBinary, XmlDuration};

/// The XML Schema namespace.
pub const XML_SCHEMA_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// The XML Schema instance namespace (`xsi:nil`, `xsi:type`).
pub const XML_SCHEMA_INSTANCE_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The XML MIME namespace used for `xmime:contentType`.
pub const XML_MIME_NS: &str = "http://www.w3.org/2005/05/xmlmime";
