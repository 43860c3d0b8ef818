//! XML plumbing for xbind.
//!
//! The binding engine never touches `quick-xml` directly. It reads through
//! the pull-style [`XmlCursor`] and writes through the push-style
//! [`XmlSink`], each of which has a streaming implementation
//! ([`StreamCursor`], [`StreamWriter`]) and a tree implementation over the
//! arena [`Document`] ([`DomCursor`], [`DomWriter`]).
//!
//! # Key components
//!
//! - [`EventReader`]: owned, namespace-resolved events from any `BufRead`
//! - [`StreamWriter`]: namespace-repairing serializer over any `Write`
//! - [`Document`]: arena DOM addressed by [`NodeId`]
//! - [`DynamicElement`]: untyped element trees for "any" content

pub mod cursor;
pub mod dom;
pub mod dynamic;
pub mod error;
pub mod reader;
pub mod writer;

pub use cursor::{CursorEvent, StreamCursor, XmlCursor};
pub use dom::{Document, DomCursor, DomWriter, NodeId};
pub use dynamic::{DynamicElement, DynamicNode};
pub use error::{XmlError, XmlResult};
pub use reader::{Attribute, EventReader, StartTag, XmlEvent};
pub use writer::{StreamWriter, XmlSink};
