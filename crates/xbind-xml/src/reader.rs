//! Owned, namespace-resolved XML events on top of `quick_xml::Reader`.
//!
//! `quick-xml` hands out raw, borrowed events; the binding layer wants
//! resolved [`QName`]s and merged text. [`EventReader`] keeps a
//! [`NamespaceScope`] in step with the element stack and converts every
//! event into an owned [`XmlEvent`]. Empty elements (`<a/>`) are reported as
//! a start immediately followed by an end.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use xbind_core::{NamespaceScope, QName};

use crate::error::{XmlError, XmlResult};

/// A resolved attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name. Unprefixed attributes have no namespace.
    pub name: QName,
    /// The unescaped value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    #[must_use]
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// A resolved start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// The element name.
    pub name: QName,
    /// Attributes other than namespace declarations, in document order.
    pub attributes: Vec<Attribute>,
    /// Namespace declarations made on this element as `(prefix, uri)`.
    pub namespaces: Vec<(String, String)>,
}

/// An owned XML event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// An element start.
    Start(StartTag),
    /// An element end.
    End(QName),
    /// Character data (text, CDATA or a resolved entity reference).
    Text(String),
    /// End of input.
    Eof,
}

/// Pulls [`XmlEvent`]s from any buffered reader.
pub struct EventReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    scope: NamespaceScope,
    open: Vec<QName>,
    pending_end: bool,
}

impl<R: BufRead> std::fmt::Debug for EventReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReader")
            .field("depth", &self.open.len())
            .field("pending_end", &self.pending_end)
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> EventReader<R> {
    /// Create a reader.
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::with_capacity(1024),
            scope: NamespaceScope::new(),
            open: Vec::new(),
            pending_end: false,
        }
    }

    /// Namespace bindings in scope at the current position.
    #[must_use]
    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    /// Read the next event.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] on malformed XML, unbound prefixes, or input
    /// that ends inside an element.
    pub fn next_event(&mut self) -> XmlResult<XmlEvent> {
        if self.pending_end {
            self.pending_end = false;
            return Ok(Self::close(&mut self.scope, &mut self.open));
        }

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    let tag = Self::start_tag(&mut self.scope, &e)?;
                    self.open.push(tag.name.clone());
                    return Ok(XmlEvent::Start(tag));
                }
                Event::Empty(e) => {
                    let tag = Self::start_tag(&mut self.scope, &e)?;
                    self.open.push(tag.name.clone());
                    self.pending_end = true;
                    return Ok(XmlEvent::Start(tag));
                }
                Event::End(_) => {
                    if self.open.is_empty() {
                        return Err(XmlError::UnexpectedElement("unmatched end tag".to_owned()));
                    }
                    return Ok(Self::close(&mut self.scope, &mut self.open));
                }
                Event::Text(e) => {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    return Ok(XmlEvent::Text(unescaped.into_owned()));
                }
                Event::CData(e) => {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    return Ok(XmlEvent::Text(decoded.into_owned()));
                }
                Event::GeneralRef(e) => {
                    let name = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    return Ok(XmlEvent::Text(resolve_reference(&name)?));
                }
                Event::Eof => {
                    if let Some(name) = self.open.last() {
                        return Err(XmlError::MissingElement(format!(
                            "end tag for {name} before end of input"
                        )));
                    }
                    return Ok(XmlEvent::Eof);
                }
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
        }
    }

    fn close(scope: &mut NamespaceScope, open: &mut Vec<QName>) -> XmlEvent {
        scope.pop();
        match open.pop() {
            Some(name) => XmlEvent::End(name),
            None => XmlEvent::Eof,
        }
    }

    fn start_tag(scope: &mut NamespaceScope, e: &BytesStart<'_>) -> XmlResult<StartTag> {
        scope.push();

        let mut raw = Vec::new();
        let mut namespaces = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| XmlError::ParseError(err.to_string()))?
                .to_owned();
            let value = std::str::from_utf8(&attr.value)
                .map_err(|err| XmlError::ParseError(err.to_string()))?;
            let value = quick_xml::escape::unescape(value)
                .map_err(|err| XmlError::ParseError(err.to_string()))?
                .into_owned();

            if key == "xmlns" {
                scope.declare("", &value);
                namespaces.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.declare(prefix, &value);
                namespaces.push((prefix.to_owned(), value));
            } else {
                raw.push((key, value));
            }
        }

        let raw_name = std::str::from_utf8(e.name().as_ref())
            .map_err(|err| XmlError::ParseError(err.to_string()))?
            .to_owned();
        let name = resolve_name(scope, &raw_name, true)?;

        let attributes = raw
            .into_iter()
            .map(|(key, value)| Ok(Attribute::new(resolve_name(scope, &key, false)?, value)))
            .collect::<XmlResult<Vec<_>>>()?;

        Ok(StartTag {
            name,
            attributes,
            namespaces,
        })
    }
}

/// Resolve a raw `prefix:local` name. Unprefixed element names take the
/// default namespace; unprefixed attribute names have no namespace.
fn resolve_name(scope: &NamespaceScope, raw: &str, is_element: bool) -> XmlResult<QName> {
    match raw.split_once(':') {
        Some((prefix, local)) => {
            let uri = scope
                .resolve(prefix)
                .ok_or_else(|| XmlError::UnboundPrefix(prefix.to_owned()))?;
            Ok(QName::new(uri, local).with_prefix(prefix))
        }
        None if is_element => Ok(QName::with_namespace(scope.resolve(""), raw)),
        None => Ok(QName::local(raw)),
    }
}

/// Expand a general entity or character reference (without `&` and `;`).
fn resolve_reference(name: &str) -> XmlResult<String> {
    let ch = match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()
            } else {
                None
            };
            code.and_then(char::from_u32)
                .ok_or_else(|| XmlError::ParseError(format!("unknown entity reference &{name};")))?
        }
    };
    Ok(ch.to_string())
}
